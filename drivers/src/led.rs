use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::v2::OutputPin;
use spin::Mutex;

/// LED driven from both the audio task and the button interrupt. The logical
/// state is authoritative; the pin follows it whenever it can be taken without
/// spinning.
pub struct Led<P> {
    pin: Mutex<P>,
    on: AtomicBool,
    active_low: bool,
}

impl<P: OutputPin> Led<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        let led = Self { pin: Mutex::new(pin), on: AtomicBool::new(false), active_low };
        led.apply(false);
        led
    }

    fn apply(&self, on: bool) {
        if let Some(mut pin) = self.pin.try_lock() {
            let result = match on != self.active_low {
                true => pin.set_high(),
                false => pin.set_low(),
            };
            result.ok();
        }
    }
}

impl<P: OutputPin> hal::io::Led for Led<P> {
    fn set(&self, on: bool) {
        self.on.store(on, Ordering::Relaxed);
        self.apply(on);
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }
}

mod test {
    #[cfg(test)]
    use core::cell::Cell;

    #[cfg(test)]
    struct MockPin<'a>(&'a Cell<bool>);

    #[cfg(test)]
    impl<'a> embedded_hal::digital::v2::OutputPin for MockPin<'a> {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            Ok(self.0.set(false))
        }

        fn set_high(&mut self) -> Result<(), ()> {
            Ok(self.0.set(true))
        }
    }

    #[test]
    fn test_led() {
        use hal::io::Led as _;

        use super::Led;

        let level = Cell::new(true);
        let led = Led::new(MockPin(&level), false);
        assert!(!level.get() && !led.is_on());
        led.toggle();
        assert!(level.get() && led.is_on());
        led.set(false);
        assert!(!level.get());
    }

    #[test]
    fn test_active_low() {
        use hal::io::Led as _;

        use super::Led;

        let level = Cell::new(false);
        let led = Led::new(MockPin(&level), true);
        assert!(level.get());
        led.set(true);
        assert!(!level.get() && led.is_on());
    }
}
