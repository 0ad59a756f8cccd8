use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use fugit::{HertzU32 as Hertz, MillisDurationU32};
use hal::{buzzer::Buzzer, io::Led};

/// Buzzer printing its beeps, blocking for the tone duration like the real one.
#[derive(Default)]
pub struct ConsoleBuzzer {
    sounding: bool,
}

impl Buzzer for ConsoleBuzzer {
    fn play_tone(&mut self, frequency: Hertz, duration: MillisDurationU32) {
        debug!("Beep {} Hz for {} ms", frequency.raw(), duration.ticks());
        self.sounding = true;
        thread::sleep(Duration::from_millis(duration.ticks() as u64));
        self.sounding = false;
    }

    fn silence(&mut self) {
        if self.sounding {
            trace!("Silence");
        }
        self.sounding = false;
    }
}

#[derive(Default)]
pub struct ConsoleLed(AtomicBool);

impl Led for ConsoleLed {
    fn set(&self, on: bool) {
        if self.0.swap(on, Ordering::Relaxed) != on {
            info!("LED {}", if on { "on" } else { "off" });
        }
    }

    fn is_on(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
