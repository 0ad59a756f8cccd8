//! Button handler. Runs in interrupt context: no locks, no allocation, no
//! logging.

use core::time::Duration;

use hal::io::Led;

use crate::state::VarioState;

/// Accepts an edge only if more than `window` elapsed since the last accepted
/// one. Rejected edges are dropped, not deferred.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Debouncer {
    window: Duration,
    last: Option<Duration>,
}

impl Debouncer {
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last {
            if now.saturating_sub(last) <= self.window {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

pub struct ToggleControl<'a, L> {
    state: &'a VarioState,
    led: &'a L,
    debouncer: Debouncer,
}

impl<'a, L: Led> ToggleControl<'a, L> {
    pub fn new(debounce: Duration, state: &'a VarioState, led: &'a L) -> Self {
        Self { state, led, debouncer: Debouncer::new(debounce) }
    }

    /// Returns whether the edge flipped the vario state.
    pub fn on_falling_edge(&mut self, now: Duration) -> bool {
        if !self.debouncer.accept(now) {
            return false;
        }
        self.state.toggle();
        self.led.toggle();
        true
    }
}

mod test {
    #[test]
    fn test_debouncer() {
        use core::time::Duration;

        use super::Debouncer;

        let ms = Duration::from_millis;
        let mut debouncer = Debouncer::new(ms(300));
        assert!(debouncer.accept(ms(1000)));
        assert!(!debouncer.accept(ms(1050)));
        assert!(!debouncer.accept(ms(1300)));
        assert!(debouncer.accept(ms(1301)));
        // rejected edges do not move the window
        assert!(!debouncer.accept(ms(1500)));
        assert!(debouncer.accept(ms(1700)));
    }

    #[test]
    fn test_first_edge_at_boot() {
        use core::time::Duration;

        use super::Debouncer;

        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.accept(Duration::ZERO));
        assert!(!debouncer.accept(Duration::from_millis(10)));
    }

    #[test]
    fn test_edges_50ms_apart() {
        use core::time::Duration;

        use hal::io::Led;

        use super::ToggleControl;
        use crate::components::fake::FakeLed;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, false);
        let led = FakeLed::default();
        let mut control = ToggleControl::new(Duration::from_millis(300), &state, &led);
        assert!(control.on_falling_edge(Duration::from_millis(5000)));
        assert!(!control.on_falling_edge(Duration::from_millis(5050)));
        assert!(state.is_turned_on() && state.is_sound_enabled());
        assert!(led.is_on());
    }

    #[test]
    fn test_edges_400ms_apart() {
        use core::time::Duration;

        use hal::io::Led;

        use super::ToggleControl;
        use crate::components::fake::FakeLed;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, false);
        let led = FakeLed::default();
        let mut control = ToggleControl::new(Duration::from_millis(300), &state, &led);
        assert!(control.on_falling_edge(Duration::from_millis(5000)));
        assert!(control.on_falling_edge(Duration::from_millis(5400)));
        assert!(!state.is_turned_on() && !state.is_sound_enabled());
        assert!(!led.is_on());
    }
}
