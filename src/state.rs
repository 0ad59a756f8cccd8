//! State shared by the sampling loop, the audio task and the toggle handler.
//!
//! `turned_on` and `sound_enabled` are relaxed atomics with a single writer,
//! the toggle handler. Readers may observe a flip one cycle late.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::sync::ReadSpinLock;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Speed {
    pub current: f64,
    pub last: f64,
}

impl Speed {
    pub fn changed(&self) -> bool {
        self.current != self.last
    }
}

pub struct VarioState {
    speed: Mutex<Speed>,
    integrated: ReadSpinLock<Speed>,
    estimated_local_pressure: f64,
    turned_on: AtomicBool,
    sound_enabled: AtomicBool,
}

impl VarioState {
    pub fn new(base_pressure: f64, turned_on: bool) -> Self {
        Self {
            speed: Mutex::new(Speed::default()),
            integrated: ReadSpinLock::default(),
            estimated_local_pressure: base_pressure,
            turned_on: AtomicBool::new(turned_on),
            sound_enabled: AtomicBool::new(turned_on),
        }
    }

    /// Computes the next vertical speed from the current one while holding
    /// the lock and returns the pair as stored.
    pub fn update_v_speed<F: FnOnce(f64) -> f64>(&self, f: F) -> Speed {
        let mut speed = self.speed.lock();
        let current = f(speed.current);
        speed.last = speed.current;
        speed.current = current;
        *speed
    }

    /// `None` when the sampling loop holds the lock
    pub fn try_v_speed(&self) -> Option<f64> {
        self.speed.try_lock().map(|speed| speed.current)
    }

    pub fn v_speed(&self) -> f64 {
        self.speed.lock().current
    }

    /// Only the sampling loop writes the integrated speed.
    pub fn set_integrated_v_speed(&self, value: f64) -> Speed {
        let speed = Speed { current: value, last: self.integrated.read().current };
        if self.integrated.write(speed).is_err() {
            error!("Concurrent integrated v-speed writer");
        }
        speed
    }

    pub fn integrated_v_speed(&self) -> f64 {
        self.integrated.read().current
    }

    pub fn estimated_local_pressure(&self) -> f64 {
        self.estimated_local_pressure
    }

    pub fn is_turned_on(&self) -> bool {
        self.turned_on.load(Ordering::Relaxed)
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn set_turned_on(&self, on: bool) {
        self.turned_on.store(on, Ordering::Relaxed);
        self.sound_enabled.store(on, Ordering::Relaxed);
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flips both flags, returns whether the vario is now on.
    pub fn toggle(&self) -> bool {
        self.sound_enabled.fetch_xor(true, Ordering::Relaxed);
        !self.turned_on.fetch_xor(true, Ordering::Relaxed)
    }
}

mod test {
    #[test]
    fn test_update_v_speed() {
        use super::{Speed, VarioState};

        let state = VarioState::new(1013.25, true);
        let speed = state.update_v_speed(|previous| previous + 0.5);
        assert_eq!(speed, Speed { current: 0.5, last: 0.0 });
        assert!(speed.changed());
        let speed = state.update_v_speed(|previous| previous);
        assert_eq!(speed, Speed { current: 0.5, last: 0.5 });
        assert!(!speed.changed());
        assert_eq!(state.v_speed(), 0.5);
        assert_eq!(state.try_v_speed(), Some(0.5));
    }

    #[test]
    fn test_try_v_speed_contended() {
        use super::VarioState;

        let state = VarioState::new(1013.25, true);
        state.update_v_speed(|_| {
            assert_eq!(state.try_v_speed(), None);
            1.0
        });
        assert_eq!(state.try_v_speed(), Some(1.0));
    }

    #[test]
    fn test_integrated_v_speed() {
        use super::{Speed, VarioState};

        let state = VarioState::new(1013.25, false);
        assert_eq!(state.set_integrated_v_speed(0.8), Speed { current: 0.8, last: 0.0 });
        assert_eq!(state.set_integrated_v_speed(0.9), Speed { current: 0.9, last: 0.8 });
        assert_eq!(state.integrated_v_speed(), 0.9);
        assert_eq!(state.estimated_local_pressure(), 1013.25);
    }

    #[test]
    fn test_toggle() {
        use super::VarioState;

        let state = VarioState::new(1013.25, false);
        assert!(!state.is_turned_on() && !state.is_sound_enabled());
        assert!(state.toggle());
        assert!(state.is_turned_on() && state.is_sound_enabled());
        assert!(!state.toggle());
        assert!(!state.is_turned_on() && !state.is_sound_enabled());
        state.set_turned_on(true);
        assert!(state.is_turned_on() && state.is_sound_enabled());
    }
}
