//! Vertical speed from a sliding window of altitude samples.
//!
//! Three differences are taken between the latest sample and samples
//! `short`, `mid` and `long` steps back, turned into velocities, blended
//! 3:2:1 and passed through a low pass stage whose state is the previous
//! output.

use super::lpf::LPF;

pub const ALPHA: f64 = 0.7;

/// Read access to an ordered run of altitude samples, oldest first.
pub trait Window {
    fn len(&self) -> usize;

    /// Sample `steps` positions before the latest one, `back(0)` being the
    /// latest. `steps` must be less than `len()`.
    fn back(&self, steps: usize) -> f64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Window for [f64] {
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    fn back(&self, steps: usize) -> f64 {
        self[self.len() - 1 - steps]
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Variometer {
    sample_rate: f64,
    short: usize,
    mid: usize,
    long: usize,
    lpf: LPF,
}

impl Variometer {
    pub fn new(sample_rate: u32, minimal_delay: f64) -> Self {
        let short = libm::round(minimal_delay * sample_rate as f64) as usize;
        Self {
            sample_rate: sample_rate as f64,
            short: short.max(1),
            mid: (sample_rate as usize / 2).max(1),
            long: (sample_rate as usize * 2).max(1),
            lpf: LPF::new(ALPHA),
        }
    }

    /// Offsets in samples, `(short, mid, long)`
    pub fn offsets(&self) -> (usize, usize, usize) {
        (self.short, self.mid, self.long)
    }

    fn velocity<W: Window + ?Sized>(&self, window: &W, steps: usize) -> f64 {
        let steps = steps.min(window.len() - 1);
        let span = steps as f64 / self.sample_rate;
        (window.back(0) - window.back(steps)) / span
    }

    /// Filtered vertical speed in m/s, unrounded.
    pub fn update<W: Window + ?Sized>(&self, window: &W, previous: f64) -> f64 {
        if window.len() < 2 {
            return 0.0;
        }
        let short = self.velocity(window, self.short);
        let mid = self.velocity(window, self.mid);
        let long = self.velocity(window, self.long);
        let raw = (3.0 * short + 2.0 * mid + long) / 6.0;
        self.lpf.filter(raw, previous)
    }
}

pub fn compute_v_speed<W: Window + ?Sized>(
    window: &W,
    previous: f64,
    sample_rate: u32,
    minimal_delay: f64,
) -> f64 {
    Variometer::new(sample_rate, minimal_delay).update(window, previous)
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[cfg(test)]
    use std::vec::Vec;

    #[test]
    fn test_cold_start() {
        use super::compute_v_speed;

        let empty: [f64; 0] = [];
        assert_eq!(compute_v_speed(&empty[..], 3.0, 50, 0.1), 0.0);
        assert_eq!(compute_v_speed(&[120.0][..], -2.0, 50, 0.1), 0.0);
    }

    #[test]
    fn test_default_offsets() {
        use super::Variometer;

        assert_eq!(Variometer::new(50, 0.1).offsets(), (5, 25, 100));
        assert_eq!(Variometer::new(1, 0.1).offsets(), (1, 1, 2));
    }

    #[test]
    fn test_constant_altitude_decays() {
        use super::compute_v_speed;

        let window = [250.0; 600];
        let mut speed = 4.2;
        for _ in 0..50 {
            let next = compute_v_speed(&window[..], speed, 50, 0.1);
            assert!(next.abs() < speed.abs() || next == 0.0);
            speed = next;
        }
        assert!(speed.abs() < 1e-12);

        let mut speed = -3.0;
        for _ in 0..50 {
            speed = compute_v_speed(&window[..], speed, 50, 0.1);
        }
        assert!(speed.abs() < 1e-12);
    }

    #[test]
    fn test_uniform_climb() {
        use super::compute_v_speed;

        // 1 m every sample at 50 Hz
        let window: Vec<f64> = (0..600).map(|i| i as f64).collect();
        let rate = 50.0;
        let mut speed = 0.0;
        let mut last_gap = f64::MAX;
        for _ in 0..20 {
            speed = compute_v_speed(&window[..], speed, 50, 0.1);
            let gap = rate - speed;
            assert!(gap >= 0.0 && gap < last_gap);
            last_gap = gap;
        }
        assert!((speed - rate).abs() < 1e-8);
    }

    #[test]
    fn test_single_step_exact() {
        use super::compute_v_speed;

        let window: Vec<f64> = (0..600).map(|i| i as f64 * 0.02).collect();
        // raw velocity is exactly 1 m/s, first output is alpha * 1.0
        let speed = compute_v_speed(&window[..], 0.0, 50, 0.1);
        assert!((speed - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_short_window_clamps_to_oldest() {
        use super::compute_v_speed;

        // 10 samples climbing 0.02 m per sample, shorter than mid and long
        let window: Vec<f64> = (0..10).map(|i| i as f64 * 0.02).collect();
        let speed = compute_v_speed(&window[..], 1.0, 50, 0.1);
        assert!((speed - 1.0).abs() < 1e-9);

        let pair = [0.0, 0.02];
        let speed = compute_v_speed(&pair[..], 0.0, 50, 0.1);
        assert!((speed - 0.7).abs() < 1e-9);
    }
}
