use alloc::vec::Vec;

use crate::algorithm::variometer::Window;

/// Fixed length sliding window of altitudes in meters. Starts filled with
/// zeros; every push evicts the oldest sample.
pub struct AltitudeLog {
    buffer: Vec<f64>,
    oldest: usize,
}

impl AltitudeLog {
    pub fn new(capacity: usize) -> Self {
        Self { buffer: vec![0.0; capacity.max(2)], oldest: 0 }
    }

    pub fn push(&mut self, altitude: f64) {
        self.buffer[self.oldest] = altitude;
        self.oldest = (self.oldest + 1) % self.buffer.len();
    }

    pub fn latest(&self) -> f64 {
        self.back(0)
    }

    pub fn oldest(&self) -> f64 {
        self.buffer[self.oldest]
    }
}

impl Window for AltitudeLog {
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn back(&self, steps: usize) -> f64 {
        let size = self.buffer.len();
        self.buffer[(self.oldest + size - 1 - steps) % size]
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[test]
    fn test_sliding_window() {
        use std::vec::Vec;

        use super::AltitudeLog;
        use crate::algorithm::variometer::Window;

        let mut log = AltitudeLog::new(4);
        assert_eq!((0..4).map(|i| log.back(i)).collect::<Vec<_>>(), [0.0, 0.0, 0.0, 0.0]);
        for altitude in 1..=6 {
            log.push(altitude as f64);
            assert_eq!(log.len(), 4);
        }
        assert_eq!((0..4).map(|i| log.back(i)).collect::<Vec<_>>(), [6.0, 5.0, 4.0, 3.0]);
        assert_eq!(log.latest(), 6.0);
        assert_eq!(log.oldest(), 3.0);
        assert_eq!(log.back(1), 5.0);
        assert_eq!(log.back(3), 3.0);
    }

    #[test]
    fn test_minimum_capacity() {
        use super::AltitudeLog;
        use crate::algorithm::variometer::Window;

        let mut log = AltitudeLog::new(0);
        assert_eq!(log.len(), 2);
        log.push(10.0);
        assert_eq!(log.oldest(), 0.0);
        assert_eq!(log.latest(), 10.0);
    }
}
