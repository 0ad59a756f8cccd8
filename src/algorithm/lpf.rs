/// First order exponential smoothing with the previous output supplied by the
/// caller, so the smoothed value can live in shared state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LPF {
    alpha: f64,
}

impl LPF {
    pub const fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn filter(&self, sample: f64, previous: f64) -> f64 {
        self.alpha * sample + (1.0 - self.alpha) * previous
    }
}

mod test {
    #[test]
    fn test_lpf() {
        use super::LPF;

        let lpf = LPF::new(0.7);
        let value0 = lpf.filter(3.295, 3.335);
        let value1 = lpf.filter(3.295, value0);
        assert!(3.295 < value1 && value1 < value0);
        let value2 = lpf.filter(3.295, value1);
        assert!(3.295 < value2 && value2 < value1);
    }

    #[test]
    fn test_lpf_alpha_one_passthrough() {
        use super::LPF;

        assert_eq!(LPF::new(1.0).filter(2.5, -7.0), 2.5);
    }
}
