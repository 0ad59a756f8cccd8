pub mod altitude;
pub mod lpf;
pub mod variometer;

/// Round to centimetres per second, the resolution every speed is published at.
pub fn round2(value: f64) -> f64 {
    libm::round(value * 100.0) / 100.0
}

mod test {
    #[test]
    fn test_round2() {
        use super::round2;

        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-0.456), -0.46);
        assert_eq!(round2(0.999), 1.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
