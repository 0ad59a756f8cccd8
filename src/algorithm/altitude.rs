//! Barometric formula, international standard atmosphere below the tropopause.

const EXPONENT: f64 = 0.190284;
const SCALE_FEET: f64 = 145366.45;
const FEET_PER_METER: f64 = 3.28084;

/// Altitude in meters above the level where the pressure equals `reference`.
/// Both arguments in mbar, `reference` must be positive.
pub fn altitude(pressure: f64, reference: f64) -> f64 {
    (1.0 - libm::pow(pressure / reference, EXPONENT)) * SCALE_FEET / FEET_PER_METER
}

/// Inverse of [`altitude`]
pub fn pressure(altitude: f64, reference: f64) -> f64 {
    reference * libm::pow(1.0 - altitude * FEET_PER_METER / SCALE_FEET, 1.0 / EXPONENT)
}

mod test {
    #[test]
    fn test_altitude_at_reference() {
        use super::altitude;

        assert_eq!(altitude(1013.25, 1013.25), 0.0);
        assert_eq!(altitude(950.0, 950.0), 0.0);
    }

    #[test]
    fn test_altitude() {
        use super::altitude;

        assert!((altitude(900.0, 1013.25) - 988.09).abs() < 0.01);
        assert!((altitude(1000.0, 1013.25) - 110.84).abs() < 0.01);
        assert!(altitude(1020.0, 1013.25) < 0.0);
    }

    #[test]
    fn test_pressure_inverse() {
        use super::{altitude, pressure};

        for meters in [0.0, 1.0, 250.0, 1500.0, 4000.0] {
            let p = pressure(meters, 1013.25);
            assert!((altitude(p, 1013.25) - meters).abs() < 1e-6);
        }
    }
}
