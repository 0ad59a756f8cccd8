//! Synthetic barometer following a scripted flight profile.

use std::f64::consts::PI;

use hal::{barometer::Barometer, time::Clock};
use pro_vario::algorithm::altitude::pressure;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fault;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Thermal {
    /// m
    pub amplitude: f64,
    /// s
    pub period: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Profile {
    /// m above the reference level at boot
    pub start_altitude: f64,
    /// m/s
    pub climb: f64,
    pub thermal: Option<Thermal>,
    /// Fail every n-th read
    pub dropout: Option<u32>,
}

impl Default for Profile {
    fn default() -> Self {
        Self { start_altitude: 0.0, climb: 0.0, thermal: None, dropout: None }
    }
}

impl Profile {
    pub fn altitude(&self, seconds: f64) -> f64 {
        let mut altitude = self.start_altitude + self.climb * seconds;
        if let Some(thermal) = self.thermal {
            altitude += thermal.amplitude * (2.0 * PI * seconds / thermal.period).sin();
        }
        altitude
    }
}

pub struct Atmosphere<C> {
    profile: Profile,
    reference: f64,
    clock: C,
    boot: f64,
    reads: u32,
}

impl<C: Clock> Atmosphere<C> {
    pub fn new(profile: Profile, reference: f64, clock: C) -> Self {
        let boot = clock.now().as_secs_f64();
        Self { profile, reference, clock, boot, reads: 0 }
    }
}

impl<C: Clock> Barometer for Atmosphere<C> {
    type Calibration = Profile;
    type Error = Fault;

    fn initialize(&mut self) -> Result<Profile, Fault> {
        Ok(self.profile)
    }

    fn read_pressure(&mut self) -> Result<f64, Fault> {
        self.reads = self.reads.wrapping_add(1);
        if let Some(n) = self.profile.dropout {
            if n > 0 && self.reads % n == 0 {
                return Err(Fault);
            }
        }
        let seconds = self.clock.now().as_secs_f64() - self.boot;
        let altitude = self.profile.altitude(seconds);
        trace!("Synthetic altitude {:.2} m", altitude);
        Ok(pressure(altitude, self.reference))
    }
}

mod test {
    #[cfg(test)]
    use std::{cell::Cell, time::Duration};

    #[cfg(test)]
    struct StepClock(Cell<Duration>);

    #[cfg(test)]
    impl hal::time::Clock for StepClock {
        fn now(&self) -> Duration {
            self.0.get()
        }
    }

    #[test]
    fn test_climb_profile() {
        use hal::barometer::Barometer;
        use pro_vario::algorithm::altitude::altitude;

        use super::{Atmosphere, Profile};

        let clock = StepClock(Cell::new(Duration::from_secs(3)));
        let profile = Profile { climb: 2.0, ..Default::default() };
        let mut atmosphere = Atmosphere::new(profile, 1013.25, &clock);
        assert_eq!(atmosphere.read_pressure(), Ok(1013.25));
        clock.0.set(Duration::from_secs(13));
        let pressure = atmosphere.read_pressure().unwrap();
        assert!((altitude(pressure, 1013.25) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_thermal() {
        use super::{Profile, Thermal};

        let thermal = Thermal { amplitude: 5.0, period: 20.0 };
        let profile = Profile { start_altitude: 100.0, thermal: Some(thermal), ..Default::default() };
        assert!((profile.altitude(5.0) - 105.0).abs() < 1e-9);
        assert!((profile.altitude(15.0) - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_dropout() {
        use hal::barometer::Barometer;

        use super::{Atmosphere, Fault, Profile};

        let clock = StepClock(Cell::new(Duration::ZERO));
        let profile = Profile { dropout: Some(3), ..Default::default() };
        let mut atmosphere = Atmosphere::new(profile, 1013.25, &clock);
        assert!(atmosphere.read_pressure().is_ok());
        assert!(atmosphere.read_pressure().is_ok());
        assert_eq!(atmosphere.read_pressure(), Err(Fault));
        assert!(atmosphere.read_pressure().is_ok());
    }
}
