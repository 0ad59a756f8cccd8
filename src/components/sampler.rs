//! Fixed rate sampling loop.
//!
//! The schedule anchor advances by exactly one interval per cycle, measured
//! or failed, so the rate never drifts. While the vario is off nothing is
//! read; on resume the anchor restarts from the current time.

use core::time::Duration;

use embedded_hal::blocking::delay::DelayMs;
use hal::{barometer::Barometer, memory::Reclaim, telemetry::Telemetry, time::Clock};

use crate::algorithm::{altitude::altitude, round2, variometer::Variometer};
use crate::config::Config;
use crate::datastructures::altitude_log::AltitudeLog;
use crate::error::Error;
use crate::state::{Speed, VarioState};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sample {
    /// mbar
    pub pressure: f64,
    /// m
    pub altitude: f64,
    pub v_speed: Speed,
    pub integrated_v_speed: Speed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Cycle {
    Paused,
    Idle,
    /// Sensor read failed, the cycle slot is consumed
    Skipped,
    Measured(Sample),
}

pub struct Sampler<'a, B, T, C, R = ()> {
    state: &'a VarioState,
    barometer: B,
    telemetry: T,
    clock: C,
    reclaim: R,
    variometer: Variometer,
    altitudes: AltitudeLog,
    interval: Duration,
    integration_interval: f64,
    reclaim_period: u32,
    poll_interval: u32,
    last_measurement_time: Duration,
    measurement_count: u32,
    running: bool,
    sound_enabled: bool,
}

impl<'a, B, T, C, R> Sampler<'a, B, T, C, R>
where
    B: Barometer,
    T: Telemetry,
    C: Clock,
    R: Reclaim,
{
    /// Validates the configuration and brings the barometer up. Either
    /// failure is fatal, the loop never starts.
    pub fn start(
        config: &Config,
        state: &'a VarioState,
        mut barometer: B,
        telemetry: T,
        clock: C,
        reclaim: R,
    ) -> Result<Self, Error<B::Error>> {
        config.validate().map_err(Error::Config)?;
        let calibration = barometer.initialize().map_err(Error::SensorInit)?;
        info!("Barometer initialized, calibration {:?}", calibration);
        let measurement = &config.measurement;
        let now = clock.now();
        Ok(Self {
            state,
            barometer,
            telemetry,
            clock,
            reclaim,
            variometer: Variometer::new(measurement.sample_rate, measurement.minimal_delay),
            altitudes: AltitudeLog::new(config.window_len()),
            interval: config.interval(),
            integration_interval: measurement.integration_interval as f64,
            reclaim_period: config.reclaim_period(),
            poll_interval: measurement.poll_interval,
            last_measurement_time: now,
            measurement_count: 0,
            running: state.is_turned_on(),
            sound_enabled: state.is_sound_enabled(),
        })
    }

    #[cfg(test)]
    pub(crate) fn altitudes(&self) -> &AltitudeLog {
        &self.altitudes
    }

    fn observe(&mut self, now: Duration) {
        let running = self.state.is_turned_on();
        if running != self.running {
            self.running = running;
            if running {
                info!("Vario started");
                self.last_measurement_time = now;
            } else {
                info!("Vario stopped");
            }
        }
        let sound_enabled = self.state.is_sound_enabled();
        if sound_enabled != self.sound_enabled {
            self.sound_enabled = sound_enabled;
            info!("Sound {}", if sound_enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn poll(&mut self) -> Cycle {
        let now = self.clock.now();
        self.observe(now);
        if !self.running {
            return Cycle::Paused;
        }
        if now.saturating_sub(self.last_measurement_time) < self.interval {
            return Cycle::Idle;
        }
        self.measure()
    }

    /// One measuring cycle, regardless of the schedule.
    pub fn measure(&mut self) -> Cycle {
        self.last_measurement_time += self.interval;
        let pressure = match self.barometer.read_pressure() {
            Ok(pressure) => pressure,
            Err(e) => {
                warn!("Measurement error: {:?}", e);
                return Cycle::Skipped;
            }
        };

        let altitude = altitude(pressure, self.state.estimated_local_pressure());
        self.altitudes.push(altitude);

        let (variometer, altitudes) = (&self.variometer, &self.altitudes);
        let v_speed = self.state.update_v_speed(|previous| {
            round2(variometer.update(altitudes, previous))
        });

        let delta = self.altitudes.latest() - self.altitudes.oldest();
        let integrated = self.state.set_integrated_v_speed(round2(delta / self.integration_interval));

        if v_speed.changed() {
            self.telemetry.v_speed(v_speed.current);
        }
        if integrated.changed() {
            self.telemetry.integrated_v_speed(integrated.current);
        }

        self.measurement_count += 1;
        if self.measurement_count >= self.reclaim_period {
            self.measurement_count = 0;
            trace!("Reclaim memory");
            self.reclaim.reclaim();
        }
        Cycle::Measured(Sample { pressure, altitude, v_speed, integrated_v_speed: integrated })
    }

    pub fn run<D: DelayMs<u32>>(&mut self, delay: &mut D) -> ! {
        let paused_sleep = self.interval.as_millis() as u32;
        loop {
            match self.poll() {
                Cycle::Paused => delay.delay_ms(paused_sleep),
                Cycle::Idle => delay.delay_ms(self.poll_interval),
                Cycle::Skipped | Cycle::Measured(_) => continue,
            }
        }
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[test]
    fn test_start_rejects_invalid_config() {
        use super::Sampler;
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::{self, Config};
        use crate::error::Error;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let mut config = Config::default();
        config.measurement.sample_rate = 0;
        let barometer = FnBarometer::new(|_| Some(1013.25));
        let result = Sampler::start(&config, &state, barometer, telemetry, &clock, ());
        assert!(matches!(result, Err(Error::Config(config::Error::SampleRate(0)))));
    }

    #[test]
    fn test_start_sensor_init_fault() {
        use super::Sampler;
        use crate::components::fake::{Fault, FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::error::Error;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let mut barometer = FnBarometer::new(|_| Some(1013.25));
        barometer.init_fails = true;
        let result = Sampler::start(&Config::default(), &state, barometer, telemetry, &clock, ());
        assert!(matches!(result, Err(Error::SensorInit(Fault))));
    }

    #[test]
    fn test_fixed_rate_schedule() {
        use super::{Cycle, Sampler};
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let barometer = FnBarometer::new(|_| Some(1013.25));
        let config = Config::default();
        let mut sampler = Sampler::start(&config, &state, barometer, telemetry, &clock, ()).unwrap();

        assert_eq!(sampler.poll(), Cycle::Idle);
        clock.advance(19);
        assert_eq!(sampler.poll(), Cycle::Idle);
        clock.advance(1);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        assert_eq!(sampler.poll(), Cycle::Idle);

        // late poll: the missed slot is caught up, anchor stays on the grid
        clock.advance(35);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        assert!(matches!(sampler.poll(), Cycle::Idle));
        clock.advance(5);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
    }

    #[test]
    fn test_sensor_fault_skips_cycle() {
        use super::{Cycle, Sampler};
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let barometer = FnBarometer::new(|i| if i == 1 { None } else { Some(1013.25) });
        let mut sampler =
            Sampler::start(&Config::default(), &state, barometer, telemetry, &clock, ()).unwrap();

        clock.advance(20);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        clock.advance(20);
        assert_eq!(sampler.poll(), Cycle::Skipped);
        assert_eq!(sampler.poll(), Cycle::Idle);
        clock.advance(20);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        assert_eq!(sampler.altitudes().latest(), 0.0);
    }

    #[test]
    fn test_paused_and_resume() {
        use super::{Cycle, Sampler};
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, false);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let mut reads = 0;
        let barometer = FnBarometer::new(|_| {
            reads += 1;
            Some(1013.25)
        });
        let mut sampler =
            Sampler::start(&Config::default(), &state, barometer, telemetry, &clock, ()).unwrap();

        clock.advance(1000);
        assert_eq!(sampler.poll(), Cycle::Paused);
        state.toggle();
        clock.advance(5);
        // anchor restarts at resume, no backlog of missed cycles
        assert_eq!(sampler.poll(), Cycle::Idle);
        clock.advance(20);
        assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        assert_eq!(sampler.poll(), Cycle::Idle);
        state.toggle();
        clock.advance(20);
        assert_eq!(sampler.poll(), Cycle::Paused);
        drop(sampler);
        assert_eq!(reads, 1);
    }

    #[test]
    fn test_reclaim_period() {
        use super::{Cycle, Sampler};
        use crate::components::fake::{
            FakeClock, FnBarometer, ReclaimCounter, RecordingTelemetry,
        };
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        let mut counter = ReclaimCounter::default();
        let barometer = FnBarometer::new(|_| Some(1013.25));
        let config = Config::default();
        let mut sampler =
            Sampler::start(&config, &state, barometer, telemetry, &clock, &mut counter).unwrap();
        for _ in 0..250 {
            clock.advance(20);
            assert!(matches!(sampler.poll(), Cycle::Measured(_)));
        }
        drop(sampler);
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_telemetry_on_change() {
        use super::{Cycle, Sampler};
        use crate::algorithm::altitude::pressure;
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let clock = FakeClock::default();
        let mut telemetry = RecordingTelemetry::default();
        // flat for 10 samples, then a 1 m step
        let barometer =
            FnBarometer::new(|i| Some(pressure(if i < 10 { 0.0 } else { 1.0 }, 1013.25)));
        let config = Config::default();
        let mut sampler =
            Sampler::start(&config, &state, barometer, &mut telemetry, &clock, ()).unwrap();
        for _ in 0..10 {
            clock.advance(20);
            let cycle = sampler.poll();
            let Cycle::Measured(sample) = cycle else { panic!("{:?}", cycle) };
            assert_eq!(sample.v_speed.current, 0.0);
        }
        clock.advance(20);
        let Cycle::Measured(sample) = sampler.poll() else { panic!() };
        assert!(sample.v_speed.current > 0.0);
        assert_eq!(sample.integrated_v_speed.current, 0.08);
        drop(sampler);
        assert_eq!(telemetry.v_speeds.len(), 1);
        assert_eq!(telemetry.integrated, [0.08]);
        assert_eq!(state.integrated_v_speed(), 0.08);
    }

    #[test]
    fn test_rate_not_dividing_millisecond() {
        use hal::time::Clock;

        use super::{Cycle, Sampler};
        use crate::algorithm::altitude::pressure;
        use crate::components::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use crate::config::Config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (clock, telemetry) = (FakeClock::default(), RecordingTelemetry::default());
        // 1 m/s climb following the clock, not the read count
        let barometer = FnBarometer::new(|_| Some(pressure(clock.now().as_secs_f64(), 1013.25)));
        let mut config = Config::default();
        config.measurement.sample_rate = 600;
        let mut sampler = Sampler::start(&config, &state, barometer, telemetry, &clock, ()).unwrap();

        let mut measured = 0;
        for _ in 0..20_000 {
            clock.advance(1);
            if let Cycle::Measured(_) = sampler.poll() {
                measured += 1;
            }
        }
        drop(sampler);
        assert!((11_999..=12_000).contains(&measured));
        assert!((state.v_speed() - 1.0).abs() <= 0.05);
        assert!((state.integrated_v_speed() - 1.0).abs() <= 0.02);
    }
}
