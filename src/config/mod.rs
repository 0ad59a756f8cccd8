pub mod setter;

use core::str::Split;
use core::time::Duration;

use serde::{Deserialize, Serialize};

pub use setter::{SetError, Setter, Value};

pub const MAX_SAMPLE_RATE: u32 = 1000;
/// Altitude samples kept for the integrated vertical speed
pub const MAX_WINDOW_LEN: usize = 1 << 16;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error {
    SampleRate(u32),
    WindowTooShort(usize),
    WindowTooLong,
    MinimalDelay,
    IntegrationInterval,
    BasePressure,
    Thresholds,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::SampleRate(rate) => {
                write!(f, "Sample rate {} Hz out of range 1..={}", rate, MAX_SAMPLE_RATE)
            }
            Self::WindowTooShort(len) => write!(f, "Altitude window of {} samples too short", len),
            Self::WindowTooLong => {
                write!(f, "Altitude window exceeds {} samples", MAX_WINDOW_LEN)
            }
            Self::MinimalDelay => write!(f, "Minimal delay must be positive"),
            Self::IntegrationInterval => write!(f, "Integration interval must be positive"),
            Self::BasePressure => write!(f, "Base pressure must be positive"),
            Self::Thresholds => write!(f, "Positive threshold below negative threshold"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Measurement {
    /// Hz
    pub sample_rate: u32,
    /// Seconds averaged by the integrated vertical speed
    pub integration_interval: u32,
    /// Seconds, span of the short velocity term
    pub minimal_delay: f64,
    /// mbar at the altitude reference
    pub base_pressure: f64,
    /// ms slept between schedule checks
    pub poll_interval: u32,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            sample_rate: 50,
            integration_interval: 12,
            minimal_delay: 0.1,
            base_pressure: 1013.25,
            poll_interval: 1,
        }
    }
}

impl Setter for Measurement {
    fn set(&mut self, path: &mut Split<char>, value: Value) -> Result<(), SetError> {
        let default = Self::default();
        match path.next().ok_or(SetError::MalformedPath)? {
            "sample-rate" => self.sample_rate = value.parse_or(default.sample_rate)?,
            "integration-interval" => {
                self.integration_interval = value.parse_or(default.integration_interval)?
            }
            "minimal-delay" => self.minimal_delay = value.parse_or(default.minimal_delay)?,
            "base-pressure" => self.base_pressure = value.parse_or(default.base_pressure)?,
            "poll-interval" => self.poll_interval = value.parse_or(default.poll_interval)?,
            _ => return Err(SetError::MalformedPath),
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Audio {
    /// m/s, tones are emitted above
    pub positive_threshold: f64,
    /// m/s, tones are emitted below
    pub negative_threshold: f64,
    pub buzzer_pin: u8,
    /// ms
    pub idle_sleep: u32,
}

impl Default for Audio {
    fn default() -> Self {
        Self { positive_threshold: 0.1, negative_threshold: -1.0, buzzer_pin: 4, idle_sleep: 100 }
    }
}

impl Setter for Audio {
    fn set(&mut self, path: &mut Split<char>, value: Value) -> Result<(), SetError> {
        let default = Self::default();
        match path.next().ok_or(SetError::MalformedPath)? {
            "positive-threshold" => {
                self.positive_threshold = value.parse_or(default.positive_threshold)?
            }
            "negative-threshold" => {
                self.negative_threshold = value.parse_or(default.negative_threshold)?
            }
            "buzzer-pin" => self.buzzer_pin = value.parse_or(default.buzzer_pin)?,
            "idle-sleep" => self.idle_sleep = value.parse_or(default.idle_sleep)?,
            _ => return Err(SetError::MalformedPath),
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Toggle {
    /// ms
    pub debounce: u32,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { debounce: 300 }
    }
}

impl Setter for Toggle {
    fn set(&mut self, path: &mut Split<char>, value: Value) -> Result<(), SetError> {
        match path.next().ok_or(SetError::MalformedPath)? {
            "debounce" => self.debounce = value.parse_or(Self::default().debounce)?,
            _ => return Err(SetError::MalformedPath),
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub measurement: Measurement,
    pub audio: Audio,
    pub toggle: Toggle,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        let measurement = &self.measurement;
        let rate = measurement.sample_rate;
        if rate == 0 || rate > MAX_SAMPLE_RATE {
            return Err(Error::SampleRate(rate));
        }
        if measurement.integration_interval == 0 {
            return Err(Error::IntegrationInterval);
        }
        let window_len = self.window_len();
        if window_len < 2 {
            return Err(Error::WindowTooShort(window_len));
        }
        if window_len > MAX_WINDOW_LEN {
            return Err(Error::WindowTooLong);
        }
        if !(measurement.minimal_delay > 0.0) {
            return Err(Error::MinimalDelay);
        }
        if !(measurement.base_pressure > 0.0) {
            return Err(Error::BasePressure);
        }
        if self.audio.positive_threshold < self.audio.negative_threshold {
            return Err(Error::Thresholds);
        }
        Ok(())
    }

    /// Fixed sampling period at nanosecond resolution
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.measurement.sample_rate.max(1) as u64)
    }

    /// Saturates instead of overflowing, `validate` rejects anything above
    /// `MAX_WINDOW_LEN`
    pub fn window_len(&self) -> usize {
        let measurement = &self.measurement;
        (measurement.integration_interval as usize).saturating_mul(measurement.sample_rate as usize)
    }

    /// Measurement cycles between two memory reclamation hints
    pub fn reclaim_period(&self) -> u32 {
        2 * self.measurement.sample_rate
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.toggle.debounce as u64)
    }
}

impl Setter for Config {
    fn set(&mut self, path: &mut Split<char>, value: Value) -> Result<(), SetError> {
        match path.next().ok_or(SetError::MalformedPath)? {
            "measurement" => self.measurement.set(path, value),
            "audio" => self.audio.set(path, value),
            "toggle" => self.toggle.set(path, value),
            _ => Err(SetError::MalformedPath),
        }
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[test]
    fn test_default() {
        use core::time::Duration;

        use super::Config;

        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.interval(), Duration::from_millis(20));
        assert_eq!(config.window_len(), 600);
        assert_eq!(config.reclaim_period(), 100);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.audio.buzzer_pin, 4);
    }

    #[test]
    fn test_deserialize_partial() {
        use super::{Config, Measurement};

        let json = r#"{"measurement": {"sample-rate": 25}, "audio": {"positive-threshold": 0.2}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let expected = Measurement { sample_rate: 25, ..Default::default() };
        assert_eq!(config.measurement, expected);
        assert_eq!(config.audio.positive_threshold, 0.2);
        assert_eq!(config.audio.negative_threshold, -1.0);
        assert_eq!(config.toggle.debounce, 300);
        assert_eq!(config.window_len(), 300);
    }

    #[test]
    fn test_serialize_kebab_case() {
        use std::string::ToString;

        use super::Config;

        let value = serde_json::to_value(&Config::default()).unwrap();
        assert_eq!(value["measurement"]["integration-interval"], 12);
        assert_eq!(value["audio"]["negative-threshold"], -1.0);
        assert_eq!(value["toggle"]["debounce"].to_string(), "300");
    }

    #[test]
    fn test_validate() {
        use super::{Config, Error};

        let mut config = Config::default();
        config.measurement.sample_rate = 0;
        assert_eq!(config.validate(), Err(Error::SampleRate(0)));
        config.measurement.sample_rate = 2000;
        assert_eq!(config.validate(), Err(Error::SampleRate(2000)));

        let mut config = Config::default();
        config.measurement.sample_rate = 1;
        config.measurement.integration_interval = 1;
        assert_eq!(config.validate(), Err(Error::WindowTooShort(1)));

        let mut config = Config::default();
        config.measurement.integration_interval = 100_000_000;
        assert_eq!(config.validate(), Err(Error::WindowTooLong));
        config.measurement.integration_interval = u32::MAX;
        config.measurement.sample_rate = 1000;
        assert_eq!(config.validate(), Err(Error::WindowTooLong));
        config.measurement.integration_interval = 65;
        assert_eq!(config.validate(), Ok(()));
        config.measurement.integration_interval = 66;
        assert_eq!(config.validate(), Err(Error::WindowTooLong));

        let mut config = Config::default();
        config.measurement.minimal_delay = f64::NAN;
        assert_eq!(config.validate(), Err(Error::MinimalDelay));

        let mut config = Config::default();
        config.measurement.base_pressure = 0.0;
        assert_eq!(config.validate(), Err(Error::BasePressure));

        let mut config = Config::default();
        config.audio.positive_threshold = -2.0;
        assert_eq!(config.validate(), Err(Error::Thresholds));
    }

    #[test]
    fn test_interval_keeps_rate() {
        use core::time::Duration;

        use super::Config;

        let mut config = Config::default();
        let periods = [(1000, 1_000_000), (600, 1_666_666), (300, 3_333_333), (7, 142_857_142)];
        for (rate, nanos) in periods {
            config.measurement.sample_rate = rate;
            assert_eq!(config.interval(), Duration::from_nanos(nanos));
            let drift = 1.0 - config.interval().as_secs_f64() * rate as f64;
            assert!(drift.abs() < 1e-6);
        }
    }

    #[test]
    fn test_set_line_oversized_window() {
        use super::{Config, Error, Setter};

        let mut config = Config::default();
        assert_eq!(config.set_line("measurement.integration-interval=100000000"), Ok(()));
        assert_eq!(config.validate(), Err(Error::WindowTooLong));
    }

    #[test]
    fn test_setter() {
        use super::{Config, SetError, Setter};

        let mut config = Config::default();
        assert_eq!(config.set_line("audio.positive-threshold=0.2"), Ok(()));
        assert_eq!(config.audio.positive_threshold, 0.2);
        assert_eq!(config.set_line("measurement.sample-rate = 20"), Ok(()));
        assert_eq!(config.measurement.sample_rate, 20);
        assert_eq!(config.set_line("measurement.sample-rate"), Ok(()));
        assert_eq!(config.measurement.sample_rate, 50);
        assert_eq!(config.set_line("toggle.debounce=abc"), Err(SetError::UnexpectedValue));
        assert_eq!(config.set_line("audio.volume=3"), Err(SetError::MalformedPath));
        assert_eq!(config.set_line("audio"), Err(SetError::MalformedPath));
        assert_eq!(config.set_line("=1"), Err(SetError::MalformedPath));
    }
}
