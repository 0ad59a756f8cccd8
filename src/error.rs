use core::fmt::{Debug, Display, Formatter, Result};

use crate::config;

/// Fatal boot failure, the sampling loop does not start.
#[derive(Debug)]
pub enum Error<E> {
    Config(config::Error),
    SensorInit(E),
}

impl<E: Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Config(e) => write!(f, "Invalid configuration: {}", e),
            Self::SensorInit(e) => write!(f, "Barometer initialization failed: {:?}", e),
        }
    }
}

impl<E> From<config::Error> for Error<E> {
    fn from(e: config::Error) -> Self {
        Self::Config(e)
    }
}

mod test {
    #[test]
    fn test_display() {
        extern crate std;

        use std::string::ToString;

        use super::Error;
        use crate::config;

        let error: Error<()> = config::Error::SampleRate(0).into();
        assert_eq!(error.to_string(), "Invalid configuration: Sample rate 0 Hz out of range 1..=1000");
        let error: Error<&str> = Error::SensorInit("nack");
        assert_eq!(error.to_string(), "Barometer initialization failed: \"nack\"");
    }
}
