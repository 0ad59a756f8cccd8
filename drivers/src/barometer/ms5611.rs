//! TE MS5611 barometer over I2C.

use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};
use hal::barometer::Barometer;

/// CSB pulled low
pub const ADDRESS: u8 = 0x77;
/// CSB pulled high
pub const ALTERNATE_ADDRESS: u8 = 0x76;

const RESET: u8 = 0x1E;
const CONVERT_D1: u8 = 0x40;
const CONVERT_D2: u8 = 0x50;
const ADC_READ: u8 = 0x00;
const PROM_READ: u8 = 0xA2;
const RESET_DELAY_MS: u32 = 3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Oversampling {
    OSR256 = 0,
    OSR512 = 2,
    OSR1024 = 4,
    OSR2048 = 6,
    OSR4096 = 8,
}

impl Oversampling {
    /// Worst case conversion time in ms
    fn conversion_time(self) -> u32 {
        match self {
            Self::OSR256 => 1,
            Self::OSR512 => 2,
            Self::OSR1024 => 3,
            Self::OSR2048 => 5,
            Self::OSR4096 => 10,
        }
    }
}

impl Default for Oversampling {
    fn default() -> Self {
        Self::OSR4096
    }
}

#[derive(Debug, PartialEq)]
pub enum Error<E> {
    Bus(E),
    NotDetected,
    InvalidCalibration,
    NotInitialized,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "I2C error {:?}", e),
            Self::NotDetected => write!(f, "MS5611 not responding"),
            Self::InvalidCalibration => write!(f, "MS5611 PROM content invalid"),
            Self::NotInitialized => write!(f, "MS5611 not initialized"),
        }
    }
}

/// Factory calibration C1..C6
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CalibrationCoefficients(pub [u16; 6]);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Compensated {
    /// 0.01 mbar
    pub pressure: i64,
    /// 0.01 °C
    pub temperature: i64,
}

impl Compensated {
    pub fn mbar(&self) -> f64 {
        self.pressure as f64 / 100.0
    }

    pub fn celsius(&self) -> f64 {
        self.temperature as f64 / 100.0
    }
}

impl CalibrationCoefficients {
    pub fn from_bytes(bytes: &[u8; 12]) -> Self {
        let mut words = [0u16; 6];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Self(words)
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|&word| word != 0 && word != u16::MAX)
    }

    fn c(&self, index: usize) -> i64 {
        self.0[index - 1] as i64
    }

    /// Datasheet compensation including the second order low temperature terms.
    pub fn compensate(&self, d1: u32, d2: u32) -> Compensated {
        let (d1, d2) = (d1 as i64, d2 as i64);
        let dt = d2 - (self.c(5) << 8);
        let mut temperature = 2000 + ((dt * self.c(6)) >> 23);
        let mut offset = (self.c(2) << 16) + ((self.c(4) * dt) >> 7);
        let mut sensitivity = (self.c(1) << 15) + ((self.c(3) * dt) >> 8);

        if temperature < 2000 {
            let cold = (temperature - 2000) * (temperature - 2000);
            let mut offset2 = (5 * cold) >> 1;
            let mut sensitivity2 = (5 * cold) >> 2;
            if temperature < -1500 {
                let very_cold = (temperature + 1500) * (temperature + 1500);
                offset2 += 7 * very_cold;
                sensitivity2 += (11 * very_cold) >> 1;
            }
            temperature -= (dt * dt) >> 31;
            offset -= offset2;
            sensitivity -= sensitivity2;
        }

        let pressure = (((d1 * sensitivity) >> 21) - offset) >> 15;
        Compensated { pressure, temperature }
    }
}

pub struct Ms5611<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    oversampling: Oversampling,
    calibration: Option<CalibrationCoefficients>,
}

impl<E, I2C, D> Ms5611<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u32>,
{
    pub fn new(i2c: I2C, delay: D, address: u8, oversampling: Oversampling) -> Self {
        Self { i2c, delay, address, oversampling, calibration: None }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read_prom(&mut self) -> Result<CalibrationCoefficients, Error<E>> {
        let mut bytes = [0u8; 12];
        for (i, word) in bytes.chunks_exact_mut(2).enumerate() {
            let command = PROM_READ + 2 * i as u8;
            self.i2c.write_read(self.address, &[command], word).map_err(Error::Bus)?;
        }
        Ok(CalibrationCoefficients::from_bytes(&bytes))
    }

    fn convert(&mut self, command: u8) -> Result<u32, Error<E>> {
        let command = command + self.oversampling as u8;
        self.i2c.write(self.address, &[command]).map_err(Error::Bus)?;
        self.delay.delay_ms(self.oversampling.conversion_time());
        let mut bytes = [0u8; 3];
        self.i2c.write_read(self.address, &[ADC_READ], &mut bytes).map_err(Error::Bus)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_compensated(&mut self) -> Result<Compensated, Error<E>> {
        let calibration = self.calibration.ok_or(Error::NotInitialized)?;
        let d1 = self.convert(CONVERT_D1)?;
        let d2 = self.convert(CONVERT_D2)?;
        Ok(calibration.compensate(d1, d2))
    }
}

impl<E, I2C, D> Barometer for Ms5611<I2C, D>
where
    E: core::fmt::Debug,
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u32>,
{
    type Calibration = CalibrationCoefficients;
    type Error = Error<E>;

    fn initialize(&mut self) -> Result<CalibrationCoefficients, Error<E>> {
        self.i2c.write(self.address, &[RESET]).map_err(|_| Error::NotDetected)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        let calibration = self.read_prom()?;
        if !calibration.is_valid() {
            return Err(Error::InvalidCalibration);
        }
        debug!("MS5611 calibration {:?}", calibration.0);
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    fn read_pressure(&mut self) -> Result<f64, Error<E>> {
        self.read_compensated().map(|compensated| compensated.mbar())
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[cfg(test)]
    use std::vec::Vec;

    #[cfg(test)]
    const PROM: [u8; 12] = hex_literal::hex!("9cbf 903c 5b15 5af2 82b8 6e98");

    #[cfg(test)]
    #[derive(Debug, PartialEq)]
    struct Nack;

    #[cfg(test)]
    #[derive(Default)]
    struct MockI2c {
        prom: [u8; 12],
        d1: u32,
        d2: u32,
        present: bool,
        nack_adc: bool,
        converting: Option<u8>,
        writes: Vec<u8>,
    }

    #[cfg(test)]
    impl embedded_hal::blocking::i2c::Write for MockI2c {
        type Error = Nack;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Nack> {
            if !self.present || address != super::ADDRESS {
                return Err(Nack);
            }
            self.writes.extend_from_slice(bytes);
            if bytes[0] & 0xF0 == 0x40 || bytes[0] & 0xF0 == 0x50 {
                self.converting = Some(bytes[0]);
            }
            Ok(())
        }
    }

    #[cfg(test)]
    impl embedded_hal::blocking::i2c::WriteRead for MockI2c {
        type Error = Nack;

        fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Nack> {
            if !self.present || address != super::ADDRESS {
                return Err(Nack);
            }
            match bytes[0] {
                0x00 if self.nack_adc => return Err(Nack),
                0x00 => {
                    let value = match self.converting.take().map(|c| c & 0xF0) {
                        Some(0x40) => self.d1,
                        Some(0x50) => self.d2,
                        _ => 0,
                    };
                    buffer.copy_from_slice(&value.to_be_bytes()[1..]);
                }
                command @ 0xA2..=0xAC => {
                    let index = (command - 0xA2) as usize;
                    buffer.copy_from_slice(&self.prom[index..index + 2]);
                }
                _ => return Err(Nack),
            }
            Ok(())
        }
    }

    #[cfg(test)]
    struct NoDelay;

    #[cfg(test)]
    impl embedded_hal::blocking::delay::DelayMs<u32> for NoDelay {
        fn delay_ms(&mut self, _ms: u32) {}
    }

    #[test]
    fn test_compensate() {
        use super::{CalibrationCoefficients, Compensated};

        let calibration = CalibrationCoefficients::from_bytes(&PROM);
        assert_eq!(calibration.0, [40127, 36924, 23317, 23282, 33464, 28312]);
        let compensated = calibration.compensate(9085466, 8569150);
        assert_eq!(compensated, Compensated { pressure: 100009, temperature: 2007 });
        assert_eq!(compensated.mbar(), 1000.09);
        assert_eq!(compensated.celsius(), 20.07);
    }

    #[test]
    fn test_compensate_below_20_celsius() {
        use super::{CalibrationCoefficients, Compensated};

        let calibration = CalibrationCoefficients::from_bytes(&PROM);
        let compensated = calibration.compensate(9085466, 8000000);
        assert_eq!(compensated, Compensated { pressure: 95989, temperature: -62 });
    }

    #[test]
    fn test_read_pressure() {
        use hal::barometer::Barometer;

        use super::{Ms5611, Oversampling, ADDRESS};

        let i2c = MockI2c { prom: PROM, d1: 9085466, d2: 8569150, present: true, ..Default::default() };
        let mut ms5611 = Ms5611::new(i2c, NoDelay, ADDRESS, Oversampling::OSR4096);
        let calibration = ms5611.initialize().unwrap();
        assert_eq!(calibration.0[0], 40127);
        assert_eq!(ms5611.read_pressure().unwrap(), 1000.09);
        let (i2c, _) = ms5611.release();
        assert_eq!(i2c.writes, [0x1E, 0x48, 0x58]);
    }

    #[test]
    fn test_oversampling_command() {
        use hal::barometer::Barometer;

        use super::{Ms5611, Oversampling, ADDRESS};

        let i2c = MockI2c { prom: PROM, d1: 9085466, d2: 8569150, present: true, ..Default::default() };
        let mut ms5611 = Ms5611::new(i2c, NoDelay, ADDRESS, Oversampling::OSR256);
        ms5611.initialize().unwrap();
        ms5611.read_pressure().unwrap();
        let (i2c, _) = ms5611.release();
        assert_eq!(i2c.writes, [0x1E, 0x40, 0x50]);
    }

    #[test]
    fn test_not_detected() {
        use hal::barometer::Barometer;

        use super::{Error, Ms5611, Oversampling, ADDRESS};

        let mut ms5611 = Ms5611::new(MockI2c::default(), NoDelay, ADDRESS, Oversampling::default());
        assert_eq!(ms5611.initialize(), Err(Error::NotDetected));
    }

    #[test]
    fn test_invalid_calibration() {
        use hal::barometer::Barometer;

        use super::{Error, Ms5611, Oversampling, ADDRESS};

        let i2c = MockI2c { present: true, ..Default::default() };
        let mut ms5611 = Ms5611::new(i2c, NoDelay, ADDRESS, Oversampling::default());
        assert_eq!(ms5611.initialize(), Err(Error::InvalidCalibration));
        assert_eq!(ms5611.read_pressure(), Err(Error::NotInitialized));
    }

    #[test]
    fn test_bus_error() {
        use hal::barometer::Barometer;

        use super::{Error, Ms5611, Oversampling, ADDRESS};

        let i2c = MockI2c { prom: PROM, present: true, nack_adc: true, ..Default::default() };
        let mut ms5611 = Ms5611::new(i2c, NoDelay, ADDRESS, Oversampling::default());
        ms5611.initialize().unwrap();
        assert_eq!(ms5611.read_pressure(), Err(Error::Bus(Nack)));
    }
}
