/// Pressure sensor as seen by the sampling loop.
///
/// `initialize` runs once at boot and hands back the factory calibration the
/// driver loaded; a failure there is fatal. A failed `read_pressure` only
/// costs one sample.
pub trait Barometer {
    type Calibration: core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn initialize(&mut self) -> Result<Self::Calibration, Self::Error>;

    /// Calibrated pressure in mbar
    fn read_pressure(&mut self) -> Result<f64, Self::Error>;
}

impl<B: Barometer + ?Sized> Barometer for &mut B {
    type Calibration = B::Calibration;
    type Error = B::Error;

    fn initialize(&mut self) -> Result<Self::Calibration, Self::Error> {
        (**self).initialize()
    }

    fn read_pressure(&mut self) -> Result<f64, Self::Error> {
        (**self).read_pressure()
    }
}
