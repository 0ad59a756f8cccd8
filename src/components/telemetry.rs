use hal::telemetry::Telemetry;

/// Telemetry sink printing through the logger.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn v_speed(&mut self, v_speed: f64) {
        info!("Vertical Speed: {:.2} m/s", v_speed);
    }

    fn integrated_v_speed(&mut self, v_speed: f64) {
        debug!("Integrated vertical speed: {:.2} m/s", v_speed);
    }
}
