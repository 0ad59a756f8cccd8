/// Fire-and-forget display sink. Implementations swallow their own failures.
pub trait Telemetry {
    fn v_speed(&mut self, v_speed: f64);
    fn integrated_v_speed(&mut self, v_speed: f64);
}

impl<T: Telemetry + ?Sized> Telemetry for &mut T {
    fn v_speed(&mut self, v_speed: f64) {
        (**self).v_speed(v_speed)
    }

    fn integrated_v_speed(&mut self, v_speed: f64) {
        (**self).integrated_v_speed(v_speed)
    }
}
