use fugit::{HertzU32 as Hertz, MillisDurationU32 as Duration};

pub trait Buzzer {
    /// Blocks the caller for `duration`
    fn play_tone(&mut self, frequency: Hertz, duration: Duration);
    fn silence(&mut self);
}

impl<B: Buzzer + ?Sized> Buzzer for &mut B {
    fn play_tone(&mut self, frequency: Hertz, duration: Duration) {
        (**self).play_tone(frequency, duration)
    }

    fn silence(&mut self) {
        (**self).silence()
    }
}
