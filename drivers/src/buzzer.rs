use embedded_hal::{blocking::delay::DelayMs, Pwm};
use fugit::{HertzU32 as Hertz, MillisDurationU32 as Duration};
use hal::buzzer::Buzzer;

/// Passive buzzer on one PWM channel, square wave at 50% duty.
pub struct PwmBuzzer<P: Pwm, D> {
    pwm: P,
    channel: P::Channel,
    delay: D,
}

impl<P, D> PwmBuzzer<P, D>
where
    P: Pwm<Duty = u16>,
    P::Channel: Copy,
    Hertz: Into<P::Time>,
    D: DelayMs<u32>,
{
    pub fn new(mut pwm: P, channel: P::Channel, delay: D) -> Self {
        pwm.disable(channel);
        Self { pwm, channel, delay }
    }
}

impl<P, D> Buzzer for PwmBuzzer<P, D>
where
    P: Pwm<Duty = u16>,
    P::Channel: Copy,
    Hertz: Into<P::Time>,
    D: DelayMs<u32>,
{
    fn play_tone(&mut self, frequency: Hertz, duration: Duration) {
        if frequency.raw() == 0 {
            self.silence();
            self.delay.delay_ms(duration.ticks());
            return;
        }
        self.pwm.set_period(frequency);
        let duty = self.pwm.get_max_duty() / 2;
        self.pwm.set_duty(self.channel, duty);
        self.pwm.enable(self.channel);
        self.delay.delay_ms(duration.ticks());
        self.pwm.disable(self.channel);
    }

    fn silence(&mut self) {
        self.pwm.disable(self.channel);
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[cfg(test)]
    use std::{cell::RefCell, vec::Vec};

    #[cfg(test)]
    #[derive(Debug, PartialEq)]
    enum Event {
        Period(u32),
        Duty(u16),
        Enable,
        Disable,
        Delay(u32),
    }

    #[cfg(test)]
    struct MockPwm<'a>(&'a RefCell<Vec<Event>>);

    #[cfg(test)]
    impl<'a> embedded_hal::Pwm for MockPwm<'a> {
        type Channel = ();
        type Time = fugit::HertzU32;
        type Duty = u16;

        fn disable(&mut self, _: ()) {
            self.0.borrow_mut().push(Event::Disable)
        }

        fn enable(&mut self, _: ()) {
            self.0.borrow_mut().push(Event::Enable)
        }

        fn get_period(&self) -> fugit::HertzU32 {
            fugit::HertzU32::from_raw(0)
        }

        fn get_duty(&self, _: ()) -> u16 {
            0
        }

        fn get_max_duty(&self) -> u16 {
            1000
        }

        fn set_duty(&mut self, _: (), duty: u16) {
            self.0.borrow_mut().push(Event::Duty(duty))
        }

        fn set_period<P: Into<fugit::HertzU32>>(&mut self, period: P) {
            self.0.borrow_mut().push(Event::Period(period.into().raw()))
        }
    }

    #[cfg(test)]
    struct MockDelay<'a>(&'a RefCell<Vec<Event>>);

    #[cfg(test)]
    impl<'a> embedded_hal::blocking::delay::DelayMs<u32> for MockDelay<'a> {
        fn delay_ms(&mut self, ms: u32) {
            self.0.borrow_mut().push(Event::Delay(ms))
        }
    }

    #[test]
    fn test_play_tone() {
        use fugit::{HertzU32, MillisDurationU32};
        use hal::buzzer::Buzzer;

        use super::PwmBuzzer;

        let events = RefCell::new(Vec::new());
        let mut buzzer = PwmBuzzer::new(MockPwm(&events), (), MockDelay(&events));
        buzzer.play_tone(HertzU32::from_raw(1400), MillisDurationU32::from_ticks(150));
        let expected = [
            Event::Disable,
            Event::Period(1400),
            Event::Duty(500),
            Event::Enable,
            Event::Delay(150),
            Event::Disable,
        ];
        assert_eq!(*events.borrow(), expected);
    }

    #[test]
    fn test_zero_frequency_is_silence() {
        use fugit::{HertzU32, MillisDurationU32};
        use hal::buzzer::Buzzer;

        use super::PwmBuzzer;

        let events = RefCell::new(Vec::new());
        let mut buzzer = PwmBuzzer::new(MockPwm(&events), (), MockDelay(&events));
        events.borrow_mut().clear();
        buzzer.play_tone(HertzU32::from_raw(0), MillisDurationU32::from_ticks(200));
        assert_eq!(*events.borrow(), [Event::Disable, Event::Delay(200)]);
    }
}
