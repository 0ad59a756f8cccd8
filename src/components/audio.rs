use embedded_hal::blocking::delay::DelayMs;
use hal::{buzzer::Buzzer, io::Led};

use crate::config;
use crate::state::VarioState;

use super::tone::Tone;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    /// Vario turned off
    Off,
    /// Vario running with sound disabled
    Muted,
    /// Inside the dead band, only the pause elapsed
    Gated(Tone),
    Played(Tone),
}

/// Audio feedback task. Reads the shared vertical speed without ever waiting
/// on the lock and turns it into beeps at its own cadence.
pub struct AudioFeedback<'a, Z, L, D> {
    state: &'a VarioState,
    buzzer: Z,
    led: &'a L,
    delay: D,
    positive_threshold: f64,
    negative_threshold: f64,
    idle_sleep: u32,
    cached: f64,
}

impl<'a, Z: Buzzer, L: Led, D: DelayMs<u32>> AudioFeedback<'a, Z, L, D> {
    pub fn new(
        config: &config::Audio,
        state: &'a VarioState,
        buzzer: Z,
        led: &'a L,
        delay: D,
    ) -> Self {
        Self {
            state,
            buzzer,
            led,
            delay,
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
            idle_sleep: config.idle_sleep,
            cached: 0.0,
        }
    }

    /// Latest vertical speed, or the last one read if the sampling loop holds
    /// the lock right now.
    pub fn v_speed(&mut self) -> f64 {
        if let Some(v_speed) = self.state.try_v_speed() {
            self.cached = v_speed;
        }
        self.cached
    }

    fn gate_open(&self, v_speed: f64) -> bool {
        v_speed > self.positive_threshold || v_speed < self.negative_threshold
    }

    pub fn step(&mut self) -> Step {
        if !self.state.is_turned_on() {
            self.delay.delay_ms(self.idle_sleep);
            return Step::Off;
        }
        let v_speed = self.v_speed();
        if !self.state.is_sound_enabled() {
            self.led.set(false);
            self.delay.delay_ms(self.idle_sleep);
            return Step::Muted;
        }

        let tone = Tone::for_v_speed(v_speed);
        if !self.gate_open(v_speed) {
            self.delay.delay_ms(tone.pause.max(1));
            return Step::Gated(tone);
        }
        match tone.is_silent() {
            true => self.buzzer.silence(),
            false => self.buzzer.play_tone(tone.hertz(), tone.duration()),
        }
        if tone.pause > 0 {
            self.delay.delay_ms(tone.pause);
        }
        Step::Played(tone)
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[cfg(test)]
    use crate::components::fake::{FakeClock, FakeDelay, FakeLed, RecordingBuzzer};

    #[cfg(test)]
    fn audio<'a>(
        state: &'a crate::state::VarioState,
        buzzer: &'a mut RecordingBuzzer,
        led: &'a FakeLed,
        clock: &'a FakeClock,
    ) -> super::AudioFeedback<'a, &'a mut RecordingBuzzer, FakeLed, FakeDelay<'a>> {
        let config = crate::config::Audio::default();
        super::AudioFeedback::new(&config, state, buzzer, led, FakeDelay(clock))
    }

    #[test]
    fn test_turned_off_idles() {
        use hal::time::Clock;

        use super::Step;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, false);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let mut audio = audio(&state, &mut buzzer, &led, &clock);
        assert_eq!(audio.step(), Step::Off);
        drop(audio);
        assert_eq!(clock.now().as_millis(), 100);
        assert!(buzzer.0.is_empty());
    }

    #[test]
    fn test_muted_turns_led_off() {
        use core::sync::atomic::Ordering;

        use hal::io::Led;
        use hal::time::Clock;

        use super::Step;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        state.update_v_speed(|_| 2.0);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        led.set(true);
        state.set_sound_enabled(false);
        let mut audio = audio(&state, &mut buzzer, &led, &clock);
        assert_eq!(audio.step(), Step::Muted);
        drop(audio);
        assert!(!led.0.load(Ordering::Relaxed));
        assert_eq!(clock.now().as_millis(), 100);
        assert!(buzzer.0.is_empty());
    }

    #[test]
    fn test_tone_played() {
        use hal::time::Clock;

        use super::Step;
        use crate::components::tone::Tone;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        state.update_v_speed(|_| 1.2);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let mut audio = audio(&state, &mut buzzer, &led, &clock);
        let tone = Tone { frequency: 1600, duration: 120, pause: 80 };
        assert_eq!(audio.step(), Step::Played(tone));
        state.update_v_speed(|_| -2.5);
        let tone = Tone { frequency: 300, duration: 500, pause: 0 };
        assert_eq!(audio.step(), Step::Played(tone));
        drop(audio);
        assert_eq!(buzzer.0, [Some((1600, 120)), Some((300, 500))]);
        // playback blocks inside the buzzer, only pauses go through the delay
        assert_eq!(clock.now().as_millis(), 80);
    }

    #[test]
    fn test_dead_band_gate() {
        use hal::time::Clock;

        use super::Step;
        use crate::components::tone::Tone;
        use crate::config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());

        // table band 500 Hz but inside the configured gate
        let config = config::Audio { negative_threshold: -1.0, ..Default::default() };
        let mut audio = super::AudioFeedback::new(
            &config,
            &state,
            &mut buzzer,
            &led,
            FakeDelay(&clock),
        );
        state.update_v_speed(|_| -0.8);
        let tone = Tone { frequency: 500, duration: 300, pause: 100 };
        assert_eq!(audio.step(), Step::Gated(tone));
        state.update_v_speed(|_| 0.0);
        assert_eq!(audio.step(), Step::Gated(crate::components::tone::SILENT));
        drop(audio);
        assert!(buzzer.0.is_empty());
        assert_eq!(clock.now().as_millis(), 300);
    }

    #[test]
    fn test_gate_open_on_silent_band() {
        use super::Step;
        use crate::components::tone::SILENT;
        use crate::config;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let config = config::Audio { positive_threshold: 0.05, ..Default::default() };
        let mut audio = super::AudioFeedback::new(
            &config,
            &state,
            &mut buzzer,
            &led,
            FakeDelay(&clock),
        );
        state.update_v_speed(|_| 0.08);
        assert_eq!(audio.step(), Step::Played(SILENT));
        drop(audio);
        assert_eq!(buzzer.0, [None]);
    }

    #[test]
    fn test_contended_lock_uses_cache() {
        use hal::time::Clock;

        use super::Step;
        use crate::components::tone::Tone;
        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let mut audio = audio(&state, &mut buzzer, &led, &clock);
        state.update_v_speed(|_| 0.7);
        assert_eq!(audio.v_speed(), 0.7);

        let before = clock.now();
        state.update_v_speed(|previous| {
            // sampling loop holds the lock while the audio task runs
            let tone = Tone { frequency: 1400, duration: 150, pause: 150 };
            assert_eq!(audio.step(), Step::Played(tone));
            previous + 0.5
        });
        assert!(clock.now() - before <= core::time::Duration::from_millis(100 + 150));

        let tone = Tone { frequency: 1600, duration: 120, pause: 80 };
        assert_eq!(audio.step(), Step::Played(tone));
        assert_eq!(audio.v_speed(), 1.2);
    }
}
