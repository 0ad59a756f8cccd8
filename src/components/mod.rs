pub mod audio;
pub mod sampler;
pub mod telemetry;
pub mod toggle;
pub mod tone;

#[cfg(test)]
pub(crate) mod fake;

pub use audio::AudioFeedback;
pub use sampler::{Cycle, Sampler};
pub use telemetry::LogTelemetry;
pub use toggle::ToggleControl;

mod test {
    #[cfg(test)]
    fn climb(rate: f64, cycles: usize) -> (crate::state::VarioState, usize) {
        use super::fake::{FakeClock, FnBarometer, RecordingTelemetry};
        use super::{Cycle, Sampler};
        use crate::algorithm::altitude::pressure;
        use crate::config::Config;
        use crate::state::VarioState;

        let config = Config::default();
        let state = VarioState::new(1013.25, true);
        let clock = FakeClock::default();
        let step = rate / config.measurement.sample_rate as f64;
        let barometer = FnBarometer::new(|i| Some(pressure(i as f64 * step, 1013.25)));
        let telemetry = RecordingTelemetry::default();
        let mut sampler = Sampler::start(&config, &state, barometer, telemetry, &clock, ()).unwrap();
        let mut settled_at = usize::MAX;
        for cycle in 0..cycles {
            clock.advance(20);
            let Cycle::Measured(sample) = sampler.poll() else { panic!("cycle {}", cycle) };
            let settled = (sample.v_speed.current - rate).abs() <= 0.05;
            if settled && settled_at == usize::MAX {
                settled_at = cycle;
            }
            if !settled {
                settled_at = usize::MAX;
            }
        }
        drop(sampler);
        (state, settled_at)
    }

    #[test]
    fn test_steady_climb() {
        use super::audio::{AudioFeedback, Step};
        use super::fake::{FakeClock, FakeDelay, FakeLed, RecordingBuzzer};
        use super::tone::Tone;
        use crate::config;

        // 12 s integration window at 50 Hz
        let (state, settled_at) = climb(1.0, 600);
        assert!(settled_at < 600);
        assert_eq!(state.v_speed(), 1.0);
        assert!((state.integrated_v_speed() - 1.0).abs() <= 0.01);

        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let config = config::Audio::default();
        let mut audio = AudioFeedback::new(&config, &state, &mut buzzer, &led, FakeDelay(&clock));
        let tone = Tone { frequency: 1400, duration: 150, pause: 150 };
        for _ in 0..3 {
            assert_eq!(audio.step(), Step::Played(tone));
        }
    }

    #[test]
    fn test_weak_climb_band() {
        use super::audio::{AudioFeedback, Step};
        use super::fake::{FakeClock, FakeDelay, FakeLed, RecordingBuzzer};
        use super::tone::Tone;
        use crate::config;

        let (state, settled_at) = climb(0.3, 600);
        assert!(settled_at < 600);
        assert_eq!(state.v_speed(), 0.3);

        let (mut buzzer, led, clock) =
            (RecordingBuzzer::default(), FakeLed::default(), FakeClock::default());
        let config = config::Audio::default();
        let mut audio = AudioFeedback::new(&config, &state, &mut buzzer, &led, FakeDelay(&clock));
        let tone = Tone { frequency: 1200, duration: 200, pause: 300 };
        assert_eq!(audio.step(), Step::Played(tone));
        drop(audio);
        assert_eq!(buzzer.0, [Some((1200, 200))]);
    }

    #[test]
    fn test_threads_share_state() {
        extern crate std;

        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::thread;
        use std::time::{Duration, Instant};

        use crate::state::VarioState;

        let state = VarioState::new(1013.25, true);
        let (published, done) = (AtomicUsize::new(0), AtomicBool::new(false));
        thread::scope(|s| {
            s.spawn(|| {
                // each update stands for one sampling cycle
                for cycle in 1..=2_000usize {
                    state.update_v_speed(|_| cycle as f64);
                    published.store(cycle, Ordering::Release);
                    thread::sleep(Duration::from_micros(200));
                }
                done.store(true, Ordering::Release);
            });
            s.spawn(|| {
                let mut cached = 0.0;
                while !done.load(Ordering::Acquire) {
                    let cycle = published.load(Ordering::Acquire);
                    let start = Instant::now();
                    if let Some(v_speed) = state.try_v_speed() {
                        cached = v_speed;
                    }
                    assert!(start.elapsed() < Duration::from_millis(100));
                    assert!(cycle <= cached as usize + 2, "cycle {} cached {}", cycle, cached);
                }
            });
        });
        assert_eq!(state.v_speed(), 2_000.0);
    }
}
