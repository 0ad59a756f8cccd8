//! Hosted runtime: wall clock, thread sleep and the audio thread.

use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embedded_hal::blocking::delay::DelayMs;
use hal::{buzzer::Buzzer, io::Led, time::Clock};

use crate::components::AudioFeedback;
use crate::config;
use crate::state::VarioState;

static BOOT: OnceLock<Instant> = OnceLock::new();

/// Time since the first call, used as the logger uptime.
pub fn uptime() -> Duration {
    BOOT.get_or_init(Instant::now).elapsed()
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        uptime()
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadSleep;

impl DelayMs<u32> for ThreadSleep {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64))
    }
}

pub fn spawn_audio<Z, L>(
    config: config::Audio,
    state: &'static VarioState,
    buzzer: Z,
    led: &'static L,
) -> std::io::Result<JoinHandle<()>>
where
    Z: Buzzer + Send + 'static,
    L: Led + Sync,
{
    thread::Builder::new().name("audio".into()).spawn(move || {
        info!("Audio feedback started");
        AudioFeedback::new(&config, state, buzzer, led, ThreadSleep).run()
    })
}

mod test {
    #[test]
    fn test_system_clock_monotonic() {
        use hal::time::Clock;

        use super::SystemClock;

        let before = SystemClock.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(SystemClock.now() >= before + std::time::Duration::from_millis(2));
    }

    #[test]
    fn test_thread_sleep() {
        use std::time::{Duration, Instant};

        use embedded_hal::blocking::delay::DelayMs;

        use super::ThreadSleep;

        let start = Instant::now();
        ThreadSleep.delay_ms(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
