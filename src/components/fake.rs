//! Deterministic stand-ins for the hardware collaborators.

extern crate std;

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayMs;
use fugit::{HertzU32 as Hertz, MillisDurationU32};
use hal::{
    barometer::Barometer, buzzer::Buzzer, io::Led, memory::Reclaim, telemetry::Telemetry,
    time::Clock,
};

#[derive(Default)]
pub struct FakeClock(Cell<Duration>);

impl FakeClock {
    pub fn advance(&self, millis: u64) {
        self.0.set(self.0.get() + Duration::from_millis(millis));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Sleeping moves the fake clock forward.
pub struct FakeDelay<'a>(pub &'a FakeClock);

impl<'a> DelayMs<u32> for FakeDelay<'a> {
    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(ms as u64)
    }
}

/// `None` records a silence
#[derive(Default)]
pub struct RecordingBuzzer(pub Vec<Option<(u32, u32)>>);

impl Buzzer for RecordingBuzzer {
    fn play_tone(&mut self, frequency: Hertz, duration: MillisDurationU32) {
        self.0.push(Some((frequency.raw(), duration.ticks())))
    }

    fn silence(&mut self) {
        self.0.push(None)
    }
}

#[derive(Default)]
pub struct FakeLed(pub AtomicBool);

impl Led for FakeLed {
    fn set(&self, on: bool) {
        self.0.store(on, Ordering::Relaxed)
    }

    fn is_on(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fault;

/// Pressure as a function of the read index; `None` fails the read.
pub struct FnBarometer<F> {
    pressure: F,
    reads: usize,
    pub init_fails: bool,
}

impl<F: FnMut(usize) -> Option<f64>> FnBarometer<F> {
    pub fn new(pressure: F) -> Self {
        Self { pressure, reads: 0, init_fails: false }
    }
}

impl<F: FnMut(usize) -> Option<f64>> Barometer for FnBarometer<F> {
    type Calibration = [u16; 6];
    type Error = Fault;

    fn initialize(&mut self) -> Result<[u16; 6], Fault> {
        match self.init_fails {
            true => Err(Fault),
            false => Ok([40127, 36924, 23317, 23282, 33464, 28312]),
        }
    }

    fn read_pressure(&mut self) -> Result<f64, Fault> {
        let index = self.reads;
        self.reads += 1;
        (self.pressure)(index).ok_or(Fault)
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub v_speeds: Vec<f64>,
    pub integrated: Vec<f64>,
}

impl Telemetry for RecordingTelemetry {
    fn v_speed(&mut self, v_speed: f64) {
        self.v_speeds.push(v_speed)
    }

    fn integrated_v_speed(&mut self, v_speed: f64) {
        self.integrated.push(v_speed)
    }
}

#[derive(Default)]
pub struct ReclaimCounter(pub usize);

impl Reclaim for ReclaimCounter {
    fn reclaim(&mut self) {
        self.0 += 1
    }
}
