#![no_std]

pub mod barometer;
pub mod buzzer;
pub mod io;
pub mod memory;
pub mod telemetry;
pub mod time;
