#![no_std]

extern crate hal;
#[macro_use]
extern crate log;

pub mod barometer;
pub mod buzzer;
pub mod led;
