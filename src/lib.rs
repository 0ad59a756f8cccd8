#![no_std]

#[macro_use]
extern crate alloc;
#[macro_use]
extern crate log;

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algorithm;
pub mod components;
pub mod config;
pub mod datastructures;
pub mod error;
pub mod logger;
#[cfg(feature = "std")]
pub mod runtime;
pub mod state;
pub mod sync;

pub use config::Config;
pub use error::Error;
pub use state::VarioState;
