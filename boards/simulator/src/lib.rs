#[macro_use]
extern crate log;
extern crate pro_vario;

pub mod atmosphere;
pub mod console;
