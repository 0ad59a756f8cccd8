pub mod altitude_log;
