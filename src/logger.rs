use alloc::{boxed::Box, vec::Vec};
use core::{
    fmt::{self, Display, Formatter, Write},
    str::from_utf8,
    time::Duration,
};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Wrapping byte buffer keeping the most recent log lines.
pub struct LogBuffer {
    buffer: Vec<u8>,
    index: usize,
}

impl LogBuffer {
    pub const fn new() -> Self {
        Self { buffer: Vec::new(), index: 0 }
    }

    pub fn with_capacity(size: usize) -> Self {
        Self { buffer: vec![0u8; size], index: 0 }
    }
}

impl Write for LogBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let size = self.buffer.len();
        if size == 0 {
            return Ok(());
        }
        let mut bytes = s.as_bytes();
        if bytes.len() > size {
            bytes = &bytes[bytes.len() - size..];
        }
        let index = self.index % size;
        self.index += bytes.len();

        if size - index >= bytes.len() {
            self.buffer[index..index + bytes.len()].copy_from_slice(bytes);
            return Ok(());
        }

        let partial_size = size - index;
        self.buffer[index..].copy_from_slice(&bytes[..partial_size]);
        self.buffer[..bytes.len() - partial_size].copy_from_slice(&bytes[partial_size..]);
        Ok(())
    }
}

fn write_lossy(f: &mut Formatter, mut bytes: &[u8]) -> fmt::Result {
    loop {
        match from_utf8(bytes) {
            Ok(string) => return f.write_str(string),
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                f.write_str(from_utf8(valid).unwrap_or_default())?;
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return Ok(()),
                }
            }
        }
    }
}

impl Display for LogBuffer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let size = self.buffer.len();
        if self.index <= size {
            return write_lossy(f, &self.buffer[..self.index]);
        }
        let index = self.index % size;
        // Drop the partial character left by the wrap
        let skip = self.buffer[index..].iter().take_while(|&&b| b & 0xC0 == 0x80).count();
        write_lossy(f, &self.buffer[index + skip..])?;
        write_lossy(f, &self.buffer[..index])
    }
}

static LOG_BUFFER: Mutex<LogBuffer> = Mutex::new(LogBuffer::new());

pub struct Logger {
    uptime: fn() -> Duration,
    echo: bool,
}

impl Logger {
    pub const fn new(uptime: fn() -> Duration, echo: bool) -> Self {
        Self { uptime, echo }
    }
}

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let millis = (self.uptime)().as_millis() as u64;
        let (seconds, millis) = (millis / 1000, millis % 1000);
        #[cfg(feature = "std")]
        if self.echo {
            std::println!("[{:5}.{:03}] {}", seconds, millis, record.args());
        }
        #[cfg(not(feature = "std"))]
        let _ = self.echo;
        // Never spin here, a contended line is dropped
        if let Some(mut buffer) = LOG_BUFFER.try_lock() {
            writeln!(buffer, "[{:5}.{:03}] {}", seconds, millis, record.args()).ok();
        }
    }

    fn flush(&self) {}
}

pub fn init(size: usize, uptime: fn() -> Duration, echo: bool, level: LevelFilter) {
    *LOG_BUFFER.lock() = LogBuffer::with_capacity(size);
    log::set_max_level(level);
    log::set_logger(Box::leak(Box::new(Logger::new(uptime, echo)))).ok();
}

pub fn dump<W: Write>(w: &mut W) -> fmt::Result {
    write!(w, "{}", *LOG_BUFFER.lock())
}

mod test {
    #[cfg(test)]
    extern crate std;

    #[test]
    fn test_log_buffer_wrap() {
        use core::fmt::Write;
        use std::string::ToString;

        use super::LogBuffer;

        let mut buffer = LogBuffer::with_capacity(8);
        write!(buffer, "abc").unwrap();
        assert_eq!(buffer.to_string(), "abc");
        write!(buffer, "defgh").unwrap();
        assert_eq!(buffer.to_string(), "abcdefgh");
        write!(buffer, "ij").unwrap();
        assert_eq!(buffer.to_string(), "cdefghij");
        write!(buffer, "0123456789").unwrap();
        assert_eq!(buffer.to_string(), "23456789");
    }

    #[test]
    fn test_log_buffer_multibyte_wrap() {
        use core::fmt::Write;
        use std::string::ToString;

        use super::LogBuffer;

        let mut buffer = LogBuffer::with_capacity(6);
        write!(buffer, "ab°c").unwrap();
        write!(buffer, "de").unwrap();
        assert_eq!(buffer.to_string(), "b°cde");
        write!(buffer, "f").unwrap();
        assert_eq!(buffer.to_string(), "°cdef");
        write!(buffer, "g").unwrap();
        assert_eq!(buffer.to_string(), "cdefg");
    }

    #[test]
    fn test_empty_log_buffer() {
        use core::fmt::Write;
        use std::string::ToString;

        use super::LogBuffer;

        let mut buffer = LogBuffer::new();
        write!(buffer, "dropped").unwrap();
        assert_eq!(buffer.to_string(), "");
    }

    #[test]
    #[serial_test::serial]
    fn test_logger_line_format() {
        use core::time::Duration;
        use std::string::String;

        use log::{Level, Log, Record};

        use super::{dump, Logger, LogBuffer, LOG_BUFFER};

        fn uptime() -> Duration {
            Duration::from_millis(12_345)
        }

        *LOG_BUFFER.lock() = LogBuffer::with_capacity(256);
        let logger = Logger::new(uptime, false);
        logger.log(&Record::builder().args(format_args!("Vario started")).level(Level::Info).build());
        let mut output = String::new();
        dump(&mut output).unwrap();
        assert_eq!(output, "[   12.345] Vario started\n");
    }

    #[test]
    #[serial_test::serial]
    fn test_contended_line_dropped() {
        use core::time::Duration;
        use std::string::String;

        use log::{Level, Log, Record};

        use super::{Logger, LogBuffer, LOG_BUFFER};

        fn uptime() -> Duration {
            Duration::ZERO
        }

        *LOG_BUFFER.lock() = LogBuffer::with_capacity(256);
        let logger = Logger::new(uptime, false);
        let guard = LOG_BUFFER.lock();
        logger.log(&Record::builder().args(format_args!("lost")).level(Level::Warn).build());
        drop(guard);
        let mut output = String::new();
        super::dump(&mut output).unwrap();
        assert_eq!(output, "");
    }
}
