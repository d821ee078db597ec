//! Log sinks
//!
//! Two process-wide sinks: access and info lines, and warnings and errors.
//! Each is a file when configured, otherwise stdout or stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

use super::LogLevel;

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

enum Sink {
    Stdout,
    Stderr,
    File(File),
}

impl Sink {
    /// Append to `path`, creating parent directories, or use the console stream
    fn open(path: Option<&Path>, console: Self) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(console);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(file))
    }

    fn write_line(&mut self, line: &str) {
        match self {
            Self::Stdout => println!("{line}"),
            Self::Stderr => eprintln!("{line}"),
            // A failed log write has nowhere to be reported
            Self::File(file) => {
                let _ = writeln!(file, "{line}");
            }
        }
    }
}

/// Level filter plus the two sinks
pub struct LogWriter {
    level: LogLevel,
    access: Mutex<Sink>,
    error: Mutex<Sink>,
}

impl LogWriter {
    fn new(level: LogLevel, access_file: Option<&Path>, error_file: Option<&Path>) -> io::Result<Self> {
        Ok(Self {
            level,
            access: Mutex::new(Sink::open(access_file, Sink::Stdout)?),
            error: Mutex::new(Sink::open(error_file, Sink::Stderr)?),
        })
    }

    /// Most verbose level still written
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Access lines and info/debug lines share one sink
    pub fn write_access(&self, line: &str) {
        write(&self.access, line);
    }

    pub fn write_error(&self, line: &str) {
        write(&self.error, line);
    }
}

fn write(sink: &Mutex<Sink>, line: &str) {
    sink.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .write_line(line);
}

/// Install the process-wide writer; fails if called twice or a file cannot be opened
pub fn init(level: LogLevel, access_file: Option<&Path>, error_file: Option<&Path>) -> io::Result<()> {
    let writer = LogWriter::new(level, access_file, error_file)?;
    LOG_WRITER
        .set(writer)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "log writer already initialized"))
}

pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sinks_append() {
        let dir = std::env::temp_dir().join(format!("devserve-writer-{}", std::process::id()));
        let access = dir.join("nested").join("access.log");
        let error = dir.join("error.log");

        let writer = LogWriter::new(LogLevel::Debug, Some(&access), Some(&error)).unwrap();
        writer.write_access("first line");
        writer.write_access("second line");
        writer.write_error("broken");

        assert_eq!(std::fs::read_to_string(&access).unwrap(), "first line\nsecond line\n");
        assert_eq!(std::fs::read_to_string(&error).unwrap(), "broken\n");
        assert_eq!(writer.level(), LogLevel::Debug);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
