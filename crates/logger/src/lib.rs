//! Firmware logging backend.
//!
//! Implements the `log` facade so the rest of the firmware can use the
//! ordinary `log::info!` / `log::trace!` macros. Each record becomes one
//! colored, level-prefixed line handed to a sink function (UART, RTT,
//! USB CDC — whatever the board wires up in `init`).
#![cfg_attr(not(test), no_std)]

use core::fmt;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

/// Where formatted lines go. Must not log.
pub type Sink = fn(fmt::Arguments);

/// Fixed-width label for a level.
pub fn label(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRACE",
        Level::Debug => "DEBUG",
        Level::Info => " INFO",
        Level::Warn => " WARN",
        Level::Error => "ERROR",
    }
}

/// ANSI color escape for a level.
pub fn color(level: Level) -> &'static str {
    match level {
        Level::Trace => "\x1b[90m", // Gray
        Level::Debug => "\x1b[36m", // Cyan
        Level::Info => "\x1b[32m",  // Green
        Level::Warn => "\x1b[33m",  // Yellow
        Level::Error => "\x1b[31m", // Red
    }
}

/// One log line: `<color>[LEVEL]<reset> message\n`.
struct Line<'a> {
    level: Level,
    args: &'a fmt::Arguments<'a>,
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}[{}]\x1b[0m {}", color(self.level), label(self.level), self.args)
    }
}

/// Write one log line: `<color>[LEVEL]<reset> message\n`.
pub fn write_line(out: &mut impl fmt::Write, level: Level, args: fmt::Arguments) -> fmt::Result {
    write!(out, "{}", Line { level, args: &args })
}

struct Logger;

static SINK: Once<Sink> = Once::new();
static LOGGER: Logger = Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = SINK.get() {
            let line = Line {
                level: record.level(),
                args: record.args(),
            };
            sink(format_args!("{}", line));
        }
    }

    fn flush(&self) {}
}

/// Install the logger with `sink` as output and `max_level` as filter.
///
/// Fails if another logger was already installed.
pub fn init(sink: Sink, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    SINK.call_once(|| sink);
    log::set_max_level(max_level);
    Ok(())
}
