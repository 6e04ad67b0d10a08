//! Diagnostics logger
//!
//! Routes the `log` facade used by the engine to the kernel debugger
//! through `wdk::println!`. Audit records never pass through here.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use wdk::println;

use crate::DRIVER_NAME;

struct DebugPrintLogger;

static LOGGER: DebugPrintLogger = DebugPrintLogger;

impl Log for DebugPrintLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            println!("[{}] {:<5} {}", DRIVER_NAME, record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger; fails if another logger got there first
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
