//! a small stderr logger for the binaries.
//!
//! verbosity is read from `TERRAMAP_LOG` (`off`, `error`, `warn`, `info`, `debug`, `trace`).
use log::{Level, LevelFilter, Log, Metadata, Record};

pub const ENV: &str = "TERRAMAP_LOG";

struct Stderr;

const fn severity(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

impl Log for Stderr {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{}] {}: {}",
                severity(record.level()),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// the level named by `var`, warn if unset or unparseable
#[must_use]
pub fn level(var: Option<&str>) -> LevelFilter {
    var.and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// install the logger. does nothing if one is already installed.
pub fn init() {
    let level = level(std::env::var(ENV).ok().as_deref());
    if log::set_logger(&Stderr).is_ok() {
        log::set_max_level(level);
    }
}

#[test]
fn levels() {
    assert_eq!(level(None), LevelFilter::Warn);
    assert_eq!(level(Some("debug")), LevelFilter::Debug);
    assert_eq!(level(Some(" TRACE ")), LevelFilter::Trace);
    assert_eq!(level(Some("loud")), LevelFilter::Warn);
    assert_eq!(severity(Level::Warn), "WARNING");
}
