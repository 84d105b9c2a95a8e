//! Leveled logging to stderr, each line prefixed with the local time
//! and the source location of the log statement.

use std::{
    io::{stderr, StderrLock, Write},
    sync::atomic::{AtomicU8, Ordering},
};

use anyhow::{bail, Result};
use chrono::{Local, SecondsFormat};

pub fn write_time(file: &str, line: u32, column: u32) -> StderrLock<'static> {
    let t_str = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    let mut lock = stderr().lock();
    write!(&mut lock, "{t_str}\t{file}:{line}:{column}\t").expect("stderr must not fail");
    lock
}

// The fields are private so that the conversion has to go through
// `TryFrom`, which checks for conflicts.
#[derive(Debug, clap::Args)]
pub struct LogLevelOpt {
    /// Show what is being done
    #[clap(short, long)]
    verbose: bool,

    /// Show information that helps debug this program (implies
    /// `--verbose`); this includes the per-frame trajectory
    /// diagnostics of the `pos` report.
    #[clap(short, long)]
    debug: bool,

    /// Disable warnings. Conflicts with `--verbose` and `--debug`.
    #[clap(short, long)]
    quiet: bool,
}

impl TryFrom<LogLevelOpt> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: LogLevelOpt) -> Result<Self> {
        match value {
            LogLevelOpt {
                verbose: false,
                debug: false,
                quiet: false,
            } => Ok(LogLevel::Warn),
            LogLevelOpt {
                verbose: true,
                debug: false,
                quiet: false,
            } => Ok(LogLevel::Info),
            LogLevelOpt {
                verbose: _,
                debug: true,
                quiet: false,
            } => Ok(LogLevel::Debug),
            LogLevelOpt {
                verbose: false,
                debug: false,
                quiet: true,
            } => Ok(LogLevel::Quiet),
            LogLevelOpt {
                verbose: _,
                debug: _,
                quiet: true,
            } => bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Do not log anything
    Quiet,
    /// The default, only "warn!" statements are outputting anything.
    Warn,
    /// Verbose execution, not for debugging this program but for
    /// giving the user information about what is going on
    Info,
    /// Highest amount of log statement, for debugging this program
    Debug,
}

impl LogLevel {
    // Not public api, only for sorting or comparisons!
    fn level(self) -> u8 {
        self as u8
    }

    fn from_level(level: u8) -> Option<Self> {
        let slf = match level {
            0 => Some(LogLevel::Quiet),
            1 => Some(LogLevel::Warn),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Debug),
            _ => None,
        }?;
        assert_eq!(slf.level(), level);
        Some(slf)
    }
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level().cmp(&other.level())
    }
}

pub static LOGLEVEL: AtomicU8 = AtomicU8::new(1);

pub fn set_log_level(val: LogLevel) {
    LOGLEVEL.store(val.level(), Ordering::Relaxed);
}

#[inline]
pub fn log_level() -> LogLevel {
    let level = LOGLEVEL.load(Ordering::Relaxed);
    LogLevel::from_level(level).expect("no possibility to store invalid u8")
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at_level {
    { $level:ident, $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::$level {
            use std::io::Write;
            let mut lock = $crate::utillib::logging::write_time(file!(), line!(), column!());
            writeln!(&mut lock, $($arg)*).expect("stderr must not fail");
        }
    }
}

#[macro_export]
macro_rules! warn {
    { $($arg:tt)* } => { $crate::log_at_level!(Warn, $($arg)*) }
}

#[macro_export]
macro_rules! info {
    { $($arg:tt)* } => { $crate::log_at_level!(Info, $($arg)*) }
}

#[macro_export]
macro_rules! debug {
    { $($arg:tt)* } => { $crate::log_at_level!(Debug, $($arg)*) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_levels() {
        for i in 0..=3 {
            assert!(LogLevel::from_level(i).is_some());
        }
        assert!(LogLevel::from_level(4).is_none());
        assert!(LogLevel::Debug > LogLevel::Info);
        assert!(LogLevel::Warn > LogLevel::Quiet);
    }

    #[test]
    fn t_opt_conflicts() {
        let opt = LogLevelOpt {
            verbose: true,
            debug: false,
            quiet: true,
        };
        assert!(LogLevel::try_from(opt).is_err());
        let opt = LogLevelOpt {
            verbose: true,
            debug: true,
            quiet: false,
        };
        assert_eq!(LogLevel::try_from(opt).unwrap(), LogLevel::Debug);
    }
}
