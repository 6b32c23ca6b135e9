//! Library logging.
//!
//! All log output funnels through a single **backend** function pointer
//! registered by the host at startup. Until a backend is installed every
//! statement is a cheap no-op, so the library can log unconditionally from
//! any layer.
//!
//! # Backend contract
//!
//! The backend receives the level and the pre-formatted arguments for a
//! single log line and is responsible for writing the text plus a trailing
//! newline. The library never calls the backend re-entrantly.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Severity of a log line.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Backend signature: one complete log line per call.
pub type LogBackend = fn(level: LogLevel, args: fmt::Arguments<'_>);

static BACKEND: AtomicUsize = AtomicUsize::new(0);
static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Installs the backend. Passing a new backend replaces the old one.
pub fn rlog_register_backend(backend: LogBackend) {
    BACKEND.store(backend as usize, Ordering::Release);
}

pub fn rlog_set_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::Release);
}

pub fn rlog_get_level() -> LogLevel {
    LogLevel::from_raw(LEVEL.load(Ordering::Acquire))
}

/// True if a line at `level` would currently be emitted.
pub fn rlog_is_enabled(level: LogLevel) -> bool {
    level <= rlog_get_level()
}

#[doc(hidden)]
pub fn rlog_dispatch(level: LogLevel, args: fmt::Arguments<'_>) {
    let raw = BACKEND.load(Ordering::Acquire);
    if raw != 0 {
        // Only ever written by rlog_register_backend with a valid fn.
        let backend: LogBackend = unsafe { core::mem::transmute(raw) };
        backend(level, args);
    }
}

#[macro_export]
macro_rules! rlog_error {
    ($($arg:tt)*) => {
        if $crate::rlog::rlog_is_enabled($crate::rlog::LogLevel::Error) {
            $crate::rlog::rlog_dispatch($crate::rlog::LogLevel::Error, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! rlog_warn {
    ($($arg:tt)*) => {
        if $crate::rlog::rlog_is_enabled($crate::rlog::LogLevel::Warn) {
            $crate::rlog::rlog_dispatch($crate::rlog::LogLevel::Warn, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! rlog_info {
    ($($arg:tt)*) => {
        if $crate::rlog::rlog_is_enabled($crate::rlog::LogLevel::Info) {
            $crate::rlog::rlog_dispatch($crate::rlog::LogLevel::Info, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! rlog_debug {
    ($($arg:tt)*) => {
        if $crate::rlog::rlog_is_enabled($crate::rlog::LogLevel::Debug) {
            $crate::rlog::rlog_dispatch($crate::rlog::LogLevel::Debug, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! rlog_trace {
    ($($arg:tt)*) => {
        if $crate::rlog::rlog_is_enabled($crate::rlog::LogLevel::Trace) {
            $crate::rlog::rlog_dispatch($crate::rlog::LogLevel::Trace, format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_gate() {
        rlog_set_level(LogLevel::Warn);
        assert!(rlog_is_enabled(LogLevel::Error));
        assert!(rlog_is_enabled(LogLevel::Warn));
        assert!(!rlog_is_enabled(LogLevel::Info));
        rlog_set_level(LogLevel::Info);
    }
}
