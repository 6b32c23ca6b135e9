//! Runtime substrate of the ringcore library.
//!
//! Composes the cooperative scheduler, the delta-list timer management, the
//! internal event handler and the API-locking manager into the [`Base`]
//! aggregate every higher layer builds on. No operating-system threads are
//! assumed; the host drives the whole runtime through one service entry
//! point and a monotonic 16-bit millisecond clock.

#![cfg_attr(not(test), no_std)]

pub mod alm;
pub mod base;
pub mod eh;
pub mod scheduler;
pub mod timer;

#[cfg(test)]
mod alm_tests;
#[cfg(test)]
mod timer_tests;

pub use alm::{ALM_GC_INTERVAL, Alm, LockClient, LockTimeout};
pub use base::Base;
pub use eh::{EhEvent, EventHandler, GeneralError};
pub use scheduler::{SchedError, Scheduler};
pub use timer::TimerMgmt;
