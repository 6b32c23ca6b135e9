//! Generic infrastructure for the ringcore runtime: index-linked intrusive
//! lists, the observer fabric and the pluggable logging backend. Nothing in
//! here knows about telegrams or routes.

#![cfg_attr(not(test), no_std)]

pub mod dlist;
pub mod obs;
pub mod rlog;

pub use dlist::{DlError, DlList, DlNode, HasNode, NIL};
pub use obs::{ObsError, SingleSubject, Subject};
pub use rlog::{LogLevel, rlog_get_level, rlog_is_enabled, rlog_register_backend, rlog_set_level};
