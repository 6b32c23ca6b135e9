//! Streaming route management.
//!
//! Routes pair a source and a sink endpoint on (possibly remote) nodes and
//! stay persistent through disturbance: the route manager runs a 50 ms
//! round-robin over the caller-provided route table, drives a per-route
//! state machine, classifies failures into critical and uncritical, and
//! suspends or rebuilds routes as nodes and the ring come and go. The
//! concrete build/destroy of device resources is delegated to an external
//! resource manager through job hooks on the endpoint surface.

#![cfg_attr(not(test), no_std)]

pub mod epm;
pub mod node;
pub mod rtm;


pub use epm::{
    DetFanout, EPM_MAGIC, EndpointEntry, Epm, RouteTables, XrmJob,
};
pub use node::{NodeEntry, NodeSignature};
pub use rtm::{
    RTM_JOB_CHECK_INTERVAL, RTM_MAX_RETRIES, RTM_MAX_ROUTES, RouteEntry, RouteReports, Rtm,
};
