//! ringcore shared ABI types.
//!
//! This crate provides the canonical definitions for all types shared between
//! the runtime crates and the host application: error and result codes, the
//! telegram identification tuple with its exact wire values, network property
//! enums, the resource-manager result model and the closed dispatch tags used
//! instead of opaque instance pointers. Having a single source of truth
//! eliminates duplicate definitions and mismatches between layers.
//!
//! All wire-facing types carry their INIC ABI values bit-for-bit.

#![no_std]
#![forbid(unsafe_code)]

pub mod fid;
pub mod msg;
pub mod network;
pub mod ret;
pub mod rm;
pub mod tags;
pub mod tx;
pub mod xrm;

pub use msg::{MsgId, OpType};
pub use network::{
    NetworkConfigParam, NetworkStatusParam, NwAvailInfo, NwAvailTransCause, NwAvailability,
    NwChange, NwConfigChange,
};
pub use ret::{ErrorCode, InitResult, ResultCode, StdResult};
pub use rm::{EndpointState, EndpointType, RouteInfos, RouteResult, RouteState};
pub use tags::{EhObsTag, InicSubTag, NetObsTag, Sink, SrvKind, TimerUser};
pub use tx::TxStatus;
pub use xrm::{XrmDetails, XrmResult, XrmResultCode};
