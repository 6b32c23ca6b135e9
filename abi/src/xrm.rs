//! Result model of the external resource manager.
//!
//! The resource manager that actually builds sockets, ports and connections
//! on the device is a collaborator outside this library. Endpoints only
//! observe its result structure: a coarse result code plus details on one of
//! three error axes (internal, target device, transmission).

use crate::ret::{ErrorCode, ResultCode};
use crate::tx::TxStatus;

/// Coarse outcome of a resource-manager job.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum XrmResultCode {
    /// Build of the connection succeeded.
    SuccessBuild = 0x00,
    /// Destruction of the connection succeeded.
    SuccessDestroy = 0x01,
    /// Invalid resources have been destroyed automatically.
    AutoDestroyed = 0x02,
    /// Invalid settings in the resource configuration.
    ErrConfig = 0x03,
    /// Build failed.
    ErrBuild = 0x04,
    /// Destruction failed.
    ErrDestroy = 0x05,
    /// Request of the invalid resource list failed.
    ErrInvalidList = 0x06,
    /// Remote synchronization of the target device failed.
    ErrSync = 0x07,
    #[default]
    Unknown = 0xFF,
}

/// Error details on one of the three orthogonal axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum XrmDetails {
    /// No detail attached (success codes).
    #[default]
    None,
    /// Internal synchronous error of this library.
    Internal(ErrorCode),
    /// Function-specific error reported by the target device.
    Target(ResultCode),
    /// Transmission error on the ring.
    Transmission(TxStatus),
}

/// Result of a resource-manager job as observed by an endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct XrmResult {
    pub code: XrmResultCode,
    pub details: XrmDetails,
}

impl XrmResult {
    pub const fn success_build() -> Self {
        XrmResult {
            code: XrmResultCode::SuccessBuild,
            details: XrmDetails::None,
        }
    }

    pub const fn success_destroy() -> Self {
        XrmResult {
            code: XrmResultCode::SuccessDestroy,
            details: XrmDetails::None,
        }
    }
}
