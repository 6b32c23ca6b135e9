//! Synchronous and asynchronous result codes.
//!
//! Two orthogonal taxonomies: `ErrorCode` is returned synchronously from
//! library calls (the caller holds no state afterwards), `ResultCode` arrives
//! asynchronously in observer notifications together with the raw INIC error
//! bytes when present.

/// Error half of the standard synchronous return. Library calls that can
/// fail return `Result<(), ErrorCode>`; success carries no payload.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// At least one parameter exceeds its admissible range.
    Param = 0x01,
    /// Buffer overflow or service busy.
    BufferOverflow = 0x02,
    /// Functionality not available.
    NotAvailable = 0x03,
    /// Not supported by this derivative of the companion device.
    NotSupported = 0x04,
    /// The requested information is not yet available.
    InvalidShadow = 0x05,
    /// The value to be set is already set; no telegram will be sent and no
    /// callback will fire.
    AlreadySet = 0x06,
    /// The companion device already performs the requested function.
    ApiLocked = 0x07,
    /// The library is not initialized.
    NotInitialized = 0x08,
}

/// Result codes used for asynchronous responses.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultCode {
    /// Operation successfully completed.
    Success = 0x00,
    /// MOST standard error occurred; raw error bytes attached.
    MostStandard = 0x01,
    /// Function currently busy.
    Busy = 0x02,
    /// Processing error occurred.
    Processing = 0x03,
    /// Configuration error occurred.
    Configuration = 0x04,
    /// System error occurred.
    System = 0x05,
    /// Timeout occurred.
    Timeout = 0x06,
    /// Transmission error occurred.
    Transmission = 0x07,
}

impl ResultCode {
    /// Maps the secondary byte of a standard MOST error telegram onto a
    /// result code. Values outside the known range collapse to
    /// `MostStandard` so the raw bytes stay authoritative.
    pub fn from_most_error_byte(raw: u8) -> Self {
        match raw.wrapping_add(1) {
            0x02 => ResultCode::Busy,
            0x03 => ResultCode::Processing,
            0x04 => ResultCode::Configuration,
            0x05 => ResultCode::System,
            0x06 => ResultCode::Timeout,
            0x07 => ResultCode::Transmission,
            _ => ResultCode::MostStandard,
        }
    }
}

/// Result values of the one-shot initialization callback.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization succeeded.
    Success = 0x00,
    /// No message buffer available.
    ErrBufOverflow = 0x01,
    /// Synchronization with the companion device failed.
    ErrInicSync = 0x02,
    /// Device version check failed.
    ErrInicVersion = 0x03,
    /// Device attach failed with a system error.
    ErrInicSystem = 0x04,
    /// Device attach failed with a configuration error.
    ErrDevAttachCfg = 0x05,
    /// Device attach failed with a processing error.
    ErrDevAttachProc = 0x06,
    /// Network configuration request failed.
    ErrNetCfg = 0x07,
    /// Internal error occurred.
    ErrInternal = 0x0A,
    /// Initialization watchdog expired.
    ErrTimeout = 0x0B,
}

/// Standard result structure delivered through observers: the result code
/// plus the raw INIC error bytes for MOST standard errors.
#[derive(Clone, Copy, Debug)]
pub struct StdResult<'a> {
    pub code: ResultCode,
    pub info: &'a [u8],
}

impl<'a> StdResult<'a> {
    pub const fn success() -> Self {
        StdResult {
            code: ResultCode::Success,
            info: &[],
        }
    }

    pub const fn of(code: ResultCode) -> Self {
        StdResult { code, info: &[] }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_error_byte_mapping() {
        assert_eq!(ResultCode::from_most_error_byte(0x01), ResultCode::Busy);
        assert_eq!(ResultCode::from_most_error_byte(0x05), ResultCode::Timeout);
        // Unknown secondary bytes keep the generic standard-error code.
        assert_eq!(
            ResultCode::from_most_error_byte(0x40),
            ResultCode::MostStandard
        );
    }
}
