//! Initialization state machine.
//!
//! Walks device version check, device attach and network configuration
//! readback, guarded by a watchdog timer. The one-shot init result fires
//! exactly once; a failure additionally raises the init-failed termination
//! event so every component purges its pending state.

use ringcore_abi::{InitResult, ResultCode, StdResult};

/// Watchdog for the whole init sequence in milliseconds.
pub const INIT_TIMEOUT: u16 = 3000;

/// Steps of the init sequence, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStep {
    Idle,
    VersionGet,
    Attach,
    NetConfig,
    Done,
    Failed,
}

pub struct InitSm {
    pub step: InitStep,
    reported: bool,
}

impl InitSm {
    pub const fn new() -> Self {
        InitSm {
            step: InitStep::Idle,
            reported: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.step == InitStep::Done
    }

    /// Marks the one-shot report as consumed; returns `false` if it
    /// already fired.
    pub fn take_report(&mut self) -> bool {
        !core::mem::replace(&mut self.reported, true)
    }

    /// Maps a failed step's asynchronous result onto the init result code.
    pub fn failure_of(step: InitStep, result: &StdResult<'_>) -> InitResult {
        if result.code == ResultCode::Timeout {
            return InitResult::ErrTimeout;
        }
        match step {
            InitStep::VersionGet => InitResult::ErrInicVersion,
            InitStep::Attach => match result.code {
                ResultCode::Configuration => InitResult::ErrDevAttachCfg,
                ResultCode::System => InitResult::ErrInicSystem,
                _ => InitResult::ErrDevAttachProc,
            },
            InitStep::NetConfig => InitResult::ErrNetCfg,
            _ => InitResult::ErrInternal,
        }
    }
}

impl Default for InitSm {
    fn default() -> Self {
        InitSm::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_fires_once() {
        let mut sm = InitSm::new();
        assert!(sm.take_report());
        assert!(!sm.take_report());
    }

    #[test]
    fn failure_mapping() {
        let timeout = StdResult::of(ResultCode::Timeout);
        assert_eq!(
            InitSm::failure_of(InitStep::Attach, &timeout),
            InitResult::ErrTimeout
        );
        let cfg = StdResult::of(ResultCode::Configuration);
        assert_eq!(
            InitSm::failure_of(InitStep::Attach, &cfg),
            InitResult::ErrDevAttachCfg
        );
        let sys = StdResult::of(ResultCode::System);
        assert_eq!(
            InitSm::failure_of(InitStep::Attach, &sys),
            InitResult::ErrInicSystem
        );
        let busy = StdResult::of(ResultCode::Busy);
        assert_eq!(
            InitSm::failure_of(InitStep::NetConfig, &busy),
            InitResult::ErrNetCfg
        );
    }
}
