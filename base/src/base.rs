//! Aggregation of the runtime substrate.

use crate::alm::{Alm, LockClient};
use crate::eh::EventHandler;
use crate::scheduler::Scheduler;
use crate::timer::TimerMgmt;

/// The base of one library instance: scheduler, timer management, event
/// handler and API-locking manager. Multiple independent instances may
/// coexist in one address space.
pub struct Base {
    pub scd: Scheduler,
    pub tm: TimerMgmt,
    pub eh: EventHandler,
    pub alm: Alm,
}

impl Base {
    /// `wake_hint_registered` tells the timer management whether the host
    /// provided an external wake-up hook; without one the timer service
    /// re-arms itself.
    pub fn new(wake_hint_registered: bool) -> Self {
        let mut scd = Scheduler::new();
        let tm = TimerMgmt::new(&mut scd, wake_hint_registered);
        let mut alm = Alm::new();
        alm.register_api(LockClient::InicCmd);
        alm.register_api(LockClient::InicRes);
        Base {
            scd,
            tm,
            eh: EventHandler::new(),
            alm,
        }
    }
}
