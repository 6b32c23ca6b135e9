//! Event handler.
//!
//! One process-wide bus for bit-encoded internal events plus a single
//! public error sink towards the application. Receipt of any event in the
//! termination set means the system has left the operational state; every
//! stateful component observes that set and tears its pending state down.

use bitflags::bitflags;
use ringcore_abi::EhObsTag;
use ringcore_lib::{ObsError, SingleSubject, Subject};

bitflags! {
    /// Internal event codes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EhEvent: u32 {
        /// A control FIFO synchronization is lost.
        const SYNC_LOST       = 0x0001;
        /// The companion device's built-in self-test failed.
        const BIST_FAILED     = 0x0002;
        /// Un-synchronization of the message FIFOs completed.
        const UNSYNC_COMPLETE = 0x0004;
        /// Un-synchronization of the message FIFOs failed.
        const UNSYNC_FAILED   = 0x0008;
        /// Library initialization succeeded.
        const INIT_SUCCEEDED  = 0x0010;
        /// Library initialization failed.
        const INIT_FAILED     = 0x0020;
    }
}

impl EhEvent {
    /// Events that terminate the operational state.
    pub const TERMINATION_EVENTS: EhEvent = EhEvent::UNSYNC_COMPLETE
        .union(EhEvent::UNSYNC_FAILED)
        .union(EhEvent::BIST_FAILED)
        .union(EhEvent::INIT_FAILED);

    pub fn is_termination(self) -> bool {
        self.intersects(EhEvent::TERMINATION_EVENTS)
    }
}

/// Error classes reported to the application through the public error sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneralError {
    /// The companion device failed (built-in self-test).
    Inic,
    /// Communication with the companion device broke down.
    Communication,
}

/// Capacity of the internal event observer list.
pub const EH_MAX_OBSERVERS: usize = 8;

/// Internal-event bus and public error sink.
pub struct EventHandler {
    internal: Subject<EhObsTag, EH_MAX_OBSERVERS>,
    public_error: SingleSubject<()>,
}

impl EventHandler {
    pub const fn new() -> Self {
        EventHandler {
            internal: Subject::new(),
            public_error: SingleSubject::new(),
        }
    }

    /// Registers a masked observer on the internal event bus.
    pub fn add_obsrv_internal_event(&mut self, tag: EhObsTag, mask: EhEvent) -> Result<(), ObsError> {
        self.internal.add_masked(tag, mask.bits())
    }

    /// Unregisters an internal event observer.
    pub fn del_obsrv_internal_event(&mut self, tag: EhObsTag) -> Result<(), ObsError> {
        self.internal.remove(tag)
    }

    /// Registers the public error observer.
    pub fn add_obsrv_public_error(&mut self) {
        self.public_error.add_observer(());
    }

    /// Unregisters the public error observer.
    pub fn del_obsrv_public_error(&mut self) {
        self.public_error.remove_observer();
    }

    /// Maps an internal event onto the public error it must additionally
    /// report, if any.
    pub fn encode_public_error(event: EhEvent) -> Option<GeneralError> {
        if event == EhEvent::BIST_FAILED {
            Some(GeneralError::Inic)
        } else if event == EhEvent::UNSYNC_COMPLETE || event == EhEvent::UNSYNC_FAILED {
            Some(GeneralError::Communication)
        } else {
            None
        }
    }

    /// True when the public error observer is registered and a report for
    /// `event` is due. Consults but does not consume the registration.
    pub fn public_error_due(&self, event: EhEvent) -> Option<GeneralError> {
        let err = Self::encode_public_error(event)?;
        self.public_error.observer().map(|_| err)
    }

    /// Opens a notification pass over the internal observers.
    pub fn begin_notify(&mut self) {
        self.internal.begin_notify();
    }

    /// Next internal observer whose mask intersects `event`.
    pub fn next_observer(&self, cursor: &mut usize, event: EhEvent) -> Option<EhObsTag> {
        self.internal.next_masked(cursor, event.bits())
    }

    /// Closes the notification pass, applying deferred (un)subscriptions.
    pub fn end_notify(&mut self) {
        self.internal.end_notify();
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        EventHandler::new()
    }
}
