//! Closed dispatch tags.
//!
//! The original control-flow pattern behind these types is a callback
//! delivering a typed result to a registered observer. Instead of opaque
//! instance pointers, every cross-component registration is a small `Copy`
//! tag from a closed enum; the host facade owns all components and routes a
//! tag to the matching component method. The command set and component set
//! are closed and known at compile time, so no open-ended indirection is
//! needed.

/// Services registered with the cooperative scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrvKind {
    /// Timer management service (lowest priority).
    Timers,
    /// Route management service.
    Routing,
}

/// Owners of timers in the delta list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerUser {
    /// API-locking garbage collector.
    AlmGc,
    /// Periodic route processing tick.
    RouteCheck,
    /// Initialization watchdog.
    InitWatchdog,
}

/// Observers of the internal event bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EhObsTag {
    Alm,
    Inic,
    Net,
    /// Route manager termination observer.
    Rtm,
    /// Route manager one-shot init-succeeded observer.
    RtmInit,
    /// Host init state machine.
    InitSm,
}

/// Receiver of an asynchronous command result on a single-subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    /// The host init state machine.
    InitSm,
    /// An application callback slot registered on the host facade. The
    /// payload is the single-subject index the slot is keyed by.
    App(u8),
}

/// Observers of the network status / configuration caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetObsTag {
    /// Route manager availability observer.
    Rtm,
    /// Application subscription slot.
    App(u8),
}

/// Observers of the INIC instance's multi-observer subjects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InicSubTag {
    /// Network management cache.
    Net,
    /// Application subscription slot.
    App(u8),
}
