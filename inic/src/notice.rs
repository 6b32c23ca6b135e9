//! Decoded response notices.
//!
//! Handlers never call the application directly; they record what has to be
//! delivered and the facade drains the records after the decode returns.
//! This keeps the handler table free of upward dependencies while the
//! delivery still happens within the same service invocation.

use ringcore_abi::{NetworkConfigParam, NetworkStatusParam, Sink, StdResult};

use crate::inic::{
    DeviceStatus, DeviceVersion, FrameCounterStatus, GpioTriggerEvent, MostPortStatus,
    RbdResultStatus, StreamPortConfig,
};

/// Typed payload accompanying a single-subject result.
#[derive(Clone, Copy, Debug)]
pub enum NoticeData<'a> {
    None,
    /// Transmission status of a failed send.
    TxFailed(ringcore_abi::TxStatus),
    DeviceVersion(DeviceVersion),
    FrameCounter(FrameCounterStatus),
    RbdResult(RbdResultStatus),
    Notification {
        func_id: u16,
        device_id: u16,
    },
    /// Resource handle returned by a create-class command.
    ResourceHandle(u16),
    /// Network socket create result: handle plus connection label.
    MostSocket {
        socket_handle: u16,
        conn_label: u16,
    },
    /// Invalid resource handle list, raw 16-bit pairs.
    InvalidList {
        raw: &'a [u8],
    },
    StreamPortConfig(StreamPortConfig),
    GpioPinMode {
        gpio_handle: u16,
        /// Raw (pin, mode) byte pairs.
        raw: &'a [u8],
    },
    GpioPinState {
        gpio_handle: u16,
        current_state: u16,
        sticky_state: u16,
    },
    I2cRead {
        port_handle: u16,
        slave_address: u8,
        data: &'a [u8],
    },
    I2cWritten {
        port_handle: u16,
        data_len: u8,
    },
}

/// Payload of a multi-observer subject fan-out.
#[derive(Clone, Copy, Debug)]
pub enum SubData<'a> {
    /// A transmit frame returned to the pool; backpressured producers may
    /// retry.
    TxMsgObjAvail,
    /// Fresh network status decode; the cache computes the change mask.
    NwStatus(NetworkStatusParam),
    NwConfig(NetworkConfigParam),
    MostPortStatus(MostPortStatus),
    ResMonitor {
        state: u8,
        result: StdResult<'a>,
    },
    GpioTrigger {
        ev: GpioTriggerEvent,
        result: StdResult<'a>,
    },
    DeviceStatus(DeviceStatus),
}

/// One pending delivery.
#[derive(Clone, Copy, Debug)]
pub enum Notice<'a> {
    /// Result for the observer of the given single-subject.
    Std {
        ssub: u8,
        sink: Sink,
        result: StdResult<'a>,
        data: NoticeData<'a>,
    },
    /// Fan-out over the given multi-observer subject.
    Sub { sub: u8, data: SubData<'a> },
    /// Internal event to report on the event bus.
    Event(ringcore_base::EhEvent),
}

/// Upper bound of notices a single decode or purge can produce. Sized for
/// the termination purge, which cancels every pending single-subject.
pub const MAX_NOTICES: usize = 34;

/// Fixed collector of pending deliveries.
pub struct Notices<'a> {
    buf: [Option<Notice<'a>>; MAX_NOTICES],
    n: usize,
}

impl<'a> Notices<'a> {
    pub const fn new() -> Self {
        Notices {
            buf: [None; MAX_NOTICES],
            n: 0,
        }
    }

    pub fn push(&mut self, notice: Notice<'a>) {
        debug_assert!(self.n < MAX_NOTICES);
        if self.n < MAX_NOTICES {
            self.buf[self.n] = Some(notice);
            self.n += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice<'a>> {
        self.buf[..self.n].iter().flatten()
    }
}

impl<'a> Default for Notices<'a> {
    fn default() -> Self {
        Notices::new()
    }
}
