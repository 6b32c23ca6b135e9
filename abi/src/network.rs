//! Network property enums, change masks and cached parameter blocks.

use bitflags::bitflags;

/// Availability of the ring for control and packet data transmission.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NwAvailability {
    #[default]
    NotAvailable = 0x00,
    Available = 0x01,
}

/// Sub state to the availability parameter.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NwAvailInfo {
    #[default]
    Regular = 0x00,
    Diagnosis = 0x02,
    ForcedNotAvailable = 0x06,
    Unstable = 0x10,
    Stable = 0x11,
}

/// Cause of the last availability transition.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NwAvailTransCause {
    Command = 0x00,
    RxActivity = 0x01,
    Normal = 0x10,
    ErrSuddenSignalOff = 0x11,
    ErrCriticalUnlock = 0x12,
    ErrSystem = 0x13,
    #[default]
    NoTransition = 0xFF,
}

impl NwAvailability {
    pub fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            NwAvailability::NotAvailable
        } else {
            NwAvailability::Available
        }
    }
}

impl NwAvailInfo {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x02 => NwAvailInfo::Diagnosis,
            0x06 => NwAvailInfo::ForcedNotAvailable,
            0x10 => NwAvailInfo::Unstable,
            0x11 => NwAvailInfo::Stable,
            _ => NwAvailInfo::Regular,
        }
    }
}

impl NwAvailTransCause {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => NwAvailTransCause::Command,
            0x01 => NwAvailTransCause::RxActivity,
            0x10 => NwAvailTransCause::Normal,
            0x11 => NwAvailTransCause::ErrSuddenSignalOff,
            0x12 => NwAvailTransCause::ErrCriticalUnlock,
            0x13 => NwAvailTransCause::ErrSystem,
            _ => NwAvailTransCause::NoTransition,
        }
    }
}

bitflags! {
    /// Identifies which network status fields mutated in the last update.
    /// Observers subscribe with their own interest mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct NwChange: u32 {
        const EVENTS            = 0x01;
        const AVAILABILITY      = 0x02;
        const AVAIL_INFO        = 0x04;
        const AVAIL_TRANS_CAUSE = 0x08;
        const NODE_ADDRESS      = 0x10;
        const NODE_POSITION     = 0x20;
        const MAX_POSITION      = 0x40;
        const PACKET_BW         = 0x80;
    }
}

bitflags! {
    /// Change mask for the network configuration block.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct NwConfigChange: u32 {
        const NODE_ADDRESS  = 0x01;
        const GROUP_ADDRESS = 0x02;
        const LLRBC         = 0x04;
    }
}

/// Cached parameters of the network status property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NetworkStatusParam {
    /// Which fields changed since the previous update.
    pub change_mask: NwChange,
    pub availability: NwAvailability,
    pub avail_info: NwAvailInfo,
    pub avail_trans_cause: NwAvailTransCause,
    /// Event word of the network interface functionality.
    pub events: u16,
    /// Current packet bandwidth in quadlets.
    pub packet_bw: u16,
    pub node_address: u16,
    pub node_position: u8,
    /// Node position of the last device in the ring.
    pub max_position: u8,
}

/// Cached parameters of the network configuration property.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkConfigParam {
    pub change_mask: NwConfigChange,
    pub node_address: u16,
    pub group_address: u16,
    /// Low-level retry block count.
    pub llrbc: u8,
}
