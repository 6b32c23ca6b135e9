//! Network management cache.
//!
//! Passive consumer of the status and configuration frames the companion
//! device pushes. Keeps the authoritative parameter blocks, computes the
//! per-update change mask, and fans changes out to masked observers. A
//! freshly added observer first receives the cached block with a full
//! change mask so latecomers start from consistent state.

use ringcore_abi::{
    NetObsTag, NetworkConfigParam, NetworkStatusParam, NwChange, NwConfigChange,
};
use ringcore_lib::{ObsError, Subject};

/// Observer slots per cache subject.
pub const NET_SUB_SLOTS: usize = 4;

/// Result of classifying an address against the cached own addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsOwnAddr {
    /// Own logical node address or own node position address.
    Node,
    /// Own group address.
    Group,
    /// Foreign address.
    None,
}

/// Base of the node-position address range.
const POSITION_ADDR_BASE: u16 = 0x0400;

/// Network status and configuration cache.
pub struct NetworkManagement {
    status: NetworkStatusParam,
    config: NetworkConfigParam,
    status_seen: bool,
    config_seen: bool,
    status_subject: Subject<NetObsTag, NET_SUB_SLOTS>,
    config_subject: Subject<NetObsTag, NET_SUB_SLOTS>,
}

impl NetworkManagement {
    pub const fn new() -> Self {
        NetworkManagement {
            status: NetworkStatusParam {
                change_mask: NwChange::empty(),
                availability: ringcore_abi::NwAvailability::NotAvailable,
                avail_info: ringcore_abi::NwAvailInfo::Regular,
                avail_trans_cause: ringcore_abi::NwAvailTransCause::NoTransition,
                events: 0,
                packet_bw: 0,
                node_address: 0,
                node_position: 0,
                max_position: 0,
            },
            config: NetworkConfigParam {
                change_mask: NwConfigChange::empty(),
                node_address: 0,
                group_address: 0,
                llrbc: 0,
            },
            status_seen: false,
            config_seen: false,
            status_subject: Subject::new(),
            config_subject: Subject::new(),
        }
    }

    /// Cached network status with the change mask of the last update.
    pub fn network_status(&self) -> NetworkStatusParam {
        self.status
    }

    /// Cached network configuration with the change mask of the last
    /// update.
    pub fn network_config(&self) -> NetworkConfigParam {
        self.config
    }

    /// Registers a masked status observer. When the cache already holds a
    /// valid block the caller must deliver the returned snapshot (full
    /// change mask) to the new observer before anything else.
    pub fn add_observer_network_status(
        &mut self,
        tag: NetObsTag,
        mask: NwChange,
    ) -> Result<Option<NetworkStatusParam>, ObsError> {
        self.status_subject.add_masked(tag, mask.bits())?;
        if self.status_seen {
            let mut snapshot = self.status;
            snapshot.change_mask = NwChange::all();
            Ok(Some(snapshot))
        } else {
            Ok(None)
        }
    }

    pub fn del_observer_network_status(&mut self, tag: NetObsTag) -> Result<(), ObsError> {
        self.status_subject.remove(tag)
    }

    /// Registers a masked configuration observer; see
    /// [`NetworkManagement::add_observer_network_status`].
    pub fn add_observer_network_config(
        &mut self,
        tag: NetObsTag,
        mask: NwConfigChange,
    ) -> Result<Option<NetworkConfigParam>, ObsError> {
        self.config_subject.add_masked(tag, mask.bits())?;
        if self.config_seen {
            let mut snapshot = self.config;
            snapshot.change_mask = NwConfigChange::all();
            Ok(Some(snapshot))
        } else {
            Ok(None)
        }
    }

    pub fn del_observer_network_config(&mut self, tag: NetObsTag) -> Result<(), ObsError> {
        self.config_subject.remove(tag)
    }

    /// Takes a fresh status decode, computes which fields mutated and
    /// stores the block. Returns the change mask; an empty mask after the
    /// first update means nothing to fan out.
    pub fn on_status_update(&mut self, fresh: &NetworkStatusParam) -> NwChange {
        let mut change = NwChange::empty();
        if !self.status_seen || self.status.events != fresh.events {
            change |= NwChange::EVENTS;
        }
        if !self.status_seen || self.status.availability != fresh.availability {
            change |= NwChange::AVAILABILITY;
        }
        if !self.status_seen || self.status.avail_info != fresh.avail_info {
            change |= NwChange::AVAIL_INFO;
        }
        if !self.status_seen || self.status.avail_trans_cause != fresh.avail_trans_cause {
            change |= NwChange::AVAIL_TRANS_CAUSE;
        }
        if !self.status_seen || self.status.node_address != fresh.node_address {
            change |= NwChange::NODE_ADDRESS;
        }
        if !self.status_seen || self.status.node_position != fresh.node_position {
            change |= NwChange::NODE_POSITION;
        }
        if !self.status_seen || self.status.max_position != fresh.max_position {
            change |= NwChange::MAX_POSITION;
        }
        if !self.status_seen || self.status.packet_bw != fresh.packet_bw {
            change |= NwChange::PACKET_BW;
        }
        self.status = *fresh;
        self.status.change_mask = change;
        self.status_seen = true;
        change
    }

    /// Takes a fresh configuration decode; see
    /// [`NetworkManagement::on_status_update`].
    pub fn on_config_update(&mut self, fresh: &NetworkConfigParam) -> NwConfigChange {
        let mut change = NwConfigChange::empty();
        if !self.config_seen || self.config.node_address != fresh.node_address {
            change |= NwConfigChange::NODE_ADDRESS;
        }
        if !self.config_seen || self.config.group_address != fresh.group_address {
            change |= NwConfigChange::GROUP_ADDRESS;
        }
        if !self.config_seen || self.config.llrbc != fresh.llrbc {
            change |= NwConfigChange::LLRBC;
        }
        self.config = *fresh;
        self.config.change_mask = change;
        self.config_seen = true;
        change
    }

    /// Status observer iteration filtered by the change mask.
    pub fn begin_status_notify(&mut self) {
        self.status_subject.begin_notify();
    }

    pub fn next_status_observer(&self, cursor: &mut usize, change: NwChange) -> Option<NetObsTag> {
        self.status_subject.next_masked(cursor, change.bits())
    }

    pub fn end_status_notify(&mut self) {
        self.status_subject.end_notify();
    }

    /// Configuration observer iteration filtered by the change mask.
    pub fn begin_config_notify(&mut self) {
        self.config_subject.begin_notify();
    }

    pub fn next_config_observer(
        &self,
        cursor: &mut usize,
        change: NwConfigChange,
    ) -> Option<NetObsTag> {
        self.config_subject.next_masked(cursor, change.bits())
    }

    pub fn end_config_notify(&mut self) {
        self.config_subject.end_notify();
    }

    /// Classifies an address against the cached node, position and group
    /// addresses.
    pub fn is_own_address(&self, address: u16) -> IsOwnAddr {
        if self.status_seen
            && (address == self.status.node_address
                || address == POSITION_ADDR_BASE + self.status.node_position as u16)
        {
            IsOwnAddr::Node
        } else if self.config_seen && address == self.config.group_address {
            IsOwnAddr::Group
        } else {
            IsOwnAddr::None
        }
    }
}

impl Default for NetworkManagement {
    fn default() -> Self {
        NetworkManagement::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringcore_abi::NwAvailability;

    fn status(avail: NwAvailability, node_address: u16) -> NetworkStatusParam {
        NetworkStatusParam {
            availability: avail,
            node_address,
            ..Default::default()
        }
    }

    #[test]
    fn first_update_flags_everything() {
        let mut net = NetworkManagement::new();
        let change = net.on_status_update(&status(NwAvailability::Available, 0x101));
        assert_eq!(change, NwChange::all());
    }

    #[test]
    fn second_update_flags_only_mutations() {
        let mut net = NetworkManagement::new();
        net.on_status_update(&status(NwAvailability::Available, 0x101));
        let change = net.on_status_update(&status(NwAvailability::Available, 0x102));
        assert_eq!(change, NwChange::NODE_ADDRESS);
        let change = net.on_status_update(&status(NwAvailability::NotAvailable, 0x102));
        assert_eq!(change, NwChange::AVAILABILITY);
        let change = net.on_status_update(&status(NwAvailability::NotAvailable, 0x102));
        assert!(change.is_empty());
    }

    #[test]
    fn late_observer_gets_snapshot() {
        let mut net = NetworkManagement::new();
        assert_eq!(
            net.add_observer_network_status(NetObsTag::Rtm, NwChange::AVAILABILITY),
            Ok(None)
        );
        net.del_observer_network_status(NetObsTag::Rtm).unwrap();
        net.on_status_update(&status(NwAvailability::Available, 0x101));
        let snap = net
            .add_observer_network_status(NetObsTag::Rtm, NwChange::AVAILABILITY)
            .unwrap()
            .expect("cache holds state");
        assert_eq!(snap.change_mask, NwChange::all());
        assert_eq!(snap.node_address, 0x101);
    }

    #[test]
    fn own_address_classification() {
        let mut net = NetworkManagement::new();
        net.on_status_update(&NetworkStatusParam {
            node_address: 0x101,
            node_position: 2,
            ..Default::default()
        });
        net.on_config_update(&NetworkConfigParam {
            node_address: 0x101,
            group_address: 0x22,
            ..Default::default()
        });
        assert_eq!(net.is_own_address(0x101), IsOwnAddr::Node);
        assert_eq!(net.is_own_address(0x0402), IsOwnAddr::Node);
        assert_eq!(net.is_own_address(0x22), IsOwnAddr::Group);
        assert_eq!(net.is_own_address(0x999), IsOwnAddr::None);
    }
}
