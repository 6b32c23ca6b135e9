//! Network node descriptors.

/// Identity of a node as reported by discovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeSignature {
    pub node_address: u16,
    pub group_address: u16,
    pub mac_addr: [u8; 6],
    pub node_pos_addr: u16,
    pub chip_id: [u8; 6],
}

impl NodeSignature {
    pub const fn with_address(node_address: u16) -> Self {
        NodeSignature {
            node_address,
            group_address: 0,
            mac_addr: [0; 6],
            node_pos_addr: 0,
            chip_id: [0; 6],
        }
    }
}

/// Caller-provided node table entry. The availability flag is set and
/// cleared by discovery or application policy and gates route activation
/// on that node.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeEntry {
    pub signature: NodeSignature,
    pub(crate) available: bool,
}

impl NodeEntry {
    pub const fn new(signature: NodeSignature) -> Self {
        NodeEntry {
            signature,
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}
