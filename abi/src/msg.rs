//! Telegram identification tuple and internal message addresses.

/// Operation type of a telegram, the 4-bit half of the method key.
///
/// The integer values are dictated by the INIC ABI and are preserved
/// bit-for-bit.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpType {
    Get = 1,
    Set = 2,
    SetGet = 4,
    Start = 6,
    StartResult = 7,
    StartResultAck = 8,
    ErrorAck = 9,
    Status = 12,
    Result = 13,
    ResultAck = 14,
    Error = 15,
}

impl OpType {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => OpType::Get,
            2 => OpType::Set,
            4 => OpType::SetGet,
            6 => OpType::Start,
            7 => OpType::StartResult,
            8 => OpType::StartResultAck,
            9 => OpType::ErrorAck,
            12 => OpType::Status,
            13 => OpType::Result,
            14 => OpType::ResultAck,
            15 => OpType::Error,
            _ => return None,
        })
    }
}

/// Identification of a telegram: function block, instance, function id and
/// operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsgId {
    pub fblock_id: u8,
    pub instance_id: u8,
    pub function_id: u16,
    pub op_type: OpType,
}

impl MsgId {
    pub const fn new(fblock_id: u8, function_id: u16, op_type: OpType) -> Self {
        MsgId {
            fblock_id,
            instance_id: 0,
            function_id,
            op_type,
        }
    }
}

/// Function block id of the companion device's main function block.
pub const FB_INIC: u8 = 0x00;
/// Function block id of the extended command namespace.
pub const FB_EXC: u8 = 0x0A;

/// Internal control-channel address of the companion device.
pub const MSG_ADDR_INIC: u16 = 0x0001;
/// Internal control-channel address of the host configuration interface.
pub const MSG_ADDR_EHC_CFG: u16 = 0x0002;
/// Internal control-channel address of the host application interface.
pub const MSG_ADDR_EHC_APP: u16 = 0x0003;

/// Network address alias of the locally attached device.
pub const ADDR_LOCAL_DEV: u16 = 0x0001;
