//! Function ids of the companion device's command namespace.
//!
//! Values are part of the INIC ABI and must not change.

pub const FID_NOTIFICATION: u16 = 0x001;

pub const FID_DEVICE_STATUS: u16 = 0x220;
pub const FID_DEVICE_VERSION: u16 = 0x221;
pub const FID_DEVICE_POWER_OFF: u16 = 0x222;
pub const FID_DEVICE_ATTACH: u16 = 0x223;
pub const FID_DEVICE_SYNC: u16 = 0x224;

pub const FID_NW_STATUS: u16 = 0x520;
pub const FID_NW_CFG: u16 = 0x521;
pub const FID_NW_FRAME_COUNTER: u16 = 0x523;
pub const FID_NW_STARTUP: u16 = 0x524;
pub const FID_NW_SHUTDOWN: u16 = 0x525;
pub const FID_NW_TRIGGER_RBD: u16 = 0x526;
pub const FID_NW_RBD_RESULT: u16 = 0x527;
pub const FID_NW_ATTACH: u16 = 0x528;
pub const FID_NW_DETACH: u16 = 0x529;
pub const FID_NW_FORCE_NO_AVAIL: u16 = 0x52B;
pub const FID_NW_SYS_DIAGNOSIS: u16 = 0x52C;
pub const FID_NW_SYS_DIAG_END: u16 = 0x52D;
pub const FID_BC_DIAGNOSIS: u16 = 0x52E;
pub const FID_BC_DIAG_END: u16 = 0x52F;

pub const FID_MOST_PORT_STATUS: u16 = 0x602;
pub const FID_MOST_SOCKET_CREATE: u16 = 0x611;
pub const FID_MOST_SOCKET_STATUS: u16 = 0x612;
pub const FID_MLB_PORT_CREATE: u16 = 0x621;
pub const FID_MLB_SOCKET_CREATE: u16 = 0x631;
pub const FID_SPI_PORT_CREATE: u16 = 0x641;
pub const FID_SPI_SOCKET_CREATE: u16 = 0x651;
pub const FID_USB_PORT_CREATE: u16 = 0x661;
pub const FID_USB_SOCKET_CREATE: u16 = 0x671;
pub const FID_STREAM_PORT_CONFIG: u16 = 0x680;
pub const FID_STREAM_PORT_CREATE: u16 = 0x681;
pub const FID_STREAM_PORT_LOOPBACK: u16 = 0x683;
pub const FID_STREAM_SOCKET_CREATE: u16 = 0x691;
pub const FID_RMCK_PORT_CREATE: u16 = 0x6A1;
pub const FID_I2C_PORT_CREATE: u16 = 0x6C1;
pub const FID_I2C_PORT_READ: u16 = 0x6C3;
pub const FID_I2C_PORT_WRITE: u16 = 0x6C4;
pub const FID_PCI_PORT_CREATE: u16 = 0x6E1;
pub const FID_PCI_SOCKET_CREATE: u16 = 0x6F1;

pub const FID_GPIO_PORT_CREATE: u16 = 0x701;
pub const FID_MOST_PORT_ENABLE: u16 = 0x702;
pub const FID_GPIO_PORT_PIN_MODE: u16 = 0x703;
pub const FID_GPIO_PORT_PIN_STATE: u16 = 0x704;
pub const FID_GPIO_PORT_TRIGGER_EVENT: u16 = 0x705;

pub const FID_RESOURCE_DESTROY: u16 = 0x800;
pub const FID_RESOURCE_INVALID_LIST: u16 = 0x801;
pub const FID_RESOURCE_MONITOR: u16 = 0x802;

pub const FID_QOS_CREATE: u16 = 0x851;
pub const FID_AVP_CREATE: u16 = 0x861;
pub const FID_SYNC_CREATE: u16 = 0x871;
pub const FID_SYNC_MUTE: u16 = 0x873;
pub const FID_SYNC_DEMUTE: u16 = 0x874;
pub const FID_DFIPHASE_CREATE: u16 = 0x881;
pub const FID_IPC_CREATE: u16 = 0x891;
pub const FID_COMBINER_CREATE: u16 = 0x901;
pub const FID_SPLITTER_CREATE: u16 = 0x911;
