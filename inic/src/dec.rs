//! Function dispatch table.
//!
//! Inbound telegrams are demultiplexed by the (FunctionId, OpType) key
//! into a handler from a sorted table, searched binary. The table is the
//! single place that ties wire keys to decode logic; commands without a
//! meaningful reaction map to the dummy handler so an unexpected but known
//! telegram never logs as unknown.

use ringcore_abi::{OpType, fid};
use ringcore_base::Base;
use ringcore_lib::rlog_error;

use crate::inic::{self, Inic};
use crate::inic_res;
use crate::notice::Notices;
use crate::telegram::Telegram;

/// Response handler bound to one (FunctionId, OpType) key.
pub type Handler = for<'a> fn(&mut Inic, &mut Base, &'a Telegram, &mut Notices<'a>);

/// One dispatch table entry.
pub struct FktOpEntry {
    pub fid: u16,
    pub op: OpType,
    pub handler: Handler,
}

const fn e(fid: u16, op: OpType, handler: Handler) -> FktOpEntry {
    FktOpEntry { fid, op, handler }
}

use ringcore_abi::OpType::{Error, Result as OpResult, Status};

/// Handler table, sorted ascending by (fid, op).
pub static INIC_HANDLER: &[FktOpEntry] = &[
    e(fid::FID_NOTIFICATION, Status, inic_res::notification_status),
    e(fid::FID_NOTIFICATION, Error, inic_res::notification_error),
    e(fid::FID_DEVICE_STATUS, Status, inic::device_status_status),
    e(fid::FID_DEVICE_STATUS, Error, inic::dummy_handler),
    e(fid::FID_DEVICE_VERSION, Status, inic::device_version_status),
    e(fid::FID_DEVICE_VERSION, Error, inic::device_version_error),
    e(fid::FID_DEVICE_POWER_OFF, Status, inic::dummy_handler),
    e(fid::FID_DEVICE_POWER_OFF, Error, inic::dummy_handler),
    e(fid::FID_DEVICE_ATTACH, OpResult, inic::device_attach_result),
    e(fid::FID_DEVICE_ATTACH, Error, inic::device_attach_error),
    e(fid::FID_DEVICE_SYNC, OpResult, inic_res::device_sync_result),
    e(fid::FID_DEVICE_SYNC, Error, inic_res::device_sync_error),
    e(fid::FID_NW_STATUS, Status, inic::nw_status_status),
    e(fid::FID_NW_STATUS, Error, inic::dummy_handler),
    e(fid::FID_NW_CFG, Status, inic::nw_config_status),
    e(fid::FID_NW_CFG, Error, inic::nw_config_error),
    e(fid::FID_NW_FRAME_COUNTER, Status, inic::nw_frame_counter_status),
    e(fid::FID_NW_FRAME_COUNTER, Error, inic::nw_frame_counter_error),
    e(fid::FID_NW_STARTUP, OpResult, inic::nw_startup_result),
    e(fid::FID_NW_STARTUP, Error, inic::nw_startup_error),
    e(fid::FID_NW_SHUTDOWN, OpResult, inic::nw_shutdown_result),
    e(fid::FID_NW_SHUTDOWN, Error, inic::nw_shutdown_error),
    e(fid::FID_NW_TRIGGER_RBD, OpResult, inic::nw_trigger_rbd_result),
    e(fid::FID_NW_TRIGGER_RBD, Error, inic::nw_trigger_rbd_error),
    e(fid::FID_NW_RBD_RESULT, Status, inic::nw_rbd_result_status),
    e(fid::FID_NW_RBD_RESULT, Error, inic::nw_rbd_result_error),
    e(fid::FID_NW_ATTACH, OpResult, inic::nw_attach_result),
    e(fid::FID_NW_ATTACH, Error, inic::nw_attach_error),
    e(fid::FID_NW_FORCE_NO_AVAIL, Status, inic::nw_force_na_status),
    e(fid::FID_NW_FORCE_NO_AVAIL, Error, inic::nw_force_na_error),
    e(fid::FID_NW_SYS_DIAGNOSIS, OpResult, inic::nw_sys_diagnosis_result),
    e(fid::FID_NW_SYS_DIAGNOSIS, Error, inic::nw_sys_diagnosis_error),
    e(fid::FID_NW_SYS_DIAG_END, OpResult, inic::nw_sys_diag_end_result),
    e(fid::FID_NW_SYS_DIAG_END, Error, inic::nw_sys_diag_end_error),
    e(fid::FID_BC_DIAGNOSIS, OpResult, inic::bc_diagnosis_result),
    e(fid::FID_BC_DIAGNOSIS, Error, inic::bc_diagnosis_error),
    e(fid::FID_BC_DIAG_END, OpResult, inic::bc_diag_end_result),
    e(fid::FID_BC_DIAG_END, Error, inic::bc_diag_end_error),
    e(fid::FID_MOST_PORT_STATUS, Status, inic_res::most_port_status_status),
    e(fid::FID_MOST_PORT_STATUS, Error, inic::dummy_handler),
    e(
        fid::FID_MOST_SOCKET_CREATE,
        OpResult,
        inic_res::most_socket_create_result,
    ),
    e(fid::FID_MOST_SOCKET_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_MOST_SOCKET_STATUS, Status, inic::dummy_handler),
    e(fid::FID_MOST_SOCKET_STATUS, Error, inic::dummy_handler),
    e(fid::FID_MLB_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_MLB_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_MLB_SOCKET_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_MLB_SOCKET_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_SPI_PORT_CREATE, OpResult, inic::dummy_handler),
    e(fid::FID_SPI_PORT_CREATE, Error, inic::dummy_handler),
    e(fid::FID_SPI_SOCKET_CREATE, OpResult, inic::dummy_handler),
    e(fid::FID_SPI_SOCKET_CREATE, Error, inic::dummy_handler),
    e(fid::FID_USB_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_USB_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_USB_SOCKET_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_USB_SOCKET_CREATE, Error, inic_res::create_class_error),
    e(
        fid::FID_STREAM_PORT_CONFIG,
        Status,
        inic_res::stream_port_config_status,
    ),
    e(
        fid::FID_STREAM_PORT_CONFIG,
        Error,
        inic_res::stream_port_config_error,
    ),
    e(fid::FID_STREAM_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_STREAM_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_STREAM_PORT_LOOPBACK, Status, inic::dummy_handler),
    e(fid::FID_STREAM_PORT_LOOPBACK, Error, inic::dummy_handler),
    e(
        fid::FID_STREAM_SOCKET_CREATE,
        OpResult,
        inic_res::create_class_result,
    ),
    e(fid::FID_STREAM_SOCKET_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_RMCK_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_RMCK_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_I2C_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_I2C_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_I2C_PORT_READ, OpResult, inic_res::i2c_port_read_result),
    e(fid::FID_I2C_PORT_READ, Error, inic_res::i2c_port_error),
    e(fid::FID_I2C_PORT_WRITE, OpResult, inic_res::i2c_port_write_result),
    e(fid::FID_I2C_PORT_WRITE, Error, inic_res::i2c_port_error),
    e(fid::FID_PCI_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_PCI_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_PCI_SOCKET_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_PCI_SOCKET_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_GPIO_PORT_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_GPIO_PORT_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_MOST_PORT_ENABLE, OpResult, inic_res::most_port_enable_result),
    e(fid::FID_MOST_PORT_ENABLE, Error, inic_res::most_port_enable_error),
    e(fid::FID_GPIO_PORT_PIN_MODE, Status, inic_res::gpio_pin_mode_status),
    e(fid::FID_GPIO_PORT_PIN_MODE, Error, inic_res::gpio_pin_mode_error),
    e(fid::FID_GPIO_PORT_PIN_STATE, Status, inic_res::gpio_pin_state_status),
    e(fid::FID_GPIO_PORT_PIN_STATE, Error, inic_res::gpio_pin_state_error),
    e(
        fid::FID_GPIO_PORT_TRIGGER_EVENT,
        Status,
        inic_res::gpio_trigger_status,
    ),
    e(fid::FID_GPIO_PORT_TRIGGER_EVENT, Error, inic_res::gpio_trigger_error),
    e(
        fid::FID_RESOURCE_DESTROY,
        OpResult,
        inic_res::resource_destroy_result,
    ),
    e(fid::FID_RESOURCE_DESTROY, Error, inic_res::resource_destroy_error),
    e(
        fid::FID_RESOURCE_INVALID_LIST,
        Status,
        inic_res::resource_invalid_list_status,
    ),
    e(
        fid::FID_RESOURCE_INVALID_LIST,
        Error,
        inic_res::resource_invalid_list_error,
    ),
    e(
        fid::FID_RESOURCE_MONITOR,
        Status,
        inic_res::resource_monitor_status,
    ),
    e(fid::FID_RESOURCE_MONITOR, Error, inic_res::resource_monitor_error),
    e(fid::FID_QOS_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_QOS_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_AVP_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_AVP_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_SYNC_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_SYNC_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_SYNC_MUTE, OpResult, inic_res::sync_mute_result),
    e(fid::FID_SYNC_MUTE, Error, inic_res::sync_mute_error),
    e(fid::FID_SYNC_DEMUTE, OpResult, inic_res::sync_demute_result),
    e(fid::FID_SYNC_DEMUTE, Error, inic_res::sync_demute_error),
    e(fid::FID_DFIPHASE_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_DFIPHASE_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_IPC_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_IPC_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_COMBINER_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_COMBINER_CREATE, Error, inic_res::create_class_error),
    e(fid::FID_SPLITTER_CREATE, OpResult, inic_res::create_class_result),
    e(fid::FID_SPLITTER_CREATE, Error, inic_res::create_class_error),
];

/// Binary search for the handler bound to (fid, op).
pub fn search(fid: u16, op: OpType) -> Option<Handler> {
    INIC_HANDLER
        .binary_search_by(|entry| (entry.fid, entry.op as u8).cmp(&(fid, op as u8)))
        .ok()
        .map(|idx| INIC_HANDLER[idx].handler)
}

/// Decodes an inbound telegram and runs the matching handler. An unknown
/// key only logs; the frame is dropped.
pub fn decode<'a>(inic: &mut Inic, base: &mut Base, tel: &'a Telegram, out: &mut Notices<'a>) {
    match search(tel.id.function_id, tel.id.op_type) {
        Some(handler) => handler(inic, base, tel, out),
        None => {
            rlog_error!(
                "INIC: unknown telegram FktId 0x{:04X} OpType 0x{:02X}",
                tel.id.function_id,
                tel.id.op_type as u8
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in INIC_HANDLER.windows(2) {
            let a = (pair[0].fid, pair[0].op as u8);
            let b = (pair[1].fid, pair[1].op as u8);
            assert!(a < b, "table out of order at {:04X?} vs {:04X?}", a, b);
        }
    }

    #[test]
    fn search_hits_and_misses() {
        assert!(search(fid::FID_NW_STARTUP, OpType::Result).is_some());
        assert!(search(fid::FID_NW_STARTUP, OpType::Status).is_none());
        assert!(search(0x7FFF, OpType::Status).is_none());
    }
}
