//! INIC instance: resource command family.
//!
//! The create-class commands (ports, sockets, splitter/combiner, sync and
//! packet connections) share one lock bit since the device serializes
//! resource creation; the remaining resource commands carry their own
//! bits. Every command records its lock bit in the single-subject's user
//! mask so the Tx-status bridge can free it when the send already failed.

use ringcore_abi::{ErrorCode, OpType, Sink, StdResult, fid};
use ringcore_base::{Base, LockClient};

use crate::inic::{
    GpioTriggerEvent, Inic, MostPortStatus, SSUB_CREATE_CLASS, SSUB_DEVICE_SYNC,
    SSUB_GPIO_PIN_MODE, SSUB_GPIO_PIN_STATE, SSUB_I2C_PORT_WR, SSUB_MOST_PORT_ENABLE,
    SSUB_MOST_PORT_EN_FULL_STR, SSUB_NOTIFICATION, SSUB_RESOURCE_DESTROY,
    SSUB_RESOURCE_INVAL_LIST, SSUB_STREAM_PORT_CONFIG, SSUB_SYNC_DEMUTE, SSUB_SYNC_MUTE,
    SUB_GPIO_TRIGGER_EVENT, SUB_MOST_PORT_STATUS, SUB_RES_MONITOR, StreamPortConfig,
    release_lock, std_result_handlers,
};
use crate::notice::{Notice, NoticeData, Notices, SubData};
use crate::telegram::{Telegram, decode_u16, hb, lb};
use crate::trcv::Transceiver;

// ---------------------------------------------------------------------------
// API-lock method bits, resource family
// ---------------------------------------------------------------------------

pub const API_CREATE_CLASS: u32 = 0x0001;
pub const API_RESOURCE_DESTROY: u32 = 0x0002;
pub const API_RESOURCE_INVAL_LIST: u32 = 0x0004;
pub const API_NOTIFICATION: u32 = 0x0008;
pub const API_STREAM_PORT_CONFIG: u32 = 0x0010;
pub const API_SYNC_MUTE: u32 = 0x0020;
pub const API_SYNC_DEMUTE: u32 = 0x0040;
pub const API_MOST_PORT_ENABLE: u32 = 0x0080;
pub const API_MOST_PORT_EN_FULL_STR: u32 = 0x0100;
pub const API_GPIO_PIN_MODE: u32 = 0x0200;
pub const API_GPIO_PIN_STATE: u32 = 0x0400;
pub const API_I2C_PORT_WR: u32 = 0x0800;
pub const API_DEVICE_SYNC: u32 = 0x1000;

/// Full-streaming enable is not supported by this derivative; the command
/// stays present behind this capability gate.
pub const CAP_FULL_STREAMING: bool = false;

/// Longest resource handle list accepted by `resource_destroy`.
pub const MAX_DESTROY_HANDLES: usize = 10;

/// Single-subject awaiting the reply of a resource-family lock bit.
pub(crate) fn res_ssub_of(method: u32) -> Option<u8> {
    Some(match method {
        API_CREATE_CLASS => SSUB_CREATE_CLASS,
        API_RESOURCE_DESTROY => SSUB_RESOURCE_DESTROY,
        API_RESOURCE_INVAL_LIST => SSUB_RESOURCE_INVAL_LIST,
        API_NOTIFICATION => SSUB_NOTIFICATION,
        API_STREAM_PORT_CONFIG => SSUB_STREAM_PORT_CONFIG,
        API_SYNC_MUTE => SSUB_SYNC_MUTE,
        API_SYNC_DEMUTE => SSUB_SYNC_DEMUTE,
        API_MOST_PORT_ENABLE => SSUB_MOST_PORT_ENABLE,
        API_MOST_PORT_EN_FULL_STR => SSUB_MOST_PORT_EN_FULL_STR,
        API_GPIO_PIN_MODE => SSUB_GPIO_PIN_MODE,
        API_GPIO_PIN_STATE => SSUB_GPIO_PIN_STATE,
        API_I2C_PORT_WR => SSUB_I2C_PORT_WR,
        API_DEVICE_SYNC => SSUB_DEVICE_SYNC,
        _ => return None,
    })
}

/// Direction of a socket relative to the creating port.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketDirection {
    Input = 0x00,
    Output = 0x01,
}

impl Inic {
    /// Create-class template: one shared lock bit, StartResult op, result
    /// routed to the create-class single-subject.
    fn create_cmd(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        fid: u16,
        payload: &[u8],
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_CREATE_CLASS)),
            SSUB_CREATE_CLASS,
            fid,
            OpType::StartResult,
            payload,
            Some(obs),
            true,
        )
    }

    /// Creates a network socket on the ring port. A source socket with
    /// connection label 0xFFFF asks the device to allocate a fresh label.
    #[allow(clippy::too_many_arguments)]
    pub fn most_socket_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        most_port_handle: u16,
        direction: SocketDirection,
        data_type: u8,
        bandwidth: u16,
        connection_label: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(most_port_handle),
            lb(most_port_handle),
            direction as u8,
            data_type,
            hb(bandwidth),
            lb(bandwidth),
            hb(connection_label),
            lb(connection_label),
        ];
        self.create_cmd(base, trcv, now, fid::FID_MOST_SOCKET_CREATE, &payload, obs)
    }

    pub fn mlb_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        clock_config: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [index, clock_config];
        self.create_cmd(base, trcv, now, fid::FID_MLB_PORT_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mlb_socket_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        mlb_port_handle: u16,
        direction: SocketDirection,
        data_type: u8,
        bandwidth: u16,
        channel_address: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(mlb_port_handle),
            lb(mlb_port_handle),
            direction as u8,
            data_type,
            hb(bandwidth),
            lb(bandwidth),
            hb(channel_address),
            lb(channel_address),
        ];
        self.create_cmd(base, trcv, now, fid::FID_MLB_SOCKET_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn usb_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        physical_layer: u8,
        devices_interfaces: u16,
        streaming_if_ep_out_count: u8,
        streaming_if_ep_in_count: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            index,
            physical_layer,
            hb(devices_interfaces),
            lb(devices_interfaces),
            streaming_if_ep_out_count,
            streaming_if_ep_in_count,
        ];
        self.create_cmd(base, trcv, now, fid::FID_USB_PORT_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn usb_socket_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        usb_port_handle: u16,
        direction: SocketDirection,
        data_type: u8,
        end_point_addr: u8,
        frames_per_transfer: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(usb_port_handle),
            lb(usb_port_handle),
            direction as u8,
            data_type,
            end_point_addr,
            hb(frames_per_transfer),
            lb(frames_per_transfer),
        ];
        self.create_cmd(base, trcv, now, fid::FID_USB_SOCKET_CREATE, &payload, obs)
    }

    pub fn stream_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        clock_config: u8,
        data_alignment: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [index, clock_config, data_alignment];
        self.create_cmd(base, trcv, now, fid::FID_STREAM_PORT_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn stream_socket_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        stream_port_handle: u16,
        direction: SocketDirection,
        data_type: u8,
        bandwidth: u16,
        stream_pin_id: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(stream_port_handle),
            lb(stream_port_handle),
            direction as u8,
            data_type,
            hb(bandwidth),
            lb(bandwidth),
            stream_pin_id,
        ];
        self.create_cmd(base, trcv, now, fid::FID_STREAM_SOCKET_CREATE, &payload, obs)
    }

    pub fn rmck_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        clock_source: u8,
        divisor: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [index, clock_source, hb(divisor), lb(divisor)];
        self.create_cmd(base, trcv, now, fid::FID_RMCK_PORT_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn i2c_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        address: u8,
        mode: u8,
        speed: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [index, address, mode, speed];
        self.create_cmd(base, trcv, now, fid::FID_I2C_PORT_CREATE, &payload, obs)
    }

    pub fn pci_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.create_cmd(base, trcv, now, fid::FID_PCI_PORT_CREATE, &[index], obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pci_socket_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        pci_port_handle: u16,
        direction: SocketDirection,
        data_type: u8,
        dma_channel: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(pci_port_handle),
            lb(pci_port_handle),
            direction as u8,
            data_type,
            dma_channel,
        ];
        self.create_cmd(base, trcv, now, fid::FID_PCI_SOCKET_CREATE, &payload, obs)
    }

    pub fn gpio_port_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        gpio_port_index: u8,
        debounce_time: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [gpio_port_index, hb(debounce_time), lb(debounce_time)];
        self.create_cmd(base, trcv, now, fid::FID_GPIO_PORT_CREATE, &payload, obs)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sync_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        resource_handle_in: u16,
        resource_handle_out: u16,
        default_mute: bool,
        mute_mode: u8,
        offset: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(resource_handle_in),
            lb(resource_handle_in),
            hb(resource_handle_out),
            lb(resource_handle_out),
            default_mute as u8,
            mute_mode,
            hb(offset),
            lb(offset),
        ];
        self.create_cmd(base, trcv, now, fid::FID_SYNC_CREATE, &payload, obs)
    }

    pub fn dfi_phase_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        resource_handle_in: u16,
        resource_handle_out: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(resource_handle_in),
            lb(resource_handle_in),
            hb(resource_handle_out),
            lb(resource_handle_out),
        ];
        self.create_cmd(base, trcv, now, fid::FID_DFIPHASE_CREATE, &payload, obs)
    }

    pub fn combiner_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        port_socket_handle: u16,
        most_port_handle: u16,
        bytes_per_frame: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(port_socket_handle),
            lb(port_socket_handle),
            hb(most_port_handle),
            lb(most_port_handle),
            hb(bytes_per_frame),
            lb(bytes_per_frame),
        ];
        self.create_cmd(base, trcv, now, fid::FID_COMBINER_CREATE, &payload, obs)
    }

    pub fn splitter_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        socket_handle_in: u16,
        most_port_handle: u16,
        bytes_per_frame: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(socket_handle_in),
            lb(socket_handle_in),
            hb(most_port_handle),
            lb(most_port_handle),
            hb(bytes_per_frame),
            lb(bytes_per_frame),
        ];
        self.create_cmd(base, trcv, now, fid::FID_SPLITTER_CREATE, &payload, obs)
    }

    pub fn qos_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        socket_in_handle: u16,
        socket_out_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(socket_in_handle),
            lb(socket_in_handle),
            hb(socket_out_handle),
            lb(socket_out_handle),
        ];
        self.create_cmd(base, trcv, now, fid::FID_QOS_CREATE, &payload, obs)
    }

    pub fn avp_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        socket_in_handle: u16,
        socket_out_handle: u16,
        isoc_packet_size: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(socket_in_handle),
            lb(socket_in_handle),
            hb(socket_out_handle),
            lb(socket_out_handle),
            hb(isoc_packet_size),
            lb(isoc_packet_size),
        ];
        self.create_cmd(base, trcv, now, fid::FID_AVP_CREATE, &payload, obs)
    }

    pub fn ipc_create(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        socket_in_handle: u16,
        socket_out_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(socket_in_handle),
            lb(socket_in_handle),
            hb(socket_out_handle),
            lb(socket_out_handle),
        ];
        self.create_cmd(base, trcv, now, fid::FID_IPC_CREATE, &payload, obs)
    }

    /// Manually mutes a synchronous connection.
    pub fn sync_mute(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        sync_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(sync_handle), lb(sync_handle)];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_SYNC_MUTE)),
            SSUB_SYNC_MUTE,
            fid::FID_SYNC_MUTE,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Demutes a synchronous connection.
    pub fn sync_demute(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        sync_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(sync_handle), lb(sync_handle)];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_SYNC_DEMUTE)),
            SSUB_SYNC_DEMUTE,
            fid::FID_SYNC_DEMUTE,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Destroys the given resources on the device.
    pub fn resource_destroy(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        res_handles: &[u16],
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        if !base.alm.lock(
            &mut base.tm,
            &mut base.scd,
            now,
            LockClient::InicRes,
            API_RESOURCE_DESTROY,
        ) {
            return Err(ErrorCode::ApiLocked);
        }
        if res_handles.is_empty() || res_handles.len() > MAX_DESTROY_HANDLES {
            base.alm.release(
                &mut base.tm,
                &mut base.scd,
                LockClient::InicRes,
                API_RESOURCE_DESTROY,
            );
            return Err(ErrorCode::Param);
        }
        let mut payload = [0u8; 2 * MAX_DESTROY_HANDLES];
        for (i, handle) in res_handles.iter().enumerate() {
            payload[2 * i] = hb(*handle);
            payload[2 * i + 1] = lb(*handle);
        }
        let res = self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_RESOURCE_DESTROY,
            fid::FID_RESOURCE_DESTROY,
            OpType::StartResult,
            &payload[..2 * res_handles.len()],
            Some(obs),
            true,
        );
        match res {
            Ok(()) => {
                self.ssubs[SSUB_RESOURCE_DESTROY as usize].user_mask = API_RESOURCE_DESTROY;
                Ok(())
            }
            Err(e) => {
                base.alm.release(
                    &mut base.tm,
                    &mut base.scd,
                    LockClient::InicRes,
                    API_RESOURCE_DESTROY,
                );
                Err(e)
            }
        }
    }

    /// Retrieves the list of invalid resources.
    pub fn resource_invalid_list_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_RESOURCE_INVAL_LIST)),
            SSUB_RESOURCE_INVAL_LIST,
            fid::FID_RESOURCE_INVALID_LIST,
            OpType::Get,
            &[],
            Some(obs),
            true,
        )
    }

    /// Controls the resource monitor. Fire-and-forget set.
    pub fn resource_monitor_set(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        control: u8,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_RESOURCE_INVAL_LIST,
            fid::FID_RESOURCE_MONITOR,
            OpType::Set,
            &[control],
            None,
            false,
        )
    }

    /// Configures notification routing on the device. Fire-and-forget set.
    pub fn notification_set(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        control: u8,
        device_id: u16,
        fkt_ids: &[u16],
    ) -> Result<(), ErrorCode> {
        let mut payload = [0u8; 3 + 2 * 8];
        if fkt_ids.len() > 8 {
            return Err(ErrorCode::Param);
        }
        payload[0] = control;
        payload[1] = hb(device_id);
        payload[2] = lb(device_id);
        for (i, f) in fkt_ids.iter().enumerate() {
            payload[3 + 2 * i] = hb(*f);
            payload[4 + 2 * i] = lb(*f);
        }
        self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_NOTIFICATION,
            fid::FID_NOTIFICATION,
            OpType::Set,
            &payload[..3 + 2 * fkt_ids.len()],
            None,
            false,
        )
    }

    /// Queries which device is registered for notifications of the given
    /// function.
    pub fn notification_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        fktid: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(fktid), lb(fktid)];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_NOTIFICATION)),
            SSUB_NOTIFICATION,
            fid::FID_NOTIFICATION,
            OpType::Get,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Writes the streaming port configuration; the status readback
    /// acknowledges the write.
    #[allow(clippy::too_many_arguments)]
    pub fn stream_port_config_setget(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        cfg: StreamPortConfig,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            cfg.index,
            cfg.op_mode,
            cfg.port_option,
            cfg.clock_mode,
            cfg.clock_data_delay,
        ];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_STREAM_PORT_CONFIG)),
            SSUB_STREAM_PORT_CONFIG,
            fid::FID_STREAM_PORT_CONFIG,
            OpType::SetGet,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Reads the streaming port configuration.
    pub fn stream_port_config_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        index: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_STREAM_PORT_CONFIG)),
            SSUB_STREAM_PORT_CONFIG,
            fid::FID_STREAM_PORT_CONFIG,
            OpType::Get,
            &[index],
            Some(obs),
            true,
        )
    }

    /// Enables or disables a ring port.
    pub fn most_port_enable(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        most_port_handle: u16,
        enabled: bool,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(most_port_handle), lb(most_port_handle), enabled as u8];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_MOST_PORT_ENABLE)),
            SSUB_MOST_PORT_ENABLE,
            fid::FID_MOST_PORT_ENABLE,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Enables full streaming on a ring port. Gated by
    /// [`CAP_FULL_STREAMING`]; without the capability the command fails
    /// synchronously.
    pub fn most_port_en_full_str(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        most_port_handle: u16,
        enabled: bool,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        if !CAP_FULL_STREAMING {
            return Err(ErrorCode::NotSupported);
        }
        let payload = [hb(most_port_handle), lb(most_port_handle), enabled as u8];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_MOST_PORT_EN_FULL_STR)),
            SSUB_MOST_PORT_EN_FULL_STR,
            fid::FID_MOST_PORT_ENABLE,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Reads the pin modes of a GPIO port.
    pub fn gpio_port_pin_mode_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        gpio_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(gpio_handle), lb(gpio_handle)];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_GPIO_PIN_MODE)),
            SSUB_GPIO_PIN_MODE,
            fid::FID_GPIO_PORT_PIN_MODE,
            OpType::Get,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Writes one pin's mode and reads the full mode list back.
    #[allow(clippy::too_many_arguments)]
    pub fn gpio_port_pin_mode_setget(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        gpio_handle: u16,
        pin: u8,
        mode: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(gpio_handle), lb(gpio_handle), pin, mode];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_GPIO_PIN_MODE)),
            SSUB_GPIO_PIN_MODE,
            fid::FID_GPIO_PORT_PIN_MODE,
            OpType::SetGet,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Reads the pin states of a GPIO port.
    pub fn gpio_port_pin_state_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        gpio_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(gpio_handle), lb(gpio_handle)];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_GPIO_PIN_STATE)),
            SSUB_GPIO_PIN_STATE,
            fid::FID_GPIO_PORT_PIN_STATE,
            OpType::Get,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Writes masked pin states and reads the full state back.
    #[allow(clippy::too_many_arguments)]
    pub fn gpio_port_pin_state_setget(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        gpio_handle: u16,
        mask: u16,
        data: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(gpio_handle),
            lb(gpio_handle),
            hb(mask),
            lb(mask),
            hb(data),
            lb(data),
        ];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_GPIO_PIN_STATE)),
            SSUB_GPIO_PIN_STATE,
            fid::FID_GPIO_PORT_PIN_STATE,
            OpType::SetGet,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Reads from an I2C slave behind the device's I2C port.
    #[allow(clippy::too_many_arguments)]
    pub fn i2c_port_read(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        port_handle: u16,
        slave_address: u8,
        data_len: u8,
        timeout: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            hb(port_handle),
            lb(port_handle),
            slave_address,
            data_len,
            hb(timeout),
            lb(timeout),
        ];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_I2C_PORT_WR)),
            SSUB_I2C_PORT_WR,
            fid::FID_I2C_PORT_READ,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Writes to an I2C slave behind the device's I2C port. In burst mode
    /// the data is split into `block_count` blocks of equal length.
    #[allow(clippy::too_many_arguments)]
    pub fn i2c_port_write(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        port_handle: u16,
        mode: u8,
        block_count: u8,
        slave_address: u8,
        timeout: u16,
        data: &[u8],
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        const I2C_BURST_MODE: u8 = 0x02;
        if data.len() > 32 || (mode == I2C_BURST_MODE && block_count == 0) {
            return Err(ErrorCode::Param);
        }
        let data_len = data.len() as u8;
        let block_len = if mode == I2C_BURST_MODE {
            data_len / block_count
        } else {
            data_len
        };
        let mut payload = [0u8; 8 + 32];
        payload[0] = hb(port_handle);
        payload[1] = lb(port_handle);
        payload[2] = mode;
        payload[3] = block_count;
        payload[4] = slave_address;
        payload[5] = block_len;
        payload[6] = hb(timeout);
        payload[7] = lb(timeout);
        payload[8..8 + data.len()].copy_from_slice(data);
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_I2C_PORT_WR)),
            SSUB_I2C_PORT_WR,
            fid::FID_I2C_PORT_WRITE,
            OpType::StartResult,
            &payload[..8 + data.len()],
            Some(obs),
            true,
        )
    }

    /// Synchronizes the remote device for resource management.
    pub fn device_sync(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_DEVICE_SYNC)),
            SSUB_DEVICE_SYNC,
            fid::FID_DEVICE_SYNC,
            OpType::StartResult,
            &[0x01],
            Some(obs),
            true,
        )
    }

    /// Releases the remote synchronization of the device.
    pub fn device_unsync(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicRes, API_DEVICE_SYNC)),
            SSUB_DEVICE_SYNC,
            fid::FID_DEVICE_SYNC,
            OpType::StartResult,
            &[0x00],
            Some(obs),
            true,
        )
    }
}

// ---------------------------------------------------------------------------
// Handlers, resource family
// ---------------------------------------------------------------------------

/// Result handler of every create-class command that returns one resource
/// handle.
pub(crate) fn create_class_result<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 2 {
        if let Some(sink) = inic.ssubs[SSUB_CREATE_CLASS as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_CREATE_CLASS,
                sink,
                result: StdResult::success(),
                data: NoticeData::ResourceHandle(decode_u16(&p[0..2])),
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_CREATE_CLASS)));
}

pub(crate) fn create_class_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_CREATE_CLASS as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_CREATE_CLASS,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_CREATE_CLASS)));
}

/// The ring socket create additionally reports the connection label the
/// device allocated for the source.
pub(crate) fn most_socket_create_result<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 4 {
        if let Some(sink) = inic.ssubs[SSUB_CREATE_CLASS as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_CREATE_CLASS,
                sink,
                result: StdResult::success(),
                data: NoticeData::MostSocket {
                    socket_handle: decode_u16(&p[0..2]),
                    conn_label: decode_u16(&p[2..4]),
                },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_CREATE_CLASS)));
}

std_result_handlers! {
    sync_mute_result, sync_mute_error
        => (SSUB_SYNC_MUTE, Some((LockClient::InicRes, API_SYNC_MUTE)));
    sync_demute_result, sync_demute_error
        => (SSUB_SYNC_DEMUTE, Some((LockClient::InicRes, API_SYNC_DEMUTE)));
    resource_destroy_result, resource_destroy_error
        => (SSUB_RESOURCE_DESTROY, Some((LockClient::InicRes, API_RESOURCE_DESTROY)));
    most_port_enable_result, most_port_enable_error
        => (SSUB_MOST_PORT_ENABLE, Some((LockClient::InicRes, API_MOST_PORT_ENABLE)));
    device_sync_result, device_sync_error
        => (SSUB_DEVICE_SYNC, Some((LockClient::InicRes, API_DEVICE_SYNC)));
}

pub(crate) fn resource_invalid_list_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if let Some(sink) = inic.ssubs[SSUB_RESOURCE_INVAL_LIST as usize].notify(true) {
        out.push(Notice::Std {
            ssub: SSUB_RESOURCE_INVAL_LIST,
            sink,
            result: StdResult::success(),
            data: NoticeData::InvalidList {
                raw: &p[..p.len() & !1],
            },
        });
    }
    release_lock(base, Some((LockClient::InicRes, API_RESOURCE_INVAL_LIST)));
}

pub(crate) fn resource_invalid_list_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_RESOURCE_INVAL_LIST as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_RESOURCE_INVAL_LIST,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_RESOURCE_INVAL_LIST)));
}

pub(crate) fn resource_monitor_status<'a>(
    _inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.is_empty() {
        return;
    }
    out.push(Notice::Sub {
        sub: SUB_RES_MONITOR,
        data: SubData::ResMonitor {
            state: p[0],
            result: StdResult::success(),
        },
    });
}

pub(crate) fn resource_monitor_error<'a>(
    _inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.is_empty() {
        return;
    }
    out.push(Notice::Sub {
        sub: SUB_RES_MONITOR,
        data: SubData::ResMonitor {
            state: 0,
            result: Inic::translate_error(p),
        },
    });
}

pub(crate) fn notification_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 2 {
        let func_id = decode_u16(&p[0..2]);
        let device_id = if p.len() >= 4 { decode_u16(&p[2..4]) } else { 0 };
        if let Some(sink) = inic.ssubs[SSUB_NOTIFICATION as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NOTIFICATION,
                sink,
                result: StdResult::success(),
                data: NoticeData::Notification { func_id, device_id },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_NOTIFICATION)));
}

pub(crate) fn notification_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_NOTIFICATION as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NOTIFICATION,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_NOTIFICATION)));
}

pub(crate) fn stream_port_config_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 5 {
        let cfg = StreamPortConfig {
            index: p[0],
            op_mode: p[1],
            port_option: p[2],
            clock_mode: p[3],
            clock_data_delay: p[4],
        };
        if let Some(sink) = inic.ssubs[SSUB_STREAM_PORT_CONFIG as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_STREAM_PORT_CONFIG,
                sink,
                result: StdResult::success(),
                data: NoticeData::StreamPortConfig(cfg),
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_STREAM_PORT_CONFIG)));
}

pub(crate) fn stream_port_config_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_STREAM_PORT_CONFIG as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_STREAM_PORT_CONFIG,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_STREAM_PORT_CONFIG)));
}

pub(crate) fn most_port_status_status<'a>(
    _inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() < 7 {
        return;
    }
    out.push(Notice::Sub {
        sub: SUB_MOST_PORT_STATUS,
        data: SubData::MostPortStatus(MostPortStatus {
            most_port_handle: decode_u16(&p[0..2]),
            availability: p[2],
            avail_info: p[3],
            fullstreaming_enabled: p[4] != 0,
            freestreaming_bw: decode_u16(&p[5..7]),
        }),
    });
}

pub(crate) fn gpio_pin_mode_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 2 {
        if let Some(sink) = inic.ssubs[SSUB_GPIO_PIN_MODE as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_GPIO_PIN_MODE,
                sink,
                result: StdResult::success(),
                data: NoticeData::GpioPinMode {
                    gpio_handle: decode_u16(&p[0..2]),
                    raw: &p[2..],
                },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_GPIO_PIN_MODE)));
}

pub(crate) fn gpio_pin_mode_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_GPIO_PIN_MODE as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_GPIO_PIN_MODE,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_GPIO_PIN_MODE)));
}

pub(crate) fn gpio_pin_state_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 6 {
        if let Some(sink) = inic.ssubs[SSUB_GPIO_PIN_STATE as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_GPIO_PIN_STATE,
                sink,
                result: StdResult::success(),
                data: NoticeData::GpioPinState {
                    gpio_handle: decode_u16(&p[0..2]),
                    current_state: decode_u16(&p[2..4]),
                    sticky_state: decode_u16(&p[4..6]),
                },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_GPIO_PIN_STATE)));
}

pub(crate) fn gpio_pin_state_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_GPIO_PIN_STATE as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_GPIO_PIN_STATE,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_GPIO_PIN_STATE)));
}

/// Trigger-event reports fan out to subscribers; the very first report is
/// flagged as the initial snapshot so the application can distinguish it
/// from a change notification.
pub(crate) fn gpio_trigger_status<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() < 8 {
        return;
    }
    let ev = GpioTriggerEvent {
        gpio_handle: decode_u16(&p[0..2]),
        rising_edges: decode_u16(&p[2..4]),
        falling_edges: decode_u16(&p[4..6]),
        levels: decode_u16(&p[6..8]),
        is_first_report: inic.gpio_first_report,
    };
    inic.gpio_first_report = false;
    out.push(Notice::Sub {
        sub: SUB_GPIO_TRIGGER_EVENT,
        data: SubData::GpioTrigger {
            ev,
            result: StdResult::success(),
        },
    });
}

pub(crate) fn gpio_trigger_error<'a>(
    _inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.is_empty() {
        return;
    }
    out.push(Notice::Sub {
        sub: SUB_GPIO_TRIGGER_EVENT,
        data: SubData::GpioTrigger {
            ev: GpioTriggerEvent::default(),
            result: Inic::translate_error(p),
        },
    });
}

pub(crate) fn i2c_port_read_result<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 4 {
        let data_len = (p[3] as usize).min(p.len() - 4);
        if let Some(sink) = inic.ssubs[SSUB_I2C_PORT_WR as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_I2C_PORT_WR,
                sink,
                result: StdResult::success(),
                data: NoticeData::I2cRead {
                    port_handle: decode_u16(&p[0..2]),
                    slave_address: p[2],
                    data: &p[4..4 + data_len],
                },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_I2C_PORT_WR)));
}

pub(crate) fn i2c_port_write_result<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 3 {
        if let Some(sink) = inic.ssubs[SSUB_I2C_PORT_WR as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_I2C_PORT_WR,
                sink,
                result: StdResult::success(),
                data: NoticeData::I2cWritten {
                    port_handle: decode_u16(&p[0..2]),
                    data_len: p[2],
                },
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_I2C_PORT_WR)));
}

pub(crate) fn i2c_port_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_I2C_PORT_WR as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_I2C_PORT_WR,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    release_lock(base, Some((LockClient::InicRes, API_I2C_PORT_WR)));
}
