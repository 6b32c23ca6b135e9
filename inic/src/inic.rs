//! INIC instance: control command family.
//!
//! Every remote command follows the same template. Lock the method's API
//! bit (a locked bit means a request is already in flight and the call
//! fails with `ApiLocked`), allocate a transmit frame, compose the id and
//! payload, remember the requester on the method's single-subject, send.
//! The Tx-status bridge converts transmission failures into asynchronous
//! `Transmission` results; the Rx handlers decode the reply, notify the
//! single-subject and release the lock bit.
//!
//! The resource command family lives in `inic_res`.

use ringcore_abi::msg::FB_INIC;
use ringcore_abi::{
    ErrorCode, MsgId, NetworkConfigParam, NetworkStatusParam, NwAvailInfo, NwAvailTransCause,
    NwAvailability, OpType, ResultCode, Sink, StdResult, TxStatus, fid,
};
use ringcore_base::{Base, EhEvent, LockClient};
use ringcore_lib::{SingleSubject, Subject, rlog_error, rlog_warn};

use crate::notice::{Notice, NoticeData, Notices, SubData};
use crate::telegram::{Telegram, decode_u16, decode_u32, hb, lb};
use crate::trcv::Transceiver;

// ---------------------------------------------------------------------------
// Single-subject indexes
// ---------------------------------------------------------------------------

pub const SSUB_CREATE_CLASS: u8 = 0;
pub const SSUB_DEVICE_VERSION: u8 = 1;
pub const SSUB_DEVICE_ATTACH: u8 = 2;
pub const SSUB_NW_STARTUP: u8 = 3;
pub const SSUB_NW_SHUTDOWN: u8 = 4;
pub const SSUB_NW_TRIGGER_RBD: u8 = 5;
pub const SSUB_NW_ATTACH: u8 = 6;
pub const SSUB_SYNC_MUTE: u8 = 7;
pub const SSUB_SYNC_DEMUTE: u8 = 8;
pub const SSUB_NW_RBD_RESULT: u8 = 9;
pub const SSUB_NW_FRAME_COUNTER: u8 = 10;
pub const SSUB_RESOURCE_DESTROY: u8 = 11;
pub const SSUB_RESOURCE_INVAL_LIST: u8 = 12;
pub const SSUB_STREAM_PORT_CONFIG: u8 = 13;
pub const SSUB_MOST_PORT_ENABLE: u8 = 14;
pub const SSUB_MOST_PORT_EN_FULL_STR: u8 = 15;
pub const SSUB_DEVICE_SYNC: u8 = 16;
pub const SSUB_NOTIFICATION: u8 = 17;
pub const SSUB_NW_CONFIG: u8 = 18;
pub const SSUB_GPIO_PIN_MODE: u8 = 19;
pub const SSUB_GPIO_PIN_STATE: u8 = 20;
pub const SSUB_I2C_PORT_WR: u8 = 21;
pub const SSUB_NW_SYS_DIAGNOSIS: u8 = 22;
pub const SSUB_NW_SYS_DIAG_END: u8 = 23;
pub const SSUB_NW_FORCE_NA: u8 = 24;
pub const SSUB_BC_DIAGNOSIS: u8 = 25;
pub const SSUB_BC_DIAG_END: u8 = 26;

/// Total number of single-subjects.
pub const INIC_NUM_SSUB: usize = 27;

// ---------------------------------------------------------------------------
// Multi-observer subject indexes
// ---------------------------------------------------------------------------

pub const SUB_TX_MSG_OBJ_AVAIL: u8 = 0;
pub const SUB_NW_STATUS: u8 = 1;
pub const SUB_NW_CONFIG: u8 = 2;
pub const SUB_MOST_PORT_STATUS: u8 = 3;
pub const SUB_RES_MONITOR: u8 = 4;
pub const SUB_GPIO_TRIGGER_EVENT: u8 = 5;
pub const SUB_DEVICE_STATUS: u8 = 6;

/// Total number of subjects.
pub const INIC_NUM_SUB: usize = 7;

/// Observer slots per subject.
pub const INIC_SUB_SLOTS: usize = 4;

// ---------------------------------------------------------------------------
// API-lock method bits, control family
// ---------------------------------------------------------------------------

pub const API_NW_FORCE_NA: u32 = 0x01;
pub const API_NW_SHUTDOWN: u32 = 0x02;
pub const API_NW_FRAME_COUNTER: u32 = 0x04;
pub const API_NW_TRIGGER_RBD: u32 = 0x08;
pub const API_NW_RBD_RESULT: u32 = 0x10;
pub const API_DEVICE_VERSION_GET: u32 = 0x20;

/// Ring-break trigger tolerates this many collector periods before its
/// timeout is reported instead of re-armed.
pub const RBD_RELOCK_BUDGET: u8 = 5;

/// Raw BIST value signalling a failed self-test in the device status.
pub const BIST_FAILED_RAW: u8 = 0x01;

// ---------------------------------------------------------------------------
// Cached property blocks
// ---------------------------------------------------------------------------

/// Cached device status report.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviceStatus {
    pub config_iface_state: u8,
    pub app_iface_state: u8,
    pub power_state: u8,
    pub bist: u8,
    pub last_reset_reason: u8,
}

/// Cached device version report.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviceVersion {
    pub product_identifier: u32,
    pub major_version: u8,
    pub minor_version: u8,
    pub release_version: u8,
    pub build_version: u32,
    pub hw_revision: u8,
    pub diagnosis_id: u16,
    pub cs_major_version: u8,
    pub cs_minor_version: u8,
    pub cs_release_version: u8,
}

/// Frame counter query result.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameCounterStatus {
    pub reference: u32,
    pub frame_counter: u32,
    pub lock: bool,
}

/// Ring-break diagnosis result.
#[derive(Clone, Copy, Debug, Default)]
pub struct RbdResultStatus {
    pub result: u8,
    pub position: u8,
    pub status: u8,
    pub diag_id: u16,
}

/// Port status report of the ring port.
#[derive(Clone, Copy, Debug, Default)]
pub struct MostPortStatus {
    pub most_port_handle: u16,
    pub availability: u8,
    pub avail_info: u8,
    pub fullstreaming_enabled: bool,
    pub freestreaming_bw: u16,
}

/// GPIO trigger event report.
#[derive(Clone, Copy, Debug, Default)]
pub struct GpioTriggerEvent {
    pub gpio_handle: u16,
    pub rising_edges: u16,
    pub falling_edges: u16,
    pub levels: u16,
    /// Distinguishes the initial snapshot from change notifications.
    pub is_first_report: bool,
}

/// Streaming port configuration block.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamPortConfig {
    pub index: u8,
    pub op_mode: u8,
    pub port_option: u8,
    pub clock_mode: u8,
    pub clock_data_delay: u8,
}

/// Writable network configuration parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkConfig {
    pub node_address: u16,
    pub group_address: u16,
    pub llrbc: u8,
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

type InicSubject = Subject<ringcore_abi::InicSubTag, INIC_SUB_SLOTS>;

/// Per-instance state of the companion device interface.
pub struct Inic {
    target_address: u16,
    pub(crate) ssubs: [SingleSubject<Sink>; INIC_NUM_SSUB],
    pub subs: [InicSubject; INIC_NUM_SUB],
    /// The network startup command cannot time out through the collector;
    /// this flag is cleared only by its result or error.
    pub(crate) startup_locked: bool,
    pub(crate) rbd_relock_count: u8,
    pub(crate) device_status: DeviceStatus,
    pub(crate) device_version: DeviceVersion,
    pub(crate) network_status: NetworkStatusParam,
    pub(crate) network_config: NetworkConfigParam,
    /// One-shot flag marking the next GPIO trigger report as the initial
    /// snapshot. Initialised at construction only.
    pub(crate) gpio_first_report: bool,
}

impl Inic {
    pub fn new(target_address: u16) -> Self {
        Inic {
            target_address,
            ssubs: [const { SingleSubject::new() }; INIC_NUM_SSUB],
            subs: [const { Subject::new() }; INIC_NUM_SUB],
            startup_locked: false,
            rbd_relock_count: 0,
            device_status: DeviceStatus::default(),
            device_version: DeviceVersion::default(),
            network_status: NetworkStatusParam::default(),
            network_config: NetworkConfigParam::default(),
            gpio_first_report: true,
        }
    }

    pub fn target_address(&self) -> u16 {
        self.target_address
    }

    /// Which lock client a single-subject's commands belong to.
    pub(crate) fn lock_client_of(ssub: u8) -> LockClient {
        match ssub {
            SSUB_CREATE_CLASS
            | SSUB_SYNC_MUTE
            | SSUB_SYNC_DEMUTE
            | SSUB_RESOURCE_DESTROY
            | SSUB_RESOURCE_INVAL_LIST
            | SSUB_STREAM_PORT_CONFIG
            | SSUB_MOST_PORT_ENABLE
            | SSUB_MOST_PORT_EN_FULL_STR
            | SSUB_DEVICE_SYNC
            | SSUB_NOTIFICATION
            | SSUB_GPIO_PIN_MODE
            | SSUB_GPIO_PIN_STATE
            | SSUB_I2C_PORT_WR => LockClient::InicRes,
            _ => LockClient::InicCmd,
        }
    }

    // -----------------------------------------------------------------------
    // Command template
    // -----------------------------------------------------------------------

    /// Common command path: lock, allocate, compose, subscribe, send.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn issue(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        lock: Option<(LockClient, u32)>,
        ssub: u8,
        fid: u16,
        op: OpType,
        payload: &[u8],
        obs: Option<Sink>,
        tx_bridge: bool,
    ) -> Result<(), ErrorCode> {
        if let Some((client, bit)) = lock {
            if !base
                .alm
                .lock(&mut base.tm, &mut base.scd, now, client, bit)
            {
                return Err(ErrorCode::ApiLocked);
            }
        }
        let Some(mut tel) = trcv.alloc_tx(payload.len() as u8) else {
            if let Some((client, bit)) = lock {
                base.alm.release(&mut base.tm, &mut base.scd, client, bit);
            }
            return Err(ErrorCode::BufferOverflow);
        };
        tel.destination_addr = self.target_address;
        tel.id = MsgId::new(FB_INIC, fid, op);
        tel.payload_mut()[..payload.len()].copy_from_slice(payload);
        if tx_bridge {
            self.ssubs[ssub as usize].user_mask = lock.map(|(_, bit)| bit).unwrap_or(0);
            tel.info = Some(ssub);
        }
        if let Some(sink) = obs {
            self.ssubs[ssub as usize].add_observer(sink);
        }
        trcv.send(tel);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Control commands
    // -----------------------------------------------------------------------

    /// Requests the device version info.
    pub fn device_version_get(
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
            Some((LockClient::InicCmd, API_DEVICE_VERSION_GET)),
            SSUB_DEVICE_VERSION,
            fid::FID_DEVICE_VERSION,
            OpType::Get,
            &[],
            Some(obs),
            true,
        )
    }

    /// Attaches the host controller to the companion device.
    pub fn device_attach(
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
            None,
            SSUB_DEVICE_ATTACH,
            fid::FID_DEVICE_ATTACH,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    /// Attaches the given message channel to the network.
    pub fn nw_attach(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        pmp_channel_handle: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [hb(pmp_channel_handle), lb(pmp_channel_handle)];
        self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_NW_ATTACH,
            fid::FID_NW_ATTACH,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Starts up the ring. Uses its own boolean lock which only the result
    /// or error telegram clears; the generic collector never touches it.
    pub fn nw_startup(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        auto_forced_na: u16,
        packet_bandwidth: u16,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        if self.startup_locked {
            return Err(ErrorCode::ApiLocked);
        }
        let payload = [
            hb(auto_forced_na),
            lb(auto_forced_na),
            hb(packet_bandwidth),
            lb(packet_bandwidth),
        ];
        self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_NW_STARTUP,
            fid::FID_NW_STARTUP,
            OpType::StartResult,
            &payload,
            Some(obs),
            true,
        )?;
        self.startup_locked = true;
        Ok(())
    }

    /// Shuts the entire ring down.
    pub fn nw_shutdown(
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
            Some((LockClient::InicCmd, API_NW_SHUTDOWN)),
            SSUB_NW_SHUTDOWN,
            fid::FID_NW_SHUTDOWN,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    /// Triggers the ring-break diagnosis. `rbd_type` selects master or
    /// slave behavior on the wire.
    pub fn nw_trigger_rbd(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        rbd_type: u8,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let res = self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicCmd, API_NW_TRIGGER_RBD)),
            SSUB_NW_TRIGGER_RBD,
            fid::FID_NW_TRIGGER_RBD,
            OpType::StartResult,
            &[rbd_type],
            Some(obs),
            true,
        );
        if res.is_ok() {
            self.rbd_relock_count = 0;
        }
        res
    }

    /// Queries the ring-break diagnosis result.
    pub fn nw_rbd_result_get(
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
            Some((LockClient::InicCmd, API_NW_RBD_RESULT)),
            SSUB_NW_RBD_RESULT,
            fid::FID_NW_RBD_RESULT,
            OpType::Get,
            &[],
            Some(obs),
            true,
        )
    }

    /// Forces (or stops forcing) the ring into the not-available state.
    pub fn nw_force_not_available(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        force: bool,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicCmd, API_NW_FORCE_NA)),
            SSUB_NW_FORCE_NA,
            fid::FID_NW_FORCE_NO_AVAIL,
            OpType::SetGet,
            &[force as u8],
            Some(obs),
            true,
        )
    }

    /// Modifies the network configuration; the status readback acknowledges
    /// the write. `mask` selects node address, group address and retry
    /// block count via bits 0..2.
    pub fn nw_config_setget(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        mask: u16,
        config: NetworkConfig,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let mask = mask & 0x07;
        let mut payload = [0u8; 24];
        payload[0] = hb(mask);
        payload[1] = lb(mask);
        payload[2] = hb(config.node_address);
        payload[3] = lb(config.node_address);
        payload[4] = hb(config.group_address);
        payload[5] = lb(config.group_address);
        payload[6] = config.llrbc;
        self.issue(
            base,
            trcv,
            now,
            None,
            SSUB_NW_CONFIG,
            fid::FID_NW_CFG,
            OpType::SetGet,
            &payload,
            Some(obs),
            false,
        )
    }

    /// Requests the network configuration status.
    pub fn nw_config_get(
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
            None,
            SSUB_NW_CONFIG,
            fid::FID_NW_CFG,
            OpType::Get,
            &[],
            Some(obs),
            false,
        )
    }

    /// Requests the network frame counter for the given reference value.
    pub fn nw_frame_counter_get(
        &mut self,
        base: &mut Base,
        trcv: &mut dyn Transceiver,
        now: u16,
        reference: u32,
        obs: Sink,
    ) -> Result<(), ErrorCode> {
        let payload = [
            (reference >> 24) as u8,
            (reference >> 16) as u8,
            (reference >> 8) as u8,
            reference as u8,
        ];
        self.issue(
            base,
            trcv,
            now,
            Some((LockClient::InicCmd, API_NW_FRAME_COUNTER)),
            SSUB_NW_FRAME_COUNTER,
            fid::FID_NW_FRAME_COUNTER,
            OpType::Get,
            &payload,
            Some(obs),
            true,
        )
    }

    /// Starts the system diagnosis.
    pub fn nw_sys_diagnosis(
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
            None,
            SSUB_NW_SYS_DIAGNOSIS,
            fid::FID_NW_SYS_DIAGNOSIS,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    /// Ends the system diagnosis.
    pub fn nw_sys_diag_end(
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
            None,
            SSUB_NW_SYS_DIAG_END,
            fid::FID_NW_SYS_DIAG_END,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    /// Starts the back-channel diagnosis.
    pub fn bc_diagnosis(
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
            None,
            SSUB_BC_DIAGNOSIS,
            fid::FID_BC_DIAGNOSIS,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    /// Ends the back-channel diagnosis.
    pub fn bc_diag_end(
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
            None,
            SSUB_BC_DIAG_END,
            fid::FID_BC_DIAG_END,
            OpType::StartResult,
            &[],
            Some(obs),
            true,
        )
    }

    // -----------------------------------------------------------------------
    // Response plumbing
    // -----------------------------------------------------------------------

    /// Tx-status bridge. A failed transmission synthesizes a
    /// `Transmission` result for the awaiting single-subject and frees the
    /// lock bit recorded in its user mask. The caller releases the frame
    /// and thereby raises the buffer-available fan-out.
    pub fn msg_tx_status<'a>(
        &mut self,
        base: &mut Base,
        tel: &Telegram,
        status: TxStatus,
        out: &mut Notices<'a>,
    ) {
        if let Some(ssub) = tel.info {
            let ssub_ref = &mut self.ssubs[ssub as usize];
            let user_mask = ssub_ref.user_mask;
            if status != TxStatus::Ok {
                if let Some(sink) = ssub_ref.notify(true) {
                    out.push(Notice::Std {
                        ssub,
                        sink,
                        result: StdResult::of(ResultCode::Transmission),
                        data: NoticeData::TxFailed(status),
                    });
                }
                if user_mask != 0 {
                    base.alm.release(
                        &mut base.tm,
                        &mut base.scd,
                        Self::lock_client_of(ssub),
                        user_mask,
                    );
                }
                if ssub == SSUB_NW_STARTUP {
                    self.startup_locked = false;
                }
            }
            self.ssubs[ssub as usize].user_mask = 0;
        }
        if self.subs[SUB_TX_MSG_OBJ_AVAIL as usize].num_observers() > 0 {
            out.push(Notice::Sub {
                sub: SUB_TX_MSG_OBJ_AVAIL,
                data: SubData::TxMsgObjAvail,
            });
        }
    }

    /// Collector timeout on one of this instance's lock bits.
    pub fn handle_api_timeout<'a>(
        &mut self,
        base: &mut Base,
        now: u16,
        client: LockClient,
        method: u32,
        out: &mut Notices<'a>,
    ) {
        if client == LockClient::InicCmd && method == API_NW_TRIGGER_RBD {
            // The ring-break trigger takes several collector periods on a
            // healthy ring; re-arm the lock until the budget is spent.
            self.rbd_relock_count = self.rbd_relock_count.saturating_add(1);
            if self.rbd_relock_count < RBD_RELOCK_BUDGET {
                let _ = base.alm.lock(
                    &mut base.tm,
                    &mut base.scd,
                    now,
                    LockClient::InicCmd,
                    API_NW_TRIGGER_RBD,
                );
                return;
            }
        }
        let ssub = match (client, method) {
            (LockClient::InicCmd, API_NW_FORCE_NA) => SSUB_NW_FORCE_NA,
            (LockClient::InicCmd, API_NW_SHUTDOWN) => SSUB_NW_SHUTDOWN,
            (LockClient::InicCmd, API_NW_FRAME_COUNTER) => SSUB_NW_FRAME_COUNTER,
            (LockClient::InicCmd, API_NW_TRIGGER_RBD) => SSUB_NW_TRIGGER_RBD,
            (LockClient::InicCmd, API_NW_RBD_RESULT) => SSUB_NW_RBD_RESULT,
            (LockClient::InicCmd, API_DEVICE_VERSION_GET) => SSUB_DEVICE_VERSION,
            (LockClient::InicRes, m) => match crate::inic_res::res_ssub_of(m) {
                Some(ssub) => ssub,
                None => {
                    rlog_error!("INIC: unknown resource lock bitmask 0x{:02X}", m);
                    return;
                }
            },
            _ => {
                rlog_error!("INIC: unknown command lock bitmask 0x{:02X}", method);
                return;
            }
        };
        rlog_error!("INIC: API locking timeout on method bitmask 0x{:02X}", method);
        if let Some(sink) = self.ssubs[ssub as usize].notify(true) {
            out.push(Notice::Std {
                ssub,
                sink,
                result: StdResult::of(ResultCode::Timeout),
                data: NoticeData::None,
            });
        }
    }

    /// Termination: cancel every pending request with a system error.
    pub fn handle_internal_errors<'a>(&mut self, out: &mut Notices<'a>) {
        self.startup_locked = false;
        for i in 0..INIC_NUM_SSUB as u8 {
            self.ssubs[i as usize].user_mask = 0;
            if let Some(sink) = self.ssubs[i as usize].notify(true) {
                out.push(Notice::Std {
                    ssub: i,
                    sink,
                    result: StdResult::of(ResultCode::System),
                    data: NoticeData::None,
                });
            }
        }
    }

    /// Decodes an error telegram. A leading byte of 0x20 marks a standard
    /// error whose secondary byte maps into the public result code; all
    /// other payloads carry the generic standard-error code with the raw
    /// bytes attached.
    pub(crate) fn translate_error<'a>(payload: &'a [u8]) -> StdResult<'a> {
        let code = match payload {
            [0x20, second, ..] => ResultCode::from_most_error_byte(*second),
            _ => ResultCode::MostStandard,
        };
        StdResult {
            code,
            info: payload,
        }
    }

    // -----------------------------------------------------------------------
    // Synchronous getters on cached state
    // -----------------------------------------------------------------------

    pub fn group_address(&self) -> u16 {
        self.network_config.group_address
    }

    pub fn packet_data_bandwidth(&self) -> u16 {
        self.network_status.packet_bw
    }

    pub fn node_address(&self) -> u16 {
        self.network_status.node_address
    }

    pub fn node_position(&self) -> u8 {
        self.network_status.node_position
    }

    pub fn number_of_nodes(&self) -> u8 {
        self.network_status.max_position
    }

    pub fn llrbc(&self) -> u8 {
        self.network_config.llrbc
    }

    pub fn device_version(&self) -> DeviceVersion {
        self.device_version
    }

    pub fn device_status(&self) -> DeviceStatus {
        self.device_status
    }

    pub fn last_reset_reason(&self) -> u8 {
        self.device_status.last_reset_reason
    }

    pub fn network_availability(&self) -> NwAvailability {
        self.network_status.availability
    }
}

// ---------------------------------------------------------------------------
// Handlers, control family
// ---------------------------------------------------------------------------

pub(crate) fn dummy_handler<'a>(
    _inic: &mut Inic,
    _base: &mut Base,
    _tel: &'a Telegram,
    _out: &mut Notices<'a>,
) {
}

pub(crate) fn device_status_status<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() < 5 {
        return;
    }
    inic.device_status = DeviceStatus {
        config_iface_state: p[0],
        app_iface_state: p[1],
        power_state: p[2],
        bist: p[3],
        last_reset_reason: p[4],
    };
    if inic.device_status.bist == BIST_FAILED_RAW {
        out.push(Notice::Event(EhEvent::BIST_FAILED));
    }
    out.push(Notice::Sub {
        sub: SUB_DEVICE_STATUS,
        data: SubData::DeviceStatus(inic.device_status),
    });
}

pub(crate) fn device_version_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 18 {
        inic.device_version = DeviceVersion {
            product_identifier: decode_u32(&p[0..4]),
            major_version: p[4],
            minor_version: p[5],
            release_version: p[6],
            build_version: decode_u32(&p[7..11]),
            hw_revision: p[11],
            diagnosis_id: decode_u16(&p[12..14]),
            cs_major_version: p[15],
            cs_minor_version: p[16],
            cs_release_version: p[17],
        };
        if let Some(sink) = inic.ssubs[SSUB_DEVICE_VERSION as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_DEVICE_VERSION,
                sink,
                result: StdResult::success(),
                data: NoticeData::DeviceVersion(inic.device_version),
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_DEVICE_VERSION_GET,
    );
}

pub(crate) fn device_version_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_DEVICE_VERSION as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_DEVICE_VERSION,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_DEVICE_VERSION_GET,
    );
}

pub(crate) fn nw_status_status<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() < 11 {
        rlog_warn!("INIC: short network status telegram ({} bytes)", p.len());
        return;
    }
    inic.network_status = NetworkStatusParam {
        change_mask: Default::default(),
        events: decode_u16(&p[0..2]),
        availability: NwAvailability::from_raw(p[2]),
        avail_info: NwAvailInfo::from_raw(p[3]),
        avail_trans_cause: NwAvailTransCause::from_raw(p[4]),
        node_address: decode_u16(&p[5..7]),
        node_position: p[7],
        max_position: p[8],
        packet_bw: decode_u16(&p[9..11]),
    };
    out.push(Notice::Sub {
        sub: SUB_NW_STATUS,
        data: SubData::NwStatus(inic.network_status),
    });
}

pub(crate) fn nw_config_status<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() < 5 {
        return;
    }
    inic.network_config = NetworkConfigParam {
        change_mask: Default::default(),
        node_address: decode_u16(&p[0..2]),
        group_address: decode_u16(&p[2..4]),
        llrbc: p[4],
    };
    out.push(Notice::Sub {
        sub: SUB_NW_CONFIG,
        data: SubData::NwConfig(inic.network_config),
    });
    if let Some(sink) = inic.ssubs[SSUB_NW_CONFIG as usize].notify(true) {
        out.push(Notice::Std {
            ssub: SSUB_NW_CONFIG,
            sink,
            result: StdResult::success(),
            data: NoticeData::None,
        });
    }
}

pub(crate) fn nw_config_error<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.is_empty() {
        return;
    }
    if let Some(sink) = inic.ssubs[SSUB_NW_CONFIG as usize].notify(true) {
        out.push(Notice::Std {
            ssub: SSUB_NW_CONFIG,
            sink,
            result: Inic::translate_error(p),
            data: NoticeData::None,
        });
    }
}

pub(crate) fn nw_frame_counter_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 9 {
        let status = FrameCounterStatus {
            reference: decode_u32(&p[0..4]),
            frame_counter: decode_u32(&p[4..8]),
            lock: p[8] != 0,
        };
        if let Some(sink) = inic.ssubs[SSUB_NW_FRAME_COUNTER as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NW_FRAME_COUNTER,
                sink,
                result: StdResult::success(),
                data: NoticeData::FrameCounter(status),
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_NW_FRAME_COUNTER,
    );
}

pub(crate) fn nw_frame_counter_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_NW_FRAME_COUNTER as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NW_FRAME_COUNTER,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_NW_FRAME_COUNTER,
    );
}

pub(crate) fn nw_startup_result<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    _tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    inic.startup_locked = false;
    if let Some(sink) = inic.ssubs[SSUB_NW_STARTUP as usize].notify(true) {
        out.push(Notice::Std {
            ssub: SSUB_NW_STARTUP,
            sink,
            result: StdResult::success(),
            data: NoticeData::None,
        });
    }
}

pub(crate) fn nw_startup_error<'a>(
    inic: &mut Inic,
    _base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    inic.startup_locked = false;
    if let Some(sink) = inic.ssubs[SSUB_NW_STARTUP as usize].notify(true) {
        out.push(Notice::Std {
            ssub: SSUB_NW_STARTUP,
            sink,
            result: Inic::translate_error(tel.payload()),
            data: NoticeData::None,
        });
    }
}

/// Generates the simple result/error handler pairs that only notify a
/// single-subject and release a lock bit.
macro_rules! std_result_handlers {
    ($($result_fn:ident, $error_fn:ident => ($ssub:expr, $lock:expr);)*) => {
        $(
            pub(crate) fn $result_fn<'a>(
                inic: &mut Inic,
                base: &mut Base,
                _tel: &'a Telegram,
                out: &mut Notices<'a>,
            ) {
                if let Some(sink) = inic.ssubs[$ssub as usize].notify(true) {
                    out.push(Notice::Std {
                        ssub: $ssub,
                        sink,
                        result: StdResult::success(),
                        data: NoticeData::None,
                    });
                }
                release_lock(base, $lock);
            }

            pub(crate) fn $error_fn<'a>(
                inic: &mut Inic,
                base: &mut Base,
                tel: &'a Telegram,
                out: &mut Notices<'a>,
            ) {
                let p = tel.payload();
                if !p.is_empty() {
                    if let Some(sink) = inic.ssubs[$ssub as usize].notify(true) {
                        out.push(Notice::Std {
                            ssub: $ssub,
                            sink,
                            result: Inic::translate_error(p),
                            data: NoticeData::None,
                        });
                    }
                }
                release_lock(base, $lock);
            }
        )*
    };
}

pub(crate) use std_result_handlers;

pub(crate) fn release_lock(base: &mut Base, lock: Option<(LockClient, u32)>) {
    if let Some((client, bit)) = lock {
        base.alm.release(&mut base.tm, &mut base.scd, client, bit);
    }
}

std_result_handlers! {
    nw_shutdown_result, nw_shutdown_error
        => (SSUB_NW_SHUTDOWN, Some((LockClient::InicCmd, API_NW_SHUTDOWN)));
    nw_trigger_rbd_result, nw_trigger_rbd_error
        => (SSUB_NW_TRIGGER_RBD, Some((LockClient::InicCmd, API_NW_TRIGGER_RBD)));
    nw_force_na_status, nw_force_na_error
        => (SSUB_NW_FORCE_NA, Some((LockClient::InicCmd, API_NW_FORCE_NA)));
    device_attach_result, device_attach_error => (SSUB_DEVICE_ATTACH, None);
    nw_attach_result, nw_attach_error => (SSUB_NW_ATTACH, None);
    nw_sys_diagnosis_result, nw_sys_diagnosis_error => (SSUB_NW_SYS_DIAGNOSIS, None);
    nw_sys_diag_end_result, nw_sys_diag_end_error => (SSUB_NW_SYS_DIAG_END, None);
    bc_diagnosis_result, bc_diagnosis_error => (SSUB_BC_DIAGNOSIS, None);
    bc_diag_end_result, bc_diag_end_error => (SSUB_BC_DIAG_END, None);
}

pub(crate) fn nw_rbd_result_status<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if p.len() >= 3 {
        let status = RbdResultStatus {
            result: p[0],
            position: p[1],
            status: p[2],
            diag_id: if p.len() >= 5 { decode_u16(&p[3..5]) } else { 0 },
        };
        if let Some(sink) = inic.ssubs[SSUB_NW_RBD_RESULT as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NW_RBD_RESULT,
                sink,
                result: StdResult::success(),
                data: NoticeData::RbdResult(status),
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_NW_RBD_RESULT,
    );
}

pub(crate) fn nw_rbd_result_error<'a>(
    inic: &mut Inic,
    base: &mut Base,
    tel: &'a Telegram,
    out: &mut Notices<'a>,
) {
    let p = tel.payload();
    if !p.is_empty() {
        if let Some(sink) = inic.ssubs[SSUB_NW_RBD_RESULT as usize].notify(true) {
            out.push(Notice::Std {
                ssub: SSUB_NW_RBD_RESULT,
                sink,
                result: Inic::translate_error(p),
                data: NoticeData::None,
            });
        }
    }
    base.alm.release(
        &mut base.tm,
        &mut base.scd,
        LockClient::InicCmd,
        API_NW_RBD_RESULT,
    );
}
