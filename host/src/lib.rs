//! External Host Controller facade.
//!
//! [`Ehc`] owns one complete library instance: the runtime base, the
//! command layer, the network cache and the routing layer, wired together
//! with the closed dispatch tags. The host application drives it with a
//! monotonic 16-bit millisecond clock and periodic [`Ehc::service`] calls;
//! everything asynchronous comes back through the callback set provided at
//! construction. All callbacks receive the opaque `user_ptr` the
//! application registered, never dereferenced by the library.

#![cfg_attr(not(test), no_std)]

pub mod init;

#[cfg(test)]
mod ehc_tests;
#[cfg(test)]
pub(crate) mod testsup;

use core::ffi::c_void;

use ringcore_abi::msg::{MSG_ADDR_EHC_CFG, MSG_ADDR_INIC};
use ringcore_abi::{
    EhObsTag, ErrorCode, InicSubTag, InitResult, NetObsTag, NetworkConfigParam,
    NetworkStatusParam, NwChange, NwConfigChange, RouteInfos, Sink, SrvKind, StdResult, TimerUser,
    TxStatus, XrmResult,
};
use ringcore_base::alm::ALM_MAX_TIMEOUTS;
use ringcore_base::timer::TM_EVENT_UPDATE_TIMERS;
use ringcore_base::{Base, EhEvent, GeneralError};
use ringcore_inic::inic::{
    INIC_NUM_SSUB, INIC_NUM_SUB, SSUB_BC_DIAG_END, SSUB_BC_DIAGNOSIS, SSUB_DEVICE_ATTACH,
    SSUB_DEVICE_VERSION, SSUB_NW_CONFIG, SSUB_NW_FORCE_NA, SSUB_NW_FRAME_COUNTER,
    SSUB_NW_RBD_RESULT, SSUB_NW_SHUTDOWN, SSUB_NW_STARTUP, SSUB_NW_SYS_DIAG_END,
    SSUB_NW_SYS_DIAGNOSIS, SSUB_NW_TRIGGER_RBD, SUB_NW_CONFIG, SUB_NW_STATUS,
};
use ringcore_inic::net::IsOwnAddr;
use ringcore_inic::{
    DeviceVersion, Inic, NetworkManagement, Notice, NoticeData, Notices, SubData, Telegram,
    Transceiver, dec,
};
use ringcore_lib::rlog_info;
use ringcore_route::epm::RouteTables;
use ringcore_route::rtm::RTM_NW_AVAILABILITY_MASK;
use ringcore_route::{
    EndpointEntry, Epm, NodeEntry, RouteEntry, RouteReports, Rtm, XrmJob,
};

use crate::init::{INIT_TIMEOUT, InitSm, InitStep};

pub use ringcore_route::epm::EPM_MAGIC;

// ---------------------------------------------------------------------------
// Callback surface
// ---------------------------------------------------------------------------

pub type TickClockFn = fn(*mut c_void) -> u16;
pub type WakeHintFn = fn(*mut c_void, u16);
pub type RequestServiceFn = fn(*mut c_void);
pub type InitResultFn = fn(*mut c_void, InitResult);
pub type ErrorFn = fn(*mut c_void, GeneralError);
pub type RouteReportFn = fn(*mut c_void, u16, RouteInfos);
pub type XrmJobFn = fn(*mut c_void, u8, XrmJob);
pub type CmdResultFn = for<'a> fn(*mut c_void, &StdResult<'a>, &NoticeData<'a>);
pub type SubEventFn = for<'a> fn(*mut c_void, &SubData<'a>);
pub type NwStatusFn = fn(*mut c_void, &NetworkStatusParam);
pub type NwConfigFn = fn(*mut c_void, &NetworkConfigParam);

/// Host-provided construction data: the clock, the optional hooks and the
/// opaque context passed back into every callback.
#[derive(Clone, Copy)]
pub struct InitData {
    /// Monotonic 16-bit millisecond clock.
    pub tick_clock: TickClockFn,
    /// "Service me no later than N ms" hint for hosts that sleep.
    pub wake_hint: Option<WakeHintFn>,
    /// Another service call is needed to drain pending events.
    pub request_service: Option<RequestServiceFn>,
    /// One-shot initialization result.
    pub init_result: Option<InitResultFn>,
    /// Public error reports.
    pub error: Option<ErrorFn>,
    /// Route state reports.
    pub route_report: Option<RouteReportFn>,
    /// Resource-manager job submission.
    pub xrm_job: Option<XrmJobFn>,
    /// Opaque context for all callbacks.
    pub user_ptr: *mut c_void,
}

/// Application subscription slots per network cache subject.
const NW_APP_SLOTS: usize = 4;

struct RouteCtx<'s> {
    base: &'s mut Base,
    epm: &'s mut Epm,
    rtm: &'s mut Rtm,
    tables: RouteTables<'s>,
}

/// One library instance.
pub struct Ehc<'a, T: Transceiver> {
    base: Base,
    inic: Inic,
    net: NetworkManagement,
    epm: Epm,
    rtm: Rtm,
    trcv: T,
    cb: InitData,
    init: InitSm,
    routes: Option<&'a mut [RouteEntry]>,
    endpoints: Option<&'a mut [EndpointEntry]>,
    nodes: Option<&'a mut [NodeEntry]>,
    cmd_cbs: [Option<CmdResultFn>; INIC_NUM_SSUB],
    sub_cbs: [Option<SubEventFn>; INIC_NUM_SUB],
    nw_status_cbs: [Option<NwStatusFn>; NW_APP_SLOTS],
    nw_config_cbs: [Option<NwConfigFn>; NW_APP_SLOTS],
}

impl<'a, T: Transceiver> Ehc<'a, T> {
    /// Builds the instance and registers the internal event observers.
    /// Nothing talks to the device until [`Ehc::init`] is called.
    pub fn new(trcv: T, target_address: u16, cb: InitData) -> Self {
        let mut base = Base::new(cb.wake_hint.is_some());
        let rtm = Rtm::new(&mut base);
        let eh = &mut base.eh;
        let _ = eh.add_obsrv_internal_event(EhObsTag::Alm, EhEvent::TERMINATION_EVENTS);
        let _ = eh.add_obsrv_internal_event(EhObsTag::Inic, EhEvent::TERMINATION_EVENTS);
        let _ = eh.add_obsrv_internal_event(EhObsTag::Rtm, EhEvent::TERMINATION_EVENTS);
        let _ = eh.add_obsrv_internal_event(EhObsTag::RtmInit, EhEvent::INIT_SUCCEEDED);
        if cb.error.is_some() {
            eh.add_obsrv_public_error();
        }
        Ehc {
            base,
            inic: Inic::new(target_address),
            net: NetworkManagement::new(),
            epm: Epm::new(),
            rtm,
            trcv,
            cb,
            init: InitSm::new(),
            routes: None,
            endpoints: None,
            nodes: None,
            cmd_cbs: [None; INIC_NUM_SSUB],
            sub_cbs: [None; INIC_NUM_SUB],
            nw_status_cbs: [None; NW_APP_SLOTS],
            nw_config_cbs: [None; NW_APP_SLOTS],
        }
    }

    fn now(&self) -> u16 {
        (self.cb.tick_clock)(self.cb.user_ptr)
    }

    fn guard_initialized(&self) -> Result<(), ErrorCode> {
        if self.init.is_done() {
            Ok(())
        } else {
            Err(ErrorCode::NotInitialized)
        }
    }

    // -----------------------------------------------------------------------
    // Life cycle
    // -----------------------------------------------------------------------

    /// Starts the initialization sequence. The outcome arrives
    /// asynchronously through the init-result callback, exactly once.
    pub fn init(&mut self) -> Result<(), ErrorCode> {
        if self.init.step != InitStep::Idle {
            return Err(ErrorCode::AlreadySet);
        }
        let now = self.now();
        self.base
            .tm
            .set_timer(&mut self.base.scd, now, TimerUser::InitWatchdog, INIT_TIMEOUT, 0);
        self.init.step = InitStep::VersionGet;
        if self
            .inic
            .device_version_get(&mut self.base, &mut self.trcv, now, Sink::InitSm)
            .is_err()
        {
            self.init_failed(InitResult::ErrBufOverflow);
        }
        Ok(())
    }

    /// Runs one scheduler pass. Services execute in ascending priority
    /// order; afterwards the host gets the wake hint and, when events are
    /// still pending, the request-service callback.
    pub fn service(&mut self) {
        let now = self.now();
        self.base.scd.begin();
        while let Some(kind) = self.base.scd.next_pending() {
            match kind {
                SrvKind::Timers => self.tm_service(now),
                SrvKind::Routing => self.rtm_service(),
            }
        }
        self.base.scd.end();
        {
            let Base { tm, scd, .. } = &mut self.base;
            if let Some(hint) = tm.check_for_next_service(scd, now) {
                if let Some(wake) = self.cb.wake_hint {
                    wake(self.cb.user_ptr, hint);
                }
            }
        }
        if self.base.scd.take_request() || self.base.scd.are_events_pending() {
            if let Some(req) = self.cb.request_service {
                req(self.cb.user_ptr);
            }
        }
    }

    /// Host notification that its external wake-up timer expired.
    pub fn report_tick(&mut self) {
        self.base.tm.trigger_service(&mut self.base.scd);
    }

    // -----------------------------------------------------------------------
    // Wire entry points
    // -----------------------------------------------------------------------

    /// Inbound telegram from the transceiver. The caller keeps ownership
    /// of the frame.
    pub fn on_rx(&mut self, tel: &Telegram) {
        if tel.source_addr != MSG_ADDR_INIC || tel.destination_addr != MSG_ADDR_EHC_CFG {
            return;
        }
        let mut out = Notices::new();
        dec::decode(&mut self.inic, &mut self.base, tel, &mut out);
        self.drain(&out);
    }

    /// Transmission status of a previously sent frame. Must be called
    /// exactly once per send; the frame returns to the pool here.
    pub fn tx_status(&mut self, tel: Telegram, status: TxStatus) {
        let mut out = Notices::new();
        self.inic.msg_tx_status(&mut self.base, &tel, status, &mut out);
        self.trcv.release(tel);
        self.drain(&out);
    }

    /// Result of a resource-manager job for the given endpoint. A source
    /// build carries the allocated connection label.
    pub fn xrm_report(&mut self, ep: u8, result: XrmResult, connection_label: Option<u16>) {
        let mut reports = RouteReports::new();
        let now = self.now();
        if let Some(mut ctx) = self.route_ctx() {
            let mut fanout = ringcore_route::DetFanout::new();
            ctx.epm
                .xrm_report(&mut ctx.tables, ep, result, connection_label, &mut fanout);
            for (route, ep) in fanout.iter() {
                ctx.rtm.endpoint_deteriorated(
                    ctx.base,
                    ctx.epm,
                    &mut ctx.tables,
                    now,
                    route,
                    ep,
                    &mut reports,
                );
            }
        }
        self.after_route_ops(&reports);
    }

    // -----------------------------------------------------------------------
    // Routing API
    // -----------------------------------------------------------------------

    /// One-shot installation of the route, endpoint and node tables.
    pub fn route_start_process(
        &mut self,
        routes: &'a mut [RouteEntry],
        endpoints: &'a mut [EndpointEntry],
        nodes: &'a mut [NodeEntry],
    ) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        if self.routes.is_some() {
            return Err(ErrorCode::ApiLocked);
        }
        self.routes = Some(routes);
        self.endpoints = Some(endpoints);
        self.nodes = Some(nodes);
        let now = self.now();
        let result = match self.route_ctx() {
            Some(mut ctx) => ctx.rtm.start_process(ctx.base, &mut ctx.tables, now),
            None => Err(ErrorCode::Param),
        };
        if result.is_err() {
            self.routes = None;
            self.endpoints = None;
            self.nodes = None;
        }
        result
    }

    pub fn route_activate(&mut self, route: u16) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        match self.route_ctx() {
            Some(mut ctx) => ctx.rtm.activate_route(ctx.base, &mut ctx.tables, now, route),
            None => Err(ErrorCode::Param),
        }
    }

    pub fn route_deactivate(&mut self, route: u16) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        match self.route_ctx() {
            Some(mut ctx) => ctx.rtm.deactivate_route(ctx.base, &mut ctx.tables, now, route),
            None => Err(ErrorCode::Param),
        }
    }

    /// Flips a node's availability; unavailable nodes release their
    /// resources and force affected routes to rebuild later.
    pub fn set_node_available(&mut self, node: u8, available: bool) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        let mut reports = RouteReports::new();
        let result = match self.route_ctx() {
            Some(mut ctx) => ctx.rtm.set_node_available(
                ctx.base,
                ctx.epm,
                &mut ctx.tables,
                now,
                node,
                available,
                &mut reports,
            ),
            None => Err(ErrorCode::Param),
        };
        self.after_route_ops(&reports);
        result
    }

    /// Fills `out` with the routes currently attached to the endpoint.
    pub fn get_attached_routes(
        &mut self,
        ep: u8,
        out: &mut [Option<u16>],
    ) -> Result<usize, ErrorCode> {
        match self.route_ctx() {
            Some(ctx) => Ok(ctx.epm.attached_routes(&ctx.tables, ep, out)),
            None => Err(ErrorCode::Param),
        }
    }

    /// Connection label of a built route; zero otherwise.
    pub fn get_connection_label(&mut self, route: u16) -> u16 {
        match self.route_ctx() {
            Some(ctx) => ctx.rtm.connection_label(ctx.epm, &ctx.tables, route),
            None => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Network command API
    // -----------------------------------------------------------------------

    pub fn network_startup(
        &mut self,
        auto_forced_na: u16,
        packet_bw: u16,
        cb: Option<CmdResultFn>,
    ) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_STARTUP as usize] = cb;
        self.inic.nw_startup(
            &mut self.base,
            &mut self.trcv,
            now,
            auto_forced_na,
            packet_bw,
            Sink::App(SSUB_NW_STARTUP),
        )
    }

    pub fn network_shutdown(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_SHUTDOWN as usize] = cb;
        self.inic
            .nw_shutdown(&mut self.base, &mut self.trcv, now, Sink::App(SSUB_NW_SHUTDOWN))
    }

    pub fn network_force_not_available(
        &mut self,
        force: bool,
        cb: Option<CmdResultFn>,
    ) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_FORCE_NA as usize] = cb;
        self.inic.nw_force_not_available(
            &mut self.base,
            &mut self.trcv,
            now,
            force,
            Sink::App(SSUB_NW_FORCE_NA),
        )
    }

    pub fn network_trigger_rbd(
        &mut self,
        rbd_type: u8,
        cb: Option<CmdResultFn>,
    ) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_TRIGGER_RBD as usize] = cb;
        self.inic.nw_trigger_rbd(
            &mut self.base,
            &mut self.trcv,
            now,
            rbd_type,
            Sink::App(SSUB_NW_TRIGGER_RBD),
        )
    }

    pub fn network_rbd_result(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_RBD_RESULT as usize] = cb;
        self.inic.nw_rbd_result_get(
            &mut self.base,
            &mut self.trcv,
            now,
            Sink::App(SSUB_NW_RBD_RESULT),
        )
    }

    pub fn network_frame_counter(
        &mut self,
        reference: u32,
        cb: Option<CmdResultFn>,
    ) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_FRAME_COUNTER as usize] = cb;
        self.inic.nw_frame_counter_get(
            &mut self.base,
            &mut self.trcv,
            now,
            reference,
            Sink::App(SSUB_NW_FRAME_COUNTER),
        )
    }

    pub fn network_config_get(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_CONFIG as usize] = cb;
        self.inic
            .nw_config_get(&mut self.base, &mut self.trcv, now, Sink::App(SSUB_NW_CONFIG))
    }

    pub fn system_diagnosis(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_SYS_DIAGNOSIS as usize] = cb;
        self.inic.nw_sys_diagnosis(
            &mut self.base,
            &mut self.trcv,
            now,
            Sink::App(SSUB_NW_SYS_DIAGNOSIS),
        )
    }

    pub fn system_diagnosis_end(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_NW_SYS_DIAG_END as usize] = cb;
        self.inic.nw_sys_diag_end(
            &mut self.base,
            &mut self.trcv,
            now,
            Sink::App(SSUB_NW_SYS_DIAG_END),
        )
    }

    pub fn bc_diagnosis(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_BC_DIAGNOSIS as usize] = cb;
        self.inic
            .bc_diagnosis(&mut self.base, &mut self.trcv, now, Sink::App(SSUB_BC_DIAGNOSIS))
    }

    pub fn bc_diagnosis_end(&mut self, cb: Option<CmdResultFn>) -> Result<(), ErrorCode> {
        self.guard_initialized()?;
        let now = self.now();
        self.cmd_cbs[SSUB_BC_DIAG_END as usize] = cb;
        self.inic
            .bc_diag_end(&mut self.base, &mut self.trcv, now, Sink::App(SSUB_BC_DIAG_END))
    }

    // -----------------------------------------------------------------------
    // Subscriptions and getters
    // -----------------------------------------------------------------------

    /// Subscribes to network status changes matching `mask`. The current
    /// cached block, when valid, is delivered immediately with a full
    /// change mask.
    pub fn subscribe_network_status(
        &mut self,
        mask: NwChange,
        cb: NwStatusFn,
    ) -> Result<(), ErrorCode> {
        let slot = self
            .nw_status_cbs
            .iter()
            .position(|s| s.is_none())
            .ok_or(ErrorCode::BufferOverflow)?;
        self.nw_status_cbs[slot] = Some(cb);
        match self
            .net
            .add_observer_network_status(NetObsTag::App(slot as u8), mask)
        {
            Ok(snapshot) => {
                if let Some(param) = snapshot {
                    cb(self.cb.user_ptr, &param);
                }
                Ok(())
            }
            Err(_) => {
                self.nw_status_cbs[slot] = None;
                Err(ErrorCode::AlreadySet)
            }
        }
    }

    /// Subscribes to network configuration changes matching `mask`.
    pub fn subscribe_network_config(
        &mut self,
        mask: NwConfigChange,
        cb: NwConfigFn,
    ) -> Result<(), ErrorCode> {
        let slot = self
            .nw_config_cbs
            .iter()
            .position(|s| s.is_none())
            .ok_or(ErrorCode::BufferOverflow)?;
        self.nw_config_cbs[slot] = Some(cb);
        match self
            .net
            .add_observer_network_config(NetObsTag::App(slot as u8), mask)
        {
            Ok(snapshot) => {
                if let Some(param) = snapshot {
                    cb(self.cb.user_ptr, &param);
                }
                Ok(())
            }
            Err(_) => {
                self.nw_config_cbs[slot] = None;
                Err(ErrorCode::AlreadySet)
            }
        }
    }

    /// Subscribes to one of the INIC fan-out subjects (device status,
    /// port status, resource monitor, GPIO trigger, buffer availability).
    pub fn subscribe_sub_events(&mut self, sub: u8, cb: SubEventFn) -> Result<(), ErrorCode> {
        if (sub as usize) >= INIC_NUM_SUB {
            return Err(ErrorCode::Param);
        }
        self.inic.subs[sub as usize]
            .add(InicSubTag::App(0))
            .map_err(|_| ErrorCode::AlreadySet)?;
        self.sub_cbs[sub as usize] = Some(cb);
        Ok(())
    }

    pub fn network_status(&self) -> NetworkStatusParam {
        self.net.network_status()
    }

    pub fn network_config(&self) -> NetworkConfigParam {
        self.net.network_config()
    }

    pub fn is_own_address(&self, address: u16) -> IsOwnAddr {
        self.net.is_own_address(address)
    }

    pub fn device_version(&self) -> DeviceVersion {
        self.inic.device_version()
    }

    pub fn node_address(&self) -> u16 {
        self.inic.node_address()
    }

    /// Direct access to the command layer for resource-level operations
    /// driven by the external resource manager.
    pub fn command_layer(&mut self) -> (&mut Inic, &mut Base, &mut T) {
        (&mut self.inic, &mut self.base, &mut self.trcv)
    }

    // -----------------------------------------------------------------------
    // Internal dispatch
    // -----------------------------------------------------------------------

    fn route_ctx(&mut self) -> Option<RouteCtx<'_>> {
        let routes = self.routes.as_deref_mut()?;
        let endpoints = self.endpoints.as_deref_mut()?;
        let nodes = self.nodes.as_deref_mut()?;
        Some(RouteCtx {
            base: &mut self.base,
            epm: &mut self.epm,
            rtm: &mut self.rtm,
            tables: RouteTables {
                routes,
                endpoints,
                nodes,
            },
        })
    }

    /// Delivers route reports and forwards freshly queued resource jobs.
    fn after_route_ops(&mut self, reports: &RouteReports) {
        let cb = self.cb;
        for (route, infos) in reports.iter() {
            if let Some(report) = cb.route_report {
                report(cb.user_ptr, route, infos);
            }
        }
        while let Some((ep, job)) = self.epm.take_pending_job() {
            if let Some(submit) = cb.xrm_job {
                submit(cb.user_ptr, ep, job);
            }
        }
    }

    fn tm_service(&mut self, now: u16) {
        self.base
            .scd
            .clear_event(SrvKind::Timers, TM_EVENT_UPDATE_TIMERS);
        self.base.tm.service_begin(now);
        while let Some(user) = self.base.tm.service_next() {
            self.dispatch_timer(user, now);
            if !self.base.tm.service_fired(user) {
                break;
            }
        }
    }

    fn dispatch_timer(&mut self, user: TimerUser, now: u16) {
        match user {
            TimerUser::AlmGc => {
                let mut out = [None; ALM_MAX_TIMEOUTS];
                let n = self.base.alm.gc_tick(&mut out);
                for timeout in out[..n].iter().flatten() {
                    let mut notices = Notices::new();
                    self.inic.handle_api_timeout(
                        &mut self.base,
                        now,
                        timeout.client,
                        timeout.method,
                        &mut notices,
                    );
                    self.drain(&notices);
                }
                let Base { alm, tm, scd, .. } = &mut self.base;
                alm.sync_gc_timer(tm, scd);
            }
            TimerUser::RouteCheck => {
                let mut reports = RouteReports::new();
                if let Some(mut ctx) = self.route_ctx() {
                    ctx.rtm
                        .on_route_tick(ctx.base, ctx.epm, &mut ctx.tables, &mut reports);
                }
                self.after_route_ops(&reports);
            }
            TimerUser::InitWatchdog => {
                if !self.init.is_done() {
                    rlog_info!("EHC: init watchdog expired");
                    self.init_failed(InitResult::ErrTimeout);
                }
            }
        }
    }

    fn rtm_service(&mut self) {
        let mut reports = RouteReports::new();
        match self.route_ctx() {
            Some(mut ctx) => {
                ctx.rtm
                    .service(ctx.base, ctx.epm, &mut ctx.tables, &mut reports);
            }
            None => {
                self.base.scd.clear_event(SrvKind::Routing, u32::MAX);
            }
        }
        self.after_route_ops(&reports);
    }

    fn drain(&mut self, notices: &Notices<'_>) {
        for notice in notices.iter() {
            match notice {
                Notice::Std {
                    ssub,
                    sink,
                    result,
                    data,
                } => match sink {
                    Sink::InitSm => self.init_sm_response(*ssub, result),
                    Sink::App(slot) => {
                        if let Some(cb) = self.cmd_cbs.get(*slot as usize).copied().flatten() {
                            cb(self.cb.user_ptr, result, data);
                        }
                    }
                },
                Notice::Sub { sub, data } => self.fan_out_sub(*sub, data),
                Notice::Event(event) => self.report_event(*event),
            }
        }
    }

    fn fan_out_sub(&mut self, sub: u8, data: &SubData<'_>) {
        match (sub, data) {
            (SUB_NW_STATUS, SubData::NwStatus(fresh)) => {
                let change = self.net.on_status_update(fresh);
                if change.is_empty() {
                    return;
                }
                let param = self.net.network_status();
                self.net.begin_status_notify();
                let mut cursor = 0;
                loop {
                    let Some(tag) = self.net.next_status_observer(&mut cursor, change) else {
                        break;
                    };
                    match tag {
                        NetObsTag::Rtm => self.rtm_network_status(change, &param),
                        NetObsTag::App(slot) => {
                            if let Some(cb) =
                                self.nw_status_cbs.get(slot as usize).copied().flatten()
                            {
                                cb(self.cb.user_ptr, &param);
                            }
                        }
                    }
                }
                self.net.end_status_notify();
            }
            (SUB_NW_CONFIG, SubData::NwConfig(fresh)) => {
                let change = self.net.on_config_update(fresh);
                if change.is_empty() {
                    return;
                }
                let param = self.net.network_config();
                self.net.begin_config_notify();
                let mut cursor = 0;
                loop {
                    let Some(tag) = self.net.next_config_observer(&mut cursor, change) else {
                        break;
                    };
                    if let NetObsTag::App(slot) = tag {
                        if let Some(cb) = self.nw_config_cbs.get(slot as usize).copied().flatten()
                        {
                            cb(self.cb.user_ptr, &param);
                        }
                    }
                }
                self.net.end_config_notify();
            }
            (sub, data) => {
                // Remaining subjects fan out to the application slot.
                let subject = &mut self.inic.subs[sub as usize];
                subject.begin_notify();
                let mut cursor = 0;
                let mut hit = false;
                while let Some(tag) = subject.next(&mut cursor) {
                    if matches!(tag, InicSubTag::App(_)) {
                        hit = true;
                    }
                }
                subject.end_notify();
                if hit {
                    if let Some(cb) = self.sub_cbs[sub as usize] {
                        cb(self.cb.user_ptr, data);
                    }
                }
            }
        }
    }

    fn rtm_network_status(&mut self, change: NwChange, param: &NetworkStatusParam) {
        if !change.contains(RTM_NW_AVAILABILITY_MASK) {
            return;
        }
        let now = self.now();
        let mut reports = RouteReports::new();
        if let Some(mut ctx) = self.route_ctx() {
            ctx.rtm.on_network_status(
                ctx.base,
                ctx.epm,
                &mut ctx.tables,
                now,
                change,
                param.availability,
                &mut reports,
            );
        }
        self.after_route_ops(&reports);
    }

    /// Internal event fan-out: notify every masked observer, then the
    /// public error sink where the event encodes one.
    pub fn report_event(&mut self, event: EhEvent) {
        self.base.eh.begin_notify();
        let mut cursor = 0;
        loop {
            let Some(tag) = self.base.eh.next_observer(&mut cursor, event) else {
                break;
            };
            self.dispatch_internal_event(tag, event);
        }
        self.base.eh.end_notify();
        if let Some(err) = self.base.eh.public_error_due(event) {
            if let Some(cb) = self.cb.error {
                cb(self.cb.user_ptr, err);
            }
        }
    }

    fn dispatch_internal_event(&mut self, tag: EhObsTag, event: EhEvent) {
        match tag {
            EhObsTag::Alm => {
                let Base { alm, tm, scd, .. } = &mut self.base;
                alm.reset(tm, scd);
            }
            EhObsTag::Inic => {
                let mut out = Notices::new();
                self.inic.handle_internal_errors(&mut out);
                self.drain(&out);
            }
            EhObsTag::Rtm => {
                let mut reports = RouteReports::new();
                if let Some(mut ctx) = self.route_ctx() {
                    ctx.rtm
                        .on_termination(ctx.base, ctx.epm, &mut ctx.tables, &mut reports);
                }
                let _ = self.net.del_observer_network_status(NetObsTag::Rtm);
                self.after_route_ops(&reports);
            }
            EhObsTag::RtmInit => {
                if event == EhEvent::INIT_SUCCEEDED {
                    // The init observer retires and hands over to the
                    // network status observer.
                    let _ = self.base.eh.del_obsrv_internal_event(EhObsTag::RtmInit);
                    if let Ok(Some(param)) = self
                        .net
                        .add_observer_network_status(NetObsTag::Rtm, RTM_NW_AVAILABILITY_MASK)
                    {
                        self.rtm_network_status(NwChange::all(), &param);
                    }
                }
            }
            EhObsTag::Net | EhObsTag::InitSm => {}
        }
    }

    // -----------------------------------------------------------------------
    // Init sequence
    // -----------------------------------------------------------------------

    fn init_sm_response(&mut self, ssub: u8, result: &StdResult<'_>) {
        let now = self.now();
        match (self.init.step, ssub) {
            (InitStep::VersionGet, SSUB_DEVICE_VERSION) => {
                if !result.is_ok() {
                    let failure = InitSm::failure_of(InitStep::VersionGet, result);
                    self.init_failed(failure);
                    return;
                }
                self.init.step = InitStep::Attach;
                if self
                    .inic
                    .device_attach(&mut self.base, &mut self.trcv, now, Sink::InitSm)
                    .is_err()
                {
                    self.init_failed(InitResult::ErrBufOverflow);
                }
            }
            (InitStep::Attach, SSUB_DEVICE_ATTACH) => {
                if !result.is_ok() {
                    let failure = InitSm::failure_of(InitStep::Attach, result);
                    self.init_failed(failure);
                    return;
                }
                self.init.step = InitStep::NetConfig;
                if self
                    .inic
                    .nw_config_get(&mut self.base, &mut self.trcv, now, Sink::InitSm)
                    .is_err()
                {
                    self.init_failed(InitResult::ErrBufOverflow);
                }
            }
            (InitStep::NetConfig, SSUB_NW_CONFIG) => {
                if !result.is_ok() {
                    let failure = InitSm::failure_of(InitStep::NetConfig, result);
                    self.init_failed(failure);
                    return;
                }
                self.init.step = InitStep::Done;
                self.base
                    .tm
                    .clear_timer(&mut self.base.scd, TimerUser::InitWatchdog);
                rlog_info!("EHC: initialization succeeded");
                self.report_event(EhEvent::INIT_SUCCEEDED);
                if self.init.take_report() {
                    if let Some(cb) = self.cb.init_result {
                        cb(self.cb.user_ptr, InitResult::Success);
                    }
                }
            }
            _ => {}
        }
    }

    fn init_failed(&mut self, failure: InitResult) {
        self.init.step = InitStep::Failed;
        self.base
            .tm
            .clear_timer(&mut self.base.scd, TimerUser::InitWatchdog);
        self.report_event(EhEvent::INIT_FAILED);
        if self.init.take_report() {
            if let Some(cb) = self.cb.init_result {
                cb(self.cb.user_ptr, failure);
            }
        }
    }
}
