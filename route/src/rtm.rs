//! Route management.
//!
//! Runs as a scheduler service with a 50 ms periodic timer while work
//! remains. Each tick advances one route's state machine: idle routes are
//! built when their nodes are reachable, deteriorated routes are
//! classified and either retried or suspended, deactivated routes are torn
//! down sink first. A full rotation without an eligible route pauses the
//! timer until an external trigger (activation, node availability or
//! network status) restarts it.

use ringcore_abi::msg::ADDR_LOCAL_DEV;
use ringcore_abi::{
    EndpointState, ErrorCode, NwAvailability, NwChange, ResultCode, RouteInfos, RouteResult,
    RouteState, SrvKind, TimerUser, TxStatus, XrmDetails, XrmResultCode,
};
use ringcore_base::Base;
use ringcore_lib::{rlog_error, rlog_info};

use crate::epm::{DetFanout, Epm, RouteTables};

/// Priority of the route management service.
pub const RTM_SRV_PRIO: u8 = 250;
/// Event for handling the next route in the list.
pub const RTM_EVENT_HANDLE_NEXTROUTE: u32 = 0x01;
/// Event for pausing the processing of routes.
pub const RTM_EVENT_PROCESS_PAUSE: u32 = 0x02;

/// Interval of the route processing tick in milliseconds.
pub const RTM_JOB_CHECK_INTERVAL: u16 = 50;

/// Retry budget before a transient failure is escalated to critical.
pub const RTM_MAX_RETRIES: u8 = 0xFF;

/// Upper bound of the caller-provided route table.
pub const RTM_MAX_ROUTES: usize = 32;

/// Network-status interest of the route manager: availability changes.
pub const RTM_NW_AVAILABILITY_MASK: NwChange = NwChange::AVAILABILITY;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RouteInt {
    pub(crate) route_state: RouteState,
    pub(crate) last_result: RouteResult,
    pub(crate) src_obsvr_initialized: bool,
    pub(crate) sink_obsvr_initialized: bool,
    pub(crate) notify_termination: bool,
}

/// Caller-provided route table entry: a source/sink endpoint pair plus the
/// activation flag.
#[derive(Clone, Copy, Debug)]
pub struct RouteEntry {
    /// Index of the source endpoint in the endpoint table.
    pub source_ep: u8,
    /// Index of the sink endpoint in the endpoint table.
    pub sink_ep: u8,
    /// Caller-chosen identifier used in reports and logs.
    pub route_id: u16,
    pub(crate) active: bool,
    pub(crate) internal: RouteInt,
}

impl RouteEntry {
    pub fn new(source_ep: u8, sink_ep: u8, route_id: u16, active: bool) -> Self {
        RouteEntry {
            source_ep,
            sink_ep,
            route_id,
            active,
            internal: RouteInt::default(),
        }
    }

    pub fn state(&self) -> RouteState {
        self.internal.route_state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_result(&self) -> RouteResult {
        self.internal.last_result
    }
}

/// Collector of route reports raised by one route-manager entry point.
pub struct RouteReports {
    buf: [Option<(u16, RouteInfos)>; RTM_MAX_ROUTES],
    n: usize,
}

impl RouteReports {
    pub const fn new() -> Self {
        RouteReports {
            buf: [None; RTM_MAX_ROUTES],
            n: 0,
        }
    }

    fn push(&mut self, route: u16, infos: RouteInfos) {
        if self.n < self.buf.len() {
            self.buf[self.n] = Some((route, infos));
            self.n += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, RouteInfos)> + '_ {
        self.buf[..self.n].iter().flatten().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

impl Default for RouteReports {
    fn default() -> Self {
        RouteReports::new()
    }
}

/// Route management state. The route table itself is caller-provided and
/// handed in with every call.
pub struct Rtm {
    routes_size: u16,
    curr_route_index: u16,
    started: bool,
    lock_api: bool,
    nw_available: bool,
    stopping: bool,
}

impl Rtm {
    /// Registers the route management service with the scheduler.
    pub fn new(base: &mut Base) -> Self {
        let _ = base.scd.add_service(SrvKind::Routing, RTM_SRV_PRIO);
        Rtm {
            routes_size: 0,
            curr_route_index: 0,
            started: false,
            lock_api: false,
            nw_available: false,
            stopping: false,
        }
    }

    // -----------------------------------------------------------------------
    // Application-facing operations
    // -----------------------------------------------------------------------

    /// One-shot installation of the route table; resets every entry's
    /// bookkeeping and starts the processing timer.
    pub fn start_process(
        &mut self,
        base: &mut Base,
        tables: &mut RouteTables<'_>,
        now: u16,
    ) -> Result<(), ErrorCode> {
        if self.lock_api {
            return Err(ErrorCode::ApiLocked);
        }
        if tables.routes.is_empty() || tables.routes.len() > RTM_MAX_ROUTES {
            return Err(ErrorCode::Param);
        }
        self.lock_api = true;
        self.started = true;
        self.routes_size = tables.routes.len() as u16;
        self.curr_route_index = 0;
        for route in tables.routes.iter_mut() {
            route.internal = RouteInt::default();
        }
        self.start_routing_timer(base, now);
        Ok(())
    }

    /// Builds respectively activates the given route.
    pub fn activate_route(
        &mut self,
        base: &mut Base,
        tables: &mut RouteTables<'_>,
        now: u16,
        route: u16,
    ) -> Result<(), ErrorCode> {
        let entry = tables
            .routes
            .get_mut(route as usize)
            .ok_or(ErrorCode::Param)?;
        if entry.internal.route_state != RouteState::Idle || entry.active {
            return Err(ErrorCode::AlreadySet);
        }
        entry.active = true;
        self.start_routing_timer(base, now);
        Ok(())
    }

    /// Deactivates respectively destroys the given route.
    pub fn deactivate_route(
        &mut self,
        base: &mut Base,
        tables: &mut RouteTables<'_>,
        now: u16,
        route: u16,
    ) -> Result<(), ErrorCode> {
        let entry = tables
            .routes
            .get_mut(route as usize)
            .ok_or(ErrorCode::Param)?;
        let destructible = entry.active
            && matches!(
                entry.internal.route_state,
                RouteState::Built | RouteState::Suspended
            );
        if !destructible {
            return Err(ErrorCode::AlreadySet);
        }
        entry.active = false;
        self.start_routing_timer(base, now);
        Ok(())
    }

    /// Sets the given node available or unavailable and triggers the
    /// routing process to handle the change.
    pub fn set_node_available(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        now: u16,
        node: u8,
        available: bool,
        reports: &mut RouteReports,
    ) -> Result<(), ErrorCode> {
        if (node as usize) >= tables.nodes.len() {
            return Err(ErrorCode::Param);
        }
        if !self.nw_available {
            return Err(ErrorCode::NotAvailable);
        }
        if tables.nodes[node as usize].available == available {
            return Err(ErrorCode::AlreadySet);
        }
        let node_address = tables.nodes[node as usize].signature.node_address;
        if available {
            rlog_info!("RTM: node 0x{:03X} is available", node_address);
            tables.nodes[node as usize].available = true;
            // Suspended routes with an endpoint on the returning node are
            // forced back to idle so the tick can rebuild them.
            self.release_suspended_routes(epm, tables, node);
            self.start_routing_timer(base, now);
        } else {
            rlog_info!("RTM: node 0x{:03X} is not available", node_address);
            tables.nodes[node as usize].available = false;
            self.release_suspended_routes(epm, tables, node);
            let mut fanout = DetFanout::new();
            epm.report_invalid_device(tables, node_address, &mut fanout);
            self.dispatch_deteriorated(base, epm, tables, now, &fanout, reports);
        }
        Ok(())
    }

    pub fn node_available(&self, tables: &RouteTables<'_>, node: u8) -> bool {
        tables
            .nodes
            .get(node as usize)
            .map(|n| n.available)
            .unwrap_or(false)
    }

    /// Connection label of a built route; zero otherwise.
    pub fn connection_label(&self, epm: &Epm, tables: &RouteTables<'_>, route: u16) -> u16 {
        match tables.routes.get(route as usize) {
            Some(entry) if entry.internal.route_state == RouteState::Built => {
                epm.connection_label(tables, entry.source_ep)
            }
            _ => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Service
    // -----------------------------------------------------------------------

    /// Scheduler service body.
    pub fn service(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        reports: &mut RouteReports,
    ) {
        let events = base.scd.get_event(SrvKind::Routing);
        if (events & RTM_EVENT_HANDLE_NEXTROUTE) != 0 {
            base.scd
                .clear_event(SrvKind::Routing, RTM_EVENT_HANDLE_NEXTROUTE);
            self.handle_next_route(epm, tables, reports);
        }
        if (events & RTM_EVENT_PROCESS_PAUSE) != 0 {
            base.scd
                .clear_event(SrvKind::Routing, RTM_EVENT_PROCESS_PAUSE);
            base.tm.clear_timer(&mut base.scd, TimerUser::RouteCheck);
        }
    }

    /// Periodic tick: pick the next eligible route or pause.
    pub fn on_route_tick(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        reports: &mut RouteReports,
    ) {
        if self.stopping {
            self.handle_process_termination(epm, tables, reports);
            return;
        }
        if self.set_next_route_index(tables) {
            base.scd
                .set_event(SrvKind::Routing, RTM_EVENT_HANDLE_NEXTROUTE);
        } else {
            base.scd.set_event(SrvKind::Routing, RTM_EVENT_PROCESS_PAUSE);
            rlog_info!("RTM: handling process of routes is paused");
        }
    }

    /// Network-status observer body; reacts to availability changes.
    pub fn on_network_status(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        now: u16,
        change: NwChange,
        availability: NwAvailability,
        reports: &mut RouteReports,
    ) {
        if !change.contains(RTM_NW_AVAILABILITY_MASK) {
            return;
        }
        if availability == NwAvailability::NotAvailable {
            self.nw_available = false;
            for node in tables.nodes.iter_mut() {
                node.available = false;
            }
            let mut fanout = DetFanout::new();
            epm.report_shutdown(tables, &mut fanout);
            self.dispatch_deteriorated(base, epm, tables, now, &fanout, reports);
        } else {
            self.nw_available = true;
            if self.started {
                self.start_routing_timer(base, now);
            }
        }
    }

    /// Endpoint-loss observer body: a built route whose endpoint vanished
    /// deteriorates immediately.
    pub fn endpoint_deteriorated(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        now: u16,
        route: u16,
        ep: u8,
        reports: &mut RouteReports,
    ) {
        let entry = match tables.routes.get(route as usize) {
            Some(entry) => *entry,
            None => return,
        };
        if entry.source_ep != ep && entry.sink_ep != ep {
            rlog_error!(
                "RTM: stray endpoint {} report on route id 0x{:X}",
                ep,
                entry.route_id
            );
            return;
        }
        if entry.internal.route_state != RouteState::Built {
            return;
        }
        rlog_info!("RTM: route id 0x{:X} is deteriorated", entry.route_id);
        if entry.source_ep == ep {
            tables.routes[route as usize].internal.src_obsvr_initialized = false;
        }
        self.handle_routing_error(epm, tables, route, reports);
        if self.nw_available && !self.stopping {
            self.start_routing_timer(base, now);
        } else if self.stopping {
            self.handle_process_termination(epm, tables, reports);
        }
    }

    /// Termination event: stop processing, report once per pending route.
    pub fn on_termination(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        reports: &mut RouteReports,
    ) {
        self.stopping = true;
        self.handle_process_termination(epm, tables, reports);
        let _ = base.scd.remove_service(SrvKind::Routing);
        self.lock_api = false;
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    fn handle_next_route(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        reports: &mut RouteReports,
    ) {
        if !self.started || self.routes_size == 0 {
            return;
        }
        let route = self.curr_route_index;
        let state = tables.routes[route as usize].internal.route_state;
        match state {
            RouteState::Idle => {
                if self.is_route_buildable(tables, route) {
                    self.build_route(epm, tables, route, reports);
                }
            }
            RouteState::Construction => {
                self.build_route(epm, tables, route, reports);
            }
            RouteState::Deteriorated => {
                self.handle_routing_error(epm, tables, route, reports);
            }
            RouteState::Destruction => {
                self.destroy_route(epm, tables, route, reports);
            }
            RouteState::Built | RouteState::Suspended => {
                if !tables.routes[route as usize].active {
                    self.destroy_route(epm, tables, route, reports);
                }
            }
        }
    }

    fn is_route_buildable(&self, tables: &RouteTables<'_>, route: u16) -> bool {
        let entry = &tables.routes[route as usize];
        entry.internal.route_state == RouteState::Idle && entry.active
    }

    /// Advances the construction of the current route: source first, then
    /// the sink with the source's connection label.
    fn build_route(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        reports: &mut RouteReports,
    ) {
        let entry = tables.routes[route as usize];
        let source = entry.source_ep;
        let sink = entry.sink_ep;
        let mut critical = false;
        match epm.state(tables, source) {
            EndpointState::Idle => {
                critical = self.check_ep_result_severity(epm, tables, route, source);
                if !critical {
                    if !tables.routes[route as usize].internal.src_obsvr_initialized {
                        tables.routes[route as usize].internal.src_obsvr_initialized = true;
                        epm.detach(tables, source, route);
                        epm.init_internal_infos(tables, source);
                    }
                    self.build_endpoint(epm, tables, route, source);
                }
            }
            EndpointState::Built => {
                // Shared source already built by another route.
                if !tables.routes[route as usize].internal.src_obsvr_initialized {
                    tables.routes[route as usize].internal.src_obsvr_initialized = true;
                    epm.attach(tables, source, route);
                }
                match epm.state(tables, sink) {
                    EndpointState::Idle => {
                        critical = self.check_ep_result_severity(epm, tables, route, sink);
                        if !critical {
                            if !tables.routes[route as usize].internal.sink_obsvr_initialized {
                                tables.routes[route as usize].internal.sink_obsvr_initialized =
                                    true;
                                epm.init_internal_infos(tables, sink);
                            }
                            let label = epm.connection_label(tables, source);
                            epm.set_connection_label(tables, sink, label);
                            self.build_endpoint(epm, tables, route, sink);
                        }
                    }
                    EndpointState::Built => {
                        rlog_info!("RTM: route id 0x{:X} is built", entry.route_id);
                        tables.routes[route as usize].internal.route_state = RouteState::Built;
                        reports.push(route, RouteInfos::Built);
                    }
                    EndpointState::XrmProcessing => {
                        critical = self.unlock_possible_blockings(epm, tables, route, sink);
                    }
                }
            }
            EndpointState::XrmProcessing => {
                critical = self.unlock_possible_blockings(epm, tables, route, source);
            }
        }
        if critical {
            tables.routes[route as usize].internal.route_state = RouteState::Deteriorated;
        }
    }

    fn build_endpoint(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        ep: u8,
    ) {
        match epm.set_build_process(tables, ep) {
            Ok(()) => {
                epm.attach(tables, ep, route);
                tables.routes[route as usize].internal.route_state = RouteState::Construction;
            }
            Err(ErrorCode::AlreadySet) => {
                // Already built; the next tick observes the built state.
            }
            Err(_) => {}
        }
    }

    /// Advances the destruction of the current route, sink before source.
    fn destroy_route(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        reports: &mut RouteReports,
    ) {
        let entry = tables.routes[route as usize];
        let source = entry.source_ep;
        let sink = entry.sink_ep;
        let mut critical = false;
        let mut completed = false;
        match epm.state(tables, sink) {
            EndpointState::Built => {
                let _ = self.deactivate_route_endpoint(epm, tables, route, sink);
            }
            EndpointState::Idle => match epm.state(tables, source) {
                EndpointState::Built => {
                    // A source still feeding other routes cannot be torn
                    // down; this route's teardown is nevertheless done.
                    if self.deactivate_route_endpoint(epm, tables, route, source)
                        == Err(ErrorCode::InvalidShadow)
                    {
                        completed = true;
                    }
                }
                EndpointState::Idle => {
                    completed = true;
                }
                EndpointState::XrmProcessing => {
                    critical = self.unlock_possible_blockings(epm, tables, route, source);
                }
            },
            EndpointState::XrmProcessing => {
                critical = self.unlock_possible_blockings(epm, tables, route, sink);
            }
        }
        if critical {
            tables.routes[route as usize].internal.route_state = RouteState::Deteriorated;
        } else if completed {
            rlog_info!("RTM: route id 0x{:X} has been destroyed", entry.route_id);
            epm.detach(tables, source, route);
            epm.detach(tables, sink, route);
            let internal = &mut tables.routes[route as usize].internal;
            internal.route_state = RouteState::Idle;
            internal.src_obsvr_initialized = false;
            internal.sink_obsvr_initialized = false;
            reports.push(route, RouteInfos::Destroyed);
        }
    }

    fn deactivate_route_endpoint(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        ep: u8,
    ) -> Result<(), ErrorCode> {
        let node = tables.endpoints[ep as usize].node as usize;
        let reachable = tables.nodes[node].available
            || tables.nodes[node].signature.node_address == ADDR_LOCAL_DEV;
        if !reachable {
            // The device is gone; its resources died with it.
            epm.reset_state(tables, ep);
            return Err(ErrorCode::NotAvailable);
        }
        let res = epm.set_destroy_process(tables, ep);
        if res.is_ok() {
            tables.routes[route as usize].internal.route_state = RouteState::Destruction;
        }
        res
    }

    /// Classifies the deteriorated route: a critical verdict suspends it
    /// and reports once, an uncritical one hands it back to idle for a
    /// silent retry on a later tick.
    fn handle_routing_error(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        reports: &mut RouteReports,
    ) {
        let entry = tables.routes[route as usize];
        let prior = entry.internal.last_result;
        {
            let internal = &mut tables.routes[route as usize].internal;
            internal.route_state = RouteState::Idle;
            internal.last_result = RouteResult::NoError;
        }
        if prior == RouteResult::Critical {
            epm.reset_state(tables, entry.source_ep);
            epm.reset_state(tables, entry.sink_ep);
        } else if epm.state(tables, entry.source_ep) == EndpointState::Idle
            && self.check_ep_result_severity(epm, tables, route, entry.source_ep)
        {
            epm.reset_state(tables, entry.source_ep);
        } else if epm.state(tables, entry.sink_ep) == EndpointState::Idle
            && self.check_ep_result_severity(epm, tables, route, entry.sink_ep)
        {
            epm.reset_state(tables, entry.sink_ep);
        } else {
            // Uncritical: no report, the route retries on a later tick.
            rlog_info!("RTM: route id 0x{:X} retries", entry.route_id);
            return;
        }
        tables.routes[route as usize].internal.route_state = RouteState::Suspended;
        rlog_info!("RTM: route id 0x{:X} is suspended", entry.route_id);
        reports.push(route, RouteInfos::Suspended);
    }

    /// Classifies an endpoint's last resource-manager result and stores
    /// the verdict on the route. Returns `true` for a critical failure.
    fn check_ep_result_severity(
        &mut self,
        _epm: &Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        ep: u8,
    ) -> bool {
        let xrm = tables.endpoints[ep as usize].internal.last_result;
        let num_retries = tables.endpoints[ep as usize].internal.num_retries;
        let route_id = tables.routes[route as usize].route_id;
        let mut result = RouteResult::NoError;
        match xrm.code {
            XrmResultCode::ErrBuild | XrmResultCode::ErrDestroy | XrmResultCode::ErrSync => {
                match xrm.details {
                    XrmDetails::Transmission(tx) => {
                        if matches!(tx, TxStatus::ConfigNoRcvr | TxStatus::FatalOa)
                            || num_retries == RTM_MAX_RETRIES
                        {
                            result = RouteResult::Critical;
                            rlog_error!(
                                "RTM: critical error on route id 0x{:X}, tx status {:?}",
                                route_id,
                                tx
                            );
                        } else if matches!(
                            tx,
                            TxStatus::Unknown
                                | TxStatus::FatalWt
                                | TxStatus::Timeout
                                | TxStatus::Bf
                                | TxStatus::Crc
                                | TxStatus::NaTrans
                                | TxStatus::Ack
                                | TxStatus::Id
                        ) {
                            tables.endpoints[ep as usize].internal.num_retries += 1;
                            result = RouteResult::Uncritical;
                        }
                    }
                    XrmDetails::Target(code) => {
                        if matches!(
                            code,
                            ResultCode::Configuration | ResultCode::MostStandard | ResultCode::System
                        ) || num_retries == RTM_MAX_RETRIES
                        {
                            result = RouteResult::Critical;
                            rlog_error!(
                                "RTM: critical error on route id 0x{:X}, device result {:?}",
                                route_id,
                                code
                            );
                        } else if matches!(
                            code,
                            ResultCode::Busy | ResultCode::Timeout | ResultCode::Processing
                        ) {
                            tables.endpoints[ep as usize].internal.num_retries += 1;
                            result = RouteResult::Uncritical;
                        }
                    }
                    XrmDetails::Internal(code) => {
                        if matches!(
                            code,
                            ErrorCode::NotAvailable
                                | ErrorCode::NotSupported
                                | ErrorCode::Param
                                | ErrorCode::NotInitialized
                        ) || num_retries == RTM_MAX_RETRIES
                        {
                            result = RouteResult::Critical;
                            rlog_error!(
                                "RTM: critical error on route id 0x{:X}, internal error {:?}",
                                route_id,
                                code
                            );
                        } else if matches!(
                            code,
                            ErrorCode::BufferOverflow
                                | ErrorCode::ApiLocked
                                | ErrorCode::InvalidShadow
                        ) {
                            tables.endpoints[ep as usize].internal.num_retries += 1;
                            result = RouteResult::Uncritical;
                        }
                    }
                    XrmDetails::None => {}
                }
            }
            XrmResultCode::ErrConfig => {
                result = RouteResult::Critical;
            }
            XrmResultCode::SuccessBuild | XrmResultCode::SuccessDestroy => {
                tables.endpoints[ep as usize].internal.num_retries = 0;
            }
            _ => {}
        }
        if result == RouteResult::Critical {
            tables.endpoints[ep as usize].internal.num_retries = 0;
        }
        tables.routes[route as usize].internal.last_result = result;
        result == RouteResult::Critical
    }

    /// Resolves the deadlock where a synchronous submission failed
    /// uncritically and no asynchronous result will ever arrive: the
    /// endpoint stuck in processing is forced back so the route can retry.
    fn unlock_possible_blockings(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        route: u16,
        ep: u8,
    ) -> bool {
        let critical = self.check_ep_result_severity(epm, tables, route, ep);
        if !critical && tables.routes[route as usize].internal.last_result == RouteResult::Uncritical
        {
            epm.reset_state(tables, ep);
        }
        critical
    }

    /// Round-robin scan from the cursor for a route that needs handling.
    fn set_next_route_index(&mut self, tables: &RouteTables<'_>) -> bool {
        if self.routes_size == 0 || !self.nw_available {
            return false;
        }
        self.curr_route_index = (self.curr_route_index + 1) % self.routes_size;
        let start = self.curr_route_index;
        loop {
            let entry = &tables.routes[self.curr_route_index as usize];
            let state = entry.internal.route_state;
            let skip = (state == RouteState::Suspended && entry.active)
                || (entry.active && state == RouteState::Built)
                || (!entry.active && state == RouteState::Idle)
                || (state == RouteState::Idle && !self.route_nodes_available(tables, entry));
            if !skip {
                return true;
            }
            self.curr_route_index = (self.curr_route_index + 1) % self.routes_size;
            if self.curr_route_index == start {
                return false;
            }
        }
    }

    fn route_nodes_available(&self, tables: &RouteTables<'_>, entry: &RouteEntry) -> bool {
        let node_ok = |ep: u8| {
            let node = &tables.nodes[tables.endpoints[ep as usize].node as usize];
            node.available || node.signature.node_address == ADDR_LOCAL_DEV
        };
        node_ok(entry.source_ep) && node_ok(entry.sink_ep)
    }

    fn start_routing_timer(&mut self, base: &mut Base, now: u16) {
        if self.started
            && !self.stopping
            && !base.tm.is_timer_in_use(TimerUser::RouteCheck)
        {
            base.tm.set_timer(
                &mut base.scd,
                now,
                TimerUser::RouteCheck,
                RTM_JOB_CHECK_INTERVAL,
                RTM_JOB_CHECK_INTERVAL,
            );
        }
    }

    /// Forces suspended or critically stuck routes touching the given node
    /// back to idle so they can rebuild when the node returns.
    fn release_suspended_routes(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        node: u8,
    ) {
        for route in 0..self.routes_size {
            let entry = tables.routes[route as usize];
            let sink_critical =
                self.check_ep_result_severity(epm, tables, route, entry.sink_ep);
            let state = entry.internal.route_state;
            let eligible = state == RouteState::Suspended
                || (state == RouteState::Deteriorated
                    && entry.internal.last_result == RouteResult::Critical)
                || (state == RouteState::Construction && sink_critical);
            if !eligible {
                continue;
            }
            let touches_node = tables.endpoints[entry.source_ep as usize].node == node
                || tables.endpoints[entry.sink_ep as usize].node == node;
            if touches_node {
                self.force_route_to_idle(epm, tables, route);
            }
        }
    }

    /// Last-resort reset of a route and its endpoints.
    fn force_route_to_idle(&mut self, epm: &mut Epm, tables: &mut RouteTables<'_>, route: u16) {
        let entry = tables.routes[route as usize];
        {
            let internal = &mut tables.routes[route as usize].internal;
            internal.route_state = RouteState::Idle;
            internal.last_result = RouteResult::NoError;
        }
        if self.check_ep_result_severity(epm, tables, route, entry.source_ep) {
            epm.reset_state(tables, entry.source_ep);
        }
        if self.check_ep_result_severity(epm, tables, route, entry.sink_ep) {
            epm.reset_state(tables, entry.sink_ep);
        }
        // The severity probes above are bookkeeping, not a verdict.
        tables.routes[route as usize].internal.last_result = RouteResult::NoError;
    }

    /// Tears transitional routes down to idle and reports the stop exactly
    /// once per route.
    fn handle_process_termination(
        &mut self,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        reports: &mut RouteReports,
    ) {
        for route in 0..self.routes_size {
            let entry = tables.routes[route as usize];
            epm.clear_int_infos(tables, entry.source_ep);
            epm.clear_int_infos(tables, entry.sink_ep);
            let state = entry.internal.route_state;
            if entry.active
                && !entry.internal.notify_termination
                && state != RouteState::Built
                && state != RouteState::Suspended
            {
                if state == RouteState::Construction || state == RouteState::Destruction {
                    tables.routes[route as usize].internal.route_state = RouteState::Idle;
                }
                tables.routes[route as usize].internal.notify_termination = true;
                reports.push(route, RouteInfos::ProcessStop);
            }
        }
    }

    fn dispatch_deteriorated(
        &mut self,
        base: &mut Base,
        epm: &mut Epm,
        tables: &mut RouteTables<'_>,
        now: u16,
        fanout: &DetFanout,
        reports: &mut RouteReports,
    ) {
        for (route, ep) in fanout.iter() {
            self.endpoint_deteriorated(base, epm, tables, now, route, ep, reports);
        }
    }
}
