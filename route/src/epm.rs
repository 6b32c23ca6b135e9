//! Endpoint management surface.
//!
//! An endpoint is the source or sink half of a streaming flow on one node.
//! This module owns the endpoint state machine, the reference counting
//! that lets one source feed many sinks, and the connection-label
//! propagation between a built source and its sinks. The concrete resource
//! build/destroy is not done here: state transitions enqueue jobs that the
//! host hands to the external resource manager, whose results come back
//! through [`Epm::xrm_report`].

use ringcore_abi::{
    EndpointState, EndpointType, ErrorCode, ResultCode, RouteState, TxStatus, XrmDetails,
    XrmResult, XrmResultCode,
};
use ringcore_lib::{Subject, rlog_debug, rlog_info};

use crate::node::NodeEntry;
use crate::rtm::RouteEntry;

/// Sentinel detecting caller-side reuse of uninitialised endpoint memory.
pub const EPM_MAGIC: u32 = 0x4550_4D21;

/// Routes that can share one endpoint.
pub const EPM_MAX_ROUTES_PER_EP: usize = 8;

/// Depth of the pending resource-manager job queue.
pub const EPM_MAX_JOBS: usize = 8;

/// Resource-manager job kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XrmJob {
    Build,
    Destroy,
}

#[derive(Debug)]
pub(crate) struct EndpointInt {
    pub(crate) state: EndpointState,
    pub(crate) connection_label: u16,
    pub(crate) reference_cnt: u8,
    pub(crate) num_retries: u8,
    pub(crate) last_result: XrmResult,
    /// Attached routes, by route table index.
    pub(crate) subject: Subject<u16, EPM_MAX_ROUTES_PER_EP>,
    pub(crate) magic: u32,
}

impl EndpointInt {
    const fn fresh() -> Self {
        EndpointInt {
            state: EndpointState::Idle,
            connection_label: 0,
            reference_cnt: 0,
            num_retries: 0,
            last_result: XrmResult {
                code: XrmResultCode::Unknown,
                details: XrmDetails::None,
            },
            subject: Subject::new(),
            magic: EPM_MAGIC,
        }
    }
}

impl Default for EndpointInt {
    fn default() -> Self {
        EndpointInt::fresh()
    }
}

/// Caller-provided endpoint table entry.
#[derive(Debug)]
pub struct EndpointEntry {
    pub ep_type: EndpointType,
    /// Index into the node table.
    pub node: u8,
    pub(crate) internal: EndpointInt,
}

impl EndpointEntry {
    pub fn new(ep_type: EndpointType, node: u8) -> Self {
        EndpointEntry {
            ep_type,
            node,
            internal: EndpointInt::fresh(),
        }
    }

    pub fn state(&self) -> EndpointState {
        self.internal.state
    }

    pub fn connection_label(&self) -> u16 {
        self.internal.connection_label
    }

    pub fn reference_count(&self) -> u8 {
        self.internal.reference_cnt
    }

    pub fn last_xrm_result(&self) -> XrmResult {
        self.internal.last_result
    }
}

/// The three caller-provided tables the routing layer works on. Entries
/// reference each other by index.
pub struct RouteTables<'t> {
    pub routes: &'t mut [RouteEntry],
    pub endpoints: &'t mut [EndpointEntry],
    pub nodes: &'t mut [NodeEntry],
}

/// Collector for endpoints whose loss has to reach their attached routes.
pub struct DetFanout {
    buf: [Option<(u16, u8)>; 32],
    n: usize,
}

impl DetFanout {
    pub const fn new() -> Self {
        DetFanout {
            buf: [None; 32],
            n: 0,
        }
    }

    fn push(&mut self, route: u16, ep: u8) {
        if self.n < self.buf.len() {
            self.buf[self.n] = Some((route, ep));
            self.n += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.buf[..self.n].iter().flatten().copied()
    }
}

impl Default for DetFanout {
    fn default() -> Self {
        DetFanout::new()
    }
}

/// Endpoint management: job queue plus operations over the endpoint table.
pub struct Epm {
    jobs: [Option<(u8, XrmJob)>; EPM_MAX_JOBS],
    jobs_n: usize,
}

impl Epm {
    pub const fn new() -> Self {
        Epm {
            jobs: [None; EPM_MAX_JOBS],
            jobs_n: 0,
        }
    }

    /// Next pending resource-manager job, in submission order.
    pub fn take_pending_job(&mut self) -> Option<(u8, XrmJob)> {
        if self.jobs_n == 0 {
            return None;
        }
        let job = self.jobs[0];
        for i in 1..self.jobs_n {
            self.jobs[i - 1] = self.jobs[i];
        }
        self.jobs_n -= 1;
        self.jobs[self.jobs_n] = None;
        job
    }

    fn enqueue_job(&mut self, ep: u8, job: XrmJob) {
        debug_assert!(self.jobs_n < EPM_MAX_JOBS);
        if self.jobs_n < EPM_MAX_JOBS {
            self.jobs[self.jobs_n] = Some((ep, job));
            self.jobs_n += 1;
        }
    }

    /// Prepares an endpoint the first time a route touches it. A wrong
    /// magic means the caller handed in uninitialised memory; the
    /// internals are reset to a defined blank state.
    pub fn init_internal_infos(&mut self, tables: &mut RouteTables<'_>, ep: u8) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        if internal.magic != EPM_MAGIC {
            *internal = EndpointInt::fresh();
        }
    }

    /// Attaches a route to an endpoint; counts one owner per route.
    pub fn attach(&mut self, tables: &mut RouteTables<'_>, ep: u8, route: u16) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        if internal.subject.add(route).is_ok() {
            internal.reference_cnt = internal.reference_cnt.saturating_add(1);
        }
    }

    /// Detaches a route from an endpoint, dropping its owner reference.
    pub fn detach(&mut self, tables: &mut RouteTables<'_>, ep: u8, route: u16) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        if internal.subject.remove(route).is_ok() {
            internal.reference_cnt = internal.reference_cnt.saturating_sub(1);
        }
    }

    pub fn state(&self, tables: &RouteTables<'_>, ep: u8) -> EndpointState {
        tables.endpoints[ep as usize].internal.state
    }

    pub fn connection_label(&self, tables: &RouteTables<'_>, ep: u8) -> u16 {
        tables.endpoints[ep as usize].internal.connection_label
    }

    /// Propagates the source's connection label to a sink before its build.
    pub fn set_connection_label(&mut self, tables: &mut RouteTables<'_>, ep: u8, label: u16) {
        tables.endpoints[ep as usize].internal.connection_label = label;
    }

    /// Starts the build job for an endpoint.
    pub fn set_build_process(
        &mut self,
        tables: &mut RouteTables<'_>,
        ep: u8,
    ) -> Result<(), ErrorCode> {
        let internal = &mut tables.endpoints[ep as usize].internal;
        match internal.state {
            EndpointState::Idle => {
                internal.state = EndpointState::XrmProcessing;
                self.enqueue_job(ep, XrmJob::Build);
                rlog_debug!("EPM: endpoint {} build submitted", ep);
                Ok(())
            }
            EndpointState::Built => Err(ErrorCode::AlreadySet),
            EndpointState::XrmProcessing => Err(ErrorCode::ApiLocked),
        }
    }

    /// Starts the destroy job for an endpoint. While other routes still
    /// own the endpoint only the caller's reference is dropped and
    /// `InvalidShadow` tells the route to treat its own teardown as done.
    pub fn set_destroy_process(
        &mut self,
        tables: &mut RouteTables<'_>,
        ep: u8,
    ) -> Result<(), ErrorCode> {
        let internal = &mut tables.endpoints[ep as usize].internal;
        match internal.state {
            EndpointState::Built => {
                if internal.reference_cnt > 1 {
                    return Err(ErrorCode::InvalidShadow);
                }
                internal.state = EndpointState::XrmProcessing;
                self.enqueue_job(ep, XrmJob::Destroy);
                rlog_debug!("EPM: endpoint {} destroy submitted", ep);
                Ok(())
            }
            EndpointState::Idle | EndpointState::XrmProcessing => Err(ErrorCode::AlreadySet),
        }
    }

    /// Forces an endpoint back to idle without a resource-manager round
    /// trip. Used to resolve deadlocks and to drop state of unreachable
    /// devices. The stored result is cleared so the next build attempt
    /// starts unclassified.
    pub fn reset_state(&mut self, tables: &mut RouteTables<'_>, ep: u8) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        internal.state = EndpointState::Idle;
        internal.last_result = XrmResult {
            code: XrmResultCode::Unknown,
            details: XrmDetails::None,
        };
    }

    /// Termination: drop all endpoint bookkeeping.
    pub fn clear_int_infos(&mut self, tables: &mut RouteTables<'_>, ep: u8) {
        tables.endpoints[ep as usize].internal = EndpointInt::fresh();
    }

    /// Result intake from the external resource manager. Spontaneous loss
    /// of a built endpoint is fanned out to the attached routes.
    pub fn xrm_report(
        &mut self,
        tables: &mut RouteTables<'_>,
        ep: u8,
        result: XrmResult,
        label: Option<u16>,
        fanout: &mut DetFanout,
    ) {
        let was_built = tables.endpoints[ep as usize].internal.state == EndpointState::Built;
        {
            let internal = &mut tables.endpoints[ep as usize].internal;
            internal.last_result = result;
            match result.code {
                XrmResultCode::SuccessBuild => {
                    internal.state = EndpointState::Built;
                    if let Some(label) = label {
                        internal.connection_label = label;
                    }
                }
                XrmResultCode::SuccessDestroy | XrmResultCode::AutoDestroyed => {
                    internal.state = EndpointState::Idle;
                    internal.connection_label = 0;
                }
                _ => {
                    internal.state = EndpointState::Idle;
                }
            }
        }
        if was_built && tables.endpoints[ep as usize].internal.state == EndpointState::Idle {
            self.notify_attached(tables, ep, fanout);
        }
    }

    /// A device dropped off the ring: invalidate every non-idle endpoint
    /// living on it and tell the attached routes.
    pub fn report_invalid_device(
        &mut self,
        tables: &mut RouteTables<'_>,
        node_address: u16,
        fanout: &mut DetFanout,
    ) {
        rlog_info!("EPM: invalidating endpoints of device 0x{:03X}", node_address);
        for ep in 0..tables.endpoints.len() {
            let node = tables.endpoints[ep].node as usize;
            if tables.nodes[node].signature.node_address != node_address {
                continue;
            }
            self.invalidate(
                tables,
                ep as u8,
                XrmResult {
                    code: XrmResultCode::ErrDestroy,
                    details: XrmDetails::Target(ResultCode::System),
                },
                fanout,
            );
        }
    }

    /// The ring went down: every endpoint's resources are gone. The
    /// transient error classification lets affected routes fall back to
    /// idle and rebuild once the ring returns.
    pub fn report_shutdown(&mut self, tables: &mut RouteTables<'_>, fanout: &mut DetFanout) {
        rlog_info!("EPM: network shutdown, releasing all endpoints");
        for ep in 0..tables.endpoints.len() {
            self.invalidate(
                tables,
                ep as u8,
                XrmResult {
                    code: XrmResultCode::ErrSync,
                    details: XrmDetails::Transmission(TxStatus::NaTrans),
                },
                fanout,
            );
        }
    }

    fn invalidate(
        &mut self,
        tables: &mut RouteTables<'_>,
        ep: u8,
        result: XrmResult,
        fanout: &mut DetFanout,
    ) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        if internal.state == EndpointState::Idle {
            return;
        }
        let was_built = internal.state == EndpointState::Built;
        internal.state = EndpointState::Idle;
        internal.connection_label = 0;
        internal.last_result = result;
        if was_built {
            self.notify_attached(tables, ep, fanout);
        }
    }

    fn notify_attached(&mut self, tables: &mut RouteTables<'_>, ep: u8, fanout: &mut DetFanout) {
        let internal = &mut tables.endpoints[ep as usize].internal;
        internal.subject.begin_notify();
        let mut cursor = 0;
        while let Some(route) = internal.subject.next(&mut cursor) {
            fanout.push(route, ep);
        }
        internal.subject.end_notify();
    }

    /// Fills `out` with the routes attached to the endpoint that are in a
    /// transitional or built state; the remainder is cleared.
    pub fn attached_routes(
        &self,
        tables: &RouteTables<'_>,
        ep: u8,
        out: &mut [Option<u16>],
    ) -> usize {
        let internal = &tables.endpoints[ep as usize].internal;
        let mut n = 0;
        let mut cursor = 0;
        while n < out.len() {
            let Some(route) = internal.subject.next(&mut cursor) else {
                break;
            };
            let state = tables.routes[route as usize].state();
            if matches!(
                state,
                RouteState::Built | RouteState::Construction | RouteState::Destruction
            ) {
                out[n] = Some(route);
                n += 1;
            }
        }
        for slot in out[n..].iter_mut() {
            *slot = None;
        }
        n
    }
}

impl Default for Epm {
    fn default() -> Self {
        Epm::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSignature;

    fn tables() -> (Vec<RouteEntry>, Vec<EndpointEntry>, Vec<NodeEntry>) {
        let routes = vec![RouteEntry::new(0, 1, 1, true), RouteEntry::new(0, 2, 2, true)];
        let endpoints = vec![
            EndpointEntry::new(EndpointType::Source, 0),
            EndpointEntry::new(EndpointType::Sink, 1),
            EndpointEntry::new(EndpointType::Sink, 1),
        ];
        let nodes = vec![
            NodeEntry::new(NodeSignature::with_address(0x101)),
            NodeEntry::new(NodeSignature::with_address(0x102)),
        ];
        (routes, endpoints, nodes)
    }

    #[test]
    fn build_job_lifecycle() {
        let (mut routes, mut endpoints, mut nodes) = tables();
        let mut t = RouteTables {
            routes: &mut routes,
            endpoints: &mut endpoints,
            nodes: &mut nodes,
        };
        let mut epm = Epm::new();
        epm.attach(&mut t, 0, 0);
        assert!(epm.set_build_process(&mut t, 0).is_ok());
        assert_eq!(epm.state(&t, 0), EndpointState::XrmProcessing);
        assert_eq!(epm.take_pending_job(), Some((0, XrmJob::Build)));
        assert_eq!(epm.take_pending_job(), None);
        // Double build while processing is refused.
        assert_eq!(epm.set_build_process(&mut t, 0), Err(ErrorCode::ApiLocked));
        let mut fan = DetFanout::new();
        epm.xrm_report(&mut t, 0, XrmResult::success_build(), Some(0x900C), &mut fan);
        assert_eq!(epm.state(&t, 0), EndpointState::Built);
        assert_eq!(epm.connection_label(&t, 0), 0x900C);
        assert_eq!(epm.set_build_process(&mut t, 0), Err(ErrorCode::AlreadySet));
    }

    #[test]
    fn shared_source_destroyed_only_by_last_owner() {
        let (mut routes, mut endpoints, mut nodes) = tables();
        let mut t = RouteTables {
            routes: &mut routes,
            endpoints: &mut endpoints,
            nodes: &mut nodes,
        };
        let mut epm = Epm::new();
        epm.attach(&mut t, 0, 0);
        epm.attach(&mut t, 0, 1);
        assert_eq!(t.endpoints[0].reference_count(), 2);
        epm.set_build_process(&mut t, 0).unwrap();
        let mut fan = DetFanout::new();
        epm.xrm_report(&mut t, 0, XrmResult::success_build(), Some(0xC), &mut fan);
        // First route leaves: reference remains, no destroy job.
        assert_eq!(epm.set_destroy_process(&mut t, 0), Err(ErrorCode::InvalidShadow));
        epm.detach(&mut t, 0, 0);
        assert_eq!(t.endpoints[0].reference_count(), 1);
        assert_eq!(epm.take_pending_job(), None);
        // Last owner triggers the destroy.
        assert!(epm.set_destroy_process(&mut t, 0).is_ok());
        assert_eq!(epm.take_pending_job(), Some((0, XrmJob::Destroy)));
        epm.xrm_report(&mut t, 0, XrmResult::success_destroy(), None, &mut fan);
        assert_eq!(epm.state(&t, 0), EndpointState::Idle);
        assert_eq!(epm.connection_label(&t, 0), 0);
    }

    #[test]
    fn magic_detects_stale_memory() {
        let (mut routes, mut endpoints, mut nodes) = tables();
        endpoints[0].internal.magic = 0xDEAD_BEEF;
        endpoints[0].internal.connection_label = 0x1234;
        let mut t = RouteTables {
            routes: &mut routes,
            endpoints: &mut endpoints,
            nodes: &mut nodes,
        };
        let mut epm = Epm::new();
        epm.init_internal_infos(&mut t, 0);
        assert_eq!(t.endpoints[0].internal.magic, EPM_MAGIC);
        assert_eq!(t.endpoints[0].connection_label(), 0);
    }

    #[test]
    fn invalid_device_notifies_built_endpoints_only() {
        let (mut routes, mut endpoints, mut nodes) = tables();
        let mut t = RouteTables {
            routes: &mut routes,
            endpoints: &mut endpoints,
            nodes: &mut nodes,
        };
        let mut epm = Epm::new();
        // Endpoint 1 (node 0x102) built and attached to route 0.
        epm.attach(&mut t, 1, 0);
        epm.set_build_process(&mut t, 1).unwrap();
        let mut fan = DetFanout::new();
        epm.xrm_report(&mut t, 1, XrmResult::success_build(), None, &mut fan);
        // Endpoint 2 (node 0x102) idle: silent.
        let mut fan = DetFanout::new();
        epm.report_invalid_device(&mut t, 0x102, &mut fan);
        let hits: Vec<_> = fan.iter().collect();
        assert_eq!(hits, vec![(0u16, 1u8)]);
        assert_eq!(epm.state(&t, 1), EndpointState::Idle);
    }
}
