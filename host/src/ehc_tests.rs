//! End-to-end scenarios against the scripted device and resource manager.
//!
//! Covers: the cold-start init sequence and its failure modes, building
//! and tearing down a route through the full service loop, node loss and
//! return, the collector-driven command timeout, and the BIST-failure
//! termination path.

use ringcore_abi::{
    EndpointType, ErrorCode, InitResult, OpType, ResultCode, RouteInfos, TxStatus, XrmDetails,
    XrmResult, XrmResultCode, fid,
};
use ringcore_base::{EhEvent, GeneralError};
use ringcore_inic::inic::SUB_DEVICE_STATUS;
use ringcore_route::{EndpointEntry, NodeEntry, RouteEntry};
use ringcore_route::node::NodeSignature;

use crate::testsup::{Harness, cb_cmd, cb_sub};

/// Leaked caller-provided tables: one route, source on the local node,
/// sink on remote node 0x200.
fn leak_tables() -> (
    &'static mut [RouteEntry],
    &'static mut [EndpointEntry],
    &'static mut [NodeEntry],
) {
    let routes = Box::leak(vec![RouteEntry::new(0, 1, 0xA, true)].into_boxed_slice());
    let endpoints = Box::leak(
        vec![
            EndpointEntry::new(EndpointType::Source, 0),
            EndpointEntry::new(EndpointType::Sink, 1),
        ]
        .into_boxed_slice(),
    );
    let nodes = Box::leak(
        vec![
            NodeEntry::new(NodeSignature::with_address(0x0001)),
            NodeEntry::new(NodeSignature::with_address(0x0200)),
        ]
        .into_boxed_slice(),
    );
    (routes, endpoints, nodes)
}

fn built_harness() -> Harness {
    let mut h = Harness::new();
    h.init_ok();
    let (routes, endpoints, nodes) = leak_tables();
    h.ehc.route_start_process(routes, endpoints, nodes).unwrap();
    h.push_network_status(true, 0x105);
    h.ehc.set_node_available(1, true).unwrap();
    h.run(500);
    h
}

#[test]
fn cold_start_walks_version_attach_config() {
    let mut h = Harness::new();
    // Everything is refused before initialization.
    assert_eq!(
        h.ehc.network_startup(0, 52, None),
        Err(ErrorCode::NotInitialized)
    );
    h.ehc.init().unwrap();
    // The version query goes out first.
    let first = h.ehc.command_layer().2.sent[0].id;
    assert_eq!(first.function_id, fid::FID_DEVICE_VERSION);
    assert_eq!(first.op_type, OpType::Get);
    h.auto_respond();
    assert_eq!(h.sink().init_result, Some(InitResult::Success));
    // The one-shot report never fires twice.
    assert_eq!(h.ehc.init(), Err(ErrorCode::AlreadySet));
    // The attach acknowledgement left the cached config in place.
    assert_eq!(h.ehc.network_config().node_address, 0x105);
    assert_eq!(h.ehc.network_config().group_address, 0x3C8);
}

#[test]
fn init_times_out_without_device() {
    let mut h = Harness::new();
    h.ehc.init().unwrap();
    // Swallow the outgoing frame, never answer.
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Ok);
    for _ in 0..70 {
        h.sink().now = h.sink().now.wrapping_add(50);
        h.ehc.report_tick();
        h.ehc.service();
    }
    assert_eq!(h.sink().init_result, Some(InitResult::ErrTimeout));
}

#[test]
fn init_fails_on_version_error() {
    let mut h = Harness::new();
    h.ehc.init().unwrap();
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Ok);
    let err = Harness::reply(fid::FID_DEVICE_VERSION, OpType::Error, &[0x20, 0x03]);
    h.ehc.on_rx(&err);
    assert_eq!(h.sink().init_result, Some(InitResult::ErrInicVersion));
}

#[test]
fn build_one_route_end_to_end() {
    let mut h = built_harness();
    assert_eq!(h.sink().route_reports, vec![(0, RouteInfos::Built)]);
    assert_eq!(h.ehc.get_connection_label(0), 0x1A0C);
    let mut out = [None; 4];
    assert_eq!(h.ehc.get_attached_routes(0, &mut out), Ok(1));
    assert_eq!(out[0], Some(0));
}

#[test]
fn deactivate_and_reactivate_roundtrip() {
    let mut h = built_harness();
    h.sink().route_reports.clear();
    h.ehc.route_deactivate(0).unwrap();
    h.run(500);
    assert_eq!(h.sink().route_reports, vec![(0, RouteInfos::Destroyed)]);
    assert_eq!(h.ehc.get_connection_label(0), 0);

    // Deactivating again is a no-op error.
    assert_eq!(h.ehc.route_deactivate(0), Err(ErrorCode::AlreadySet));

    h.sink().route_reports.clear();
    h.ehc.route_activate(0).unwrap();
    h.run(500);
    assert_eq!(h.sink().route_reports, vec![(0, RouteInfos::Built)]);
}

#[test]
fn node_loss_suspends_then_return_rebuilds() {
    let mut h = built_harness();
    h.sink().route_reports.clear();
    h.ehc.set_node_available(1, false).unwrap();
    assert_eq!(h.sink().route_reports, vec![(0, RouteInfos::Suspended)]);

    h.sink().route_reports.clear();
    h.ehc.set_node_available(1, true).unwrap();
    h.run(500);
    assert_eq!(h.sink().route_reports, vec![(0, RouteInfos::Built)]);
}

#[test]
fn transient_storm_then_fatal_suspends() {
    let mut h = Harness::new();
    h.init_ok();
    let (routes, endpoints, nodes) = leak_tables();
    h.ehc.route_start_process(routes, endpoints, nodes).unwrap();
    h.push_network_status(true, 0x105);
    h.ehc.set_node_available(1, true).unwrap();
    let storm = XrmResult {
        code: XrmResultCode::ErrBuild,
        details: XrmDetails::Transmission(TxStatus::Timeout),
    };
    h.run_with_xrm_result(500, storm);
    assert!(!h.sink().route_reports.contains(&(0, RouteInfos::Built)));
    assert!(!h.sink().route_reports.contains(&(0, RouteInfos::Suspended)));

    let fatal = XrmResult {
        code: XrmResultCode::ErrBuild,
        details: XrmDetails::Transmission(TxStatus::FatalOa),
    };
    h.run_with_xrm_result(300, fatal);
    assert!(h.sink().route_reports.contains(&(0, RouteInfos::Suspended)));
}

#[test]
fn command_timeout_frees_the_lock() {
    let mut h = Harness::new();
    h.init_ok();
    h.ehc.network_shutdown(Some(cb_cmd)).unwrap();
    // Confirm transmission but never answer.
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Ok);
    // A second attempt is refused while the lock is held.
    assert_eq!(
        h.ehc.network_shutdown(Some(cb_cmd)),
        Err(ErrorCode::ApiLocked)
    );
    // Between one and two collector periods the timeout fires.
    for _ in 0..110 {
        h.sink().now = h.sink().now.wrapping_add(50);
        h.ehc.report_tick();
        h.ehc.service();
    }
    assert_eq!(h.sink().cmd_results, vec![ResultCode::Timeout]);
    // The bit is free again.
    assert!(h.ehc.network_shutdown(Some(cb_cmd)).is_ok());
    h.auto_respond();
    assert_eq!(
        h.sink().cmd_results,
        vec![ResultCode::Timeout, ResultCode::Success]
    );
}

#[test]
fn tx_failure_reports_transmission_error() {
    let mut h = Harness::new();
    h.init_ok();
    h.ehc.network_startup(0, 52, Some(cb_cmd)).unwrap();
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Crc);
    assert_eq!(h.sink().cmd_results, vec![ResultCode::Transmission]);
    // The startup lock was released by the bridge; a retry works.
    assert!(h.ehc.network_startup(0, 52, Some(cb_cmd)).is_ok());
}

#[test]
fn bist_failure_terminates_and_reports_inic_error() {
    let mut h = built_harness();
    h.sink().route_reports.clear();
    // Device status with a failed self-test.
    let tel = Harness::reply(
        fid::FID_DEVICE_STATUS,
        OpType::Status,
        &[0x01, 0x01, 0x00, 0x01, 0x00],
    );
    h.ehc.on_rx(&tel);
    assert_eq!(h.sink().errors, vec![GeneralError::Inic]);
    // Built routes survive termination silently; nothing further builds.
    assert!(h.sink().route_reports.is_empty());
}

#[test]
fn termination_purges_pending_command() {
    let mut h = Harness::new();
    h.init_ok();
    h.ehc.network_shutdown(Some(cb_cmd)).unwrap();
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Ok);
    h.ehc.report_event(EhEvent::UNSYNC_FAILED);
    assert_eq!(h.sink().cmd_results, vec![ResultCode::System]);
    assert_eq!(h.sink().errors, vec![GeneralError::Communication]);
}

#[test]
fn device_status_subscription_fans_out() {
    let mut h = Harness::new();
    h.init_ok();
    h.ehc.subscribe_sub_events(SUB_DEVICE_STATUS, cb_sub).unwrap();
    let tel = Harness::reply(
        fid::FID_DEVICE_STATUS,
        OpType::Status,
        &[0x01, 0x01, 0x00, 0x00, 0x00],
    );
    h.ehc.on_rx(&tel);
    assert_eq!(h.sink().sub_events, 1);
}

#[test]
fn network_status_cache_and_own_address() {
    let mut h = Harness::new();
    h.init_ok();
    h.push_network_status(true, 0x105);
    let status = h.ehc.network_status();
    assert_eq!(status.node_address, 0x105);
    assert_eq!(status.packet_bw, 0x34);
    use ringcore_inic::net::IsOwnAddr;
    assert_eq!(h.ehc.is_own_address(0x105), IsOwnAddr::Node);
    assert_eq!(h.ehc.is_own_address(0x3C8), IsOwnAddr::Group);
    assert_eq!(h.ehc.is_own_address(0x777), IsOwnAddr::None);
}

#[test]
fn wake_hint_reports_pending_timer() {
    let mut h = Harness::new();
    h.init_ok();
    // The collector timer of a locked command produces a wake hint.
    h.ehc.network_shutdown(Some(cb_cmd)).unwrap();
    let tel = h.ehc.command_layer().2.sent.pop().unwrap();
    h.ehc.tx_status(tel, TxStatus::Ok);
    h.sink().wake_hints.clear();
    h.sink().now = h.sink().now.wrapping_add(10);
    h.ehc.service();
    let hint = *h.sink().wake_hints.last().expect("a wake hint");
    assert!(hint > 0 && hint <= 2600);
}
