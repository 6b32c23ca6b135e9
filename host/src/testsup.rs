//! Shared test support: a pool-accounting mock transceiver, a callback
//! sink reachable through the opaque user pointer, and a harness that
//! plays the companion device and the external resource manager.

use core::ffi::c_void;

use ringcore_abi::msg::FB_INIC;
use ringcore_abi::{
    InitResult, MsgId, OpType, ResultCode, RouteInfos, StdResult, TxStatus, XrmResult, fid,
};
use ringcore_base::GeneralError;
use ringcore_inic::{NoticeData, SubData, Telegram, Transceiver};
use ringcore_route::XrmJob;

use crate::{Ehc, InitData};

/// Mock wire: counts pool buffers and records every sent frame.
pub struct MockTrcv {
    pub free: usize,
    pub sent: Vec<Telegram>,
}

impl MockTrcv {
    pub fn new(pool: usize) -> Self {
        MockTrcv {
            free: pool,
            sent: Vec::new(),
        }
    }
}

impl Transceiver for MockTrcv {
    fn alloc_tx(&mut self, payload_len: u8) -> Option<Telegram> {
        if self.free == 0 {
            return None;
        }
        self.free -= 1;
        Some(Telegram::new(payload_len))
    }

    fn send(&mut self, tel: Telegram) {
        self.sent.push(tel);
    }

    fn release(&mut self, _tel: Telegram) {
        self.free += 1;
    }
}

/// Everything the callbacks record, plus the clock the library reads.
#[derive(Default)]
pub struct TestSink {
    pub now: u16,
    pub init_result: Option<InitResult>,
    pub errors: Vec<GeneralError>,
    pub route_reports: Vec<(u16, RouteInfos)>,
    pub xrm_jobs: Vec<(u8, XrmJob)>,
    pub cmd_results: Vec<ResultCode>,
    pub sub_events: usize,
    pub wake_hints: Vec<u16>,
    pub service_requests: usize,
}

fn sink_of(user: *mut c_void) -> &'static mut TestSink {
    unsafe { &mut *(user as *mut TestSink) }
}

fn cb_tick(user: *mut c_void) -> u16 {
    sink_of(user).now
}

fn cb_wake(user: *mut c_void, hint: u16) {
    sink_of(user).wake_hints.push(hint);
}

fn cb_request(user: *mut c_void) {
    sink_of(user).service_requests += 1;
}

fn cb_init(user: *mut c_void, result: InitResult) {
    sink_of(user).init_result = Some(result);
}

fn cb_error(user: *mut c_void, err: GeneralError) {
    sink_of(user).errors.push(err);
}

fn cb_route(user: *mut c_void, route: u16, infos: RouteInfos) {
    sink_of(user).route_reports.push((route, infos));
}

fn cb_xrm(user: *mut c_void, ep: u8, job: XrmJob) {
    sink_of(user).xrm_jobs.push((ep, job));
}

pub fn cb_cmd(user: *mut c_void, result: &StdResult<'_>, _data: &NoticeData<'_>) {
    sink_of(user).cmd_results.push(result.code);
}

pub fn cb_sub(user: *mut c_void, _data: &SubData<'_>) {
    sink_of(user).sub_events += 1;
}

/// A complete instance wired to a recording sink and the mock wire. The
/// sink box stays alive for the process; tests are short-lived.
pub struct Harness {
    pub ehc: Ehc<'static, MockTrcv>,
    sink: *mut TestSink,
}

impl Harness {
    pub fn new() -> Self {
        let sink = Box::into_raw(Box::new(TestSink::default()));
        let cb = InitData {
            tick_clock: cb_tick,
            wake_hint: Some(cb_wake),
            request_service: Some(cb_request),
            init_result: Some(cb_init),
            error: Some(cb_error),
            route_report: Some(cb_route),
            xrm_job: Some(cb_xrm),
            user_ptr: sink as *mut c_void,
        };
        Harness {
            ehc: Ehc::new(MockTrcv::new(8), 1, cb),
            sink,
        }
    }

    pub fn sink(&self) -> &mut TestSink {
        unsafe { &mut *self.sink }
    }

    /// Builds an inbound frame from the device.
    pub fn reply(fid: u16, op: OpType, payload: &[u8]) -> Telegram {
        Telegram::inbound(MsgId::new(FB_INIC, fid, op), payload)
    }

    /// Confirms transmission of every sent frame and answers it the way a
    /// healthy device would.
    pub fn auto_respond(&mut self) {
        loop {
            let Some(tel) = self.ehc.command_layer().2.sent.pop() else {
                break;
            };
            let key = (tel.id.function_id, tel.id.op_type);
            self.ehc.tx_status(tel, TxStatus::Ok);
            let answer = match key {
                (fid::FID_DEVICE_VERSION, OpType::Get) => {
                    Some(Self::reply(fid::FID_DEVICE_VERSION, OpType::Status, &[0u8; 18]))
                }
                (fid::FID_DEVICE_ATTACH, OpType::StartResult) => {
                    Some(Self::reply(fid::FID_DEVICE_ATTACH, OpType::Result, &[]))
                }
                (fid::FID_NW_CFG, OpType::Get | OpType::SetGet) => Some(Self::reply(
                    fid::FID_NW_CFG,
                    OpType::Status,
                    &[0x01, 0x05, 0x03, 0xC8, 10],
                )),
                (fid::FID_NW_STARTUP, OpType::StartResult) => {
                    Some(Self::reply(fid::FID_NW_STARTUP, OpType::Result, &[]))
                }
                (fid::FID_NW_SHUTDOWN, OpType::StartResult) => {
                    Some(Self::reply(fid::FID_NW_SHUTDOWN, OpType::Result, &[]))
                }
                _ => None,
            };
            if let Some(tel) = answer {
                self.ehc.on_rx(&tel);
            }
        }
    }

    /// Pushes an unsolicited network status report.
    pub fn push_network_status(&mut self, available: bool, node_address: u16) {
        let payload = [
            0x00,
            0x00,
            available as u8,
            0x11,
            0x10,
            (node_address >> 8) as u8,
            node_address as u8,
            0x01,
            0x04,
            0x00,
            0x34,
        ];
        let tel = Self::reply(fid::FID_NW_STATUS, OpType::Status, &payload);
        self.ehc.on_rx(&tel);
    }

    /// Completes the init sequence against the scripted device.
    pub fn init_ok(&mut self) {
        self.ehc.init().unwrap();
        for _ in 0..4 {
            self.auto_respond();
            self.ehc.service();
        }
        assert_eq!(self.sink().init_result, Some(InitResult::Success));
    }

    /// Advances time in 50 ms steps, servicing the instance and playing
    /// the resource manager with successful job results.
    pub fn run(&mut self, ms: u16) {
        let steps = ms / 50;
        for _ in 0..steps {
            self.sink().now = self.sink().now.wrapping_add(50);
            self.ehc.report_tick();
            for _ in 0..3 {
                self.ehc.service();
            }
            let jobs: Vec<_> = self.sink().xrm_jobs.drain(..).collect();
            for (ep, job) in jobs {
                let result = match job {
                    XrmJob::Build => XrmResult::success_build(),
                    XrmJob::Destroy => XrmResult::success_destroy(),
                };
                let label = (job == XrmJob::Build).then_some(0x1A0C);
                self.ehc.xrm_report(ep, result, label);
            }
        }
    }

    /// Like `run`, but resource jobs are answered with the given result.
    pub fn run_with_xrm_result(&mut self, ms: u16, result: XrmResult) {
        let steps = ms / 50;
        for _ in 0..steps {
            self.sink().now = self.sink().now.wrapping_add(50);
            self.ehc.report_tick();
            for _ in 0..3 {
                self.ehc.service();
            }
            let jobs: Vec<_> = self.sink().xrm_jobs.drain(..).collect();
            for (ep, _) in jobs {
                self.ehc.xrm_report(ep, result, None);
            }
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        // The sink outlives the instance; reclaim it last.
        unsafe { drop(Box::from_raw(self.sink)) };
    }
}
