//! API-locking manager.
//!
//! Every command family owns a lock client with two bitmasks: `method_mask`
//! says "locked right now", `timeout_mask` says "was locked at the start of
//! the previous garbage-collector pass and has not been released since".
//! The garbage collector fires only bits present in `timeout_mask`, then
//! copies `method_mask` into `timeout_mask` to arm the next round. A
//! request completing within one collector interval therefore never times
//! out; a request straddling one full interval does. This is the
//! system-wide watchdog for protocol responses.

use ringcore_abi::TimerUser;

use crate::scheduler::Scheduler;
use crate::timer::TimerMgmt;

/// Interval of the garbage collector in milliseconds.
pub const ALM_GC_INTERVAL: u16 = 2600;

/// Lock clients known to the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockClient {
    /// Control command family of the companion device.
    InicCmd = 0,
    /// Resource command family of the companion device.
    InicRes = 1,
}

const ALM_NUM_CLIENTS: usize = 2;

/// A method bit declared timed out by the garbage collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockTimeout {
    pub client: LockClient,
    pub method: u32,
}

/// Upper bound of timeouts a single collector pass can report: one per
/// possible method bit of every registered client, so a pass can never
/// outgrow the collector output.
pub const ALM_MAX_TIMEOUTS: usize = 32 * ALM_NUM_CLIENTS;

#[derive(Clone, Copy, Default)]
struct ClientState {
    registered: bool,
    method_mask: u32,
    timeout_mask: u32,
}

/// Per-instance API-locking manager.
pub struct Alm {
    clients: [ClientState; ALM_NUM_CLIENTS],
}

impl Alm {
    pub const fn new() -> Self {
        Alm {
            clients: [ClientState {
                registered: false,
                method_mask: 0,
                timeout_mask: 0,
            }; ALM_NUM_CLIENTS],
        }
    }

    /// Registers a lock client. Idempotent.
    pub fn register_api(&mut self, client: LockClient) {
        self.clients[client as usize].registered = true;
    }

    /// Locks the given method bit. Returns `false` if the bit is already
    /// locked. A successful lock arms the garbage collector.
    pub fn lock(
        &mut self,
        tm: &mut TimerMgmt,
        scd: &mut Scheduler,
        now: u16,
        client: LockClient,
        method: u32,
    ) -> bool {
        let state = &mut self.clients[client as usize];
        debug_assert!(state.registered);
        if (state.method_mask & method) != 0 {
            return false;
        }
        state.method_mask |= method;
        state.timeout_mask &= !method;
        if !tm.is_timer_in_use(TimerUser::AlmGc) {
            tm.set_timer(
                scd,
                now,
                TimerUser::AlmGc,
                ALM_GC_INTERVAL,
                ALM_GC_INTERVAL,
            );
        }
        true
    }

    /// Releases the given method bit and disarms the collector when no
    /// lock remains across all clients.
    pub fn release(
        &mut self,
        tm: &mut TimerMgmt,
        scd: &mut Scheduler,
        client: LockClient,
        method: u32,
    ) {
        let state = &mut self.clients[client as usize];
        state.method_mask &= !method;
        state.timeout_mask &= !method;
        if !self.any_locked() {
            tm.clear_timer(scd, TimerUser::AlmGc);
        }
    }

    /// True if the method bit is currently locked.
    pub fn is_locked(&self, client: LockClient, method: u32) -> bool {
        (self.clients[client as usize].method_mask & method) != 0
    }

    /// One garbage-collector pass: fires every bit of every client's
    /// timeout mask, clears fired bits from both masks, then re-arms the
    /// timeout mask from the bits still locked. The returned slice lists
    /// the timed-out method bits in client order. A bit is only unlocked
    /// together with its report; `out` covers the whole bit space, so in
    /// practice nothing is ever carried over.
    pub fn gc_tick(&mut self, out: &mut [Option<LockTimeout>; ALM_MAX_TIMEOUTS]) -> usize {
        let mut n = 0;
        for (ci, state) in self.clients.iter_mut().enumerate() {
            if !state.registered {
                continue;
            }
            let client = if ci == 0 {
                LockClient::InicCmd
            } else {
                LockClient::InicRes
            };
            let mut bit = 1u32;
            while state.timeout_mask != 0 && bit != 0 {
                if (state.timeout_mask & bit) != 0 && n < out.len() {
                    out[n] = Some(LockTimeout {
                        client,
                        method: bit,
                    });
                    n += 1;
                    state.method_mask &= !bit;
                    state.timeout_mask &= !bit;
                }
                bit <<= 1;
            }
            state.timeout_mask = state.method_mask;
        }
        n
    }

    /// Disarms the collector after a pass that left nothing locked. Call
    /// after the timeout fan-out completed, since timeout handlers may
    /// re-arm their locks.
    pub fn sync_gc_timer(&mut self, tm: &mut TimerMgmt, scd: &mut Scheduler) {
        if !self.any_locked() {
            tm.clear_timer(scd, TimerUser::AlmGc);
        }
    }

    /// Resets all registered clients and the collector. Used on
    /// termination events; pending single-observers are purged by their
    /// owners.
    pub fn reset(&mut self, tm: &mut TimerMgmt, scd: &mut Scheduler) {
        tm.clear_timer(scd, TimerUser::AlmGc);
        for state in self.clients.iter_mut() {
            state.method_mask = 0;
            state.timeout_mask = 0;
        }
    }

    fn any_locked(&self) -> bool {
        self.clients
            .iter()
            .any(|s| s.registered && s.method_mask != 0)
    }
}

impl Default for Alm {
    fn default() -> Self {
        Alm::new()
    }
}
