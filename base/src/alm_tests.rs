//! Tests for the API-locking manager.
//!
//! Covers: lock exclusion per method bit, the two-interval timeout rule,
//! release disarming the collector, multi-client independence and the
//! termination reset.

use ringcore_abi::TimerUser;

use crate::alm::{ALM_GC_INTERVAL, ALM_MAX_TIMEOUTS, Alm, LockClient, LockTimeout};
use crate::scheduler::Scheduler;
use crate::timer::TimerMgmt;

struct Fixture {
    scd: Scheduler,
    tm: TimerMgmt,
    alm: Alm,
    now: u16,
}

impl Fixture {
    fn new() -> Self {
        let mut scd = Scheduler::new();
        let tm = TimerMgmt::new(&mut scd, false);
        let mut alm = Alm::new();
        alm.register_api(LockClient::InicCmd);
        alm.register_api(LockClient::InicRes);
        Fixture {
            scd,
            tm,
            alm,
            now: 0,
        }
    }

    fn lock(&mut self, client: LockClient, bit: u32) -> bool {
        self.alm
            .lock(&mut self.tm, &mut self.scd, self.now, client, bit)
    }

    /// Advances time by one collector interval and runs the expiring
    /// timers, collecting the reported lock timeouts.
    fn gc_pass(&mut self) -> Vec<LockTimeout> {
        self.now = self.now.wrapping_add(ALM_GC_INTERVAL);
        let mut fired = Vec::new();
        self.tm.service_begin(self.now);
        while let Some(user) = self.tm.service_next() {
            if user == TimerUser::AlmGc {
                let mut out = [None; ALM_MAX_TIMEOUTS];
                let n = self.alm.gc_tick(&mut out);
                fired.extend(out[..n].iter().flatten().copied());
            }
            if !self.tm.service_fired(user) {
                break;
            }
        }
        self.alm.sync_gc_timer(&mut self.tm, &mut self.scd);
        fired
    }
}

#[test]
fn lock_excludes_second_attempt() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x02));
    assert!(!f.lock(LockClient::InicCmd, 0x02));
    // Other bits and other clients stay lockable.
    assert!(f.lock(LockClient::InicCmd, 0x04));
    assert!(f.lock(LockClient::InicRes, 0x02));
}

#[test]
fn release_frees_bit() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x08));
    f.alm
        .release(&mut f.tm, &mut f.scd, LockClient::InicCmd, 0x08);
    assert!(!f.alm.is_locked(LockClient::InicCmd, 0x08));
    assert!(f.lock(LockClient::InicCmd, 0x08));
}

#[test]
fn timeout_after_two_intervals() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x10));
    // First collector pass only arms the timeout candidate.
    assert!(f.gc_pass().is_empty());
    assert!(f.alm.is_locked(LockClient::InicCmd, 0x10));
    // Second pass declares the lock timed out and frees the bit.
    let fired = f.gc_pass();
    assert_eq!(
        fired,
        vec![LockTimeout {
            client: LockClient::InicCmd,
            method: 0x10
        }]
    );
    assert!(!f.alm.is_locked(LockClient::InicCmd, 0x10));
    assert!(f.lock(LockClient::InicCmd, 0x10));
}

#[test]
fn release_before_second_interval_prevents_timeout() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x01));
    assert!(f.gc_pass().is_empty());
    f.alm
        .release(&mut f.tm, &mut f.scd, LockClient::InicCmd, 0x01);
    // Collector disarmed with the last lock gone.
    assert!(!f.tm.is_timer_in_use(TimerUser::AlmGc));
    assert!(f.gc_pass().is_empty());
}

#[test]
fn relock_resets_timeout_candidate() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x01));
    assert!(f.gc_pass().is_empty());
    // Release and immediately re-acquire: the fresh lock must get its own
    // two full intervals.
    f.alm
        .release(&mut f.tm, &mut f.scd, LockClient::InicCmd, 0x01);
    assert!(f.lock(LockClient::InicCmd, 0x01));
    assert!(f.gc_pass().is_empty());
    assert_eq!(f.gc_pass().len(), 1);
}

#[test]
fn gc_with_no_clients_locked_is_idempotent() {
    let mut f = Fixture::new();
    let mut out = [None; ALM_MAX_TIMEOUTS];
    assert_eq!(f.alm.gc_tick(&mut out), 0);
    assert_eq!(f.alm.gc_tick(&mut out), 0);
}

#[test]
fn multiple_bits_time_out_individually() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x01));
    assert!(f.lock(LockClient::InicRes, 0x80));
    assert!(f.gc_pass().is_empty());
    let fired = f.gc_pass();
    assert_eq!(fired.len(), 2);
    assert!(fired.contains(&LockTimeout {
        client: LockClient::InicCmd,
        method: 0x01
    }));
    assert!(fired.contains(&LockTimeout {
        client: LockClient::InicRes,
        method: 0x80
    }));
    assert!(!f.tm.is_timer_in_use(TimerUser::AlmGc));
}

#[test]
fn full_bit_space_times_out_without_truncation() {
    let mut f = Fixture::new();
    // Saturate both clients the way a dead device with many commands in
    // flight would.
    for bit in 0..6 {
        assert!(f.lock(LockClient::InicCmd, 1 << bit));
    }
    for bit in 0..13 {
        assert!(f.lock(LockClient::InicRes, 1 << bit));
    }
    assert!(f.gc_pass().is_empty());
    // One pass must report every locked bit; none may be unlocked
    // silently.
    let fired = f.gc_pass();
    assert_eq!(fired.len(), 19);
    for bit in 0..6 {
        assert!(fired.contains(&LockTimeout {
            client: LockClient::InicCmd,
            method: 1 << bit
        }));
        assert!(!f.alm.is_locked(LockClient::InicCmd, 1 << bit));
    }
    for bit in 0..13 {
        assert!(fired.contains(&LockTimeout {
            client: LockClient::InicRes,
            method: 1 << bit
        }));
        assert!(!f.alm.is_locked(LockClient::InicRes, 1 << bit));
    }
    assert!(!f.tm.is_timer_in_use(TimerUser::AlmGc));
}

#[test]
fn reset_clears_everything() {
    let mut f = Fixture::new();
    assert!(f.lock(LockClient::InicCmd, 0x01));
    assert!(f.lock(LockClient::InicRes, 0x02));
    f.alm.reset(&mut f.tm, &mut f.scd);
    assert!(!f.alm.is_locked(LockClient::InicCmd, 0x01));
    assert!(!f.alm.is_locked(LockClient::InicRes, 0x02));
    assert!(!f.tm.is_timer_in_use(TimerUser::AlmGc));
}
