//! Tests for the delta-list timer management.
//!
//! Covers: delta bookkeeping across set/clear, the service walk protocol,
//! periodic reload, mutation from inside handlers via the changed flag, the
//! wake-up hint, and 16-bit tick wraparound.

use ringcore_abi::{SrvKind, TimerUser};

use crate::scheduler::Scheduler;
use crate::timer::{TM_EVENT_UPDATE_TIMERS, TimerMgmt};

fn fresh() -> (Scheduler, TimerMgmt) {
    let mut scd = Scheduler::new();
    let tm = TimerMgmt::new(&mut scd, false);
    (scd, tm)
}

/// Runs one service pass, returning the fired users in order.
fn run_service(tm: &mut TimerMgmt, now: u16) -> Vec<TimerUser> {
    let mut fired = Vec::new();
    tm.service_begin(now);
    while let Some(user) = tm.service_next() {
        fired.push(user);
        if !tm.service_fired(user) {
            break;
        }
    }
    fired
}

#[test]
fn single_shot_fires_once() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 100, 0);
    assert!(tm.is_timer_in_use(TimerUser::AlmGc));
    // Service event armed by set_timer.
    assert_ne!(scd.get_event(SrvKind::Timers) & TM_EVENT_UPDATE_TIMERS, 0);

    assert!(run_service(&mut tm, 99).is_empty());
    assert_eq!(run_service(&mut tm, 100), vec![TimerUser::AlmGc]);
    assert!(!tm.is_timer_in_use(TimerUser::AlmGc));
    assert!(run_service(&mut tm, 500).is_empty());
}

#[test]
fn periodic_reloads() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 50, 50);
    assert_eq!(run_service(&mut tm, 50), vec![TimerUser::RouteCheck]);
    // Reloaded with the same period.
    assert!(tm.is_timer_in_use(TimerUser::RouteCheck));
    assert_eq!(run_service(&mut tm, 100), vec![TimerUser::RouteCheck]);
    assert_eq!(run_service(&mut tm, 149), Vec::<TimerUser>::new());
    assert_eq!(run_service(&mut tm, 150), vec![TimerUser::RouteCheck]);
}

#[test]
fn delta_ordering_of_multiple_timers() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 30, 0);
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 0);
    tm.set_timer(&mut scd, 0, TimerUser::InitWatchdog, 20, 0);
    // Head is the earliest; its delta is relative to the last snapshot.
    assert_eq!(tm.head_delta(), Some(10));
    assert_eq!(run_service(&mut tm, 10), vec![TimerUser::AlmGc]);
    assert_eq!(tm.head_delta(), Some(10));
    // One pass catches up over several expiries.
    assert_eq!(
        run_service(&mut tm, 35),
        vec![TimerUser::InitWatchdog, TimerUser::RouteCheck]
    );
}

#[test]
fn clear_folds_delta_into_follower() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 0);
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 30, 0);
    tm.clear_timer(&mut scd, TimerUser::AlmGc);
    // The follower keeps its absolute elapse of 30.
    assert_eq!(tm.head_delta(), Some(30));
    assert!(run_service(&mut tm, 29).is_empty());
    assert_eq!(run_service(&mut tm, 30), vec![TimerUser::RouteCheck]);
}

#[test]
fn set_while_running_adjusts_for_elapsed_ticks() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 100, 0);
    // 40 ticks later a second timer with elapse 10 must still fire first.
    tm.set_timer(&mut scd, 40, TimerUser::RouteCheck, 10, 0);
    assert_eq!(run_service(&mut tm, 50), vec![TimerUser::RouteCheck]);
    assert!(run_service(&mut tm, 99).is_empty());
    assert_eq!(run_service(&mut tm, 100), vec![TimerUser::AlmGc]);
}

#[test]
fn rearm_same_timer_is_single_registration() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 100, 0);
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 200, 0);
    assert!(run_service(&mut tm, 100).is_empty());
    assert_eq!(run_service(&mut tm, 200), vec![TimerUser::AlmGc]);
}

#[test]
fn tick_wraparound_fires_exactly_once() {
    let (mut scd, mut tm) = fresh();
    // Arm close to the wrap boundary; expiry lies beyond 0xFFFF.
    tm.service_begin(0xFFF0);
    assert!(tm.service_next().is_none());
    tm.set_timer(&mut scd, 0xFFF0, TimerUser::AlmGc, 0x20, 0);
    // Before the boundary: nothing fires.
    assert!(run_service(&mut tm, 0xFFFF).is_empty());
    // After wrapping to 0x0000..0x000F: still nothing.
    assert!(run_service(&mut tm, 0x000F).is_empty());
    // At 0x0010 the 0x20 ticks are up.
    assert_eq!(run_service(&mut tm, 0x0010), vec![TimerUser::AlmGc]);
    // No spurious re-fire afterwards.
    assert!(run_service(&mut tm, 0x0100).is_empty());
}

#[test]
fn handler_rearming_keeps_walk_consistent() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 0);
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 20, 0);
    let mut fired = Vec::new();
    tm.service_begin(20);
    while let Some(user) = tm.service_next() {
        fired.push(user);
        if user == TimerUser::AlmGc && fired.len() == 1 {
            // Handler re-arms its own timer; the changed flag keeps the
            // walk from consuming the slot.
            tm.set_timer(&mut scd, 20, TimerUser::AlmGc, 100, 0);
        }
        if !tm.service_fired(user) {
            break;
        }
    }
    assert_eq!(fired, vec![TimerUser::AlmGc, TimerUser::RouteCheck]);
    assert!(tm.is_timer_in_use(TimerUser::AlmGc));
    assert!(run_service(&mut tm, 119).is_empty());
    assert_eq!(run_service(&mut tm, 120), vec![TimerUser::AlmGc]);
}

#[test]
fn handler_clearing_other_timer_mid_walk() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 0);
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 10, 0);
    let mut fired = Vec::new();
    tm.service_begin(10);
    while let Some(user) = tm.service_next() {
        fired.push(user);
        if user == TimerUser::AlmGc {
            tm.clear_timer(&mut scd, TimerUser::RouteCheck);
        }
        if !tm.service_fired(user) {
            break;
        }
    }
    assert_eq!(fired, vec![TimerUser::AlmGc]);
    assert!(!tm.is_timer_in_use(TimerUser::RouteCheck));
}

#[test]
fn wake_hint_reports_head_remainder() {
    let mut scd = Scheduler::new();
    let mut tm = TimerMgmt::new(&mut scd, true);
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 100, 0);
    // A service pass that advances time but expires nothing updates the
    // head and schedules a hint.
    assert!(run_service(&mut tm, 40).is_empty());
    assert_eq!(tm.check_for_next_service(&mut scd, 40), Some(60));
    // No head change since: no new hint.
    assert_eq!(tm.check_for_next_service(&mut scd, 41), None);
}

#[test]
fn wake_hint_minimum_is_one() {
    let mut scd = Scheduler::new();
    let mut tm = TimerMgmt::new(&mut scd, true);
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 0);
    assert!(run_service(&mut tm, 5).is_empty());
    // More ticks passed since the service than the head has left.
    assert_eq!(tm.check_for_next_service(&mut scd, 20), Some(1));
}

#[test]
fn without_hint_hook_service_event_rearms() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 100, 0);
    assert!(run_service(&mut tm, 10).is_empty());
    scd.clear_event(SrvKind::Timers, TM_EVENT_UPDATE_TIMERS);
    assert_eq!(tm.check_for_next_service(&mut scd, 10), None);
    assert_ne!(scd.get_event(SrvKind::Timers) & TM_EVENT_UPDATE_TIMERS, 0);
}

#[test]
fn stop_service_drops_all_timers() {
    let (mut scd, mut tm) = fresh();
    tm.set_timer(&mut scd, 0, TimerUser::AlmGc, 10, 10);
    tm.set_timer(&mut scd, 0, TimerUser::RouteCheck, 20, 0);
    tm.stop_service();
    assert!(!tm.is_timer_in_use(TimerUser::AlmGc));
    assert!(!tm.is_timer_in_use(TimerUser::RouteCheck));
    assert!(run_service(&mut tm, 100).is_empty());
}
