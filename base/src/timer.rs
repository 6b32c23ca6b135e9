//! Timer management.
//!
//! A delta list ordered by absolute elapse over a 16-bit wrapping tick
//! domain. The head entry stores its elapse relative to the tick count of
//! the last service run; every following entry stores its elapse relative
//! to its predecessor, so the sum of deltas up to an entry is its remaining
//! absolute elapse.
//!
//! Handlers run from the host's timer service loop:
//!
//! ```ignore
//! tm.service_begin(now);
//! while let Some(user) = tm.service_next() {
//!     dispatch(user);                 // may set or clear any timer
//!     if !tm.service_fired(user) { break; }
//! }
//! ```
//!
//! The `changed` flag detects whether a handler re-armed or cleared its own
//! timer, which keeps the walk safe against mutation from inside handlers.

use ringcore_abi::{SrvKind, TimerUser};
use ringcore_lib::{DlList, DlNode, HasNode};

use crate::scheduler::Scheduler;

/// Priority of the timer management service.
pub const TM_SRV_PRIO: u8 = 255;
/// Main event of the timer management service.
pub const TM_EVENT_UPDATE_TIMERS: u32 = 0x01;

/// Capacity of the timer pool.
pub const TM_MAX_TIMERS: usize = 8;

#[derive(Clone, Copy)]
struct TimerSlot {
    node: DlNode,
    user: TimerUser,
    in_use: bool,
    /// Set whenever the timer is re-armed or cleared; consulted by the
    /// service walk after each handler call.
    changed: bool,
    period: u16,
    delta: u16,
}

impl TimerSlot {
    const fn empty() -> Self {
        TimerSlot {
            node: DlNode::new(),
            user: TimerUser::AlmGc,
            in_use: false,
            changed: false,
            period: 0,
            delta: 0,
        }
    }
}

impl HasNode for TimerSlot {
    fn node(&self) -> &DlNode {
        &self.node
    }
    fn node_mut(&mut self) -> &mut DlNode {
        &mut self.node
    }
}

/// Delta-list timer management.
pub struct TimerMgmt {
    slots: [TimerSlot; TM_MAX_TIMERS],
    list: DlList,
    last_tick: u16,
    /// The head of the list changed during the last service; the host may
    /// be told a new wake-up hint.
    set_service_timer: bool,
    /// An application wake-hint hook is registered; the timer service is
    /// not re-armed on its own but waits for the external trigger.
    delayed_service_enabled: bool,
    /// Residual tick difference of the in-progress service walk.
    walk_diff: u16,
    walking: bool,
}

impl TimerMgmt {
    pub fn new(scd: &mut Scheduler, delayed_service_enabled: bool) -> Self {
        // The timer service runs last so every earlier service of the same
        // pass observes a settled timer list.
        let _ = scd.add_service(SrvKind::Timers, TM_SRV_PRIO);
        TimerMgmt {
            slots: [TimerSlot::empty(); TM_MAX_TIMERS],
            list: DlList::new(),
            last_tick: 0,
            set_service_timer: false,
            delayed_service_enabled,
            walk_diff: 0,
            walking: false,
        }
    }

    /// True if the given owner's timer is armed.
    pub fn is_timer_in_use(&self, user: TimerUser) -> bool {
        self.slot_of(user)
            .map(|i| self.slots[i].in_use)
            .unwrap_or(false)
    }

    /// Arms a timer. The timer expires after `elapse` milliseconds and,
    /// when `period` is non-zero, then again after every period. An armed
    /// timer of the same owner is cleared first.
    pub fn set_timer(
        &mut self,
        scd: &mut Scheduler,
        now: u16,
        user: TimerUser,
        elapse: u16,
        period: u16,
    ) {
        self.clear_timer(scd, user);
        self.set_timer_internal(now, user, elapse, period);
        self.trigger_service(scd);
    }

    /// Disarms a timer. A not-armed timer is a no-op.
    pub fn clear_timer(&mut self, scd: &mut Scheduler, user: TimerUser) {
        let Some(idx) = self.slot_of(user) else {
            return;
        };
        if !self.slots[idx].in_use {
            return;
        }
        self.slots[idx].changed = true;
        if let Some(next) = self.list.next(&self.slots, idx as u8) {
            // Fold the removed delta into the follower so the followers'
            // absolute elapse stays intact.
            let delta = self.slots[idx].delta;
            self.slots[next as usize].delta = self.slots[next as usize].delta.wrapping_add(delta);
        }
        let _ = self.list.remove(&mut self.slots, idx as u8);
        self.slots[idx].in_use = false;
        self.trigger_service(scd);
    }

    /// Re-arms the service event when at least one timer runs. Called by
    /// the host when its external wake-up timer fires.
    pub fn trigger_service(&mut self, scd: &mut Scheduler) {
        if !self.list.is_empty() {
            scd.set_event(SrvKind::Timers, TM_EVENT_UPDATE_TIMERS);
        }
    }

    /// Tears the timer list down. Used on termination; no handler fires.
    pub fn stop_service(&mut self) {
        self.set_service_timer = false;
        self.walking = false;
        let mut cur = self.list.head();
        while let Some(idx) = cur {
            cur = self.list.next(&self.slots, idx);
            let _ = self.list.remove(&mut self.slots, idx);
            self.slots[idx as usize].in_use = false;
        }
    }

    /// Opens a service walk at the given tick count.
    pub fn service_begin(&mut self, now: u16) {
        self.walk_diff = now.wrapping_sub(self.last_tick);
        self.last_tick = now;
        self.walking = !self.list.is_empty();
    }

    /// Applies the elapsed ticks to the head of the list and yields the
    /// owner of the next expired timer. Returns `None` when the walk is
    /// done; the head's residual delta then already reflects the current
    /// tick count.
    pub fn service_next(&mut self) -> Option<TimerUser> {
        if !self.walking {
            return None;
        }
        let Some(head) = self.list.head() else {
            self.walking = false;
            return None;
        };
        let head = head as usize;
        if self.walk_diff <= self.slots[head].delta {
            self.slots[head].delta -= self.walk_diff;
            self.walk_diff = 0;
        } else {
            self.walk_diff -= self.slots[head].delta;
            self.slots[head].delta = 0;
        }
        if self.slots[head].delta == 0 {
            // Reset to detect mutation from inside the handler call that
            // follows this yield.
            self.slots[head].changed = false;
            Some(self.slots[head].user)
        } else {
            // Head updated but not expired: remember to hand out a new
            // wake-up hint and stop the walk.
            self.set_service_timer = true;
            self.walking = false;
            None
        }
    }

    /// Completes the expired-timer step after its handler ran. Returns
    /// `false` when the walk must stop because a rewound periodic timer
    /// became the new head.
    pub fn service_fired(&mut self, user: TimerUser) -> bool {
        let Some(idx) = self.slot_of(user) else {
            return true;
        };
        if self.slots[idx].changed {
            // The handler re-armed or cleared its own timer; the list is
            // already consistent.
            return true;
        }
        let _ = self.list.remove(&mut self.slots, idx as u8);
        self.slots[idx].in_use = false;
        if self.slots[idx].period > 0 {
            let period = self.slots[idx].period;
            self.set_timer_internal(self.last_tick, user, period, period);
            if self.list.head() == Some(idx as u8) {
                self.set_service_timer = true;
                self.walking = false;
                return false;
            }
        }
        true
    }

    /// Reports the remaining time of the head timer after a service pass so
    /// the host can arm a wake-up timer for long sleeps. Returns `None`
    /// when no hint is due. Without a registered hook this re-arms the
    /// service event instead and always returns `None`.
    pub fn check_for_next_service(&mut self, scd: &mut Scheduler, now: u16) -> Option<u16> {
        if !self.delayed_service_enabled {
            self.trigger_service(scd);
            return None;
        }
        if !self.set_service_timer {
            return None;
        }
        self.set_service_timer = false;
        let head = self.list.head()?;
        let diff = now.wrapping_sub(self.last_tick);
        let delta = self.slots[head as usize].delta;
        if diff >= delta {
            Some(1)
        } else {
            Some(delta - diff)
        }
    }

    fn set_timer_internal(&mut self, now: u16, user: TimerUser, elapse: u16, period: u16) {
        let Some(idx) = self.slot_of_or_free(user) else {
            debug_assert!(false, "timer pool exhausted");
            return;
        };
        {
            let slot = &mut self.slots[idx];
            slot.user = user;
            slot.changed = true;
            slot.in_use = true;
            slot.period = period;
            slot.delta = elapse;
        }
        if self.list.is_empty() {
            self.list.insert_head(&mut self.slots, idx as u8);
            self.last_tick = now;
            return;
        }
        // Delta is measured from the last service snapshot, so account for
        // the ticks that already passed since then.
        let offset = now.wrapping_sub(self.last_tick);
        self.slots[idx].delta = self.slots[idx].delta.wrapping_add(offset);
        let mut new_delta = self.slots[idx].delta;
        let at = self.list.foreach(&mut self.slots, |slot, _| {
            if slot.delta <= new_delta {
                new_delta -= slot.delta;
                false
            } else {
                slot.delta -= new_delta;
                true
            }
        });
        self.slots[idx].delta = new_delta;
        match at {
            Some(at) => self.list.insert_before(&mut self.slots, at, idx as u8),
            None => self.list.insert_tail(&mut self.slots, idx as u8),
        }
    }

    fn slot_of(&self, user: TimerUser) -> Option<usize> {
        self.slots.iter().position(|s| s.in_use && s.user == user)
    }

    fn slot_of_or_free(&self, user: TimerUser) -> Option<usize> {
        self.slot_of(user)
            .or_else(|| self.slots.iter().position(|s| !s.in_use))
    }

    #[cfg(test)]
    pub(crate) fn head_delta(&self) -> Option<u16> {
        self.list.head().map(|i| self.slots[i as usize].delta)
    }
}
