//! Cooperative scheduler.
//!
//! Holds a priority-ordered list of services. A service is a registered
//! component with a 32-bit event mask; firing a service means setting bits
//! in that mask. One scheduler pass walks the list in ascending priority
//! order (lower value runs earlier) and yields every service with a
//! non-empty mask exactly once; the service callback reads and clears the
//! bits it handles.

use ringcore_abi::SrvKind;
use ringcore_lib::{DlList, DlNode, HasNode, NIL};

/// Maximum number of registered services.
pub const SCD_MAX_SERVICES: usize = 8;

/// Empty event mask.
pub const SRV_EMPTY_EVENT_MASK: u32 = 0x0000_0000;

/// Scheduler registration errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedError {
    /// The service is already part of the scheduler.
    AlreadyListed,
    /// The service is not part of the scheduler.
    UnknownService,
    /// The service table is full.
    NoSlot,
}

#[derive(Clone, Copy)]
struct ServiceSlot {
    node: DlNode,
    kind: SrvKind,
    priority: u8,
    event_mask: u32,
    used: bool,
}

impl ServiceSlot {
    const fn empty() -> Self {
        ServiceSlot {
            node: DlNode::new(),
            // Placeholder; never read while `used` is false.
            kind: SrvKind::Timers,
            priority: 0,
            event_mask: SRV_EMPTY_EVENT_MASK,
            used: false,
        }
    }
}

impl HasNode for ServiceSlot {
    fn node(&self) -> &DlNode {
        &self.node
    }
    fn node_mut(&mut self) -> &mut DlNode {
        &mut self.node
    }
}

/// Priority-ordered service list with per-service event bitmasks.
pub struct Scheduler {
    slots: [ServiceSlot; SCD_MAX_SERVICES],
    list: DlList,
    /// True while a scheduler pass runs; suppresses service-request
    /// signalling from `set_event`.
    running: bool,
    /// Cursor of the in-progress pass.
    cursor: u8,
    /// An event was set outside a pass; the host should schedule another
    /// service call.
    request_pending: bool,
}

impl Scheduler {
    pub const fn new() -> Self {
        Scheduler {
            slots: [ServiceSlot::empty(); SCD_MAX_SERVICES],
            list: DlList::new(),
            running: false,
            cursor: NIL,
            request_pending: false,
        }
    }

    /// Adds a service. Services are arranged in ascending priority order;
    /// a service with a lower priority value executes earlier. Insertion
    /// among equal priorities is first-come-first-served.
    pub fn add_service(&mut self, kind: SrvKind, priority: u8) -> Result<(), SchedError> {
        if self.index_of(kind).is_some() {
            return Err(SchedError::AlreadyListed);
        }
        let free = self
            .slots
            .iter()
            .position(|s| !s.used)
            .ok_or(SchedError::NoSlot)? as u8;
        self.slots[free as usize] = ServiceSlot {
            node: DlNode::new(),
            kind,
            priority,
            event_mask: SRV_EMPTY_EVENT_MASK,
            used: true,
        };
        let at = self
            .list
            .foreach(&mut self.slots, |slot, _| slot.priority > priority);
        match at {
            Some(at) => self.list.insert_before(&mut self.slots, at, free),
            None => self.list.insert_tail(&mut self.slots, free),
        }
        Ok(())
    }

    /// Removes a service from the list.
    pub fn remove_service(&mut self, kind: SrvKind) -> Result<(), SchedError> {
        let idx = self.index_of(kind).ok_or(SchedError::UnknownService)?;
        self.list
            .remove(&mut self.slots, idx)
            .map_err(|_| SchedError::UnknownService)?;
        if self.cursor == idx {
            // The pass continues with the removed slot's stale links; abort
            // the walk like the original does when a running service
            // unlinks itself.
            self.cursor = NIL;
        }
        self.slots[idx as usize].used = false;
        self.slots[idx as usize].event_mask = SRV_EMPTY_EVENT_MASK;
        Ok(())
    }

    /// Sets event bits for the given service. Outside a scheduler pass this
    /// also raises the service request the host polls via
    /// [`Scheduler::take_request`].
    pub fn set_event(&mut self, kind: SrvKind, event_mask: u32) {
        if let Some(idx) = self.index_of(kind) {
            self.slots[idx as usize].event_mask |= event_mask;
            if !self.running {
                self.request_pending = true;
            }
        }
    }

    /// Current event mask of the given service.
    pub fn get_event(&self, kind: SrvKind) -> u32 {
        self.index_of(kind)
            .map(|idx| self.slots[idx as usize].event_mask)
            .unwrap_or(SRV_EMPTY_EVENT_MASK)
    }

    /// Clears event bits of the given service.
    pub fn clear_event(&mut self, kind: SrvKind, event_mask: u32) {
        if let Some(idx) = self.index_of(kind) {
            self.slots[idx as usize].event_mask &= !event_mask;
        }
    }

    /// True if any registered service has pending events.
    pub fn are_events_pending(&self) -> bool {
        let mut cur = self.list.head();
        while let Some(idx) = cur {
            if self.slots[idx as usize].event_mask != SRV_EMPTY_EVENT_MASK {
                return true;
            }
            cur = self.list.next(&self.slots, idx);
        }
        false
    }

    /// Consumes the service-request flag.
    pub fn take_request(&mut self) -> bool {
        core::mem::replace(&mut self.request_pending, false)
    }

    /// Opens a scheduler pass.
    pub fn begin(&mut self) {
        self.running = true;
        self.cursor = self.list.head().unwrap_or(NIL);
    }

    /// Next service of the pass with a non-empty event mask, in priority
    /// order. Each service is visited at most once per pass.
    pub fn next_pending(&mut self) -> Option<SrvKind> {
        while self.cursor != NIL {
            let idx = self.cursor;
            self.cursor = self.list.next(&self.slots, idx).unwrap_or(NIL);
            let slot = &self.slots[idx as usize];
            if slot.used && slot.event_mask != SRV_EMPTY_EVENT_MASK {
                return Some(slot.kind);
            }
        }
        None
    }

    /// Closes a scheduler pass.
    pub fn end(&mut self) {
        self.running = false;
        self.cursor = NIL;
    }

    fn index_of(&self, kind: SrvKind) -> Option<u8> {
        self.slots
            .iter()
            .position(|s| s.used && s.kind == kind)
            .map(|i| i as u8)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_low_value_first() {
        let mut scd = Scheduler::new();
        scd.add_service(SrvKind::Timers, 255).unwrap();
        scd.add_service(SrvKind::Routing, 250).unwrap();
        scd.set_event(SrvKind::Timers, 1);
        scd.set_event(SrvKind::Routing, 1);
        scd.begin();
        assert_eq!(scd.next_pending(), Some(SrvKind::Routing));
        assert_eq!(scd.next_pending(), Some(SrvKind::Timers));
        assert_eq!(scd.next_pending(), None);
        scd.end();
    }

    #[test]
    fn double_add_rejected() {
        let mut scd = Scheduler::new();
        scd.add_service(SrvKind::Timers, 255).unwrap();
        assert_eq!(
            scd.add_service(SrvKind::Timers, 1),
            Err(SchedError::AlreadyListed)
        );
        assert_eq!(
            scd.remove_service(SrvKind::Routing),
            Err(SchedError::UnknownService)
        );
        assert!(scd.remove_service(SrvKind::Timers).is_ok());
    }

    #[test]
    fn set_event_outside_pass_raises_request() {
        let mut scd = Scheduler::new();
        scd.add_service(SrvKind::Routing, 250).unwrap();
        assert!(!scd.take_request());
        scd.set_event(SrvKind::Routing, 2);
        assert!(scd.take_request());
        assert!(!scd.take_request());
        // Inside a pass the request stays silent.
        scd.begin();
        scd.set_event(SrvKind::Routing, 4);
        assert!(!scd.take_request());
        scd.end();
    }

    #[test]
    fn pass_visits_each_service_once() {
        let mut scd = Scheduler::new();
        scd.add_service(SrvKind::Routing, 250).unwrap();
        scd.add_service(SrvKind::Timers, 255).unwrap();
        scd.set_event(SrvKind::Routing, 1);
        scd.begin();
        assert_eq!(scd.next_pending(), Some(SrvKind::Routing));
        // An event set mid-pass for a service already visited is kept for
        // the next pass.
        scd.set_event(SrvKind::Routing, 1);
        assert_eq!(scd.next_pending(), None);
        scd.end();
        assert!(scd.are_events_pending());
    }
}
