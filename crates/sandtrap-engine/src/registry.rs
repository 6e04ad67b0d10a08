//! Membership Registry
//!
//! Two independent sets: the processes being monitored, and the handles
//! whose close must trigger evidence capture. Handle values are only
//! unique within one process, so handle entries are keyed by
//! `(process, handle)`.
//!
//! # Locking
//! - Process set: [`spin::RwLock`], read on every intercepted call,
//!   written only when the externally managed process list changes.
//! - Handle set: [`spin::Mutex`]. Mark, query and take are each a single
//!   critical section, so a mark racing an unmark on the same key ends in
//!   exactly one of the two states.

use alloc::collections::BTreeSet;

use sandtrap_common::{Handle, ProcessId};
use spin::{Mutex, RwLock};

#[derive(Debug, Default)]
pub struct Registry {
    processes: RwLock<BTreeSet<ProcessId>>,
    handles: Mutex<BTreeSet<(ProcessId, Handle)>>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            processes: RwLock::new(BTreeSet::new()),
            handles: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn is_monitored(&self, pid: ProcessId) -> bool {
        self.processes.read().contains(&pid)
    }

    /// Start monitoring `pid`; returns false if it was already monitored
    pub fn add_process(&self, pid: ProcessId) -> bool {
        self.processes.write().insert(pid)
    }

    /// Stop monitoring `pid` and forget every handle marked in it
    pub fn remove_process(&self, pid: ProcessId) -> bool {
        let removed = self.processes.write().remove(&pid);
        self.handles.lock().retain(|(owner, _)| *owner != pid);
        removed
    }

    pub fn monitored_count(&self) -> usize {
        self.processes.read().len()
    }

    /// Flag `handle` for evidence capture on close
    pub fn mark_for_dump(&self, pid: ProcessId, handle: Handle) -> bool {
        self.handles.lock().insert((pid, handle))
    }

    pub fn is_marked(&self, pid: ProcessId, handle: Handle) -> bool {
        self.handles.lock().contains(&(pid, handle))
    }

    /// Remove the mark; true only for the caller that actually removed it
    pub fn unmark(&self, pid: ProcessId, handle: Handle) -> bool {
        self.handles.lock().remove(&(pid, handle))
    }

    pub fn marked_count(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn clear(&self) {
        self.processes.write().clear();
        self.handles.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_membership() {
        let registry = Registry::new();
        assert!(!registry.is_monitored(ProcessId(4242)));

        assert!(registry.add_process(ProcessId(4242)));
        assert!(!registry.add_process(ProcessId(4242)));
        assert!(registry.is_monitored(ProcessId(4242)));
        assert!(!registry.is_monitored(ProcessId(4243)));

        assert!(registry.remove_process(ProcessId(4242)));
        assert!(!registry.is_monitored(ProcessId(4242)));
        assert!(!registry.remove_process(ProcessId(4242)));
    }

    #[test]
    fn handles_are_scoped_to_their_process() {
        let registry = Registry::new();
        registry.mark_for_dump(ProcessId(1), Handle(0x40));

        assert!(registry.is_marked(ProcessId(1), Handle(0x40)));
        assert!(!registry.is_marked(ProcessId(2), Handle(0x40)));
    }

    #[test]
    fn unmark_takes_once() {
        let registry = Registry::new();
        registry.mark_for_dump(ProcessId(1), Handle(0x40));

        assert!(registry.unmark(ProcessId(1), Handle(0x40)));
        assert!(!registry.unmark(ProcessId(1), Handle(0x40)));
        assert!(!registry.is_marked(ProcessId(1), Handle(0x40)));
    }

    #[test]
    fn removing_a_process_purges_its_handles() {
        let registry = Registry::new();
        registry.add_process(ProcessId(1));
        registry.mark_for_dump(ProcessId(1), Handle(0x40));
        registry.mark_for_dump(ProcessId(2), Handle(0x40));

        registry.remove_process(ProcessId(1));

        assert_eq!(registry.marked_count(), 1);
        assert!(registry.is_marked(ProcessId(2), Handle(0x40)));
    }

    #[test]
    fn clear_empties_both_sets() {
        let registry = Registry::new();
        registry.add_process(ProcessId(1));
        registry.mark_for_dump(ProcessId(1), Handle(0x40));

        registry.clear();

        assert_eq!(registry.monitored_count(), 0);
        assert_eq!(registry.marked_count(), 0);
    }
}
