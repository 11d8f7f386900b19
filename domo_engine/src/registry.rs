//! The shared program registry.
//!
//! Routing passes and the manager iterate a cloned snapshot of the list, so
//! concurrent add/remove never invalidates a traversal in flight. Insertion
//! order is the routing order.

use crate::record::ProgramRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Insertion-ordered collection of program records.
#[derive(Default)]
pub struct ProgramRegistry {
    programs: RwLock<Vec<Arc<ProgramRecord>>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a program (routing order = insertion order).
    pub fn insert(&self, program: Arc<ProgramRecord>) {
        self.programs.write().push(program);
    }

    /// Remove by address; returns the removed record if present.
    pub fn remove(&self, address: u32) -> Option<Arc<ProgramRecord>> {
        let mut programs = self.programs.write();
        let index = programs.iter().position(|p| p.address() == address)?;
        Some(programs.remove(index))
    }

    pub fn find(&self, address: u32) -> Option<Arc<ProgramRecord>> {
        self.programs
            .read()
            .iter()
            .find(|p| p.address() == address)
            .cloned()
    }

    /// Stable view for one routing or lifecycle pass.
    pub fn snapshot(&self) -> Vec<Arc<ProgramRecord>> {
        self.programs.read().clone()
    }

    /// Highest address currently registered.
    pub fn max_address(&self) -> Option<u32> {
        self.programs.read().iter().map(|p| p.address()).max()
    }

    pub fn len(&self) -> usize {
        self.programs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.read().is_empty()
    }
}
