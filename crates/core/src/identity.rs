//! Per-run identity tracking.
//!
//! Remembers which actor and object identities have already been declared
//! in the current run so each identity's literal is emitted exactly once.
//! A tracker belongs to one driver invocation and is dropped with it.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct IdentityTracker {
    seen_actors: HashSet<String>,
    seen_objects: HashSet<String>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new_actor(&self, actor_id: &str) -> bool {
        !self.seen_actors.contains(actor_id)
    }

    pub fn is_new_object(&self, object_id: &str) -> bool {
        !self.seen_objects.contains(object_id)
    }

    /// Returns `true` if the actor was not seen before.
    pub fn mark_actor(&mut self, actor_id: &str) -> bool {
        if self.seen_actors.contains(actor_id) {
            return false;
        }
        self.seen_actors.insert(actor_id.to_string())
    }

    /// Returns `true` if the object was not seen before.
    pub fn mark_object(&mut self, object_id: &str) -> bool {
        if self.seen_objects.contains(object_id) {
            return false;
        }
        self.seen_objects.insert(object_id.to_string())
    }

    /// Number of distinct actors declared so far.
    pub fn actors(&self) -> usize {
        self.seen_actors.len()
    }

    /// Number of distinct objects declared so far.
    pub fn objects(&self) -> usize {
        self.seen_objects.len()
    }
}
