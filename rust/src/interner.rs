//! Faculty and room name interning.
//!
//! The conflict tracker keys occupancy by small integers instead of strings.

use rustc_hash::FxHashMap;

/// Interned faculty or room id.
pub type EntityId = u32;

/// Maps entity names to dense integer ids.
#[derive(Debug, Clone, Default)]
pub struct EntityInterner {
    to_id: FxHashMap<String, EntityId>,
}

impl EntityInterner {
    /// Intern a name, returning the existing id if already known.
    pub fn intern(&mut self, name: &str) -> EntityId {
        if let Some(&id) = self.to_id.get(name) {
            return id;
        }
        let id = self.to_id.len() as EntityId;
        self.to_id.insert(name.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_id.is_empty()
    }
}
