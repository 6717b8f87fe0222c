// Host save-state seam: the game's persisted variable table and the slot id
// that says which variable holds the kitten counter.

pub mod allocator;

pub use allocator::SlotAllocator;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the host game exposes of its save data.
///
/// `is_ready` is false until the host has finished building its variable
/// table; nothing may be read or written before that.
pub trait SaveState: Send {
    fn is_ready(&self) -> bool;
    fn kitten_slot(&self) -> Option<SlotId>;
    fn set_kitten_slot(&mut self, slot: SlotId);
    fn value(&self, id: u32) -> i64;
    fn set_value(&mut self, id: u32, value: i64);
}

/// In-memory save, serializable so hosts without their own format can persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySave {
    #[serde(skip, default = "loaded_save_is_ready")]
    ready: bool,
    kitten_slot: Option<SlotId>,
    variables: BTreeMap<u32, i64>,
}

fn loaded_save_is_ready() -> bool {
    true
}

impl Default for MemorySave {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySave {
    pub fn new() -> Self {
        Self {
            ready: true,
            kitten_slot: None,
            variables: BTreeMap::new(),
        }
    }

    /// A save whose host has not finished booting.
    pub fn uninitialized() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }
}

impl SaveState for MemorySave {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn kitten_slot(&self) -> Option<SlotId> {
        self.kitten_slot
    }

    fn set_kitten_slot(&mut self, slot: SlotId) {
        self.kitten_slot = Some(slot);
    }

    fn value(&self, id: u32) -> i64 {
        self.variables.get(&id).copied().unwrap_or(0)
    }

    fn set_value(&mut self, id: u32, value: i64) {
        self.variables.insert(id, value);
    }
}
