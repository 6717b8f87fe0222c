use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SaveState, SlotId};
use crate::constants::{RESERVED_SLOT_IDS, SLOT_RANGE_END, SLOT_RANGE_START};
use crate::error::SyncError;

/// Picks the variable that holds the kitten counter for a save.
#[derive(Debug, Clone)]
pub struct SlotAllocator<R = StdRng> {
    rng: R,
}

impl SlotAllocator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SlotAllocator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SlotAllocator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Returns the save's slot, allocating one on first use.
    ///
    /// A fresh slot has its counter reset to 0. Nothing is touched while the
    /// host is not ready.
    pub fn allocate_or_restore<S: SaveState + ?Sized>(
        &mut self,
        save: &mut S,
    ) -> Result<SlotId, SyncError> {
        if !save.is_ready() {
            return Err(SyncError::NotReady);
        }
        if let Some(slot) = save.kitten_slot() {
            return Ok(slot);
        }

        let slot = self.draw();
        save.set_kitten_slot(slot);
        save.set_value(slot.0, 0);
        tracing::info!("Kitten counter allocated to variable {}", slot);
        Ok(slot)
    }

    fn draw(&mut self) -> SlotId {
        loop {
            let candidate = self.rng.random_range(SLOT_RANGE_START..=SLOT_RANGE_END);
            if !is_reserved(candidate) {
                return SlotId(candidate);
            }
        }
    }
}

pub fn is_reserved(id: u32) -> bool {
    RESERVED_SLOT_IDS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MemorySave;

    #[test]
    fn allocation_is_idempotent() {
        let mut allocator = SlotAllocator::seeded(7);
        let mut save = MemorySave::new();

        let first = allocator.allocate_or_restore(&mut save).unwrap();
        save.set_value(first.0, 12);
        let second = allocator.allocate_or_restore(&mut save).unwrap();

        assert_eq!(first, second);
        assert_eq!(save.value(first.0), 12);
    }

    #[test]
    fn never_allocates_reserved_ids() {
        for seed in 0..500 {
            let mut allocator = SlotAllocator::seeded(seed);
            let mut save = MemorySave::new();
            let slot = allocator.allocate_or_restore(&mut save).unwrap();
            assert!(!is_reserved(slot.0), "seed {} gave reserved {}", seed, slot);
            assert!((SLOT_RANGE_START..=SLOT_RANGE_END).contains(&slot.0));
        }
    }

    #[test]
    fn restored_save_keeps_its_slot() {
        let mut save = MemorySave::new();
        save.set_kitten_slot(SlotId(44));
        save.set_value(44, 5);

        let slot = SlotAllocator::seeded(1)
            .allocate_or_restore(&mut save)
            .unwrap();

        assert_eq!(slot, SlotId(44));
        assert_eq!(save.value(44), 5);
    }

    #[test]
    fn not_ready_has_no_side_effects() {
        let mut save = MemorySave::uninitialized();

        let result = SlotAllocator::seeded(1).allocate_or_restore(&mut save);

        assert_eq!(result, Err(SyncError::NotReady));
        assert_eq!(save.kitten_slot(), None);
    }

    #[test]
    fn fresh_slot_starts_at_zero() {
        let mut save = MemorySave::new();
        for id in SLOT_RANGE_START..=SLOT_RANGE_END {
            save.set_value(id, 3);
        }

        let slot = SlotAllocator::seeded(9)
            .allocate_or_restore(&mut save)
            .unwrap();

        assert_eq!(save.value(slot.0), 0);
    }
}
