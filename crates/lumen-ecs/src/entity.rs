//! Actor identifiers and slot allocation.
//!
//! An [`EntityId`] packs a *generation* in the high 32 bits and a slot
//! *index* in the low 32 bits. Destroying an actor bumps the generation of
//! its slot, so every id handed out before the destruction becomes stale and
//! fails lookups instead of aliasing whatever actor reuses the slot.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational actor identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SlotMeta {
    generation: u32,
    alive: bool,
}

/// Hands out [`EntityId`]s and recycles the slots of destroyed actors.
///
/// Freed slots are reused in FIFO order so a single hot slot does not burn
/// through its generations.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<SlotMeta>,
    free: VecDeque<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id, reusing a freed slot when one is available.
    pub fn allocate(&mut self) -> EntityId {
        self.alive_count += 1;
        if let Some(index) = self.free.pop_front() {
            let meta = &mut self.slots[index as usize];
            meta.alive = true;
            return EntityId::new(index, meta.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(SlotMeta {
            generation: 0,
            alive: true,
        });
        EntityId::new(index, 0)
    }

    /// Release `id`, invalidating every outstanding copy of it.
    ///
    /// Returns `false` if the id was already stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let meta = &mut self.slots[id.index() as usize];
        meta.alive = false;
        meta.generation = meta.generation.wrapping_add(1);
        self.free.push_back(id.index());
        self.alive_count -= 1;
        true
    }

    /// Whether `id` names a slot that is allocated at the same generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|meta| meta.alive && meta.generation == id.generation())
    }

    /// Number of currently allocated ids.
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Number of slots ever created (allocated or free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_while_alive() {
        let mut alloc = EntityAllocator::new();
        let mut indices: Vec<u32> = (0..64).map(|_| alloc.allocate().index()).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 64);
        assert_eq!(alloc.alive_count(), 64);
    }

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.deallocate(first));
        let second = alloc.allocate();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), first.generation() + 1);
        assert!(!alloc.is_alive(first));
        assert!(alloc.is_alive(second));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let id = alloc.allocate();
        assert!(alloc.deallocate(id));
        assert!(!alloc.deallocate(id));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn unknown_index_is_not_alive() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(EntityId::new(3, 0)));
    }

    #[test]
    fn display_shows_index_and_generation() {
        let id = EntityId::new(42, 7);
        assert_eq!(id.to_string(), "42v7");
        assert_eq!(format!("{id:?}"), "EntityId(42v7)");
    }
}
