//! The drawable registry and the renderer seam.
//!
//! Drawing components register `(draw_order, owner, component)` entries in
//! the world's [`DrawList`] and the world walks that list once per frame,
//! handing each drawable the owner's transform and the caller's
//! [`RenderTarget`]. Entries with equal draw order keep their registration
//! order, so back-to-front painting is stable across frames.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::entity::EntityId;
use crate::sorted::insert_sorted_stable;
use crate::transform::Transform;

/// Lower draw orders are painted first.
pub type DrawOrder = i32;

/// Opaque handle to a loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Whatever the renderer draws into.
pub trait RenderTarget {
    /// Draw a unit quad carrying `texture`, placed by `world_transform`.
    fn draw_quad(&mut self, texture: AssetId, world_transform: &Mat4);
}

/// A component that can render itself.
pub trait Drawable {
    fn draw(&self, owner: &Transform, target: &mut dyn RenderTarget);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEntry {
    pub draw_order: DrawOrder,
    pub owner: EntityId,
    pub component: ComponentId,
}

/// Registered drawables, ascending by draw order.
#[derive(Debug, Default)]
pub struct DrawList {
    entries: Vec<DrawEntry>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, draw_order: DrawOrder, owner: EntityId, component: ComponentId) {
        let entry = DrawEntry {
            draw_order,
            owner,
            component,
        };
        insert_sorted_stable(&mut self.entries, entry, |e| e.draw_order);
    }

    /// Remove an entry without disturbing the order of the rest.
    pub fn remove(&mut self, owner: EntityId, component: ComponentId) -> bool {
        match self
            .entries
            .iter()
            .position(|e| e.owner == owner && e.component == component)
        {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
