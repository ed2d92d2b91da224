//! CPU-side scene state ferried into GPU memory each frame.
//!
//! [`SceneState`] owns the current values of the constant blocks and the
//! dirty bookkeeping that bounds how often they are re-copied. With K frame
//! slots, a value changed once on the CPU must be re-copied into each
//! slot's region exactly once, since every slot holds an independent,
//! not-yet-overwritten copy. Each item therefore carries a "frames still
//! dirty" counter initialized to K and reset to K on every change;
//! [`FrameProducer::populate`](crate::frame::FrameProducer::populate)
//! decrements it per slot visit, so copies stop as soon as all slots are
//! current.

use crate::types::{Mat4, MaterialConstants, ObjectConstants, PassConstants, MAT4_IDENTITY};

/// One renderable item's CPU-side state.
pub struct RenderItem {
    world: Mat4,
    tex_transform: Mat4,
    object_index: u32,
    frames_dirty: u32,
}

impl RenderItem {
    fn new(world: Mat4, tex_transform: Mat4, object_index: u32, frames_in_flight: u32) -> Self {
        Self {
            world,
            tex_transform,
            object_index,
            // New items are dirty everywhere: no slot holds them yet.
            frames_dirty: frames_in_flight,
        }
    }

    /// Object-to-world transform.
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Texture transform.
    pub fn tex_transform(&self) -> &Mat4 {
        &self.tex_transform
    }

    /// Index of this item's element in each slot's object region.
    pub fn object_index(&self) -> u32 {
        self.object_index
    }

    /// How many slots still hold a stale copy of this item.
    pub fn frames_dirty(&self) -> u32 {
        self.frames_dirty
    }

    /// The constant block to upload for this item.
    pub fn object_constants(&self) -> ObjectConstants {
        ObjectConstants {
            world: self.world,
            tex_transform: self.tex_transform,
        }
    }

    pub(crate) fn mark_copied(&mut self) {
        self.frames_dirty -= 1;
    }
}

/// One material's CPU-side state.
pub struct MaterialSlot {
    constants: MaterialConstants,
    material_index: u32,
    frames_dirty: u32,
}

impl MaterialSlot {
    fn new(constants: MaterialConstants, material_index: u32, frames_in_flight: u32) -> Self {
        Self {
            constants,
            material_index,
            frames_dirty: frames_in_flight,
        }
    }

    /// Current material constants.
    pub fn constants(&self) -> &MaterialConstants {
        &self.constants
    }

    /// Index of this material's element in each slot's material region.
    pub fn material_index(&self) -> u32 {
        self.material_index
    }

    /// How many slots still hold a stale copy of this material.
    pub fn frames_dirty(&self) -> u32 {
        self.frames_dirty
    }

    pub(crate) fn mark_copied(&mut self) {
        self.frames_dirty -= 1;
    }
}

/// The scene values the frame producer copies into upload regions.
///
/// Knows the frames-in-flight count so dirty counters are initialized and
/// reset consistently; the count is injected here instead of living in a
/// process-wide global.
pub struct SceneState {
    frames_in_flight: u32,
    passes: Vec<PassConstants>,
    items: Vec<RenderItem>,
    materials: Vec<MaterialSlot>,
}

impl SceneState {
    /// Create an empty scene for a ring of `frames_in_flight` slots.
    pub fn new(frames_in_flight: usize) -> Self {
        assert!(frames_in_flight > 0, "frames_in_flight must be at least 1");
        Self {
            frames_in_flight: frames_in_flight as u32,
            passes: Vec::new(),
            items: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// The frames-in-flight count dirty counters are tied to.
    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    /// Append a pass constant block; returns its pass index.
    pub fn push_pass(&mut self, constants: PassConstants) -> usize {
        self.passes.push(constants);
        self.passes.len() - 1
    }

    /// Overwrite a pass constant block. Pass data is recomputed and
    /// re-uploaded every frame, so no dirty tracking applies.
    pub fn set_pass(&mut self, index: usize, constants: PassConstants) {
        self.passes[index] = constants;
    }

    /// All pass constant blocks, in pass-index order.
    pub fn passes(&self) -> &[PassConstants] {
        &self.passes
    }

    /// Add an item with the given transforms; returns its object index.
    pub fn add_item(&mut self, world: Mat4, tex_transform: Mat4) -> usize {
        let index = self.items.len();
        self.items.push(RenderItem::new(
            world,
            tex_transform,
            index as u32,
            self.frames_in_flight,
        ));
        index
    }

    /// Add an item with identity transforms; returns its object index.
    pub fn add_identity_item(&mut self) -> usize {
        self.add_item(MAT4_IDENTITY, MAT4_IDENTITY)
    }

    /// Change an item's world transform, marking it dirty for every slot.
    pub fn set_item_world(&mut self, index: usize, world: Mat4) {
        let item = &mut self.items[index];
        item.world = world;
        item.frames_dirty = self.frames_in_flight;
    }

    /// Change an item's texture transform, marking it dirty for every slot.
    pub fn set_item_tex_transform(&mut self, index: usize, tex_transform: Mat4) {
        let item = &mut self.items[index];
        item.tex_transform = tex_transform;
        item.frames_dirty = self.frames_in_flight;
    }

    /// Look up an item.
    pub fn item(&self, index: usize) -> &RenderItem {
        &self.items[index]
    }

    /// All items.
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [RenderItem] {
        &mut self.items
    }

    /// Add a material; returns its material index.
    pub fn add_material(&mut self, constants: MaterialConstants) -> usize {
        let index = self.materials.len();
        self.materials.push(MaterialSlot::new(
            constants,
            index as u32,
            self.frames_in_flight,
        ));
        index
    }

    /// Change a material's constants, marking it dirty for every slot.
    pub fn set_material(&mut self, index: usize, constants: MaterialConstants) {
        let material = &mut self.materials[index];
        material.constants = constants;
        material.frames_dirty = self.frames_in_flight;
    }

    /// Look up a material.
    pub fn material(&self, index: usize) -> &MaterialSlot {
        &self.materials[index]
    }

    /// All materials.
    pub fn materials(&self) -> &[MaterialSlot] {
        &self.materials
    }

    pub(crate) fn materials_mut(&mut self) -> &mut [MaterialSlot] {
        &mut self.materials
    }
}

impl std::fmt::Debug for SceneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneState")
            .field("frames_in_flight", &self.frames_in_flight)
            .field("passes", &self.passes.len())
            .field("items", &self.items.len())
            .field("materials", &self.materials.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_items_start_fully_dirty() {
        let mut scene = SceneState::new(3);
        let index = scene.add_identity_item();
        assert_eq!(scene.item(index).frames_dirty(), 3);
    }

    #[test]
    fn test_mutation_resets_dirty_counter() {
        let mut scene = SceneState::new(3);
        let index = scene.add_identity_item();

        scene.items_mut()[index].mark_copied();
        scene.items_mut()[index].mark_copied();
        assert_eq!(scene.item(index).frames_dirty(), 1);

        let mut world = MAT4_IDENTITY;
        world[3][0] = 5.0;
        scene.set_item_world(index, world);
        assert_eq!(scene.item(index).frames_dirty(), 3);
        assert_eq!(scene.item(index).world()[3][0], 5.0);
    }

    #[test]
    fn test_object_indices_are_assigned_in_order() {
        let mut scene = SceneState::new(2);
        assert_eq!(scene.add_identity_item(), 0);
        assert_eq!(scene.add_identity_item(), 1);
        assert_eq!(scene.item(1).object_index(), 1);
    }

    #[test]
    fn test_material_dirty_tracking() {
        let mut scene = SceneState::new(2);
        let index = scene.add_material(MaterialConstants::default());
        assert_eq!(scene.material(index).frames_dirty(), 2);

        scene.materials_mut()[index].mark_copied();
        scene.materials_mut()[index].mark_copied();
        assert_eq!(scene.material(index).frames_dirty(), 0);

        scene.set_material(index, MaterialConstants::default());
        assert_eq!(scene.material(index).frames_dirty(), 2);
    }

    #[test]
    #[should_panic(expected = "frames_in_flight must be at least 1")]
    fn test_zero_frames_panics() {
        SceneState::new(0);
    }
}
