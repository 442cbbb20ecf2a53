//! Drawable leaf of the scene graph
//!
//! A [`Geometry`] owns its attribute arrays, primitive sets and textures, so
//! it also owns their GPU objects. The render technique is created on the
//! first draw from the program cache of the device it is drawn with.

use std::collections::BTreeMap;

use crate::bounding::{BoundingBox, BoundingSphere};
use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4};
use crate::foundation::uuid::Uuid;
use crate::gpu::{
    GpuObject, GpuObjectList, GraphicsDevice, Vec2Array, Vec3Array, Vec4Array, COLOR, NORMAL,
    POSITION, TEXCOORD,
};
use crate::render::{PrimitiveSet, RenderContext, RenderInfo, RenderTechnique, Texture};

use super::Transformable;

/// Vertex data, primitives, textures and technique of one drawable
#[derive(Debug)]
pub struct Geometry {
    name: String,
    uuid: Uuid,
    mv: Mat4,
    dirty: bool,
    vertices: Vec3Array,
    normals: Vec3Array,
    colors: Vec4Array,
    texcoords: Vec2Array,
    primitive_sets: Vec<PrimitiveSet>,
    textures: BTreeMap<u32, Texture>,
    technique: Option<RenderTechnique>,
    bounding_sphere: BoundingSphere,
    dirty_bounding: bool,
    retired_sets: Vec<PrimitiveSet>,
    retired_textures: Vec<Texture>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            name: String::new(),
            uuid: Uuid::new_v4(),
            mv: Mat4::identity(),
            dirty: true,
            vertices: Vec3Array::with_index(POSITION),
            normals: Vec3Array::with_index(NORMAL),
            colors: Vec4Array::with_index(COLOR),
            texcoords: Vec2Array::with_index(TEXCOORD),
            primitive_sets: Vec::new(),
            textures: BTreeMap::new(),
            technique: None,
            bounding_sphere: BoundingSphere::invalid(),
            dirty_bounding: true,
            retired_sets: Vec::new(),
            retired_textures: Vec::new(),
        }
    }
}

impl Clone for Geometry {
    /// Deep copy that shares no GPU objects and recomputes its bounds
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            uuid: self.uuid,
            mv: self.mv,
            dirty: true,
            vertices: self.vertices.clone(),
            normals: self.normals.clone(),
            colors: self.colors.clone(),
            texcoords: self.texcoords.clone(),
            primitive_sets: self.primitive_sets.clone(),
            textures: self.textures.clone(),
            technique: self.technique.clone(),
            bounding_sphere: BoundingSphere::invalid(),
            dirty_bounding: true,
            retired_sets: Vec::new(),
            retired_textures: Vec::new(),
        }
    }
}

impl Transformable for Geometry {
    fn mv(&self) -> &Mat4 {
        &self.mv
    }

    fn set_mv(&mut self, mv: Mat4) {
        self.mv = mv;
        self.dirty_bounding = true;
    }
}

impl Geometry {
    /// Empty geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty geometry with a name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name used for lookups
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Unique identifier
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Positions
    pub fn vertices(&self) -> &Vec3Array {
        &self.vertices
    }

    /// Positions, for editing; invalidates the bounds
    pub fn vertices_mut(&mut self) -> &mut Vec3Array {
        self.dirty_bounding = true;
        &mut self.vertices
    }

    /// Replace the positions
    pub fn set_vertices(&mut self, vertices: Vec<Vec3>) {
        self.vertices_mut().set(vertices);
    }

    /// Normals
    pub fn normals(&self) -> &Vec3Array {
        &self.normals
    }

    /// Normals, for editing
    pub fn normals_mut(&mut self) -> &mut Vec3Array {
        &mut self.normals
    }

    /// Replace the normals
    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        self.normals.set(normals);
    }

    /// Per-vertex colours
    pub fn colors(&self) -> &Vec4Array {
        &self.colors
    }

    /// Per-vertex colours, for editing
    pub fn colors_mut(&mut self) -> &mut Vec4Array {
        &mut self.colors
    }

    /// Replace the colours
    pub fn set_colors(&mut self, colors: Vec<Vec4>) {
        self.colors.set(colors);
    }

    /// Texture coordinates
    pub fn texcoords(&self) -> &Vec2Array {
        &self.texcoords
    }

    /// Texture coordinates, for editing
    pub fn texcoords_mut(&mut self) -> &mut Vec2Array {
        &mut self.texcoords
    }

    /// Replace the texture coordinates
    pub fn set_texcoords(&mut self, texcoords: Vec<Vec2>) {
        self.texcoords.set(texcoords);
    }

    /// Append a primitive set
    pub fn add_primitive_set(&mut self, set: impl Into<PrimitiveSet>) {
        self.primitive_sets.push(set.into());
    }

    /// Replace every primitive set with `set`
    pub fn set_primitive_set(&mut self, set: impl Into<PrimitiveSet>) {
        self.clear_primitive_sets();
        self.primitive_sets.push(set.into());
    }

    /// Primitive set at `index`
    pub fn primitive_set(&self, index: usize) -> Option<&PrimitiveSet> {
        self.primitive_sets.get(index)
    }

    /// Primitive set at `index`, for editing
    pub fn primitive_set_mut(&mut self, index: usize) -> Option<&mut PrimitiveSet> {
        self.primitive_sets.get_mut(index)
    }

    /// All primitive sets in draw order
    pub fn primitive_sets(&self) -> &[PrimitiveSet] {
        &self.primitive_sets
    }

    /// Remove the primitive set at `index`; its buffer is freed on the next draw
    pub fn remove_primitive_set(&mut self, index: usize) -> bool {
        if index >= self.primitive_sets.len() {
            return false;
        }
        let set = self.primitive_sets.remove(index);
        self.retired_sets.push(set);
        true
    }

    /// Remove every primitive set
    pub fn clear_primitive_sets(&mut self) {
        self.retired_sets.append(&mut self.primitive_sets);
    }

    /// Number of primitive sets
    pub fn num_primitive_sets(&self) -> usize {
        self.primitive_sets.len()
    }

    /// Put a texture on `unit`, replacing what was there
    pub fn set_texture(&mut self, unit: u32, mut texture: Texture) {
        texture.set_unit(unit);
        if let Some(old) = self.textures.insert(unit, texture) {
            self.retired_textures.push(old);
        }
    }

    /// Texture on `unit`
    pub fn texture(&self, unit: u32) -> Option<&Texture> {
        self.textures.get(&unit)
    }

    /// Texture on `unit`, for editing
    pub fn texture_mut(&mut self, unit: u32) -> Option<&mut Texture> {
        self.textures.get_mut(&unit)
    }

    /// Textures by unit
    pub fn textures(&self) -> impl Iterator<Item = (u32, &Texture)> {
        self.textures.iter().map(|(unit, texture)| (*unit, texture))
    }

    /// Remove the texture on `unit`
    pub fn remove_texture(&mut self, unit: u32) -> bool {
        match self.textures.remove(&unit) {
            Some(texture) => {
                self.retired_textures.push(texture);
                true
            }
            None => false,
        }
    }

    /// Remove every texture
    pub fn clear_textures(&mut self) {
        let textures = std::mem::take(&mut self.textures);
        self.retired_textures.extend(textures.into_values());
    }

    /// Technique, once one is set or the geometry has been drawn
    pub fn technique(&self) -> Option<&RenderTechnique> {
        self.technique.as_ref()
    }

    /// Technique, for editing uniforms
    pub fn technique_mut(&mut self) -> Option<&mut RenderTechnique> {
        self.technique.as_mut()
    }

    /// Draw with `technique` from now on
    pub fn set_technique(&mut self, technique: RenderTechnique) {
        self.technique = Some(technique);
    }

    /// Force every GPU object to re-upload on the next draw
    pub fn dirty(&mut self) {
        self.dirty = true;
    }

    /// True when the next draw re-uploads everything
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute the bounding sphere on next access
    pub fn dirty_bounding(&mut self) {
        self.dirty_bounding = true;
    }

    /// Object-space box of the positions
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter())
    }

    /// Bounding sphere in the space of the owning node
    ///
    /// Built from the two extreme corners of the object-space box after the
    /// local transform, not from every vertex, so rotated geometry gets a
    /// loose bound.
    pub fn compute_bounding_sphere(&self) -> BoundingSphere {
        let mut sphere = BoundingSphere::invalid();
        if self.vertices.is_empty() {
            return sphere;
        }
        let bounds = self.bounding_box();
        sphere.expand_by_point(&self.mv.project_point(bounds.min()));
        sphere.expand_by_point(&self.mv.project_point(bounds.max()));
        sphere
    }

    /// Cached bounding sphere, recomputed when dirty or invalid
    pub fn bounding_sphere(&mut self) -> BoundingSphere {
        if self.dirty_bounding || !self.bounding_sphere.valid() {
            self.bounding_sphere = self.compute_bounding_sphere();
            self.dirty_bounding = false;
        }
        self.bounding_sphere
    }

    fn dirty_gpu_objects(&mut self) {
        self.vertices.dirty();
        self.normals.dirty();
        self.colors.dirty();
        self.texcoords.dirty();
        for set in &mut self.primitive_sets {
            set.dirty();
        }
        for (unit, texture) in &mut self.textures {
            texture.set_unit(*unit);
            texture.dirty();
        }
    }

    /// GPU objects in draw order: textures, attributes, then primitive sets
    fn gpu_objects(&mut self) -> GpuObjectList<'_> {
        let mut objects = GpuObjectList::new();
        for texture in self.textures.values_mut() {
            objects.push(texture);
        }
        objects.push(&mut self.vertices);
        objects.push(&mut self.normals);
        objects.push(&mut self.colors);
        objects.push(&mut self.texcoords);
        for set in &mut self.primitive_sets {
            objects.push(set);
        }
        objects
    }

    fn release_retired(&mut self, device: &mut dyn GraphicsDevice) {
        for mut set in self.retired_sets.drain(..) {
            set.release(device);
        }
        for mut texture in self.retired_textures.drain(..) {
            texture.release(device);
        }
    }

    /// Draw with the matrices and viewport in `info`
    ///
    /// Applies the technique, re-uploads everything if the geometry is dirty,
    /// then binds and unbinds every GPU object in order.
    pub fn render(&mut self, info: &RenderInfo, ctx: &mut RenderContext<'_>) {
        self.release_retired(ctx.device);

        let has_color = !self.colors.is_empty();
        let has_texture = !self.texcoords.is_empty();
        let technique = self
            .technique
            .get_or_insert_with(|| RenderTechnique::default_shading(ctx.programs));
        technique.apply(ctx, info, has_color, has_texture);

        if self.dirty {
            self.dirty_gpu_objects();
            self.dirty = false;
        }

        self.gpu_objects().render(ctx.device);
    }

    /// Free every GPU object; the next draw recreates them
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        self.release_retired(device);
        self.gpu_objects().release(device);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DeviceCall, PrimitiveMode, RecordingDevice};
    use crate::render::{DrawArrays, DrawElements, Image, ProgramCache};
    use crate::scene::Transformable;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn triangle() -> Geometry {
        let mut geometry = Geometry::with_name("triangle");
        geometry.set_vertices(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        geometry.add_primitive_set(DrawElements::<u32>::from_indices(PrimitiveMode::Triangles, vec![0, 1, 2]));
        geometry
    }

    fn draw(geometry: &mut Geometry, device: &mut RecordingDevice, programs: &mut ProgramCache) {
        let mut ctx = RenderContext::new(device, programs);
        geometry.render(&RenderInfo::default(), &mut ctx);
    }

    #[test]
    fn test_triangle_bounds() {
        let mut geometry = triangle();
        let bounds = geometry.bounding_box();
        assert_eq!(*bounds.min(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(*bounds.max(), Vec3::new(1.0, 1.0, 0.0));

        let sphere = geometry.bounding_sphere();
        assert_relative_eq!(sphere.center(), Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-4);
        assert_relative_eq!(sphere.radius(), 0.707, epsilon = 1e-3);
    }

    #[test]
    fn test_bounds_follow_transform_and_edits() {
        let mut geometry = triangle();
        geometry.bounding_sphere();
        geometry.translate(&Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(geometry.bounding_sphere().center(), Vec3::new(10.5, 0.5, 0.0), epsilon = 1e-4);

        geometry.vertices_mut().push(Vec3::new(0.0, 0.0, 2.0));
        let sphere = geometry.bounding_sphere();
        assert_relative_eq!(sphere.center(), Vec3::new(10.5, 0.5, 1.0), epsilon = 1e-4);
    }

    #[test]
    fn test_rotated_bound_uses_box_corners_only() {
        let mut geometry = triangle();
        geometry.rotate(std::f32::consts::FRAC_PI_2, &Vec3::z());
        let sphere = geometry.bounding_sphere();
        // corners (0,0,0) and (1,1,0) land on (0,0,0) and (-1,1,0)
        assert_relative_eq!(sphere.center(), Vec3::new(-0.5, 0.5, 0.0), epsilon = 1e-4);
        assert_relative_eq!(sphere.radius(), 0.707, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_geometry_has_invalid_bound() {
        let mut geometry = Geometry::new();
        assert!(!geometry.bounding_sphere().valid());
        assert!(!geometry.bounding_box().valid());
    }

    #[test]
    fn test_render_uploads_once() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();

        draw(&mut geometry, &mut device, &mut programs);
        assert!(geometry.technique().is_some());
        assert!(!geometry.is_dirty());
        // vertices + element buffer; empty normals, colours and texcoords skip
        assert_eq!(device.stats().buffer_uploads, 2);
        assert_eq!(device.stats().draw_calls, 1);

        draw(&mut geometry, &mut device, &mut programs);
        assert_eq!(device.stats().buffer_uploads, 2);
        assert_eq!(device.stats().draw_calls, 2);
        assert_eq!(programs.len(), 1);
    }

    #[test]
    fn test_dirty_reuploads_everything() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();
        draw(&mut geometry, &mut device, &mut programs);

        geometry.dirty();
        draw(&mut geometry, &mut device, &mut programs);
        assert_eq!(device.stats().buffer_uploads, 4);
    }

    #[test]
    fn test_draw_order_textures_first() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();
        let image = Rc::new(Image::from_rgba8(1, 1, vec![0, 0, 0, 255]));
        geometry.set_texture(1, Texture::from_image(image));
        draw(&mut geometry, &mut device, &mut programs);

        let texture_at = device.calls().iter().position(|c| matches!(c, DeviceCall::TextureImage { .. }));
        let buffer_at = device.calls().iter().position(|c| matches!(c, DeviceCall::BufferData { .. }));
        assert!(texture_at.unwrap() < buffer_at.unwrap());
        assert_eq!(geometry.texture(1).unwrap().unit(), 1);
    }

    #[test]
    fn test_removed_sets_released_on_next_draw() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();
        draw(&mut geometry, &mut device, &mut programs);
        assert_eq!(device.stats().live_buffers, 2);

        geometry.set_primitive_set(DrawArrays::new(PrimitiveMode::Points, 0, 3));
        draw(&mut geometry, &mut device, &mut programs);
        assert_eq!(device.stats().live_buffers, 1);
        assert!(!geometry.remove_primitive_set(4));
    }

    #[test]
    fn test_release_frees_everything() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();
        draw(&mut geometry, &mut device, &mut programs);

        geometry.release(&mut device);
        geometry.release(&mut device);
        assert_eq!(device.stats().live_buffers, 0);
        assert!(geometry.is_dirty());
    }

    #[test]
    fn test_clone_is_fully_dirty() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut geometry = triangle();
        draw(&mut geometry, &mut device, &mut programs);
        geometry.bounding_sphere();

        let mut copy = geometry.clone();
        assert!(copy.is_dirty());
        assert!(copy.vertices().handle().is_none());
        assert_eq!(copy.vertices().len(), 3);
        assert_eq!(copy.uuid(), geometry.uuid());

        copy.vertices_mut().clear();
        assert_eq!(geometry.vertices().len(), 3);
        assert!(!copy.bounding_sphere().valid());
    }
}
