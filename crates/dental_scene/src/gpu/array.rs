//! Vertex attribute arrays
//!
//! [`Array`] is a growable container of attribute values that owns one GPU
//! buffer. Any mutation through its API marks the buffer for re-upload.

use std::ops::Deref;

use bytemuck::Pod;

use crate::foundation::math::{Vec2, Vec3, Vec4};

use super::device::{BufferHandle, BufferTarget, GraphicsDevice};
use super::object::{GpuObject, GpuState};

/// Attribute slot of vertex positions
pub const POSITION: u32 = 0;
/// Attribute slot of vertex normals
pub const NORMAL: u32 = 1;
/// Attribute slot of vertex colours
pub const COLOR: u32 = 2;
/// Attribute slot of texture coordinates
pub const TEXCOORD: u32 = 3;

/// Element type of an attribute array
pub trait AttributeElement: Pod {
    /// Float components per element
    const COMPONENTS: u32;
}

impl AttributeElement for f32 {
    const COMPONENTS: u32 = 1;
}

impl AttributeElement for Vec2 {
    const COMPONENTS: u32 = 2;
}

impl AttributeElement for Vec3 {
    const COMPONENTS: u32 = 3;
}

impl AttributeElement for Vec4 {
    const COMPONENTS: u32 = 4;
}

/// Array of 2D vectors
pub type Vec2Array = Array<Vec2>;
/// Array of 3D vectors
pub type Vec3Array = Array<Vec3>;
/// Array of 4D vectors
pub type Vec4Array = Array<Vec4>;

/// Attribute data plus its GPU buffer
#[derive(Debug)]
pub struct Array<T> {
    data: Vec<T>,
    index: Option<u32>,
    state: GpuState<BufferHandle>,
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            index: None,
            state: GpuState::Unallocated,
        }
    }
}

impl<T: Clone> Clone for Array<T> {
    /// Deep copy of the data; the copy has no GPU buffer of its own yet
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            index: self.index,
            state: GpuState::Unallocated,
        }
    }
}

impl<T> Deref for Array<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> Array<T> {
    /// Empty array without an attribute slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty array bound to an attribute slot
    pub fn with_index(index: u32) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    /// Array owning `data`
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Attribute slot, `None` when the array is not an attribute
    pub const fn index(&self) -> Option<u32> {
        self.index
    }

    /// Assign the attribute slot
    pub fn set_index(&mut self, index: Option<u32>) {
        self.index = index;
    }

    /// Read access to the data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the data; marks the buffer dirty
    pub fn data_mut(&mut self) -> &mut Vec<T> {
        self.state.mark_dirty();
        &mut self.data
    }

    /// Append one element
    pub fn push(&mut self, value: T) {
        self.data_mut().push(value);
    }

    /// Replace the data
    pub fn set(&mut self, data: Vec<T>) {
        *self.data_mut() = data;
    }

    /// Remove all elements
    pub fn clear(&mut self) {
        self.data_mut().clear();
    }

    /// Move the data out, leaving this array empty and dirty
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(self.data_mut())
    }

    /// Reserve capacity without touching the contents
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// GPU buffer handle, if created
    pub const fn handle(&self) -> Option<BufferHandle> {
        self.state.handle()
    }

    /// Residency state
    pub const fn state(&self) -> GpuState<BufferHandle> {
        self.state
    }
}

impl<T> Extend<T> for Array<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.data_mut().extend(iter);
    }
}

impl<T: AttributeElement> GpuObject for Array<T> {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.data.is_empty() {
            self.state.mark_clean();
            return;
        }

        let handle = match self.state.handle() {
            Some(handle) => handle,
            None => {
                let Some(handle) = device.create_buffer() else {
                    log::warn!("Failed to create attribute buffer, skipping draw");
                    return;
                };
                log::debug!("Created attribute buffer {:?} (slot {:?})", handle, self.index);
                self.state.allocate(handle);
                handle
            }
        };

        device.bind_buffer(BufferTarget::Array, Some(handle));

        if self.state.is_dirty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.data);
            log::trace!("Uploading {} bytes to buffer {:?}", bytes.len(), handle);
            device.buffer_data(BufferTarget::Array, bytes);
            self.state.mark_clean();
        }

        if let Some(index) = self.index {
            device.enable_vertex_attribute(index, T::COMPONENTS);
        }
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state.handle().is_none() {
            return;
        }
        if let Some(index) = self.index {
            device.disable_vertex_attribute(index);
        }
        device.bind_buffer(BufferTarget::Array, None);
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.state.take() {
            log::debug!("Releasing attribute buffer {:?}", handle);
            device.delete_buffer(handle);
        }
    }

    fn dirty(&mut self) {
        self.state.mark_dirty();
    }

    fn valid(&self) -> bool {
        self.state.is_clean() && self.index.is_some() && !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DeviceCall, RecordingDevice};

    fn triangle() -> Vec3Array {
        let mut array = Vec3Array::with_index(POSITION);
        array.extend([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        array
    }

    #[test]
    fn test_bind_twice_uploads_once() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();

        array.bind(&mut device);
        array.unbind(&mut device);
        array.bind(&mut device);

        assert_eq!(device.buffer_uploads(), 1);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::CreateBuffer(_))), 1);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::BindBuffer(BufferTarget::Array, Some(_)))), 2);
        assert!(array.valid());
    }

    #[test]
    fn test_upload_size() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();
        array.bind(&mut device);
        assert!(device.calls().contains(&DeviceCall::BufferData { target: BufferTarget::Array, bytes: 36 }));
        assert!(device.calls().contains(&DeviceCall::EnableVertexAttribute { index: POSITION, components: 3 }));
    }

    #[test]
    fn test_mutation_triggers_reupload() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();
        array.bind(&mut device);

        array.push(Vec3::new(0.0, 0.0, 1.0));
        assert!(!array.valid());
        array.bind(&mut device);
        assert_eq!(device.buffer_uploads(), 2);

        array.dirty();
        array.bind(&mut device);
        assert_eq!(device.buffer_uploads(), 3);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::CreateBuffer(_))), 1);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();
        array.bind(&mut device);
        let handle = array.handle().unwrap();

        array.release(&mut device);
        array.release(&mut device);

        assert!(!device.is_live_buffer(handle));
        assert_eq!(device.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 1);
        assert!(array.handle().is_none());
        assert!(!array.valid());
    }

    #[test]
    fn test_empty_array_is_noop_bind() {
        let mut device = RecordingDevice::new();
        let mut array = Vec3Array::with_index(NORMAL);
        array.bind(&mut device);
        array.unbind(&mut device);
        assert!(device.calls().is_empty());
        assert!(!array.valid());
    }

    #[test]
    fn test_cleared_array_is_invalid() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();
        array.bind(&mut device);
        assert!(array.valid());

        array.clear();
        array.bind(&mut device);
        assert!(array.handle().is_some());
        assert!(!array.valid());
        assert_eq!(device.buffer_uploads(), 1);
    }

    #[test]
    fn test_allocation_failure_degrades() {
        let mut device = RecordingDevice::new();
        device.set_fail_allocations(true);
        let mut array = triangle();
        array.render(&mut device);
        assert!(device.calls().is_empty());
        assert!(!array.valid());

        device.set_fail_allocations(false);
        array.bind(&mut device);
        assert!(array.valid());
    }

    #[test]
    fn test_clone_and_take_dirty() {
        let mut device = RecordingDevice::new();
        let mut array = triangle();
        array.bind(&mut device);

        let copy = array.clone();
        assert_eq!(copy.len(), 3);
        assert!(copy.handle().is_none());
        assert_eq!(copy.index(), Some(POSITION));

        let moved = array.take();
        assert_eq!(moved.len(), 3);
        assert!(array.is_empty());
        assert!(array.state().is_dirty());
    }

    #[test]
    fn test_array_without_index_is_never_valid() {
        let mut device = RecordingDevice::new();
        let mut array: Vec2Array = vec![Vec2::new(0.0, 1.0)].into();
        array.bind(&mut device);
        assert!(array.state().is_clean());
        assert!(!array.valid());
        assert_eq!(device.count(|c| matches!(c, DeviceCall::EnableVertexAttribute { .. })), 0);
    }
}
