//! Primitive sets
//!
//! A primitive set tells the device how to assemble the geometry's vertices:
//! either a contiguous range ([`DrawArrays`]) or an explicit index list
//! ([`DrawElements`]). Both answer the same questions through
//! [`PrimitiveSet`]: how many indices, which vertex sits at a position, and
//! how many primitives that makes.

use bytemuck::Pod;

use crate::gpu::{BufferHandle, BufferTarget, GpuObject, GpuState, GraphicsDevice, IndexFormat, PrimitiveMode};

/// Integer type usable as an element index
pub trait IndexType: Pod + TryFrom<u32> + Into<u32> {
    /// Device index format
    const FORMAT: IndexFormat;
}

impl IndexType for u16 {
    const FORMAT: IndexFormat = IndexFormat::U16;
}

impl IndexType for u32 {
    const FORMAT: IndexFormat = IndexFormat::U32;
}

/// Contiguous vertex range `first..first + count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawArrays {
    /// Assembly mode
    pub mode: PrimitiveMode,
    /// First vertex
    pub first: u32,
    /// Vertex count
    pub count: u32,
}

impl DrawArrays {
    /// Range of `count` vertices from `first`
    pub const fn new(mode: PrimitiveMode, first: u32, count: u32) -> Self {
        Self { mode, first, count }
    }

    /// Vertex index at `pos`
    pub const fn index(&self, pos: u32) -> u32 {
        self.first + pos
    }

    /// Grow the range so vertex `index` is covered
    pub fn emplace(&mut self, index: u32) {
        self.count = self.count.max(index.saturating_add(1));
    }
}

impl GpuObject for DrawArrays {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.count > 0 {
            device.draw_arrays(self.mode, self.first, self.count);
        }
    }

    fn unbind(&mut self, _device: &mut dyn GraphicsDevice) {}

    fn release(&mut self, _device: &mut dyn GraphicsDevice) {}

    fn dirty(&mut self) {}

    fn valid(&self) -> bool {
        self.count > 0
    }
}

/// Explicit index list in its own element buffer
#[derive(Debug)]
pub struct DrawElements<T> {
    mode: PrimitiveMode,
    indices: Vec<T>,
    state: GpuState<BufferHandle>,
}

impl<T> Default for DrawElements<T> {
    fn default() -> Self {
        Self::new(PrimitiveMode::default())
    }
}

impl<T: Clone> Clone for DrawElements<T> {
    /// Copies indices; the copy gets its own element buffer
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            indices: self.indices.clone(),
            state: GpuState::Unallocated,
        }
    }
}

impl<T> DrawElements<T> {
    /// Empty index list
    pub const fn new(mode: PrimitiveMode) -> Self {
        Self {
            mode,
            indices: Vec::new(),
            state: GpuState::Unallocated,
        }
    }

    /// Index list over `indices`
    pub fn from_indices(mode: PrimitiveMode, indices: Vec<T>) -> Self {
        Self {
            mode,
            indices,
            state: GpuState::Unallocated,
        }
    }

    /// Assembly mode
    pub const fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    /// Read access to the indices
    pub fn indices(&self) -> &[T] {
        &self.indices
    }

    /// Mutable access to the indices; marks the buffer dirty
    pub fn indices_mut(&mut self) -> &mut Vec<T> {
        self.state.mark_dirty();
        &mut self.indices
    }

    /// Number of indices
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when there are no indices
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Element buffer, if created
    pub const fn handle(&self) -> Option<BufferHandle> {
        self.state.handle()
    }
}

impl<T: IndexType> DrawElements<T> {
    /// Index at `pos`
    pub fn index(&self, pos: u32) -> Option<u32> {
        self.indices.get(pos as usize).map(|&i| i.into())
    }

    /// Append an index; indices too wide for `T` are dropped
    pub fn emplace(&mut self, index: u32) {
        match T::try_from(index) {
            Ok(value) => self.indices_mut().push(value),
            Err(_) => log::warn!("Index {} does not fit {:?} elements, dropped", index, T::FORMAT),
        }
    }
}

impl<T: IndexType> GpuObject for DrawElements<T> {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.indices.is_empty() {
            self.state.mark_clean();
            return;
        }

        let handle = match self.state.handle() {
            Some(handle) => handle,
            None => {
                let Some(handle) = device.create_buffer() else {
                    log::warn!("Failed to create element buffer, skipping draw");
                    return;
                };
                log::debug!("Created element buffer {:?}", handle);
                self.state.allocate(handle);
                handle
            }
        };

        device.bind_buffer(BufferTarget::ElementArray, Some(handle));

        if self.state.is_dirty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.indices);
            log::trace!("Uploading {} indices to buffer {:?}", self.indices.len(), handle);
            device.buffer_data(BufferTarget::ElementArray, bytes);
            self.state.mark_clean();
        }

        device.draw_elements(self.mode, self.indices.len() as u32, T::FORMAT);
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state.is_allocated() {
            device.bind_buffer(BufferTarget::ElementArray, None);
        }
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.state.take() {
            log::debug!("Releasing element buffer {:?}", handle);
            device.delete_buffer(handle);
        }
    }

    fn dirty(&mut self) {
        self.state.mark_dirty();
    }

    fn valid(&self) -> bool {
        self.state.is_clean() && !self.indices.is_empty()
    }
}

/// Any primitive set a geometry can draw
#[derive(Debug, Clone)]
pub enum PrimitiveSet {
    /// Contiguous range
    Arrays(DrawArrays),
    /// 16-bit index list
    ElementsU16(DrawElements<u16>),
    /// 32-bit index list
    ElementsU32(DrawElements<u32>),
}

impl From<DrawArrays> for PrimitiveSet {
    fn from(set: DrawArrays) -> Self {
        Self::Arrays(set)
    }
}

impl From<DrawElements<u16>> for PrimitiveSet {
    fn from(set: DrawElements<u16>) -> Self {
        Self::ElementsU16(set)
    }
}

impl From<DrawElements<u32>> for PrimitiveSet {
    fn from(set: DrawElements<u32>) -> Self {
        Self::ElementsU32(set)
    }
}

impl PrimitiveSet {
    /// Assembly mode
    pub const fn mode(&self) -> PrimitiveMode {
        match self {
            Self::Arrays(set) => set.mode,
            Self::ElementsU16(set) => set.mode,
            Self::ElementsU32(set) => set.mode,
        }
    }

    /// Change the assembly mode
    pub fn set_mode(&mut self, mode: PrimitiveMode) {
        match self {
            Self::Arrays(set) => set.mode = mode,
            Self::ElementsU16(set) => set.mode = mode,
            Self::ElementsU32(set) => set.mode = mode,
        }
    }

    /// Number of indices drawn
    pub fn num_indices(&self) -> usize {
        match self {
            Self::Arrays(set) => set.count as usize,
            Self::ElementsU16(set) => set.len(),
            Self::ElementsU32(set) => set.len(),
        }
    }

    /// Vertex index at `pos`
    pub fn index(&self, pos: u32) -> Option<u32> {
        match self {
            Self::Arrays(set) => (pos < set.count).then_some(set.index(pos)),
            Self::ElementsU16(set) => set.index(pos),
            Self::ElementsU32(set) => set.index(pos),
        }
    }

    /// Number of whole primitives
    pub fn num_primitives(&self) -> usize {
        self.num_indices() / self.mode().vertices_per_primitive()
    }

    /// Append a vertex index
    pub fn emplace(&mut self, index: u32) {
        match self {
            Self::Arrays(set) => set.emplace(index),
            Self::ElementsU16(set) => set.emplace(index),
            Self::ElementsU32(set) => set.emplace(index),
        }
    }

    /// Append several vertex indices
    pub fn emplace_all(&mut self, indices: impl IntoIterator<Item = u32>) {
        for index in indices {
            self.emplace(index);
        }
    }

    /// Prepare for `primitives` primitives
    ///
    /// Ranges are sized to exactly that many vertices; index lists only
    /// reserve capacity.
    pub fn reserve_primitives(&mut self, primitives: usize) {
        let per = self.mode().vertices_per_primitive();
        match self {
            Self::Arrays(set) => set.count = primitives as u32,
            Self::ElementsU16(set) => set.indices.reserve(per * primitives),
            Self::ElementsU32(set) => set.indices.reserve(per * primitives),
        }
    }

    /// Vertex indices of every whole primitive
    pub fn primitives(&self) -> impl Iterator<Item = Vec<u32>> + '_ {
        let per = self.mode().vertices_per_primitive();
        (0..self.num_primitives()).map(move |p| {
            (0..per)
                .filter_map(|k| self.index((p * per + k) as u32))
                .collect()
        })
    }

    fn object(&mut self) -> &mut dyn GpuObject {
        match self {
            Self::Arrays(set) => set,
            Self::ElementsU16(set) => set,
            Self::ElementsU32(set) => set,
        }
    }
}

impl GpuObject for PrimitiveSet {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        self.object().bind(device);
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        self.object().unbind(device);
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        self.object().release(device);
    }

    fn dirty(&mut self) {
        self.object().dirty();
    }

    fn valid(&self) -> bool {
        match self {
            Self::Arrays(set) => set.valid(),
            Self::ElementsU16(set) => set.valid(),
            Self::ElementsU32(set) => set.valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DeviceCall, RecordingDevice};

    #[test]
    fn test_draw_arrays_contract() {
        let mut set = PrimitiveSet::from(DrawArrays::new(PrimitiveMode::Triangles, 3, 0));
        set.emplace_all([0, 1, 5]);
        assert_eq!(set.num_indices(), 6);
        assert_eq!(set.num_primitives(), 2);
        assert_eq!(set.index(2), Some(5));
        assert_eq!(set.index(6), None);

        set.emplace(2);
        assert_eq!(set.num_indices(), 6);
    }

    #[test]
    fn test_emplace_last_index_saturates() {
        let mut set = DrawArrays::new(PrimitiveMode::Points, 0, 0);
        set.emplace(u32::MAX);
        assert_eq!(set.count, u32::MAX);
        set.emplace(4);
        assert_eq!(set.count, u32::MAX);
    }

    #[test]
    fn test_draw_elements_contract() {
        let mut set = PrimitiveSet::from(DrawElements::<u32>::new(PrimitiveMode::Triangles));
        set.emplace_all([0, 1, 2, 2, 1, 3, 4]);
        assert_eq!(set.num_indices(), 7);
        assert_eq!(set.num_primitives(), 2);
        assert_eq!(set.index(5), Some(3));
        let triangles: Vec<_> = set.primitives().collect();
        assert_eq!(triangles, vec![vec![0, 1, 2], vec![2, 1, 3]]);
    }

    #[test]
    fn test_mode_sizes() {
        let mut set = PrimitiveSet::from(DrawElements::<u16>::from_indices(PrimitiveMode::Lines, vec![0, 1, 1, 2]));
        assert_eq!(set.num_primitives(), 2);
        set.set_mode(PrimitiveMode::LineStrip);
        assert_eq!(set.num_primitives(), 4);
    }

    #[test]
    fn test_narrow_index_is_dropped() {
        let mut set = DrawElements::<u16>::new(PrimitiveMode::Points);
        set.emplace(70_000);
        set.emplace(7);
        assert_eq!(set.indices(), &[7]);
    }

    #[test]
    fn test_elements_upload_once_and_draw() {
        let mut device = RecordingDevice::new();
        let mut set = PrimitiveSet::from(DrawElements::<u16>::from_indices(PrimitiveMode::Triangles, vec![0, 1, 2]));

        set.render(&mut device);
        set.render(&mut device);

        assert!(set.valid());
        assert_eq!(device.buffer_uploads(), 1);
        assert!(device.calls().contains(&DeviceCall::BufferData { target: BufferTarget::ElementArray, bytes: 6 }));
        assert_eq!(
            device.count(|c| *c == DeviceCall::DrawElements { mode: PrimitiveMode::Triangles, count: 3, format: IndexFormat::U16 }),
            2
        );

        set.release(&mut device);
        set.release(&mut device);
        assert_eq!(device.stats().live_buffers, 0);
    }

    #[test]
    fn test_arrays_draw_only_when_non_empty() {
        let mut device = RecordingDevice::new();
        let mut empty = DrawArrays::default();
        empty.render(&mut device);
        assert!(!empty.valid());
        assert_eq!(device.draw_calls(), 0);

        let mut set = DrawArrays::new(PrimitiveMode::Points, 2, 4);
        set.render(&mut device);
        assert!(device.calls().contains(&DeviceCall::DrawArrays { mode: PrimitiveMode::Points, first: 2, count: 4 }));
    }

    #[test]
    fn test_reserve_primitives() {
        let mut arrays = PrimitiveSet::from(DrawArrays::new(PrimitiveMode::Triangles, 0, 0));
        arrays.reserve_primitives(9);
        assert_eq!(arrays.num_indices(), 9);

        let mut elements = PrimitiveSet::from(DrawElements::<u32>::new(PrimitiveMode::Triangles));
        elements.reserve_primitives(9);
        assert_eq!(elements.num_indices(), 0);
    }
}
