//! GPU object lifecycle
//!
//! Every GPU-resident resource goes through the same three states:
//!
//! ```text
//!            bind()                 mutate / dirty()
//! Unallocated ─────► Allocated-Clean ◄──────────────► Allocated-Dirty
//!      ▲                   │         bind() re-uploads        │
//!      └──── release() ────┴──────────────────────────────────┘
//! ```
//!
//! Handles are created lazily on the first `bind()`, payloads are uploaded
//! when the object is dirty, and `release()` returns to `Unallocated`.
//! Dropping an object does not free its handle; owners call `release()`
//! while the device is at hand.

use super::device::GraphicsDevice;

/// Residency of a GPU object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuState<H> {
    /// No handle exists
    #[default]
    Unallocated,
    /// Handle exists and matches the CPU payload
    Clean(H),
    /// Handle exists but the CPU payload changed since the last upload
    Dirty(H),
}

impl<H: Copy> GpuState<H> {
    /// Current handle, if any
    pub const fn handle(&self) -> Option<H> {
        match *self {
            Self::Unallocated => None,
            Self::Clean(h) | Self::Dirty(h) => Some(h),
        }
    }

    /// True when a handle exists
    pub const fn is_allocated(&self) -> bool {
        !matches!(self, Self::Unallocated)
    }

    /// True when allocated and up to date
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// True when allocated and awaiting upload
    pub const fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty(_))
    }

    /// Track a freshly created handle; its payload still has to be uploaded
    pub fn allocate(&mut self, handle: H) {
        *self = Self::Dirty(handle);
    }

    /// Request a re-upload on the next bind; no-op while unallocated
    pub fn mark_dirty(&mut self) {
        if let Self::Clean(h) = *self {
            *self = Self::Dirty(h);
        }
    }

    /// Record a finished upload
    pub fn mark_clean(&mut self) {
        if let Self::Dirty(h) = *self {
            *self = Self::Clean(h);
        }
    }

    /// Forget the handle and return it for deletion
    pub fn take(&mut self) -> Option<H> {
        let handle = self.handle();
        *self = Self::Unallocated;
        handle
    }
}

/// A lazily created, dirty tracked GPU resource
pub trait GpuObject {
    /// Create the handle if needed, upload if dirty, then bind or draw
    fn bind(&mut self, device: &mut dyn GraphicsDevice);

    /// Detach without destroying the handle
    fn unbind(&mut self, device: &mut dyn GraphicsDevice);

    /// Destroy the handle; safe when none exists
    fn release(&mut self, device: &mut dyn GraphicsDevice);

    /// Mark for re-upload on the next bind
    fn dirty(&mut self);

    /// True when the object is resident, up to date and drawable
    fn valid(&self) -> bool;

    /// Bind then immediately unbind
    fn render(&mut self, device: &mut dyn GraphicsDevice) {
        self.bind(device);
        self.unbind(device);
    }
}

/// Ordered batch of GPU objects
///
/// Binds and unbinds in insertion order and releases in reverse order.
#[derive(Default)]
pub struct GpuObjectList<'a> {
    objects: Vec<&'a mut dyn GpuObject>,
}

impl<'a> GpuObjectList<'a> {
    /// Create an empty list
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Append an object
    pub fn push(&mut self, object: &'a mut dyn GpuObject) {
        self.objects.push(object);
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the list is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bind every object in order
    pub fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        for object in &mut self.objects {
            object.bind(device);
        }
    }

    /// Unbind every object in order
    pub fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        for object in &mut self.objects {
            object.unbind(device);
        }
    }

    /// Bind everything, then unbind everything
    pub fn render(&mut self, device: &mut dyn GraphicsDevice) {
        self.bind(device);
        self.unbind(device);
    }

    /// Release every object, last first
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        for object in self.objects.iter_mut().rev() {
            object.release(device);
        }
    }

    /// Mark every object dirty
    pub fn dirty(&mut self) {
        for object in &mut self.objects {
            object.dirty();
        }
    }

    /// Drop entries that are not currently valid
    pub fn clean(&mut self) {
        self.objects.retain(|object| object.valid());
    }
}

impl<'a> Extend<&'a mut dyn GpuObject> for GpuObjectList<'a> {
    fn extend<I: IntoIterator<Item = &'a mut dyn GpuObject>>(&mut self, iter: I) {
        self.objects.extend(iter);
    }
}
