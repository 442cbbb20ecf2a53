//! GPU resources
//!
//! Everything that owns a graphics device handle lives here: the device seam
//! itself, the shared lifecycle, vertex attribute arrays and framebuffers.
//! Program, texture and primitive set objects build on the same lifecycle
//! from the `render` module.

pub mod array;
pub mod device;
pub mod framebuffer;
pub mod object;
pub mod recording;

pub use array::{Array, AttributeElement, Vec2Array, Vec3Array, Vec4Array, COLOR, NORMAL, POSITION, TEXCOORD};
pub use device::{
    Attachment, BufferHandle, BufferTarget, FilterMode, FramebufferHandle, GraphicsDevice,
    IndexFormat, PrimitiveMode, ProgramHandle, RenderState, RenderbufferFormat,
    RenderbufferHandle, TextureHandle, TextureParameters, TextureTarget, WrapMode,
};
pub use framebuffer::{AttachmentKind, ColorTarget, Framebuffer};
pub use object::{GpuObject, GpuObjectList, GpuState};
pub use recording::{DeviceCall, DeviceStats, RecordingDevice};
