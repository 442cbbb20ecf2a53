//! Rendering resources
//!
//! Images, textures, shader programs, techniques and primitive sets, plus
//! the per-draw state (`RenderInfo`, `Viewport`) the render visitor hands
//! to every geometry.

pub mod image;
pub mod primitive_set;
pub mod program;
pub mod render_info;
pub mod shaders;
pub mod technique;
pub mod texture;
pub mod uniform;
pub mod viewport;

pub use self::image::{DataType, Image, ImageLibrary, PixelFormat};
pub use primitive_set::{DrawArrays, DrawElements, IndexType, PrimitiveSet};
pub use program::{Program, ProgramCache};
pub use render_info::RenderInfo;
pub use technique::{RenderTechnique, TechniqueKind};
pub use texture::{Texture, WrapAxis};
pub use uniform::{Uniform, UniformValue};
pub use viewport::Viewport;

use crate::gpu::GraphicsDevice;

/// Device and program cache borrowed for the duration of a draw
pub struct RenderContext<'a> {
    /// Graphics device to issue calls on
    pub device: &'a mut dyn GraphicsDevice,
    /// Programs shared by every technique on this device
    pub programs: &'a mut ProgramCache,
}

impl<'a> RenderContext<'a> {
    /// Borrow a device and its program cache
    pub fn new(device: &'a mut dyn GraphicsDevice, programs: &'a mut ProgramCache) -> Self {
        Self { device, programs }
    }
}
