//! Graphics device abstraction
//!
//! This module defines the trait a graphics context must implement for the
//! scene graph to draw through it. The calls mirror the small OpenGL subset
//! the renderer needs; creation calls return `None` when the device cannot
//! allocate, and callers treat that as "skip this resource for now".

use bitflags::bitflags;

use crate::render::image::Image;
use crate::render::uniform::UniformValue;

/// Handle to a vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Handle to a texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u32);

/// Handle to a renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderbufferHandle(pub u32);

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

/// How a vertex sequence is assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    /// Independent points
    Points,
    /// Independent segments, two vertices each
    Lines,
    /// Connected segments
    LineStrip,
    /// Connected segments closed back to the first vertex
    LineLoop,
    /// Independent triangles, three vertices each
    #[default]
    Triangles,
    /// Strip of triangles sharing edges
    TriangleStrip,
    /// Fan of triangles sharing the first vertex
    TriangleFan,
}

impl PrimitiveMode {
    /// Indices consumed per primitive when counting primitives
    pub const fn vertices_per_primitive(self) -> usize {
        match self {
            Self::Lines => 2,
            Self::Triangles => 3,
            _ => 1,
        }
    }
}

/// Element index width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

/// Texture binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// Two dimensional texture
    #[default]
    Texture2D,
    /// Three dimensional texture
    Texture3D,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Clamp to the edge texel
    #[default]
    ClampToEdge,
    /// Tile
    Repeat,
    /// Tile, mirroring every other repetition
    MirroredRepeat,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Nearest texel of the nearest mip level
    NearestMipmapNearest,
    /// Bilinear within the nearest mip level
    LinearMipmapNearest,
    /// Nearest texel, blended between mip levels
    NearestMipmapLinear,
    /// Trilinear
    LinearMipmapLinear,
}

impl FilterMode {
    /// True when sampling reads mip levels
    pub const fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Sampler state uploaded with a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureParameters {
    /// Wrap along s
    pub wrap_s: WrapMode,
    /// Wrap along t
    pub wrap_t: WrapMode,
    /// Wrap along r
    pub wrap_r: WrapMode,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
}

impl Default for TextureParameters {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            wrap_r: WrapMode::ClampToEdge,
            min_filter: FilterMode::LinearMipmapNearest,
            mag_filter: FilterMode::LinearMipmapLinear,
        }
    }
}

/// Renderbuffer storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    /// 8-bit RGBA colour
    Rgba8,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Colour attachment `n`
    Color(u32),
    /// Combined depth and stencil
    DepthStencil,
}

bitflags! {
    /// Fixed function state toggled before drawing a scene
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderState: u32 {
        /// Back face culling
        const CULL_FACE = 1 << 0;
        /// Depth testing
        const DEPTH_TEST = 1 << 1;
        /// Source-alpha blending
        const BLEND = 1 << 2;
    }
}

/// Graphics context the scene graph renders through
///
/// All calls happen on the thread that owns the context. Creation calls return
/// `None` on failure; nothing here reports errors, a missing resource simply
/// does not draw.
pub trait GraphicsDevice {
    /// Allocate a buffer object
    fn create_buffer(&mut self) -> Option<BufferHandle>;

    /// Free a buffer object
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Bind a buffer, `None` unbinds the target
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Upload bytes into the buffer bound at `target`
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]);

    /// Point attribute `index` at the bound array buffer and enable it
    fn enable_vertex_attribute(&mut self, index: u32, components: u32);

    /// Disable attribute `index`
    fn disable_vertex_attribute(&mut self, index: u32);

    /// Draw `count` vertices starting at `first`
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32);

    /// Draw `count` indices from the bound element buffer
    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, format: IndexFormat);

    /// Compile and link a program
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Option<ProgramHandle>;

    /// Free a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Make a program current, `None` clears it
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Location of a named uniform in a program
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32>;

    /// Set a uniform of the current program
    fn set_uniform(&mut self, location: i32, value: &UniformValue);

    /// Allocate a texture object
    fn create_texture(&mut self) -> Option<TextureHandle>;

    /// Free a texture object
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Activate `unit` and bind a texture to it, `None` unbinds
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>);

    /// Upload pixels into the bound texture
    fn texture_image(&mut self, target: TextureTarget, image: &Image);

    /// Allocate empty RGBA storage for the bound texture
    fn texture_storage(&mut self, target: TextureTarget, width: u32, height: u32);

    /// Set sampler state of the bound texture
    fn texture_parameters(&mut self, target: TextureTarget, parameters: &TextureParameters);

    /// Build the mip chain of the bound texture
    fn generate_mipmap(&mut self, target: TextureTarget);

    /// Allocate a framebuffer object
    fn create_framebuffer(&mut self) -> Option<FramebufferHandle>;

    /// Free a framebuffer object
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer, `None` binds the default one
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Allocate a renderbuffer with storage
    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Option<RenderbufferHandle>;

    /// Free a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    /// Attach a renderbuffer to the bound framebuffer
    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle);

    /// Attach a texture to the bound framebuffer
    fn attach_texture(&mut self, attachment: Attachment, texture: TextureHandle);

    /// Copy colour from one framebuffer to another, `None` is the default one
    fn blit_framebuffer(
        &mut self,
        from: Option<FramebufferHandle>,
        to: Option<FramebufferHandle>,
        width: u32,
        height: u32,
    );

    /// Set the window viewport
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Clear colour and depth
    fn clear(&mut self, color: [f32; 4]);

    /// Enable exactly the given fixed function state
    fn set_render_state(&mut self, state: RenderState);
}
