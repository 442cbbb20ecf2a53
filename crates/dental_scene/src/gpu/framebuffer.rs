//! Offscreen framebuffers
//!
//! A [`Framebuffer`] owns an FBO, a depth-stencil renderbuffer and one colour
//! target per requested attachment. Colour targets are either (optionally
//! multisampled) renderbuffers or textures. Any size or sample change drops
//! every handle and the next bind recreates them.

use std::collections::BTreeMap;

use super::device::{
    Attachment, FramebufferHandle, GraphicsDevice, RenderbufferFormat, RenderbufferHandle,
    TextureHandle, TextureTarget,
};
use super::object::GpuObject;

/// Storage used for colour attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Renderbuffers, resolved into the default framebuffer on unbind when multisampled
    Renderbuffer {
        /// Sample count, 0 or 1 for single sampled
        samples: u32,
    },
    /// Textures that can be sampled after rendering
    Texture,
}

impl Default for AttachmentKind {
    fn default() -> Self {
        Self::Renderbuffer { samples: 4 }
    }
}

/// GPU side colour target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    /// Renderbuffer storage
    Renderbuffer(RenderbufferHandle),
    /// Texture storage
    Texture(TextureHandle),
}

/// Offscreen render target
#[derive(Debug)]
pub struct Framebuffer {
    kind: AttachmentKind,
    width: u32,
    height: u32,
    dirty: bool,
    fbo: Option<FramebufferHandle>,
    depth: Option<RenderbufferHandle>,
    colors: BTreeMap<u32, Option<ColorTarget>>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(AttachmentKind::default())
    }
}

impl Framebuffer {
    /// 400x300 framebuffer with no colour attachment yet
    pub fn new(kind: AttachmentKind) -> Self {
        Self {
            kind,
            width: 400,
            height: 300,
            dirty: true,
            fbo: None,
            depth: None,
            colors: BTreeMap::new(),
        }
    }

    /// Framebuffer sampled through textures
    pub fn with_textures() -> Self {
        Self::new(AttachmentKind::Texture)
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Attachment storage
    pub const fn kind(&self) -> AttachmentKind {
        self.kind
    }

    /// Change size; only an actual change forces recreation
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
    }

    /// Change the sample count of renderbuffer attachments
    pub fn set_samples(&mut self, samples: u32) {
        if let AttachmentKind::Renderbuffer { samples: current } = &mut self.kind {
            *current = samples;
            self.dirty = true;
        }
    }

    /// Sample count, 0 for texture attachments
    pub const fn samples(&self) -> u32 {
        match self.kind {
            AttachmentKind::Renderbuffer { samples } => samples,
            AttachmentKind::Texture => 0,
        }
    }

    /// Request a colour attachment at `unit`
    pub fn attach_color(&mut self, unit: u32) {
        self.colors.entry(unit).or_insert(None);
        self.dirty = true;
    }

    /// Colour target of `unit`, once created
    pub fn color(&self, unit: u32) -> Option<ColorTarget> {
        self.colors.get(&unit).copied().flatten()
    }

    /// Depth-stencil renderbuffer, once created
    pub const fn depth(&self) -> Option<RenderbufferHandle> {
        self.depth
    }

    /// Framebuffer object, once created
    pub const fn handle(&self) -> Option<FramebufferHandle> {
        self.fbo
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Option<()> {
        let samples = self.samples();
        let depth = device.create_renderbuffer(
            RenderbufferFormat::Depth24Stencil8,
            self.width,
            self.height,
            samples,
        )?;
        self.depth = Some(depth);

        for (_, target) in self.colors.iter_mut() {
            *target = Some(match self.kind {
                AttachmentKind::Renderbuffer { samples } => ColorTarget::Renderbuffer(
                    device.create_renderbuffer(RenderbufferFormat::Rgba8, self.width, self.height, samples)?,
                ),
                AttachmentKind::Texture => {
                    let texture = device.create_texture()?;
                    device.bind_texture(0, TextureTarget::Texture2D, Some(texture));
                    device.texture_storage(TextureTarget::Texture2D, self.width, self.height);
                    device.bind_texture(0, TextureTarget::Texture2D, None);
                    ColorTarget::Texture(texture)
                }
            });
        }

        let fbo = device.create_framebuffer()?;
        self.fbo = Some(fbo);
        device.bind_framebuffer(Some(fbo));
        device.attach_renderbuffer(Attachment::DepthStencil, depth);
        for (&unit, target) in &self.colors {
            match target {
                Some(ColorTarget::Renderbuffer(rb)) => device.attach_renderbuffer(Attachment::Color(unit), *rb),
                Some(ColorTarget::Texture(tex)) => device.attach_texture(Attachment::Color(unit), *tex),
                None => {}
            }
        }
        Some(())
    }
}

impl GpuObject for Framebuffer {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.dirty {
            self.release(device);
            self.dirty = false;
        }

        if let Some(fbo) = self.fbo {
            device.bind_framebuffer(Some(fbo));
            return;
        }

        log::debug!(
            "Creating {}x{} framebuffer ({:?}, {} colour attachments)",
            self.width,
            self.height,
            self.kind,
            self.colors.len()
        );
        if self.create(device).is_none() {
            log::warn!("Failed to create framebuffer, rendering to the default target");
            self.release(device);
            self.dirty = true;
        }
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        let Some(fbo) = self.fbo else {
            return;
        };
        if self.samples() > 1 {
            device.blit_framebuffer(Some(fbo), None, self.width, self.height);
        }
        device.bind_framebuffer(None);
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(fbo) = self.fbo.take() {
            device.delete_framebuffer(fbo);
        }
        if let Some(depth) = self.depth.take() {
            device.delete_renderbuffer(depth);
        }
        for target in self.colors.values_mut() {
            match target.take() {
                Some(ColorTarget::Renderbuffer(rb)) => device.delete_renderbuffer(rb),
                Some(ColorTarget::Texture(tex)) => device.delete_texture(tex),
                None => {}
            }
        }
    }

    fn dirty(&mut self) {
        self.dirty = true;
    }

    fn valid(&self) -> bool {
        !self.dirty && self.fbo.is_some() && self.depth.is_some() && !self.colors.is_empty()
    }
}
