//! Textures
//!
//! A [`Texture`] samples a shared [`Image`]. The image is uploaded on the
//! first bind and again whenever the image or the sampler state changes.

use std::rc::Rc;

use crate::gpu::{
    FilterMode, GpuObject, GpuState, GraphicsDevice, TextureHandle, TextureParameters,
    TextureTarget, WrapMode,
};

use super::image::{Image, ImageLibrary};

/// Texture coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapAxis {
    /// s coordinate
    S,
    /// t coordinate
    T,
    /// r coordinate
    R,
}

/// Image plus sampler state bound to a texture unit
#[derive(Debug)]
pub struct Texture {
    image: Option<Rc<Image>>,
    image_name: String,
    target: TextureTarget,
    parameters: TextureParameters,
    unit: u32,
    state: GpuState<TextureHandle>,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            image: None,
            image_name: "texture".to_string(),
            target: TextureTarget::Texture2D,
            parameters: TextureParameters::default(),
            unit: 0,
            state: GpuState::Unallocated,
        }
    }
}

impl Clone for Texture {
    /// Shares the image, not the GPU texture
    fn clone(&self) -> Self {
        Self {
            image: self.image.clone(),
            image_name: self.image_name.clone(),
            target: self.target,
            parameters: self.parameters,
            unit: self.unit,
            state: GpuState::Unallocated,
        }
    }
}

impl Texture {
    /// Texture without an image
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture sampling `image`
    pub fn from_image(image: Rc<Image>) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Sampled image
    pub fn image(&self) -> Option<&Rc<Image>> {
        self.image.as_ref()
    }

    /// Replace the image; re-uploads only when it actually changes
    pub fn set_image(&mut self, image: Option<Rc<Image>>) {
        let same = match (&self.image, &image) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.image = image;
            self.state.mark_dirty();
        }
    }

    /// Library name of the image
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Look up the image by name in `library`
    pub fn set_image_name(&mut self, name: impl Into<String>, library: &ImageLibrary) {
        self.image_name = name.into();
        let image = library.get(&self.image_name);
        if image.is_none() {
            log::warn!("Image '{}' not found in library", self.image_name);
        }
        self.set_image(image);
    }

    /// Texture unit the texture binds to
    pub const fn unit(&self) -> u32 {
        self.unit
    }

    /// Change the texture unit
    pub fn set_unit(&mut self, unit: u32) {
        self.unit = unit;
    }

    /// Binding point
    pub const fn target(&self) -> TextureTarget {
        self.target
    }

    /// Sampler state
    pub const fn parameters(&self) -> &TextureParameters {
        &self.parameters
    }

    /// Wrap mode along one axis
    pub const fn wrap(&self, axis: WrapAxis) -> WrapMode {
        match axis {
            WrapAxis::S => self.parameters.wrap_s,
            WrapAxis::T => self.parameters.wrap_t,
            WrapAxis::R => self.parameters.wrap_r,
        }
    }

    /// Set the wrap mode along one axis
    pub fn set_wrap(&mut self, axis: WrapAxis, mode: WrapMode) {
        let slot = match axis {
            WrapAxis::S => &mut self.parameters.wrap_s,
            WrapAxis::T => &mut self.parameters.wrap_t,
            WrapAxis::R => &mut self.parameters.wrap_r,
        };
        if *slot != mode {
            *slot = mode;
            self.state.mark_dirty();
        }
    }

    /// Set minification and magnification filters
    pub fn set_filters(&mut self, min_filter: FilterMode, mag_filter: FilterMode) {
        if self.parameters.min_filter != min_filter || self.parameters.mag_filter != mag_filter {
            self.parameters.min_filter = min_filter;
            self.parameters.mag_filter = mag_filter;
            self.state.mark_dirty();
        }
    }

    /// GPU texture, if created
    pub const fn handle(&self) -> Option<TextureHandle> {
        self.state.handle()
    }
}

impl GpuObject for Texture {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        let Some(image) = self.image.as_ref().filter(|image| image.valid()) else {
            return;
        };

        let handle = match self.state.handle() {
            Some(handle) => handle,
            None => {
                let Some(handle) = device.create_texture() else {
                    log::warn!("Failed to create texture for '{}'", self.image_name);
                    return;
                };
                log::debug!("Created texture {:?} on unit {}", handle, self.unit);
                self.state.allocate(handle);
                handle
            }
        };

        device.bind_texture(self.unit, self.target, Some(handle));

        if self.state.is_dirty() {
            log::trace!("Uploading {}x{} image to texture {:?}", image.s(), image.t(), handle);
            device.texture_image(self.target, image);
            device.texture_parameters(self.target, &self.parameters);
            if self.parameters.min_filter.uses_mipmaps() || self.parameters.mag_filter.uses_mipmaps() {
                device.generate_mipmap(self.target);
            }
            self.state.mark_clean();
        }
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state.is_allocated() {
            device.bind_texture(self.unit, self.target, None);
        }
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.state.take() {
            log::debug!("Deleting texture {:?}", handle);
            device.delete_texture(handle);
        }
    }

    fn dirty(&mut self) {
        self.state.mark_dirty();
    }

    fn valid(&self) -> bool {
        self.state.is_clean()
    }
}
