//! CPU side pixel data
//!
//! [`Image`] holds tightly described pixel rows; [`ImageLibrary`] shares
//! decoded images between textures by name.

use std::collections::HashMap;
use std::rc::Rc;

use crate::foundation::math::Vec4;

/// Channel layout of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Single channel
    Red,
    /// Two channels
    Rg,
    /// Three channels
    Rgb,
    /// Four channels
    #[default]
    Rgba,
}

impl PixelFormat {
    /// Channels per pixel
    pub const fn components(self) -> u32 {
        match self {
            Self::Red => 1,
            Self::Rg => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Format with `components` channels
    pub const fn from_components(components: u32) -> Option<Self> {
        match components {
            1 => Some(Self::Red),
            2 => Some(Self::Rg),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }
}

/// Storage type of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// 8-bit normalized
    #[default]
    UnsignedByte,
    /// 32-bit float
    Float,
}

impl DataType {
    /// Bytes per channel
    pub const fn size_in_bytes(self) -> u32 {
        match self {
            Self::UnsignedByte => 1,
            Self::Float => 4,
        }
    }
}

/// Pixel buffer with its layout
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Vec<u8>,
    file_name: String,
    s: u32,
    t: u32,
    r: u32,
    pixel_format: PixelFormat,
    data_type: DataType,
    packing: u32,
    vertically_flipped: bool,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            file_name: String::new(),
            s: 0,
            t: 0,
            r: 0,
            pixel_format: PixelFormat::Rgba,
            data_type: DataType::UnsignedByte,
            packing: 4,
            vertically_flipped: false,
        }
    }
}

impl Image {
    /// Empty, invalid image
    pub fn new() -> Self {
        Self::default()
    }

    /// Image of `s` x `t` x `r` pixels over `data`
    ///
    /// Rows are padded to `packing` bytes. `data` shorter than the layout
    /// requires yields an invalid image.
    pub fn from_data(
        s: u32,
        t: u32,
        r: u32,
        pixel_format: PixelFormat,
        data_type: DataType,
        packing: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            data,
            s,
            t,
            r,
            pixel_format,
            data_type,
            packing: packing.max(1),
            ..Self::default()
        }
    }

    /// Tightly packed 8-bit RGBA image
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::from_data(width, height, 1, PixelFormat::Rgba, DataType::UnsignedByte, 1, data)
    }

    /// Width
    pub const fn s(&self) -> u32 {
        self.s
    }

    /// Height
    pub const fn t(&self) -> u32 {
        self.t
    }

    /// Depth
    pub const fn r(&self) -> u32 {
        self.r
    }

    /// Channel layout
    pub const fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Channel storage
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Row alignment in bytes
    pub const fn packing(&self) -> u32 {
        self.packing
    }

    /// Set the row alignment
    pub fn set_packing(&mut self, packing: u32) {
        self.packing = packing.max(1);
    }

    /// True when rows are stored bottom-up relative to the source file
    pub const fn vertically_flipped(&self) -> bool {
        self.vertically_flipped
    }

    /// Record the row order
    pub fn set_vertically_flipped(&mut self, flipped: bool) {
        self.vertically_flipped = flipped;
    }

    /// Source file, empty for generated images
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Record the source file
    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    /// Raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the image describes usable pixels
    pub fn valid(&self) -> bool {
        self.s != 0
            && self.t != 0
            && self.r != 0
            && !self.data.is_empty()
            && self.data.len() >= self.total_size_in_bytes()
    }

    /// Bits per pixel
    pub const fn pixel_size_in_bits(&self) -> u32 {
        self.pixel_format.components() * self.data_type.size_in_bytes() * 8
    }

    /// Bytes per row including padding
    pub const fn row_size_in_bytes(&self) -> usize {
        let raw = (self.s * self.pixel_size_in_bits()).div_ceil(8);
        let packing = if self.packing == 0 { 1 } else { self.packing };
        (raw.div_ceil(packing) * packing) as usize
    }

    /// Bytes per 2D slice
    pub const fn image_size_in_bytes(&self) -> usize {
        self.row_size_in_bytes() * self.t as usize
    }

    /// Bytes over all slices
    pub const fn total_size_in_bytes(&self) -> usize {
        self.image_size_in_bytes() * self.r as usize
    }

    /// Bytes of one pixel
    pub fn pixel(&self, column: u32, row: u32, slice: u32) -> Option<&[u8]> {
        if column >= self.s || row >= self.t || slice >= self.r {
            return None;
        }
        let size = (self.pixel_size_in_bits() / 8) as usize;
        let offset = column as usize * size
            + row as usize * self.row_size_in_bytes()
            + slice as usize * self.image_size_in_bytes();
        self.data.get(offset..offset + size)
    }

    /// Normalized colour of one pixel; missing channels read as in OpenGL
    pub fn color(&self, column: u32, row: u32, slice: u32) -> Option<Vec4> {
        let bytes = self.pixel(column, row, slice)?;
        let channels: Vec<f32> = match self.data_type {
            DataType::UnsignedByte => bytes.iter().map(|&b| f32::from(b) / 255.0).collect(),
            DataType::Float => bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        Some(match self.pixel_format {
            PixelFormat::Red => Vec4::new(channels[0], channels[0], channels[0], 1.0),
            PixelFormat::Rg => Vec4::new(channels[0], channels[0], channels[0], channels[1]),
            PixelFormat::Rgb => Vec4::new(channels[0], channels[1], channels[2], 1.0),
            PixelFormat::Rgba => Vec4::new(channels[0], channels[1], channels[2], channels[3]),
        })
    }

    /// True when any pixel has alpha below one
    pub fn is_translucent(&self) -> bool {
        if !self.valid() || !matches!(self.pixel_format, PixelFormat::Rg | PixelFormat::Rgba) {
            return false;
        }
        (0..self.r).any(|z| {
            (0..self.t).any(|y| {
                (0..self.s).any(|x| self.color(x, y, z).is_some_and(|c| c.w < 1.0))
            })
        })
    }

    /// Reverse the row order in place
    pub fn flip_vertical(&mut self) {
        if !self.valid() {
            return;
        }
        let row = self.row_size_in_bytes();
        let slice = self.image_size_in_bytes();
        let rows = self.t as usize;
        for z in 0..self.r as usize {
            let base = z * slice;
            for y in 0..rows / 2 {
                let (top, bottom) = self.data[base..base + slice].split_at_mut((rows - 1 - y) * row);
                top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
            }
        }
        self.vertically_flipped = !self.vertically_flipped;
    }
}

/// Named image registry
///
/// Textures refer to images by name; the library hands out shared
/// references so a decoded image is stored once.
#[derive(Debug, Default)]
pub struct ImageLibrary {
    images: HashMap<String, Rc<Image>>,
}

impl ImageLibrary {
    /// Empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image; an existing entry with that name is kept
    pub fn add(&mut self, name: impl Into<String>, image: Image) -> bool {
        let name = name.into();
        if self.images.contains_key(&name) {
            log::warn!("Image '{}' already registered", name);
            return false;
        }
        self.images.insert(name, Rc::new(image));
        true
    }

    /// Shared reference to a registered image
    pub fn get(&self, name: &str) -> Option<Rc<Image>> {
        self.images.get(name).cloned()
    }

    /// Existing image, or the one built by `make` registered under `name`
    pub fn get_or_add(&mut self, name: &str, make: impl FnOnce() -> Image) -> Rc<Image> {
        self.images
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(make()))
            .clone()
    }

    /// Unregister an image; holders keep their reference
    pub fn remove(&mut self, name: &str) -> Option<Rc<Image>> {
        self.images.remove(name)
    }

    /// Move an entry to a new name; fails when `to` is taken or `from` missing
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if self.images.contains_key(to) {
            return false;
        }
        match self.images.remove(from) {
            Some(image) => {
                self.images.insert(to.to_string(), image);
                true
            }
            None => false,
        }
    }

    /// Register or overwrite an image
    pub fn replace(&mut self, name: impl Into<String>, image: Image) -> Option<Rc<Image>> {
        self.images.insert(name.into(), Rc::new(image))
    }

    /// True when `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when the library is empty
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop images nobody else references; returns how many were dropped
    pub fn clean(&mut self) -> usize {
        let before = self.images.len();
        self.images.retain(|_, image| Rc::strong_count(image) > 1);
        before - self.images.len()
    }
}
