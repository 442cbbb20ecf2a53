//! Headless graphics device
//!
//! [`RecordingDevice`] hands out fake handles and records every call it
//! receives. It backs the test suite and the headless viewer driver, where
//! the interesting output is *what* would have been sent to a GPU.

use std::collections::{HashMap, HashSet};

use crate::render::image::Image;
use crate::render::uniform::UniformValue;

use super::device::{
    Attachment, BufferHandle, BufferTarget, FramebufferHandle, GraphicsDevice, IndexFormat,
    PrimitiveMode, ProgramHandle, RenderState, RenderbufferFormat, RenderbufferHandle,
    TextureHandle, TextureParameters, TextureTarget,
};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DeviceCall {
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    BufferData { target: BufferTarget, bytes: usize },
    EnableVertexAttribute { index: u32, components: u32 },
    DisableVertexAttribute(u32),
    DrawArrays { mode: PrimitiveMode, first: u32, count: u32 },
    DrawElements { mode: PrimitiveMode, count: u32, format: IndexFormat },
    CreateProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    SetUniform { location: i32, value: UniformValue },
    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    BindTexture { unit: u32, target: TextureTarget, texture: Option<TextureHandle> },
    TextureImage { target: TextureTarget, width: u32, height: u32 },
    TextureStorage { target: TextureTarget, width: u32, height: u32 },
    TextureParameters(TextureParameters),
    GenerateMipmap(TextureTarget),
    CreateFramebuffer(FramebufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    BindFramebuffer(Option<FramebufferHandle>),
    CreateRenderbuffer { handle: RenderbufferHandle, format: RenderbufferFormat, width: u32, height: u32, samples: u32 },
    DeleteRenderbuffer(RenderbufferHandle),
    AttachRenderbuffer(Attachment, RenderbufferHandle),
    AttachTexture(Attachment, TextureHandle),
    BlitFramebuffer { from: Option<FramebufferHandle>, to: Option<FramebufferHandle>, width: u32, height: u32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Clear([f32; 4]),
    SetRenderState(RenderState),
}

/// Aggregate counters over a [`RecordingDevice`] log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Buffers currently alive
    pub live_buffers: usize,
    /// Programs currently alive
    pub live_programs: usize,
    /// Textures currently alive
    pub live_textures: usize,
    /// Buffer uploads recorded
    pub buffer_uploads: usize,
    /// Texture uploads recorded
    pub texture_uploads: usize,
    /// Draw calls recorded
    pub draw_calls: usize,
}

/// Graphics device that records calls instead of executing them
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    next_handle: u32,
    fail_allocations: bool,
    fail_programs: bool,
    live_buffers: HashSet<BufferHandle>,
    live_programs: HashSet<ProgramHandle>,
    live_textures: HashSet<TextureHandle>,
    live_framebuffers: HashSet<FramebufferHandle>,
    live_renderbuffers: HashSet<RenderbufferHandle>,
    locations: HashMap<(ProgramHandle, String), i32>,
    viewport: Option<(i32, i32, i32, i32)>,
}

impl RecordingDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every creation call fail from now on
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Make program creation fail, as a shader compile error would
    pub fn set_fail_programs(&mut self, fail: bool) {
        self.fail_programs = fail;
    }

    /// Every call since creation or the last [`Self::clear_calls`]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forget the recorded calls, keeping live handles
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of buffer uploads recorded
    pub fn buffer_uploads(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::BufferData { .. }))
    }

    /// Number of draw calls recorded
    pub fn draw_calls(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::DrawArrays { .. } | DeviceCall::DrawElements { .. }))
    }

    /// Last viewport set
    pub const fn current_viewport(&self) -> Option<(i32, i32, i32, i32)> {
        self.viewport
    }

    /// Every viewport set, in order
    pub fn viewport_history(&self) -> Vec<(i32, i32, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DeviceCall::Viewport { x, y, width, height } => Some((x, y, width, height)),
                _ => None,
            })
            .collect()
    }

    /// Counters over the current log and live handle sets
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            live_buffers: self.live_buffers.len(),
            live_programs: self.live_programs.len(),
            live_textures: self.live_textures.len(),
            buffer_uploads: self.buffer_uploads(),
            texture_uploads: self.count(|c| matches!(c, DeviceCall::TextureImage { .. })),
            draw_calls: self.draw_calls(),
        }
    }

    /// True when the buffer exists
    pub fn is_live_buffer(&self, buffer: BufferHandle) -> bool {
        self.live_buffers.contains(&buffer)
    }

    /// Live framebuffer and renderbuffer counts
    pub fn live_framebuffer_objects(&self) -> (usize, usize) {
        (self.live_framebuffers.len(), self.live_renderbuffers.len())
    }

    fn allocate(&mut self) -> Option<u32> {
        if self.fail_allocations {
            return None;
        }
        self.next_handle += 1;
        Some(self.next_handle)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer(&mut self) -> Option<BufferHandle> {
        let handle = BufferHandle(self.allocate()?);
        self.live_buffers.insert(handle);
        self.calls.push(DeviceCall::CreateBuffer(handle));
        Some(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.live_buffers.remove(&buffer);
        self.calls.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.calls.push(DeviceCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        self.calls.push(DeviceCall::BufferData { target, bytes: data.len() });
    }

    fn enable_vertex_attribute(&mut self, index: u32, components: u32) {
        self.calls.push(DeviceCall::EnableVertexAttribute { index, components });
    }

    fn disable_vertex_attribute(&mut self, index: u32) {
        self.calls.push(DeviceCall::DisableVertexAttribute(index));
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.calls.push(DeviceCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, format: IndexFormat) {
        self.calls.push(DeviceCall::DrawElements { mode, count, format });
    }

    fn create_program(&mut self, _vertex_source: &str, _fragment_source: &str) -> Option<ProgramHandle> {
        if self.fail_programs {
            return None;
        }
        let handle = ProgramHandle(self.allocate()?);
        self.live_programs.insert(handle);
        self.calls.push(DeviceCall::CreateProgram(handle));
        Some(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.live_programs.remove(&program);
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<i32> {
        if !self.live_programs.contains(&program) {
            return None;
        }
        let next = self.locations.len() as i32;
        Some(*self.locations.entry((program, name.to_string())).or_insert(next))
    }

    fn set_uniform(&mut self, location: i32, value: &UniformValue) {
        self.calls.push(DeviceCall::SetUniform { location, value: value.clone() });
    }

    fn create_texture(&mut self) -> Option<TextureHandle> {
        let handle = TextureHandle(self.allocate()?);
        self.live_textures.insert(handle);
        self.calls.push(DeviceCall::CreateTexture(handle));
        Some(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.live_textures.remove(&texture);
        self.calls.push(DeviceCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>) {
        self.calls.push(DeviceCall::BindTexture { unit, target, texture });
    }

    fn texture_image(&mut self, target: TextureTarget, image: &Image) {
        self.calls.push(DeviceCall::TextureImage { target, width: image.s(), height: image.t() });
    }

    fn texture_storage(&mut self, target: TextureTarget, width: u32, height: u32) {
        self.calls.push(DeviceCall::TextureStorage { target, width, height });
    }

    fn texture_parameters(&mut self, _target: TextureTarget, parameters: &TextureParameters) {
        self.calls.push(DeviceCall::TextureParameters(*parameters));
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.calls.push(DeviceCall::GenerateMipmap(target));
    }

    fn create_framebuffer(&mut self) -> Option<FramebufferHandle> {
        let handle = FramebufferHandle(self.allocate()?);
        self.live_framebuffers.insert(handle);
        self.calls.push(DeviceCall::CreateFramebuffer(handle));
        Some(handle)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.live_framebuffers.remove(&framebuffer);
        self.calls.push(DeviceCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.calls.push(DeviceCall::BindFramebuffer(framebuffer));
    }

    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Option<RenderbufferHandle> {
        let handle = RenderbufferHandle(self.allocate()?);
        self.live_renderbuffers.insert(handle);
        self.calls.push(DeviceCall::CreateRenderbuffer { handle, format, width, height, samples });
        Some(handle)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.live_renderbuffers.remove(&renderbuffer);
        self.calls.push(DeviceCall::DeleteRenderbuffer(renderbuffer));
    }

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        self.calls.push(DeviceCall::AttachRenderbuffer(attachment, renderbuffer));
    }

    fn attach_texture(&mut self, attachment: Attachment, texture: TextureHandle) {
        self.calls.push(DeviceCall::AttachTexture(attachment, texture));
    }

    fn blit_framebuffer(
        &mut self,
        from: Option<FramebufferHandle>,
        to: Option<FramebufferHandle>,
        width: u32,
        height: u32,
    ) {
        self.calls.push(DeviceCall::BlitFramebuffer { from, to, width, height });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Some((x, y, width, height));
        self.calls.push(DeviceCall::Viewport { x, y, width, height });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(DeviceCall::Clear(color));
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.calls.push(DeviceCall::SetRenderState(state));
    }
}
