//! Shader programs and the per-context program cache

use std::collections::HashMap;

use crate::foundation::collections::{ProgramKey, SlotMap};
use crate::foundation::math::Mat4;
use crate::gpu::{GpuObject, GpuState, GraphicsDevice, ProgramHandle};

use super::uniform::UniformValue;

/// Vertex plus fragment shader pair, linked lazily
#[derive(Debug, Clone)]
pub struct Program {
    vertex_source: String,
    fragment_source: String,
    state: GpuState<ProgramHandle>,
    failed: bool,
}

impl Program {
    /// Program from GLSL sources; nothing is compiled until the first bind
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            state: GpuState::Unallocated,
            failed: false,
        }
    }

    /// Vertex shader source
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    /// Fragment shader source
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Replace both sources; the program is relinked on the next bind
    pub fn set_sources(&mut self, vertex_source: impl Into<String>, fragment_source: impl Into<String>) {
        self.vertex_source = vertex_source.into();
        self.fragment_source = fragment_source.into();
        self.failed = false;
        self.state.mark_dirty();
    }

    /// Linked program, if any
    pub const fn handle(&self) -> Option<ProgramHandle> {
        self.state.handle()
    }

    /// Location of a uniform in the linked program
    pub fn uniform_location(&self, device: &mut dyn GraphicsDevice, name: &str) -> Option<i32> {
        device.uniform_location(self.handle()?, name)
    }

    /// Set a uniform by name; skipped when unlinked or undeclared
    pub fn set_uniform(&self, device: &mut dyn GraphicsDevice, name: &str, value: &UniformValue) {
        if let Some(location) = self.uniform_location(device, name) {
            device.set_uniform(location, value);
        }
    }

    /// Upload the model-view and model-view-projection matrices
    pub fn bind_matrices(&self, device: &mut dyn GraphicsDevice, mv: &Mat4, mvp: &Mat4) {
        self.set_uniform(device, "uMV", &UniformValue::Mat4(*mv));
        self.set_uniform(device, "uMVP", &UniformValue::Mat4(*mvp));
    }
}

impl GpuObject for Program {
    fn bind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state.is_dirty() {
            self.release(device);
        }

        let handle = match self.state.handle() {
            Some(handle) => handle,
            // a failed link stays failed until the sources change
            None if self.failed => return,
            None => {
                let Some(handle) = device.create_program(&self.vertex_source, &self.fragment_source) else {
                    log::warn!("Failed to compile or link shader program");
                    self.failed = true;
                    return;
                };
                log::debug!("Linked shader program {:?}", handle);
                self.state.allocate(handle);
                self.state.mark_clean();
                handle
            }
        };

        device.use_program(Some(handle));
    }

    fn unbind(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state.is_allocated() {
            device.use_program(None);
        }
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.state.take() {
            log::debug!("Deleting shader program {:?}", handle);
            device.delete_program(handle);
        }
    }

    fn dirty(&mut self) {
        self.state.mark_dirty();
    }

    fn valid(&self) -> bool {
        self.state.is_clean()
    }
}

/// Programs shared by every technique of one graphics context
///
/// Techniques with the same name share one program.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: SlotMap<ProgramKey, Program>,
    by_name: HashMap<String, ProgramKey>,
}

impl ProgramCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the program registered as `name`, registering the sources if new
    pub fn get_or_insert(&mut self, name: &str, vertex_source: &str, fragment_source: &str) -> ProgramKey {
        if let Some(&key) = self.by_name.get(name) {
            return key;
        }
        let key = self.programs.insert(Program::new(vertex_source, fragment_source));
        self.by_name.insert(name.to_string(), key);
        key
    }

    /// Key registered under `name`
    pub fn key(&self, name: &str) -> Option<ProgramKey> {
        self.by_name.get(name).copied()
    }

    /// Program for `key`
    pub fn get(&self, key: ProgramKey) -> Option<&Program> {
        self.programs.get(key)
    }

    /// Mutable program for `key`
    pub fn get_mut(&mut self, key: ProgramKey) -> Option<&mut Program> {
        self.programs.get_mut(key)
    }

    /// Unregister and release a program
    pub fn remove(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> bool {
        let Some(key) = self.by_name.remove(name) else {
            return false;
        };
        if let Some(mut program) = self.programs.remove(key) {
            program.release(device);
        }
        true
    }

    /// Number of programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// True when no program is registered
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Force every program to relink, e.g. after a context loss
    pub fn dirty_all(&mut self) {
        for program in self.programs.values_mut() {
            program.dirty();
        }
    }

    /// Release every linked program, keeping the sources
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for program in self.programs.values_mut() {
            program.release(device);
        }
    }
}
