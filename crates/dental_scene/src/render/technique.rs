//! Render techniques
//!
//! A technique pairs a shared program with per-instance uniform values.
//! Programs are looked up in a [`ProgramCache`] handed to the constructor,
//! so every technique of the same kind reuses one linked program.

use std::collections::BTreeMap;

use crate::foundation::collections::ProgramKey;
use crate::foundation::math::Vec4;
use crate::foundation::uuid::Uuid;
use crate::gpu::GpuObject;

use super::program::ProgramCache;
use super::render_info::RenderInfo;
use super::shaders;
use super::uniform::{Uniform, UniformValue};
use super::RenderContext;

/// Built-in technique family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechniqueKind {
    /// Shaded per-vertex colour, grey without colours
    Default,
    /// Single flat colour
    MonoColor,
    /// Texture lookup through texcoords
    Texture,
    /// Glyph quads, signed distance field or coverage
    Text {
        /// Glyph atlas holds distances rather than coverage
        sdf: bool,
    },
}

/// Program plus uniform values used to draw one geometry
#[derive(Debug, Clone)]
pub struct RenderTechnique {
    name: String,
    uuid: Uuid,
    kind: TechniqueKind,
    program: ProgramKey,
    uniforms: BTreeMap<String, Uniform>,
}

impl RenderTechnique {
    fn with_program(
        programs: &mut ProgramCache,
        name: &str,
        kind: TechniqueKind,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            uuid: Uuid::new_v4(),
            kind,
            program: programs.get_or_insert(name, vertex_source, fragment_source),
            uniforms: BTreeMap::new(),
        }
    }

    /// Shaded geometry technique every new geometry starts with
    pub fn default_shading(programs: &mut ProgramCache) -> Self {
        Self::with_program(
            programs,
            "Default",
            TechniqueKind::Default,
            shaders::DEFAULT_VERTEX,
            shaders::DEFAULT_FRAGMENT,
        )
    }

    /// Flat colour, red until changed
    pub fn mono_color(programs: &mut ProgramCache) -> Self {
        let mut technique = Self::with_program(
            programs,
            "MonoColor",
            TechniqueKind::MonoColor,
            shaders::MONO_COLOR_VERTEX,
            shaders::MONO_COLOR_FRAGMENT,
        );
        technique.set_uniform("uColor", Vec4::new(1.0, 0.0, 0.0, 1.0));
        technique
    }

    /// Texture sampled from unit 0
    pub fn texture(programs: &mut ProgramCache) -> Self {
        let mut technique = Self::with_program(
            programs,
            "Texture",
            TechniqueKind::Texture,
            shaders::TEXTURE_VERTEX,
            shaders::TEXTURE_FRAGMENT,
        );
        technique.set_uniform("uTexture", 0);
        technique
    }

    /// Text in white, sampled from unit 0
    pub fn text(programs: &mut ProgramCache, sdf: bool) -> Self {
        let mut technique = Self::with_program(
            programs,
            "Text",
            TechniqueKind::Text { sdf },
            shaders::TEXTURE_VERTEX,
            shaders::TEXT_FRAGMENT,
        );
        technique.set_uniform("uTexture", 0);
        technique.set_uniform("uColor", Vec4::new(1.0, 1.0, 1.0, 1.0));
        technique.set_uniform("uSdf", sdf);
        technique
    }

    /// Technique name, shared with its program
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Technique family
    pub const fn kind(&self) -> TechniqueKind {
        self.kind
    }

    /// Key of the program in the cache
    pub const fn program(&self) -> ProgramKey {
        self.program
    }

    /// Value of a uniform
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).map(Uniform::value)
    }

    /// Add a uniform or replace its value
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        match self.uniforms.get_mut(name) {
            Some(uniform) => uniform.set_value(value),
            None => {
                self.uniforms.insert(name.to_string(), Uniform::new(name, value));
            }
        }
    }

    /// Remove a uniform
    pub fn remove_uniform(&mut self, name: &str) -> bool {
        self.uniforms.remove(name).is_some()
    }

    /// Remove every uniform
    pub fn clear_uniforms(&mut self) {
        self.uniforms.clear();
    }

    /// Uniforms in name order
    pub fn uniforms(&self) -> impl Iterator<Item = &Uniform> {
        self.uniforms.values()
    }

    /// `uColor`, when the technique has one
    pub fn color(&self) -> Option<Vec4> {
        match self.uniform("uColor") {
            Some(UniformValue::Vec4(color)) => Some(*color),
            _ => None,
        }
    }

    /// Set `uColor`
    pub fn set_color(&mut self, color: Vec4) {
        self.set_uniform("uColor", color);
    }

    /// Sampler unit of `uTexture`, when the technique has one
    pub fn texture_unit(&self) -> Option<i32> {
        match self.uniform("uTexture") {
            Some(UniformValue::Int(unit)) => Some(*unit),
            _ => None,
        }
    }

    /// Set the sampler unit of `uTexture`
    pub fn set_texture_unit(&mut self, unit: i32) {
        self.set_uniform("uTexture", unit);
    }

    /// Make the program current and upload matrices and uniforms
    ///
    /// Does nothing when the program is missing from the cache or fails to
    /// link.
    pub fn apply(&mut self, ctx: &mut RenderContext<'_>, info: &RenderInfo, has_color: bool, has_texture: bool) {
        let Some(program) = ctx.programs.get_mut(self.program) else {
            log::warn!("Technique '{}' refers to a program that is not cached", self.name);
            return;
        };
        program.bind(ctx.device);
        let Some(handle) = program.handle() else {
            return;
        };

        program.bind_matrices(ctx.device, &info.mv, &info.mvp());
        program.set_uniform(ctx.device, "uHasColor", &UniformValue::Bool(has_color));
        program.set_uniform(ctx.device, "uHasTexture", &UniformValue::Bool(has_texture));

        for uniform in self.uniforms.values_mut() {
            uniform.bind(ctx.device, handle);
        }
    }
}
