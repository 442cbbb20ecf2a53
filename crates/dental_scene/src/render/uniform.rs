//! Shader uniforms

use crate::foundation::math::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::gpu::{GraphicsDevice, ProgramHandle};

/// Value of a shader uniform
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// GLSL type name
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::IVec2(_) => "ivec2",
            Self::IVec3(_) => "ivec3",
            Self::IVec4(_) => "ivec4",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }
}

macro_rules! impl_from_value {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    Bool => bool,
    Int => i32,
    Float => f32,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

/// Named uniform with a location cached per program
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    name: String,
    value: UniformValue,
    location: Option<(ProgramHandle, Option<i32>)>,
}

impl Uniform {
    /// Create a uniform
    pub fn new(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            location: None,
        }
    }

    /// Name as declared in GLSL
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value
    pub const fn value(&self) -> &UniformValue {
        &self.value
    }

    /// Replace the value
    pub fn set_value(&mut self, value: impl Into<UniformValue>) {
        self.value = value.into();
    }

    /// Upload to `program`, which must be current
    ///
    /// Uniforms the program does not declare are skipped.
    pub fn bind(&mut self, device: &mut dyn GraphicsDevice, program: ProgramHandle) {
        let location = match self.location {
            Some((cached, location)) if cached == program => location,
            _ => {
                let location = device.uniform_location(program, &self.name);
                self.location = Some((program, location));
                location
            }
        };
        if let Some(location) = location {
            device.set_uniform(location, &self.value);
        }
    }
}
