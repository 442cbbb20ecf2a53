//! # Mesh and Image I/O
//!
//! File entry points report through a [`Status`] and a message instead of
//! an error type, so callers can show the message as is. Internally every
//! format returns [`MeshError`] / [`ImageError`].
//!
//! | Extension | Read | Write |
//! |-----------|------|-------|
//! | `.obj`    | yes  | ascii |
//! | `.ply`    | yes  | ascii, binary |
//! | `.stl`    | yes  | ascii, binary, coloured binary |

mod image_io;
pub mod mesh;
mod obj;
mod ply;
mod stl;

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::scene::Geometry;

pub use image_io::{read_image, read_image_from_memory, write_image};
pub use mesh::MeshData;

/// Outcome of a read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Read succeeded
    FileLoaded,
    /// Write succeeded
    FileSaved,
    /// Nothing exists at the path
    FileNotFound,
    /// Format or data not handled
    FileNotHandled,
    /// The file exists but could not be decoded
    ErrorInReadingFile,
    /// The file could not be written
    ErrorInWritingFile,
}

/// Mesh I/O errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed file contents
    #[error("Parse error: {0}")]
    Parse(String),

    /// Geometry that cannot be written
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Image I/O errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Undecodable data
    #[error("Decode error: {0}")]
    Decode(String),

    /// Encoder failure
    #[error("Encode error: {0}")]
    Encode(String),

    /// Unsupported format or pixel layout
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Key selecting binary output for PLY and STL
pub const OPTION_BINARY: &str = "Binary";
/// Key selecting per-face colours in binary STL
pub const OPTION_COLOR_MODE: &str = "ColorMode";

/// String options for [`write`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    options: BTreeMap<String, String>,
}

impl WriteOptions {
    /// No options set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Value of an option, empty when unset
    pub fn option(&self, key: &str) -> &str {
        self.options.get(key).map_or("", String::as_str)
    }

    /// Write PLY and STL in binary
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.set_option(OPTION_BINARY, if binary { "1" } else { "0" });
        self
    }

    /// Write vertex colours as STL face colours
    pub fn with_color_mode(mut self, color_mode: bool) -> Self {
        self.set_option(OPTION_COLOR_MODE, if color_mode { "1" } else { "0" });
        self
    }

    /// True when binary output was asked for
    pub fn binary(&self) -> bool {
        self.option(OPTION_BINARY) == "1"
    }

    /// True when STL face colours were asked for
    pub fn color_mode(&self) -> bool {
        self.option(OPTION_COLOR_MODE) == "1"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshFormat {
    Obj,
    Ply,
    Stl,
}

impl MeshFormat {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// True for `.obj`, `.ply` and `.stl`, in any case, with or without the dot
pub fn accepts_extension(extension: &str) -> bool {
    MeshFormat::from_extension(extension).is_some()
}

/// Load a mesh as a geometry named after the file
pub fn read(path: impl AsRef<Path>) -> (Option<Geometry>, Status, String) {
    let path = path.as_ref();
    let file_name = path.display().to_string();

    if !path.exists() {
        return (None, Status::FileNotFound, format!("{} not found!", file_name));
    }
    let Some(format) = MeshFormat::from_path(path) else {
        return (None, Status::FileNotHandled, format!("{} not support!", file_name));
    };

    let result = match format {
        MeshFormat::Obj => obj::read(path),
        MeshFormat::Ply => ply::read(path),
        MeshFormat::Stl => stl::read(path),
    };

    match result {
        Ok(mesh) => {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            log::info!(
                "Loaded {}: {} vertices, {} triangles",
                file_name,
                mesh.positions.len(),
                mesh.triangles.len()
            );
            (Some(mesh.into_geometry(name)), Status::FileLoaded, String::new())
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", file_name, e);
            (None, Status::ErrorInReadingFile, e.to_string())
        }
    }
}

/// Save a geometry's vertex data and triangles
pub fn write(path: impl AsRef<Path>, geometry: &Geometry, options: &WriteOptions) -> (Status, String) {
    let path = path.as_ref();
    let file_name = path.display().to_string();

    let Some(format) = MeshFormat::from_path(path) else {
        return (Status::FileNotHandled, format!("{} not support!", file_name));
    };

    let mesh = match MeshData::from_geometry(geometry) {
        Ok(mesh) => mesh,
        Err(e) => {
            log::warn!("Refusing to write {}: {}", file_name, e);
            return (Status::FileNotHandled, "geometry's data is invalid!".to_string());
        }
    };

    let result = match format {
        MeshFormat::Obj => obj::write(path, &mesh),
        MeshFormat::Ply => ply::write(path, &mesh, options.binary()),
        MeshFormat::Stl => stl::write(path, &mesh, options.binary(), options.color_mode()),
    };

    match result {
        Ok(()) => {
            log::info!("Saved {}", file_name);
            (Status::FileSaved, String::new())
        }
        Err(e) => {
            log::warn!("Failed to write {}: {}", file_name, e);
            (Status::ErrorInWritingFile, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use crate::gpu::PrimitiveMode;
    use crate::render::DrawElements;

    pub(crate) fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dental_scene_io_{}_{}", std::process::id(), name))
    }

    pub(crate) fn quad() -> Geometry {
        let mut geometry = Geometry::with_name("quad");
        geometry.set_vertices(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        geometry.set_colors(vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 4]);
        geometry.add_primitive_set(DrawElements::from_indices(
            PrimitiveMode::Triangles,
            vec![0_u32, 1, 2, 0, 2, 3],
        ));
        geometry
    }

    #[test]
    fn test_accepts_extension() {
        assert!(accepts_extension(".ply"));
        assert!(accepts_extension(".STL"));
        assert!(accepts_extension("obj"));
        assert!(!accepts_extension(".off"));
        assert!(!accepts_extension(""));
    }

    #[test]
    fn test_write_options() {
        let options = WriteOptions::new().with_binary(true);
        assert!(options.binary());
        assert!(!options.color_mode());
        assert_eq!(options.option("Binary"), "1");
        assert_eq!(options.option("Missing"), "");
    }

    #[test]
    fn test_read_missing_file() {
        let (geometry, status, message) = read("/definitely/not/here.stl");
        assert!(geometry.is_none());
        assert_eq!(status, Status::FileNotFound);
        assert_eq!(message, "/definitely/not/here.stl not found!");
    }

    #[test]
    fn test_read_unsupported_extension() {
        let path = scratch("mesh.off");
        std::fs::write(&path, "OFF\n").unwrap();
        let (geometry, status, message) = read(&path);
        std::fs::remove_file(&path).ok();
        assert!(geometry.is_none());
        assert_eq!(status, Status::FileNotHandled);
        assert!(message.ends_with("not support!"));
    }

    #[test]
    fn test_write_rejects_empty_geometry() {
        let (status, message) = write(scratch("empty.ply"), &Geometry::new(), &WriteOptions::new());
        assert_eq!(status, Status::FileNotHandled);
        assert_eq!(message, "geometry's data is invalid!");
    }

    #[test]
    fn test_write_rejects_unknown_extension() {
        let (status, _) = write(scratch("quad.off"), &quad(), &WriteOptions::new());
        assert_eq!(status, Status::FileNotHandled);
    }

    #[test]
    fn test_round_trip_every_format() {
        for (name, options) in [
            ("quad.obj", WriteOptions::new()),
            ("quad_ascii.ply", WriteOptions::new()),
            ("quad_binary.ply", WriteOptions::new().with_binary(true)),
            ("quad_ascii.stl", WriteOptions::new()),
            ("quad_binary.stl", WriteOptions::new().with_binary(true)),
        ] {
            let path = scratch(name);
            let (status, message) = write(&path, &quad(), &options);
            assert_eq!(status, Status::FileSaved, "{}: {}", name, message);

            let (geometry, status, message) = read(&path);
            std::fs::remove_file(&path).ok();
            assert_eq!(status, Status::FileLoaded, "{}: {}", name, message);

            let geometry = geometry.unwrap();
            assert_eq!(geometry.vertices().len(), 4, "{}", name);
            assert_eq!(geometry.normals().len(), 4, "{}", name);
            assert_eq!(geometry.primitive_set(0).unwrap().num_primitives(), 2, "{}", name);
            let stem = name.trim_end_matches(|c| c != '.').trim_end_matches('.');
            assert!(geometry.name().ends_with(stem), "{}", geometry.name());
        }
    }
}
