//! Wavefront OBJ

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::foundation::math::{Vec2, Vec3, Vec4};

use super::mesh::MeshData;
use super::MeshError;

/// Read every model in the file into one mesh
///
/// Faces are triangulated and vertices are re-indexed so positions,
/// normals and texture coordinates share one index.
pub(super) fn read(path: &Path) -> Result<MeshData, MeshError> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj(path, &options).map_err(|e| MeshError::Parse(e.to_string()))?;

    let mut data = MeshData::default();
    let mut with_normals = true;
    let mut with_colors = true;
    let mut with_texcoords = true;

    for model in &models {
        let mesh = &model.mesh;
        let base = data.positions.len() as u32;
        let count = mesh.positions.len() / 3;

        data.positions
            .extend(mesh.positions.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])));

        with_normals &= mesh.normals.len() == count * 3;
        if with_normals {
            data.normals
                .extend(mesh.normals.chunks_exact(3).map(|n| Vec3::new(n[0], n[1], n[2])));
        }
        with_colors &= mesh.vertex_color.len() == count * 3;
        if with_colors {
            data.colors
                .extend(mesh.vertex_color.chunks_exact(3).map(|c| Vec4::new(c[0], c[1], c[2], 1.0)));
        }
        with_texcoords &= mesh.texcoords.len() == count * 2;
        if with_texcoords {
            data.texcoords
                .extend(mesh.texcoords.chunks_exact(2).map(|t| Vec2::new(t[0], t[1])));
        }

        data.triangles.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|t| [base + t[0], base + t[1], base + t[2]]),
        );
    }

    // an attribute only some models carry is dropped entirely
    if !with_normals {
        data.normals.clear();
    }
    if !with_colors {
        data.colors.clear();
    }
    if !with_texcoords {
        data.texcoords.clear();
    }

    data.validate().map_err(|e| MeshError::Parse(e.to_string()))?;
    Ok(data)
}

pub(super) fn write(path: &Path, mesh: &MeshData) -> Result<(), MeshError> {
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "# OBJ generated by Dental")?;
    writeln!(out, "# {} vertices, {} faces", mesh.positions.len(), mesh.triangles.len())?;

    for (i, p) in mesh.positions.iter().enumerate() {
        match mesh.colors.get(i) {
            Some(c) => writeln!(out, "v {} {} {} {} {} {}", p.x, p.y, p.z, c.x, c.y, c.z)?,
            None => writeln!(out, "v {} {} {}", p.x, p.y, p.z)?,
        }
    }
    for t in &mesh.texcoords {
        writeln!(out, "vt {} {}", t.x, t.y)?;
    }
    for n in &mesh.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    let has_texcoords = !mesh.texcoords.is_empty();
    let has_normals = !mesh.normals.is_empty();
    let corner = |i: u32| {
        let i = i + 1;
        match (has_texcoords, has_normals) {
            (false, false) => format!("{}", i),
            (true, false) => format!("{}/{}", i, i),
            (false, true) => format!("{}//{}", i, i),
            (true, true) => format!("{}/{}/{}", i, i, i),
        }
    };
    for &[a, b, c] in &mesh.triangles {
        writeln!(out, "f {} {} {}", corner(a), corner(b), corner(c))?;
    }

    out.flush()?;
    Ok(())
}
