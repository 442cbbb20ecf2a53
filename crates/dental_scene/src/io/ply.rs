//! Stanford PLY

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Header, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::foundation::math::{Vec2, Vec3, Vec4};

use super::mesh::MeshData;
use super::MeshError;

pub(super) fn read(path: &Path) -> Result<MeshData, MeshError> {
    let mut reader = BufReader::new(File::open(path)?);
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(&mut reader).map_err(parse_error)?;

    // elements must be consumed in header order
    let mut vertices = None;
    let mut faces = Vec::new();
    for (name, def) in &header.elements {
        let elements = parser
            .read_payload_for_element(&mut reader, def, &header)
            .map_err(|e| MeshError::Parse(format!("element '{}': {}", name, e)))?;
        match name.as_str() {
            "vertex" => vertices = Some(elements),
            "face" => faces = elements,
            _ => {}
        }
    }
    let vertices = vertices.ok_or_else(|| MeshError::Parse("no vertex element".to_string()))?;

    let mut mesh = MeshData::default();
    let first = vertices.first();
    let has = |names: &[&str]| first.map_or(false, |v| names.iter().all(|n| v.contains_key(*n)));
    let has_normals = has(&["nx", "ny", "nz"]);
    let has_colors = has(&["red", "green", "blue"]);
    let texcoord_names = if has(&["s", "t"]) {
        Some(("s", "t"))
    } else if has(&["u", "v"]) {
        Some(("u", "v"))
    } else {
        None
    };

    for vertex in &vertices {
        mesh.positions.push(Vec3::new(
            scalar(vertex, "x")?,
            scalar(vertex, "y")?,
            scalar(vertex, "z")?,
        ));
        if has_normals {
            mesh.normals.push(Vec3::new(
                scalar(vertex, "nx")?,
                scalar(vertex, "ny")?,
                scalar(vertex, "nz")?,
            ));
        }
        if has_colors {
            let alpha = if vertex.contains_key("alpha") {
                channel(vertex, "alpha")?
            } else {
                1.0
            };
            mesh.colors.push(Vec4::new(
                channel(vertex, "red")?,
                channel(vertex, "green")?,
                channel(vertex, "blue")?,
                alpha,
            ));
        }
        if let Some((s, t)) = texcoord_names {
            mesh.texcoords.push(Vec2::new(scalar(vertex, s)?, scalar(vertex, t)?));
        }
    }

    for face in &faces {
        let corners = face_indices(face)?;
        // fan triangulation for polygons
        for i in 1..corners.len().saturating_sub(1) {
            mesh.triangles.push([corners[0], corners[i], corners[i + 1]]);
        }
    }
    if !faces.is_empty() && mesh.triangles.is_empty() {
        return Err(MeshError::Parse(format!(
            "{} faces declared but none has three corners",
            faces.len()
        )));
    }

    mesh.validate().map_err(|e| MeshError::Parse(e.to_string()))?;
    Ok(mesh)
}

pub(super) fn write(path: &Path, mesh: &MeshData, binary: bool) -> Result<(), MeshError> {
    let mut header = Header::new();
    header.encoding = if binary {
        Encoding::BinaryLittleEndian
    } else {
        Encoding::Ascii
    };
    header.comments.push("PLY generated by Dental".to_string());

    let float = PropertyType::Scalar(ScalarType::Float);
    let uchar = PropertyType::Scalar(ScalarType::UChar);
    let has_normals = !mesh.normals.is_empty();
    let has_colors = !mesh.colors.is_empty();
    let has_texcoords = !mesh.texcoords.is_empty();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    vertex_def.count = mesh.positions.len();
    let mut add = |name: &str, kind: &PropertyType| {
        vertex_def.properties.add(PropertyDef::new(name.to_string(), kind.clone()));
    };
    for name in ["x", "y", "z"] {
        add(name, &float);
    }
    if has_normals {
        for name in ["nx", "ny", "nz"] {
            add(name, &float);
        }
    }
    if has_colors {
        for name in ["red", "green", "blue", "alpha"] {
            add(name, &uchar);
        }
    }
    if has_texcoords {
        for name in ["s", "t"] {
            add(name, &float);
        }
    }
    header.elements.add(vertex_def.clone());

    let mut face_def = ElementDef::new("face".to_string());
    face_def.count = mesh.triangles.len();
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    header.elements.add(face_def.clone());

    let mut vertices = Vec::with_capacity(mesh.positions.len());
    for (i, p) in mesh.positions.iter().enumerate() {
        let mut vertex = DefaultElement::new();
        vertex.insert("x".to_string(), Property::Float(p.x));
        vertex.insert("y".to_string(), Property::Float(p.y));
        vertex.insert("z".to_string(), Property::Float(p.z));
        if let Some(n) = mesh.normals.get(i) {
            vertex.insert("nx".to_string(), Property::Float(n.x));
            vertex.insert("ny".to_string(), Property::Float(n.y));
            vertex.insert("nz".to_string(), Property::Float(n.z));
        }
        if let Some(c) = mesh.colors.get(i) {
            for (name, value) in ["red", "green", "blue", "alpha"].into_iter().zip(c.iter()) {
                vertex.insert(name.to_string(), Property::UChar(to_byte(*value)));
            }
        }
        if let Some(t) = mesh.texcoords.get(i) {
            vertex.insert("s".to_string(), Property::Float(t.x));
            vertex.insert("t".to_string(), Property::Float(t.y));
        }
        vertices.push(vertex);
    }

    let writer = Writer::<DefaultElement>::new();
    let mut out = BufWriter::new(File::create(path)?);
    writer.write_header(&mut out, &header)?;
    writer.write_payload_of_element(&mut out, &vertices, &vertex_def, &header)?;
    if binary {
        // ply-rs prefixes binary lists with the element count instead of the list length
        for triangle in &mesh.triangles {
            out.write_all(&[3])?;
            for &i in triangle {
                out.write_all(&(i as i32).to_le_bytes())?;
            }
        }
    } else {
        let faces: Vec<DefaultElement> = mesh
            .triangles
            .iter()
            .map(|t| {
                let mut face = DefaultElement::new();
                face.insert(
                    "vertex_indices".to_string(),
                    Property::ListInt(t.iter().map(|&i| i as i32).collect()),
                );
                face
            })
            .collect();
        writer.write_payload_of_element(&mut out, &faces, &face_def, &header)?;
    }
    out.flush()?;
    Ok(())
}

fn parse_error(e: std::io::Error) -> MeshError {
    MeshError::Parse(e.to_string())
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn scalar(element: &DefaultElement, name: &str) -> Result<f32, MeshError> {
    match element.get(name) {
        Some(Property::Float(v)) => Ok(*v),
        Some(Property::Double(v)) => Ok(*v as f32),
        Some(Property::Int(v)) => Ok(*v as f32),
        Some(Property::UInt(v)) => Ok(*v as f32),
        Some(Property::Short(v)) => Ok(*v as f32),
        Some(Property::UShort(v)) => Ok(*v as f32),
        Some(Property::Char(v)) => Ok(*v as f32),
        Some(Property::UChar(v)) => Ok(*v as f32),
        _ => Err(MeshError::Parse(format!("property '{}' missing or not a scalar", name))),
    }
}

/// Colour channel in 0..1; integer channels are 8 bit, float channels pass through
fn channel(element: &DefaultElement, name: &str) -> Result<f32, MeshError> {
    match element.get(name) {
        Some(Property::UChar(v)) => Ok(*v as f32 / 255.0),
        Some(Property::Float(v)) => Ok(*v),
        Some(Property::Double(v)) => Ok(*v as f32),
        _ => scalar(element, name).map(|v| v / 255.0),
    }
}

fn face_indices(element: &DefaultElement) -> Result<Vec<u32>, MeshError> {
    let list = element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"));
    match list {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.clone()),
        Some(Property::ListShort(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        Some(Property::ListUShort(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        Some(Property::ListUChar(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        Some(Property::ListChar(indices)) => Ok(indices.iter().map(|&i| i as u32).collect()),
        _ => Err(MeshError::Parse("face without vertex indices".to_string())),
    }
}
