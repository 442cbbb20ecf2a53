//! STL, ascii and binary
//!
//! Binary files may carry a 15 bit face colour in the attribute word:
//! bit 15 marks it valid, red sits in bits 10-14, green in 5-9 and blue in
//! 0-4.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::foundation::math::{Vec3, Vec4};

use super::mesh::MeshData;
use super::MeshError;

const HEADER_SIZE: usize = 80;
const FACET_SIZE: usize = 50;
const COLOR_VALID: u16 = 0x8000;

pub(super) fn read(path: &Path) -> Result<MeshData, MeshError> {
    let bytes = std::fs::read(path)?;
    if is_binary(&bytes) {
        read_binary(&bytes)
    } else {
        let text = String::from_utf8_lossy(&bytes);
        read_ascii(&text)
    }
}

pub(super) fn write(
    path: &Path,
    mesh: &MeshData,
    binary: bool,
    color_mode: bool,
) -> Result<(), MeshError> {
    if mesh.triangles.is_empty() {
        return Err(MeshError::InvalidGeometry("STL needs triangles".to_string()));
    }
    let mut out = BufWriter::new(File::create(path)?);
    if binary {
        write_binary(&mut out, mesh, color_mode)?;
    } else {
        write_ascii(&mut out, mesh)?;
    }
    out.flush()?;
    Ok(())
}

/// A binary file's size is fixed by its facet count
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() >= HEADER_SIZE + 4 {
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
        if HEADER_SIZE + 4 + FACET_SIZE * count == bytes.len() {
            return true;
        }
    }
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    !bytes[start..].starts_with(b"solid")
}

fn header_text() -> String {
    format!("STL generated by Dental {}", chrono::Local::now().format("%Y-%m-%d"))
}

fn read_binary(bytes: &[u8]) -> Result<MeshData, MeshError> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(MeshError::Parse("binary STL shorter than its header".to_string()));
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let body = &bytes[HEADER_SIZE + 4..];
    if body.len() < count * FACET_SIZE {
        return Err(MeshError::Parse(format!(
            "binary STL declares {} facets but holds {}",
            count,
            body.len() / FACET_SIZE
        )));
    }

    let mut mesh = MeshData::default();
    let mut face_colors = Vec::with_capacity(count);
    for facet in body.chunks_exact(FACET_SIZE).take(count) {
        let float = |at: usize| f32::from_le_bytes([facet[at], facet[at + 1], facet[at + 2], facet[at + 3]]);
        let base = mesh.positions.len() as u32;
        // facet normal at 0..12 is recomputed from the winding
        for corner in 0..3 {
            let at = 12 + corner * 12;
            mesh.positions.push(Vec3::new(float(at), float(at + 4), float(at + 8)));
        }
        mesh.triangles.push([base, base + 1, base + 2]);
        face_colors.push(decode_color(u16::from_le_bytes([facet[48], facet[49]])));
    }

    if face_colors.iter().any(Option::is_some) {
        // keep corners unshared so each face can carry its own colour
        mesh.colors = face_colors
            .into_iter()
            .flat_map(|c| [c.unwrap_or_else(|| Vec4::new(1.0, 1.0, 1.0, 1.0)); 3])
            .collect();
    } else {
        mesh.weld();
    }
    Ok(mesh)
}

fn read_ascii(text: &str) -> Result<MeshData, MeshError> {
    let mut mesh = MeshData::default();
    let mut corners = 0;

    for (number, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("vertex") => {
                let mut coordinate = || -> Result<f32, MeshError> {
                    words
                        .next()
                        .and_then(|w| w.parse().ok())
                        .ok_or_else(|| MeshError::Parse(format!("bad vertex on line {}", number + 1)))
                };
                let p = Vec3::new(coordinate()?, coordinate()?, coordinate()?);
                mesh.positions.push(p);
                corners += 1;
            }
            Some("endloop") => {
                if corners != 3 {
                    return Err(MeshError::Parse(format!(
                        "facet ending on line {} has {} vertices",
                        number + 1,
                        corners
                    )));
                }
                let base = mesh.positions.len() as u32 - 3;
                mesh.triangles.push([base, base + 1, base + 2]);
                corners = 0;
            }
            _ => {}
        }
    }

    if mesh.triangles.is_empty() {
        return Err(MeshError::Parse("no facets".to_string()));
    }
    mesh.weld();
    Ok(mesh)
}

fn write_ascii(out: &mut impl Write, mesh: &MeshData) -> Result<(), MeshError> {
    let header = header_text();
    writeln!(out, "solid {}", header)?;
    for (triangle, normal) in mesh.triangles.iter().zip(mesh.face_normals()) {
        writeln!(out, "  facet normal {:e} {:e} {:e}", normal.x, normal.y, normal.z)?;
        writeln!(out, "    outer loop")?;
        for &i in triangle {
            let p = mesh.positions[i as usize];
            writeln!(out, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {}", header)?;
    Ok(())
}

fn write_binary(out: &mut impl Write, mesh: &MeshData, color_mode: bool) -> Result<(), MeshError> {
    let mut header = [0_u8; HEADER_SIZE];
    let text = header_text();
    let len = text.len().min(HEADER_SIZE);
    header[..len].copy_from_slice(&text.as_bytes()[..len]);
    out.write_all(&header)?;
    out.write_all(&(mesh.triangles.len() as u32).to_le_bytes())?;

    let colors = if color_mode { mesh.face_colors() } else { Vec::new() };
    for (face, (triangle, normal)) in mesh.triangles.iter().zip(mesh.face_normals()).enumerate() {
        for value in normal.iter() {
            out.write_all(&value.to_le_bytes())?;
        }
        for &i in triangle {
            for value in mesh.positions[i as usize].iter() {
                out.write_all(&value.to_le_bytes())?;
            }
        }
        let attribute = colors.get(face).map_or(0, encode_color);
        out.write_all(&attribute.to_le_bytes())?;
    }
    Ok(())
}

fn encode_color(color: &Vec4) -> u16 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 31.0).round() as u16;
    COLOR_VALID | (channel(color.x) << 10) | (channel(color.y) << 5) | channel(color.z)
}

fn decode_color(attribute: u16) -> Option<Vec4> {
    if attribute & COLOR_VALID == 0 {
        return None;
    }
    let channel = |shift: u16| ((attribute >> shift) & 0x1F) as f32 / 31.0;
    Some(Vec4::new(channel(10), channel(5), channel(0), 1.0))
}
