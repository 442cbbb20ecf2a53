//! Format independent triangle mesh

use std::collections::HashMap;

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::gpu::PrimitiveMode;
use crate::render::DrawElements;
use crate::scene::Geometry;

use super::MeshError;

/// Indexed triangle mesh with optional per-vertex attributes
///
/// Attribute vectors are either empty or as long as `positions`. A mesh
/// without triangles is a point cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals
    pub normals: Vec<Vec3>,
    /// Vertex colours (RGBA, 0..1)
    pub colors: Vec<Vec4>,
    /// Texture coordinates
    pub texcoords: Vec<Vec2>,
    /// Triangle corner indices
    pub triangles: Vec<[u32; 3]>,
}

impl MeshData {
    /// Check attribute lengths and index ranges
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.positions.len();
        if n == 0 {
            return Err(MeshError::InvalidGeometry("no vertices".to_string()));
        }
        for (name, len) in [
            ("normal", self.normals.len()),
            ("color", self.colors.len()),
            ("texcoord", self.texcoords.len()),
        ] {
            if len != 0 && len != n {
                return Err(MeshError::InvalidGeometry(format!(
                    "{} count {} does not match {} vertices",
                    name, len, n
                )));
            }
        }
        if let Some(bad) = self.triangles.iter().flatten().find(|&&i| i as usize >= n) {
            return Err(MeshError::InvalidGeometry(format!("index {} out of range", bad)));
        }
        Ok(())
    }

    /// Area-weighted vertex normals
    ///
    /// Each triangle adds its unnormalized face normal, whose length is twice
    /// its area, to its corners. Vertices touching no triangle get +Z.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::zeros(); self.positions.len()];
        for &[a, b, c] in &self.triangles {
            let (pa, pb, pc) = (
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            );
            let face = (pb - pa).cross(&(pc - pa));
            for i in [a, b, c] {
                normals[i as usize] += face;
            }
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z))
            .collect();
    }

    /// Mean colour of each triangle's corners; empty without vertex colours
    pub fn face_colors(&self) -> Vec<Vec4> {
        if self.colors.is_empty() {
            return Vec::new();
        }
        self.triangles
            .iter()
            .map(|t| t.iter().map(|&i| self.colors[i as usize]).sum::<Vec4>() / 3.0)
            .collect()
    }

    /// Unit normal of each triangle
    pub fn face_normals(&self) -> Vec<Vec3> {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (pa, pb, pc) = (
                    self.positions[a as usize],
                    self.positions[b as usize],
                    self.positions[c as usize],
                );
                (pb - pa).cross(&(pc - pa)).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
            })
            .collect()
    }

    /// Merge vertices with bit-identical positions
    ///
    /// Only meaningful before any other attribute is attached.
    pub fn weld(&mut self) {
        let mut seen: HashMap<[u32; 3], u32> = HashMap::new();
        let mut positions = Vec::new();
        let mut remap = Vec::with_capacity(self.positions.len());
        for p in &self.positions {
            let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
            let index = *seen.entry(key).or_insert_with(|| {
                positions.push(*p);
                (positions.len() - 1) as u32
            });
            remap.push(index);
        }
        for triangle in &mut self.triangles {
            for i in triangle.iter_mut() {
                *i = remap[*i as usize];
            }
        }
        self.positions = positions;
    }

    /// Build a geometry, computing normals when none were read
    ///
    /// Triangles become one indexed triangle set; a point cloud becomes an
    /// indexed point set over every vertex.
    pub fn into_geometry(mut self, name: impl Into<String>) -> Geometry {
        if self.normals.is_empty() && !self.triangles.is_empty() {
            self.compute_normals();
        }

        let mut geometry = Geometry::with_name(name);
        let set = if self.triangles.is_empty() {
            DrawElements::from_indices(PrimitiveMode::Points, (0..self.positions.len() as u32).collect())
        } else {
            DrawElements::from_indices(
                PrimitiveMode::Triangles,
                self.triangles.iter().flatten().copied().collect::<Vec<u32>>(),
            )
        };

        geometry.set_vertices(self.positions);
        geometry.set_normals(self.normals);
        geometry.set_colors(self.colors);
        geometry.set_texcoords(self.texcoords);
        geometry.add_primitive_set(set);
        geometry
    }

    /// Copy a geometry's attributes and every triangle it draws
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, MeshError> {
        let triangles = geometry
            .primitive_sets()
            .iter()
            .filter(|set| set.mode() == PrimitiveMode::Triangles)
            .flat_map(|set| set.primitives())
            .filter_map(|corners| <[u32; 3]>::try_from(corners).ok())
            .collect();

        let mesh = Self {
            positions: geometry.vertices().to_vec(),
            normals: geometry.normals().to_vec(),
            colors: geometry.colors().to_vec(),
            texcoords: geometry.texcoords().to_vec(),
            triangles,
        };
        mesh.validate()?;
        Ok(mesh)
    }
}
