//! Axis aligned bounding box

use crate::foundation::math::Vec3;

use super::BoundingSphere;

/// Axis aligned bounding box
///
/// The invalid box has `min = +MAX` and `max = -MAX`, so that the first point
/// it is expanded by becomes both corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::invalid()
    }
}

impl BoundingBox {
    /// Box holding no data
    pub fn invalid() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// Box with the given corners
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut bb = Self::invalid();
        bb.expand_by_points(points);
        bb
    }

    /// Reset to the invalid state
    pub fn init(&mut self) {
        *self = Self::invalid();
    }

    /// Replace both corners
    pub fn set(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.max = max;
    }

    /// True when `min <= max` on every axis
    pub fn valid(&self) -> bool {
        self.max.x >= self.min.x && self.max.y >= self.min.y && self.max.z >= self.min.z
    }

    /// Minimum corner
    pub const fn min(&self) -> &Vec3 {
        &self.min
    }

    /// Maximum corner
    pub const fn max(&self) -> &Vec3 {
        &self.max
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the diagonal length
    pub fn radius(&self) -> f32 {
        self.radius2().sqrt()
    }

    /// Squared half diagonal
    pub fn radius2(&self) -> f32 {
        0.25 * (self.max - self.min).norm_squared()
    }

    /// One of the eight corners
    ///
    /// Bit 0 of `pos` selects max x, bit 1 max y, bit 2 max z.
    pub fn corner(&self, pos: u32) -> Vec3 {
        Vec3::new(
            if pos & 1 == 0 { self.min.x } else { self.max.x },
            if pos & 2 == 0 { self.min.y } else { self.max.y },
            if pos & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    /// Grow to include a point
    pub fn expand_by_point(&mut self, v: &Vec3) {
        self.min = self.min.inf(v);
        self.max = self.max.sup(v);
    }

    /// Grow to include every point; an empty iterator is a no-op
    pub fn expand_by_points<'a, I>(&mut self, points: I)
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        for v in points {
            self.expand_by_point(v);
        }
    }

    /// Grow to include another box; invalid boxes are ignored
    pub fn expand_by_box(&mut self, bb: &Self) {
        if !bb.valid() {
            return;
        }
        self.min = self.min.inf(&bb.min);
        self.max = self.max.sup(&bb.max);
    }

    /// Grow to include a sphere; invalid spheres are ignored
    pub fn expand_by_sphere(&mut self, sh: &BoundingSphere) {
        if !sh.valid() {
            return;
        }
        let r = Vec3::repeat(sh.radius());
        self.min = self.min.inf(&(sh.center() - r));
        self.max = self.max.sup(&(sh.center() + r));
    }

    /// Overlap of two boxes, invalid when they are disjoint
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(self.min.sup(&other.min), self.max.inf(&other.max))
    }

    /// True when the boxes overlap
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersect(other).valid()
    }

    /// True when the point lies inside or on the boundary
    pub fn contains(&self, v: &Vec3) -> bool {
        self.valid()
            && v.x >= self.min.x && v.x <= self.max.x
            && v.y >= self.min.y && v.y <= self.max.y
            && v.z >= self.min.z && v.z <= self.max.z
    }

    /// True when `other` lies entirely inside this box
    pub fn contains_box(&self, other: &Self) -> bool {
        other.valid() && self.contains(&other.min) && self.contains(&other.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_box(rng: &mut StdRng) -> BoundingBox {
        let a = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        let b = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        BoundingBox::new(a.inf(&b), a.sup(&b))
    }

    #[test]
    fn test_default_is_invalid() {
        let bb = BoundingBox::default();
        assert!(!bb.valid());
        assert!(!bb.contains(&Vec3::zeros()));
    }

    #[test]
    fn test_first_point_makes_degenerate_box() {
        let mut bb = BoundingBox::invalid();
        bb.expand_by_point(&Vec3::new(1.0, 2.0, 3.0));
        assert!(bb.valid());
        assert_eq!(*bb.min(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(*bb.max(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bb.radius(), 0.0);
    }

    #[test]
    fn test_triangle_box() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let bb = BoundingBox::from_points(points.iter());
        assert_eq!(*bb.min(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(*bb.max(), Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(bb.center(), Vec3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(bb.radius(), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn test_expand_by_invalid_is_noop() {
        let bb = BoundingBox::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 5.0));
        let mut expanded = bb;
        expanded.expand_by_box(&BoundingBox::invalid());
        assert_eq!(expanded, bb);
        expanded.expand_by_points(std::iter::empty());
        assert_eq!(expanded, bb);
        expanded.expand_by_sphere(&BoundingSphere::invalid());
        assert_eq!(expanded, bb);
    }

    #[test]
    fn test_invalid_adopts_box() {
        let other = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 2.0, 3.0));
        let mut bb = BoundingBox::invalid();
        bb.expand_by_box(&other);
        assert_eq!(bb, other);
    }

    #[test]
    fn test_expand_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = random_box(&mut rng);
            let b = random_box(&mut rng);
            let mut merged = a;
            merged.expand_by_box(&b);
            assert!(merged.valid());
            assert!(merged.min().x <= merged.max().x);
            assert!(merged.contains_box(&a));
            assert!(merged.contains_box(&b));
        }
    }

    #[test]
    fn test_corners() {
        let bb = BoundingBox::new(Vec3::new(0.0, 1.0, 2.0), Vec3::new(10.0, 11.0, 12.0));
        assert_eq!(bb.corner(0), Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(bb.corner(1), Vec3::new(10.0, 1.0, 2.0));
        assert_eq!(bb.corner(2), Vec3::new(0.0, 11.0, 2.0));
        assert_eq!(bb.corner(4), Vec3::new(0.0, 1.0, 12.0));
        assert_eq!(bb.corner(7), Vec3::new(10.0, 11.0, 12.0));
    }

    #[test]
    fn test_expand_by_sphere() {
        let mut bb = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        bb.expand_by_sphere(&BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 2.0));
        assert_eq!(*bb.min(), Vec3::new(0.0, -2.0, -2.0));
        assert_eq!(*bb.max(), Vec3::new(7.0, 2.0, 2.0));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let b = BoundingBox::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let c = BoundingBox::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 6.0, 6.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        let overlap = a.intersect(&b);
        assert_eq!(*overlap.min(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(*overlap.max(), Vec3::new(2.0, 2.0, 2.0));
    }
}
