//! Bounding sphere

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

use super::BoundingBox;

/// Radius given to a sphere created from a single point
const POINT_RADIUS: f32 = 1e-6;

/// Relative slack used by containment tests
const CONTAINS_EPSILON: f32 = 1e-5;

/// Bounding sphere
///
/// A negative radius marks the sphere invalid. Expansion is incremental: each
/// step grows the sphere just enough to include the new operand, which is
/// cheap but not globally minimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    center: Vec3,
    radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::invalid()
    }
}

impl BoundingSphere {
    /// Sphere holding no data
    pub fn invalid() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: -1.0,
        }
    }

    /// Sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centered on a box with the box's half diagonal as radius
    pub fn from_box(bb: &BoundingBox) -> Self {
        let mut sphere = Self::invalid();
        sphere.expand_by_box(bb);
        sphere
    }

    /// Reset to the invalid state
    pub fn init(&mut self) {
        *self = Self::invalid();
    }

    /// True when the radius is not negative
    pub fn valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Replace center and radius
    pub fn set(&mut self, center: Vec3, radius: f32) {
        self.center = center;
        self.radius = radius;
    }

    /// Center point
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Radius, negative when invalid
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Squared radius
    pub fn radius2(&self) -> f32 {
        self.radius * self.radius
    }

    /// Grow to include a point
    ///
    /// The center moves toward the point by half the deficit and the radius
    /// grows by the same amount, so the far side of the old sphere stays put.
    pub fn expand_by_point(&mut self, v: &Vec3) {
        if !self.valid() {
            self.center = *v;
            self.radius = POINT_RADIUS;
            return;
        }

        let dv = v - self.center;
        let r = dv.norm();
        if r > self.radius {
            let dr = (r - self.radius) * 0.5;
            self.center += dv * (dr / r);
            self.radius += dr;
        }
    }

    /// Grow to include every point
    pub fn expand_by_points<'a, I>(&mut self, points: I)
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        for v in points {
            self.expand_by_point(v);
        }
    }

    /// Grow to the smallest sphere enclosing both spheres
    pub fn expand_by_sphere(&mut self, sh: &Self) {
        if !sh.valid() {
            return;
        }

        if !self.valid() {
            *self = *sh;
            return;
        }

        let d = (self.center - sh.center).norm();

        // other inside self
        if d + sh.radius <= self.radius {
            return;
        }

        // self inside other
        if d + self.radius <= sh.radius {
            *self = *sh;
            return;
        }

        let new_radius = (self.radius + d + sh.radius) * 0.5;
        let ratio = (new_radius - self.radius) / d;

        self.center += (sh.center - self.center) * ratio;
        self.radius = new_radius;
    }

    /// Grow to include a box
    ///
    /// Each box corner is mirrored through the center onto the far side of the
    /// current sphere; the box bounding those points and the original box
    /// gives the new center and radius. A heuristic, not a minimal fit.
    pub fn expand_by_box(&mut self, bb: &BoundingBox) {
        if !bb.valid() {
            return;
        }

        if !self.valid() {
            self.center = bb.center();
            self.radius = bb.radius();
            return;
        }

        let mut new_bb = *bb;
        for pos in 0..8 {
            let dv = bb.corner(pos) - self.center;
            let length = dv.norm();
            if length > 0.0 {
                new_bb.expand_by_point(&(self.center - dv * (self.radius / length)));
            }
        }

        self.center = new_bb.center();
        self.radius = new_bb.radius();
    }

    /// Grow the radius around a fixed center to include a point
    pub fn expand_radius_by_point(&mut self, v: &Vec3) {
        if self.valid() {
            self.radius = self.radius.max((v - self.center).norm());
        } else {
            self.center = *v;
            self.radius = 0.0;
        }
    }

    /// Grow the radius around a fixed center to include a sphere
    pub fn expand_radius_by_sphere(&mut self, sh: &Self) {
        if !sh.valid() {
            return;
        }
        if self.valid() {
            self.radius = self.radius.max((sh.center - self.center).norm() + sh.radius);
        } else {
            *self = *sh;
        }
    }

    /// Grow the radius around a fixed center to include a box
    pub fn expand_radius_by_box(&mut self, bb: &BoundingBox) {
        if !bb.valid() {
            return;
        }
        if self.valid() {
            for pos in 0..8 {
                self.radius = self.radius.max((bb.corner(pos) - self.center).norm());
            }
        } else {
            self.center = bb.center();
            self.radius = bb.radius();
        }
    }

    /// True when the point is inside, allowing a small relative slack
    pub fn contains(&self, v: &Vec3) -> bool {
        self.valid()
            && (v - self.center).norm_squared() <= self.radius2() + CONTAINS_EPSILON * self.radius2().max(1.0)
    }

    /// True when `other` lies entirely inside, with the same slack as [`Self::contains`]
    pub fn contains_sphere(&self, other: &Self) -> bool {
        if !self.valid() || !other.valid() {
            return false;
        }
        let d = (other.center - self.center).norm() + other.radius;
        d <= self.radius + CONTAINS_EPSILON * self.radius.max(1.0)
    }

    /// True when the spheres overlap
    pub fn intersects(&self, other: &Self) -> bool {
        self.valid() && other.valid() && {
            let r = self.radius + other.radius;
            (self.center - other.center).norm_squared() <= r * r
        }
    }

    /// Sphere enclosing this one after an affine transform
    ///
    /// The radius is scaled by the largest axis scale of the matrix.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if !self.valid() {
            return *self;
        }
        let scale = (0..3)
            .map(|c| matrix.fixed_view::<3, 1>(0, c).norm())
            .fold(0.0_f32, f32::max);
        Self::new(matrix.project_point(&self.center), self.radius * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_sphere(rng: &mut StdRng) -> BoundingSphere {
        BoundingSphere::new(
            Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)),
            rng.gen_range(0.0..20.0),
        )
    }

    /// Points on the sphere surface along the axes and toward the other center
    fn probe_points(sphere: &BoundingSphere, other: &BoundingSphere) -> Vec<Vec3> {
        let c = sphere.center();
        let r = sphere.radius();
        let mut points = vec![
            c + Vec3::x() * r,
            c - Vec3::x() * r,
            c + Vec3::y() * r,
            c - Vec3::y() * r,
            c + Vec3::z() * r,
            c - Vec3::z() * r,
        ];
        let toward = other.center() - c;
        if toward.norm() > 0.0 {
            let dir = toward.normalize();
            points.push(c + dir * r);
            points.push(c - dir * r);
        }
        points
    }

    #[test]
    fn test_default_is_invalid() {
        let sphere = BoundingSphere::default();
        assert!(!sphere.valid());
        assert_eq!(sphere.radius(), -1.0);
        assert!(!sphere.contains(&Vec3::zeros()));
    }

    #[test]
    fn test_first_point_has_tiny_radius() {
        let mut sphere = BoundingSphere::invalid();
        sphere.expand_by_point(&Vec3::new(1.0, 2.0, 3.0));
        assert!(sphere.valid());
        assert_eq!(sphere.center(), Vec3::new(1.0, 2.0, 3.0));
        assert!(sphere.radius() > 0.0 && sphere.radius() < 1e-5);
    }

    #[test]
    fn test_expand_by_point_contains_point() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sphere = BoundingSphere::invalid();
        for _ in 0..500 {
            let p = Vec3::new(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
            sphere.expand_by_point(&p);
            assert!(sphere.contains(&p));
        }
    }

    #[test]
    fn test_expand_by_inner_point_is_noop() {
        let mut sphere = BoundingSphere::new(Vec3::zeros(), 5.0);
        sphere.expand_by_point(&Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(sphere, BoundingSphere::new(Vec3::zeros(), 5.0));
    }

    #[test]
    fn test_expand_by_point_grows_by_half_deficit() {
        let mut sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        sphere.expand_by_point(&Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(sphere.radius(), 2.0);
        assert_relative_eq!(sphere.center(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_sphere_merge_cases() {
        let big = BoundingSphere::new(Vec3::zeros(), 10.0);
        let small = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);

        let mut a = big;
        a.expand_by_sphere(&BoundingSphere::invalid());
        assert_eq!(a, big);

        let mut b = BoundingSphere::invalid();
        b.expand_by_sphere(&small);
        assert_eq!(b, small);

        let mut c = big;
        c.expand_by_sphere(&small);
        assert_eq!(c, big);

        let mut d = small;
        d.expand_by_sphere(&big);
        assert_eq!(d, big);
    }

    #[test]
    fn test_sphere_merge_disjoint() {
        let mut a = BoundingSphere::new(Vec3::zeros(), 1.0);
        a.expand_by_sphere(&BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 1.0));
        assert_relative_eq!(a.radius(), 6.0);
        assert_relative_eq!(a.center(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_sphere_merge_bounds_over_random_pairs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let s1 = random_sphere(&mut rng);
            let s2 = random_sphere(&mut rng);
            let d = (s1.center() - s2.center()).norm();

            let mut merged = s1;
            merged.expand_by_sphere(&s2);

            let tolerance = 1e-3;
            assert!(merged.radius() + tolerance >= s1.radius().max(s2.radius()));
            assert!(merged.radius() <= s1.radius() + s2.radius() + d + tolerance);
            assert!(merged.contains_sphere(&s1));
            assert!(merged.contains_sphere(&s2));
        }
    }

    #[test]
    fn test_sphere_merge_is_not_symmetric_but_contains_union() {
        let s1 = BoundingSphere::new(Vec3::new(-3.0, 1.0, 0.0), 2.0);
        let s2 = BoundingSphere::new(Vec3::new(4.0, -2.0, 1.0), 1.5);

        let mut ab = s1;
        ab.expand_by_sphere(&s2);
        let mut ba = s2;
        ba.expand_by_sphere(&s1);

        for merged in [ab, ba] {
            for p in probe_points(&s1, &s2).iter().chain(probe_points(&s2, &s1).iter()) {
                assert!(merged.contains(p), "{:?} does not contain {:?}", merged, p);
            }
        }
    }

    #[test]
    fn test_expand_by_box_from_invalid() {
        let bb = BoundingBox::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let sphere = BoundingSphere::from_box(&bb);
        assert_relative_eq!(sphere.center(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(sphere.radius(), 3.0_f32.sqrt());
    }

    #[test]
    fn test_expand_by_box_encloses_box() {
        let mut sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let bb = BoundingBox::new(Vec3::new(4.0, -1.0, -1.0), Vec3::new(6.0, 1.0, 1.0));
        sphere.expand_by_box(&bb);
        for pos in 0..8 {
            assert!(sphere.contains(&bb.corner(pos)));
        }
        // far side of the old sphere is kept
        assert!(sphere.contains(&Vec3::new(-1.0, 0.0, 0.0)));

        let before = sphere;
        sphere.expand_by_box(&BoundingBox::invalid());
        assert_eq!(sphere, before);
    }

    #[test]
    fn test_expand_radius_keeps_center() {
        let mut sphere = BoundingSphere::new(Vec3::new(1.0, 1.0, 1.0), 1.0);
        sphere.expand_radius_by_point(&Vec3::new(1.0, 5.0, 1.0));
        assert_eq!(sphere.center(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(sphere.radius(), 4.0);

        sphere.expand_radius_by_sphere(&BoundingSphere::new(Vec3::new(1.0, 1.0, -5.0), 2.0));
        assert_relative_eq!(sphere.radius(), 8.0);

        let mut empty = BoundingSphere::invalid();
        empty.expand_radius_by_point(&Vec3::new(2.0, 0.0, 0.0));
        assert!(empty.valid());
        assert_eq!(empty.radius(), 0.0);
    }

    #[test]
    fn test_transformed() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
        let m = Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0)) * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 0.5));
        let t = sphere.transformed(&m);
        assert_relative_eq!(t.center(), Vec3::new(2.0, 3.0, 0.0));
        assert_relative_eq!(t.radius(), 4.0);
        assert!(!BoundingSphere::invalid().transformed(&m).valid());
    }

    #[test]
    fn test_intersects() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
        let c = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
