use glam::{Mat4, Vec3};

use crate::topology::MeshTopology;

/// A ray; `direction` is unit length in world space but may be scaled once
/// carried into an object's local space, so `t` stays a world distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed through `matrix` without renormalizing the direction
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box containing nothing; grows with `extend`
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Grow by `margin` on every side (flat boxes still intersect)
    pub fn padded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }
    let inv_dir = Vec3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    // Outside triangle (u)
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    // Outside triangle (v)
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Closest point to `p` on the segment `a`-`b`
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[derive(Debug, Clone)]
struct RayTriangle {
    face: u32,
    verts: [Vec3; 3],
}

/// Nearest face along a ray, in the structure's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: u32,
    pub t: f32,
}

/// Object-local triangle soup used for ray queries against one topology.
///
/// Built from a snapshot of the topology; it does not follow later edits until
/// rebuilt, and callers filter returned faces against the live topology.
#[derive(Debug, Clone)]
pub struct RayStructure {
    triangles: Vec<RayTriangle>,
    bounds: Aabb,
    version: u64,
}

impl RayStructure {
    pub fn build(topology: &MeshTopology) -> Self {
        let mut triangles = Vec::new();
        let mut bounds = Aabb::empty();
        for (f, _) in topology.iter_faces() {
            for tri in topology.face_triangles(f) {
                let verts = tri.map(|v| topology.position(v).unwrap_or(Vec3::ZERO));
                for p in verts {
                    bounds.extend(p);
                }
                triangles.push(RayTriangle { face: f, verts });
            }
        }
        Self {
            triangles,
            bounds: bounds.padded(1e-4),
            version: topology.version(),
        }
    }

    /// Topology version this structure was built from
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Nearest accepted face with `t < max_t`.
    pub fn cast(&self, ray: &Ray, max_t: f32, accept: impl Fn(u32) -> bool) -> Option<FaceHit> {
        ray_aabb(ray, &self.bounds)?;
        let mut best: Option<FaceHit> = None;
        for tri in &self.triangles {
            let [v0, v1, v2] = tri.verts;
            let Some(t) = ray_triangle_intersect(ray, v0, v1, v2) else {
                continue;
            };
            if t >= max_t || best.is_some_and(|b| t >= b.t) || !accept(tri.face) {
                continue;
            }
            best = Some(FaceHit { face: tri.face, t });
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PersistedMesh;

    fn unit_quad() -> MeshTopology {
        MeshTopology::from_persisted(&PersistedMesh {
            positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
            polygons: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_ray_aabb_hit_and_miss() {
        let aabb = Aabb::from_points([Vec3::splat(-1.0), Vec3::splat(1.0)]);
        let hit = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((ray_aabb(&hit, &aabb).unwrap() - 4.0).abs() < 1e-5);
        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(ray_aabb(&miss, &aabb).is_none());
        assert!(ray_aabb(&hit, &Aabb::empty()).is_none());
    }

    #[test]
    fn test_ray_triangle_behind_origin() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, -1.0), Vec3::NEG_Z);
        let t = ray_triangle_intersect(&ray, Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!(t.is_none());
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        assert_eq!(closest_point_on_segment(Vec3::new(0.5, 1.0, 0.0), a, b), Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(closest_point_on_segment(Vec3::new(-3.0, 0.0, 0.0), a, b), a);
        assert_eq!(closest_point_on_segment(Vec3::new(9.0, 0.0, 0.0), a, a), a);
    }

    #[test]
    fn test_structure_cast_hits_face() {
        let topo = unit_quad();
        let rs = RayStructure::build(&topo);
        assert_eq!(rs.triangle_count(), 2);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 3.0), Vec3::NEG_Z);
        let hit = rs.cast(&ray, f32::INFINITY, |_| true).unwrap();
        assert_eq!(hit.face, 0);
        assert!((hit.t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_structure_cast_respects_filter_and_range() {
        let rs = RayStructure::build(&unit_quad());
        let ray = Ray::new(Vec3::new(0.5, 0.5, 3.0), Vec3::NEG_Z);
        assert!(rs.cast(&ray, f32::INFINITY, |_| false).is_none());
        assert!(rs.cast(&ray, 2.0, |_| true).is_none());
    }

    #[test]
    fn test_transformed_ray_keeps_parameter() {
        let m = Mat4::from_scale(Vec3::splat(2.0)).inverse();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let local = ray.transformed(&m);
        // World point at t = 4 is (0, 0, 6); locally (0, 0, 3)
        assert!((local.at(4.0) - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }
}
