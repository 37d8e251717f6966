//! Pointer hit testing across tracked objects.
//!
//! One world ray is built from the pointer and carried into each object's
//! local space. The nearest face it crosses decides which vertex, edge or face
//! that object offers as a candidate; candidates from different objects are
//! ranked by screen distance to the pointer, then by world distance.

use std::cmp::Ordering;

use glam::{Vec2, Vec3};
use shared::ObjectId;

use crate::host::Host;
use crate::options::CastOptions;
use crate::picking::{closest_point_on_segment, Ray};
use crate::session::ObjectSession;
use crate::settings::EngineSettings;
use crate::topology::ElementKind;

/// Element found under the pointer.
///
/// Indices refer to the topology at `topology_version`, the version the ray
/// structure was built from; any edit or commit after the cast makes the hit
/// stale, and so does casting against a structure not rebuilt since.
#[derive(Debug, Clone, PartialEq)]
pub struct HitInfo {
    pub object: ObjectId,
    pub kind: ElementKind,
    pub index: u32,
    /// Nearest world point on the element
    pub point: Vec3,
    /// Edge midpoint or face center; the vertex itself for vertices
    pub center: Vec3,
    /// World distance from the ray origin to `point`
    pub distance: f32,
    /// Pixel distance from the pointer to `point`
    pub screen_distance: f32,
    pub topology_version: u64,
}

/// Ranking and obstruction parameters for casts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    pub pick_radius_px: Option<f32>,
    pub tie_epsilon_px: f32,
    pub obstruction_bias: f32,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

impl HitTester {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            pick_radius_px: settings.pick_radius_px,
            tie_epsilon_px: settings.screen_tie_epsilon_px,
            obstruction_bias: settings.obstruction_bias,
        }
    }

    /// Nearest element of `kind` under `pointer` among `targets`.
    ///
    /// `occluders` are the tracked objects whose working geometry may block a
    /// candidate when `CHECK_OBSTRUCTIONS` is set; everything else is asked of
    /// the host.
    pub fn cast(
        &self,
        host: &impl Host,
        pointer: Vec2,
        kind: ElementKind,
        options: CastOptions,
        targets: &[&ObjectSession],
        occluders: &[&ObjectSession],
    ) -> Option<HitInfo> {
        let ray = host.pointer_ray(pointer)?;
        let mut candidates: Vec<HitInfo> = targets
            .iter()
            .filter_map(|session| self.candidate(host, session, &ray, pointer, kind, options))
            .collect();

        let check_obstructions = options.contains(CastOptions::CHECK_OBSTRUCTIONS);
        while !candidates.is_empty() {
            let best = (0..candidates.len())
                .min_by(|&a, &b| self.rank(&candidates[a], &candidates[b]))?;
            let hit = candidates.swap_remove(best);
            if !check_obstructions || !self.is_obstructed(host, &ray, &hit, occluders) {
                return Some(hit);
            }
            tracing::debug!("{} {} on `{}` is obstructed", hit.kind, hit.index, hit.object);
        }
        None
    }

    /// Screen distance first; within the tie epsilon, world distance.
    pub fn rank(&self, a: &HitInfo, b: &HitInfo) -> Ordering {
        if (a.screen_distance - b.screen_distance).abs() > self.tie_epsilon_px {
            a.screen_distance.total_cmp(&b.screen_distance)
        } else {
            a.distance.total_cmp(&b.distance)
        }
    }

    fn candidate(
        &self,
        host: &impl Host,
        session: &ObjectSession,
        ray: &Ray,
        pointer: Vec2,
        kind: ElementKind,
        options: CastOptions,
    ) -> Option<HitInfo> {
        let filters = options | session.options().cast_filters();
        if filters.contains(CastOptions::VISIBLE_ONLY) && !host.is_visible(session.object()) {
            return None;
        }
        let skip_hidden = filters.contains(CastOptions::SKIP_HIDDEN);
        let structure = session.ray_structure()?;
        let topo = session.topology();
        let transform = session.transform();

        let local = transform.ray_to_local(ray);
        let face_hit = structure.cast(&local, f32::INFINITY, |f| {
            topo.face(f).is_some_and(|face| !(skip_hidden && face.hidden))
        })?;
        let face = topo.face(face_hit.face)?;
        let surface = transform.to_world(local.at(face_hit.t));
        let nearest = |(_, p): &(u32, Vec3), (_, q): &(u32, Vec3)| {
            p.distance_squared(surface).total_cmp(&q.distance_squared(surface))
        };

        let (index, point, center) = match kind {
            ElementKind::Face => {
                let center = transform.to_world(topo.face_center(face_hit.face)?);
                (face_hit.face, surface, center)
            }
            ElementKind::Edge => {
                let (e, point) = face
                    .edges()
                    .iter()
                    .copied()
                    .filter(|&e| !(skip_hidden && topo.edge_hidden(e)))
                    .filter_map(|e| {
                        let (a, b) = topo.edge_positions(e)?;
                        let p = closest_point_on_segment(
                            surface,
                            transform.to_world(a),
                            transform.to_world(b),
                        );
                        Some((e, p))
                    })
                    .min_by(nearest)?;
                (e, point, transform.to_world(topo.edge_midpoint(e)?))
            }
            ElementKind::Vertex => {
                let (v, point) = face
                    .verts()
                    .iter()
                    .copied()
                    .filter_map(|v| {
                        let vert = topo.vertex(v)?;
                        (!(skip_hidden && vert.hidden)).then(|| (v, transform.to_world(vert.co)))
                    })
                    .min_by(nearest)?;
                (v, point, point)
            }
        };

        let screen_distance = host.project(point)?.distance(pointer);
        if self.pick_radius_px.is_some_and(|r| screen_distance > r) {
            return None;
        }
        Some(HitInfo {
            object: session.object().clone(),
            kind,
            index,
            point,
            center,
            distance: point.distance(ray.origin),
            screen_distance,
            // A structure built before a renumbering makes the hit stale
            topology_version: structure.version(),
        })
    }

    /// Whether nearer geometry of a different object sits between the hit and the viewer
    fn is_obstructed(
        &self,
        host: &impl Host,
        ray: &Ray,
        hit: &HitInfo,
        occluders: &[&ObjectSession],
    ) -> bool {
        let to_eye = ray.origin - hit.point;
        let length = to_eye.length();
        if length <= self.obstruction_bias {
            return false;
        }
        let dir = to_eye / length;
        let probe = Ray::new(hit.point + dir * self.obstruction_bias, dir);
        let max_distance = length - self.obstruction_bias;

        let blocked_by_tracked = occluders
            .iter()
            .filter(|s| s.object() != &hit.object && host.is_visible(s.object()))
            .any(|session| {
                let Some(structure) = session.ray_structure() else {
                    return false;
                };
                let topo = session.topology();
                let local = session.transform().ray_to_local(&probe);
                structure
                    .cast(&local, max_distance, |f| topo.face(f).is_some_and(|face| !face.hidden))
                    .is_some()
            });
        if blocked_by_tracked {
            return true;
        }

        let mut exclude: Vec<ObjectId> = occluders.iter().map(|s| s.object().clone()).collect();
        exclude.push(hit.object.clone());
        host.occluder(&probe, max_distance, &exclude).is_some()
    }
}
