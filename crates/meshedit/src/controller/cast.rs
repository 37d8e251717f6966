//! Pointer casts and hit validation

use glam::Vec2;

use super::SessionController;
use crate::error::SessionError;
use crate::hit::HitInfo;
use crate::host::Host;
use crate::options::CastOptions;
use crate::session::ObjectSession;
use crate::topology::ElementKind;

impl<H: Host> SessionController<'_, H> {
    /// Nearest vertex under the pointer
    pub fn cast_to_vertex(&self, pointer: Vec2, options: CastOptions) -> Option<HitInfo> {
        self.cast(pointer, ElementKind::Vertex, options)
    }

    /// Nearest edge under the pointer
    pub fn cast_to_edge(&self, pointer: Vec2, options: CastOptions) -> Option<HitInfo> {
        self.cast(pointer, ElementKind::Edge, options)
    }

    /// Nearest face under the pointer
    pub fn cast_to_face(&self, pointer: Vec2, options: CastOptions) -> Option<HitInfo> {
        self.cast(pointer, ElementKind::Face, options)
    }

    pub fn cast(&self, pointer: Vec2, kind: ElementKind, options: CastOptions) -> Option<HitInfo> {
        if !self.is_open() {
            return None;
        }
        let subset_only = options.contains(CastOptions::SPECIFIED_SUBSET_ONLY);
        let occluders: Vec<&ObjectSession> = self.sessions.iter().filter(|s| s.has_ray()).collect();
        let targets: Vec<&ObjectSession> = occluders
            .iter()
            .copied()
            .filter(|s| !subset_only || self.is_specified(s.object()))
            .collect();
        if targets.is_empty() {
            return None;
        }
        self.hit_tester
            .cast(&self.host, pointer, kind, options, &targets, &occluders)
    }

    /// Check that `hit` still names a live element of the current topology.
    pub fn check_hit(&self, hit: &HitInfo) -> Result<(), SessionError> {
        let stale = || SessionError::StaleReference {
            object: hit.object.clone(),
            kind: hit.kind,
            index: hit.index,
        };
        let session = self.session(&hit.object).ok_or_else(stale)?;
        let topo = session.topology();
        if topo.version() != hit.topology_version || !topo.is_valid(hit.kind, hit.index) {
            return Err(stale());
        }
        Ok(())
    }

    /// `check_hit` as a guard: stale hits are logged and answered with false
    pub fn hit_is_current(&self, hit: &HitInfo) -> bool {
        match self.check_hit(hit) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Ignoring hit: {}", e);
                false
            }
        }
    }
}
