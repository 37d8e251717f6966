//! Session controller
//!
//! One `SessionController` lives for one interactive tool invocation. It tracks
//! the objects the tool edits, answers pointer casts, stages and commits edits
//! with undo, and restores every object when the tool is cancelled.

mod cast;
mod commit;
mod lifecycle;

pub use lifecycle::{SessionState, ToolStatus};

use std::collections::BTreeSet;

use shared::ObjectId;

use crate::error::SessionError;
use crate::hit::HitTester;
use crate::highlight::HighlightBatcher;
use crate::host::Host;
use crate::options::TrackOptions;
use crate::registry::{DrawHandle, NotificationLevel, Registry};
use crate::session::ObjectSession;
use crate::settings::EngineSettings;
use crate::undo::UndoPool;

/// Transactional editing session over one or more host objects
pub struct SessionController<'r, H: Host> {
    host: H,
    registry: &'r mut Registry,
    settings: EngineSettings,
    hit_tester: HitTester,
    /// Every object passed to `add_object`, in order
    tracked: Vec<ObjectId>,
    /// Objects whose setup succeeded
    sessions: Vec<ObjectSession>,
    specified: Option<BTreeSet<ObjectId>>,
    undo: UndoPool,
    highlight: HighlightBatcher,
    draw_handle: Option<DrawHandle>,
    state: SessionState,
}

impl<'r, H: Host> SessionController<'r, H> {
    /// Open a session and register its highlight draw handler
    pub fn new(host: H, registry: &'r mut Registry, settings: EngineSettings) -> Self {
        let draw_handle = registry.register_draw("mesh-edit session");
        tracing::debug!("Opened edit session (draw handle {:?})", draw_handle);
        Self {
            host,
            registry,
            hit_tester: HitTester::new(&settings),
            undo: UndoPool::new(settings.undo_depth),
            settings,
            tracked: Vec::new(),
            sessions: Vec::new(),
            specified: None,
            highlight: HighlightBatcher::new(),
            draw_handle: Some(draw_handle),
            state: SessionState::Open,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct host access for out-of-band edits; follow mesh writes with
    /// `resync_from_host` and transform changes with `rebuild_ray`
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    // ── Tracking ──────────────────────────────────────────────

    /// Begin tracking `object`. Calling it again for a tracked object does
    /// nothing. Returns whether the object has a usable session.
    pub fn add_object(&mut self, object: &str, options: TrackOptions) -> bool {
        if !self.is_open() {
            tracing::debug!("add_object({}) on a closed session", object);
            return false;
        }
        if self.tracked.iter().any(|id| id == object) {
            return self.session(object).is_some();
        }
        self.tracked.push(object.to_string());
        if !options.is_valid() {
            tracing::warn!("Cast filters without ray casting for `{}`: {:?}", object, options);
        }
        let options = options.normalized();

        match ObjectSession::open(&self.host, object, options) {
            Ok(session) => {
                tracing::info!(
                    "Tracking `{}`: {} vertices, {} faces, {:?}",
                    object,
                    session.topology().vertex_count(),
                    session.topology().face_count(),
                    options
                );
                self.sessions.push(session);
                true
            }
            Err(e) => {
                tracing::warn!("Cannot track `{}`: {}", object, e);
                false
            }
        }
    }

    /// Tracked objects that built under the given requirements
    pub fn available_objects(&self, require_topology: bool, require_ray: bool) -> Vec<ObjectId> {
        self.tracked
            .iter()
            .filter(|id| match self.session(id) {
                Some(session) => !require_ray || session.has_ray(),
                None => !require_topology && !require_ray,
            })
            .cloned()
            .collect()
    }

    /// `available_objects`, turning an empty result into a setup failure the
    /// user is told about.
    pub fn ensure_ready(
        &mut self,
        require_topology: bool,
        require_ray: bool,
    ) -> Result<Vec<ObjectId>, SessionError> {
        if !self.is_open() {
            return Err(SessionError::Closed);
        }
        let objects = self.available_objects(require_topology, require_ray);
        if objects.is_empty() {
            let message = if self.tracked.is_empty() {
                "No mesh object to edit".to_string()
            } else {
                format!("None of the {} selected objects can be edited", self.tracked.len())
            };
            tracing::warn!("Setup failed: {}", message);
            self.registry.notify(NotificationLevel::Warning, message.clone());
            return Err(SessionError::SetupFailure(message));
        }
        Ok(objects)
    }

    pub fn is_tracked(&self, object: &str) -> bool {
        self.tracked.iter().any(|id| id == object)
    }

    pub fn session(&self, object: &str) -> Option<&ObjectSession> {
        self.sessions.iter().find(|s| s.object() == object)
    }

    pub fn session_mut(&mut self, object: &str) -> Option<&mut ObjectSession> {
        self.sessions.iter_mut().find(|s| s.object() == object)
    }

    fn session_index(&self, object: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.object() == object)
    }

    // ── Specified subset ──────────────────────────────────────

    /// Narrow casts with `SPECIFIED_SUBSET_ONLY` and session iteration to `objects`
    pub fn set_specified_objects<I, S>(&mut self, objects: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<ObjectId> = objects.into_iter().map(|s| s.as_ref().to_string()).collect();
        tracing::debug!("Specified subset: {:?}", set);
        self.specified = Some(set);
    }

    pub fn clear_specified_objects(&mut self) {
        self.specified = None;
    }

    pub fn specified_objects(&self) -> Option<&BTreeSet<ObjectId>> {
        self.specified.as_ref()
    }

    /// Whether `object` passes the specified-subset filter
    pub fn is_specified(&self, object: &str) -> bool {
        self.specified
            .as_ref()
            .map_or(true, |set| set.contains(object))
    }

    /// Sessions in the specified subset (all of them when none is set)
    pub fn iter_sessions(&self) -> impl Iterator<Item = &ObjectSession> {
        let specified = self.specified.as_ref();
        self.sessions
            .iter()
            .filter(move |s| specified.map_or(true, |set| set.contains(s.object())))
    }

    /// Mutable sessions in the specified subset; tool code edits topology through these
    pub fn iter_sessions_mut(&mut self) -> impl Iterator<Item = &mut ObjectSession> {
        let specified = self.specified.as_ref();
        self.sessions
            .iter_mut()
            .filter(move |s| specified.map_or(true, |set| set.contains(s.object())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::host::MemoryScene;
    use shared::Transform;

    fn scene_with(n: usize) -> (MemoryScene, Vec<ObjectId>) {
        let mut scene = MemoryScene::new();
        let ids = (0..n)
            .map(|i| {
                scene.insert(
                    &format!("Cube {i}"),
                    fixtures::cube_mesh(1.0),
                    Transform::at([i as f64 * 2.0, 0.0, 0.0]),
                )
            })
            .collect();
        (scene, ids)
    }

    #[test]
    fn test_add_object_is_idempotent() {
        let (mut scene, ids) = scene_with(1);
        let mut registry = Registry::new();
        let mut ctl = SessionController::new(&mut scene, &mut registry, EngineSettings::default());
        assert!(ctl.add_object(&ids[0], TrackOptions::pickable()));
        assert!(ctl.add_object(&ids[0], TrackOptions::empty()));
        assert_eq!(ctl.iter_sessions().count(), 1);
        assert!(ctl.session(&ids[0]).unwrap().has_ray());
    }

    #[test]
    fn test_add_object_drops_filters_without_ray_casting() {
        let (mut scene, ids) = scene_with(1);
        let mut registry = Registry::new();
        let mut ctl = SessionController::new(&mut scene, &mut registry, EngineSettings::default());
        assert!(ctl.add_object(&ids[0], TrackOptions::SKIP_HIDDEN));
        let session = ctl.session(&ids[0]).unwrap();
        assert!(session.options().is_empty());
        assert!(!session.has_ray());
    }

    #[test]
    fn test_available_objects_requirements() {
        let (mut scene, ids) = scene_with(2);
        let mut registry = Registry::new();
        let mut ctl = SessionController::new(&mut scene, &mut registry, EngineSettings::default());
        ctl.add_object(&ids[0], TrackOptions::pickable());
        ctl.add_object(&ids[1], TrackOptions::empty());
        assert!(!ctl.add_object("missing", TrackOptions::pickable()));

        assert_eq!(ctl.available_objects(false, false).len(), 3);
        assert_eq!(ctl.available_objects(true, false), ids);
        assert_eq!(ctl.available_objects(true, true), vec![ids[0].clone()]);
    }

    #[test]
    fn test_ensure_ready_notifies_on_failure() {
        let (mut scene, _) = scene_with(0);
        let mut registry = Registry::new();
        {
            let mut ctl = SessionController::new(&mut scene, &mut registry, EngineSettings::default());
            ctl.add_object("missing", TrackOptions::pickable());
            let err = ctl.ensure_ready(true, true).unwrap_err();
            assert!(matches!(err, SessionError::SetupFailure(_)));
        }
        assert_eq!(registry.notifications().len(), 1);
        assert_eq!(registry.notifications()[0].level, NotificationLevel::Warning);
    }

    #[test]
    fn test_iter_sessions_honours_subset() {
        let (mut scene, ids) = scene_with(3);
        let mut registry = Registry::new();
        let mut ctl = SessionController::new(&mut scene, &mut registry, EngineSettings::default());
        for id in &ids {
            ctl.add_object(id, TrackOptions::pickable());
        }
        ctl.set_specified_objects([&ids[1]]);
        assert!(ctl.specified_objects().is_some_and(|s| s.len() == 1));
        assert!(ctl.is_tracked(&ids[0]));
        assert!(!ctl.is_specified(&ids[0]));
        let seen: Vec<_> = ctl.iter_sessions().map(|s| s.object().clone()).collect();
        assert_eq!(seen, vec![ids[1].clone()]);
        assert_eq!(ctl.iter_sessions_mut().count(), 1);
        ctl.clear_specified_objects();
        assert!(ctl.specified_objects().is_none());
        assert_eq!(ctl.iter_sessions().count(), 3);
    }
}
