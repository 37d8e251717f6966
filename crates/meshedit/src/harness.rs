//! Headless test harness for driving edit sessions without a viewport.

use glam::{Vec2, Vec3};
use shared::{ObjectId, PersistedMesh, SceneFile, Transform};

use crate::controller::SessionController;
use crate::fixtures;
use crate::host::{MemoryScene, ViewCamera};
use crate::options::TrackOptions;
use crate::registry::Registry;
use crate::settings::EngineSettings;
use crate::validation::MeshValidator;

/// Headless test harness: owns the scene, the registry and settings
pub struct TestHarness {
    pub scene: MemoryScene,
    pub registry: Registry,
    pub settings: EngineSettings,
}

impl TestHarness {
    /// Create an empty scene viewed from +Z at distance 10.
    pub fn new() -> Self {
        let mut scene = MemoryScene::new();
        scene.camera = ViewCamera::front(Vec3::ZERO, 10.0);
        Self {
            scene,
            registry: Registry::new(),
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::new()
        }
    }

    // ── Scene manipulation ────────────────────────────────────

    /// Create a cube object and return its ID
    pub fn add_cube(&mut self, name: &str, size: f32, pos: [f64; 3]) -> ObjectId {
        self.scene.insert(name, fixtures::cube_mesh(size), Transform::at(pos))
    }

    /// Create a square plane object facing +Z and return its ID
    pub fn add_plane(&mut self, name: &str, size: f32, pos: [f64; 3]) -> ObjectId {
        self.scene.insert(name, fixtures::plane_mesh(size), Transform::at(pos))
    }

    pub fn add_mesh(&mut self, name: &str, mesh: PersistedMesh, transform: Transform) -> ObjectId {
        self.scene.insert(name, mesh, transform)
    }

    pub fn hide(&mut self, id: &str) {
        self.scene.set_visible(id, false);
    }

    pub fn show(&mut self, id: &str) {
        self.scene.set_visible(id, true);
    }

    /// Make host writes to `id` fail
    pub fn lock(&mut self, id: &str) {
        self.scene.set_locked(id, true);
    }

    pub fn unlock(&mut self, id: &str) {
        self.scene.set_locked(id, false);
    }

    /// Load a scene (replaces current, keeps the camera)
    pub fn load_scene(&mut self, scene: SceneFile) {
        let camera = self.scene.camera.clone();
        self.scene = MemoryScene::from_scene_file(scene);
        self.scene.camera = camera;
    }

    /// Load a scene from JSON string
    pub fn load_scene_json(&mut self, json: &str) -> Result<(), String> {
        let scene: SceneFile =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        self.load_scene(scene);
        Ok(())
    }

    /// Export the current scene as JSON
    pub fn export_scene_json(&self) -> String {
        serde_json::to_string_pretty(&self.scene.to_scene_file()).unwrap_or_default()
    }

    pub fn object_count(&self) -> usize {
        self.scene.object_ids().len()
    }

    // ── Viewport ──────────────────────────────────────────────

    /// Point the camera at `target` from +Z
    pub fn look_at(&mut self, target: Vec3, distance: f32) {
        let size = self.scene.camera.size;
        self.scene.camera = ViewCamera::front(target, distance);
        self.scene.camera.size = size;
    }

    /// Pixel position of a world point; the viewport origin when it is behind the camera
    pub fn pointer_at(&self, world: Vec3) -> Vec2 {
        self.scene.camera.project(world).unwrap_or(Vec2::ZERO)
    }

    /// A pixel position that sees nothing but empty space
    pub fn empty_pointer(&self) -> Vec2 {
        Vec2::new(1.0, 1.0)
    }

    // ── Sessions ──────────────────────────────────────────────

    /// Open a controller borrowing the scene and registry
    pub fn controller(&mut self) -> SessionController<'_, &mut MemoryScene> {
        SessionController::new(&mut self.scene, &mut self.registry, self.settings.clone())
    }

    /// Open a controller tracking every object in the scene with `options`
    pub fn open_all(&mut self, options: TrackOptions) -> SessionController<'_, &mut MemoryScene> {
        let ids = self.scene.object_ids();
        let mut ctl = self.controller();
        for id in &ids {
            ctl.add_object(id, options);
        }
        ctl
    }

    // ── Inspection ────────────────────────────────────────────

    /// Persisted mesh of an object
    pub fn mesh(&self, id: &str) -> Option<PersistedMesh> {
        self.scene.mesh(id).cloned()
    }

    pub fn mesh_json(&self, id: &str) -> Option<String> {
        self.scene.mesh(id).and_then(|m| serde_json::to_string(m).ok())
    }

    /// Validate an object's persisted mesh.
    pub fn validate_mesh(&self, id: &str) -> Option<MeshValidator<'_>> {
        self.scene.mesh(id).map(MeshValidator::new)
    }

    /// Number of live draw handlers in the registry
    pub fn draw_handlers(&self) -> usize {
        self.registry.active_draw_handlers()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
