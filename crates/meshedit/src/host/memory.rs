//! In-memory host: a scene of mesh objects plus a viewport camera.

use std::collections::HashSet;

use glam::{Mat4, Vec2, Vec3};
use shared::{MeshSource, ObjectId, PersistedMesh, SceneFile, SceneObject, Transform};

use super::{Host, ViewCamera};
use crate::error::HostError;
use crate::picking::{ray_triangle_intersect, Ray};
use crate::transform::transform_matrix;
use crate::validation::MeshValidator;

/// Scene held entirely in memory, used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    pub camera: ViewCamera,
    locked: HashSet<ObjectId>,
    write_count: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scene_file(scene: SceneFile) -> Self {
        Self {
            objects: scene.objects,
            ..Self::default()
        }
    }

    /// Parse a `SceneFile` JSON document
    pub fn from_json(json: &str) -> Result<Self, String> {
        let scene: SceneFile =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        for obj in &scene.objects {
            let errors = MeshValidator::new(&obj.mesh).validate_all();
            if !errors.is_empty() {
                return Err(format!("object `{}`: {}", obj.id, errors.join("; ")));
            }
        }
        Ok(Self::from_scene_file(scene))
    }

    pub fn to_scene_file(&self) -> SceneFile {
        SceneFile {
            objects: self.objects.clone(),
            ..SceneFile::default()
        }
    }

    /// Add a mesh object and return its new ID
    pub fn insert(&mut self, name: &str, mesh: PersistedMesh, transform: Transform) -> ObjectId {
        let id = uuid::Uuid::new_v4().to_string();
        self.objects.push(SceneObject {
            id: id.clone(),
            name: name.to_string(),
            transform,
            visible: true,
            mesh,
            working_copy: None,
        });
        id
    }

    /// Add a fully described object, replacing one with the same ID
    pub fn insert_object(&mut self, object: SceneObject) {
        self.objects.retain(|o| o.id != object.id);
        self.objects.push(object);
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn object_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id.clone()).collect()
    }

    pub fn mesh(&self, id: &str) -> Option<&PersistedMesh> {
        self.object(id).map(|o| &o.mesh)
    }

    pub fn working_copy(&self, id: &str) -> Option<&PersistedMesh> {
        self.object(id).and_then(|o| o.working_copy.as_ref())
    }

    /// Open the object in "edit mode" with a copy of its persisted mesh
    pub fn begin_working_copy(&mut self, id: &str) -> bool {
        match self.object_mut(id) {
            Some(obj) => {
                obj.working_copy = Some(obj.mesh.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(obj) = self.object_mut(id) {
            obj.visible = visible;
        }
    }

    pub fn set_transform(&mut self, id: &str, transform: Transform) {
        if let Some(obj) = self.object_mut(id) {
            obj.transform = transform;
        }
    }

    /// Make writes to the object fail
    pub fn set_locked(&mut self, id: &str, locked: bool) {
        if locked {
            self.locked.insert(id.to_string());
        } else {
            self.locked.remove(id);
        }
    }

    /// Number of accepted mesh writes
    pub fn write_count(&self) -> usize {
        self.write_count
    }
}

impl Host for MemoryScene {
    fn read_mesh(&self, object: &str, source: MeshSource) -> Result<PersistedMesh, HostError> {
        let obj = self
            .object(object)
            .ok_or_else(|| HostError::UnknownObject(object.to_string()))?;
        match source {
            MeshSource::Persisted => Ok(obj.mesh.clone()),
            MeshSource::WorkingCopy => obj
                .working_copy
                .clone()
                .ok_or_else(|| HostError::NoWorkingCopy(object.to_string())),
        }
    }

    fn write_mesh(
        &mut self,
        object: &str,
        source: MeshSource,
        mesh: &PersistedMesh,
    ) -> Result<(), HostError> {
        if self.locked.contains(object) {
            return Err(HostError::Locked(object.to_string()));
        }
        let errors = MeshValidator::new(mesh).validate_all();
        if !errors.is_empty() {
            return Err(HostError::InvalidMesh {
                object: object.to_string(),
                reason: errors.join("; "),
            });
        }
        let obj = self
            .object_mut(object)
            .ok_or_else(|| HostError::UnknownObject(object.to_string()))?;
        match source {
            MeshSource::Persisted => obj.mesh = mesh.clone(),
            MeshSource::WorkingCopy => match obj.working_copy.as_mut() {
                Some(copy) => *copy = mesh.clone(),
                None => return Err(HostError::NoWorkingCopy(object.to_string())),
            },
        }
        self.write_count += 1;
        Ok(())
    }

    fn has_working_copy(&self, object: &str) -> bool {
        self.working_copy(object).is_some()
    }

    fn world_matrix(&self, object: &str) -> Result<Mat4, HostError> {
        self.object(object)
            .map(|o| transform_matrix(&o.transform))
            .ok_or_else(|| HostError::UnknownObject(object.to_string()))
    }

    fn is_visible(&self, object: &str) -> bool {
        self.object(object).is_some_and(|o| o.visible)
    }

    fn pointer_ray(&self, pointer: Vec2) -> Option<Ray> {
        let ray = self.camera.screen_ray(pointer);
        (ray.direction != Vec3::ZERO).then_some(ray)
    }

    fn project(&self, point: Vec3) -> Option<Vec2> {
        self.camera.project(point)
    }

    fn occluder(&self, ray: &Ray, max_distance: f32, exclude: &[ObjectId]) -> Option<(ObjectId, f32)> {
        let mut best: Option<(ObjectId, f32)> = None;
        for obj in self.objects.iter().filter(|o| o.visible && !exclude.contains(&o.id)) {
            let inverse = transform_matrix(&obj.transform).inverse();
            let local = ray.transformed(&inverse);
            let mesh = obj.working_copy.as_ref().unwrap_or(&obj.mesh);
            for (fi, poly) in mesh.polygons.iter().enumerate() {
                if mesh.hidden_faces.binary_search(&(fi as u32)).is_ok() {
                    continue;
                }
                let corner = |i: u32| Vec3::from_array(mesh.positions[i as usize]);
                for k in 1..poly.len().saturating_sub(1) {
                    let hit = ray_triangle_intersect(
                        &local,
                        corner(poly[0]),
                        corner(poly[k]),
                        corner(poly[k + 1]),
                    );
                    if let Some(t) = hit {
                        if t < max_distance && best.as_ref().map_or(true, |(_, d)| t < *d) {
                            best = Some((obj.id.clone(), t));
                        }
                    }
                }
            }
        }
        best
    }
}
