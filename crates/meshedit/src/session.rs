//! Per-object editing state for one tracked object.

use shared::{MeshSource, ObjectId, PersistedMesh};

use crate::error::{HostError, SessionError, TopologyError};
use crate::host::Host;
use crate::options::TrackOptions;
use crate::picking::RayStructure;
use crate::snapshot::Snapshot;
use crate::topology::MeshTopology;
use crate::transform::WorldTransform;

/// One tracked object: its working topology, the snapshot taken when tracking
/// began, the last state written to the host, cached transforms and (when
/// ray casting is enabled) the ray structure.
#[derive(Debug, Clone)]
pub struct ObjectSession {
    object: ObjectId,
    options: TrackOptions,
    source: MeshSource,
    topology: MeshTopology,
    snapshot: Snapshot,
    committed: PersistedMesh,
    transform: WorldTransform,
    ray: Option<RayStructure>,
}

impl ObjectSession {
    /// Read the object from the host and build its topology.
    ///
    /// With `WORKING_COPY_ENABLED` an existing live working copy is edited;
    /// otherwise, or when the host has none, the persisted mesh is.
    pub fn open(host: &impl Host, object: &str, options: TrackOptions) -> Result<Self, SessionError> {
        let source = if options.contains(TrackOptions::WORKING_COPY_ENABLED)
            && host.has_working_copy(object)
        {
            MeshSource::WorkingCopy
        } else {
            MeshSource::Persisted
        };
        let snapshot = Snapshot::capture(host, object, source)?;
        let topology = MeshTopology::from_persisted(snapshot.mesh())?;
        let transform = WorldTransform::new(host.world_matrix(object)?);
        let ray = options
            .contains(TrackOptions::RAY_CAST_ENABLED)
            .then(|| RayStructure::build(&topology));
        Ok(Self {
            object: object.to_string(),
            options,
            source,
            committed: snapshot.mesh().clone(),
            topology,
            snapshot,
            transform,
            ray,
        })
    }

    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn options(&self) -> TrackOptions {
        self.options
    }

    /// Which host mesh this session reads and writes
    pub fn source(&self) -> MeshSource {
        self.source
    }

    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut MeshTopology {
        &mut self.topology
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The mesh the host currently stores for this object
    pub fn committed(&self) -> &PersistedMesh {
        &self.committed
    }

    pub fn transform(&self) -> &WorldTransform {
        &self.transform
    }

    pub fn ray_structure(&self) -> Option<&RayStructure> {
        self.ray.as_ref()
    }

    pub fn has_ray(&self) -> bool {
        self.ray.is_some()
    }

    /// Whether the ray structure was built from the current topology
    pub fn ray_is_current(&self) -> bool {
        self.ray
            .as_ref()
            .is_some_and(|ray| ray.version() == self.topology.version())
    }

    /// Working topology differs from what the host stores
    pub fn is_dirty(&self) -> bool {
        self.topology.to_persisted() != self.committed
    }

    /// Object differs from its state when tracking began
    pub fn is_modified(&self) -> bool {
        &self.committed != self.snapshot.mesh()
    }

    /// Replace topology and committed state with a mesh the host now stores.
    pub(crate) fn reload(&mut self, mesh: PersistedMesh) -> Result<(), TopologyError> {
        let previous = self.topology.version();
        let mut topology = MeshTopology::from_persisted(&mesh)?;
        topology.continue_version(previous);
        self.topology = topology;
        self.committed = mesh;
        Ok(())
    }

    /// Refresh the cached transform and, for ray-cast objects, the ray
    /// structure from the current topology.
    pub(crate) fn rebuild_ray(&mut self, host: &impl Host) -> Result<(), HostError> {
        self.transform = WorldTransform::new(host.world_matrix(&self.object)?);
        if self.options.contains(TrackOptions::RAY_CAST_ENABLED) {
            self.ray = Some(RayStructure::build(&self.topology));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::host::MemoryScene;
    use glam::Vec3;
    use shared::Transform;

    fn scene_with_cube() -> (MemoryScene, ObjectId) {
        let mut scene = MemoryScene::new();
        let id = scene.insert("Cube", fixtures::cube_mesh(1.0), Transform::at([2.0, 0.0, 0.0]));
        (scene, id)
    }

    #[test]
    fn test_open_builds_topology_and_ray() {
        let (scene, id) = scene_with_cube();
        let session = ObjectSession::open(&scene, &id, TrackOptions::pickable()).unwrap();
        assert_eq!(session.topology().face_count(), 6);
        assert_eq!(session.source(), MeshSource::Persisted);
        assert!(session.has_ray());
        assert!(session.ray_is_current());
        assert!(!session.is_dirty());
        assert_eq!(session.transform().to_world(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_open_without_ray() {
        let (scene, id) = scene_with_cube();
        let session = ObjectSession::open(&scene, &id, TrackOptions::empty()).unwrap();
        assert!(!session.has_ray());
        assert!(!session.ray_is_current());
    }

    #[test]
    fn test_working_copy_source() {
        let (mut scene, id) = scene_with_cube();
        let opts = TrackOptions::WORKING_COPY_ENABLED;
        assert_eq!(
            ObjectSession::open(&scene, &id, opts).unwrap().source(),
            MeshSource::Persisted
        );
        scene.begin_working_copy(&id);
        assert_eq!(
            ObjectSession::open(&scene, &id, opts).unwrap().source(),
            MeshSource::WorkingCopy
        );
    }

    #[test]
    fn test_open_unknown_object_fails() {
        let scene = MemoryScene::new();
        let err = ObjectSession::open(&scene, "ghost", TrackOptions::pickable()).unwrap_err();
        assert!(matches!(err, SessionError::Host(HostError::UnknownObject(_))));
    }

    #[test]
    fn test_edit_marks_dirty_and_stales_ray() {
        let (scene, id) = scene_with_cube();
        let mut session = ObjectSession::open(&scene, &id, TrackOptions::pickable()).unwrap();
        session.topology_mut().translate_vertex(0, Vec3::X).unwrap();
        assert!(session.is_dirty());
        assert!(!session.ray_is_current());
        session.rebuild_ray(&scene).unwrap();
        assert!(session.ray_is_current());
    }

    #[test]
    fn test_reload_keeps_version_increasing() {
        let (scene, id) = scene_with_cube();
        let mut session = ObjectSession::open(&scene, &id, TrackOptions::pickable()).unwrap();
        session.topology_mut().translate_vertex(0, Vec3::X).unwrap();
        let before = session.topology().version();
        let mesh = session.topology().to_persisted();
        session.reload(mesh.clone()).unwrap();
        assert!(session.topology().version() > before);
        assert_eq!(session.committed(), &mesh);
        assert!(session.is_modified());
        assert!(!session.is_dirty());
    }
}
