//! Interface to the host application.
//!
//! The engine never owns scene data: meshes, transforms, visibility and the
//! camera all live in the host and are reached through [`Host`].

mod camera;
mod memory;

pub use camera::ViewCamera;
pub use memory::MemoryScene;

use glam::{Mat4, Vec2, Vec3};
use shared::{MeshSource, ObjectId, PersistedMesh};

use crate::error::HostError;
use crate::picking::Ray;

/// Services the edit engine consumes from the host application.
pub trait Host {
    fn read_mesh(&self, object: &str, source: MeshSource) -> Result<PersistedMesh, HostError>;

    fn write_mesh(
        &mut self,
        object: &str,
        source: MeshSource,
        mesh: &PersistedMesh,
    ) -> Result<(), HostError>;

    /// Whether the object is already open in the host's own edit mode
    fn has_working_copy(&self, object: &str) -> bool;

    fn world_matrix(&self, object: &str) -> Result<Mat4, HostError>;

    /// Whether the viewport currently shows the object
    fn is_visible(&self, object: &str) -> bool;

    /// World-space ray under a pixel position, if the viewport can produce one
    fn pointer_ray(&self, pointer: Vec2) -> Option<Ray>;

    /// Pixel position of a world point, None when it is behind the view
    fn project(&self, point: Vec3) -> Option<Vec2>;

    /// Nearest visible geometry along `ray` closer than `max_distance`,
    /// ignoring the objects in `exclude`.
    fn occluder(&self, ray: &Ray, max_distance: f32, exclude: &[ObjectId]) -> Option<(ObjectId, f32)>;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn read_mesh(&self, object: &str, source: MeshSource) -> Result<PersistedMesh, HostError> {
        (**self).read_mesh(object, source)
    }

    fn write_mesh(
        &mut self,
        object: &str,
        source: MeshSource,
        mesh: &PersistedMesh,
    ) -> Result<(), HostError> {
        (**self).write_mesh(object, source, mesh)
    }

    fn has_working_copy(&self, object: &str) -> bool {
        (**self).has_working_copy(object)
    }

    fn world_matrix(&self, object: &str) -> Result<Mat4, HostError> {
        (**self).world_matrix(object)
    }

    fn is_visible(&self, object: &str) -> bool {
        (**self).is_visible(object)
    }

    fn pointer_ray(&self, pointer: Vec2) -> Option<Ray> {
        (**self).pointer_ray(pointer)
    }

    fn project(&self, point: Vec3) -> Option<Vec2> {
        (**self).project(point)
    }

    fn occluder(&self, ray: &Ray, max_distance: f32, exclude: &[ObjectId]) -> Option<(ObjectId, f32)> {
        (**self).occluder(ray, max_distance, exclude)
    }
}
