use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

use crate::picking::Ray;

/// Host transform → world matrix (scale, then XYZ Euler rotation, then translation)
pub fn transform_matrix(t: &shared::Transform) -> Mat4 {
    let position = Vec3::new(t.position[0] as f32, t.position[1] as f32, t.position[2] as f32);
    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        t.rotation[0] as f32,
        t.rotation[1] as f32,
        t.rotation[2] as f32,
    );
    let scale = Vec3::new(t.scale[0] as f32, t.scale[1] as f32, t.scale[2] as f32);
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// World matrix with its inverse and normal matrix, cached per tracked object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub matrix: Mat4,
    pub inverse: Mat4,
    /// Inverse-transpose of the upper 3x3
    pub normal: Mat3,
}

impl WorldTransform {
    pub fn new(matrix: Mat4) -> Self {
        let inverse = matrix.inverse();
        Self {
            matrix,
            inverse,
            normal: Mat3::from_mat4(inverse).transpose(),
        }
    }

    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix.transform_point3(local)
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.inverse.transform_point3(world)
    }

    pub fn normal_to_world(&self, normal: Vec3) -> Vec3 {
        (self.normal * normal).normalize_or_zero()
    }

    /// World ray in object-local space, `t` preserved
    pub fn ray_to_local(&self, ray: &Ray) -> Ray {
        ray.transformed(&self.inverse)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}
