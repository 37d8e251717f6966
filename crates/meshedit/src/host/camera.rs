use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::picking::Ray;

/// Orbit camera for a viewport of `size` pixels (origin top-left)
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    /// Camera target point
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    /// Viewport size in pixels
    pub size: Vec2,
}

impl ViewCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
            distance: 6.0,
            target: Vec3::ZERO,
            fov: 45.0_f32.to_radians(),
            size: Vec2::new(800.0, 600.0),
        }
    }

    /// Camera on +Z looking straight at `target`
    pub fn front(target: Vec3, distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target,
            ..Self::new()
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta)).clamp(0.5, 100.0);
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + Vec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = self.size.x / self.size.y;
        Mat4::perspective_rh_gl(self.fov, aspect, 0.1, 200.0)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to pixel coordinates; None behind the camera
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let p = self.view_projection() * point.extend(1.0);
        if p.w <= 0.0 {
            return None;
        }
        let ndc = p.truncate() / p.w;
        let center = self.size * 0.5;
        Some(Vec2::new(
            center.x + ndc.x * self.size.x * 0.5,
            center.y - ndc.y * self.size.y * 0.5,
        ))
    }

    /// Cast a ray from a pixel position into the scene
    pub fn screen_ray(&self, pointer: Vec2) -> Ray {
        let center = self.size * 0.5;

        // Screen → NDC
        let ndc_x = (pointer.x - center.x) / (self.size.x * 0.5);
        let ndc_y = -(pointer.y - center.y) / (self.size.y * 0.5);

        let vp_inv = self.view_projection().inverse();

        // Unproject near and far points
        let near_world = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Ray::new(self.eye_position(), far - near)
    }
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_camera_eye() {
        let cam = ViewCamera::front(Vec3::ZERO, 10.0);
        assert!((cam.eye_position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_center_pixel_ray_points_at_target() {
        let cam = ViewCamera::front(Vec3::ZERO, 10.0);
        let ray = cam.screen_ray(cam.size * 0.5);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_project_then_ray_passes_through_point() {
        let mut cam = ViewCamera::new();
        cam.rotate(20.0, -10.0);
        let p = Vec3::new(0.7, -0.4, 1.2);
        let pixel = cam.project(p).unwrap();
        let ray = cam.screen_ray(pixel);
        let to_p = p - ray.origin;
        let off_axis = to_p - ray.direction * to_p.dot(ray.direction);
        assert!(off_axis.length() < 1e-3);
    }

    #[test]
    fn test_point_behind_camera_not_projected() {
        let cam = ViewCamera::front(Vec3::ZERO, 10.0);
        assert!(cam.project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_zoom_clamps() {
        let mut cam = ViewCamera::new();
        cam.zoom(0.99);
        cam.zoom(0.99);
        assert_eq!(cam.distance, 0.5);
    }
}
