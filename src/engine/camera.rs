// Orbit camera
//
// Camera model:
//   - An eye position and a look-at target, both in world space
//   - Mouse drag orbits the eye around the target (yaw about world Y, pitch about world X)
//   - WASD translates eye and target together, so the view direction is kept

use glam::{Mat4, Vec3};

pub struct OrbitCamera {
    /// World-space eye position.
    position: Vec3,

    /// Point the camera looks at.
    target: Vec3,

    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(3.0, 3.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Move eye and target by the same offset.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.target += delta;
    }

    /// Rotate the eye around the target. Angles are in degrees; the drag delta in
    /// pixels is used as-is, one pixel per degree.
    ///
    /// The rotation is `Ry(yaw) * Rx(pitch)` about the world axes, so a long
    /// vertical drag can carry the eye over the pole.
    pub fn orbit(&mut self, yaw_deg: f32, pitch_deg: f32) {
        let rotation = Mat4::from_rotation_y(yaw_deg.to_radians())
            * Mat4::from_rotation_x(pitch_deg.to_radians());
        let offset = self.position - self.target;
        self.position = self.target + rotation.transform_vector3(offset);
    }

    /// View matrix: looks from the camera eye toward the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn position(&self) -> Vec3 { self.position }
    pub fn target(&self) -> Vec3 { self.target }
    pub fn distance(&self) -> f32 { (self.position - self.target).length() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn translate_moves_eye_and_target() {
        let mut cam = OrbitCamera::new();
        cam.translate(Vec3::new(0.0, 0.0, 0.05));
        assert!(close(cam.position(), Vec3::new(3.0, 3.0, 3.05)));
        assert!(close(cam.target(), Vec3::new(0.0, 0.0, 0.05)));
    }

    #[test]
    fn yaw_rotates_about_world_up() {
        let mut cam = OrbitCamera::new();
        cam.orbit(90.0, 0.0);
        assert!(close(cam.position(), Vec3::new(3.0, 3.0, -3.0)), "{}", cam.position());
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut cam = OrbitCamera::new();
        cam.translate(Vec3::new(1.0, 0.0, -2.0));
        let before = cam.distance();
        cam.orbit(17.0, -33.0);
        cam.orbit(-4.0, 12.5);
        assert!((cam.distance() - before).abs() < 1e-4);
        assert!(close(cam.target(), Vec3::new(1.0, 0.0, -2.0)));
    }

    #[test]
    fn zero_drag_is_identity() {
        let mut cam = OrbitCamera::new();
        cam.orbit(0.0, 0.0);
        assert!(close(cam.position(), Vec3::new(3.0, 3.0, 3.0)));
    }
}
