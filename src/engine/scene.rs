// Per-frame scene state: camera, light, model transform, material color.
//
// Owned by the frame loop and passed to the render step. All mutation goes
// through the methods below; nothing here is global.

use glam::{Mat4, Vec3};

use super::camera::OrbitCamera;
use super::input::FrameSignals;

/// Point light. Only position and intensity reach the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
}

/// Uniform block shared by the vertex and fragment stages.
/// Layout must match `FrameUniforms` in shader.wgsl (vec3 + scalar pairs fill 16 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 3],
    pub light_intensity: f32,
    pub camera_position: [f32; 3],
    pub ambient: f32,
    pub base_color: [f32; 3],
    pub _padding: f32,
}

pub struct Scene {
    pub camera: OrbitCamera,
    pub light: PointLight,
    pub model: Mat4,
    pub base_color: Vec3,
    pub ambient: f32,
    /// Degrees the light travels around +Y each frame.
    pub light_step: f32,
    viewport: (u32, u32),
}

impl Scene {
    pub fn new(viewport: (u32, u32), light_step: f32) -> Self {
        Self {
            camera: OrbitCamera::new(),
            light: PointLight {
                position: Vec3::new(2.0, 2.0, -2.0),
                intensity: 0.8,
            },
            model: Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)),
            base_color: Vec3::new(0.9, 0.1, 0.1),
            ambient: 0.1,
            light_step,
            viewport,
        }
    }

    /// Apply this frame's translate and orbit signals to the camera.
    pub fn apply_input(&mut self, signals: &FrameSignals) {
        if signals.translate != Vec3::ZERO {
            self.camera.translate(signals.translate);
        }
        if signals.orbit_drag.x != 0.0 || signals.orbit_drag.y != 0.0 {
            self.camera.orbit(signals.orbit_drag.x, signals.orbit_drag.y);
        }
    }

    /// Advance the light one step along its orbit.
    pub fn advance_light(&mut self) {
        self.light.position = rotate_row_vector_y(self.light.position, self.light_step);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = (width, height);
        }
    }

    pub fn viewport(&self) -> (u32, u32) { self.viewport }

    pub fn aspect(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1.max(1) as f32
    }

    pub fn uniforms(&self) -> FrameUniforms {
        FrameUniforms {
            model: self.model.to_cols_array_2d(),
            view: self.camera.view_matrix().to_cols_array_2d(),
            projection: self.camera.projection_matrix(self.aspect()).to_cols_array_2d(),
            light_position: self.light.position.to_array(),
            light_intensity: self.light.intensity,
            camera_position: self.camera.position().to_array(),
            ambient: self.ambient,
            base_color: self.base_color.to_array(),
            _padding: 0.0,
        }
    }
}

/// Rotate `p` by `degrees` about +Y treating it as a row vector: `p * R`.
///
/// That equals `Rᵀ * p`, i.e. the opposite sense of the usual column-vector
/// rotation, so a positive step moves the light clockwise seen from above.
/// Kept this way to match the established light motion.
pub fn rotate_row_vector_y(p: Vec3, degrees: f32) -> Vec3 {
    Mat4::from_rotation_y(degrees.to_radians())
        .transpose()
        .transform_point3(p)
}
