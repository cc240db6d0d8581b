use glam::{Mat4, Quat, Vec3};
use crate::config::ViewerConfig;

// Composed rotations between two renormalizations.
const NORMALIZE_EVERY: u32 = 64;

/// First person camera. Looks down its local -Z with +Y up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,

    pub aspect: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,

    rotations: u32,
}

impl Camera {
    /// Camera at the default config's position and lens.
    pub fn new(aspect: f32) -> Self {
        Self::from_config(&ViewerConfig::default(), aspect)
    }

    pub fn from_config(config: &ViewerConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from_array(config.camera_position),
            orientation: Quat::IDENTITY,
            aspect,
            fov_y: config.fov_y(),
            near: config.near,
            far: config.far,
            rotations: 0,
        }
    }

    /// Moves by `delta` expressed in the camera's own frame, so -Z is always "forward".
    pub fn move_local(&mut self, delta: Vec3) {
        self.position += self.orientation * delta;
    }

    /// Applies `delta` on the right, i.e. in the camera's own frame.
    pub fn rotate(&mut self, delta: Quat) {
        self.orientation *= delta;
        self.rotations += 1;
        if self.rotations >= NORMALIZE_EVERY {
            self.normalize();
        }
    }

    pub fn normalize(&mut self) {
        self.orientation = self.orientation.normalize();
        self.rotations = 0;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Copy of the state every per-frame derivation should be taken from.
    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position,
            orientation: self.orientation,
            aspect: self.aspect,
            fov_y: self.fov_y,
            near: self.near,
            far: self.far,
        }
    }

    pub fn model(&self) -> Mat4 {
        self.snapshot().model()
    }

    pub fn view(&self) -> Mat4 {
        self.snapshot().view()
    }

    pub fn projection(&self) -> Mat4 {
        self.snapshot().projection()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.snapshot().view_projection()
    }
}

/// Immutable camera state captured at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub position: Vec3,
    pub orientation: Quat,
    pub aspect: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraSnapshot {
    /// Camera space to world space.
    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// World space to camera space.
    pub fn view(&self) -> Mat4 {
        self.model().inverse()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}
