use glam::{EulerRot, Quat, Vec2, Vec3};

/// Held keys and accumulated pointer movement since the last tick.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub pointer_pressed: bool,
    /// Pixels dragged since the last tick.
    pub pointer_delta: Vec2,
    pub resort_requested: bool,
}

/// Camera changes produced by one tick of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationDelta {
    /// Translation in the camera frame.
    pub translation: Vec3,
    pub rotation: Quat,
    pub resort: bool,
}

impl Default for NavigationDelta {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            resort: false,
        }
    }
}

impl InputState {
    pub fn drag(&mut self, delta: Vec2) {
        if self.pointer_pressed {
            self.pointer_delta += delta;
        }
    }

    pub fn delta(&self, move_speed: f32, rotate_sensitivity: f32) -> NavigationDelta {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => move_speed,
            (false, true) => -move_speed,
            _ => 0.0,
        };

        let translation = Vec3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.backward, self.forward),
        );

        // Horizontal drag yaws, vertical drag pitches.
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            -self.pointer_delta.y * rotate_sensitivity,
            -self.pointer_delta.x * rotate_sensitivity,
            0.0,
        );

        NavigationDelta {
            translation,
            rotation,
            resort: self.resort_requested,
        }
    }

    /// Like [`InputState::delta`] but consumes the pointer movement and resort request.
    pub fn take_delta(&mut self, move_speed: f32, rotate_sensitivity: f32) -> NavigationDelta {
        let delta = self.delta(move_speed, rotate_sensitivity);
        self.pointer_delta = Vec2::ZERO;
        self.resort_requested = false;
        delta
    }
}
