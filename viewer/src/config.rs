use std::path::Path;
use ply::DegeneratePolicy;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::footprint::ColorMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,

    /// Near clip plane distance.
    pub near: f32,

    /// Far clip plane distance.
    pub far: f32,

    /// Initial camera position. The camera starts looking down -Z.
    pub camera_position: [f32; 3],

    /// Distance moved per tick while a movement key is held.
    pub move_speed: f32,

    /// Radians of rotation per pixel of pointer drag.
    pub rotate_sensitivity: f32,

    /// Half width of each splat quad in standard deviations.
    pub quad_half_extent: f32,

    /// How the SH DC coefficients become vertex colors.
    pub color_mode: ColorMode,

    /// Only load this many splats from the start of the file.
    pub max_splats: Option<usize>,

    /// What to do with splats that have NaN or infinite parameters.
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [0.0, 0.0, 6.0],
            move_speed: 0.03,
            rotate_sensitivity: 0.003,
            quad_half_extent: crate::footprint::DEFAULT_HALF_EXTENT,
            color_mode: ColorMode::default(),
            max_splats: None,
            degenerate_policy: DegeneratePolicy::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }
}
