use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3, Vec4};
use ply::SplatRecord;
use serde::{Deserialize, Serialize};
use crate::quad::{CORNERS, VERTICES_PER_QUAD};

/// SH l=0 constant.
pub const SH_C0: f32 = 0.282_094_791_773_878_14;

/// `exp(-(u² + v²) / 2)` is below 1e-3 along the edge of a quad this size.
pub const DEFAULT_HALF_EXTENT: f32 = 4.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// `0.5 + SH_C0 * dc`, clamped to [0, 1].
    #[default]
    ShNormalized,
    /// The DC coefficients as they are stored.
    RawDc,
}

/// Per-vertex data of a splat quad. Layout must match the WGSL vertex input.
///
/// `cov0..cov2` are the columns of `R * S`; the shader offsets `position` by that
/// matrix applied to the camera-facing corner, so the quad follows the projected
/// gaussian rather than being a fixed-size square.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub cov0: [f32; 3],
    pub cov1: [f32; 3],
    pub cov2: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Rotation composed with the activated scale, `R * diag(exp(log_scale))`.
pub fn shape_matrix(splat: &SplatRecord) -> Mat3 {
    Mat3::from_quat(splat.rotation) * Mat3::from_diagonal(splat.scale())
}

pub fn splat_color(splat: &SplatRecord, mode: ColorMode) -> Vec4 {
    let rgb = match mode {
        ColorMode::ShNormalized => (Vec3::splat(0.5) + splat.color_dc * SH_C0).clamp(Vec3::ZERO, Vec3::ONE),
        ColorMode::RawDc => splat.color_dc,
    };
    rgb.extend(splat.opacity())
}

/// The four vertices of one splat. Only `uv` differs between them.
pub fn build_quad(splat: &SplatRecord, half_extent: f32, mode: ColorMode) -> [QuadVertex; 4] {
    let shape = shape_matrix(splat);
    let color = splat_color(splat, mode).to_array();

    CORNERS.map(|corner| QuadVertex {
        position: splat.position.to_array(),
        cov0: shape.x_axis.to_array(),
        cov1: shape.y_axis.to_array(),
        cov2: shape.z_axis.to_array(),
        uv: (corner * half_extent).to_array(),
        color,
    })
}

pub fn build_vertices(splats: &[SplatRecord], half_extent: f32, mode: ColorMode) -> Vec<QuadVertex> {
    let mut vertices = Vec::with_capacity(splats.len() * VERTICES_PER_QUAD);
    for splat in splats {
        vertices.extend(build_quad(splat, half_extent, mode));
    }
    vertices
}
