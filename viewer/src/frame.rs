use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::camera::CameraSnapshot;
use crate::footprint::QuadVertex;
use crate::sort::DrawOrder;

/// Uniform block in the order the splat shader declares it. Matrices are column major.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// World to camera. The scene itself has no model transform.
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Camera to world, the shader reads the camera right/up axes from it.
    pub camera: [[f32; 4]; 4],
}

impl FrameUniforms {
    pub fn from_camera(camera: &CameraSnapshot) -> Self {
        Self {
            model_view: camera.view().to_cols_array_2d(),
            projection: camera.projection().to_cols_array_2d(),
            camera: camera.model().to_cols_array_2d(),
        }
    }

    pub fn as_floats(&self) -> &[f32; 48] {
        bytemuck::cast_ref(self)
    }
}

/// Everything the renderer uploads for one frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub uniforms: FrameUniforms,
    pub vertices: Arc<[QuadVertex]>,
    pub draw_order: Arc<DrawOrder>,
}

impl FrameState {
    pub fn assemble(camera: &CameraSnapshot, vertices: Arc<[QuadVertex]>, draw_order: Arc<DrawOrder>) -> Self {
        Self {
            uniforms: FrameUniforms::from_camera(camera),
            vertices,
            draw_order,
        }
    }

    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.draw_order.indices())
    }

    pub fn index_count(&self) -> u32 {
        self.draw_order.indices().len() as u32
    }
}
