use std::sync::Arc;
use std::thread::JoinHandle;
use ply::{PointCloud, SplatRecord};
use splat_source::Source;
use tracing::info;
use crate::camera::{Camera, CameraSnapshot};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::footprint::{QuadVertex, build_vertices};
use crate::frame::FrameState;
use crate::input::NavigationDelta;
use crate::sort::{DrawOrder, VisibilityOrderer};

/// A loaded splat cloud and everything needed to produce frames from it.
///
/// Records and vertices are built once at load time and shared with frames and
/// background sorts; only the camera and the published draw order change afterwards.
#[derive(Debug)]
pub struct SplatScene {
    config: ViewerConfig,
    records: Arc<[SplatRecord]>,
    vertices: Arc<[QuadVertex]>,
    orderer: VisibilityOrderer,
    camera: Camera,
}

impl SplatScene {
    pub async fn load(source: &Source, config: ViewerConfig, aspect: f32) -> Result<Self> {
        let bytes = source.load().await?;
        Self::from_bytes(&bytes, config, aspect)
    }

    pub fn from_bytes(bytes: &[u8], config: ViewerConfig, aspect: f32) -> Result<Self> {
        let cloud = PointCloud::from_bytes(bytes)?;
        Self::from_cloud(&cloud, config, aspect)
    }

    pub fn from_cloud(cloud: &PointCloud, config: ViewerConfig, aspect: f32) -> Result<Self> {
        let records = cloud.splats(config.max_splats, config.degenerate_policy)?;
        info!(splats = records.len(), points = cloud.len(), "built splat scene");
        Ok(Self::from_records(records, config, aspect))
    }

    /// A scene with nothing in it, for when a source could not be loaded.
    pub fn empty(config: ViewerConfig, aspect: f32) -> Self {
        Self::from_records(Vec::new(), config, aspect)
    }

    fn from_records(records: Vec<SplatRecord>, config: ViewerConfig, aspect: f32) -> Self {
        let vertices = build_vertices(&records, config.quad_half_extent, config.color_mode);
        let mut orderer = VisibilityOrderer::new(records.len());
        // File order is drawable right away, the first tick sorts it.
        orderer.request_resort();

        Self {
            camera: Camera::from_config(&config, aspect),
            records: Arc::from(records),
            vertices: Arc::from(vertices),
            orderer,
            config,
        }
    }

    pub fn apply_input(&mut self, delta: NavigationDelta) {
        self.camera.move_local(delta.translation);
        self.camera.rotate(delta.rotation);
        if delta.resort {
            self.orderer.request_resort();
        }
    }

    pub fn request_resort(&mut self) {
        self.orderer.request_resort();
    }

    /// Advances one frame: sorts if asked to, then captures what the renderer needs.
    pub fn tick(&mut self) -> FrameState {
        let camera = self.camera.snapshot();
        self.orderer.resort_if_requested(&camera, &self.records);
        self.frame_for(&camera)
    }

    /// The current frame without sorting.
    pub fn frame(&self) -> FrameState {
        self.frame_for(&self.camera.snapshot())
    }

    /// Sorts for the current camera on a worker thread. Frames keep using the
    /// previous order until the result is published.
    pub fn spawn_resort(&mut self) -> JoinHandle<bool> {
        self.orderer.spawn_resort(self.camera.snapshot(), self.records.clone())
    }

    fn frame_for(&self, camera: &CameraSnapshot) -> FrameState {
        FrameState::assemble(camera, self.vertices.clone(), self.orderer.current())
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn records(&self) -> &[SplatRecord] {
        &self.records
    }

    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    pub fn draw_order(&self) -> Arc<DrawOrder> {
        self.orderer.current()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
