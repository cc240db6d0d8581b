use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Instant;
use glam::Mat4;
use ply::SplatRecord;
use tracing::debug;
use crate::camera::CameraSnapshot;
use crate::quad::{INDICES_PER_QUAD, quad_indices};

/// Splat draw order and the triangle indices it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawOrder {
    splats: Vec<u32>,
    indices: Vec<u32>,
}

impl DrawOrder {
    pub fn from_splat_order(splats: Vec<u32>) -> Self {
        let mut indices = Vec::with_capacity(splats.len() * INDICES_PER_QUAD);
        for &splat in &splats {
            indices.extend(quad_indices(splat));
        }
        Self { splats, indices }
    }

    /// File order, used until the first sort completes.
    pub fn identity(count: usize) -> Self {
        Self::from_splat_order((0..count as u32).collect())
    }

    pub fn splats(&self) -> &[u32] {
        &self.splats
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// View space depth of every splat center.
pub fn view_depths(splats: &[SplatRecord], view: &Mat4) -> Vec<f32> {
    splats
        .iter()
        .map(|splat| view.transform_point3(splat.position).z)
        .collect()
}

/// Splat indices ordered farthest first for a right handed view looking down -Z.
///
/// Ascending view space z, stable so equal depths keep file order.
pub fn back_to_front(splats: &[SplatRecord], view: &Mat4) -> Vec<u32> {
    let depths = view_depths(splats, view);
    let mut order: Vec<u32> = (0..splats.len() as u32).collect();
    order.sort_by(|&a, &b| depths[a as usize].total_cmp(&depths[b as usize]));
    order
}

/// Handle for one sort; only the most recently issued ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortTicket(u64);

/// Double buffered draw order.
///
/// Readers get an `Arc` to the published order which is never mutated; a finished
/// sort replaces the whole `Arc`. Results of superseded sorts are dropped.
#[derive(Debug)]
pub struct DrawOrderSwap {
    current: RwLock<Arc<DrawOrder>>,
    issued: AtomicU64,
}

impl DrawOrderSwap {
    pub fn new(initial: DrawOrder) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            issued: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> Arc<DrawOrder> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Starts a sort, superseding any sort still in flight.
    pub fn begin(&self) -> SortTicket {
        SortTicket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Swaps in `order` unless a newer sort was started. Returns whether it was published.
    pub fn publish(&self, ticket: SortTicket, order: DrawOrder) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 != self.issued.load(Ordering::Acquire) {
            debug!(ticket = ticket.0, "discarding superseded sort");
            return false;
        }
        *current = Arc::new(order);
        true
    }
}

/// Keeps the published draw order and re-sorts it when asked to.
#[derive(Debug)]
pub struct VisibilityOrderer {
    swap: Arc<DrawOrderSwap>,
    resort_requested: bool,
}

impl VisibilityOrderer {
    pub fn new(splat_count: usize) -> Self {
        Self {
            swap: Arc::new(DrawOrderSwap::new(DrawOrder::identity(splat_count))),
            resort_requested: false,
        }
    }

    pub fn request_resort(&mut self) {
        self.resort_requested = true;
    }

    pub fn resort_requested(&self) -> bool {
        self.resort_requested
    }

    pub fn current(&self) -> Arc<DrawOrder> {
        self.swap.current()
    }

    /// Sorts on the calling thread if a resort was requested since the last one.
    pub fn resort_if_requested(&mut self, camera: &CameraSnapshot, splats: &[SplatRecord]) -> bool {
        if !self.resort_requested {
            return false;
        }
        self.resort(camera, splats)
    }

    pub fn resort(&mut self, camera: &CameraSnapshot, splats: &[SplatRecord]) -> bool {
        self.resort_requested = false;
        let ticket = self.swap.begin();
        sort_and_publish(&self.swap, ticket, camera, splats)
    }

    /// Sorts on a worker thread. The current order stays renderable until the result
    /// is swapped in, and the result is dropped if another sort starts first.
    pub fn spawn_resort(&mut self, camera: CameraSnapshot, splats: Arc<[SplatRecord]>) -> JoinHandle<bool> {
        self.resort_requested = false;
        let ticket = self.swap.begin();
        let swap = self.swap.clone();
        std::thread::spawn(move || sort_and_publish(&swap, ticket, &camera, &splats))
    }
}

fn sort_and_publish(swap: &DrawOrderSwap, ticket: SortTicket, camera: &CameraSnapshot, splats: &[SplatRecord]) -> bool {
    let start = Instant::now();
    let order = DrawOrder::from_splat_order(back_to_front(splats, &camera.view()));
    debug!(splats = splats.len(), elapsed = ?start.elapsed(), "sorted splats");
    swap.publish(ticket, order)
}
