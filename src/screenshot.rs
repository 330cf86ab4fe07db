//! Screenshot capture pipeline.
//!
//! `request → copy on the render thread → frame-delayed readback → encode
//! and write on a detached worker`. The request is a single atomic slot, so
//! at most one capture kind is pending at any time.

pub mod backend;
pub mod encode;
pub mod queue;
mod worker;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::color::ColorSpace;
use crate::error::Result;

pub use backend::{ReadbackImage, RenderBackend, ResourceHandle, ResourceState};
pub use queue::CaptureQueue;

/// Frames to wait between issuing a copy and reading it back.
pub const DEFAULT_FRAME_DELAY: u64 = 8;

/// Which delivery a capture is encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Sdr,
    Hdr,
}

const REQUEST_NONE: u8 = 0;
const REQUEST_SDR: u8 = 1;
const REQUEST_HDR: u8 = 2;

impl CaptureKind {
    fn encode(kind: Option<CaptureKind>) -> u8 {
        match kind {
            None => REQUEST_NONE,
            Some(CaptureKind::Sdr) => REQUEST_SDR,
            Some(CaptureKind::Hdr) => REQUEST_HDR,
        }
    }

    fn decode(value: u8) -> Option<CaptureKind> {
        match value {
            REQUEST_SDR => Some(CaptureKind::Sdr),
            REQUEST_HDR => Some(CaptureKind::Hdr),
            _ => None,
        }
    }
}

/// Pending screenshot request.
///
/// Single writer (the request callback), cleared by the render thread once
/// the copy is issued.
#[derive(Debug, Default)]
pub struct ScreenshotRequest(AtomicU8);

impl ScreenshotRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. When both kinds are asked for, HDR wins.
    pub fn request(&self, want_hdr: bool, want_sdr: bool) -> Option<CaptureKind> {
        let kind = match (want_hdr, want_sdr) {
            (true, true) => {
                warn!("Both HDR and SDR screenshots requested, dropping the SDR one");
                Some(CaptureKind::Hdr)
            }
            (true, false) => Some(CaptureKind::Hdr),
            (false, true) => Some(CaptureKind::Sdr),
            (false, false) => None,
        };
        if kind.is_some() {
            self.0.store(CaptureKind::encode(kind), Ordering::Release);
        }
        kind
    }

    pub fn pending(&self) -> Option<CaptureKind> {
        CaptureKind::decode(self.0.load(Ordering::Acquire))
    }

    pub fn want_sdr(&self) -> bool {
        self.pending() == Some(CaptureKind::Sdr)
    }

    pub fn want_hdr(&self) -> bool {
        self.pending() == Some(CaptureKind::Hdr)
    }

    /// Clear the slot if it still holds `kind`.
    pub fn consume(&self, kind: CaptureKind) -> bool {
        self.0
            .compare_exchange(
                CaptureKind::encode(Some(kind)),
                REQUEST_NONE,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Screenshot output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotConfig {
    pub output_dir: PathBuf,
    /// File name prefix, followed by a local timestamp.
    pub prefix: String,
    pub frame_delay: u64,
    /// Thumbnail bounding box for SDR captures.
    pub thumbnail_max: (u32, u32),
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Screenshots"),
            prefix: "screenshot".to_string(),
            frame_delay: DEFAULT_FRAME_DELAY,
            thumbnail_max: (384, 216),
        }
    }
}

impl ScreenshotConfig {
    /// `<output_dir>/<prefix>_<YYYYmmdd_HHMMSS_mmm>`, without extension.
    pub fn output_stem(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        self.output_dir
            .join(format!("{}_{}", self.prefix, timestamp))
    }
}

/// A copied render target waiting for its readback.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCapture {
    pub resource: ResourceHandle,
    /// Frame index the copy was issued on.
    pub frame: u64,
    pub kind: CaptureKind,
    pub output_stem: PathBuf,
    /// Color space of the captured surface.
    pub color_space: ColorSpace,
    /// HDR clamp ceiling: the shader peak brightness of the capture frame.
    pub peak_nits: f32,
    /// Lossless EXR compression.
    pub lossless: bool,
}

/// Per-capture parameters from the capture frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureParams {
    pub color_space: ColorSpace,
    pub peak_nits: f32,
    pub lossless: bool,
}

/// Screenshot state shared between the request callback, the render thread
/// and encode workers.
pub struct ScreenshotPipeline {
    request: ScreenshotRequest,
    queue: Mutex<CaptureQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    backend: Arc<dyn RenderBackend>,
    config: ScreenshotConfig,
}

impl ScreenshotPipeline {
    pub fn new(backend: Arc<dyn RenderBackend>, config: ScreenshotConfig) -> Self {
        Self {
            request: ScreenshotRequest::new(),
            queue: Mutex::new(CaptureQueue::new(config.frame_delay)),
            workers: Mutex::new(Vec::new()),
            backend,
            config,
        }
    }

    pub fn config(&self) -> &ScreenshotConfig {
        &self.config
    }

    pub fn request(&self) -> &ScreenshotRequest {
        &self.request
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Copy the current render target for the pending request, if any.
    ///
    /// Render thread only. The request slot is cleared once the copy has
    /// been submitted; on failure the request is dropped.
    pub fn capture_pending(&self, frame: u64, params: CaptureParams) -> Option<CaptureKind> {
        let kind = self.request.pending()?;

        if self.queue.lock().contains(frame, kind) {
            self.request.consume(kind);
            return None;
        }

        let result = self.issue_copy();
        self.request.consume(kind);
        let resource = match result {
            Ok(resource) => resource,
            Err(e) => {
                error!("{:?} screenshot capture failed: {}", kind, e);
                return None;
            }
        };

        let capture = PendingCapture {
            resource,
            frame,
            kind,
            output_stem: self.config.output_stem(),
            color_space: params.color_space,
            peak_nits: params.peak_nits,
            lossless: params.lossless,
        };
        let mut queue = self.queue.lock();
        info!(
            "{:?} screenshot captured on frame {}, encoding from frame {} -> {}",
            kind,
            frame,
            frame + queue.frame_delay(),
            capture.output_stem.display()
        );
        queue.push(capture);
        Some(kind)
    }

    fn issue_copy(&self) -> Result<ResourceHandle> {
        let backend = &*self.backend;
        let source = backend.current_render_target().ok_or_else(|| {
            crate::error::Error::Backend("no render target to capture".to_string())
        })?;
        let dest = backend.create_copy_target(source)?;

        backend.transition(source, ResourceState::RenderTarget, ResourceState::CopySource);
        backend.transition(dest, ResourceState::Common, ResourceState::CopyDest);
        backend.copy_resource(dest, source);
        backend.transition(dest, ResourceState::CopyDest, ResourceState::Common);
        backend.transition(source, ResourceState::CopySource, ResourceState::RenderTarget);

        if let Err(e) = backend.submit() {
            backend.release(dest);
            return Err(e);
        }
        Ok(dest)
    }

    /// Hand every capture whose delay has elapsed to an encode worker.
    ///
    /// Render thread only. Returns the number of captures handed off.
    pub fn service(&self, frame: u64) -> usize {
        let ready = self.queue.lock().drain_ready(frame);
        if ready.is_empty() {
            return 0;
        }

        let count = ready.len();
        let mut workers = self.workers.lock();
        workers.retain(|h| !h.is_finished());
        for capture in ready {
            debug!(
                "Servicing {:?} screenshot from frame {} on frame {}",
                capture.kind, capture.frame, frame
            );
            if let Some(handle) =
                worker::spawn_encode_worker(self.backend.clone(), capture, self.config.thumbnail_max)
            {
                workers.push(handle);
            }
        }
        count
    }

    /// Block until every started encode worker has finished.
    pub fn join_workers(&self) {
        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                error!("Screenshot worker panicked");
            }
        }
    }
}
