use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info};

use super::encode::write_capture;
use super::{PendingCapture, RenderBackend};

/// Spawn a detached worker that reads back, encodes and writes one capture.
///
/// The worker always releases the captured resource. Failures are logged
/// and the capture is dropped. Returns `None` if the thread could not be
/// started, in which case the resource has already been released.
pub(crate) fn spawn_encode_worker(
    backend: Arc<dyn RenderBackend>,
    capture: PendingCapture,
    thumbnail_max: (u32, u32),
) -> Option<JoinHandle<()>> {
    let resource = capture.resource;
    let fallback = backend.clone();

    let spawned = thread::Builder::new()
        .name("hdrcontrol-screenshot".into())
        .spawn(move || {
            let result = backend
                .read_back(capture.resource)
                .map_err(anyhow::Error::from)
                .and_then(|image| write_capture(&image, &capture, thumbnail_max));
            backend.release(capture.resource);

            match result {
                Ok(paths) => {
                    for path in paths {
                        info!("Screenshot written: {}", path.display());
                    }
                }
                Err(e) => error!(
                    "{:?} screenshot from frame {} dropped: {:#}",
                    capture.kind, capture.frame, e
                ),
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!("Failed to start screenshot worker: {}", e);
            fallback.release(resource);
            None
        }
    }
}
