// Render backend resource API used by the capture path.

use crate::color::ColorPixelFormat;
use crate::error::Result;

/// Opaque GPU resource handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Resource state for transition barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Common,
    RenderTarget,
    CopySource,
    CopyDest,
}

/// CPU copy of a captured resource.
#[derive(Debug, Clone)]
pub struct ReadbackImage {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * bytes_per_pixel`.
    pub row_pitch: usize,
    pub format: ColorPixelFormat,
    pub data: Vec<u8>,
}

impl ReadbackImage {
    /// Row `y` without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.row_pitch;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }

    pub fn is_complete(&self) -> bool {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        self.row_pitch >= row_bytes
            && (self.height == 0
                || self.data.len() >= (self.height as usize - 1) * self.row_pitch + row_bytes)
    }
}

/// Render backend collaborator.
///
/// Recording methods (`current_render_target` through `submit`) are called
/// on the render thread only. `read_back` and `release` are called from
/// screenshot workers.
pub trait RenderBackend: Send + Sync {
    /// Render target the frame was presented from, if any.
    fn current_render_target(&self) -> Option<ResourceHandle>;

    /// Allocate a resource with the same description as `source`, in the
    /// `Common` state.
    fn create_copy_target(&self, source: ResourceHandle) -> Result<ResourceHandle>;

    fn transition(&self, resource: ResourceHandle, before: ResourceState, after: ResourceState);

    fn copy_resource(&self, dest: ResourceHandle, source: ResourceHandle);

    /// Submit recorded commands.
    fn submit(&self) -> Result<()>;

    /// Map the resource and copy its texels to CPU memory.
    fn read_back(&self, resource: ResourceHandle) -> Result<ReadbackImage>;

    fn release(&self, resource: ResourceHandle);
}
