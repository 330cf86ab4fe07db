// Output surface format transitions.
//
// The declared buffer format must be updated before the backend is asked to
// recreate the surface; a recreate that runs first picks up the stale
// format. The color-space tag is applied last, to the recreated surface.

use log::{debug, info, warn};

use crate::color::{surface_for_mode, BufferFormat, ColorSpace, SurfaceDescriptor};
use crate::display::EffectiveDisplayMode;
use crate::error::Result;

/// Render backend operations on the live output surface.
pub trait SurfaceBackend: Send {
    /// Update the declared format of the backing buffer.
    fn set_buffer_format(&mut self, format: BufferFormat) -> Result<()>;

    /// Recreate the surface with the currently declared format.
    fn request_surface_reconfigure(&mut self) -> Result<()>;

    /// Tag the live surface with an OS color space.
    fn set_color_space(&mut self, color_space: ColorSpace) -> Result<()>;
}

/// What [`SwapchainTransition::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The surface already matched.
    Unchanged,
    /// Format and/or color space changed and the surface was recreated.
    Reconfigured,
}

/// Tracks the surface currently applied and drives changes to it.
#[derive(Debug, Default)]
pub struct SwapchainTransition {
    applied: Option<(EffectiveDisplayMode, SurfaceDescriptor)>,
}

impl SwapchainTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_mode(&self) -> Option<EffectiveDisplayMode> {
        self.applied.map(|(mode, _)| mode)
    }

    pub fn applied_surface(&self) -> Option<SurfaceDescriptor> {
        self.applied.map(|(_, surface)| surface)
    }

    /// Move the surface to `mode`.
    ///
    /// A mode change that keeps the same format and color space (e.g.
    /// `ScRgb` → `SdrOnWide`) only updates the tracked mode.
    pub fn apply(
        &mut self,
        backend: &mut dyn SurfaceBackend,
        mode: EffectiveDisplayMode,
    ) -> Result<TransitionOutcome> {
        let target = surface_for_mode(mode);
        let previous = self.applied;

        if let Some((prev_mode, prev_surface)) = previous {
            if prev_surface == target {
                if prev_mode != mode {
                    debug!(
                        "Display mode {} -> {} keeps the surface unchanged",
                        prev_mode.index(),
                        mode.index()
                    );
                    self.applied = Some((mode, target));
                }
                return Ok(TransitionOutcome::Unchanged);
            }
        }

        backend.set_buffer_format(target.format)?;
        backend.request_surface_reconfigure()?;
        backend.set_color_space(target.color_space)?;

        info!(
            "Display mode {} -> {}: format {:?}, color space {:?}",
            previous.map_or_else(|| "none".to_string(), |(m, _)| m.index().to_string()),
            mode.index(),
            target.format,
            target.color_space
        );
        self.applied = Some((mode, target));
        Ok(TransitionOutcome::Reconfigured)
    }

    /// Re-tag the live surface, e.g. after it moved to another monitor.
    pub fn reapply_color_space(&self, backend: &mut dyn SurfaceBackend) -> Result<()> {
        match self.applied_surface() {
            Some(surface) => backend.set_color_space(surface.color_space),
            None => {
                warn!("No surface applied yet, skipping color space update");
                Ok(())
            }
        }
    }
}
