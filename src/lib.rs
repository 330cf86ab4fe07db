//! # hdrcontrol
//!
//! Output color management for a renderer augmentation that adds HDR output
//! to a game.
//!
//! The controller decides how the output surface represents color (pixel
//! format, transfer function, gamut) from the user's display mode, the OS
//! HDR state of the monitor and constraints imposed by frame-generation
//! technology. It derives the constant buffer read by the tone-mapping
//! shaders and captures SDR (PNG) and HDR (OpenEXR) screenshots off the
//! render thread.
//!
//! ## Rust usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use hdrcontrol::mock::{MockDisplay, MockHost, MockRenderBackend, RecordingSurface};
//! use hdrcontrol::{ColorController, OutputHandle, ScreenshotConfig, SettingsStore};
//!
//! let controller = ColorController::new(
//!     SettingsStore::open("hdrcontrol.json").unwrap(),
//!     Arc::new(MockDisplay::hdr_enabled(1000.0)),
//!     Arc::new(MockHost::with_modules(&["SFShaderInjector.dll"])),
//!     Box::new(RecordingSurface::new()),
//!     Arc::new(MockRenderBackend::new(1920, 1080)),
//!     ScreenshotConfig::default(),
//! );
//! controller.init_compatibility(OutputHandle(0)).unwrap();
//!
//! // Per draw
//! let constants = controller.build_shader_constants();
//! let _bytes = constants.as_bytes();
//!
//! // Per frame
//! controller.on_frame_boundary(false);
//! controller.on_frame_boundary(true);
//! ```

pub mod color;
pub mod controller;
pub mod display;
pub mod error;
pub mod image;
pub mod mock;
pub mod screenshot;
pub mod settings;
pub mod shader;
pub mod swapchain;

pub use color::{BufferFormat, ColorSpace, SurfaceFamily};
pub use controller::ColorController;
pub use display::{DisplayMode, EffectiveDisplayMode, FrameGenerationTech, OutputHandle};
pub use error::{Error, Result};
pub use screenshot::{CaptureKind, ScreenshotConfig};
pub use settings::{ColorSettings, SettingsStore, StoredValue};
pub use shader::ShaderConstants;
