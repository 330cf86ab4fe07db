// Screenshot image encoding.
//
// - SDR (.png): `basic` submodule via the `image` crate, RGBA8, plus a
//   downscaled thumbnail
// - HDR (.exr): `exr` submodule, RGBA half-float linear scRGB, ZIP (lossless)
//   or B44 (lossy) compression

pub mod basic;
pub mod exr;

pub use basic::{save_png, save_thumbnail, thumbnail_size};
pub use exr::{save_exr, ExrCompression};
