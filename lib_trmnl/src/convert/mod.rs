//! # Convert Module
//!
//! From HTML to the raster the display downloads.
//!
//! ## Contained Modules:
//!
//! - **`rasterizer`**: the `Rasterizer` capability and the external-process
//!   implementation.
//! - **`monochrome`**: nearest-neighbour resize plus 1-bit thresholding.
//! - **`publish`**: encoding and temp-file-and-rename publication.
//! - **`converter`**: `ImageConverter`, chaining the three.

pub mod converter;
pub mod monochrome;
pub mod publish;
pub mod rasterizer;

pub use converter::ImageConverter;
pub use publish::{publish_atomic, RasterFormat};
pub use rasterizer::{ExternalRasterizer, Rasterizer};
