//! Image transforms for publication.
//!
//! Accepted images are resized to a fixed box and converted to grayscale
//! before they are published.

pub mod error;
pub mod transform;

pub use error::{MediaError, MediaResult};
pub use transform::{content_type, GrayscaleResizer, ImageTransform, ResizeMode};
