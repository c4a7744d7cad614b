//! Export of generated content.
//!
//! 1. [`raster`]: slice a rendered content block into page images
//! 2. [`pdf`]:    pack JPEG page images into a PDF, write files atomically
//! 3. [`text`]:   plain-text rendering of results

pub mod pdf;
pub mod raster;
pub mod text;
