//! Connected-component (blob) labelling of binary images in Rust.
//!
//! This crate labels foreground regions of a single channel binary mask with a two-pass raster
//! scan and measures every blob found: area, bounding box, centroid and perimeter.
//!
//! The output follows the classic two-pass labelling tools used in computer vision courses:
//! the one pixel wide border of the image is always background, labels in the output are the
//! canonical (smallest provisional) labels, not a dense `1..=n` sequence, and the blobs are
//! returned in ascending label order. Unlike those tools the label table is not limited to 254
//! labels unless asked for (see `Config::legacy()`).
//!
//! The following example labels a mask built with the image crate:
//!
//! ```rust
//! use blob_labelling_rust::arrays::RasterImage;
//! use blob_labelling_rust::common::Config;
//! use blob_labelling_rust::labelling::find_blobs;
//!
//! fn main() {
//!     // two filled rectangles
//!     let mask = image::GrayImage::from_fn(64, 48, |x, y| {
//!         let inside = ((4..20).contains(&x) && (4..30).contains(&y))
//!             || ((30..60).contains(&x) && (10..20).contains(&y));
//!         image::Luma([if inside { 255 } else { 0 }])
//!     });
//!     let width = mask.width() as usize;
//!     let height = mask.height() as usize;
//!     let mask = RasterImage::from_raw_slice(mask.as_raw(), width, height, 1, 255).unwrap();
//!     // label with 4-connectivity and compute the metrics
//!     let labelling = find_blobs(&mask, &Config::default()).unwrap();
//!     assert_eq!(labelling.len(), 2);
//!     for blob in &labelling.blobs {
//!         println!("{blob}");
//!     }
//! }
//! ```
//!
//! The passes can also be run separately, `labelling::blob_labelling_into()` into a
//! preallocated `arrays::LabelImage` and `metrics::blob_info()` on any label image. Independent
//! images can be processed in parallel with `labelling::find_blobs_batch()`.
//!
//! The crate logs through the `log` facade and never installs a logger.

pub mod arrays;
pub mod blob;
pub mod common;
pub mod draw;
pub mod error;
pub mod label_table;
pub mod labelling;
pub mod metrics;
pub mod threshold;

pub use crate::arrays::{LabelImage, RasterImage};
pub use crate::blob::Blob;
pub use crate::common::Config;
pub use crate::error::Error;
pub use crate::labelling::{blob_labelling, blob_labelling_into, find_blobs, Labelling};
pub use crate::metrics::blob_info;
