//! LabelMe to COCO and categorical mask converter
//!
//! This library converts LabelMe polygon annotations into a COCO dataset
//! descriptor and one 8-bit label mask per image, where each pixel holds the
//! category of the polygon covering it.

pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mask;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use coco::{Annotation, Category, CategoryKey, CocoFile, Image};
pub use coco_dataset::{build_coco_file, CocoBuilder};
pub use config::Args;
pub use dataset::{prepare_coco_file, process_dataset};
pub use error::{Error, Result};
pub use mask::{generate_masks, render_mask};
pub use types::{ImageAnnotation, ProcessingStats, Shape};
