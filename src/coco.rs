//! COCO format data structures
//!
//! Only the three collections needed for segmentation masks are written:
//! `images`, `categories` and `annotations`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category identity derived from a LabelMe label.
///
/// The label is split on every underscore and the full token sequence is the
/// identity, so `person_1` and `person_2` are different categories. The first
/// token is the display name. Ordering is lexicographic over the tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey(Vec<String>);

impl CategoryKey {
    pub fn from_label(label: &str) -> Self {
        Self(label.split('_').map(str::to_string).collect())
    }

    /// First token, used as category name and supercategory
    pub fn name(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

impl Category {
    pub fn from_key(id: u32, key: &CategoryKey) -> Self {
        Self {
            id,
            name: key.name().to_string(),
            supercategory: key.name().to_string(),
        }
    }
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

impl Image {
    pub fn new(id: u32, file_name: String, width: u32, height: u32) -> Self {
        Self {
            id,
            file_name,
            height,
            width,
        }
    }
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: Vec<Vec<f64>>,
    pub area: f64,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub iscrowd: u32,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub images: Vec<Image>,
    pub categories: Vec<Category>,
    pub annotations: Vec<Annotation>,
}
