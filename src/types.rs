use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// The Shape struct representing annotated shapes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default = "default_shape_type")]
    pub shape_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_shape_type() -> String {
    "polygon".to_string()
}

// The ImageAnnotation struct representing one LabelMe JSON document
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotation {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub flags: Option<HashMap<String, bool>>,
    pub shapes: Vec<Shape>,
    pub image_path: String,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_height: Option<u32>,
    #[serde(default)]
    pub image_width: Option<u32>,
}

impl ImageAnnotation {
    /// Basename of `imagePath`, accepting both `/` and `\` separators
    pub fn file_name(&self) -> &str {
        self.image_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.image_path)
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub label_files: usize,
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
    pub masks_written: usize,
    pub descriptor_reused: bool,
}

impl ProcessingStats {
    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        if self.descriptor_reused {
            log::info!("COCO descriptor: reused existing file");
        } else {
            log::info!("Label files converted: {}", self.label_files);
        }
        log::info!("Images: {}", self.images);
        log::info!("Categories: {}", self.categories);
        log::info!("Annotations: {}", self.annotations);
        log::info!("Masks written: {}", self.masks_written);
    }
}
