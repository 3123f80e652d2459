//! COCO dataset building
//!
//! Turns LabelMe documents into COCO records in two phases: every shape first
//! becomes a [`PendingAnnotation`] that still carries its [`CategoryKey`], and
//! once all files are read the keys are sorted into dense category ids and
//! each annotation is resolved.

use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::coco::{Annotation, Category, CategoryKey, CocoFile, Image};
use crate::error::{Error, Result};
use crate::geometry::{
    bounding_box_from_mask, flatten_points, polygon_area, rasterize_polygon, Point,
};
use crate::io::read_and_parse_json;
use crate::types::{ImageAnnotation, Shape};
use crate::utils::{create_progress_bar, decode_image_dimensions};

/// Number of vertices used to approximate a LabelMe circle
pub const CIRCLE_SEGMENTS: usize = 32;

/// An annotation whose category has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnnotation {
    pub id: u32,
    pub image_id: u32,
    pub category: CategoryKey,
    pub segmentation: Vec<Vec<f64>>,
    pub area: f64,
    pub bbox: [f64; 4],
}

impl PendingAnnotation {
    fn resolve(self, category_id: u32) -> Annotation {
        Annotation {
            id: self.id,
            image_id: self.image_id,
            category_id,
            segmentation: self.segmentation,
            area: self.area,
            bbox: self.bbox,
            iscrowd: 0,
        }
    }
}

/// Accumulates images and annotations across LabelMe files
#[derive(Debug)]
pub struct CocoBuilder {
    images: Vec<Image>,
    pending: Vec<PendingAnnotation>,
    labels: BTreeSet<CategoryKey>,
    next_annotation_id: u32,
}

impl Default for CocoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CocoBuilder {
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            pending: Vec::new(),
            labels: BTreeSet::new(),
            next_annotation_id: 1,
        }
    }

    /// Add one LabelMe document: one image plus one annotation per shape.
    ///
    /// Image ids follow the order files are added, starting at 0. Annotation
    /// ids keep counting across files, starting at 1. Returns the image id.
    pub fn add_annotation_file(&mut self, path: &Path, annotation: &ImageAnnotation) -> Result<u32> {
        let (width, height) = image_dimensions(path, annotation)?;
        let image_id = self.images.len() as u32;
        let file_name = annotation.file_name().to_string();

        for shape in &annotation.shapes {
            let polygon = shape_to_polygon(shape);
            if polygon.len() < 3 {
                warn!(
                    "Shape '{}' in {} has only {} point(s)",
                    shape.label,
                    path.display(),
                    polygon.len()
                );
            }

            let mask = rasterize_polygon(&polygon, height, width);
            let bbox = bounding_box_from_mask(&mask).ok_or_else(|| Error::EmptyMask {
                file_name: file_name.clone(),
                label: shape.label.clone(),
                width,
                height,
            })?;

            let category = CategoryKey::from_label(&shape.label);
            self.labels.insert(category.clone());
            self.pending.push(PendingAnnotation {
                id: self.next_annotation_id,
                image_id,
                category,
                segmentation: vec![flatten_points(&polygon)],
                area: polygon_area(&polygon),
                bbox,
            });
            self.next_annotation_id += 1;
        }

        debug!(
            "{} -> image {} ({}x{}, {} shapes)",
            path.display(),
            image_id,
            width,
            height,
            annotation.shapes.len()
        );
        self.images.push(Image::new(image_id, file_name, width, height));
        Ok(image_id)
    }

    /// Assign category ids in sorted key order and resolve every annotation
    pub fn finish(self) -> Result<CocoFile> {
        let keys: Vec<CategoryKey> = self.labels.into_iter().collect();
        let categories = keys
            .iter()
            .enumerate()
            .map(|(id, key)| Category::from_key(id as u32, key))
            .collect();
        let annotations = resolve_annotations(self.pending, &keys)?;

        Ok(CocoFile {
            images: self.images,
            categories,
            annotations,
        })
    }
}

/// Replace each pending category key by the index of that key in `keys`
pub fn resolve_annotations(
    pending: Vec<PendingAnnotation>,
    keys: &[CategoryKey],
) -> Result<Vec<Annotation>> {
    let ids: HashMap<&CategoryKey, u32> = keys
        .iter()
        .enumerate()
        .map(|(id, key)| (key, id as u32))
        .collect();

    pending
        .into_iter()
        .map(|ann| match ids.get(&ann.category) {
            Some(&category_id) => Ok(ann.resolve(category_id)),
            None => Err(Error::UnresolvedCategory {
                known: keys
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                key: ann.category,
            }),
        })
        .collect()
}

/// Image size as `(width, height)`.
///
/// The embedded payload is authoritative; the declared `imageWidth` and
/// `imageHeight` are only used when there is no payload.
pub fn image_dimensions(path: &Path, annotation: &ImageAnnotation) -> Result<(u32, u32)> {
    let declared = annotation.image_width.zip(annotation.image_height);

    match annotation.image_data.as_deref().filter(|d| !d.is_empty()) {
        Some(data) => {
            let decoded = decode_image_dimensions(data, path)?;
            if let Some(declared) = declared.filter(|&d| d != decoded) {
                warn!(
                    "{} declares {}x{} but imageData is {}x{}; using imageData",
                    path.display(),
                    declared.0,
                    declared.1,
                    decoded.0,
                    decoded.1
                );
            }
            Ok(decoded)
        }
        None => declared.ok_or_else(|| Error::MissingImageSize {
            path: path.to_path_buf(),
        }),
    }
}

/// Convert a LabelMe shape to polygon vertices
pub fn shape_to_polygon(shape: &Shape) -> Vec<Point> {
    match shape.shape_type.as_str() {
        "rectangle" if shape.points.len() >= 2 => {
            let (x1, y1) = shape.points[0];
            let (x2, y2) = shape.points[1];
            vec![(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
        }
        "circle" if shape.points.len() >= 2 => {
            let (cx, cy) = shape.points[0];
            let (px, py) = shape.points[1];
            let radius = ((cx - px).powi(2) + (cy - py).powi(2)).sqrt();
            circle_to_polygon(cx, cy, radius, CIRCLE_SEGMENTS)
        }
        _ => {
            let mut points = shape.points.clone();
            // Remove duplicate last point if present
            if points.len() >= 4 && points.first() == points.last() {
                points.pop();
            }
            points
        }
    }
}

/// Convert a circle to polygon points
pub fn circle_to_polygon(cx: f64, cy: f64, radius: f64, num_points: usize) -> Vec<Point> {
    (0..num_points)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / num_points as f64;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Build a COCO dataset from LabelMe files, in the given order
pub fn build_coco_file(json_files: &[PathBuf]) -> Result<CocoFile> {
    info!("Converting {} LabelMe files...", json_files.len());
    let pb = create_progress_bar(json_files.len() as u64, "LabelMe");

    let mut builder = CocoBuilder::new();
    for json_path in json_files {
        let annotation = read_and_parse_json(json_path)?;
        builder.add_annotation_file(json_path, &annotation)?;
        pb.inc(1);
    }
    pb.finish_with_message("LabelMe conversion complete");

    builder.finish()
}
