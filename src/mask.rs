//! Categorical mask generation
//!
//! Every image gets one 8-bit mask. Background is 0 and a pixel covered by an
//! annotation holds `category_id + 1`. Annotations are painted in descriptor
//! order, so where they overlap the last one wins.

use image::{GrayImage, Luma};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::coco::{Annotation, Category, CocoFile, Image};
use crate::error::{Error, Result};
use crate::geometry::{rasterize_polygon, unflatten_points};
use crate::io::{mask_file_name, write_mask, ColorRow};
use crate::utils::{create_progress_bar, create_thread_pool};

/// Pixel value for unlabeled pixels
pub const BACKGROUND: u8 = 0;

/// Largest number of categories an 8-bit mask can hold next to the background
pub const MAX_CATEGORIES: usize = u8::MAX as usize;

/// Mask pixel value for a category id, `None` if it does not fit in a `u8`
pub fn mask_value(category_id: u32) -> Option<u8> {
    u8::try_from(category_id).ok()?.checked_add(1)
}

/// Annotations grouped by the id of the image they belong to.
///
/// Building the index checks that every annotation points at an existing image
/// and category.
#[derive(Debug)]
pub struct CocoIndex<'a> {
    by_image: HashMap<u32, Vec<&'a Annotation>>,
}

impl<'a> CocoIndex<'a> {
    pub fn new(coco: &'a CocoFile) -> Result<Self> {
        if coco.categories.len() > MAX_CATEGORIES {
            return Err(Error::TooManyCategories {
                count: coco.categories.len(),
            });
        }

        let image_ids: HashSet<u32> = coco.images.iter().map(|img| img.id).collect();
        let category_ids: HashSet<u32> = coco.categories.iter().map(|cat| cat.id).collect();

        let mut by_image: HashMap<u32, Vec<&'a Annotation>> = HashMap::new();
        for ann in &coco.annotations {
            if !image_ids.contains(&ann.image_id) {
                return Err(Error::UnknownImage {
                    annotation_id: ann.id,
                    image_id: ann.image_id,
                });
            }
            if !category_ids.contains(&ann.category_id) {
                return Err(Error::UnknownCategory {
                    annotation_id: ann.id,
                    category_id: ann.category_id,
                });
            }
            by_image.entry(ann.image_id).or_default().push(ann);
        }

        Ok(Self { by_image })
    }

    /// Annotations of one image in descriptor order
    pub fn annotations_for(&self, image_id: u32) -> &[&'a Annotation] {
        self.by_image
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Composite the annotations of one image into a categorical mask
pub fn render_mask(image: &Image, annotations: &[&Annotation]) -> Result<GrayImage> {
    let mut mask = GrayImage::from_pixel(image.width, image.height, Luma([BACKGROUND]));

    for ann in annotations {
        let value = mask_value(ann.category_id).ok_or_else(|| Error::TooManyCategories {
            count: ann.category_id as usize + 1,
        })?;
        for polygon in &ann.segmentation {
            let region = rasterize_polygon(&unflatten_points(polygon), image.height, image.width);
            for (x, y) in region.iter_set() {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }

    Ok(mask)
}

/// Seeded RNG for reproducible colors, OS entropy otherwise
pub fn color_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Pick a random display color per category, in category order
pub fn generate_color_map<R: Rng>(categories: &[Category], rng: &mut R) -> Vec<ColorRow> {
    categories
        .iter()
        .map(|cat| ColorRow {
            category: cat.name.clone(),
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        })
        .collect()
}

/// Render and save one mask per image into `output_dir`.
///
/// Rendering runs on a pool of `workers` threads, a batch at a time. Files
/// are written in image order, so when two images map to the same mask name
/// the later image's mask is the one left on disk.
/// Returns the number of masks written.
pub fn generate_masks(coco: &CocoFile, output_dir: &Path, workers: usize) -> Result<usize> {
    let index = CocoIndex::new(coco)?;
    let thread_pool = create_thread_pool(workers)?;
    let batch_size = thread_pool.current_num_threads().max(1) * 4;

    warn_on_name_collisions(&coco.images);

    info!("Generating {} masks...", coco.images.len());
    let pb = create_progress_bar(coco.images.len() as u64, "Masks");

    for batch in coco.images.chunks(batch_size) {
        let masks = thread_pool.install(|| {
            batch
                .par_iter()
                .map(|image| render_mask(image, index.annotations_for(image.id)))
                .collect::<Result<Vec<_>>>()
        })?;

        for (image, mask) in batch.iter().zip(&masks) {
            write_mask(&output_dir.join(mask_file_name(&image.file_name)), mask)?;
            pb.inc(1);
        }
    }
    pb.finish_with_message("Mask generation complete");

    Ok(coco.images.len())
}

fn warn_on_name_collisions(images: &[Image]) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for image in images {
        let name = mask_file_name(&image.file_name);
        if let Some(previous) = seen.insert(name.clone(), &image.file_name) {
            warn!(
                "Images {} and {} share the mask name {}; the mask of {} is kept",
                previous, image.file_name, name, image.file_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(id: u32, image_id: u32, category_id: u32, polygon: Vec<f64>) -> Annotation {
        Annotation {
            id,
            image_id,
            category_id,
            segmentation: vec![polygon],
            area: 0.0,
            bbox: [0.0; 4],
            iscrowd: 0,
        }
    }

    fn category(id: u32, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            supercategory: name.to_string(),
        }
    }

    #[test]
    fn test_mask_value_offsets_category_id() {
        assert_eq!(mask_value(0), Some(1));
        assert_eq!(mask_value(254), Some(255));
        assert_eq!(mask_value(255), None);
        assert_eq!(mask_value(1000), None);
    }

    #[test]
    fn test_render_mask_last_annotation_wins() {
        let image = Image::new(0, "a.png".to_string(), 20, 10);
        let first = annotation(1, 0, 0, vec![0.0, 0.0, 9.0, 0.0, 9.0, 9.0, 0.0, 9.0]);
        let second = annotation(2, 0, 2, vec![5.0, 0.0, 14.0, 0.0, 14.0, 9.0, 5.0, 9.0]);

        let mask = render_mask(&image, &[&first, &second]).unwrap();
        assert_eq!(mask.dimensions(), (20, 10));
        assert_eq!(mask.get_pixel(2, 2)[0], 1);
        assert_eq!(mask.get_pixel(7, 2)[0], 3);
        assert_eq!(mask.get_pixel(12, 2)[0], 3);
        assert_eq!(mask.get_pixel(17, 2)[0], BACKGROUND);

        let reversed = render_mask(&image, &[&second, &first]).unwrap();
        assert_eq!(reversed.get_pixel(7, 2)[0], 1);
    }

    #[test]
    fn test_index_groups_by_image_id() {
        let coco = CocoFile {
            images: vec![
                Image::new(7, "a.png".to_string(), 10, 10),
                Image::new(3, "b.png".to_string(), 10, 10),
            ],
            categories: vec![category(0, "cat")],
            annotations: vec![
                annotation(1, 3, 0, vec![]),
                annotation(2, 7, 0, vec![]),
                annotation(3, 3, 0, vec![]),
            ],
        };
        let index = CocoIndex::new(&coco).unwrap();

        let ids: Vec<u32> = index.annotations_for(3).iter().map(|a| a.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(index.annotations_for(7).len(), 1);
        assert!(index.annotations_for(42).is_empty());
    }

    #[test]
    fn test_index_rejects_dangling_references() {
        let mut coco = CocoFile {
            images: vec![Image::new(0, "a.png".to_string(), 10, 10)],
            categories: vec![category(0, "cat")],
            annotations: vec![annotation(1, 5, 0, vec![])],
        };
        assert!(matches!(
            CocoIndex::new(&coco).unwrap_err(),
            Error::UnknownImage { image_id: 5, .. }
        ));

        coco.annotations = vec![annotation(1, 0, 9, vec![])];
        assert!(matches!(
            CocoIndex::new(&coco).unwrap_err(),
            Error::UnknownCategory { category_id: 9, .. }
        ));
    }

    #[test]
    fn test_color_map_is_reproducible_with_seed() {
        let categories = vec![category(0, "apple"), category(1, "zebra")];
        let first = generate_color_map(&categories, &mut color_rng(Some(42)));
        let second = generate_color_map(&categories, &mut color_rng(Some(42)));

        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(names, ["apple", "zebra"]);
    }

    #[test]
    fn test_generate_masks_writes_one_file_per_image() {
        let temp_dir = tempfile::tempdir().unwrap();
        let coco = CocoFile {
            images: vec![
                Image::new(0, "first.jpg".to_string(), 8, 6),
                Image::new(1, "second.frame.jpg".to_string(), 8, 6),
            ],
            categories: vec![category(0, "cat")],
            annotations: vec![annotation(1, 1, 0, vec![1.0, 1.0, 4.0, 1.0, 4.0, 4.0])],
        };

        let written = generate_masks(&coco, temp_dir.path(), 2).unwrap();
        assert_eq!(written, 2);

        let empty = image::open(temp_dir.path().join("first.png")).unwrap().to_luma8();
        assert!(empty.pixels().all(|p| p[0] == BACKGROUND));

        let labeled = image::open(temp_dir.path().join("second.png")).unwrap();
        assert_eq!(labeled.color(), image::ColorType::L8);
        assert_eq!(labeled.to_luma8().get_pixel(3, 2)[0], 1);
    }

    #[test]
    fn test_generate_masks_colliding_names_keep_last_image() {
        // frame.0.jpg .. frame.11.jpg all map to frame.png
        let images: Vec<Image> = (0..12u32)
            .map(|i| Image::new(i, format!("frame.{}.jpg", i), 8 + i, 8 + i))
            .collect();
        let coco = CocoFile {
            images,
            categories: vec![category(0, "cat")],
            annotations: vec![],
        };

        for _ in 0..3 {
            let temp_dir = tempfile::tempdir().unwrap();
            assert_eq!(generate_masks(&coco, temp_dir.path(), 4).unwrap(), 12);

            let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
            assert_eq!(entries, 1);
            let mask = image::open(temp_dir.path().join("frame.png")).unwrap();
            assert_eq!((mask.width(), mask.height()), (19, 19));
        }
    }

    #[test]
    fn test_index_rejects_more_than_255_categories() {
        let coco = CocoFile {
            images: vec![Image::new(0, "a.png".to_string(), 4, 4)],
            categories: (0..256).map(|i| category(i, "c")).collect(),
            annotations: vec![],
        };
        assert!(matches!(
            CocoIndex::new(&coco).unwrap_err(),
            Error::TooManyCategories { count: 256 }
        ));

        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            generate_masks(&coco, temp_dir.path(), 1).unwrap_err(),
            Error::TooManyCategories { count: 256 }
        ));

        let mut fits = coco.clone();
        fits.categories.truncate(MAX_CATEGORIES);
        assert!(CocoIndex::new(&fits).is_ok());
    }

    #[test]
    fn test_color_map_without_seed_varies() {
        let categories: Vec<Category> = (0..8).map(|i| category(i, "c")).collect();
        let first = generate_color_map(&categories, &mut color_rng(None));
        let second = generate_color_map(&categories, &mut color_rng(None));

        assert_eq!(first.len(), 8);
        assert_eq!(second.len(), 8);
        // 192 random bits each, equal only by astronomically unlikely chance
        assert_ne!(first, second);
    }
}
