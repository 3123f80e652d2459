use log::info;

use crate::coco::CocoFile;
use crate::coco_dataset::build_coco_file;
use crate::config::Args;
use crate::error::Result;
use crate::io::{collect_label_files, read_coco_file, write_coco_file, write_color_table};
use crate::mask::{color_rng, generate_color_map, generate_masks};
use crate::types::ProcessingStats;
use crate::utils::create_output_directory;

/// Build the COCO JSON from the input directory, or load the existing one.
///
/// An existing file is trusted as-is unless `--force` is given. Returns the
/// dataset and whether it was reused.
pub fn prepare_coco_file(args: &Args) -> Result<(CocoFile, bool)> {
    let coco_json_path = args.coco_json_path();

    if coco_json_path.exists() {
        if !args.force {
            info!(
                "{} already exists. Loading existing file.",
                coco_json_path.display()
            );
            return Ok((read_coco_file(&coco_json_path)?, true));
        }
        info!(
            "{} already exists but --force was given. Rebuilding it.",
            coco_json_path.display()
        );
    } else {
        info!(
            "{} does not exist. Generating new COCO JSON file.",
            coco_json_path.display()
        );
    }

    let json_files = collect_label_files(&args.input_dir)?;
    let coco = build_coco_file(&json_files)?;

    info!("Writing {}", coco_json_path.display());
    write_coco_file(&coco_json_path, &coco)?;
    Ok((coco, false))
}

/// Main processing pipeline: COCO JSON, color table, then one mask per image
pub fn process_dataset(args: &Args) -> Result<ProcessingStats> {
    create_output_directory(&args.output_dir)?;

    let (coco, descriptor_reused) = prepare_coco_file(args)?;
    let mut stats = ProcessingStats {
        label_files: if descriptor_reused { 0 } else { coco.images.len() },
        images: coco.images.len(),
        categories: coco.categories.len(),
        annotations: coco.annotations.len(),
        masks_written: 0,
        descriptor_reused,
    };

    let colors = generate_color_map(&coco.categories, &mut color_rng(args.seed));
    write_color_table(&args.color_table_path(), &colors)?;
    info!("Wrote {}", args.color_table_path().display());

    stats.masks_written = generate_masks(&coco, &args.output_dir, args.workers)?;
    Ok(stats)
}
