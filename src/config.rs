use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for converting LabelMe JSON to a COCO dataset and label masks.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Directory containing LabelMe JSON files
    #[arg(short = 'i', long = "input_dir")]
    pub input_dir: PathBuf,

    /// Directory for the COCO JSON, the masks and the color table
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: PathBuf,

    /// File name of the COCO JSON inside output_dir
    #[arg(long = "coco_name", default_value = "coco.json")]
    pub coco_name: String,

    /// Rebuild the COCO JSON even if it already exists
    #[arg(long = "force")]
    pub force: bool,

    /// Seed for the category display colors (random each run if omitted)
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Number of worker threads for mask generation (0 = one per core)
    #[arg(long = "workers", default_value_t = 0)]
    pub workers: usize,
}

impl Args {
    pub fn coco_json_path(&self) -> PathBuf {
        self.output_dir.join(&self.coco_name)
    }

    pub fn color_table_path(&self) -> PathBuf {
        self.output_dir.join(crate::io::COLOR_TABLE_FILE)
    }
}
