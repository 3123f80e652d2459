use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Decode a base64 `imageData` payload just far enough to read its size.
///
/// Returns `(width, height)`. The pixel data is never decoded.
pub fn decode_image_dimensions(image_data: &str, path: &Path) -> Result<(u32, u32)> {
    let bytes = base64::decode(image_data.trim()).map_err(|source| Error::Base64 {
        path: path.to_path_buf(),
        source,
    })?;

    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::io(path, e))?
        .into_dimensions()
        .map_err(|source| Error::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Create an output directory if needed; existing contents are kept
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        log::info!("Creating output directory {}", path.display());
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Build the rayon pool used for mask generation; 0 workers means one per core
pub fn create_thread_pool(workers: usize) -> Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if workers > 0 {
        builder = builder.num_threads(workers);
    }
    Ok(builder.build()?)
}
