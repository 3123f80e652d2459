use std::path::PathBuf;
use thiserror::Error;

use crate::coco::CategoryKey;

/// The main error type for labelme2mask operations.
///
/// Every variant is fatal: the pipeline has no retry or partial-failure
/// semantics, so errors propagate up to `main` and abort the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("The specified input_dir does not exist: {0}")]
    InputDirMissing(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode base64 imageData in {path}: {source}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to read image size from imageData in {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path} has neither imageData nor imageHeight/imageWidth")]
    MissingImageSize { path: PathBuf },

    #[error(
        "Polygon for label '{label}' in {file_name} covers no pixels of the {width}x{height} image"
    )]
    EmptyMask {
        file_name: String,
        label: String,
        width: u32,
        height: u32,
    },

    #[error("label: {key} not in categories: [{known}]")]
    UnresolvedCategory { key: CategoryKey, known: String },

    #[error("{count} categories do not fit in an 8-bit mask (at most 255)")]
    TooManyCategories { count: usize },

    #[error("Annotation {annotation_id} references unknown image id {image_id}")]
    UnknownImage { annotation_id: u32, image_id: u32 },

    #[error("Annotation {annotation_id} references unknown category id {category_id}")]
    UnknownCategory {
        annotation_id: u32,
        category_id: u32,
    },

    #[error("Failed to write mask {path}: {source}")]
    MaskWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write color table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
