use glob::glob;
use image::GrayImage;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::coco::CocoFile;
use crate::error::{Error, Result};
use crate::types::ImageAnnotation;

/// Name of the category color legend written next to the masks
pub const COLOR_TABLE_FILE: &str = "category_colors.csv";

/// One row of the color legend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorRow {
    pub category: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Find the LabelMe JSON files directly inside `dirname`, in sorted path order
pub fn collect_label_files(dirname: &Path) -> Result<Vec<PathBuf>> {
    if !dirname.is_dir() {
        return Err(Error::InputDirMissing(dirname.to_path_buf()));
    }

    let pattern = format!(
        "{}/*.json",
        glob::Pattern::escape(&dirname.to_string_lossy())
    );
    let entries = glob(&pattern).map_err(|e| {
        Error::io(
            dirname,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, e.into_error())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read and parse a single LabelMe JSON file, streaming from disk
pub fn read_and_parse_json(path: &Path) -> Result<ImageAnnotation> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the COCO dataset with 4-space indentation, creating parent directories
pub fn write_coco_file(path: &Path, coco: &CocoFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    coco.serialize(&mut serializer)
        .map_err(|source| Error::JsonWrite {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Load a COCO dataset written by [`write_coco_file`] or any compatible tool
pub fn read_coco_file(path: &Path) -> Result<CocoFile> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the `category,r,g,b` legend
pub fn write_color_table(path: &Path, rows: &[ColorRow]) -> Result<()> {
    let csv_error = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Mask file name for an image: everything before the first `.`, plus `.png`
pub fn mask_file_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    format!("{}.png", sanitize_filename::sanitize(stem))
}

/// Save a categorical mask as an 8-bit single-channel PNG
pub fn write_mask(path: &Path, mask: &GrayImage) -> Result<()> {
    mask.save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| Error::MaskWrite {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::{Category, Image};

    #[test]
    fn test_collect_label_files_sorted_and_filtered() {
        let temp_dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub/c.json"), "{}").unwrap();

        let files = collect_label_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn test_collect_label_files_missing_dir() {
        let err = collect_label_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::InputDirMissing(_)));
    }

    #[test]
    fn test_coco_file_written_with_four_space_indent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out/nested/coco.json");
        let coco = CocoFile {
            images: vec![Image::new(0, "a.jpg".to_string(), 4, 3)],
            categories: vec![Category {
                id: 0,
                name: "cat".to_string(),
                supercategory: "cat".to_string(),
            }],
            annotations: vec![],
        };

        write_coco_file(&path, &coco).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"images\": [\n        {"));
        assert_eq!(read_coco_file(&path).unwrap(), coco);
    }

    #[test]
    fn test_read_and_parse_json_reports_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_and_parse_json(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_write_color_table() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(COLOR_TABLE_FILE);
        let rows = vec![
            ColorRow {
                category: "apple".to_string(),
                r: 1,
                g: 2,
                b: 3,
            },
            ColorRow {
                category: "zebra".to_string(),
                r: 255,
                g: 0,
                b: 9,
            },
        ];
        write_color_table(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "category,r,g,b\napple,1,2,3\nzebra,255,0,9\n");
    }

    #[test]
    fn test_mask_file_name_strips_at_first_dot() {
        assert_eq!(mask_file_name("frame_01.jpg"), "frame_01.png");
        assert_eq!(mask_file_name("scan.2024.tiff"), "scan.png");
        assert_eq!(mask_file_name("noext"), "noext.png");
    }
}
