#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A blank PNG of the given size, base64 encoded like LabelMe's imageData
pub fn png_base64(width: u32, height: u32) -> String {
    let img = image::RgbImage::new(width, height);
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    base64::encode(bytes.into_inner())
}

/// Write a LabelMe document with polygon shapes into `dir/<name>.json`
pub fn write_label_file(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    shapes: &[(&str, Vec<(f64, f64)>)],
) -> PathBuf {
    let shapes: Vec<_> = shapes
        .iter()
        .map(|(label, points)| {
            json!({
                "label": label,
                "points": points.iter().map(|&(x, y)| vec![x, y]).collect::<Vec<_>>(),
                "group_id": null,
                "shape_type": "polygon",
                "flags": {}
            })
        })
        .collect();

    let document = json!({
        "version": "5.4.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": format!("../images/{}.jpg", name),
        "imageData": png_base64(width, height),
        "imageHeight": height,
        "imageWidth": width
    });

    let path = dir.join(format!("{}.json", name));
    fs::write(&path, serde_json::to_string_pretty(&document).expect("serialize"))
        .expect("write label file");
    path
}

pub fn triangle(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
    vec![(x, y), (x + size, y), (x, y + size)]
}

pub fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
    vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
}

/// Load a mask PNG as raw 8-bit values
pub fn read_mask(path: &Path) -> image::GrayImage {
    let img = image::open(path).expect("open mask");
    assert_eq!(img.color(), image::ColorType::L8);
    img.to_luma8()
}
