#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A gradient with some alpha so every encoder has real work to do.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
            if (x / 4 + y / 4) % 2 == 0 { 255 } else { 200 },
        ])
    });
    DynamicImage::ImageRgba8(img)
}

pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut cursor, format)
            .unwrap(),
        _ => img.write_to(&mut cursor, format).unwrap(),
    }
    cursor.into_inner()
}

pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, encode_image(&gradient_image(width, height), format)).unwrap();
    path
}

/// Two real images plus a corrupt one and a text file.
pub fn create_test_image_files(dir: &Path) -> Vec<PathBuf> {
    let png = write_image(dir, "photo.png", 64, 48, ImageFormat::Png);
    let jpg = write_image(dir, "shot.jpg", 40, 80, ImageFormat::Jpeg);
    let broken = dir.join("broken.png");
    fs::write(&broken, b"this is not a png").unwrap();
    let text = dir.join("notes.txt");
    fs::write(&text, b"not an image").unwrap();

    vec![png, jpg, broken, text]
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
