//! Image fixtures shared by unit tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// Solid-colour JPEG patch.
pub fn jpeg_tile(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Jpeg)
}

/// Lossless patch whose first `header` rows differ from the rest.
pub fn banded_png_tile(
    width: u32,
    height: u32,
    header: u32,
    header_rgb: [u8; 3],
    body_rgb: [u8; 3],
) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |_, y| {
        if y < header {
            Rgb(header_rgb)
        } else {
            Rgb(body_rgb)
        }
    });
    encode(image, ImageFormat::Png)
}
