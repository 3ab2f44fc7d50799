// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image loading, cropping and PNG encoding.
//!
//! The source image is kept as RGBA8 at native resolution. Translation
//! requests receive PNG bytes of either the whole image or a cropped region.

use crate::models::bubble::BoundingBox;
use crate::util::geometry::box_to_pixel_bounds;
use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// File extensions offered in the open dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp", "gif"];

/// Load an image file and convert it to RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(bytes)
}

/// Copy the pixels under a normalized box. The crop is at least one pixel in
/// each direction.
pub fn crop_region(img: &RgbaImage, bbox: &BoundingBox) -> RgbaImage {
    let (x, y, w, h) = box_to_pixel_bounds(bbox, img.width(), img.height());
    image::imageops::crop_imm(img, x, y, w, h).to_image()
}

/// PNG bytes of the region under `bbox`, ready for a translation request.
pub fn region_png(img: &RgbaImage, bbox: &BoundingBox) -> Result<Vec<u8>> {
    encode_png(&crop_region(img, bbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn quadrants() -> RgbaImage {
        RgbaImage::from_fn(100, 50, |x, y| {
            if x < 50 && y < 25 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_crop_uses_normalized_box() {
        let img = quadrants();
        let crop = crop_region(&img, &BoundingBox::new(0.0, 0.0, 500.0, 500.0));
        assert_eq!(crop.dimensions(), (50, 25));
        assert!(crop.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_png_round_trip_keeps_pixels() {
        let img = quadrants();
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_region_png_of_sliver_is_not_empty() {
        let img = quadrants();
        let bytes = region_png(&img, &BoundingBox::new(999.0, 999.0, 1000.0, 1000.0)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.width() >= 1 && decoded.height() >= 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_image(Path::new("/nonexistent/image.png")).is_err());
    }
}
