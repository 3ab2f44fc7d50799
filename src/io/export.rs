// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export of the flattened composite.

use crate::models::store::BubbleStore;
use crate::render::compositor::composite;
use crate::render::fonts::FontBook;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

/// Composite the settled bubbles of `store` over `source` at native
/// resolution and write the result to `path`. Placeholders still waiting for
/// a translation are left out. The format follows the extension; PNG when
/// there is none.
pub fn export_composite(
    source: &RgbaImage,
    store: &BubbleStore,
    fonts: &FontBook,
    path: &Path,
) -> Result<()> {
    let flattened = composite(source, store.settled_bubbles(), fonts);
    let format = image::ImageFormat::from_path(path).unwrap_or(image::ImageFormat::Png);
    // JPEG has no alpha channel.
    let result = if format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgba8(flattened)
            .to_rgb8()
            .save_with_format(path, format)
    } else {
        flattened.save_with_format(path, format)
    };
    result.with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Exported composite to {}", path.display());
    Ok(())
}
