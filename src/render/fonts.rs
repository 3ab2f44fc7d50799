// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Font faces shared by the preview and the exporter.
//!
//! Every family is loaded once from its raw bytes into a `fontdue` face for
//! measuring and rasterizing, and the same bytes are handed to egui so the
//! canvas draws with identical glyphs.

use super::layout::TextMeasure;
use crate::models::bubble::DEFAULT_FONT_FAMILY;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Built-in families backed by the fonts bundled with egui.
const BUILTIN_FAMILIES: &[(&str, &str)] = &[
    (DEFAULT_FONT_FAMILY, "Ubuntu-Light"),
    ("monospace", "Hack"),
];

/// One loaded font family.
pub struct FontFace {
    pub family: String,
    bytes: Arc<Vec<u8>>,
    font: fontdue::Font,
}

impl FontFace {
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let family = family.into();
        let font = fontdue::Font::from_bytes(bytes.as_slice(), fontdue::FontSettings::default())
            .map_err(|e| anyhow!("failed to parse font {}: {}", family, e))?;
        Ok(Self {
            family,
            bytes: Arc::new(bytes),
            font,
        })
    }

    pub fn font(&self) -> &fontdue::Font {
        &self.font
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TextMeasure for FontFace {
    /// Sum of horizontal advances, matching how the exporter places glyphs.
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, font_size).advance_width)
            .sum()
    }
}

/// Registry of font families by name.
#[derive(Default)]
pub struct FontBook {
    faces: BTreeMap<String, Arc<FontFace>>,
}

impl FontBook {
    /// Load the families that ship with egui.
    pub fn with_builtin() -> Self {
        let mut book = Self::default();
        let defaults = egui::FontDefinitions::default();
        for (family, key) in BUILTIN_FAMILIES {
            let Some(data) = defaults.font_data.get(*key) else {
                log::warn!("Bundled font {} not found", key);
                continue;
            };
            match FontFace::from_bytes(*family, data.font.to_vec()) {
                Ok(face) => book.insert(face),
                Err(e) => log::warn!("{:#}", e),
            }
        }
        book
    }

    pub fn insert(&mut self, face: FontFace) {
        self.faces.insert(face.family.clone(), Arc::new(face));
    }

    /// Register every `.ttf`/`.otf` file in `dir` under its file stem.
    /// Returns how many faces were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read font directory {}", dir.display()))?;
        let mut added = 0;
        for entry in entries {
            let path = entry?.path();
            let is_font = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                .unwrap_or(false);
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_font {
                continue;
            }
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read font {}", path.display()))?;
            match FontFace::from_bytes(stem, bytes) {
                Ok(face) => {
                    log::info!("Loaded font family {}", stem);
                    self.insert(face);
                    added += 1;
                }
                Err(e) => log::warn!("Skipping {}: {:#}", path.display(), e),
            }
        }
        Ok(added)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.keys().map(String::as_str)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.faces.contains_key(family)
    }

    /// Face for `family`, falling back to the default family and then to any
    /// loaded face.
    pub fn resolve(&self, family: &str) -> Option<Arc<FontFace>> {
        self.faces
            .get(family)
            .or_else(|| self.faces.get(DEFAULT_FONT_FAMILY))
            .or_else(|| self.faces.values().next())
            .cloned()
    }

    /// Install every family into egui so the canvas can draw with it.
    pub fn install(&self, ctx: &egui::Context) {
        let mut definitions = egui::FontDefinitions::default();
        for face in self.faces.values() {
            let key = format!("overtype-{}", face.family);
            definitions
                .font_data
                .insert(key.clone(), egui::FontData::from_owned(face.bytes().to_vec()));
            definitions
                .families
                .insert(egui::FontFamily::Name(face.family.as_str().into()), vec![key]);
        }
        ctx.set_fonts(definitions);
    }
}

/// egui family used to draw text for `family`. Unknown names map to the
/// proportional family, which matches the default face.
pub fn egui_family(book: &FontBook, family: &str) -> egui::FontFamily {
    if book.contains(family) {
        egui::FontFamily::Name(family.into())
    } else {
        egui::FontFamily::Proportional
    }
}
