// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Translation service boundary.
//!
//! Detection, region translation and context retranslation are provided by
//! an external backend. This module defines the payloads exchanged with it,
//! the [`TranslationService`] trait the editor talks to, and the background
//! job runner that keeps those calls off the UI thread.

pub mod http;
pub mod jobs;

use crate::models::bubble::{BoundingBox, BubbleId, Rgb};
use serde::{Deserialize, Serialize};

/// Text shown when the backend answers a region request with garbage.
pub const SENTINEL_TEXT: &str = "[translation unavailable]";

/// Failure talking to the translation backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("translation service unavailable: {0}")]
    Unavailable(String),
    #[error("translation service answered with status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("malformed response from translation service: {0}")]
    Malformed(String),
}

/// One text region found by a full-image scan.
///
/// Every field is optional on the wire; missing values fall back to
/// defaults when the detection is turned into a bubble.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Detection {
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
    #[serde(rename = "box")]
    pub bbox: Option<[f32; 4]>,
    pub text_color_hex: Option<String>,
    pub background_color_hex: Option<String>,
}

impl Detection {
    /// Bounding box of the detection; an absent box covers the whole image.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_array(self.bbox.unwrap_or([0.0, 0.0, 1000.0, 1000.0]))
    }

    pub fn text_color(&self) -> Rgb {
        Rgb::from_hex_or(self.text_color_hex.as_deref(), Rgb::BLACK)
    }

    pub fn background_color(&self) -> Rgb {
        Rgb::from_hex_or(self.background_color_hex.as_deref(), Rgb::WHITE)
    }
}

/// Translation of one user-drawn region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionTranslation {
    pub translated_text: String,
    pub text_color_hex: String,
    pub background_color_hex: String,
}

impl Default for RegionTranslation {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl RegionTranslation {
    /// Always-renderable result used when the backend's answer is unusable.
    pub fn sentinel() -> Self {
        Self {
            translated_text: SENTINEL_TEXT.to_string(),
            text_color_hex: Rgb::BLACK.to_hex(),
            background_color_hex: Rgb::WHITE.to_hex(),
        }
    }

    pub fn text_color(&self) -> Rgb {
        Rgb::from_hex_or(Some(&self.text_color_hex), Rgb::BLACK)
    }

    pub fn background_color(&self) -> Rgb {
        Rgb::from_hex_or(Some(&self.background_color_hex), Rgb::WHITE)
    }
}

/// One bubble of a chain sent for context retranslation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainItem {
    pub id: BubbleId,
    pub current_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
}

/// New text for one bubble of a retranslated chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTranslation {
    pub id: BubbleId,
    #[serde(default)]
    pub translated_text: String,
}

/// Result of retranslating one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub ids: Vec<BubbleId>,
    pub result: Result<Vec<ChainTranslation>, ServiceError>,
}

/// Client for the translation backend.
///
/// Implementations are called from worker threads and must not touch
/// editor state.
pub trait TranslationService: Send + Sync {
    /// Find and translate every text region in a full image (PNG bytes).
    fn detect(&self, image: &[u8], target_language: &str) -> Result<Vec<Detection>, ServiceError>;

    /// Translate the text in a cropped region (PNG bytes). Unusable answers
    /// come back as [`RegionTranslation::sentinel`]; only transport failures
    /// are errors.
    fn translate_region(
        &self,
        image: &[u8],
        target_language: &str,
    ) -> Result<RegionTranslation, ServiceError>;

    /// Retranslate an ordered chain of bubbles with each other as context.
    fn retranslate_chain(
        &self,
        chain: &[ChainItem],
        target_language: &str,
    ) -> Result<Vec<ChainTranslation>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_tolerates_missing_fields() {
        let detection: Detection = serde_json::from_str(r#"{"translatedText": "Hi"}"#).unwrap();
        assert_eq!(detection.translated_text.as_deref(), Some("Hi"));
        assert_eq!(detection.text_color(), Rgb::BLACK);
        assert_eq!(detection.background_color(), Rgb::WHITE);
        assert!(detection.bounding_box().is_valid());
    }

    #[test]
    fn test_detection_parses_full_payload() {
        let json = r##"{
            "originalText": "こんにちは",
            "translatedText": "Hello",
            "box": [100, 200, 300, 400],
            "textColorHex": "#112233",
            "backgroundColorHex": "not a color"
        }"##;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.bounding_box().to_array(), [100.0, 200.0, 300.0, 400.0]);
        assert_eq!(detection.text_color(), Rgb([0x11, 0x22, 0x33]));
        assert_eq!(detection.background_color(), Rgb::WHITE);
    }

    #[test]
    fn test_region_translation_defaults_to_sentinel_fields() {
        let region: RegionTranslation = serde_json::from_str(r#"{"translatedText": "Hello"}"#).unwrap();
        assert_eq!(region.translated_text, "Hello");
        assert_eq!(region.text_color(), Rgb::BLACK);
        assert_eq!(region.background_color(), Rgb::WHITE);
    }

    #[test]
    fn test_chain_item_wire_format() {
        let item = ChainItem {
            id: BubbleId(7),
            current_text: "Hi".to_string(),
            original_text: None,
        };
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"id":7,"currentText":"Hi"}"#
        );
    }
}
