// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text layout and font sizing for bubbles.
//!
//! [`layout_text`] is the single source of truth for where bubble text goes.
//! The canvas calls it with the on-screen image size and the exporter calls
//! it with the native image size; because every quantity scales with the
//! target width, both produce the same relative layout.

use crate::models::bubble::{BoundingBox, Shape, NORMALIZED_EXTENT};
use crate::util::geometry::box_to_pixels;

/// Bounds of the automatic font size, in normalized units.
pub const MIN_BASE_SIZE: f32 = 10.0;
pub const MAX_BASE_SIZE: f32 = 50.0;

/// Ratio of line height to font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Upward shift applied to every line, as a fraction of the line height.
pub const BASELINE_NUDGE: f32 = 0.15;

/// Measures rendered text width in pixels.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

/// Size in pixels of the surface the image is drawn on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTarget {
    pub width: f32,
    pub height: f32,
}

impl LayoutTarget {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One laid-out line, positioned by its centre in target pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub center_x: f32,
    pub center_y: f32,
}

/// Result of laying out a bubble's text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub lines: Vec<LayoutLine>,
}

/// Automatic font size in normalized units, before any scaling.
pub fn base_font_size(text: &str, bbox: &BoundingBox) -> f32 {
    let chars = text.chars().count().max(1) as f32;
    let per_char_area = bbox.width() * bbox.height() / chars;
    (per_char_area.sqrt() * 0.6).clamp(MIN_BASE_SIZE, MAX_BASE_SIZE)
}

/// Horizontal padding on each side, as a fraction of the box width.
pub fn horizontal_padding(shape: Shape) -> f32 {
    match shape {
        Shape::Rectangle => 0.04,
        Shape::Ellipse => 0.12,
    }
}

/// Lay out `text` inside `bbox` for a surface of size `target`.
pub fn layout_text(
    text: &str,
    bbox: &BoundingBox,
    shape: Shape,
    font_size_scale: f32,
    target: LayoutTarget,
    measure: &dyn TextMeasure,
) -> TextLayout {
    let font_size =
        base_font_size(text, bbox) * (target.width / NORMALIZED_EXTENT) * font_size_scale;
    let line_height = font_size * LINE_HEIGHT_FACTOR;

    let rect = box_to_pixels(bbox, target.width, target.height);
    let padding = rect.width * horizontal_padding(shape);
    let max_width = rect.width - 2.0 * padding;

    let wrapped = wrap_words(text, max_width, font_size, measure);

    let (center_x, center_y) = rect.center();
    let total_height = wrapped.len() as f32 * line_height;
    let first = center_y - total_height / 2.0 + line_height / 2.0;
    let nudge = BASELINE_NUDGE * line_height;

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| LayoutLine {
            text,
            center_x,
            center_y: first + i as f32 * line_height - nudge,
        })
        .collect();

    TextLayout {
        font_size,
        line_height,
        lines,
    }
}

/// Greedy word wrap. A line keeps growing while the line plus the next word
/// and a trailing space fits in `max_width`; explicit newlines always break.
pub fn wrap_words(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = format!("{line}{word} ");
            if !line.is_empty() && measure.measure(&candidate, font_size) > max_width {
                lines.push(line.trim_end().to_string());
                line = format!("{word} ");
            } else {
                line = candidate;
            }
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Width estimate from a fixed advance per character, for use when no font
/// face is available.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    /// Advance per character as a fraction of the font size
    pub ratio: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { ratio: 0.55 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half() -> FixedAdvance {
        FixedAdvance { ratio: 0.5 }
    }

    #[test]
    fn test_base_size_clamps() {
        let big = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(base_font_size("a", &big), MAX_BASE_SIZE);
        let small = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(base_font_size("a long sentence here", &small), MIN_BASE_SIZE);
        // 200x200 box, 100 chars -> sqrt(400) * 0.6 = 12
        let mid = BoundingBox::new(0.0, 0.0, 200.0, 200.0);
        let text = "x".repeat(100);
        assert!((base_font_size(&text, &mid) - 12.0).abs() < 1e-4);
        // Empty text counts as one character.
        assert_eq!(base_font_size("", &mid), MAX_BASE_SIZE);
    }

    #[test]
    fn test_font_size_scales_with_target_width_and_multiplier() {
        let bbox = BoundingBox::new(0.0, 0.0, 200.0, 200.0);
        let text = "x".repeat(100);
        let layout = layout_text(
            &text,
            &bbox,
            Shape::Rectangle,
            2.0,
            LayoutTarget::new(2000.0, 1000.0),
            &half(),
        );
        assert!((layout.font_size - 48.0).abs() < 1e-3);
        assert!((layout.line_height - 57.6).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_is_greedy() {
        // Each char is 5px at size 10: "aa bb " = 30px, "aa bb cc " = 45px.
        let lines = wrap_words("aa bb cc dd", 40.0, 10.0, &half());
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn test_overlong_word_gets_its_own_line() {
        let lines = wrap_words("a verylongword b", 30.0, 10.0, &half());
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn test_newlines_force_breaks_and_empty_text_has_one_line() {
        let lines = wrap_words("one\ntwo three", 1000.0, 10.0, &half());
        assert_eq!(lines, vec!["one", "two three"]);
        assert_eq!(wrap_words("", 100.0, 10.0, &half()), vec![String::new()]);
    }

    #[test]
    fn test_ellipse_padding_wraps_sooner() {
        // 100px wide box: 92px usable as a rectangle, 76px as an ellipse.
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let target = LayoutTarget::new(1000.0, 1000.0);
        // Font size is sqrt(10000 / 9) * 0.6 = 20px, so "abcd efgh " measures 84px.
        let measure = FixedAdvance { ratio: 0.42 };
        let rect = layout_text("abcd efgh", &bbox, Shape::Rectangle, 1.0, target, &measure);
        let ellipse = layout_text("abcd efgh", &bbox, Shape::Ellipse, 1.0, target, &measure);
        assert_eq!(rect.lines.len(), 1);
        assert_eq!(ellipse.lines.len(), 2);
        assert_eq!(ellipse.lines[1].text, "efgh");
    }

    #[test]
    fn test_vertical_placement_centres_block_with_nudge() {
        let bbox = BoundingBox::new(100.0, 100.0, 300.0, 300.0);
        let target = LayoutTarget::new(1000.0, 1000.0);
        let layout = layout_text("aa bb cc dd", &bbox, Shape::Rectangle, 1.0, target, &half());

        let lh = layout.line_height;
        let n = layout.lines.len() as f32;
        let first = 200.0 - n * lh / 2.0 + lh / 2.0 - 0.15 * lh;
        assert!((layout.lines[0].center_y - first).abs() < 1e-3);
        for pair in layout.lines.windows(2) {
            assert!((pair[1].center_y - pair[0].center_y - lh).abs() < 1e-3);
        }
        assert!(layout.lines.iter().all(|line| line.center_x == 200.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let bbox = BoundingBox::new(120.0, 80.0, 410.0, 377.0);
        let target = LayoutTarget::new(1357.0, 911.0);
        let text = "The quick brown fox jumps over the lazy dog, twice over.";
        let a = layout_text(text, &bbox, Shape::Ellipse, 1.3, target, &FixedAdvance::default());
        let b = layout_text(text, &bbox, Shape::Ellipse, 1.3, target, &FixedAdvance::default());
        assert_eq!(a, b);
        assert_eq!(a.font_size.to_bits(), b.font_size.to_bits());
    }

    #[test]
    fn test_preview_and_export_share_proportions() {
        let bbox = BoundingBox::new(100.0, 100.0, 400.0, 600.0);
        let text = "Proportions must survive a change of scale";
        let preview = layout_text(text, &bbox, Shape::Rectangle, 1.0, LayoutTarget::new(500.0, 400.0), &half());
        let export = layout_text(text, &bbox, Shape::Rectangle, 1.0, LayoutTarget::new(2000.0, 1600.0), &half());

        let preview_lines: Vec<&str> = preview.lines.iter().map(|l| l.text.as_str()).collect();
        let export_lines: Vec<&str> = export.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(preview_lines, export_lines);
        assert!((export.font_size / preview.font_size - 4.0).abs() < 1e-4);
        assert!((export.lines[0].center_y / preview.lines[0].center_y - 4.0).abs() < 1e-4);
    }
}
