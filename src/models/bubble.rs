// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bubble data structures.
//!
//! This module defines the core data structures for representing
//! translated-text bubbles: their bounding boxes in normalized space,
//! shapes, colors and typesetting properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extent of the normalized coordinate space on both axes.
pub const NORMALIZED_EXTENT: f32 = 1000.0;

/// Smallest side a box may be resized down to, in normalized units.
pub const MIN_BOX_SIDE: f32 = 10.0;

/// Allowed range for a bubble's font size multiplier.
pub const FONT_SCALE_MIN: f32 = 0.5;
pub const FONT_SCALE_MAX: f32 = 3.0;

/// Text shown on a manually drawn bubble until its translation arrives.
pub const PLACEHOLDER_TEXT: &str = "Translating...";

/// Font family used when none is requested.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Unique identifier of a bubble within one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BubbleId(pub u64);

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A 2D point in normalized box units (0.0 to 1000.0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxPoint {
    pub x: f32,
    pub y: f32,
}

impl BoxPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in normalized space, stored as `(ymin, xmin, ymax, xmax)`.
///
/// Every constructor upholds `xmin < xmax`, `ymin < ymax` and keeps all four
/// values inside `[0, 1000]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    ymin: f32,
    xmin: f32,
    ymax: f32,
    xmax: f32,
}

impl BoundingBox {
    /// Build a box from possibly unordered or out-of-range coordinates.
    ///
    /// Values are clamped to the normalized space and swapped when reversed.
    /// A side that collapses to zero is widened by one unit, away from the
    /// border it touches.
    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        let (xmin, xmax) = ordered_span(xmin, xmax);
        let (ymin, ymax) = ordered_span(ymin, ymax);
        Self { ymin, xmin, ymax, xmax }
    }

    /// Build a box from the `[ymin, xmin, ymax, xmax]` array used on the wire.
    pub fn from_array(raw: [f32; 4]) -> Self {
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }

    /// Build a box spanning two arbitrary corner points.
    pub fn from_corners(a: BoxPoint, b: BoxPoint) -> Self {
        Self::new(a.y, a.x, b.y, b.x)
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymax(&self) -> f32 {
        self.ymax
    }

    pub fn xmax(&self) -> f32 {
        self.xmax
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> BoxPoint {
        BoxPoint::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    /// Check whether the invariants hold. Always true for boxes built
    /// through this type's constructors.
    pub fn is_valid(&self) -> bool {
        let in_range = |v: f32| (0.0..=NORMALIZED_EXTENT).contains(&v);
        self.xmin < self.xmax
            && self.ymin < self.ymax
            && in_range(self.xmin)
            && in_range(self.xmax)
            && in_range(self.ymin)
            && in_range(self.ymax)
    }

    /// Check if a point lies inside the box (edges included).
    pub fn contains(&self, p: BoxPoint) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Move the box so its top-left corner lands at `top_left`, keeping its
    /// size and keeping it inside the normalized space.
    pub fn moved_to(&self, top_left: BoxPoint) -> Self {
        let w = self.width();
        let h = self.height();
        let xmin = top_left.x.clamp(0.0, NORMALIZED_EXTENT - w);
        let ymin = top_left.y.clamp(0.0, NORMALIZED_EXTENT - h);
        Self {
            ymin,
            xmin,
            ymax: (ymin + h).min(NORMALIZED_EXTENT),
            xmax: (xmin + w).min(NORMALIZED_EXTENT),
        }
    }

    /// Move one corner of the box to `p`, leaving the opposite corner fixed.
    ///
    /// The moving edges are clamped so each side stays at least
    /// [`MIN_BOX_SIDE`] long (or as long as the space allows) and inside the
    /// normalized space.
    pub fn with_corner(&self, handle: ResizeHandle, p: BoxPoint) -> Self {
        let mut next = *self;
        let x = p.x.clamp(0.0, NORMALIZED_EXTENT);
        let y = p.y.clamp(0.0, NORMALIZED_EXTENT);

        if handle.moves_left() {
            next.xmin = x.min(self.xmax - MIN_BOX_SIDE).max(0.0);
        } else {
            next.xmax = x.max(self.xmin + MIN_BOX_SIDE).min(NORMALIZED_EXTENT);
        }
        if handle.moves_top() {
            next.ymin = y.min(self.ymax - MIN_BOX_SIDE).max(0.0);
        } else {
            next.ymax = y.max(self.ymin + MIN_BOX_SIDE).min(NORMALIZED_EXTENT);
        }
        next
    }

    /// Position of the given corner handle.
    pub fn corner(&self, handle: ResizeHandle) -> BoxPoint {
        let x = if handle.moves_left() { self.xmin } else { self.xmax };
        let y = if handle.moves_top() { self.ymin } else { self.ymax };
        BoxPoint::new(x, y)
    }
}

fn ordered_span(a: f32, b: f32) -> (f32, f32) {
    let a = if a.is_finite() { a } else { 0.0 };
    let b = if b.is_finite() { b } else { 0.0 };
    let lo = a.min(b).clamp(0.0, NORMALIZED_EXTENT);
    let hi = a.max(b).clamp(0.0, NORMALIZED_EXTENT);
    if lo < hi {
        (lo, hi)
    } else if hi < NORMALIZED_EXTENT {
        (lo, hi + 1.0)
    } else {
        (lo - 1.0, hi)
    }
}

/// Corner handle used to resize a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [
        ResizeHandle::NorthWest,
        ResizeHandle::NorthEast,
        ResizeHandle::SouthWest,
        ResizeHandle::SouthEast,
    ];

    fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::NorthWest | ResizeHandle::SouthWest)
    }

    fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::NorthWest | ResizeHandle::NorthEast)
    }

    pub fn label(self) -> &'static str {
        match self {
            ResizeHandle::NorthWest => "nw",
            ResizeHandle::NorthEast => "ne",
            ResizeHandle::SouthWest => "sw",
            ResizeHandle::SouthEast => "se",
        }
    }
}

/// Outline of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rectangle,
    Ellipse,
}

impl Shape {
    pub fn toggled(self) -> Self {
        match self {
            Shape::Rectangle => Shape::Ellipse,
            Shape::Ellipse => Shape::Rectangle,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shape::Rectangle => "Rectangle",
            Shape::Ellipse => "Ellipse",
        }
    }
}

/// An opaque RGB color, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Parse an optional hex string, falling back to `default` when it is
    /// absent or malformed.
    pub fn from_hex_or(hex: Option<&str>, default: Rgb) -> Self {
        hex.and_then(Rgb::from_hex).unwrap_or(default)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// A translated-text region overlaid on the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: BubbleId,
    pub text: String,
    pub original_text: Option<String>,
    pub bbox: BoundingBox,
    pub shape: Shape,
    pub text_color: Rgb,
    pub background_color: Rgb,
    pub font_family: String,
    font_size_scale: f32,
    pub is_manual: bool,
}

impl Bubble {
    /// Create a bubble with default styling: black text on white, the
    /// default font family and a font scale of 1.
    pub fn new(id: BubbleId, text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id,
            text: text.into(),
            original_text: None,
            bbox,
            shape: Shape::Rectangle,
            text_color: Rgb::BLACK,
            background_color: Rgb::WHITE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size_scale: 1.0,
            is_manual: false,
        }
    }

    /// Create the optimistic placeholder inserted when the user draws a box.
    pub fn placeholder(id: BubbleId, bbox: BoundingBox, shape: Shape) -> Self {
        Self {
            shape,
            is_manual: true,
            ..Self::new(id, PLACEHOLDER_TEXT, bbox)
        }
    }

    pub fn font_size_scale(&self) -> f32 {
        self.font_size_scale
    }

    /// Set the font size multiplier, clamped to its allowed range.
    pub fn set_font_size_scale(&mut self, scale: f32) {
        self.font_size_scale = if scale.is_finite() {
            scale.clamp(FONT_SCALE_MIN, FONT_SCALE_MAX)
        } else {
            1.0
        };
    }

    pub fn with_font_size_scale(mut self, scale: f32) -> Self {
        self.set_font_size_scale(scale);
        self
    }
}
