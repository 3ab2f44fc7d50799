// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides utilities for coordinate transformations between
//! pixel coordinates and normalized box units, plus the outline tests used
//! when filling bubble shapes.

use crate::models::bubble::{BoundingBox, NORMALIZED_EXTENT};
use egui::{Pos2, Rect, Vec2};

/// A box expressed in pixels of some target surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Convert a normalized box to pixel coordinates on a `width` x `height` surface.
pub fn box_to_pixels(bbox: &BoundingBox, width: f32, height: f32) -> PixelRect {
    let sx = width / NORMALIZED_EXTENT;
    let sy = height / NORMALIZED_EXTENT;
    PixelRect {
        x: bbox.xmin() * sx,
        y: bbox.ymin() * sy,
        width: bbox.width() * sx,
        height: bbox.height() * sy,
    }
}

/// Integer pixel bounds `(x, y, w, h)` of a box on an image, at least 1x1
/// and never past the image edges.
pub fn box_to_pixel_bounds(bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let r = box_to_pixels(bbox, width as f32, height as f32);
    let x0 = (r.x.floor().max(0.0) as u32).min(width.saturating_sub(1));
    let y0 = (r.y.floor().max(0.0) as u32).min(height.saturating_sub(1));
    let x1 = ((r.x + r.width).ceil() as u32).clamp(x0 + 1, width.max(x0 + 1));
    let y1 = ((r.y + r.height).ceil() as u32).clamp(y0 + 1, height.max(y0 + 1));
    (x0, y0, x1 - x0, y1 - y0)
}

/// Largest rectangle of the image's aspect ratio that fits `available`,
/// centred inside it.
pub fn fit_rect(available: Rect, image_size: Vec2) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return available;
    }
    let img_aspect = image_size.x / image_size.y;
    let available_aspect = available.width() / available.height().max(f32::EPSILON);

    let size = if img_aspect > available_aspect {
        // Image is wider - fit to width
        Vec2::new(available.width(), available.width() / img_aspect)
    } else {
        // Image is taller - fit to height
        Vec2::new(available.height() * img_aspect, available.height())
    };
    Rect::from_center_size(available.center(), size)
}

/// Corner radius of a rectangular bubble.
pub fn corner_radius(width: f32, height: f32) -> f32 {
    width.min(height) * 0.1
}

/// Point-in-rounded-rectangle test.
pub fn rounded_rect_contains(rect: &PixelRect, radius: f32, px: f32, py: f32) -> bool {
    if px < rect.x || py < rect.y || px > rect.x + rect.width || py > rect.y + rect.height {
        return false;
    }
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let cx = px.clamp(rect.x + r, rect.x + rect.width - r);
    let cy = py.clamp(rect.y + r, rect.y + rect.height - r);
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= r * r
}

/// Point-in-ellipse test for the ellipse inscribed in `rect`.
pub fn ellipse_contains(rect: &PixelRect, px: f32, py: f32) -> bool {
    let (cx, cy) = rect.center();
    let rx = rect.width / 2.0;
    let ry = rect.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let dx = (px - cx) / rx;
    let dy = (py - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

/// Outline points of the ellipse inscribed in `rect`, for on-screen drawing.
pub fn ellipse_points(rect: Rect, segments: usize) -> Vec<Pos2> {
    let center = rect.center();
    let rx = rect.width() / 2.0;
    let ry = rect.height() / 2.0;
    (0..segments.max(3))
        .map(|i| {
            let t = i as f32 / segments.max(3) as f32 * std::f32::consts::TAU;
            Pos2::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}
