// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewport transform between screen and normalized coordinates.
//!
//! The viewport owns pan and zoom. It is presentation state only: nothing
//! here touches the bubble store or history.

use crate::models::bubble::{BoxPoint, NORMALIZED_EXTENT};
use crate::util::geometry::fit_rect;
use egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_STEP: f32 = 0.25;

/// Zoom change per unit of wheel delta.
const WHEEL_ZOOM_RATE: f32 = 0.0015;

/// Pan and zoom applied on top of the fit-to-canvas image placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f32,
    offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Screen rectangle covered by the image: fitted into `canvas`, scaled
    /// around the canvas centre, then shifted by the pan offset.
    pub fn image_rect(&self, canvas: Rect, image_size: Vec2) -> Rect {
        let fitted = fit_rect(canvas, image_size);
        Rect::from_center_size(canvas.center() + self.offset, fitted.size() * self.scale)
    }

    /// Map a screen position to `[0,1]x[0,1]` inside the image, clamped.
    pub fn device_to_normalized(&self, pos: Pos2, image_rect: Rect) -> Pos2 {
        let w = image_rect.width().max(f32::EPSILON);
        let h = image_rect.height().max(f32::EPSILON);
        Pos2::new(
            ((pos.x - image_rect.min.x) / w).clamp(0.0, 1.0),
            ((pos.y - image_rect.min.y) / h).clamp(0.0, 1.0),
        )
    }

    /// Map a screen position straight to box units.
    pub fn device_to_box_units(&self, pos: Pos2, image_rect: Rect) -> BoxPoint {
        normalized_to_box_units(self.device_to_normalized(pos, image_rect))
    }

    /// Zoom by a mouse wheel delta. Positive deltas zoom in.
    pub fn zoom_by_wheel(&mut self, delta: f32) {
        self.set_scale(self.scale * (delta * WHEEL_ZOOM_RATE).exp());
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Shift the image on screen. The offset is not clamped.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Scale a `[0,1]` position up to box units.
pub fn normalized_to_box_units(p: Pos2) -> BoxPoint {
    BoxPoint::new(p.x * NORMALIZED_EXTENT, p.y * NORMALIZED_EXTENT)
}

/// Map a position in box units to the screen.
pub fn box_units_to_device(p: BoxPoint, image_rect: Rect) -> Pos2 {
    Pos2::new(
        image_rect.min.x + p.x / NORMALIZED_EXTENT * image_rect.width(),
        image_rect.min.y + p.y / NORMALIZED_EXTENT * image_rect.height(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_image_rect_fits_and_centers() {
        let viewport = Viewport::default();
        let rect = viewport.image_rect(canvas(), Vec2::new(1600.0, 800.0));
        assert_eq!(rect.width(), 800.0);
        assert_eq!(rect.height(), 400.0);
        assert_eq!(rect.center(), Pos2::new(400.0, 300.0));
    }

    #[test]
    fn test_zoom_and_pan_apply_after_fit() {
        let mut viewport = Viewport::default();
        viewport.zoom_in();
        viewport.zoom_in();
        viewport.pan_by(Vec2::new(-50.0, 20.0));
        let rect = viewport.image_rect(canvas(), Vec2::new(1600.0, 800.0));
        assert_eq!(rect.width(), 1200.0);
        assert_eq!(rect.center(), Pos2::new(350.0, 320.0));
    }

    #[test]
    fn test_device_to_normalized_clamps() {
        let viewport = Viewport::default();
        let rect = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        assert_eq!(
            viewport.device_to_normalized(Pos2::new(200.0, 125.0), rect),
            Pos2::new(0.5, 0.25)
        );
        assert_eq!(
            viewport.device_to_normalized(Pos2::new(-10.0, 900.0), rect),
            Pos2::new(0.0, 1.0)
        );
        let p = viewport.device_to_box_units(Pos2::new(150.0, 150.0), rect);
        assert_eq!(p, BoxPoint::new(250.0, 500.0));
    }

    #[test]
    fn test_box_units_round_trip_through_screen() {
        let rect = Rect::from_min_size(Pos2::new(40.0, 10.0), Vec2::new(500.0, 250.0));
        let screen = box_units_to_device(BoxPoint::new(100.0, 800.0), rect);
        assert_eq!(screen, Pos2::new(90.0, 210.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..40 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.scale(), MAX_ZOOM);
        for _ in 0..40 {
            viewport.zoom_by_wheel(-500.0);
        }
        assert_eq!(viewport.scale(), MIN_ZOOM);
        viewport.reset();
        assert_eq!(viewport.scale(), 1.0);
    }
}
