// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattens bubbles onto the source image at native resolution.

use super::fonts::{FontBook, FontFace};
use super::layout::{layout_text, LayoutTarget, TextLayout};
use crate::models::bubble::{Bubble, Rgb, Shape};
use crate::util::geometry::{
    box_to_pixel_bounds, box_to_pixels, corner_radius, ellipse_contains, rounded_rect_contains,
};
use image::{Rgba, RgbaImage};

/// Render every bubble over a copy of `source`, in order.
pub fn composite<'a>(
    source: &RgbaImage,
    bubbles: impl IntoIterator<Item = &'a Bubble>,
    fonts: &FontBook,
) -> RgbaImage {
    let mut canvas = source.clone();
    let target = LayoutTarget::new(canvas.width() as f32, canvas.height() as f32);
    let mut count = 0;
    for bubble in bubbles {
        fill_shape(&mut canvas, bubble);
        match fonts.resolve(&bubble.font_family) {
            Some(face) => {
                let layout = layout_text(
                    &bubble.text,
                    &bubble.bbox,
                    bubble.shape,
                    bubble.font_size_scale(),
                    target,
                    face.as_ref(),
                );
                draw_layout(&mut canvas, &face, &layout, bubble.text_color);
            }
            None => log::warn!("No font available, bubble {} exported without text", bubble.id),
        }
        count += 1;
    }
    log::debug!(
        "Composited {} bubbles onto {}x{} image",
        count,
        canvas.width(),
        canvas.height()
    );
    canvas
}

/// Fill the bubble's background shape with its opaque background color.
fn fill_shape(canvas: &mut RgbaImage, bubble: &Bubble) {
    let (w, h) = canvas.dimensions();
    let rect = box_to_pixels(&bubble.bbox, w as f32, h as f32);
    let radius = corner_radius(rect.width, rect.height);
    let (x0, y0, bw, bh) = box_to_pixel_bounds(&bubble.bbox, w, h);
    let fill = to_rgba(bubble.background_color);

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let inside = match bubble.shape {
                Shape::Rectangle => rounded_rect_contains(&rect, radius, px, py),
                Shape::Ellipse => ellipse_contains(&rect, px, py),
            };
            if inside {
                canvas.put_pixel(x, y, fill);
            }
        }
    }
}

fn draw_layout(canvas: &mut RgbaImage, face: &FontFace, layout: &TextLayout, color: Rgb) {
    let font = face.font();
    let size = layout.font_size;
    if size <= 0.0 {
        return;
    }
    let line_metrics = font.horizontal_line_metrics(size);

    for line in &layout.lines {
        if line.text.is_empty() {
            continue;
        }
        let width: f32 = line
            .text
            .chars()
            .map(|c| font.metrics(c, size).advance_width)
            .sum();
        let baseline = match line_metrics {
            Some(m) => line.center_y + (m.ascent + m.descent) * 0.5,
            None => line.center_y + size * 0.5,
        };

        let mut pen_x = line.center_x - width / 2.0;
        for c in line.text.chars() {
            let (metrics, bitmap) = font.rasterize(c, size);
            let glyph_x = pen_x + metrics.xmin as f32;
            let glyph_y = baseline - metrics.height as f32 - metrics.ymin as f32;
            blend_glyph(
                canvas,
                glyph_x,
                glyph_y,
                metrics.width,
                metrics.height,
                &bitmap,
                color,
            );
            pen_x += metrics.advance_width;
        }
    }
}

fn blend_glyph(
    canvas: &mut RgbaImage,
    x: f32,
    y: f32,
    width: usize,
    height: usize,
    bitmap: &[u8],
    color: Rgb,
) {
    let start_x = x.round() as i64;
    let start_y = y.round() as i64;
    for row in 0..height {
        for col in 0..width {
            let coverage = bitmap[row * width + col];
            if coverage == 0 {
                continue;
            }
            let px = start_x + col as i64;
            let py = start_y + row as i64;
            if px < 0 || py < 0 || px >= canvas.width() as i64 || py >= canvas.height() as i64 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            *pixel = blend_pixel(*pixel, color, coverage);
        }
    }
}

fn blend_pixel(base: Rgba<u8>, color: Rgb, coverage: u8) -> Rgba<u8> {
    let a = coverage as u32;
    let mix = |dst: u8, src: u8| ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8;
    Rgba([
        mix(base[0], color.0[0]),
        mix(base[1], color.0[1]),
        mix(base[2], color.0[2]),
        base[3].max(coverage),
    ])
}

fn to_rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.0[0], color.0[1], color.0[2], 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bubble::{BoundingBox, BubbleId};

    fn gray(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn test_rectangle_is_filled_with_rounded_corners() {
        let source = gray(200, 100);
        let mut bubble = Bubble::new(BubbleId(1), "", BoundingBox::new(0.0, 0.0, 1000.0, 1000.0));
        bubble.background_color = Rgb([10, 20, 30]);
        let out = composite(&source, [&bubble], &FontBook::default());

        assert_eq!(out.get_pixel(100, 50), &Rgba([10, 20, 30, 255]));
        // Radius is 10px; the extreme corner stays untouched.
        assert_eq!(out.get_pixel(0, 0), &Rgba([128, 128, 128, 255]));
        assert_eq!(out.get_pixel(199, 99), &Rgba([128, 128, 128, 255]));
        // Source is not modified.
        assert_eq!(source.get_pixel(100, 50), &Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_ellipse_leaves_corners_of_its_box() {
        let source = gray(100, 100);
        let mut bubble = Bubble::new(BubbleId(1), "", BoundingBox::new(0.0, 0.0, 1000.0, 1000.0));
        bubble.shape = Shape::Ellipse;
        let out = composite(&source, [&bubble], &FontBook::default());

        assert_eq!(out.get_pixel(50, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(10, 10), &Rgba([128, 128, 128, 255]));
        assert_eq!(out.get_pixel(50, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_later_bubbles_paint_over_earlier_ones() {
        let source = gray(100, 100);
        let mut below = Bubble::new(BubbleId(1), "", BoundingBox::new(0.0, 0.0, 600.0, 600.0));
        below.background_color = Rgb([255, 0, 0]);
        let mut above = Bubble::new(BubbleId(2), "", BoundingBox::new(400.0, 400.0, 1000.0, 1000.0));
        above.background_color = Rgb([0, 0, 255]);
        let out = composite(&source, [&below, &above], &FontBook::default());
        assert_eq!(out.get_pixel(50, 50), &Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(20, 20), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_text_is_drawn_inside_the_bubble() {
        let fonts = FontBook::with_builtin();
        let source = gray(400, 400);
        let bubble = Bubble::new(BubbleId(1), "HELLO", BoundingBox::new(250.0, 250.0, 750.0, 750.0));
        let out = composite(&source, [&bubble], &fonts);

        let rect = box_to_pixels(&bubble.bbox, 400.0, 400.0);
        let mut dark_inside = 0;
        for (x, y, pixel) in out.enumerate_pixels() {
            if pixel[0] < 100 {
                let (fx, fy) = (x as f32, y as f32);
                assert!(
                    fx >= rect.x && fx <= rect.x + rect.width && fy >= rect.y && fy <= rect.y + rect.height,
                    "ink outside bubble at {x},{y}"
                );
                dark_inside += 1;
            }
        }
        assert!(dark_inside > 0);
    }

    #[test]
    fn test_blend_pixel_mixes_by_coverage() {
        let base = Rgba([255, 255, 255, 255]);
        assert_eq!(blend_pixel(base, Rgb::BLACK, 255), Rgba([0, 0, 0, 255]));
        assert_eq!(blend_pixel(base, Rgb::BLACK, 0), base);
        let half = blend_pixel(base, Rgb::BLACK, 128);
        assert!(half[0] > 120 && half[0] < 135);
    }
}
