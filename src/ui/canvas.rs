// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the source image and its bubbles.
//!
//! This module draws the image through the viewport, renders every bubble
//! with the shared layout engine, and turns raw egui pointer input into
//! [`PointerEvent`]s for the editor.

use crate::editor::interaction::{Gesture, PointerEvent, PointerKind, Tool};
use crate::editor::viewport::box_units_to_device;
use crate::editor::{Editor, RegionRequest};
use crate::models::bubble::{BoundingBox, BoxPoint, Bubble, ResizeHandle, Rgb, Shape, NORMALIZED_EXTENT};
use crate::render::fonts::{egui_family, FontBook};
use crate::render::layout::{layout_text, FixedAdvance, LayoutTarget, TextMeasure};
use crate::util::geometry::{corner_radius, ellipse_points};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// Size of a resize handle on screen, in pixels.
const HANDLE_SIZE: f32 = 8.0;

const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 160, 255);
const LINK_COLOR: Color32 = Color32::from_rgb(255, 140, 0);
const PENDING_COLOR: Color32 = Color32::from_rgb(255, 200, 0);

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// A box was drawn and needs a translation.
    RequestRegion(RegionRequest),
}

/// The loaded image as the canvas needs it.
pub struct CanvasImage<'a> {
    pub texture: &'a egui::TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Display the canvas and route pointer input to the editor.
pub fn show(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    image: Option<CanvasImage<'_>>,
    fonts: &FontBook,
) -> CanvasAction {
    ui.style_mut().visuals.extreme_bg_color = Color32::from_gray(40);

    let Some(image) = image else {
        show_welcome(ui);
        return CanvasAction::None;
    };

    let (canvas_rect, response) =
        ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let painter = ui.painter_at(canvas_rect);
    painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(40));

    let image_size = Vec2::new(image.width as f32, image.height as f32);
    let action = handle_input(ui, editor, &response, canvas_rect, image_size);

    // Input may have moved the viewport; lay out with the updated rect.
    let image_rect = editor.session().viewport.image_rect(canvas_rect, image_size);
    painter.image(
        image.texture.id(),
        image_rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    let store = editor.store();
    let session = editor.session();
    for bubble in store.bubbles() {
        draw_bubble(&painter, bubble, image_rect, fonts, store.is_pending(bubble.id));
    }

    for link in store.links() {
        if let (Some(from), Some(to)) = (store.get(link.from), store.get(link.to)) {
            let a = box_units_to_device(from.bbox.center(), image_rect);
            let b = box_units_to_device(to.bbox.center(), image_rect);
            painter.arrow(a, b - a, Stroke::new(2.0, LINK_COLOR));
        }
    }

    if let Some(bubble) = session.link_source().and_then(|id| store.get(id)) {
        let rect = screen_rect(&bubble.bbox, image_rect);
        painter.rect_stroke(rect.expand(3.0), 2.0, Stroke::new(3.0, LINK_COLOR));
    }

    if let Some(bubble) = session.selected.and_then(|id| store.get(id)) {
        draw_selection(&painter, bubble, image_rect, session.tool == Tool::Select);
    }

    if let Gesture::Drawing { start, current } = session.gesture {
        let rect = Rect::from_two_pos(
            box_units_to_device(start, image_rect),
            box_units_to_device(current, image_rect),
        );
        match session.draw_shape {
            Shape::Rectangle => {
                painter.rect_stroke(rect, 0.0, Stroke::new(2.0, SELECTION_COLOR));
            }
            Shape::Ellipse => {
                painter.add(egui::Shape::closed_line(
                    ellipse_points(rect, 64),
                    Stroke::new(2.0, SELECTION_COLOR),
                ));
            }
        }
    }

    action
}

fn handle_input(
    ui: &egui::Ui,
    editor: &mut Editor,
    response: &egui::Response,
    canvas_rect: Rect,
    image_size: Vec2,
) -> CanvasAction {
    let (pos, primary_pressed, middle_pressed, released, moved, scroll, space) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.button_pressed(egui::PointerButton::Middle),
            i.pointer.any_released(),
            i.pointer.delta() != Vec2::ZERO,
            i.smooth_scroll_delta.y,
            i.key_down(egui::Key::Space),
        )
    });
    let space = space && !ui.ctx().wants_keyboard_input();

    if response.hovered() && scroll != 0.0 {
        editor.session_mut().viewport.zoom_by_wheel(scroll);
    }

    let Some(pos) = pos else {
        return CanvasAction::None;
    };
    let viewport = editor.session().viewport;
    let image_rect = viewport.image_rect(canvas_rect, image_size);
    let point = viewport.device_to_box_units(pos, image_rect);
    let event = |kind: PointerKind| {
        let mut event = PointerEvent::new(kind, pos, point);
        event.pan_modifier = space || middle_pressed;
        event.handle_tolerance = HANDLE_SIZE / image_rect.width().max(1.0) * NORMALIZED_EXTENT;
        event
    };

    let gesture_active = editor.session().is_gesture_active();
    let mut request = None;
    if response.hovered() && (primary_pressed || middle_pressed) {
        request = editor.pointer(&event(PointerKind::Down));
    } else if gesture_active && released {
        request = editor.pointer(&event(PointerKind::Up));
    } else if gesture_active && moved {
        request = editor.pointer(&event(PointerKind::Move));
    }

    match request {
        Some(region) => CanvasAction::RequestRegion(region),
        None => CanvasAction::None,
    }
}

fn screen_rect(bbox: &BoundingBox, image_rect: Rect) -> Rect {
    Rect::from_min_max(
        box_units_to_device(BoxPoint::new(bbox.xmin(), bbox.ymin()), image_rect),
        box_units_to_device(BoxPoint::new(bbox.xmax(), bbox.ymax()), image_rect),
    )
}

fn color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.0[0], rgb.0[1], rgb.0[2])
}

/// Draw one bubble: filled outline, then its laid-out text.
fn draw_bubble(
    painter: &egui::Painter,
    bubble: &Bubble,
    image_rect: Rect,
    fonts: &FontBook,
    pending: bool,
) {
    let rect = screen_rect(&bubble.bbox, image_rect);
    let fill = color32(bubble.background_color);
    match bubble.shape {
        Shape::Rectangle => {
            painter.rect_filled(rect, corner_radius(rect.width(), rect.height()), fill);
        }
        Shape::Ellipse => {
            painter.add(egui::Shape::convex_polygon(
                ellipse_points(rect, 64),
                fill,
                Stroke::NONE,
            ));
        }
    }
    if pending {
        painter.rect_stroke(rect, 0.0, Stroke::new(1.5, PENDING_COLOR));
    }

    let face = fonts.resolve(&bubble.font_family);
    let fallback = FixedAdvance::default();
    let measure: &dyn TextMeasure = match &face {
        Some(face) => face.as_ref(),
        None => &fallback,
    };
    let layout = layout_text(
        &bubble.text,
        &bubble.bbox,
        bubble.shape,
        bubble.font_size_scale(),
        LayoutTarget::new(image_rect.width(), image_rect.height()),
        measure,
    );
    if layout.font_size < 1.0 {
        return;
    }
    let font = egui::FontId::new(layout.font_size, egui_family(fonts, &bubble.font_family));
    for line in &layout.lines {
        painter.text(
            image_rect.min + Vec2::new(line.center_x, line.center_y),
            egui::Align2::CENTER_CENTER,
            &line.text,
            font.clone(),
            color32(bubble.text_color),
        );
    }
}

fn draw_selection(painter: &egui::Painter, bubble: &Bubble, image_rect: Rect, with_handles: bool) {
    let rect = screen_rect(&bubble.bbox, image_rect);
    painter.rect_stroke(rect, 0.0, Stroke::new(2.0, SELECTION_COLOR));
    if !with_handles {
        return;
    }
    for handle in ResizeHandle::ALL {
        let corner = box_units_to_device(bubble.bbox.corner(handle), image_rect);
        let square = Rect::from_center_size(corner, Vec2::splat(HANDLE_SIZE));
        painter.rect_filled(square, 1.0, Color32::WHITE);
        painter.rect_stroke(square, 1.0, Stroke::new(1.0, SELECTION_COLOR));
    }
}

fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Overtype")
                    .size(32.0)
                    .color(Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Translated text bubbles for images")
                    .size(14.0)
                    .color(Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("File > Open Image... to begin")
                    .weak()
                    .color(Color32::from_gray(130)),
            );
        });
    });
}
