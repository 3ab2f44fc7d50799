// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! This module provides the toolbar for picking the active tool, the shape
//! of newly drawn bubbles and the zoom level.

use crate::editor::interaction::Tool;
use crate::editor::Editor;
use crate::models::bubble::Shape;

fn tool_label(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "⬆ Select (V)",
        Tool::Draw => "▭ Draw (D)",
        Tool::Pan => "✋ Pan (H)",
        Tool::Link => "🔗 Link (L)",
    }
}

fn tool_hint(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "Click a bubble to select it, drag to move, drag a corner to resize",
        Tool::Draw => "Drag a box around text to translate it",
        Tool::Pan => "Drag to move the image, scroll to zoom",
        Tool::Link => "Click bubbles in reading order to link them; click empty space to stop",
    }
}

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, editor: &mut Editor) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        let current = editor.session().tool;
        for tool in Tool::ALL {
            if ui.selectable_label(current == tool, tool_label(tool)).clicked() {
                editor.set_tool(tool);
            }
        }

        ui.separator();

        ui.label("Shape:");
        let mut shape = editor.session().draw_shape;
        for option in [Shape::Rectangle, Shape::Ellipse] {
            ui.selectable_value(&mut shape, option, option.label());
        }
        if shape != editor.session().draw_shape {
            editor.set_draw_shape(shape);
        }

        ui.separator();

        let viewport = &mut editor.session_mut().viewport;
        if ui.small_button("−").clicked() {
            viewport.zoom_out();
        }
        ui.label(format!("{:.0}%", viewport.scale() * 100.0));
        if ui.small_button("+").clicked() {
            viewport.zoom_in();
        }
        if ui.small_button("Fit").clicked() {
            viewport.reset();
        }

        ui.separator();

        ui.label(egui::RichText::new(tool_hint(editor.session().tool)).italics().weak());
    });
}
