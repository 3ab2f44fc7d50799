// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bubble properties panel.
//!
//! This module provides the side panel listing every bubble and link, and
//! the editor for the selected bubble's text and styling.

use crate::editor::Editor;
use crate::models::bubble::{Bubble, BubbleId, FONT_SCALE_MAX, FONT_SCALE_MIN};
use crate::render::fonts::FontBook;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    Select(BubbleId),
    /// The selected bubble was changed; apply without committing.
    Edit(Bubble),
    ToggleShape(BubbleId),
    Delete(BubbleId),
    RemoveLink(BubbleId, BubbleId),
    ClearLinks,
}

/// Preview of a bubble's text for list entries.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 24;
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > MAX_CHARS {
        let cut: String = first_line.chars().take(MAX_CHARS).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, editor: &Editor, fonts: &FontBook) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    let store = editor.store();
    let selected = editor.selected();

    ui.heading("Bubbles");
    ui.label(format!("{} bubbles, {} translating", store.len(), store.pending_count()));
    ui.separator();

    egui::ScrollArea::vertical()
        .id_source("bubble_list")
        .max_height(200.0)
        .show(ui, |ui| {
            for bubble in store.bubbles() {
                let label = format!("{} {}", bubble.id, preview(&bubble.text));
                if ui.selectable_label(selected == Some(bubble.id), label).clicked() {
                    action = PropertiesAction::Select(bubble.id);
                }
            }
        });

    ui.separator();

    if let Some(bubble) = editor.selected_bubble() {
        ui.heading(format!("Bubble {}", bubble.id));
        let mut edited = bubble.clone();

        ui.label("Text:");
        ui.add(egui::TextEdit::multiline(&mut edited.text).desired_rows(3));

        if let Some(original) = &bubble.original_text {
            ui.label(egui::RichText::new(format!("Original: {original}")).weak());
        }

        egui::Grid::new("bubble_style").num_columns(2).show(ui, |ui| {
            ui.label("Text color:");
            ui.color_edit_button_srgb(&mut edited.text_color.0);
            ui.end_row();

            ui.label("Background:");
            ui.color_edit_button_srgb(&mut edited.background_color.0);
            ui.end_row();

            ui.label("Font:");
            egui::ComboBox::from_id_source("font_family")
                .selected_text(edited.font_family.clone())
                .show_ui(ui, |ui| {
                    for family in fonts.families() {
                        ui.selectable_value(&mut edited.font_family, family.to_string(), family);
                    }
                });
            ui.end_row();

            ui.label("Font scale:");
            let mut scale = edited.font_size_scale();
            ui.add(egui::Slider::new(&mut scale, FONT_SCALE_MIN..=FONT_SCALE_MAX).step_by(0.05));
            edited.set_font_size_scale(scale);
            ui.end_row();

            ui.label("Shape:");
            if ui.button(bubble.shape.label()).clicked() {
                action = PropertiesAction::ToggleShape(bubble.id);
            }
            ui.end_row();
        });

        if edited != *bubble {
            action = PropertiesAction::Edit(edited);
        }

        ui.add_space(8.0);
        if ui.button("🗑 Delete bubble").clicked() {
            action = PropertiesAction::Delete(bubble.id);
        }
    } else {
        ui.label(egui::RichText::new("No bubble selected").weak());
    }

    ui.separator();
    ui.heading("Links");
    if store.links().is_empty() {
        ui.label(egui::RichText::new("Use the Link tool to connect bubbles").weak());
    }
    for link in store.links() {
        ui.horizontal(|ui| {
            ui.label(format!("{} → {}", link.from, link.to));
            if ui.small_button("✖").on_hover_text("Remove link").clicked() {
                action = PropertiesAction::RemoveLink(link.from, link.to);
            }
        });
    }
    if !store.links().is_empty() && ui.button("Clear links").clicked() {
        action = PropertiesAction::ClearLinks;
    }

    action
}
