// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the editor, the background job runner and
//! the loaded image, and routes UI actions and job results between them.

use crate::config::AppConfig;
use crate::editor::interaction::Tool;
use crate::editor::{Editor, RegionRequest, RegionResolution};
use crate::io::{export, media};
use crate::render::fonts::FontBook;
use crate::services::http::HttpTranslationService;
use crate::services::jobs::{JobResult, JobRunner};
use crate::services::ServiceError;
use crate::ui::{canvas, properties, toolbar};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Result of background image loading operation.
struct LoadedImageData {
    path: PathBuf,
    image: RgbaImage,
}

/// Main application state.
pub struct OvertypeApp {
    editor: Editor,
    jobs: JobRunner,
    fonts: FontBook,

    /// Source image at native resolution
    source: Option<RgbaImage>,
    source_path: Option<PathBuf>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last notable event, shown in the status bar
    status: String,

    /// Target language being edited in the Translate menu
    language_input: String,
}

impl OvertypeApp {
    /// Create the application, installing fonts into the egui context.
    pub fn new(ctx: &egui::Context, config: AppConfig, initial_image: Option<PathBuf>) -> Self {
        let mut fonts = FontBook::with_builtin();
        if let Some(dir) = &config.font_dir {
            match fonts.load_dir(dir) {
                Ok(count) => log::info!("Registered {} fonts from {}", count, dir.display()),
                Err(e) => log::warn!("{:#}", e),
            }
        }
        fonts.install(ctx);

        let service = HttpTranslationService::new(&config.service_url, config.request_timeout());
        log::info!(
            "Using translation service at {} (target {})",
            config.service_url,
            config.target_language
        );
        let jobs = JobRunner::new(Arc::new(service), config.target_language.clone());

        let mut app = Self {
            editor: Editor::new(config.max_history, config.bubble_defaults()),
            jobs,
            fonts,
            source: None,
            source_path: None,
            image_texture: None,
            image_loader: None,
            loading_message: None,
            status: "Open an image to begin".to_string(),
            language_input: config.target_language,
        };
        if let Some(path) = initial_image {
            app.load_image_file(path);
        }
        app
    }

    /// Load an image file in the background.
    pub fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", path.display()));

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = media::load_image(&path)
                .map(|image| {
                    log::info!(
                        "Loaded image: {} ({}x{})",
                        path.display(),
                        image.width(),
                        image.height()
                    );
                    LoadedImageData { path, image }
                })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn poll_image_loader(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => {
                let size = [loaded.image.width() as usize, loaded.image.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, loaded.image.as_raw());
                self.image_texture =
                    Some(ctx.load_texture("source_image", color_image, egui::TextureOptions::LINEAR));
                self.editor.reset();
                self.jobs.start_document();
                self.editor.session_mut().viewport.reset();
                self.status = format!("Opened {}", loaded.path.display());
                self.source = Some(loaded.image);
                self.source_path = Some(loaded.path);
            }
            Err(e) => {
                // The previous document stays as it was.
                log::error!("Failed to load image: {}", e);
                self.status = format!("Failed to load image: {e}");
            }
        }
    }

    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", media::IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.load_image_file(path);
        }
    }

    fn export_dialog(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let file_name = self
            .source_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|stem| format!("{}-translated.png", stem.to_string_lossy()))
            .unwrap_or_else(|| "translated.png".to_string());
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };
        match export::export_composite(source, self.editor.store(), &self.fonts, &path) {
            Ok(()) => self.status = format!("Exported {}", path.display()),
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                self.status = format!("Export failed: {e:#}");
            }
        }
    }

    fn scan_image(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        match media::encode_png(source) {
            Ok(png) => {
                if self.jobs.spawn_scan(png) {
                    self.status = "Scanning image...".to_string();
                }
            }
            Err(e) => {
                log::error!("Could not prepare image for scanning: {:#}", e);
                self.status = format!("Scan failed: {e:#}");
            }
        }
    }

    fn request_region(&mut self, request: RegionRequest) {
        let Some(source) = &self.source else {
            return;
        };
        match media::region_png(source, &request.bbox) {
            Ok(png) => {
                self.jobs.spawn_region(request.id, png);
                self.status = "Translating region...".to_string();
            }
            Err(e) => {
                let error = ServiceError::Unavailable(format!("{e:#}"));
                self.editor.apply_region_result(request.id, Err(error));
                self.status = format!("Could not translate region: {e:#}");
            }
        }
    }

    fn retranslate_chains(&mut self) {
        let chains = self.editor.chain_requests();
        if chains.is_empty() {
            self.status = "No linked chains to retranslate".to_string();
            return;
        }
        let count = chains.len();
        if self.jobs.spawn_chains(chains) {
            self.status = format!("Retranslating {count} chains...");
        }
    }

    fn poll_jobs(&mut self) {
        for result in self.jobs.poll() {
            match result {
                JobResult::Scan(Ok(detections)) => {
                    let count = self.editor.apply_detections(detections);
                    self.status = format!("Scan found {count} text regions");
                }
                JobResult::Scan(Err(e)) => {
                    log::error!("Scan failed: {}", e);
                    self.status = format!("Scan failed: {e}");
                }
                JobResult::Region { id, result } => {
                    let failure = result.as_ref().err().map(ToString::to_string);
                    match self.editor.apply_region_result(id, result) {
                        RegionResolution::Applied => self.status = format!("Translated bubble {id}"),
                        RegionResolution::Failed => {
                            self.status = format!(
                                "Translation failed: {}",
                                failure.unwrap_or_default()
                            )
                        }
                        RegionResolution::Dropped => {}
                    }
                }
                JobResult::Chains(outcomes) => {
                    let summary = self.editor.apply_chain_outcomes(outcomes);
                    self.status = if summary.failed_chains > 0 {
                        format!(
                            "Retranslated {} bubbles, {} chains failed",
                            summary.updated, summary.failed_chains
                        )
                    } else {
                        format!("Retranslated {} bubbles", summary.updated)
                    };
                }
            }
        }
    }

    fn undo(&mut self) {
        if self.editor.undo() {
            self.status = "Undo".to_string();
        }
    }

    fn redo(&mut self) {
        if self.editor.redo() {
            self.status = "Redo".to_string();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.editor.session().is_gesture_active() || self.editor.session().link_source().is_some() {
                self.editor.cancel_gesture();
            } else {
                self.editor.select(None);
            }
        }

        // Only process if no text field is focused
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.undo();
        }
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.redo();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.editor.delete_selected();
        }

        let plain = ctx.input(|i| i.modifiers.is_none());
        if plain {
            let tool = ctx.input(|i| {
                [
                    (egui::Key::V, Tool::Select),
                    (egui::Key::D, Tool::Draw),
                    (egui::Key::H, Tool::Pan),
                    (egui::Key::L, Tool::Link),
                ]
                .into_iter()
                .find(|(key, _)| i.key_pressed(*key))
                .map(|(_, tool)| tool)
            });
            if let Some(tool) = tool {
                self.editor.set_tool(tool);
            }
        }

        let viewport = &mut self.editor.session_mut().viewport;
        if ctx.input(|i| i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals)) {
            viewport.zoom_in();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Minus)) {
            viewport.zoom_out();
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    self.open_dialog();
                    ui.close_menu();
                }
                let has_image = self.source.is_some();
                if ui.add_enabled(has_image, egui::Button::new("Export Composite...")).clicked() {
                    self.export_dialog();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui.add_enabled(self.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                    self.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.editor.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.redo();
                    ui.close_menu();
                }
                ui.separator();
                let has_selection = self.editor.selected().is_some();
                if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                    self.editor.delete_selected();
                    ui.close_menu();
                }
                let has_links = !self.editor.store().links().is_empty();
                if ui.add_enabled(has_links, egui::Button::new("Clear Links")).clicked() {
                    self.editor.clear_links();
                    ui.close_menu();
                }
            });

            ui.menu_button("Translate", |ui| {
                let can_scan = self.source.is_some() && !self.jobs.is_scanning();
                if ui.add_enabled(can_scan, egui::Button::new("Scan Image")).clicked() {
                    self.scan_image();
                    ui.close_menu();
                }
                let can_chain = !self.editor.store().links().is_empty() && !self.jobs.is_retranslating();
                if ui
                    .add_enabled(can_chain, egui::Button::new("Retranslate Linked Chains"))
                    .clicked()
                {
                    self.retranslate_chains();
                    ui.close_menu();
                }
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Target language:");
                    let response = ui.text_edit_singleline(&mut self.language_input);
                    if response.lost_focus() && self.language_input.trim() != self.jobs.target_language() {
                        let language = self.language_input.trim().to_string();
                        log::info!("Target language set to {}", language);
                        self.jobs.set_target_language(language);
                    }
                });
            });

            ui.menu_button("View", |ui| {
                let viewport = &mut self.editor.session_mut().viewport;
                if ui.button("Zoom In (+)").clicked() {
                    viewport.zoom_in();
                    ui.close_menu();
                }
                if ui.button("Zoom Out (-)").clicked() {
                    viewport.zoom_out();
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    viewport.reset();
                    ui.close_menu();
                }
            });
        });
    }

    fn apply_properties_action(&mut self, action: properties::PropertiesAction) {
        match action {
            properties::PropertiesAction::Select(id) => self.editor.select(Some(id)),
            properties::PropertiesAction::Edit(edited) => {
                let id = edited.id;
                self.editor.update_bubble(id, |bubble| *bubble = edited);
            }
            properties::PropertiesAction::ToggleShape(id) => self.editor.toggle_shape(id),
            properties::PropertiesAction::Delete(id) => {
                self.editor.delete(id);
            }
            properties::PropertiesAction::RemoveLink(a, b) => {
                self.editor.remove_link(a, b);
            }
            properties::PropertiesAction::ClearLinks => self.editor.clear_links(),
            properties::PropertiesAction::None => {}
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("Tool: {:?}", self.editor.session().tool));
            ui.separator();
            if self.jobs.outstanding() > 0 {
                ui.spinner();
                ui.label(format!("{} requests in flight", self.jobs.outstanding()));
                ui.separator();
            }
            ui.label(self.status.as_str());
        });
    }
}

impl eframe::App for OvertypeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader(ctx);
        self.poll_jobs();

        // Keep polling while anything runs in the background
        if self.loading_message.is_some() || self.jobs.outstanding() > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.menu_bar(ctx, ui));

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.editor);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.status_bar(ui));

        let properties_action = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| properties::show(ui, &self.editor, &self.fonts))
                    .inner
            })
            .inner;
        self.apply_properties_action(properties_action);

        self.handle_shortcuts(ctx);

        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(message) = &self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    return canvas::CanvasAction::None;
                }
                let image = match (&self.image_texture, &self.source) {
                    (Some(texture), Some(source)) => Some(canvas::CanvasImage {
                        texture,
                        width: source.width(),
                        height: source.height(),
                    }),
                    _ => None,
                };
                canvas::show(ui, &mut self.editor, image, &self.fonts)
            })
            .inner;

        match canvas_action {
            canvas::CanvasAction::RequestRegion(request) => self.request_region(request),
            canvas::CanvasAction::None => {}
        }

        // Property edits are recorded once the user lets go: no gesture, no
        // button held and no text field focused.
        let settled = !self.editor.session().is_gesture_active()
            && !ctx.input(|i| i.pointer.any_down())
            && !ctx.wants_keyboard_input();
        if settled {
            self.editor.commit_if_changed();
        }
    }
}
