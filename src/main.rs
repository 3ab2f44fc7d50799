// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overtype - translated text bubbles for images
//!
//! A cross-platform desktop application for overlaying translated text
//! onto images, arranging and styling it, and exporting the result.
//!
//! Usage: `overtype [IMAGE]`

mod app;
mod config;
mod editor;
mod io;
mod models;
mod render;
mod services;
mod ui;
mod util;

use anyhow::Result;
use app::OvertypeApp;
use config::AppConfig;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::load();
    let initial_image = std::env::args_os().nth(1).map(PathBuf::from);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Overtype"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Overtype",
        options,
        Box::new(move |cc| Ok(Box::new(OvertypeApp::new(&cc.egui_ctx, config, initial_image)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
