// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stereo Crop - a stereo photo cropping tool
//!
//! A cross-platform desktop application for adjusting parallax, per-eye
//! cropping and vertical eye alignment of stereo photographs, and exporting
//! the result as a side-by-side composite with a re-editable project file.

mod app;
mod config;
mod document;
mod engine;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::StereoCropApp;
use config::Settings;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let settings = Settings::load();
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Stereo Crop"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Stereo Crop",
        options,
        Box::new(move |_cc| Ok(Box::new(StereoCropApp::new(settings, initial)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
