// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module owns the open document, forwards keyboard and pointer input
//! to its transform engine, runs the key-bound commands and coordinates
//! background loading and exporting.

use crate::config::{KeyAction, Keymap, Settings};
use crate::document::Document;
use crate::engine::transform::{Direction, EngineAction, InputEvent};
use crate::error;
use crate::io::export::ExportPaths;
use crate::io::file_group;
use crate::models::geometry::Eye;
use crate::ui::{canvas, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};

/// Result of background document loading.
type LoadResult = Result<Document, String>;

/// GPU textures for the two source eyes, in file order.
struct EyeTextures {
    left: egui::TextureHandle,
    right: egui::TextureHandle,
}

impl EyeTextures {
    fn upload(ctx: &egui::Context, document: &Document) -> Self {
        let upload = |name: &str, image: &image::RgbImage| {
            let size = [image.width() as usize, image.height() as usize];
            let color_image = egui::ColorImage::from_rgb(size, image.as_raw());
            ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
        };
        Self {
            left: upload("left_eye", &document.left),
            right: upload("right_eye", &document.right),
        }
    }

    /// Texture drawn for `eye`, honouring the eye swap.
    fn for_eye(&self, eye: Eye, swapped: bool) -> &egui::TextureHandle {
        match (eye, swapped) {
            (Eye::Left, false) | (Eye::Right, true) => &self.left,
            (Eye::Right, false) | (Eye::Left, true) => &self.right,
        }
    }
}

/// Main application state.
pub struct StereoCropApp {
    settings: Settings,
    keymap: Keymap,

    /// Currently open document
    document: Option<Document>,

    /// Eye textures of the open document
    textures: Option<EyeTextures>,

    /// Receiver for background document loading
    loader: Option<Receiver<LoadResult>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last status line message
    status: Option<String>,

    /// Fit the next frame's document to the canvas
    fit_pending: bool,

    /// Canvas size in points from the last frame
    surface: (f64, f64),
}

impl StereoCropApp {
    /// Create a new application, optionally opening `initial` straight away.
    pub fn new(settings: Settings, initial: Option<PathBuf>) -> Self {
        let keymap = settings.keymap();
        let mut app = Self {
            settings,
            keymap,
            document: None,
            textures: None,
            loader: None,
            loading_message: None,
            status: None,
            fit_pending: false,
            surface: (1280.0, 720.0),
        };
        if let Some(path) = initial {
            app.open_file(path);
        }
        app
    }

    /// Load a source image or project file (asynchronously).
    pub fn open_file(&mut self, path: PathBuf) {
        self.settle_pending_export();

        let (sender, receiver) = channel();
        self.loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", path.display()));

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = Document::open(&path)
                .map_err(|e| format!("Failed to open {}: {}", path.display(), e));
            let _ = sender.send(result);
        });
    }

    /// A pending export must finish before its document is replaced.
    /// Returns whether an export was waited for and reported.
    fn settle_pending_export(&mut self) -> bool {
        let Some(result) = self.document.as_mut().and_then(|d| d.wait_for_export()) else {
            return false;
        };
        self.report_export(result);
        true
    }

    /// Make `document` the open document. An export started on the old one
    /// while the new one was loading is finished first.
    fn replace_document(&mut self, document: Document) {
        let settled = self.settle_pending_export();
        log::info!("Document loaded: {}", document.path.display());
        let opened = format!("Opened {}", document.path.display());
        self.status = Some(match self.status.take() {
            Some(report) if settled => format!("{}; {}", report, opened),
            _ => opened,
        });
        self.document = Some(document);
        self.fit_pending = true;
    }

    fn report_export(&mut self, result: error::Result<ExportPaths>) {
        match result {
            Ok(paths) => {
                self.status = Some(format!("Saved {}", paths.image.display()));
            }
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.status = Some(format!("Export failed: {}", e));
            }
        }
    }

    fn navigate(&mut self, direction: Direction) {
        let Some(current) = self.document.as_ref().map(|d| d.path.clone()) else {
            return;
        };
        match file_group::navigate(&current, direction) {
            Ok(Some(path)) if path != current => {
                log::info!("Navigating {:?} to {}", direction, path.display());
                self.open_file(path);
            }
            Ok(_) => log::debug!("No other file to navigate to"),
            Err(e) => log::error!("Failed to scan directory: {}", e),
        }
    }

    fn save(&mut self) {
        let Some(document) = self.document.as_mut() else {
            return;
        };
        match document.start_export() {
            Ok(()) => self.status = Some("Exporting...".to_string()),
            Err(e) => {
                log::warn!("Cannot export: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    fn run_command(&mut self, action: KeyAction) {
        match action {
            KeyAction::Save => self.save(),
            KeyAction::PreviousFile => self.navigate(Direction::Previous),
            KeyAction::NextFile => self.navigate(Direction::Next),
            KeyAction::FitToWindow => {
                let surface = self.surface;
                if let Some(document) = self.document.as_mut() {
                    document.fit_to_surface(surface);
                }
            }
            _ => {
                let Some(state) = self.document.as_mut().map(|d| &mut d.state) else {
                    return;
                };
                match action {
                    KeyAction::ResetView => state.reset_view(),
                    KeyAction::SwapEyes => state.toggle_swap_eyes(),
                    KeyAction::CycleBackground => state.background = state.background.next(),
                    KeyAction::CycleOutputFormat => {
                        state.output_format = state.output_format.next();
                        log::info!("Output format: {}", state.output_format.label());
                    }
                    _ => {}
                }
            }
        }
    }

    /// Route key events to the hold-key state machine or to commands.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let keys: Vec<(egui::Key, bool, bool)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key { key, pressed, repeat, .. } => Some((*key, *pressed, *repeat)),
                    _ => None,
                })
                .collect()
        });

        for (key, pressed, repeat) in keys {
            let Some(action) = self.keymap.action_for(key) else {
                continue;
            };
            if let Some(hold) = action.hold_key() {
                let event = if pressed {
                    InputEvent::KeyDown { key: hold, repeat }
                } else {
                    InputEvent::KeyUp { key: hold }
                };
                self.dispatch(event);
            } else if pressed && !repeat {
                self.run_command(action);
            }
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let surface = self.surface;
        let Some(document) = self.document.as_mut() else {
            return;
        };
        if let EngineAction::Navigate(direction) = document.handle_input(event, surface) {
            self.navigate(direction);
        }
    }

    fn poll_background_work(&mut self, ctx: &egui::Context) {
        // Check for completed document loading
        if let Some(ref receiver) = self.loader {
            if let Ok(result) = receiver.try_recv() {
                self.loader = None;
                self.loading_message = None;

                match result {
                    Ok(mut document) => {
                        document.state.output_format = self
                            .document
                            .as_ref()
                            .map_or(self.settings.output_format, |d| d.state.output_format);
                        if document.path == document.source {
                            document.state.background = self.settings.background;
                        }
                        self.textures = Some(EyeTextures::upload(ctx, &document));
                        self.replace_document(document);
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        self.status = Some(e);
                    }
                }
            }
        }

        let finished = self.document.as_mut().and_then(|d| d.poll_export());
        if let Some(result) = finished {
            self.report_export(result);
        }

        // Keep repainting while something runs in the background
        let exporting = self.document.as_ref().is_some_and(|d| d.is_exporting());
        if self.loading_message.is_some() || exporting {
            ctx.request_repaint();
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open...").clicked() {
                        // Open native file picker
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Stereo images", &["mpo", "jps", "pns"])
                            .add_filter("Stereo crop projects", &["spct"])
                            .pick_file()
                        {
                            self.open_file(path);
                        }
                        ui.close_menu();
                    }
                    let has_document = self.document.is_some();
                    if ui.add_enabled(has_document, egui::Button::new("Save (Enter)")).clicked() {
                        self.save();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(has_document, egui::Button::new("Previous File (PgUp)")).clicked() {
                        self.navigate(Direction::Previous);
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_document, egui::Button::new("Next File (PgDn)")).clicked() {
                        self.navigate(Direction::Next);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Reset Zoom").clicked() {
                        self.run_command(KeyAction::ResetView);
                        ui.close_menu();
                    }
                    if ui.button("Fit to Window").clicked() {
                        self.run_command(KeyAction::FitToWindow);
                        ui.close_menu();
                    }
                    if ui.button("Swap Eyes").clicked() {
                        self.run_command(KeyAction::SwapEyes);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    ui.label("Hold P and drag: parallax");
                    ui.label("Hold C and drag an edge: crop");
                    ui.label("Hold V and drag: vertical alignment");
                    ui.label("Middle drag: parallax, wheel: zoom");
                    ui.label("Alt + wheel: previous / next file");
                });
            });
        });
    }
}

impl eframe::App for StereoCropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background_work(ctx);

        self.menu_bar(ctx);

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| match self.document.as_mut() {
                Some(document) => {
                    let exporting = document.is_exporting();
                    toolbar::show(ui, &mut document.state, exporting)
                }
                None => toolbar::ToolbarAction::None,
            })
            .inner;
        if toolbar_action == toolbar::ToolbarAction::Save {
            self.save();
        }

        // Held keys are never released while unfocused
        if !ctx.input(|i| i.focused) {
            if let Some(document) = self.document.as_mut() {
                document.reset_input();
            }
        }
        self.handle_keys(ctx);

        // Main canvas (center)
        let output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
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
                    None
                } else {
                    let view = match (self.document.as_ref(), self.textures.as_ref()) {
                        (Some(document), Some(textures)) => {
                            let swapped = document.state.swap_eyes;
                            Some(canvas::DocumentView {
                                document,
                                left: textures.for_eye(Eye::Left, swapped),
                                right: textures.for_eye(Eye::Right, swapped),
                            })
                        }
                        _ => None,
                    };
                    Some(canvas::show(
                        ui,
                        view,
                        &self.settings,
                        self.status.as_deref(),
                    ))
                }
            })
            .inner;

        if let Some(output) = output {
            self.surface = output.surface;
            if self.fit_pending {
                if let Some(document) = self.document.as_mut() {
                    document.fit_to_surface(output.surface);
                }
                self.fit_pending = false;
            }
            for event in output.events {
                self.dispatch(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::write_image;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::Path;

    fn write_pair(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write_image(&RgbImage::from_pixel(40, 20, Rgb([90, 90, 90])), &mut file, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_export_started_while_loading_is_finished_before_switch() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_pair(dir.path(), "first.pns");
        let second = write_pair(dir.path(), "second.pns");

        let mut app = StereoCropApp::new(Settings::default(), None);
        app.replace_document(Document::open(&first).unwrap());
        app.document.as_mut().unwrap().state.adjust_parallax(4.0);
        app.save();
        assert!(app.document.as_ref().unwrap().is_exporting());

        app.replace_document(Document::open(&second).unwrap());

        assert_eq!(app.document.as_ref().unwrap().source, second);
        assert!(dir.path().join("first-cropped.pns").is_file());
        assert!(dir.path().join("first-cropped.spct").is_file());
        let status = app.status.unwrap();
        assert!(status.starts_with("Saved"), "{}", status);
        assert!(status.contains("Opened"), "{}", status);
    }

    #[test]
    fn test_replace_without_pending_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pair(dir.path(), "only.pns");

        let mut app = StereoCropApp::new(Settings::default(), None);
        app.status = Some("Exporting...".to_string());
        app.replace_document(Document::open(&path).unwrap());

        assert_eq!(app.status.as_deref(), Some(format!("Opened {}", path.display()).as_str()));
        assert!(app.fit_pending);
    }
}
