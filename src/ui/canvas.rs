// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stereo preview canvas.
//!
//! Draws each eye into its viewport of the selected output layout and turns
//! raw pointer input over the canvas into engine events.

use crate::config::Settings;
use crate::document::Document;
use crate::engine::output_format::{renders_eye, viewport_for};
use crate::engine::transform::{Buttons, EditMode, InputEvent};
use crate::models::geometry::{Eye, OutputFormat};
use crate::util::geometry::Rect;

/// An open document together with the textures to draw for each eye.
pub struct DocumentView<'a> {
    pub document: &'a Document,
    pub left: &'a egui::TextureHandle,
    pub right: &'a egui::TextureHandle,
}

/// Result of one frame of canvas interaction.
pub struct CanvasOutput {
    /// Canvas size in points.
    pub surface: (f64, f64),
    /// Input events relative to the canvas origin.
    pub events: Vec<InputEvent>,
}

/// Display the canvas and collect pointer input.
pub fn show(
    ui: &mut egui::Ui,
    view: Option<DocumentView<'_>>,
    settings: &Settings,
    status: Option<&str>,
) -> CanvasOutput {
    let status_height = ui.spacing().interact_size.y + ui.spacing().item_spacing.y * 2.0;
    let mut size = ui.available_size();
    size.y = (size.y - status_height).max(1.0);
    let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
    let surface = (rect.width() as f64, rect.height() as f64);

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    let mut events = Vec::new();
    match view {
        Some(ref view) => {
            draw_document(&painter, rect, view);
            events = collect_pointer_events(ui, rect, settings);
        }
        None => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a stereo photo (.mpo, .jps, .pns) to begin\nFile → Open...",
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(180),
            );
        }
    }

    // Status line
    ui.separator();
    ui.horizontal(|ui| match view {
        Some(ref view) => {
            let doc = view.document;
            let state = &doc.state;
            let name = doc
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{}{}", name, if state.dirty { " *" } else { "" }));
            ui.separator();
            ui.label(format!("Mode: {}", doc.engine().mode().label()));
            ui.separator();
            ui.label(format!("Parallax: {:.2}%", state.parallax));
            ui.label(format!("Alignment: {:.2}%", state.vertical_alignment * 100.0));
            ui.label(format!("Zoom: {:.0}%", state.scale * 100.0));
            ui.separator();
            ui.label(state.output_format.label());
            if doc.is_exporting() {
                ui.separator();
                ui.spinner();
            }
            if let Some(status) = status {
                ui.separator();
                ui.label(egui::RichText::new(status).weak());
            }
        }
        None => {
            ui.label(status.unwrap_or("No file loaded"));
        }
    });

    CanvasOutput { surface, events }
}

fn to_egui(rect: &Rect, origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.w as f32, rect.h as f32),
    )
}

fn draw_document(painter: &egui::Painter, canvas: egui::Rect, view: &DocumentView<'_>) {
    let doc = view.document;
    let state = &doc.state;
    let surface = (canvas.width() as f64, canvas.height() as f64);
    let [r, g, b] = state.background.channels();
    let background = egui::Color32::from_rgb(r, g, b);

    let crop_outline = matches!(
        doc.engine().mode(),
        EditMode::Crop | EditMode::CropLeft | EditMode::CropRight | EditMode::CropTop | EditMode::CropBottom
    );

    for eye in Eye::BOTH {
        if !renders_eye(state.output_format, eye) {
            continue;
        }
        // Without a hardware stereo device only one eye can be shown.
        if state.output_format == OutputFormat::NativeStereo && eye == Eye::Right {
            continue;
        }

        let viewport = viewport_for(state.output_format, eye, surface.0, surface.1);
        let viewport_rect = to_egui(&viewport, canvas.min);
        let clipped = painter.with_clip_rect(viewport_rect.intersect(canvas));
        clipped.rect_filled(viewport_rect, 0.0, background);

        let eye_rect = doc.eye_rect(eye, surface);
        let dest = to_egui(&viewport.map_rect(&eye_rect.dest, surface.0, surface.1), canvas.min);
        let uv = egui::Rect::from_min_max(
            egui::pos2(eye_rect.u1 as f32, eye_rect.v1 as f32),
            egui::pos2(eye_rect.u2 as f32, eye_rect.v2 as f32),
        );
        let texture = match eye {
            Eye::Left => view.left,
            Eye::Right => view.right,
        };
        clipped.image(texture.id(), dest, uv, egui::Color32::WHITE);

        if crop_outline {
            let other = doc.eye_rect(
                if eye == Eye::Left { Eye::Right } else { Eye::Left },
                surface,
            );
            let combined = eye_rect.dest.union(&other.dest);
            let outline = to_egui(&viewport.map_rect(&combined, surface.0, surface.1), canvas.min);
            clipped.rect_stroke(outline, 0.0, egui::Stroke::new(1.0, egui::Color32::YELLOW));
        }
    }
}

fn held_buttons(pointer: &egui::PointerState) -> Buttons {
    Buttons {
        primary: pointer.button_down(egui::PointerButton::Primary),
        secondary: pointer.button_down(egui::PointerButton::Secondary),
        tertiary: pointer.button_down(egui::PointerButton::Middle),
    }
}

fn button_mask(button: egui::PointerButton) -> Buttons {
    match button {
        egui::PointerButton::Primary => Buttons::PRIMARY,
        egui::PointerButton::Secondary => Buttons::SECONDARY,
        egui::PointerButton::Middle => Buttons::TERTIARY,
        _ => Buttons::default(),
    }
}

/// Translate this frame's raw pointer events into canvas-relative events.
/// Presses and wheel input only count over the canvas; moves and releases
/// are always forwarded so drags that leave the canvas finish cleanly.
fn collect_pointer_events(ui: &egui::Ui, canvas: egui::Rect, settings: &Settings) -> Vec<InputEvent> {
    let local = |pos: egui::Pos2| ((pos.x - canvas.min.x) as f64, (pos.y - canvas.min.y) as f64);

    ui.input(|i| {
        let held = held_buttons(&i.pointer);
        let mut events = Vec::new();
        for event in &i.events {
            match event {
                egui::Event::PointerButton { pos, button, pressed, .. } => {
                    if *pressed && canvas.contains(*pos) {
                        let mut buttons = held;
                        let extra = button_mask(*button);
                        buttons.primary |= extra.primary;
                        buttons.secondary |= extra.secondary;
                        buttons.tertiary |= extra.tertiary;
                        events.push(InputEvent::PointerDown { pos: local(*pos), buttons });
                    } else if !*pressed {
                        events.push(InputEvent::PointerUp { pos: local(*pos), buttons: held });
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    events.push(InputEvent::PointerMove { pos: local(*pos), buttons: held });
                }
                _ => {}
            }
        }

        let scroll = i.raw_scroll_delta.y;
        if scroll != 0.0 {
            if let Some(pos) = i.pointer.hover_pos().filter(|p| canvas.contains(*p)) {
                events.push(InputEvent::Wheel {
                    pos: local(pos),
                    delta: scroll as f64 * settings.wheel_units_per_point,
                    navigate: settings.navigate_modifier.is_held(&i.modifiers),
                });
            }
        }
        events
    })
}
