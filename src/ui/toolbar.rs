// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with output layout, background and export controls.

use crate::models::geometry::{Background, GeometryState, OutputFormat};

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Save,
}

fn background_label(background: Background) -> &'static str {
    match background {
        Background::Black => "Black",
        Background::DarkGrey => "Dark grey",
        Background::Grey => "Grey",
        Background::LightGrey => "Light grey",
        Background::White => "White",
    }
}

/// Display the toolbar for the open document.
pub fn show(ui: &mut egui::Ui, state: &mut GeometryState, exporting: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        egui::ComboBox::from_label("Layout")
            .selected_text(state.output_format.label())
            .show_ui(ui, |ui| {
                for format in OutputFormat::ALL {
                    ui.selectable_value(&mut state.output_format, format, format.label());
                }
            });

        egui::ComboBox::from_label("Background")
            .selected_text(background_label(state.background))
            .show_ui(ui, |ui| {
                for background in Background::ALL {
                    ui.selectable_value(&mut state.background, background, background_label(background));
                }
            });

        ui.separator();

        if ui.selectable_label(state.swap_eyes, "⇄ Swap eyes").clicked() {
            state.toggle_swap_eyes();
        }

        if ui.button("Reset parallax").clicked() {
            state.set_parallax(0.0);
        }

        ui.separator();

        if ui.add_enabled(!exporting, egui::Button::new("💾 Save")).clicked() {
            action = ToolbarAction::Save;
        }
    });

    action
}
