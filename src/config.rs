// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! User settings and key bindings.
//!
//! Settings are read from the JSON file named by `STEREO_CROP_CONFIG`.
//! Missing fields take their defaults, so a config file only needs to list
//! what it changes.

use crate::engine::transform::HoldKey;
use crate::models::geometry::{Background, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "STEREO_CROP_CONFIG";

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    HoldParallax,
    HoldCrop,
    HoldVerticalAlign,
    ResetView,
    FitToWindow,
    SwapEyes,
    CycleBackground,
    CycleOutputFormat,
    Save,
    PreviousFile,
    NextFile,
}

impl KeyAction {
    /// The mode key this action holds, if it is a hold action.
    pub fn hold_key(self) -> Option<HoldKey> {
        match self {
            KeyAction::HoldParallax => Some(HoldKey::Parallax),
            KeyAction::HoldCrop => Some(HoldKey::Crop),
            KeyAction::HoldVerticalAlign => Some(HoldKey::VerticalAlign),
            _ => None,
        }
    }
}

/// One entry of the key binding table, keyed by egui key name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: KeyAction,
}

impl KeyBinding {
    fn new(key: &str, action: KeyAction) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

/// Modifier that turns the wheel into previous/next file navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelModifier {
    #[default]
    Alt,
    Shift,
    Ctrl,
}

impl WheelModifier {
    pub fn is_held(self, modifiers: &egui::Modifiers) -> bool {
        match self {
            WheelModifier::Alt => modifiers.alt,
            WheelModifier::Shift => modifiers.shift,
            WheelModifier::Ctrl => modifiers.ctrl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bindings: Vec<KeyBinding>,
    pub navigate_modifier: WheelModifier,
    /// Native wheel units per egui scroll point.
    pub wheel_units_per_point: f64,
    pub output_format: OutputFormat,
    pub background: Background,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bindings: vec![
                KeyBinding::new("P", KeyAction::HoldParallax),
                KeyBinding::new("C", KeyAction::HoldCrop),
                KeyBinding::new("V", KeyAction::HoldVerticalAlign),
                KeyBinding::new("R", KeyAction::ResetView),
                KeyBinding::new("F", KeyAction::FitToWindow),
                KeyBinding::new("S", KeyAction::SwapEyes),
                KeyBinding::new("B", KeyAction::CycleBackground),
                KeyBinding::new("O", KeyAction::CycleOutputFormat),
                KeyBinding::new("Enter", KeyAction::Save),
                KeyBinding::new("PageUp", KeyAction::PreviousFile),
                KeyBinding::new("PageDown", KeyAction::NextFile),
            ],
            navigate_modifier: WheelModifier::default(),
            wheel_units_per_point: 2.4,
            output_format: OutputFormat::default(),
            background: Background::default(),
        }
    }
}

impl Settings {
    /// Load settings from `STEREO_CROP_CONFIG`, falling back to defaults.
    pub fn load() -> Self {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| Ok(serde_json::from_str::<Settings>(&text)?));
        match parsed {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve the binding table into egui keys, skipping unknown names.
    pub fn keymap(&self) -> Keymap {
        let entries = self
            .bindings
            .iter()
            .filter_map(|binding| match egui::Key::from_name(&binding.key) {
                Some(key) => Some((key, binding.action)),
                None => {
                    log::warn!("Unknown key name {:?} in bindings", binding.key);
                    None
                }
            })
            .collect();
        Keymap { entries }
    }
}

/// Key binding table resolved to egui keys.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    entries: Vec<(egui::Key, KeyAction)>,
}

impl Keymap {
    pub fn action_for(&self, key: egui::Key) -> Option<KeyAction> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, action)| *action)
    }
}
