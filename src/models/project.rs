// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project metadata saved next to every exported composite.
//!
//! The record names the untouched original so a later edit re-derives the
//! composite from the source instead of from a previous export.

use super::geometry::{Background, GeometryState};
use serde::{Deserialize, Serialize};

/// The only project file version this tool reads and writes.
pub const FILE_VERSION: &str = "1.0";

/// Complete project metadata for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub file_version: String,
    /// File name of the original source, relative to the sidecar.
    pub filename: String,
    pub parallax: f64,
    pub vertical_alignment: f64,
    pub vertical_crop: [f64; 2],
    pub horizontal_crop: [[f64; 2]; 2],
    /// Background colour packed as 0xRRGGBB.
    pub background: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub swap_eyes: bool,
}

impl ProjectMetadata {
    /// Capture the persisted parts of `state` for the given original file.
    pub fn from_state(filename: String, state: &GeometryState) -> Self {
        Self {
            file_version: FILE_VERSION.to_string(),
            filename,
            parallax: state.parallax,
            vertical_alignment: state.vertical_alignment,
            vertical_crop: state.v_crop(),
            horizontal_crop: state.h_crop(),
            background: state.background.rgb(),
            swap_eyes: state.swap_eyes,
        }
    }

    /// Restore the persisted fields onto `state`, leaving the view alone.
    pub fn apply_to(&self, state: &mut GeometryState) {
        state.parallax = self.parallax;
        state.vertical_alignment = self.vertical_alignment;
        state.set_crop(self.vertical_crop, self.horizontal_crop);
        state.background = Background::from_rgb(self.background).unwrap_or_else(|| {
            log::warn!(
                "Unknown background colour {:#08x} in project file, using black",
                self.background
            );
            Background::Black
        });
        state.swap_eyes = self.swap_eyes;
        state.dirty = false;
    }
}
