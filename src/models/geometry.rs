// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-document geometry state.
//!
//! Holds zoom, pan, parallax, vertical eye alignment and the crop
//! fractions of an open stereo pair. Every mutator clamps its input so the
//! state stays valid; none of them can fail.

use serde::{Deserialize, Serialize};

/// Lower bound for the zoom factor.
pub const MIN_SCALE: f64 = 0.025;

/// Wheel units that make up one full doubling step of the zoom formula.
const WHEEL_UNITS: f64 = 900.0;

/// One of the two eyes of a stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// -1 for the left eye, +1 for the right eye.
    pub fn sign(self) -> f64 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Lower (`Start`) or upper (`End`) bound of a crop interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// A single scalar crop bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropBound {
    /// Shared vertical crop, same for both eyes.
    Vertical(Edge),
    /// Horizontal crop of one eye.
    Horizontal(Eye, Edge),
}

/// Fill colour for letterboxed and extended canvas regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    #[default]
    Black,
    DarkGrey,
    Grey,
    LightGrey,
    White,
}

impl Background {
    pub const ALL: [Background; 5] = [
        Background::Black,
        Background::DarkGrey,
        Background::Grey,
        Background::LightGrey,
        Background::White,
    ];

    /// Colour packed as 0xRRGGBB.
    pub fn rgb(self) -> u32 {
        match self {
            Background::Black => 0x000000,
            Background::DarkGrey => 0x404040,
            Background::Grey => 0x808080,
            Background::LightGrey => 0xC0C0C0,
            Background::White => 0xFFFFFF,
        }
    }

    pub fn from_rgb(rgb: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.rgb() == rgb)
    }

    pub fn channels(self) -> [u8; 3] {
        let rgb = self.rgb();
        [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// On-screen layout combining the two eye views into one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    NativeStereo,
    #[default]
    SideBySideFull,
    SideBySideHalf,
    TopBottomFull,
    TopBottomHalf,
    Mono,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::NativeStereo,
        OutputFormat::SideBySideFull,
        OutputFormat::SideBySideHalf,
        OutputFormat::TopBottomFull,
        OutputFormat::TopBottomHalf,
        OutputFormat::Mono,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::NativeStereo => "Native stereo",
            OutputFormat::SideBySideFull => "Side by side",
            OutputFormat::SideBySideHalf => "Side by side (half)",
            OutputFormat::TopBottomFull => "Top / bottom",
            OutputFormat::TopBottomHalf => "Top / bottom (half)",
            OutputFormat::Mono => "Mono",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Mutable geometry of one open document.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryState {
    /// Screen pixels per source pixel.
    pub scale: f64,
    /// Screen-space offset in layout-independent (canonical) pixels.
    pub pan: (f64, f64),
    /// Horizontal eye shift in percent of the source width.
    pub parallax: f64,
    /// Signed vertical shift between the eyes, as a fraction of height.
    pub vertical_alignment: f64,
    v_crop: [f64; 2],
    h_crop: [[f64; 2]; 2],
    pub background: Background,
    pub output_format: OutputFormat,
    pub swap_eyes: bool,
    pub dirty: bool,
    revision: u64,
}

impl Default for GeometryState {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryState {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            pan: (0.0, 0.0),
            parallax: 0.0,
            vertical_alignment: 0.0,
            v_crop: [0.0, 1.0],
            h_crop: [[0.0, 1.0], [0.0, 1.0]],
            background: Background::default(),
            output_format: OutputFormat::default(),
            swap_eyes: false,
            dirty: false,
            revision: 0,
        }
    }

    pub fn v_crop(&self) -> [f64; 2] {
        self.v_crop
    }

    pub fn h_crop(&self) -> [[f64; 2]; 2] {
        self.h_crop
    }

    pub fn h_crop_for(&self, eye: Eye) -> [f64; 2] {
        self.h_crop[eye.index()]
    }

    /// Counter bumped by every edit that marks the document dirty.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace all crop bounds at once, e.g. when restoring a project file.
    /// Each interval is clamped to [0, 1] and reordered if inverted.
    pub fn set_crop(&mut self, v_crop: [f64; 2], h_crop: [[f64; 2]; 2]) {
        self.v_crop = ordered_interval(v_crop);
        self.h_crop = [ordered_interval(h_crop[0]), ordered_interval(h_crop[1])];
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan = (x, y);
    }

    pub fn adjust_pan(&mut self, dx: f64, dy: f64) {
        self.pan = (self.pan.0 + dx, self.pan.1 + dy);
        log::debug!("pan: {:.1}x{:.1}", self.pan.0, self.pan.1);
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = if scale.is_finite() {
            scale.max(MIN_SCALE)
        } else {
            MIN_SCALE
        };
    }

    /// Multiplicative zoom that keeps the canonical point `at` fixed on
    /// screen. `center` is the centre of the canonical surface.
    pub fn zoom_at(&mut self, at: (f64, f64), center: (f64, f64), wheel_delta: f64) {
        let old = self.scale;
        self.set_scale(old * (1.0 + wheel_delta / WHEEL_UNITS));
        let ratio = self.scale / old;
        self.pan = (
            (self.pan.0 - at.0 + center.0) * ratio + at.0 - center.0,
            (self.pan.1 - at.1 + center.1) * ratio + at.1 - center.1,
        );
        log::debug!("zoom: {:.3}", self.scale);
    }

    /// Set parallax to an absolute value. Dirties only on change.
    pub fn set_parallax(&mut self, parallax: f64) {
        if self.parallax != parallax {
            self.parallax = parallax;
            self.mark_dirty();
            log::debug!("parallax: {:.3}", self.parallax);
        }
    }

    pub fn adjust_parallax(&mut self, delta: f64) {
        self.parallax += delta;
        self.mark_dirty();
        log::debug!("parallax: {:.3}", self.parallax);
    }

    pub fn adjust_vertical_alignment(&mut self, delta: f64) {
        self.vertical_alignment += delta;
        self.mark_dirty();
        log::debug!("vertical alignment: {:.4}", self.vertical_alignment);
    }

    /// Move one crop bound by `delta`, clamped to [0, 1] and to the opposing
    /// bound of the same interval so it never inverts.
    pub fn adjust_crop_edge(&mut self, bound: CropBound, delta: f64) {
        let interval = match bound {
            CropBound::Vertical(_) => &mut self.v_crop,
            CropBound::Horizontal(eye, _) => &mut self.h_crop[eye.index()],
        };
        let edge = match bound {
            CropBound::Vertical(edge) | CropBound::Horizontal(_, edge) => edge,
        };
        match edge {
            Edge::Start => interval[0] = (interval[0] + delta).clamp(0.0, interval[1]),
            Edge::End => interval[1] = (interval[1] + delta).clamp(interval[0], 1.0),
        }
        self.mark_dirty();
        log::debug!("crop: v={:?} h={:?}", self.v_crop, self.h_crop);
    }

    /// Vertical alignment limited to the cropped height so derived heights
    /// never go negative.
    pub fn effective_alignment(&self) -> f64 {
        let height = self.v_crop[1] - self.v_crop[0];
        self.vertical_alignment.clamp(-height, height)
    }

    /// Vertical source-sample bounds of one eye: the shared crop shifted by
    /// half the alignment and shortened by its magnitude.
    pub fn eye_v_bounds(&self, eye: Eye) -> (f64, f64) {
        let alignment = self.effective_alignment();
        let shift = eye.sign() * alignment / 2.0;
        let shrink = alignment.abs() / 2.0;
        (
            self.v_crop[0] + shift + shrink,
            self.v_crop[1] + shift - shrink,
        )
    }

    /// Height of the aligned crop as a fraction of source height.
    pub fn aligned_height(&self) -> f64 {
        (self.v_crop[1] - self.v_crop[0] - self.effective_alignment().abs()).max(0.0)
    }

    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.set_pan(0.0, 0.0);
    }

    /// Scale the whole source image to fit the surface and recentre it.
    pub fn fit_to_surface(&mut self, image: (f64, f64), surface: (f64, f64)) {
        if image.0 <= 0.0 || image.1 <= 0.0 {
            return;
        }
        self.set_scale((surface.0 / image.0).min(surface.1 / image.1));
        self.set_pan(0.0, 0.0);
    }

    pub fn toggle_swap_eyes(&mut self) {
        self.swap_eyes = !self.swap_eyes;
        self.mark_dirty();
    }

    /// Clear `dirty` if nothing changed since `revision` was snapshotted.
    pub fn mark_saved(&mut self, revision: u64) {
        if self.revision == revision {
            self.dirty = false;
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }
}

fn ordered_interval(interval: [f64; 2]) -> [f64; 2] {
    let a = interval[0].clamp(0.0, 1.0);
    let b = interval[1].clamp(0.0, 1.0);
    [a.min(b), a.max(b)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_crop_edges_never_invert() {
        let mut state = GeometryState::new();
        let deltas = [0.7, -0.3, 0.9, -1.5, 0.45, 2.0, -0.05];
        for (i, delta) in deltas.iter().enumerate() {
            for eye in Eye::BOTH {
                state.adjust_crop_edge(CropBound::Horizontal(eye, Edge::Start), *delta);
                state.adjust_crop_edge(CropBound::Horizontal(eye, Edge::End), -delta * i as f64);
            }
            state.adjust_crop_edge(CropBound::Vertical(Edge::End), -delta);
            state.adjust_crop_edge(CropBound::Vertical(Edge::Start), *delta);

            let v = state.v_crop();
            assert!(0.0 <= v[0] && v[0] <= v[1] && v[1] <= 1.0);
            for eye in Eye::BOTH {
                let h = state.h_crop_for(eye);
                assert!(0.0 <= h[0] && h[0] <= h[1] && h[1] <= 1.0);
            }
        }
    }

    #[test]
    fn test_crop_edge_clamps_against_opposite_bound() {
        let mut state = GeometryState::new();
        state.adjust_crop_edge(CropBound::Horizontal(Eye::Left, Edge::End), -0.6);
        state.adjust_crop_edge(CropBound::Horizontal(Eye::Left, Edge::Start), 0.8);
        assert_abs_diff_eq!(state.h_crop_for(Eye::Left)[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(state.h_crop_for(Eye::Left)[1], 0.4, epsilon = 1e-12);
        assert_eq!(state.h_crop_for(Eye::Right), [0.0, 1.0]);
        assert!(state.dirty);
    }

    #[test]
    fn test_zoom_floor() {
        let mut state = GeometryState::new();
        for _ in 0..100 {
            state.zoom_at((10.0, 10.0), (50.0, 50.0), -800.0);
        }
        assert_eq!(state.scale, MIN_SCALE);
    }

    #[test]
    fn test_zoom_holds_cursor_point() {
        let mut state = GeometryState::new();
        state.set_scale(0.8);
        state.set_pan(13.0, -7.0);
        let center = (400.0, 300.0);
        let cursor = (520.0, 180.0);

        // World point currently under the cursor.
        let world = (
            (cursor.0 - center.0 - state.pan.0) / state.scale,
            (cursor.1 - center.1 - state.pan.1) / state.scale,
        );
        state.zoom_at(cursor, center, 240.0);
        let device = (
            world.0 * state.scale + center.0 + state.pan.0,
            world.1 * state.scale + center.1 + state.pan.1,
        );
        assert_abs_diff_eq!(device.0, cursor.0, epsilon = 1e-9);
        assert_abs_diff_eq!(device.1, cursor.1, epsilon = 1e-9);
    }

    #[test]
    fn test_view_changes_do_not_dirty() {
        let mut state = GeometryState::new();
        state.adjust_pan(5.0, 5.0);
        state.zoom_at((0.0, 0.0), (0.0, 0.0), 120.0);
        state.reset_view();
        assert!(!state.dirty);
        assert_eq!(state.scale, 1.0);
        assert_eq!(state.pan, (0.0, 0.0));
    }

    #[test]
    fn test_mark_saved_respects_later_edits() {
        let mut state = GeometryState::new();
        state.adjust_parallax(2.0);
        let snapshot = state.revision();
        state.adjust_vertical_alignment(0.01);
        state.mark_saved(snapshot);
        assert!(state.dirty);
        state.mark_saved(state.revision());
        assert!(!state.dirty);
    }

    #[test]
    fn test_eye_v_bounds_with_alignment() {
        let mut state = GeometryState::new();
        state.set_crop([0.1, 0.9], [[0.0, 1.0], [0.0, 1.0]]);
        state.adjust_vertical_alignment(0.1);
        let (lt, lb) = state.eye_v_bounds(Eye::Left);
        let (rt, rb) = state.eye_v_bounds(Eye::Right);
        assert_abs_diff_eq!(lt, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(lb, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(rt, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(rb, 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(state.aligned_height(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_excess_alignment_is_clamped() {
        let mut state = GeometryState::new();
        state.set_crop([0.4, 0.6], [[0.0, 1.0], [0.0, 1.0]]);
        state.adjust_vertical_alignment(-3.0);
        assert_abs_diff_eq!(state.aligned_height(), 0.0, epsilon = 1e-12);
        for eye in Eye::BOTH {
            let (top, bottom) = state.eye_v_bounds(eye);
            assert!(top >= 0.4 - 1e-12 && bottom <= 0.6 + 1e-12);
            assert_abs_diff_eq!(top, bottom, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_set_crop_orders_and_clamps() {
        let mut state = GeometryState::new();
        state.set_crop([0.8, 0.2], [[-1.0, 0.5], [0.3, 4.0]]);
        assert_eq!(state.v_crop(), [0.2, 0.8]);
        assert_eq!(state.h_crop(), [[0.0, 0.5], [0.3, 1.0]]);
    }

    #[test]
    fn test_background_palette_roundtrip() {
        for bg in Background::ALL {
            assert_eq!(Background::from_rgb(bg.rgb()), Some(bg));
        }
        assert_eq!(Background::from_rgb(0x123456), None);
        assert_eq!(Background::White.next(), Background::Black);
        assert_eq!(Background::Grey.channels(), [0x80, 0x80, 0x80]);
    }

    #[test]
    fn test_fit_to_surface() {
        let mut state = GeometryState::new();
        state.set_pan(3.0, 4.0);
        state.fit_to_surface((4000.0, 3000.0), (800.0, 800.0));
        assert_abs_diff_eq!(state.scale, 0.2, epsilon = 1e-12);
        assert_eq!(state.pan, (0.0, 0.0));
    }

    #[test]
    fn test_set_parallax() {
        let mut state = GeometryState::new();
        state.set_parallax(0.0);
        assert!(!state.dirty);
        assert_eq!(state.revision(), 0);

        state.adjust_parallax(12.5);
        let revision = state.revision();
        state.set_parallax(0.0);
        assert_eq!(state.parallax, 0.0);
        assert!(state.dirty);
        assert_eq!(state.revision(), revision + 1);
    }
}
