// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive transform engine.
//!
//! Turns discrete key and pointer events into geometry edits through a
//! small edit-mode state machine, and derives the per-eye destination and
//! source-sample rectangles used by the preview.

use super::output_format::{device_to_canonical, scale_delta};
use crate::models::geometry::{CropBound, Edge, Eye, GeometryState};
use crate::util::geometry::Rect;

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Default,
    Parallax,
    Crop,
    CropLeft,
    CropRight,
    CropTop,
    CropBottom,
    VerticalAlign,
}

impl EditMode {
    /// The hold key that keeps this mode active.
    fn hold_key(self) -> Option<HoldKey> {
        match self {
            EditMode::Default => None,
            EditMode::Parallax => Some(HoldKey::Parallax),
            EditMode::Crop
            | EditMode::CropLeft
            | EditMode::CropRight
            | EditMode::CropTop
            | EditMode::CropBottom => Some(HoldKey::Crop),
            EditMode::VerticalAlign => Some(HoldKey::VerticalAlign),
        }
    }

    fn is_crop_edge(self) -> bool {
        matches!(
            self,
            EditMode::CropLeft | EditMode::CropRight | EditMode::CropTop | EditMode::CropBottom
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            EditMode::Default => "Pan",
            EditMode::Parallax => "Parallax",
            EditMode::Crop => "Crop",
            EditMode::CropLeft => "Crop left",
            EditMode::CropRight => "Crop right",
            EditMode::CropTop => "Crop top",
            EditMode::CropBottom => "Crop bottom",
            EditMode::VerticalAlign => "Vertical alignment",
        }
    }
}

/// Keys that select a mode for as long as they are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldKey {
    Parallax,
    Crop,
    VerticalAlign,
}

impl HoldKey {
    fn mode(self) -> EditMode {
        match self {
            HoldKey::Parallax => EditMode::Parallax,
            HoldKey::Crop => EditMode::Crop,
            HoldKey::VerticalAlign => EditMode::VerticalAlign,
        }
    }
}

/// Pointer buttons held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub primary: bool,
    pub secondary: bool,
    pub tertiary: bool,
}

impl Buttons {
    pub const PRIMARY: Buttons = Buttons { primary: true, secondary: false, tertiary: false };
    pub const SECONDARY: Buttons = Buttons { primary: false, secondary: true, tertiary: false };
    pub const TERTIARY: Buttons = Buttons { primary: false, secondary: false, tertiary: true };

    pub fn any(&self) -> bool {
        self.primary || self.secondary || self.tertiary
    }
}

/// Input event in device pixels, relative to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: HoldKey, repeat: bool },
    KeyUp { key: HoldKey },
    PointerDown { pos: (f64, f64), buttons: Buttons },
    PointerMove { pos: (f64, f64), buttons: Buttons },
    PointerUp { pos: (f64, f64), buttons: Buttons },
    /// `delta` is in native wheel units (120 per notch).
    Wheel { pos: (f64, f64), delta: f64, navigate: bool },
}

/// Direction for stepping through related files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Something the engine cannot do by itself and hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    None,
    Navigate(Direction),
}

/// Sizes the engine needs to interpret device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    pub surface: (f64, f64),
    pub image: (f64, f64),
}

impl ViewContext {
    pub fn center(&self) -> (f64, f64) {
        (self.surface.0 / 2.0, self.surface.1 / 2.0)
    }
}

/// Destination rectangle and source-sample bounds of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRect {
    /// Destination in canonical surface pixels.
    pub dest: Rect,
    pub u1: f64,
    pub v1: f64,
    pub u2: f64,
    pub v2: f64,
}

/// Derive where `eye` is drawn and which part of its source is sampled.
pub fn compute_eye_rect(state: &GeometryState, eye: Eye, view: &ViewContext) -> EyeRect {
    let (image_w, image_h) = view.image;
    let [u1, u2] = state.h_crop_for(eye);
    let (v1, v2) = state.eye_v_bounds(eye);

    let x = (u1 + eye.sign() / 2.0 * state.parallax / 100.0) * image_w;
    let y = state.v_crop()[0] * image_h;
    let w = (u2 - u1) * image_w;
    let h = state.aligned_height() * image_h;

    let dest = Rect {
        x: x * state.scale + (view.surface.0 - image_w * state.scale) / 2.0 + state.pan.0,
        y: y * state.scale + (view.surface.1 - image_h * state.scale) / 2.0 + state.pan.1,
        w: w * state.scale,
        h: h * state.scale,
    };
    EyeRect { dest, u1, v1, u2, v2 }
}

/// Pick the crop edge nearest a press at canonical `pos`, from the position
/// of the press within `rect`.
pub fn select_crop_edge(rect: &Rect, pos: (f64, f64)) -> EditMode {
    if rect.is_degenerate() {
        let (cx, cy) = (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
        return if rect.w == 0.0 {
            if pos.0 < cx { EditMode::CropLeft } else { EditMode::CropRight }
        } else if pos.1 < cy {
            EditMode::CropTop
        } else {
            EditMode::CropBottom
        };
    }

    let xp = (pos.0 - rect.x) / rect.w;
    let yp = (pos.1 - rect.y) / rect.h;
    if xp < yp {
        if xp <= 1.0 - yp {
            EditMode::CropLeft
        } else {
            EditMode::CropBottom
        }
    } else if xp < 1.0 - yp {
        EditMode::CropTop
    } else {
        EditMode::CropRight
    }
}

/// Edit-mode state machine for one document.
#[derive(Debug, Default)]
pub struct TransformEngine {
    mode: EditMode,
    last_pointer: Option<(f64, f64)>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Forget any held key or drag, e.g. after the window loses focus.
    pub fn reset(&mut self) {
        self.mode = EditMode::Default;
        self.last_pointer = None;
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        state: &mut GeometryState,
        view: &ViewContext,
    ) -> EngineAction {
        match event {
            InputEvent::KeyDown { key, repeat } => {
                if !repeat {
                    self.mode = key.mode();
                }
            }
            InputEvent::KeyUp { key } => {
                if self.mode.hold_key() == Some(key) {
                    self.mode = EditMode::Default;
                }
            }
            InputEvent::PointerDown { pos, buttons } => {
                self.last_pointer = Some(pos);
                if self.mode == EditMode::Crop && buttons.any() {
                    self.mode = self.pick_crop_edge(pos, state, view);
                    log::debug!("crop edge: {:?}", self.mode);
                }
            }
            InputEvent::PointerMove { pos, buttons } => {
                let (dx, dy) = match self.last_pointer {
                    Some(last) => (pos.0 - last.0, pos.1 - last.1),
                    None => (0.0, 0.0),
                };
                self.last_pointer = Some(pos);
                self.drag(dx, dy, buttons, state, view);
            }
            InputEvent::PointerUp { pos, .. } => {
                self.last_pointer = Some(pos);
                if self.mode.is_crop_edge() {
                    self.mode = EditMode::Crop;
                }
            }
            InputEvent::Wheel { pos, delta, navigate } => {
                if navigate {
                    let direction = if delta > 0.0 { Direction::Previous } else { Direction::Next };
                    return EngineAction::Navigate(direction);
                }
                let at = device_to_canonical(
                    state.output_format,
                    pos.0,
                    pos.1,
                    view.surface.0,
                    view.surface.1,
                );
                state.zoom_at(at, view.center(), delta);
            }
        }
        EngineAction::None
    }

    fn pick_crop_edge(&self, pos: (f64, f64), state: &GeometryState, view: &ViewContext) -> EditMode {
        let at = device_to_canonical(state.output_format, pos.0, pos.1, view.surface.0, view.surface.1);
        let left = compute_eye_rect(state, Eye::Left, view).dest;
        let right = compute_eye_rect(state, Eye::Right, view).dest;
        select_crop_edge(&left.union(&right), at)
    }

    fn drag(&self, dx: f64, dy: f64, buttons: Buttons, state: &mut GeometryState, view: &ViewContext) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let (sdx, sdy) = scale_delta(state.output_format, dx, dy);
        let dix = sdx / state.scale / view.image.0;
        let diy = sdy / state.scale / view.image.1;

        match self.mode {
            EditMode::Default => {
                if buttons.primary {
                    state.adjust_pan(sdx, sdy);
                }
                if buttons.tertiary {
                    state.adjust_parallax(diy * 100.0);
                }
            }
            EditMode::Parallax => {
                if buttons.primary {
                    state.adjust_parallax(dix * 200.0);
                } else if buttons.secondary {
                    state.adjust_parallax(-dix * 200.0);
                }
            }
            EditMode::VerticalAlign => {
                if buttons.primary {
                    state.adjust_vertical_alignment(diy * 2.0);
                } else if buttons.secondary {
                    state.adjust_vertical_alignment(-diy * 2.0);
                }
            }
            EditMode::CropTop => state.adjust_crop_edge(CropBound::Vertical(Edge::Start), diy),
            EditMode::CropBottom => state.adjust_crop_edge(CropBound::Vertical(Edge::End), diy),
            EditMode::CropLeft => drag_horizontal_crop(state, Edge::Start, buttons, dix, diy),
            EditMode::CropRight => drag_horizontal_crop(state, Edge::End, buttons, dix, diy),
            EditMode::Crop => {}
        }
    }
}

/// Primary drags move both eyes' edge together; secondary drags move them
/// apart vertically-scaled, shifting the edge in depth.
fn drag_horizontal_crop(state: &mut GeometryState, edge: Edge, buttons: Buttons, dix: f64, diy: f64) {
    if buttons.primary {
        for eye in Eye::BOTH {
            state.adjust_crop_edge(CropBound::Horizontal(eye, edge), dix);
        }
    } else if buttons.secondary {
        state.adjust_crop_edge(CropBound::Horizontal(Eye::Left, edge), diy / 4.0);
        state.adjust_crop_edge(CropBound::Horizontal(Eye::Right, edge), -diy / 4.0);
    }
}
