// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Output layout mapping.
//!
//! Each split layout gives every eye a normalized viewport on the device
//! surface. Rendering maps canonical (un-split) coordinates into those
//! viewports; input handling maps device coordinates back out of them.

use crate::models::geometry::{Eye, OutputFormat};
use crate::util::geometry::Rect;

/// Normalized per-eye viewports, or `None` when the whole surface is used
/// for both eyes (hardware interleaving).
fn viewport_table(format: OutputFormat) -> Option<[Rect; 2]> {
    match format {
        OutputFormat::SideBySideFull => Some([
            Rect::new(0.0, 0.0, 0.5, 1.0),
            Rect::new(0.5, 0.0, 0.5, 1.0),
        ]),
        OutputFormat::SideBySideHalf => Some([
            Rect::new(0.0, 0.25, 0.5, 0.5),
            Rect::new(0.5, 0.25, 0.5, 0.5),
        ]),
        OutputFormat::TopBottomFull => Some([
            Rect::new(0.0, 0.0, 1.0, 0.5),
            Rect::new(0.0, 0.5, 1.0, 0.5),
        ]),
        OutputFormat::TopBottomHalf => Some([
            Rect::new(0.25, 0.0, 0.5, 0.5),
            Rect::new(0.25, 0.5, 0.5, 0.5),
        ]),
        OutputFormat::Mono => Some([Rect::new(0.0, 0.0, 1.0, 1.0), Rect::default()]),
        OutputFormat::NativeStereo => None,
    }
}

/// Layouts whose second eye sits beside or below the first one.
fn is_split(format: OutputFormat) -> bool {
    matches!(
        format,
        OutputFormat::SideBySideFull
            | OutputFormat::SideBySideHalf
            | OutputFormat::TopBottomFull
            | OutputFormat::TopBottomHalf
    )
}

/// Pixel viewport of `eye` on a `width` x `height` surface.
pub fn viewport_for(format: OutputFormat, eye: Eye, width: f64, height: f64) -> Rect {
    match viewport_table(format) {
        Some(table) => table[eye.index()].denormalize(width, height),
        None => Rect::new(0.0, 0.0, width, height),
    }
}

/// Whether `eye` is drawn at all in this layout.
pub fn renders_eye(format: OutputFormat, eye: Eye) -> bool {
    !viewport_for(format, eye, 1.0, 1.0).is_degenerate()
}

/// Map a device pixel back into the canonical surface space.
pub fn device_to_canonical(
    format: OutputFormat,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> (f64, f64) {
    let Some(table) = viewport_table(format) else {
        return (x, y);
    };
    let left = table[0];
    let mut cx = (x - left.x * width) / left.w;
    let mut cy = (y - left.y * height) / left.h;
    if is_split(format) {
        if cx >= width {
            cx -= width;
        }
        if cy >= height {
            cy -= height;
        }
    }
    (cx, cy)
}

/// Convert a device-space pointer delta into canonical units.
pub fn scale_delta(format: OutputFormat, dx: f64, dy: f64) -> (f64, f64) {
    match viewport_table(format) {
        Some(table) => (dx / table[0].w, dy / table[0].h),
        None => (dx, dy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_viewports() {
        let r = viewport_for(OutputFormat::SideBySideHalf, Eye::Right, 1920.0, 1080.0);
        assert_eq!(r, Rect::new(960.0, 270.0, 960.0, 540.0));

        let r = viewport_for(OutputFormat::TopBottomHalf, Eye::Left, 1920.0, 1080.0);
        assert_eq!(r, Rect::new(480.0, 0.0, 960.0, 540.0));

        let r = viewport_for(OutputFormat::NativeStereo, Eye::Right, 1920.0, 1080.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 1920.0, 1080.0));

        assert!(renders_eye(OutputFormat::Mono, Eye::Left));
        assert!(!renders_eye(OutputFormat::Mono, Eye::Right));
    }

    #[test]
    fn test_device_to_canonical_side_by_side() {
        let (x, y) = device_to_canonical(OutputFormat::SideBySideFull, 100.0, 50.0, 800.0, 600.0);
        assert_abs_diff_eq!(x, 200.0);
        assert_abs_diff_eq!(y, 50.0);

        // Same canonical point seen through the right-eye half.
        let (x, y) = device_to_canonical(OutputFormat::SideBySideFull, 500.0, 50.0, 800.0, 600.0);
        assert_abs_diff_eq!(x, 200.0);
        assert_abs_diff_eq!(y, 50.0);
    }

    #[test]
    fn test_device_to_canonical_top_bottom_half() {
        let (x, y) = device_to_canonical(OutputFormat::TopBottomHalf, 400.0, 450.0, 800.0, 600.0);
        assert_abs_diff_eq!(x, 400.0);
        assert_abs_diff_eq!(y, 300.0);
    }

    #[test]
    fn test_device_to_canonical_inverts_viewport() {
        let (w, h) = (1280.0, 720.0);
        for format in OutputFormat::ALL {
            for eye in Eye::BOTH {
                if !renders_eye(format, eye) {
                    continue;
                }
                let vp = viewport_for(format, eye, w, h);
                let (dx, dy) = vp.map_point(321.0, 123.0, w, h);
                let (cx, cy) = device_to_canonical(format, dx, dy, w, h);
                assert_abs_diff_eq!(cx, 321.0, epsilon = 1e-9);
                assert_abs_diff_eq!(cy, 123.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_scale_delta() {
        assert_eq!(scale_delta(OutputFormat::SideBySideFull, 10.0, 10.0), (20.0, 10.0));
        assert_eq!(scale_delta(OutputFormat::TopBottomHalf, 10.0, 10.0), (20.0, 20.0));
        assert_eq!(scale_delta(OutputFormat::Mono, 10.0, 10.0), (10.0, 10.0));
        assert_eq!(scale_delta(OutputFormat::NativeStereo, 3.0, 4.0), (3.0, 4.0));
    }
}
