// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Composite construction for export.
//!
//! The two cropped and aligned eyes are pasted into a double-width canvas:
//! the right eye fills the left half and the left eye the right half. One
//! eye sits flush against the inner edge of its half; the other is pushed
//! outward by the net parallax and crop asymmetry.

use crate::models::geometry::{Eye, GeometryState};
use image::{imageops, Rgb, RgbImage};

/// Slack absorbed before rounding a width up, so that fractions which are
/// exact on paper do not gain a pixel from float error.
const WIDTH_TOLERANCE: f64 = 1e-9;

/// Horizontal placement of each eye inside its half, as fractions of the
/// source width. Both are non-negative and at least one is zero.
pub fn compute_horizontal_offsets(h_crop: [[f64; 2]; 2], parallax: f64) -> (f64, f64) {
    let left = h_crop[0][0] - parallax / 200.0;
    let right = h_crop[1][0];
    let min = left.min(right);
    (left - min, right - min)
}

/// Pixel width of one half of the composite.
pub fn compute_output_width(h_crop: [[f64; 2]; 2], offsets: (f64, f64), source_width: u32) -> u32 {
    let left = h_crop[0][1] - h_crop[0][0] + offsets.0;
    let right = h_crop[1][1] - h_crop[1][0] + offsets.1;
    let width = left.max(right) * source_width as f64;
    (width - WIDTH_TOLERANCE).ceil().max(0.0) as u32
}

/// Build the exported side-by-side composite from the two full-resolution
/// eye images. `state.swap_eyes` exchanges the inputs first.
pub fn compose(left: &RgbImage, right: &RgbImage, state: &GeometryState) -> RgbImage {
    let (left, right) = if state.swap_eyes { (right, left) } else { (left, right) };
    let (source_w, source_h) = left.dimensions();

    let h_crop = state.h_crop();
    let offsets = compute_horizontal_offsets(h_crop, state.parallax);
    let half = compute_output_width(h_crop, offsets, source_w);
    let height = (state.aligned_height() * source_h as f64).round() as u32;

    let [r, g, b] = state.background.channels();
    let mut canvas = RgbImage::from_pixel(half * 2, height, Rgb([r, g, b]));
    if height == 0 || half == 0 {
        return canvas;
    }

    for (eye, image, offset, side) in [
        (Eye::Left, left, offsets.0, half),
        (Eye::Right, right, offsets.1, 0),
    ] {
        let [u0, u1] = state.h_crop_for(eye);
        let (top, _) = state.eye_v_bounds(eye);
        let (w, h) = image.dimensions();

        let x0 = ((u0 * w as f64).round() as u32).min(w);
        let x1 = ((u1 * w as f64).round() as u32).clamp(x0, w);
        let y0 = ((top * h as f64).round() as u32).min(h);
        let dest_x = (offset * source_w as f64).round() as u32;

        // Keep each eye inside its own half of the canvas.
        let width = (x1 - x0).min(half.saturating_sub(dest_x));
        let rows = height.min(h - y0);
        if width == 0 || rows == 0 {
            continue;
        }

        let cropped = imageops::crop_imm(image, x0, y0, width, rows).to_image();
        imageops::replace(&mut canvas, &cropped, i64::from(side + dest_x), 0);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::{Background, CropBound, Edge};
    use approx::assert_abs_diff_eq;

    const FULL: [[f64; 2]; 2] = [[0.0, 1.0], [0.0, 1.0]];

    fn solid(w: u32, h: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([value, value, value]))
    }

    #[test]
    fn test_offsets_identity() {
        assert_eq!(compute_horizontal_offsets(FULL, 0.0), (0.0, 0.0));
        assert_eq!(compute_output_width(FULL, (0.0, 0.0), 100), 100);
    }

    #[test]
    fn test_offsets_with_parallax() {
        let offsets = compute_horizontal_offsets(FULL, 20.0);
        assert_abs_diff_eq!(offsets.0, 0.0);
        assert_abs_diff_eq!(offsets.1, 0.1, epsilon = 1e-12);
        assert_eq!(compute_output_width(FULL, offsets, 100), 110);
    }

    #[test]
    fn test_offsets_never_negative() {
        let crops = [[[0.2, 0.9], [0.0, 0.7]], [[0.0, 0.5], [0.4, 1.0]], FULL];
        for h_crop in crops {
            for parallax in [-50.0, -3.3, 0.0, 7.5, 80.0] {
                let (l, r) = compute_horizontal_offsets(h_crop, parallax);
                assert!(l >= 0.0 && r >= 0.0);
                assert_eq!(l.min(r), 0.0);
            }
        }
    }

    #[test]
    fn test_compose_identity_layout() {
        let left = solid(100, 100, 10);
        let right = solid(100, 100, 200);
        let out = compose(&left, &right, &GeometryState::new());

        assert_eq!(out.dimensions(), (200, 100));
        // Right eye in the left half, left eye in the right half.
        assert_eq!(out.get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(out.get_pixel(99, 99).0, [200, 200, 200]);
        assert_eq!(out.get_pixel(100, 0).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(199, 99).0, [10, 10, 10]);
    }

    #[test]
    fn test_compose_parallax_extends_canvas() {
        let left = solid(100, 100, 10);
        let right = solid(100, 100, 200);
        let mut state = GeometryState::new();
        state.adjust_parallax(20.0);
        state.background = Background::White;
        let out = compose(&left, &right, &state);

        assert_eq!(out.dimensions(), (220, 100));
        // Right eye pushed out by 10 px, background before it.
        assert_eq!(out.get_pixel(9, 50).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(10, 50).0, [200, 200, 200]);
        // Left eye flush at the start of the right half.
        assert_eq!(out.get_pixel(110, 50).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(209, 50).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(210, 50).0, [255, 255, 255]);
    }

    #[test]
    fn test_compose_vertical_alignment_picks_rows() {
        // Row index encoded in the red channel.
        let gradient = RgbImage::from_fn(10, 100, |_, y| Rgb([y as u8, 0, 0]));
        let mut state = GeometryState::new();
        state.adjust_vertical_alignment(0.1);
        let out = compose(&gradient, &gradient, &state);

        assert_eq!(out.dimensions(), (20, 90));
        // Left eye (right half) starts at row 0, right eye at row 10.
        assert_eq!(out.get_pixel(10, 0).0[0], 0);
        assert_eq!(out.get_pixel(0, 0).0[0], 10);
        assert_eq!(out.get_pixel(0, 89).0[0], 99);
    }

    #[test]
    fn test_compose_swap_eyes() {
        let left = solid(4, 4, 10);
        let right = solid(4, 4, 200);
        let mut state = GeometryState::new();
        state.toggle_swap_eyes();
        let out = compose(&left, &right, &state);
        assert_eq!(out.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(4, 0).0, [200, 200, 200]);
    }

    #[test]
    fn test_compose_fully_cropped_is_empty() {
        let img = solid(10, 10, 1);
        let mut state = GeometryState::new();
        state.adjust_crop_edge(CropBound::Vertical(Edge::End), -1.0);
        let out = compose(&img, &img, &state);
        assert_eq!(out.height(), 0);
    }
}
