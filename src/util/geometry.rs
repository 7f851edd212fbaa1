// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility types.
//!
//! Axis-aligned rectangles in either normalized (0.0 to 1.0) or pixel
//! coordinates, and conversions between the two.

/// An axis-aligned rectangle given by its origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Scale a normalized rectangle up to a surface of the given pixel size.
    pub fn denormalize(&self, width: f64, height: f64) -> Rect {
        Rect {
            x: self.x * width,
            y: self.y * height,
            w: self.w * width,
            h: self.h * height,
        }
    }

    /// Map a point from a `width` x `height` surface into this rectangle.
    pub fn map_point(&self, x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
        (self.x + x * self.w / width, self.y + y * self.h / height)
    }

    /// Map a rectangle from a `width` x `height` surface into this rectangle.
    pub fn map_rect(&self, rect: &Rect, width: f64, height: f64) -> Rect {
        let (x, y) = self.map_point(rect.x, rect.y, width, height);
        Rect {
            x,
            y,
            w: rect.w * self.w / width,
            h: rect.h * self.h / height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.w == 0.0 || self.h == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denormalize() {
        let r = Rect::new(0.5, 0.25, 0.5, 0.5).denormalize(1920.0, 1080.0);
        assert_eq!(r, Rect::new(960.0, 270.0, 960.0, 540.0));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 10.0, 10.0, 10.0);
        let b = Rect::new(5.0, 0.0, 10.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 20.0));
    }

    #[test]
    fn test_map_rect_into_right_half() {
        let viewport = Rect::new(960.0, 0.0, 960.0, 1080.0);
        let mapped = viewport.map_rect(&Rect::new(0.0, 0.0, 1920.0, 1080.0), 1920.0, 1080.0);
        assert_eq!(mapped, viewport);
    }
}
