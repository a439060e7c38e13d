// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides utilities for coordinate transformations between
//! pixel coordinates and normalized coordinates. Normalized values are the
//! only ones that get stored; pixel values are always derived from them and
//! the current [`ImageSize`].

use crate::error::{AnnotationError, Result};
use crate::models::annotation::Point;

/// Pixel dimensions of the active image.
///
/// Construction rejects zero sizes, so every transform taking an
/// `ImageSize` is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// Create a validated image size.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnnotationError::InvalidImageDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels, never zero.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels, never zero.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// An integer pixel position, as produced by truncating a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in pixel space with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl PixelRect {
    /// Horizontal span in pixels, saturating at the `i64` range.
    pub fn width(&self) -> i64 {
        self.x2.saturating_sub(self.x1)
    }

    /// Vertical span in pixels, saturating at the `i64` range.
    pub fn height(&self) -> i64 {
        self.y2.saturating_sub(self.y1)
    }
}

/// Center/size box encoding, all values normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn to_normalized(px: f64, py: f64, size: ImageSize) -> Point {
    Point {
        x_norm: px / size.width as f64,
        y_norm: py / size.height as f64,
    }
}

/// Convert normalized coordinates to pixel coordinates, truncating.
pub fn to_pixel(point: Point, size: ImageSize) -> PixelPoint {
    PixelPoint {
        x: (point.x_norm * size.width as f64) as i64,
        y: (point.y_norm * size.height as f64) as i64,
    }
}

/// Convert corner form to center/size form. The caller orders the corners.
pub fn corners_to_yolo(x1: f64, y1: f64, x2: f64, y2: f64, size: ImageSize) -> YoloBox {
    let w = size.width as f64;
    let h = size.height as f64;
    YoloBox {
        x_center: (x1 + x2) / (2.0 * w),
        y_center: (y1 + y2) / (2.0 * h),
        width: (x2 - x1) / w,
        height: (y2 - y1) / h,
    }
}

/// Convert center/size form back to truncated pixel corners.
pub fn yolo_to_corners(b: YoloBox, size: ImageSize) -> PixelRect {
    let w = size.width as f64;
    let h = size.height as f64;
    PixelRect {
        x1: ((b.x_center - b.width / 2.0) * w) as i64,
        y1: ((b.y_center - b.height / 2.0) * h) as i64,
        x2: ((b.x_center + b.width / 2.0) * w) as i64,
        y2: ((b.y_center + b.height / 2.0) * h) as i64,
    }
}
