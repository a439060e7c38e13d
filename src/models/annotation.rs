// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the four annotation entities (keypoints, polylines,
//! smooth curves and bounding boxes). All spatial values are normalized to
//! the image size; pixel positions are projections computed on demand.

use crate::util::geometry::{self, ImageSize, PixelPoint, PixelRect, YoloBox};
use crate::util::spline::CatmullRom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point with normalized coordinates (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x_norm: f64,
    pub y_norm: f64,
}

impl Point {
    pub fn new(x_norm: f64, y_norm: f64) -> Self {
        Self { x_norm, y_norm }
    }
}

/// Type of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Keypoint,
    Polyline,
    SmoothCurve,
    BoundingBox,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 4] = [
        AnnotationKind::Keypoint,
        AnnotationKind::Polyline,
        AnnotationKind::SmoothCurve,
        AnnotationKind::BoundingBox,
    ];
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationKind::Keypoint => "keypoint",
            AnnotationKind::Polyline => "curve",
            AnnotationKind::SmoothCurve => "smooth_curve",
            AnnotationKind::BoundingBox => "bbox",
        };
        f.write_str(name)
    }
}

/// A single labeled point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub id: u32,
    pub x_norm: f64,
    pub y_norm: f64,
}

impl Keypoint {
    /// Position as a normalized [`Point`].
    pub fn point(&self) -> Point {
        Point::new(self.x_norm, self.y_norm)
    }

    /// Truncated pixel position on an image of `size`.
    pub fn to_pixel(&self, size: ImageSize) -> PixelPoint {
        geometry::to_pixel(self.point(), size)
    }
}

/// An implicitly closed polygon; the last point joins the first when drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub id: u32,
    pub points: Vec<Point>,
}

impl Polyline {
    /// Vertices projected to truncated pixels on an image of `size`.
    pub fn pixel_points(&self, size: ImageSize) -> Vec<PixelPoint> {
        project(&self.points, size)
    }
}

/// Control points plus the smoothness used when the curve is sampled.
///
/// The stored points are the control points themselves; the spline is only
/// evaluated at draw or export time.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothCurve {
    pub id: u32,
    pub control_points: Vec<Point>,
    pub smoothness: f64,
}

impl SmoothCurve {
    /// Control points projected to truncated pixels on an image of `size`.
    pub fn pixel_control_points(&self, size: ImageSize) -> Vec<PixelPoint> {
        project(&self.control_points, size)
    }

    /// Spline built from the control points projected into `size`.
    pub fn spline(&self, size: ImageSize) -> CatmullRom {
        CatmullRom::new(&self.pixel_control_points(size), self.smoothness)
    }

    /// Sampled curve in pixel space with default sampling.
    pub fn render(&self, size: ImageSize) -> Vec<PixelPoint> {
        self.spline(size).samples().collect()
    }
}

/// Bounding box in normalized center/size ("YOLO") form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// The stored center/size values as a [`YoloBox`].
    pub fn yolo(&self) -> YoloBox {
        YoloBox {
            x_center: self.x_center,
            y_center: self.y_center,
            width: self.width,
            height: self.height,
        }
    }

    /// Truncated pixel corners on an image of `size`.
    pub fn corners(&self, size: ImageSize) -> PixelRect {
        geometry::yolo_to_corners(self.yolo(), size)
    }
}

/// Any annotation entity, tagged by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Keypoint(Keypoint),
    Polyline(Polyline),
    SmoothCurve(SmoothCurve),
    BoundingBox(BoundingBox),
}

impl Annotation {
    /// Id within the entity's own type.
    pub fn id(&self) -> u32 {
        match self {
            Annotation::Keypoint(k) => k.id,
            Annotation::Polyline(p) => p.id,
            Annotation::SmoothCurve(c) => c.id,
            Annotation::BoundingBox(b) => b.id,
        }
    }

    /// Which collection the entity belongs to.
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Keypoint(_) => AnnotationKind::Keypoint,
            Annotation::Polyline(_) => AnnotationKind::Polyline,
            Annotation::SmoothCurve(_) => AnnotationKind::SmoothCurve,
            Annotation::BoundingBox(_) => AnnotationKind::BoundingBox,
        }
    }

    /// Short list-view label, e.g. `3 points (smoothness: 0.40)`.
    pub fn summary(&self, size: ImageSize) -> String {
        match self {
            Annotation::Keypoint(k) => {
                let p = k.to_pixel(size);
                format!("({}, {})", p.x, p.y)
            }
            Annotation::Polyline(p) => format!("{} points", p.points.len()),
            Annotation::SmoothCurve(c) => format!(
                "{} points (smoothness: {:.2})",
                c.control_points.len(),
                c.smoothness
            ),
            Annotation::BoundingBox(b) => {
                let r = b.corners(size);
                format!("({}, {}) - ({}, {})", r.x1, r.y1, r.x2, r.y2)
            }
        }
    }
}

fn project(points: &[Point], size: ImageSize) -> Vec<PixelPoint> {
    points.iter().map(|p| geometry::to_pixel(*p, size)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_projections() {
        let size = ImageSize::new(800, 600).unwrap();
        let kp = Keypoint {
            id: 1,
            x_norm: 0.5,
            y_norm: 0.25,
        };
        assert_eq!(kp.to_pixel(size), PixelPoint::new(400, 150));

        let bbox = BoundingBox {
            id: 1,
            x_center: 0.5,
            y_center: 0.5,
            width: 0.25,
            height: 0.5,
        };
        let rect = bbox.corners(size);
        assert_eq!((rect.x1, rect.y1, rect.x2, rect.y2), (300, 150, 500, 450));
    }

    #[test]
    fn test_smooth_curve_render_reprojects() {
        let curve = SmoothCurve {
            id: 1,
            control_points: vec![Point::new(0.0, 0.0), Point::new(0.5, 0.5)],
            smoothness: 0.4,
        };
        let small = ImageSize::new(100, 100).unwrap();
        let large = ImageSize::new(1000, 1000).unwrap();
        assert_eq!(curve.render(small), vec![PixelPoint::new(0, 0), PixelPoint::new(50, 50)]);
        assert_eq!(curve.render(large), vec![PixelPoint::new(0, 0), PixelPoint::new(500, 500)]);
    }

    #[test]
    fn test_kind_labels() {
        let labels: Vec<String> = AnnotationKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, ["keypoint", "curve", "smooth_curve", "bbox"]);
    }

    #[test]
    fn test_summary() {
        let size = ImageSize::new(800, 600).unwrap();
        let curve = Annotation::SmoothCurve(SmoothCurve {
            id: 2,
            control_points: vec![Point::new(0.1, 0.1); 3],
            smoothness: 0.4,
        });
        assert_eq!(curve.summary(size), "3 points (smoothness: 0.40)");
        assert_eq!(curve.kind(), AnnotationKind::SmoothCurve);
        assert_eq!(curve.id(), 2);
    }

    #[test]
    fn test_render_far_outside_image() {
        let curve = SmoothCurve {
            id: 1,
            control_points: vec![
                Point::new(-1e300, 0.5),
                Point::new(0.5, 1e300),
                Point::new(1e300, -1e300),
            ],
            smoothness: 0.4,
        };
        let size = ImageSize::new(100, 100).unwrap();
        let samples = curve.render(size);
        assert_eq!(samples.len(), 22);
        assert_eq!(samples[0], PixelPoint::new(i64::MIN, 50));
    }
}
