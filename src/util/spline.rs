// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tensioned Catmull-Rom sampling for smooth curves.
//!
//! Control points are given in pixel space. The curve is sampled window by
//! window: every run of four consecutive (padded) control points produces
//! `segments + 1` samples, truncated to integer pixels. Nothing is cached
//! between calls, so sampling the same input twice gives the same output.

use super::geometry::PixelPoint;

/// Samples generated per pair of control points.
pub const DEFAULT_SEGMENTS: usize = 10;

/// First/last control points closer than this (in pixels) close the curve.
pub const CLOSE_THRESHOLD_PX: f64 = 10.0;

/// A Catmull-Rom spline through a set of control points.
///
/// `smoothness` is mapped to a tension of `1 - smoothness`: zero gives the
/// canonical curve, values near one flatten toward straight segments.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRom {
    control: Vec<PixelPoint>,
    /// Padded control points. Empty when there are fewer than three control
    /// points and the input is passed through unchanged.
    extended: Vec<PixelPoint>,
    smoothness: f64,
    segments: usize,
    closed: bool,
}

impl CatmullRom {
    /// Build a spline with the default segment count and close threshold.
    pub fn new(points: &[PixelPoint], smoothness: f64) -> Self {
        Self::build(points, smoothness, DEFAULT_SEGMENTS, CLOSE_THRESHOLD_PX)
    }

    /// Use `segments` samples per control-point pair (at least one).
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(1);
        self
    }

    /// Re-run closed-curve detection with a different pixel threshold.
    pub fn with_close_threshold(self, threshold_px: f64) -> Self {
        Self::build(&self.control, self.smoothness, self.segments, threshold_px)
    }

    fn build(points: &[PixelPoint], smoothness: f64, segments: usize, threshold_px: f64) -> Self {
        let control = points.to_vec();
        let mut closed = false;
        let extended = if control.len() < 3 {
            Vec::new()
        } else {
            let first = control[0];
            let last = control[control.len() - 1];
            if distance(first, last) < threshold_px {
                closed = true;
                // Drop the near-duplicate tail and close the loop on the first point.
                let mut ring: Vec<PixelPoint> = control[..control.len() - 1].to_vec();
                ring.push(first);
                let mut padded = Vec::with_capacity(ring.len() + 2);
                padded.push(ring[ring.len() - 2]);
                padded.extend_from_slice(&ring);
                padded.push(ring[1]);
                padded
            } else {
                let mut padded = Vec::with_capacity(control.len() + 2);
                padded.push(first);
                padded.extend_from_slice(&control);
                padded.push(last);
                padded
            }
        };

        Self {
            control,
            extended,
            smoothness,
            segments: segments.max(1),
            closed,
        }
    }

    /// Whether the first and last control points were joined into a loop.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The control points as given, before padding or closing.
    pub fn control_points(&self) -> &[PixelPoint] {
        &self.control
    }

    /// A fresh iterator over the sampled curve.
    pub fn samples(&self) -> Samples<'_> {
        Samples {
            spline: self,
            window: 0,
            step: 0,
        }
    }

    fn window_count(&self) -> usize {
        self.extended.len().saturating_sub(3)
    }

    fn evaluate(&self, window: usize, t: f64) -> PixelPoint {
        let p = &self.extended[window..window + 4];
        let tension = 1.0 - self.smoothness;
        let x = catmull_rom(
            [p[0].x as f64, p[1].x as f64, p[2].x as f64, p[3].x as f64],
            tension,
            t,
        );
        let y = catmull_rom(
            [p[0].y as f64, p[1].y as f64, p[2].y as f64, p[3].y as f64],
            tension,
            t,
        );
        PixelPoint::new(x as i64, y as i64)
    }
}

/// Iterator over the samples of a [`CatmullRom`] spline.
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    spline: &'a CatmullRom,
    window: usize,
    step: usize,
}

impl Iterator for Samples<'_> {
    type Item = PixelPoint;

    fn next(&mut self) -> Option<PixelPoint> {
        let spline = self.spline;
        if spline.extended.is_empty() {
            let point = spline.control.get(self.window).copied()?;
            self.window += 1;
            return Some(point);
        }

        if self.window >= spline.window_count() {
            return None;
        }
        let t = self.step as f64 / spline.segments as f64;
        let point = spline.evaluate(self.window, t);
        self.step += 1;
        if self.step > spline.segments {
            self.step = 0;
            self.window += 1;
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let spline = self.spline;
        let remaining = if spline.extended.is_empty() {
            spline.control.len().saturating_sub(self.window)
        } else {
            let per_window = spline.segments + 1;
            let windows_left = spline.window_count().saturating_sub(self.window);
            (windows_left * per_window).saturating_sub(self.step)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

/// Sample a smooth curve with default settings.
pub fn smooth_curve(points: &[PixelPoint], smoothness: f64) -> Vec<PixelPoint> {
    CatmullRom::new(points, smoothness).samples().collect()
}

fn catmull_rom(p: [f64; 4], tension: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p[1]
        + (-p[0] + p[2]) * tension * t
        + (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]) * tension * t2
        + (-p[0] + 3.0 * p[1] - 3.0 * p[2] + p[3]) * tension * t3)
}

fn distance(a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}
