// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-image annotation store.
//!
//! Owns the four entity collections for the active image and mediates all
//! mutation. Each collection carries its own id counter which only ever
//! moves forward, so an id is never handed out twice, even after deletes.

use super::annotation::{
    Annotation, AnnotationKind, BoundingBox, Keypoint, Point, Polyline, SmoothCurve,
};
use crate::error::{AnnotationError, Result};
use crate::util::geometry::{self, ImageSize};

/// Boxes whose pixel corners span fewer pixels than this are misclicks.
pub const MIN_BOX_SPAN_PX: i64 = 5;

/// Minimum number of points for polylines and smooth curves.
pub const MIN_CURVE_POINTS: usize = 2;

const BOUNDS_EPSILON: f64 = 1e-9;

trait Identified {
    fn id(&self) -> u32;
}

impl Identified for Keypoint {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Polyline {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for SmoothCurve {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for BoundingBox {
    fn id(&self) -> u32 {
        self.id
    }
}

/// Entities of one type in insertion order, plus the next id to assign.
///
/// `next_id` is `None` once `u32::MAX` has been handed out or restored.
#[derive(Debug, Clone)]
struct Collection<T> {
    kind: AnnotationKind,
    items: Vec<T>,
    next_id: Option<u32>,
}

impl<T: Identified> Collection<T> {
    fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            next_id: Some(1),
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(u32) -> T) -> Result<u32> {
        let id = self
            .next_id
            .ok_or(AnnotationError::IdSpaceExhausted(self.kind))?;
        self.next_id = id.checked_add(1);
        self.items.push(build(id));
        Ok(id)
    }

    /// Insert an entity that already has an id (e.g. read from disk).
    fn restore(&mut self, item: T) {
        self.next_id = match (self.next_id, item.id().checked_add(1)) {
            (Some(current), Some(after)) => Some(current.max(after)),
            _ => None,
        };
        self.items.push(item);
    }

    fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    fn clear(&mut self) {
        self.items.clear();
        self.next_id = Some(1);
    }
}

/// The annotations of the currently active image.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    keypoints: Collection<Keypoint>,
    polylines: Collection<Polyline>,
    smooth_curves: Collection<SmoothCurve>,
    bboxes: Collection<BoundingBox>,
    min_box_span: i64,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            keypoints: Collection::new(AnnotationKind::Keypoint),
            polylines: Collection::new(AnnotationKind::Polyline),
            smooth_curves: Collection::new(AnnotationKind::SmoothCurve),
            bboxes: Collection::new(AnnotationKind::BoundingBox),
            min_box_span: MIN_BOX_SPAN_PX,
        }
    }

    /// Override the misclick threshold used by [`add_bbox`](Self::add_bbox).
    pub fn with_min_box_span(mut self, pixels: i64) -> Self {
        self.min_box_span = pixels;
        self
    }

    /// Add a keypoint at a normalized position and return its id.
    pub fn add_keypoint(&mut self, x_norm: f64, y_norm: f64) -> Result<u32> {
        let id = self.keypoints.insert_with(|id| Keypoint { id, x_norm, y_norm })?;
        log::debug!("Added keypoint {} at ({:.4}, {:.4})", id, x_norm, y_norm);
        Ok(id)
    }

    /// Add a keypoint from a click position on an image of `size`.
    pub fn add_keypoint_px(&mut self, px: f64, py: f64, size: ImageSize) -> Result<u32> {
        let p = geometry::to_normalized(px, py, size);
        self.add_keypoint(p.x_norm, p.y_norm)
    }

    /// Add a polyline of at least two normalized points.
    pub fn add_polyline(&mut self, points: Vec<Point>) -> Result<u32> {
        check_point_count(points.len())?;
        let count = points.len();
        let id = self.polylines.insert_with(|id| Polyline { id, points })?;
        log::debug!("Added polyline {} with {} points", id, count);
        Ok(id)
    }

    /// Add a polyline from pixel clicks on an image of `size`.
    pub fn add_polyline_px(&mut self, points: &[(f64, f64)], size: ImageSize) -> Result<u32> {
        self.add_polyline(normalize_all(points, size))
    }

    /// Add a smooth curve; `smoothness` must lie in [0, 1].
    pub fn add_smooth_curve(&mut self, control_points: Vec<Point>, smoothness: f64) -> Result<u32> {
        check_point_count(control_points.len())?;
        if !(0.0..=1.0).contains(&smoothness) {
            return Err(AnnotationError::InvalidSmoothness(smoothness));
        }
        let count = control_points.len();
        let id = self.smooth_curves.insert_with(|id| SmoothCurve {
            id,
            control_points,
            smoothness,
        })?;
        log::debug!(
            "Added smooth curve {} with {} control points (smoothness {:.2})",
            id,
            count,
            smoothness
        );
        Ok(id)
    }

    /// Add a smooth curve from pixel clicks on an image of `size`.
    pub fn add_smooth_curve_px(
        &mut self,
        points: &[(f64, f64)],
        smoothness: f64,
        size: ImageSize,
    ) -> Result<u32> {
        self.add_smooth_curve(normalize_all(points, size), smoothness)
    }

    /// Add a bounding box given in normalized center/size form.
    ///
    /// The box must have positive extent, fit inside the image and span at
    /// least the minimum pixel size on both axes once projected to `size`.
    pub fn add_bbox(
        &mut self,
        x_center: f64,
        y_center: f64,
        width: f64,
        height: f64,
        size: ImageSize,
    ) -> Result<u32> {
        let candidate = BoundingBox {
            id: 0,
            x_center,
            y_center,
            width,
            height,
        };
        self.validate_bbox(&candidate, size)?;

        let id = self.bboxes.insert_with(|id| BoundingBox { id, ..candidate })?;
        log::debug!(
            "Added bbox {} at ({:.4}, {:.4}) size {:.4}x{:.4}",
            id,
            x_center,
            y_center,
            width,
            height
        );
        Ok(id)
    }

    /// Add a bounding box from a mouse drag between two pixel positions.
    pub fn add_bbox_from_drag(
        &mut self,
        start: (f64, f64),
        end: (f64, f64),
        size: ImageSize,
    ) -> Result<u32> {
        let (x1, x2) = (start.0.min(end.0), start.0.max(end.0));
        let (y1, y2) = (start.1.min(end.1), start.1.max(end.1));
        let yolo = geometry::corners_to_yolo(x1, y1, x2, y2, size);
        self.add_bbox(yolo.x_center, yolo.y_center, yolo.width, yolo.height, size)
    }

    fn validate_bbox(&self, bbox: &BoundingBox, size: ImageSize) -> Result<()> {
        let values = [bbox.x_center, bbox.y_center, bbox.width, bbox.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnnotationError::degenerate("non-finite coordinates"));
        }
        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            return Err(AnnotationError::degenerate(format!(
                "width and height must be positive, got {}x{}",
                bbox.width, bbox.height
            )));
        }
        if bbox.width > 1.0 || bbox.height > 1.0 {
            return Err(AnnotationError::degenerate(format!(
                "box larger than the image: {}x{}",
                bbox.width, bbox.height
            )));
        }
        let left = bbox.x_center - bbox.width / 2.0;
        let top = bbox.y_center - bbox.height / 2.0;
        let right = bbox.x_center + bbox.width / 2.0;
        let bottom = bbox.y_center + bbox.height / 2.0;
        if left < -BOUNDS_EPSILON
            || top < -BOUNDS_EPSILON
            || right > 1.0 + BOUNDS_EPSILON
            || bottom > 1.0 + BOUNDS_EPSILON
        {
            return Err(AnnotationError::degenerate("box extends outside the image"));
        }

        let rect = bbox.corners(size);
        if rect.width() < self.min_box_span || rect.height() < self.min_box_span {
            return Err(AnnotationError::degenerate(format!(
                "box spans {}x{} px, minimum is {} px",
                rect.width(),
                rect.height(),
                self.min_box_span
            )));
        }
        Ok(())
    }

    /// Remove the entity of `kind` with `id`. Returns whether anything was
    /// removed; a missing id is not an error.
    pub fn remove(&mut self, kind: AnnotationKind, id: u32) -> bool {
        let removed = match kind {
            AnnotationKind::Keypoint => self.keypoints.remove(id),
            AnnotationKind::Polyline => self.polylines.remove(id),
            AnnotationKind::SmoothCurve => self.smooth_curves.remove(id),
            AnnotationKind::BoundingBox => self.bboxes.remove(id),
        };
        if removed {
            log::debug!("Removed {} {}", kind, id);
        }
        removed
    }

    /// Empty every collection and reset the id counters.
    pub fn clear(&mut self) {
        self.keypoints.clear();
        self.polylines.clear();
        self.smooth_curves.clear();
        self.bboxes.clear();
    }

    /// Entities of `kind` in insertion order.
    pub fn list(&self, kind: AnnotationKind) -> Vec<Annotation> {
        match kind {
            AnnotationKind::Keypoint => self
                .keypoints
                .items
                .iter()
                .copied()
                .map(Annotation::Keypoint)
                .collect(),
            AnnotationKind::Polyline => self
                .polylines
                .items
                .iter()
                .cloned()
                .map(Annotation::Polyline)
                .collect(),
            AnnotationKind::SmoothCurve => self
                .smooth_curves
                .items
                .iter()
                .cloned()
                .map(Annotation::SmoothCurve)
                .collect(),
            AnnotationKind::BoundingBox => self
                .bboxes
                .items
                .iter()
                .copied()
                .map(Annotation::BoundingBox)
                .collect(),
        }
    }

    /// Keypoints in insertion order.
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints.items
    }

    /// Polylines in insertion order.
    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines.items
    }

    /// Smooth curves in insertion order.
    pub fn smooth_curves(&self) -> &[SmoothCurve] {
        &self.smooth_curves.items
    }

    /// Bounding boxes in insertion order.
    pub fn bboxes(&self) -> &[BoundingBox] {
        &self.bboxes.items
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.keypoints.items.len()
            + self.polylines.items.len()
            + self.smooth_curves.items.len()
            + self.bboxes.items.len()
    }

    /// True when no collection holds an entity.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an already-identified entity without validation.
    ///
    /// Used when reading persisted records; the id counter of the matching
    /// collection moves past the restored id.
    pub(crate) fn restore(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::Keypoint(k) => self.keypoints.restore(k),
            Annotation::Polyline(p) => self.polylines.restore(p),
            Annotation::SmoothCurve(c) => self.smooth_curves.restore(c),
            Annotation::BoundingBox(b) => self.bboxes.restore(b),
        }
    }
}

fn check_point_count(actual: usize) -> Result<()> {
    if actual < MIN_CURVE_POINTS {
        return Err(AnnotationError::InsufficientPoints {
            required: MIN_CURVE_POINTS,
            actual,
        });
    }
    Ok(())
}

fn normalize_all(points: &[(f64, f64)], size: ImageSize) -> Vec<Point> {
    points
        .iter()
        .map(|&(px, py)| geometry::to_normalized(px, py, size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> ImageSize {
        ImageSize::new(w, h).unwrap()
    }

    #[test]
    fn test_ids_are_assigned_in_order() {
        let mut store = AnnotationStore::new();
        assert_eq!(store.add_keypoint(0.1, 0.1).unwrap(), 1);
        assert_eq!(store.add_keypoint(0.2, 0.2).unwrap(), 2);
        // Each type has its own id space.
        let line = store
            .add_polyline(vec![Point::new(0.0, 0.0), Point::new(0.5, 0.5)])
            .unwrap();
        assert_eq!(line, 1);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = AnnotationStore::new();
        store.add_keypoint(0.1, 0.1).unwrap();
        store.add_keypoint(0.2, 0.2).unwrap();
        store.add_keypoint(0.3, 0.3).unwrap();
        assert!(store.remove(AnnotationKind::Keypoint, 1));

        let id = store.add_keypoint(0.4, 0.4).unwrap();
        assert_eq!(id, 4);
        let ids: Vec<u32> = store.keypoints().iter().map(|k| k.id).collect();
        assert_eq!(ids, [2, 3, 4]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = AnnotationStore::new();
        store.add_keypoint(0.1, 0.1).unwrap();
        assert!(!store.remove(AnnotationKind::Keypoint, 42));
        assert!(!store.remove(AnnotationKind::BoundingBox, 1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insufficient_points_leaves_store_unchanged() {
        let mut store = AnnotationStore::new();
        let err = store.add_polyline(vec![Point::new(0.1, 0.1)]).unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::InsufficientPoints { required: 2, actual: 1 }
        ));
        assert!(store.add_smooth_curve(Vec::new(), 0.5).is_err());
        assert!(store.is_empty());

        // The failed inserts did not consume ids.
        let id = store
            .add_polyline(vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2)])
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_invalid_smoothness() {
        let mut store = AnnotationStore::new();
        let points = vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2)];
        for bad in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                store.add_smooth_curve(points.clone(), bad),
                Err(AnnotationError::InvalidSmoothness(_))
            ));
        }
        assert!(store.smooth_curves().is_empty());
        assert!(store.add_smooth_curve(points.clone(), 0.0).is_ok());
        assert!(store.add_smooth_curve(points, 1.0).is_ok());
    }

    #[test]
    fn test_tiny_bbox_is_degenerate() {
        let mut store = AnnotationStore::new();
        let err = store
            .add_bbox(0.5, 0.5, 0.0005, 0.0005, size(1000, 1000))
            .unwrap_err();
        assert!(matches!(err, AnnotationError::DegenerateBox { .. }));
        assert!(store.bboxes().is_empty());
    }

    #[test]
    fn test_bbox_validation() {
        let mut store = AnnotationStore::new();
        let s = size(800, 600);
        assert!(store.add_bbox(0.5, 0.5, 0.0, 0.2, s).is_err());
        assert!(store.add_bbox(0.5, 0.5, 0.2, -0.1, s).is_err());
        assert!(store.add_bbox(0.5, 0.5, 1.2, 0.2, s).is_err());
        assert!(store.add_bbox(0.95, 0.5, 0.2, 0.2, s).is_err());
        assert_eq!(store.add_bbox(0.5, 0.5, 1.0, 1.0, s).unwrap(), 1);
        assert_eq!(store.add_bbox(0.25, 0.25, 0.1, 0.1, s).unwrap(), 2);
    }

    #[test]
    fn test_bbox_from_drag_orders_corners() {
        let mut store = AnnotationStore::new();
        let s = size(800, 600);
        store.add_bbox_from_drag((300.0, 450.0), (100.0, 150.0), s).unwrap();
        let bbox = store.bboxes()[0];
        approx::assert_relative_eq!(bbox.x_center, 0.25);
        approx::assert_relative_eq!(bbox.y_center, 0.5);
        approx::assert_relative_eq!(bbox.width, 0.25);
        approx::assert_relative_eq!(bbox.height, 0.5);

        // A 3 px drag is a misclick.
        assert!(store.add_bbox_from_drag((10.0, 10.0), (13.0, 60.0), s).is_err());
    }

    #[test]
    fn test_min_box_span_override() {
        let s = size(1000, 1000);
        let mut strict = AnnotationStore::new().with_min_box_span(50);
        assert!(strict.add_bbox(0.5, 0.5, 0.02, 0.02, s).is_err());
        let mut lenient = AnnotationStore::new().with_min_box_span(1);
        assert!(lenient.add_bbox(0.5, 0.5, 0.002, 0.002, s).is_ok());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = AnnotationStore::new();
        let s = size(100, 100);
        store.add_keypoint_px(10.0, 20.0, s).unwrap();
        store.add_keypoint_px(30.0, 40.0, s).unwrap();
        store.add_keypoint_px(5.0, 5.0, s).unwrap();
        let listed = store.list(AnnotationKind::Keypoint);
        let ids: Vec<u32> = listed.iter().map(Annotation::id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(listed[1], Annotation::Keypoint(Keypoint { id: 2, x_norm: 0.3, y_norm: 0.4 }));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = AnnotationStore::new();
        let s = size(100, 100);
        store.add_keypoint(0.1, 0.2).unwrap();
        store
            .add_smooth_curve_px(&[(0.0, 0.0), (50.0, 50.0), (90.0, 10.0)], 0.3, s)
            .unwrap();
        store.clear();
        assert!(store.is_empty());
        for kind in AnnotationKind::ALL {
            assert!(store.list(kind).is_empty());
        }
        assert_eq!(store.add_keypoint(0.5, 0.5).unwrap(), 1);
    }

    #[test]
    fn test_restore_advances_counter() {
        let mut store = AnnotationStore::new();
        store.restore(Annotation::Keypoint(Keypoint { id: 7, x_norm: 0.1, y_norm: 0.1 }));
        store.restore(Annotation::Keypoint(Keypoint { id: 3, x_norm: 0.2, y_norm: 0.2 }));
        assert_eq!(store.add_keypoint(0.3, 0.3).unwrap(), 8);
    }

    #[test]
    fn test_restored_max_id_exhausts_id_space() {
        let mut store = AnnotationStore::new();
        store.restore(Annotation::Keypoint(Keypoint { id: u32::MAX, x_norm: 0.1, y_norm: 0.1 }));
        assert!(matches!(
            store.add_keypoint(0.2, 0.2),
            Err(AnnotationError::IdSpaceExhausted(AnnotationKind::Keypoint))
        ));
        assert_eq!(store.keypoints().len(), 1);

        // Other types keep their own counters.
        let line = store.add_polyline(vec![Point::new(0.0, 0.0), Point::new(0.5, 0.5)]);
        assert_eq!(line.unwrap(), 1);

        // The last id is still handed out exactly once.
        let mut store = AnnotationStore::new();
        store.restore(Annotation::Keypoint(Keypoint { id: u32::MAX - 1, x_norm: 0.1, y_norm: 0.1 }));
        assert_eq!(store.add_keypoint(0.2, 0.2).unwrap(), u32::MAX);
        assert!(store.add_keypoint(0.3, 0.3).is_err());

        store.clear();
        assert_eq!(store.add_keypoint(0.4, 0.4).unwrap(), 1);
    }
}
