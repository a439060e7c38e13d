// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation record serialization and deserialization.
//!
//! One JSON record per image. Records are always written in the current
//! normalized schema. On read, older pixel-based layouts are migrated to
//! normalized values against the current image size, so nothing outside
//! this module ever sees a legacy shape.

use crate::error::{AnnotationError, PersistenceCause, Result};
use crate::models::annotation::{Annotation, BoundingBox, Keypoint, Point, Polyline, SmoothCurve};
use crate::models::store::AnnotationStore;
use crate::util::geometry::{self, ImageSize};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Suffix of current-version record files: `{base}_annotations.json`.
pub const RECORD_SUFFIX: &str = "_annotations.json";

/// Record file name for an image, e.g. `frame_001_annotations.json`.
pub fn annotation_file_name(image_path: &Path) -> String {
    format!("{}{}", base_name(image_path), RECORD_SUFFIX)
}

/// Record file name used by the first version of the tool: `{base}.json`.
pub fn legacy_annotation_file_name(image_path: &Path) -> String {
    format!("{}.json", base_name(image_path))
}

fn base_name(image_path: &Path) -> String {
    image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Current schema (write side)
// ---------------------------------------------------------------------------

/// Canonical on-disk record for one image.
#[derive(Debug, Serialize)]
pub struct AnnotationRecord<'a> {
    pub image_filename: &'a str,
    pub keypoints: Vec<KeypointRecord>,
    pub curves: Vec<CurveRecord<'a>>,
    pub smooth_curves: Vec<SmoothCurveRecord<'a>>,
    pub bboxes: Vec<BoxRecord>,
}

#[derive(Debug, Serialize)]
pub struct KeypointRecord {
    pub id: u32,
    pub x_norm: f64,
    pub y_norm: f64,
}

#[derive(Debug, Serialize)]
pub struct CurveRecord<'a> {
    pub id: u32,
    pub normalized_points: &'a [Point],
}

#[derive(Debug, Serialize)]
pub struct SmoothCurveRecord<'a> {
    pub id: u32,
    pub normalized_points: &'a [Point],
    pub smoothness: f64,
}

#[derive(Debug, Serialize)]
pub struct BoxRecord {
    pub id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// Build the canonical record for the contents of `store`.
pub fn encode<'a>(store: &'a AnnotationStore, image_filename: &'a str) -> AnnotationRecord<'a> {
    AnnotationRecord {
        image_filename,
        keypoints: store
            .keypoints()
            .iter()
            .map(|k| KeypointRecord {
                id: k.id,
                x_norm: k.x_norm,
                y_norm: k.y_norm,
            })
            .collect(),
        curves: store
            .polylines()
            .iter()
            .map(|p| CurveRecord {
                id: p.id,
                normalized_points: &p.points,
            })
            .collect(),
        smooth_curves: store
            .smooth_curves()
            .iter()
            .map(|c| SmoothCurveRecord {
                id: c.id,
                normalized_points: &c.control_points,
                smoothness: c.smoothness,
            })
            .collect(),
        bboxes: store
            .bboxes()
            .iter()
            .map(|b| BoxRecord {
                id: b.id,
                x_center: b.x_center,
                y_center: b.y_center,
                width: b.width,
                height: b.height,
            })
            .collect(),
    }
}

/// Serialize `store` as pretty-printed JSON.
pub fn to_json(store: &AnnotationStore, image_filename: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&encode(store, image_filename))
}

/// Write the record for `store` to `path`, creating parent directories.
pub fn save(path: &Path, store: &AnnotationStore, image_filename: &str) -> Result<()> {
    let json = to_json(store, image_filename).map_err(|e| AnnotationError::persistence(path, e))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AnnotationError::persistence(path, e))?;
        }
    }
    std::fs::write(path, json).map_err(|e| AnnotationError::persistence(path, e))?;
    log::info!("Saved {} annotations to {}", store.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Read side: accepts both current and legacy layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, alias = "image")]
    image_filename: Option<String>,
    #[serde(default)]
    keypoints: Vec<RawKeypoint>,
    #[serde(default)]
    curves: Vec<RawCurve>,
    #[serde(default)]
    smooth_curves: Vec<RawCurve>,
    #[serde(default)]
    bboxes: Vec<RawBox>,
}

#[derive(Debug, Deserialize)]
struct RawKeypoint {
    id: Option<u32>,
    x_norm: Option<f64>,
    y_norm: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawNormPoint {
    x_norm: Option<f64>,
    y_norm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPixelPoint {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCurve {
    id: Option<u32>,
    normalized_points: Option<Vec<RawNormPoint>>,
    points: Option<Vec<RawPixelPoint>>,
    smoothness: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    id: Option<u32>,
    x1: Option<f64>,
    y1: Option<f64>,
    x2: Option<f64>,
    y2: Option<f64>,
    x_center: Option<f64>,
    y_center: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

type DecodeResult<T> = std::result::Result<T, PersistenceCause>;

/// A record read back into memory.
#[derive(Debug, Clone)]
pub struct LoadedRecord {
    /// Image file name stored in the record, if any.
    pub image_filename: Option<String>,
    pub store: AnnotationStore,
    /// Number of entries that were stored in a legacy layout.
    pub migrated: usize,
}

/// Read and migrate the record at `path` against the current image size.
///
/// A missing file surfaces as a persistence error; check
/// [`AnnotationError::is_not_found`] to treat it as "no annotations yet".
pub fn load(path: &Path, size: ImageSize) -> Result<LoadedRecord> {
    let json = std::fs::read_to_string(path).map_err(|e| AnnotationError::persistence(path, e))?;
    let record = decode(&json, size).map_err(|cause| AnnotationError::persistence(path, cause))?;
    if record.migrated > 0 {
        log::warn!(
            "Migrated {} legacy entries from {} using {}x{} image size",
            record.migrated,
            path.display(),
            size.width(),
            size.height()
        );
    }
    log::info!("Loaded {} annotations from {}", record.store.len(), path.display());
    Ok(record)
}

/// Decode a record from JSON text.
pub fn decode(json: &str, size: ImageSize) -> DecodeResult<LoadedRecord> {
    let raw: RawRecord = serde_json::from_str(json)?;
    let mut store = AnnotationStore::new();
    let mut migrated = 0;

    for kp in raw.keypoints {
        let (keypoint, legacy) = decode_keypoint(kp, size)?;
        migrated += usize::from(legacy);
        store.restore(Annotation::Keypoint(keypoint));
    }

    for curve in raw.curves {
        let id = curve.id.ok_or(missing("curve", "id"))?;
        let (points, legacy) =
            decode_points("curve", curve.normalized_points, curve.points, size)?;
        migrated += usize::from(legacy);
        store.restore(Annotation::Polyline(Polyline { id, points }));
    }

    for curve in raw.smooth_curves {
        let id = curve.id.ok_or(missing("smooth_curve", "id"))?;
        let smoothness = curve.smoothness.ok_or(missing("smooth_curve", "smoothness"))?;
        let (control_points, legacy) =
            decode_points("smooth_curve", curve.normalized_points, curve.points, size)?;
        migrated += usize::from(legacy);
        store.restore(Annotation::SmoothCurve(SmoothCurve {
            id,
            control_points,
            smoothness,
        }));
    }

    for bbox in raw.bboxes {
        let (bbox, legacy) = decode_bbox(bbox, size)?;
        migrated += usize::from(legacy);
        store.restore(Annotation::BoundingBox(bbox));
    }

    Ok(LoadedRecord {
        image_filename: raw.image_filename,
        store,
        migrated,
    })
}

fn missing(entity: &'static str, field: &'static str) -> PersistenceCause {
    PersistenceCause::MissingField { entity, field }
}

/// Returns the keypoint and whether it came from the pixel layout.
fn decode_keypoint(
    raw: RawKeypoint,
    size: ImageSize,
) -> DecodeResult<(Keypoint, bool)> {
    let id = raw.id.ok_or(missing("keypoint", "id"))?;
    match raw.x_norm {
        Some(x_norm) => {
            let y_norm = raw.y_norm.ok_or(missing("keypoint", "y_norm"))?;
            Ok((Keypoint { id, x_norm, y_norm }, false))
        }
        None => {
            let x = raw.x.ok_or(missing("keypoint", "x"))?;
            let y = raw.y.ok_or(missing("keypoint", "y"))?;
            let p = geometry::to_normalized(x, y, size);
            Ok((
                Keypoint {
                    id,
                    x_norm: p.x_norm,
                    y_norm: p.y_norm,
                },
                true,
            ))
        }
    }
}

fn decode_points(
    entity: &'static str,
    normalized: Option<Vec<RawNormPoint>>,
    legacy: Option<Vec<RawPixelPoint>>,
    size: ImageSize,
) -> DecodeResult<(Vec<Point>, bool)> {
    if let Some(points) = normalized {
        let points = points
            .into_iter()
            .map(|p| -> DecodeResult<Point> {
                Ok(Point::new(
                    p.x_norm.ok_or(missing(entity, "x_norm"))?,
                    p.y_norm.ok_or(missing(entity, "y_norm"))?,
                ))
            })
            .collect::<DecodeResult<Vec<_>>>()?;
        return Ok((points, false));
    }

    let points = legacy.ok_or(missing(entity, "points"))?;
    let points = points
        .into_iter()
        .map(|p| -> DecodeResult<Point> {
            let x = p.x.ok_or(missing(entity, "x"))?;
            let y = p.y.ok_or(missing(entity, "y"))?;
            Ok(geometry::to_normalized(x, y, size))
        })
        .collect::<DecodeResult<Vec<_>>>()?;
    Ok((points, true))
}

fn decode_bbox(
    raw: RawBox,
    size: ImageSize,
) -> DecodeResult<(BoundingBox, bool)> {
    let id = raw.id.ok_or(missing("bbox", "id"))?;
    if let Some(x1) = raw.x1 {
        let y1 = raw.y1.ok_or(missing("bbox", "y1"))?;
        let x2 = raw.x2.ok_or(missing("bbox", "x2"))?;
        let y2 = raw.y2.ok_or(missing("bbox", "y2"))?;
        let yolo = geometry::corners_to_yolo(x1, y1, x2, y2, size);
        return Ok((
            BoundingBox {
                id,
                x_center: yolo.x_center,
                y_center: yolo.y_center,
                width: yolo.width,
                height: yolo.height,
            },
            true,
        ));
    }

    Ok((
        BoundingBox {
            id,
            x_center: raw.x_center.ok_or(missing("bbox", "x_center"))?,
            y_center: raw.y_center.ok_or(missing("bbox", "y_center"))?,
            width: raw.width.ok_or(missing("bbox", "width"))?,
            height: raw.height.ok_or(missing("bbox", "height"))?,
        },
        false,
    ))
}
