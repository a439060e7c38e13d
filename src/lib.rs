// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data and geometry engine.
//!
//! Keypoints, polylines, smoothed curves and bounding boxes are kept in
//! normalized image coordinates so they stay valid at any display size.
//! The UI layer feeds in pixel positions together with the current
//! [`ImageSize`], and gets back entities and spline samples in pixel space
//! for drawing. Records are stored as one JSON file per image.

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod session;
pub mod util;

pub use config::AnnotatorConfig;
pub use error::{AnnotationError, PersistenceCause, Result};
pub use models::annotation::{
    Annotation, AnnotationKind, BoundingBox, Keypoint, Point, Polyline, SmoothCurve,
};
pub use models::store::AnnotationStore;
pub use session::AnnotationSession;
pub use util::geometry::{ImageSize, PixelPoint, PixelRect, YoloBox};
pub use util::spline::CatmullRom;
