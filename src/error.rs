// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the annotation core.
//!
//! Every failure here is recoverable. Validation errors are raised before
//! the store is touched, so a failed insert never leaves partial state.

use crate::models::annotation::AnnotationKind;
use std::io;
use std::path::{Path, PathBuf};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors produced by the annotation core.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidImageDimensions { width: u32, height: u32 },

    #[error("at least {required} points are required, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    #[error("smoothness must be within [0, 1], got {0}")]
    InvalidSmoothness(f64),

    #[error("degenerate bounding box: {reason}")]
    DegenerateBox { reason: String },

    #[error("annotation file {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: PersistenceCause,
    },

    #[error("no {0} ids left to assign")]
    IdSpaceExhausted(AnnotationKind),

    #[error("no images found in {}", .0.display())]
    EmptyDataset(PathBuf),

    #[error("failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Underlying cause of a [`AnnotationError::Persistence`] failure.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceCause {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} entry is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl AnnotationError {
    pub(crate) fn persistence(path: &Path, cause: impl Into<PersistenceCause>) -> Self {
        AnnotationError::Persistence {
            path: path.to_path_buf(),
            source: cause.into(),
        }
    }

    /// True when the error is a read of a file that does not exist.
    ///
    /// Callers treat this as "no annotations yet" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnnotationError::Persistence {
                source: PersistenceCause::Io(e),
                ..
            } if e.kind() == io::ErrorKind::NotFound
        )
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        AnnotationError::DegenerateBox {
            reason: reason.into(),
        }
    }
}
