// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotator settings.
//!
//! Settings are read from an optional YAML file. Every field has a default,
//! so a file only needs the values it changes.

use crate::util::spline::{CLOSE_THRESHOLD_PX, DEFAULT_SEGMENTS};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Directory (under the dataset root) holding the record files.
    pub annotations_dir: String,
    /// Preferred image directory under the dataset root.
    pub images_subdir: String,
    /// Accepted image extensions, compared case-insensitively.
    pub image_extensions: Vec<String>,
    /// Samples per control-point pair when rendering smooth curves.
    pub spline_segments: usize,
    /// Distance (px) under which a curve's ends are joined.
    pub close_threshold_px: f64,
    /// Boxes spanning fewer pixels than this are rejected.
    pub min_box_span_px: i64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            annotations_dir: "annotations".to_string(),
            images_subdir: "images".to_string(),
            image_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            spline_segments: DEFAULT_SEGMENTS,
            close_threshold_px: CLOSE_THRESHOLD_PX,
            min_box_span_px: crate::models::store::MIN_BOX_SPAN_PX,
        }
    }
}

impl AnnotatorConfig {
    /// Read settings from a YAML file; absent fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref)
            .with_context(|| format!("reading annotator config {}", path_ref.display()))?;
        let config: AnnotatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing annotator config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Whether `path` has one of the accepted image extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
