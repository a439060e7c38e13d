// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session over an image dataset.
//!
//! The session is the explicit context the UI layer drives: it knows which
//! image is active, that image's pixel size, and owns the store for it.
//! Switching images discards the current store without saving; callers
//! check [`AnnotationSession::has_annotations`] and call
//! [`AnnotationSession::save`] first if they want to keep the work.

use crate::config::AnnotatorConfig;
use crate::error::Result;
use crate::io::media::{self, Dataset};
use crate::io::serialization;
use crate::models::annotation::SmoothCurve;
use crate::models::store::AnnotationStore;
use crate::util::geometry::{ImageSize, PixelPoint};
use crate::util::spline::CatmullRom;
use std::path::{Path, PathBuf};

/// Active image, its size and its annotations.
#[derive(Debug)]
pub struct AnnotationSession {
    config: AnnotatorConfig,
    dataset: Dataset,
    current: usize,
    image_size: ImageSize,
    store: AnnotationStore,
}

impl AnnotationSession {
    /// Open the dataset at `root` and activate its first image.
    pub fn open(root: &Path, config: AnnotatorConfig) -> Result<Self> {
        let dataset = Dataset::open(root, &config)?;
        let image_size = media::image_size(&dataset.images()[0])?;
        let store = AnnotationStore::new().with_min_box_span(config.min_box_span_px);
        let mut session = Self {
            config,
            dataset,
            current: 0,
            image_size,
            store,
        };
        session.open_current()?;
        Ok(session)
    }

    /// The dataset being annotated.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Settings the session was opened with.
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Zero-based index of the active image.
    pub fn index(&self) -> usize {
        self.current
    }

    /// One-based position for display, e.g. `3/10`.
    pub fn position(&self) -> String {
        format!("{}/{}", self.current + 1, self.dataset.len())
    }

    /// Path of the active image.
    pub fn current_image(&self) -> &Path {
        &self.dataset.images()[self.current]
    }

    /// Pixel size of the active image.
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Annotations of the active image.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Mutable access for adding and removing annotations.
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    /// Whether there is anything worth saving before switching images.
    pub fn has_annotations(&self) -> bool {
        !self.store.is_empty()
    }

    /// Move to the next image. Returns `false` at the end of the dataset.
    pub fn next(&mut self) -> Result<bool> {
        if self.current + 1 >= self.dataset.len() {
            return Ok(false);
        }
        self.go_to(self.current + 1)
    }

    /// Move to the previous image. Returns `false` at the first image.
    pub fn prev(&mut self) -> Result<bool> {
        if self.current == 0 {
            return Ok(false);
        }
        self.go_to(self.current - 1)
    }

    /// Activate the image at `index`. Returns `false` if out of range.
    ///
    /// The new image stays active even if its record fails to load; the
    /// store is then empty and the error is returned.
    pub fn go_to(&mut self, index: usize) -> Result<bool> {
        if index >= self.dataset.len() {
            return Ok(false);
        }
        let image_size = media::image_size(&self.dataset.images()[index])?;
        self.current = index;
        self.image_size = image_size;
        self.open_current()?;
        log::info!("Switched to image {} ({})", self.position(), self.current_image().display());
        Ok(true)
    }

    /// Where the current image's record is written.
    pub fn record_path(&self) -> PathBuf {
        self.dataset.record_path(self.current_image())
    }

    /// Write the current store in the canonical schema.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.record_path();
        let image_filename = self
            .current_image()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        serialization::save(&path, &self.store, &image_filename)?;
        Ok(path)
    }

    /// Spline for a stored smooth curve, projected onto the current image.
    pub fn curve_spline(&self, curve: &SmoothCurve) -> CatmullRom {
        self.spline(&curve.pixel_control_points(self.image_size), curve.smoothness)
    }

    /// Sampled preview of a curve that is still being drawn.
    pub fn preview_curve(&self, clicks: &[PixelPoint], smoothness: f64) -> Vec<PixelPoint> {
        self.spline(clicks, smoothness).samples().collect()
    }

    fn spline(&self, points: &[PixelPoint], smoothness: f64) -> CatmullRom {
        CatmullRom::new(points, smoothness)
            .with_segments(self.config.spline_segments)
            .with_close_threshold(self.config.close_threshold_px)
    }

    fn fresh_store(&self) -> AnnotationStore {
        AnnotationStore::new().with_min_box_span(self.config.min_box_span_px)
    }

    /// Reload the active image's record from disk, discarding unsaved edits.
    ///
    /// A missing record leaves the store empty.
    pub fn open_current(&mut self) -> Result<()> {
        self.store = self.fresh_store();
        let Some(path) = self.dataset.find_record(self.current_image())? else {
            log::debug!("No annotations for {}", self.current_image().display());
            return Ok(());
        };
        match serialization::load(&path, self.image_size) {
            Ok(record) => {
                self.store = record.store.with_min_box_span(self.config.min_box_span_px);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
