// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image dataset discovery.
//!
//! A dataset is a directory of images (preferably in an `images/`
//! subdirectory) with a sibling `annotations/` directory holding one record
//! per image.

use crate::config::AnnotatorConfig;
use crate::error::{AnnotationError, Result};
use crate::io::serialization;
use crate::util::geometry::ImageSize;
use std::path::{Path, PathBuf};

/// Sorted list of images plus where their records live.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    images: Vec<PathBuf>,
    annotations_dir: PathBuf,
}

impl Dataset {
    /// Scan `root` for images and make sure the annotations directory exists.
    pub fn open(root: &Path, config: &AnnotatorConfig) -> Result<Self> {
        let preferred = root.join(&config.images_subdir);
        let images_dir = if preferred.is_dir() {
            preferred
        } else {
            root.to_path_buf()
        };

        let entries = std::fs::read_dir(&images_dir)
            .map_err(|e| AnnotationError::persistence(&images_dir, e))?;
        let mut images = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| AnnotationError::persistence(&images_dir, e))?
                .path();
            if path.is_file() && config.is_image(&path) {
                images.push(path);
            }
        }
        if images.is_empty() {
            return Err(AnnotationError::EmptyDataset(images_dir));
        }
        images.sort();

        let annotations_dir = root.join(&config.annotations_dir);
        std::fs::create_dir_all(&annotations_dir)
            .map_err(|e| AnnotationError::persistence(&annotations_dir, e))?;

        log::info!(
            "Loaded {} images from {}",
            images.len(),
            images_dir.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            images,
            annotations_dir,
        })
    }

    /// Directory the dataset was opened from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Image paths, sorted.
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Directory records are written to.
    pub fn annotations_dir(&self) -> &Path {
        &self.annotations_dir
    }

    /// Where the record for `image` is written.
    pub fn record_path(&self, image: &Path) -> PathBuf {
        self.annotations_dir
            .join(serialization::annotation_file_name(image))
    }

    /// Locate an existing record for `image`.
    ///
    /// Looks in the annotations directory first, then next to the image
    /// (copying such a record into the annotations directory), then for a
    /// legacy `{base}.json`. `None` means the image has no annotations yet.
    pub fn find_record(&self, image: &Path) -> Result<Option<PathBuf>> {
        let canonical = self.record_path(image);
        if canonical.is_file() {
            return Ok(Some(canonical));
        }

        if let Some(image_dir) = image.parent() {
            let stray = image_dir.join(serialization::annotation_file_name(image));
            if stray.is_file() && stray != canonical {
                std::fs::copy(&stray, &canonical)
                    .map_err(|e| AnnotationError::persistence(&canonical, e))?;
                log::warn!(
                    "Copied {} into {}",
                    stray.display(),
                    self.annotations_dir.display()
                );
                return Ok(Some(canonical));
            }
        }

        let legacy = self
            .annotations_dir
            .join(serialization::legacy_annotation_file_name(image));
        if legacy.is_file() {
            return Ok(Some(legacy));
        }
        Ok(None)
    }
}

/// Read the pixel dimensions of an image without decoding it fully.
pub fn image_size(path: &Path) -> Result<ImageSize> {
    let (width, height) =
        image::image_dimensions(path).map_err(|source| AnnotationError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    ImageSize::new(width, height)
}
