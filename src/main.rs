// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! pointlabel - headless maintenance driver for annotation datasets.
//!
//! Rewrites per-image records in the current schema and prints per-image
//! annotation counts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pointlabel::io::{media, serialization};
use pointlabel::{AnnotationKind, AnnotatorConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pointlabel", about = "Annotation dataset maintenance")]
struct Cli {
    /// Optional YAML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite every record in the current normalized schema
    Migrate { dataset: PathBuf },
    /// Print annotation counts for every image
    Summary { dataset: PathBuf },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AnnotatorConfig::load(path)?,
        None => AnnotatorConfig::default(),
    };

    match cli.command {
        Command::Migrate { dataset } => migrate(&dataset, &config),
        Command::Summary { dataset } => summary(&dataset, &config),
    }
}

fn migrate(root: &Path, config: &AnnotatorConfig) -> Result<()> {
    let dataset = media::Dataset::open(root, config)
        .with_context(|| format!("opening dataset {}", root.display()))?;

    let mut rewritten = 0;
    let mut failed = 0;
    for image in dataset.images() {
        match migrate_one(&dataset, image) {
            Ok(true) => rewritten += 1,
            Ok(false) => log::debug!("No record for {}", image.display()),
            Err(e) => {
                failed += 1;
                log::error!("Failed to migrate {}: {}", image.display(), e);
            }
        }
    }

    println!("Rewrote {} records ({} failed)", rewritten, failed);
    if failed > 0 {
        anyhow::bail!("{} records could not be migrated", failed);
    }
    Ok(())
}

/// Rewrite the record of one image. `Ok(false)` means it had none.
fn migrate_one(dataset: &media::Dataset, image: &Path) -> pointlabel::Result<bool> {
    let Some(path) = dataset.find_record(image)? else {
        return Ok(false);
    };
    let size = media::image_size(image)?;
    let record = serialization::load(&path, size)?;
    let image_filename = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    serialization::save(&dataset.record_path(image), &record.store, &image_filename)?;
    Ok(true)
}

fn summary(root: &Path, config: &AnnotatorConfig) -> Result<()> {
    let dataset = media::Dataset::open(root, config)
        .with_context(|| format!("opening dataset {}", root.display()))?;

    for image in dataset.images() {
        let name = image.display();
        let Some(path) = dataset.find_record(image)? else {
            println!("{name}: no annotations");
            continue;
        };
        let size = media::image_size(image)?;
        let record = serialization::load(&path, size)
            .with_context(|| format!("reading annotations for {}", name))?;
        let counts: Vec<String> = AnnotationKind::ALL
            .iter()
            .map(|kind| format!("{} {}", record.store.list(*kind).len(), kind))
            .collect();
        println!("{name}: {}", counts.join(", "));
    }
    Ok(())
}
