//! High-level facade for the `gaze-annotate` workspace.
//!
//! This crate provides:
//! - re-exports of the pure annotation engine in `gaze-annotate-core`,
//! - (feature `image`) manifest loading, merged-set scanning and image
//!   resolution against the GazeFollow/VAT directory layout,
//! - (feature `session`) a blocking HTTP client for the labeling server,
//! - a run driver that feeds every available image through the engine into
//!   an [`AnnotationSink`],
//! - (feature `cli`) the `gaze-annotate` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gaze_annotate::dataset::{load_manifest, DatasetRoots, MergedSets};
//! use gaze_annotate::run::{run, ReportSink, RunOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roots = DatasetRoots::new("merged_images");
//! let items = load_manifest("combined_gazefollow_vat.json")?;
//! let available = MergedSets::scan(&roots).filter_available(items);
//!
//! let mut sink = ReportSink::default();
//! let summary = run(&available, &roots, &mut sink, None, &RunOptions::default())?;
//! println!("annotated {} images", summary.processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `gaze_annotate::core`: geometry, classification, assembly, data model.
//! - `gaze_annotate::config`: JSON/env configuration.
//! - `gaze_annotate::dataset` (feature `image`): dataset roots and manifest.
//! - `gaze_annotate::session` (feature `session`): labeling-server client.
//! - `gaze_annotate::run`: the per-image loop and the in-memory report sink.

pub use gaze_annotate_core as core;

pub use gaze_annotate_core::{
    build_annotations, AnnotationRecord, AnnotationSink, ImageResolver, SourceItem,
};

pub mod config;
pub mod run;

#[cfg(feature = "image")]
pub mod dataset;

#[cfg(feature = "session")]
pub mod session;
