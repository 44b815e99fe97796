//! Annotation-derivation engine for face/gaze datasets.
//!
//! This crate is pure and synchronous. It turns raw manifest geometry into
//! normalized, labeled [`AnnotationRecord`]s and knows nothing about the file
//! system or the labeling server; those sit behind the [`ImageResolver`] and
//! [`AnnotationSink`] traits.
//!
//! - [`geometry`]: box rectification and unit-square normalization.
//! - [`classify_gaze`]: the five heuristic gaze labels.
//! - [`build_annotations`]: per-image record assembly and numbering.

mod assemble;
mod classify;
pub mod geometry;
mod logger;
mod record;
mod source;

pub use assemble::{
    build_annotations, build_annotations_for_size, AnnotationAssembler, AnnotationSink,
    ImageMetadata, ImageResolver, ResolveError, EYE_SPLIT_DISTANCE,
};
pub use classify::{
    classify_gaze, FocalPoint, FocalPointParseError, GazeLabels, Horizontal, ObjectLocation,
    RelativeDistance, TargetType, Vertical,
};
pub use geometry::{
    normalize_box, normalize_point, rectify_box, BoundingBox, CoordinateSpace, GazePoint,
    ImageSize, Resolved,
};
pub use record::AnnotationRecord;
pub use source::{DatasetKind, SourceItem};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, LOG_FILTER_ENV};

pub use logger::{init_with_level, level_from_verbosity, warnings_logged};
