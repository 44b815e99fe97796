//! Per-image annotation assembly.
//!
//! One [`SourceItem`] yields one or more [`AnnotationRecord`]s, in this order:
//! 1. the primary gaze (the dataset gaze, or the eye when no gaze is given),
//! 2. the eye position as its own target, if it is more than
//!    [`EYE_SPLIT_DISTANCE`] away from the primary gaze,
//! 3. every entry of the optional `gazes` list, unconditionally.
//!
//! Records are numbered 1.. in that order.

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::classify::classify_gaze;
use crate::geometry::{normalize_box, normalize_point, BoundingBox, GazePoint, ImageSize};
use crate::record::AnnotationRecord;
use crate::source::SourceItem;

/// Normalized gaze-to-eye distance above which the eye gets its own record.
pub const EYE_SPLIT_DISTANCE: f64 = 0.05;

/// Backing file of a manifest item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub path: PathBuf,
    pub size: ImageSize,
}

/// Errors produced while locating an item's image.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("image not found in merged set: {filename}")]
    ImageNotFound { filename: String },
    #[error("failed to read image dimensions from {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Maps a manifest item to its image file and pixel size.
pub trait ImageResolver {
    fn resolve(&self, item: &SourceItem) -> Result<ImageMetadata, ResolveError>;
}

impl<T: ImageResolver + ?Sized> ImageResolver for &T {
    fn resolve(&self, item: &SourceItem) -> Result<ImageMetadata, ResolveError> {
        (**self).resolve(item)
    }
}

/// Receives the annotations of one image, addressed by its session index.
pub trait AnnotationSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn submit(&mut self, index: usize, records: &[AnnotationRecord]) -> Result<(), Self::Error>;
}

impl<T: AnnotationSink + ?Sized> AnnotationSink for &mut T {
    type Error = T::Error;

    fn submit(&mut self, index: usize, records: &[AnnotationRecord]) -> Result<(), Self::Error> {
        (**self).submit(index, records)
    }
}

/// Builds annotations for manifest items using an [`ImageResolver`].
#[derive(Clone, Debug)]
pub struct AnnotationAssembler<R> {
    resolver: R,
}

impl<R: ImageResolver> AnnotationAssembler<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resolve the item's image, then build its annotations.
    ///
    /// Fails only when the image cannot be resolved; nothing is returned for
    /// the item in that case.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, item), fields(path = %item.path))
    )]
    pub fn build(&self, item: &SourceItem) -> Result<Vec<AnnotationRecord>, ResolveError> {
        build_annotations(item, &self.resolver)
    }
}

/// Resolve `item` through `resolver` and build its annotations.
pub fn build_annotations<R: ImageResolver + ?Sized>(
    item: &SourceItem,
    resolver: &R,
) -> Result<Vec<AnnotationRecord>, ResolveError> {
    let meta = resolver.resolve(item)?;
    Ok(build_annotations_for_size(item, meta.size))
}

/// Build annotations for an item whose image size is already known.
pub fn build_annotations_for_size(item: &SourceItem, size: ImageSize) -> Vec<AnnotationRecord> {
    let space = item.dataset().coordinate_space();

    let bbox = normalize_box(item.bbox.as_ref(), space, size);
    if bbox.is_fallback() {
        debug!("{}: missing or malformed bbox, using default", item.path);
    }
    let eye = normalize_point(item.eye.as_ref(), space, size);
    if eye.is_fallback() {
        debug!("{}: missing or malformed eye, using image center", item.path);
    }
    let (bbox, eye) = (bbox.value(), eye.value());

    let gaze = match item.provided_gaze() {
        Some(raw) => {
            let g = normalize_point(Some(raw), space, size);
            if g.is_fallback() {
                debug!("{}: malformed gaze, using image center", item.path);
            }
            g.value()
        }
        None => eye,
    };

    let mut targets = vec![gaze];
    if gaze.distance_to(&eye) > EYE_SPLIT_DISTANCE {
        targets.push(eye);
    }
    targets.extend(
        item.extra_gazes()
            .iter()
            .map(|raw| normalize_point(Some(raw), space, size).value()),
    );

    number_records(bbox, &targets, size)
}

fn number_records(
    bbox: BoundingBox,
    targets: &[GazePoint],
    size: ImageSize,
) -> Vec<AnnotationRecord> {
    targets
        .iter()
        .zip(1u32..)
        .map(|(gaze, n)| {
            let labels = classify_gaze(&bbox, gaze, size);
            AnnotationRecord::new(bbox, *gaze, labels, n)
        })
        .collect()
}
