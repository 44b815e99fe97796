//! The per-image annotation loop.

use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use gaze_annotate_core::{
    build_annotations, AnnotationRecord, AnnotationSink, ImageResolver, ResolveError, SourceItem,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What to do when an item's image cannot be resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingImagePolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Session size assumed when the server does not report one.
    pub session_cap: usize,
    pub limit: Option<usize>,
    /// Sleep after each successful submission.
    pub pacing: Duration,
    pub missing_image: MissingImagePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            session_cap: 500,
            limit: None,
            pacing: Duration::from_millis(20),
            missing_image: MissingImagePolicy::Abort,
        }
    }
}

impl RunOptions {
    /// Number of items a run over `available` items will visit.
    pub fn planned(&self, available: usize, session_total: Option<usize>) -> usize {
        let total = available.min(session_total.unwrap_or(self.session_cap));
        self.limit.map_or(total, |limit| total.min(limit))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items visited (submitted or skipped).
    pub planned: usize,
    /// Images whose annotations were accepted by the sink.
    pub processed: usize,
    pub skipped: usize,
    pub annotations: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("[#{index}] {path}: {source}")]
    Resolve {
        index: usize,
        path: String,
        #[source]
        source: ResolveError,
    },
    #[error("[#{index}] submission failed: {source}")]
    Submit {
        index: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Annotate `items` in order and hand each image's records to `sink`.
///
/// The session index of an item is its position in `items`. The first sink
/// failure stops the run; an unresolvable image stops it too unless
/// `options.missing_image` is [`MissingImagePolicy::Skip`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(items = items.len()))
)]
pub fn run<R, S>(
    items: &[SourceItem],
    resolver: &R,
    sink: &mut S,
    session_total: Option<usize>,
    options: &RunOptions,
) -> Result<RunSummary, RunError>
where
    R: ImageResolver + ?Sized,
    S: AnnotationSink + ?Sized,
{
    let total = options.planned(items.len(), session_total);
    let mut summary = RunSummary {
        planned: total,
        ..RunSummary::default()
    };
    info!("auto-annotating {total} images");

    for (index, item) in items.iter().take(total).enumerate() {
        let records = match build_annotations(item, resolver) {
            Ok(records) => records,
            Err(source) if options.missing_image == MissingImagePolicy::Skip => {
                warn!("[#{index}] skipping {}: {source}", item.path);
                summary.skipped += 1;
                continue;
            }
            Err(source) => {
                error!("[#{index}] {}: {source}", item.path);
                return Err(RunError::Resolve {
                    index,
                    path: item.path.clone(),
                    source,
                });
            }
        };

        if let Err(source) = sink.submit(index, &records) {
            error!("[#{index}] submission failed: {source}");
            return Err(RunError::Submit {
                index,
                source: Box::new(source),
            });
        }

        summary.processed += 1;
        summary.annotations += records.len();
        info!(
            "[#{}/{total}] saved {} annotation(s) for {}",
            index + 1,
            records.len(),
            item.path
        );
        if !options.pacing.is_zero() {
            thread::sleep(options.pacing);
        }
    }

    Ok(summary)
}

/// Annotations of one image as stored in a report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub index: usize,
    pub annotations: Vec<AnnotationRecord>,
}

/// JSON report of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationReport {
    pub entries: Vec<ReportEntry>,
}

impl AnnotationReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, crate::config::ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), crate::config::ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Sink that keeps every submission in memory.
#[derive(Clone, Debug, Default)]
pub struct ReportSink {
    pub report: AnnotationReport,
}

impl AnnotationSink for ReportSink {
    type Error = Infallible;

    fn submit(&mut self, index: usize, records: &[AnnotationRecord]) -> Result<(), Self::Error> {
        self.report.entries.push(ReportEntry {
            index,
            annotations: records.to_vec(),
        });
        Ok(())
    }
}

/// Sink that forwards to `inner` and records what it accepted.
#[derive(Debug)]
pub struct Recording<S> {
    pub inner: S,
    pub report: AnnotationReport,
}

impl<S> Recording<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            report: AnnotationReport::default(),
        }
    }
}

impl<S: AnnotationSink> AnnotationSink for Recording<S> {
    type Error = S::Error;

    fn submit(&mut self, index: usize, records: &[AnnotationRecord]) -> Result<(), Self::Error> {
        self.inner.submit(index, records)?;
        self.report.entries.push(ReportEntry {
            index,
            annotations: records.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_count_respects_session_and_limit() {
        let opts = RunOptions::default();
        assert_eq!(opts.planned(800, None), 500);
        assert_eq!(opts.planned(800, Some(120)), 120);
        assert_eq!(opts.planned(30, Some(120)), 30);

        let limited = RunOptions {
            limit: Some(5),
            ..RunOptions::default()
        };
        assert_eq!(limited.planned(30, Some(120)), 5);
    }
}
