//! Progress logging for annotation runs.
//!
//! A run is long and mostly quiet: one `info` line per submitted image, a
//! `warn` per skipped image or unreadable directory. [`init_with_level`]
//! installs a stderr backend for the `log` facade that prints
//! `[  1.204s  WARN dataset] message`, where the last field is the emitting
//! module, and counts warnings so the caller can report them at the end
//! through [`warnings_logged`].

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, fmt::format::FmtSpan, util::SubscriberInitExt, EnvFilter};

/// Filter variable read by [`init_tracing`]; takes `EnvFilter` directives.
#[cfg(feature = "tracing")]
pub const LOG_FILTER_ENV: &str = "GAZE_ANNOTATE_LOG";

struct RunLogger {
    level: LevelFilter,
    started: Instant,
    warnings: AtomicUsize,
}

impl RunLogger {
    fn new(level: LevelFilter) -> Self {
        Self {
            level,
            started: Instant::now(),
            warnings: AtomicUsize::new(0),
        }
    }
}

/// Last path segment of a log target: `gaze_annotate::run` -> `run`.
fn module_of(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if record.level() <= Level::Warn {
            self.warnings.fetch_add(1, Ordering::Relaxed);
        }
        let line = format!(
            "[{:8.3}s {:>5} {}] {}\n",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            module_of(record.target()),
            record.args()
        );
        // One write per line keeps lines whole across threads.
        let _ = std::io::stderr().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<RunLogger> = OnceLock::new();

/// Install the stderr progress logger. Only the first call has an effect.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        RunLogger::new(level)
    });
    if installed_now {
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Warnings and errors printed by the progress logger so far.
pub fn warnings_logged() -> usize {
    LOGGER
        .get()
        .map_or(0, |l| l.warnings.load(Ordering::Relaxed))
}

/// Map a `-v` count to a level: 0 = info, 1 = debug, 2+ = trace.
/// `quiet` wins and keeps only warnings and errors.
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Route logs through `tracing` instead, as JSON lines or compact text.
///
/// Directives come from [`LOG_FILTER_ENV`] (default `info`). Assembly spans
/// are reported on close, which gives per-image timings in JSON mode.
/// Returns `false` if another global subscriber was already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = if json {
        fmt()
            .json()
            .flatten_event(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter)
            .finish()
            .try_init()
    } else {
        fmt()
            .compact()
            .with_timer(fmt::time::Uptime::default())
            .with_env_filter(filter)
            .finish()
            .try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0, false), LevelFilter::Info);
        assert_eq!(level_from_verbosity(1, false), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(5, false), LevelFilter::Trace);
        assert_eq!(level_from_verbosity(2, true), LevelFilter::Warn);
    }

    #[test]
    fn module_is_last_target_segment() {
        assert_eq!(module_of("gaze_annotate::dataset"), "dataset");
        assert_eq!(module_of("gaze_annotate_core::assemble"), "assemble");
        assert_eq!(module_of("gaze_annotate"), "gaze_annotate");
    }

    #[test]
    fn counts_only_enabled_warnings() {
        let logger = RunLogger::new(LevelFilter::Warn);
        for level in [Level::Warn, Level::Error, Level::Info] {
            logger.log(
                &Record::builder()
                    .level(level)
                    .target("gaze_annotate::run")
                    .args(format_args!("image 3"))
                    .build(),
            );
        }
        assert_eq!(logger.warnings.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_with_level(LevelFilter::Debug).expect("first init");
        init_with_level(LevelFilter::Trace).expect("second init");
    }
}
