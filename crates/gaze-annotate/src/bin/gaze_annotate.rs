//! `gaze-annotate`: derive gaze annotations for every available merged image
//! and submit them to a labeling session.

use std::path::PathBuf;

use clap::Parser;
use gaze_annotate::config::AnnotateConfig;
use gaze_annotate::core::{init_with_level, warnings_logged};
use gaze_annotate::dataset::{load_manifest, DatasetRoots, MergedSets};
use gaze_annotate::run::{run, AnnotationReport, Recording, ReportSink, RunSummary};
use gaze_annotate::session::LabelingSession;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gaze-annotate", author, version, about, long_about = None)]
struct Cli {
    /// JSON config file; its keys override MERGED_ROOT/BASE_URL and defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the `gazefollow/` and `vat/` trees.
    #[arg(long)]
    merged_root: Option<PathBuf>,

    /// Combined GazeFollow/VAT manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Labeling server base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Annotate at most this many images.
    #[arg(long)]
    limit: Option<usize>,

    /// Delay between submissions in milliseconds.
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Session size to assume when the server does not report one.
    #[arg(long)]
    session_cap: Option<usize>,

    /// Skip images that cannot be found instead of aborting.
    #[arg(long)]
    skip_missing: bool,

    /// Build annotations without contacting the server.
    #[arg(long)]
    dry_run: bool,

    /// Write every submitted annotation to this JSON report.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Log through `tracing` as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<AnnotateConfig, Box<dyn std::error::Error>> {
        let mut cfg = AnnotateConfig::from_env();
        if let Some(path) = &self.config {
            cfg = cfg.overlay_json(path)?;
        }
        if let Some(root) = &self.merged_root {
            cfg.merged_root = root.clone();
        }
        if let Some(manifest) = &self.manifest {
            cfg.manifest_path = manifest.clone();
        }
        if let Some(url) = &self.base_url {
            cfg.base_url = url.clone();
        }
        if self.limit.is_some() {
            cfg.limit = self.limit;
        }
        if let Some(pacing_ms) = self.pacing_ms {
            cfg.pacing_ms = pacing_ms;
        }
        if let Some(cap) = self.session_cap {
            cfg.session_cap = cap;
        }
        if self.skip_missing {
            cfg.skip_missing = true;
        }
        if self.output.is_some() {
            cfg.output_path = self.output.clone();
        }
        Ok(cfg)
    }

    fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        // The subscriber also bridges `log` records.
        #[cfg(feature = "tracing")]
        if self.log_json && gaze_annotate::core::init_tracing(true) {
            return Ok(());
        }
        init_with_level(gaze_annotate::core::level_from_verbosity(
            self.verbose,
            self.quiet,
        ))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli.init_logging()?;
    let cfg = cli.resolve_config()?;

    let roots = DatasetRoots::new(&cfg.merged_root);
    let items = load_manifest(&cfg.manifest_path)?;
    let available = MergedSets::scan(&roots).filter_available(items);
    if available.is_empty() {
        warn!(
            "no available merged images; check {} and {}",
            cfg.merged_root.display(),
            cfg.manifest_path.display()
        );
        return Ok(());
    }

    let options = cfg.run_options();
    let (summary, report) = if cli.dry_run {
        let mut sink = ReportSink::default();
        let summary = run(&available, &roots, &mut sink, None, &options)?;
        (summary, sink.report)
    } else {
        let session = LabelingSession::open(cfg.base_url.as_str())?;
        let session_total = session.session_total();
        if session_total.is_none() {
            warn!(
                "could not read session size from {}, assuming {}",
                session.base_url(),
                options.session_cap
            );
        }
        let mut sink = Recording::new(session);
        let summary = run(&available, &roots, &mut sink, session_total, &options)?;
        (summary, sink.report)
    };

    finish(&cfg, &summary, &report)
}

fn finish(
    cfg: &AnnotateConfig,
    summary: &RunSummary,
    report: &AnnotationReport,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cfg.output_path {
        report.write_json(path)?;
        info!("wrote annotation report to {}", path.display());
    }
    info!(
        "done: {} image(s), {} annotation(s), {} skipped, {} warning(s)",
        summary.processed,
        summary.annotations,
        summary.skipped,
        warnings_logged()
    );
    println!(
        "annotated {} image(s) with {} annotation(s)",
        summary.processed, summary.annotations
    );
    Ok(())
}
