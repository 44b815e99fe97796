mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use common::Fixture;
use gaze_annotate::run::AnnotationReport;
use predicates::prelude::*;

fn gaze_annotate(fx: &Fixture) -> Command {
    gaze_annotate_in(fx, &fx.merged_root())
}

fn gaze_annotate_in(fx: &Fixture, merged_root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gaze-annotate").expect("binary");
    cmd.env_remove("MERGED_ROOT")
        .env_remove("BASE_URL")
        .arg("--merged-root")
        .arg(merged_root)
        .arg("--manifest")
        .arg(fx.manifest())
        .args(["--pacing-ms", "0", "--dry-run"]);
    cmd
}

#[test]
fn dry_run_writes_report() {
    let fx = Fixture::new();
    let report = fx.dir.path().join("out/report.json");
    fs::create_dir_all(report.parent().expect("parent")).expect("mkdir");

    gaze_annotate(&fx)
        .arg("-o")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "annotated 4 image(s) with 7 annotation(s)",
        ));

    let loaded = AnnotationReport::load_json(&report).expect("report");
    let indices: Vec<usize> = loaded.entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn limit_flag_caps_the_run() {
    let fx = Fixture::new();
    gaze_annotate(&fx)
        .args(["--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("annotated 2 image(s)"));
}

#[test]
fn config_file_is_overridden_by_flags() {
    let fx = Fixture::new();
    let config = fx.dir.path().join("annotate.json");
    fs::write(&config, r#"{"limit": 1, "merged_root": "/does/not/exist"}"#).expect("write");

    gaze_annotate(&fx)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("annotated 1 image(s)"));
}

#[test]
fn missing_manifest_fails() {
    let fx = Fixture::new();
    fs::remove_file(fx.manifest()).expect("remove manifest");

    gaze_annotate(&fx)
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest.json"));
}

#[test]
fn empty_merge_is_not_an_error() {
    let fx = Fixture::new();
    let empty = fx.dir.path().join("empty");
    fs::create_dir_all(&empty).expect("mkdir");

    gaze_annotate_in(&fx, &empty)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
