mod common;

use std::fs;

use common::{write_png, Fixture};
use gaze_annotate::core::{ImageSize, ResolveError};
use gaze_annotate::dataset::{
    find_image_file, load_manifest, DatasetError, DatasetRoots, MergedSets,
};
use gaze_annotate::ImageResolver;

#[test]
fn scan_collects_relative_paths_and_vat_names() {
    let fx = Fixture::new();
    let sets = MergedSets::scan(&DatasetRoots::new(fx.merged_root()));

    assert!(sets.gazefollow.contains("train/00000001/a.png"));
    assert!(sets.gazefollow.contains("test2/00000000/b.png"));
    assert_eq!(sets.gazefollow.len(), 2);
    assert!(sets.vat.contains("00012.png"));
    assert!(sets.vat.contains("00400.png"));
}

#[test]
fn missing_roots_scan_to_empty_sets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sets = MergedSets::scan(&DatasetRoots::new(dir.path().join("nowhere")));
    assert!(sets.gazefollow.is_empty());
    assert!(sets.vat.is_empty());
}

#[test]
fn availability_filter_keeps_manifest_order() {
    let fx = Fixture::new();
    let items = load_manifest(fx.manifest()).expect("manifest");
    assert_eq!(items.len(), 6);

    let sets = MergedSets::scan(&DatasetRoots::new(fx.merged_root()));
    let available = sets.filter_available(items);
    let paths: Vec<&str> = available.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "train/00000001/a.png",
            "images/Frasier/clip_1/00012.png",
            "test2/00000000/b.png",
            "images/Friends/clip_7/00400.png",
        ]
    );
}

#[test]
fn resolver_reads_dimensions() {
    let fx = Fixture::new();
    let roots = DatasetRoots::new(fx.merged_root());
    let items = load_manifest(fx.manifest()).expect("manifest");

    let gf = roots.resolve(&items[0]).expect("gazefollow image");
    assert_eq!(gf.size, ImageSize::new(64, 48));
    assert!(gf.path.ends_with("gazefollow/train/00000001/a.png"));

    let vat = roots.resolve(&items[2]).expect("vat image");
    assert_eq!(vat.size, ImageSize::new(320, 240));
}

#[test]
fn unresolvable_items_report_file_name() {
    let fx = Fixture::new();
    let roots = DatasetRoots::new(fx.merged_root());
    let items = load_manifest(fx.manifest()).expect("manifest");

    for (idx, name) in [(1, "missing.png"), (4, "99999.png")] {
        let err = roots.resolve(&items[idx]).expect_err("missing image");
        match err {
            ResolveError::ImageNotFound { filename } => assert_eq!(filename, name),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn corrupt_image_is_unreadable() {
    let fx = Fixture::new();
    let bad = fx.merged_root().join("gazefollow/train/00000002/bad.png");
    fs::create_dir_all(bad.parent().expect("parent")).expect("mkdir");
    fs::write(&bad, b"not an image").expect("write");

    let item = gaze_annotate::SourceItem {
        path: "train/00000002/bad.png".into(),
        ..Default::default()
    };
    let err = DatasetRoots::new(fx.merged_root())
        .resolve(&item)
        .expect_err("unreadable");
    assert!(matches!(err, ResolveError::Unreadable { .. }));
}

#[test]
fn vat_lookup_falls_back_to_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(&dir.path().join("a/b/frame_0003.png"), 8, 8);

    let found = find_image_file(dir.path(), "frame_0003.jpg").expect("stem match");
    assert!(found.ends_with("a/b/frame_0003.png"));
    assert!(find_image_file(dir.path(), "frame_0004.png").is_none());
}

#[test]
fn manifest_errors_name_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("manifest.json");

    let err = load_manifest(&path).expect_err("missing manifest");
    assert!(matches!(err, DatasetError::Io { .. }));

    fs::write(&path, "{\"not\": \"a list\"}").expect("write");
    let err = load_manifest(&path).expect_err("bad manifest");
    assert!(matches!(err, DatasetError::Json { .. }));
    assert!(err.to_string().contains("manifest.json"));
}
