#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

/// Merged-image tree plus manifest in a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Two GazeFollow images, two VAT frames, and a manifest that also lists
    /// one item of each dataset with no image on disk.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("merged");

        write_png(&root.join("gazefollow/train/00000001/a.png"), 64, 48);
        write_png(&root.join("gazefollow/test2/00000000/b.png"), 100, 100);
        write_png(&root.join("vat/Frasier/clip_1/00012.png"), 320, 240);
        write_png(&root.join("vat/Friends/clip_7/00400.png"), 640, 360);

        let manifest = json!([
            {
                "path": "train/00000001/a.png",
                "bbox": [0.4, 0.1, 0.2, 0.3],
                "eye": [0.5, 0.2],
                "gaze": [0.5, 0.2]
            },
            {
                "path": "train/00000009/missing.png",
                "bbox": [0.1, 0.1, 0.1, 0.1],
                "eye": [0.1, 0.1]
            },
            {
                "path": "images/Frasier/clip_1/00012.png",
                "bbox": [200, 20, -40, 60],
                "eye": [180, 50],
                "gaze": [-1, 120],
                "gazes": [[10, 10]]
            },
            {
                "path": "test2/00000000/b.png",
                "bbox": [0.3, 0.3, 0.2, 0.2],
                "eye": [0.4, 0.4],
                "gaze": [0.35, 0.35]
            },
            {
                "path": "images/Other/clip/99999.png",
                "eye": [1, 1]
            },
            {
                "path": "images/Friends/clip_7/00400.png",
                "bbox": "garbage",
                "eye": [320, 180]
            }
        ]);
        fs::write(
            dir.path().join("manifest.json"),
            serde_json::to_string_pretty(&manifest).expect("manifest json"),
        )
        .expect("write manifest");

        Self { dir }
    }

    pub fn merged_root(&self) -> PathBuf {
        self.dir.path().join("merged")
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.path().join("manifest.json")
    }
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    image::GrayImage::new(width, height)
        .save(path)
        .expect("write png");
}
