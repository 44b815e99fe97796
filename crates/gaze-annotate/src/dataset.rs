//! Merged GazeFollow/VAT image trees and the combined manifest.
//!
//! Layout under the merged root:
//! - `gazefollow/` mirrors the manifest's `train/...` and `test2/...` paths,
//! - `vat/` holds VideoAttentionTarget frames anywhere below it, matched by
//!   file name.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use gaze_annotate_core::{
    DatasetKind, ImageMetadata, ImageResolver, ImageSize, ResolveError, SourceItem,
};
use image::ImageReader;
use log::{debug, info, warn};
use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the combined manifest: a JSON array of [`SourceItem`]s.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<SourceItem>, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<SourceItem> =
        serde_json::from_str(&raw).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("loaded {} manifest items from {}", items.len(), path.display());
    Ok(items)
}

/// Locations of the two merged image trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRoots {
    pub gazefollow: PathBuf,
    pub vat: PathBuf,
}

impl DatasetRoots {
    /// Roots for the standard `gazefollow/` + `vat/` layout under `merged_root`.
    pub fn new(merged_root: impl AsRef<Path>) -> Self {
        let root = merged_root.as_ref();
        Self {
            gazefollow: root.join("gazefollow"),
            vat: root.join("vat"),
        }
    }

    /// Path of the item's image file, if it exists.
    pub fn locate(&self, item: &SourceItem) -> Option<PathBuf> {
        match item.dataset() {
            DatasetKind::GazeFollow => {
                let full = item
                    .path
                    .split('/')
                    .fold(self.gazefollow.clone(), |acc, part| acc.join(part));
                full.is_file().then_some(full)
            }
            DatasetKind::VideoAttentionTarget => find_image_file(&self.vat, item.file_name()),
        }
    }
}

impl ImageResolver for DatasetRoots {
    fn resolve(&self, item: &SourceItem) -> Result<ImageMetadata, ResolveError> {
        let path = self
            .locate(item)
            .ok_or_else(|| ResolveError::ImageNotFound {
                filename: item.file_name().to_owned(),
            })?;
        let (width, height) =
            read_dimensions(&path).map_err(|source| ResolveError::Unreadable {
                path: path.clone(),
                source: Box::new(source),
            })?;
        Ok(ImageMetadata {
            path,
            size: ImageSize::new(width, height),
        })
    }
}

fn read_dimensions(path: &Path) -> Result<(u32, u32), image::ImageError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
}

/// First file below `base` named `filename`, or sharing its stem.
pub fn find_image_file(base: &Path, filename: &str) -> Option<PathBuf> {
    let wanted_stem = Path::new(filename).file_stem();
    WalkDir::new(base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            let name = entry.file_name();
            name == filename
                || (wanted_stem.is_some() && Path::new(name).file_stem() == wanted_stem)
        })
        .map(|entry| entry.into_path())
}

/// Files actually present in the merged trees.
#[derive(Clone, Debug, Default)]
pub struct MergedSets {
    /// GazeFollow paths relative to the GazeFollow root, `/`-separated.
    pub gazefollow: HashSet<String>,
    /// VAT file names.
    pub vat: HashSet<String>,
}

impl MergedSets {
    /// Walk both roots. An unreadable root is logged and contributes nothing.
    pub fn scan(roots: &DatasetRoots) -> Self {
        let mut sets = Self::default();

        for entry in walk_files(&roots.gazefollow, "GazeFollow") {
            if let Ok(rel) = entry.path().strip_prefix(&roots.gazefollow) {
                let parts: Vec<_> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                sets.gazefollow.insert(parts.join("/"));
            }
        }
        for entry in walk_files(&roots.vat, "VAT") {
            sets.vat.insert(entry.file_name().to_string_lossy().into_owned());
        }

        debug!(
            "merged sets: {} GazeFollow files, {} VAT files",
            sets.gazefollow.len(),
            sets.vat.len()
        );
        sets
    }

    pub fn contains(&self, item: &SourceItem) -> bool {
        match item.dataset() {
            DatasetKind::GazeFollow => self.gazefollow.contains(&item.path),
            DatasetKind::VideoAttentionTarget => self.vat.contains(item.file_name()),
        }
    }

    /// Keep the items whose image is present, in manifest order.
    pub fn filter_available(&self, items: Vec<SourceItem>) -> Vec<SourceItem> {
        let available: Vec<SourceItem> = items.into_iter().filter(|i| self.contains(i)).collect();
        info!("available merged images: {}", available.len());
        available
    }
}

fn walk_files<'a>(
    root: &'a Path,
    label: &'static str,
) -> impl Iterator<Item = walkdir::DirEntry> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("failed to scan merged {label} under {}: {err}", root.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
}
