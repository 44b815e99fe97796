//! Manifest items and the dataset they belong to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::CoordinateSpace;

/// Path prefixes used by GazeFollow items in the combined manifest.
const GAZEFOLLOW_PREFIXES: [&str; 2] = ["train/", "test2/"];

/// Source dataset of a manifest item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// GazeFollow: relative `train/...` or `test2/...` paths, normalized coordinates.
    GazeFollow,
    /// VideoAttentionTarget: frame file names, pixel coordinates.
    VideoAttentionTarget,
}

impl DatasetKind {
    /// Classify an item by its manifest path.
    pub fn from_path(path: &str) -> Self {
        if GAZEFOLLOW_PREFIXES.iter().any(|p| path.starts_with(p)) {
            DatasetKind::GazeFollow
        } else {
            DatasetKind::VideoAttentionTarget
        }
    }

    pub fn coordinate_space(self) -> CoordinateSpace {
        match self {
            DatasetKind::GazeFollow => CoordinateSpace::Normalized,
            DatasetKind::VideoAttentionTarget => CoordinateSpace::Pixel,
        }
    }
}

/// One entry of the combined manifest.
///
/// Geometry fields are kept as raw JSON so that malformed values reach the
/// normalizer instead of failing deserialization of the whole manifest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gazes: Option<Value>,
}

impl SourceItem {
    pub fn dataset(&self) -> DatasetKind {
        DatasetKind::from_path(&self.path)
    }

    /// File-name component of `path`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Primary gaze, or `None` when the value is absent or empty: `null`,
    /// `false`, `0`, `""`, `[]` or `{}`.
    pub fn provided_gaze(&self) -> Option<&Value> {
        let v = self.gaze.as_ref()?;
        let empty = match v {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        };
        (!empty).then_some(v)
    }

    /// Additional explicit gaze points; empty unless `gazes` is an array.
    pub fn extra_gazes(&self) -> &[Value] {
        match &self.gazes {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dataset_is_inferred_from_path_prefix() {
        assert_eq!(
            DatasetKind::from_path("train/00000001/000001.jpg"),
            DatasetKind::GazeFollow
        );
        assert_eq!(
            DatasetKind::from_path("test2/00000000/00000003.jpg"),
            DatasetKind::GazeFollow
        );
        assert_eq!(
            DatasetKind::from_path("images/Frasier/1/00001.jpg"),
            DatasetKind::VideoAttentionTarget
        );
        assert_eq!(
            DatasetKind::from_path("training/x.jpg"),
            DatasetKind::VideoAttentionTarget
        );
    }

    #[test]
    fn lenient_deserialization_keeps_raw_geometry() {
        let item: SourceItem = serde_json::from_value(json!({
            "path": "clip/0001.jpg",
            "bbox": "broken",
            "eye": [1, 2],
            "meta": {"ignored": true}
        }))
        .expect("item");
        assert_eq!(item.bbox, Some(json!("broken")));
        assert_eq!(item.file_name(), "0001.jpg");
        assert!(item.provided_gaze().is_none());
        assert!(item.extra_gazes().is_empty());
    }

    #[test]
    fn empty_gaze_values_count_as_missing() {
        for gaze in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!({})] {
            let item = SourceItem {
                gaze: Some(gaze.clone()),
                ..SourceItem::default()
            };
            assert!(item.provided_gaze().is_none(), "gaze {gaze}");
        }
        for gaze in [json!(true), json!(1), json!("x"), json!({"x": 1}), json!([0, 0])] {
            let item = SourceItem {
                gaze: Some(gaze.clone()),
                ..SourceItem::default()
            };
            assert_eq!(item.provided_gaze(), Some(&gaze));
        }
    }

    #[test]
    fn empty_gaze_counts_as_missing() {
        let item = SourceItem {
            gaze: Some(json!([])),
            gazes: Some(json!("not a list")),
            ..SourceItem::default()
        };
        assert!(item.provided_gaze().is_none());
        assert!(item.extra_gazes().is_empty());
    }
}
