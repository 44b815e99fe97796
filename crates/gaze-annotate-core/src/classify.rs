//! Heuristic gaze labels derived from a face box and a gaze point.
//!
//! All thresholds are fixed. Distances are compared in image-proportional
//! pixel units: the normalized box and point are scaled back by the image
//! size before measuring.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::{BoundingBox, GazePoint, ImageSize};

/// Eye-contact radius as a fraction of the smaller face side.
const EYE_CONTACT_RADIUS: f64 = 0.3;
/// Beyond this many face sizes the target is "farther".
const FARTHER_FACTOR: f64 = 2.0;
/// Within this many face sizes the target is "closer".
const CLOSER_FACTOR: f64 = 0.5;
/// Assumed real-world face width in meters.
const FACE_WIDTH_METERS: f64 = 0.2;
/// Object-location bands on normalized coordinates.
const OBJECT_LOW: f64 = 0.3;
const OBJECT_HIGH: f64 = 0.7;
/// Focal-point thirds on normalized coordinates.
const FOCAL_LOW: f64 = 0.3333;
const FOCAL_HIGH: f64 = 0.6667;

/// What the subject is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "out-of-frame target")]
    OutOfFrame,
    #[serde(rename = "Eye-contact")]
    EyeContact,
    #[serde(rename = "in-frame target")]
    InFrame,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::OutOfFrame => "out-of-frame target",
            TargetType::EyeContact => "Eye-contact",
            TargetType::InFrame => "in-frame target",
        }
    }
}

/// Gaze target distance relative to the face size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeDistance {
    Farther,
    Closer,
    Equal,
}

impl RelativeDistance {
    pub fn as_str(self) -> &'static str {
        match self {
            RelativeDistance::Farther => "farther",
            RelativeDistance::Closer => "closer",
            RelativeDistance::Equal => "equal",
        }
    }
}

/// Coarse guess of the looked-at object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectLocation {
    #[serde(rename = "Camera/Viewer")]
    CameraViewer,
    #[serde(rename = "Object above (ceiling, sky, etc.)")]
    Above,
    #[serde(rename = "Object below (floor, ground, etc.)")]
    Below,
    #[serde(rename = "Object on left side")]
    Left,
    #[serde(rename = "Object on right side")]
    Right,
    #[serde(rename = "Central object")]
    Central,
}

impl ObjectLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectLocation::CameraViewer => "Camera/Viewer",
            ObjectLocation::Above => "Object above (ceiling, sky, etc.)",
            ObjectLocation::Below => "Object below (floor, ground, etc.)",
            ObjectLocation::Left => "Object on left side",
            ObjectLocation::Right => "Object on right side",
            ObjectLocation::Central => "Central object",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RelativeDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical band of a focal point. `Middle` never appears in a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vertical {
    Top,
    Middle,
    Bottom,
}

/// Horizontal band of a focal point. `Center` never appears in a label
/// except as the whole in-frame label `"center"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// 3x3 region of the frame (or around it) where the gaze lands.
///
/// Displays and serializes as `center`, `<h>`, `<v>`, `<v>-<h>`, with an
/// `out-of-frame` prefix when the point left the unit square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FocalPoint {
    pub out_of_frame: bool,
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl FocalPoint {
    /// Locate a normalized gaze point.
    pub fn locate(gaze: GazePoint) -> Self {
        let (gx, gy) = (gaze.x, gaze.y);
        let out_of_frame = !(0.0..=1.0).contains(&gx) || !(0.0..=1.0).contains(&gy);
        let (low, high) = if out_of_frame {
            (0.0, 1.0)
        } else {
            (FOCAL_LOW, FOCAL_HIGH)
        };

        let horizontal = if gx < low {
            Horizontal::Left
        } else if gx > high {
            Horizontal::Right
        } else {
            Horizontal::Center
        };
        let vertical = if gy < low {
            Vertical::Top
        } else if gy > high {
            Vertical::Bottom
        } else {
            Vertical::Middle
        };

        Self {
            out_of_frame,
            vertical,
            horizontal,
        }
    }

    fn region(&self) -> Option<String> {
        let v = match self.vertical {
            Vertical::Top => Some("top"),
            Vertical::Middle => None,
            Vertical::Bottom => Some("bottom"),
        };
        let h = match self.horizontal {
            Horizontal::Left => Some("left"),
            Horizontal::Center => None,
            Horizontal::Right => Some("right"),
        };
        match (v, h) {
            (None, None) => None,
            (Some(v), None) => Some(v.to_owned()),
            (None, Some(h)) => Some(h.to_owned()),
            (Some(v), Some(h)) => Some(format!("{v}-{h}")),
        }
    }
}

impl fmt::Display for FocalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.out_of_frame, self.region()) {
            (false, None) => f.write_str("center"),
            (false, Some(r)) => f.write_str(&r),
            (true, None) => f.write_str("out-of-frame"),
            (true, Some(r)) => write!(f, "out-of-frame {r}"),
        }
    }
}

/// Error parsing a focal-point label.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown focal point label: {0:?}")]
pub struct FocalPointParseError(pub String);

impl FromStr for FocalPoint {
    type Err = FocalPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FocalPointParseError(s.to_owned());
        let (out_of_frame, region) = match s.strip_prefix("out-of-frame") {
            Some("") => (true, ""),
            Some(rest) => (true, rest.strip_prefix(' ').ok_or_else(err)?),
            None if s == "center" => (false, ""),
            None => (false, s),
        };

        let mut vertical = Vertical::Middle;
        let mut horizontal = Horizontal::Center;
        if !region.is_empty() {
            let mut parts = region.splitn(2, '-');
            let first = parts.next().unwrap_or_default();
            match (first, parts.next()) {
                ("top", rest) | ("bottom", rest) => {
                    vertical = if first == "top" {
                        Vertical::Top
                    } else {
                        Vertical::Bottom
                    };
                    if let Some(h) = rest {
                        horizontal = parse_horizontal(h).ok_or_else(err)?;
                    }
                }
                (h, None) => horizontal = parse_horizontal(h).ok_or_else(err)?,
                _ => return Err(err()),
            }
        }

        Ok(Self {
            out_of_frame,
            vertical,
            horizontal,
        })
    }
}

fn parse_horizontal(s: &str) -> Option<Horizontal> {
    match s {
        "left" => Some(Horizontal::Left),
        "right" => Some(Horizontal::Right),
        _ => None,
    }
}

impl Serialize for FocalPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FocalPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The five labels attached to every annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GazeLabels {
    pub target_type: TargetType,
    pub farther_closer: RelativeDistance,
    /// Estimated face-to-target distance in meters, two decimals.
    pub scale: String,
    pub object_detection: ObjectLocation,
    pub focal_point: FocalPoint,
}

/// Derive all labels for one gaze point.
///
/// `bbox` and `gaze` are normalized; `size` scales them back to pixels for
/// the distance-based labels. Total for any finite input.
pub fn classify_gaze(bbox: &BoundingBox, gaze: &GazePoint, size: ImageSize) -> GazeLabels {
    let (width, height) = (size.width_f(), size.height_f());
    let (gaze_x, gaze_y) = (gaze.x * width, gaze.y * height);
    let face_w = bbox.w * width;
    let face_h = bbox.h * height;
    let (cx, cy) = (bbox.x * width + face_w / 2.0, bbox.y * height + face_h / 2.0);
    let distance = (gaze_x - cx).hypot(gaze_y - cy);

    let target_type = if gaze_x < 0.0 || gaze_x > width || gaze_y < 0.0 || gaze_y > height {
        TargetType::OutOfFrame
    } else if distance < face_w.min(face_h) * EYE_CONTACT_RADIUS {
        TargetType::EyeContact
    } else {
        TargetType::InFrame
    };

    let face_size = (face_w * face_h).sqrt();
    let farther_closer = if distance > face_size * FARTHER_FACTOR {
        RelativeDistance::Farther
    } else if distance < face_size * CLOSER_FACTOR {
        RelativeDistance::Closer
    } else {
        RelativeDistance::Equal
    };

    GazeLabels {
        target_type,
        farther_closer,
        scale: format!("{:.2}", distance / pixels_per_meter(face_w)),
        object_detection: locate_object(target_type, gaze),
        focal_point: FocalPoint::locate(*gaze),
    }
}

fn pixels_per_meter(face_w: f64) -> f64 {
    let ppm = face_w / FACE_WIDTH_METERS;
    if ppm > 0.0 {
        ppm
    } else {
        1.0
    }
}

fn locate_object(target_type: TargetType, gaze: &GazePoint) -> ObjectLocation {
    if target_type == TargetType::EyeContact {
        ObjectLocation::CameraViewer
    } else if gaze.y < OBJECT_LOW {
        ObjectLocation::Above
    } else if gaze.y > OBJECT_HIGH {
        ObjectLocation::Below
    } else if gaze.x < OBJECT_LOW {
        ObjectLocation::Left
    } else if gaze.x > OBJECT_HIGH {
        ObjectLocation::Right
    } else {
        ObjectLocation::Central
    }
}
