//! Bounding-box and gaze-point normalization into the unit square.
//!
//! Raw geometry comes straight out of dataset manifests and may be in pixel
//! space, encoded by opposite corners, truncated or not numeric at all. None
//! of that is an error here: every malformed input resolves to a documented
//! default, tagged as [`Resolved::Fallback`] so callers can tell it apart from
//! measured data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Box used when the source box is missing or malformed: centered, half-size.
pub const DEFAULT_BOX: BoundingBox = BoundingBox {
    x: 0.25,
    y: 0.25,
    w: 0.5,
    h: 0.5,
};

/// Point used when the source point is missing or malformed: image center.
pub const DEFAULT_POINT: GazePoint = GazePoint { x: 0.5, y: 0.5 };

/// Normalized value for a negative pixel coordinate ("off-frame on this side").
pub const OFF_FRAME_SENTINEL: f64 = -0.05;

/// Axis-aligned box `(x, y, w, h)`, origin top-left.
///
/// Serialized as a plain `[x, y, w, h]` array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Center of the box in the same units as the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    fn clamped_unit(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
            w: self.w.clamp(0.0, 1.0),
            h: self.h.clamp(0.0, 1.0),
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, w, h]: [f64; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// Gaze target `(x, y)`. Normalized points may lie outside `[0, 1]`.
///
/// Serialized as a plain `[x, y]` array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

impl GazePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &GazePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for GazePoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<GazePoint> for [f64; 2] {
    fn from(p: GazePoint) -> Self {
        [p.x, p.y]
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub(crate) fn width_f(&self) -> f64 {
        f64::from(self.width)
    }

    pub(crate) fn height_f(&self) -> f64 {
        f64::from(self.height)
    }
}

/// How the raw coordinates of a source item are expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Already relative to the image size.
    Normalized,
    /// Pixel units; divided by the image size during normalization.
    Pixel,
}

/// Result of a normalization step, tagged with where the value came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved<T> {
    /// Derived from the source data.
    Measured(T),
    /// The source data was missing or malformed; the documented default was used.
    Fallback(T),
}

impl<T: Copy> Resolved<T> {
    pub fn value(&self) -> T {
        match self {
            Resolved::Measured(v) | Resolved::Fallback(v) => *v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback(_))
    }
}

/// Mirror negative width/height so the box starts at its true top-left edge.
///
/// The covered rectangle is unchanged.
pub fn rectify_box(raw: BoundingBox) -> BoundingBox {
    let BoundingBox {
        mut x,
        mut y,
        mut w,
        mut h,
    } = raw;
    if w < 0.0 {
        x += w;
        w = -w;
    }
    if h < 0.0 {
        y += h;
        h = -h;
    }
    BoundingBox { x, y, w, h }
}

/// Normalize a raw manifest box into the unit square.
///
/// Missing boxes, boxes with fewer than four components, or any non-numeric
/// component fall back to [`DEFAULT_BOX`]. Otherwise the box is rectified,
/// divided by the image size when `space` is [`CoordinateSpace::Pixel`], and
/// clamped component-wise to `[0, 1]`.
pub fn normalize_box(
    raw: Option<&Value>,
    space: CoordinateSpace,
    size: ImageSize,
) -> Resolved<BoundingBox> {
    let Some([x, y, w, h]) = raw.and_then(numeric_prefix::<4>) else {
        return Resolved::Fallback(DEFAULT_BOX);
    };

    let mut b = rectify_box(BoundingBox { x, y, w, h });
    if space == CoordinateSpace::Pixel {
        let (sx, sy) = (size.width_f(), size.height_f());
        b = BoundingBox {
            x: b.x / sx,
            y: b.y / sy,
            w: b.w / sx,
            h: b.h / sy,
        };
    }
    Resolved::Measured(b.clamped_unit())
}

/// Normalize a raw manifest point.
///
/// Missing, short, or non-numeric points fall back to [`DEFAULT_POINT`].
/// Normalized input passes through untouched, out-of-frame values included.
/// Pixel input is divided by the image size, except that a negative pixel
/// coordinate becomes [`OFF_FRAME_SENTINEL`].
pub fn normalize_point(
    raw: Option<&Value>,
    space: CoordinateSpace,
    size: ImageSize,
) -> Resolved<GazePoint> {
    let Some([x, y]) = raw.and_then(numeric_prefix::<2>) else {
        return Resolved::Fallback(DEFAULT_POINT);
    };

    match space {
        CoordinateSpace::Normalized => Resolved::Measured(GazePoint { x, y }),
        CoordinateSpace::Pixel => Resolved::Measured(GazePoint {
            x: pixel_to_unit(x, size.width_f()),
            y: pixel_to_unit(y, size.height_f()),
        }),
    }
}

fn pixel_to_unit(v: f64, extent: f64) -> f64 {
    if v >= 0.0 {
        v / extent
    } else {
        OFF_FRAME_SENTINEL
    }
}

/// First `N` components of a JSON array, if there are at least `N` and all
/// of them are numeric.
fn numeric_prefix<const N: usize>(value: &Value) -> Option<[f64; N]> {
    let items = value.as_array()?;
    if items.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = as_number(item)?;
    }
    Some(out)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
