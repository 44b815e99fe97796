use serde::{Deserialize, Serialize};

use crate::classify::{FocalPoint, GazeLabels, ObjectLocation, RelativeDistance, TargetType};
use crate::geometry::{BoundingBox, GazePoint};

/// One gaze annotation as submitted to the labeling session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub bbox: BoundingBox,
    pub gaze: GazePoint,
    pub target_type: TargetType,
    pub farther_closer: RelativeDistance,
    pub scale: String,
    pub object_detection: ObjectLocation,
    pub focal_point: FocalPoint,
    /// 1-based position within the image's annotations.
    pub gaze_number: u32,
}

impl AnnotationRecord {
    pub fn new(bbox: BoundingBox, gaze: GazePoint, labels: GazeLabels, gaze_number: u32) -> Self {
        Self {
            bbox,
            gaze,
            target_type: labels.target_type,
            farther_closer: labels.farther_closer,
            scale: labels.scale,
            object_detection: labels.object_detection,
            focal_point: labels.focal_point,
            gaze_number,
        }
    }
}
