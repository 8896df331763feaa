use image::DynamicImage;

use crate::error::FaceStampError;

/// Axis-aligned box of a detected face, in photo pixel coordinates.
///
/// `max_x` and `max_y` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    /// Left edge (pixels).
    pub min_x: i32,
    /// Top edge (pixels).
    pub min_y: i32,
    /// Right edge, exclusive (pixels).
    pub max_x: i32,
    /// Bottom edge, exclusive (pixels).
    pub max_y: i32,
}

impl FaceRect {
    /// Build a rectangle from its top-left corner and size.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    /// Horizontal extent in pixels.
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    /// Vertical extent in pixels.
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// Tuning knobs for multi-scale face detection.
///
/// Sizes are square (width = height). `min_size <= max_size` is not checked;
/// an inverted range simply finds nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Growth factor between successive window sizes (typically ~1.1).
    pub scale: f64,
    /// Overlapping candidate windows required to accept a detection.
    pub min_neighbours: i32,
    /// Smallest face to look for (pixels).
    pub min_size: i32,
    /// Largest face to look for (pixels).
    pub max_size: i32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale: 1.1,
            min_neighbours: 8,
            min_size: 200,
            max_size: 800,
        }
    }
}

/// Pluggable face detection backend.
///
/// Implementations own whatever native state the classifier needs and
/// release it on drop. Use [`crate::load_detector`] for the built-in backend,
/// or implement this trait and pass it to [`crate::FaceStamper::new`].
pub trait FaceDetector: Send + Sync {
    /// Find faces in `photo`. An empty result is not an error.
    fn detect(
        &self,
        photo: &DynamicImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, FaceStampError>;
}
