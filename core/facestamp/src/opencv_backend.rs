use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use log::debug;
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::error::FaceStampError;
use crate::face_detector::{DetectionParams, FaceDetector, FaceRect};

/// Face detector backed by OpenCV's `CascadeClassifier`.
///
/// The classifier file is an OpenCV Haar or LBP cascade definition
/// (e.g. `haarcascade_frontalface_default.xml`). The native handle is freed
/// when the detector is dropped.
pub struct CascadeDetector {
    classifier: Mutex<CascadeClassifier>,
}

impl CascadeDetector {
    /// Load a cascade definition from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FaceStampError> {
        let path = path.as_ref();
        let load_err = |reason: String| FaceStampError::ClassifierLoadError {
            path: path.to_path_buf(),
            reason,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| load_err("path is not valid UTF-8".to_string()))?;
        let classifier = CascadeClassifier::new(path_str).map_err(|e| load_err(e.to_string()))?;
        if classifier.empty().map_err(|e| load_err(e.to_string()))? {
            return Err(load_err("no cascade could be read from the file".to_string()));
        }

        Ok(Self {
            classifier: Mutex::new(classifier),
        })
    }
}

impl FaceDetector for CascadeDetector {
    fn detect(
        &self,
        photo: &DynamicImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, FaceStampError> {
        let detect_err = |e: opencv::Error| FaceStampError::DetectionError(e.to_string());

        // Cascades run on grayscale; share the luma buffer with OpenCV directly.
        let gray = photo.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(FaceStampError::ZeroDimensions);
        }
        let rows = i32::try_from(gray.height())
            .map_err(|e| FaceStampError::DetectionError(e.to_string()))?;
        let cols = i32::try_from(gray.width())
            .map_err(|e| FaceStampError::DetectionError(e.to_string()))?;
        let mat = Mat::new_rows_cols_with_data(rows, cols, gray.as_raw()).map_err(detect_err)?;

        debug!(
            "cascade: scale={} min_neighbours={} min_size={} max_size={}",
            params.scale, params.min_neighbours, params.min_size, params.max_size
        );

        let mut found: Vector<Rect> = Vector::new();
        let mut classifier = self
            .classifier
            .lock()
            .map_err(|e| FaceStampError::DetectionError(e.to_string()))?;
        classifier
            .detect_multi_scale(
                &*mat,
                &mut found,
                params.scale,
                params.min_neighbours,
                0,
                Size::new(params.min_size, params.min_size),
                Size::new(params.max_size, params.max_size),
            )
            .map_err(detect_err)?;

        Ok(found
            .iter()
            .map(|r| FaceRect::from_xywh(r.x, r.y, r.width, r.height))
            .collect())
    }
}
