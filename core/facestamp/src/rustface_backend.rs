use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use image::DynamicImage;
use log::debug;

use crate::error::FaceStampError;
use crate::face_detector::{DetectionParams, FaceDetector, FaceRect};

/// Smallest face size the SeetaFace engine accepts.
const MIN_FACE_SIZE_FLOOR: u32 = 20;

/// Score a window must reach to count as a face.
const SCORE_THRESHOLD: f64 = 2.0;

/// Upper bound on the hierarchy count in a model header. Real models carry a
/// handful; anything larger is not a SeetaFace model.
const MAX_HIERARCHIES: i32 = 64;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The classifier file is a SeetaFace funnel-structured cascade model
/// (e.g. `seeta_fd_frontal_v1.0.bin`). Detected faces are kept only when
/// their width lies within `min_size..=max_size`. The engine suppresses
/// overlapping windows on its own, so `min_neighbours` has no effect here.
pub struct SeetaDetector {
    model: rustface::Model,
}

impl SeetaDetector {
    /// Load a SeetaFace model from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FaceStampError> {
        let path = path.as_ref();
        let load_err = |reason: String| FaceStampError::ClassifierLoadError {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| load_err(e.to_string()))?;
        check_model_header(&bytes).map_err(|reason| load_err(reason.to_string()))?;

        // rustface panics on an unknown classifier kind instead of returning an error.
        let model = panic::catch_unwind(AssertUnwindSafe(|| {
            rustface::read_model(Cursor::new(&bytes[..]))
        }))
        .map_err(|_| load_err("malformed SeetaFace model".to_string()))?
        .map_err(|e| load_err(e.to_string()))?;
        Ok(Self { model })
    }
}

/// Reject files that are clearly not SeetaFace models before rustface sizes
/// allocations from their header.
fn check_model_header(bytes: &[u8]) -> Result<(), &'static str> {
    let first_non_space = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first_non_space == Some(&b'<') {
        return Err("looks like an OpenCV XML cascade; build with the `opencv` feature to use it");
    }
    if bytes.len() < 16 {
        return Err("file too short for a SeetaFace model");
    }
    let num_hierarchy = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if !(1..=MAX_HIERARCHIES).contains(&num_hierarchy) {
        return Err("implausible hierarchy count in SeetaFace model header");
    }
    Ok(())
}

/// Whether a face width falls within the requested size range. Non-positive
/// bounds are treated as unset.
fn within_size_range(face: &FaceRect, params: &DetectionParams) -> bool {
    let width = face.width();
    (params.min_size <= 0 || width >= params.min_size)
        && (params.max_size <= 0 || width <= params.max_size)
}

impl FaceDetector for SeetaDetector {
    fn detect(
        &self,
        photo: &DynamicImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, FaceStampError> {
        let gray = photo.to_luma8();
        let (width, height) = (gray.width(), gray.height());
        if width == 0 || height == 0 {
            return Err(FaceStampError::ZeroDimensions);
        }

        // Nothing the engine can report would pass the size filter.
        if params.max_size > 0
            && (params.max_size < params.min_size || (params.max_size as u32) < MIN_FACE_SIZE_FLOOR)
        {
            debug!(
                "seeta: size range {}..={} is empty, skipping detection",
                params.min_size, params.max_size
            );
            return Ok(Vec::new());
        }

        let min_face_size = u32::try_from(params.min_size)
            .unwrap_or(0)
            .max(MIN_FACE_SIZE_FLOOR);
        let pyramid_scale = pyramid_scale_factor(params.scale);
        debug!(
            "seeta: min_face_size={min_face_size} max_face_size={} pyramid_scale={pyramid_scale:.3} (min_neighbours={} ignored)",
            params.max_size, params.min_neighbours
        );

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(min_face_size);
        if params.max_size > 0 {
            detector.set_max_face_size(params.max_size as u32);
        }
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(pyramid_scale);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRect::from_xywh(
                    bbox.x(),
                    bbox.y(),
                    bbox.width() as i32,
                    bbox.height() as i32,
                )
            })
            .filter(|face| within_size_range(face, params))
            .collect())
    }
}

/// Convert a window growth factor (> 1) into the engine's pyramid shrink
/// factor, which must stay within `[0.01, 0.99]`.
fn pyramid_scale_factor(scale: f64) -> f32 {
    if !scale.is_finite() || scale <= 1.0 {
        return 0.99;
    }
    ((1.0 / scale) as f32).clamp(0.01, 0.99)
}
