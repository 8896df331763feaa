//! Detect faces in a photo and stamp a mascot image over each one.
//!
//! # Example
//!
//! ```no_run
//! use facestamp::{load_image, write_jpeg, FaceStamper, DEFAULT_JPEG_QUALITY};
//!
//! let photo = load_image("photo.jpg").unwrap();
//! let gopher = load_image("gopher.png").unwrap();
//! let result = FaceStamper::from_classifier("seeta_fd_frontal_v1.0.bin")
//!     .unwrap()
//!     .stamp(&photo, &gopher)
//!     .unwrap();
//! write_jpeg("output.jpg", &result.image, DEFAULT_JPEG_QUALITY).unwrap();
//! println!("Stamped {} face(s)", result.stamped);
//! ```
#![warn(missing_docs)]

mod composite;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
#[cfg(feature = "opencv")]
/// OpenCV cascade-classifier backend.
pub mod opencv_backend;
/// Overlay sizing and placement arithmetic.
pub mod placement;
#[cfg(feature = "rustface")]
/// SeetaFace-based face detector backend.
pub mod rustface_backend;

use std::path::Path;

use image::{DynamicImage, RgbImage};
use log::info;

/// Image loading, encoding and writing.
pub use composite::{encode_jpeg, load_image, write_jpeg, DEFAULT_JPEG_QUALITY};
/// Error type returned by facestamp operations.
pub use error::FaceStampError;
/// Face detection trait, parameters and rectangle type.
pub use face_detector::{DetectionParams, FaceDetector, FaceRect};
#[cfg(feature = "opencv")]
/// Detector that loads an OpenCV Haar/LBP cascade.
pub use opencv_backend::CascadeDetector;
/// Overlay placement coefficients.
pub use placement::{place_overlay, OverlayRegion, Placement};
#[cfg(feature = "rustface")]
/// Detector that loads a SeetaFace model.
pub use rustface_backend::SeetaDetector;

/// Result of stamping one photo.
#[derive(Debug, Clone)]
pub struct StampedPhoto {
    /// The composite, same size as the input photo, ready for JPEG encoding.
    pub image: RgbImage,

    /// Faces the composite was built from.
    pub faces: Vec<FaceRect>,

    /// Number of faces that received an overlay. Faces whose placement
    /// collapses to zero width are skipped.
    pub stamped: usize,
}

/// Load the built-in detector backend for the classifier at `path`.
///
/// With the `opencv` feature the file is read as an OpenCV cascade;
/// otherwise it is read as a SeetaFace model.
#[cfg(any(feature = "opencv", feature = "rustface"))]
pub fn load_detector(path: impl AsRef<Path>) -> Result<Box<dyn FaceDetector>, FaceStampError> {
    let path = path.as_ref();

    #[cfg(feature = "opencv")]
    let detector: Box<dyn FaceDetector> = Box::new(CascadeDetector::load(path)?);
    #[cfg(not(feature = "opencv"))]
    let detector: Box<dyn FaceDetector> = Box::new(SeetaDetector::load(path)?);

    info!("loaded classifier {}", path.display());
    Ok(detector)
}

/// Builder for stamping an overlay onto every face in a photo.
///
/// Holds the detector and the tuning parameters; the same stamper can be
/// reused across photos.
pub struct FaceStamper {
    detector: Box<dyn FaceDetector>,
    detection: DetectionParams,
    placement: Placement,
}

impl FaceStamper {
    /// Create a stamper around a custom face detector.
    ///
    /// ```no_run
    /// use facestamp::{DetectionParams, FaceDetector, FaceRect, FaceStampError, FaceStamper};
    /// use image::DynamicImage;
    ///
    /// struct FixedFaces(Vec<FaceRect>);
    /// impl FaceDetector for FixedFaces {
    ///     fn detect(
    ///         &self,
    ///         _photo: &DynamicImage,
    ///         _params: &DetectionParams,
    ///     ) -> Result<Vec<FaceRect>, FaceStampError> {
    ///         Ok(self.0.clone())
    ///     }
    /// }
    ///
    /// let stamper = FaceStamper::new(Box::new(FixedFaces(vec![
    ///     FaceRect::from_xywh(100, 100, 100, 100),
    /// ])));
    /// ```
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector,
            detection: DetectionParams::default(),
            placement: Placement::default(),
        }
    }

    /// Create a stamper using the built-in detector backend.
    #[cfg(any(feature = "opencv", feature = "rustface"))]
    pub fn from_classifier(path: impl AsRef<Path>) -> Result<Self, FaceStampError> {
        Ok(Self::new(load_detector(path)?))
    }

    /// Set the detection parameters (default: scale 1.1, 8 neighbours,
    /// sizes 200–800).
    pub fn detection(mut self, params: DetectionParams) -> Self {
        self.detection = params;
        self
    }

    /// Set the overlay placement coefficients (default: 3.0, 0.0, 0.0).
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Run face detection on `photo`.
    pub fn detect(&self, photo: &DynamicImage) -> Result<Vec<FaceRect>, FaceStampError> {
        let faces = self.detector.detect(photo, &self.detection)?;
        info!("detected {} face(s)", faces.len());
        Ok(faces)
    }

    /// Draw `overlay` over each of `faces` on a copy of `photo`.
    pub fn composite(
        &self,
        photo: &DynamicImage,
        overlay: &DynamicImage,
        faces: &[FaceRect],
    ) -> Result<StampedPhoto, FaceStampError> {
        if overlay.width() == 0 || overlay.height() == 0 {
            return Err(FaceStampError::ZeroDimensions);
        }
        let result = composite::composite_faces(photo, overlay, faces, &self.placement);
        info!(
            "stamped {} of {} face(s) on {}x{} photo",
            result.stamped,
            faces.len(),
            result.image.width(),
            result.image.height()
        );
        Ok(result)
    }

    /// Detect faces in `photo` and stamp `overlay` over each of them.
    pub fn stamp(
        &self,
        photo: &DynamicImage,
        overlay: &DynamicImage,
    ) -> Result<StampedPhoto, FaceStampError> {
        let faces = self.detect(photo)?;
        self.composite(photo, overlay, &faces)
    }
}
