use crate::face_detector::FaceRect;

/// Default overlay width as a multiple of the detected face width.
pub const DEFAULT_SIZE_COEFF: f64 = 3.0;

/// How the overlay is sized and shifted relative to each detected face.
///
/// The same coefficients apply to every face in the photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Overlay width = face width × `size_coeff`.
    pub size_coeff: f64,
    /// Horizontal shift as a fraction of the overlay width. Positive moves left.
    pub x_coeff: f64,
    /// Vertical shift as a fraction of the overlay width. Positive moves up.
    pub y_coeff: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            size_coeff: DEFAULT_SIZE_COEFF,
            x_coeff: 0.0,
            y_coeff: 0.0,
        }
    }
}

/// Where a resized overlay lands in composite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRegion {
    /// X of the overlay's top-left corner. May be negative or past the edge.
    pub x: i64,
    /// Y of the overlay's top-left corner. May be negative or past the edge.
    pub y: i64,
    /// Target overlay width; height follows the overlay's aspect ratio.
    pub width: u32,
}

impl OverlayRegion {
    /// Overlay height for a source of `src_width` × `src_height`, keeping its
    /// aspect ratio. Never zero.
    pub fn height_for(&self, src_width: u32, src_height: u32) -> u32 {
        if src_width == 0 {
            return 1;
        }
        let h = (self.width as f64 * src_height as f64 / src_width as f64).round() as u32;
        h.max(1)
    }
}

/// Compute the overlay region for one detected face.
///
/// Returns `None` when the coefficients shrink the overlay to zero or a
/// negative width; such faces are skipped rather than treated as errors.
pub fn place_overlay(face: &FaceRect, placement: &Placement) -> Option<OverlayRegion> {
    let size = (face.width() as f64 * placement.size_coeff).round();
    if size.is_nan() || size < 1.0 {
        return None;
    }
    let size = size.min(u32::MAX as f64) as u32;

    let x_offset = (size as f64 * placement.x_coeff).round() as i64;
    let y_offset = (size as f64 * placement.y_coeff).round() as i64;

    Some(OverlayRegion {
        x: (face.min_x as i64).saturating_sub(x_offset),
        y: (face.min_y as i64).saturating_sub(y_offset),
        width: size,
    })
}
