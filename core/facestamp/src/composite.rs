use std::fs::File;
use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbImage, RgbaImage};
use log::debug;

use crate::error::FaceStampError;
use crate::face_detector::FaceRect;
use crate::placement::{place_overlay, OverlayRegion, Placement};
use crate::StampedPhoto;

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Decode input bytes into a `DynamicImage`. The format is sniffed from the
/// content, never from a file name.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, FaceStampError> {
    let image =
        image::load_from_memory(input).map_err(|e| FaceStampError::DecodeError(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(FaceStampError::ZeroDimensions);
    }
    Ok(image)
}

/// Read and decode an image file (JPEG, PNG or WebP).
///
/// A missing file and a file that is not an image both surface as
/// [`FaceStampError::DecodeError`].
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, FaceStampError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| FaceStampError::DecodeError(format!("{}: {e}", path.display())))?;
    decode_image(&bytes).map_err(|e| match e {
        FaceStampError::DecodeError(reason) => {
            FaceStampError::DecodeError(format!("{}: {reason}", path.display()))
        }
        other => other,
    })
}

/// Resize the overlay to the region's width, keeping its aspect ratio.
pub(crate) fn resize_overlay(overlay: &RgbaImage, region: &OverlayRegion) -> RgbaImage {
    let height = region.height_for(overlay.width(), overlay.height());
    image::imageops::resize(overlay, region.width, height, FilterType::Lanczos3)
}

/// Overlays larger than this many times the photo's longest side are only
/// resampled where they cover the photo.
const OVERSIZE_FACTOR: u32 = 4;

/// Resample just the part of an oversized overlay region that lands on a
/// `canvas_width` × `canvas_height` canvas.
///
/// Returns the visible patch and its top-left corner on the canvas, or `None`
/// when the region misses the canvas entirely. The patch is aligned to whole
/// source pixels, so its edges may be off by less than one magnified source
/// pixel compared with resizing the full overlay.
pub(crate) fn visible_overlay(
    overlay: &RgbaImage,
    region: &OverlayRegion,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<(RgbaImage, i64, i64)> {
    let (src_w, src_h) = overlay.dimensions();
    let height = region.height_for(src_w, src_h);

    let x0 = region.x.max(0);
    let y0 = region.y.max(0);
    let x1 = region.x.saturating_add(region.width as i64).min(canvas_width as i64);
    let y1 = region.y.saturating_add(height as i64).min(canvas_height as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let source_span = |from: i64, to: i64, origin: i64, dst: u32, src: u32| {
        let scale = src as f64 / dst as f64;
        let start = (((from - origin) as f64 * scale).floor() as u32).min(src - 1);
        let end = (((to - origin) as f64 * scale).ceil() as u32).clamp(start + 1, src);
        (start, end - start)
    };
    let (sx, sw) = source_span(x0, x1, region.x, region.width, src_w);
    let (sy, sh) = source_span(y0, y1, region.y, height, src_h);

    let patch = image::imageops::crop_imm(overlay, sx, sy, sw, sh).to_image();
    let resized = image::imageops::resize(
        &patch,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
        FilterType::Lanczos3,
    );
    Some((resized, x0, y0))
}

/// Draw the overlay over a copy of `photo` once per face.
///
/// Faces whose placement is degenerate are skipped. Drawing is alpha-over and
/// clipped to the photo bounds, so the result always has the photo's size.
pub(crate) fn composite_faces(
    photo: &DynamicImage,
    overlay: &DynamicImage,
    faces: &[FaceRect],
    placement: &Placement,
) -> StampedPhoto {
    let mut canvas = photo.to_rgba8();
    let overlay = overlay.to_rgba8();
    let mut stamped = 0;

    for face in faces {
        let Some(region) = place_overlay(face, placement) else {
            debug!("skipping face {face:?}: overlay size collapses to zero");
            continue;
        };
        let limit = canvas.width().max(canvas.height()).saturating_mul(OVERSIZE_FACTOR);
        let height = region.height_for(overlay.width(), overlay.height());
        if region.width > limit || height > limit {
            debug!(
                "stamping face {face:?} with oversized {}x{height} overlay at ({}, {}), visible part only",
                region.width, region.x, region.y
            );
            if let Some((patch, x, y)) =
                visible_overlay(&overlay, &region, canvas.width(), canvas.height())
            {
                image::imageops::overlay(&mut canvas, &patch, x, y);
            }
            stamped += 1;
            continue;
        }

        let resized = resize_overlay(&overlay, &region);
        debug!(
            "stamping face {face:?} with {}x{} overlay at ({}, {})",
            resized.width(),
            resized.height(),
            region.x,
            region.y
        );
        image::imageops::overlay(&mut canvas, &resized, region.x, region.y);
        stamped += 1;
    }

    StampedPhoto {
        image: flatten_alpha(&canvas),
        faces: faces.to_vec(),
        stamped,
    }
}

/// Flatten the alpha channel by compositing onto black. JPEG carries no alpha.
pub(crate) fn flatten_alpha(image: &RgbaImage) -> RgbImage {
    let (width, height) = (image.width(), image.height());
    let mut rgb = RgbImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 255 {
            rgb.put_pixel(x, y, image::Rgb([r, g, b]));
            continue;
        }
        let alpha = a as f32 / 255.0;
        let out_r = (r as f32 * alpha).round() as u8;
        let out_g = (g as f32 * alpha).round() as u8;
        let out_b = (b as f32 * alpha).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([out_r, out_g, out_b]));
    }

    rgb
}

/// Encode an image as JPEG at the given quality (1–100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, FaceStampError> {
    if !(1..=100).contains(&quality) {
        return Err(FaceStampError::InvalidQuality(quality));
    }

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| FaceStampError::EncodeError(e.to_string()))?;

    Ok(buffer)
}

/// Encode `image` as JPEG and write it to `path`, creating or truncating it.
///
/// Encoding happens before the file is opened, so an encode failure leaves
/// any existing file untouched.
pub fn write_jpeg(
    path: impl AsRef<Path>,
    image: &RgbImage,
    quality: u8,
) -> Result<(), FaceStampError> {
    let path = path.as_ref();
    let data = encode_jpeg(image, quality)?;

    let write_err = |source| FaceStampError::FileWriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(write_err)?;
    file.write_all(&data).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
