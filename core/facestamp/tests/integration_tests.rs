use std::path::{Path, PathBuf};

use facestamp::{
    load_image, write_jpeg, DetectionParams, FaceDetector, FaceRect, FaceStampError, FaceStamper,
    Placement, DEFAULT_JPEG_QUALITY,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

struct FixedFaces(Vec<FaceRect>);

impl FaceDetector for FixedFaces {
    fn detect(
        &self,
        _photo: &DynamicImage,
        _params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, FaceStampError> {
        Ok(self.0.clone())
    }
}

fn write_fixture(dir: &Path, name: &str, image: &DynamicImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    image
        .save_with_format(&path, format)
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
    path
}

fn gradient_photo(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96]);
    }
    DynamicImage::ImageRgb8(img)
}

fn solid_gopher(size: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([240, 200, 20, 255])))
}

fn run_once(dir: &Path, photo: &Path, gopher: &Path, faces: Vec<FaceRect>, out: &str) -> PathBuf {
    let stamper = FaceStamper::new(Box::new(FixedFaces(faces)));
    let photo = load_image(photo).unwrap();
    let gopher = load_image(gopher).unwrap();
    let result = stamper.stamp(&photo, &gopher).unwrap();
    let out = dir.join(out);
    write_jpeg(&out, &result.image, DEFAULT_JPEG_QUALITY).unwrap();
    out
}

#[test]
fn end_to_end_single_face_writes_photo_sized_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_fixture(dir.path(), "photo.png", &gradient_photo(400, 400), ImageFormat::Png);
    let gopher = write_fixture(dir.path(), "gopher.png", &solid_gopher(50), ImageFormat::Png);

    let face = FaceRect {
        min_x: 100,
        min_y: 100,
        max_x: 200,
        max_y: 200,
    };
    let out = run_once(dir.path(), &photo, &gopher, vec![face], "output.jpg");

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!((decoded.width(), decoded.height()), (400, 400));

    // Deep inside the 300x300 overlay: close to the gopher colour after JPEG.
    let pixel = decoded.get_pixel(250, 250);
    assert!((pixel.0[0] as i16 - 240).abs() <= 8, "got {pixel:?}");
    assert!((pixel.0[1] as i16 - 200).abs() <= 8, "got {pixel:?}");
    assert!((pixel.0[2] as i16 - 20).abs() <= 8, "got {pixel:?}");
}

#[test]
fn jpeg_inputs_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    // Extension lies on purpose: decoding goes by content.
    let photo = write_fixture(dir.path(), "photo.png", &gradient_photo(120, 80), ImageFormat::Jpeg);
    let gopher = write_fixture(dir.path(), "gopher.dat", &solid_gopher(16), ImageFormat::Png);

    let out = run_once(
        dir.path(),
        &photo,
        &gopher,
        vec![FaceRect::from_xywh(10, 10, 20, 20)],
        "out.jpg",
    );
    let decoded = image::open(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (120, 80));
}

#[test]
fn no_faces_reencodes_photo_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let original = gradient_photo(64, 48);
    let photo = write_fixture(dir.path(), "photo.png", &original, ImageFormat::Png);
    let gopher = write_fixture(dir.path(), "gopher.png", &solid_gopher(8), ImageFormat::Png);

    let out = run_once(dir.path(), &photo, &gopher, vec![], "out.jpg");

    let expected = facestamp::encode_jpeg(&original.to_rgb8(), DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), expected);
}

#[test]
fn identical_runs_produce_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_fixture(dir.path(), "photo.png", &gradient_photo(160, 120), ImageFormat::Png);
    let gopher = write_fixture(dir.path(), "gopher.png", &solid_gopher(12), ImageFormat::Png);
    let faces = vec![FaceRect::from_xywh(20, 20, 30, 30), FaceRect::from_xywh(90, 40, 25, 25)];

    let a = run_once(dir.path(), &photo, &gopher, faces.clone(), "a.jpg");
    let b = run_once(dir.path(), &photo, &gopher, faces, "b.jpg");
    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn non_image_photo_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, b"this is not a photo").unwrap();

    let err = load_image(&path).unwrap_err();
    assert!(matches!(err, FaceStampError::DecodeError(_)), "{err:?}");
}

#[test]
fn missing_gopher_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_image(dir.path().join("gopher.png")).unwrap_err();
    assert!(matches!(err, FaceStampError::DecodeError(_)), "{err:?}");
}

#[test]
fn write_truncates_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.jpg");
    std::fs::write(&out, vec![0u8; 1 << 20]).unwrap();

    let image = gradient_photo(16, 16).to_rgb8();
    write_jpeg(&out, &image, DEFAULT_JPEG_QUALITY).unwrap();

    let written = std::fs::read(&out).unwrap();
    assert!(written.len() < 1 << 20);
    assert_eq!(&written[0..2], &[0xFF, 0xD8]);
}

#[test]
fn failed_encode_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.jpg");
    let image = gradient_photo(16, 16).to_rgb8();

    let err = write_jpeg(&out, &image, 0).unwrap_err();
    assert!(matches!(err, FaceStampError::InvalidQuality(0)));
    assert!(!out.exists());
}

#[test]
fn unwritable_output_is_file_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing-dir").join("out.jpg");
    let image = gradient_photo(16, 16).to_rgb8();

    let err = write_jpeg(&out, &image, DEFAULT_JPEG_QUALITY).unwrap_err();
    assert!(matches!(err, FaceStampError::FileWriteError { .. }), "{err:?}");
}

#[test]
fn offset_coefficients_move_the_overlay() {
    let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
    let gopher = solid_gopher(10);
    let face = FaceRect::from_xywh(40, 40, 10, 10);

    let stamper = FaceStamper::new(Box::new(FixedFaces(vec![face]))).placement(Placement {
        size_coeff: 2.0,
        x_coeff: -0.5,
        y_coeff: 0.5,
    });
    // size 20 → x = 40 + 10 = 50, y = 40 - 10 = 30
    let result = stamper.stamp(&photo, &gopher).unwrap();
    assert_eq!(result.image.get_pixel(50, 30), &Rgb([240, 200, 20]));
    assert_eq!(result.image.get_pixel(69, 49), &Rgb([240, 200, 20]));
    assert_eq!(result.image.get_pixel(49, 30), &Rgb([0, 0, 0]));
    assert_eq!(result.image.get_pixel(70, 49), &Rgb([0, 0, 0]));
    assert_eq!(result.image.get_pixel(50, 50), &Rgb([0, 0, 0]));
}

#[cfg(feature = "rustface")]
#[test]
fn missing_classifier_is_classifier_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FaceStamper::from_classifier(dir.path().join("missing.bin"))
        .err()
        .unwrap();
    assert!(
        matches!(err, FaceStampError::ClassifierLoadError { .. }),
        "{err:?}"
    );
}
