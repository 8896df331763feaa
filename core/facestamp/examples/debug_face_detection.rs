//! Print the faces found in a photo and where the overlay would land.
//!
//! Usage:
//!   cargo run --example debug_face_detection -- <classifier> <photo> [size-coeff]

use facestamp::{load_image, place_overlay, FaceStamper, Placement};

fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(classifier), Some(photo_path)) = (args.next(), args.next()) else {
        eprintln!("usage: debug_face_detection <classifier> <photo> [size-coeff]");
        std::process::exit(2);
    };
    let placement = Placement {
        size_coeff: args
            .next()
            .map(|s| s.parse().expect("size-coeff must be a number"))
            .unwrap_or(facestamp::placement::DEFAULT_SIZE_COEFF),
        ..Placement::default()
    };

    let stamper = FaceStamper::from_classifier(&classifier).unwrap();
    let photo = load_image(&photo_path).unwrap();
    let (width, height) = (photo.width(), photo.height());

    println!("=== {photo_path} ({width}x{height}) ===");

    let faces = stamper.detect(&photo).unwrap();
    if faces.is_empty() {
        println!("  NO FACES DETECTED — output would equal the input");
        return;
    }

    println!("  Found {} face(s):", faces.len());
    for (i, face) in faces.iter().enumerate() {
        println!(
            "    face {i}: ({}, {})-({}, {}), {}x{}",
            face.min_x,
            face.min_y,
            face.max_x,
            face.max_y,
            face.width(),
            face.height(),
        );
        match place_overlay(face, &placement) {
            Some(region) => println!(
                "      → overlay {}px wide at ({}, {})",
                region.width, region.x, region.y
            ),
            None => println!("      → overlay collapses to zero width, skipped"),
        }
    }
}
