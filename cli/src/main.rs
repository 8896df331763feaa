//! facestamp - stamp a gopher over every face found in a photo

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::info;

use facestamp::{
    load_image, write_jpeg, DetectionParams, FaceStamper, Placement, DEFAULT_JPEG_QUALITY,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to classifier file.
    #[arg(long)]
    classifier: PathBuf,
    /// Path to photo image file.
    #[arg(long)]
    photo: PathBuf,
    /// Photo face detection scale parameter.
    #[arg(long, default_value_t = 1.1, allow_hyphen_values = true)]
    photo_detect_scale: f64,
    /// Photo face detection min neighbours parameter.
    #[arg(long, default_value_t = 8, allow_negative_numbers = true)]
    photo_detect_min_neighbours: i32,
    /// Photo face detection min size parameter.
    #[arg(long, default_value_t = 200, allow_negative_numbers = true)]
    photo_detect_min_size: i32,
    /// Photo face detection max size parameter.
    #[arg(long, default_value_t = 800, allow_negative_numbers = true)]
    photo_detect_max_size: i32,
    /// Path to gopher image file.
    #[arg(long)]
    gopher: PathBuf,
    /// Coefficient for gopher size.
    #[arg(long, default_value_t = 3.0, allow_hyphen_values = true)]
    gopher_size_coeff: f64,
    /// Coefficient for gopher X axis adjustment.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    gopher_x_coeff: f64,
    /// Coefficient for gopher Y axis adjustment.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    gopher_y_coeff: f64,
    /// Path to output image.
    #[arg(long, default_value = "output.jpg")]
    out: PathBuf,
    /// JPEG quality of the output image (1-100).
    #[arg(
        long,
        default_value_t = DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    quality: u8,
}

impl Args {
    fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            scale: self.photo_detect_scale,
            min_neighbours: self.photo_detect_min_neighbours,
            min_size: self.photo_detect_min_size,
            max_size: self.photo_detect_max_size,
        }
    }

    fn placement(&self) -> Placement {
        Placement {
            size_coeff: self.gopher_size_coeff,
            x_coeff: self.gopher_x_coeff,
            y_coeff: self.gopher_y_coeff,
        }
    }
}

/// Long flag names `Args` accepts, plus clap's built-in `help` and `version`.
fn long_flags() -> Vec<String> {
    Args::command()
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help", "version"])
        .map(str::to_owned)
        .collect()
}

/// Accept Go-style `-flag` spellings by rewriting them to `--flag`.
///
/// Only known flag names are rewritten, so values such as `-inf`, `-nan` or
/// `-0.5` and anything after `--` pass through untouched.
fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let known = long_flags();
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough {
                return arg;
            }
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s == "--" {
                passthrough = true;
                return arg;
            }
            let Some(rest) = s.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if known.iter().any(|flag| flag == name) {
                OsString::from(format!("-{s}"))
            } else {
                arg
            }
        })
        .collect()
}

fn run(args: &Args) -> Result<()> {
    let stamper = FaceStamper::from_classifier(&args.classifier)
        .context("load classifier")?
        .detection(args.detection_params())
        .placement(args.placement());

    let photo = load_image(&args.photo).context("read photo image")?;
    let faces = stamper.detect(&photo).context("detect faces")?;
    let gopher = load_image(&args.gopher).context("read gopher image")?;
    let stamped = stamper
        .composite(&photo, &gopher, &faces)
        .context("composite")?;

    write_jpeg(&args.out, &stamped.image, args.quality).context("write output file")?;
    info!(
        "wrote {} ({}x{}, {} face(s) stamped)",
        args.out.display(),
        stamped.image.width(),
        stamped.image.height(),
        stamped.stamped
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse_from(normalize_flags(std::env::args_os()));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
