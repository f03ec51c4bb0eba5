use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser as Clap_parser;
use image::ImageFormat;
use ppm_contrast::{RasterImage, RunConfig, WorkerPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clap_parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// worker threads, 0 for the platform default
    #[arg(name = "num of threads", value_name = "num_of_threads")]
    threads: usize,

    #[arg(name = "input file", value_name = "input_file")]
    input_path: PathBuf,

    /// a .ppm path is written as P6, any other extension goes through the image crate
    #[arg(name = "output file", value_name = "output_file")]
    output_path: PathBuf,

    #[arg(short, long = "config", value_name = "config_path")]
    config_path: Option<PathBuf>,

    /// timed contrast passes, overrides the config file
    #[arg(short, long)]
    repeat: Option<usize>,
}

/// Sibling of `path` that output is written to before being renamed into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes through `write` into a partial file and only renames it to `path`
/// once it is complete. On failure the partial file is removed.
fn save_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let partial = partial_path(path);
    if let Err(err) = write(&partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(err);
    }
    std::fs::rename(&partial, path)
        .with_context(|| format!("Cannot move output into {}", path.display()))
}

fn save(image: &RasterImage, path: &Path) -> Result<()> {
    let is_ppm = path
        .extension()
        .map_or(true, |ext| ext.eq_ignore_ascii_case("ppm"));
    if is_ppm {
        save_with(path, |partial| {
            let output = File::create(partial)
                .with_context(|| format!("Cannot create {}", partial.display()))?;
            image
                .encode(output)
                .with_context(|| format!("Cannot write {}", path.display()))
        })
    } else {
        let format = ImageFormat::from_path(path)
            .with_context(|| format!("Unknown output format for {}", path.display()))?;
        save_with(path, |partial| {
            image
                .to_rgb_image()
                .save_with_format(partial, format)
                .with_context(|| format!("Cannot save {}", path.display()))
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config_path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(repeat) = args.repeat {
        config.repeat = repeat.max(1);
    }

    let input = File::open(&args.input_path)
        .with_context(|| format!("Cannot open {}", args.input_path.display()))?;
    let mut image = RasterImage::decode(input)
        .with_context(|| format!("Cannot decode {}", args.input_path.display()))?;
    info!(
        height = image.height(),
        width = image.width(),
        "decoded {}",
        args.input_path.display()
    );

    let pool = WorkerPool::new(args.threads);
    let mut elapsed = Duration::ZERO;
    for _ in 0..config.repeat {
        let now = Instant::now();
        image.improve_contrast_in(&pool);
        elapsed += now.elapsed();
    }
    info!(min_y = image.min_y(), max_y = image.max_y(), "contrast stretched");

    save(&image, &args.output_path)?;

    if config.report_timing {
        let per_pass = elapsed.as_secs_f64() * 1000.0 / config.repeat as f64;
        println!("\nTime ({} thread(s)): {:.6} ms", args.threads, per_pass);
    }
    Ok(())
}
