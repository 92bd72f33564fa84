use clap::{Args, Parser, Subcommand};
use rasterforge::config;
use rasterforge::favicon::FaviconRequest;
use rasterforge::imaging::{CropBox, OutputFormat, ResizeParams};
use rasterforge::output;
use rasterforge::pipeline::{Command, Pipeline};
use rasterforge::presets::Preset;
use rasterforge::worker::{JobRequest, WorkerPool};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "rasterforge")]
#[command(about = "Transcode, resize, crop, compress and package raster images")]
#[command(long_about = "\
Transcode, resize, crop, compress and package raster images

Every input file is processed independently on a bounded worker pool. Each
artifact is written to the output directory as <input-stem>-<artifact-name>:

  photo.png  --transcode --to webp-->  out/photo-converted.webp
  photo.png  --resize-------------->  out/photo-processed.png
  photo.png  --compress------------>  out/photo-custom.jpg
  logo.png   --favicon------------->  out/logo-favicon-package.zip
  photo.png  --optimize --preset seo> out/photo-seo-images.zip

Sources whose pixel count exceeds [limits] max_pixels are rejected before
any processing. Run 'rasterforge gen-config' for a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (sparse; merged over stock defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print one audit JSON line per input instead of text blocks
    #[arg(long, global = true)]
    json: bool,

    /// Where artifacts are written
    #[arg(long, default_value = ".", global = true)]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

/// Input files shared by every image command.
#[derive(Args, Clone)]
struct Inputs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Re-encode into another format
    Transcode {
        /// jpeg, png, webp, gif, bmp, tiff, ico or avif
        #[arg(long)]
        to: String,
        #[command(flatten)]
        files: Inputs,
    },
    /// Resize to a width and height
    Resize {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Fit inside the box instead of stretching to it
        #[arg(long)]
        keep_aspect: bool,
        #[command(flatten)]
        files: Inputs,
    },
    /// Cut out a rectangle (right and bottom are exclusive)
    Crop {
        #[arg(long)]
        left: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        right: u32,
        #[arg(long)]
        bottom: u32,
        #[command(flatten)]
        files: Inputs,
    },
    /// Encode as JPEG, optionally within a size budget
    Compress {
        /// Size budget in kilobytes
        #[arg(long)]
        target_kb: Option<u64>,
        /// JPEG quality when no budget is given [default: compression.default_quality]
        #[arg(long)]
        quality: Option<u32>,
        /// Scale both axes first (100 = unchanged)
        #[arg(long)]
        percent: Option<u32>,
        #[command(flatten)]
        files: Inputs,
    },
    /// Build a favicon package (ZIP)
    Favicon {
        /// ico, png or webp
        #[arg(long, default_value = "ico")]
        ext: String,
        /// transparent, white, black, auto or a hex color
        #[arg(long, default_value = "transparent")]
        background: String,
        /// Pixels of padding around the trimmed logo
        #[arg(long, default_value_t = 0)]
        padding: u32,
        #[command(flatten)]
        files: Inputs,
    },
    /// Apply a named preset: twitter, whatsapp, web, instagram, youtube, seo
    Optimize {
        #[arg(long)]
        preset: String,
        #[command(flatten)]
        files: Inputs,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, CliCommand::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let pipeline_config = config::load_config(cli.config.as_deref())?;
    let (command, inputs) = match cli.command {
        // Printed above, before any config is read.
        CliCommand::GenConfig => return Ok(ExitCode::SUCCESS),
        CliCommand::Transcode { to, files } => (
            Command::Transcode {
                target: to.parse::<OutputFormat>()?,
            },
            files.inputs,
        ),
        CliCommand::Resize {
            width,
            height,
            keep_aspect,
            files,
        } => (
            Command::Resize(ResizeParams {
                width,
                height,
                keep_aspect,
            }),
            files.inputs,
        ),
        CliCommand::Crop {
            left,
            top,
            right,
            bottom,
            files,
        } => (
            Command::Crop(CropBox::new(left, top, right, bottom)),
            files.inputs,
        ),
        CliCommand::Compress {
            target_kb,
            quality,
            percent,
            files,
        } => (
            Command::Compress {
                target_kb,
                quality: quality.unwrap_or(pipeline_config.compression.default_quality),
                resize_percent: percent,
            },
            files.inputs,
        ),
        CliCommand::Favicon {
            ext,
            background,
            padding,
            files,
        } => (
            Command::Favicon(FaviconRequest::parse(&ext, &background, padding)?),
            files.inputs,
        ),
        CliCommand::Optimize { preset, files } => (
            Command::Optimize(preset.parse::<Preset>()?),
            files.inputs,
        ),
    };

    let pool = WorkerPool::new(Pipeline::new(pipeline_config))?;
    std::fs::create_dir_all(&cli.out_dir)?;

    let mut failed = 0;
    let mut readable = Vec::new();
    let mut requests = Vec::new();
    for path in &inputs {
        match std::fs::read(path) {
            Ok(bytes) => {
                readable.push(path);
                requests.push(JobRequest::new(bytes, command.clone()));
            }
            Err(err) => {
                failed += 1;
                report_io_failure(cli.json, path, &err);
            }
        }
    }

    let outcomes = pool.run_batch(requests);
    let mut succeeded = 0;
    for (path, outcome) in readable.into_iter().zip(outcomes) {
        let label = path.display().to_string();
        match &outcome.result {
            Ok(artifact) => {
                let target = cli
                    .out_dir
                    .join(format!("{}-{}", file_stem(path), artifact.filename));
                std::fs::write(&target, &artifact.bytes)?;
                succeeded += 1;
                if cli.json {
                    println!("{}", outcome.audit.to_json());
                } else {
                    output::print_artifact(&label, &target.display().to_string(), &artifact.report);
                }
            }
            Err(_) => {
                failed += 1;
                if cli.json {
                    println!("{}", outcome.audit.to_json());
                } else {
                    output::print_failure(&label, &outcome.audit);
                }
            }
        }
    }

    if !cli.json {
        output::print_summary(succeeded, failed);
    }
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over `--verbose`.
///
/// Logs go to stderr so `--json` output stays machine-readable.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "rasterforge=debug"
    } else {
        "rasterforge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report_io_failure(json: bool, path: &Path, err: &std::io::Error) {
    let label = path.display().to_string();
    if json {
        let line = serde_json::json!({
            "input": label,
            "success": false,
            "error_type": "io",
            "error_message": err.to_string(),
        });
        println!("{line}");
    } else {
        output::print_io_failure(&label, &err.to_string());
    }
}

fn file_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image")
}
