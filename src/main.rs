use clap::{Parser, Subcommand};
use fedimage::imaging::{EncodeSettings, ImageHandle, blurhash};
use fedimage::output::{self, ConvertReport, HandleSummary};
use fedimage::config;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fedimage")]
#[command(about = "Normalize uploaded images and compute blur-hash placeholders")]
#[command(long_about = "\
Normalize uploaded images and compute blur-hash placeholders

Every command decodes its input the way an upload is handled: the declared
type (--mime) is trusted only when it names a supported format, otherwise the
content decides, then the file extension. Unidentified images are written as
WebP.

Supported formats: PNG, JPEG, GIF, WebP, BMP. Animated GIF keeps its frames;
animated PNG and WebP are flattened to their first frame on output.

Run 'fedimage gen-config' to generate a documented fedimage.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "fedimage.toml", global = true)]
    config: PathBuf,

    /// Log decisions and fallbacks (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how an image is identified and decoded
    Info {
        file: PathBuf,
        /// Declared MIME type, as an uploader would send it
        #[arg(long, default_value = "")]
        mime: String,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Leave GPS fields out of the EXIF listing
        #[arg(long)]
        hide_location: bool,
    },
    /// Normalize an image and write the re-encoded result
    Convert(ConvertArgs),
    /// Blur-hash placeholders
    #[command(subcommand)]
    Blurhash(BlurhashCommand),
    /// Print a stock fedimage.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    input: PathBuf,
    output: PathBuf,
    /// Declared MIME type of the input
    #[arg(long, default_value = "")]
    mime: String,
    /// Shrink so the longer edge is at most this many pixels
    #[arg(long)]
    max: Option<u32>,
    /// Apply EXIF / native orientation
    #[arg(long)]
    orient: bool,
    /// Drop animation (GIF output becomes PNG)
    #[arg(long = "static")]
    make_static: bool,
    /// Rotate clockwise by a multiple of 90 degrees
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<i32>,
    /// Mirror left to right
    #[arg(long)]
    flip_h: bool,
    /// Mirror top to bottom
    #[arg(long)]
    flip_v: bool,
    /// Center-crop to a square of this size
    #[arg(long)]
    square: Option<u32>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum BlurhashCommand {
    /// Print the blur-hash of an image
    Encode {
        file: PathBuf,
        #[arg(long, default_value = "")]
        mime: String,
    },
    /// Render a blur-hash as a PNG placeholder
    Decode {
        #[arg(allow_hyphen_values = true)]
        hash: String,
        #[arg(value_parser = placeholder_edge())]
        width: u32,
        #[arg(value_parser = placeholder_edge())]
        height: u32,
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let image_config = config::load_config(&cli.config)?;
    let settings = EncodeSettings::from(&image_config);

    match cli.command {
        Command::Info {
            file,
            mime,
            json,
            hide_location,
        } => {
            let data = std::fs::read(&file)?;
            let handle = ImageHandle::new(&data, &mime, file_name(&file), &settings);
            let summary = HandleSummary::from_handle(&file.display().to_string(), &handle);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_info(&summary);
                if let Some(exif) = handle.exif() {
                    for line in output::format_exif(exif, hide_location) {
                        println!("{}", line);
                    }
                }
            }
        }
        Command::Convert(args) => {
            let report = convert(&args, &settings)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_convert(&report);
            }
        }
        Command::Blurhash(BlurhashCommand::Encode { file, mime }) => {
            let data = std::fs::read(&file)?;
            let hash = blurhash::encode(&data, &mime, &settings)
                .ok_or_else(|| format!("{}: cannot compute blur-hash", file.display()))?;
            println!("{hash}");
        }
        Command::Blurhash(BlurhashCommand::Decode {
            hash,
            width,
            height,
            output,
        }) => {
            let placeholder = blurhash::decode(&hash, width, height, &settings);
            let bytes = placeholder.to_bytes()?;
            std::fs::write(&output, &bytes)?;
            println!(
                "{}x{} placeholder \u{2192} {}",
                placeholder.width(),
                placeholder.height(),
                output.display()
            );
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Largest placeholder edge `blurhash decode` will render.
const MAX_PLACEHOLDER_EDGE: u32 = 4096;

fn placeholder_edge() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_PLACEHOLDER_EDGE))
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Run the requested transforms in a fixed order: orient, rotate, flip,
/// square, max, static.
fn convert(
    args: &ConvertArgs,
    settings: &EncodeSettings,
) -> Result<ConvertReport, Box<dyn std::error::Error>> {
    let data = std::fs::read(&args.input)?;
    let name = file_name(&args.input);
    let mut handle = if args.make_static {
        ImageHandle::new_static(&data, &args.mime, name, settings)
    } else {
        ImageHandle::new(&data, &args.mime, name, settings)
    };
    if let Some(e) = handle.failure() {
        return Err(format!("{}: {e}", args.input.display()).into());
    }

    let before = (handle.width(), handle.height());
    let mut steps = Vec::new();

    if args.orient {
        handle.orient(None)?;
        steps.push("orient".to_string());
    }
    if let Some(degrees) = args.rotate {
        handle.rotate(degrees)?;
        steps.push(format!("rotate {degrees}"));
    }
    if args.flip_h || args.flip_v {
        handle.flip(args.flip_h, args.flip_v)?;
        steps.push("flip".to_string());
    }
    if let Some(dim) = args.square {
        let (w, h) = (handle.width(), handle.height());
        let side = w.min(h);
        handle.crop(side, (w - side) / 2, (h - side) / 2, side, side)?;
        handle.scale_to_square(dim)?;
        steps.push(format!("square {dim}"));
    }
    if let Some(max) = args.max {
        if handle.scale_down(max)? {
            steps.push(format!("scale_down {max}"));
        }
    }
    if args.make_static {
        handle.to_static()?;
        steps.push("static".to_string());
    }

    let bytes = handle.to_bytes()?;
    let wanted = args.output.extension().and_then(|e| e.to_str());
    if wanted.is_some_and(|e| !e.eq_ignore_ascii_case(handle.extension())) {
        warn!(
            output = %args.output.display(),
            format = handle.mime_type(),
            "Output extension does not match the encoded format"
        );
    }
    std::fs::write(&args.output, &bytes)?;

    Ok(ConvertReport {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        before,
        after: (handle.width(), handle.height()),
        steps,
        mime: handle.mime_type().to_string(),
        bytes: bytes.len(),
    })
}
