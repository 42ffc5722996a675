use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::{config_to_toml, resolve_config, TunableOverrides};
use color_eyre::eyre::{eyre, Result};
use stalls::{
    algorithms::ContourStallDetector, load_image, process_image, save_lot_geojson, save_preview,
    DetectorConfig, PipelineBuilder, StallDetector, StallStore,
};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

/// Detect parking stalls in a lot image and store them under a lot id.
///
/// Without a subcommand the detection flags are required.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    detect: DetectArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Aisle lines plus stripe profiles
    Structure,
    /// Closed paint contours, lower confidence
    Contour,
}

#[derive(Args)]
struct DetectArgs {
    /// Path to the top-down lot image
    #[arg(long, required = true)]
    image: Option<PathBuf>,
    /// Stall store to update (created if missing)
    #[arg(long, required = true)]
    json_output: Option<PathBuf>,
    /// Lot identifier whose stalls are replaced
    #[arg(long, required = true)]
    lot_id: Option<String>,
    /// Optional overlay image of the detected stalls
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Cluster gap for horizontal aisles in pixels [default: 14.0]
    #[arg(long)]
    horizontal_cluster_gap: Option<f64>,
    /// Cluster gap for vertical aisles in pixels [default: 18.0]
    #[arg(long)]
    vertical_cluster_gap: Option<f64>,
    /// Fraction of the profile peak that counts as stripe [default: 0.35]
    #[arg(long)]
    stripe_threshold: Option<f64>,
    #[arg(long, value_enum, default_value_t = Strategy::Structure)]
    strategy: Strategy,
    /// Detector configuration file (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also export the lot as GeoJSON
    #[arg(long)]
    geojson: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a stored lot onto its image
    Preview {
        #[arg(long)]
        image: PathBuf,
        /// Stall store to read
        #[arg(long)]
        stalls: PathBuf,
        #[arg(long)]
        lot_id: String,
        /// Output image path
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the JSON schema of the detector configuration
    Schema,
    /// Print the default detector configuration as TOML
    DefaultConfig,
}

fn build_detector(strategy: Strategy, config: &DetectorConfig) -> Result<Box<dyn StallDetector>> {
    let detector: Box<dyn StallDetector> = match strategy {
        Strategy::Structure => Box::new(PipelineBuilder::new().with_config(config.clone()).build()?),
        Strategy::Contour => Box::new(ContourStallDetector::new(config.contour.clone())),
    };
    Ok(detector)
}

fn run_detect(args: DetectArgs) -> Result<()> {
    let image_path = args.image.ok_or_else(|| eyre!("--image is required"))?;
    let json_output = args.json_output.ok_or_else(|| eyre!("--json-output is required"))?;
    let lot_id = args.lot_id.ok_or_else(|| eyre!("--lot-id is required"))?;

    let overrides = TunableOverrides {
        horizontal_cluster_gap: args.horizontal_cluster_gap,
        vertical_cluster_gap: args.vertical_cluster_gap,
        stripe_threshold: args.stripe_threshold,
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;
    let detector = build_detector(args.strategy, &config)?;

    let image = load_image(&image_path)?;
    let detection = process_image(detector.as_ref(), &image, &json_output, &lot_id)?;
    info!(
        horizontal_aisles = detection.horizontal_aisles,
        vertical_aisles = detection.vertical_aisles,
        "lot {} done",
        lot_id
    );
    if detection.stalls.is_empty() {
        warn!("No stalls detected in {}", image_path.display());
    }

    if let Some(preview_path) = args.preview {
        save_preview(&image, &detection.stalls, &preview_path)?;
        println!("Preview saved to {}", preview_path.display());
    }

    if let Some(geojson_path) = args.geojson {
        save_lot_geojson(&geojson_path, &lot_id, &detection.stalls)?;
        println!("GeoJSON saved to {}", geojson_path.display());
    }

    println!(
        "Saved {} stalls for {} to {}",
        detection.stalls.len(),
        lot_id,
        json_output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => run_detect(cli.detect)?,
        Some(Commands::Preview {
            image,
            stalls,
            lot_id,
            out,
        }) => {
            let base = load_image(&image)?;
            let lot = StallStore::open(&stalls)?.lot(&lot_id)?;
            if lot.is_empty() {
                warn!("Lot {} has no stalls in {}", lot_id, stalls.display());
            }
            save_preview(&base, &lot, &out)?;
            println!("Overlay saved to {}", out.display());
        }
        Some(Commands::Schema) => {
            let schema = DetectorConfig::schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(Commands::DefaultConfig) => {
            print!("{}", config_to_toml(&DetectorConfig::default())?);
        }
    }

    Ok(())
}
