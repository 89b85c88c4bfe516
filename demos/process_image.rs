//! Process Image Example
//!
//! Runs one registered model over one or more images and writes the annotated
//! JPEGs to an output directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example process_image -- [OPTIONS] --catalog <CATALOG> --model-id <ID> <IMAGES>...
//! ```
//!
//! # Arguments
//!
//! * `-c, --catalog` - JSON array of model descriptors
//! * `-m, --model-id` - Id of the descriptor to run
//! * `--config` - Optional pipeline configuration file
//! * `-o, --output-dir` - Directory to save annotated images (default: `output`)
//! * `--device` - Device to use for inference (`cpu`, `cuda`, `cuda:0`)
//! * `<IMAGES>...` - Paths to input images
//!
//! # Example
//!
//! ```bash
//! cargo run --example process_image -- \
//!     -c models/catalog.json -m 1 \
//!     -o output/ street.jpg park.png
//! ```

use clap::Parser;
use deepsight::core::config::OrtExecutionProvider;
use deepsight::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Command-line arguments for the process image example
#[derive(Parser)]
#[command(name = "process_image")]
#[command(about = "Runs a registered model over images and saves the annotated output")]
struct Args {
    /// JSON array of model descriptors
    #[arg(short, long)]
    catalog: PathBuf,

    /// Id of the model to run
    #[arg(short, long)]
    model_id: String,

    /// Paths to input images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Pipeline configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to save annotated images
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0')
    #[arg(long, default_value = "cpu")]
    device: String,
}

fn parse_device(device: &str) -> Result<OrtExecutionProvider, Box<dyn std::error::Error>> {
    let device = device.to_lowercase();
    match device.as_str() {
        "cpu" => Ok(OrtExecutionProvider::CPU),
        "cuda" => Ok(OrtExecutionProvider::CUDA { device_id: Some(0) }),
        _ => match device.strip_prefix("cuda:") {
            Some(id) => Ok(OrtExecutionProvider::CUDA {
                device_id: Some(id.parse()?),
            }),
            None => Err(format!("unknown device '{device}'").into()),
        },
    }
}

fn format_tag(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    deepsight::init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let provider = parse_device(&args.device)?;
    if provider != OrtExecutionProvider::CPU {
        let session = config.ort_session.take().unwrap_or_default();
        config.ort_session = Some(
            session
                .add_execution_provider(provider)
                .add_execution_provider(OrtExecutionProvider::CPU),
        );
    }

    let catalog = ModelCatalog::from_json_file(&args.catalog)?;
    info!("Loaded {} model descriptors", catalog.len());

    let orchestrator = ProcessingOrchestrator::new(&config)?;
    let store = InMemoryArtifactStore::new();
    fs::create_dir_all(&args.output_dir)?;
    let model_id = ModelId::new(args.model_id.as_str());

    for path in &args.images {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let image_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let mut asset = ImageAsset::new(image_id.as_str(), bytes, format_tag(path))
            .with_name(path.display().to_string());

        match orchestrator.process_model(&mut asset, &model_id, &catalog) {
            Ok(artifact) => {
                let output = args.output_dir.join(format!("{image_id}_annotated.jpg"));
                fs::write(&output, &artifact.bytes)?;
                info!(
                    "{} -> {} ({} bytes, {:.1} ms)",
                    path.display(),
                    output.display(),
                    artifact.byte_size(),
                    artifact.duration.as_secs_f64() * 1000.0
                );
                store.save(artifact)?;
            }
            Err(failure) => error!("{}: {}", path.display(), failure.error()),
        }
    }

    info!("{}", orchestrator.stats());
    Ok(())
}
