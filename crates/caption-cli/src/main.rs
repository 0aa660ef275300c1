//! Command-line interface for caption decoding
//!
//! Loads a checkpoint, a tokenizer and cached image features, then captions
//! one image or a whole feature store.

use anyhow::{Context, Result};
use caption_decode::{decode_batch, CaptionDecoder, CaptionReport, DecoderConfig};
use caption_model::{load_checkpoint, FeatureStore, MergeDecoder};
use caption_tokenizer::{SpecialTokens, Tokenizer, TokenizerOptions};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "caption")]
#[command(about = "Generate image captions with a greedy decoder")]
struct Cli {
    /// Log level, used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info", env = "CAPTION_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Caption a single image from the feature store
    Decode {
        #[command(flatten)]
        model: ModelArgs,

        /// Image key in the feature store
        #[arg(long, short = 'i')]
        image: String,
    },

    /// Caption every image in the feature store
    Batch {
        #[command(flatten)]
        model: ModelArgs,

        /// Output directory for captions.json and captions.md
        #[arg(long, short = 'o', default_value = "./captions")]
        output_dir: PathBuf,
    },

    /// Fit a tokenizer on a caption file with one caption per line
    FitTokenizer {
        /// Caption file
        #[arg(long, short = 'c')]
        captions: PathBuf,

        /// Output directory for tokenizer.json
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Surround each caption with the start and end tokens
        #[arg(long)]
        wrap: bool,

        /// Token that unknown words map to
        #[arg(long)]
        oov_token: Option<String>,
    },

    /// Show statistics of a feature store
    FeaturesInfo {
        /// Feature store JSON file
        #[arg(long, short = 'f')]
        features: PathBuf,
    },
}

/// Inputs shared by the decoding commands
#[derive(Args, Debug)]
struct ModelArgs {
    /// Checkpoint path without extension
    #[arg(long, short = 'm')]
    checkpoint: PathBuf,

    /// Directory containing tokenizer.json
    #[arg(long, short = 't')]
    tokenizer: PathBuf,

    /// Feature store JSON file
    #[arg(long, short = 'f')]
    features: PathBuf,

    /// Decoder configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum caption length, overrides the configuration file
    #[arg(long)]
    max_length: Option<usize>,
}

/// Everything a decoding command needs, loaded and cross-checked
struct Loaded {
    model: MergeDecoder,
    tokenizer: Tokenizer,
    store: FeatureStore,
    decoder: CaptionDecoder,
}

impl ModelArgs {
    fn load(&self) -> Result<Loaded> {
        let (model, metadata) = load_checkpoint(&self.checkpoint)?;
        if let Some(epoch) = metadata.epoch {
            tracing::info!(epoch, loss = ?metadata.loss, "checkpoint metadata");
        }

        let tokenizer = Tokenizer::from_directory(&self.tokenizer)?;
        model
            .config()
            .check_vocab_size(tokenizer.vocab_size())
            .context("Checkpoint and tokenizer do not belong together")?;

        let store = FeatureStore::from_file(&self.features)?;

        let mut config = match &self.config {
            Some(path) => DecoderConfig::from_file(path)?,
            None => DecoderConfig::with_max_length(model.config().max_length),
        };
        if let Some(max_length) = self.max_length {
            config.max_length = max_length;
        }
        if config.max_length != model.config().max_length {
            anyhow::bail!(
                "max_length {} does not match the model input length {}",
                config.max_length,
                model.config().max_length
            );
        }
        if config.feature_dim.is_none() {
            config.feature_dim = Some(model.config().feature_dim);
        }

        Ok(Loaded {
            model,
            tokenizer,
            store,
            decoder: CaptionDecoder::new(config),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Decode { model, image } => decode(&model, &image),
        Command::Batch { model, output_dir } => batch(&model, &output_dir),
        Command::FitTokenizer {
            captions,
            output,
            wrap,
            oov_token,
        } => fit_tokenizer(&captions, &output, wrap, oov_token),
        Command::FeaturesInfo { features } => features_info(&features),
    }
}

fn decode(args: &ModelArgs, image: &str) -> Result<()> {
    let loaded = args.load()?;
    let features = loaded
        .store
        .get(image)
        .with_context(|| format!("Image '{}' is not in the feature store", image))?;

    let result = loaded
        .decoder
        .decode(features, &loaded.model, &loaded.tokenizer)
        .with_context(|| format!("Failed to caption '{}'", image))?;

    tracing::info!(state = %result.state, steps = result.steps, "captioned {}", image);
    println!("{}", result);
    Ok(())
}

fn batch(args: &ModelArgs, output_dir: &Path) -> Result<()> {
    let loaded = args.load()?;
    let entries = decode_batch(
        &loaded.store,
        &loaded.model,
        &loaded.tokenizer,
        &loaded.decoder,
    );
    let report = CaptionReport::generate_report(&entries);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let json_path = output_dir.join("captions.json");
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    let md_path = output_dir.join("captions.md");
    std::fs::write(&md_path, report.to_markdown())
        .with_context(|| format!("Failed to write {}", md_path.display()))?;

    println!("\n=== Caption Summary ===");
    println!("Images:    {}", report.records.len());
    println!("Complete:  {}", report.complete);
    println!("Truncated: {}", report.truncated);
    println!("Aborted:   {}", report.aborted);
    println!("Failed:    {}", report.failed);
    println!("Report saved to {:?}", output_dir);
    Ok(())
}

fn fit_tokenizer(
    captions: &Path,
    output: &Path,
    wrap: bool,
    oov_token: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(captions)
        .with_context(|| format!("Failed to read caption file: {}", captions.display()))?;

    let mut special = SpecialTokens::default();
    if let Some(oov) = oov_token {
        special = special.with_oov(oov);
    }

    let lines = content.lines().map(str::trim).filter(|line| !line.is_empty());
    let texts: Vec<String> = if wrap {
        lines
            .map(|line| format!("{} {} {}", special.start(), line, special.end()))
            .collect()
    } else {
        lines.map(str::to_string).collect()
    };

    let tokenizer = Tokenizer::fit_on_texts(texts.iter(), special, TokenizerOptions::default());
    for (role, token) in [
        ("start", tokenizer.start_token()),
        ("end", tokenizer.end_token()),
    ] {
        if tokenizer.id_for_token(token).is_none() {
            tracing::warn!(role, token, "marker never appears in the captions");
        }
    }

    tokenizer.save(output)?;
    tracing::info!(
        captions = texts.len(),
        vocab_size = tokenizer.vocab_size(),
        "saved tokenizer to {}",
        output.display()
    );
    Ok(())
}

fn features_info(path: &Path) -> Result<()> {
    let store = FeatureStore::from_file(path)?;
    let stats = store
        .statistics()
        .with_context(|| format!("Feature store is empty: {}", path.display()))?;

    println!("Images:      {}", stats.num_images);
    println!("Feature dim: {}", stats.feature_dim);
    println!("Mean:        {:.6}", stats.overall_mean);
    println!("Std:         {:.6}", stats.overall_std);
    println!("Min:         {:.6}", stats.min_value);
    println!("Max:         {:.6}", stats.max_value);
    Ok(())
}
