// imgnorm/src/cli.rs
use crate::core::{
    ResizeAlgorithm, ResizeConfig, DEFAULT_OUTPUT_EXTENSION, DEFAULT_QUALITY,
    DEFAULT_TRUNCATE_MULTIPLIER,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "imgnorm", version, about = "Resize and re-encode image collections into a bounded size envelope")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize every image under a directory tree
    Batch {
        /// Source directory
        input: PathBuf,

        /// Destination directory (default: `<input>_resized` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        sizing: SizingArgs,

        /// Write every output directly under the destination root
        #[arg(long)]
        flatten: bool,

        /// Reprocess images whose output already exists
        #[arg(long)]
        overwrite: bool,

        /// Worker threads (0 = one per available core)
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,

        /// Per-image time limit in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Only include these extensions (comma separated)
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,

        /// Skip these extensions (comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Report the planned work without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Resize one image and save it next to the original
    Resize {
        input: PathBuf,

        #[command(flatten)]
        sizing: SizingArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SizingArgs {
    /// Minimum length of the shorter side
    #[arg(long)]
    pub min_dim: Option<u32>,

    /// Maximum length of the longer side (wins over --min-dim)
    #[arg(long)]
    pub max_dim: Option<u32>,

    /// Target pixel count (wins over --max-dim and --min-dim)
    #[arg(long)]
    pub target_pixels: Option<u64>,

    /// Shorter side is floored to a multiple of this in --target-pixels mode
    #[arg(long, default_value_t = DEFAULT_TRUNCATE_MULTIPLIER)]
    pub truncate_multiplier: u32,

    /// Output extension, e.g. webp, jpg, png
    #[arg(short, long, default_value = DEFAULT_OUTPUT_EXTENSION)]
    pub format: String,

    /// Encoder quality (1-100, lossy WebP and JPEG)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
    pub quality: u8,

    #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
    pub algorithm: Algorithm,

    /// Skip the oxipng pass for PNG output
    #[arg(long)]
    pub no_png_optimize: bool,
}

impl SizingArgs {
    pub fn to_config(&self) -> ResizeConfig {
        ResizeConfig {
            min_dim: self.min_dim,
            max_dim: self.max_dim,
            target_pixels: self.target_pixels,
            output_extension: self.format.clone(),
            quality: self.quality,
            truncate_multiplier: self.truncate_multiplier,
            algorithm: self.algorithm.into(),
            optimize_png: !self.no_png_optimize,
            ..Default::default()
        }
    }
}

/// Builds the full run configuration for the `batch` subcommand.
pub fn batch_config(
    sizing: &SizingArgs,
    flatten: bool,
    overwrite: bool,
    threads: usize,
    timeout: Option<u64>,
    show_progress: bool,
) -> ResizeConfig {
    ResizeConfig {
        keep_hierarchy: !flatten,
        exist_ok: !overwrite,
        threads,
        task_timeout: timeout.map(Duration::from_secs),
        show_progress,
        ..sizing.to_config()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}
