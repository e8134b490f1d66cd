// imgnorm/src/core/mod.rs
pub mod processor;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use processor::{resize_single_image, ResizeEncoder};

pub const DEFAULT_TRUNCATE_MULTIPLIER: u32 = 32;
pub const DEFAULT_QUALITY: u8 = 98;
pub const DEFAULT_OUTPUT_EXTENSION: &str = ".webp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// Encodable output formats, picked from the configured output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Gif,
}

impl OutputFormat {
    /// Accepts the extension with or without the leading dot, any case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::WebP => image::ImageFormat::WebP,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Gif => image::ImageFormat::Gif,
        }
    }

    /// Only JPEG takes a quality setting; the other encoders are lossless.
    pub fn uses_quality(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// The sizing strategy for a run, resolved once from the optional
/// `target_pixels` / `max_dim` / `min_dim` fields.
///
/// `target_pixels` wins outright. Otherwise `max_dim` and `min_dim` are both
/// kept, because which of them applies depends on each image's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingRule {
    TargetPixels(u64),
    Bounds {
        max_dim: Option<u32>,
        min_dim: Option<u32>,
    },
    Passthrough,
}

impl SizingRule {
    pub fn resolve(min_dim: Option<u32>, max_dim: Option<u32>, target_pixels: Option<u64>) -> Self {
        match (target_pixels, max_dim, min_dim) {
            (Some(pixels), _, _) => Self::TargetPixels(pixels),
            (None, None, None) => Self::Passthrough,
            (None, max_dim, min_dim) => Self::Bounds { max_dim, min_dim },
        }
    }
}

/// User-facing configuration. Turned into an immutable [`ResizeSpec`] by
/// [`ResizeConfig::validate`] before any work starts.
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    pub min_dim: Option<u32>,
    pub max_dim: Option<u32>,
    pub target_pixels: Option<u64>,
    pub keep_hierarchy: bool,
    pub exist_ok: bool,
    pub output_extension: String,
    pub quality: u8,
    pub truncate_multiplier: u32,
    pub algorithm: ResizeAlgorithm,
    pub optimize_png: bool,
    pub threads: usize,
    pub task_timeout: Option<Duration>,
    pub show_progress: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_dim: None,
            max_dim: None,
            target_pixels: None,
            keep_hierarchy: true,
            exist_ok: true,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            quality: DEFAULT_QUALITY,
            truncate_multiplier: DEFAULT_TRUNCATE_MULTIPLIER,
            algorithm: ResizeAlgorithm::Lanczos3,
            optimize_png: true,
            threads: 0,
            task_timeout: None,
            show_progress: true,
        }
    }
}

impl ResizeConfig {
    pub fn validate(&self) -> Result<ResizeSpec> {
        for (name, value) in [("min_dim", self.min_dim), ("max_dim", self.max_dim)] {
            if value == Some(0) {
                return Err(ResizeError::Validation(format!(
                    "{} must be a positive integer",
                    name
                )));
            }
        }

        if self.target_pixels == Some(0) {
            return Err(ResizeError::Validation(
                "target_pixels must be a positive integer".to_string(),
            ));
        }

        if self.truncate_multiplier == 0 {
            return Err(ResizeError::Validation(
                "truncate_multiplier must be a positive integer".to_string(),
            ));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(ResizeError::Validation(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        let output_extension = crate::utils::normalize_extension(&self.output_extension);
        if output_extension.len() < 2 {
            return Err(ResizeError::Validation(format!(
                "Output extension must start with a dot and name a format, got {:?}",
                self.output_extension
            )));
        }

        let output_format = OutputFormat::from_extension(&output_extension).ok_or_else(|| {
            ResizeError::Validation(format!("Unsupported output format: {}", output_extension))
        })?;

        if let (Some(min_dim), Some(max_dim)) = (self.min_dim, self.max_dim) {
            if min_dim > max_dim {
                log::warn!(
                    "min_dim {} is larger than max_dim {}; max_dim takes priority",
                    min_dim,
                    max_dim
                );
            }
        }

        Ok(ResizeSpec {
            sizing: SizingRule::resolve(self.min_dim, self.max_dim, self.target_pixels),
            keep_hierarchy: self.keep_hierarchy,
            exist_ok: self.exist_ok,
            output_extension,
            output_format,
            quality: self.quality,
            truncate_multiplier: self.truncate_multiplier,
            algorithm: self.algorithm,
            optimize_png: self.optimize_png,
        })
    }
}

/// Validated, immutable per-run settings shared read-only by every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSpec {
    pub sizing: SizingRule,
    pub keep_hierarchy: bool,
    pub exist_ok: bool,
    pub output_extension: String,
    pub output_format: OutputFormat,
    pub quality: u8,
    pub truncate_multiplier: u32,
    pub algorithm: ResizeAlgorithm,
    pub optimize_png: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionPair {
    pub width: u32,
    pub height: u32,
}

impl DimensionPair {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn shorter(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn longer(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl From<(u32, u32)> for DimensionPair {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for DimensionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An image path relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceImageRef(PathBuf);

impl SourceImageRef {
    pub fn new(relative: impl Into<PathBuf>) -> Self {
        Self(relative.into())
    }

    pub fn relative_path(&self) -> &Path {
        &self.0
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for SourceImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Decode,
    Encode,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Timeout => "timeout",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(PathBuf),
    Skipped {
        source: PathBuf,
        reason: String,
    },
    Failed {
        source: PathBuf,
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Success(_) => self.succeeded += 1,
            TaskOutcome::Skipped { .. } => self.skipped += 1,
            TaskOutcome::Failed {
                source,
                kind,
                message,
            } => self.failed.push((source, format!("{}: {}", kind, message))),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Two or more sources that would be written to the same destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
}

fn describe_collisions(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(|c| {
            let sources: Vec<String> = c.sources.iter().map(|s| s.display().to_string()).collect();
            format!("{} <- [{}]", c.destination.display(), sources.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shared cancellation flag, checked by workers between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Destination collision: {}", describe_collisions(.0))]
    Collision(Vec<Collision>),

    #[error("Traversal error: {0}")]
    Traversal(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Task cancelled")]
    Cancelled,

    #[error("Task exceeded timeout of {0:?}")]
    TimedOut(Duration),
}

impl ResizeError {
    /// How a per-item error is reported once it is caught at the task boundary.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Decode { .. } => FailureKind::Decode,
            Self::TimedOut(_) => FailureKind::Timeout,
            _ => FailureKind::Encode,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResizeError>;

pub fn validate_config(config: &ResizeConfig) -> Result<ResizeSpec> {
    config.validate()
}
