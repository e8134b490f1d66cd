// imgnorm/src/core/processor.rs
use super::{CancelToken, ResizeConfig, ResizeError, ResizeSpec, Result, SourceImageRef, TaskOutcome};
use crate::processors::planner;
use crate::processors::{Compressor, Loader, Resizer};
use crate::utils::{destination_for, resized_file_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative stop points between pipeline stages.
struct Checkpoint<'a> {
    cancel: &'a CancelToken,
    started: Instant,
    timeout: Option<Duration>,
}

impl<'a> Checkpoint<'a> {
    fn start(cancel: &'a CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            timeout,
        }
    }

    fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ResizeError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            if self.started.elapsed() > timeout {
                return Err(ResizeError::TimedOut(timeout));
            }
        }
        Ok(())
    }
}

/// Decode, plan, resample, encode and write one image.
pub struct ResizeEncoder {
    spec: Arc<ResizeSpec>,
    root: PathBuf,
    dst_root: PathBuf,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
    task_timeout: Option<Duration>,
    cancel: CancelToken,
}

impl ResizeEncoder {
    pub fn new(spec: Arc<ResizeSpec>, root: impl Into<PathBuf>, dst_root: impl Into<PathBuf>) -> Self {
        let resizer = Resizer::new(spec.algorithm);
        let compressor = Compressor::new(spec.quality).with_png_optimization(spec.optimize_png);

        Self {
            spec,
            root: root.into(),
            dst_root: dst_root.into(),
            loader: Loader::new(),
            resizer,
            compressor,
            task_timeout: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one source through the pipeline. Never returns an error: every
    /// failure becomes a [`TaskOutcome`] attributed to the source path.
    pub fn process(&self, source: &SourceImageRef) -> TaskOutcome {
        let result = destination_for(source.relative_path(), &self.spec)
            .map(|relative| self.dst_root.join(relative))
            .and_then(|output| {
                self.process_file(&source.resolve(&self.root), &output)
                    .map(|()| output)
            });

        match result {
            Ok(output) => TaskOutcome::Success(output),
            Err(ResizeError::Cancelled) => TaskOutcome::Skipped {
                source: source.relative_path().to_path_buf(),
                reason: "cancelled".to_string(),
            },
            Err(e) => {
                log::warn!("Failed to process {}: {}", source, e);
                TaskOutcome::Failed {
                    source: source.relative_path().to_path_buf(),
                    kind: e.failure_kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    /// Resizes `input` and writes the re-encoded result to `output`.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<()> {
        let checkpoint = Checkpoint::start(&self.cancel, self.task_timeout);

        checkpoint.check()?;
        let image = self.loader.load(input)?;

        checkpoint.check()?;
        let target = planner::plan(image.width(), image.height(), &self.spec)?;
        let image = self.resizer.resample(image, target);

        checkpoint.check()?;
        let data = self
            .compressor
            .encode(&image, self.spec.output_format)
            .map_err(|e| ResizeError::Encode {
                path: output.to_path_buf(),
                reason: e.to_string(),
            })?;

        checkpoint.check()?;
        self.compressor.write_atomic(&data, output)?;

        log::debug!("{} -> {} ({})", input.display(), output.display(), target);
        Ok(())
    }
}

/// Resizes a single file and writes `{stem}_resized{ext}` next to it.
pub fn resize_single_image(input: &Path, config: &ResizeConfig) -> Result<PathBuf> {
    let spec = Arc::new(config.validate()?);

    if !input.is_file() {
        return Err(ResizeError::Validation(format!(
            "Input file does not exist: {}",
            input.display()
        )));
    }

    let output = input.with_file_name(resized_file_name(input, &spec.output_extension)?);
    let encoder = ResizeEncoder::new(spec, PathBuf::new(), PathBuf::new())
        .with_timeout(config.task_timeout);
    encoder.process_file(input, &output)?;

    log::info!("Resized image saved to: {}", output.display());
    Ok(output)
}
