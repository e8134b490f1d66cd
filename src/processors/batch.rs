// imgnorm/src/processors/batch.rs
use crate::core::{
    BatchSummary, CancelToken, ResizeConfig, ResizeEncoder, ResizeError, ResizeSpec, Result,
    SourceImageRef, TaskOutcome,
};
use crate::processors::traverser::{LocalTraverser, Traversal};
use crate::processors::workset;
use crate::utils::{find_collisions, IMAGE_EXTENSIONS};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Discovered sources and the subset that still has to be processed.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub root: PathBuf,
    pub dst_root: PathBuf,
    pub discovered: usize,
    pub jobs: Vec<SourceImageRef>,
}

impl JobPlan {
    pub fn already_done(&self) -> usize {
        self.discovered - self.jobs.len()
    }
}

pub struct BatchExecutor {
    spec: Arc<ResizeSpec>,
    thread_pool: rayon::ThreadPool,
    traverser: Box<dyn Traversal>,
    include_extensions: Vec<String>,
    exclude_extensions: Vec<String>,
    task_timeout: Option<Duration>,
    cancel: CancelToken,
    show_progress: bool,
}

impl BatchExecutor {
    /// `max_threads == 0` sizes the pool to the available parallelism.
    pub fn new(spec: ResizeSpec, max_threads: usize) -> Result<Self> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|i| format!("imgnorm-worker-{}", i))
            .build()
            .map_err(|e| {
                ResizeError::ProcessingError(format!("Failed to create thread pool: {}", e))
            })?;

        Ok(Self {
            spec: Arc::new(spec),
            thread_pool,
            traverser: Box::new(LocalTraverser::new()),
            include_extensions: IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_extensions: Vec::new(),
            task_timeout: None,
            cancel: CancelToken::new(),
            show_progress: false,
        })
    }

    pub fn from_config(config: &ResizeConfig) -> Result<Self> {
        let spec = config.validate()?;
        Ok(Self::new(spec, config.threads)?
            .with_task_timeout(config.task_timeout)
            .with_progress(config.show_progress))
    }

    pub fn with_traverser(mut self, traverser: impl Traversal + 'static) -> Self {
        self.traverser = Box::new(traverser);
        self
    }

    /// Overrides the source filters. An empty `include` keeps the default
    /// image allow-list.
    pub fn with_extensions(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        if !include.is_empty() {
            self.include_extensions = include;
        }
        self.exclude_extensions = exclude;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn num_threads(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        let plan = self.plan_jobs(input_dir, output_dir)?;
        Ok(self.execute_jobs(&plan))
    }

    /// Lists sources, rejects destination collisions and drops sources whose
    /// outputs already exist. Nothing is written.
    pub fn plan_jobs(&self, input_dir: &Path, output_dir: &Path) -> Result<JobPlan> {
        self.validate_paths(input_dir, output_dir)?;

        log::info!("Getting image paths from {}", input_dir.display());
        let sources: Vec<SourceImageRef> = self
            .traverser
            .list(input_dir, &self.include_extensions, &self.exclude_extensions, true)?
            .into_iter()
            .map(SourceImageRef::new)
            .collect();

        let collisions = find_collisions(&sources, &self.spec)?;
        if !collisions.is_empty() {
            log::error!(
                "{} destination(s) would be written by more than one source",
                collisions.len()
            );
            return Err(ResizeError::Collision(collisions));
        }

        let jobs = if self.spec.exist_ok {
            log::info!("Checking existing files in {}", output_dir.display());
            let existing: HashSet<PathBuf> = self
                .traverser
                .list(output_dir, &[self.spec.output_extension.clone()], &[], true)?
                .into_iter()
                .collect();
            workset::remaining(&sources, &self.spec, &existing)?
        } else {
            sources.clone()
        };

        Ok(JobPlan {
            root: input_dir.to_path_buf(),
            dst_root: output_dir.to_path_buf(),
            discovered: sources.len(),
            jobs,
        })
    }

    /// Runs every planned job on the pool and waits for all of them. Per-item
    /// failures are collected in the summary and never stop the batch.
    pub fn execute_jobs(&self, plan: &JobPlan) -> BatchSummary {
        let started = Instant::now();
        let mut summary = BatchSummary {
            total: plan.discovered,
            skipped: plan.already_done(),
            ..Default::default()
        };

        if plan.discovered == 0 {
            log::warn!("No image files found in {}", plan.root.display());
            summary.elapsed = started.elapsed();
            return summary;
        }

        if plan.jobs.is_empty() {
            log::info!("All {} images already have outputs", plan.discovered);
            summary.elapsed = started.elapsed();
            return summary;
        }

        log::info!(
            "Resizing {} images from {} on {} threads ({} already done)",
            plan.jobs.len(),
            plan.root.display(),
            self.num_threads(),
            plan.already_done()
        );

        let encoder = ResizeEncoder::new(Arc::clone(&self.spec), &plan.root, &plan.dst_root)
            .with_timeout(self.task_timeout)
            .with_cancel_token(self.cancel.clone());

        let pb = self.create_progress_bar(plan.jobs.len());

        let outcomes: Vec<TaskOutcome> = self
            .thread_pool
            .install(|| map_with_progress(&plan.jobs, &pb, |source| encoder.process(source)));

        for outcome in outcomes {
            summary.record(outcome);
        }
        summary.elapsed = started.elapsed();

        pb.finish_with_message(format!(
            "{} resized, {} skipped, {} failed",
            summary.succeeded,
            summary.skipped,
            summary.failed_count()
        ));

        summary
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.exists() {
            return Err(ResizeError::Validation(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if !input_dir.is_dir() {
            return Err(ResizeError::Validation(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ResizeError::Validation(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        let input_real = input_dir.canonicalize()?;
        let output_real = output_dir
            .canonicalize()
            .unwrap_or_else(|_| output_dir.to_path_buf());

        if input_real == output_real {
            return Err(ResizeError::Validation(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        if output_real.starts_with(&input_real) {
            log::warn!(
                "Output directory {} is inside the input directory; outputs will be picked up as sources on the next run",
                output_dir.display()
            );
        }

        Ok(())
    }
}

/// Applies `task` to every item in parallel. The bar ticks once per
/// finished task, not when a task is picked up.
fn map_with_progress<T, R, F>(items: &[T], pb: &ProgressBar, task: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(task).progress_with(pb.clone()).collect()
}

/// Validates `config`, then resizes every image under `root_dir` into `dst_dir`.
pub fn run_resize(root_dir: &Path, dst_dir: &Path, config: &ResizeConfig) -> Result<BatchSummary> {
    BatchExecutor::from_config(config)?.run(root_dir, dst_dir)
}
