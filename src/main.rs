use anyhow::{bail, Context};
use clap::Parser;
use imgnorm::cli::{batch_config, Cli, Commands, SizingArgs};
use imgnorm::{default_output_dir, resize_single_image, BatchExecutor, BatchSummary};
use log::LevelFilter;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Batch {
            input,
            output,
            sizing,
            flatten,
            overwrite,
            threads,
            timeout,
            include,
            exclude,
            dry_run,
            no_progress,
        } => {
            let output = output.unwrap_or_else(|| default_output_dir(&input));
            let config = batch_config(&sizing, flatten, overwrite, threads, timeout, !no_progress);
            let executor = BatchExecutor::from_config(&config)
                .context("invalid resize configuration")?
                .with_extensions(include, exclude);

            if dry_run {
                process_plan(&executor, &input, &output)
            } else {
                process_batch(&executor, &input, &output)
            }
        }
        Commands::Resize { input, sizing } => process_resize(input, &sizing),
    }
}

fn process_plan(executor: &BatchExecutor, input: &Path, output: &Path) -> anyhow::Result<()> {
    let plan = executor
        .plan_jobs(input, output)
        .with_context(|| format!("failed to plan resize of {}", input.display()))?;

    println!(
        "Found {} images in {}: {} to resize, {} already done",
        plan.discovered,
        input.display(),
        plan.jobs.len(),
        plan.already_done()
    );
    for job in &plan.jobs {
        println!("  {}", job);
    }

    Ok(())
}

fn process_batch(executor: &BatchExecutor, input: &Path, output: &Path) -> anyhow::Result<()> {
    let summary = executor
        .run(input, output)
        .with_context(|| format!("failed to resize {}", input.display()))?;

    print_summary(&summary, output);

    if !summary.is_clean() {
        bail!("{} image(s) failed", summary.failed_count());
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary, output: &Path) {
    println!(
        "Batch processing complete in {:.1}s. {} resized, {} skipped, {} failed, {} total -> {}",
        summary.elapsed.as_secs_f64(),
        summary.succeeded,
        summary.skipped,
        summary.failed_count(),
        summary.total,
        output.display()
    );

    for (path, reason) in &summary.failed {
        println!("  FAILED {}: {}", path.display(), reason);
    }
}

fn process_resize(input: PathBuf, sizing: &SizingArgs) -> anyhow::Result<()> {
    let output = resize_single_image(&input, &sizing.to_config())
        .with_context(|| format!("failed to resize {}", input.display()))?;

    println!("Resized image saved to: {}", output.display());
    Ok(())
}
