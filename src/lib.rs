pub mod cli;
mod core;
mod processors;
mod utils;

pub use crate::core::{
    resize_single_image, validate_config, BatchSummary, CancelToken, Collision, DimensionPair,
    FailureKind, OutputFormat, ResizeAlgorithm, ResizeConfig, ResizeEncoder, ResizeError,
    ResizeSpec, Result, SizingRule, SourceImageRef, TaskOutcome,
};
pub use processors::{
    planner, plan, run_resize, workset, BatchExecutor, Compressor, JobPlan, LocalTraverser,
    Loader, ResizeTarget, Resizer, Side, Traversal,
};
pub use utils::{
    default_output_dir, destination_for, find_collisions, is_supported_format,
    normalize_extension, IMAGE_EXTENSIONS,
};

pub mod prelude {
    pub use crate::{
        run_resize, BatchExecutor, BatchSummary, ResizeConfig, ResizeEncoder, ResizeSpec,
        SourceImageRef, TaskOutcome,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
