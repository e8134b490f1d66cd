// imgnorm/src/processors/mod.rs
mod batch;
mod compressor;
mod loader;
mod resizer;
pub mod planner;
pub mod traverser;
pub mod workset;

pub use batch::{run_resize, BatchExecutor, JobPlan};
pub use compressor::Compressor;
pub use loader::Loader;
pub use planner::{plan, ResizeTarget, Side};
pub use resizer::Resizer;
pub use traverser::{LocalTraverser, Traversal};
