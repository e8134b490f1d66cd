// imgnorm/src/processors/workset.rs
use crate::core::{ResizeSpec, Result, SourceImageRef};
use crate::utils::destination_for;
use std::collections::HashSet;
use std::path::PathBuf;

/// Sources that still need processing.
///
/// `existing` holds destination paths relative to the destination root.
/// Each source is kept or dropped by looking up its own mapped destination,
/// so the source/destination pairing is never lost. Input order is kept.
pub fn remaining(
    sources: &[SourceImageRef],
    spec: &ResizeSpec,
    existing: &HashSet<PathBuf>,
) -> Result<Vec<SourceImageRef>> {
    if !spec.exist_ok {
        return Ok(sources.to_vec());
    }

    let mut todo = Vec::with_capacity(sources.len());
    for source in sources {
        let destination = destination_for(source.relative_path(), spec)?;
        if !existing.contains(&destination) {
            todo.push(source.clone());
        }
    }

    log::debug!(
        "{} of {} sources already have outputs",
        sources.len() - todo.len(),
        sources.len()
    );
    Ok(todo)
}
