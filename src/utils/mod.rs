// imgnorm/src/utils/mod.rs
use crate::core::{Collision, ResizeError, ResizeSpec, Result, SourceImageRef};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extensions recognised as images when listing a source tree.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "dds", "exif", "jp2", "jpx", "pcx", "pnm", "ras", "gif", "tga",
    "tif", "tiff", "xbm", "xpm", "webp", "jpe",
];

pub const RESIZED_SUFFIX: &str = "_resized";

/// `{stem}_resized{extension}` for the given source file.
pub fn resized_file_name(source: &Path, extension: &str) -> Result<OsString> {
    let stem = source.file_stem().ok_or_else(|| {
        ResizeError::Validation(format!("Invalid file name: {}", source.display()))
    })?;

    let mut name = stem.to_os_string();
    name.push(RESIZED_SUFFIX);
    name.push(extension);
    Ok(name)
}

/// Destination of `source` relative to the destination root.
///
/// With `keep_hierarchy` the source's directories are mirrored, otherwise the
/// output is flattened to the bare file name.
pub fn destination_for(source: &Path, spec: &ResizeSpec) -> Result<PathBuf> {
    let name = resized_file_name(source, &spec.output_extension)?;

    if spec.keep_hierarchy {
        Ok(source.with_file_name(name))
    } else {
        Ok(PathBuf::from(name))
    }
}

/// Groups sources by mapped destination and returns every destination
/// claimed by more than one source.
pub fn find_collisions(sources: &[SourceImageRef], spec: &ResizeSpec) -> Result<Vec<Collision>> {
    let mut by_destination: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    for source in sources {
        let destination = destination_for(source.relative_path(), spec)?;
        by_destination
            .entry(destination)
            .or_default()
            .push(source.relative_path().to_path_buf());
    }

    Ok(by_destination
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(destination, sources)| Collision {
            destination,
            sources,
        })
        .collect())
}

/// Lower-cases and trims an extension and makes sure it starts with a dot.
pub fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Case-insensitive match of `path`'s extension against `extensions`, which
/// may be written with or without the leading dot.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    match get_file_extension(path) {
        Some(ext) => extensions
            .iter()
            .any(|candidate| candidate.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

pub fn is_supported_format(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// `{input_dir_name}_resized`, next to the input directory.
pub fn default_output_dir(input_dir: &Path) -> PathBuf {
    let name = input_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_string());

    input_dir.with_file_name(format!("{}{}", name, RESIZED_SUFFIX))
}
