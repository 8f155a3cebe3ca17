//! Helpers shared by the CLI commands: input discovery, progress bars and
//! size formatting.

use crate::constants::{PROGRESS_BAR_TEMPLATE, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{CompressionError, Result};
use crate::report;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check if a file path has a supported image extension
///
/// # Arguments
/// * `path` - The file path to check
///
/// # Returns
/// * `true` if the extension is a supported image type (case-insensitive),
///   `false` otherwise
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// Validate that a file exists and return a descriptive error if not
///
/// # Arguments
/// * `path` - The file path to validate
///
/// # Returns
/// * `Ok(())` if the file exists, `Err(CompressionError::FileNotFound)` otherwise
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Expands one CLI input (file, directory or glob pattern) into image paths.
///
/// Directories are walked one level deep unless `recursive` is set; hidden
/// entries are skipped. A plain file is taken as-is whatever its extension,
/// the codec decides whether it is an image.
///
/// # Arguments
/// * `input` - A file path, directory path or glob pattern
/// * `recursive` - Walk subdirectories of a directory input
///
/// # Returns
/// * The matching paths, directory entries sorted by name, or an error if a
///   pattern is invalid or a directory cannot be read
pub fn collect_image_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let input_path = Path::new(input);
    let mut image_files = Vec::new();

    if input_path.is_file() {
        image_files.push(input_path.to_path_buf());
    } else if input_path.is_dir() {
        let walker = if recursive {
            WalkDir::new(input_path)
        } else {
            WalkDir::new(input_path).max_depth(1)
        };

        for entry in walker
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_image_file(path) {
                image_files.push(path.to_path_buf());
            }
        }
    } else if let Ok(pattern) = glob(input) {
        for entry in pattern.flatten() {
            if entry.is_file() && is_image_file(&entry) {
                image_files.push(entry);
            }
        }
    } else {
        return Err(CompressionError::NoImageFilesFound(input.to_string()));
    }

    Ok(image_files)
}

/// Progress bar for a batch of `len` items with the shared styling.
pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * A string such as `"512 B"` or `"1.2 MB"`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Calculate the size reduction as a percentage
///
/// # Arguments
/// * `original_size` - Input size in bytes
/// * `compressed_size` - Output size in bytes
///
/// # Returns
/// * Percentage saved; positive means the output shrank, negative means it
///   grew, and an empty input yields `0.0`
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

/// Print the before/after totals and the percentage saved
pub fn print_compression_result(original_size: u64, compressed_size: u64) {
    let ratio = calculate_compression_ratio(original_size, compressed_size);

    report!(
        "📈 Compressed size: {} -> {}",
        format_file_size(original_size),
        format_file_size(compressed_size)
    );
    if ratio > 0.0 {
        report!("✅ Reduced total size by {:.1}%", ratio);
    } else {
        report!("⚠️  Total size increased by {:.1}%", ratio.abs());
    }
}
