//! Pre-compression size estimate.
//!
//! A heuristic model of how much the selected options will shrink a set of
//! files. It never looks at pixel data; callers run it on every options or
//! selection change to give immediate feedback.

use crate::options::{ColorDepth, CompressionOptions, OutputFormat};
use serde::Serialize;

/// Floor applied per file, in bytes.
const MIN_BYTES_PER_FILE: u64 = 1024;
const MIN_RATIO: f64 = 0.20;
const MAX_RATIO: f64 = 1.00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub estimated_size: u64,
    pub saving_size: u64,
    /// Whole percent of the input saved.
    pub saving_rate: u8,
}

/// Predicted output/input size ratio for the given options, in `[0.20, 1.00]`.
pub fn estimate_ratio(options: &CompressionOptions) -> f64 {
    let quality_ratio = f64::from(options.quality().clamp(10, 100)) / 100.0;

    let mut ratio = match options.output_format() {
        OutputFormat::Png => {
            let mut ratio = 0.76 - f64::from(options.png_level()) * 0.015;
            if options.reduce_colors() {
                ratio -= 0.16;
            }
            if options.color_depth() == ColorDepth::Eight {
                ratio -= 0.12;
            }
            ratio
        }
        OutputFormat::Jpeg => 0.22 + quality_ratio * 0.68,
        OutputFormat::WebP => 0.16 + quality_ratio * 0.58,
        OutputFormat::Original | OutputFormat::Custom(_) => 0.95,
    };

    let max_side = options.max_side();
    if max_side > 0 {
        ratio *= if max_side <= 1200 {
            0.72
        } else if max_side <= 2000 {
            0.82
        } else {
            0.90
        };
    }

    ratio.clamp(MIN_RATIO, MAX_RATIO)
}

pub fn estimate(options: &CompressionOptions, total_bytes: u64, file_count: usize) -> Estimate {
    if total_bytes == 0 {
        return Estimate::default();
    }

    let ratio = estimate_ratio(options);
    let predicted = (total_bytes as f64 * ratio).round() as u64;
    let estimated_size = predicted
        .max(file_count as u64 * MIN_BYTES_PER_FILE)
        .min(total_bytes);
    let saving_size = total_bytes - estimated_size;
    let saving_rate = (saving_size as f64 / total_bytes as f64 * 100.0).round() as u8;

    Estimate {
        estimated_size,
        saving_size,
        saving_rate,
    }
}
