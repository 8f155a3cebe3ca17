use crate::codec::Codec;
use crate::error::Result;
use crate::estimate::estimate;
use crate::options::CompressionOptions;
use crate::plan::{plan_transform, EncodeSpec, ImageMetadata, TransformPlan};
use crate::report;
use crate::utils::{format_file_size, validate_file_exists};
use std::fs;
use std::path::Path;

/// Codec view of one file plus what the current options would do to it.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub size: u64,
    pub metadata: ImageMetadata,
    pub plan: TransformPlan,
}

/// Probe a file and plan its transform without encoding anything
///
/// # Arguments
/// * `codec` - Codec used to read dimensions and detected format
/// * `input_path` - The image file to inspect
/// * `options` - Options the plan is computed for
///
/// # Returns
/// * The file size, codec metadata and transform plan, or an error if the
///   file is missing or not a decodable image
pub fn inspect_image<C: Codec + ?Sized>(
    codec: &C,
    input_path: &Path,
    options: &CompressionOptions,
) -> Result<ImageInfo> {
    validate_file_exists(input_path)?;
    let bytes = fs::read(input_path)?;
    let metadata = codec.probe(&bytes)?;

    Ok(ImageInfo {
        size: bytes.len() as u64,
        metadata,
        plan: plan_transform(&metadata, options),
    })
}

/// Print [`inspect_image`] results and the single-file size estimate
pub fn print_image_info<C: Codec + ?Sized>(
    codec: &C,
    input_path: &Path,
    options: &CompressionOptions,
) -> Result<()> {
    let info = inspect_image(codec, input_path, options)?;
    let ImageMetadata {
        width,
        height,
        format,
    } = info.metadata;

    report!("📊 Analyzing image: {:?}", input_path);
    report!("📋 Basic Information:");
    report!("  📏 Dimensions: {}x{} pixels", width, height);
    report!("  📦 File size: {} ({} bytes)", format_file_size(info.size), info.size);
    match format {
        Some(kind) => report!("  🎭 Detected format: {}", kind),
        None => report!("  🎭 Detected format: unknown (treated as PNG)"),
    }
    if height > 0 {
        report!("  📐 Aspect ratio: {:.2}:1", width as f64 / height as f64);
    }

    report!("\n🛠️  Planned transform:");
    match info.plan.resize {
        Some(resize) => report!("  📏 Resize to {}x{}", resize.width, resize.height),
        None => report!("  📏 No resize"),
    }
    report!("  🎯 {}", describe_encode(&info.plan.encode));

    let prediction = estimate(options, info.size, 1);
    report!(
        "\n💡 Estimated output: {} (saving {}, {}%)",
        format_file_size(prediction.estimated_size),
        format_file_size(prediction.saving_size),
        prediction.saving_rate
    );

    Ok(())
}

fn describe_encode(encode: &EncodeSpec) -> String {
    match encode {
        EncodeSpec::Png(params) => {
            let mut text = format!("PNG, compression level {}", params.compression_level);
            if params.palette {
                text.push_str(&format!(", palette at quality {}", params.quality));
                if let Some(colors) = params.colors {
                    text.push_str(&format!(" ({} colors)", colors));
                }
            }
            text
        }
        EncodeSpec::Jpeg { quality } => format!("JPEG, quality {}", quality),
        EncodeSpec::WebP {
            quality,
            alpha_quality,
        } => format!("WebP, quality {} (alpha {})", quality, alpha_quality),
        EncodeSpec::Passthrough {
            format,
            label: Some(label),
        } => format!(
            "{} re-encoded with encoder defaults, reported as {}",
            format, label
        ),
        EncodeSpec::Passthrough { format, .. } => {
            format!("{} re-encoded with encoder defaults", format)
        }
    }
}
