//! Transform planning.
//!
//! Turns normalized options plus the metadata of one source image into the
//! resize and encode steps the codec should run. Pure: no I/O, no decoding.

use crate::constants::PALETTE_COLORS;
use crate::formats::{EffectiveFormat, ImageKind};
use crate::options::{ColorDepth, CompressionOptions, OutputFormat};

/// Dimensions and detected format of a source image, as reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageKind>,
}

/// Fit-inside, never-enlarge resize target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngParams {
    pub compression_level: u8,
    pub palette: bool,
    pub quality: u8,
    /// Palette size cap; only set for 8-bit palette output.
    pub colors: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeSpec {
    Png(PngParams),
    Jpeg { quality: u8 },
    WebP { quality: u8, alpha_quality: u8 },
    /// Re-encode in the given source format with encoder defaults. `label`
    /// is the custom format name the caller asked for, if any.
    Passthrough {
        format: ImageKind,
        label: Option<String>,
    },
}

impl EncodeSpec {
    pub fn format(&self) -> ImageKind {
        match self {
            EncodeSpec::Png(_) => ImageKind::Png,
            EncodeSpec::Jpeg { .. } => ImageKind::Jpeg,
            EncodeSpec::WebP { .. } => ImageKind::WebP,
            EncodeSpec::Passthrough { format, .. } => *format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPlan {
    pub resize: Option<ResizeSpec>,
    pub encode: EncodeSpec,
}

impl TransformPlan {
    /// The output format once `original` has been resolved. A custom
    /// format name is reported as requested.
    pub fn effective_format(&self) -> EffectiveFormat {
        match &self.encode {
            EncodeSpec::Passthrough {
                label: Some(label), ..
            } => EffectiveFormat::Custom(label.clone()),
            encode => EffectiveFormat::Known(encode.format()),
        }
    }
}

pub fn plan_transform(metadata: &ImageMetadata, options: &CompressionOptions) -> TransformPlan {
    TransformPlan {
        resize: plan_resize(metadata.width, metadata.height, options.max_side()),
        encode: plan_encode(metadata.format, options),
    }
}

/// Caps the longer side at `max_side`. Returns `None` when no shrinking is
/// needed; a zero `max_side` disables resizing.
pub fn plan_resize(width: u32, height: u32, max_side: u32) -> Option<ResizeSpec> {
    if max_side == 0 {
        return None;
    }

    let max_side = max_side as f64;
    let scale = (max_side / width.max(1) as f64).min(max_side / height.max(1) as f64);
    if scale >= 1.0 {
        return None;
    }

    Some(ResizeSpec {
        width: ((width as f64 * scale).round() as u32).max(1),
        height: ((height as f64 * scale).round() as u32).max(1),
    })
}

pub fn resolve_format(output_format: &OutputFormat, detected: Option<ImageKind>) -> ImageKind {
    match output_format {
        OutputFormat::Png => ImageKind::Png,
        OutputFormat::Jpeg => ImageKind::Jpeg,
        OutputFormat::WebP => ImageKind::WebP,
        OutputFormat::Original | OutputFormat::Custom(_) => detected.unwrap_or(ImageKind::Png),
    }
}

pub fn plan_encode(detected: Option<ImageKind>, options: &CompressionOptions) -> EncodeSpec {
    let format = resolve_format(options.output_format(), detected);

    // A custom format never gets tuned parameters, even if the source happens
    // to be one of the tunable formats.
    if let OutputFormat::Custom(label) = options.output_format() {
        return EncodeSpec::Passthrough {
            format,
            label: Some(label.clone()),
        };
    }

    let quality = options.quality();
    match format {
        ImageKind::Png => EncodeSpec::Png(PngParams {
            compression_level: options.png_level(),
            palette: options.reduce_colors(),
            quality,
            colors: (options.reduce_colors() && options.color_depth() == ColorDepth::Eight)
                .then_some(PALETTE_COLORS),
        }),
        ImageKind::Jpeg => EncodeSpec::Jpeg { quality },
        ImageKind::WebP => EncodeSpec::WebP {
            quality,
            alpha_quality: quality,
        },
        other => EncodeSpec::Passthrough {
            format: other,
            label: None,
        },
    }
}
