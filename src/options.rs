//! Normalized compression options.
//!
//! A [`CompressionOptions`] value is always clamped to its valid ranges when it
//! is built, whether through [`CompressionOptions::new`], the `with_*` setters
//! or JSON deserialization. Nothing downstream validates again.

use crate::constants::{
    DEFAULT_MAX_SIDE, DEFAULT_PNG_LEVEL, DEFAULT_QUALITY, MAX_PNG_LEVEL, MAX_QUALITY,
    MIN_PNG_LEVEL, MIN_QUALITY,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested output format.
///
/// Any string other than the four known names is kept as `Custom`; it plans
/// as a passthrough re-encode in the source format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Original,
    Custom(String),
}

impl From<String> for OutputFormat {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "jpeg" | "jpg" => OutputFormat::Jpeg,
            "webp" => OutputFormat::WebP,
            "original" => OutputFormat::Original,
            _ => OutputFormat::Custom(value),
        }
    }
}

impl From<&str> for OutputFormat {
    fn from(value: &str) -> Self {
        OutputFormat::from(value.to_string())
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::WebP => write!(f, "webp"),
            OutputFormat::Original => write!(f, "original"),
            OutputFormat::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Palette color depth. Only meaningful when palette reduction is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ColorDepth {
    #[serde(rename = "8")]
    #[value(name = "8")]
    Eight,
    #[serde(rename = "24")]
    #[value(name = "24")]
    TwentyFour,
    #[serde(rename = "32")]
    #[value(name = "32")]
    ThirtyTwo,
}

impl ColorDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorDepth::Eight => "8",
            ColorDepth::TwentyFour => "24",
            ColorDepth::ThirtyTwo => "32",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OptionsPayload")]
pub struct CompressionOptions {
    max_side: u32,
    output_format: OutputFormat,
    quality: u8,
    png_level: u8,
    reduce_colors: bool,
    color_depth: ColorDepth,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            output_format: OutputFormat::Png,
            quality: DEFAULT_QUALITY,
            png_level: DEFAULT_PNG_LEVEL,
            reduce_colors: false,
            color_depth: ColorDepth::ThirtyTwo,
        }
    }
}

impl CompressionOptions {
    pub fn new(
        max_side: u32,
        output_format: OutputFormat,
        quality: i64,
        png_level: i64,
        reduce_colors: bool,
        color_depth: ColorDepth,
    ) -> Self {
        Self {
            max_side,
            output_format,
            quality: clamp_quality(quality),
            png_level: clamp_png_level(png_level),
            reduce_colors,
            color_depth,
        }
    }

    /// Parses a serialized options payload, filling missing fields with defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn max_side(&self) -> u32 {
        self.max_side
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn png_level(&self) -> u8 {
        self.png_level
    }

    pub fn reduce_colors(&self) -> bool {
        self.reduce_colors
    }

    pub fn color_depth(&self) -> ColorDepth {
        self.color_depth
    }

    pub fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side;
        self
    }

    pub fn with_output_format(mut self, output_format: impl Into<OutputFormat>) -> Self {
        self.output_format = output_format.into();
        self
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = clamp_quality(quality);
        self
    }

    pub fn with_png_level(mut self, png_level: i64) -> Self {
        self.png_level = clamp_png_level(png_level);
        self
    }

    pub fn with_reduce_colors(mut self, reduce_colors: bool) -> Self {
        self.reduce_colors = reduce_colors;
        self
    }

    pub fn with_color_depth(mut self, color_depth: ColorDepth) -> Self {
        self.color_depth = color_depth;
        self
    }
}

fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8
}

fn clamp_png_level(png_level: i64) -> u8 {
    png_level.clamp(MIN_PNG_LEVEL as i64, MAX_PNG_LEVEL as i64) as u8
}

/// Wire shape of the options payload. Every field is optional and numbers may
/// arrive out of range or fractional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OptionsPayload {
    max_side: Option<f64>,
    output_format: Option<OutputFormat>,
    quality: Option<f64>,
    png_level: Option<f64>,
    reduce_colors: Option<bool>,
    color_depth: Option<ColorDepth>,
}

impl From<OptionsPayload> for CompressionOptions {
    fn from(payload: OptionsPayload) -> Self {
        let defaults = CompressionOptions::default();
        let max_side = payload
            .max_side
            .filter(|side| side.is_finite() && *side > 0.0)
            .map(|side| side.round().min(u32::MAX as f64) as u32)
            .unwrap_or(0);

        CompressionOptions::new(
            max_side,
            payload.output_format.unwrap_or(defaults.output_format),
            payload
                .quality
                .filter(|q| q.is_finite())
                .map(|q| q.round() as i64)
                .unwrap_or(defaults.quality as i64),
            payload
                .png_level
                .filter(|l| l.is_finite())
                .map(|l| l.round() as i64)
                .unwrap_or(defaults.png_level as i64),
            payload.reduce_colors.unwrap_or(defaults.reduce_colors),
            payload.color_depth.unwrap_or(defaults.color_depth),
        )
    }
}
