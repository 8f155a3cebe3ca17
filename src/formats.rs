//! Type-safe image kinds
//!
//! The closed set of formats the codec can detect and re-encode. Effective
//! output formats, file extensions and MIME types all derive from here.
use crate::error::{CompressionError, Result};
use image::ImageFormat;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Avif,
    Ico,
}

impl ImageKind {
    /// Maps a format detected by the `image` crate onto a kind we can re-encode.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::WebP => Some(ImageKind::WebP),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Bmp => Some(ImageKind::Bmp),
            ImageFormat::Tiff => Some(ImageKind::Tiff),
            ImageFormat::Avif => Some(ImageKind::Avif),
            ImageFormat::Ico => Some(ImageKind::Ico),
            _ => None,
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::WebP => ImageFormat::WebP,
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::Bmp => ImageFormat::Bmp,
            ImageKind::Tiff => ImageFormat::Tiff,
            ImageKind::Avif => ImageFormat::Avif,
            ImageKind::Ico => ImageFormat::Ico,
        }
    }

    /// Lowercase format name, as reported in processed outputs.
    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::WebP => "webp",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::Tiff => "tiff",
            ImageKind::Avif => "avif",
            ImageKind::Ico => "ico",
        }
    }

    /// File extension for derived output names. Only JPEG differs from `name`.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            other => other.name(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::WebP => "image/webp",
            ImageKind::Gif => "image/gif",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Tiff => "image/tiff",
            ImageKind::Avif => "image/avif",
            ImageKind::Ico => "image/x-icon",
        }
    }

    /// Rough decoded-size multiplier relative to the encoded file size.
    pub fn memory_multiplier(&self) -> f64 {
        match self {
            ImageKind::Jpeg | ImageKind::Avif => 4.0,
            ImageKind::Png => 3.0,
            ImageKind::WebP => 3.5,
            ImageKind::Bmp | ImageKind::Tiff => 1.2,
            ImageKind::Gif | ImageKind::Ico => 2.0,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Png => "PNG",
            ImageKind::Jpeg => "JPEG",
            ImageKind::WebP => "WebP",
            ImageKind::Gif => "GIF",
            ImageKind::Bmp => "BMP",
            ImageKind::Tiff => "TIFF",
            ImageKind::Avif => "AVIF",
            ImageKind::Ico => "ICO",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ImageKind {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageKind::Png),
            "jpeg" | "jpg" => Ok(ImageKind::Jpeg),
            "webp" => Ok(ImageKind::WebP),
            "gif" => Ok(ImageKind::Gif),
            "bmp" => Ok(ImageKind::Bmp),
            "tiff" | "tif" => Ok(ImageKind::Tiff),
            "avif" => Ok(ImageKind::Avif),
            "ico" => Ok(ImageKind::Ico),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Format reported for a processed output.
///
/// A custom name requested by the caller is kept as typed for the derived
/// filename and MIME type, while the bytes are re-encoded in the source kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectiveFormat {
    Known(ImageKind),
    Custom(String),
}

impl EffectiveFormat {
    pub fn name(&self) -> &str {
        match self {
            EffectiveFormat::Known(kind) => kind.name(),
            EffectiveFormat::Custom(name) => name,
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            EffectiveFormat::Known(kind) => kind.extension(),
            EffectiveFormat::Custom(name) => name,
        }
    }

    pub fn mime_type(&self) -> Cow<'static, str> {
        match self {
            EffectiveFormat::Known(kind) => Cow::Borrowed(kind.mime_type()),
            EffectiveFormat::Custom(name) => Cow::Owned(format!("image/{}", name)),
        }
    }
}

impl From<ImageKind> for EffectiveFormat {
    fn from(kind: ImageKind) -> Self {
        EffectiveFormat::Known(kind)
    }
}

impl fmt::Display for EffectiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveFormat::Known(kind) => write!(f, "{}", kind),
            EffectiveFormat::Custom(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_from_str() {
        assert_eq!(ImageKind::from_str("jpeg").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_str("JPG").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_str("PNG").unwrap(), ImageKind::Png);
        assert_eq!(ImageKind::from_str("tif").unwrap(), ImageKind::Tiff);

        assert!(ImageKind::from_str("heic").is_err());
    }

    #[test]
    fn test_extension_only_shortens_jpeg() {
        assert_eq!(ImageKind::Jpeg.extension(), "jpg");
        assert_eq!(ImageKind::Png.extension(), "png");
        assert_eq!(ImageKind::WebP.extension(), "webp");
        assert_eq!(ImageKind::Tiff.extension(), "tiff");
    }

    #[test]
    fn test_image_format_mapping() {
        assert_eq!(
            ImageKind::from_image_format(ImageFormat::Jpeg),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(ImageKind::from_image_format(ImageFormat::Qoi), None);
        assert_eq!(ImageKind::Gif.to_image_format(), ImageFormat::Gif);
    }

    #[test]
    fn test_display_and_mime() {
        assert_eq!(format!("{}", ImageKind::WebP), "WebP");
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_custom_effective_format_is_kept_verbatim() {
        let custom = EffectiveFormat::Custom("heic".to_string());
        assert_eq!(custom.name(), "heic");
        assert_eq!(custom.extension(), "heic");
        assert_eq!(custom.mime_type(), "image/heic");

        let jpeg = EffectiveFormat::from(ImageKind::Jpeg);
        assert_eq!(jpeg.extension(), "jpg");
        assert_eq!(jpeg.mime_type(), "image/jpeg");
    }
}
