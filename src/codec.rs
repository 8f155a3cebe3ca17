use crate::constants::{LIBDEFLATER_LEVELS, OXIPNG_PRESETS, PALETTE_COLORS};
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::plan::{EncodeSpec, ImageMetadata, PngParams, ResizeSpec, TransformPlan};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use imagequant::{Attributes, RGBA};
use oxipng::{optimize_from_memory, Deflaters, Options, StripChunks};
use std::io::Cursor;

/// Pixel-level collaborator: introspects and re-encodes image buffers.
///
/// The planner and batch executor never touch pixels themselves; everything
/// below this trait is delegated to an image library.
pub trait Codec: Send + Sync {
    /// Reads dimensions and format without decoding the full image.
    fn probe(&self, bytes: &[u8]) -> Result<ImageMetadata>;

    /// Decodes `bytes`, applies the plan's resize and encodes per its encode spec.
    fn encode(&self, bytes: &[u8], plan: &TransformPlan) -> Result<Vec<u8>>;
}

/// Default codec built on `image`, `oxipng`, `imagequant` and `webp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn probe(&self, bytes: &[u8]) -> Result<ImageMetadata> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format().and_then(ImageKind::from_image_format);
        let (width, height) = reader.into_dimensions()?;

        Ok(ImageMetadata {
            width,
            height,
            format,
        })
    }

    fn encode(&self, bytes: &[u8], plan: &TransformPlan) -> Result<Vec<u8>> {
        let mut img = image::load_from_memory(bytes)?;
        if let Some(resize) = &plan.resize {
            resize_image(&mut img, resize);
        }

        match &plan.encode {
            EncodeSpec::Png(params) => encode_png(&img, params),
            EncodeSpec::Jpeg { quality } => encode_jpeg(&img, *quality),
            EncodeSpec::WebP {
                quality,
                alpha_quality,
            } => encode_webp(&img, *quality, *alpha_quality),
            EncodeSpec::Passthrough { format, .. } => encode_passthrough(&img, *format),
        }
    }
}

/// Shrinks to the planned size. The planner already preserved the aspect
/// ratio, so an exact resize is a fit-inside resize here.
pub fn resize_image(img: &mut DynamicImage, resize: &ResizeSpec) {
    if resize.width >= img.width() && resize.height >= img.height() {
        return;
    }
    *img = img.resize_exact(resize.width, resize.height, FilterType::Lanczos3);
}

pub fn encode_png(img: &DynamicImage, params: &PngParams) -> Result<Vec<u8>> {
    let source = if params.palette {
        quantize(img, params)?
    } else {
        img.clone()
    };

    let compression = if params.compression_level == 0 {
        CompressionType::Fast
    } else {
        CompressionType::Default
    };
    let mut buf = Vec::new();
    source.write_with_encoder(PngEncoder::new_with_quality(
        &mut buf,
        compression,
        PngFilter::Adaptive,
    ))?;

    // Level 0 means "store fast"; palette output still goes through oxipng so
    // the quantized pixels get written as an indexed PNG.
    if params.compression_level == 0 && !params.palette {
        return Ok(buf);
    }

    let level = usize::from(params.compression_level.min(9));
    let mut oxipng_options = Options::from_preset(OXIPNG_PRESETS[level]);
    oxipng_options.strip = StripChunks::Safe;
    oxipng_options.deflate = Deflaters::Libdeflater {
        compression: LIBDEFLATER_LEVELS[level],
    };

    optimize_from_memory(&buf, &oxipng_options)
        .map_err(|e| CompressionError::PngOptimization(e.to_string()))
}

/// Reduces the image to a palette with libimagequant and expands it back to
/// RGBA; oxipng then stores it as indexed color.
fn quantize(img: &DynamicImage, params: &PngParams) -> Result<DynamicImage> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let quant_err = |e: imagequant::Error| CompressionError::Quantization(e.to_string());

    let mut attr = Attributes::new();
    attr.set_max_colors(params.colors.unwrap_or(PALETTE_COLORS))
        .map_err(quant_err)?;
    attr.set_quality(0, params.quality).map_err(quant_err)?;

    let pixels: Vec<RGBA> = rgba
        .pixels()
        .map(|p| RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();
    let mut liq_image = attr
        .new_image(pixels, width as usize, height as usize, 0.0)
        .map_err(quant_err)?;

    let mut result = attr.quantize(&mut liq_image).map_err(quant_err)?;
    result.set_dithering_level(1.0).map_err(quant_err)?;
    let (palette, indices) = result.remapped(&mut liq_image).map_err(quant_err)?;

    let mut expanded = Vec::with_capacity(indices.len() * 4);
    for index in indices {
        let color = palette[usize::from(index)];
        expanded.extend_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    RgbaImage::from_raw(width, height, expanded)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| CompressionError::Quantization("palette expansion size mismatch".into()))
}

pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

pub fn encode_webp(img: &DynamicImage, quality: u8, alpha_quality: u8) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();

    let mut config = libwebp_sys::WebPConfig::new()
        .map_err(|_| CompressionError::WebPEncoding("invalid libwebp configuration".into()))?;
    config.lossless = 0;
    config.quality = f32::from(quality);
    config.alpha_quality = i32::from(alpha_quality);

    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| CompressionError::WebPEncoding(format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

/// Re-encodes in `format` with the encoder's defaults.
pub fn encode_passthrough(img: &DynamicImage, format: ImageKind) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let target = format.to_image_format();
    match format {
        ImageKind::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut cursor, target)?,
        _ => img.write_to(&mut cursor, target)?,
    }
    Ok(cursor.into_inner())
}
