use crate::constants::{
    AVIF_ENCODER_SPEED, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_MAX_PRESET,
    PNG_COMPRESSION_LEVEL, PNG_EFFORT,
};
use crate::error::{CompressionError, Result};
use crate::formats::ResolvedFormat;
use crate::processing::Quality;
use image::codecs::avif::AvifEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use jpeg_encoder::{ColorType as JpegColorType, Encoder as JpegEncoder};
use oxipng::{Deflaters, Options};

/// Image decode/encode capability used by the job pipeline.
///
/// All pixel work goes through this trait so the pipeline can be driven by
/// a fake in tests.
pub trait Codec: Send + Sync {
    /// Identify the container format of `bytes`, if the codec recognizes it.
    fn introspect_format(&self, bytes: &[u8]) -> Option<ImageFormat>;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    fn encode(
        &self,
        image: &DynamicImage,
        format: ResolvedFormat,
        params: &EncodeParams,
    ) -> Result<Vec<u8>>;
}

/// Per-format encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub quality: Quality,
    /// Build per-image Huffman tables instead of the standard ones (JPEG only)
    pub jpeg_optimize: bool,
    /// zlib level, 0..=9 (PNG only)
    pub png_compression_level: u8,
    /// 1..=10 (PNG only)
    pub png_effort: u8,
}

impl EncodeParams {
    pub fn for_format(format: ResolvedFormat, quality: Quality) -> Self {
        match format {
            ResolvedFormat::Png => Self {
                quality,
                jpeg_optimize: false,
                png_compression_level: PNG_COMPRESSION_LEVEL,
                png_effort: PNG_EFFORT,
            },
            ResolvedFormat::Jpeg | ResolvedFormat::WebP | ResolvedFormat::Avif => Self {
                quality,
                jpeg_optimize: format == ResolvedFormat::Jpeg,
                png_compression_level: 0,
                png_effort: 0,
            },
        }
    }

    fn png_compression_type(&self) -> CompressionType {
        match self.png_compression_level {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }

    fn oxipng_options(&self) -> Options {
        let preset = (u16::from(self.png_effort.min(10)) * u16::from(OXIPNG_MAX_PRESET) / 10) as u8;
        let mut options = Options::from_preset(preset);
        options.deflate = if self.png_effort >= 7 {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            }
        } else {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_LOW_LEVEL,
            }
        };
        options
    }
}

/// Production [`Codec`].
///
/// Decoding, PNG and AVIF go through `image` (PNG output is then re-optimized
/// by `oxipng`); JPEG is written by `jpeg-encoder` and lossy WebP by `webp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }

    fn encode_jpeg(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>> {
        let jpeg_error = |message: String| CompressionError::Encoding {
            format: "JPEG",
            message,
        };
        // JPEG has no alpha channel.
        let rgb = image.to_rgb8();
        let width = u16::try_from(rgb.width())
            .map_err(|_| jpeg_error(format!("width {} exceeds 65535", rgb.width())))?;
        let height = u16::try_from(rgb.height())
            .map_err(|_| jpeg_error(format!("height {} exceeds 65535", rgb.height())))?;

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new(&mut buffer, params.quality.get());
        encoder.set_optimized_huffman_tables(params.jpeg_optimize);
        encoder
            .encode(rgb.as_raw(), width, height, JpegColorType::Rgb)
            .map_err(|e| jpeg_error(e.to_string()))?;
        Ok(buffer)
    }

    fn encode_png(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new_with_quality(
            &mut buffer,
            params.png_compression_type(),
            FilterType::Adaptive,
        );
        integer_pixels(image).write_with_encoder(encoder)?;

        oxipng::optimize_from_memory(&buffer, &params.oxipng_options())
            .map_err(|e| CompressionError::PngOptimization(e.to_string()))
    }

    fn encode_webp(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>> {
        let quality = f32::from(params.quality.get());
        let encoded = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_simple(false, quality)
        } else {
            let rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                .encode_simple(false, quality)
        };

        encoded
            .map(|memory| memory.to_vec())
            .map_err(|e| CompressionError::Encoding {
                format: "WebP",
                message: format!("{:?}", e),
            })
    }

    fn encode_avif(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_ENCODER_SPEED, params.quality.get());
        eight_bit_pixels(image).write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

impl Codec for ImageCodec {
    fn introspect_format(&self, bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// AVIF can be written but not read: the `image` build carries no AVIF
    /// decoder, so AVIF sources are rejected up front.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        if self.introspect_format(bytes) == Some(ImageFormat::Avif) {
            return Err(CompressionError::UnsupportedFormat(
                "AVIF input (AVIF is supported as an output format only)".to_string(),
            ));
        }
        Ok(image::load_from_memory(bytes)?)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ResolvedFormat,
        params: &EncodeParams,
    ) -> Result<Vec<u8>> {
        match format {
            ResolvedFormat::Jpeg => self.encode_jpeg(image, params),
            ResolvedFormat::Png => self.encode_png(image, params),
            ResolvedFormat::WebP => self.encode_webp(image, params),
            ResolvedFormat::Avif => self.encode_avif(image, params),
        }
    }
}

/// PNG accepts 8 and 16 bit integer layouts only.
fn integer_pixels(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(image.to_rgb16()),
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(image.to_rgba16()),
        other => other.clone(),
    }
}

fn eight_bit_pixels(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}
