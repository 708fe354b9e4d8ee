//! Image handling for PDF documents

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Image scaling mode inside a target box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Stretch to exact dimensions
    #[default]
    Stretch,
    /// Scale proportionally based on width, auto-calculate height
    FitWidth,
    /// Scale proportionally based on height, auto-calculate width
    FitHeight,
    /// Fit within bounding box, preserving aspect ratio
    FitBox,
}

/// Pixel dimensions of an encoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Calculate display dimensions based on scaling mode
///
/// # Arguments
/// * `original_width` - Original image width in pixels
/// * `original_height` - Original image height in pixels
/// * `target_width` - Target width (any unit)
/// * `target_height` - Target height (same unit)
/// * `mode` - Scaling mode
///
/// # Returns
/// (actual_width, actual_height) in the target unit
pub fn calculate_scaled_dimensions(
    original_width: u32,
    original_height: u32,
    target_width: f64,
    target_height: f64,
    mode: ImageScaleMode,
) -> (f64, f64) {
    if original_width == 0 || original_height == 0 {
        return (target_width, target_height);
    }
    match mode {
        ImageScaleMode::Stretch => (target_width, target_height),
        ImageScaleMode::FitWidth => {
            let aspect = original_height as f64 / original_width as f64;
            (target_width, target_width * aspect)
        }
        ImageScaleMode::FitHeight => {
            let aspect = original_width as f64 / original_height as f64;
            (target_height * aspect, target_height)
        }
        ImageScaleMode::FitBox => {
            let width_ratio = target_width / original_width as f64;
            let height_ratio = target_height / original_height as f64;
            let scale = width_ratio.min(height_ratio);
            (
                original_width as f64 * scale,
                original_height as f64 * scale,
            )
        }
    }
}

/// Get image dimensions without fully decoding
pub fn get_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(ImageDimensions { width, height })
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray", "DeviceCMYK")
    pub color_space: &'static str,
    /// PDF filter ("DCTDecode" for JPEG, "FlateDecode" otherwise)
    pub filter: &'static str,
    /// Encoded image data
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Create an XObject from encoded image bytes (JPEG or PNG)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        match reader.format() {
            Some(ImageFormat::Jpeg) => Self::from_jpeg(data),
            Some(_) => Self::from_decoded(data),
            None => Err(PdfError::ImageError("Unknown image format".to_string())),
        }
    }

    /// JPEG data is embedded as-is with the DCTDecode filter
    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_space = match decoder.color_type().channel_count() {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// Other formats are decoded, alpha is blended onto white, and the
    /// samples are re-encoded with FlateDecode
    fn from_decoded(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;
        let (width, height) = (image.width(), image.height());

        let (raw, color_space) = match (color_type.has_color(), color_type.has_alpha()) {
            (false, false) => (image.to_luma8().into_raw(), "DeviceGray"),
            (false, true) => {
                let raw = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| blend_on_white(p[0], p[1]))
                    .collect();
                (raw, "DeviceGray")
            }
            (true, true) => {
                let mut raw = Vec::with_capacity((width * height * 3) as usize);
                for p in image.to_rgba8().pixels() {
                    raw.push(blend_on_white(p[0], p[3]));
                    raw.push(blend_on_white(p[1], p[3]));
                    raw.push(blend_on_white(p[2], p[3]));
                }
                (raw, "DeviceRGB")
            }
            (true, false) => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", 8);
        dict.set("Filter", Object::Name(self.filter.as_bytes().to_vec()));

        Stream::new(dict, self.data.clone())
    }
}

fn blend_on_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as f32 / 255.0;
    (value as f32 * a + 255.0 * (1.0 - a)).round() as u8
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom, PDF coordinates)
/// * `width` - Image width in points
/// * `height` - Image height in points
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width:.3} 0 0 {height:.3} {x:.3} {y:.3} cm\n/{image_name} Do\nQ\n").into_bytes()
}
