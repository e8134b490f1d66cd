// imgnorm/src/processors/compressor.rs
use crate::core::{OutputFormat, ResizeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;
use oxipng::{optimize_from_memory, Options};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub struct Compressor {
    quality: u8,
    optimize_png: bool,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize_png: true,
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Encodes `image` into an in-memory buffer in `format`.
    pub fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
                rgb.write_with_encoder(encoder)?;
            }
            OutputFormat::WebP => {
                let pixels = if image.color().has_alpha() {
                    DynamicImage::ImageRgba8(image.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                };
                let encoder = webp::Encoder::from_image(&pixels).map_err(|e| {
                    ResizeError::ProcessingError(format!("WebP encoding failed: {}", e))
                })?;
                return Ok(encoder.encode(f32::from(self.quality)).to_vec());
            }
            OutputFormat::Png => {
                image.write_with_encoder(PngEncoder::new(&mut buffer))?;
                if self.optimize_png {
                    return self.optimize_png_bytes(&buffer.into_inner());
                }
            }
            other => {
                image.write_to(&mut buffer, other.image_format())?;
            }
        }

        Ok(buffer.into_inner())
    }

    /// Writes `data` to `path` through a temp file in the same directory,
    /// so a reader never sees a partially written output.
    pub fn write_atomic(&self, data: &[u8], path: &Path) -> Result<u64> {
        let encode_error = |reason: String| ResizeError::Encode {
            path: path.to_path_buf(),
            reason,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // create_dir_all already treats a concurrently created directory as success
        std::fs::create_dir_all(parent).map_err(|e| encode_error(e.to_string()))?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| encode_error(e.to_string()))?;
        temp_file
            .write_all(data)
            .map_err(|e| encode_error(e.to_string()))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| encode_error(e.to_string()))?;
        temp_file
            .persist(path)
            .map_err(|e| encode_error(e.error.to_string()))?;

        log::debug!("Saved image: {} ({} bytes)", path.display(), data.len());
        Ok(data.len() as u64)
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::default())
            .map_err(|e| ResizeError::ProcessingError(format!("PNG optimization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 9, image::Rgba([10, 120, 200, 128])))
    }

    #[test]
    fn encodes_every_output_format() {
        let compressor = Compressor::new(90);
        for format in [
            OutputFormat::WebP,
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::Bmp,
            OutputFormat::Tiff,
            OutputFormat::Gif,
        ] {
            let data = compressor.encode(&sample(), format).unwrap();
            let decoded = image::load_from_memory_with_format(&data, format.image_format()).unwrap();
            assert_eq!(decoded.dimensions(), (16, 9), "{:?}", format);
        }
    }

    fn gradient() -> DynamicImage {
        let mut buffer = RgbImage::new(64, 64);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8]);
        }
        DynamicImage::ImageRgb8(buffer)
    }

    #[test]
    fn webp_quality_changes_size() {
        let image = gradient();

        let low = Compressor::new(10).encode(&image, OutputFormat::WebP).unwrap();
        let high = Compressor::new(98).encode(&image, OutputFormat::WebP).unwrap();
        assert!(low.len() < high.len(), "q10={} q98={}", low.len(), high.len());

        let decoded = image::load_from_memory_with_format(&low, image::ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let image = gradient();

        let low = Compressor::new(10).encode(&image, OutputFormat::Jpeg).unwrap();
        let high = Compressor::new(100).encode(&image, OutputFormat::Jpeg).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn atomic_write_leaves_only_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out_resized.png");

        let compressor = Compressor::new(90).with_png_optimization(false);
        let data = compressor.encode(&sample(), OutputFormat::Png).unwrap();
        let written = compressor.write_atomic(&data, &path).unwrap();

        assert!(written > 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_failure_is_an_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = Compressor::new(90).write_atomic(b"data", &blocker.join("out.webp"));
        assert!(matches!(result, Err(ResizeError::Encode { .. })));
    }
}
