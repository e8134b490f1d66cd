// imgnorm/src/processors/resizer.rs
use crate::core::{DimensionPair, ResizeAlgorithm};
use image::{imageops::FilterType, DynamicImage};

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Resamples to exactly `target`. Returns the image untouched when the
    /// dimensions already match.
    pub fn resample(&self, image: DynamicImage, target: DimensionPair) -> DynamicImage {
        if target.width == image.width() && target.height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image;
        }

        log::debug!(
            "Resizing image from {}x{} to {} ({:?})",
            image.width(),
            image.height(),
            target,
            self.algorithm
        );

        image.resize_exact(target.width, target.height, self.get_filter_type())
    }

    fn get_filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn resamples_to_target() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(64, 32));
        let out = Resizer::default().resample(image, DimensionPair::new(32, 16));
        assert_eq!((out.width(), out.height()), (32, 16));
    }

    #[test]
    fn same_size_is_a_no_op() {
        let mut buffer = RgbImage::new(8, 8);
        buffer.put_pixel(3, 3, image::Rgb([200, 10, 10]));
        let image = DynamicImage::ImageRgb8(buffer);
        let out = Resizer::new(ResizeAlgorithm::Nearest).resample(image.clone(), DimensionPair::new(8, 8));
        assert_eq!(out, image);
    }
}
