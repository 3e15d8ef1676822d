//! Decoded source images and the background thread that produces them.

use std::path::Path;

use image::{ImageReader, RgbaImage, imageops::FilterType};

use crate::constants::MAX_SOURCE_DIMENSION;
use crate::error::{Error, Result};

pub mod loader;
mod worker;

/// A decoded RGBA8 raster, row 0 at the top.
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Opens and decodes the image at `path`, shrinking it to fit within
    /// `MAX_SOURCE_DIMENSION` on both sides.
    pub fn open(path: &Path) -> Result<Self> {
        let to_error = |err: image::ImageError| Error::Image(path.into(), err);
        let decoded = ImageReader::open(path)
            .map_err(|err| to_error(err.into()))?
            .with_guessed_format()
            .map_err(|err| to_error(err.into()))?
            .decode()
            .map_err(to_error)?;

        let decoded = if decoded.width() > MAX_SOURCE_DIMENSION
            || decoded.height() > MAX_SOURCE_DIMENSION
        {
            decoded.resize(
                MAX_SOURCE_DIMENSION,
                MAX_SOURCE_DIMENSION,
                FilterType::Triangle,
            )
        } else {
            decoded
        };

        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Bilinearly samples the RGB channels at `uv`, clamping to the edge texels. Like the GPU
    /// sampler, `v = 1` is the top row of the image.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn sample(&self, uv: glam::Vec2) -> glam::Vec3 {
        let width = self.pixels.width() as i64;
        let height = self.pixels.height() as i64;
        if width == 0 || height == 0 {
            return glam::Vec3::ZERO;
        }

        let x = uv.x * width as f32 - 0.5;
        let y = (1.0 - uv.y) * height as f32 - 0.5;
        let (x_floor, y_floor) = (x.floor(), y.floor());
        let (fx, fy) = (x - x_floor, y - y_floor);

        let texel = |x: i64, y: i64| {
            let x = x.clamp(0, width - 1) as u32;
            let y = y.clamp(0, height - 1) as u32;
            let [r, g, b, _] = self.pixels.get_pixel(x, y).0;
            glam::vec3(r as f32, g as f32, b as f32) / 255.0
        };

        let (x0, y0) = (x_floor as i64, y_floor as i64);
        let top = texel(x0, y0).lerp(texel(x0 + 1, y0), fx);
        let bottom = texel(x0, y0 + 1).lerp(texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const WHITE: [u8; 4] = [255, 255, 255, 255];
    pub const BLACK: [u8; 4] = [0, 0, 0, 255];

    /// Builds an image from rows of pixels, top row first.
    pub fn image_from_rows(rows: &[&[[u8; 4]]]) -> SourceImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let raw = rows.iter().flat_map(|row| row.iter().flatten().copied()).collect();
        SourceImage::from_rgba(RgbaImage::from_raw(width, height, raw).unwrap())
    }

    #[test]
    fn corners_sample_exact_texels() {
        let image = image_from_rows(&[&[WHITE, BLACK], &[BLACK, WHITE]]);
        assert_eq!(image.sample(glam::vec2(0.0, 1.0)), glam::Vec3::ONE);
        assert_eq!(image.sample(glam::vec2(1.0, 1.0)), glam::Vec3::ZERO);
        assert_eq!(image.sample(glam::vec2(0.0, 0.0)), glam::Vec3::ZERO);
        assert_eq!(image.sample(glam::vec2(1.0, 0.0)), glam::Vec3::ONE);
    }

    #[test]
    fn centre_blends_all_four_texels() {
        let image = image_from_rows(&[&[WHITE, BLACK], &[BLACK, WHITE]]);
        let centre = image.sample(glam::vec2(0.5, 0.5));
        assert!((centre - glam::Vec3::splat(0.5)).abs().max_element() < 1e-6);
    }

    #[test]
    fn top_row_is_v_one() {
        let red = [255, 0, 0, 255];
        let blue = [0, 0, 255, 255];
        let image = image_from_rows(&[&[red], &[blue]]);
        assert_eq!(image.sample(glam::vec2(0.5, 1.0)), glam::vec3(1.0, 0.0, 0.0));
        assert_eq!(image.sample(glam::vec2(0.5, 0.0)), glam::vec3(0.0, 0.0, 1.0));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let result = SourceImage::open(Path::new("/no/such/memory.jpg"));
        assert!(matches!(result, Err(Error::Image(..))));
    }

    #[test]
    fn large_images_are_downscaled() {
        let path = std::env::temp_dir().join("memory-particles-large.png");
        RgbaImage::from_pixel(MAX_SOURCE_DIMENSION * 2, 16, image::Rgba(WHITE))
            .save(&path)
            .unwrap();
        let image = SourceImage::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(image.width(), MAX_SOURCE_DIMENSION);
        assert_eq!(image.height(), 8);
    }
}
