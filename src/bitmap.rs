//! Binary raster model and the image → bitmap front-end.

use std::path::Path;

use image::{GrayImage, ImageReader};
use imageproc::filter::{box_filter, median_filter};

use crate::config::Config;
use crate::error::TraceError;

/// Binary raster, row-major, y increasing downward. true = foreground.
///
/// Read-only for the whole pipeline once built; the contour extractor
/// clones its own working copy.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Bitmap {
    /// All-background bitmap of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Bitmap {
            width,
            height,
            data: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Out of bounds reads as background.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width as i32 || y < 0 || y >= self.height as i32 {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.data[y as usize * self.width as usize + x as usize] = value;
    }

    /// Build from a binary grayscale image (non-zero = foreground).
    pub fn from_gray(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let mut bm = Bitmap::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if img.get_pixel(x, y).0[0] > 0 {
                    bm.set(x, y, true);
                }
            }
        }
        bm
    }

    /// Toggle all pixels in row `y` from column `x` to the right edge.
    pub(crate) fn xor_row_from(&mut self, x: i32, y: i32) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let row = y as usize * self.width as usize;
        for xi in x.max(0) as usize..self.width as usize {
            self.data[row + xi] ^= true;
        }
    }
}

/// Load an image and binarize it for tracing.
pub fn load_and_binarize(path: &Path, config: &Config) -> Result<Bitmap, TraceError> {
    let gray = ImageReader::open(path)
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| TraceError::ImageLoad(e.to_string()))?
        .into_luma8();
    Ok(binarize(&gray, config))
}

/// Median blur, then adaptive threshold against the local mean.
///
/// A pixel is foreground when it sits above its block mean minus
/// `c_value`; `invert` flips the result. Note that a uniform region always
/// binarizes to foreground (its value equals the local mean), so line art
/// on a plain background is usually traced with `invert` on.
pub fn binarize(gray: &GrayImage, config: &Config) -> Bitmap {
    let blurred = if config.blur_size > 1 {
        let r = (config.blur_size - 1) / 2;
        median_filter(gray, r, r)
    } else {
        gray.clone()
    };

    let r = (config.block_size.max(3) - 1) / 2;
    let mean = box_filter(&blurred, r, r);

    let (w, h) = gray.dimensions();
    let mut bm = Bitmap::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = blurred.get_pixel(x, y).0[0] as f32;
            let m = mean.get_pixel(x, y).0[0] as f32;
            let fg = v > m - config.c_value;
            bm.set(x, y, fg != config.invert);
        }
    }
    bm
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn out_of_bounds_reads_background() {
        let mut bm = Bitmap::new(4, 4);
        bm.set(0, 0, true);
        assert!(bm.get(0, 0));
        assert!(!bm.get(-1, 0));
        assert!(!bm.get(0, -1));
        assert!(!bm.get(4, 0));
        assert!(!bm.get(0, 4));
    }

    #[test]
    fn from_gray_marks_nonzero_pixels() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(1, 0, Luma([255]));
        img.put_pixel(2, 1, Luma([1]));
        let bm = Bitmap::from_gray(&img);
        assert!(bm.get(1, 0));
        assert!(bm.get(2, 1));
        assert!(!bm.get(0, 0));
    }

    #[test]
    fn uniform_image_binarizes_to_foreground() {
        // With a positive C, every pixel of a flat image clears mean - C.
        let img = GrayImage::from_pixel(8, 8, Luma([0]));
        let config = Config {
            blur_size: 1,
            ..Config::default()
        };
        let bm = binarize(&img, &config);
        for y in 0..8 {
            for x in 0..8 {
                assert!(bm.get(x, y));
            }
        }

        let inverted = binarize(
            &img,
            &Config {
                blur_size: 1,
                invert: true,
                ..Config::default()
            },
        );
        assert!(!inverted.get(4, 4));
    }

    #[test]
    fn dark_stroke_on_white_becomes_foreground_when_inverted() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([255]));
        for y in 0..9 {
            img.put_pixel(4, y, Luma([0]));
        }
        let config = Config {
            blur_size: 1,
            block_size: 9,
            invert: true,
            ..Config::default()
        };
        let bm = binarize(&img, &config);
        for y in 0..9 {
            assert!(bm.get(4, y), "stroke pixel (4, {y}) should be foreground");
            assert!(!bm.get(0, y));
            assert!(!bm.get(8, y));
        }
    }
}
