//! Binary image input for contour extraction
//!
//! The core only ever sees a grid of foreground values with explicit
//! dimensions. Loading and grey-level conversion of image files lives here at
//! the boundary; the foreground threshold itself is applied by the contour
//! extractor.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageReader, LumaA};

use crate::error::{IldaError, Result};

/// Row-major grid of foreground values (0 = background, 255 = solid ink).
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

impl BinaryImage {
    pub fn new(width: u32, height: u32, values: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(IldaError::InvalidImage(format!(
                "image has zero pixels ({}x{})",
                width, height
            )));
        }

        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(IldaError::InvalidImage(format!(
                "expected {} values for {}x{}, got {}",
                expected,
                width,
                height,
                values.len()
            )));
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Build an image from a boolean predicate (true = foreground).
    pub fn from_fn<F>(width: u32, height: u32, foreground: F) -> Result<Self>
    where
        F: Fn(u32, u32) -> bool,
    {
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                values.push(if foreground(x, y) { 255 } else { 0 });
            }
        }
        Self::new(width, height, values)
    }

    /// Convert a decoded image into foreground values.
    ///
    /// Dark pixels are foreground (ink on paper) unless `invert` is set, in
    /// which case bright pixels are. Mostly transparent pixels are background.
    pub fn from_image(img: &DynamicImage, invert: bool) -> Result<Self> {
        let luma = img.to_luma_alpha8();
        let (width, height) = luma.dimensions();

        let values = luma
            .pixels()
            .map(|&LumaA([l, a])| {
                if a < 128 {
                    0
                } else if invert {
                    l
                } else {
                    255 - l
                }
            })
            .collect();

        Self::new(width, height, values)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    pub fn is_foreground(&self, x: u32, y: u32, threshold: u8) -> bool {
        self.value(x, y) >= threshold
    }

    pub fn diagonal(&self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}

/// Decode an image file (PNG, JPEG) into a [`BinaryImage`].
pub fn load_binary_image<P: AsRef<Path>>(path: P, invert: bool) -> Result<BinaryImage> {
    let img = ImageReader::open(path)?.decode()?;
    BinaryImage::from_image(&img, invert)
}

/// Decode in-memory image bytes into a [`BinaryImage`].
pub fn decode_binary_image(bytes: &[u8], invert: bool) -> Result<BinaryImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    BinaryImage::from_image(&img, invert)
}
