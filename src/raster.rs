//! PNG decode/encode into a plain RGBA buffer.

use std::io::Cursor;
use std::path::Path;

use image::{ImageError, ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to decode PNG: {0}")]
    Decode(#[source] ImageError),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] ImageError),
    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Image has zero width or height")]
    Empty,
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded image: row-major RGBA, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image filled with one colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RasterError> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::from_rgba(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn total_pixels(&self) -> u64 {
        self.viewport().pixel_count()
    }

    pub fn viewport(&self) -> crate::Viewport {
        crate::Viewport::new(self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

/// Decode a PNG byte stream. Colour types other than RGBA8 are converted.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, RasterError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(RasterError::Decode)?
        .into_rgba8();
    let (width, height) = img.dimensions();
    RasterImage::from_rgba(width, height, img.into_raw())
}

pub fn encode(image: &RasterImage) -> Result<Vec<u8>, RasterError> {
    let buffer = RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or(
        RasterError::BufferSize {
            width: image.width,
            height: image.height,
            expected: image.width as usize * image.height as usize * 4,
            actual: image.pixels.len(),
        },
    )?;
    let mut out = Cursor::new(Vec::new());
    buffer
        .write_to(&mut out, ImageFormat::Png)
        .map_err(RasterError::Encode)?;
    Ok(out.into_inner())
}

pub async fn read_png(path: &Path) -> Result<RasterImage, RasterError> {
    let bytes = tokio::fs::read(path).await?;
    decode(&bytes)
}

/// Write bytes to `path`, creating missing parent directories.
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), RasterError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

pub async fn write_png(path: &Path, image: &RasterImage) -> Result<(), RasterError> {
    let bytes = encode(image)?;
    write_bytes(path, &bytes).await
}
