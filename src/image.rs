//! RGBA images used as sources for drawing, fonts and color reduction
//!
//! Pixels are stored as bytes in memory order R, G, B, A, which is also the
//! memory order of a packed surface pixel on either byte order.

use std::path::Path;

use sdl2::pixels::PixelFormatEnum;

use crate::color::{Color, PixelFormat};
use crate::error::{Result, RetroError};

/// An RGBA image, 4 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Fully transparent image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Opaque image of a single color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut img = Self::new(width, height);
        for px in img.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
        img
    }

    /// Create image from raw RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() == (width * height * 4) as usize {
            Some(Self {
                width,
                height,
                pixels: data,
            })
        } else {
            None
        }
    }

    /// Build from packed surface pixels
    pub fn from_packed(width: u32, height: u32, data: &[u32], format: PixelFormat) -> Self {
        let mut pixels = Vec::with_capacity(data.len() * 4);
        for &p in data {
            let (r, g, b) = format.unpack(p);
            pixels.extend_from_slice(&[r, g, b, format.alpha(p)]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode a BMP file through SDL2's surface loader
    pub fn from_bmp<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let err = |reason: String| RetroError::ImageLoad {
            source: path.to_path_buf(),
            reason,
        };

        let surface = sdl2::surface::Surface::load_bmp(path).map_err(err)?;
        let surface = surface
            .convert_format(PixelFormatEnum::RGBA32)
            .map_err(err)?;

        let (width, height) = surface.size();
        let pitch = surface.pitch() as usize;
        let row_bytes = (width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);

        surface.with_lock(|data| {
            for row in data.chunks(pitch).take(height as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }
        });

        Self::from_rgba(width, height, pixels)
            .ok_or_else(|| err("truncated pixel data".to_string()))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// RGBA at (x, y), or `None` outside the image
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8, u8)> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = self.pixel_index(x as u32, y as u32);
        Some((
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ))
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) {
        if x < self.width && y < self.height {
            let idx = self.pixel_index(x, y);
            self.pixels[idx..idx + 4].copy_from_slice(&[r, g, b, a]);
        }
    }

    /// Packed surface pixel at (x, y); zero (transparent) outside the image
    #[inline]
    pub fn packed(&self, x: i32, y: i32, format: PixelFormat) -> u32 {
        match self.pixel(x, y) {
            Some((r, g, b, a)) => format.pack_rgba(r, g, b, a),
            None => 0,
        }
    }

    /// Nearest-neighbor resample to a new size
    pub fn scaled(&self, width: u32, height: u32) -> Image {
        let mut out = Image::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                let src = self.pixel_index(sx, sy);
                let dst = out.pixel_index(x, y);
                out.pixels[dst..dst + 4].copy_from_slice(&self.pixels[src..src + 4]);
            }
        }
        out
    }

    /// Copy of a sub-rectangle; parts outside the image are transparent
    pub fn sub_image(&self, x: i32, y: i32, width: u32, height: u32) -> Image {
        let mut out = Image::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                if let Some((r, g, b, a)) = self.pixel(x + dx as i32, y + dy as i32) {
                    out.set_pixel(dx, dy, r, g, b, a);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_pixel_bounds() {
        let mut img = Image::new(3, 2);
        img.set_pixel(2, 1, 1, 2, 3, 4);
        assert_eq!(img.pixel(2, 1), Some((1, 2, 3, 4)));
        assert_eq!(img.pixel(3, 1), None);
        assert_eq!(img.pixel(-1, 0), None);
        assert_eq!(img.packed(9, 9, PixelFormat::Lsb), 0);
    }

    #[test]
    fn test_scaled_nearest_neighbor() {
        let mut img = Image::new(2, 1);
        img.set_pixel(0, 0, 255, 0, 0, 255);
        img.set_pixel(1, 0, 0, 255, 0, 255);
        let big = img.scaled(4, 2);
        assert_eq!(big.pixel(1, 1), Some((255, 0, 0, 255)));
        assert_eq!(big.pixel(2, 0), Some((0, 255, 0, 255)));
    }

    #[test]
    fn test_sub_image_pads_with_transparent() {
        let img = Image::filled(2, 2, Color::WHITE);
        let sub = img.sub_image(1, 1, 2, 2);
        assert_eq!(sub.pixel(0, 0), Some((255, 255, 255, 255)));
        assert_eq!(sub.pixel(1, 1), Some((0, 0, 0, 0)));
    }

    #[test]
    fn test_packed_round_trip() {
        let data = [PixelFormat::Lsb.pack(9, 8, 7), 0];
        let img = Image::from_packed(2, 1, &data, PixelFormat::Lsb);
        assert_eq!(img.pixel(0, 0), Some((9, 8, 7, 255)));
        assert_eq!(img.packed(1, 0, PixelFormat::Lsb), 0);
    }
}
