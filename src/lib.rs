//! Retro bitmap graphics context
//!
//! A software-rendered drawing surface that emulates early-computer raster
//! graphics: palette-indexed colors, pixel-exact primitives, scanline flood
//! fill, bitmap fonts, color reduction with error-diffusion dithering, and
//! buffer scroll/blit. The logical buffer is scaled nearest-neighbor to an
//! on-screen destination buffer, which `display::Display` presents via SDL2.

pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod image;
pub mod palette;
pub mod point;
pub mod sprite;
pub mod util;

pub use color::{BitDepth, Color, PixelFormat};
pub use config::Config;
pub use display::{
    reduce_image, Ditherer, FontSpec, FontSource, Quantizer, ReduceMode, Surface, TextAlign,
    TextBaseline,
};
pub use error::{Result, RetroError};
pub use image::Image;
pub use palette::{Palette, PaletteSpec};
pub use point::{flatten, Point};
pub use sprite::{Renderable, ScrollingSprite, Sprite};
