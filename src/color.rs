//! Color values and packed pixel formats
//!
//! `Color` is a plain RGB triple. Pixels in a surface are stored packed into
//! a `u32` whose byte layout follows the platform byte order, so the same
//! buffer can be handed to the presentation layer without swizzling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Not, Shl, Shr, Sub};

// ============================================================================
// Pixel Format
// ============================================================================

/// Byte layout of a packed 32-bit pixel.
///
/// - `Lsb` (little endian): `0xAABBGGRR`, memory order R, G, B, A
/// - `Msb` (big endian): `0xRRGGBBAA`, memory order R, G, B, A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Lsb,
    Msb,
}

impl PixelFormat {
    /// Layout matching the byte order of the running platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            PixelFormat::Lsb
        } else {
            PixelFormat::Msb
        }
    }

    /// Pack RGB into a pixel with an opaque alpha channel
    #[inline]
    pub const fn pack(self, r: u8, g: u8, b: u8) -> u32 {
        match self {
            PixelFormat::Lsb => 0xff00_0000 | (b as u32) << 16 | (g as u32) << 8 | r as u32,
            PixelFormat::Msb => (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | 0xff,
        }
    }

    /// Extract RGB from a packed pixel (alpha is discarded)
    #[inline]
    pub const fn unpack(self, pixel: u32) -> (u8, u8, u8) {
        match self {
            PixelFormat::Lsb => (pixel as u8, (pixel >> 8) as u8, (pixel >> 16) as u8),
            PixelFormat::Msb => ((pixel >> 24) as u8, (pixel >> 16) as u8, (pixel >> 8) as u8),
        }
    }

    /// Alpha channel of a packed pixel
    #[inline]
    pub const fn alpha(self, pixel: u32) -> u8 {
        match self {
            PixelFormat::Lsb => (pixel >> 24) as u8,
            PixelFormat::Msb => pixel as u8,
        }
    }

    /// Bits occupied by the alpha channel
    #[inline]
    pub const fn alpha_mask(self) -> u32 {
        match self {
            PixelFormat::Lsb => 0xff00_0000,
            PixelFormat::Msb => 0x0000_00ff,
        }
    }

    /// Bits occupied by the color channels; XOR drawing is limited to these
    #[inline]
    pub const fn xor_mask(self) -> u32 {
        !self.alpha_mask()
    }

    /// Pack RGBA where the alpha channel is explicit
    #[inline]
    pub const fn pack_rgba(self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        (self.pack(r, g, b) & self.xor_mask())
            | match self {
                PixelFormat::Lsb => (a as u32) << 24,
                PixelFormat::Msb => a as u32,
            }
    }

    /// Mask keeping the significant bits of each channel at a reduced depth.
    /// Alpha bits are kept so masked pixels stay opaque.
    #[inline]
    pub const fn depth_mask(self, depth: BitDepth) -> u32 {
        let (r, g, b) = depth.channel_masks();
        self.pack(r, g, b)
    }
}

/// Reduced color depths a packed pixel can be masked down to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 5-6-5
    Bits16,
    /// 4-4-4
    Bits12,
    /// 3-3-2
    Bits8,
}

impl BitDepth {
    pub const fn channel_masks(self) -> (u8, u8, u8) {
        match self {
            BitDepth::Bits16 => (0xf8, 0xfc, 0xf8),
            BitDepth::Bits12 => (0xf0, 0xf0, 0xf0),
            BitDepth::Bits8 => (0xe0, 0xe0, 0xc0),
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::native()
    }
}

// ============================================================================
// Color
// ============================================================================

/// An RGB color with each channel clamped to [0, 255].
///
/// Arithmetic returns new colors; the only in-place mutators are
/// [`Color::set_rgb`] and [`Color::set_packed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Exact constructor
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Construct from integers, clamping each channel
    #[inline]
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    /// Construct from floats, rounding half up and clamping each channel
    #[inline]
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        let round = |v: f32| -> i32 { (v + 0.5) as i32 };
        Self::clamped(round(r), round(g), round(b))
    }

    /// Decode a packed pixel
    #[inline]
    pub const fn from_packed(format: PixelFormat, pixel: u32) -> Self {
        let (r, g, b) = format.unpack(pixel);
        Self { r, g, b }
    }

    /// Packed representation with opaque alpha
    #[inline]
    pub const fn to_packed(self, format: PixelFormat) -> u32 {
        format.pack(self.r, self.g, self.b)
    }

    pub fn set_rgb(&mut self, r: u8, g: u8, b: u8) -> &mut Self {
        self.r = r;
        self.g = g;
        self.b = b;
        self
    }

    pub fn set_packed(&mut self, format: PixelFormat, pixel: u32) -> &mut Self {
        let (r, g, b) = format.unpack(pixel);
        self.set_rgb(r, g, b)
    }

    /// Squared Euclidean distance in RGB space
    #[inline]
    pub fn diff_squared(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Euclidean distance in RGB space
    #[inline]
    pub fn diff(self, other: Color) -> f32 {
        (self.diff_squared(other) as f32).sqrt()
    }

    /// Perceived brightness (ITU-R BT.601 weights)
    #[inline]
    pub fn luma(self) -> f32 {
        self.r as f32 * 0.299 + self.g as f32 * 0.587 + self.b as f32 * 0.114
    }

    /// Pure white if luma >= `t`, pure black otherwise
    pub fn threshold(self, t: f32) -> Color {
        if self.luma() >= t {
            Color::WHITE
        } else {
            Color::BLACK
        }
    }

    pub fn invert(self) -> Color {
        Color::rgb(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Colors at `-tol` and `+tol` (fraction of 255) around this one, clamped
    pub fn tolerance_range(self, tol: f32) -> (Color, Color) {
        let delta = (255.0 * tol.clamp(0.0, 1.0) + 0.5) as i32;
        let min = Color::clamped(
            self.r as i32 - delta,
            self.g as i32 - delta,
            self.b as i32 - delta,
        );
        let max = Color::clamped(
            self.r as i32 + delta,
            self.g as i32 + delta,
            self.b as i32 + delta,
        );
        (min, max)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// CSS-style string, e.g. `rgb(255,0,0)`
    pub fn to_style(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::rgb(r, g, b)
    }
}

impl From<Color> for (u8, u8, u8) {
    fn from(c: Color) -> Self {
        (c.r, c.g, c.b)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::clamped(
            self.r as i32 + rhs.r as i32,
            self.g as i32 + rhs.g as i32,
            self.b as i32 + rhs.b as i32,
        )
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        Color::clamped(
            self.r as i32 - rhs.r as i32,
            self.g as i32 - rhs.g as i32,
            self.b as i32 - rhs.b as i32,
        )
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, f: f32) -> Color {
        Color::from_f32(self.r as f32 * f, self.g as f32 * f, self.b as f32 * f)
    }
}

impl Shl<u32> for Color {
    type Output = Color;

    fn shl(self, bits: u32) -> Color {
        let shift = |c: u8| -> i32 { ((c as u32) << bits.min(8)).min(255) as i32 };
        Color::clamped(shift(self.r), shift(self.g), shift(self.b))
    }
}

impl Shr<u32> for Color {
    type Output = Color;

    fn shr(self, bits: u32) -> Color {
        let shift = |c: u8| -> u8 { c.checked_shr(bits).unwrap_or(0) };
        Color::rgb(shift(self.r), shift(self.g), shift(self.b))
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        self.invert()
    }
}
