//! Indexed color lookup tables
//!
//! A palette is an ordered list of colors plus a cache of their packed pixel
//! values, so index to pixel lookups in the drawing loops are a single load.

use serde::{Deserialize, Serialize};

use crate::color::{Color, PixelFormat};
use crate::error::{Result, RetroError};

/// Palette as written in a config file: a preset name or a list of RGB triples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteSpec {
    Named(String),
    Rgb(Vec<Vec<i32>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    lut: Vec<Color>,
    cache: Vec<u32>,
    format: PixelFormat,
}

impl Palette {
    /// Built-in preset by name (case-insensitive)
    pub fn named(name: &str) -> Result<Self> {
        let upper = name.to_uppercase();
        let table = preset(&upper)
            .ok_or_else(|| RetroError::InvalidPalette(format!("unknown palette name {}", upper)))?;
        let lut = table.iter().map(|&(r, g, b)| Color::rgb(r, g, b)).collect();
        Ok(Self::build(upper, lut, PixelFormat::native()))
    }

    /// Palette from `[r, g, b]` triples; channel values are clamped
    pub fn from_rgb(entries: &[Vec<i32>]) -> Result<Self> {
        if entries.is_empty() {
            return Err(RetroError::InvalidPalette("palette array is empty".into()));
        }
        let mut lut = Vec::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            match e.as_slice() {
                &[r, g, b] => lut.push(Color::clamped(r, g, b)),
                _ => {
                    return Err(RetroError::InvalidPalette(format!(
                        "expected 3 entries (RGB) at index {}, got {}",
                        i,
                        e.len()
                    )))
                },
            }
        }
        Ok(Self::build("custom".into(), lut, PixelFormat::native()))
    }

    pub fn from_colors(colors: Vec<Color>) -> Result<Self> {
        if colors.is_empty() {
            return Err(RetroError::InvalidPalette("palette array is empty".into()));
        }
        Ok(Self::build("custom".into(), colors, PixelFormat::native()))
    }

    pub fn from_spec(spec: &PaletteSpec) -> Result<Self> {
        match spec {
            PaletteSpec::Named(name) => Self::named(name),
            PaletteSpec::Rgb(entries) => Self::from_rgb(entries),
        }
    }

    fn build(name: String, lut: Vec<Color>, format: PixelFormat) -> Self {
        let cache = lut.iter().map(|c| c.to_packed(format)).collect();
        Self {
            name,
            lut,
            cache,
            format,
        }
    }

    /// Same colors with the packed cache rebuilt for another byte order
    pub fn with_format(&self, format: PixelFormat) -> Self {
        Self::build(self.name.clone(), self.lut.clone(), format)
    }

    /// Preset name in upper case, or `custom`
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lut.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    #[inline]
    pub fn colors(&self) -> &[Color] {
        &self.lut
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    fn clamp_index(&self, index: i32) -> usize {
        index.clamp(0, self.lut.len() as i32 - 1).max(0) as usize
    }

    /// Color at `index`, clamped into range
    pub fn color_at(&self, index: i32) -> Color {
        self.lut[self.clamp_index(index)]
    }

    /// Cached packed pixel at `index`, clamped into range
    #[inline]
    pub fn packed(&self, index: i32) -> u32 {
        self.cache[self.clamp_index(index)]
    }

    /// Index of the closest color by squared RGB distance. Ties go to the lowest index.
    pub fn nearest_index(&self, r: u8, g: u8, b: u8) -> usize {
        let target = Color::rgb(r, g, b);
        let mut best = 0;
        let mut min = u32::MAX;
        for (i, c) in self.lut.iter().enumerate() {
            let d = c.diff_squared(target);
            if d < min {
                min = d;
                best = i;
            }
        }
        best
    }

    pub fn nearest_color(&self, r: u8, g: u8, b: u8) -> Color {
        self.lut[self.nearest_index(r, g, b)]
    }

    /// First index inside a per-channel tolerance box. `tolerance` is a
    /// percentage in [0, 100]; zero means an exact match.
    pub fn exact_index(&self, r: u8, g: u8, b: u8, tolerance: f32) -> Option<usize> {
        let tol = (tolerance.max(0.0) * 2.55 + 0.5) as i32;
        let within = |v: u8, c: u8| {
            let min = (v as i32 - tol).clamp(0, 255);
            let max = (v as i32 + tol).clamp(0, 255);
            (min..=max).contains(&(c as i32))
        };
        self.lut
            .iter()
            .position(|c| within(r, c.r) && within(g, c.g) && within(b, c.b))
    }
}

// ============================================================================
// Presets
// ============================================================================

type Rgb = (u8, u8, u8);

const BW: &[Rgb] = &[(0, 0, 0), (255, 255, 255)];

const GREEN: &[Rgb] = &[(0, 0, 0), (51, 255, 51)];

const GAMEBOY: &[Rgb] = &[(15, 56, 15), (48, 98, 48), (139, 172, 15), (155, 188, 15)];

const BBC: &[Rgb] = &[
    (0, 0, 0),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

const TELETEXT: &[Rgb] = &[
    (0, 0, 0),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

const CGA: &[Rgb] = &[
    (0x00, 0x00, 0x00),
    (0x00, 0x00, 0xaa),
    (0x00, 0xaa, 0x00),
    (0x00, 0xaa, 0xaa),
    (0xaa, 0x00, 0x00),
    (0xaa, 0x00, 0xaa),
    (0xaa, 0x55, 0x00),
    (0xaa, 0xaa, 0xaa),
    (0x55, 0x55, 0x55),
    (0x55, 0x55, 0xff),
    (0x55, 0xff, 0x55),
    (0x55, 0xff, 0xff),
    (0xff, 0x55, 0x55),
    (0xff, 0x55, 0xff),
    (0xff, 0xff, 0x55),
    (0xff, 0xff, 0xff),
];

const C64: &[Rgb] = &[
    (0x00, 0x00, 0x00),
    (0xff, 0xff, 0xff),
    (0x68, 0x37, 0x2b),
    (0x70, 0xa4, 0xb2),
    (0x6f, 0x3d, 0x86),
    (0x58, 0x8d, 0x43),
    (0x35, 0x28, 0x79),
    (0xb8, 0xc7, 0x6f),
    (0x6f, 0x4f, 0x25),
    (0x43, 0x39, 0x00),
    (0x9a, 0x67, 0x59),
    (0x44, 0x44, 0x44),
    (0x6c, 0x6c, 0x6c),
    (0x9a, 0xd2, 0x84),
    (0x6c, 0x5e, 0xb5),
    (0x95, 0x95, 0x95),
];

const ZXSPECTRUM: &[Rgb] = &[
    (0x00, 0x00, 0x00),
    (0x00, 0x00, 0xd7),
    (0xd7, 0x00, 0x00),
    (0xd7, 0x00, 0xd7),
    (0x00, 0xd7, 0x00),
    (0x00, 0xd7, 0xd7),
    (0xd7, 0xd7, 0x00),
    (0xd7, 0xd7, 0xd7),
    (0x00, 0x00, 0x00),
    (0x00, 0x00, 0xff),
    (0xff, 0x00, 0x00),
    (0xff, 0x00, 0xff),
    (0x00, 0xff, 0x00),
    (0x00, 0xff, 0xff),
    (0xff, 0xff, 0x00),
    (0xff, 0xff, 0xff),
];

const APPLEII: &[Rgb] = &[
    (0x00, 0x00, 0x00),
    (0x6c, 0x29, 0x40),
    (0x40, 0x35, 0x78),
    (0xd9, 0x3c, 0xf0),
    (0x13, 0x57, 0x40),
    (0x80, 0x80, 0x80),
    (0x26, 0x97, 0xf0),
    (0xbf, 0xb4, 0xf8),
    (0x40, 0x4b, 0x07),
    (0xd9, 0x68, 0x0f),
    (0x80, 0x80, 0x80),
    (0xec, 0xa8, 0xbf),
    (0x26, 0xc3, 0x0f),
    (0xbf, 0xca, 0x87),
    (0x93, 0xd6, 0xbf),
    (0xff, 0xff, 0xff),
];

const AMIGA: &[Rgb] = &[
    (0x00, 0x55, 0xaa),
    (0xff, 0xff, 0xff),
    (0x00, 0x00, 0x22),
    (0xff, 0x88, 0x00),
    (0x00, 0x00, 0x00),
    (0xaa, 0xaa, 0xaa),
    (0x55, 0x55, 0x55),
    (0xff, 0x00, 0x00),
    (0x00, 0xaa, 0x00),
    (0x00, 0x00, 0xff),
    (0xff, 0xff, 0x00),
    (0x00, 0xff, 0xff),
    (0xff, 0x00, 0xff),
    (0x88, 0x44, 0x00),
    (0xff, 0xaa, 0xaa),
    (0xaa, 0xff, 0xaa),
];

const VIC20: &[Rgb] = &[
    (0x00, 0x00, 0x00),
    (0xff, 0xff, 0xff),
    (0x78, 0x29, 0x22),
    (0x87, 0xd6, 0xdd),
    (0xaa, 0x5f, 0xb6),
    (0x55, 0xa0, 0x49),
    (0x40, 0x31, 0x8d),
    (0xbf, 0xce, 0x72),
    (0xaa, 0x74, 0x49),
    (0xea, 0xb4, 0x89),
    (0xb8, 0x69, 0x62),
    (0xc7, 0xff, 0xff),
    (0xea, 0x9f, 0xf6),
    (0x94, 0xe0, 0x89),
    (0x80, 0x71, 0xcc),
    (0xff, 0xff, 0xb2),
];

fn preset(name: &str) -> Option<&'static [Rgb]> {
    let table = match name {
        "BW" => BW,
        "GREEN" => GREEN,
        "GAMEBOY" => GAMEBOY,
        "BBC" => BBC,
        "TELETEXT" => TELETEXT,
        "CGA" => CGA,
        "C64" => C64,
        "ZXSPECTRUM" => ZXSPECTRUM,
        "APPLEII" => APPLEII,
        "AMIGA" => AMIGA,
        "VIC20" => VIC20,
        _ => return None,
    };
    Some(table)
}

/// Names of the built-in presets
pub const PRESETS: &[&str] = &[
    "BW", "GREEN", "GAMEBOY", "BBC", "TELETEXT", "CGA", "C64", "ZXSPECTRUM", "APPLEII", "AMIGA",
    "VIC20",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_is_case_insensitive() {
        let p = Palette::named("gameboy").unwrap();
        assert_eq!(p.name(), "GAMEBOY");
        assert_eq!(p.len(), 4);
        assert!(Palette::named("nope").is_err());
    }

    #[test]
    fn test_every_preset_builds() {
        for name in PRESETS {
            let p = Palette::named(name).unwrap();
            assert!(!p.is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let err = Palette::from_rgb(&[vec![0, 0, 0], vec![1, 2]]).unwrap_err();
        assert!(matches!(err, RetroError::InvalidPalette(_)));
        assert!(Palette::from_rgb(&[]).is_err());
    }

    #[test]
    fn test_cache_matches_lut() {
        for format in [PixelFormat::Lsb, PixelFormat::Msb] {
            let p = Palette::named("c64").unwrap().with_format(format);
            for i in 0..p.len() as i32 {
                assert_eq!(p.packed(i), p.color_at(i).to_packed(format));
            }
        }
    }

    #[test]
    fn test_from_colors() {
        let p = Palette::from_colors(vec![Color::BLACK, Color::rgb(255, 0, 0)]).unwrap();
        assert_eq!(p.name(), "custom");
        assert_eq!(p.nearest_color(200, 10, 10), Color::rgb(255, 0, 0));
        assert!(Palette::from_colors(Vec::new()).is_err());
    }

    #[test]
    fn test_color_at_clamps() {
        let p = Palette::from_rgb(&[vec![1, 1, 1], vec![2, 2, 2]]).unwrap();
        assert_eq!(p.color_at(-5), Color::rgb(1, 1, 1));
        assert_eq!(p.color_at(99), Color::rgb(2, 2, 2));
    }

    #[test]
    fn test_nearest_ties_resolve_to_lowest_index() {
        let p = Palette::from_rgb(&[vec![0, 0, 0], vec![10, 0, 0], vec![0, 0, 0]]).unwrap();
        assert_eq!(p.nearest_index(5, 0, 0), 0);
        assert_eq!(p.nearest_index(9, 0, 0), 1);
        assert_eq!(p.nearest_index(0, 0, 0), 0);
        assert_eq!(p.nearest_color(200, 0, 0), Color::rgb(10, 0, 0));
    }

    #[test]
    fn test_exact_index_with_tolerance() {
        let p = Palette::named("cga").unwrap();
        assert_eq!(p.exact_index(0xaa, 0x55, 0x00, 0.0), Some(6));
        assert_eq!(p.exact_index(0xa0, 0x50, 0x00, 0.0), None);
        assert_eq!(p.exact_index(0xa0, 0x50, 0x00, 5.0), Some(6));
    }

    #[test]
    fn test_palette_spec_deserializes_both_forms() {
        let named: PaletteSpec = serde_json::from_str("\"bbc\"").unwrap();
        assert_eq!(named, PaletteSpec::Named("bbc".into()));
        let rgb: PaletteSpec = serde_json::from_str("[[0,0,0],[255,255,255]]").unwrap();
        let p = Palette::from_spec(&rgb).unwrap();
        assert_eq!(p.name(), "custom");
        assert_eq!(p.len(), 2);
    }
}
