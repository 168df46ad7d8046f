//! Color reduction and error-diffusion dithering for images
//!
//! A reduction resamples the source first (nearest-neighbor), then quantizes
//! every opaque or partly opaque pixel. Fully transparent pixels pass
//! through untouched and never take part in error diffusion. Alpha is
//! never modified.

use crate::color::{BitDepth, Color, PixelFormat};
use crate::image::Image;
use crate::palette::Palette;

/// How each pixel's color is quantized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quantizer {
    /// Resample only
    #[default]
    TrueColor,
    /// Nearest color of the supplied palette
    Palette,
    /// 5-6-5
    Depth16,
    /// 4-4-4
    Depth12,
    /// 3-3-2, top bits replicated into the low bits
    Depth8,
    /// Black or white by luma
    Mono,
}

/// Error-diffusion kernel applied after quantizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ditherer {
    #[default]
    None,
    FloydSteinberg,
    SierraLite,
}

impl Ditherer {
    /// (dx, dy, weight) of each neighbor receiving a share of the error
    fn kernel(self) -> &'static [(i32, i32, f32)] {
        match self {
            Ditherer::None => &[],
            Ditherer::FloydSteinberg => &[
                (1, 0, 7.0 / 16.0),
                (-1, 1, 3.0 / 16.0),
                (0, 1, 5.0 / 16.0),
                (1, 1, 1.0 / 16.0),
            ],
            Ditherer::SierraLite => &[(1, 0, 0.5), (-1, 1, 0.25), (0, 1, 0.25)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReduceMode {
    pub quantizer: Quantizer,
    pub ditherer: Ditherer,
}

impl ReduceMode {
    pub const fn new(quantizer: Quantizer, ditherer: Ditherer) -> Self {
        Self {
            quantizer,
            ditherer,
        }
    }

    /// Parse the textual form `"<depth>[-<dither>]"`, e.g. `"8bit"`,
    /// `"palette-fs"` or `"mono-sierra"`.
    ///
    /// Unknown depths fall back to true color. Any dither suffix other than
    /// `fs` selects Sierra-lite.
    pub fn parse(mode: &str) -> Self {
        let mode = mode.trim().to_ascii_lowercase();
        let (depth, dither) = match mode.split_once('-') {
            Some((depth, dither)) => (depth, Some(dither)),
            None => (mode.as_str(), None),
        };

        let quantizer = match depth {
            "palette" => Quantizer::Palette,
            "16bit" => Quantizer::Depth16,
            "12bit" => Quantizer::Depth12,
            "8bit" => Quantizer::Depth8,
            "1bit" | "mono" => Quantizer::Mono,
            _ => Quantizer::TrueColor,
        };
        let ditherer = match dither {
            None => Ditherer::None,
            Some("fs") => Ditherer::FloydSteinberg,
            Some(_) => Ditherer::SierraLite,
        };

        Self::new(quantizer, ditherer)
    }
}

/// Keep the top `bits` of a channel and repeat them down to bit 0
fn replicate_bits(v: u8, bits: u32) -> u8 {
    let top = (v >> (8 - bits)) as u32;
    let bits = bits as i32;
    let mut out = 0u32;
    let mut shift = 8 - bits;
    while shift > -bits {
        out |= if shift >= 0 {
            top << shift
        } else {
            top >> -shift
        };
        shift -= bits;
    }
    out as u8
}

fn quantize(quantizer: Quantizer, c: Color, palette: Option<&Palette>, dithered: bool) -> Color {
    match quantizer {
        Quantizer::TrueColor => c,
        Quantizer::Palette => match palette {
            Some(p) => p.nearest_color(c.r, c.g, c.b),
            None => c,
        },
        Quantizer::Depth16 | Quantizer::Depth12 => {
            let depth = if quantizer == Quantizer::Depth16 {
                BitDepth::Bits16
            } else {
                BitDepth::Bits12
            };
            let (mr, mg, mb) = depth.channel_masks();
            Color::rgb(c.r & mr, c.g & mg, c.b & mb)
        },
        Quantizer::Depth8 => Color::rgb(
            replicate_bits(c.r, 3),
            replicate_bits(c.g, 3),
            replicate_bits(c.b, 2),
        ),
        Quantizer::Mono => c.threshold(if dithered { 150.0 } else { 128.0 }),
    }
}

/// Resample `img` to `width` x `height` and reduce its colors.
/// `palette` is only consulted by [`Quantizer::Palette`]; without one the
/// result is the resampled image.
pub fn reduce_image(
    img: &Image,
    width: u32,
    height: u32,
    palette: Option<&Palette>,
    mode: ReduceMode,
) -> Image {
    let mut out = img.scaled(width, height);

    let quantizer = match (mode.quantizer, palette) {
        (Quantizer::Palette, None) => Quantizer::TrueColor,
        (q, _) => q,
    };
    if quantizer == Quantizer::TrueColor {
        return out;
    }

    if mode.ditherer != Ditherer::None {
        dither(&mut out, quantizer, palette, mode.ditherer);
        return out;
    }

    match quantizer {
        Quantizer::Depth16 | Quantizer::Depth12 => {
            // Bytes are R, G, B, A in memory, so a native-endian read gives
            // the packed layout of the host byte order.
            let depth = if quantizer == Quantizer::Depth16 {
                BitDepth::Bits16
            } else {
                BitDepth::Bits12
            };
            let mask = PixelFormat::native().depth_mask(depth);
            for px in out.pixels_mut().chunks_exact_mut(4) {
                let p = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]) & mask;
                px.copy_from_slice(&p.to_ne_bytes());
            }
        },
        _ => {
            for px in out.pixels_mut().chunks_exact_mut(4) {
                if px[3] == 0 {
                    continue;
                }
                let c = quantize(quantizer, Color::rgb(px[0], px[1], px[2]), palette, false);
                px[..3].copy_from_slice(&c.to_array());
            }
        },
    }
    out
}

/// Error diffusion in raster order over a signed working grid
fn dither(img: &mut Image, quantizer: Quantizer, palette: Option<&Palette>, ditherer: Ditherer) {
    let w = img.width() as usize;
    let h = img.height() as usize;
    let mut grid: Vec<[f32; 3]> = img
        .pixels()
        .chunks_exact(4)
        .map(|px| [px[0] as f32, px[1] as f32, px[2] as f32])
        .collect();
    let opaque: Vec<bool> = img.pixels().chunks_exact(4).map(|px| px[3] != 0).collect();

    let colors = diffuse(&mut grid, &opaque, w, h, ditherer, |c| {
        quantize(quantizer, c, palette, true)
    });

    for ((px, c), &keep) in img
        .pixels_mut()
        .chunks_exact_mut(4)
        .zip(colors)
        .zip(&opaque)
    {
        if keep {
            px[..3].copy_from_slice(&c.to_array());
        }
    }
}

/// Quantize every cell of `grid`, pushing each cell's error to its
/// unvisited neighbors. The error is taken from the clamped cell value, so a
/// cell never receives more than one full channel step. Cells not marked in
/// `active` are skipped and receive no error. On return `grid` holds the
/// value each cell had when it was quantized.
fn diffuse<F>(
    grid: &mut [[f32; 3]],
    active: &[bool],
    w: usize,
    h: usize,
    ditherer: Ditherer,
    quantize: F,
) -> Vec<Color>
where
    F: Fn(Color) -> Color,
{
    let kernel = ditherer.kernel();
    let mut out = Vec::with_capacity(grid.len());

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if !active[i] {
                out.push(Color::BLACK);
                continue;
            }
            let [r, g, b] = grid[i];
            let oc = Color::from_f32(r, g, b);
            let nc = quantize(oc);
            let err = [
                oc.r as f32 - nc.r as f32,
                oc.g as f32 - nc.g as f32,
                oc.b as f32 - nc.b as f32,
            ];
            out.push(nc);

            for &(dx, dy, weight) in kernel {
                let nx = x as i32 + dx;
                let ny = y + dy as usize;
                if nx < 0 || nx >= w as i32 || ny >= h {
                    continue;
                }
                let j = ny * w + nx as usize;
                if !active[j] {
                    continue;
                }
                for (cell, e) in grid[j].iter_mut().zip(err) {
                    *cell += e * weight;
                }
            }
        }
    }
    out
}
