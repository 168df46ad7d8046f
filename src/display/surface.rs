//! The retro drawing surface
//!
//! A `Surface` owns three packed-pixel buffers:
//!
//! - the logical buffer at the emulated resolution, written by every primitive
//! - a native scratch buffer of the same size, used for polygon fills, image
//!   scaling and text before the non-transparent pixels are merged back
//! - the destination buffer at on-screen size, refreshed by `commit` with
//!   nearest-neighbor scaling
//!
//! Drawing state (pen, fill, background, palette, translation, modes) lives on
//! the surface and is read by every primitive until a setter changes it.

use std::collections::HashMap;

use log::{debug, trace};

use super::font::{Font, TextAlign, TextBaseline};
use super::loader::FontLoader;
use super::pixel_buffer::PixelBuffer;
use super::reduce::{reduce_image, ReduceMode};
use crate::color::{Color, PixelFormat};
use crate::error::{Result, RetroError};
use crate::image::Image;
use crate::palette::Palette;

pub struct Surface {
    pub(super) format: PixelFormat,
    pub(super) buffer: PixelBuffer,
    pub(super) native: PixelBuffer,
    pub(super) dest: PixelBuffer,

    pub(super) auto_commit: bool,
    pub(super) safe_mode: bool,
    pub(super) xor_mode: bool,

    pub(super) pen: Option<u32>,
    pub(super) fill: Option<u32>,
    pub(super) background: Option<u32>,
    pen_index: i32,
    fill_index: i32,
    background_index: i32,
    palette: Option<Palette>,

    pub(super) translate_x: i32,
    pub(super) translate_y: i32,

    pub(super) fonts: HashMap<String, Font>,
    pub(super) current_font: Option<String>,
    pub(super) text_align: TextAlign,
    pub(super) text_baseline: TextBaseline,
    pub(super) loader: FontLoader,
}

/// Round a requested width down to a multiple of 8 and validate it
fn checked_resolution(width: u32, height: u32) -> Result<(u32, u32)> {
    let w = (width / 8) * 8;
    if w < 8 || height < 1 {
        return Err(RetroError::InvalidResolution { width, height });
    }
    Ok((w, height))
}

impl Surface {
    /// Create a surface at logical resolution `width` x `height`, presented
    /// at `dest_width` x `dest_height`.
    pub fn new(width: u32, height: u32, dest_width: u32, dest_height: u32) -> Result<Self> {
        Self::with_format(width, height, dest_width, dest_height, PixelFormat::native())
    }

    /// Like `new`, with an explicit pixel byte order
    pub fn with_format(
        width: u32,
        height: u32,
        dest_width: u32,
        dest_height: u32,
        format: PixelFormat,
    ) -> Result<Self> {
        let (w, h) = checked_resolution(width, height)?;
        if dest_width == 0 || dest_height == 0 {
            return Err(RetroError::InvalidResolution {
                width: dest_width,
                height: dest_height,
            });
        }

        let mut fonts = HashMap::new();
        let builtin = Font::builtin();
        fonts.insert(builtin.id().to_string(), builtin);

        debug!(
            "surface {}x{} -> {}x{} ({:?})",
            w, h, dest_width, dest_height, format
        );

        Ok(Self {
            format,
            buffer: PixelBuffer::with_size(w, h),
            native: PixelBuffer::with_size(w, h),
            dest: PixelBuffer::with_size(dest_width, dest_height),
            auto_commit: true,
            safe_mode: true,
            xor_mode: false,
            pen: Some(Color::WHITE.to_packed(format)),
            fill: Some(Color::BLACK.to_packed(format)),
            background: None,
            pen_index: -1,
            fill_index: -1,
            background_index: -1,
            palette: None,
            translate_x: 0,
            translate_y: 0,
            fonts,
            current_font: None,
            text_align: TextAlign::Left,
            text_baseline: TextBaseline::Top,
            loader: FontLoader::new(),
        })
    }

    // ========================================================================
    // Setup and behavior
    // ========================================================================

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Logical resolution
    #[inline]
    pub fn resolution(&self) -> (u32, u32) {
        (self.buffer.width(), self.buffer.height())
    }

    /// Change the logical resolution. Width is rounded down to a multiple
    /// of 8. Content is cleared.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (w, h) = checked_resolution(width, height)?;
        self.buffer.resize(w, h);
        self.native.resize(w, h);
        debug!("resolution {}x{}", w, h);
        self.commit(false);
        Ok(())
    }

    /// The on-screen buffer
    #[inline]
    pub fn destination(&self) -> &PixelBuffer {
        &self.dest
    }

    /// Resize the on-screen buffer and redraw it
    pub fn set_destination_size(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(RetroError::InvalidResolution { width, height });
        }
        self.dest.resize(width, height);
        self.commit(false);
        Ok(())
    }

    /// Copy the logical buffer to the destination, scaled nearest-neighbor.
    /// With `merge_native`, pending native scratch pixels are merged first.
    pub fn commit(&mut self, merge_native: bool) {
        if merge_native {
            self.merge_native();
        }
        self.dest.blit_scaled(&self.buffer);
        trace!("commit (merge_native={})", merge_native);
    }

    #[inline]
    pub(super) fn maybe_commit(&mut self) {
        if self.auto_commit {
            self.commit(false);
        }
    }

    /// Merge the non-transparent native scratch pixels and reset the scratch
    pub(super) fn merge_native(&mut self) {
        self.buffer.merge_from(&self.native);
        self.native.clear();
    }

    pub fn set_auto_commit(&mut self, mode: bool) -> &mut Self {
        self.auto_commit = mode;
        self
    }

    #[inline]
    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Bounds-checked (`true`) or wrapping (`false`) pen writes
    pub fn set_safe_mode(&mut self, mode: bool) -> &mut Self {
        self.safe_mode = mode;
        self
    }

    #[inline]
    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// XOR the pen color into existing pixels instead of overwriting them
    pub fn set_xor_mode(&mut self, mode: bool) -> &mut Self {
        self.xor_mode = mode;
        self
    }

    #[inline]
    pub fn xor_mode(&self) -> bool {
        self.xor_mode
    }

    /// Add to the offset applied to subsequent pixel-writing primitives
    pub fn translate(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.translate_x = self.translate_x.saturating_add(dx);
        self.translate_y = self.translate_y.saturating_add(dy);
        self
    }

    #[inline]
    pub fn translation(&self) -> (i32, i32) {
        (self.translate_x, self.translate_y)
    }

    /// Map a destination-space position (e.g. a mouse event) to logical pixels
    pub fn map_to_logical(&self, x: i32, y: i32) -> (i32, i32) {
        let (w, h) = self.resolution();
        let lx = (x as i64 * w as i64 / self.dest.width() as i64) as i32;
        let ly = (y as i64 * h as i64 / self.dest.height() as i64) as i32;
        (lx, ly)
    }

    // ========================================================================
    // Colors
    // ========================================================================

    fn unpack(&self, pixel: Option<u32>) -> Option<Color> {
        pixel.map(|p| Color::from_packed(self.format, p))
    }

    pub fn set_palette(&mut self, palette: Option<Palette>) -> &mut Self {
        if let Some(p) = &palette {
            debug!("palette {} ({} colors)", p.name(), p.len());
        }
        self.palette = palette.map(|p| p.with_format(self.format));
        self
    }

    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Resolve a palette index. `None` without a palette, `Some(None)` for an
    /// index that disables the color.
    fn lookup(&self, index: i32) -> Option<Option<(u32, i32)>> {
        let palette = self.palette.as_ref()?;
        if index < 0 || index as usize >= palette.len() {
            return Some(None);
        }
        Some(Some((palette.packed(index), index)))
    }

    pub fn set_pen_color(&mut self, color: Option<Color>) -> &mut Self {
        self.pen = color.map(|c| c.to_packed(self.format));
        self.pen_index = -1;
        self
    }

    pub fn pen_color(&self) -> Option<Color> {
        self.unpack(self.pen)
    }

    /// Select the pen from the palette; a negative or out-of-range index
    /// clears it. Ignored when no palette is set.
    pub fn set_pen_index(&mut self, index: i32) -> &mut Self {
        if let Some(entry) = self.lookup(index) {
            self.pen = entry.map(|(p, _)| p);
            self.pen_index = entry.map_or(-1, |(_, i)| i);
        }
        self
    }

    #[inline]
    pub fn pen_index(&self) -> i32 {
        self.pen_index
    }

    pub fn set_fill_color(&mut self, color: Option<Color>) -> &mut Self {
        self.fill = color.map(|c| c.to_packed(self.format));
        self.fill_index = -1;
        self
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.unpack(self.fill)
    }

    pub fn set_fill_index(&mut self, index: i32) -> &mut Self {
        if let Some(entry) = self.lookup(index) {
            self.fill = entry.map(|(p, _)| p);
            self.fill_index = entry.map_or(-1, |(_, i)| i);
        }
        self
    }

    #[inline]
    pub fn fill_index(&self) -> i32 {
        self.fill_index
    }

    pub fn set_background_color(&mut self, color: Option<Color>) -> &mut Self {
        self.background = color.map(|c| c.to_packed(self.format));
        self.background_index = -1;
        self
    }

    pub fn background_color(&self) -> Option<Color> {
        self.unpack(self.background)
    }

    pub fn set_background_index(&mut self, index: i32) -> &mut Self {
        if let Some(entry) = self.lookup(index) {
            self.background = entry.map(|(p, _)| p);
            self.background_index = entry.map_or(-1, |(_, i)| i);
        }
        self
    }

    #[inline]
    pub fn background_index(&self) -> i32 {
        self.background_index
    }

    // ========================================================================
    // Pixel access
    // ========================================================================

    /// Apply the translation offset, saturating at the `i32` range
    #[inline]
    pub(super) fn translated(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.saturating_add(self.translate_x),
            y.saturating_add(self.translate_y),
        )
    }

    /// Pen write honoring translation, XOR mode and safe mode.
    /// Without a pen nothing is written.
    #[inline]
    pub(super) fn plot(&mut self, x: i32, y: i32) {
        let Some(pen) = self.pen else {
            return;
        };
        let (x, y) = self.translated(x, y);
        if self.xor_mode {
            self.buffer.xor(x, y, pen & self.format.xor_mask());
        } else if self.safe_mode {
            self.buffer.set(x, y, pen);
        } else {
            self.buffer.set_wrapping(x, y, pen);
        }
    }

    /// Fill write honoring translation, always bounds-checked
    #[inline]
    pub(super) fn plot_fill(&mut self, x: i32, y: i32) {
        if let Some(fill) = self.fill {
            let (x, y) = self.translated(x, y);
            self.buffer.set(x, y, fill);
        }
    }

    /// Set a single pixel to the pen color
    pub fn set_pixel(&mut self, x: i32, y: i32) -> &mut Self {
        self.plot(x, y);
        self.maybe_commit();
        self
    }

    /// Raw packed pixel at a translated position; zero outside the buffer
    #[inline]
    pub fn get_pixel32(&self, x: i32, y: i32) -> u32 {
        let (x, y) = self.translated(x, y);
        self.buffer.get(x, y)
    }

    /// RGBA at a translated position; all zero outside the buffer
    pub fn get_pixel(&self, x: i32, y: i32) -> (u8, u8, u8, u8) {
        let p = self.get_pixel32(x, y);
        let (r, g, b) = self.format.unpack(p);
        (r, g, b, self.format.alpha(p))
    }

    pub fn get_pixel_color(&self, x: i32, y: i32) -> Color {
        Color::from_packed(self.format, self.get_pixel32(x, y))
    }

    /// Nearest palette index of the pixel, or -1 without a palette
    pub fn get_pixel_index(&self, x: i32, y: i32) -> i32 {
        match &self.palette {
            Some(p) => {
                let c = self.get_pixel_color(x, y);
                p.nearest_index(c.r, c.g, c.b) as i32
            },
            None => -1,
        }
    }

    /// The whole logical buffer, row-major
    #[inline]
    pub fn image_data(&self) -> &[u32] {
        self.buffer.pixels()
    }

    /// Copy a region of the logical buffer; outside parts are transparent
    pub fn get_image_data(&self, x: i32, y: i32, w: u32, h: u32) -> Image {
        let data = self.buffer.read_rect(x, y, w as i32, h as i32);
        Image::from_packed(w, h, &data, self.format)
    }

    /// Replace a region of the logical buffer with the image's pixels
    pub fn put_image_data(&mut self, img: &Image, x: i32, y: i32) -> &mut Self {
        for sy in 0..img.height() as i32 {
            for sx in 0..img.width() as i32 {
                let p = img.packed(sx, sy, self.format);
                self.buffer.set(x.saturating_add(sx), y.saturating_add(sy), p);
            }
        }
        self.maybe_commit();
        self
    }

    /// Snapshot of the logical buffer composited over the background color
    pub fn export_image(&mut self) -> Image {
        self.commit(true);
        let (w, h) = self.resolution();
        let bg = self.background_color();
        let mut img = Image::from_packed(w, h, self.buffer.pixels(), self.format);

        if let Some(bg) = bg {
            for px in img.pixels_mut().chunks_exact_mut(4) {
                let a = px[3] as u32;
                let over = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
                let (r, g, b) = (over(px[0], bg.r), over(px[1], bg.g), over(px[2], bg.b));
                px.copy_from_slice(&[r, g, b, 255]);
            }
        }
        img
    }

    /// Re-blit a region of the logical buffer to the destination
    pub fn update_region(&mut self, x: i32, y: i32, w: i32, h: i32) -> &mut Self {
        self.dest.blit_scaled_region(&self.buffer, x, y, w, h);
        self
    }

    // ========================================================================
    // Whole-buffer operations
    // ========================================================================

    /// Reset the logical buffer to fully transparent
    pub fn clear(&mut self) -> &mut Self {
        self.buffer.clear();
        self.maybe_commit();
        self
    }

    /// Zero a translated rectangle, clipped to the buffer
    pub fn clear_rect(&mut self, x: i32, y: i32, w: i32, h: i32) -> &mut Self {
        let (x, y) = self.translated(x, y);
        self.buffer.fill_rect(x, y, w, h, 0);
        self.maybe_commit();
        self
    }

    /// Set the whole logical buffer to the fill color (transparent without one)
    pub fn fill_background(&mut self) -> &mut Self {
        self.buffer.fill(self.fill.unwrap_or(0));
        self.maybe_commit();
        self
    }

    /// Replace every pixel exactly equal to `color` with the fill color
    pub fn replace_color(&mut self, color: Color) -> &mut Self {
        let target = color.to_packed(self.format);
        let fill = self.fill.unwrap_or(0);
        for p in self.buffer.pixels_mut() {
            if *p == target {
                *p = fill;
            }
        }
        self.maybe_commit();
        self
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Draw an image at a translated position, optionally resized and color
    /// reduced with the current palette
    pub fn draw_image(
        &mut self,
        img: &Image,
        x: i32,
        y: i32,
        size: Option<(u32, u32)>,
        mode: Option<ReduceMode>,
    ) -> &mut Self {
        let (x, y) = self.translated(x, y);
        let (w, h) = size.unwrap_or((img.width(), img.height()));

        match mode {
            Some(mode) => {
                let reduced = reduce_image(img, w, h, self.palette.as_ref(), mode);
                self.native.draw_image(&reduced, x, y, w, h, self.format);
            },
            None => self.native.draw_image(img, x, y, w, h, self.format),
        }

        self.merge_native();
        self.maybe_commit();
        self
    }

    /// Draw the source rectangle of an image into the destination rectangle.
    /// The source rectangle is clamped into the image first.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_clipped(
        &mut self,
        img: &Image,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        dx: i32,
        dy: i32,
        dw: u32,
        dh: u32,
    ) -> &mut Self {
        let iw = img.width() as i32;
        let ih = img.height() as i32;
        let sx = sx.clamp(0, (iw - 1).max(0));
        let sy = sy.clamp(0, (ih - 1).max(0));
        let sw = sw.min(iw - sx);
        let sh = sh.min(ih - sy);

        if sw > 0 && sh > 0 {
            let part = img.sub_image(sx, sy, sw as u32, sh as u32);
            let (dx, dy) = self.translated(dx, dy);
            self.native.draw_image(&part, dx, dy, dw, dh, self.format);
            self.merge_native();
        }

        self.maybe_commit();
        self
    }

    // ========================================================================
    // Scroll and blit
    // ========================================================================

    /// Shift the logical buffer by (dx, dy). Vacated pixels are set to the
    /// fill color when `clear_gap` is set and a fill color exists; otherwise
    /// they keep their old content.
    pub fn scroll(&mut self, dx: i32, dy: i32, clear_gap: bool) -> &mut Self {
        if dx == 0 && dy == 0 {
            return self;
        }

        let (w, h) = self.resolution();
        let (w, h) = (w as i32, h as i32);
        let gap = if clear_gap { self.fill } else { None };
        let stride = w as usize;
        let pixels = self.buffer.pixels_mut();

        if dx <= -w || dx >= w || dy <= -h || dy >= h {
            if let Some(fill) = gap {
                pixels.fill(fill);
            }
            self.maybe_commit();
            return self;
        }

        // Vertical pass, then the horizontal pass over the rows that received
        // shifted content.
        let (mut row_start, mut row_end) = (0, h as usize);
        if dy < 0 {
            let n = (-dy) as usize;
            pixels.copy_within(n * stride.., 0);
            let tail = (h as usize - n) * stride;
            if let Some(fill) = gap {
                pixels[tail..].fill(fill);
            }
            row_end = h as usize - n;
        } else if dy > 0 {
            let n = dy as usize;
            let len = (h as usize - n) * stride;
            pixels.copy_within(0..len, n * stride);
            if let Some(fill) = gap {
                pixels[..n * stride].fill(fill);
            }
            row_start = n;
        }

        if dx != 0 {
            let n = dx.unsigned_abs() as usize;
            for row in row_start..row_end {
                let line = &mut pixels[row * stride..(row + 1) * stride];
                if dx > 0 {
                    line.copy_within(0..stride - n, n);
                    if let Some(fill) = gap {
                        line[..n].fill(fill);
                    }
                } else {
                    line.copy_within(n.., 0);
                    if let Some(fill) = gap {
                        line[stride - n..].fill(fill);
                    }
                }
            }
        }

        self.maybe_commit();
        self
    }

    /// Copy the region (x, y, w, h) to (dx, dy). In XOR mode the copied RGB
    /// bits are XORed into the target instead of replacing it. Always commits.
    pub fn blit(&mut self, x: i32, y: i32, w: i32, h: i32, dx: i32, dy: i32) -> &mut Self {
        self.merge_native();

        let (rw, rh) = self.resolution();
        if x >= rw as i32 || y >= rh as i32 || w <= 0 || h <= 0 {
            self.commit(false);
            return self;
        }
        let w = w.min((rw as i32).saturating_sub(x));
        let h = h.min((rh as i32).saturating_sub(y));
        let region = self.buffer.read_rect(x, y, w, h);
        let mask = self.format.xor_mask();

        for (i, &p) in region.iter().enumerate() {
            let tx = dx.saturating_add(i as i32 % w);
            let ty = dy.saturating_add(i as i32 / w);
            if self.xor_mode {
                self.buffer.xor(tx, ty, p & mask);
            } else {
                self.buffer.set(tx, ty, p);
            }
        }

        self.commit(false);
        self
    }
}
