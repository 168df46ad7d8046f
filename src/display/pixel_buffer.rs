use crate::image::Image;
use crate::color::PixelFormat;

// ============================================================================
// PixelBuffer
// ============================================================================

/// Linear buffer of packed 32-bit pixels in row-major order.
/// A pixel value of zero is fully transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a transparent buffer
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Reallocate at a new size; content is cleared
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width * height) as usize];
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Pixel at (x, y); zero outside the buffer
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u32 {
        if self.in_bounds(x, y) {
            self.pixels[self.pixel_index(x as u32, y as u32)]
        } else {
            0
        }
    }

    /// Bounds-checked write
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, pixel: u32) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx] = pixel;
        }
    }

    /// Unchecked-coordinate write: the linear offset `y * width + x` is used
    /// as is, so an out-of-range x wraps onto a neighbouring row. Offsets past
    /// either end of the buffer are dropped.
    #[inline]
    pub fn set_wrapping(&mut self, x: i32, y: i32, pixel: u32) {
        let offset = y as i64 * self.width as i64 + x as i64;
        if offset >= 0 {
            if let Some(p) = self.pixels.get_mut(offset as usize) {
                *p = pixel;
            }
        }
    }

    /// XOR `mask` into the pixel at (x, y)
    #[inline]
    pub fn xor(&mut self, x: i32, y: i32, mask: u32) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx] ^= mask;
        }
    }

    /// Reset to fully transparent
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Set every pixel to one value
    pub fn fill(&mut self, pixel: u32) {
        self.pixels.fill(pixel);
    }

    /// Set a rectangle to one value, two rows per iteration with the odd row
    /// handled last. The rectangle is clipped to the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, pixel: u32) {
        let x1 = x.max(0);
        let y1 = y.max(0);
        let x2 = x.saturating_add(w).min(self.width as i32);
        let y2 = y.saturating_add(h).min(self.height as i32);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        let stride = self.width as usize;
        let (x1, x2) = (x1 as usize, x2 as usize);
        let rows = (y2 - y1) as usize;
        let paired_end = y1 as usize + (rows / 2) * 2;

        let mut row = y1 as usize;
        while row < paired_end {
            let p = row * stride;
            let (upper, lower) = self.pixels[p..p + 2 * stride].split_at_mut(stride);
            upper[x1..x2].fill(pixel);
            lower[x1..x2].fill(pixel);
            row += 2;
        }

        if row < y2 as usize {
            let p = row * stride;
            self.pixels[p + x1..p + x2].fill(pixel);
        }
    }

    /// Horizontal span from x1 to x2 inclusive, clipped
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, pixel: u32) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let start = x1.max(0);
        let end = x2.min(self.width as i32 - 1);
        if start > end {
            return;
        }
        let idx = self.pixel_index(start as u32, y as u32);
        let count = (end - start + 1) as usize;
        self.pixels[idx..idx + count].fill(pixel);
    }

    /// Even-odd scanline fill of a closed polygon
    pub fn fill_polygon(&mut self, vertices: &[(f32, f32)], pixel: u32) {
        if vertices.len() < 3 {
            return;
        }

        // Find bounding box
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for (_, y) in vertices {
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }

        let min_y = (min_y as i32).max(0);
        let max_y = (max_y as i32).min(self.height as i32 - 1);

        let mut intersections = Vec::with_capacity(vertices.len());
        let n = vertices.len();

        for y in min_y..=max_y {
            intersections.clear();
            let yf = y as f32 + 0.5;

            for i in 0..n {
                let (x1, y1) = vertices[i];
                let (x2, y2) = vertices[(i + 1) % n];

                if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                    let x = x1 + (yf - y1) / (y2 - y1) * (x2 - x1);
                    intersections.push((x + 0.5).floor() as i32);
                }
            }

            intersections.sort_unstable();
            for pair in intersections.chunks_exact(2) {
                self.hline(pair[0], pair[1], y, pixel);
            }
        }
    }

    /// Draw an image scaled (nearest-neighbor) into the rectangle at (x, y)
    /// of size (w, h), clipped to the buffer. Transparent source pixels are
    /// written as zero.
    pub fn draw_image(&mut self, img: &Image, x: i32, y: i32, w: u32, h: u32, format: PixelFormat) {
        if w == 0 || h == 0 || img.width() == 0 || img.height() == 0 {
            return;
        }
        for dy in 0..h as i32 {
            let ty = y.saturating_add(dy);
            if ty < 0 || ty >= self.height as i32 {
                continue;
            }
            let sy = (dy as i64 * img.height() as i64 / h as i64) as i32;
            for dx in 0..w as i32 {
                let tx = x.saturating_add(dx);
                if tx < 0 || tx >= self.width as i32 {
                    continue;
                }
                let sx = (dx as i64 * img.width() as i64 / w as i64) as i32;
                let idx = self.pixel_index(tx as u32, ty as u32);
                self.pixels[idx] = img.packed(sx, sy, format);
            }
        }
    }

    /// Copy the source rectangle (clipped) and return it row-major
    pub fn read_rect(&self, x: i32, y: i32, w: i32, h: i32) -> Vec<u32> {
        let mut out = Vec::with_capacity(w.max(0) as usize * h.max(0) as usize);
        for row in 0..h {
            for col in 0..w {
                out.push(self.get(x.saturating_add(col), y.saturating_add(row)));
            }
        }
        out
    }

    // ========================================================================
    // Merging
    // ========================================================================

    /// Copy every non-transparent pixel of `src` into this buffer
    pub fn merge_from(&mut self, src: &PixelBuffer) {
        self.merge_rows(src, 0, self.height);
    }

    /// Like `merge_from`, but only rows in [y1, y2)
    pub fn merge_rows(&mut self, src: &PixelBuffer, y1: u32, y2: u32) {
        if src.pixels.len() != self.pixels.len() {
            return;
        }
        let stride = self.width as usize;
        let start = y1.min(self.height) as usize * stride;
        let end = y2.min(self.height) as usize * stride;
        for (dst, &s) in self.pixels[start..end]
            .iter_mut()
            .zip(&src.pixels[start..end])
        {
            if s != 0 {
                *dst = s;
            }
        }
    }

    /// Write `pixel` wherever `src` is non-transparent
    pub fn merge_color(&mut self, src: &PixelBuffer, pixel: u32) {
        if src.pixels.len() != self.pixels.len() {
            return;
        }
        for (dst, &s) in self.pixels.iter_mut().zip(&src.pixels) {
            if s != 0 {
                *dst = pixel;
            }
        }
    }

    /// Copy the non-transparent pixels of the `w` x `h` rectangle at
    /// (sx, sy) in `src` to (dx, dy), clipped on both sides
    #[allow(clippy::too_many_arguments)]
    pub fn overlay_rect(
        &mut self,
        src: &PixelBuffer,
        sx: i32,
        sy: i32,
        w: i32,
        h: i32,
        dx: i32,
        dy: i32,
    ) {
        for row in 0..h {
            for col in 0..w {
                let p = src.get(sx.saturating_add(col), sy.saturating_add(row));
                if p != 0 {
                    self.set(dx.saturating_add(col), dy.saturating_add(row), p);
                }
            }
        }
    }

    // ========================================================================
    // Scaling
    // ========================================================================

    /// Nearest-neighbor scale the whole of `src` onto this buffer
    pub fn blit_scaled(&mut self, src: &PixelBuffer) {
        self.blit_scaled_region(src, 0, 0, src.width as i32, src.height as i32);
    }

    /// Nearest-neighbor scale a region of `src` onto the matching region of
    /// this buffer. Destination pixels whose source falls in the region are
    /// rewritten; the rest are left as they are.
    pub fn blit_scaled_region(&mut self, src: &PixelBuffer, x: i32, y: i32, w: i32, h: i32) {
        if src.width == 0 || src.height == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x1 = x.max(0);
        let y1 = y.max(0);
        let x2 = x.saturating_add(w).min(src.width as i32);
        let y2 = y.saturating_add(h).min(src.height as i32);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        let sw = src.width as i64;
        let sh = src.height as i64;
        let dw = self.width as i64;
        let dh = self.height as i64;

        // Destination range covering source rows/columns [start, end)
        let map = |v: i32, s: i64, d: i64| ((v as i64 * d + s - 1) / s) as usize;

        let dy1 = map(y1, sh, dh);
        let dy2 = map(y2, sh, dh).min(self.height as usize);
        let dx1 = map(x1, sw, dw);
        let dx2 = map(x2, sw, dw).min(self.width as usize);

        let stride = self.width as usize;
        for dy in dy1..dy2 {
            let sy = (dy as i64 * sh / dh) as usize;
            let src_row = sy * src.width as usize;
            let dst_row = dy * stride;
            for dx in dx1..dx2 {
                let sx = (dx as i64 * sw / dw) as usize;
                self.pixels[dst_row + dx] = src.pixels[src_row + sx];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_rect_skips_transparent_and_clips() {
        let mut src = PixelBuffer::with_size(4, 2);
        src.set(1, 0, 5);
        src.set(2, 1, 6);
        let mut dst = PixelBuffer::with_size(4, 4);
        dst.fill(9);
        dst.overlay_rect(&src, 1, 0, 2, 2, 2, 3);
        assert_eq!(dst.get(2, 3), 5);
        assert_eq!(dst.get(3, 3), 9);
        assert_eq!(dst.pixels().iter().filter(|&&p| p == 9).count(), 15);
    }

    #[test]
    fn test_fill_rect_inclusive_extents() {
        for h in 1..6 {
            let mut buf = PixelBuffer::with_size(8, 8);
            buf.fill_rect(1, 1, 3, h, 7);
            let count = buf.pixels().iter().filter(|&&p| p == 7).count();
            assert_eq!(count as i32, 3 * h);
            assert_eq!(buf.get(1, h), 7);
            assert_eq!(buf.get(1, h + 1), 0);
        }
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = PixelBuffer::with_size(8, 4);
        buf.fill_rect(-2, -2, 100, 100, 1);
        assert!(buf.pixels().iter().all(|&p| p == 1));
    }

    #[test]
    fn test_set_wrapping_wraps_rows() {
        let mut buf = PixelBuffer::with_size(8, 2);
        buf.set_wrapping(9, 0, 5);
        assert_eq!(buf.get(1, 1), 5);
        buf.set_wrapping(100, 100, 5);
        buf.set_wrapping(-1, 0, 5);
        assert_eq!(buf.pixels().iter().filter(|&&p| p == 5).count(), 1);
    }

    #[test]
    fn test_fill_polygon_square() {
        let mut buf = PixelBuffer::with_size(16, 16);
        buf.fill_polygon(&[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)], 3);
        assert_eq!(buf.get(4, 4), 3);
        assert_eq!(buf.get(1, 4), 0);
        assert_eq!(buf.get(4, 7), 0);
    }

    #[test]
    fn test_merge_skips_transparent() {
        let mut dst = PixelBuffer::with_size(8, 1);
        dst.fill(9);
        let mut src = PixelBuffer::with_size(8, 1);
        src.set(3, 0, 4);
        dst.merge_from(&src);
        assert_eq!(dst.get(3, 0), 4);
        assert_eq!(dst.get(2, 0), 9);
        dst.merge_color(&src, 1);
        assert_eq!(dst.get(3, 0), 1);
    }

    #[test]
    fn test_blit_scaled_doubles_pixels() {
        let mut src = PixelBuffer::with_size(2, 2);
        src.set(1, 0, 8);
        let mut dst = PixelBuffer::with_size(4, 4);
        dst.blit_scaled(&src);
        assert_eq!(dst.get(2, 0), 8);
        assert_eq!(dst.get(3, 1), 8);
        assert_eq!(dst.get(1, 0), 0);
        assert_eq!(dst.get(2, 2), 0);
    }

    #[test]
    fn test_blit_scaled_region_only_touches_region() {
        let mut src = PixelBuffer::with_size(4, 4);
        src.fill(2);
        let mut dst = PixelBuffer::with_size(8, 8);
        dst.blit_scaled_region(&src, 1, 1, 1, 1);
        assert_eq!(dst.get(2, 2), 2);
        assert_eq!(dst.get(3, 3), 2);
        assert_eq!(dst.get(1, 1), 0);
        assert_eq!(dst.get(4, 4), 0);
    }
}
