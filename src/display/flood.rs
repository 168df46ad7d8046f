//! Scanline flood fill
//!
//! Coordinates are absolute buffer positions; the surface translation is not
//! applied. The work stack is a heap `Vec`, so region shape never affects
//! call depth.

use log::{trace, warn};

use super::surface::Surface;

impl Surface {
    /// Replace the 4-connected region matching the color at (x, y) with the
    /// fill color. XOR mode is ignored.
    ///
    /// An out-of-bounds seed is a no-op, as is a missing fill color or a
    /// region that already has the fill color.
    pub fn bucket_fill(&mut self, x: i32, y: i32) -> &mut Self {
        if !self.buffer.in_bounds(x, y) {
            warn!("bucket_fill seed ({}, {}) outside the buffer", x, y);
            return self;
        }
        let Some(fill) = self.fill else {
            return self;
        };

        let target = self.buffer.get(x, y);
        if target == fill {
            return self;
        }

        let w = self.buffer.width() as usize;
        let h = self.buffer.height() as usize;
        let pixels = self.buffer.pixels_mut();
        let mut completed = vec![false; w * h];
        let mut stack: Vec<(usize, usize)> = Vec::with_capacity(w * h / 4 + 1);

        let (sx, sy) = (x as usize, y as usize);
        completed[sy * w + sx] = true;
        stack.push((sx, sy));

        let mut filled = 0usize;
        while let Some((cx, cy)) = stack.pop() {
            let row = cy * w;
            if pixels[row + cx] != target {
                continue;
            }
            pixels[row + cx] = fill;
            filled += 1;

            let mut w1 = cx;
            while w1 > 0 && pixels[row + w1 - 1] == target && !completed[row + w1 - 1] {
                w1 -= 1;
                pixels[row + w1] = fill;
                filled += 1;
            }
            let mut w2 = cx;
            while w2 + 1 < w && pixels[row + w2 + 1] == target && !completed[row + w2 + 1] {
                w2 += 1;
                pixels[row + w2] = fill;
                filled += 1;
            }

            for nx in w1..=w2 {
                if cy > 0 {
                    let p = row - w + nx;
                    if pixels[p] == target && !completed[p] {
                        completed[p] = true;
                        stack.push((nx, cy - 1));
                    }
                }
                if cy + 1 < h {
                    let p = row + w + nx;
                    if pixels[p] == target && !completed[p] {
                        completed[p] = true;
                        stack.push((nx, cy + 1));
                    }
                }
            }
        }

        trace!("bucket_fill ({}, {}): {} pixels", x, y, filled);
        self.maybe_commit();
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::color::{Color, PixelFormat};
    use crate::display::Surface;
    use std::collections::VecDeque;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::with_format(w, h, w, h, PixelFormat::Lsb).unwrap()
    }

    fn count(s: &Surface, color: Color) -> usize {
        let p = color.to_packed(s.format());
        s.image_data().iter().filter(|&&v| v == p).count()
    }

    #[test]
    fn test_fills_bordered_square_interior() {
        let mut s = surface(16, 16);
        s.set_pen_color(Some(Color::rgb(255, 0, 0)));
        s.set_fill_color(None);
        s.rect(0, 0, 10, 10);

        s.set_fill_color(Some(Color::rgb(0, 0, 255)));
        s.bucket_fill(4, 4);

        assert_eq!(count(&s, Color::rgb(0, 0, 255)), 64);
        assert_eq!(count(&s, Color::rgb(255, 0, 0)), 36);
        for i in 1..9 {
            assert_eq!(s.get_pixel_color(i, 1), Color::rgb(0, 0, 255));
            assert_eq!(s.get_pixel_color(1, i), Color::rgb(0, 0, 255));
        }
        assert_eq!(s.get_pixel(12, 12), (0, 0, 0, 0));
    }

    #[test]
    fn test_fills_spiral_exactly() {
        let size = 64;
        let mut s = surface(size, size);
        s.set_fill_color(None);

        // Square spiral wall with a 1px corridor
        let mut lo = 0;
        let mut hi = size as i32 - 1;
        while hi - lo > 4 {
            s.line(lo, lo, hi, lo);
            s.line(hi, lo, hi, hi);
            s.line(hi, hi, lo, hi);
            s.line(lo, hi, lo, lo + 2);
            s.line(lo, lo + 2, lo + 2, lo + 2);
            lo += 2;
            hi -= 2;
        }

        let before = s.image_data().to_vec();
        let green = Color::rgb(0, 255, 0);
        s.set_fill_color(Some(green));
        s.bucket_fill(1, 1);

        // Plain 4-connected search over the unfilled buffer
        let w = size as usize;
        let target = before[w + 1];
        let mut reached = vec![false; before.len()];
        let mut queue = VecDeque::from([(1usize, 1usize)]);
        reached[w + 1] = true;
        while let Some((x, y)) = queue.pop_front() {
            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx < w && ny < w && !reached[ny * w + nx] && before[ny * w + nx] == target {
                    reached[ny * w + nx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        let fill = green.to_packed(s.format());
        let expected: Vec<u32> = before
            .iter()
            .zip(&reached)
            .map(|(&p, &r)| if r { fill } else { p })
            .collect();
        assert!(reached.iter().filter(|&&r| r).count() > w * 4);
        assert_eq!(s.image_data(), expected.as_slice());
    }

    #[test]
    fn test_fills_whole_empty_buffer() {
        let mut s = surface(256, 256);
        s.set_fill_color(Some(Color::rgb(1, 2, 3)));
        s.bucket_fill(100, 100);
        assert_eq!(count(&s, Color::rgb(1, 2, 3)), 256 * 256);
    }

    #[test]
    fn test_out_of_bounds_seed_is_noop() {
        let mut s = surface(8, 8);
        s.bucket_fill(-1, 0).bucket_fill(0, 8);
        assert!(s.image_data().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_ignores_xor_mode_and_translation() {
        let mut s = surface(8, 8);
        s.set_xor_mode(true).translate(3, 3);
        s.set_fill_color(Some(Color::WHITE));
        s.bucket_fill(0, 0);
        assert!(s
            .image_data()
            .iter()
            .all(|&p| p == Color::WHITE.to_packed(PixelFormat::Lsb)));
    }

    #[test]
    fn test_noop_without_fill_or_same_color() {
        let mut s = surface(8, 8);
        s.set_fill_color(None);
        s.bucket_fill(0, 0);
        assert!(s.image_data().iter().all(|&p| p == 0));

        s.set_fill_color(Some(Color::BLACK));
        s.bucket_fill(0, 0);
        let black = Color::BLACK.to_packed(PixelFormat::Lsb);
        s.bucket_fill(0, 0);
        assert!(s.image_data().iter().all(|&p| p == black));
    }
}
