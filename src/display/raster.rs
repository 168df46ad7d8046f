//! Primitive rasterization on the logical buffer
//!
//! Every primitive works in logical pixel coordinates and goes through the
//! surface's pen/fill writers, so translation, safe mode and XOR mode apply
//! uniformly. Outlines need a pen; fills need a fill color.

use std::f64::consts::PI;

use super::surface::Surface;

/// Angular step for arcs, in radians
const ARC_STEP: f64 = 0.02;
/// Parameter step for Bezier curves
const CURVE_STEP: f64 = 0.025;
/// Segments per control interval for cardinal splines
const CARDINAL_SEGMENTS: u32 = 12;
/// Tension used by callers that have no preference
pub const DEFAULT_TENSION: f64 = 0.5;

#[inline]
fn round(v: f64) -> i32 {
    (v + 0.5) as i32
}

impl Surface {
    // ========================================================================
    // Lines
    // ========================================================================

    /// Draw the segment from (x1, y1) to (x2, y2), both ends inclusive
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> &mut Self {
        self.raw_line(x1, y1, x2, y2);
        self.maybe_commit();
        self
    }

    /// DDA along the major axis, one pixel per step
    fn raw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let mut sl = y2 - y1;
        let mut ll = x2 - x1;
        let y_major = sl.abs() > ll.abs();
        if y_major {
            std::mem::swap(&mut sl, &mut ll);
        }

        let dlt = if ll < 0 { -1 } else { 1 };
        let mul = if ll == 0 {
            sl as f64
        } else {
            sl as f64 / ll as f64
        };

        let mut i = 0;
        if y_major {
            let fx = x1 as f64 + 0.5;
            while i != ll {
                self.plot((fx + i as f64 * mul) as i32, y1 + i);
                i += dlt;
            }
        } else {
            let fy = y1 as f64 + 0.5;
            while i != ll {
                self.plot(x1 + i, (fy + i as f64 * mul) as i32);
                i += dlt;
            }
        }

        self.plot(x2, y2);
    }

    /// Connected polyline through flattened `[x0, y0, x1, y1, ...]`,
    /// committed once at the end
    pub fn lines(&mut self, points: &[i32]) -> &mut Self {
        let saved = self.auto_commit;
        self.auto_commit = false;

        for seg in points.windows(4).step_by(2) {
            self.raw_line(seg[0], seg[1], seg[2], seg[3]);
        }

        self.auto_commit = saved;
        self.maybe_commit();
        self
    }

    // ========================================================================
    // Circles and ellipses
    // ========================================================================

    /// Midpoint circle. The fill uses its own span loop so outline pixels
    /// are not covered twice. A radius below 1 draws nothing.
    pub fn circle(&mut self, xc: i32, yc: i32, r: i32) -> &mut Self {
        if r < 1 {
            return self;
        }

        if self.fill.is_some() {
            let mut xoff = 0;
            let mut yoff = r;
            let mut b = -r;

            while xoff <= yoff {
                self.span_pair(xc - xoff, yc - yoff, yc + yoff, 2 * xoff);
                self.span_pair(xc - yoff, yc - xoff, yc + xoff, 2 * yoff);

                b += 2 * xoff + 1;
                xoff += 1;
                if b >= 0 {
                    yoff -= 1;
                    b -= 2 * yoff;
                }
            }
        }

        if self.pen.is_some() {
            self.plot(xc - r, yc);
            self.plot(xc + r, yc);
            self.plot(xc, yc - r);
            self.plot(xc, yc + r);

            let mut x = r;
            let mut y = 0;
            let mut cd = 0;
            while x > y {
                x -= 1;
                y += 1;
                cd -= x - y;
                if cd < 0 {
                    cd += x;
                    x += 1;
                }

                self.plot(xc - x, yc - y);
                self.plot(xc - y, yc - x);
                self.plot(xc + y, yc - x);
                self.plot(xc + x, yc - y);
                self.plot(xc - x, yc + y);
                self.plot(xc - y, yc + x);
                self.plot(xc + y, yc + x);
                self.plot(xc + x, yc + y);
            }
        }

        self.maybe_commit();
        self
    }

    /// `w + 1` fill pixels from x on rows y1 and y2
    fn span_pair(&mut self, x: i32, y1: i32, y2: i32, w: i32) {
        for i in (0..=w).rev() {
            self.plot_fill(x + i, y1);
            self.plot_fill(x + i, y2);
        }
    }

    /// Midpoint ellipse with radii `rx`, `ry`. Radii of 1 or less draw nothing.
    pub fn ellipse(&mut self, x: i32, y: i32, rx: i32, ry: i32) -> &mut Self {
        let rx = rx - 1;
        let ry = ry - 1;
        if rx <= 0 || ry <= 0 {
            return self;
        }

        let mut x1 = (x - rx) as i64;
        let mut x2 = (x + rx) as i64;
        let mut y1 = (y - ry) as i64;
        let mut w = (rx as i64) << 1;
        let h = (ry as i64) << 1;
        let mut h1 = h & 1;
        let mut dx = ((1 - w) * h * h) << 2;
        let mut dy = ((h1 + 1) * w * w) << 2;
        let mut err = dx + dy + h1 * w * w;
        let fill = self.fill.is_some();

        y1 += (h + 1) >> 1;
        let mut y2 = y1 - h1;
        w *= w << 3;
        h1 = (h * h) << 3;

        loop {
            if fill {
                let lw = 2 * (x as i64 - x1) - 1;
                if lw > 0 {
                    for i in (0..lw).rev() {
                        self.plot_fill((x1 + 1 + i) as i32, y2 as i32);
                    }
                    for i in (0..lw).rev() {
                        self.plot_fill((x1 + 1 + i) as i32, y1 as i32);
                    }
                }
            }

            self.plot(x2 as i32, y1 as i32);
            self.plot(x1 as i32, y1 as i32);
            self.plot(x1 as i32, y2 as i32);
            self.plot(x2 as i32, y2 as i32);

            let e2 = err << 1;
            if e2 <= dy {
                y1 += 1;
                y2 -= 1;
                dy += w;
                err += dy;
            }
            if e2 >= dx || (err << 1) > dy {
                x1 += 1;
                x2 -= 1;
                dx += h1;
                err += dx;
            }

            if x1 > x2 {
                break;
            }
        }

        while y1 - y2 < h {
            self.plot((x1 - 1) as i32, y1 as i32);
            self.plot((x2 + 1) as i32, y1 as i32);
            y1 += 1;
            self.plot((x1 - 1) as i32, y2 as i32);
            self.plot((x2 + 1) as i32, y2 as i32);
            y2 -= 1;
        }

        self.maybe_commit();
        self
    }

    // ========================================================================
    // Rectangles and polygons
    // ========================================================================

    /// Clamp the inclusive range [lo, hi] on one axis to the coordinates
    /// that can land in the buffer after translation. Wrapping pen writes
    /// keep a margin of one buffer length.
    fn reachable(&self, lo: i32, hi: i32, len: u32, offset: i32, wrapping: bool) -> (i32, i32) {
        let margin = if wrapping {
            i32::try_from(self.buffer.pixels().len()).unwrap_or(i32::MAX)
        } else {
            0
        };
        let min = 0i32.saturating_sub(offset).saturating_sub(margin);
        let max = (len as i32 - 1).saturating_sub(offset).saturating_add(margin);
        (lo.max(min), hi.min(max))
    }

    /// Rectangle of `w` x `h` pixels. Negative sizes extend left/up. With a
    /// pen the fill is inset by one pixel on every side.
    pub fn rect(&mut self, x: i32, y: i32, w: i32, h: i32) -> &mut Self {
        let (x, w) = if w < 0 { (x.saturating_add(w), w.saturating_neg()) } else { (x, w) };
        let (y, h) = if h < 0 { (y.saturating_add(h), h.saturating_neg()) } else { (y, h) };
        if w == 0 || h == 0 {
            return self;
        }

        // Inclusive far edges
        let x2 = x.saturating_add(w - 1);
        let y2 = y.saturating_add(h - 1);
        let (bw, bh) = (self.buffer.width(), self.buffer.height());
        let (tx, ty) = (self.translate_x, self.translate_y);

        if self.fill.is_some() {
            // Inset even in XOR mode, so the outline never lands on fill pixels
            let inset = i32::from(self.pen.is_some());
            let (c1, c2) =
                self.reachable(x.saturating_add(inset), x2.saturating_sub(inset), bw, tx, false);
            let (r1, r2) =
                self.reachable(y.saturating_add(inset), y2.saturating_sub(inset), bh, ty, false);
            for row in r1..=r2 {
                for col in c1..=c2 {
                    self.plot_fill(col, row);
                }
            }
        }

        if self.pen.is_some() {
            let wrapping = !self.safe_mode && !self.xor_mode;
            let (c1, c2) = self.reachable(x, x2.saturating_sub(1), bw, tx, wrapping);
            for col in c1..=c2 {
                self.plot(col, y);
                if y2 != y {
                    self.plot(col, y2);
                }
            }
            let (r1, r2) = self.reachable(y, y2, bh, ty, wrapping);
            for row in r1..=r2 {
                self.plot(x2, row);
                if x2 != x && row != y && row != y2 {
                    self.plot(x, row);
                }
            }
        }

        self.maybe_commit();
        self
    }

    /// Closed polygon through flattened points. The fill is rasterized in the
    /// native scratch buffer and merged in the fill color.
    pub fn polygon(&mut self, points: &[i32]) -> &mut Self {
        if points.len() < 2 {
            return self;
        }

        if let Some(fill) = self.fill {
            let (tx, ty) = (self.translate_x as f32, self.translate_y as f32);
            let vertices: Vec<(f32, f32)> = points
                .chunks_exact(2)
                .map(|p| (p[0] as f32 + tx, p[1] as f32 + ty))
                .collect();
            self.native.fill_polygon(&vertices, fill);
            self.buffer.merge_color(&self.native, fill);
            self.native.clear();
        }

        if self.pen.is_some() {
            let mut closed = points.to_vec();
            closed.truncate(points.len() & !1);
            closed.extend_from_slice(&points[..2]);
            self.lines(&closed);
        } else {
            self.maybe_commit();
        }
        self
    }

    // ========================================================================
    // Arcs and curves
    // ========================================================================

    /// Arc of radius `r` between two angles (radians). Angles given in
    /// descending order are swapped; `ccw` reverses the sampling direction.
    pub fn arc(&mut self, cx: i32, cy: i32, r: i32, start: f64, end: f64, ccw: bool) -> &mut Self {
        if r == 0 || start == end {
            return self;
        }
        let (start, end) = if start > end { (end, start) } else { (start, end) };

        let (cx, cy, r) = (cx as f64, cy as f64, r as f64);
        let point = |a: f64| [round(cx + r * a.cos()), round(cy + r * a.sin())];
        let mut pts = Vec::new();

        let last = if ccw {
            let limit = PI * 2.0 - start;
            let mut angle = end;
            while angle < limit {
                pts.extend_from_slice(&point(angle));
                angle += ARC_STEP;
            }
            limit
        } else {
            let mut angle = start;
            while angle < end + ARC_STEP {
                pts.extend_from_slice(&point(angle));
                angle += ARC_STEP;
            }
            end
        };
        pts.extend_from_slice(&point(last));

        self.lines(&pts)
    }

    /// Quadratic Bezier from (sx, sy) through control (cx, cy) to (ex, ey)
    pub fn curve_quadratic(&mut self, sx: f64, sy: f64, cx: f64, cy: f64, ex: f64, ey: f64) -> &mut Self {
        let mut pts = vec![round(sx), round(sy)];

        let mut t = CURVE_STEP;
        while t < 1.0 {
            let t1 = 1.0 - t;
            let a = t1 * t1;
            let b = 2.0 * t1 * t;
            let c = t * t;
            pts.push(round(a * sx + b * cx + c * ex));
            pts.push(round(a * sy + b * cy + c * ey));
            t += CURVE_STEP;
        }

        pts.push(round(ex));
        pts.push(round(ey));
        self.lines(&pts)
    }

    /// Cubic Bezier from (sx, sy) with controls (c1x, c1y), (c2x, c2y) to (ex, ey)
    #[allow(clippy::too_many_arguments)]
    pub fn curve_bezier(
        &mut self,
        sx: f64,
        sy: f64,
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        ex: f64,
        ey: f64,
    ) -> &mut Self {
        let mut pts = vec![sx as i32, sy as i32];

        let mut t = CURVE_STEP;
        while t < 1.0 {
            let tm1 = 1.0 - t;
            let a = tm1 * tm1 * tm1;
            let b = 3.0 * t * tm1 * tm1;
            let c = 3.0 * t * t * tm1;
            let d = t * t * t;
            pts.push(round(a * sx + b * c1x + c * c2x + d * ex));
            pts.push(round(a * sy + b * c1y + c * c2y + d * ey));
            t += CURVE_STEP;
        }

        pts.push(ex as i32);
        pts.push(ey as i32);
        self.lines(&pts)
    }

    /// Cardinal spline through flattened points. A tension of zero means
    /// [`DEFAULT_TENSION`]. Nothing is drawn without a pen.
    pub fn curve_cardinal(&mut self, points: &[i32], tension: f64) -> &mut Self {
        if self.pen.is_none() || points.len() < 2 {
            return self;
        }
        let tension = if tension == 0.0 { DEFAULT_TENSION } else { tension };

        let pl = points.len() & !1;
        let points = &points[..pl];

        // Duplicate the end points as tangent anchors
        let mut pts = Vec::with_capacity(pl + 4);
        pts.extend_from_slice(&points[..2]);
        pts.extend_from_slice(points);
        pts.extend_from_slice(&points[pl - 2..]);
        let pts: Vec<f64> = pts.into_iter().map(f64::from).collect();

        let mut res = vec![points[0], points[1]];
        let segments = CARDINAL_SEGMENTS as f64;

        let mut i = 2;
        while i < pl {
            let (p0, p1, p2, p3) = (pts[i], pts[i + 1], pts[i + 2], pts[i + 3]);

            let t1x = (p2 - pts[i - 2]) * tension;
            let t2x = (pts[i + 4] - p0) * tension;
            let t1y = (p3 - pts[i - 1]) * tension;
            let t2y = (pts[i + 5] - p1) * tension;

            for t in 0..=CARDINAL_SEGMENTS {
                let st = t as f64 / segments;
                let pow2 = st * st;
                let pow3 = pow2 * st;
                let pow23 = pow2 * 3.0;
                let pow32 = pow3 * 2.0;

                let c1 = pow32 - pow23 + 1.0;
                let c2 = pow23 - pow32;
                let c3 = pow3 - 2.0 * pow2 + st;
                let c4 = pow3 - pow2;

                res.push(round(c1 * p0 + c2 * p2 + c3 * t1x + c4 * t2x));
                res.push(round(c1 * p1 + c2 * p3 + c3 * t1y + c4 * t2y));
            }
            i += 2;
        }

        self.lines(&res)
    }
}

#[cfg(test)]
mod tests {
    use crate::color::{Color, PixelFormat};
    use crate::display::Surface;
    use std::collections::HashSet;

    fn surface() -> Surface {
        Surface::with_format(64, 64, 64, 64, PixelFormat::Lsb).unwrap()
    }

    fn lit(s: &Surface) -> HashSet<(i32, i32)> {
        let (w, _) = s.resolution();
        s.image_data()
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != 0)
            .map(|(i, _)| ((i as u32 % w) as i32, (i as u32 / w) as i32))
            .collect()
    }

    #[test]
    fn test_line_endpoints_inclusive() {
        let mut s = surface();
        s.line(0, 0, 5, 0);
        let expected: HashSet<_> = (0..=5).map(|x| (x, 0)).collect();
        assert_eq!(lit(&s), expected);

        let mut s = surface();
        s.line(0, 0, 0, 5);
        let expected: HashSet<_> = (0..=5).map(|y| (0, y)).collect();
        assert_eq!(lit(&s), expected);
    }

    #[test]
    fn test_line_single_pixel_and_reversed() {
        let mut s = surface();
        s.line(3, 3, 3, 3);
        assert_eq!(lit(&s), [(3, 3)].into_iter().collect());

        let mut s = surface();
        s.line(10, 4, 2, 0);
        let px = lit(&s);
        assert_eq!(px.len(), 9);
        assert!(px.contains(&(10, 4)) && px.contains(&(2, 0)));
    }

    #[test]
    fn test_steep_line_one_pixel_per_row() {
        let mut s = surface();
        s.line(0, 0, 3, 10);
        let px = lit(&s);
        assert_eq!(px.len(), 11);
        for y in 0..=10 {
            assert_eq!(px.iter().filter(|p| p.1 == y).count(), 1);
        }
    }

    #[test]
    fn test_lines_restores_auto_commit() {
        let mut s = surface();
        s.set_auto_commit(true);
        s.lines(&[0, 0, 4, 0, 4, 4]);
        assert!(s.auto_commit());
        assert_eq!(lit(&s).len(), 9);
        assert_eq!(s.destination().get(4, 4), Color::WHITE.to_packed(PixelFormat::Lsb));
    }

    #[test]
    fn test_circle_is_rotation_symmetric() {
        let mut s = surface();
        s.set_fill_color(None);
        s.circle(10, 10, 5);
        let px = lit(&s);
        assert!(!px.is_empty());
        for &(x, y) in &px {
            let (dx, dy) = (x - 10, y - 10);
            assert!(px.contains(&(10 - dy, 10 + dx)), "({}, {})", x, y);
        }
        assert!(px.contains(&(5, 10)) && px.contains(&(15, 10)));
        assert!(!px.contains(&(10, 10)));
    }

    #[test]
    fn test_filled_circle_covers_center() {
        let mut s = surface();
        s.set_pen_color(None);
        s.set_fill_color(Some(Color::rgb(0, 255, 0)));
        s.circle(20, 20, 6);
        assert_eq!(s.get_pixel_color(20, 20), Color::rgb(0, 255, 0));
        assert_eq!(s.get_pixel_color(20, 14), Color::rgb(0, 255, 0));
        assert_eq!(s.get_pixel32(20, 13), 0);
        s.circle(40, 40, 0);
        assert_eq!(s.get_pixel32(40, 40), 0);
    }

    #[test]
    fn test_ellipse_outline_and_degenerate() {
        let mut s = surface();
        s.set_fill_color(None);
        s.ellipse(30, 30, 10, 5);
        let px = lit(&s);
        assert!(!px.is_empty());
        assert!(!px.contains(&(30, 30)));
        for &(x, y) in &px {
            assert!(px.contains(&(60 - x, y)), "horizontal mirror of ({}, {})", x, y);
        }

        let mut s = surface();
        s.ellipse(30, 30, 1, 5);
        assert!(lit(&s).is_empty());
    }

    #[test]
    fn test_filled_ellipse() {
        let mut s = surface();
        s.set_fill_color(Some(Color::rgb(255, 0, 0)));
        s.ellipse(30, 30, 10, 6);
        assert_eq!(s.get_pixel_color(30, 30), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_rect_outline_and_inset_fill() {
        let mut s = surface();
        s.set_fill_color(Some(Color::rgb(0, 0, 255)));
        s.rect(2, 2, 5, 4);
        assert_eq!(s.get_pixel_color(2, 2), Color::WHITE);
        assert_eq!(s.get_pixel_color(6, 5), Color::WHITE);
        assert_eq!(s.get_pixel_color(6, 3), Color::WHITE);
        assert_eq!(s.get_pixel_color(3, 3), Color::rgb(0, 0, 255));
        assert_eq!(s.get_pixel_color(5, 4), Color::rgb(0, 0, 255));
        assert_eq!(s.get_pixel32(7, 2), 0);
        assert_eq!(s.get_pixel32(2, 6), 0);
        assert_eq!(lit(&s).len(), 20);
    }

    #[test]
    fn test_rect_fill_only_and_negative_size() {
        let mut s = surface();
        s.set_pen_color(None);
        s.set_fill_color(Some(Color::rgb(0, 0, 255)));
        s.rect(10, 10, -3, -2);
        let px = lit(&s);
        let expected: HashSet<_> = (7..10).flat_map(|x| (8..10).map(move |y| (x, y))).collect();
        assert_eq!(px, expected);
    }

    #[test]
    fn test_rect_xor_outline_draws_each_pixel_once() {
        let mut s = surface();
        s.set_fill_color(None);
        s.set_xor_mode(true);
        s.rect(0, 0, 4, 3);
        assert_eq!(lit(&s).len(), 10);
    }

    #[test]
    fn test_polygon_fill_and_outline() {
        let mut s = surface();
        s.set_fill_color(Some(Color::rgb(0, 255, 0)));
        s.polygon(&[4, 4, 20, 4, 20, 20, 4, 20]);
        assert_eq!(s.get_pixel_color(12, 12), Color::rgb(0, 255, 0));
        assert_eq!(s.get_pixel_color(4, 12), Color::WHITE);
        assert_eq!(s.get_pixel_color(12, 20), Color::WHITE);
        assert_eq!(s.get_pixel32(21, 12), 0);
    }

    #[test]
    fn test_arc_reaches_both_ends() {
        let mut s = surface();
        s.arc(32, 32, 10, 0.0, std::f64::consts::PI, false);
        let px = lit(&s);
        assert!(px.contains(&(42, 32)));
        assert!(px.contains(&(22, 32)));
        assert!(px.contains(&(32, 42)));
        assert!(!px.contains(&(32, 22)));
    }

    #[test]
    fn test_curves_hit_endpoints() {
        let mut s = surface();
        s.curve_quadratic(0.0, 0.0, 20.0, 0.0, 20.0, 20.0);
        let px = lit(&s);
        assert!(px.contains(&(0, 0)) && px.contains(&(20, 20)));

        let mut s = surface();
        s.curve_bezier(0.0, 30.0, 10.0, 0.0, 30.0, 60.0, 40.0, 30.0);
        let px = lit(&s);
        assert!(px.contains(&(0, 30)) && px.contains(&(40, 30)));
    }

    #[test]
    fn test_cardinal_passes_through_points() {
        let mut s = surface();
        s.curve_cardinal(&[2, 2, 20, 30, 40, 5], super::DEFAULT_TENSION);
        let px = lit(&s);
        for p in [(2, 2), (20, 30), (40, 5)] {
            assert!(px.contains(&p), "{:?}", p);
        }

        let mut s = surface();
        s.set_pen_color(None);
        s.curve_cardinal(&[2, 2, 20, 30], 0.5);
        assert!(lit(&s).is_empty());
    }

    #[test]
    fn test_cardinal_zero_tension_uses_default() {
        let pts = [2, 2, 20, 30, 40, 5, 60, 40];
        let mut a = surface();
        a.curve_cardinal(&pts, 0.0);
        let mut b = surface();
        b.curve_cardinal(&pts, super::DEFAULT_TENSION);
        assert_eq!(lit(&a), lit(&b));
    }

    #[test]
    fn test_rect_xor_fill_stays_inside_outline() {
        let mut s = surface();
        s.set_fill_color(Some(Color::rgb(0, 0, 255)));
        s.set_xor_mode(true);
        s.rect(0, 0, 4, 4);
        assert_eq!(s.get_pixel_color(3, 1), Color::WHITE);
        assert_eq!(s.get_pixel_color(1, 1), Color::rgb(0, 0, 255));
        assert_eq!(lit(&s).len(), 16);
    }

    #[test]
    fn test_rect_extreme_sizes_clip() {
        let mut s = surface();
        s.set_pen_color(None);
        s.rect(0, 0, i32::MIN, 3);
        assert!(lit(&s).is_empty());

        s.rect(60, 62, i32::MAX, i32::MAX);
        let expected: HashSet<_> = (60..64).flat_map(|x| (62..64).map(move |y| (x, y))).collect();
        assert_eq!(lit(&s), expected);

        let mut s = surface();
        s.set_fill_color(None).set_safe_mode(false);
        s.rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        s.rect(i32::MAX, 0, 1, 1);
        s.translate(i32::MAX, 0).rect(10, 0, 4, 4);
        assert!(lit(&s).is_empty());
    }

    #[test]
    fn test_rect_offscreen_wraps_without_safe_mode() {
        let mut s = surface();
        s.set_fill_color(None).set_safe_mode(false);
        s.rect(62, 10, 4, 2);
        // x 64 and 65 continue on the next row
        assert_eq!(s.get_pixel_color(0, 11), Color::WHITE);
        assert_eq!(s.get_pixel_color(1, 12), Color::WHITE);
    }
}
