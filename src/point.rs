//! Integer points for building polylines, polygons and splines

/// A pixel position. Every operation rounds back to integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[inline]
fn round(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Nearest integer point to (x, y)
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(round(x), round(y))
    }

    pub fn translate(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.x = round(self.x as f32 + dx);
        self.y = round(self.y as f32 + dy);
        self
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.x = round(self.x as f32 * sx);
        self.y = round(self.y as f32 * sy);
        self
    }

    pub fn add(&mut self, p: Point) -> &mut Self {
        self.x += p.x;
        self.y += p.y;
        self
    }

    pub fn mul(&mut self, p: Point) -> &mut Self {
        self.x *= p.x;
        self.y *= p.y;
        self
    }

    /// Per-axis division, rounded. A zero divisor leaves that axis alone.
    pub fn div(&mut self, p: Point) -> &mut Self {
        if p.x != 0 {
            self.x = round(self.x as f32 / p.x as f32);
        }
        if p.y != 0 {
            self.y = round(self.y as f32 / p.y as f32);
        }
        self
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// `[x0, y0, x1, y1, ...]` as taken by `lines`, `polygon` and
/// `curve_cardinal`
pub fn flatten(points: &[Point]) -> Vec<i32> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_rounds() {
        assert_eq!(Point::from_f32(1.4, 1.5), Point::new(1, 2));
        assert_eq!(Point::from_f32(-0.6, 0.0), Point::new(-1, 0));
    }

    #[test]
    fn test_chained_ops() {
        let mut p = Point::new(2, 3);
        p.translate(0.5, -0.4).scale(2.0, 2.0);
        assert_eq!(p, Point::new(6, 6));

        p.add(Point::new(1, 1)).mul(Point::new(2, 3));
        assert_eq!(p, Point::new(14, 21));
    }

    #[test]
    fn test_div_by_zero_leaves_axis() {
        let mut p = Point::new(10, 9);
        p.div(Point::new(0, 2));
        assert_eq!(p, Point::new(10, 5));
    }

    #[test]
    fn test_flatten() {
        let pts = [Point::new(1, 2), Point::new(3, 4)];
        assert_eq!(flatten(&pts), vec![1, 2, 3, 4]);
        assert!(flatten(&[]).is_empty());
    }
}
