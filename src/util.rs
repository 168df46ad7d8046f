//! Frame timing and color helpers for the demo loop

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::color::Color;

/// Hue (degrees), saturation and value (0..1) to a `Color`
pub fn hsv(h: f32, s: f32, v: f32) -> Color {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::from_f32((r1 + m) * 255.0, (g1 + m) * 255.0, (b1 + m) * 255.0)
}

/// Frame timer with a rolling average over the last `window` frames
pub struct FrameTimer {
    frame_times: VecDeque<Duration>,
    last_frame: Instant,
    window: usize,
}

impl FrameTimer {
    pub fn new(window: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(window),
            last_frame: Instant::now(),
            window: window.max(1),
        }
    }

    /// Record a frame boundary. Returns (delta seconds, average fps).
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        self.record(dt);
        (dt.as_secs_f32(), self.avg_fps())
    }

    fn record(&mut self, dt: Duration) {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.window {
            self.frame_times.pop_front();
        }
    }

    fn avg_secs(&self) -> f32 {
        let total: Duration = self.frame_times.iter().sum();
        total.as_secs_f32() / self.frame_times.len().max(1) as f32
    }

    pub fn avg_fps(&self) -> f32 {
        let avg = self.avg_secs();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_secs() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv(0.0, 1.0, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(hsv(120.0, 1.0, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(hsv(240.0, 1.0, 1.0), Color::rgb(0, 0, 255));
        assert_eq!(hsv(-120.0, 1.0, 1.0), Color::rgb(0, 0, 255));
        assert_eq!(hsv(42.0, 0.0, 1.0), Color::WHITE);
    }

    #[test]
    fn test_rolling_window() {
        let mut t = FrameTimer::new(2);
        assert_eq!(t.avg_fps(), 0.0);
        t.record(Duration::from_millis(100));
        t.record(Duration::from_millis(20));
        t.record(Duration::from_millis(20));
        assert!((t.avg_frame_time_ms() - 20.0).abs() < 0.01);
        assert!((t.avg_fps() - 50.0).abs() < 0.1);
    }
}
