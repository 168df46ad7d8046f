//! Frame-animated sprites drawn through a surface

use crate::display::Surface;
use crate::image::Image;

/// Anything drawn once per frame and advanced between frames
pub trait Renderable {
    /// Draw at (x, y) in surface coordinates
    fn render(&self, surface: &mut Surface, x: i32, y: i32);

    /// Advance to the next frame
    fn update(&mut self);
}

/// A cycle of images shown one per update
#[derive(Debug, Clone, Default)]
pub struct Sprite {
    frames: Vec<Image>,
    index: usize,
}

impl Sprite {
    pub fn new(frames: Vec<Image>) -> Self {
        Self { frames, index: 0 }
    }

    pub fn push_frame(&mut self, frame: Image) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Image] {
        &self.frames
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Image> {
        self.frames.get(self.index)
    }

    /// Width of the first frame, 0 without frames
    pub fn width(&self) -> u32 {
        self.frames.first().map_or(0, Image::width)
    }
}

impl Renderable for Sprite {
    fn render(&self, surface: &mut Surface, x: i32, y: i32) {
        if let Some(frame) = self.current() {
            surface.draw_image(frame, x, y, None, None);
        }
    }

    fn update(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.index += 1;
        if self.index >= self.frames.len() {
            self.index = 0;
        }
    }
}

/// A sprite repeated horizontally and shifted each update, for endless
/// backdrops
#[derive(Debug, Clone)]
pub struct ScrollingSprite {
    sprite: Sprite,
    offset: i32,
    step: i32,
}

impl ScrollingSprite {
    pub const DEFAULT_STEP: i32 = 10;

    pub fn new(sprite: Sprite) -> Self {
        Self::with_step(sprite, Self::DEFAULT_STEP)
    }

    pub fn with_step(sprite: Sprite, step: i32) -> Self {
        Self {
            sprite,
            offset: 0,
            step,
        }
    }

    #[inline]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }
}

impl Renderable for ScrollingSprite {
    fn render(&self, surface: &mut Surface, x: i32, y: i32) {
        let width = self.sprite.width() as i32;
        self.sprite.render(surface, x + self.offset, y);
        self.sprite.render(surface, x + self.offset - width, y);
    }

    fn update(&mut self) {
        self.offset += self.step;
        if self.offset > self.sprite.width() as i32 {
            self.offset = 0;
        }
        self.sprite.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, PixelFormat};

    fn surface() -> Surface {
        Surface::with_format(32, 8, 32, 8, PixelFormat::Lsb).unwrap()
    }

    #[test]
    fn test_sprite_cycles_frames() {
        let mut s = Sprite::new(vec![
            Image::filled(2, 2, Color::WHITE),
            Image::filled(2, 2, Color::BLACK),
        ]);
        assert_eq!(s.index(), 0);
        s.update();
        assert_eq!(s.index(), 1);
        s.update();
        assert_eq!(s.index(), 0);

        let mut empty = Sprite::default();
        empty.update();
        assert_eq!(empty.index(), 0);
        empty.render(&mut surface(), 0, 0);
    }

    #[test]
    fn test_sprite_renders_current_frame() {
        let red = Color::rgb(255, 0, 0);
        let mut s = Sprite::new(vec![Image::filled(2, 2, Color::WHITE), Image::filled(2, 2, red)]);
        s.update();
        let mut surf = surface();
        s.render(&mut surf, 3, 1);
        assert_eq!(surf.get_pixel_color(4, 2), red);
        assert_eq!(surf.get_pixel(5, 2), (0, 0, 0, 0));
    }

    #[test]
    fn test_scrolling_sprite_wraps_offset() {
        let mut s = ScrollingSprite::with_step(Sprite::new(vec![Image::filled(8, 2, Color::WHITE)]), 5);
        s.update();
        assert_eq!(s.offset(), 5);
        s.update();
        assert_eq!(s.offset(), 0);
    }

    #[test]
    fn test_scrolling_sprite_draws_two_copies() {
        let mut s = ScrollingSprite::with_step(Sprite::new(vec![Image::filled(8, 2, Color::WHITE)]), 4);
        s.update();
        let mut surf = surface();
        s.render(&mut surf, 8, 0);
        // Copies at x 12..20 and 4..12
        assert_eq!(surf.get_pixel_color(4, 0), Color::WHITE);
        assert_eq!(surf.get_pixel_color(19, 1), Color::WHITE);
        assert_eq!(surf.get_pixel(3, 0), (0, 0, 0, 0));
        assert_eq!(surf.get_pixel(20, 0), (0, 0, 0, 0));
    }
}
