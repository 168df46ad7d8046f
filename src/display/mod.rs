//! Drawing surface and SDL2 presentation
//!
//! Everything that writes pixels lives under this module: the packed pixel
//! buffers, the `Surface` with its drawing state, and the rasterizer, flood
//! fill, color reducer and bitmap font as further `impl Surface` blocks.
//! `Display` and `RenderTarget` put a surface's destination buffer on screen.

mod flood;
mod font;
mod loader;
mod pixel_buffer;
mod raster;
mod reduce;
mod surface;

pub use font::{
    Font, FontCallback, FontErrorCallback, FontSource, FontSpec, TextAlign, TextBaseline,
    BUILTIN_ID,
};
pub use pixel_buffer::PixelBuffer;
pub use raster::DEFAULT_TENSION;
pub use reduce::{reduce_image, Ditherer, Quantizer, ReduceMode};
pub use surface::Surface;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::{self, PixelFormatEnum};
use sdl2::render::{BlendMode, Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use crate::color::PixelFormat;

pub const DEFAULT_WIDTH: u32 = 960;
pub const DEFAULT_HEIGHT: u32 = 600;

/// SDL2 texture format describing packed pixels of `format`
pub fn texture_format(format: PixelFormat) -> PixelFormatEnum {
    match format {
        PixelFormat::Lsb => PixelFormatEnum::ABGR8888,
        PixelFormat::Msb => PixelFormatEnum::RGBA8888,
    }
}

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

/// Streaming texture the size of a surface's destination buffer
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
    KeyUp(Keycode),
    /// Positions are in window (destination) coordinates
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseDown {
        x: i32,
        y: i32,
        button: MouseButtonKind,
    },
    MouseUp {
        x: i32,
        y: i32,
        button: MouseButtonKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonKind {
    Left,
    Right,
    Middle,
}

impl Display {
    /// Create a window of the default size with VSync enabled
    pub fn new(title: &str) -> Result<(Self, TextureCreator<WindowContext>), String> {
        Self::with_options(title, DEFAULT_WIDTH, DEFAULT_HEIGHT, true)
    }

    /// Create a window of the given size.
    /// vsync=false leaves the frame rate uncapped.
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Upload the surface's destination buffer and show it over the
    /// surface's background color
    pub fn present(&mut self, target: &mut RenderTarget, surface: &Surface) -> Result<(), String> {
        let dest = surface.destination();
        if dest.width() != target.width || dest.height() != target.height {
            return Err(format!(
                "render target is {}x{}, destination is {}x{}",
                target.width,
                target.height,
                dest.width(),
                dest.height()
            ));
        }

        target.bytes.clear();
        target
            .bytes
            .extend(dest.pixels().iter().flat_map(|p| p.to_ne_bytes()));
        target
            .texture
            .update(None, &target.bytes, (dest.width() * 4) as usize)
            .map_err(|e| e.to_string())?;

        let bg = surface.background_color().unwrap_or_default();
        self.canvas
            .set_draw_color(pixels::Color::RGB(bg.r, bg.g, bg.b));
        self.canvas.clear();
        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                Event::KeyUp {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyUp(k)),
                Event::MouseMotion { x, y, .. } => events.push(InputEvent::MouseMove { x, y }),
                Event::MouseButtonDown {
                    x, y, mouse_btn, ..
                } => {
                    if let Some(button) = map_mouse_button(mouse_btn) {
                        events.push(InputEvent::MouseDown { x, y, button });
                    }
                },
                Event::MouseButtonUp {
                    x, y, mouse_btn, ..
                } => {
                    if let Some(button) = map_mouse_button(mouse_btn) {
                        events.push(InputEvent::MouseUp { x, y, button });
                    }
                },
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    /// Streaming texture matching the surface's destination size and format
    pub fn for_surface(
        texture_creator: &'a TextureCreator<WindowContext>,
        surface: &Surface,
    ) -> Result<Self, String> {
        let dest = surface.destination();
        let (width, height) = (dest.width(), dest.height());
        let mut texture = texture_creator
            .create_texture_streaming(texture_format(surface.format()), width, height)
            .map_err(|e| e.to_string())?;
        texture.set_blend_mode(BlendMode::Blend);
        Ok(Self {
            texture,
            bytes: Vec::with_capacity((width * height * 4) as usize),
            width,
            height,
        })
    }
}

fn map_mouse_button(btn: MouseButton) -> Option<MouseButtonKind> {
    match btn {
        MouseButton::Left => Some(MouseButtonKind::Left),
        MouseButton::Right => Some(MouseButtonKind::Right),
        MouseButton::Middle => Some(MouseButtonKind::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_format_matches_memory_order() {
        // Both layouts keep R, G, B, A in memory when stored natively
        let lsb = PixelFormat::Lsb.pack_rgba(1, 2, 3, 4);
        assert_eq!(lsb.to_le_bytes(), [1, 2, 3, 4]);
        assert_eq!(texture_format(PixelFormat::Lsb), PixelFormatEnum::ABGR8888);

        let msb = PixelFormat::Msb.pack_rgba(1, 2, 3, 4);
        assert_eq!(msb.to_be_bytes(), [1, 2, 3, 4]);
        assert_eq!(texture_format(PixelFormat::Msb), PixelFormatEnum::RGBA8888);
    }

    #[test]
    fn test_map_mouse_button() {
        assert_eq!(map_mouse_button(MouseButton::Left), Some(MouseButtonKind::Left));
        assert_eq!(map_mouse_button(MouseButton::X1), None);
    }
}
