use log::{info, warn};
use retrosim::display::{Display, InputEvent, MouseButtonKind, RenderTarget};
use retrosim::palette::PRESETS;
use retrosim::util::{hsv, FrameTimer};
use retrosim::{
    flatten, Color, Config, Image, Palette, Point, ReduceMode, Renderable, ScrollingSprite,
    Sprite, Surface, TextAlign,
};
use sdl2::keyboard::Keycode;

const REDUCE_MODES: &[&str] = &[
    "palette-fs",
    "palette-sierra",
    "palette",
    "8bit-fs",
    "12bit",
    "mono-fs",
    "truecolor",
];

struct Args {
    config: Option<String>,
    resolution: Option<(u32, u32)>,
    window: Option<(u32, u32)>,
    vsync: bool,
}

fn parse_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        resolution: None,
        window: None,
        vsync: true,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => parsed.vsync = false,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    parsed.resolution = parse_size(&args[i + 1]);
                    i += 1;
                }
            },
            "--window" | "-w" => {
                if i + 1 < args.len() {
                    parsed.window = parse_size(&args[i + 1]);
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: retrosim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config PATH, -c PATH    Load settings from a JSON file");
                println!("  --resolution WxH, -r WxH  Logical resolution (e.g., 320x200)");
                println!("  --window WxH, -w WxH      Window size (e.g., 960x600)");
                println!("  --no-vsync                Disable VSync for uncapped framerate");
                println!("  --help                    Show this help message");
                std::process::exit(0);
            },
            other => warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    parsed
}

/// Horizontal hue sweep fading to black, used to show color reduction
fn gradient(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let c = hsv(
                x as f32 * 360.0 / width as f32,
                1.0,
                1.0 - y as f32 / height as f32,
            );
            img.set_pixel(x, y, c.r, c.g, c.b, 255);
        }
    }
    img
}

/// Two-frame blinking stripe for the scrolling sprite
fn stripe_sprite(width: u32) -> Sprite {
    let mut a = Image::new(width, 4);
    let mut b = Image::new(width, 4);
    for x in 0..width {
        let c = hsv(x as f32 * 360.0 / width as f32, 0.8, 1.0);
        for y in 0..4 {
            if (x / 4) % 2 == 0 {
                a.set_pixel(x, y, c.r, c.g, c.b, 255);
            } else {
                b.set_pixel(x, y, c.r, c.g, c.b, 255);
            }
        }
    }
    Sprite::new(vec![a, b])
}

fn draw_scene(surface: &mut Surface, mode: ReduceMode, mode_name: &str, palette_name: &str) {
    let (w, h) = surface.resolution();
    let (w, h) = (w as i32, h as i32);

    surface.set_auto_commit(false);
    surface.set_background_index(0).clear();

    surface.draw_image(&gradient(96, 64), 8, 8, None, Some(mode));

    surface.set_pen_index(1).set_fill_index(-1);
    surface.rect(4, 4, 104, 72);
    surface.set_pen_index(2).line(0, h - 1, w - 1, h - 1);

    surface.set_pen_index(3).set_fill_index(4);
    surface.circle(140, 40, 24);
    surface.set_fill_index(-1).set_pen_index(5);
    surface.ellipse(200, 40, 32, 16);
    surface.set_pen_index(6).arc(260, 40, 20, 0.0, std::f64::consts::PI, false);

    let mut star = Vec::new();
    for i in 0..10 {
        let angle = i as f32 * std::f32::consts::PI / 5.0;
        let r = if i % 2 == 0 { 22.0 } else { 9.0 };
        let mut p = Point::new(150, 110);
        p.translate(angle.cos() * r, angle.sin() * r);
        star.push(p);
    }
    surface.set_pen_index(7).polygon(&flatten(&star));

    surface.set_pen_index(8);
    surface.curve_bezier(190.0, 130.0, 210.0, 80.0, 250.0, 140.0, 280.0, 90.0);
    let wave = [20, 150, 50, 120, 80, 160, 110, 130];
    surface.curve_cardinal(&wave, retrosim::display::DEFAULT_TENSION);

    surface.set_pen_index(1);
    if let Err(e) = surface.text(&format!("{} {}", palette_name, mode_name), 4, h - 10) {
        warn!("text: {}", e);
    }
    surface.set_text_align(TextAlign::Right);
    if let Err(e) = surface.text("CLICK TO FILL", w - 4, h - 10) {
        warn!("text: {}", e);
    }
    surface.set_text_align(TextAlign::Left);

    surface.commit(false);
    surface.set_auto_commit(true);
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = parse_args();

    let mut config = match &args.config {
        Some(path) => Config::load(path).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            Config::default()
        }),
        None => Config::default(),
    };
    if let Some((w, h)) = args.resolution {
        config.width = w;
        config.height = h;
    }
    if let Some((w, h)) = args.window {
        config.window_width = w;
        config.window_height = h;
    }
    config.vsync = config.vsync && args.vsync;

    let mut surface = config.build_surface().map_err(|e| e.to_string())?;
    if surface.palette().is_none() {
        surface.set_palette(Palette::named("C64").ok());
    }
    if surface.font().is_none() {
        surface
            .set_font(retrosim::display::BUILTIN_ID)
            .map_err(|e| e.to_string())?;
    }

    let (mut display, texture_creator) = Display::with_options(
        "retrosim",
        config.window_width,
        config.window_height,
        config.vsync,
    )?;
    let mut target = RenderTarget::for_surface(&texture_creator, &surface)?;

    let mut timer = FrameTimer::new(60);
    let mut show_fps = false;
    let mut palette_idx = 6;
    let mut mode_idx = 0;
    let mut backdrop = ScrollingSprite::with_step(stripe_sprite(surface.resolution().0), 2);

    let (w, h) = surface.resolution();
    println!("=== retrosim ===");
    println!("Resolution: {}x{} in a {}x{} window", w, h, config.window_width, config.window_height);
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  P          - Cycle palettes");
    println!("  M          - Cycle reduce modes");
    println!("  X          - Toggle XOR pen");
    println!("  Arrows     - Scroll the picture");
    println!("  Left click - Bucket fill");
    println!("  Right click- Redraw");
    println!("  F          - Toggle FPS display");
    println!("  Escape     - Quit");

    let mut redraw = true;
    'main: loop {
        let (_dt, avg_fps) = timer.tick();

        match surface.poll_fonts() {
            Ok(0) => {},
            Ok(n) => info!("{} font load(s) finished", n),
            Err(e) => warn!("font: {}", e),
        }

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::P => {
                        palette_idx = (palette_idx + 1) % PRESETS.len();
                        surface.set_palette(Palette::named(PRESETS[palette_idx]).ok());
                        redraw = true;
                    },
                    Keycode::M => {
                        mode_idx = (mode_idx + 1) % REDUCE_MODES.len();
                        redraw = true;
                    },
                    Keycode::X => {
                        let xor = !surface.xor_mode();
                        surface.set_xor_mode(xor);
                    },
                    Keycode::F => show_fps = !show_fps,
                    Keycode::Left => {
                        surface.scroll(-4, 0, false);
                    },
                    Keycode::Right => {
                        surface.scroll(4, 0, false);
                    },
                    Keycode::Up => {
                        surface.scroll(0, -4, true);
                    },
                    Keycode::Down => {
                        surface.scroll(0, 4, true);
                    },
                    _ => {},
                },
                InputEvent::MouseDown { x, y, button } => {
                    let (lx, ly) = surface.map_to_logical(x, y);
                    match button {
                        MouseButtonKind::Left => {
                            let next = (surface.fill_index() + 1).max(2);
                            let len = surface.palette().map_or(2, Palette::len) as i32;
                            surface.set_fill_index(next % len).bucket_fill(lx, ly);
                        },
                        MouseButtonKind::Right => redraw = true,
                        MouseButtonKind::Middle => {
                            surface.set_pen_color(Some(Color::WHITE)).set_pixel(lx, ly);
                        },
                    }
                },
                _ => {},
            }
        }

        if redraw {
            let palette_name = surface
                .palette()
                .map_or("TRUECOLOR", Palette::name)
                .to_string();
            let mode_name = REDUCE_MODES[mode_idx];
            draw_scene(&mut surface, ReduceMode::parse(mode_name), mode_name, &palette_name);
            redraw = false;
        }

        let band_y = surface.resolution().1 as i32 - 18;
        surface.set_auto_commit(false);
        surface.clear_rect(0, band_y, surface.resolution().0 as i32, 4);
        backdrop.render(&mut surface, 0, band_y);
        backdrop.update();

        if show_fps {
            let fps_text = format!("{} FPS {}MS", avg_fps as u32, timer.avg_frame_time_ms() as u32);
            surface.clear_rect(0, 0, 8 * 12, 8);
            surface.set_pen_index(1);
            if let Err(e) = surface.text(&fps_text, 0, 0) {
                warn!("text: {}", e);
            }
        }
        surface.commit(false);
        surface.set_auto_commit(true);

        display.present(&mut target, &surface)?;
    }

    Ok(())
}
