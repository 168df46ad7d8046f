use std::cell::Cell;
use std::rc::Rc;

use retrosim::{
    Color, FontSource, FontSpec, Image, Palette, PixelFormat, RetroError, Surface,
};

fn surface(w: u32, h: u32) -> Surface {
    Surface::with_format(w, h, w, h, PixelFormat::Lsb).unwrap()
}

const TRANSPARENT: (u8, u8, u8, u8) = (0, 0, 0, 0);

#[test]
fn test_palette_fill_rect() {
    let mut s = surface(64, 64);
    s.set_palette(Some(Palette::from_rgb(&[vec![0, 0, 0], vec![255, 255, 255]]).unwrap()));
    s.set_fill_index(1);
    s.rect(0, 0, 10, 10);

    assert_eq!(s.get_pixel(5, 5), (255, 255, 255, 255));
    assert_eq!(s.get_pixel_index(5, 5), 1);
    assert_eq!(s.get_pixel(20, 20), TRANSPARENT);
}

/// 8x4 sheet: 'A' is a solid 4x4 block, 'B' only its top-left pixel
fn two_glyph_sheet() -> Image {
    let mut img = Image::filled(8, 4, Color::WHITE);
    for y in 0..4 {
        for x in 0..4 {
            img.set_pixel(x, y, 0, 0, 0, 255);
        }
    }
    img.set_pixel(4, 0, 0, 0, 0, 255);
    img
}

#[test]
fn test_font_skips_unmapped_characters() {
    let mut s = surface(64, 16);
    let loaded = Rc::new(Cell::new(false));
    let flag = Rc::clone(&loaded);
    s.add_font(
        FontSpec {
            id: "f".to_string(),
            char_width: 4,
            char_height: 4,
            map: "AB".to_string(),
            source: FontSource::Bitmap(two_glyph_sheet()),
            invert: false,
        },
        Some(Box::new(move |id: &str| flag.set(id == "f"))),
        None,
    )
    .unwrap();
    assert!(loaded.get());

    s.set_font("f").unwrap();
    s.set_pen_color(Some(Color::rgb(255, 0, 0))).set_fill_color(None);
    s.text("AZB", 0, 0).unwrap();

    // 'A' fills x 0..4
    assert_eq!(s.get_pixel(0, 0), (255, 0, 0, 255));
    assert_eq!(s.get_pixel(3, 3), (255, 0, 0, 255));
    // 'Z' is unmapped and leaves x 4..8 untouched
    for x in 4..8 {
        assert_eq!(s.get_pixel(x, 0), TRANSPARENT);
    }
    // 'B' at x 8
    assert_eq!(s.get_pixel(8, 0), (255, 0, 0, 255));
    assert_eq!(s.get_pixel(9, 0), TRANSPARENT);
    assert_eq!(s.get_pixel(8, 1), TRANSPARENT);
}

#[test]
fn test_text_without_font_fails() {
    let mut s = surface(16, 8);
    assert!(matches!(s.text("A", 0, 0), Err(RetroError::NoFontSet)));
}

#[test]
fn test_bucket_fill_bordered_square() {
    let red = Color::rgb(255, 0, 0);
    let blue = Color::rgb(0, 0, 255);
    let green = Color::rgb(0, 255, 0);

    let mut s = surface(32, 32);
    s.set_pen_color(Some(red)).set_fill_color(Some(blue));
    s.rect(0, 0, 10, 10);
    s.set_fill_color(Some(green)).bucket_fill(5, 5);

    for y in 0..10 {
        for x in 0..10 {
            let border = x == 0 || y == 0 || x == 9 || y == 9;
            let want = if border { red } else { green };
            assert_eq!(s.get_pixel_color(x, y), want, "({}, {})", x, y);
        }
    }
    assert_eq!(s.get_pixel(10, 5), TRANSPARENT);
}

#[test]
fn test_resize_rounds_width_down() {
    let mut s = surface(64, 64);
    assert!(matches!(
        s.resize(5, 10),
        Err(RetroError::InvalidResolution { .. })
    ));
    s.resize(12, 10).unwrap();
    assert_eq!(s.resolution(), (8, 10));
}

#[test]
fn test_commit_is_idempotent() {
    let mut s = Surface::with_format(16, 16, 48, 40, PixelFormat::Lsb).unwrap();
    s.set_auto_commit(false);
    s.circle(8, 8, 5).line(0, 0, 15, 15);
    s.commit(false);
    let first = s.destination().pixels().to_vec();
    s.commit(false);
    assert_eq!(s.destination().pixels(), first.as_slice());
}

#[test]
fn test_line_endpoints_inclusive() {
    let mut s = surface(16, 16);
    s.line(0, 0, 5, 0);
    for x in 0..=5 {
        assert_eq!(s.get_pixel_color(x, 0), Color::WHITE);
    }
    assert_eq!(s.get_pixel(6, 0), TRANSPARENT);

    s.clear().line(0, 0, 0, 5);
    for y in 0..=5 {
        assert_eq!(s.get_pixel_color(0, y), Color::WHITE);
    }
    assert_eq!(s.get_pixel(0, 6), TRANSPARENT);
}

#[test]
fn test_circle_rotational_symmetry() {
    let mut s = surface(24, 24);
    s.set_fill_color(None).circle(10, 10, 5);
    for y in 0..24 {
        for x in 0..24 {
            let (dx, dy) = (x - 10, y - 10);
            let on = s.get_pixel(x, y) != TRANSPARENT;
            let rotated = s.get_pixel(10 - dy, 10 + dx) != TRANSPARENT;
            assert_eq!(on, rotated, "({}, {})", x, y);
        }
    }
}

#[test]
fn test_safe_mode_matches_inside_bounds() {
    let draw = |safe: bool| {
        let mut s = surface(16, 16);
        s.set_safe_mode(safe);
        for i in 0..16 {
            s.set_pixel(i, (i * 7) % 16);
        }
        s.image_data().to_vec()
    };
    assert_eq!(draw(true), draw(false));
}

#[test]
fn test_nearest_index_ties_and_determinism() {
    let p = Palette::from_rgb(&[vec![0, 0, 0], vec![2, 2, 2], vec![255, 255, 255]]).unwrap();
    assert_eq!(p.nearest_index(1, 1, 1), 0);
    for _ in 0..4 {
        assert_eq!(p.nearest_index(200, 180, 250), 2);
    }
}
