//! Bitmap fonts
//!
//! A font is a single horizontal strip of fixed-size glyph cells sliced out
//! of a sprite sheet. Only the foreground pixels of the sheet survive
//! (opaque black, or opaque white for inverted sheets); at draw time they are
//! tinted with the pen color. Each font keeps its own tinted copy and only
//! re-tints when the pen changes.

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use log::{debug, warn};
use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

use super::pixel_buffer::PixelBuffer;
use super::surface::Surface;
use crate::error::{Result, RetroError};
use crate::image::Image;

/// Called with the font id once a font is registered
pub type FontCallback = Box<dyn FnOnce(&str)>;
/// Called when a font sheet fails to load
pub type FontErrorCallback = Box<dyn FnOnce(&RetroError)>;

// ============================================================================
// Alignment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(TextAlign::Left),
            "center" | "middle" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            _ => Err(format!("unknown text align '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl FromStr for TextBaseline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(TextBaseline::Top),
            "center" | "middle" => Ok(TextBaseline::Middle),
            "bottom" => Ok(TextBaseline::Bottom),
            _ => Err(format!("unknown text baseline '{}'", s)),
        }
    }
}

// ============================================================================
// Font description
// ============================================================================

/// Where a font sheet comes from
#[derive(Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Already decoded; registered immediately
    Bitmap(Image),
    /// BMP file decoded on a loader thread
    Path(PathBuf),
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Bitmap(img) => write!(f, "Bitmap({}x{})", img.width(), img.height()),
            FontSource::Path(p) => write!(f, "Path({})", p.display()),
        }
    }
}

impl Serialize for FontSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FontSource::Path(p) => serializer.serialize_str(&p.to_string_lossy()),
            FontSource::Bitmap(_) => Err(S::Error::custom(
                "in-memory font bitmaps cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for FontSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        PathBuf::deserialize(deserializer).map(FontSource::Path)
    }
}

/// A font to register: cell size, the characters in sheet order, and the
/// sheet itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub id: String,
    pub char_width: u32,
    pub char_height: u32,
    pub map: String,
    #[serde(rename = "url")]
    pub source: FontSource,
    #[serde(default)]
    pub invert: bool,
}

/// Everything about a font except its pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FontLayout {
    pub(crate) id: String,
    pub(crate) char_width: u32,
    pub(crate) char_height: u32,
    pub(crate) map: Vec<char>,
    pub(crate) invert: bool,
}

impl FontSpec {
    fn validate(&self) -> Result<FontLayout> {
        if self.id.is_empty() {
            return Err(RetroError::InvalidFontSpec("empty font id".to_string()));
        }
        if self.map.is_empty() {
            return Err(RetroError::InvalidFontSpec(format!(
                "font '{}' has an empty character map",
                self.id
            )));
        }
        if self.char_width == 0 || self.char_height == 0 {
            return Err(RetroError::InvalidFontSpec(format!(
                "font '{}' has a zero-sized cell",
                self.id
            )));
        }
        Ok(FontLayout {
            id: self.id.clone(),
            char_width: self.char_width,
            char_height: self.char_height,
            map: self.map.chars().collect(),
            invert: self.invert,
        })
    }
}

/// A path load waiting on the loader thread
pub(crate) struct PendingFont {
    pub(crate) layout: FontLayout,
    pub(crate) on_success: Option<FontCallback>,
    pub(crate) on_error: Option<FontErrorCallback>,
}

// ============================================================================
// Font
// ============================================================================

pub struct Font {
    layout: FontLayout,
    /// Foreground cells of the strip, row-major
    mask: Vec<bool>,
    /// The strip tinted with `tint`
    tinted: PixelBuffer,
    tint: Option<u32>,
}

impl Font {
    fn from_image(layout: FontLayout, img: &Image) -> Self {
        let w = layout.char_width;
        let h = layout.char_height;
        let strip_w = w * layout.map.len() as u32;
        let fg = if layout.invert { 255 } else { 0 };

        let mut mask = vec![false; (strip_w * h) as usize];
        let (mut ix, mut iy) = (0u32, 0u32);
        for glyph in 0..layout.map.len() as u32 {
            for y in 0..h {
                for x in 0..w {
                    let opaque_fg = img
                        .pixel((ix + x) as i32, (iy + y) as i32)
                        .is_some_and(|(r, g, b, a)| a == 255 && r == fg && g == fg && b == fg);
                    if opaque_fg {
                        mask[(y * strip_w + glyph * w + x) as usize] = true;
                    }
                }
            }

            ix += w;
            if ix >= img.width() {
                ix = 0;
                iy += h;
            }
        }

        Self {
            layout,
            mask,
            tinted: PixelBuffer::with_size(strip_w, h),
            tint: None,
        }
    }

    /// Embedded 5x7 font in 6x8 cells: digits, letters (either case maps to
    /// the same glyph) and common punctuation
    pub fn builtin() -> Self {
        let mut chars = Vec::new();
        let mut rows = Vec::new();
        for &(c, glyph) in BUILTIN_GLYPHS {
            chars.push(c);
            rows.push(glyph);
            if c.is_ascii_uppercase() {
                chars.push(c.to_ascii_lowercase());
                rows.push(glyph);
            }
        }

        let (cw, ch) = (BUILTIN_CELL.0, BUILTIN_CELL.1);
        let mut img = Image::new(cw * chars.len() as u32, ch);
        for (i, glyph) in rows.iter().enumerate() {
            for (y, bits) in glyph.iter().enumerate() {
                for x in 0..5u32 {
                    if bits & (0x10 >> x) != 0 {
                        img.set_pixel(i as u32 * cw + x, y as u32, 0, 0, 0, 255);
                    }
                }
            }
        }

        let layout = FontLayout {
            id: BUILTIN_ID.to_string(),
            char_width: cw,
            char_height: ch,
            map: chars,
            invert: false,
        };
        Self::from_image(layout, &img)
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.layout.id
    }

    /// Cell size in pixels
    #[inline]
    pub fn char_size(&self) -> (u32, u32) {
        (self.layout.char_width, self.layout.char_height)
    }

    /// Strip index of a character
    #[inline]
    pub fn glyph_index(&self, c: char) -> Option<usize> {
        self.layout.map.iter().position(|&m| m == c)
    }

    /// The strip tinted with `pen`, re-tinting only when the pen changed
    fn tinted(&mut self, pen: u32) -> &PixelBuffer {
        if self.tint != Some(pen) {
            for (dst, &fg) in self.tinted.pixels_mut().iter_mut().zip(&self.mask) {
                *dst = if fg { pen } else { 0 };
            }
            self.tint = Some(pen);
        }
        &self.tinted
    }
}

pub const BUILTIN_ID: &str = "builtin";
const BUILTIN_CELL: (u32, u32) = (6, 8);

#[rustfmt::skip]
const BUILTIN_GLYPHS: &[(char, [u8; 7])] = &[
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04]),
    ('"', [0x0a, 0x0a, 0x0a, 0x00, 0x00, 0x00, 0x00]),
    ('#', [0x0a, 0x0a, 0x1f, 0x0a, 0x1f, 0x0a, 0x0a]),
    ('%', [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03]),
    ('\'', [0x0c, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('*', [0x00, 0x04, 0x15, 0x0e, 0x15, 0x04, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1f, 0x04, 0x04, 0x00]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x0c, 0x04, 0x08]),
    ('-', [0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x0c]),
    ('/', [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00]),
    ('0', [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e]),
    ('1', [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('2', [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f]),
    ('3', [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e]),
    ('4', [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02]),
    ('5', [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e]),
    ('6', [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e]),
    ('7', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e]),
    ('9', [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c]),
    (':', [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x0c, 0x00]),
    (';', [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x04, 0x08]),
    ('<', [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02]),
    ('=', [0x00, 0x00, 0x1f, 0x00, 0x1f, 0x00, 0x00]),
    ('>', [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08]),
    ('?', [0x0e, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('A', [0x0e, 0x11, 0x11, 0x11, 0x1f, 0x11, 0x11]),
    ('B', [0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e]),
    ('C', [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e]),
    ('D', [0x1c, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1c]),
    ('E', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f]),
    ('F', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10]),
    ('G', [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0f]),
    ('H', [0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('I', [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0c]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f]),
    ('M', [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('P', [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10]),
    ('Q', [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d]),
    ('R', [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11]),
    ('S', [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e]),
    ('T', [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a]),
    ('X', [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0a, 0x04, 0x04, 0x04]),
    ('Z', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1f]),
];

// ============================================================================
// Batch completion
// ============================================================================

/// Counts down the fonts of one `add_fonts` batch
struct Latch {
    remaining: usize,
    on_done: Option<Box<dyn FnOnce()>>,
}

impl Latch {
    fn count_down(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            if let Some(done) = self.on_done.take() {
                done();
            }
        }
    }
}

// ============================================================================
// Surface text API
// ============================================================================

impl Surface {
    fn check_font_id(&self, id: &str) -> Result<()> {
        if self.fonts.contains_key(id) || self.loader.is_loading(id) {
            return Err(RetroError::DuplicateFontId(id.to_string()));
        }
        Ok(())
    }

    fn register_font(&mut self, font: Font) -> String {
        let id = font.id().to_string();
        debug!(
            "font '{}' registered ({} glyphs, {}x{})",
            id,
            font.layout.map.len(),
            font.layout.char_width,
            font.layout.char_height
        );
        self.fonts.insert(id.clone(), font);
        id
    }

    /// Register a font. Bitmap sources are registered before this returns;
    /// path sources load in the background and finish through
    /// [`Surface::poll_fonts`] or [`Surface::finish_font_loads`].
    ///
    /// Malformed specs and duplicate ids fail immediately, without calling
    /// either callback.
    pub fn add_font(
        &mut self,
        spec: FontSpec,
        on_success: Option<FontCallback>,
        on_error: Option<FontErrorCallback>,
    ) -> Result<()> {
        let layout = spec.validate()?;
        self.check_font_id(&layout.id)?;

        match spec.source {
            FontSource::Bitmap(img) => {
                let id = self.register_font(Font::from_image(layout, &img));
                if let Some(cb) = on_success {
                    cb(&id);
                }
            },
            FontSource::Path(path) => {
                self.loader.submit(
                    path,
                    PendingFont {
                        layout,
                        on_success,
                        on_error,
                    },
                );
            },
        }
        Ok(())
    }

    /// Register several fonts; `on_done` runs once every font of the batch
    /// has either loaded or failed into `on_error`. Without `on_error` a
    /// failed font keeps the batch from completing.
    ///
    /// The whole batch is validated before anything is registered.
    pub fn add_fonts(
        &mut self,
        specs: Vec<FontSpec>,
        on_done: Option<Box<dyn FnOnce()>>,
        on_error: Option<Box<dyn FnMut(&RetroError)>>,
    ) -> Result<()> {
        let mut seen = Vec::with_capacity(specs.len());
        for spec in &specs {
            let layout = spec.validate()?;
            self.check_font_id(&layout.id)?;
            if seen.contains(&layout.id) {
                return Err(RetroError::DuplicateFontId(layout.id));
            }
            seen.push(layout.id);
        }

        let latch = Rc::new(RefCell::new(Latch {
            remaining: specs.len(),
            on_done,
        }));
        if specs.is_empty() {
            latch.borrow_mut().count_down();
            return Ok(());
        }
        let on_error = on_error.map(|cb| Rc::new(RefCell::new(cb)));

        for spec in specs {
            let done = Rc::clone(&latch);
            let success: FontCallback = Box::new(move |_: &str| done.borrow_mut().count_down());

            let failure = on_error.as_ref().map(|cb| {
                let cb = Rc::clone(cb);
                let done = Rc::clone(&latch);
                Box::new(move |e: &RetroError| {
                    (*cb.borrow_mut())(e);
                    done.borrow_mut().count_down();
                }) as FontErrorCallback
            });

            self.add_font(spec, Some(success), failure)?;
        }
        Ok(())
    }

    fn complete_font_load(&mut self, job: PendingFont, result: Result<Image>) -> Result<()> {
        match result {
            Ok(img) => {
                let id = self.register_font(Font::from_image(job.layout, &img));
                if let Some(cb) = job.on_success {
                    cb(&id);
                }
                Ok(())
            },
            Err(e) => {
                warn!("font '{}' failed to load: {}", job.layout.id, e);
                match job.on_error {
                    Some(cb) => {
                        cb(&e);
                        Ok(())
                    },
                    None => Err(e),
                }
            },
        }
    }

    /// Register every background load that has finished, without blocking.
    /// Returns the number of loads still pending, or the first failure that
    /// had no error callback.
    pub fn poll_fonts(&mut self) -> Result<usize> {
        let mut first_err = None;
        for (job, result) in self.loader.poll() {
            if let Err(e) = self.complete_font_load(job, result) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(self.loader.pending()),
        }
    }

    /// Block until every background load has finished
    pub fn finish_font_loads(&mut self) -> Result<()> {
        let mut first_err = None;
        while let Some((job, result)) = self.loader.wait() {
            if let Err(e) = self.complete_font_load(job, result) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Select a registered font for `text`
    pub fn set_font(&mut self, id: &str) -> Result<&mut Self> {
        if !self.fonts.contains_key(id) {
            return Err(RetroError::UnknownFont(id.to_string()));
        }
        self.current_font = Some(id.to_string());
        Ok(self)
    }

    /// Current font id
    pub fn font(&self) -> Option<&str> {
        self.current_font.as_deref()
    }

    /// Ids of all registered fonts
    pub fn font_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fonts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn set_text_align(&mut self, align: TextAlign) -> &mut Self {
        self.text_align = align;
        self
    }

    pub fn text_align(&self) -> TextAlign {
        self.text_align
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) -> &mut Self {
        self.text_baseline = baseline;
        self
    }

    pub fn text_baseline(&self) -> TextBaseline {
        self.text_baseline
    }

    /// Size of `txt` in the current font; (0, 0) without one
    pub fn measure_text(&self, txt: &str) -> (u32, u32) {
        match self.current_font.as_ref().and_then(|id| self.fonts.get(id)) {
            Some(font) => {
                let (cw, ch) = font.char_size();
                (txt.chars().count() as u32 * cw, ch)
            },
            None => (0, 0),
        }
    }

    /// Top-left corner of `txt` after translation, alignment and baseline
    fn text_origin(&self, txt: &str, x: i32, y: i32) -> (i32, i32) {
        let (w, h) = self.measure_text(txt);
        let (mut x, mut y) = self.translated(x, y);

        match self.text_align {
            TextAlign::Left => {},
            TextAlign::Center => x = x.saturating_sub((w as f64 * 0.5 + 0.5) as i32),
            TextAlign::Right => x = x.saturating_sub(w as i32),
        }
        match self.text_baseline {
            TextBaseline::Top => {},
            TextBaseline::Middle => y = y.saturating_sub((h as f64 * 0.5 + 0.5) as i32),
            TextBaseline::Bottom => y = y.saturating_sub(h as i32),
        }
        (x, y)
    }

    /// Draw `txt` in the current font and pen color over a fill-colored box.
    /// Characters missing from the font's map leave a gap.
    pub fn text(&mut self, txt: &str, x: i32, y: i32) -> Result<&mut Self> {
        let Some(font_id) = self.current_font.clone() else {
            return Err(RetroError::NoFontSet);
        };
        if txt.is_empty() {
            return Ok(self);
        }

        let (x, y) = self.text_origin(txt, x, y);
        let len = txt.chars().count() as i32;
        let res_x = self.buffer.width() as i32;

        let Some(font) = self.fonts.get_mut(&font_id) else {
            return Err(RetroError::UnknownFont(font_id));
        };
        let (w, h) = font.char_size();
        let (w, h) = (w as i32, h as i32);

        if let Some(fill) = self.fill {
            self.native
                .fill_rect(x, y, len.saturating_mul(w), h, fill);
        }

        if let Some(pen) = self.pen {
            let last_x = res_x - w;
            let glyphs: Vec<Option<usize>> = txt.chars().map(|c| font.glyph_index(c)).collect();
            let strip = font.tinted(pen);
            for (i, glyph) in glyphs.into_iter().enumerate() {
                let tx = x.saturating_add((i as i32).saturating_mul(w));
                if let Some(gi) = glyph {
                    if tx >= -w {
                        self.native
                            .overlay_rect(strip, gi as i32 * w, 0, w, h, tx, y);
                    }
                }
                if tx >= last_x {
                    break;
                }
            }
        }

        let y1 = y.max(0) as u32;
        let y2 = y.saturating_add(h).max(0) as u32;
        self.buffer.merge_rows(&self.native, y1, y2);
        self.native.clear();
        self.maybe_commit();
        Ok(self)
    }
}
