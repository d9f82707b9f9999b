// src/render/font.rs
// Text measuring and drawing for the PNG cards. Outline fonts come from the host (first
// candidate file that loads wins); when none load, a tiny built-in 5×7 bitmap font keeps
// the cards readable.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use ab_glyph::{point, Font as _, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};

use crate::config::consts::{FONT_MONO, FONT_SANS, FONT_SANS_BOLD};
use crate::config::options::RenderOptions;

use super::canvas::blend;

/// Advance width and line height of a string, in pixels.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> (u32, u32);
}

#[derive(Clone)]
pub struct FontFace {
    outline: Option<Arc<FontVec>>,
    px: f32,
}

impl FontFace {
    pub fn new(outline: Option<Arc<FontVec>>, px: f32) -> Self {
        Self { outline, px }
    }

    pub fn builtin(px: f32) -> Self {
        Self { outline: None, px }
    }

    pub fn is_builtin(&self) -> bool {
        self.outline.is_none()
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match &self.outline {
            Some(font) => draw_outline(font, self.px, img, x, y, text, color),
            None => draw_bitmap(bitmap_scale(self.px), img, x, y, text, color),
        }
    }
}

impl TextMeasure for FontFace {
    fn measure(&self, text: &str) -> (u32, u32) {
        match &self.outline {
            Some(font) => {
                let sf = font.as_scaled(PxScale::from(self.px));
                let mut w = 0.0f32;
                let mut prev = None;
                for ch in text.chars() {
                    let id = sf.glyph_id(ch);
                    if let Some(p) = prev {
                        w += sf.kern(p, id);
                    }
                    w += sf.h_advance(id);
                    prev = Some(id);
                }
                (w.ceil() as u32, (sf.ascent() - sf.descent()).ceil() as u32)
            }
            None => {
                let s = bitmap_scale(self.px);
                let n = text.chars().count() as u32;
                (n * (GLYPH_W + 1) * s, GLYPH_H * s)
            }
        }
    }
}

fn draw_outline(font: &FontVec, px: f32, img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let sf = font.as_scaled(PxScale::from(px));
    let mut caret = x as f32;
    let baseline = y as f32 + sf.ascent();
    let mut prev = None;

    for ch in text.chars() {
        let mut glyph = sf.scaled_glyph(ch);
        if let Some(p) = prev {
            caret += sf.kern(p, glyph.id);
        }
        glyph.position = point(caret, baseline);
        caret += sf.h_advance(glyph.id);
        prev = Some(glyph.id);

        if let Some(og) = font.outline_glyph(glyph) {
            let b = og.px_bounds();
            og.draw(|gx, gy, c| {
                blend(img, b.min.x as i32 + gx as i32, b.min.y as i32 + gy as i32, color, c);
            });
        }
    }
}

/* ---------------- loading ---------------- */

fn load_first<I, P>(paths: I) -> Option<Arc<FontVec>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for p in paths {
        let p = p.as_ref();
        let Ok(bytes) = fs::read(p) else { continue };
        match FontVec::try_from_vec(bytes) {
            Ok(f) => {
                logd!("font: {}", p.display());
                return Some(Arc::new(f));
            }
            Err(e) => logw!("font {}: {e}", p.display()),
        }
    }
    None
}

fn family(over: &Option<PathBuf>, defaults: &[&str]) -> Option<Arc<FontVec>> {
    let candidates = over.iter().cloned().chain(defaults.iter().map(PathBuf::from));
    load_first(candidates)
}

/// Regular, bold and monospace families resolved once per render.
#[derive(Clone)]
pub struct FontSet {
    sans: Option<Arc<FontVec>>,
    bold: Option<Arc<FontVec>>,
    mono: Option<Arc<FontVec>>,
}

impl FontSet {
    pub fn load(opts: &RenderOptions) -> Self {
        let sans = family(&opts.font_sans, FONT_SANS);
        let set = Self {
            bold: family(&opts.font_bold, FONT_SANS_BOLD).or_else(|| sans.clone()),
            mono: family(&opts.font_mono, FONT_MONO).or_else(|| sans.clone()),
            sans,
        };
        if set.sans.is_none() {
            logw!("no usable font files found, using the built-in bitmap font");
        }
        set
    }

    /// Bitmap font only; output does not depend on the host.
    pub fn builtin() -> Self {
        Self { sans: None, bold: None, mono: None }
    }

    pub fn sans(&self, px: f32) -> FontFace {
        FontFace::new(self.sans.clone(), px)
    }

    pub fn bold(&self, px: f32) -> FontFace {
        FontFace::new(self.bold.clone(), px)
    }

    pub fn mono(&self, px: f32) -> FontFace {
        FontFace::new(self.mono.clone(), px)
    }
}

/* ---------------- built-in bitmap font ---------------- */

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

/// Integer pixel scale for a nominal font size.
fn bitmap_scale(px: f32) -> u32 {
    ((px / 8.0).round() as u32).max(1)
}

// Rows top to bottom, bit 4 = leftmost column.
const GLYPHS: &[(char, [u8; 7])] = &[
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('A', [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00]),
    ('%', [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03]),
    ('/', [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('?', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F]),
    ('=', [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00]),
    ('\'', [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00]),
    ('#', [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A]),
    ('*', [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00]),
    ('|', [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
];

// hollow box for anything unknown
const MISSING: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

fn glyph_rows(ch: char) -> [u8; 7] {
    let ch = match ch {
        '—' | '–' | '−' => '-',
        '…' => '.',
        '\u{A0}' | '\u{202F}' => ' ',
        c => c.to_ascii_uppercase(),
    };
    GLYPHS.iter().find(|(c, _)| *c == ch).map_or(MISSING, |(_, rows)| *rows)
}

fn draw_bitmap(scale: u32, img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let s = scale as i32;
    let advance = (GLYPH_W as i32 + 1) * s;
    for (i, ch) in text.chars().enumerate() {
        let gx = x + i as i32 * advance;
        for (r, bits) in glyph_rows(ch).iter().enumerate() {
            for c in 0..GLYPH_W as i32 {
                if bits & (0x10 >> c) == 0 {
                    continue;
                }
                for dy in 0..s {
                    for dx in 0..s {
                        blend(img, gx + c * s + dx, y + r as i32 * s + dy, color, 1.0);
                    }
                }
            }
        }
    }
}
