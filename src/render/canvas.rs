// src/render/canvas.rs
//! Drawing primitives on an `RgbImage`: clipped rectangles, rounded rectangles, gradients,
//! and a blurred drop shadow. Coordinates are `i32` so shapes may hang off the canvas;
//! rectangle corners are inclusive.

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0 + 1
    }

    pub fn inset(&self, d: i32) -> Rect {
        Rect::new(self.x0 + d, self.y0 + d, self.x1 - d, self.y1 - d)
    }
}

pub fn interpolate_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    Rgb([
        ((1.0 - t) * c1.0[0] as f64 + t * c2.0[0] as f64) as u8,
        ((1.0 - t) * c1.0[1] as f64 + t * c2.0[1] as f64) as u8,
        ((1.0 - t) * c1.0[2] as f64 + t * c2.0[2] as f64) as u8,
    ])
}

/// Mix `color` over the pixel at `(x, y)` with coverage `alpha` (0..=1). Off-canvas is a no-op.
pub fn blend(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 || alpha <= 0.0 {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    if alpha >= 1.0 {
        *px = color;
        return;
    }
    *px = interpolate_color(*px, color, alpha as f64);
}

pub fn fill_rect(img: &mut RgbImage, r: Rect, color: Rgb<u8>) {
    let x0 = r.x0.max(0);
    let y0 = r.y0.max(0);
    let x1 = r.x1.min(img.width() as i32 - 1);
    let y1 = r.y1.min(img.height() as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// One-pixel vertical line at integer `x`.
pub fn vline(img: &mut RgbImage, x: i32, y0: i32, y1: i32, color: Rgb<u8>) {
    fill_rect(img, Rect::new(x, y0.min(y1), x, y0.max(y1)), color);
}

/// One-pixel horizontal line at integer `y`.
pub fn hline(img: &mut RgbImage, x0: i32, x1: i32, y: i32, color: Rgb<u8>) {
    fill_rect(img, Rect::new(x0.min(x1), y, x0.max(x1), y), color);
}

/// Coverage of pixel `(x, y)` by a rounded rectangle, antialiased on the corners only.
fn rounded_coverage(r: &Rect, radius: i32, x: i32, y: i32) -> f32 {
    let rad = radius.min(r.width() / 2).min(r.height() / 2).max(0) as f32;
    let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
    let (left, right) = (r.x0 as f32 + rad, (r.x1 + 1) as f32 - rad);
    let (top, bottom) = (r.y0 as f32 + rad, (r.y1 + 1) as f32 - rad);

    let cx = if fx < left { left } else if fx > right { right } else { return 1.0 };
    let cy = if fy < top { top } else if fy > bottom { bottom } else { return 1.0 };
    let d = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();
    (rad + 0.5 - d).clamp(0.0, 1.0)
}

pub fn fill_rounded_rect(img: &mut RgbImage, r: Rect, radius: i32, color: Rgb<u8>) {
    for y in r.y0..=r.y1 {
        for x in r.x0..=r.x1 {
            let c = rounded_coverage(&r, radius, x, y);
            blend(img, x, y, color, c);
        }
    }
}

/// Filled rounded rectangle with a 1px outline.
pub fn outlined_rounded_rect(img: &mut RgbImage, r: Rect, radius: i32, fill: Rgb<u8>, outline: Rgb<u8>) {
    fill_rounded_rect(img, r, radius, outline);
    fill_rounded_rect(img, r.inset(1), (radius - 1).max(0), fill);
}

/// Left-to-right gradient over `r`.
pub fn horizontal_gradient(img: &mut RgbImage, r: Rect, left: Rgb<u8>, right: Rgb<u8>) {
    let span = (r.width() - 1).max(1) as f64;
    for x in r.x0..=r.x1 {
        let c = interpolate_color(left, right, (x - r.x0) as f64 / span);
        vline(img, x, r.y0, r.y1, c);
    }
}

/// Soft shadow under `r`: the rounded shape is blurred with `sigma` and mixed in at `opacity`.
pub fn drop_shadow(img: &mut RgbImage, r: Rect, radius: i32, sigma: f32, color: Rgb<u8>, opacity: f32) {
    let mut mask = GrayImage::new(img.width(), img.height());
    for y in r.y0.max(0)..=r.y1.min(img.height() as i32 - 1) {
        for x in r.x0.max(0)..=r.x1.min(img.width() as i32 - 1) {
            let c = rounded_coverage(&r, radius, x, y);
            mask.put_pixel(x as u32, y as u32, Luma([(c * 255.0) as u8]));
        }
    }
    let mask = imageops::blur(&mask, sigma);
    for (x, y, m) in mask.enumerate_pixels() {
        let a = m.0[0] as f32 / 255.0 * opacity;
        if a > 0.0 {
            blend(img, x as i32, y as i32, color, a);
        }
    }
}
