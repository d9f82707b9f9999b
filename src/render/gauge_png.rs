// src/render/gauge_png.rs
// Dark gauge card for the Altcoin Season Index: a 0..100 gradient bar, threshold ticks,
// a marker at the current value and the status line underneath.
use image::{Rgb, RgbImage};

use crate::specs::altseason::AltseasonStatus;

use super::canvas::{fill_rect, interpolate_color, vline, Rect};
use super::font::{FontSet, TextMeasure};
use super::{encode_png, RenderError, RenderedPng};

const W: i32 = 900;
const H: i32 = 220;
const PAD: i32 = 20;
const BAR_H: i32 = 36;
const BAR_TOP: i32 = PAD + 52;

const BG: Rgb<u8> = Rgb([18, 18, 22]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const TICK: Rgb<u8> = Rgb([240, 240, 240]);
const TICK_LABEL: Rgb<u8> = Rgb([210, 210, 220]);
const TIP: Rgb<u8> = Rgb([190, 190, 200]);

pub const TICKS: [u8; 3] = [25, 69, 75];

pub fn filename(value: u8) -> String {
    format!("altseason_{value}.png")
}

/// Bar color at position `t` in `[0, 1]`: orange for bitcoin season, grey into cyan on
/// the approach, green for altseason.
pub fn gradient_color(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    if t <= 0.25 {
        let k = t / 0.25;
        Rgb([255, (140.0 + 60.0 * k) as u8, 0])
    } else if t <= 0.69 {
        let k = (t - 0.25) / (0.69 - 0.25);
        interpolate_color(Rgb([220, 220, 220]), Rgb([140, 230, 240]), k)
    } else {
        let k = (t - 0.69) / (1.0 - 0.69);
        interpolate_color(Rgb([140, 230, 140]), Rgb([0, 200, 60]), k)
    }
}

fn x_of(v: u8, left: i32, right: i32) -> i32 {
    left + ((right - left) as f64 * v as f64 / 100.0).round() as i32
}

/// Render the gauge for `value`; anything above 100 is drawn as 100.
pub fn render_gauge(value: u8, fonts: &FontSet) -> Result<RenderedPng, RenderError> {
    let value = value.min(100);
    let f_title = fonts.bold(28.0);
    let f_value = fonts.bold(46.0);
    let f_small = fonts.sans(18.0);

    let mut img = RgbImage::from_pixel(W as u32, H as u32, BG);
    let (left, right) = (PAD, W - PAD);
    let bar_bottom = BAR_TOP + BAR_H;

    f_title.draw(&mut img, PAD, PAD, "Altcoin Season Index", WHITE);
    let v_txt = value.to_string();
    let (vw, _) = f_value.measure(&v_txt);
    f_value.draw(&mut img, right - vw as i32, PAD - 8, &v_txt, WHITE);

    let span = (right - left).max(1) as f64;
    for x in left..=right {
        let c = gradient_color((x - left) as f64 / span);
        vline(&mut img, x, BAR_TOP, bar_bottom, c);
    }

    for t in TICKS {
        let tx = x_of(t, left, right);
        fill_rect(&mut img, Rect::new(tx - 1, BAR_TOP - 6, tx, bar_bottom + 6), TICK);
        let label = t.to_string();
        let (lw, _) = f_small.measure(&label);
        f_small.draw(&mut img, tx - lw as i32 / 2, bar_bottom + 10, &label, TICK_LABEL);
    }

    // range ends sit under the bar, clear of the title
    f_small.draw(&mut img, left, bar_bottom + 10, "0", TICK_LABEL);
    let (ew, _) = f_small.measure("100");
    f_small.draw(&mut img, right - ew as i32, bar_bottom + 10, "100", TICK_LABEL);

    let vx = x_of(value, left, right);
    fill_rect(&mut img, Rect::new(vx - 2, BAR_TOP - 10, vx + 2, bar_bottom + 10), WHITE);

    let status = AltseasonStatus::classify(value);
    f_small.draw(&mut img, PAD, bar_bottom + 54, &format!("Status: {}", status.label()), WHITE);
    f_small.draw(&mut img, PAD, bar_bottom + 82, status.tip(), TIP);

    Ok(RenderedPng { bytes: encode_png(&img)?, filename: filename(value) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_zones() {
        assert_eq!(gradient_color(0.0), Rgb([255, 140, 0]));
        assert_eq!(gradient_color(0.25), Rgb([255, 200, 0]));
        assert_eq!(gradient_color(1.0), Rgb([0, 200, 60]));
        assert!(gradient_color(0.5).0[2] > 200);
    }

    #[test]
    fn gauge_dimensions_and_marker() {
        let png = render_gauge(80, &FontSet::builtin()).unwrap();
        assert_eq!(png.filename, "altseason_80.png");
        let img = image::load_from_memory(&png.bytes).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (900, 220));
        let vx = x_of(80, PAD, W - PAD) as u32;
        assert_eq!(*img.get_pixel(vx, (BAR_TOP - 8) as u32), WHITE);
        assert_eq!(*img.get_pixel(2, 2), BG);
    }

    #[test]
    fn value_is_clamped() {
        let png = render_gauge(250, &FontSet::builtin()).unwrap();
        assert_eq!(png.filename, "altseason_100.png");
    }
}
