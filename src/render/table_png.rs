// src/render/table_png.rs
// Light-themed card with the indicator's recent releases.
use image::{Rgb, RgbImage};

use crate::specs::calendar::IndicatorRow;

use super::canvas::{drop_shadow, fill_rect, fill_rounded_rect, hline, horizontal_gradient,
                    outlined_rounded_rect, vline, Rect};
use super::font::{FontSet, TextMeasure};
use super::{display_rows, encode_png, RenderError, RenderedPng};

pub const HEADERS: [&str; 5] = ["RELEASE DATE", "TIME", "ACTUAL", "FORECAST", "PREVIOUS"];
pub const FILENAME: &str = "indicator_table.png";

// palette
const BG: Rgb<u8> = Rgb([246, 248, 252]);
const CARD: Rgb<u8> = Rgb([255, 255, 255]);
const SHADOW: Rgb<u8> = Rgb([0, 0, 0]);
const SHADOW_OPACITY: f32 = 0.18;
const GRID: Rgb<u8> = Rgb([225, 230, 238]);
const BORDER: Rgb<u8> = Rgb([214, 221, 232]);
const HEAD_L: Rgb<u8> = Rgb([244, 248, 255]);
const HEAD_R: Rgb<u8> = Rgb([235, 241, 255]);
const CHIP_BG: Rgb<u8> = Rgb([227, 235, 250]);
const ROW_A: Rgb<u8> = Rgb([252, 253, 255]);
const ROW_B: Rgb<u8> = Rgb([246, 248, 252]);
const TEXT: Rgb<u8> = Rgb([28, 35, 49]);
const SUB: Rgb<u8> = Rgb([109, 120, 137]);
const ACCENT: Rgb<u8> = Rgb([33, 102, 245]);

// geometry
const PAD: i32 = 28;
const GAP: i32 = 12;
const TITLE_H: i32 = 58;
const SUB_H: i32 = 22;
const HEAD_H: i32 = 52;
const ROW_H: i32 = 48;
const FOOT_H: i32 = 24;
const RADIUS: i32 = 18;
const CELL_PAD: i32 = 14;

const MIN_COL: [u32; 5] = [170, 96, 120, 120, 120];
const MAX_COL: [u32; 5] = [260, 140, 220, 220, 220];
const MEASURE_ROWS: usize = 12;
const DATE_CHARS: usize = 18;

/// Column widths from measured text: headers plus the first 12 rows, clamped per column.
/// Numeric columns get a little extra room.
pub fn auto_col_widths(
    rows: &[[String; 5]],
    head: &dyn TextMeasure,
    text_cell: &dyn TextMeasure,
    num_cell: &dyn TextMeasure,
) -> [u32; 5] {
    let mut widths = MIN_COL;
    for (i, h) in HEADERS.iter().enumerate() {
        widths[i] = widths[i].max(head.measure(h).0 + 28);
    }
    for r in rows.iter().take(MEASURE_ROWS) {
        for (i, txt) in r.iter().enumerate() {
            let f = if i >= 2 { num_cell } else { text_cell };
            widths[i] = widths[i].max(f.measure(txt).0 + 28);
        }
    }
    for i in 0..5 {
        widths[i] = widths[i].min(MAX_COL[i]);
        if i >= 2 {
            widths[i] += 10;
        }
    }
    widths
}

fn card_cells(rows: &[IndicatorRow], max_rows: usize) -> Vec<[String; 5]> {
    display_rows(rows, max_rows)
        .into_iter()
        .map(|mut r| {
            r[0] = r[0].replace(", ", " ").chars().take(DATE_CHARS).collect();
            r
        })
        .collect()
}

/// Render the newest `max_rows` rows as a PNG card. An empty list gives one dash row.
pub fn render_table_png(rows: &[IndicatorRow], title: &str, max_rows: usize, fonts: &FontSet) -> Result<RenderedPng, RenderError> {
    let f_title = fonts.bold(28.0);
    let f_sub = fonts.sans(14.0);
    let f_head = fonts.bold(15.0);
    let f_cell_l = fonts.sans(16.0);
    let f_cell_r = fonts.mono(16.0);

    let tbl = card_cells(rows, max_rows);
    // widths look at more rows than are drawn so consecutive cards line up
    let sample = card_cells(rows, MEASURE_ROWS);
    let col_w = auto_col_widths(&sample, &f_head, &f_cell_l, &f_cell_r).map(|w| w as i32);
    let table_w: i32 = col_w.iter().sum();

    let width = PAD * 2 + table_w;
    let height = PAD * 2 + TITLE_H + SUB_H + GAP + HEAD_H + tbl.len() as i32 * ROW_H + GAP + FOOT_H;
    let mut img = RgbImage::from_pixel(width as u32, height as u32, BG);

    // card + shadow
    let card = Rect::new(PAD - 2, PAD - 2 + TITLE_H + SUB_H, width - PAD + 2, height - PAD - 8);
    drop_shadow(&mut img, card, RADIUS + 6, 12.0, SHADOW, SHADOW_OPACITY);
    outlined_rounded_rect(&mut img, card, RADIUS, CARD, BORDER);

    // title block
    f_title.draw(&mut img, PAD, PAD - 2, title, TEXT);
    f_sub.draw(&mut img, PAD, PAD - 2 + TITLE_H - 18, "source: investing.com", SUB);

    // header band
    let x0 = PAD;
    let y0 = PAD + TITLE_H + SUB_H + GAP;
    horizontal_gradient(&mut img, Rect::new(x0, y0, x0 + table_w - 1, y0 + HEAD_H - 1), HEAD_L, HEAD_R);

    let mut cx = x0;
    for (i, h) in HEADERS.iter().enumerate() {
        let chip_w = (col_w[i] - 20).min(200);
        let chip = Rect::new(cx + 10, y0 + 9, cx + 10 + chip_w, y0 + HEAD_H - 9);
        fill_rounded_rect(&mut img, chip, 10, CHIP_BG);
        let (tw, th) = f_head.measure(h);
        let tx = chip.x0 + (chip.width() - tw as i32) / 2;
        let ty = chip.y0 + (chip.height() - th as i32) / 2;
        f_head.draw(&mut img, tx, ty, h, TEXT);
        cx += col_w[i];
    }

    let mut cx = x0;
    for w in &col_w[..4] {
        cx += w;
        vline(&mut img, cx, y0, y0 + HEAD_H, GRID);
    }
    hline(&mut img, x0, x0 + table_w, y0 + HEAD_H, GRID);

    // body: zebra rows, text columns left, numbers right in the fixed-width face
    let mut y = y0 + HEAD_H;
    for (r_i, row) in tbl.iter().enumerate() {
        let zebra = if r_i % 2 == 0 { ROW_A } else { ROW_B };
        fill_rect(&mut img, Rect::new(x0, y + 1, x0 + table_w, y + ROW_H), zebra);

        let mut cx = x0;
        for (i, val) in row.iter().enumerate() {
            let (font, right) = if i <= 1 { (&f_cell_l, false) } else { (&f_cell_r, true) };
            let (tw, th) = font.measure(val);
            let tx = if right { cx + col_w[i] - CELL_PAD - tw as i32 } else { cx + CELL_PAD };
            let ty = y + (ROW_H - th as i32) / 2;
            font.draw(&mut img, tx, ty, val, TEXT);

            if i < 4 {
                vline(&mut img, cx + col_w[i], y, y + ROW_H, GRID);
            }
            cx += col_w[i];
        }
        hline(&mut img, x0, x0 + table_w, y + ROW_H, GRID);
        y += ROW_H;
    }

    let tip = "Tip: compare Actual vs Forecast";
    let (_, th) = f_sub.measure(tip);
    f_sub.draw(&mut img, card.x0 + 14, card.y1 - th as i32 - 10, tip, ACCENT);

    Ok(RenderedPng { bytes: encode_png(&img)?, filename: s!(FILENAME) })
}
