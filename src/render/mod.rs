// src/render/mod.rs
// Output forms: HTML-safe text for chat messages and PNG cards.
pub mod canvas;
pub mod font;
pub mod gauge_png;
pub mod table_png;
pub mod text;

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::core::scalar::format_scalar;
use crate::specs::calendar::IndicatorRow;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Encoded card plus the filename it should be sent/saved under.
#[derive(Clone, Debug)]
pub struct RenderedPng {
    pub bytes: Vec<u8>,
    pub filename: String,
}

pub const PLACEHOLDER: &str = "—";

/// Date, time and the three formatted figures of one row. Blank date/time show a dash.
pub fn row_cells(row: &IndicatorRow) -> [String; 5] {
    let or_dash = |s: String| if s.is_empty() { s!(PLACEHOLDER) } else { s };
    [
        or_dash(row.date.clone()),
        or_dash(row.time.chars().take(5).collect()),
        format_scalar(row.actual.value, row.actual.unit),
        format_scalar(row.forecast.value, row.forecast.unit),
        format_scalar(row.previous.value, row.previous.unit),
    ]
}

/// Up to `max_rows` display rows; a single dash row when there is nothing to show.
pub fn display_rows(rows: &[IndicatorRow], max_rows: usize) -> Vec<[String; 5]> {
    let out: Vec<[String; 5]> = rows.iter().take(max_rows).map(row_cells).collect();
    if out.is_empty() {
        return vec![std::array::from_fn(|_| s!(PLACEHOLDER))];
    }
    out
}

pub(crate) fn encode_png(img: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
