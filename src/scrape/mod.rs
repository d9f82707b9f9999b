// src/scrape/mod.rs
pub mod calendar;
pub mod altseason;
pub mod batch;

pub use calendar::{fetch, parse_page, FetchError, Stage};
pub use batch::{collect_latest, BatchItem};
