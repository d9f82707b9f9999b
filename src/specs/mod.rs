// src/specs/mod.rs
//! # Page “specs” module
//!
//! This module hosts the **page-specific extraction logic**. Each spec focuses on one
//! kind of page and encodes *where the numbers live in the HTML* and *how to pull them
//! out when the markup drifts*.
//!
//! ## What lives here
//! - **Table selection** for economic-calendar history pages (header scoring, row-shape
//!   fallback, last-table fallback), with a diagnostic that records which path fired.
//! - **Row extraction**: column resolution by header keywords (English + Russian) with
//!   fixed from-the-end defaults, value normalization through `core::scalar`, and
//!   release timestamps in the configured time zone.
//! - **Altseason page reading**: the live 0–100 index via an ordered list of strategies,
//!   and the six-metric Altcoin/Bitcoin stats table via label variants and keyword bundles.
//!
//! ## What does **not** live here
//! - **Network I/O** – `scrape::*` downloads pages through `core::net::Fetcher` and hands
//!   the HTML to a spec.
//! - **Presentation** – text tables, signal lines and PNG cards are in `render`.
//! - **Rules** – the LONG/SHORT reading of a row belongs to `signal`.
//!
//! ## Typical call chain
//! ```text
//! cli / scheduler → scrape::calendar::fetch → core::net::Fetcher::fetch_page
//!                                          ↘  specs::calendar::{locate, extract}
//!                 → signal::evaluate → render::{text, table_png}
//! ```
//!
//! ## Conventions & invariants
//! - Specs are **pure**: HTML text in, typed values or an error value out. No panics on
//!   hostile input; a cell that won't parse becomes an empty `Scalar`.
//! - Heuristics are written as **ordered strategy lists**; the first one that yields a
//!   result wins and the choice is logged at debug level.
//! - Keyword matching is **case-insensitive** and works on entity-decoded,
//!   whitespace-collapsed text.
//!
//! ## Current specs
//! - `calendar` – history table of one indicator (Date, Time, Actual, Forecast, Previous).
//! - `altseason` – Altcoin Season Index value and season statistics.
//!
//! ## Testing notes
//! - Every spec is testable **offline** against inline HTML fixtures.
//!
//! In short: **`specs` knows how to read the pages.** Other layers decide when to
//! fetch and how to present.
pub mod calendar;
pub mod altseason;
