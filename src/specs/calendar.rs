// src/specs/calendar.rs
// Economic-calendar history page: pick the release table, read its rows.
//
// The page carries several tables (sidebars, related events, the history itself). The history
// table is recognised by its Actual/Forecast/Previous headers, English or Russian; when headers
// are missing, the shape of the rows decides.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::core::html::{Document, Table};
use crate::core::scalar::{self, Scalar};
use crate::core::sanitize::normalize_ws;

pub const ACTUAL_KEYS: &[&str] = &["actual", "факт", "фактич"];
pub const FORECAST_KEYS: &[&str] = &["forecast", "прогноз", "estimate", "consensus", "est.", "exp.", "expectation"];
pub const PREVIOUS_KEYS: &[&str] = &["previous", "prior", "пред.", "пред", "предыдущ"];

/// Rows with fewer cells than this are rejected.
pub const MIN_CELLS: usize = 5;

/* ---------------- locator ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionPath {
    /// Best header-keyword score (> 0)
    HeaderScore(u32),
    /// First table with a data-looking row of 5+ cells
    RowShape,
    /// Nothing matched; the last table on the page
    LastTable,
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPath::HeaderScore(s) => write!(f, "header score {s}"),
            SelectionPath::RowShape => f.write_str("row-shape fallback"),
            SelectionPath::LastTable => f.write_str("last-table fallback"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub heads: Vec<String>,
    pub score: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatorDiagnostic {
    pub tables_found: usize,
    pub candidates: Vec<Candidate>,
    pub picked: Option<(usize, SelectionPath)>,
    /// Filled in once rows are extracted
    pub columns: Option<ColumnIndexing>,
}

impl fmt::Display for LocatorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tables_found={}", self.tables_found)?;
        if !self.candidates.is_empty() {
            let scores: Vec<String> = self
                .candidates
                .iter()
                .map(|c| format!("#{}:{}", c.index, c.score))
                .collect();
            write!(f, "; scores=[{}]", scores.join(", "))?;
        }
        match &self.picked {
            Some((i, path)) => {
                write!(f, "; picked=#{i} via {path}")?;
                if let Some(c) = self.candidates.get(*i) {
                    write!(f, " heads=[{}]", c.heads.join(" | "))?;
                }
            }
            None => f.write_str("; note=no <table> found")?,
        }
        if let Some(cols) = &self.columns {
            write!(f, "; columns={cols}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Located<'d> {
    pub table: &'d Table,
    /// Lowercased header texts of the picked table (may be empty)
    pub heads: Vec<String>,
    pub diag: LocatorDiagnostic,
}

/// +5 for each keyword group present anywhere in the joined header line (max 15).
pub fn score_heads<S: AsRef<str>>(heads: &[S]) -> u32 {
    let line = heads.iter().map(|h| h.as_ref()).collect::<Vec<_>>().join(" ");
    [ACTUAL_KEYS, FORECAST_KEYS, PREVIOUS_KEYS]
        .iter()
        .filter(|keys| keys.iter().any(|k| line.contains(k)))
        .count() as u32
        * 5
}

type Strategy = fn(&[Table], &[Candidate]) -> Option<(usize, SelectionPath)>;

/// Tried in order; the first hit wins and is recorded in the diagnostic.
const STRATEGIES: [Strategy; 3] = [by_header_score, by_row_shape, last_table];

fn by_header_score(_: &[Table], cands: &[Candidate]) -> Option<(usize, SelectionPath)> {
    let mut best: Option<&Candidate> = None;
    for c in cands {
        // strict '>' keeps the earliest table on ties
        if best.is_none_or(|b| c.score > b.score) {
            best = Some(c);
        }
    }
    best.filter(|b| b.score > 0)
        .map(|b| (b.index, SelectionPath::HeaderScore(b.score)))
}

fn looks_like_data_row(cells: &[&str]) -> bool {
    cells.len() >= MIN_CELLS
        && cells.iter().any(|c| c.contains('%') || c.bytes().any(|b| b.is_ascii_digit()))
}

fn by_row_shape(tables: &[Table], _: &[Candidate]) -> Option<(usize, SelectionPath)> {
    tables
        .iter()
        .find(|t| t.body.iter().any(|r| looks_like_data_row(&r.data_texts())))
        .map(|t| (t.index, SelectionPath::RowShape))
}

fn last_table(tables: &[Table], _: &[Candidate]) -> Option<(usize, SelectionPath)> {
    tables.last().map(|t| (t.index, SelectionPath::LastTable))
}

/// Pick the release table. Fails only when the document has no table at all.
pub fn locate<'d>(doc: &'d Document<'_>) -> Result<Located<'d>, LocatorDiagnostic> {
    let tables = &doc.tables;
    let candidates: Vec<Candidate> = tables
        .iter()
        .map(|t| {
            let heads: Vec<String> = t.head.iter().map(|h| h.to_lowercase()).collect();
            let score = if heads.is_empty() { 0 } else { score_heads(&heads) };
            Candidate { index: t.index, heads, score }
        })
        .collect();

    let mut diag = LocatorDiagnostic { tables_found: tables.len(), candidates, ..Default::default() };

    let Some((idx, path)) = STRATEGIES.iter().find_map(|s| s(tables, &diag.candidates)) else {
        return Err(diag);
    };
    logd!("calendar table #{idx} of {} picked via {path}", tables.len());

    diag.picked = Some((idx, path));
    let heads = diag.candidates[idx].heads.clone();
    Ok(Located { table: &tables[idx], heads, diag })
}

/* ---------------- extractor ---------------- */

/// Column position: from the start (header match) or from the row end (header-less default).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Col {
    At(usize),
    FromEnd(usize),
}

impl Col {
    fn pick<'a>(self, cells: &[&'a str]) -> &'a str {
        let i = match self {
            Col::At(i) => Some(i),
            Col::FromEnd(k) => cells.len().checked_sub(k),
        };
        i.and_then(|i| cells.get(i).copied()).unwrap_or("")
    }
}

impl fmt::Display for Col {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Col::At(i) => write!(f, "{i}"),
            Col::FromEnd(k) => write!(f, "-{k}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnIndexing {
    pub actual: Col,
    pub forecast: Col,
    pub previous: Col,
}

impl fmt::Display for ColumnIndexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actual:{} forecast:{} previous:{}", self.actual, self.forecast, self.previous)
    }
}

impl ColumnIndexing {
    pub fn resolve<S: AsRef<str>>(heads: &[S]) -> Self {
        let find = |keys: &[&str], default: usize| {
            heads
                .iter()
                .position(|h| keys.iter().any(|k| h.as_ref().contains(k)))
                .map(Col::At)
                .unwrap_or(Col::FromEnd(default))
        };
        Self {
            actual: find(ACTUAL_KEYS, 3),
            forecast: find(FORECAST_KEYS, 2),
            previous: find(PREVIOUS_KEYS, 1),
        }
    }
}

/// One release. Built once per fetch and only read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorRow {
    pub date: String,
    pub time: String,
    pub actual_text: String,
    pub forecast_text: String,
    pub previous_text: String,
    pub actual: Scalar,
    pub forecast: Scalar,
    pub previous: Scalar,
    pub revised_from: Option<Scalar>,
    pub release: Option<DateTime<FixedOffset>>,
}

impl IndicatorRow {
    pub fn from_cells(cells: &[&str], cols: &ColumnIndexing, tz: Tz) -> Self {
        let get = |i: usize| normalize_ws(cells.get(i).copied().unwrap_or(""));
        let (date, time) = (get(0), get(1));
        let actual_text = normalize_ws(cols.actual.pick(cells));
        let forecast_text = normalize_ws(cols.forecast.pick(cells));
        let previous_text = normalize_ws(cols.previous.pick(cells));
        let release = release_time(&date, &time, tz);

        Self {
            actual: scalar::normalize(&actual_text),
            forecast: scalar::normalize(&forecast_text),
            previous: scalar::normalize(&previous_text),
            revised_from: scalar::parse_revised(&actual_text),
            date,
            time,
            actual_text,
            forecast_text,
            previous_text,
            release,
        }
    }

    /// RFC 3339 release timestamp, when date and time both parsed.
    pub fn release_iso(&self) -> Option<String> {
        self.release.map(|dt| dt.to_rfc3339())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOutcome {
    pub rows: Vec<IndicatorRow>,
    /// Body rows dropped for having fewer than [`MIN_CELLS`] cells
    pub rejected: usize,
    pub columns: ColumnIndexing,
}

/// Read every body row of the located table. An empty result is not an error here.
pub fn extract<S: AsRef<str>>(table: &Table, heads: &[S], tz: Tz) -> ExtractOutcome {
    let columns = ColumnIndexing::resolve(heads);
    let mut rows = Vec::with_capacity(table.body.len());
    let mut rejected = 0usize;

    for r in &table.body {
        let cells = r.data_texts();
        if cells.len() < MIN_CELLS {
            rejected += 1;
            continue;
        }
        rows.push(IndicatorRow::from_cells(&cells, &columns, tz));
    }

    logd!("extracted {} rows, {} rejected, columns {columns}", rows.len(), rejected);
    ExtractOutcome { rows, rejected, columns }
}

/* ---------------- dates ---------------- */

pub fn month_number(name: &str) -> Option<u32> {
    let lc = name.trim_matches('.').to_lowercase();
    let head: String = lc.chars().take(3).collect();
    let m = match head.as_str() {
        "jan" | "янв" => 1,
        "feb" | "фев" => 2,
        "mar" | "мар" => 3,
        "apr" | "апр" => 4,
        "may" | "май" | "мая" => 5,
        "jun" | "июн" => 6,
        "jul" | "июл" => 7,
        "aug" | "авг" => 8,
        "sep" | "сен" => 9,
        "oct" | "окт" => 10,
        "nov" | "ноя" => 11,
        "dec" | "дек" => 12,
        _ => return None,
    };
    Some(m)
}

fn full_year(y: i32) -> i32 {
    if y < 100 { y + 2000 } else { y }
}

/// `DD.MM.YYYY` (also `/`, `-`, two-digit years), `DD Mon YYYY`, or `Mon DD, YYYY (Ref)`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let d = normalize_ws(text);

    if let Some(c) = re!(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})$").captures(&d) {
        let (day, month, year) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(full_year(year), month, day);
    }
    if let Some(c) = re!(r"^(\d{1,2})\s+([A-Za-zА-Яа-яЁё.]{3,})\s+(\d{2,4})$").captures(&d) {
        let month = month_number(&c[2])?;
        return NaiveDate::from_ymd_opt(full_year(c[3].parse().ok()?), month, c[1].parse().ok()?);
    }
    if let Some(c) = re!(r"^([A-Za-zА-Яа-яЁё]{3,})\.?\s+(\d{1,2}),?\s+(\d{4})(?:\s*\([^)]*\))?$").captures(&d) {
        let month = month_number(&c[1])?;
        return NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[2].parse().ok()?);
    }
    None
}

/// `H:MM` / `HH:MM`, looking at the first five characters only.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let t: String = normalize_ws(text).chars().take(5).collect();
    let c = re!(r"^(\d{1,2}):(\d{2})$").captures(&t)?;
    NaiveTime::from_hms_opt(c[1].parse().ok()?, c[2].parse().ok()?, 0)
}

pub fn release_time(date: &str, time: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let naive = parse_date(date)?.and_time(parse_time(time)?);
    tz.from_local_datetime(&naive).earliest().map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Moscow;

    const HISTORY: &str = r#"
        <table class="sidebar"><tr><td>Most popular</td></tr></table>
        <table class="genTbl openTbl ecHistoryTbl">
          <thead><tr><th>Release Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th><th></th></tr></thead>
          <tbody>
            <tr><td>Oct 16, 2025 (Oct 11)</td><td>15:30</td><td>227K</td><td>230K</td><td>225K</td><td></td></tr>
            <tr><td>Oct 09, 2025 (Oct 04)</td><td>15:30</td><td>225K</td><td>&nbsp;</td><td>219K</td><td></td></tr>
            <tr><td colspan="3">Show more</td></tr>
          </tbody>
        </table>"#;

    #[test]
    fn header_score_wins_over_document_order() {
        let doc = Document::parse(HISTORY).unwrap();
        let loc = locate(&doc).unwrap();
        assert_eq!(loc.table.index, 1);
        assert_eq!(loc.diag.picked, Some((1, SelectionPath::HeaderScore(15))));
        assert_eq!(loc.diag.candidates[0].score, 0);
    }

    #[test]
    fn ties_keep_the_first_table() {
        let t = "<table><thead><tr><th>Actual</th><th>Forecast</th></tr></thead><tbody></tbody></table>";
        let src = format!("{t}{t}");
        let doc = Document::parse(&src).unwrap();
        assert_eq!(locate(&doc).unwrap().table.index, 0);
    }

    #[test]
    fn header_row_in_tbody_is_scored() {
        let html = "<table><tr><td>01.10.2025</td><td>10:00</td><td>1.2%</td><td>1.1%</td><td>1.0%</td></tr></table>\
                    <table><tbody>\
                    <tr><th>Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr>\
                    <tr><td>Oct 16, 2025</td><td>15:30</td><td>227K</td><td>230K</td><td>225K</td></tr>\
                    </tbody></table>";
        let doc = Document::parse(html).unwrap();
        let loc = locate(&doc).unwrap();
        assert_eq!(loc.table.index, 1);
        assert!(matches!(loc.diag.picked, Some((1, SelectionPath::HeaderScore(_)))));
        let out = extract(loc.table, &loc.heads, Moscow);
        assert_eq!(out.rejected, 0);
        assert_eq!(out.rows.len(), 1);
    }

    #[test]
    fn russian_headers_score() {
        assert_eq!(score_heads(&["дата выпуска", "время", "факт.", "прогноз", "пред."]), 15);
        assert_eq!(score_heads(&["date", "time"]), 0);
    }

    #[test]
    fn row_shape_then_last_table() {
        let html = "<table><tr><td>a</td><td>b</td></tr></table>\
                    <table><tr><td>01.10.2025</td><td>10:00</td><td>1.2%</td><td>1.1%</td><td>1.0%</td></tr></table>\
                    <table><tr><td>x</td></tr></table>";
        let doc = Document::parse(html).unwrap();
        let loc = locate(&doc).unwrap();
        assert_eq!(loc.table.index, 1);
        assert_eq!(loc.diag.picked.unwrap().1, SelectionPath::RowShape);
        assert!(loc.heads.is_empty());

        let doc = Document::parse("<table><tr><td>x</td></tr></table><table><tr><td>y</td></tr></table>").unwrap();
        let loc = locate(&doc).unwrap();
        assert_eq!((loc.table.index, loc.diag.picked.unwrap().1), (1, SelectionPath::LastTable));
    }

    #[test]
    fn no_tables_is_the_only_failure() {
        let doc = Document::parse("<div>nothing</div>").unwrap();
        let diag = locate(&doc).unwrap_err();
        assert_eq!(diag.tables_found, 0);
        assert!(diag.to_string().contains("no <table>"));
    }

    #[test]
    fn extracts_rows_and_counts_rejects() {
        let doc = Document::parse(HISTORY).unwrap();
        let loc = locate(&doc).unwrap();
        let out = extract(loc.table, &loc.heads, Moscow);
        assert_eq!(out.rejected, 1);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.columns.actual, Col::At(2));

        let r = &out.rows[0];
        assert_eq!(r.date, "Oct 16, 2025 (Oct 11)");
        assert_eq!(r.actual.value, Some(227_000.0));
        assert_eq!(r.release_iso().as_deref(), Some("2025-10-16T15:30:00+03:00"));
        assert!(out.rows[1].forecast.is_empty());
        assert_eq!(out.rows[1].forecast_text, "");
    }

    #[test]
    fn headerless_uses_offsets_from_row_end() {
        let html = "<table><tbody>\
            <tr><td>16.10.2025</td><td>15:30</td><td>x</td><td>1.5%</td><td>1.7%</td><td>1.6%</td></tr>\
            <tr><td>a</td><td>b</td><td>c</td><td>d</td></tr>\
            <tr><td>?</td><td>?</td><td>?</td><td>?</td><td>?</td></tr>\
            </tbody></table>";
        let doc = Document::parse(html).unwrap();
        let loc = locate(&doc).unwrap();
        let out = extract(loc.table, &loc.heads, Moscow);
        assert_eq!(out.columns.actual, Col::FromEnd(3));
        assert_eq!(out.rejected, 1);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].actual, Scalar::new(1.5, Some(crate::core::Unit::Percent)));
        assert_eq!(out.rows[0].previous.value, Some(1.6));
        // unreadable cells still make a row
        assert!(out.rows[1].actual.is_empty() && out.rows[1].release.is_none());
    }

    #[test]
    fn date_forms() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_date("16.10.2025"), d(2025, 10, 16));
        assert_eq!(parse_date("5/3/25"), d(2025, 3, 5));
        assert_eq!(parse_date("16 окт. 2025"), d(2025, 10, 16));
        assert_eq!(parse_date("1 мая 2025"), d(2025, 5, 1));
        assert_eq!(parse_date("Sep 05, 2025 (Aug)"), d(2025, 9, 5));
        assert_eq!(parse_date("31.02.2025"), None);
        assert_eq!(parse_date("soon"), None);
        assert!(parse_time("15:30").is_some());
        assert!(parse_time("").is_none());
        assert!(release_time("16.10.2025", "", Moscow).is_none());
    }

    #[test]
    fn revised_value_is_kept_separately() {
        let cells = ["Oct 02, 2025", "15:30", "3.1% revised from 3.0%", "3.0%", "2.9%"];
        let r = IndicatorRow::from_cells(&cells, &ColumnIndexing::resolve::<&str>(&[]), Moscow);
        assert_eq!(r.actual.value, Some(3.1));
        assert_eq!(r.revised_from.and_then(|s| s.value), Some(3.0));
    }
}
