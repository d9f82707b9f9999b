// src/scrape/calendar.rs
// Network → document → table → rows, with every failure tagged by the stage it happened in.

use chrono_tz::Tz;
use thiserror::Error;

use crate::core::html::{Document, HtmlError};
use crate::core::net::{trace_line, AttemptTrace, Fetcher, NetFailure};
use crate::specs::calendar::{self, IndicatorRow, LocatorDiagnostic};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Net,
    Html,
    Table,
    Row,
}

impl Stage {
    pub fn tag(self) -> &'static str {
        match self {
            Stage::Net => "NET",
            Stage::Html => "HTML",
            Stage::Table => "TABLE",
            Stage::Row => "ROW",
        }
    }
}

/// Display strings are meant to be shown to users as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("[NET] {reason} | note: {}", trace_line(.trace))]
    Net { reason: String, trace: Vec<AttemptTrace> },
    #[error("[HTML] {0}")]
    Html(#[from] HtmlError),
    #[error("[TABLE] not found | diag: {diag}")]
    Table { diag: LocatorDiagnostic },
    #[error("[ROW] no rows parsed | diag: {diag} | bad_rows: {rejected}")]
    Row { rejected: usize, diag: LocatorDiagnostic },
}

impl FetchError {
    pub fn stage(&self) -> Stage {
        match self {
            FetchError::Net { .. } => Stage::Net,
            FetchError::Html(_) => Stage::Html,
            FetchError::Table { .. } => Stage::Table,
            FetchError::Row { .. } => Stage::Row,
        }
    }
}

impl From<NetFailure> for FetchError {
    fn from(f: NetFailure) -> Self {
        FetchError::Net { reason: f.reason, trace: f.trace }
    }
}

/// Parse an already-downloaded history page into at most `row_limit` rows, newest first
/// as the page lists them.
pub fn parse_page(html: &str, row_limit: usize, tz: Tz) -> Result<Vec<IndicatorRow>, FetchError> {
    let doc = Document::parse(html)?;
    let located = calendar::locate(&doc).map_err(|diag| FetchError::Table { diag })?;

    let out = calendar::extract(located.table, &located.heads, tz);
    let mut diag = located.diag;
    diag.columns = Some(out.columns);

    if out.rows.is_empty() {
        return Err(FetchError::Row { rejected: out.rejected, diag });
    }
    let mut rows = out.rows;
    rows.truncate(row_limit);
    Ok(rows)
}

pub fn fetch(fetcher: &Fetcher, url: &str, row_limit: usize, tz: Tz) -> Result<Vec<IndicatorRow>, FetchError> {
    let html = fetcher.fetch_page(url)?;
    let res = parse_page(&html, row_limit, tz);
    match &res {
        Ok(rows) => logd!("{url}: {} rows", rows.len()),
        Err(e) => logw!("{url}: {e}"),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    #[test]
    fn stages_are_tagged() {
        let e = parse_page("plain text", 5, UTC).unwrap_err();
        assert_eq!(e.stage(), Stage::Html);
        assert!(e.to_string().starts_with("[HTML]"));

        let e = parse_page("<div>no tables</div>", 5, UTC).unwrap_err();
        assert_eq!(e.stage(), Stage::Table);
        assert!(e.to_string().contains("tables_found=0"));

        let e = parse_page("<table><tbody><tr><td>a</td><td>b</td></tr></tbody></table>", 5, UTC).unwrap_err();
        assert_eq!(e.stage(), Stage::Row);
        let msg = e.to_string();
        assert!(msg.starts_with("[ROW] no rows parsed"), "{msg}");
        assert!(msg.ends_with("bad_rows: 1"), "{msg}");
        assert!(msg.contains("last-table fallback"), "{msg}");
    }

    #[test]
    fn row_limit_truncates() {
        let body: String = (1..=9)
            .map(|d| format!("<tr><td>0{d}.10.2025</td><td>10:00</td><td>{d}%</td><td>1%</td><td>2%</td></tr>"))
            .collect();
        let html = format!(
            "<table><thead><tr><th>Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr></thead><tbody>{body}</tbody></table>"
        );
        let rows = parse_page(&html, 3, UTC).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "01.10.2025");
        assert_eq!(rows[0].release_iso().as_deref(), Some("2025-10-01T10:00:00+00:00"));
    }
}
