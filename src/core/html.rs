// src/core/html.rs
// Low-level HTML scanning: case-insensitive tag blocks, tag stripping, and a small
// table-oriented document model. Tag names are matched on an ASCII-lowercased copy
// of the source, which keeps byte offsets identical to the original.

use std::fmt;

use regex::Regex;
use thiserror::Error;

use super::sanitize::{normalize_entities, normalize_ws};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlError {
    #[error("empty document")]
    Empty,
    #[error("binary payload ({0} bytes), not markup")]
    Binary(usize),
    #[error("no markup found in {0} bytes of text")]
    NotMarkup(usize),
}

/// ASCII-only lowercasing; byte length is preserved so offsets stay valid on the original.
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Find `pat` (e.g. `<tr`, `</td`) in a lowercased haystack, requiring a tag-name boundary
/// after it so `<th` doesn't hit `<thead` and `<tr` doesn't hit `<track`.
pub fn find_tag(lc: &str, pat: &str, from: usize) -> Option<usize> {
    let mut at = from;
    while let Some(rel) = lc.get(at..)?.find(pat) {
        let pos = at + rel;
        let after = lc.as_bytes().get(pos + pat.len());
        if matches!(after, None | Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n')) {
            return Some(pos);
        }
        at = pos + pat.len();
    }
    None
}

/// `find_tag` anchored at `at`.
fn tag_at(lc: &str, pat: &str, at: usize) -> bool {
    lc.get(at..).is_some_and(|rest| rest.starts_with(pat))
        && matches!(lc.as_bytes().get(at + pat.len()), None | Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n'))
}

/// End of the tag starting at `start` (index just past its `>`), quote-aware.
fn tag_end(s: &str, start: usize) -> usize {
    let b = s.as_bytes();
    let (mut in_s, mut in_d) = (false, false);
    let mut i = start + 1;
    while i < b.len() {
        match b[i] {
            b'\'' if !in_d => in_s = !in_s,
            b'"' if !in_s => in_d = !in_d,
            b'>' if !in_s && !in_d => return i + 1,
            _ => {}
        }
        i += 1;
    }
    b.len()
}

/// Next `<tag …>…</tag>` block from `from`, as `(start, end)` byte offsets.
/// Tolerates an omitted close tag: the block then ends at the first of `stops`
/// (or the end of input), the way browsers close `<td>`/`<tr>`.
pub fn next_tag_block_ci(lc: &str, tag: &str, from: usize, stops: &[&str]) -> Option<(usize, usize)> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let start = find_tag(lc, &open, from)?;
    let open_end = tag_end(lc, start);

    let stop_at = stops
        .iter()
        .filter_map(|p| find_tag(lc, p, open_end))
        .min()
        .unwrap_or(lc.len());

    match find_tag(lc, &close, open_end) {
        Some(c) if c <= stop_at => Some((start, tag_end(lc, c))),
        _ => Some((start, stop_at)),
    }
}

/// Given a complete tag block like `<td ...>INNER</td>`, return INNER (may still hold nested tags).
pub fn inner_after_open_tag(block: &str) -> &str {
    let open_end = tag_end(block, 0).min(block.len());
    let inner = &block[open_end..];
    match inner.rfind("</") {
        Some(cs) => &inner[..cs],
        None => inner,
    }
}

/// If `lt` opens a comment or a `<script>`/`<style>` element, the offset just past its end.
/// An unterminated one runs to the end of input.
fn raw_end(lc: &str, lt: usize) -> Option<usize> {
    if lc.get(lt..)?.starts_with("<!--") {
        return Some(lc[lt + 4..].find("-->").map(|i| lt + 4 + i + 3).unwrap_or(lc.len()));
    }
    for (open, close) in [("<script", "</script"), ("<style", "</style")] {
        if tag_at(lc, open, lt) {
            let body = tag_end(lc, lt);
            return Some(find_tag(lc, close, body).map(|c| tag_end(lc, c)).unwrap_or(lc.len()));
        }
    }
    None
}

/// `src` with comments and script/style elements overwritten by spaces. Byte offsets are unchanged.
fn blank_raw(src: &str, lc: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut pos = 0usize;
    while let Some(rel) = lc[pos..].find('<') {
        let lt = pos + rel;
        match raw_end(lc, lt) {
            Some(end) => {
                out.push_str(&src[pos..lt]);
                out.extend(std::iter::repeat_n(' ', end - lt));
                pos = end;
            }
            None => {
                out.push_str(&src[pos..=lt]);
                pos = lt + 1;
            }
        }
    }
    out.push_str(&src[pos..]);
    out
}

/// Replace tags with a space, decode entities, collapse whitespace.
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => { in_tag = false; out.push(' '); }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

/* ---------------- document model ---------------- */

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub text: String,
    /// `<th>` rather than `<td>`
    pub header: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    /// Texts of the `<td>` cells only.
    pub fn data_texts(&self) -> Vec<&str> {
        self.cells.iter().filter(|c| !c.header).map(|c| c.text.as_str()).collect()
    }

    /// Texts of every cell, `<th>` and `<td>`, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }

    fn is_header_only(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.header)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Position among all tables in document order
    pub index: usize,
    /// Byte offset of the opening tag
    pub offset: usize,
    /// Header cell texts: `<thead>` `<th>`s, else a leading all-`<th>` row (in `<tbody>` or not)
    pub head: Vec<String>,
    /// Every `<tr>` in order, header rows included
    pub rows: Vec<Row>,
    /// Body rows: `<tbody>` rows, else every non-header row holding a `<td>`
    pub body: Vec<Row>,
}

pub struct Document<'a> {
    src: &'a str,
    pub tables: Vec<Table>,
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("bytes", &self.src.len())
            .field("tables", &self.tables.len())
            .finish()
    }
}

impl<'a> Document<'a> {
    pub fn parse(src: &'a str) -> Result<Self, HtmlError> {
        if src.trim().is_empty() {
            return Err(HtmlError::Empty);
        }
        if src.contains('\0') {
            return Err(HtmlError::Binary(src.len()));
        }
        if !src.contains('<') {
            return Err(HtmlError::NotMarkup(src.len()));
        }

        // tables are read from a copy with script, style and comment text blanked
        let clean = blank_raw(src, &to_lower(src));
        let spans = table_spans(&to_lower(&clean));
        let tables = spans
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| {
                let nested: Vec<(usize, usize)> = spans
                    .iter()
                    .copied()
                    .filter(|&(s, e)| s > start && e <= end)
                    .collect();
                parse_table(&clean, index, start, end, &nested)
            })
            .collect();

        Ok(Self { src, tables })
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Byte offset of the first text node (outside script/style/comments) matching `re`.
    /// Entities are decoded before matching.
    pub fn find_text(&self, re: &Regex) -> Option<usize> {
        let src = self.src;
        let lc = to_lower(src);
        let mut pos = 0usize;
        while pos < src.len() {
            let lt = src[pos..].find('<').map(|i| pos + i).unwrap_or(src.len());
            if lt > pos && re.is_match(&normalize_entities(&src[pos..lt])) {
                return Some(pos);
            }
            if lt >= src.len() {
                break;
            }
            pos = raw_end(&lc, lt).unwrap_or_else(|| tag_end(src, lt));
        }
        None
    }
}

/// All `<table>` spans (start of opener, end of closer) in opener order, nesting-aware.
/// A table never closed ends at the end of input.
fn table_spans(lc: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut at = 0usize;
    loop {
        let open = find_tag(lc, "<table", at);
        let close = find_tag(lc, "</table", at);
        match (open, close) {
            (Some(o), Some(c)) if o < c => { stack.push(o); at = tag_end(lc, o); }
            (Some(o), None) => { stack.push(o); at = tag_end(lc, o); }
            (_, Some(c)) => {
                let end = tag_end(lc, c);
                // a stray </table> without an opener is ignored
                if let Some(s) = stack.pop() { spans.push((s, end)); }
                at = end;
            }
            (None, None) => break,
        }
    }
    while let Some(s) = stack.pop() {
        spans.push((s, lc.len()));
    }
    spans.sort_by_key(|&(s, _)| s);
    spans
}

fn parse_table(src: &str, index: usize, start: usize, end: usize, nested: &[(usize, usize)]) -> Table {
    // Blank out nested tables so their rows don't leak into this one.
    let open_end = tag_end(src, start).min(end);
    let mut inner = src[open_end..end].to_string();
    for &(s, e) in nested {
        let (s, e) = (s - open_end, e - open_end);
        inner.replace_range(s..e, &" ".repeat(e - s));
    }
    let lc = to_lower(&inner);

    let thead = next_tag_block_ci(&lc, "thead", 0, &["<tbody"]);
    let head_from_thead: Vec<String> = thead
        .map(|(s, e)| {
            read_cells(&inner[s..e], &lc[s..e])
                .into_iter()
                .filter(|c| c.header)
                .map(|c| c.text)
                .collect()
        })
        .unwrap_or_default();

    let rows = read_rows(&inner, &lc, 0, lc.len());

    let mut tbody_rows = Vec::new();
    let mut at = 0usize;
    while let Some((s, e)) = next_tag_block_ci(&lc, "tbody", at, &["<tbody", "<tfoot"]) {
        tbody_rows.extend(read_rows(&inner, &lc, s, e));
        at = e.max(s + 1);
    }

    let (head, body) = if !tbody_rows.is_empty() {
        let mut head = head_from_thead;
        if head.is_empty() && tbody_rows[0].is_header_only() {
            head = tbody_rows.remove(0).cells.into_iter().map(|c| c.text).collect();
        }
        (head, tbody_rows)
    } else {
        let thead_span = thead.unwrap_or((0, 0));
        let outside: Vec<Row> = read_rows_outside(&inner, &lc, thead_span);
        let mut head = head_from_thead;
        let mut body = Vec::new();
        for row in outside {
            if row.is_header_only() {
                if head.is_empty() {
                    head = row.cells.iter().map(|c| c.text.clone()).collect();
                }
                continue;
            }
            if row.cells.iter().any(|c| !c.header) {
                body.push(row);
            }
        }
        (head, body)
    };

    Table { index, offset: start, head, rows, body }
}

fn read_rows(inner: &str, lc: &str, from: usize, to: usize) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut at = from;
    while let Some((s, e)) = next_tag_block_ci(&lc[..to], "tr", at, &["<tr", "</tbody", "</thead", "</tfoot"]) {
        rows.push(Row { cells: read_cells(&inner[s..e], &lc[s..e]) });
        at = e.max(s + 1);
    }
    rows
}

fn read_rows_outside(inner: &str, lc: &str, skip: (usize, usize)) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut at = 0usize;
    while let Some((s, e)) = next_tag_block_ci(lc, "tr", at, &["<tr", "</thead", "</tfoot"]) {
        at = e.max(s + 1);
        if s >= skip.0 && s < skip.1 {
            continue;
        }
        rows.push(Row { cells: read_cells(&inner[s..e], &lc[s..e]) });
    }
    rows
}

/// `<td>`/`<th>` cells of one row block, in order.
fn read_cells(block: &str, lc: &str) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut at = 0usize;
    loop {
        let td = find_tag(lc, "<td", at);
        let th = find_tag(lc, "<th", at);
        let (tag, header) = match (td, th) {
            (Some(a), Some(b)) if b < a => ("th", true),
            (Some(_), _) => ("td", false),
            (None, Some(_)) => ("th", true),
            (None, None) => break,
        };
        let Some((s, e)) = next_tag_block_ci(lc, tag, at, &["<td", "<th", "</tr"]) else { break };
        cells.push(Cell { text: strip_tags(inner_after_open_tag(&block[s..e])), header });
        at = e.max(s + 1);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_tag_respects_name_boundary() {
        let lc = "<thead><th>a</th></thead>";
        assert_eq!(find_tag(lc, "<th", 0), Some(7));
        assert_eq!(find_tag(lc, "<thead", 0), Some(0));
    }

    #[test]
    fn reads_thead_and_tbody() {
        let html = r#"
            <table class="genTbl">
              <thead><tr><th>Release Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr></thead>
              <tbody>
                <tr><td>Oct 16, 2025</td><td>15:30</td><td>227K</td><td>230K</td><td>225K</td></tr>
                <tr><td>Oct 09, 2025</td><td>15:30</td><td>225K</td><td>&nbsp;</td><td>219K</td></tr>
              </tbody>
            </table>"#;
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.tables.len(), 1);
        let t = &doc.tables[0];
        assert_eq!(t.head, vec!["Release Date", "Time", "Actual", "Forecast", "Previous"]);
        assert_eq!(t.body.len(), 2);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.body[0].data_texts(), vec!["Oct 16, 2025", "15:30", "227K", "230K", "225K"]);
        assert_eq!(t.body[1].data_texts()[3], "");
    }

    #[test]
    fn header_row_without_thead_and_unclosed_cells() {
        let html = "<TABLE><TR><TH>Label<TH>Altcoin<TH>Bitcoin<TR><TD>Days<TD>12<TD>40</TABLE>";
        let doc = Document::parse(html).unwrap();
        let t = &doc.tables[0];
        assert_eq!(t.head, vec!["Label", "Altcoin", "Bitcoin"]);
        assert_eq!(t.body.len(), 1);
        assert_eq!(t.body[0].data_texts(), vec!["Days", "12", "40"]);
    }

    #[test]
    fn nested_tables_stay_separate() {
        let html = "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td><td>x</td></tr></table>";
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows.len(), 1);
        assert_eq!(doc.tables[0].body[0].data_texts(), vec!["outer", "x"]);
        assert_eq!(doc.tables[1].body[0].data_texts(), vec!["inner"]);
    }

    #[test]
    fn rejects_non_markup() {
        assert_eq!(Document::parse("   ").unwrap_err(), HtmlError::Empty);
        assert!(matches!(Document::parse("{\"json\": true}"), Err(HtmlError::NotMarkup(_))));
    }

    #[test]
    fn unclosed_table_runs_to_end() {
        let doc = Document::parse("<table><tr><td>1<td>2").unwrap();
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].body[0].data_texts(), vec!["1", "2"]);
    }

    const NFP: &str = "<table><thead><tr><th>Date</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr></thead>\
        <tbody><tr><td>Oct 16, 2025</td><td>227K</td><td>230K</td><td>225K</td></tr></tbody></table>";

    #[test]
    fn table_markup_in_script_style_and_comments_is_ignored() {
        for junk in [
            "<script>var tpl = '<table class=\"x\">';</script>",
            "<style>/* <table> */ td { color: red }</style>",
            "<!-- old layout <table> -->",
            "<SCRIPT type=\"text/javascript\">document.write('<table><tr><td>ghost')</SCRIPT>",
        ] {
            for html in [format!("{junk}{NFP}"), format!("{NFP}{junk}")] {
                let doc = Document::parse(&html).unwrap();
                assert_eq!(doc.tables.len(), 1, "{html}");
                assert_eq!(doc.tables[0].head, vec!["Date", "Actual", "Forecast", "Previous"]);
                assert_eq!(doc.tables[0].body.len(), 1);
                assert_eq!(doc.tables[0].offset, html.find("<table><thead>").unwrap());
            }
        }
    }

    #[test]
    fn header_row_inside_tbody_becomes_head() {
        let html = "<table><tbody>\
            <tr><th>Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr>\
            <tr><td>Oct 16, 2025</td><td>15:30</td><td>227K</td><td>230K</td><td>225K</td></tr>\
            </tbody></table>";
        let t = &Document::parse(html).unwrap().tables[0];
        assert_eq!(t.head, vec!["Date", "Time", "Actual", "Forecast", "Previous"]);
        assert_eq!(t.body.len(), 1);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn find_text_skips_scripts() {
        let html = "<!-- Altcoin Season Index --><script>var t='Altcoin Season Index';</script><h2>Altcoin&nbsp;Season Index</h2><table></table>";
        let doc = Document::parse(html).unwrap();
        let re = Regex::new(r"(?i)altcoin\s+season\s+index").unwrap();
        let at = doc.find_text(&re).unwrap();
        assert!(at > html.find("</script>").unwrap());
        assert_eq!(&html[at..at + 7], "Altcoin");
        assert!(at < doc.tables[0].offset);
    }
}
