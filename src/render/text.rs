// src/render/text.rs
// Chat-ready text. Everything returned here is HTML-escaped except the few tags we add
// ourselves (<b>, <i>, <pre>, <a>).
use std::fmt::Display;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::catalog::IndicatorDef;
use crate::config::consts::CALENDAR_SOURCE_NAME;
use crate::core::sanitize::escape_html as h;
use crate::core::scalar::{format_scalar, Scalar};
use crate::schedule::{DaySet, Settings};
use crate::scrape::batch::BatchItem;
use crate::signal::{evaluate, Rule};
use crate::specs::altseason::{AltseasonStats, AltseasonStatus, StatKey};
use crate::specs::calendar::IndicatorRow;

use super::display_rows;

pub const TABLE_HEADERS: [&str; 5] = ["Release Date", "Time", "Actual", "Forecast", "Previous"];

/* ---------------- fixed-width table ---------------- */

/// Trim, cut to `w` chars with a trailing ellipsis when too long, pad right to `w`.
pub fn cut_pad(s: &str, w: usize) -> String {
    let s = s.trim();
    let n = s.chars().count();
    if n > w {
        let mut out: String = s.chars().take(w.saturating_sub(1)).collect();
        out.push('…');
        return out;
    }
    let mut out = s!(s);
    out.extend(std::iter::repeat_n(' ', w - n));
    out
}

fn border(widths: &[usize; 5], left: char, mid: char, right: char) -> String {
    let parts: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{left}{}{right}", parts.join(&mid.to_string()))
}

fn table_line<S: AsRef<str>>(cells: &[S], widths: &[usize; 5]) -> String {
    let mut line = s!("│");
    for (c, w) in cells.iter().zip(widths) {
        line.push_str(&cut_pad(c.as_ref(), *w));
        line.push('│');
    }
    line
}

/// Box-drawn monospace table of the newest `max_rows` rows, inside `<pre>`, plus a source link.
pub fn format_table(rows: &[IndicatorRow], src_url: &str, widths: &[usize; 5], max_rows: usize) -> String {
    let mut lines = vec![
        border(widths, '┌', '┬', '┐'),
        table_line(&TABLE_HEADERS, widths),
        border(widths, '├', '┼', '┤'),
    ];
    lines.extend(display_rows(rows, max_rows).iter().map(|r| table_line(r, widths)));
    lines.push(border(widths, '└', '┴', '┘'));

    format!(
        "<pre>{}</pre>\n<b>Source:</b> <a href=\"{}\">{CALENDAR_SOURCE_NAME}</a>",
        h(&lines.join("\n")),
        h(src_url)
    )
}

/* ---------------- signal line ---------------- */

fn fmt(s: &Scalar) -> String {
    format_scalar(s.value, s.unit)
}

/// Headline for the newest row of an indicator: figures, then the rule's verdict.
pub fn signal_message(def: &IndicatorDef, rows: &[IndicatorRow]) -> String {
    let title = format!("<b>{}</b>", h(&def.title));
    let Some(top) = rows.first() else {
        return format!("{title}\nNo data: the table is empty.");
    };

    let (a, f, p) = (top.actual.value, top.forecast.value, top.previous.value);
    let mut a_str = fmt(&top.actual);
    if let Some(rev) = top.revised_from.as_ref().filter(|r| !r.is_empty()) {
        a_str = format!("{a_str} (revised from {})", fmt(rev));
    }
    let (f_str, p_str) = (fmt(&top.forecast), fmt(&top.previous));
    let sig = h(&evaluate(top, &def.rule).label());

    if matches!(def.rule, Rule::Fomc) {
        if a.is_none() || p.is_none() {
            return format!("{title}\n⏳ Waiting for the rate figures.");
        }
        return format!("{title}\nActual: {a_str} • Previous: {p_str} → {sig}");
    }

    match (a, f, p) {
        (None, Some(_), _) => format!("{title}\n⏳ Data not released yet. Forecast: {f_str}"),
        (Some(_), None, Some(_)) => {
            format!("{title}\n⚠️ Actual: {a_str}, forecast not recognized. Previous: {p_str} → {sig}")
        }
        (Some(_), None, None) => format!("{title}\n⚠️ Actual: {a_str}, forecast not recognized → {sig}"),
        _ => format!("{title}\nActual: {a_str} • Forecast: {f_str} → {sig}"),
    }
}

/// One block per indicator; failures show their stage-tagged error.
pub fn overview_message(items: &[BatchItem]) -> String {
    items
        .iter()
        .map(|it| match &it.result {
            Ok(rows) => signal_message(&it.def, rows),
            Err(e) => format!("<b>{}</b>\n⚠️ {}", h(&it.def.title), h(&e.to_string())),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `⚠️ {what}: {err}`, escaped.
pub fn warning(what: &str, err: &dyn Display) -> String {
    format!("⚠️ {}: {}", h(what), h(&err.to_string()))
}

pub fn rules_hint() -> &'static str {
    "📘 <b>Rules:</b>\n\
     • <b>LT</b> — LONG when Actual is below Forecast\n\
     • <b>GT</b> — LONG when Actual is above Forecast\n\
     • <b>FOMC</b> — rate decision against the previous rate:\n\
     \u{20}\u{20}\u{20}↳ higher → rate hike\n\
     \u{20}\u{20}\u{20}↳ lower → rate cut"
}

/* ---------------- altseason ---------------- */

pub fn altseason_status(value: u8) -> String {
    let st = AltseasonStatus::classify(value);
    format!(
        "<b>Altcoin Season Index</b>: <b>{value}</b>/100\n\
         Status: {} {}\n\
         Thresholds: 25 (BTC season) · 69 (approaching) · 75 (altseason)\n\
         {}",
        st.emoji(),
        st.label(),
        st.tip()
    )
}

/// Status block with source and update time.
pub fn altseason_text(value: u8, src_url: &str, updated: &DateTime<Tz>) -> String {
    format!(
        "{}\n\n<i>Source</i>: {}\n<i>Updated</i>: {}",
        altseason_status(value),
        h(src_url),
        updated.format("%Y-%m-%d %H:%M %Z")
    )
}

fn stat_num(v: Option<i64>) -> String {
    v.map_or_else(|| s!("n/a"), |n| n.to_string())
}

pub fn altseason_stats(stats: &AltseasonStats) -> String {
    let mut lines = vec![s!("<b>📊 Season summary</b> (altcoins | BTC)")];
    for key in StatKey::ALL {
        let pair = stats.get(key);
        lines.push(format!(
            "• {}: <b>{}</b> | <b>{}</b>",
            key.title(),
            stat_num(pair.alt),
            stat_num(pair.btc)
        ));
    }
    lines.push(s!());
    lines.push(s!("ℹ️ Altseason threshold: <b>69+</b>. Bitcoin season: <b>≤25</b>."));
    lines.join("\n")
}

/* ---------------- schedule ---------------- */

/// Per-indicator schedule listing for one chat.
pub fn schedule_overview(entries: &[(&IndicatorDef, Settings)]) -> String {
    let mut lines = vec![s!("<b>🗓️ Indicator schedule</b>"), s!()];
    for (def, st) in entries {
        let title = h(&def.title);
        let status = if st.enabled { "✅ on" } else { "❌ off" };
        if !st.is_configured() {
            lines.push(format!("🔹 <b>{title}</b>: <i>not set</i> | {status}"));
            continue;
        }
        let days = st
            .days
            .as_deref()
            .and_then(DaySet::parse)
            .map_or_else(|| s!("—"), |d| d.describe());
        let time = h(st.time.as_deref().unwrap_or("—"));
        lines.push(format!("🔹 <b>{title}</b>: 📅 {days} · 🕒 {time} | {status}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scalar::Unit;
    use crate::specs::calendar::ColumnIndexing;

    fn row(actual: &str, forecast: &str, previous: &str) -> IndicatorRow {
        let cells = ["Oct 16, 2025", "15:30", actual, forecast, previous];
        IndicatorRow::from_cells(&cells, &ColumnIndexing::resolve::<&str>(&[]), chrono_tz::UTC)
    }

    fn def(rule: Rule) -> IndicatorDef {
        IndicatorDef::new("X", "Jobless <Claims>", "https://example.test/x", rule)
    }

    #[test]
    fn cut_pad_truncates_with_ellipsis() {
        assert_eq!(cut_pad("abc", 5), "abc  ");
        assert_eq!(cut_pad("abcdef", 5), "abcd…");
        assert_eq!(cut_pad("  x ", 2), "x ");
    }

    #[test]
    fn empty_table_gets_placeholder_row() {
        let t = format_table(&[], "https://example.test/?a=1&b=2", &[12, 5, 12, 9, 9], 6);
        let body: Vec<&str> = t.lines().collect();
        // top, header, divider, one placeholder row, bottom
        assert!(body[3].starts_with("│—"), "{t}");
        assert!(body[4].starts_with("└"), "{t}");
        assert!(t.contains("href=\"https://example.test/?a=1&amp;b=2\""));
    }

    #[test]
    fn table_rows_are_fixed_width() {
        let rows = vec![row("229K", "223K", "225K"), row("3.2%", "3.1%", "3.0%")];
        let t = format_table(&rows, "u", &[12, 5, 12, 9, 9], 1);
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines.len(), 6); // <pre>top, header, mid, 1 row, bottom</pre>, source
        assert!(lines[3].contains("229K"));
        let w = lines[1].chars().count();
        assert!(lines[2..4].iter().all(|l| l.chars().count() == w));
    }

    #[test]
    fn signal_message_cases() {
        let m = signal_message(&def(Rule::Gt), &[row("229K", "223K", "225K")]);
        assert!(m.starts_with("<b>Jobless &lt;Claims&gt;</b>\n"), "{m}");
        assert!(m.ends_with("Actual: 229K • Forecast: 223K → LONG"), "{m}");

        let m = signal_message(&def(Rule::Lt), &[row("", "3.1%", "3.0%")]);
        assert!(m.contains("Data not released yet. Forecast: 3.1%"), "{m}");

        let m = signal_message(&def(Rule::Lt), &[row("3.2%", "", "3.0%")]);
        assert!(m.contains("forecast not recognized. Previous: 3%"), "{m}");

        let m = signal_message(&def(Rule::Fomc), &[row("4.5%", "4.25%", "4.25%")]);
        assert!(m.ends_with("Actual: 4.5% • Previous: 4.25% → rate hike"), "{m}");
        let m = signal_message(&def(Rule::Fomc), &[row("", "4.25%", "4.25%")]);
        assert!(m.contains("Waiting for the rate figures"), "{m}");

        assert!(signal_message(&def(Rule::Lt), &[]).contains("No data"));
        let m = signal_message(&def(Rule::from_code("ZZ")), &[row("1", "2", "3")]);
        assert!(m.contains("rule ZZ not recognized"), "{m}");
    }

    #[test]
    fn revised_actual_is_mentioned() {
        let r = row("229K revised from 231K", "223K", "225K");
        assert_eq!(r.revised_from, Some(Scalar::new(231_000.0, Some(Unit::Thousand))));
        let m = signal_message(&def(Rule::Gt), &[r]);
        assert!(m.contains("Actual: 229K (revised from 231K)"), "{m}");
    }

    #[test]
    fn altseason_blocks() {
        let s = altseason_status(72);
        assert!(s.contains("<b>72</b>/100"));
        assert!(s.contains("Approaching altseason"));

        let stats = AltseasonStats::default();
        let t = altseason_stats(&stats);
        assert_eq!(t.matches("n/a").count(), 12);
    }
}
