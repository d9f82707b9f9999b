// src/specs/altseason.rs
// Altcoin Season Index page: the live 0–100 value and the Altcoin/Bitcoin season stats table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::core::html::{Document, HtmlError, Table};
use crate::core::sanitize::fold;
use crate::core::vischars::visible_text;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AltseasonError {
    #[error("altseason index not found: {0}")]
    IndexNotFound(String),
    #[error("Altcoin/Bitcoin stats table not found")]
    StatsTableNotFound,
    #[error("stats table is missing metrics: {}", join_keys(.0))]
    MissingMetrics(Vec<StatKey>),
    #[error("page markup unusable: {0}")]
    Html(#[from] HtmlError),
}

fn join_keys(keys: &[StatKey]) -> String {
    keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

/* ---------------- status ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltseasonStatus {
    BitcoinSeason,
    Neutral,
    ApproachingAltseason,
    Altseason,
}

impl AltseasonStatus {
    /// ≤25 Bitcoin season, 26–68 neutral, 69–74 approaching, ≥75 altseason.
    pub fn classify(value: u8) -> Self {
        match value {
            0..=25 => Self::BitcoinSeason,
            75.. => Self::Altseason,
            69.. => Self::ApproachingAltseason,
            _ => Self::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BitcoinSeason => "Bitcoin season",
            Self::Neutral => "Neutral",
            Self::ApproachingAltseason => "Approaching altseason",
            Self::Altseason => "Altseason",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::BitcoinSeason => "🔵",
            Self::Neutral => "⚪️",
            Self::ApproachingAltseason => "🟡",
            Self::Altseason => "🟢",
        }
    }

    pub fn tip(self) -> &'static str {
        match self {
            Self::BitcoinSeason => "BTC pairs have the edge.",
            Self::Neutral => "No clear edge either way.",
            Self::ApproachingAltseason => "Watch closely: above 69 alts thaw, above 75 is the hot phase.",
            Self::Altseason => "Alts often outrun BTC. Risk is higher.",
        }
    }
}

impl fmt::Display for AltseasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/* ---------------- index ---------------- */

/// Which heuristic produced the index value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexStrategy {
    /// "Altcoin Season Index … N" in the page text
    DirectPattern,
    /// Number closest to an anchor phrase, legend values skipped
    NearestAnchor,
    /// First plausible number in 30–90
    MidRange,
    /// First number 0–100 at all
    FirstNumber,
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DirectPattern => "direct pattern",
            Self::NearestAnchor => "nearest anchor",
            Self::MidRange => "mid-range fallback",
            Self::FirstNumber => "first number",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexPick {
    pub value: u8,
    pub strategy: IndexStrategy,
}

pub const ANCHORS: &[&str] = &["Сейчас", "текущ", "current", "Now", "Altcoin Season Index", "Индекс сезона альткоинов"];

/// Threshold/legend values skipped by the nearest-anchor pick. A live value of exactly
/// 25 or 75 loses to a neighbour there; that is a known limitation.
pub const LEGEND_VALUES: [u8; 4] = [0, 25, 75, 100];

struct PageText {
    text: String,
    /// (value, byte offset) of every standalone 1–3 digit number in 0..=100
    numbers: Vec<(u8, usize)>,
}

impl PageText {
    fn new(html: &str) -> Self {
        let text = visible_text(html);
        let numbers = re!(r"\d+")
            .find_iter(&text)
            .filter(|m| m.as_str().len() <= 3)
            .filter_map(|m| m.as_str().parse::<u8>().ok().filter(|v| *v <= 100).map(|v| (v, m.start())))
            .collect();
        Self { text, numbers }
    }
}

fn anchor_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        ANCHORS
            .iter()
            .filter_map(|a| Regex::new(&format!("(?i){}", regex::escape(a))).ok())
            .collect()
    })
}

fn direct_pattern(p: &PageText) -> Option<u8> {
    let re = re!(r"(?i)(Altcoin\s+Season\s+Index|Индекс\s+сезона\s+альткоинов)[^\d]{0,40}(\d{1,3})");
    let v: u8 = re.captures(&p.text)?.get(2)?.as_str().parse().ok()?;
    (v <= 100).then_some(v)
}

fn nearest_anchor(p: &PageText) -> Option<u8> {
    let anchors: Vec<usize> = anchor_res()
        .iter()
        .flat_map(|re| re.find_iter(&p.text).map(|m| m.start()))
        .collect();
    if anchors.is_empty() || p.numbers.is_empty() {
        return None;
    }
    let dist = |pos: usize| anchors.iter().map(|a| a.abs_diff(pos)).min().unwrap_or(usize::MAX);

    let filtered: Vec<(u8, usize)> = p
        .numbers
        .iter()
        .copied()
        .filter(|(v, _)| !LEGEND_VALUES.contains(v))
        .collect();
    let pool = if filtered.is_empty() { &p.numbers } else { &filtered };
    pool.iter().min_by_key(|(_, pos)| dist(*pos)).map(|(v, _)| *v)
}

fn mid_range(p: &PageText) -> Option<u8> {
    p.numbers
        .iter()
        .map(|(v, _)| *v)
        .find(|v| (30..=90).contains(v) && !LEGEND_VALUES.contains(v))
}

fn first_number(p: &PageText) -> Option<u8> {
    p.numbers.first().map(|(v, _)| *v)
}

const INDEX_STRATEGIES: [(IndexStrategy, fn(&PageText) -> Option<u8>); 4] = [
    (IndexStrategy::DirectPattern, direct_pattern),
    (IndexStrategy::NearestAnchor, nearest_anchor),
    (IndexStrategy::MidRange, mid_range),
    (IndexStrategy::FirstNumber, first_number),
];

/// Find the live index value in a page, trying each strategy in order.
pub fn extract_index(html: &str) -> Result<IndexPick, AltseasonError> {
    let page = PageText::new(html);
    for (strategy, run) in INDEX_STRATEGIES {
        if let Some(value) = run(&page) {
            logd!("altseason index {value} via {strategy}");
            return Ok(IndexPick { value, strategy });
        }
    }
    Err(AltseasonError::IndexNotFound(s!("no numbers 0-100 on the page")))
}

/* ---------------- stats ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKey {
    DaysSinceLast,
    AvgBetween,
    LongestWithout,
    AvgLength,
    LongestLength,
    TotalDays,
}

impl StatKey {
    pub const ALL: [StatKey; 6] = [
        StatKey::DaysSinceLast,
        StatKey::AvgBetween,
        StatKey::LongestWithout,
        StatKey::AvgLength,
        StatKey::LongestLength,
        StatKey::TotalDays,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::DaysSinceLast => "days_since_last",
            StatKey::AvgBetween => "avg_between",
            StatKey::LongestWithout => "longest_without",
            StatKey::AvgLength => "avg_length",
            StatKey::LongestLength => "longest_length",
            StatKey::TotalDays => "total_days",
        }
    }

    /// Display title for summaries.
    pub fn title(self) -> &'static str {
        match self {
            StatKey::DaysSinceLast => "Days since last season",
            StatKey::AvgBetween => "Average days between seasons",
            StatKey::LongestWithout => "Longest stretch without a season",
            StatKey::AvgLength => "Average season length (days)",
            StatKey::LongestLength => "Longest season (days)",
            StatKey::TotalDays => "Total days in season",
        }
    }

    /// Exact label texts seen on the English and Russian pages (matched as substrings).
    fn variants(self) -> &'static [&'static str] {
        match self {
            StatKey::DaysSinceLast => &["days since last season", "дней с прошлого сезона"],
            StatKey::AvgBetween => &["average days between seasons", "среднее количество дней между сезонами"],
            StatKey::LongestWithout => &["longest period without a season", "самая длинная серия без сезона"],
            StatKey::AvgLength => &[
                "average season length (days)",
                "average length of season (days)",
                "средняя продолжительность сезона (дней)",
                "средняя длительность сезона (дней)",
            ],
            StatKey::LongestLength => &["longest season (days)", "самый длинный сезон (дни)"],
            StatKey::TotalDays => &[
                "total number of days in season",
                "total days of season",
                "общее количество дней сезона",
            ],
        }
    }

    /// Keyword bundles; every word of one bundle must appear.
    fn bundles(self) -> &'static [&'static [&'static str]] {
        match self {
            StatKey::DaysSinceLast => &[&["days", "since", "last"], &["дней", "прошлого"]],
            StatKey::AvgBetween => &[&["average", "between"], &["средн", "между"]],
            StatKey::LongestWithout => &[&["longest", "without"], &["самая", "длин", "без"]],
            StatKey::AvgLength => &[&["average", "length"], &["средн", "длитель"]],
            StatKey::LongestLength => &[&["longest", "season"], &["самый", "длин", "сезон"]],
            StatKey::TotalDays => &[&["total", "number", "days"], &["общее", "колич", "дней"]],
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label → key: exact variants first, then keyword bundles. `label` must already be folded.
pub fn match_key(label: &str) -> Option<StatKey> {
    StatKey::ALL
        .into_iter()
        .find(|k| k.variants().iter().any(|v| label.contains(v)))
        .or_else(|| {
            StatKey::ALL
                .into_iter()
                .find(|k| k.bundles().iter().any(|b| b.iter().all(|w| label.contains(w))))
        })
}

/// Digits (and a sign) only; placeholders and empty cells are `None`.
pub fn parse_int(s: &str) -> Option<i64> {
    let t = s.trim();
    if t.is_empty() || ["none", "n/a", "-", "—"].contains(&t.to_lowercase().as_str()) {
        return None;
    }
    let digits: String = t.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
    digits.parse().ok()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatPair {
    pub alt: Option<i64>,
    pub btc: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AltseasonStats {
    pairs: BTreeMap<StatKey, StatPair>,
}

impl AltseasonStats {
    pub fn get(&self, key: StatKey) -> StatPair {
        self.pairs.get(&key).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKey, StatPair)> + '_ {
        self.pairs.iter().map(|(k, v)| (*k, *v))
    }

    /// Required keys that never matched, in name order.
    pub fn missing(&self) -> Vec<StatKey> {
        let mut m: Vec<StatKey> = StatKey::ALL.into_iter().filter(|k| !self.pairs.contains_key(k)).collect();
        m.sort_by_key(|k| k.as_str());
        m
    }
}

fn is_stats_table(t: &Table) -> bool {
    let Some(first) = t.rows.first() else { return false };
    let cols = first.texts();
    if cols.len() != 3 {
        return false;
    }
    let (h2, h3) = (fold(cols[1]), fold(cols[2]));
    (h2.contains("altcoin") && h3.contains("bitcoin")) || (h2.contains("альт") && h3.contains("биткоин"))
}

/// The stats table after the index heading, else the first table of that shape anywhere.
pub fn find_stats_table<'d>(doc: &'d Document<'_>) -> Option<&'d Table> {
    let heading = doc.find_text(re!(r"(?i)(Altcoin\s+Season\s+Index|Индекс\s+сезона\s+альткоинов)"));
    heading
        .and_then(|at| doc.tables.iter().find(|t| t.offset > at && is_stats_table(t)))
        .or_else(|| {
            logd!("no stats table after the index heading, scanning all tables");
            doc.tables.iter().find(|t| is_stats_table(t))
        })
}

pub fn extract_stats(html: &str) -> Result<AltseasonStats, AltseasonError> {
    let doc = Document::parse(html)?;
    let table = find_stats_table(&doc).ok_or(AltseasonError::StatsTableNotFound)?;

    let mut stats = AltseasonStats::default();
    for row in table.rows.iter().skip(1) {
        let cells = row.texts();
        if cells.len() != 3 {
            continue;
        }
        if let Some(key) = match_key(&fold(cells[0])) {
            stats.pairs.insert(key, StatPair { alt: parse_int(cells[1]), btc: parse_int(cells[2]) });
        }
    }

    let missing = stats.missing();
    if !missing.is_empty() {
        return Err(AltseasonError::MissingMetrics(missing));
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries() {
        use AltseasonStatus::*;
        let cases = [(0, BitcoinSeason), (25, BitcoinSeason), (26, Neutral), (68, Neutral),
                     (69, ApproachingAltseason), (74, ApproachingAltseason), (75, Altseason), (100, Altseason)];
        for (v, want) in cases {
            assert_eq!(AltseasonStatus::classify(v), want, "{v}");
        }
    }

    #[test]
    fn direct_pattern_first() {
        let html = "<h1>Altcoin Season Index</h1><div class='value'>: 57</div><span>25</span><span>75</span>";
        let pick = extract_index(html).unwrap();
        assert_eq!(pick, IndexPick { value: 57, strategy: IndexStrategy::DirectPattern });
    }

    #[test]
    fn nearest_anchor_skips_legend_values() {
        // title is too far from the number for the direct pattern
        let filler = "x".repeat(60);
        let html = format!(
            "<h1>Altcoin Season Index</h1><p>{filler}</p><p>0 25 75 100</p><p>Now 25 ... 41</p>"
        );
        let pick = extract_index(&html).unwrap();
        assert_eq!(pick, IndexPick { value: 41, strategy: IndexStrategy::NearestAnchor });
    }

    #[test]
    fn fallbacks_without_anchors() {
        let pick = extract_index("<p>Scale 10 20 25 55 80</p>").unwrap();
        assert_eq!(pick, IndexPick { value: 55, strategy: IndexStrategy::MidRange });
        let pick = extract_index("<p>Scale 10 20 95</p>").unwrap();
        assert_eq!(pick, IndexPick { value: 10, strategy: IndexStrategy::FirstNumber });
        assert!(matches!(extract_index("<p>1234 5678</p>"), Err(AltseasonError::IndexNotFound(_))));
    }

    #[test]
    fn label_matching() {
        assert_eq!(match_key("days since last season"), Some(StatKey::DaysSinceLast));
        assert_eq!(match_key("average length of season (days)"), Some(StatKey::AvgLength));
        assert_eq!(match_key("самая длинная серия без сезона"), Some(StatKey::LongestWithout));
        // fuzzy bundle
        assert_eq!(match_key("total number of days spent in a season"), Some(StatKey::TotalDays));
        assert_eq!(match_key("market cap"), None);
    }

    #[test]
    fn int_cells() {
        assert_eq!(parse_int(" 1,234 days"), Some(1234));
        assert_eq!(parse_int("—"), None);
        assert_eq!(parse_int("N/A"), None);
        assert_eq!(parse_int("soon"), None);
    }

    fn stats_page(skip: Option<&str>) -> String {
        let rows = [
            ("Days since last season", 259, 47),
            ("Average days between seasons", 66, 17),
            ("Longest period without a season", 486, 191),
            ("Average season length (days)", 18, 10),
            ("Longest season (days)", 117, 126),
            ("Total number of days in season", 404, 953),
        ];
        let body: String = rows
            .iter()
            .filter(|(l, ..)| Some(*l) != skip)
            .map(|(l, a, b)| format!("<tr><td>{l}</td><td>{a}</td><td>{b}</td></tr>"))
            .collect();
        format!(
            "<table><tr><th></th><th>Altcoin</th><th>Bitcoin</th></tr><tr><td>decoy</td><td>1</td><td>2</td></tr></table>\
             <h2>Altcoin Season Index</h2>\
             <table><tr><th>Metric</th><th>Altcoin Season</th><th>Bitcoin Season</th></tr>{body}</table>"
        )
    }

    #[test]
    fn stats_table_after_heading() {
        let s = extract_stats(&stats_page(None)).unwrap();
        assert_eq!(s.get(StatKey::DaysSinceLast), StatPair { alt: Some(259), btc: Some(47) });
        assert_eq!(s.get(StatKey::TotalDays).btc, Some(953));
        assert_eq!(s.iter().count(), 6);
    }

    #[test]
    fn missing_metric_is_named_alone() {
        let err = extract_stats(&stats_page(Some("Longest season (days)"))).unwrap_err();
        assert_eq!(err, AltseasonError::MissingMetrics(vec![StatKey::LongestLength]));
        assert_eq!(err.to_string(), "stats table is missing metrics: longest_length");
    }

    #[test]
    fn script_table_markup_does_not_break_stats() {
        let page = format!("<script>document.write('<table>')</script>{}", stats_page(None));
        let s = extract_stats(&page).unwrap();
        assert_eq!(s.get(StatKey::DaysSinceLast), StatPair { alt: Some(259), btc: Some(47) });
    }

    #[test]
    fn no_stats_table() {
        let err = extract_stats("<table><tr><td>a</td><td>b</td></tr></table>").unwrap_err();
        assert_eq!(err, AltseasonError::StatsTableNotFound);
    }
}
