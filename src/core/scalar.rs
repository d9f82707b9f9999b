// src/core/scalar.rs
// Cell text → (value, unit). Values are stored in base units: "3.2M" is 3_200_000 tagged Million.

use std::fmt;

use super::sanitize::normalize_ws;

/// Shown for a missing value. Itself a no-data token, so it parses back to an empty scalar.
pub const PENDING: &str = "pending";

const NO_DATA: &[&str] = &["—", "–", "−", "-", "•", "", "n/a", "na", "—/—", "waiting", "pending"];

const NOISE: &[&str] = &[
    "bbl", "barrel", "barrels", "jobs", "claims", "inventories", "units",
    "mom", "qoq", "yoy", "mtm", "m/m", "y/y", "q/q",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    Percent,
    Thousand,
    Million,
    Billion,
    Trillion,
}

impl Unit {
    pub fn scale(self) -> f64 {
        match self {
            Unit::Percent => 1.0,
            Unit::Thousand => 1e3,
            Unit::Million => 1e6,
            Unit::Billion => 1e9,
            Unit::Trillion => 1e12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Percent => "percent",
            Unit::Thousand => "thousand",
            Unit::Million => "million",
            Unit::Billion => "billion",
            Unit::Trillion => "trillion",
        }
    }

    /// Alias lookup on a lowercased token with dots already stripped.
    pub fn from_alias(tok: &str) -> Option<Unit> {
        let u = match tok {
            "%" | "percent" | "проц" => Unit::Percent,
            "k" | "thousand" | "ths" | "тыс" => Unit::Thousand,
            "m" | "mln" | "million" | "млн" | "mio" => Unit::Million,
            "b" | "bn" | "bln" | "billion" | "млрд" => Unit::Billion,
            "t" | "trn" | "trillion" => Unit::Trillion,
            _ => return None,
        };
        Some(u)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scalar {
    pub value: Option<f64>,
    pub unit: Option<Unit>,
}

impl Scalar {
    pub const EMPTY: Scalar = Scalar { value: None, unit: None };

    pub fn new(value: f64, unit: Option<Unit>) -> Self {
        Self { value: Some(value), unit }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scalar(self.value, self.unit))
    }
}

fn is_no_data(s: &str) -> bool {
    let lc = s.to_lowercase();
    NO_DATA.contains(&lc.as_str())
}

/// Parse one raw cell. Never fails: anything unreadable is `Scalar::EMPTY`.
pub fn normalize(text: &str) -> Scalar {
    let raw = normalize_ws(text);
    if is_no_data(&raw) {
        return Scalar::EMPTY;
    }

    let num_re = re!(r"[+\-−]?\s*\d+(?:[ \x{00A0}\x{202F},]\d{3})*(?:[.,]\d+)?");
    let Some(m) = num_re.find(&raw) else {
        return Scalar::EMPTY;
    };

    let paren_neg = raw.starts_with('(') && raw.ends_with(')');
    let Some(num) = to_float(m.as_str(), paren_neg) else {
        return Scalar::EMPTY;
    };

    match unit_of(&raw.to_lowercase(), m.end()) {
        Some(u) => Scalar::new(num * u.scale(), Some(u)),
        None => Scalar::new(num, None),
    }
}

fn to_float(num: &str, paren_neg: bool) -> Option<f64> {
    let mut t: String = num
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '−' { '-' } else { c })
        .collect();

    let commas = t.matches(',').count();
    if commas > 0 {
        if t.contains('.') || commas > 1 {
            t = t.replace(',', "");
        } else {
            t = t.replace(',', ".");
        }
    }

    let v: f64 = t.parse().ok()?;
    Some(if paren_neg { -v.abs() } else { v })
}

/// `num_end` is the byte end of the number match; lowercasing keeps Latin/Cyrillic offsets.
fn unit_of(lc: &str, num_end: usize) -> Option<Unit> {
    if lc.contains('%') {
        return Some(Unit::Percent);
    }
    for tok in re!(r"[a-zа-яё.%]+").find_iter(lc) {
        let t = tok.as_str().trim_matches('.');
        if NOISE.contains(&t) {
            continue;
        }
        if let Some(u) = Unit::from_alias(t) {
            return Some(u);
        }
    }

    // glued suffix right after the number, e.g. "3.2M"
    let tail = lc.get(num_end..)?
        .trim()
        .trim_matches(|c| "()[]{}:;".contains(c));
    let suf = re!(r"^[a-zа-яё.%]{1,7}").find(tail)?;
    Unit::from_alias(suf.as_str().trim_matches('.'))
}

/// Compact display: `x%` for percent, else the largest of T/B/M/K that fits, two decimals
/// with trailing zeros dropped. Missing values print as [`PENDING`].
pub fn format_scalar(value: Option<f64>, unit: Option<Unit>) -> String {
    let Some(v) = value else {
        return PENDING.to_string();
    };
    if unit == Some(Unit::Percent) {
        return join!(&two_dp(v), "%");
    }
    let a = v.abs();
    for (scale, suffix) in [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")] {
        if a >= scale {
            return join!(&two_dp(v / scale), suffix);
        }
    }
    two_dp(v)
}

fn two_dp(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { s!("0") } else { s!(s) }
}

/// A trailing "revised from X" (or the Russian phrasing) inside a cell, parsed as its own scalar.
pub fn parse_revised(text: &str) -> Option<Scalar> {
    let caps = re!(r"(?i)(?:revised\s+from|пересмотрено\s+с)\s+(\S.*)").captures(text)?;
    let sc = normalize(caps.get(1)?.as_str());
    (!sc.is_empty()).then_some(sc)
}
