// src/signal.rs
// Directional label for one release row under an indicator's rule.

use std::fmt;
use std::sync::Arc;

use crate::specs::calendar::IndicatorRow;

pub type Comparator = Arc<dyn Fn(&IndicatorRow) -> Signal + Send + Sync>;

/// How a release is read.
///
/// * `Lt`  : actual below forecast is bullish (inflation/activity prints)
/// * `Gt`  : actual above forecast is bullish (slack prints: unemployment, claims, inventories)
/// * `Fomc`: policy rate against the previous decision
#[derive(Clone)]
pub enum Rule {
    Lt,
    Gt,
    Fomc,
    Custom(Comparator),
    /// A stored rule code nobody understands; evaluates to a descriptive label.
    Unrecognized(String),
}

impl Rule {
    /// Parse a stored rule code (`LT`, `GT`, `FOMC`, any case).
    pub fn from_code(code: &str) -> Rule {
        match code.trim().to_ascii_uppercase().as_str() {
            "LT" => Rule::Lt,
            "GT" => Rule::Gt,
            "FOMC" => Rule::Fomc,
            _ => Rule::Unrecognized(s!(code.trim())),
        }
    }

    pub fn custom<F>(f: F) -> Rule
    where
        F: Fn(&IndicatorRow) -> Signal + Send + Sync + 'static,
    {
        Rule::Custom(Arc::new(f))
    }

    pub fn code(&self) -> &str {
        match self {
            Rule::Lt => "LT",
            Rule::Gt => "GT",
            Rule::Fomc => "FOMC",
            Rule::Custom(_) => "CUSTOM",
            Rule::Unrecognized(c) => c,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Unrecognized(c) => write!(f, "Unrecognized({c:?})"),
            other => f.write_str(other.code()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    Neutral,
    OnForecast,
    RateHike,
    RateCut,
    RateUnchanged,
    UnrecognizedRule(String),
}

impl Signal {
    pub fn label(&self) -> String {
        match self {
            Signal::Long => s!("LONG"),
            Signal::Short => s!("SHORT"),
            Signal::Neutral => s!("NEUTRAL"),
            Signal::OnForecast => s!("on forecast"),
            Signal::RateHike => s!("rate hike"),
            Signal::RateCut => s!("rate cut"),
            Signal::RateUnchanged => s!("unchanged"),
            Signal::UnrecognizedRule(code) => format!("rule {code} not recognized"),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn compare(a: Option<f64>, b: Option<f64>, below: Signal, above: Signal, equal: Signal) -> Signal {
    match (a, b) {
        (Some(a), Some(b)) if a < b => below,
        (Some(a), Some(b)) if a > b => above,
        (Some(_), Some(_)) => equal,
        _ => Signal::Neutral,
    }
}

/// Never panics: missing figures give `Neutral`, unknown rules a descriptive label.
pub fn evaluate(row: &IndicatorRow, rule: &Rule) -> Signal {
    let (a, f, p) = (row.actual.value, row.forecast.value, row.previous.value);
    match rule {
        Rule::Lt => compare(a, f, Signal::Long, Signal::Short, Signal::OnForecast),
        Rule::Gt => compare(a, f, Signal::Short, Signal::Long, Signal::OnForecast),
        Rule::Fomc => compare(a, p, Signal::RateCut, Signal::RateHike, Signal::RateUnchanged),
        Rule::Custom(cmp) => cmp(row),
        Rule::Unrecognized(code) => Signal::UnrecognizedRule(code.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scalar::Scalar;
    use crate::specs::calendar::{ColumnIndexing, IndicatorRow};

    fn row(actual: Option<f64>, forecast: Option<f64>, previous: Option<f64>) -> IndicatorRow {
        let cells = ["16.10.2025", "15:30", "", "", ""];
        let mut r = IndicatorRow::from_cells(&cells, &ColumnIndexing::resolve::<&str>(&[]), chrono_tz::UTC);
        r.actual = Scalar { value: actual, unit: None };
        r.forecast = Scalar { value: forecast, unit: None };
        r.previous = Scalar { value: previous, unit: None };
        r
    }

    #[test]
    fn lt_rule() {
        assert_eq!(evaluate(&row(Some(2.0), Some(3.0), None), &Rule::Lt), Signal::Long);
        assert_eq!(evaluate(&row(Some(4.0), Some(3.0), None), &Rule::Lt), Signal::Short);
        assert_eq!(evaluate(&row(Some(3.0), Some(3.0), None), &Rule::Lt), Signal::OnForecast);
        assert_eq!(evaluate(&row(Some(2.0), None, Some(1.0)), &Rule::Lt), Signal::Neutral);
    }

    #[test]
    fn gt_rule() {
        assert_eq!(evaluate(&row(Some(4.0), Some(3.0), None), &Rule::Gt), Signal::Long);
        assert_eq!(evaluate(&row(Some(2.0), Some(3.0), None), &Rule::Gt), Signal::Short);
        assert_eq!(evaluate(&row(None, Some(3.0), None), &Rule::Gt), Signal::Neutral);
    }

    #[test]
    fn fomc_compares_with_previous() {
        assert_eq!(evaluate(&row(Some(5.5), Some(5.0), Some(5.25)), &Rule::Fomc), Signal::RateHike);
        assert_eq!(evaluate(&row(Some(5.0), Some(5.5), Some(5.25)), &Rule::Fomc), Signal::RateCut);
        assert_eq!(evaluate(&row(Some(5.25), None, Some(5.25)), &Rule::Fomc), Signal::RateUnchanged);
        assert_eq!(evaluate(&row(Some(5.25), Some(5.0), None), &Rule::Fomc), Signal::Neutral);
    }

    #[test]
    fn codes_and_custom_rules() {
        assert_eq!(Rule::from_code(" gt ").code(), "GT");
        let r = Rule::from_code("XYZ");
        let sig = evaluate(&row(Some(1.0), Some(2.0), None), &r);
        assert_eq!(sig.label(), "rule XYZ not recognized");

        let always_long = Rule::custom(|_| Signal::Long);
        assert_eq!(evaluate(&row(None, None, None), &always_long), Signal::Long);
    }
}
