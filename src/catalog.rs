// src/catalog.rs
// Indicator definitions: the fixed built-in set plus per-chat customs, merged on demand.

use crate::signal::Rule;

#[derive(Clone, Debug)]
pub struct IndicatorDef {
    pub key: String,
    pub title: String,
    pub url: String,
    pub rule: Rule,
}

impl IndicatorDef {
    pub fn new(key: &str, title: &str, url: &str, rule: Rule) -> Self {
        Self { key: s!(key), title: s!(title), url: s!(url), rule }
    }
}

// (key, title, url, rule code). Rule assignment per indicator is data: inflation and activity
// prints read LT, slack prints read GT.
const BUILTINS: [(&str, &str, &str, &str); 10] = [
    ("CPI", "Consumer Price Index (CPI / Core CPI)",
        "https://www.investing.com/economic-calendar/core-cpi-56", "LT"),
    ("PPI", "Producer Price Index (PPI)",
        "https://ru.investing.com/economic-calendar/ppi-238", "LT"),
    ("CORE_PCE", "Core PCE Price Index (m/m)",
        "https://ru.investing.com/economic-calendar/core-pce-price-index-61", "LT"),
    ("NFP", "Nonfarm Payrolls (NFP)",
        "https://www.investing.com/economic-calendar/nonfarm-payrolls-227", "LT"),
    ("RETAIL_SALES", "Retail Sales",
        "https://www.investing.com/economic-calendar/retail-sales-256", "LT"),
    ("UNEMPLOYMENT", "Unemployment Rate",
        "https://www.investing.com/economic-calendar/unemployment-rate-300", "GT"),
    ("JOBLESS_CLAIMS", "Initial Jobless Claims",
        "https://www.investing.com/economic-calendar/initial-jobless-claims-294", "GT"),
    ("CRUDE_OIL_INV", "Crude Oil Inventories (EIA)",
        "https://www.investing.com/economic-calendar/eia-crude-oil-inventories-75", "GT"),
    ("ISM_MANUFACTURING_PMI", "ISM Manufacturing PMI",
        "https://ru.investing.com/economic-calendar/ism-manufacturing-pmi-173", "LT"),
    ("FOMC_RATE", "Fed Interest Rate Decision",
        "https://ru.investing.com/economic-calendar/interest-rate-decision-168", "FOMC"),
];

pub fn builtins() -> Vec<IndicatorDef> {
    BUILTINS
        .iter()
        .map(|(key, title, url, rule)| IndicatorDef::new(key, title, url, Rule::from_code(rule)))
        .collect()
}

/// `CUSTOM_` + first 10 hex chars (upper-case) of md5("{chat_id}:{title}").
pub fn custom_key(chat_id: i64, title: &str) -> String {
    let digest = md5::compute(format!("{chat_id}:{}", title.trim()));
    let hex = format!("{digest:x}");
    join!("CUSTOM_", &hex[..10].to_ascii_uppercase())
}

/// Merged, ordered view over built-ins and one chat's customs.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<IndicatorDef>,
}

impl Catalog {
    pub fn get(&self, key: &str) -> Option<&IndicatorDef> {
        self.entries.iter().find(|d| d.key.eq_ignore_ascii_case(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDef> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Built-ins keep their order; customs follow sorted by title (case-insensitive).
/// A custom whose key matches a built-in replaces it in place.
pub fn merge_catalog(builtins: &[IndicatorDef], customs: &[IndicatorDef]) -> Catalog {
    let mut entries: Vec<IndicatorDef> = builtins.to_vec();
    let mut extra: Vec<&IndicatorDef> = customs.iter().collect();
    extra.sort_by_key(|d| d.title.to_lowercase());

    for c in extra {
        match entries.iter_mut().find(|e| e.key == c.key) {
            Some(slot) => *slot = c.clone(),
            None => entries.push(c.clone()),
        }
    }
    Catalog { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_are_fixed_data() {
        let b = builtins();
        assert_eq!(b.len(), 10);
        let code = |k: &str| b.iter().find(|d| d.key == k).map(|d| s!(d.rule.code()));
        assert_eq!(code("CPI").as_deref(), Some("LT"));
        assert_eq!(code("UNEMPLOYMENT").as_deref(), Some("GT"));
        assert_eq!(code("JOBLESS_CLAIMS").as_deref(), Some("GT"));
        assert_eq!(code("FOMC_RATE").as_deref(), Some("FOMC"));
    }

    #[test]
    fn custom_keys_are_stable() {
        let k = custom_key(42, "My PMI");
        assert_eq!(k, custom_key(42, "  My PMI "));
        assert_ne!(k, custom_key(43, "My PMI"));
        assert!(k.starts_with("CUSTOM_"));
        assert_eq!(k.len(), "CUSTOM_".len() + 10);
        assert!(k[7..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(custom_key(1, "abc"), "CUSTOM_3560F4D3CD");
    }

    #[test]
    fn merge_orders_and_overrides() {
        let customs = vec![
            IndicatorDef::new("CUSTOM_B", "beta", "u", Rule::Gt),
            IndicatorDef::new("CUSTOM_A", "Alpha", "u", Rule::Lt),
            IndicatorDef::new("CPI", "My CPI", "u2", Rule::Gt),
        ];
        let cat = merge_catalog(&builtins(), &customs);
        assert_eq!(cat.len(), 12);
        let keys = cat.keys();
        assert_eq!(keys[0], "CPI");
        assert_eq!(&keys[10..], &["CUSTOM_A", "CUSTOM_B"]);
        assert_eq!(cat.get("cpi").map(|d| d.title.as_str()), Some("My CPI"));
    }
}
