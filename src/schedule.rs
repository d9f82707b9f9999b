// src/schedule.rs
// Per-chat, per-indicator auto-report settings and the cron-style trigger they describe.
// Firing the trigger is the caller's job; this module only parses, stores and computes
// the next slot.
use std::fmt;

use chrono::{DateTime, Datelike, Days as DayStep, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use thiserror::Error;

use crate::config::consts::DEFAULT_INDICATOR;
use crate::store::{StateStore, StoreError};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("time must be HH:MM (00:00–23:59), got {0:?}")]
    BadTime(String),
    #[error("days not recognized: {0:?} (try mon-fri, sat,sun or daily)")]
    BadDays(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/* ---------------- state keys ---------------- */

pub fn key_enabled(chat: i64, ind: &str) -> String {
    format!("sched2:enabled:{chat}:{ind}")
}

pub fn key_time(chat: i64, ind: &str) -> String {
    format!("sched2:time:{chat}:{ind}")
}

pub fn key_days(chat: i64, ind: &str) -> String {
    format!("sched2:days:{chat}:{ind}")
}

/// Which indicator the chat is currently configuring.
pub fn key_current(chat: i64) -> String {
    format!("sched2:current_ind:{chat}")
}

/* ---------------- parsing ---------------- */

/// `H:MM` or `HH:MM`, hours 0–23, minutes 0–59.
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let caps = re!(r"^([01]?\d|2[0-3]):([0-5]\d)$").captures(s.trim())?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

const DAILY: [&str; 4] = ["daily", "every day", "ежедневно", "каждый день"];

fn day_code(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// English codes/names and Russian abbreviations.
fn parse_day(tok: &str) -> Option<Weekday> {
    let d = match tok {
        "пн" | "пон" => Weekday::Mon,
        "вт" => Weekday::Tue,
        "ср" | "сред" => Weekday::Wed,
        "чт" | "чет" => Weekday::Thu,
        "пт" | "пят" => Weekday::Fri,
        "сб" | "суб" => Weekday::Sat,
        "вс" | "воск" => Weekday::Sun,
        t if t.is_ascii() && t.len() >= 3 => {
            let d: Weekday = t[..3].parse().ok()?;
            // "thurs" and "monday" are days, "monkey" isn't
            if !full_name(d).starts_with(t) {
                return None;
            }
            d
        }
        _ => return None,
    };
    Some(d)
}

fn full_name(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Day-of-week set as the scheduler takes it: one range or a list of single days.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DaySet {
    Range(Weekday, Weekday),
    List(Vec<Weekday>),
}

impl DaySet {
    pub fn parse(s: &str) -> Option<DaySet> {
        let lc = s.trim().to_lowercase();
        if lc.is_empty() {
            return None;
        }
        if DAILY.contains(&lc.as_str()) {
            return Some(DaySet::Range(Weekday::Mon, Weekday::Sun));
        }
        let compact: String = lc.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact.replace(['–', '—'], "-");

        if let Some((a, b)) = compact.split_once('-') {
            return Some(DaySet::Range(parse_day(a)?, parse_day(b)?));
        }
        let days: Option<Vec<Weekday>> = compact.split(',').filter(|p| !p.is_empty()).map(parse_day).collect();
        days.filter(|d| !d.is_empty()).map(DaySet::List)
    }

    pub fn contains(&self, d: Weekday) -> bool {
        match self {
            DaySet::Range(a, b) => {
                let (a, b, x) = (a.num_days_from_monday(), b.num_days_from_monday(), d.num_days_from_monday());
                if a <= b { (a..=b).contains(&x) } else { x >= a || x <= b }
            }
            DaySet::List(v) => v.contains(&d),
        }
    }

    pub fn is_every_day(&self) -> bool {
        matches!(self, DaySet::Range(Weekday::Mon, Weekday::Sun))
    }

    /// Human form: "every day", "Mon–Fri", "Sat, Sun".
    pub fn describe(&self) -> String {
        let cap = |d: Weekday| format!("{d:?}");
        match self {
            _ if self.is_every_day() => s!("every day"),
            DaySet::Range(a, b) => format!("{}–{}", cap(*a), cap(*b)),
            DaySet::List(v) => v.iter().map(|d| cap(*d)).collect::<Vec<_>>().join(", "),
        }
    }
}

/// Stored form: `mon-sun`, `mon-fri`, `sat,sun`.
impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySet::Range(a, b) => write!(f, "{}-{}", day_code(*a), day_code(*b)),
            DaySet::List(v) => {
                let codes: Vec<&str> = v.iter().map(|d| day_code(*d)).collect();
                f.write_str(&codes.join(","))
            }
        }
    }
}

/// Canonical stored form of a user's days input, or `None` when it isn't recognized.
pub fn normalize_days(s: &str) -> Option<String> {
    DaySet::parse(s).map(|d| d.to_string())
}

/* ---------------- trigger ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub hour: u32,
    pub minute: u32,
    pub days: DaySet,
}

impl Trigger {
    /// Nothing fires unless the entry is enabled and has a valid time and days.
    pub fn load(store: &dyn StateStore, chat: i64, ind: &str) -> Result<Option<Trigger>, StoreError> {
        if store.get(&key_enabled(chat, ind))?.as_deref() != Some("1") {
            logd!("schedule {chat}/{ind}: disabled");
            return Ok(None);
        }
        let time = store.get(&key_time(chat, ind))?.unwrap_or_default();
        let days = store.get(&key_days(chat, ind))?.unwrap_or_default();

        let Some((hour, minute)) = parse_hhmm(&time) else {
            logw!("schedule {chat}/{ind}: bad or missing time {time:?}");
            return Ok(None);
        };
        let Some(days) = DaySet::parse(&days) else {
            logw!("schedule {chat}/{ind}: bad or missing days {days:?}");
            return Ok(None);
        };
        Ok(Some(Trigger { hour, minute, days }))
    }

    /// First slot strictly after `now`, in `tz`. Local times skipped by a DST jump are skipped.
    pub fn next_fire<T: TimeZone>(&self, now: &DateTime<T>, tz: Tz) -> Option<DateTime<Tz>> {
        let now = now.with_timezone(&tz);
        let at = NaiveTime::from_hms_opt(self.hour, self.minute, 0)?;
        (0..=7u64)
            .filter_map(|i| now.date_naive().checked_add_days(DayStep::new(i)))
            .filter(|d| self.days.contains(d.weekday()))
            .filter_map(|d| tz.from_local_datetime(&d.and_time(at)).earliest())
            .find(|t| *t > now)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02} {}", self.hour, self.minute, self.days.describe())
    }
}

/* ---------------- settings ---------------- */

/// Raw stored settings for one chat + indicator, for overviews.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub time: Option<String>,
    pub days: Option<String>,
}

impl Settings {
    pub fn load(store: &dyn StateStore, chat: i64, ind: &str) -> Result<Settings, StoreError> {
        Ok(Settings {
            enabled: store.get(&key_enabled(chat, ind))?.as_deref() == Some("1"),
            time: store.get(&key_time(chat, ind))?,
            days: store.get(&key_days(chat, ind))?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.time.is_some() || self.days.is_some()
    }
}

pub fn current_indicator(store: &dyn StateStore, chat: i64) -> Result<String, StoreError> {
    Ok(store.get(&key_current(chat))?.unwrap_or_else(|| s!(DEFAULT_INDICATOR)))
}

pub fn select_indicator(store: &dyn StateStore, chat: i64, ind: &str) -> Result<(), StoreError> {
    store.set(&key_current(chat), ind)
}

pub fn set_time(store: &dyn StateStore, chat: i64, ind: &str, text: &str) -> Result<(u32, u32), ScheduleError> {
    let hm = parse_hhmm(text).ok_or_else(|| ScheduleError::BadTime(s!(text.trim())))?;
    store.set(&key_time(chat, ind), &format!("{:02}:{:02}", hm.0, hm.1))?;
    Ok(hm)
}

pub fn set_days(store: &dyn StateStore, chat: i64, ind: &str, text: &str) -> Result<DaySet, ScheduleError> {
    let days = DaySet::parse(text).ok_or_else(|| ScheduleError::BadDays(s!(text.trim())))?;
    store.set(&key_days(chat, ind), &days.to_string())?;
    Ok(days)
}

pub fn set_enabled(store: &dyn StateStore, chat: i64, ind: &str, on: bool) -> Result<(), StoreError> {
    store.set(&key_enabled(chat, ind), if on { "1" } else { "0" })
}
