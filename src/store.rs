// src/store.rs
// File-backed state: a key/value table for per-chat settings and the per-chat custom
// indicator list. Both are small CSV files under the store directory, rewritten whole
// on every change.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::catalog::{custom_key, IndicatorDef};
use crate::config::consts::{CUSTOM_FILE, STATE_FILE, STORE_SEP};
use crate::csv::{parse_records, records_to_string, Record};
use crate::signal::Rule;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O on {}: {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),
    #[error("malformed line {line} in {}", .path.display())]
    Malformed { path: PathBuf, line: usize },
}

/// `get`/`set` of opaque strings.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Custom indicators keyed by `(chat_id, title)`.
pub trait CustomIndicators {
    /// Insert or replace; returns the derived key.
    fn add(&self, chat_id: i64, title: &str, url: &str, rule: &str) -> Result<String, StoreError>;
    /// Returns how many entries were removed (0 or 1).
    fn delete_by_title(&self, chat_id: i64, title: &str) -> Result<usize, StoreError>;
    /// Sorted by title.
    fn list(&self, chat_id: i64) -> Result<Vec<IndicatorDef>, StoreError>;
}

fn read_records(path: &Path) -> Result<Vec<Record>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_records(&text, STORE_SEP)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StoreError::Io(path.to_path_buf(), e)),
    }
}

fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(parent.to_path_buf(), e))?;
        }
    }
    // write-then-rename so a crash never leaves half a file
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, records_to_string(rows, STORE_SEP)).map_err(|e| StoreError::Io(tmp.clone(), e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::Io(path.to_path_buf(), e))?;
    logd!("store: wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/* ---------------- key/value ---------------- */

/// One `key,value` line per entry.
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    pub fn open(dir: &Path) -> Self {
        Self { path: dir.join(STATE_FILE) }
    }

    fn load(&self) -> Result<Vec<(String, String)>, StoreError> {
        read_records(&self.path)?
            .into_iter()
            .map(|rec| match <[String; 2]>::try_from(rec.fields) {
                Ok([k, v]) => Ok((k, v)),
                Err(_) => Err(StoreError::Malformed { path: self.path.clone(), line: rec.line }),
            })
            .collect()
    }
}

impl StateStore for KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.into_iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = s!(value),
            None => entries.push((s!(key), s!(value))),
        }
        let rows: Vec<Vec<String>> = entries.into_iter().map(|(k, v)| vec![k, v]).collect();
        write_rows(&self.path, &rows)
    }
}

/* ---------------- custom indicators ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
struct CustomRecord {
    chat_id: i64,
    key: String,
    title: String,
    url: String,
    rule: String,
}

impl CustomRecord {
    fn to_row(&self) -> Vec<String> {
        vec![self.chat_id.to_string(), self.key.clone(), self.title.clone(), self.url.clone(), self.rule.clone()]
    }

    fn to_def(&self) -> IndicatorDef {
        IndicatorDef::new(&self.key, &self.title, &self.url, Rule::from_code(&self.rule))
    }
}

/// Columns: chat_id, key, title, url, rule code.
pub struct CustomIndicatorStore {
    path: PathBuf,
}

impl CustomIndicatorStore {
    pub fn open(dir: &Path) -> Self {
        Self { path: dir.join(CUSTOM_FILE) }
    }

    fn load(&self) -> Result<Vec<CustomRecord>, StoreError> {
        read_records(&self.path)?
            .into_iter()
            .map(|rec| {
                let bad = || StoreError::Malformed { path: self.path.clone(), line: rec.line };
                let [chat, key, title, url, rule]: [String; 5] = rec.fields.try_into().map_err(|_| bad())?;
                let chat_id = chat.trim().parse().map_err(|_| bad())?;
                Ok(CustomRecord { chat_id, key, title, url, rule })
            })
            .collect()
    }

    fn save(&self, records: &[CustomRecord]) -> Result<(), StoreError> {
        let rows: Vec<Vec<String>> = records.iter().map(CustomRecord::to_row).collect();
        write_rows(&self.path, &rows)
    }
}

impl CustomIndicators for CustomIndicatorStore {
    fn add(&self, chat_id: i64, title: &str, url: &str, rule: &str) -> Result<String, StoreError> {
        let title = title.trim();
        let key = custom_key(chat_id, title);
        let rec = CustomRecord {
            chat_id,
            key: key.clone(),
            title: s!(title),
            url: s!(url.trim()),
            rule: rule.trim().to_ascii_uppercase(),
        };

        let mut all = self.load()?;
        // same chat + same title (hence same key) is a replace
        all.retain(|r| !(r.chat_id == chat_id && (r.key == key || r.title == rec.title)));
        all.push(rec);
        self.save(&all)?;
        logf!("custom indicator {key} saved for chat {chat_id}");
        Ok(key)
    }

    fn delete_by_title(&self, chat_id: i64, title: &str) -> Result<usize, StoreError> {
        let title = title.trim();
        let mut all = self.load()?;
        let before = all.len();
        all.retain(|r| !(r.chat_id == chat_id && r.title == title));
        let removed = before - all.len();
        if removed > 0 {
            self.save(&all)?;
        }
        Ok(removed)
    }

    fn list(&self, chat_id: i64) -> Result<Vec<IndicatorDef>, StoreError> {
        let mut mine: Vec<CustomRecord> = self.load()?.into_iter().filter(|r| r.chat_id == chat_id).collect();
        mine.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(mine.iter().map(CustomRecord::to_def).collect())
    }
}
