// src/config/options.rs
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use super::consts::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),
    #[error("config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),
    #[error("unknown time zone {0:?}")]
    TimeZone(String),
}

/// Where the options came from, for the startup log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Local(PathBuf),
    Defaults,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub net: NetOptions,
    pub calendar: CalendarOptions,
    pub render: RenderOptions,
    pub altseason: AltseasonOptions,
    pub store: StoreOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetOptions {
    pub attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            attempts: NET_ATTEMPTS,
            backoff_ms: NET_BACKOFF_MS,
            timeout_secs: NET_TIMEOUT_SECS,
            user_agent: s!(USER_AGENT),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CalendarOptions {
    pub row_limit: usize,
    /// IANA name used for release timestamps
    pub tz: String,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self { row_limit: ROW_LIMIT, tz: s!(DEFAULT_TZ) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub text_rows: usize,
    pub png_rows: usize,
    pub text_widths: [usize; 5],
    /// Font file overrides, tried before the built-in candidate lists
    pub font_sans: Option<PathBuf>,
    pub font_bold: Option<PathBuf>,
    pub font_mono: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            text_rows: TEXT_ROWS,
            png_rows: PNG_ROWS,
            text_widths: TEXT_COL_WIDTHS,
            font_sans: None,
            font_bold: None,
            font_mono: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AltseasonOptions {
    pub urls: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for AltseasonOptions {
    fn default() -> Self {
        Self {
            urls: ALTSEASON_URLS.iter().map(|u| s!(*u)).collect(),
            timeout_secs: ALTSEASON_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub dir: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { dir: PathBuf::from(STORE_DIR) }
    }
}

impl AppOptions {
    /// Search order: explicit `--config` path, `$ECON_SCRAPE_CONFIG`, `./econ_scrape.toml`, defaults.
    /// A file that exists but doesn't parse is an error; a missing one is skipped.
    pub fn load(flag: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(p) = flag {
            let opts = Self::load_from_file(p)?;
            return Ok((opts, ConfigSource::Flag(p.to_path_buf())));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let opts = Self::load_from_file(&p)?;
                return Ok((opts, ConfigSource::Env(p)));
            }
            logw!("{CONFIG_ENV} points to missing file {path}, falling back");
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            let opts = Self::load_from_file(&local)?;
            return Ok((opts, ConfigSource::Local(local)));
        }

        logf!("no {CONFIG_FILE} found, using built-in defaults");
        Ok((Self::default(), ConfigSource::Defaults))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let opts: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        opts.tz()?;
        Ok(opts)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.calendar
            .tz
            .parse::<Tz>()
            .map_err(|_| ConfigError::TimeZone(self.calendar.tz.clone()))
    }

    /// Network settings for the altseason pages: same clients, shorter timeout.
    pub fn altseason_net(&self) -> NetOptions {
        NetOptions { timeout_secs: self.altseason.timeout_secs, ..self.net.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let opts = AppOptions::from_toml(
            r#"
            [net]
            attempts = 5

            [calendar]
            tz = "UTC"
            "#,
        )
        .unwrap();
        assert_eq!(opts.net.attempts, 5);
        assert_eq!(opts.net.backoff_ms, NET_BACKOFF_MS);
        assert_eq!(opts.calendar.row_limit, ROW_LIMIT);
        assert_eq!(opts.tz().unwrap(), chrono_tz::UTC);
        assert_eq!(opts.altseason.urls.len(), 3);
    }

    #[test]
    fn bad_zone_and_bad_toml_are_errors() {
        let e = AppOptions::from_toml("[calendar]\ntz = \"Mars/Olympus\"").unwrap_err();
        assert!(matches!(e, ConfigError::TimeZone(_)));
        assert!(matches!(AppOptions::from_toml("[net\nattempts = "), Err(ConfigError::Parse(..))));
    }

    #[test]
    fn default_zone_is_moscow() {
        assert_eq!(AppOptions::default().tz().unwrap(), chrono_tz::Europe::Moscow);
    }

    #[test]
    fn missing_flag_file_is_an_error() {
        let p = std::env::temp_dir().join("econ_scrape_no_such_config.toml");
        assert!(matches!(AppOptions::load(Some(&p)), Err(ConfigError::Io(..))));
    }
}
