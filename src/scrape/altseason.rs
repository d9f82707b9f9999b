// src/scrape/altseason.rs
use thiserror::Error;

use crate::core::net::Fetcher;
use crate::specs::altseason::{self, AltseasonError, AltseasonStats, IndexStrategy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AltseasonFetchError {
    #[error("no altseason page could be loaded: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Page(#[from] AltseasonError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexReading {
    pub value: u8,
    pub url: String,
    pub strategy: IndexStrategy,
}

/// Try each source page in order; the first page that yields a value wins.
pub fn fetch_index<S: AsRef<str>>(fetcher: &Fetcher, urls: &[S]) -> Result<IndexReading, AltseasonFetchError> {
    let mut last: Option<AltseasonFetchError> = None;
    for url in urls.iter().map(|u| u.as_ref()) {
        let html = match fetcher.fetch_page(url) {
            Ok(h) => h,
            Err(f) => {
                logw!("altseason {url}: {f}");
                last = Some(AltseasonFetchError::Unreachable(f.to_string()));
                continue;
            }
        };
        match altseason::extract_index(&html) {
            Ok(pick) => {
                logf!("altseason index {} from {url} ({})", pick.value, pick.strategy);
                return Ok(IndexReading { value: pick.value, url: s!(url), strategy: pick.strategy });
            }
            Err(e) => {
                logw!("altseason {url}: {e}");
                last = Some(e.into());
            }
        }
    }
    Err(last.unwrap_or_else(|| AltseasonFetchError::Unreachable(s!("no source URLs configured"))))
}

/// Stats come from the first page that loads at all.
pub fn fetch_stats<S: AsRef<str>>(fetcher: &Fetcher, urls: &[S]) -> Result<AltseasonStats, AltseasonFetchError> {
    let mut last = s!("no source URLs configured");
    for url in urls.iter().map(|u| u.as_ref()) {
        match fetcher.fetch_page(url) {
            Ok(html) => return Ok(altseason::extract_stats(&html)?),
            Err(f) => {
                logw!("altseason stats {url}: {f}");
                last = f.to_string();
            }
        }
    }
    Err(AltseasonFetchError::Unreachable(last))
}
