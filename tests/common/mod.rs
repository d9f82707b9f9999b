// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use econ_scrape::core::net::{Fetcher, HttpClient, HttpResponse, NetError};

/// Serves canned pages by URL; anything unknown is a 404.
pub struct Routes(HashMap<String, (u16, String)>);

impl HttpClient for Routes {
    fn name(&self) -> &str {
        "routes"
    }

    fn get(&self, url: &str) -> Result<HttpResponse, NetError> {
        let (status, body) = self.0.get(url).cloned().unwrap_or((404, String::new()));
        Ok(HttpResponse { status, body })
    }
}

pub fn fetcher(pages: &[(&str, u16, &str)]) -> Fetcher {
    let map = pages
        .iter()
        .map(|(url, status, body)| (url.to_string(), (*status, body.to_string())))
        .collect();
    Fetcher::new(vec![Box::new(Routes(map))], 2, Duration::ZERO)
}

pub fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("econ_scrape_it_{name}"));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

pub const HISTORY: &str = r#"<!DOCTYPE html><html><body>
<table class="sidebar"><tr><td>Most popular</td></tr></table>
<table class="genTbl openTbl ecHistoryTbl">
  <thead><tr><th>Release Date</th><th>Time</th><th>Actual</th><th>Forecast</th><th>Previous</th><th></th></tr></thead>
  <tbody>
    <tr><td>Oct 16, 2025 (Oct 11)</td><td>15:30</td><td>227K</td><td>230K</td><td>225K</td><td></td></tr>
    <tr><td>Oct 09, 2025 (Oct 04)</td><td>15:30</td><td>225K</td><td>&nbsp;</td><td>219K</td><td></td></tr>
    <tr><td>Oct 02, 2025 (Sep 27)</td><td>15:30</td><td>219K</td><td>221K</td><td>218K</td><td></td></tr>
    <tr><td colspan="3">Show more</td></tr>
  </tbody>
</table></body></html>"#;
