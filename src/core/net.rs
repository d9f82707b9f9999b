// src/core/net.rs
// Blocking HTTP GET with a browser-like client, a plain fallback client, and a retry loop
// that keeps a trace of every attempt for error reports.

use std::{fmt, thread, time::Duration};

use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::options::NetOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("client setup failed: {0}")]
    Build(String),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        NetError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One way of issuing a GET. The fetcher tries its clients in order on every attempt.
pub trait HttpClient: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, url: &str) -> Result<HttpResponse, NetError>;
}

fn send(client: &Client, url: &str) -> Result<HttpResponse, NetError> {
    let resp = client.get(url).send()?;
    let status = resp.status().as_u16();
    let body = resp.text()?;
    Ok(HttpResponse { status, body })
}

/* ---------------- clients ---------------- */

/// Full browser header set plus a cookie jar. A challenge status (403/429/503) triggers one
/// visit to the site origin to pick up cookies, then a single retry.
pub struct StealthClient {
    client: Client,
}

impl StealthClient {
    pub fn new(opts: &NetOptions) -> Result<Self, NetError> {
        let mut h = HeaderMap::new();
        let mut put = |k: header::HeaderName, v: &str| -> Result<(), NetError> {
            let v = HeaderValue::from_str(v).map_err(|e| NetError::Build(e.to_string()))?;
            h.insert(k, v);
            Ok(())
        };
        put(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")?;
        put(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9,ru-RU,ru;q=0.8")?;
        put(header::CACHE_CONTROL, "no-cache")?;
        put(header::PRAGMA, "no-cache")?;
        put(header::UPGRADE_INSECURE_REQUESTS, "1")?;
        put(header::HeaderName::from_static("sec-fetch-dest"), "document")?;
        put(header::HeaderName::from_static("sec-fetch-mode"), "navigate")?;
        put(header::HeaderName::from_static("sec-fetch-site"), "none")?;
        put(header::HeaderName::from_static("sec-fetch-user"), "?1")?;

        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .default_headers(h)
            .cookie_store(true)
            .gzip(true)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| NetError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for StealthClient {
    fn name(&self) -> &str {
        "stealth"
    }

    fn get(&self, url: &str) -> Result<HttpResponse, NetError> {
        let first = send(&self.client, url)?;
        if !matches!(first.status, 403 | 429 | 503) {
            return Ok(first);
        }
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return Ok(first);
        };
        let origin = join!(&parsed.origin().ascii_serialization(), "/");
        logd!("stealth: HTTP {} on {url}, warming up {origin}", first.status);
        // only the cookies matter here
        if let Err(e) = send(&self.client, &origin) {
            logd!("stealth: warm-up on {origin} failed: {e}");
        }
        send(&self.client, url)
    }
}

/// Minimal headers, no cookies.
pub struct PlainClient {
    client: Client,
}

impl PlainClient {
    pub fn new(opts: &NetOptions) -> Result<Self, NetError> {
        let mut h = HeaderMap::new();
        h.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,ru-RU,ru;q=0.8"));
        h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        h.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .default_headers(h)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| NetError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for PlainClient {
    fn name(&self) -> &str {
        "plain"
    }

    fn get(&self, url: &str) -> Result<HttpResponse, NetError> {
        send(&self.client, url)
    }
}

/* ---------------- retry loop ---------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Status { code: u16, bytes: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTrace {
    pub attempt: u32,
    pub client: String,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for AttemptTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Status { code, bytes: 0 } if *code == 200 => {
                write!(f, "try{}: {} -> HTTP 200 (empty body)", self.attempt, self.client)
            }
            AttemptOutcome::Status { code, .. } => write!(f, "try{}: {} -> HTTP {code}", self.attempt, self.client),
            AttemptOutcome::Failed(e) => write!(f, "try{}: {} -> {e}", self.attempt, self.client),
        }
    }
}

/// Every attempt failed. `reason` describes the last failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetFailure {
    pub reason: String,
    pub trace: Vec<AttemptTrace>,
}

/// `try1: stealth -> HTTP 403; try1: plain -> HTTP 200 …`
pub fn trace_line(trace: &[AttemptTrace]) -> String {
    trace.iter().map(|t| t.to_string()).collect::<Vec<_>>().join("; ")
}

impl NetFailure {
    pub fn trace_line(&self) -> String {
        trace_line(&self.trace)
    }
}

impl fmt::Display for NetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | note: {}", self.reason, self.trace_line())
    }
}

pub struct Fetcher {
    clients: Vec<Box<dyn HttpClient>>,
    attempts: u32,
    backoff: Duration,
}

impl Fetcher {
    pub fn new(clients: Vec<Box<dyn HttpClient>>, attempts: u32, backoff: Duration) -> Self {
        Self { clients, attempts: attempts.max(1), backoff }
    }

    /// Stealth client first, plain client as fallback.
    pub fn from_options(opts: &NetOptions) -> Result<Self, NetError> {
        let clients: Vec<Box<dyn HttpClient>> = vec![
            Box::new(StealthClient::new(opts)?),
            Box::new(PlainClient::new(opts)?),
        ];
        Ok(Self::new(clients, opts.attempts, Duration::from_millis(opts.backoff_ms)))
    }

    /// Pause after round `n` (0-based); saturates instead of overflowing on large configs.
    fn delay_after(&self, n: u32) -> Duration {
        2u32.checked_pow(n).map_or(Duration::MAX, |f| self.backoff.saturating_mul(f))
    }

    /// GET `url` until some client answers 200 with a non-empty body.
    /// Sleeps `backoff * 2^n` between rounds (0.6s, 1.2s, … by default).
    pub fn fetch_page(&self, url: &str) -> Result<String, NetFailure> {
        let mut trace = Vec::new();
        let mut reason = s!("network error");

        for n in 0..self.attempts {
            let attempt = n + 1;
            for c in &self.clients {
                let outcome = match c.get(url) {
                    Ok(resp) => {
                        logd!("try{attempt}: {} -> HTTP {} ({} bytes)", c.name(), resp.status, resp.body.len());
                        let ok = resp.status == 200 && !resp.body.trim().is_empty();
                        let rec = AttemptOutcome::Status { code: resp.status, bytes: resp.body.len() };
                        if ok {
                            trace.push(AttemptTrace { attempt, client: s!(c.name()), outcome: rec });
                            return Ok(resp.body);
                        }
                        reason = if resp.status == 200 {
                            format!("{} empty body", c.name())
                        } else {
                            format!("{} HTTP {}", c.name(), resp.status)
                        };
                        rec
                    }
                    Err(e) => {
                        reason = format!("{} fail: {e}", c.name());
                        AttemptOutcome::Failed(e.to_string())
                    }
                };
                logw!("try{attempt}: {reason}");
                trace.push(AttemptTrace { attempt, client: s!(c.name()), outcome });
            }
            if attempt < self.attempts && !self.backoff.is_zero() {
                thread::sleep(self.delay_after(n));
            }
        }

        Err(NetFailure { reason, trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses in order, repeating the last one.
    struct Scripted {
        name: &'static str,
        replies: Mutex<Vec<Result<HttpResponse, NetError>>>,
    }

    impl Scripted {
        fn new(name: &'static str, mut replies: Vec<Result<HttpResponse, NetError>>) -> Self {
            replies.reverse();
            Self { name, replies: Mutex::new(replies) }
        }
    }

    impl HttpClient for Scripted {
        fn name(&self) -> &str { self.name }
        fn get(&self, _url: &str) -> Result<HttpResponse, NetError> {
            let mut r = self.replies.lock().unwrap();
            if r.len() > 1 { r.pop().unwrap() } else { r[0].clone() }
        }
    }

    fn status(code: u16, body: &str) -> Result<HttpResponse, NetError> {
        Ok(HttpResponse { status: code, body: body.into() })
    }

    #[test]
    fn falls_back_to_plain_client() {
        let f = Fetcher::new(
            vec![
                Box::new(Scripted::new("stealth", vec![status(403, "")])),
                Box::new(Scripted::new("plain", vec![status(200, "<html></html>")])),
            ],
            3,
            Duration::ZERO,
        );
        assert_eq!(f.fetch_page("https://x.test/").unwrap(), "<html></html>");
    }

    #[test]
    fn exhausts_attempts_with_trace() {
        let f = Fetcher::new(
            vec![
                Box::new(Scripted::new("stealth", vec![Err(NetError::Transport("connection reset".into()))])),
                Box::new(Scripted::new("plain", vec![status(503, "busy")])),
            ],
            3,
            Duration::ZERO,
        );
        let err = f.fetch_page("https://x.test/").unwrap_err();
        assert_eq!(err.trace.len(), 6);
        assert_eq!(err.reason, "plain HTTP 503");
        let line = err.trace_line();
        assert!(line.starts_with("try1: stealth -> connection reset; try1: plain -> HTTP 503"));
        assert!(line.ends_with("try3: plain -> HTTP 503"));
    }

    #[test]
    fn failed_warm_up_still_retries_the_page() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let page_hits = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&page_hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let mut reader = BufReader::new(&stream);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                let mut line = String::new();
                while reader.read_line(&mut line).is_ok_and(|n| n > 0) && !line.trim().is_empty() {
                    line.clear();
                }
                // origin visit: hang up without an answer
                if request_line.starts_with("GET / ") {
                    continue;
                }
                hits.fetch_add(1, Ordering::SeqCst);
                let mut w = &stream;
                let _ = w.write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 2\r\nConnection: close\r\n\r\nno");
            }
        });

        let client = StealthClient::new(&NetOptions::default()).unwrap();
        let resp = client.get(&format!("http://127.0.0.1:{port}/calendar")).unwrap();
        assert_eq!(resp.status, 403);
        assert_eq!(page_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let f = Fetcher::new(Vec::new(), 40, Duration::from_millis(600));
        assert_eq!(f.delay_after(0), Duration::from_millis(600));
        assert_eq!(f.delay_after(1), Duration::from_millis(1200));
        assert_eq!(f.delay_after(32), Duration::MAX);
        assert_eq!(f.delay_after(39), Duration::MAX);
    }

    #[test]
    fn empty_body_is_not_success() {
        let f = Fetcher::new(
            vec![Box::new(Scripted::new("plain", vec![status(200, "  "), status(200, "<p>ok</p>")]))],
            2,
            Duration::ZERO,
        );
        assert_eq!(f.fetch_page("u").unwrap(), "<p>ok</p>");
    }
}
