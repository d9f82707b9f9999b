// src/config/consts.rs

// Config discovery
pub const CONFIG_ENV: &str = "ECON_SCRAPE_CONFIG";
pub const CONFIG_FILE: &str = "econ_scrape.toml";

// Net
pub const NET_ATTEMPTS: u32 = 3;
pub const NET_BACKOFF_MS: u64 = 600; // doubles per attempt
pub const NET_TIMEOUT_SECS: u64 = 25;
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

// Batch fetch
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 250;
pub const JITTER_MS: u64 = 150;

// Calendar
pub const ROW_LIMIT: usize = 12;
pub const DEFAULT_TZ: &str = "Europe/Moscow";
pub const CALENDAR_SOURCE_NAME: &str = "Investing.com";

// Altseason
pub const ALTSEASON_URLS: [&str; 3] = [
    "https://www.blockchaincenter.net/en/altcoin-season-index/",
    "https://www.blockchaincenter.net/ru/altcoin-season-index/",
    "https://www.blockchaincenter.net/altcoin-season-index/",
];
pub const ALTSEASON_TIMEOUT_SECS: u64 = 12;

// Render
pub const TEXT_ROWS: usize = 6;
pub const PNG_ROWS: usize = 8;
pub const TEXT_COL_WIDTHS: [usize; 5] = [12, 5, 12, 9, 9];
pub const FONT_SANS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "C:/Windows/Fonts/arial.ttf",
];
pub const FONT_SANS_BOLD: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
];
pub const FONT_MONO: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "C:/Windows/Fonts/consola.ttf",
    "C:/Windows/Fonts/lucon.ttf",
];

// Local store
pub const STORE_DIR: &str = ".store";
pub const STORE_SEP: char = ',';
pub const STATE_FILE: &str = "state.csv";
pub const CUSTOM_FILE: &str = "custom_indicators.csv";

// Schedule
pub const DEFAULT_INDICATOR: &str = "JOBLESS_CLAIMS";
