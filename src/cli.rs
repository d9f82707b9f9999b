// src/cli.rs
use std::{env, error::Error, path::PathBuf};

use chrono::Utc;
use chrono_tz::Tz;

use crate::catalog::{builtins, merge_catalog, Catalog, IndicatorDef};
use crate::config::options::AppOptions;
use crate::core::net::Fetcher;
use crate::file::write_output;
use crate::progress::Progress;
use crate::render::{font::FontSet, gauge_png, table_png, text};
use crate::schedule::{self, Settings, Trigger};
use crate::scrape::{altseason, batch, calendar};
use crate::signal::Rule;
use crate::specs::calendar::IndicatorRow;
use crate::store::{CustomIndicatorStore, CustomIndicators, KvStore};

pub type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Globals {
    pub chat: i64,
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    List,
    Table { target: String, text: bool, png: Option<String>, rows: Option<usize> },
    Signal { key: String },
    Overview,
    Altseason { png: Option<String>, stats: bool },
    CustomAdd { title: String, url: String, rule: String },
    CustomDel { title: String },
    CustomList,
    Schedule(ScheduleCmd),
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleCmd {
    Show,
    Select(String),
    Time(String),
    Days(String),
    On,
    Off,
    Next,
}

pub fn run() -> CliResult<()> {
    let (globals, cmd) = parse_args(env::args().skip(1))?;
    if cmd == Command::Help {
        println!("{}", include_str!("cli_help.txt"));
        return Ok(());
    }
    let (opts, source) = AppOptions::load(globals.config.as_deref())?;
    logd!("config: {source:?}");
    App::new(opts, globals.chat)?.dispatch(cmd)
}

/* ---------------- argument parsing ---------------- */

/// Global flags may appear anywhere; everything else is the command and its arguments.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> CliResult<(Globals, Command)> {
    let mut globals = Globals::default();
    let mut rest = Vec::new();
    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--chat" => globals.chat = args.next().ok_or("Missing value for --chat")?.parse()?,
            "--config" => {
                globals.config = Some(PathBuf::from(args.next().ok_or("Missing value for --config")?))
            }
            "-h" | "--help" => return Ok((globals, Command::Help)),
            _ => rest.push(a),
        }
    }
    Ok((globals, parse_command(rest)?))
}

fn parse_command(rest: Vec<String>) -> CliResult<Command> {
    let mut args = rest.into_iter();
    let Some(cmd) = args.next() else {
        return Ok(Command::Help);
    };

    let parsed = match cmd.to_ascii_lowercase().as_str() {
        "list" => Command::List,
        "table" => {
            let target = args.next().ok_or("Missing indicator key or URL")?;
            let (mut text, mut png, mut rows) = (false, None, None);
            while let Some(a) = args.next() {
                match a.as_str() {
                    "--text" => text = true,
                    "--png" => png = Some(args.next().ok_or("Missing value for --png")?),
                    "--rows" => {
                        let n: usize = args.next().ok_or("Missing value for --rows")?.parse()?;
                        if n == 0 { return Err("--rows must be at least 1".into()); }
                        rows = Some(n);
                    }
                    _ => return Err(format!("Unknown arg: {a}").into()),
                }
            }
            // no output flag means text
            Command::Table { target, text: text || png.is_none(), png, rows }
        }
        "signal" => Command::Signal { key: args.next().ok_or("Missing indicator key")? },
        "overview" | "check-all" => Command::Overview,
        "altseason" => {
            let (mut png, mut stats) = (None, false);
            while let Some(a) = args.next() {
                match a.as_str() {
                    "--png" => png = Some(args.next().ok_or("Missing value for --png")?),
                    "--stats" => stats = true,
                    _ => return Err(format!("Unknown arg: {a}").into()),
                }
            }
            Command::Altseason { png, stats }
        }
        "custom" => match args.next().as_deref() {
            Some("add") => Command::CustomAdd {
                title: args.next().ok_or("Missing title")?,
                url: args.next().ok_or("Missing URL")?,
                rule: args.next().ok_or("Missing rule (LT, GT or FOMC)")?,
            },
            Some("del") | Some("delete") => Command::CustomDel { title: args.next().ok_or("Missing title")? },
            Some("list") | None => Command::CustomList,
            Some(other) => return Err(format!("Unknown custom action: {other}").into()),
        },
        "schedule" => Command::Schedule(match args.next().as_deref() {
            None | Some("show") => ScheduleCmd::Show,
            Some("select") => ScheduleCmd::Select(args.next().ok_or("Missing indicator key")?),
            Some("time") => ScheduleCmd::Time(args.next().ok_or("Missing time (HH:MM)")?),
            Some("days") => {
                // "sat, sun" arrives split by the shell
                let days = args.by_ref().collect::<Vec<_>>().join(" ");
                if days.trim().is_empty() { return Err("Missing days".into()); }
                ScheduleCmd::Days(days)
            }
            Some("on") => ScheduleCmd::On,
            Some("off") => ScheduleCmd::Off,
            Some("next") => ScheduleCmd::Next,
            Some(other) => return Err(format!("Unknown schedule action: {other}").into()),
        }),
        other => return Err(format!("Unknown command: {other}").into()),
    };

    if let Some(extra) = args.next() {
        return Err(format!("Unknown arg: {extra}").into());
    }
    Ok(parsed)
}

/* ---------------- commands ---------------- */

struct App {
    opts: AppOptions,
    tz: Tz,
    chat: i64,
    kv: KvStore,
    customs: CustomIndicatorStore,
}

impl App {
    fn new(opts: AppOptions, chat: i64) -> CliResult<Self> {
        let tz = opts.tz()?;
        let kv = KvStore::open(&opts.store.dir);
        let customs = CustomIndicatorStore::open(&opts.store.dir);
        Ok(Self { opts, tz, chat, kv, customs })
    }

    fn dispatch(&self, cmd: Command) -> CliResult<()> {
        match cmd {
            Command::List => self.list(),
            Command::Table { target, text, png, rows } => self.table(&target, text, png.as_deref(), rows),
            Command::Signal { key } => self.signal(&key),
            Command::Overview => self.overview(),
            Command::Altseason { png, stats } => self.altseason(png.as_deref(), stats),
            Command::CustomAdd { title, url, rule } => {
                let key = self.customs.add(self.chat, &title, &url, &rule)?;
                println!("Added {} as {key}", title.trim());
                Ok(())
            }
            Command::CustomDel { title } => {
                match self.customs.delete_by_title(self.chat, &title)? {
                    0 => println!("No custom indicator titled {:?}", title.trim()),
                    _ => println!("Deleted {}", title.trim()),
                }
                Ok(())
            }
            Command::CustomList => {
                for d in self.customs.list(self.chat)? {
                    println!("{},{},{},{}", d.key, d.title, d.url, d.rule.code());
                }
                Ok(())
            }
            Command::Schedule(sc) => self.schedule(sc),
            Command::Help => Ok(()),
        }
    }

    fn catalog(&self) -> CliResult<Catalog> {
        Ok(merge_catalog(&builtins(), &self.customs.list(self.chat)?))
    }

    fn lookup(&self, key: &str) -> CliResult<IndicatorDef> {
        self.catalog()?
            .get(key)
            .cloned()
            .ok_or_else(|| format!("Unknown indicator {key} (see `econ-cli list`)").into())
    }

    /// Catalog key, or an ad-hoc definition for a bare calendar URL.
    fn resolve(&self, target: &str) -> CliResult<IndicatorDef> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(IndicatorDef::new("URL", "Indicator", target, Rule::from_code("LT")));
        }
        self.lookup(target)
    }

    fn fetch_rows(&self, def: &IndicatorDef) -> CliResult<Vec<IndicatorRow>> {
        let fetcher = Fetcher::from_options(&self.opts.net)?;
        match calendar::fetch(&fetcher, &def.url, self.opts.calendar.row_limit, self.tz) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                println!("{}", text::warning(&def.title, &e));
                Err(e.into())
            }
        }
    }

    fn list(&self) -> CliResult<()> {
        for d in self.catalog()?.iter() {
            println!("{},{},{}", d.key, d.rule.code(), d.title);
        }
        Ok(())
    }

    fn table(&self, target: &str, as_text: bool, png: Option<&str>, rows_n: Option<usize>) -> CliResult<()> {
        let def = self.resolve(target)?;
        let rows = self.fetch_rows(&def)?;
        let r = &self.opts.render;

        if as_text {
            let n = rows_n.unwrap_or(r.text_rows);
            println!("{}", text::format_table(&rows, &def.url, &r.text_widths, n));
        }
        if let Some(out) = png {
            let fonts = FontSet::load(r);
            let card = table_png::render_table_png(&rows, &def.title, rows_n.unwrap_or(r.png_rows), &fonts)?;
            let path = write_output(out, &card.filename, &card.bytes)?;
            println!("{}", path.display());
        }
        Ok(())
    }

    fn signal(&self, key: &str) -> CliResult<()> {
        let def = self.lookup(key)?;
        let rows = self.fetch_rows(&def)?;
        println!("{}", text::signal_message(&def, &rows));
        Ok(())
    }

    fn overview(&self) -> CliResult<()> {
        let defs: Vec<IndicatorDef> = self.catalog()?.iter().cloned().collect();
        let fetcher = Fetcher::from_options(&self.opts.net)?;
        let mut progress = LogProgress::default();
        let items = batch::collect_latest(&fetcher, &defs, self.opts.calendar.row_limit, self.tz, Some(&mut progress));
        println!("{}", text::overview_message(&items));
        Ok(())
    }

    fn altseason(&self, png: Option<&str>, stats: bool) -> CliResult<()> {
        let urls = self.opts.altseason.urls.as_slice();
        let fetcher = Fetcher::from_options(&self.opts.altseason_net())?;

        let reading = altseason::fetch_index(&fetcher, urls)?;
        let now = Utc::now().with_timezone(&self.tz);
        println!("{}", text::altseason_text(reading.value, &reading.url, &now));

        if let Some(out) = png {
            let card = gauge_png::render_gauge(reading.value, &FontSet::load(&self.opts.render))?;
            let path = write_output(out, &card.filename, &card.bytes)?;
            println!("{}", path.display());
        }
        if stats {
            match altseason::fetch_stats(&fetcher, urls) {
                Ok(s) => println!("\n{}", text::altseason_stats(&s)),
                Err(e) => println!("\n{}", text::warning("Season stats unavailable", &e)),
            }
        }
        Ok(())
    }

    fn schedule(&self, sc: ScheduleCmd) -> CliResult<()> {
        let current = schedule::current_indicator(&self.kv, self.chat)?;
        match sc {
            ScheduleCmd::Show => {
                let catalog = self.catalog()?;
                let mut entries = Vec::with_capacity(catalog.len());
                for d in catalog.iter() {
                    entries.push((d, Settings::load(&self.kv, self.chat, &d.key)?));
                }
                println!("{}", text::schedule_overview(&entries));
                println!("\nSelected: {current}");
            }
            ScheduleCmd::Select(key) => {
                let def = self.lookup(&key)?;
                schedule::select_indicator(&self.kv, self.chat, &def.key)?;
                println!("Selected {} ({})", def.key, def.title);
            }
            ScheduleCmd::Time(t) => {
                let (h, m) = schedule::set_time(&self.kv, self.chat, &current, &t)?;
                println!("{current}: time {h:02}:{m:02}");
            }
            ScheduleCmd::Days(d) => {
                let days = schedule::set_days(&self.kv, self.chat, &current, &d)?;
                println!("{current}: {}", days.describe());
            }
            ScheduleCmd::On => {
                schedule::set_enabled(&self.kv, self.chat, &current, true)?;
                println!("{current}: enabled");
            }
            ScheduleCmd::Off => {
                schedule::set_enabled(&self.kv, self.chat, &current, false)?;
                println!("{current}: disabled");
            }
            ScheduleCmd::Next => match Trigger::load(&self.kv, self.chat, &current)? {
                Some(t) => match t.next_fire(&Utc::now(), self.tz) {
                    Some(at) => println!("{current}: {t}, next at {}", at.format("%Y-%m-%d %H:%M %Z")),
                    None => println!("{current}: {t}, no upcoming slot"),
                },
                None => println!("{current}: schedule is off or incomplete"),
            },
        }
        Ok(())
    }
}

/// Batch progress to the log.
#[derive(Default)]
struct LogProgress {
    total: usize,
    done: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        logf!("checking {total} indicators");
    }

    fn item_done(&mut self, key: &str) {
        self.done += 1;
        logd!("[{}/{}] {key}", self.done, self.total);
    }

    fn item_failed(&mut self, key: &str, err: &str) {
        self.done += 1;
        logw!("[{}/{}] {key}: {err}", self.done, self.total);
    }

    fn finish(&mut self) {
        logf!("checked {} of {}", self.done, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn globals_anywhere() {
        let (g, cmd) = parse_args(args("signal CPI --chat 42 --config x.toml")).unwrap();
        assert_eq!(g.chat, 42);
        assert_eq!(g.config, Some(PathBuf::from("x.toml")));
        assert_eq!(cmd, Command::Signal { key: s!("CPI") });
    }

    #[test]
    fn table_defaults_to_text() {
        let (_, cmd) = parse_args(args("table NFP --rows 3")).unwrap();
        assert_eq!(cmd, Command::Table { target: s!("NFP"), text: true, png: None, rows: Some(3) });

        let (_, cmd) = parse_args(args("table NFP --png out/")).unwrap();
        assert_eq!(cmd, Command::Table { target: s!("NFP"), text: false, png: Some(s!("out/")), rows: None });
    }

    #[test]
    fn schedule_days_rejoined() {
        let (_, cmd) = parse_args(args("schedule days sat, sun")).unwrap();
        assert_eq!(cmd, Command::Schedule(ScheduleCmd::Days(s!("sat, sun"))));
        assert_eq!(parse_args(args("schedule")).unwrap().1, Command::Schedule(ScheduleCmd::Show));
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(parse_args(args("table")).is_err());
        assert!(parse_args(args("table NFP --rows 0")).is_err());
        assert!(parse_args(args("list extra")).is_err());
        assert!(parse_args(args("--chat abc list")).is_err());
        assert!(parse_args(args("frobnicate")).is_err());
        assert_eq!(parse_args(Vec::<String>::new()).unwrap().1, Command::Help);
    }
}
