// src/scrape/batch.rs
// Fetch several indicators at once (daily overview, "check all").
use std::{
    thread, time::Duration,
    sync::{ mpsc, atomic::{ AtomicUsize, Ordering }},
};

use chrono_tz::Tz;

use crate::{
    catalog::IndicatorDef,
    config::consts::{ WORKERS, REQUEST_PAUSE_MS, JITTER_MS },
    core::net::Fetcher,
    progress::Progress,
    specs::calendar::IndicatorRow,
};

use super::calendar::{ self, FetchError };

#[derive(Debug)]
pub struct BatchItem {
    pub def: IndicatorDef,
    pub result: Result<Vec<IndicatorRow>, FetchError>,
}

/// Fetch every definition through a small worker pool. Results come back in `defs` order;
/// a failing indicator never aborts the others.
pub fn collect_latest(
    fetcher: &Fetcher,
    defs: &[IndicatorDef],
    row_limit: usize,
    tz: Tz,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<BatchItem> {
    if let Some(p) = progress.as_deref_mut() {
        p.begin(defs.len());
    }

    type Done = (usize, Result<Vec<IndicatorRow>, FetchError>);
    let counter = AtomicUsize::new(0);
    let (res_tx, res_rx) = mpsc::channel::<Done>();
    let workers = WORKERS.min(defs.len()).max(1);

    let mut slots: Vec<Option<Result<Vec<IndicatorRow>, FetchError>>> = vec![None; defs.len()];

    thread::scope(|sc| {
        for _ in 0..workers {
            let tx = res_tx.clone();
            let idx = &counter;
            sc.spawn(move || {
                loop {
                    let i = idx.fetch_add(1, Ordering::Relaxed);
                    if i >= defs.len() {
                        break;
                    }
                    let result = calendar::fetch(fetcher, &defs[i].url, row_limit, tz);
                    if tx.send((i, result)).is_err() {
                        break;
                    }
                    let jitter = (i as u64 * 37) % JITTER_MS;
                    thread::sleep(Duration::from_millis(REQUEST_PAUSE_MS + jitter)); // be polite
                }
            });
        }
        drop(res_tx); // main thread is sole receiver now

        for _ in 0..defs.len() {
            let Ok((i, result)) = res_rx.recv() else {
                break; // workers ended early
            };
            let key = defs[i].key.as_str();
            if let Some(p) = progress.as_deref_mut() {
                match &result {
                    Ok(_) => p.item_done(key),
                    Err(e) => p.item_failed(key, &e.to_string()),
                }
            }
            if let Err(e) = &result {
                loge!("{key}: {e}");
            }
            slots[i] = Some(result);
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    defs.iter()
        .cloned()
        .zip(slots)
        .filter_map(|(def, slot)| slot.map(|result| BatchItem { def, result }))
        .collect()
}
