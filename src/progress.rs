// src/progress.rs
/// Progress reporting for multi-indicator fetches.
/// Frontends implement this to surface status; the library only calls it.
pub trait Progress {
    /// Called at the start with the number of indicators queued.
    fn begin(&mut self, _total: usize) {}

    /// One indicator fetched and parsed.
    fn item_done(&mut self, _key: &str) {}

    /// One indicator failed; `err` is the stage-tagged message.
    fn item_failed(&mut self, _key: &str, _err: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}
