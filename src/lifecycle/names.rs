use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const RUN_TAG_LEN: usize = 8;

/// Produces fixture names unique to this run: `"<base> <run tag>-<n>"`.
///
/// Clones share one counter, so every test context in a run draws from the
/// same sequence.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    run_tag: String,
    counter: Arc<AtomicU64>,
}

impl NameGenerator {
    pub fn new() -> Self {
        let seed = format!(
            "{}:{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            std::process::id()
        );
        let digest = hex::encode(Sha256::digest(seed.as_bytes()));
        Self::with_run_tag(&digest[..RUN_TAG_LEN])
    }

    pub fn with_run_tag(run_tag: &str) -> Self {
        Self {
            run_tag: run_tag.to_string(),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn run_tag(&self) -> &str {
        &self.run_tag
    }

    pub fn next(&self, base: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{base} {}-{n}", self.run_tag)
    }

    /// Names handed out so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}
