use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Bounded exponential-ish backoff with deterministic jitter. Jitter is
/// derived from the session id and attempt number via a hash rather than a
/// PRNG dependency — deterministic, so a given (session, attempt) pair
/// always schedules the same delay, which keeps tests reproducible.
#[derive(Debug, Clone)]
pub struct RetryManager {
    delays: Vec<Duration>,
    max_retries: u32,
    jitter_fraction: f64,
}

impl RetryManager {
    pub fn new(delays: Vec<Duration>, max_retries: u32, jitter_fraction: f64) -> Self {
        assert!(!delays.is_empty(), "retry manager needs at least one delay");
        Self { delays, max_retries, jitter_fraction: jitter_fraction.clamp(0.0, 1.0) }
    }

    /// `None` once `attempt` exceeds `max_retries` — the caller should give
    /// up rather than ask for another delay.
    pub fn next_delay(&self, session_salt: u64, attempt: u32) -> Option<Duration> {
        if attempt > self.max_retries {
            return None;
        }
        let index = (attempt as usize).min(self.delays.len() - 1);
        let base = self.delays[index];
        Some(apply_jitter(base, self.jitter_fraction, session_salt, attempt))
    }
}

fn apply_jitter(base: Duration, fraction: f64, salt: u64, attempt: u32) -> Duration {
    if fraction <= 0.0 {
        return base;
    }
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    salt.hash(&mut hasher);
    attempt.hash(&mut hasher);
    let bucket = (hasher.finish() % 1000) as f64 / 1000.0; // in [0, 1)
    let offset = (bucket * 2.0 - 1.0) * fraction; // in [-fraction, fraction)
    let millis = base.as_millis() as f64 * (1.0 + offset);
    Duration::from_millis(millis.max(0.0) as u64)
}
