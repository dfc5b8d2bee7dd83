use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::error::{Error, Result};

/// Token bucket shared by every body stream of a transfer.
///
/// Capacity and refill rate are both `rate` bytes per second, so an idle
/// transfer may burst one second worth of data. A caller that overdraws the
/// bucket sleeps off the debt while holding the lock, which makes later
/// callers queue behind it.
#[derive(Debug)]
pub struct TokenBucket {
    rate: u64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket for `rate` bytes per second.
    pub fn new(rate: u64) -> Result<Self> {
        if rate == 0 {
            return Err(Error::InvalidConfig("rate limit must be positive".into()));
        }
        Ok(Self {
            rate,
            state: Mutex::new(BucketState {
                tokens: rate as f64,
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Take `bytes` tokens, waiting until the bucket can cover them.
    pub async fn acquire(&self, bytes: u64) {
        let rate = self.rate as f64;
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * rate).min(rate);
        state.last_refill = now;
        state.tokens -= bytes as f64;

        if state.tokens < 0.0 {
            let wait = Duration::from_secs_f64(-state.tokens / rate);
            sleep(wait).await;
            state.tokens = 0.0;
            state.last_refill = Instant::now();
        }
    }
}
