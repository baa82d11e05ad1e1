use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Pause policy between consecutive sends in a batch.
#[async_trait]
pub trait SendPacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a fixed interval on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl SendPacer for FixedDelay {
    async fn pause(&self) {
        debug!("Pacing next send by {:?}", self.0);
        tokio::time::sleep(self.0).await;
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::SendPacer;

    /// Counts pauses without waiting.
    #[derive(Default)]
    pub struct CountingPacer {
        pauses: AtomicUsize,
    }

    impl CountingPacer {
        pub fn pauses(&self) -> usize {
            self.pauses.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SendPacer for CountingPacer {
        async fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits_full_interval() {
        let start = tokio::time::Instant::now();
        FixedDelay(Duration::from_secs(10)).pause().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
