//! Completion request client: one call in, one [`Outcome`] out.

use std::future::Future;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub mod http;

/// Result of a single completion request. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub latency_ms: f64,
    pub success: bool,
    /// Completion text on success, error description on failure.
    pub detail: String,
}

impl Outcome {
    pub fn success(latency_ms: f64, text: impl Into<String>) -> Self {
        Self { latency_ms, success: true, detail: text.into() }
    }

    pub fn failure(latency_ms: f64, error: impl Into<String>) -> Self {
        Self { latency_ms, success: false, detail: error.into() }
    }
}

pub trait CompletionBackend: Send + Sync {
    /// Sends one completion request. Never fails: transport and protocol
    /// errors come back as a failed [`Outcome`].
    fn complete(&self, prompt: &str, max_tokens: u32) -> impl Future<Output = Outcome> + Send;
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(feature = "mock")]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockCall {
        pub prompt: String,
        pub max_tokens: u32,
    }

    /// Replays scripted outcomes in call order, then repeats `fallback`.
    pub struct MockBackend {
        script: Mutex<VecDeque<Outcome>>,
        fallback: Outcome,
        delay: Duration,
        calls: Mutex<Vec<MockCall>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl Default for MockBackend {
        fn default() -> Self { Self::new() }
    }

    impl MockBackend {
        pub fn new() -> Self { Self::always(Outcome::success(1.0, "ok")) }

        pub fn always(outcome: Outcome) -> Self {
            Self::scripted(Vec::new(), outcome)
        }

        pub fn scripted(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                fallback,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        /// Holds every request open for `delay` before answering.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    impl CompletionBackend for MockBackend {
        async fn complete(&self, prompt: &str, max_tokens: u32) -> Outcome {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(MockCall { prompt: prompt.to_string(), max_tokens });
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }
}
