//! Delay strategies for simulated work
//!
//! Upload ticks, analysis and chat replies all wait through a [`Pacer`]
//! so tests can swap wall-clock sleeps for a bare scheduler yield.

use std::time::Duration;

#[async_trait::async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait::async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Ignores the duration and only yields to other tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPacer;

#[async_trait::async_trait]
impl Pacer for InstantPacer {
    async fn pause(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}
