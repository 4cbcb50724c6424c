//! Step-count sensor contract and in-process implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepSourceError {
    #[error("step counter is not available on this device")]
    Unavailable,
    #[error("step counter is already being watched")]
    AlreadyWatching,
}

/// A device step counter.
#[async_trait]
pub trait StepSource: Send + Sync {
    /// Whether the sensor exists and may deliver samples.
    async fn is_available(&self) -> bool;

    /// Start receiving step counts.
    ///
    /// # Errors
    ///
    /// Returns `StepSourceError` if the sensor cannot be watched.
    async fn watch(&self) -> Result<StepFeed, StepSourceError>;
}

/// Stream of step counts from a watched sensor.
#[derive(Debug)]
pub struct StepFeed {
    rx: mpsc::UnboundedReceiver<u32>,
}

impl StepFeed {
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<u32>) -> Self {
        Self { rx }
    }

    /// Next reading, or `None` once the sensor stops.
    pub async fn next(&mut self) -> Option<u32> {
        self.rx.recv().await
    }

    /// A reading that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<u32> {
        self.rx.try_recv().ok()
    }

    /// Stop watching the sensor.
    pub fn stop(mut self) {
        self.rx.close();
    }
}

/// Producer side of a [`ChannelStepSource`].
#[derive(Debug, Clone)]
pub struct StepSender {
    tx: mpsc::UnboundedSender<u32>,
}

impl StepSender {
    /// Deliver a reading. Returns `false` once nobody is watching anymore.
    pub fn push(&self, steps: u32) -> bool {
        self.tx.send(steps).is_ok()
    }
}

/// Step source fed by hand, for the headless driver and tests.
///
/// It can be watched once.
pub struct ChannelStepSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<u32>>>,
}

impl ChannelStepSource {
    #[must_use]
    pub fn new() -> (StepSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            StepSender { tx },
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }
}

#[async_trait]
impl StepSource for ChannelStepSource {
    async fn is_available(&self) -> bool {
        true
    }

    async fn watch(&self) -> Result<StepFeed, StepSourceError> {
        let mut guard = self
            .rx
            .lock()
            .map_err(|_| StepSourceError::AlreadyWatching)?;
        guard
            .take()
            .map(StepFeed::new)
            .ok_or(StepSourceError::AlreadyWatching)
    }
}

/// A device without a step counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStepSource;

#[async_trait]
impl StepSource for UnavailableStepSource {
    async fn is_available(&self) -> bool {
        false
    }

    async fn watch(&self) -> Result<StepFeed, StepSourceError> {
        Err(StepSourceError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_source_delivers_in_order() {
        let (sender, source) = ChannelStepSource::new();
        let mut feed = source.watch().await.unwrap();
        assert!(sender.push(10));
        assert!(sender.push(5));
        assert_eq!(feed.next().await, Some(10));
        assert_eq!(feed.next().await, Some(5));
    }

    #[tokio::test]
    async fn channel_source_watches_once() {
        let (_sender, source) = ChannelStepSource::new();
        let _feed = source.watch().await.unwrap();
        assert_eq!(
            source.watch().await.unwrap_err(),
            StepSourceError::AlreadyWatching
        );
    }

    #[tokio::test]
    async fn stopped_feed_rejects_pushes() {
        let (sender, source) = ChannelStepSource::new();
        let feed = source.watch().await.unwrap();
        feed.stop();
        assert!(!sender.push(1));
    }

    #[tokio::test]
    async fn unavailable_source_reports_so() {
        let source = UnavailableStepSource;
        assert!(!source.is_available().await);
        assert!(source.watch().await.is_err());
    }
}
