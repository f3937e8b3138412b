use super::client::{Client, PublishReport};
use crate::domain::{Event, EventError};
use crate::reliability::RetryPolicy;
use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Anything that can take a publish batch and report per-event outcomes.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, events: Vec<Event>) -> PublishReport;
}

#[async_trait]
impl Publisher for Client {
    async fn publish(&self, events: Vec<Event>) -> PublishReport {
        Client::publish(self, events).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub read: usize,
    pub acked: usize,
    pub dropped: usize,
    /// Event re-publications, summed over all retry rounds.
    pub retried: usize,
    pub skipped_lines: usize,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] simd_json::Error),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Parses one NDJSON line into an event.
pub fn parse_event(line: &str) -> Result<Event, ParseError> {
    let mut bytes = line.as_bytes().to_vec();
    let value: serde_json::Value = simd_json::serde::from_slice(&mut bytes)?;
    Ok(Event::from_value(value)?)
}

/// Reads NDJSON events and publishes them in fixed-size batches.
pub struct Pipeline<P> {
    publisher: P,
    batch_size: usize,
    retry_policy: RetryPolicy,
}

impl<P: Publisher> Pipeline<P> {
    pub fn new(publisher: P, batch_size: usize, retry_policy: RetryPolicy) -> Self {
        Self {
            publisher,
            batch_size: batch_size.max(1),
            retry_policy,
        }
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Runs until the input ends or `shutdown` resolves. Events read before
    /// shutdown are still published.
    pub async fn run<R, S>(&self, reader: R, shutdown: S) -> std::io::Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let mut stats = PipelineStats::default();
        let mut lines = reader.lines();
        let mut pending = Vec::with_capacity(self.batch_size);
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                () = &mut shutdown => {
                    info!("Shutdown requested, flushing {} pending events", pending.len());
                    break;
                }
            };

            let Some(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_event(trimmed) {
                Ok(event) => {
                    stats.read += 1;
                    pending.push(event);
                }
                Err(e) => {
                    stats.skipped_lines += 1;
                    warn!("Skipping unparsable line: {e}");
                    continue;
                }
            }

            if pending.len() >= self.batch_size {
                let batch = std::mem::replace(&mut pending, Vec::with_capacity(self.batch_size));
                self.publish_with_retry(batch, &mut stats).await;
            }
        }

        if !pending.is_empty() {
            self.publish_with_retry(pending, &mut stats).await;
        }

        info!(
            "Pipeline finished: {} read, {} acked, {} dropped, {} retried, {} lines skipped",
            stats.read, stats.acked, stats.dropped, stats.retried, stats.skipped_lines
        );
        Ok(stats)
    }

    async fn publish_with_retry(&self, events: Vec<Event>, stats: &mut PipelineStats) {
        let mut report = self.publisher.publish(events).await;
        let mut attempt = 0;

        loop {
            stats.acked += report.acked;
            stats.dropped += report.dropped.len();
            for dropped in &report.dropped {
                debug!("Dropped event: {}", dropped.reason);
            }

            if report.retry.is_empty() {
                return;
            }

            if self.retry_policy.exhausted(attempt) {
                warn!(
                    "Giving up on {} events after {attempt} retries",
                    report.retry.len()
                );
                stats.dropped += report.retry.len();
                return;
            }

            let delay = self.retry_policy.delay_for(attempt);
            debug!(
                "Retrying {} events in {delay:?} (attempt {})",
                report.retry.len(),
                attempt + 1
            );
            tokio::time::sleep(delay).await;

            stats.retried += report.retry.len();
            attempt += 1;
            report = self.publisher.publish(report.retry).await;
        }
    }
}
