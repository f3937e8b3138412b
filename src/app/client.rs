use super::config::{Config, ConfigError};
use crate::domain::Event;
use crate::mapper::{LogBatchMapper, MappingSummary};
use crate::sender::{
    ApiError, AuthTransport, CachedApplicationApi, ConnectionStats, Credentials,
    HttpApplicationApi, LogApi, LogSender, MissingApplicationPolicy, TransportConfig,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Connection failed: {0}")]
    Api(#[from] ApiError),
}

/// Everything needed to connect a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub credentials: Credentials,
    pub mapper: LogBatchMapper,
    pub policy: MissingApplicationPolicy,
}

impl ClientConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: config.transport_config(),
            credentials: config.credentials(),
            mapper: config.log_batch_mapper()?,
            policy: config.missing_application_policy(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DroppedEvent {
    pub event: Event,
    pub reason: String,
}

/// Per-event outcome of one publish call.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub acked: usize,
    /// Events worth publishing again later.
    pub retry: Vec<Event>,
    /// Events that will never be accepted as they are.
    pub dropped: Vec<DroppedEvent>,
}

impl PublishReport {
    pub fn total(&self) -> usize {
        self.acked + self.retry.len() + self.dropped.len()
    }
}

/// Maps events into log batches and ships them to logsight.
pub struct Client {
    mapper: LogBatchMapper,
    sender: LogSender,
    transport: Arc<AuthTransport>,
}

impl Client {
    /// Logs in and wires the cached application registry and the sender.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(
            AuthTransport::connect(config.transport.clone(), config.credentials.clone()).await?,
        );

        let applications = CachedApplicationApi::new(HttpApplicationApi::new(transport.clone()));
        let sender = LogSender::new(
            Arc::new(applications),
            LogApi::new(transport.clone()),
            config.policy,
        );

        info!(
            "Connected to {} (missing applications: {:?})",
            transport.base_url(),
            config.policy
        );

        Ok(Self {
            mapper: config.mapper.clone(),
            sender,
            transport,
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client_config = ClientConfig::from_config(config)?;
        Self::connect(&client_config).await
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.transport.connection_stats()
    }

    /// Publishes one batch of events. Never fails as a whole: every event
    /// ends up acked, queued for retry or dropped with a reason.
    pub async fn publish(&self, events: Vec<Event>) -> PublishReport {
        let mut report = PublishReport::default();
        if events.is_empty() {
            return report;
        }

        let total = events.len();
        let grouping = self.mapper.to_log_batches(&events);
        match grouping.summary(total) {
            Ok(()) => {}
            Err(summary @ MappingSummary::PartiallyFailed { .. }) => debug!("{summary}"),
            Err(summary @ MappingSummary::AllFailed { .. }) => warn!("{summary}"),
        }

        let mut slots: Vec<Option<Event>> = events.into_iter().map(Some).collect();

        for failed in grouping.failed {
            if let Some(event) = slots[failed.event_index].take() {
                report.dropped.push(DroppedEvent {
                    event,
                    reason: failed.error.to_string(),
                });
            }
        }

        for mapped in grouping.batches {
            match self.sender.send(&mapped.batch).await {
                Ok(_) => report.acked += mapped.batch.len(),
                Err(e) if e.is_retryable() => {
                    report
                        .retry
                        .extend(mapped.event_indices.iter().filter_map(|&i| slots[i].take()));
                }
                Err(e) => {
                    let reason = e.to_string();
                    report.dropped.extend(
                        mapped
                            .event_indices
                            .iter()
                            .filter_map(|&i| slots[i].take())
                            .map(|event| DroppedEvent {
                                event,
                                reason: reason.clone(),
                            }),
                    );
                }
            }
        }

        debug!(
            "Published {total} events: {} acked, {} to retry, {} dropped",
            report.acked,
            report.retry.len(),
            report.dropped.len()
        );
        report
    }

    pub fn close(self) {
        self.sender.close();
        debug!("Client closed");
    }
}
