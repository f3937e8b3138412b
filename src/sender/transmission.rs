use super::application::ApplicationApi;
use super::error::SendError;
use super::log_api::{LogApi, LogBatchRequest, LogReceipt};
use crate::domain::{Application, LogBatch, escape_application_name};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to do when a batch names an application the account does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingApplicationPolicy {
    #[default]
    ErrorOnMissing,
    AutoCreate,
}

impl MissingApplicationPolicy {
    pub fn from_auto_create(auto_create: bool) -> Self {
        if auto_create {
            Self::AutoCreate
        } else {
            Self::ErrorOnMissing
        }
    }

    /// Looks `name` up and applies the policy when it is absent.
    ///
    /// Auto-created applications carry the escaped form of `name`.
    pub async fn resolve_or_handle(
        &self,
        api: &dyn ApplicationApi,
        name: &str,
    ) -> Result<Application, SendError> {
        if let Some(application) = api.get_application_by_name(name).await? {
            return Ok(application);
        }

        match self {
            Self::ErrorOnMissing => Err(SendError::ApplicationNotFound {
                name: name.to_string(),
            }),
            Self::AutoCreate => {
                let escaped = escape_application_name(name);
                info!("Application {name} not found, creating it as {escaped}");
                Ok(api.create_application(&escaped).await?)
            }
        }
    }
}

pub struct LogSender {
    applications: Arc<dyn ApplicationApi>,
    log_api: LogApi,
    policy: MissingApplicationPolicy,
}

impl LogSender {
    pub fn new(
        applications: Arc<dyn ApplicationApi>,
        log_api: LogApi,
        policy: MissingApplicationPolicy,
    ) -> Self {
        Self {
            applications,
            log_api,
            policy,
        }
    }

    /// Resolves the batch's application and submits its logs.
    ///
    /// Errors are returned as they occurred; the only retry happening here is
    /// the transport's single re-login.
    pub async fn send(&self, batch: &LogBatch) -> Result<Option<LogReceipt>, SendError> {
        debug!(
            "Sending {} logs for {}/{}",
            batch.len(),
            batch.application_name,
            batch.tag
        );

        let application = self
            .policy
            .resolve_or_handle(self.applications.as_ref(), &batch.application_name)
            .await?;

        let request = LogBatchRequest::new(application.id, batch);
        match self.log_api.send_log_batch(&request).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                warn!(
                    "Failed to send {} logs for {}: {e}",
                    batch.len(),
                    batch.application_name
                );
                Err(e.into())
            }
        }
    }

    /// Drops the sender and, with it, the pooled HTTP connections.
    pub fn close(self) {
        debug!("Closing log sender");
    }
}
