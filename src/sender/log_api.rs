use super::error::ApiError;
use super::route::ApiRoute;
use super::transport::AuthTransport;
use crate::domain::{Log, LogBatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Wire form of one log batch filed under a resolved application.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatchRequest<'a> {
    pub application_id: Uuid,
    pub tag: &'a str,
    pub logs: &'a [Log],
}

impl<'a> LogBatchRequest<'a> {
    pub fn new(application_id: Uuid, batch: &'a LogBatch) -> Self {
        Self {
            application_id,
            tag: &batch.tag,
            logs: &batch.logs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogReceipt {
    #[serde(default)]
    pub receipt_id: Option<Uuid>,
    #[serde(default)]
    pub logs_count: Option<u64>,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct LogApi {
    transport: Arc<AuthTransport>,
}

impl LogApi {
    pub fn new(transport: Arc<AuthTransport>) -> Self {
        Self { transport }
    }

    /// Submits one batch. A receipt that cannot be decoded is logged and
    /// yields `None`; the 2xx status alone confirms delivery.
    pub async fn send_log_batch(
        &self,
        request: &LogBatchRequest<'_>,
    ) -> Result<Option<LogReceipt>, ApiError> {
        let route = ApiRoute::SendLogs;
        let response = self.transport.request_json(&route, request).await?;

        match response.json::<LogReceipt>(&route) {
            Ok(receipt) => {
                info!(
                    "Sent {} logs for application {} (receipt {:?})",
                    request.logs.len(),
                    request.application_id,
                    receipt.receipt_id
                );
                Ok(Some(receipt))
            }
            Err(e) => {
                warn!("Ignoring log receipt: {e}");
                Ok(None)
            }
        }
    }
}
