use super::error::ApiError;
use super::route::ApiRoute;
use super::transport::AuthTransport;
use crate::domain::Application;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Remote application registry of the logged-in user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationApi: Send + Sync {
    async fn get_applications(&self) -> Result<Vec<Application>, ApiError>;

    /// `Ok(None)` when no application carries `name`.
    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>, ApiError>;

    async fn create_application(&self, name: &str) -> Result<Application, ApiError>;
}

#[async_trait]
impl<A: ApplicationApi + ?Sized> ApplicationApi for Arc<A> {
    async fn get_applications(&self) -> Result<Vec<Application>, ApiError> {
        (**self).get_applications().await
    }

    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>, ApiError> {
        (**self).get_application_by_name(name).await
    }

    async fn create_application(&self, name: &str) -> Result<Application, ApiError> {
        (**self).create_application(name).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateApplicationRequest<'a> {
    application_name: &'a str,
}

#[derive(Deserialize)]
struct ApplicationsResponse {
    applications: Vec<Application>,
}

#[derive(Debug, Clone)]
pub struct HttpApplicationApi {
    transport: Arc<AuthTransport>,
}

impl HttpApplicationApi {
    pub fn new(transport: Arc<AuthTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ApplicationApi for HttpApplicationApi {
    async fn get_applications(&self) -> Result<Vec<Application>, ApiError> {
        let route = ApiRoute::Applications {
            user_id: self.transport.user_id().await?,
        };
        let response: ApplicationsResponse = self.transport.request(&route).await?.json(&route)?;
        debug!("Loaded {} applications", response.applications.len());
        Ok(response.applications)
    }

    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>, ApiError> {
        Ok(self
            .get_applications()
            .await?
            .into_iter()
            .find(|app| app.name == name))
    }

    async fn create_application(&self, name: &str) -> Result<Application, ApiError> {
        let route = ApiRoute::CreateApplication {
            user_id: self.transport.user_id().await?,
        };
        let request = CreateApplicationRequest {
            application_name: name,
        };

        match self.transport.request_json(&route, &request).await {
            Ok(response) => {
                let application: Application = response.json(&route)?;
                info!("Created application {} ({})", application.name, application.id);
                Ok(application)
            }
            Err(ApiError::UnexpectedStatus { status: 409, .. }) => {
                debug!("Application {name} already exists, looking it up");
                self.get_application_by_name(name)
                    .await?
                    .ok_or_else(|| ApiError::ConflictUnresolved {
                        name: name.to_string(),
                    })
            }
            Err(e) => Err(e),
        }
    }
}
