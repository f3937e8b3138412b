use super::error::ApiError;
use super::route::ApiRoute;
use super::serialization::{BodyEncoder, EncodedBody};
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
    pub enable_compression: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(120),
            connection_timeout: Duration::from_secs(30),
            max_connections: 10,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: concat!("logsight-forwarder/", env!("CARGO_PKG_VERSION")).to_string(),
            enable_compression: false,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub user_key: Option<String>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .field("user_key", &self.user_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: LoginUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginUser {
    user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self, route: &ApiRoute) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Decode {
            route: route.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub logins: u64,
    pub average_response_time: Duration,
}

#[derive(Debug, Default)]
struct TransportStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    logins: AtomicU64,
    total_response_time: AtomicU64,
}

impl TransportStats {
    fn record_request(&self, success: bool, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_login(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ConnectionStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.total_response_time.load(Ordering::Relaxed);

        let average_response_time = if total_requests > 0 {
            Duration::from_millis(total_response_time / total_requests)
        } else {
            Duration::ZERO
        };

        ConnectionStats {
            total_requests,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            average_response_time,
        }
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// HTTP transport that owns the bearer session.
///
/// Every authenticated request carries the current token. A 401 or 403
/// triggers one re-login and one retry of the same request; a second
/// rejection is reported as [`ApiError::Auth`].
#[derive(Debug)]
pub struct AuthTransport {
    client: Client,
    config: TransportConfig,
    base_url: Url,
    encoder: BodyEncoder,
    credentials: Credentials,
    session: Mutex<Option<AuthSession>>,
    stats: TransportStats,
}

impl AuthTransport {
    /// Builds the HTTP client without touching the network.
    pub fn new(config: TransportConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let base_url: Url = config
            .base_url
            .parse()
            .map_err(|e| ApiError::InvalidConfiguration(format!("Invalid base URL: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfiguration(format!(
                "Unsupported URL scheme: {}",
                base_url.scheme()
            )));
        }

        // gzip here only governs response decompression
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| {
                ApiError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            encoder: BodyEncoder::new(config.enable_compression),
            config,
            base_url,
            credentials,
            session: Mutex::new(None),
            stats: TransportStats::default(),
        })
    }

    /// Builds the transport, logs in and loads the user's key.
    pub async fn connect(
        config: TransportConfig,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let transport = Self::new(config, credentials)?;
        let session = transport.login().await?;

        match transport.user_info(session.user_id).await {
            Ok(info) => {
                let mut guard = transport.session.lock().await;
                if let Some(session) = guard.as_mut() {
                    session.user_key = info.key;
                }
            }
            Err(ApiError::UnexpectedStatus { status: 404, .. }) => {
                warn!("No user info for {}; continuing without a user key", session.user_id);
            }
            Err(e) => return Err(e),
        }

        Ok(transport)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.stats.snapshot()
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.lock().await.clone()
    }

    /// Replaces any current session with a fresh login.
    pub async fn login(&self) -> Result<AuthSession, ApiError> {
        let mut guard = self.session.lock().await;
        let user_key = guard.as_ref().and_then(|s| s.user_key.clone());
        let session = self.perform_login(user_key).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// User id of the current session, logging in first if needed.
    pub async fn user_id(&self) -> Result<Uuid, ApiError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.user_id);
        }
        let session = self.perform_login(None).await?;
        let user_id = session.user_id;
        *guard = Some(session);
        Ok(user_id)
    }

    pub async fn user_info(&self, user_id: Uuid) -> Result<UserInfo, ApiError> {
        let route = ApiRoute::UserInfo { user_id };
        self.request(&route).await?.json(&route)
    }

    /// Sends a request without a body.
    pub async fn request(&self, route: &ApiRoute) -> Result<ApiResponse, ApiError> {
        self.execute(route, None).await
    }

    /// Sends `body` as JSON.
    pub async fn request_json<T: Serialize + ?Sized>(
        &self,
        route: &ApiRoute,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        let encoded = self
            .encoder
            .encode(body)
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(route, Some(&encoded)).await
    }

    async fn execute(
        &self,
        route: &ApiRoute,
        body: Option<&EncodedBody>,
    ) -> Result<ApiResponse, ApiError> {
        if !route.requires_auth() {
            let response = self.send(route, body, None).await?;
            return Self::into_success(route, response).await;
        }

        let token = self.current_token().await?;
        let response = self.send(route, body, Some(&token)).await?;
        if !is_auth_failure(response.status()) {
            return Self::into_success(route, response).await;
        }

        warn!(
            "{route} rejected with {}; logging in again",
            response.status().as_u16()
        );
        let token = self.refresh_token(&token).await?;
        let response = self.send(route, body, Some(&token)).await?;
        if is_auth_failure(response.status()) {
            return Err(ApiError::Auth {
                reason: format!(
                    "{route} still rejected with {} after re-login",
                    response.status().as_u16()
                ),
            });
        }

        Self::into_success(route, response).await
    }

    async fn send(
        &self,
        route: &ApiRoute,
        body: Option<&EncodedBody>,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut url = self.base_url.clone();
        url.set_path(&route.path());

        let mut request = self.client.request(route.method(), url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.bytes.clone());
            if body.gzipped {
                request = request.header(CONTENT_ENCODING, "gzip");
            }
        }

        let start = Instant::now();
        match request.send().await {
            Ok(response) => {
                let status = response.status();
                self.stats
                    .record_request(status.is_success(), start.elapsed());
                debug!("{route} -> {} in {:?}", status.as_u16(), start.elapsed());
                Ok(response)
            }
            Err(e) => {
                self.stats.record_request(false, start.elapsed());
                debug!("{route} failed: {e}");
                Err(ApiError::Transport(e))
            }
        }
    }

    async fn into_success(route: &ApiRoute, response: Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            Ok(ApiResponse { status, body })
        } else {
            Err(ApiError::UnexpectedStatus {
                route: route.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }

    async fn current_token(&self) -> Result<String, ApiError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.token.clone());
        }

        let session = self.perform_login(None).await?;
        let token = session.token.clone();
        *guard = Some(session);
        Ok(token)
    }

    /// Logs in again unless another caller already replaced `stale`.
    async fn refresh_token(&self, stale: &str) -> Result<String, ApiError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if session.token != stale {
                debug!("Session already refreshed by another caller");
                return Ok(session.token.clone());
            }
        }

        let user_key = guard.as_ref().and_then(|s| s.user_key.clone());
        let session = self.perform_login(user_key).await?;
        let token = session.token.clone();
        *guard = Some(session);
        Ok(token)
    }

    async fn perform_login(&self, user_key: Option<String>) -> Result<AuthSession, ApiError> {
        let route = ApiRoute::Login;
        let body = self
            .encoder
            .encode(&LoginRequest {
                email: &self.credentials.email,
                password: &self.credentials.password,
            })
            .map_err(|e| ApiError::Encode(e.to_string()))?;

        let response = self
            .send(&route, Some(&body), None)
            .await
            .map_err(|e| ApiError::Auth {
                reason: format!("login request failed: {e}"),
            })?;

        let response = Self::into_success(&route, response)
            .await
            .map_err(|e| ApiError::Auth {
                reason: format!("login as {} rejected: {e}", self.credentials.email),
            })?;

        let login: LoginResponse = response.json(&route).map_err(|e| ApiError::Auth {
            reason: format!("unusable login response: {e}"),
        })?;

        self.stats.record_login();
        info!("Logged in as {} (user {})", self.credentials.email, login.user.user_id);

        Ok(AuthSession {
            token: login.token,
            user_id: login.user.user_id,
            user_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = TransportConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = AuthTransport::new(config, Credentials::new("a@b.c", "pw")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfiguration(_)));

        let config = TransportConfig {
            base_url: "ftp://logs.example.com".to_string(),
            ..Default::default()
        };
        assert!(AuthTransport::new(config, Credentials::new("a@b.c", "pw")).is_err());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let credentials = Credentials::new("dev@example.com", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("dev@example.com"));
        assert!(!rendered.contains("hunter2"));

        let session = AuthSession {
            token: "secret-token".to_string(),
            user_id: Uuid::nil(),
            user_key: Some("secret-key".to_string()),
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("secret-key"));
    }

    #[tokio::test]
    async fn test_new_transport_has_no_session() {
        let transport =
            AuthTransport::new(TransportConfig::default(), Credentials::new("a@b.c", "pw")).unwrap();
        assert!(transport.session().await.is_none());
        assert_eq!(transport.connection_stats().total_requests, 0);
    }
}
