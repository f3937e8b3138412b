#![allow(dead_code)]

use logsight_forwarder::sender::{AuthTransport, Credentials, TransportConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "dev@example.com";
pub const PASSWORD: &str = "s3cret";

pub fn user_id() -> Uuid {
    Uuid::from_u128(0x6f1e_4b52_5f0e_4c8e_9a39_0d5b_4d5f_1f11)
}

pub fn applications_path() -> String {
    format!("/api/v1/users/{}/applications", user_id())
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn login_body(token: &str) -> serde_json::Value {
    json!({
        "token": token,
        "user": { "userId": user_id(), "email": EMAIL }
    })
}

/// Every login succeeds with `token`.
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token)))
        .mount(server)
        .await;
}

/// First login yields `first`, every later one `second`.
pub async fn mount_login_sequence(server: &MockServer, first: &str, second: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(first)))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(second)))
        .mount(server)
        .await;
}

pub async fn mount_user_info(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/users/{}", user_id())))
        .and(header("authorization", bearer(token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": user_id(),
            "email": EMAIL,
            "key": "user-key"
        })))
        .mount(server)
        .await;
}

pub async fn mount_applications(server: &MockServer, applications: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(applications_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "applications": applications })),
        )
        .mount(server)
        .await;
}

pub fn transport_config(server: &MockServer) -> TransportConfig {
    TransportConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        connection_timeout: Duration::from_secs(2),
        ..TransportConfig::default()
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD)
}

/// A transport that has not logged in yet.
pub fn transport(server: &MockServer) -> Arc<AuthTransport> {
    Arc::new(AuthTransport::new(transport_config(server), credentials()).unwrap())
}
