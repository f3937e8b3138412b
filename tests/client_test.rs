mod common;

use common::{applications_path, bearer, mount_applications, mount_login, mount_user_info};
use logsight_forwarder::app::{Client, ClientConfig};
use logsight_forwarder::domain::Event;
use logsight_forwarder::mapper::{LogBatchMapper, LogMapper, Mapper, TagsMapper};
use logsight_forwarder::sender::MissingApplicationPolicy;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mapper() -> LogBatchMapper {
    LogBatchMapper {
        application_name: Mapper::key("app").into(),
        tag: Mapper::constant("default").into(),
        log: LogMapper {
            timestamp: Mapper::key("ts").into(),
            message: Mapper::key("message").into(),
            level: Mapper::key("level").into(),
            tags: TagsMapper::new([("host", "host")]),
        },
    }
}

fn event(app: &str, message: &str, level: &str) -> Event {
    Event::from_value(json!({
        "app": app,
        "ts": "2022-04-04T09:00:35.123Z",
        "message": message,
        "level": level,
        "host": "web-1"
    }))
    .unwrap()
}

async fn connect(server: &MockServer, policy: MissingApplicationPolicy) -> Client {
    mount_login(server, "t1").await;
    mount_user_info(server, "t1").await;

    let config = ClientConfig {
        transport: common::transport_config(server),
        credentials: common::credentials(),
        mapper: mapper(),
        policy,
    };
    Client::connect(&config).await.unwrap()
}

#[tokio::test]
async fn test_auto_create_then_send_against_new_id() {
    let server = MockServer::start().await;
    let created_id = Uuid::from_u128(42);

    mount_applications(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(applications_path()))
        .and(header("authorization", bearer("t1").as_str()))
        .and(body_partial_json(json!({ "applicationName": "myservice" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "applicationId": created_id, "name": "myservice" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs"))
        .and(body_partial_json(json!({
            "applicationId": created_id,
            "tag": "default",
            "logs": [{
                "timestamp": "2022-04-04T09:00:35.123Z",
                "message": "started",
                "level": "INFO",
                "tags": { "host": "web-1" }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "logsCount": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server, MissingApplicationPolicy::AutoCreate).await;
    let report = client.publish(vec![event("my-service", "started", "info")]).await;

    assert_eq!(report.acked, 1);
    assert!(report.retry.is_empty());
    assert!(report.dropped.is_empty());
    client.close();
}

#[tokio::test]
async fn test_mixed_levels_send_only_valid_logs() {
    let server = MockServer::start().await;
    let svc_id = Uuid::from_u128(1);

    mount_applications(&server, json!([{ "applicationId": svc_id, "name": "svc" }])).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs"))
        .and(body_partial_json(json!({ "applicationId": svc_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "logsCount": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&server, MissingApplicationPolicy::ErrorOnMissing).await;
    let report = client
        .publish(vec![event("svc", "fine", "info"), event("svc", "odd", "BOGUS")])
        .await;

    assert_eq!(report.acked, 1);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(
        report.dropped[0].event.get_value("message"),
        Some(&json!("odd"))
    );
    assert!(report.dropped[0].reason.contains("BOGUS"));
}

#[tokio::test]
async fn test_publish_classifies_failures_per_batch() {
    let server = MockServer::start().await;
    let svc_id = Uuid::from_u128(1);
    let db_id = Uuid::from_u128(2);

    mount_applications(
        &server,
        json!([
            { "applicationId": svc_id, "name": "svc" },
            { "applicationId": db_id, "name": "db" }
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs"))
        .and(body_partial_json(json!({ "applicationId": svc_id })))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs"))
        .and(body_partial_json(json!({ "applicationId": db_id })))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad batch"))
        .mount(&server)
        .await;

    let client = connect(&server, MissingApplicationPolicy::ErrorOnMissing).await;
    let report = client
        .publish(vec![
            event("svc", "a", "info"),
            event("db", "b", "info"),
            event("gone", "c", "info"),
            event("svc", "d", "info"),
        ])
        .await;

    assert_eq!(report.acked, 0);
    assert_eq!(report.total(), 4);

    let retried: Vec<_> = report
        .retry
        .iter()
        .map(|e| e.get_value("message").cloned())
        .collect();
    assert_eq!(retried, vec![Some(json!("a")), Some(json!("d"))]);

    assert_eq!(report.dropped.len(), 2);
    let reasons: Vec<_> = report.dropped.iter().map(|d| d.reason.as_str()).collect();
    assert!(reasons.iter().any(|r| r.contains("bad batch")));
    assert!(reasons.iter().any(|r| r.contains("Application 'gone' not found")));
}

#[tokio::test]
async fn test_empty_publish_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = connect(&server, MissingApplicationPolicy::AutoCreate).await;
    let report = client.publish(Vec::new()).await;
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn test_all_failed_mapping_drops_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(applications_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = connect(&server, MissingApplicationPolicy::AutoCreate).await;
    let no_app = Event::from_value(json!({ "message": "m", "level": "info" })).unwrap();
    let report = client
        .publish(vec![no_app, event("svc", "x", "loud")])
        .await;

    assert_eq!(report.acked, 0);
    assert_eq!(report.dropped.len(), 2);
    assert!(report.retry.is_empty());
}
