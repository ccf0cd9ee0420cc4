//! HTTP client tests against a mock IoT cloud API

use chrono::{TimeZone, Utc};
use iot_exporter::adapters::iot::{ArduinoIotClient, TelemetryApi};
use iot_exporter::config::{secret_string, IotConfig};
use iot_exporter::domain::{ExporterError, IotApiError, PropertyId, ThingId, UpdateStrategy};
use mockito::{Matcher, Mock, Server};
use serde_json::json;
use std::collections::BTreeMap;

const THING_ID: &str = "91f30213-2bd7-480a-b1dc-f31b01840e7e";
const PROPERTY_ID: &str = "c86f4ed9-7f52-4bd3-bdc6-b2936bec68ac";

fn client_for(server: &Server, organization: Option<&str>) -> ArduinoIotClient {
    let config = IotConfig {
        api_url: server.url(),
        client_id: "client".to_string(),
        client_secret: secret_string("secret".to_string()),
        organization_id: organization.map(str::to_string),
        timeout_seconds: 5,
        ..IotConfig::default()
    };
    ArduinoIotClient::new(&config).unwrap()
}

async fn mock_token(server: &mut Server) -> Mock {
    server
        .mock("POST", "/iot/v1/clients/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "expires_in": 3600}"#)
        .create_async()
        .await
}

#[tokio::test]
async fn test_list_things_filters_by_tags() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;

    let things = server
        .mock("GET", "/iot/v2/things")
        .match_header("authorization", "Bearer tok-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("show_properties".into(), "true".into()),
            Matcher::UrlEncoded("tags".into(), "site:turin".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": THING_ID,
                    "name": "boiler",
                    "properties": [
                        {
                            "id": PROPERTY_ID,
                            "name": "temperature",
                            "type": "HOME_TEMPERATURE",
                            "update_strategy": "ON_CHANGE",
                            "last_value": 21.5,
                            "value_updated_at": "2024-05-10T08:00:00Z"
                        }
                    ]
                },
                { "id": "", "name": "orphan" }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let mut tags = BTreeMap::new();
    tags.insert("site".to_string(), "turin".to_string());

    let listed = client.list_things(&tags).await.unwrap();
    things.assert_async().await;

    assert_eq!(listed.len(), 1);
    let thing = &listed[0];
    assert_eq!(thing.name, "boiler");
    assert_eq!(thing.properties.len(), 1);
    assert_eq!(thing.properties[0].update_strategy, UpdateStrategy::OnChange);
    assert_eq!(thing.properties[0].last_value, Some(json!(21.5)));
}

#[tokio::test]
async fn test_aggregated_query_body() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;

    let query = server
        .mock("POST", "/iot/v2/series/batch_query")
        .match_body(Matcher::Json(json!({
            "requests": [{
                "q": format!("thing.{THING_ID}"),
                "from": "2024-05-10T09:10:00Z",
                "to": "2024-05-10T10:10:00Z",
                "interval": 300,
                "aggregation": "AVG"
            }],
            "resp_version": 1
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "responses": [{
                    "query": format!("property.{PROPERTY_ID}"),
                    "times": ["2024-05-10T09:30:00Z", "2024-05-10T09:35:00Z"],
                    "values": [1.0, 2.5],
                    "count_values": 2
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let from = Utc.with_ymd_and_hms(2024, 5, 10, 9, 10, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 10, 10, 10, 0).unwrap();
    let batch = client
        .series_by_thing(&ThingId::new(THING_ID).unwrap(), from, to, 300, "AVG")
        .await
        .unwrap();
    query.assert_async().await;

    assert_eq!(batch.responses.len(), 1);
    let series = &batch.responses[0];
    assert_eq!(series.values, vec![1.0, 2.5]);
    assert_eq!(
        series.resolve_property_id(),
        Some(PropertyId::new(PROPERTY_ID).unwrap())
    );
}

#[tokio::test]
async fn test_sampled_query_has_no_aggregation() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;

    let query = server
        .mock("POST", "/iot/v2/series/batch_query_sampling")
        .match_body(Matcher::Json(json!({
            "requests": [{
                "q": format!("property.{PROPERTY_ID}"),
                "from": "2024-05-10T09:10:00Z",
                "to": "2024-05-10T10:10:00Z",
                "interval": 300
            }],
            "resp_version": 1
        })))
        .with_status(200)
        .with_body(r#"{"responses": []}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let from = Utc.with_ymd_and_hms(2024, 5, 10, 9, 10, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 10, 10, 10, 0).unwrap();
    let batch = client
        .series_string_sampled(&[PropertyId::new(PROPERTY_ID).unwrap()], from, to, 300)
        .await
        .unwrap();
    query.assert_async().await;
    assert!(batch.responses.is_empty());
}

#[tokio::test]
async fn test_rate_limit_maps_to_retryable_error() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("POST", "/iot/v2/series/batch_query_raw")
        .with_status(429)
        .with_body(r#"{"detail": "too many requests"}"#)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let now = Utc::now();
    let err = client
        .series_raw_by_thing(&ThingId::new(THING_ID).unwrap(), now, now)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, ExporterError::Iot(IotApiError::RateLimited(_))));
}

#[tokio::test]
async fn test_client_error_carries_detail() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("POST", "/iot/v2/series/batch_query")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "invalid interval"}"#)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let now = Utc::now();
    let err = client
        .series_by_thing(&ThingId::new(THING_ID).unwrap(), now, now, 1, "AVG")
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    match err {
        ExporterError::Iot(IotApiError::ClientError { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("invalid interval"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/iot/v1/clients/token")
        .with_status(401)
        .create_async()
        .await;

    let client = client_for(&server, None);
    let err = client.list_things(&BTreeMap::new()).await.unwrap_err();

    assert!(err.to_string().contains("wrong credentials"), "{err}");
}

#[tokio::test]
async fn test_organization_header_is_sent() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;

    let things = server
        .mock("GET", "/iot/v2/things")
        .match_query(Matcher::Any)
        .match_header("x-organization", "org-42")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, Some("org-42"));
    let listed = client.list_things(&BTreeMap::new()).await.unwrap();
    things.assert_async().await;
    assert!(listed.is_empty());
}
