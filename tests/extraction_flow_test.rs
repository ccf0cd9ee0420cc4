//! Integration tests for the concurrent extraction engine

mod common;

use common::*;
use iot_exporter::core::extract::{
    ExtractionCoordinator, ExtractionSettings, ExtractionState, RetryPolicy, SeriesFetcher,
};
use iot_exporter::domain::{ExporterError, PropertyId, Thing};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        jitter: Duration::from_millis(2),
    }
}

fn coordinator(api: StubApi, dir: &TempDir, resolution_seconds: i64) -> (Arc<StubApi>, ExtractionCoordinator) {
    let api = Arc::new(api);
    let fetcher = SeriesFetcher::new(api.clone(), fast_retry());
    let settings = ExtractionSettings {
        resolution_seconds,
        window_minutes: 60,
        output_dir: dir.path().to_path_buf(),
        ..ExtractionSettings::default()
    };
    (api, ExtractionCoordinator::new(fetcher, settings))
}

fn read_records(path: &std::path::Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().clone();
    let records = reader.records().map(|r| r.unwrap()).collect();
    (header, records)
}

fn aggregated_api(thing: &Thing) -> StubApi {
    let mut api = StubApi {
        things: vec![thing.clone()],
        ..StubApi::default()
    };
    api.aggregated.insert(
        THING_ID.to_string(),
        batch(vec![series(
            format!("property.{FLOAT_PROPERTY_ID}"),
            &[(at(9, 30), 1.0), (at(9, 35), 2.0)],
        )]),
    );
    api.sampled.insert(
        STRING_PROPERTY_ID.to_string(),
        batch(vec![series(
            format!("property.{STRING_PROPERTY_ID}"),
            &[(at(9, 25), json!("a")), (at(9, 30), json!("b")), (at(9, 35), json!("c"))],
        )]),
    );
    api
}

#[tokio::test]
async fn test_aggregated_flow_writes_numeric_and_sampled_rows() {
    let dir = TempDir::new().unwrap();
    let (api, coordinator) = coordinator(aggregated_api(&sample_thing()), &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing()]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    assert_eq!(extraction.window.from, at(9, 10));
    assert_eq!(extraction.window.to, at(10, 10));
    assert_eq!(extraction.rows, 5);
    assert!(extraction.is_complete());
    assert!(extraction.error().is_none());

    let content = std::fs::read_to_string(extraction.sink.path()).unwrap();
    let expected = [
        "timestamp,thing_id,thing_name,property_id,property_name,property_type,value,aggregation_statistic",
        "91f30213-2bd7-480a-b1dc-f31b01840e7e,test,c86f4ed9-7f52-4bd3-bdc6-b2936bec68ac,ptest,FLOAT,1,AVG",
        "91f30213-2bd7-480a-b1dc-f31b01840e7e,test,c86f4ed9-7f52-4bd3-bdc6-b2936bec68ac,ptest,FLOAT,2,AVG",
        "91f30213-2bd7-480a-b1dc-f31b01840e7e,test,a86f4ed9-7f52-4bd3-bdc6-b2936bec68bb,pstringVar,CHARSTRING,a,",
        "91f30213-2bd7-480a-b1dc-f31b01840e7e,test,a86f4ed9-7f52-4bd3-bdc6-b2936bec68bb,pstringVar,CHARSTRING,b,",
        "91f30213-2bd7-480a-b1dc-f31b01840e7e,test,a86f4ed9-7f52-4bd3-bdc6-b2936bec68bb,pstringVar,CHARSTRING,c,",
    ];
    for entry in expected {
        assert!(content.contains(entry), "missing {entry} in\n{content}");
    }
    assert!(content.contains("2024-05-10T09:30:00Z,91f30213"));

    assert_eq!(
        api.calls(),
        vec![
            format!("aggregated:{THING_ID}:300:AVG"),
            format!("sampled:{STRING_PROPERTY_ID}:300"),
        ]
    );
}

#[tokio::test]
async fn test_raw_flow_writes_seven_columns() {
    let dir = TempDir::new().unwrap();
    let mut api = StubApi::default();
    api.raw.insert(
        THING_ID.to_string(),
        batch(vec![
            series(
                format!("property.{FLOAT_PROPERTY_ID}"),
                &[(at(9, 30), json!(1.0)), (at(9, 31), json!(2.0))],
            ),
            series(
                format!("property.{STRING_PROPERTY_ID}"),
                &[(at(9, 29), json!("a")), (at(9, 30), json!("b")), (at(9, 31), json!("c"))],
            ),
        ]),
    );
    let (api, coordinator) = coordinator(api, &dir, -1);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing()]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    let (header, records) = read_records(extraction.sink.path());
    assert_eq!(
        header.iter().collect::<Vec<_>>(),
        vec!["timestamp", "thing_id", "thing_name", "property_id", "property_name", "property_type", "value"]
    );
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.len() == 7));

    let values: Vec<&str> = records.iter().map(|r| &r[6]).collect();
    assert_eq!(values, vec!["1", "2", "a", "b", "c"]);

    assert_eq!(api.calls(), vec![format!("raw:{THING_ID}")]);
}

#[tokio::test]
async fn test_zero_count_series_produce_no_rows() {
    let dir = TempDir::new().unwrap();
    let mut api = StubApi::default();
    let mut empty = series(format!("property.{FLOAT_PROPERTY_ID}"), &[(at(9, 30), 1.0)]);
    empty.count_values = 0;
    api.aggregated.insert(THING_ID.to_string(), batch(vec![empty]));
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let thing = thing(THING_ID, "test", vec![property(FLOAT_PROPERTY_ID, "ptest", "FLOAT")]);
    let extraction = coordinator
        .extract_at(&things_map(vec![thing]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    assert_eq!(extraction.rows, 0);
    let (_, records) = read_records(extraction.sink.path());
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_last_value_fallback_only_for_unpopulated_properties() {
    let dir = TempDir::new().unwrap();
    let populated_id = FLOAT_PROPERTY_ID;
    let idle_id = "0b0b0b0b-0000-4000-8000-000000000001";
    let timed_id = "0b0b0b0b-0000-4000-8000-000000000002";

    let thing = thing(
        THING_ID,
        "test",
        vec![
            on_change(property(populated_id, "ptest", "FLOAT"), json!(9.5), at(8, 0)),
            on_change(property(idle_id, "relay", "HOME_SWITCH"), json!(true), at(7, 45)),
            property(timed_id, "humidity", "HOME_HUMIDITY"),
        ],
    );

    let mut api = StubApi::default();
    api.aggregated.insert(
        THING_ID.to_string(),
        batch(vec![series(format!("property.{populated_id}"), &[(at(9, 30), 3.25)])]),
    );
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![thing]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    let (_, records) = read_records(extraction.sink.path());
    assert_eq!(records.len(), 2);

    let last_values: Vec<_> = records.iter().filter(|r| &r[7] == "LAST_VALUE").collect();
    assert_eq!(last_values.len(), 1);
    let fallback = last_values[0];
    assert_eq!(&fallback[0], "2024-05-10T07:45:00Z");
    assert_eq!(&fallback[3], idle_id);
    assert_eq!(&fallback[6], "true");

    let populated: Vec<_> = records.iter().filter(|r| &r[3] == populated_id).collect();
    assert_eq!(populated.len(), 1);
    assert_eq!(&populated[0][6], "3.25");
    assert_eq!(&populated[0][7], "AVG");
}

#[tokio::test]
async fn test_failing_thing_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let healthy = sample_thing();
    let broken = thing(
        "ffffffff-0000-4000-8000-000000000000",
        "broken",
        vec![property("ffffffff-0000-4000-8000-000000000001", "temp", "FLOAT")],
    );

    let mut api = aggregated_api(&healthy);
    api.failing.insert(broken.id.as_str().to_string());
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![healthy, broken]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    assert_eq!(extraction.rows, 5);
    assert_eq!(extraction.things_processed, 2);
    assert_eq!(extraction.state, ExtractionState::FinalizedWithErrors);
    assert_eq!(extraction.failures.len(), 1);
    assert_eq!(extraction.failures[0].thing_name, "broken");
    assert_eq!(extraction.failures[0].stage, "aggregated");

    match extraction.error() {
        Some(ExporterError::Extraction { failed, total }) => {
            assert_eq!((failed, total), (1, 2));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_things_without_properties_are_skipped() {
    let dir = TempDir::new().unwrap();
    let empty = thing("eeeeeeee-0000-4000-8000-000000000000", "empty", vec![]);
    let (api, coordinator) = coordinator(aggregated_api(&sample_thing()), &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing(), empty]), now())
        .await
        .unwrap();

    assert_eq!(extraction.things_skipped, 1);
    assert_eq!(extraction.things_processed, 1);
    assert!(api.calls().iter().all(|c| !c.contains("eeeeeeee")));
}

#[tokio::test]
async fn test_rate_limited_calls_are_retried() {
    let dir = TempDir::new().unwrap();
    let api = aggregated_api(&sample_thing());
    api.rate_limited_calls.store(4, Ordering::SeqCst);
    let (api, coordinator) = coordinator(api, &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing()]), now())
        .await
        .unwrap();

    assert!(extraction.failures.is_empty());
    assert_eq!(extraction.rows, 5);
    // 4 rate-limited attempts, the successful one, then the sampled query
    assert_eq!(api.calls().len(), 6);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let dir = TempDir::new().unwrap();
    let things: Vec<Thing> = (0..6)
        .map(|i| {
            thing(
                &format!("00000000-0000-4000-8000-00000000000{i}"),
                &format!("thing-{i}"),
                vec![property(&format!("10000000-0000-4000-8000-00000000000{i}"), "t", "FLOAT")],
            )
        })
        .collect();

    let api = StubApi {
        latency: Some(Duration::from_millis(25)),
        ..StubApi::default()
    };
    let api = Arc::new(api);
    let fetcher = SeriesFetcher::new(api.clone(), fast_retry());
    let settings = ExtractionSettings {
        max_concurrency: 2,
        output_dir: dir.path().to_path_buf(),
        ..ExtractionSettings::default()
    };
    let coordinator = ExtractionCoordinator::new(fetcher, settings);

    let extraction = coordinator.extract_at(&things_map(things), now()).await.unwrap();

    assert_eq!(extraction.things_processed, 6);
    assert!(api.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(api.calls().len(), 6);
}

#[tokio::test]
async fn test_duplicate_samples_are_written_once() {
    let dir = TempDir::new().unwrap();
    let mut api = StubApi::default();
    api.aggregated.insert(
        THING_ID.to_string(),
        batch(vec![series(
            format!("property.{FLOAT_PROPERTY_ID}"),
            &[(at(9, 30), 1.0), (at(9, 30), 7.0), (at(9, 35), 2.0)],
        )]),
    );
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let thing = thing(THING_ID, "test", vec![property(FLOAT_PROPERTY_ID, "ptest", "FLOAT")]);
    let extraction = coordinator
        .extract_at(&things_map(vec![thing]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    assert_eq!(extraction.rows, 2);
    let (_, records) = read_records(extraction.sink.path());
    let samples: Vec<(&str, &str)> = records.iter().map(|r| (&r[0], &r[6])).collect();
    assert_eq!(
        samples,
        vec![("2024-05-10T09:30:00Z", "1"), ("2024-05-10T09:35:00Z", "2")]
    );
}

#[tokio::test]
async fn test_thing_scoped_series_resolves_explicit_property_id() {
    let dir = TempDir::new().unwrap();
    let mut echoed = series(format!("thing.{THING_ID}"), &[(at(9, 30), 4.5)]);
    echoed.property_id = Some(PropertyId::new(FLOAT_PROPERTY_ID).unwrap());
    let mut unresolved = series(format!("thing.{THING_ID}"), &[(at(9, 30), 8.0)]);
    unresolved.property_id = None;

    let mut api = StubApi::default();
    api.aggregated
        .insert(THING_ID.to_string(), batch(vec![echoed, unresolved]));
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let thing = thing(THING_ID, "test", vec![property(FLOAT_PROPERTY_ID, "ptest", "FLOAT")]);
    let extraction = coordinator
        .extract_at(&things_map(vec![thing]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    let (_, records) = read_records(extraction.sink.path());
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][3], FLOAT_PROPERTY_ID);
    assert_eq!(&records[0][4], "ptest");
    assert_eq!(&records[0][6], "4.5");
    assert_eq!(&records[0][7], "AVG");
}

#[tokio::test]
async fn test_null_sampled_values_are_skipped() {
    let dir = TempDir::new().unwrap();
    let mut api = StubApi::default();
    api.sampled.insert(
        STRING_PROPERTY_ID.to_string(),
        batch(vec![series(
            format!("property.{STRING_PROPERTY_ID}"),
            &[
                (at(9, 25), json!(null)),
                (at(9, 30), json!({"lat": 1.5, "lon": 2})),
                (at(9, 35), json!(3.10)),
            ],
        )]),
    );
    let (_api, coordinator) = coordinator(api, &dir, 300);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing()]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    assert_eq!(extraction.rows, 2);
    let content = std::fs::read_to_string(extraction.sink.path()).unwrap();
    assert!(content.contains(r#","{""lat"":1.5,""lon"":2}","#), "{content}");
    assert!(content.contains(",CHARSTRING,3.1,"), "{content}");
    assert!(!content.contains("09:25:00Z"), "{content}");
}

#[tokio::test]
async fn test_null_raw_values_are_skipped() {
    let dir = TempDir::new().unwrap();
    let mut api = StubApi::default();
    api.raw.insert(
        THING_ID.to_string(),
        batch(vec![series(
            format!("property.{FLOAT_PROPERTY_ID}"),
            &[(at(9, 30), json!(null)), (at(9, 31), json!(2.0))],
        )]),
    );
    let (_api, coordinator) = coordinator(api, &dir, -1);

    let extraction = coordinator
        .extract_at(&things_map(vec![sample_thing()]), now())
        .await
        .unwrap();
    extraction.sink.close().unwrap();

    let (_, records) = read_records(extraction.sink.path());
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "2024-05-10T09:31:00Z");
    assert_eq!(&records[0][6], "2");
}
