//! End-to-end tests for the map page, the chart payload and the status report

mod common;

use common::*;
use epimap_server::snapshot_store::{load_seed_csv, DashboardSnapshot, Metric, SnapshotStore};
use reqwest::StatusCode;
use tempfile::TempDir;

#[tokio::test]
async fn test_index_page_loads_chart_from_map_endpoint() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_index().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let body = response.text().await.unwrap();
    assert!(body.contains("echarts"));
    assert!(body.contains("fetch('/map')"));
    assert!(!body.contains("Last refreshed: never"));
}

#[tokio::test]
async fn test_index_page_before_any_refresh() {
    let server = TestServer::spawn_empty().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.get_index().await.text().await.unwrap();
    assert!(body.contains("Last refreshed: never"));
}

#[tokio::test]
async fn test_map_returns_two_frame_timeline() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_map().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let option: serde_json::Value = response.json().await.unwrap();
    let timeline = &option["baseOption"]["timeline"];
    assert_eq!(timeline["autoPlay"], true);
    assert_eq!(timeline["show"], false);
    assert_eq!(timeline["playInterval"], 3600);

    let frames = option["options"].as_array().unwrap();
    assert_eq!(frames.len(), 2);
    for frame in frames {
        assert_eq!(frame["series"][0]["type"], "map");
        assert_eq!(frame["series"][0]["map"], "world");
    }
}

#[tokio::test]
async fn test_map_frames_carry_stored_rows_and_bounds() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let option: serde_json::Value = client.get_map().await.json().await.unwrap();
    let totals = &option["options"][0];
    let deaths = &option["options"][1];

    let total_data = totals["series"][0]["data"].as_array().unwrap();
    assert_eq!(total_data.len(), SEED_TOTALS.len());
    assert_eq!(total_data[0]["name"], SEED_TOTALS[0].0);
    assert_eq!(total_data[0]["value"][0], SEED_TOTALS[0].1);
    assert_eq!(total_data[0]["value"][1], SEED_TOTALS[0].0);
    assert_eq!(totals["visualMap"]["min"], 2_160_000);
    assert_eq!(totals["visualMap"]["max"], 42_000_000);

    // Countries missing from one metric are flagged, not dropped.
    assert_eq!(
        deaths["series"][0]["data"].as_array().unwrap().len(),
        SEED_DEATHS.len()
    );
    assert_eq!(deaths["visualMap"]["min"], 444_000);
    assert_eq!(deaths["visualMap"]["max"], 680_000);
}

#[tokio::test]
async fn test_map_with_empty_storage_is_server_error() {
    let server = TestServer::spawn_empty().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_map().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), "Internal Server Error");
}

#[tokio::test]
async fn test_map_with_one_empty_metric_is_server_error() {
    let server = TestServer::spawn_empty().await;
    server
        .snapshot_store
        .replace_all(Metric::Total, &[epimap_server::snapshot_store::CountryValue::new("A", 1)])
        .unwrap();
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_map().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_map_reflects_replaced_snapshot() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let temp_dir = TempDir::new().unwrap();
    let (totals_csv, deaths_csv) = write_seed_csvs(temp_dir.path()).unwrap();
    let mut snapshot = DashboardSnapshot {
        totals: load_seed_csv(&totals_csv, Metric::Total).unwrap(),
        deaths: load_seed_csv(&deaths_csv, Metric::Death).unwrap(),
    };
    snapshot.totals.truncate(1);
    snapshot.deaths.truncate(1);
    server
        .snapshot_store
        .replace_snapshot(&snapshot, "seed")
        .unwrap();

    let option: serde_json::Value = client.get_map().await.json().await.unwrap();
    assert_eq!(
        option["options"][0]["series"][0]["data"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
    // A single row gives equal bounds.
    assert_eq!(
        option["options"][0]["visualMap"]["min"],
        option["options"][0]["visualMap"]["max"]
    );
}

#[tokio::test]
async fn test_status_reports_snapshot() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_status().await;
    assert_eq!(response.status(), StatusCode::OK);

    let status: serde_json::Value = response.json().await.unwrap();
    assert_eq!(status["total_rows"], SEED_TOTALS.len());
    assert_eq!(status["death_rows"], SEED_DEATHS.len());
    assert_eq!(status["last_refresh"]["source"], "seed");
    assert_eq!(status["last_refresh"]["total_rows"], SEED_TOTALS.len());
    assert!(status["uptime"].as_str().unwrap().starts_with("0d "));
}

#[tokio::test]
async fn test_status_on_empty_database() {
    let server = TestServer::spawn_empty().await;
    let client = TestClient::new(server.base_url.clone());

    let status: serde_json::Value = client.get_status().await.json().await.unwrap();
    assert_eq!(status["total_rows"], 0);
    assert_eq!(status["death_rows"], 0);
    assert!(status["last_refresh"].is_null());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .client
        .get(format!("{}/nope", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
