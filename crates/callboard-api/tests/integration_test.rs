// Integration tests for the Callboard API
// Requires a running server with a database: cargo test --test integration_test -- --ignored

use serde_json::{json, Value};
use uuid::Uuid;

const API_BASE_URL: &str = "http://localhost:9000";

fn planner_headers(client: reqwest::RequestBuilder, id: Uuid) -> reqwest::RequestBuilder {
    client
        .header("x-actor-id", id.to_string())
        .header("x-actor-role", "planner")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_event_lifecycle() {
    let client = reqwest::Client::new();
    let planner = Uuid::now_v7();

    // Step 1: Register a venue with an area
    let response = planner_headers(client.post(format!("{API_BASE_URL}/v1/venues")), planner)
        .json(&json!({ "name": "The Depot" }))
        .send()
        .await
        .expect("Failed to create venue");
    assert_eq!(response.status(), 201);
    let venue: Value = response.json().await.expect("Failed to parse venue");
    let venue_id = venue["id"].as_str().unwrap().to_string();

    let response = planner_headers(
        client.post(format!("{API_BASE_URL}/v1/venues/{venue_id}/areas")),
        planner,
    )
    .json(&json!({ "name": "Main Hall", "capacity": 250 }))
    .send()
    .await
    .expect("Failed to create area");
    assert_eq!(response.status(), 201);

    // Step 2: Create a draft event
    let response = planner_headers(client.post(format!("{API_BASE_URL}/v1/events")), planner)
        .json(&json!({
            "title": "Jazz Night",
            "venue_id": venue_id,
            "venue_space": "Main Hall",
            "starts_at": "2030-05-10T18:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to create event");
    assert_eq!(response.status(), 201);
    let event: Value = response.json().await.expect("Failed to parse event");
    let event_id = event["id"].as_str().unwrap().to_string();
    assert_eq!(event["status"], "draft");

    // Step 3: Submit for review; version history should read 1, 2
    let response = planner_headers(
        client.post(format!("{API_BASE_URL}/v1/events/{event_id}/submit")),
        planner,
    )
    .send()
    .await
    .expect("Failed to submit event");
    assert_eq!(response.status(), 200);

    let response = planner_headers(
        client.get(format!("{API_BASE_URL}/v1/events/{event_id}/versions")),
        planner,
    )
    .send()
    .await
    .expect("Failed to list versions");
    let versions: Value = response.json().await.expect("Failed to parse versions");
    assert_eq!(versions["total"], 2);
    assert_eq!(versions["items"][1]["version"], 2);

    // Step 4: Re-submitting a submitted event is an illegal transition
    let response = planner_headers(
        client.post(format!("{API_BASE_URL}/v1/events/{event_id}/submit")),
        planner,
    )
    .send()
    .await
    .expect("Failed to call submit");
    assert_eq!(response.status(), 409);

    // Step 5: Approve and publish
    let response = planner_headers(
        client.post(format!("{API_BASE_URL}/v1/events/{event_id}/review")),
        planner,
    )
    .json(&json!({ "decision": "approved" }))
    .send()
    .await
    .expect("Failed to review event");
    assert_eq!(response.status(), 200);

    let response = planner_headers(
        client.post(format!("{API_BASE_URL}/v1/events/{event_id}/publish")),
        planner,
    )
    .send()
    .await
    .expect("Failed to publish event");
    assert_eq!(response.status(), 200);

    // Step 6: Analytics sees the event; calendar feed renders
    let response = planner_headers(
        client.get(format!("{API_BASE_URL}/v1/planning/analytics")),
        planner,
    )
    .send()
    .await
    .expect("Failed to fetch analytics");
    assert_eq!(response.status(), 200);
    let analytics: Value = response.json().await.expect("Failed to parse analytics");
    assert!(analytics["totalEvents"].as_u64().unwrap() >= 1);

    let response = client
        .get(format!("{API_BASE_URL}/v1/planning/calendar.ics"))
        .send()
        .await
        .expect("Failed to fetch calendar");
    assert_eq!(response.status(), 200);
    let ics = response.text().await.expect("Failed to read calendar");
    assert!(ics.starts_with("BEGIN:VCALENDAR"));

    // Step 7: Job endpoints demand the cron bearer token
    let response = client
        .get(format!("{API_BASE_URL}/v1/jobs/draft-reminders"))
        .send()
        .await
        .expect("Failed to call job endpoint");
    assert_eq!(response.status(), 401);
}
