use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{presence_router, PresenceService};
use crate::workflows::attendance::{EntryType, PhotoRef, TimeEntry};
use crate::workflows::clock::{
    AttendanceSink, AttendanceWrite, FixedClock, InMemoryAttendanceSink, SinkError,
};
use crate::workflows::face::{sample, FaceValidationPipeline};
use crate::workflows::geofence::{
    EntityRef, GeoPoint, InMemoryLocationDirectory, LocationId, WorkLocation,
};

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 3)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

fn router_with<S: AttendanceSink + 'static>(sink: S) -> Router {
    let mut directory = InMemoryLocationDirectory::new(vec![WorkLocation {
        id: LocationId("depot".to_string()),
        name: "Depot".to_string(),
        center: GeoPoint::new(14.5995, 120.9842),
        radius_meters: 50.0,
        active: true,
    }]);
    directory.insert_location(WorkLocation {
        id: LocationId("closed".to_string()),
        name: "Closed Yard".to_string(),
        center: GeoPoint::new(14.61, 120.99),
        radius_meters: 100.0,
        active: false,
    });
    directory.set_legacy(EntityRef::employee("e-legacy"), LocationId("closed".to_string()));

    let service = PresenceService::new(
        Arc::new(directory),
        Arc::new(sink),
        Arc::new(FixedClock::new(noon())),
        FaceValidationPipeline::default(),
    );
    presence_router(Arc::new(service))
}

fn router() -> Router {
    router_with(InMemoryAttendanceSink::new())
}

async fn post_json(router: Router, uri: &str, body: Value) -> Response {
    router
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json body")))
                .expect("request builds"),
        )
        .await
        .expect("route executes")
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[tokio::test]
async fn geofence_check_accepts_nearby_worker() {
    let response = post_json(
        router(),
        "/api/v1/geofence/check",
        json!({
            "entity_kind": "worker",
            "entity_id": "w-1",
            "latitude": 14.5995,
            "longitude": 120.9843,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["location_id"], json!("depot"));
    assert_eq!(payload["tier"], json!("any_active"));
}

#[tokio::test]
async fn geofence_check_reports_distance_when_too_far() {
    let response = post_json(
        router(),
        "/api/v1/geofence/check",
        json!({
            "entity_kind": "worker",
            "entity_id": "w-1",
            "latitude": 14.6013,
            "longitude": 120.9842,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["reason"], json!("out_of_radius"));
    assert_eq!(payload["required_radius_meters"], json!(50.0));
    let distance = payload["distance_meters"].as_f64().expect("distance");
    assert!((distance - 200.2).abs() < 1.0);
}

#[tokio::test]
async fn inactive_legacy_location_is_not_replaced_by_active_ones() {
    let response = post_json(
        router(),
        "/api/v1/geofence/check",
        json!({
            "entity_kind": "employee",
            "entity_id": "e-legacy",
            "latitude": 14.5995,
            "longitude": 120.9842,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json(response).await;
    assert_eq!(payload["reason"], json!("location_not_found_or_inactive"));
}

#[tokio::test]
async fn face_validation_returns_verdict_and_summary() {
    let frame = sample::face_frame(200).expect("frame");
    let response = post_json(
        router(),
        "/api/v1/face/validate",
        json!({
            "width": frame.width(),
            "height": frame.height(),
            "rgba": frame.as_rgba(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["valid"], json!(true));
    assert_eq!(payload["error_reason"], Value::Null);
    assert_eq!(payload["analysis"]["presence_count"], json!(6));
}

#[tokio::test]
async fn face_validation_names_the_failed_gate() {
    let frame = sample::wall_frame(200).expect("frame");
    let response = post_json(
        router(),
        "/api/v1/face/validate",
        json!({
            "width": frame.width(),
            "height": frame.height(),
            "rgba": frame.as_rgba(),
        }),
    )
    .await;

    let payload = read_json(response).await;
    assert_eq!(payload["valid"], json!(false));
    assert_eq!(payload["error_reason"], json!("not_centered"));
    assert!(payload["message"].is_string());
}

#[tokio::test]
async fn malformed_frame_is_a_bad_request() {
    let response = post_json(
        router(),
        "/api/v1/face/validate",
        json!({ "width": 4, "height": 4, "rgba": [0, 0, 0, 255] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendance_status_lists_legal_actions() {
    let sink = InMemoryAttendanceSink::new();
    let worker = EntityRef::worker("w-8");
    sink.seed(TimeEntry {
        entity: worker.clone(),
        entry_type: EntryType::ClockIn,
        timestamp: noon() - chrono::Duration::hours(4),
        photo: PhotoRef("p".to_string()),
    })
    .expect("seeded");

    let response = router_with(sink)
        .oneshot(
            Request::get("/api/v1/attendance/worker/w-8")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["state"], json!("clocked_in"));
    assert_eq!(payload["legal_actions"], json!(["break_start", "clock_out"]));
    assert_eq!(payload["last_entry"]["entry_type"], json!("clock_in"));
}

#[tokio::test]
async fn unknown_entity_kind_is_not_found() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/attendance/contractor/c-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn distance_endpoint_uses_haversine() {
    let response = post_json(
        router(),
        "/api/v1/geo/distance",
        json!({
            "from": { "latitude": 0.0, "longitude": 0.0 },
            "to": { "latitude": 1.0, "longitude": 0.0 },
        }),
    )
    .await;

    let payload = read_json(response).await;
    let meters = payload["meters"].as_f64().expect("meters");
    assert!((meters - 111_194.9).abs() < 1.0);
}

struct OfflineSink;

impl AttendanceSink for OfflineSink {
    async fn entries_for_day(
        &self,
        _entity: &EntityRef,
        _day: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SinkError> {
        Err(SinkError::WriteFailed("database offline".to_string()))
    }

    async fn commit(&self, _write: AttendanceWrite) -> Result<TimeEntry, SinkError> {
        Err(SinkError::WriteFailed("database offline".to_string()))
    }
}

#[tokio::test]
async fn attendance_status_surfaces_storage_failure() {
    let response = router_with(OfflineSink)
        .oneshot(
            Request::get("/api/v1/attendance/employee/e-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], json!("write_failed"));
}

#[tokio::test]
async fn action_check_allows_legal_transition() {
    let response = post_json(
        router(),
        "/api/v1/attendance/worker/w-9/actions",
        json!({ "entry_type": "clock_in" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["allowed"], json!(true));
    assert_eq!(payload["next_state"], json!("clocked_in"));
}

#[tokio::test]
async fn action_check_rejects_illegal_transition_with_conflict() {
    let response = post_json(
        router(),
        "/api/v1/attendance/employee/e-2/actions",
        json!({ "entry_type": "break_start" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json(response).await;
    assert_eq!(payload["code"], json!("invalid_transition"));
}
