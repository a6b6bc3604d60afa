use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::service::{DistanceRequest, GeofenceCheckRequest, PresenceService};
use crate::error::AppError;
use crate::workflows::attendance::EntryType;
use crate::workflows::clock::{AttendanceSink, Clock};
use crate::workflows::face::CapturedFrame;
use crate::workflows::geofence::{EntityKind, EntityRef, GeofenceViolation, LocationDirectory};

/// Raw frame payload; dimensions are checked before analysis.
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct ActionCheckRequest {
    pub entry_type: EntryType,
}

/// Router exposing the geofence, face and attendance-status checks.
pub fn presence_router<D, S, C>(service: Arc<PresenceService<D, S, C>>) -> Router
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/api/v1/geofence/check", post(geofence_handler::<D, S, C>))
        .route("/api/v1/face/validate", post(face_handler::<D, S, C>))
        .route(
            "/api/v1/attendance/:kind/:entity_id",
            get(attendance_handler::<D, S, C>),
        )
        .route(
            "/api/v1/attendance/:kind/:entity_id/actions",
            post(action_check_handler::<D, S, C>),
        )
        .route("/api/v1/geo/distance", post(distance_handler::<D, S, C>))
        .with_state(service)
}

pub(crate) async fn geofence_handler<D, S, C>(
    State(service): State<Arc<PresenceService<D, S, C>>>,
    axum::Json(request): axum::Json<GeofenceCheckRequest>,
) -> Response
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    match service.check_geofence(&request).await {
        Ok(matched) => {
            let payload = json!({
                "success": true,
                "location_id": matched.location_id,
                "location_name": matched.location_name,
                "distance_meters": matched.distance_meters,
                "radius_meters": matched.radius_meters,
                "tier": matched.tier,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(violation) => {
            warn!(
                entity = %request.entity(),
                reason = violation.code(),
                "geofence check failed"
            );
            let status = if violation.is_transient() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let mut payload = json!({
                "success": false,
                "reason": violation.code(),
                "error": violation.to_string(),
            });
            if let GeofenceViolation::OutOfRadius {
                location_name,
                distance_meters,
                required_radius_meters,
            } = &violation
            {
                payload["location_name"] = json!(location_name);
                payload["distance_meters"] = json!(distance_meters);
                payload["required_radius_meters"] = json!(required_radius_meters);
            }
            (status, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn face_handler<D, S, C>(
    State(service): State<Arc<PresenceService<D, S, C>>>,
    axum::Json(request): axum::Json<FrameRequest>,
) -> Response
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    let frame = match CapturedFrame::new(request.width, request.height, request.rgba) {
        Ok(frame) => frame,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let validation = service.validate_face(&frame);
    let analysis = &validation.analysis;
    let reason = validation.result.error_reason;
    let payload = json!({
        "valid": validation.result.valid,
        "error_reason": reason.map(|reason| reason.code()),
        "message": reason.map(|reason| reason.message()),
        "analysis": {
            "presence_count": analysis.presence_count(),
            "brightness": analysis.brightness,
            "face_centeredness": analysis.face_centeredness,
            "face_size": analysis.face_size,
            "overall_clarity": analysis.overall_clarity,
            "eyes_clarity": analysis.eyes_clarity,
            "nose_clarity": analysis.nose_clarity,
            "mouth_clarity": analysis.mouth_clarity,
            "is_masked": analysis.is_masked,
            "has_hat": analysis.has_hat,
        },
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn unknown_kind(kind: &str) -> Response {
    let payload = json!({ "error": format!("unknown entity kind '{kind}'") });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

pub(crate) async fn attendance_handler<D, S, C>(
    State(service): State<Arc<PresenceService<D, S, C>>>,
    Path((kind, entity_id)): Path<(String, String)>,
) -> Result<Response, AppError>
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    let Some(kind) = EntityKind::parse(&kind) else {
        return Ok(unknown_kind(&kind));
    };

    let view = service.shift_status(EntityRef { kind, id: entity_id }).await?;
    Ok((StatusCode::OK, axum::Json(view)).into_response())
}

pub(crate) async fn action_check_handler<D, S, C>(
    State(service): State<Arc<PresenceService<D, S, C>>>,
    Path((kind, entity_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ActionCheckRequest>,
) -> Result<Response, AppError>
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    let Some(kind) = EntityKind::parse(&kind) else {
        return Ok(unknown_kind(&kind));
    };

    let entity = EntityRef { kind, id: entity_id };
    let next_state = service.check_action(&entity, request.entry_type).await?;
    let payload = json!({
        "allowed": true,
        "entry_type": request.entry_type,
        "next_state": next_state,
    });
    Ok((StatusCode::OK, axum::Json(payload)).into_response())
}

pub(crate) async fn distance_handler<D, S, C>(
    State(service): State<Arc<PresenceService<D, S, C>>>,
    axum::Json(request): axum::Json<DistanceRequest>,
) -> Response
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    let meters = service.distance(&request);
    (StatusCode::OK, axum::Json(json!({ "meters": meters }))).into_response()
}
