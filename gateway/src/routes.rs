//! REST surface.
//!
//! Thin CRUD over the same records the pipeline writes; the dashboard is a
//! passive consumer and reconciles missed push events by re-fetching here.

use crate::push::{PushEvent, PushHub};
use crate::store::{Store, StoreError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use coastal_domain::{AlertRecord, ImpactEstimate, MonitoredLocation, Recipient, ThreatRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub push: Arc<PushHub>,
}

fn store_error_status(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Serialize)]
pub struct LocationsResponse {
    pub count: usize,
    pub locations: Vec<MonitoredLocation>,
}

#[derive(Deserialize)]
pub struct ThreatsQuery {
    /// Restrict to unresolved threats.
    pub active: Option<bool>,
}

#[derive(Serialize)]
pub struct ThreatsResponse {
    pub count: usize,
    pub threats: Vec<ThreatRecord>,
}

#[derive(Serialize)]
pub struct ThreatDetailResponse {
    pub threat: ThreatRecord,
    pub impact: Option<ImpactEstimate>,
}

#[derive(Deserialize, Default)]
pub struct ResolveRequest {
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub count: usize,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Serialize)]
pub struct RecipientsResponse {
    pub count: usize,
    pub recipients: Vec<Recipient>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_locations(State(state): State<AppState>) -> Json<LocationsResponse> {
    let locations = state.store.active_locations().await;
    Json(LocationsResponse {
        count: locations.len(),
        locations,
    })
}

pub async fn list_threats(
    State(state): State<AppState>,
    Query(query): Query<ThreatsQuery>,
) -> Json<ThreatsResponse> {
    let threats = state.store.threats(query.active.unwrap_or(false)).await;
    Json(ThreatsResponse {
        count: threats.len(),
        threats,
    })
}

pub async fn list_location_threats(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<ThreatsResponse>, (StatusCode, String)> {
    // 404 for unknown locations rather than an empty list.
    state
        .store
        .location(location_id)
        .await
        .map_err(store_error_status)?;
    let threats = state.store.threats_for_location(location_id).await;
    Ok(Json(ThreatsResponse {
        count: threats.len(),
        threats,
    }))
}

pub async fn get_threat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreatDetailResponse>, (StatusCode, String)> {
    let threat = state.store.threat(id).await.map_err(store_error_status)?;
    let impact = state.store.impact_for_threat(id).await;
    Ok(Json(ThreatDetailResponse { threat, impact }))
}

pub async fn resolve_threat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ThreatRecord>, (StatusCode, String)> {
    let threat = state
        .store
        .resolve_threat(id, request.notes)
        .await
        .map_err(store_error_status)?;

    state.push.broadcast(PushEvent::ThreatUpdated {
        threat: threat.clone(),
    });
    Ok(Json(threat))
}

pub async fn list_alerts_for_recipient(
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
) -> Json<AlertsResponse> {
    let alerts = state.store.alerts_for_recipient(recipient_id).await;
    Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    })
}

pub async fn mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertRecord>, (StatusCode, String)> {
    state
        .store
        .mark_alert_read(id)
        .await
        .map(Json)
        .map_err(store_error_status)
}

pub async fn list_recipients(State(state): State<AppState>) -> Json<RecipientsResponse> {
    let recipients = state.store.recipients().await;
    Json(RecipientsResponse {
        count: recipients.len(),
        recipients,
    })
}

// ============================================================================
// Router
// ============================================================================

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/locations/:id/threats", get(list_location_threats))
        .route("/threats", get(list_threats))
        .route("/threats/:id", get(get_threat))
        .route("/threats/:id/resolve", post(resolve_threat))
        .route("/alerts/recipient/:recipient_id", get(list_alerts_for_recipient))
        .route("/alerts/:id/read", post(mark_alert_read))
        .route("/recipients", get(list_recipients))
}
