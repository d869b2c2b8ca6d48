// HTTP request handlers
use crate::domain::system::NewDataMessage;
use crate::domain::telemetry::DateRange;
use crate::domain::token::TokenRef;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_DAYS_BACK: i64 = 7;
const DEFAULT_DAYS_AHEAD: i64 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    /// Comma separated node ids; all nodes when absent.
    pub nodes: Option<String>,
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
}

impl ChartQuery {
    fn node_ids(&self) -> Vec<String> {
        self.nodes
            .as_deref()
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Missing bounds default to the last week through tomorrow.
    fn range(&self) -> DateRange {
        let now = Utc::now();
        DateRange::new(
            Some(
                self.from_date
                    .unwrap_or_else(|| (now - Duration::days(DEFAULT_DAYS_BACK)).timestamp_millis()),
            ),
            Some(
                self.to_date
                    .unwrap_or_else(|| (now + Duration::days(DEFAULT_DAYS_AHEAD)).timestamp_millis()),
            ),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub single: bool,
    pub tokens: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub updated: usize,
}

fn internal_error(context: &str, e: anyhow::Error) -> Response {
    tracing::error!("{}: {:#}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Live readings of every diagram node of a building
pub async fn get_readings(
    Path(building_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.live_service.readings(&building_id).await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => internal_error(&format!("Error resolving readings for {}", building_id), e),
    }
}

/// Chart datasets for selected diagram nodes
pub async fn get_chart(
    Path(building_id): Path<String>,
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let node_ids = query.node_ids();
    let range = query.range();

    match state.chart_service.get_chart(&building_id, &node_ids, range).await {
        Ok(datasets) => Json(datasets).into_response(),
        Err(e) => internal_error(&format!("Error building chart for {}", building_id), e),
    }
}

/// Form-level validation of a node expression
pub async fn validate_expression(
    Path(building_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Response {
    match state
        .live_service
        .inspect_expression(&building_id, &request.expression)
        .await
    {
        Ok(report) => Json(ValidateResponse {
            valid: report.result.is_ok(),
            single: report.single,
            tokens: report.tokens.iter().map(TokenRef::to_string).collect(),
            error: report.result.err().map(|e| e.to_string()),
        })
        .into_response(),
        Err(e) => internal_error(&format!("Error validating expression for {}", building_id), e),
    }
}

/// Push endpoint for fresh input values
pub async fn push_update(
    Path(building_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(message): Json<NewDataMessage>,
) -> Response {
    if message.building_id != building_id {
        tracing::warn!(
            "Update for building {} posted to {}",
            message.building_id,
            building_id
        );
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.live_service.apply_update(&message).await {
        Ok(updated) => Json(UpdateResponse { updated }).into_response(),
        Err(e) => internal_error(&format!("Error applying update for {}", building_id), e),
    }
}
