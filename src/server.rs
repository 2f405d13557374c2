use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::conversion::{self, PreferenceCell, RawActivity, Recommendation};
use crate::error::SolveError;
use crate::solver::{self, SolverConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    #[serde(default)]
    pub timetable_preferences: HashMap<String, PreferenceCell>,
    pub activities: Vec<RawActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimetableResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_activities: Vec<String>,
}

type HandlerError = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, error: impl ToString) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            invalid_activities: Vec::new(),
        }),
    )
}

fn solve_error(err: SolveError) -> HandlerError {
    let status = match &err {
        SolveError::Malformed(_) => StatusCode::BAD_REQUEST,
        SolveError::InvalidActivities(_) | SolveError::NoFeasibleSchedule => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SolveError::SearchBudgetExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    let invalid_activities = match &err {
        SolveError::InvalidActivities(ids) => ids.clone(),
        _ => Vec::new(),
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            invalid_activities,
        }),
    )
}

async fn solve_handler(
    State(config): State<Arc<SolverConfig>>,
    Json(input): Json<TimetableRequest>,
) -> Result<Json<TimetableResponse>, HandlerError> {
    let grid = conversion::grid_from_preferences(&input.timetable_preferences)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e))?;
    let catalog = conversion::activities_from_raw(&input.activities)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e))?;

    // each request gets its own search state on the blocking pool
    let (catalog, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = solver::solve(&grid, &catalog, &config);
        (catalog, outcome)
    })
    .await
    .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    match outcome {
        Ok(result) => Ok(Json(TimetableResponse {
            recommendations: conversion::recommendations(&result.schedules, &catalog),
        })),
        Err(e) => {
            warn!("Solve failed: {}", e);
            Err(solve_error(e))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(config: SolverConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/timetable/solve", post(solve_handler))
        .with_state(Arc::new(config))
}

pub async fn run_server(config: &Config) -> std::io::Result<()> {
    let app = router(config.solver_config());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
