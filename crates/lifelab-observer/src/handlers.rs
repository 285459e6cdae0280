//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service banner |
//! | `POST` | `/run_experiment` | Validate, create and start an experiment |
//! | `GET` | `/status/{id}` | Status and timing of one experiment |
//! | `GET` | `/api/experiments` | Newest experiments first |
//! | `GET` | `/api/experiments/{id}/traces` | Ordered generation traces |

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use lifelab_core::params::ExperimentParams;
use lifelab_core::rules::CONWAY_NOTATION;
use lifelab_core::seed::{InitialConfig, SeedDefaults};
use lifelab_types::{Experiment, ExperimentId, ExperimentStatus, GenerationTrace};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ObserverError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::{AppState, DEFAULT_LIST_LIMIT};

/// Default experiment name.
pub const DEFAULT_NAME: &str = "Game of Life (B3/S23)";

/// Default board side.
pub const DEFAULT_BOARD_SIZE: i64 = 20;

/// Default number of steps.
pub const DEFAULT_NUM_STEPS: i64 = 50;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /run_experiment`. Every field is optional; unknown
/// fields are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunExperimentRequest {
    /// Experiment name.
    pub name: Option<String>,
    /// Board side length.
    pub board_size: Option<i64>,
    /// Generations after generation 0.
    pub num_steps: Option<i64>,
    /// `B<digits>/S<digits>` rule notation.
    pub rules_notation: Option<String>,
    /// Explicit encoded starting board. Takes precedence over density and seed.
    pub initial_config: Option<String>,
    /// Density of a random starting board.
    pub initial_density: Option<f64>,
    /// Seed of a random starting board.
    pub seed: Option<u64>,
}

impl RunExperimentRequest {
    /// Fill defaults and build runner parameters.
    pub fn into_params(self, defaults: &SeedDefaults) -> ExperimentParams {
        let initial_config = match (self.initial_config, self.initial_density, self.seed) {
            (Some(cells), _, _) => Some(InitialConfig::pattern(cells)),
            (None, None, None) => None,
            (None, density, seed) => Some(InitialConfig::random(
                density.unwrap_or(defaults.density),
                seed.unwrap_or(defaults.seed),
            )),
        };
        ExperimentParams {
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_owned()),
            board_size: self.board_size.unwrap_or(DEFAULT_BOARD_SIZE),
            num_steps: self.num_steps.unwrap_or(DEFAULT_NUM_STEPS),
            rules_notation: self
                .rules_notation
                .unwrap_or_else(|| CONWAY_NOTATION.to_owned()),
            initial_config,
        }
    }
}

/// Response of `POST /run_experiment`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunExperimentResponse {
    /// Human-readable acknowledgement.
    pub message: String,
    /// Id to poll with `GET /status/{id}`.
    pub experiment_id: ExperimentId,
}

/// Response of `GET /status/{id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The experiment.
    pub experiment_id: ExperimentId,
    /// Lifecycle status.
    pub status: ExperimentStatus,
    /// Requested step count.
    pub total_steps: u32,
    /// Exact run duration in seconds, once finished.
    pub duration_seconds: Option<Decimal>,
    /// Start timestamp.
    pub start_time: DateTime<Utc>,
    /// Terminal timestamp, once finished.
    pub end_time: Option<DateTime<Utc>>,
}

impl From<Experiment> for StatusResponse {
    fn from(experiment: Experiment) -> Self {
        Self {
            experiment_id: experiment.experiment_id,
            status: experiment.status,
            total_steps: experiment.num_steps,
            duration_seconds: experiment.duration_seconds,
            start_time: experiment.start_time,
            end_time: experiment.end_time,
        }
    }
}

/// Query parameters for `GET /api/experiments`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum experiments to return (default 50).
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` -- service banner.
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "Service Running",
        "project": "Lifelab",
    }))
}

/// `POST /run_experiment` -- create an experiment and run it in the background.
///
/// Validation and creation happen before the response, so a `200` means
/// the experiment exists and is `RUNNING`.
pub async fn run_experiment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RunExperimentRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let params = request.into_params(&state.runner.settings().seed_defaults);
    let spawned = state.runner.spawn(&params).await?;

    info!(experiment_id = %spawned.experiment_id, "Experiment started in background");

    Ok((
        StatusCode::OK,
        Json(RunExperimentResponse {
            message: String::from("Experiment started in background"),
            experiment_id: spawned.experiment_id,
        }),
    ))
}

/// `GET /status/{id}` -- status, step count and timing of one experiment.
pub async fn experiment_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<StatusResponse>, ObserverError> {
    let experiment = state.runner.status(ExperimentId(id)).await?;
    Ok(Json(StatusResponse::from(experiment)))
}

/// `GET /api/experiments` -- newest experiments first.
pub async fn list_experiments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Experiment>>, ObserverError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.runner.list_recent(limit).await?))
}

/// `GET /api/experiments/{id}/traces` -- recorded generations in order.
pub async fn list_traces(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<GenerationTrace>>, ObserverError> {
    Ok(Json(state.runner.traces(ExperimentId(id)).await?))
}
