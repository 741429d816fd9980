pub mod cli;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ScenarioInput, ScenarioResult, SimulationError, Strategy, financed_percent,
    principal_for_percent, run_simulation,
};
use crate::store::{ScenarioStore, StoreError};

pub const DEFAULT_SCENARIO_NAME: &str = "Untitled scenario";

pub fn default_input() -> ScenarioInput {
    ScenarioInput {
        house_value: 215_500.0,
        principal: 140_000.0,
        mortgage_rate_annual: 2.2,
        term_years: 20,
        investment_rate_annual: 5.0,
        strategy: Strategy::PayDownExtra,
        extra_contribution: 6_000.0,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    name: Option<String>,
    house_value: Option<f64>,
    principal: Option<f64>,
    financed_percent: Option<f64>,
    #[serde(alias = "mortgageRateAnnual")]
    mortgage_rate: Option<f64>,
    #[serde(alias = "term")]
    term_years: Option<u32>,
    #[serde(alias = "investmentRateAnnual")]
    investment_rate: Option<f64>,
    #[serde(alias = "mode")]
    strategy: Option<Strategy>,
    #[serde(alias = "extra")]
    extra_contribution: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    financed_percent: f64,
    input: ScenarioInput,
    result: ScenarioResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("no saved scenario with id {0}")]
    NotFound(u64),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("scenario store lock poisoned")]
    LockPoisoned,
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Simulation(e) => e.into(),
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        error_response(status, &self.to_string())
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<ScenarioStore>>,
}

impl AppState {
    pub fn new(store: ScenarioStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, ScenarioStore>, ApiError> {
        self.store.lock().map_err(|_| ApiError::LockPoisoned)
    }

    /// Mutations rewrite the document on disk, so they run on the blocking pool.
    async fn update_store<T, F>(&self, update: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ScenarioStore) -> Result<T, ApiError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut guard = store.lock().map_err(|_| ApiError::LockPoisoned)?;
            update(&mut guard)
        })
        .await
        .map_err(|e| ApiError::Storage(format!("store task failed: {e}")))?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .route("/api/financed-percent", post(financed_percent_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, store: ScenarioStore) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let store_path = store.path().display().to_string();
    let app = router(AppState::new(store));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = %store_path, "mortgage simulator HTTP API listening");
    println!("Local access: http://127.0.0.1:{port}/api/scenarios");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    Query(payload): Query<SimulatePayload>,
) -> Result<Response, ApiError> {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(
    Json(payload): Json<SimulatePayload>,
) -> Result<Response, ApiError> {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Result<Response, ApiError> {
    let input = input_from_payload(&payload)?;
    let result = run_simulation(&input)?;
    Ok(json_response(
        StatusCode::OK,
        SimulateResponse {
            financed_percent: financed_percent(input.house_value, input.principal),
            input,
            result,
        },
    ))
}

async fn list_scenarios_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = state.store()?;
    Ok(json_response(StatusCode::OK, store.ranked()))
}

async fn create_scenario_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Result<Response, ApiError> {
    let input = input_from_payload(&payload)?;
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_SCENARIO_NAME)
        .to_string();

    let scenario = state
        .update_store(move |store| Ok(store.add(&name, input)?.clone()))
        .await?;
    Ok(json_response(StatusCode::CREATED, scenario))
}

async fn get_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let store = state.store()?;
    let scenario = store.get(id).ok_or(ApiError::NotFound(id))?;
    Ok(json_response(StatusCode::OK, scenario))
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    state
        .update_store(move |store| Ok(store.remove(id)?))
        .await?;
    Ok(with_cache_control(StatusCode::NO_CONTENT))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancedShareRequest {
    house_value: f64,
    principal: Option<f64>,
    financed_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinancedShareResponse {
    house_value: f64,
    principal: f64,
    financed_percent: f64,
}

async fn financed_percent_handler(
    Json(request): Json<FinancedShareRequest>,
) -> Result<Response, ApiError> {
    let (principal, percent) = match (request.principal, request.financed_percent) {
        (Some(principal), None) => (
            principal,
            financed_percent(request.house_value, principal),
        ),
        (None, Some(percent)) => (
            principal_for_percent(request.house_value, percent),
            percent,
        ),
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of principal or financedPercent".to_string(),
            ));
        }
    };
    Ok(json_response(
        StatusCode::OK,
        FinancedShareResponse {
            house_value: request.house_value,
            principal,
            financed_percent: percent,
        },
    ))
}

fn input_from_payload(payload: &SimulatePayload) -> Result<ScenarioInput, ApiError> {
    let mut input = default_input();

    if let Some(v) = payload.house_value {
        input.house_value = v;
    }
    match (payload.principal, payload.financed_percent) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "principal and financedPercent are mutually exclusive".to_string(),
            ));
        }
        (Some(v), None) => input.principal = v,
        (None, Some(pct)) => input.principal = principal_for_percent(input.house_value, pct),
        (None, None) => {}
    }
    if let Some(v) = payload.mortgage_rate {
        input.mortgage_rate_annual = v;
    }
    if let Some(v) = payload.term_years {
        input.term_years = v;
    }
    if let Some(v) = payload.investment_rate {
        input.investment_rate_annual = v;
    }
    if let Some(v) = payload.strategy {
        input.strategy = v;
    }
    if let Some(v) = payload.extra_contribution {
        input.extra_contribution = v;
    }

    Ok(input)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
