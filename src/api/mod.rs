pub mod cli;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    GoalOutcome, GoalParams, GoalSolveResult, InfeasibleReason, InflationParams,
    InflationResult, ProjectionParams, ProjectionResult, adjust_for_inflation, project,
    solve_required_contribution,
};
use cli::{
    HorizonArgs, InflationArgs, OutputFormat, ProjectArgs, SolveArgs, build_goal,
    build_inflation, build_projection,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectResponse {
    years: u32,
    initial_capital: f64,
    #[serde(flatten)]
    result: ProjectionResult,
    yearly_values: Vec<f64>,
}

impl ProjectResponse {
    pub(crate) fn new(params: &ProjectionParams, result: ProjectionResult) -> Self {
        Self {
            years: params.years,
            initial_capital: params.initial_capital,
            yearly_values: result.yearly_values(),
            result,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoalResponse {
    years: u32,
    target_value: f64,
    #[serde(flatten)]
    result: GoalSolveResult,
}

impl GoalResponse {
    pub(crate) fn new(params: &GoalParams, result: GoalSolveResult) -> Self {
        Self {
            years: params.years,
            target_value: params.target_value,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InflationResponse {
    amount: f64,
    annual_rate: f64,
    years: f64,
    adjusted_amount: f64,
}

impl InflationResponse {
    pub(crate) fn new(params: &InflationParams, result: InflationResult) -> Self {
        Self {
            amount: params.amount,
            annual_rate: params.annual_rate,
            years: params.years,
            adjusted_amount: result.adjusted_amount,
        }
    }
}

/// Rejects results that overflowed; JSON has no encoding for them.
fn ensure_finite(field: &str, values: impl IntoIterator<Item = f64>) -> Result<(), String> {
    if values.into_iter().all(f64::is_finite) {
        Ok(())
    } else {
        Err(format!(
            "{field} is not a finite number for these inputs; use a smaller rate or horizon"
        ))
    }
}

pub(crate) fn run_projection(params: &ProjectionParams) -> Result<ProjectResponse, String> {
    let result = project(params);
    ensure_finite(
        "terminal value",
        [result.terminal_value, result.total_contributed],
    )?;
    Ok(ProjectResponse::new(params, result))
}

pub(crate) fn run_goal(params: &GoalParams) -> Result<GoalResponse, String> {
    let result = solve_required_contribution(params);
    let outcome_value = match result.outcome {
        GoalOutcome::Found { terminal_value, .. }
        | GoalOutcome::Infeasible(InfeasibleReason::ExceedsTargetWithoutContributions {
            terminal_value,
        }) => terminal_value,
        GoalOutcome::Infeasible(_) => 0.0,
    };
    ensure_finite(
        "terminal value",
        result
            .iterations
            .iter()
            .map(|step| step.terminal_value)
            .chain([outcome_value, result.search_max]),
    )?;
    Ok(GoalResponse::new(params, result))
}

pub(crate) fn run_inflation(params: &InflationParams) -> Result<InflationResponse, String> {
    let result = adjust_for_inflation(params);
    ensure_finite("adjusted amount", [result.adjusted_amount])?;
    Ok(InflationResponse::new(params, result))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    contribution_growth: Option<f64>,
    return_rate: Option<f64>,
    years: Option<u32>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    initial_capital: Option<f64>,
    target: Option<f64>,
    contribution_growth: Option<f64>,
    return_rate: Option<f64>,
    years: Option<u32>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InflationPayload {
    amount: Option<f64>,
    rate: Option<f64>,
    years: Option<f64>,
    base_year: Option<i32>,
    target_year: Option<i32>,
}

fn default_horizon() -> HorizonArgs {
    HorizonArgs {
        years: None,
        current_age: Some(25),
        retirement_age: Some(65),
    }
}

fn default_project_args() -> ProjectArgs {
    ProjectArgs {
        initial_capital: 50_000.0,
        monthly_contribution: 5_000.0,
        contribution_growth: 10.0,
        return_rate: 9.0,
        horizon: default_horizon(),
        format: OutputFormat::Json,
    }
}

fn default_solve_args() -> SolveArgs {
    SolveArgs {
        initial_capital: 50_000.0,
        target: 6_000_000.0,
        contribution_growth: 0.0,
        return_rate: 9.0,
        horizon: default_horizon(),
        format: OutputFormat::Json,
    }
}

fn default_inflation_args() -> InflationArgs {
    InflationArgs {
        amount: 55_000_000.0,
        rate: 3.0,
        years: Some(31.0),
        base_year: None,
        target_year: None,
        format: OutputFormat::Json,
    }
}

fn apply_horizon(
    horizon: &mut HorizonArgs,
    years: Option<u32>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
) {
    if let Some(v) = years {
        *horizon = HorizonArgs {
            years: Some(v),
            ..HorizonArgs::default()
        };
    }
    if let Some(v) = current_age {
        horizon.current_age = Some(v);
    }
    if let Some(v) = retirement_age {
        horizon.retirement_age = Some(v);
    }
}

fn projection_from_payload(payload: ProjectPayload) -> Result<ProjectionParams, String> {
    let mut args = default_project_args();
    if let Some(v) = payload.initial_capital {
        args.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.contribution_growth {
        args.contribution_growth = v;
    }
    if let Some(v) = payload.return_rate {
        args.return_rate = v;
    }
    apply_horizon(
        &mut args.horizon,
        payload.years,
        payload.current_age,
        payload.retirement_age,
    );
    build_projection(&args)
}

fn goal_from_payload(payload: SolvePayload) -> Result<GoalParams, String> {
    let mut args = default_solve_args();
    if let Some(v) = payload.initial_capital {
        args.initial_capital = v;
    }
    if let Some(v) = payload.target {
        args.target = v;
    }
    if let Some(v) = payload.contribution_growth {
        args.contribution_growth = v;
    }
    if let Some(v) = payload.return_rate {
        args.return_rate = v;
    }
    apply_horizon(
        &mut args.horizon,
        payload.years,
        payload.current_age,
        payload.retirement_age,
    );
    build_goal(&args)
}

fn inflation_from_payload(payload: InflationPayload) -> Result<InflationParams, String> {
    let mut args = default_inflation_args();
    if let Some(v) = payload.amount {
        args.amount = v;
    }
    if let Some(v) = payload.rate {
        args.rate = v;
    }
    if payload.base_year.is_some() || payload.target_year.is_some() {
        args.years = None;
        args.base_year = payload.base_year;
        args.target_year = payload.target_year;
    }
    if let Some(v) = payload.years {
        args.years = Some(v);
    }
    build_inflation(&args)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!("nestegg HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/solve", get(solve_get_handler).post(solve_post_handler))
        .route(
            "/api/inflation",
            get(inflation_get_handler).post(inflation_post_handler),
        )
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn solve_get_handler(Query(payload): Query<SolvePayload>) -> Response {
    solve_handler_impl(payload)
}

async fn solve_post_handler(Json(payload): Json<SolvePayload>) -> Response {
    solve_handler_impl(payload)
}

async fn inflation_get_handler(Query(payload): Query<InflationPayload>) -> Response {
    inflation_handler_impl(payload)
}

async fn inflation_post_handler(Json(payload): Json<InflationPayload>) -> Response {
    inflation_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match projection_from_payload(payload).and_then(|params| run_projection(&params)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => bad_request(&msg),
    }
}

fn solve_handler_impl(payload: SolvePayload) -> Response {
    match goal_from_payload(payload).and_then(|params| run_goal(&params)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => bad_request(&msg),
    }
}

fn inflation_handler_impl(payload: InflationPayload) -> Response {
    match inflation_from_payload(payload).and_then(|params| run_inflation(&params)) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => bad_request(&msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(msg: &str) -> Response {
    warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
