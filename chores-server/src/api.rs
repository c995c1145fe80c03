//! HTTP routes for the household board.
//!
//! Read endpoints are public; anything that changes the board needs a
//! bearer token from `POST /login`. Every read runs a rollover check
//! first so a board that sat idle past midnight is current when viewed.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chores::auth::UserInfo;
use chores::calendar::Calendar;
use chores::laundry::MAX_WEEKLY_RESERVATIONS;
use chores::metrics::MetricsReport;
use chores::report::MonthlyReport;
use chores::{Board, ToggleOutcome};
use chores_proto::laundry::{LaundryReservation, LaundrySlot};
use chores_proto::resident::Resident;
use chores_proto::task::{QueuedOccurrence, TaskId, TaskInstance};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// The user behind a request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Session token the request carried.
    pub token: String,
    /// Who the session belongs to.
    pub user: UserInfo,
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let user = state
            .sessions
            .get(token)
            .await
            .ok_or_else(|| ApiError::Unauthorized("session expired or unknown".to_string()))?;

        Ok(Self {
            token: token.to_string(),
            user,
        })
    }
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// `POST /login` body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username (case-insensitive).
    pub username: String,
    /// Password.
    pub password: String,
}

/// `POST /login` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for later requests.
    pub token: String,
    /// Username as configured.
    pub username: String,
    /// Whether the user may reset the board.
    pub admin: bool,
}

/// `POST /password` body.
#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    /// The password in use.
    pub current_password: String,
    /// The replacement.
    pub new_password: String,
}

/// A task plus its overdue flag at response time.
#[derive(Debug, Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a TaskInstance,
    overdue: bool,
}

fn task_views(tasks: Vec<&TaskInstance>, now: DateTime<Utc>) -> Vec<TaskView<'_>> {
    tasks
        .into_iter()
        .map(|task| TaskView {
            task,
            overdue: task.is_overdue(now),
        })
        .collect()
}

/// `POST /tasks/{id}/toggle` response.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ToggleView {
    Completed {
        task: TaskInstance,
        next: QueuedOccurrence,
    },
    Reopened {
        task: TaskInstance,
    },
}

impl From<ToggleOutcome> for ToggleView {
    fn from(outcome: ToggleOutcome) -> Self {
        match outcome {
            ToggleOutcome::Completed { task, next } => Self::Completed { task, next },
            ToggleOutcome::Reopened { task } => Self::Reopened { task },
        }
    }
}

#[derive(Debug, Serialize)]
struct DailyResidentView {
    date: NaiveDate,
    resident: Option<Resident>,
}

/// `GET /laundry` query.
#[derive(Debug, Default, Deserialize)]
pub struct LaundryQuery {
    /// Any date in the week to list; defaults to today.
    pub week: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct LaundryWeekView<'a> {
    week_start: NaiveDate,
    reservations: Vec<&'a LaundryReservation>,
}

/// `POST /laundry` body.
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    /// Day to book.
    pub date: NaiveDate,
    /// Half-day window.
    pub slot: LaundrySlot,
}

#[derive(Debug, Serialize)]
struct ReservationView {
    reservation: LaundryReservation,
    remaining_this_week: usize,
    weekly_limit: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Runs a rollover check, logging rather than failing the read.
fn refresh(board: &mut Board) {
    match board.check_rollover() {
        Ok(report) if report.changed() => {
            tracing::info!(
                daily = report.daily.len(),
                weekly = report.weekly.len(),
                monthly = report.monthly.len(),
                "rolled over on read"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "rollover check failed"),
    }
}

/// Serializes a view that borrows from the locked board.
fn to_json<T: Serialize>(view: &T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(view)
        .map(Json)
        .map_err(|e| ApiError::Internal(format!("failed to encode response: {e}")))
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn login(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .board
        .lock()
        .await
        .verify(&request.username, &request.password)?;
    tracing::info!(username = %user.username, "login");
    let token = state.sessions.create(user.clone()).await;
    Ok(Json(LoginResponse {
        token,
        username: user.username,
        admin: user.admin,
    }))
}

async fn logout(State(state): State<SharedState>, current: CurrentUser) -> StatusCode {
    state.sessions.remove(&current.token).await;
    tracing::info!(username = %current.user.username, "logout");
    StatusCode::NO_CONTENT
}

async fn change_password(
    State(state): State<SharedState>,
    current: CurrentUser,
    Json(request): Json<PasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state.board.lock().await.change_password(
        &current.user.username,
        &request.current_password,
        &request.new_password,
    )?;
    let revoked = state
        .sessions
        .revoke_others(&current.user.username, &current.token)
        .await;
    tracing::info!(username = %current.user.username, revoked, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    let now = board.now();
    to_json(&task_views(board.tasks().iter().collect(), now))
}

async fn active_tasks(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    let now = board.now();
    to_json(&task_views(board.active(), now))
}

async fn completed_tasks(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    let now = board.now();
    to_json(&task_views(board.completed(), now))
}

async fn toggle_task(
    State(state): State<SharedState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<ToggleView>, ApiError> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    let outcome = board.toggle(TaskId(id), &current.user.username)?;
    Ok(Json(outcome.into()))
}

async fn reset_board(
    State(state): State<SharedState>,
    current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    if !current.user.admin {
        return Err(ApiError::Forbidden(format!(
            "{} may not reset the board",
            current.user.username
        )));
    }
    state.board.lock().await.reset()?;
    tracing::warn!(username = %current.user.username, "board reset");
    Ok(StatusCode::NO_CONTENT)
}

async fn metrics(State(state): State<SharedState>) -> Json<MetricsReport> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    Json(board.metrics())
}

async fn report(State(state): State<SharedState>) -> Json<Vec<MonthlyReport>> {
    let mut board = state.board.lock().await;
    refresh(&mut board);
    Json(board.report())
}

async fn daily_resident(State(state): State<SharedState>) -> Json<DailyResidentView> {
    let board = state.board.lock().await;
    Json(DailyResidentView {
        date: board.today(),
        resident: board.daily_resident(),
    })
}

async fn laundry_week(
    State(state): State<SharedState>,
    Query(query): Query<LaundryQuery>,
) -> Result<Json<Value>, ApiError> {
    let board = state.board.lock().await;
    let date = query.week.unwrap_or_else(|| board.today());
    to_json(&LaundryWeekView {
        week_start: Calendar::week_start(date),
        reservations: board.laundry().week_of(date),
    })
}

async fn reserve_laundry(
    State(state): State<SharedState>,
    current: CurrentUser,
    Json(request): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<ReservationView>), ApiError> {
    let mut board = state.board.lock().await;
    let reservation = board.reserve_laundry(&current.user.username, request.date, request.slot)?;
    let remaining_this_week = board
        .laundry()
        .remaining_in_week(&reservation.resident, reservation.date);
    tracing::info!(
        username = %current.user.username,
        date = %reservation.date,
        slot = %reservation.slot,
        "laundry booked"
    );
    Ok((
        StatusCode::CREATED,
        Json(ReservationView {
            reservation,
            remaining_this_week,
            weekly_limit: MAX_WEEKLY_RESERVATIONS,
        }),
    ))
}

async fn cancel_laundry(
    State(state): State<SharedState>,
    current: CurrentUser,
    Path((date, slot)): Path<(NaiveDate, String)>,
) -> Result<StatusCode, ApiError> {
    let slot: LaundrySlot = slot.parse().map_err(ApiError::BadRequest)?;
    state
        .board
        .lock()
        .await
        .cancel_laundry(&current.user.username, date, slot)?;
    tracing::info!(username = %current.user.username, %date, %slot, "laundry cancelled");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Builds the API router over shared state.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password", post(change_password))
        .route("/tasks", get(list_tasks))
        .route("/tasks/active", get(active_tasks))
        .route("/tasks/completed", get(completed_tasks))
        .route("/tasks/reset", post(reset_board))
        .route("/tasks/{id}/toggle", post(toggle_task))
        .route("/metrics", get(metrics))
        .route("/report", get(report))
        .route("/daily-resident", get(daily_resident))
        .route("/laundry", get(laundry_week).post(reserve_laundry))
        .route("/laundry/{date}/{slot}", delete(cancel_laundry))
        .with_state(state)
}

/// Starts the API server on `addr`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: SharedState,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    Ok((bound_addr, handle))
}
