use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::application::{AppError, LedgerService};
use crate::domain::{Cents, Customer, Operation, TaxId};

use super::{CurrentCustomer, JsonBody};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(service: LedgerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Deserialize)]
struct OpenAccountRequest {
    cpf: TaxId,
    name: String,
}

#[derive(Deserialize)]
struct RenameRequest {
    name: String,
}

#[derive(Deserialize)]
struct DepositRequest {
    #[serde(default)]
    description: String,
    amount: Cents,
}

#[derive(Deserialize)]
struct WithdrawRequest {
    amount: Cents,
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    customers: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /account
async fn open_account(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<OpenAccountRequest>,
) -> Result<StatusCode, AppError> {
    state.service.open(req.cpf, req.name)?;
    Ok(StatusCode::CREATED)
}

/// PUT /account
async fn rename_account(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    JsonBody(req): JsonBody<RenameRequest>,
) -> Result<StatusCode, AppError> {
    state.service.rename(&customer, req.name)?;
    Ok(StatusCode::CREATED)
}

/// GET /account
async fn get_account(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(state.service.account(&customer)?))
}

/// DELETE /account - responds with the customers that remain
async fn close_account(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(state.service.close(&customer)?))
}

/// GET /statement
async fn get_statement(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Vec<Operation>>, AppError> {
    Ok(Json(state.service.statement(&customer)?))
}

/// GET /statement/date?date=YYYY-MM-DD
///
/// A missing or malformed date matches nothing and yields an empty list.
async fn get_statement_by_date(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<Operation>>, AppError> {
    let date = query
        .date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

    let Some(date) = date else {
        debug!(date = ?query.date, "unusable statement date");
        return Ok(Json(Vec::new()));
    };

    Ok(Json(state.service.statement_by_date(&customer, date)?))
}

/// POST /deposit
async fn deposit(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    JsonBody(req): JsonBody<DepositRequest>,
) -> Result<StatusCode, AppError> {
    state
        .service
        .deposit(&customer, req.description, req.amount)?;
    Ok(StatusCode::CREATED)
}

/// POST /withdraw
async fn withdraw(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    JsonBody(req): JsonBody<WithdrawRequest>,
) -> Result<StatusCode, AppError> {
    state.service.withdraw(&customer, req.amount)?;
    Ok(StatusCode::CREATED)
}

/// GET /balance
async fn get_balance(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Cents>, AppError> {
    Ok(Json(state.service.balance(&customer)?))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        customers: state.service.len(),
    })
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/account",
            post(open_account)
                .put(rename_account)
                .get(get_account)
                .delete(close_account),
        )
        .route("/statement", get(get_statement))
        .route("/statement/date", get(get_statement_by_date))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/balance", get(get_balance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    let local_addr = listener.local_addr().context("Failed to read bound address")?;
    info!(%local_addr, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
    }
}
