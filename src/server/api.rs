//! REST API handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::USER_HEADER;
use super::state::AppState;
use crate::format::{format_gbp, to_minor_units};
use crate::orchestrator::UNCONFIGURED_MESSAGE;
use crate::store::{Category, DashboardStats, Expense, ExpenseId, NewExpense, StoreError, UserId};
use crate::types::{ChatRequest, ChatResponse};

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg)))
}

fn store_error(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => {
            tracing::error!("Expense store failure: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// Caller identity from the `X-User-Id` header, falling back to the default user.
fn caller(headers: &HeaderMap, state: &AppState) -> Result<UserId, String> {
    match headers.get(USER_HEADER) {
        None => Ok(state.default_user_id),
        Some(raw) => raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| format!("{} must be an integer user id", USER_HEADER)),
    }
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub chat_configured: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        chat_configured: state.orchestrator.is_configured(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStatus {
    pub configured: bool,
}

pub async fn chat_status(State(state): State<AppState>) -> Json<ChatStatus> {
    Json(ChatStatus {
        configured: state.orchestrator.is_configured(),
    })
}

/// Always answers 200 with a [`ChatResponse`] body. Unreadable requests are
/// reported in the body; when chat is unconfigured every request gets the
/// fixed informational reply.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    if !state.orchestrator.is_configured() {
        return Json(ChatResponse::answer(UNCONFIGURED_MESSAGE));
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Rejected chat payload: {}", rejection.body_text());
            return Json(ChatResponse::failure(
                "I couldn't read that request.",
                rejection.body_text(),
            ));
        }
    };
    if request.message.trim().is_empty() {
        return Json(ChatResponse::failure(
            "Please enter a message.",
            "message is required",
        ));
    }
    let user_id = match caller(&headers, &state) {
        Ok(id) => id,
        Err(e) => return Json(ChatResponse::failure("I couldn't identify you.", e)),
    };

    Json(state.orchestrator.handle_as(request, user_id).await)
}

/// Expense record with its amount already formatted for display
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    #[serde(flatten)]
    pub expense: Expense,
    pub amount_display: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        let amount_display = format_gbp(expense.amount_minor);
        Self {
            expense,
            amount_display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpensesListResponse {
    pub expenses: Vec<ExpenseResponse>,
    pub total: usize,
}

impl From<Vec<Expense>> for ExpensesListResponse {
    fn from(expenses: Vec<Expense>) -> Self {
        let total = expenses.len();
        Self {
            expenses: expenses.into_iter().map(ExpenseResponse::from).collect(),
            total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub filter: Option<String>,
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<ExpensesListResponse> {
    let expenses = state
        .store
        .list_expenses(params.filter)
        .await
        .map_err(store_error)?;
    Ok(Json(expenses.into()))
}

pub async fn list_pending(State(state): State<AppState>) -> ApiResult<ExpensesListResponse> {
    let expenses = state.store.list_pending().await.map_err(store_error)?;
    Ok(Json(expenses.into()))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<ExpenseId>,
) -> ApiResult<ExpenseResponse> {
    let expense = state.store.get_expense(id).await.map_err(store_error)?;
    Ok(Json(expense.into()))
}

/// Create expense request; `amount` is in pounds
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub category_id: i64,
    pub expense_date: NaiveDate,
    pub description: Option<String>,
}

pub async fn create_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiError> {
    let user_id = caller(&headers, &state).map_err(bad_request)?;
    let amount_minor = to_minor_units(req.amount).map_err(bad_request)?;
    let expense = state
        .store
        .create_expense(NewExpense {
            user_id,
            category_id: req.category_id,
            amount_minor,
            expense_date: req.expense_date,
            description: req.description,
        })
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Copy)]
enum Transition {
    Submit,
    Approve,
    Reject,
}

async fn transition(
    state: &AppState,
    headers: &HeaderMap,
    id: ExpenseId,
    action: Transition,
) -> ApiResult<TransitionResponse> {
    let user_id = caller(headers, state).map_err(bad_request)?;
    let (done, verb, past) = match action {
        Transition::Submit => (
            state.store.submit_expense(id, user_id).await,
            "submit",
            "submitted",
        ),
        Transition::Approve => (
            state.store.approve_expense(id, user_id).await,
            "approve",
            "approved",
        ),
        Transition::Reject => (
            state.store.reject_expense(id, user_id).await,
            "reject",
            "rejected",
        ),
    };
    let done = done.map_err(store_error)?;
    let message = if done {
        format!("Expense {} {}", id, past)
    } else {
        format!("Failed to {} expense {}", verb, id)
    };
    Ok(Json(TransitionResponse {
        success: done,
        message,
    }))
}

pub async fn submit_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ExpenseId>,
) -> ApiResult<TransitionResponse> {
    transition(&state, &headers, id, Transition::Submit).await
}

pub async fn approve_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ExpenseId>,
) -> ApiResult<TransitionResponse> {
    transition(&state, &headers, id, Transition::Approve).await
}

pub async fn reject_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ExpenseId>,
) -> ApiResult<TransitionResponse> {
    transition(&state, &headers, id, Transition::Reject).await
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = state.store.list_categories().await.map_err(store_error)?;
    Ok(Json(categories))
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.store.dashboard_stats().await.map_err(store_error)?;
    Ok(Json(stats))
}
