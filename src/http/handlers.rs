//! Request handlers. All state comes from the shared [`ApiContext`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::context::ApiContext;
use crate::registry::{RegistryError, TypedValue};
use crate::state::{ApiState, InjectedAccount};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub initialized: bool,
    pub connected: bool,
    pub ready: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct FormattedBalance {
    pub raw: String,
    pub formatted: String,
    pub decimals: u32,
    pub unit: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub async fn get_status(State(ctx): State<ApiContext>) -> Json<ApiState> {
    Json(ctx.publisher.snapshot())
}

pub async fn get_health(State(ctx): State<ApiContext>) -> (StatusCode, Json<HealthReport>) {
    let state = ctx.publisher.snapshot();
    let (code, status) = if !state.is_api_initialized {
        (StatusCode::SERVICE_UNAVAILABLE, "not_bootstrapped")
    } else if !state.is_api_connected {
        (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
    } else if state.is_api_ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "loading")
    };

    (
        code,
        Json(HealthReport {
            status,
            initialized: state.is_api_initialized,
            connected: state.is_api_connected,
            ready: state.is_api_ready,
            error: state.error_message,
        }),
    )
}

pub async fn get_accounts(State(ctx): State<ApiContext>) -> Json<Vec<InjectedAccount>> {
    Json(ctx.publisher.snapshot().injected_accounts)
}

pub async fn get_types(State(ctx): State<ApiContext>) -> Json<Vec<String>> {
    Json(ctx.registry.type_names())
}

pub async fn create_type(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<TypedValue>, ApiError> {
    ctx.registry
        .create_type(&name, value)
        .map(Json)
        .map_err(|e| match e {
            RegistryError::UnknownType(_) => error(StatusCode::NOT_FOUND, e.to_string()),
            RegistryError::InvalidValue { .. } => error(StatusCode::BAD_REQUEST, e.to_string()),
        })
}

pub async fn get_balance(
    State(ctx): State<ApiContext>,
    Path(raw): Path<String>,
) -> Result<Json<FormattedBalance>, ApiError> {
    let amount: u128 = raw
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, format!("'{raw}' is not an unsigned integer")))?;
    let format = ctx.balance_format();
    Ok(Json(FormattedBalance {
        formatted: format.format(amount),
        raw,
        decimals: format.decimals,
        unit: format.unit,
    }))
}
