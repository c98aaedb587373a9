//! Handlers accessibles sans authentification : état du service, index de
//! l'API et connexion.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::backend::middlewares::ApiJson;
use crate::backend::models::{LoginRequest, LoginResponse};
use crate::backend::responses::{success, ApiError};
use crate::backend::AppState;

/// GET /health — hors enveloppe standard, consommé par les sondes.
pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.env,
    }))
    .into_response()
}

/// GET /api
pub async fn api_index() -> Response {
    Json(json!({
        "success": true,
        "message": "API Gestion Patients - Dialyse",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "patients": "/api/patients",
            "users": "/api/users",
            "medicalRecords": "/api/medical-records",
            "health": "/health",
        },
    }))
    .into_response()
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let (user, token) = state.auth.login(&body.username, &body.password).await?;
    Ok(success(LoginResponse { user, token }))
}
