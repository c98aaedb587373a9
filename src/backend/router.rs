//! Assemblage du routeur et des couches transverses (CORS, limite de
//! taille, journal d'accès, 404 par défaut).

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::routing::{get, post};
use http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::backend::handlers_patients::{
    create_patient, delete_patient, get_patient, list_patients, statistics, update_patient,
};
use crate::backend::handlers_records::{
    create_record, delete_record, get_record, list_records, update_record,
};
use crate::backend::handlers_unauth::{api_index, health, login};
use crate::backend::handlers_users::{
    assign_patients, change_password, create_user, delete_user, get_user, list_users, me,
    update_user,
};
use crate::backend::middlewares::log_requests;
use crate::backend::responses::ApiError;
use crate::backend::AppState;
use crate::consts::MAX_BODY_SIZE;

pub fn get_router(state: AppState) -> Result<Router> {
    let origin: HeaderValue = state
        .config
        .cors_origin
        .parse()
        .context("CORS_ORIGIN invalide")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/", get(api_index))
        .route("/auth/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(me))
        .route("/users/change-password", post(change_password))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/assign-patients", post(assign_patients))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/statistics", get(statistics))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/medical-records", get(list_records).post(create_record))
        .route(
            "/medical-records/:id",
            get(get_record).put(update_record).delete(delete_record),
        );

    Ok(Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(middleware::from_fn(log_requests))
        .with_state(state))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} non trouvée", uri))
}
