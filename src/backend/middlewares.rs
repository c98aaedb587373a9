//! Extracteurs d'authentification et enrobages de rejet.
//!
//! `AuthUser` vérifie le jeton Bearer et recharge le compte depuis la base
//! (un compte supprimé ou un mot de passe changé invalide le jeton).
//! `AdminUser` ajoute l'exigence du rôle admin : un appelant anonyme reçoit
//! 401 avant toute évaluation du rôle, un non-admin reçoit 403.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use log::info;

use crate::backend::responses::ApiError;
use crate::backend::AppState;
use crate::models::{Id, Role};

/// Identité attachée à la requête après vérification du jeton.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Id,
    pub username: String,
    pub role: Role,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Token d'authentification manquant"))?;

        let claims = state.auth.verify_token(token)?;
        let user = state.auth.validate_user(&claims).await?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

/// Identité vérifiée ET rôle admin exigé.
pub struct AdminUser(pub AuthUser);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&auth)?;
        Ok(AdminUser(auth))
    }
}

/// Le rôle n'est évalué qu'une fois l'identité établie : un appelant
/// anonyme reçoit 401 via [`AuthUser`], jamais 403.
fn ensure_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role != Role::Admin {
        return Err(ApiError::forbidden("Accès refusé - Permissions insuffisantes"));
    }
    Ok(())
}

/// `axum::Json` dont le rejet rend l'enveloppe d'erreur standard.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` avec la même politique de rejet.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` avec la même politique de rejet.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Corps de requête invalide: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(format!("Paramètres de requête invalides: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(format!("Paramètre de chemin invalide: {}", rejection.body_text()))
    }
}

/// Journal d'accès : méthode, URI, statut et latence.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({} ms)",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}
