//! Enveloppes de réponse normalisées : `{ success, data, message? }` en
//! succès, `{ success: false, message }` en erreur. Aucune requête ne doit
//! se terminer sans corps JSON structuré.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use serde_json::json;

use crate::repositories::base::RepoError;
use crate::services::ServiceError;

/// Erreur prête à être sérialisée vers le client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_) | ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidCredentials | ServiceError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Repo(repo) => return Self::internal(repo),
        };
        Self::new(status, err.to_string())
    }
}

impl ApiError {
    /// Les erreurs de la couche de données sont journalisées côté serveur ;
    /// le détail n'est exposé au client qu'en compilation de débogage.
    fn internal(err: &RepoError) -> Self {
        error!("Erreur interne: {}", err);
        let message = if cfg!(debug_assertions) {
            format!("Erreur interne du serveur: {}", err)
        } else {
            "Erreur interne du serveur".to_string()
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data, "message": message })),
    )
        .into_response()
}

pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data, "message": message })),
    )
        .into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_their_status_codes() {
        let cases = [
            (
                ServiceError::Validation("champ manquant".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Conflict("déjà pris".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::NotFound("absent".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidToken, StatusCode::UNAUTHORIZED),
            (ServiceError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn credential_errors_share_one_message() {
        let err = ApiError::from(ServiceError::InvalidCredentials);
        assert_eq!(err.message, "Nom d'utilisateur ou mot de passe incorrect");
    }
}
