//! Handlers des comptes. La gestion des comptes est réservée aux admins ;
//! le profil et le changement de mot de passe restent accessibles à tout
//! compte authentifié.

use axum::extract::State;
use axum::response::Response;

use crate::backend::middlewares::{AdminUser, ApiJson, ApiPath, AuthUser};
use crate::backend::models::{AssignPatientsRequest, ChangePasswordRequest};
use crate::backend::responses::{created, no_content, success, success_with_message, ApiError};
use crate::backend::AppState;
use crate::models::{Id, NewUser, UserUpdate};

/// GET /api/users/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> Result<Response, ApiError> {
    let user = state.users.get_by_id(auth.user_id).await?;
    Ok(success(user))
}

/// POST /api/users/change-password
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    let (Some(old_password), Some(new_password)) = (body.old_password, body.new_password) else {
        return Err(ApiError::bad_request("Ancien et nouveau mot de passe requis"));
    };
    state
        .auth
        .change_password(auth.user_id, &old_password, &new_password)
        .await?;
    Ok(success_with_message((), "Mot de passe modifié avec succès"))
}

/// GET /api/users
pub async fn list_users(_: AdminUser, State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = state.users.get_all().await?;
    Ok(success(users))
}

/// GET /api/users/:id
pub async fn get_user(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    let user = state.users.get_by_id(id).await?;
    Ok(success(user))
}

/// POST /api/users
pub async fn create_user(
    _: AdminUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Response, ApiError> {
    let user = state.users.create(&body).await?;
    Ok(created(user, "Utilisateur créé avec succès"))
}

/// PUT /api/users/:id
pub async fn update_user(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Response, ApiError> {
    let user = state.users.update(id, &body).await?;
    Ok(success_with_message(user, "Utilisateur modifié avec succès"))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    state.users.delete(id).await?;
    Ok(no_content())
}

/// POST /api/users/:id/assign-patients
pub async fn assign_patients(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(body): ApiJson<AssignPatientsRequest>,
) -> Result<Response, ApiError> {
    let user = state.users.assign_patients(id, &body.patient_ids).await?;
    Ok(success_with_message(user, "Patients assignés avec succès"))
}
