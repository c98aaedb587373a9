//! Handlers des dossiers médicaux. L'auteur d'une création est toujours le
//! compte authentifié, jamais un champ du corps de requête.

use axum::extract::State;
use axum::response::Response;

use crate::backend::middlewares::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::backend::models::RecordQuery;
use crate::backend::responses::{created, no_content, success, success_with_message, ApiError};
use crate::backend::AppState;
use crate::models::{Id, NewRecord, RecordUpdate};

/// GET /api/medical-records
///
/// La combinaison de paramètres choisit la requête : plage de dates,
/// catégorie et sous-catégorie, catégorie seule, patient seul, ou tout.
pub async fn list_records(
    _: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecordQuery>,
) -> Result<Response, ApiError> {
    let Some(patient_id) = query.patient_id else {
        return Ok(success(state.records.get_all().await?));
    };

    let records = if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        state.records.get_by_date_range(patient_id, start, end).await?
    } else if let (Some(category), Some(sub_category)) = (&query.category, &query.sub_category) {
        state
            .records
            .get_by_category_and_sub_category(patient_id, category, sub_category)
            .await?
    } else if let Some(category) = &query.category {
        state.records.get_by_category(patient_id, category).await?
    } else {
        state.records.get_by_patient(patient_id).await?
    };

    Ok(success(records))
}

/// GET /api/medical-records/:id
pub async fn get_record(
    _: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    let record = state.records.get_by_id(id).await?;
    Ok(success(record))
}

/// POST /api/medical-records
pub async fn create_record(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewRecord>,
) -> Result<Response, ApiError> {
    let record = state.records.create(&body, auth.user_id).await?;
    Ok(created(record, "Enregistrement médical créé avec succès"))
}

/// PUT /api/medical-records/:id
pub async fn update_record(
    _: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(body): ApiJson<RecordUpdate>,
) -> Result<Response, ApiError> {
    let record = state.records.update(id, &body).await?;
    Ok(success_with_message(record, "Enregistrement médical modifié avec succès"))
}

/// DELETE /api/medical-records/:id
pub async fn delete_record(
    _: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    state.records.delete(id).await?;
    Ok(no_content())
}
