//! Handlers des patients. La liste respecte le périmètre de l'appelant :
//! un soignant ne voit que ses patients assignés, un admin voit tout.

use axum::extract::State;
use axum::response::Response;

use crate::backend::middlewares::{AdminUser, ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::backend::models::PatientQuery;
use crate::backend::responses::{created, no_content, success, success_with_message, ApiError};
use crate::backend::AppState;
use crate::models::{Id, NewPatient, Patient, PatientUpdate, Role};

/// GET /api/patients
pub async fn list_patients(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<Response, ApiError> {
    let filters = query.into_filters().map_err(ApiError::bad_request)?;
    let patients = if filters.is_empty() {
        state.patients.get_all().await?
    } else {
        state.patients.search(&filters).await?
    };

    // Restriction au périmètre assigné pour le rôle `user`.
    let assigned = match auth.role {
        Role::Admin => None,
        Role::User => Some(state.users.get_by_id(auth.user_id).await?.assigned_patients),
    };

    Ok(success(visible_patients(patients, assigned.as_deref())))
}

/// Ne garde que les patients du périmètre assigné ; `None` signifie accès
/// complet (admin).
fn visible_patients(patients: Vec<Patient>, assigned: Option<&[Id]>) -> Vec<Patient> {
    match assigned {
        None => patients,
        Some(assigned) => patients
            .into_iter()
            .filter(|p| assigned.contains(&p.id))
            .collect(),
    }
}

/// GET /api/patients/statistics
pub async fn statistics(_: AdminUser, State(state): State<AppState>) -> Result<Response, ApiError> {
    let stats = state.patients.statistics().await?;
    Ok(success(stats))
}

/// GET /api/patients/:id
pub async fn get_patient(
    _: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    let patient = state.patients.get_by_id(id).await?;
    Ok(success(patient))
}

/// POST /api/patients
pub async fn create_patient(
    _: AdminUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPatient>,
) -> Result<Response, ApiError> {
    let patient = state.patients.create(&body).await?;
    Ok(created(patient, "Patient créé avec succès"))
}

/// PUT /api/patients/:id
pub async fn update_patient(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(body): ApiJson<PatientUpdate>,
) -> Result<Response, ApiError> {
    let patient = state.patients.update(id, &body).await?;
    Ok(success_with_message(patient, "Patient modifié avec succès"))
}

/// DELETE /api/patients/:id
///
/// Cascade transactionnelle : retrait des assignations, purge des dossiers
/// médicaux, puis suppression de la ligne.
pub async fn delete_patient(
    _: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    state.patients.delete(id).await?;
    Ok(no_content())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupeSanguin, Sexe, TypePatient};
    use crate::utils::validation::Cin;
    use chrono::{NaiveDate, Utc};

    fn patient(id: Id) -> Patient {
        Patient {
            id,
            nom_complet: format!("Patient {}", id),
            cin: Cin::try_from(10_000_000 + id).unwrap(),
            ass_cnss: "CNSS-1000".to_string(),
            date_naissance: NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
            sexe: Sexe::Homme,
            groupe_sanguin: GroupeSanguin::OPositif,
            profession: None,
            situation_familiale: None,
            telephone: None,
            telephone_urgence: None,
            adresse: None,
            date_debut: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            type_patient: TypePatient::Permanent,
            date_fin: None,
            cause_fin: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(patients: &[Patient]) -> Vec<Id> {
        patients.iter().map(|p| p.id).collect()
    }

    #[test]
    fn admin_scope_is_unrestricted() {
        let all = vec![patient(1), patient(2), patient(3)];
        let visible = visible_patients(all, None);
        assert_eq!(ids(&visible), vec![1, 2, 3]);
    }

    #[test]
    fn user_scope_keeps_only_assigned_patients() {
        let all = vec![patient(1), patient(2), patient(3)];
        let visible = visible_patients(all, Some(&[3, 1]));
        assert_eq!(ids(&visible), vec![1, 3], "order of the listing is kept");
    }

    #[test]
    fn user_without_assignments_sees_nothing() {
        let all = vec![patient(1), patient(2)];
        assert!(visible_patients(all, Some(&[])).is_empty());
    }
}
