//! Corps de requête et paramètres de requête propres à la couche HTTP.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Id, PatientFilters, User};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Les deux champs sont optionnels pour produire le message d'erreur
/// attendu quand l'un manque, plutôt qu'un rejet de désérialisation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPatientsRequest {
    pub patient_ids: Vec<Id>,
}

/// Filtres de la liste de patients. La valeur littérale `tous` équivaut à
/// l'absence du paramètre.
#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub search: Option<String>,
    pub sexe: Option<String>,
    #[serde(rename = "type")]
    pub type_patient: Option<String>,
    #[serde(rename = "groupeSanguin")]
    pub groupe_sanguin: Option<String>,
}

impl PatientQuery {
    /// Convertit les paramètres bruts en filtres typés. Une valeur d'énuméré
    /// inconnue est une erreur de requête, pas une liste vide silencieuse.
    pub fn into_filters(self) -> Result<PatientFilters, String> {
        Ok(PatientFilters {
            search: self.search.filter(|s| !s.trim().is_empty()),
            sexe: parse_param("sexe", self.sexe)?,
            type_patient: parse_param("type", self.type_patient)?,
            groupe_sanguin: parse_param("groupeSanguin", self.groupe_sanguin)?,
        })
    }
}

fn parse_param<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, String> {
    match value.as_deref() {
        None | Some("tous") => Ok(None),
        Some(raw) => T::from_str(raw)
            .map(Some)
            .map_err(|_| format!("Paramètre {} invalide: {}", name, raw)),
    }
}

/// Filtres de la liste de dossiers médicaux. La combinaison fournie choisit
/// la requête : plage de dates, catégorie/sous-catégorie, catégorie seule,
/// patient seul ou aucune.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub patient_id: Option<Id>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupeSanguin, Sexe, TypePatient};

    #[test]
    fn tous_and_absent_both_mean_no_filter() {
        let query = PatientQuery {
            sexe: Some("tous".to_string()),
            ..PatientQuery::default()
        };
        let filters = query.into_filters().unwrap();
        assert!(filters.sexe.is_none());
        assert!(filters.type_patient.is_none());
        assert!(filters.is_empty());
    }

    #[test]
    fn known_values_parse_into_typed_filters() {
        let query = PatientQuery {
            search: Some("Karray".to_string()),
            sexe: Some("Femme".to_string()),
            type_patient: Some("Fin Traitement".to_string()),
            groupe_sanguin: Some("AB+".to_string()),
        };
        let filters = query.into_filters().unwrap();
        assert_eq!(filters.search.as_deref(), Some("Karray"));
        assert_eq!(filters.sexe, Some(Sexe::Femme));
        assert_eq!(filters.type_patient, Some(TypePatient::FinTraitement));
        assert_eq!(filters.groupe_sanguin, Some(GroupeSanguin::AbPositif));
    }

    #[test]
    fn unknown_enum_value_is_rejected_with_the_parameter_name() {
        let query = PatientQuery {
            groupe_sanguin: Some("Z+".to_string()),
            ..PatientQuery::default()
        };
        assert_eq!(
            query.into_filters().unwrap_err(),
            "Paramètre groupeSanguin invalide: Z+"
        );
    }
}
