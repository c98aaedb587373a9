//! Lignes telles que stockées en base et conversion vers le modèle.
//!
//! Les énumérations vivent en colonnes TEXT ; la conversion est une
//! fonction pure et faillible pour que toute valeur inattendue remonte
//! avec le nom de la colonne fautive.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use thiserror::Error;

use crate::models::{MedicalRecord, Patient, Role, User};
use crate::utils::validation::Cin;

/// Valeur de colonne impossible à convertir vers le modèle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("colonne {column}: valeur inattendue \"{value}\"")]
pub struct RowError {
    pub column: &'static str,
    pub value: String,
}

fn parse_column<T: FromStr>(column: &'static str, value: &str) -> Result<T, RowError> {
    T::from_str(value).map_err(|_| RowError {
        column,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub nom_complet: String,
    pub cin: i64,
    pub ass_cnss: String,
    pub date_naissance: NaiveDate,
    pub sexe: String,
    pub groupe_sanguin: String,
    pub profession: Option<String>,
    pub situation_familiale: Option<String>,
    pub telephone: Option<i64>,
    pub telephone_urgence: Option<i64>,
    pub adresse: Option<String>,
    pub date_debut: NaiveDate,
    pub type_patient: String,
    pub date_fin: Option<NaiveDate>,
    pub cause_fin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn patient_from_row(row: PatientRow) -> Result<Patient, RowError> {
    Ok(Patient {
        id: row.id,
        nom_complet: row.nom_complet,
        cin: Cin::try_from(row.cin).map_err(|_| RowError {
            column: "cin",
            value: row.cin.to_string(),
        })?,
        ass_cnss: row.ass_cnss,
        date_naissance: row.date_naissance,
        sexe: parse_column("sexe", &row.sexe)?,
        groupe_sanguin: parse_column("groupe_sanguin", &row.groupe_sanguin)?,
        profession: row.profession,
        situation_familiale: row
            .situation_familiale
            .as_deref()
            .map(|v| parse_column("situation_familiale", v))
            .transpose()?,
        telephone: row.telephone,
        telephone_urgence: row.telephone_urgence,
        adresse: row.adresse,
        date_debut: row.date_debut,
        type_patient: parse_column("type_patient", &row.type_patient)?,
        date_fin: row.date_fin,
        cause_fin: row
            .cause_fin
            .as_deref()
            .map(|v| parse_column("cause_fin", v))
            .transpose()?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub assigned_patients: Vec<i64>,
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn user_from_row(row: UserRow) -> Result<User, RowError> {
    Ok(User {
        id: row.id,
        username: row.username,
        password_hash: row.password_hash,
        role: parse_column::<Role>("role", &row.role)?,
        assigned_patients: row.assigned_patients,
        token_version: row.token_version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct MedicalRecordRow {
    pub id: i64,
    pub patient_id: i64,
    pub category: String,
    pub sub_category: Option<String>,
    pub date: NaiveDate,
    pub details: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn medical_record_from_row(row: MedicalRecordRow) -> Result<MedicalRecord, RowError> {
    Ok(MedicalRecord {
        id: row.id,
        patient_id: row.patient_id,
        category: row.category,
        sub_category: row.sub_category,
        date: row.date,
        details: row.details,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupeSanguin, Sexe, TypePatient};

    fn sample_patient_row() -> PatientRow {
        PatientRow {
            id: 4,
            nom_complet: "Salah Ben Youssef".to_string(),
            cin: 11_223_344,
            ass_cnss: "CNSS-4491".to_string(),
            date_naissance: NaiveDate::from_ymd_opt(1958, 11, 23).unwrap(),
            sexe: "Homme".to_string(),
            groupe_sanguin: "AB-".to_string(),
            profession: None,
            situation_familiale: Some("Marié(e)".to_string()),
            telephone: Some(71_234_567),
            telephone_urgence: None,
            adresse: Some("12 rue des Oliviers, Sfax".to_string()),
            date_debut: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            type_patient: "Permanent".to_string(),
            date_fin: None,
            cause_fin: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn patient_row_maps_to_model() {
        let patient = patient_from_row(sample_patient_row()).unwrap();
        assert_eq!(patient.sexe, Sexe::Homme);
        assert_eq!(patient.groupe_sanguin, GroupeSanguin::AbNegatif);
        assert_eq!(patient.type_patient, TypePatient::Permanent);
        assert_eq!(patient.cin.value(), 11_223_344);
        assert_eq!(patient.profession, None, "NULL column must map to None");
        assert_eq!(patient.date_fin, None);
    }

    #[test]
    fn unknown_enum_text_names_the_column() {
        let mut row = sample_patient_row();
        row.groupe_sanguin = "Z+".to_string();
        let err = patient_from_row(row).unwrap_err();
        assert_eq!(err.column, "groupe_sanguin");
        assert_eq!(err.value, "Z+");
    }

    #[test]
    fn user_row_maps_role_text() {
        let row = UserRow {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: "admin".to_string(),
            assigned_patients: vec![],
            token_version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user = user_from_row(row).unwrap();
        assert_eq!(user.role, Role::Admin);

        let row = UserRow {
            role: "superviseur".to_string(),
            ..UserRow {
                id: 2,
                username: "x".to_string(),
                password_hash: String::new(),
                role: String::new(),
                assigned_patients: vec![],
                token_version: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        };
        assert!(user_from_row(row).is_err(), "unknown role must be rejected");
    }
}
