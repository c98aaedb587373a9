//! Modèle de données : patients, utilisateurs et dossiers médicaux.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};

use crate::utils::validation::Cin;

/// Identifiant d'une ligne en base (séquence PostgreSQL).
pub type Id = i64;

/// Rôle d'un compte : administrateur ou soignant.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Sexe d'un patient.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Sexe {
    Homme,
    Femme,
}

/// Groupe sanguin dans le système ABO avec rhésus.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum GroupeSanguin {
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APositif,
    #[serde(rename = "A-")]
    #[strum(serialize = "A-")]
    ANegatif,
    #[serde(rename = "B+")]
    #[strum(serialize = "B+")]
    BPositif,
    #[serde(rename = "B-")]
    #[strum(serialize = "B-")]
    BNegatif,
    #[serde(rename = "AB+")]
    #[strum(serialize = "AB+")]
    AbPositif,
    #[serde(rename = "AB-")]
    #[strum(serialize = "AB-")]
    AbNegatif,
    #[serde(rename = "O+")]
    #[strum(serialize = "O+")]
    OPositif,
    #[serde(rename = "O-")]
    #[strum(serialize = "O-")]
    ONegatif,
}

/// Modalité de prise en charge du patient par le centre.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TypePatient {
    Permanent,
    Vacancier,
    #[serde(rename = "Fin Traitement")]
    #[strum(serialize = "Fin Traitement")]
    FinTraitement,
}

/// Raison de la fin du traitement dans le centre.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CauseFin {
    #[serde(rename = "Transféré")]
    #[strum(serialize = "Transféré")]
    Transfere,
    #[serde(rename = "Décès")]
    #[strum(serialize = "Décès")]
    Deces,
    Greffe,
}

/// Situation familiale déclarée du patient.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SituationFamiliale {
    #[serde(rename = "Célibataire")]
    #[strum(serialize = "Célibataire")]
    Celibataire,
    #[serde(rename = "Marié(e)")]
    #[strum(serialize = "Marié(e)")]
    Marie,
    #[serde(rename = "Divorcé(e)")]
    #[strum(serialize = "Divorcé(e)")]
    Divorce,
    #[serde(rename = "Veuf(ve)")]
    #[strum(serialize = "Veuf(ve)")]
    Veuf,
}

/// Un patient suivi par le centre de dialyse.
///
/// Les noms de champs JSON reprennent tels quels ceux attendus par le
/// frontend (français, snake_case), à l'exception des horodatages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: Id,
    pub nom_complet: String,
    pub cin: Cin,
    pub ass_cnss: String,
    pub date_naissance: NaiveDate,
    pub sexe: Sexe,
    pub groupe_sanguin: GroupeSanguin,
    pub profession: Option<String>,
    pub situation_familiale: Option<SituationFamiliale>,
    pub telephone: Option<i64>,
    pub telephone_urgence: Option<i64>,
    pub adresse: Option<String>,
    pub date_debut: NaiveDate,
    pub type_patient: TypePatient,
    pub date_fin: Option<NaiveDate>,
    pub cause_fin: Option<CauseFin>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Un compte de l'application (administrateur ou soignant).
///
/// Le hachage du mot de passe et la version de jeton ne sortent jamais
/// de l'API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub assigned_patients: Vec<Id>,
    #[serde(skip_serializing)]
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Une entrée du dossier médical d'un patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: Id,
    pub patient_id: Id,
    pub category: String,
    pub sub_category: Option<String>,
    pub date: NaiveDate,
    pub details: Option<String>,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Répartition des patients par type de prise en charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: i64,
    pub permanent: i64,
    pub vacancier: i64,
    pub fin_traitement: i64,
}

/// Données de création d'un patient.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub nom_complet: String,
    pub cin: Cin,
    pub ass_cnss: String,
    pub date_naissance: NaiveDate,
    pub sexe: Sexe,
    pub groupe_sanguin: GroupeSanguin,
    pub profession: Option<String>,
    pub situation_familiale: Option<SituationFamiliale>,
    pub telephone: Option<i64>,
    pub telephone_urgence: Option<i64>,
    pub adresse: Option<String>,
    pub date_debut: NaiveDate,
    pub type_patient: TypePatient,
    pub date_fin: Option<NaiveDate>,
    pub cause_fin: Option<CauseFin>,
}

/// Mise à jour partielle d'un patient.
///
/// Les champs annulables distinguent trois états : absent du JSON
/// (inchangé), `null` (efface la valeur) ou une valeur. Les champs texte
/// optionnels traitent aussi la chaîne vide comme un effacement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub nom_complet: Option<String>,
    pub cin: Option<Cin>,
    pub ass_cnss: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub sexe: Option<Sexe>,
    pub groupe_sanguin: Option<GroupeSanguin>,
    #[serde(default, deserialize_with = "double_option")]
    pub profession: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub situation_familiale: Option<Option<SituationFamiliale>>,
    #[serde(default, deserialize_with = "double_option")]
    pub telephone: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub telephone_urgence: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub adresse: Option<Option<String>>,
    pub date_debut: Option<NaiveDate>,
    pub type_patient: Option<TypePatient>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_fin: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cause_fin: Option<Option<CauseFin>>,
}

/// Critères de recherche de patients. Tous optionnels, combinés en ET.
#[derive(Debug, Clone, Default)]
pub struct PatientFilters {
    pub search: Option<String>,
    pub sexe: Option<Sexe>,
    pub type_patient: Option<TypePatient>,
    pub groupe_sanguin: Option<GroupeSanguin>,
}

impl PatientFilters {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.sexe.is_none()
            && self.type_patient.is_none()
            && self.groupe_sanguin.is_none()
    }
}

/// Données de création d'un compte.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub assigned_patients: Option<Vec<Id>>,
}

/// Mise à jour partielle d'un compte. Un mot de passe fourni est re-haché
/// et révoque les jetons déjà émis.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub assigned_patients: Option<Vec<Id>>,
}

/// Données de création d'une entrée de dossier médical. L'auteur est
/// toujours le compte authentifié, jamais un champ du corps de requête.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub patient_id: Id,
    pub category: String,
    pub sub_category: Option<String>,
    /// Optionnelle à la désérialisation : l'absence est signalée par le
    /// service avec le message métier, pas par un rejet de corps JSON.
    pub date: Option<NaiveDate>,
    pub details: Option<String>,
}

/// Mise à jour partielle d'une entrée de dossier médical.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub sub_category: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub details: Option<Option<String>>,
}

/// Désérialise `Option<Option<T>>` : champ absent => `None`,
/// `null` => `Some(None)`, valeur => `Some(Some(v))`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_to_frontend_labels() {
        assert_eq!(
            serde_json::to_value(GroupeSanguin::AbPositif).unwrap(),
            serde_json::json!("AB+")
        );
        assert_eq!(
            serde_json::to_value(TypePatient::FinTraitement).unwrap(),
            serde_json::json!("Fin Traitement")
        );
        assert_eq!(
            serde_json::to_value(CauseFin::Deces).unwrap(),
            serde_json::json!("Décès")
        );
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), serde_json::json!("admin"));
    }

    #[test]
    fn enums_parse_from_stored_text() {
        use std::str::FromStr;

        assert_eq!(GroupeSanguin::from_str("O-").unwrap(), GroupeSanguin::ONegatif);
        assert_eq!(
            TypePatient::from_str("Fin Traitement").unwrap(),
            TypePatient::FinTraitement
        );
        assert_eq!(
            SituationFamiliale::from_str("Marié(e)").unwrap(),
            SituationFamiliale::Marie
        );
        assert!(TypePatient::from_str("Inconnu").is_err(), "unknown label must fail");
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: PatientUpdate =
            serde_json::from_str(r#"{ "profession": null, "nom_complet": "Amina Karray" }"#)
                .unwrap();
        assert_eq!(patch.profession, Some(None), "null clears the field");
        assert_eq!(patch.adresse, None, "absent field stays untouched");
        assert_eq!(patch.nom_complet.as_deref(), Some("Amina Karray"));

        let patch: RecordUpdate =
            serde_json::from_str(r#"{ "subCategory": "Hémodialyse" }"#).unwrap();
        assert_eq!(patch.sub_category, Some(Some("Hémodialyse".to_string())));
        assert_eq!(patch.details, None);
    }

    #[test]
    fn user_serialization_never_leaks_credentials() {
        let user = User {
            id: 1,
            username: "medecin1".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::User,
            assigned_patients: vec![3, 7],
            token_version: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none(), "hash must never be serialized");
        assert!(json.get("password").is_none());
        assert!(json.get("tokenVersion").is_none());
        assert_eq!(json["assignedPatients"], serde_json::json!([3, 7]));
    }
}
