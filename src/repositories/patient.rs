//! Dépôt des patients : CRUD générique plus recherche filtrée,
//! contrôle d'unicité du CIN et agrégat par type de prise en charge.

use sqlx::{Executor, PgPool, Postgres};

use crate::models::{Id, NewPatient, Patient, PatientFilters, PatientUpdate, TypePatient};
use crate::repositories::base::{BaseRepository, Field, RepoError, SqlValue};
use crate::schema::{patient_from_row, PatientRow};
use crate::utils::validation::{blank_to_none, Cin};

#[derive(Clone)]
pub struct PatientRepository {
    base: BaseRepository<PatientRow, Patient>,
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseRepository::new(pool, "patients", patient_from_row),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<Patient>, RepoError> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: Id) -> Result<Option<Patient>, RepoError> {
        self.base.find_by_id(id).await
    }

    pub async fn create(&self, patient: &NewPatient) -> Result<Patient, RepoError> {
        self.base.insert(insert_fields(patient)).await
    }

    /// Mise à jour partielle. Un correctif sans aucun champ effectif ne
    /// touche pas la base et retourne la ligne telle quelle.
    pub async fn update(&self, id: Id, patch: &PatientUpdate) -> Result<Option<Patient>, RepoError> {
        let fields = update_fields(patch);
        if fields.iter().all(|(_, value)| value.is_none()) {
            return self.base.find_by_id(id).await;
        }
        self.base.update(fields, id).await
    }

    pub async fn delete(&self, id: Id) -> Result<bool, RepoError> {
        self.base.delete(id).await
    }

    /// Suppression au sein d'une transaction de cascade.
    pub async fn delete_with<'e, X>(&self, executor: X, id: Id) -> Result<bool, RepoError>
    where
        X: Executor<'e, Database = Postgres>,
    {
        self.base.delete_with(executor, id).await
    }

    pub async fn find_by_type(&self, type_patient: TypePatient) -> Result<Vec<Patient>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM patients WHERE type_patient = $1 ORDER BY nom_complet",
                &[SqlValue::text(type_patient.to_string())],
            )
            .await
    }

    /// Recherche multicritère. Les conditions sont combinées en ET dans
    /// l'ordre de déclaration des filtres.
    pub async fn find_by_filters(&self, filters: &PatientFilters) -> Result<Vec<Patient>, RepoError> {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            values.push(SqlValue::text(format!("%{}%", search.trim())));
            conditions.push(format!("nom_complet ILIKE ${}", values.len()));
        }
        if let Some(sexe) = filters.sexe {
            values.push(SqlValue::text(sexe.to_string()));
            conditions.push(format!("sexe = ${}", values.len()));
        }
        if let Some(type_patient) = filters.type_patient {
            values.push(SqlValue::text(type_patient.to_string()));
            conditions.push(format!("type_patient = ${}", values.len()));
        }
        if let Some(groupe) = filters.groupe_sanguin {
            values.push(SqlValue::text(groupe.to_string()));
            conditions.push(format!("groupe_sanguin = ${}", values.len()));
        }

        let mut sql = String::from("SELECT * FROM patients");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY nom_complet");

        self.base.fetch_with(&sql, &values).await
    }

    /// Charge un sous-ensemble de patients, typiquement la liste assignée
    /// d'un soignant. Une liste vide court-circuite la requête.
    pub async fn find_by_ids(&self, ids: &[Id]) -> Result<Vec<Patient>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .fetch_with(
                "SELECT * FROM patients WHERE id = ANY($1) ORDER BY nom_complet",
                &[SqlValue::big_int_array(ids.to_vec())],
            )
            .await
    }

    /// Le CIN est-il déjà pris ? `exclude_id` permet d'ignorer la ligne en
    /// cours de modification pour autoriser un patient à garder son CIN.
    pub async fn exists_by_cin(&self, cin: Cin, exclude_id: Option<Id>) -> Result<bool, RepoError> {
        let exists = match exclude_id {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM patients WHERE cin = $1 AND id <> $2)",
                )
                .bind(cin.value())
                .bind(id)
                .fetch_one(self.base.pool())
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM patients WHERE cin = $1)")
                    .bind(cin.value())
                    .fetch_one(self.base.pool())
                    .await?
            }
        };
        Ok(exists)
    }

    /// Décompte des patients par type, agrégé côté base.
    pub async fn count_by_type(&self) -> Result<Vec<(String, i64)>, RepoError> {
        let rows = sqlx::query_as(
            "SELECT type_patient, COUNT(*) FROM patients GROUP BY type_patient",
        )
        .fetch_all(self.base.pool())
        .await?;
        Ok(rows)
    }
}

fn insert_fields(patient: &NewPatient) -> Vec<Field> {
    vec![
        ("nom_complet", Some(SqlValue::text(patient.nom_complet.trim()))),
        ("cin", Some(SqlValue::big_int(patient.cin.value()))),
        ("ass_cnss", Some(SqlValue::text(patient.ass_cnss.trim()))),
        ("date_naissance", Some(SqlValue::date(patient.date_naissance))),
        ("sexe", Some(SqlValue::text(patient.sexe.to_string()))),
        ("groupe_sanguin", Some(SqlValue::text(patient.groupe_sanguin.to_string()))),
        ("profession", Some(SqlValue::Text(blank_to_none(patient.profession.clone())))),
        (
            "situation_familiale",
            Some(SqlValue::Text(patient.situation_familiale.map(|v| v.to_string()))),
        ),
        ("telephone", Some(SqlValue::BigInt(patient.telephone))),
        ("telephone_urgence", Some(SqlValue::BigInt(patient.telephone_urgence))),
        ("adresse", Some(SqlValue::Text(blank_to_none(patient.adresse.clone())))),
        ("date_debut", Some(SqlValue::date(patient.date_debut))),
        ("type_patient", Some(SqlValue::text(patient.type_patient.to_string()))),
        ("date_fin", Some(SqlValue::Date(patient.date_fin))),
        ("cause_fin", Some(SqlValue::Text(patient.cause_fin.map(|v| v.to_string())))),
    ]
}

fn update_fields(patch: &PatientUpdate) -> Vec<Field> {
    vec![
        (
            "nom_complet",
            patch.nom_complet.as_deref().map(|v| SqlValue::text(v.trim())),
        ),
        ("cin", patch.cin.map(|c| SqlValue::big_int(c.value()))),
        ("ass_cnss", patch.ass_cnss.as_deref().map(|v| SqlValue::text(v.trim()))),
        ("date_naissance", patch.date_naissance.map(SqlValue::date)),
        ("sexe", patch.sexe.map(|v| SqlValue::text(v.to_string()))),
        (
            "groupe_sanguin",
            patch.groupe_sanguin.map(|v| SqlValue::text(v.to_string())),
        ),
        (
            "profession",
            patch.profession.clone().map(|v| SqlValue::Text(blank_to_none(v))),
        ),
        (
            "situation_familiale",
            patch
                .situation_familiale
                .map(|v| SqlValue::Text(v.map(|s| s.to_string()))),
        ),
        ("telephone", patch.telephone.map(SqlValue::BigInt)),
        ("telephone_urgence", patch.telephone_urgence.map(SqlValue::BigInt)),
        (
            "adresse",
            patch.adresse.clone().map(|v| SqlValue::Text(blank_to_none(v))),
        ),
        ("date_debut", patch.date_debut.map(SqlValue::date)),
        (
            "type_patient",
            patch.type_patient.map(|v| SqlValue::text(v.to_string())),
        ),
        ("date_fin", patch.date_fin.map(SqlValue::Date)),
        (
            "cause_fin",
            patch.cause_fin.map(|v| SqlValue::Text(v.map(|c| c.to_string()))),
        ),
    ]
}
