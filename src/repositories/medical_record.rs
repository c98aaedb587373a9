//! Dépôt des dossiers médicaux : CRUD générique et lectures filtrées par
//! patient, catégorie ou plage de dates.

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::models::{Id, MedicalRecord, NewRecord, RecordUpdate};
use crate::repositories::base::{BaseRepository, Field, RepoError, SqlValue};
use crate::schema::{medical_record_from_row, MedicalRecordRow};
use crate::utils::validation::blank_to_none;

#[derive(Clone)]
pub struct MedicalRecordRepository {
    base: BaseRepository<MedicalRecordRow, MedicalRecord>,
}

impl MedicalRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseRepository::new(pool, "medical_records", medical_record_from_row),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<MedicalRecord>, RepoError> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: Id) -> Result<Option<MedicalRecord>, RepoError> {
        self.base.find_by_id(id).await
    }

    pub async fn create(
        &self,
        record: &NewRecord,
        created_by: Id,
    ) -> Result<MedicalRecord, RepoError> {
        self.base
            .insert(vec![
                ("patient_id", Some(SqlValue::big_int(record.patient_id))),
                ("category", Some(SqlValue::text(record.category.trim()))),
                (
                    "sub_category",
                    Some(SqlValue::Text(blank_to_none(record.sub_category.clone()))),
                ),
                ("date", Some(SqlValue::Date(record.date))),
                ("details", Some(SqlValue::Text(blank_to_none(record.details.clone())))),
                ("created_by", Some(SqlValue::big_int(created_by))),
            ])
            .await
    }

    pub async fn update(
        &self,
        id: Id,
        patch: &RecordUpdate,
    ) -> Result<Option<MedicalRecord>, RepoError> {
        let fields: Vec<Field> = vec![
            ("category", patch.category.as_deref().map(|v| SqlValue::text(v.trim()))),
            (
                "sub_category",
                patch.sub_category.clone().map(|v| SqlValue::Text(blank_to_none(v))),
            ),
            ("date", patch.date.map(SqlValue::date)),
            (
                "details",
                patch.details.clone().map(|v| SqlValue::Text(blank_to_none(v))),
            ),
        ];
        if fields.iter().all(|(_, value)| value.is_none()) {
            return self.base.find_by_id(id).await;
        }
        self.base.update(fields, id).await
    }

    pub async fn delete(&self, id: Id) -> Result<bool, RepoError> {
        self.base.delete(id).await
    }

    pub async fn find_by_patient(&self, patient_id: Id) -> Result<Vec<MedicalRecord>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM medical_records WHERE patient_id = $1 ORDER BY date DESC",
                &[SqlValue::big_int(patient_id)],
            )
            .await
    }

    pub async fn find_by_category(
        &self,
        patient_id: Id,
        category: &str,
    ) -> Result<Vec<MedicalRecord>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM medical_records WHERE patient_id = $1 AND category = $2 \
                 ORDER BY date DESC",
                &[SqlValue::big_int(patient_id), SqlValue::text(category)],
            )
            .await
    }

    pub async fn find_by_category_and_sub_category(
        &self,
        patient_id: Id,
        category: &str,
        sub_category: &str,
    ) -> Result<Vec<MedicalRecord>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM medical_records \
                 WHERE patient_id = $1 AND category = $2 AND sub_category = $3 \
                 ORDER BY date DESC",
                &[
                    SqlValue::big_int(patient_id),
                    SqlValue::text(category),
                    SqlValue::text(sub_category),
                ],
            )
            .await
    }

    /// Dossiers d'un patient entre deux dates, bornes incluses.
    pub async fn find_by_date_range(
        &self,
        patient_id: Id,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MedicalRecord>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM medical_records \
                 WHERE patient_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date DESC",
                &[
                    SqlValue::big_int(patient_id),
                    SqlValue::date(start),
                    SqlValue::date(end),
                ],
            )
            .await
    }

    pub async fn delete_by_patient(&self, patient_id: Id) -> Result<u64, RepoError> {
        self.delete_by_patient_with(self.base.pool(), patient_id).await
    }

    /// Purge des dossiers d'un patient, au sein de la transaction de cascade.
    pub async fn delete_by_patient_with<'e, X>(
        &self,
        executor: X,
        patient_id: Id,
    ) -> Result<u64, RepoError>
    where
        X: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM medical_records WHERE patient_id = $1")
            .bind(patient_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_patch_normalizes_blank_text_to_null() {
        let patch = RecordUpdate {
            sub_category: Some(Some("  ".to_string())),
            details: Some(Some("Séance écourtée".to_string())),
            ..RecordUpdate::default()
        };
        // Même normalisation que le dépôt avant liaison des paramètres.
        assert_eq!(blank_to_none(patch.sub_category.unwrap()), None);
        assert_eq!(
            blank_to_none(patch.details.unwrap()),
            Some("Séance écourtée".to_string())
        );
    }
}
