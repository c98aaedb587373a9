//! Règles métier des dossiers médicaux : champs obligatoires et existence
//! du patient référencé avant insertion.

use chrono::NaiveDate;
use log::info;

use crate::models::{Id, MedicalRecord, NewRecord, RecordUpdate};
use crate::repositories::medical_record::MedicalRecordRepository;
use crate::repositories::patient::PatientRepository;
use crate::services::ServiceError;

#[derive(Clone)]
pub struct MedicalRecordService {
    records: MedicalRecordRepository,
    patients: PatientRepository,
}

impl MedicalRecordService {
    pub fn new(records: MedicalRecordRepository, patients: PatientRepository) -> Self {
        Self { records, patients }
    }

    pub async fn get_all(&self) -> Result<Vec<MedicalRecord>, ServiceError> {
        Ok(self.records.find_all().await?)
    }

    pub async fn get_by_id(&self, id: Id) -> Result<MedicalRecord, ServiceError> {
        self.records.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn get_by_patient(&self, patient_id: Id) -> Result<Vec<MedicalRecord>, ServiceError> {
        self.ensure_patient_exists(patient_id).await?;
        Ok(self.records.find_by_patient(patient_id).await?)
    }

    pub async fn get_by_category(
        &self,
        patient_id: Id,
        category: &str,
    ) -> Result<Vec<MedicalRecord>, ServiceError> {
        Ok(self.records.find_by_category(patient_id, category).await?)
    }

    pub async fn get_by_category_and_sub_category(
        &self,
        patient_id: Id,
        category: &str,
        sub_category: &str,
    ) -> Result<Vec<MedicalRecord>, ServiceError> {
        Ok(self
            .records
            .find_by_category_and_sub_category(patient_id, category, sub_category)
            .await?)
    }

    pub async fn get_by_date_range(
        &self,
        patient_id: Id,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MedicalRecord>, ServiceError> {
        Ok(self.records.find_by_date_range(patient_id, start, end).await?)
    }

    /// Crée une entrée après contrôle des champs requis et de l'existence
    /// du patient. L'auteur est l'identité authentifiée de l'appelant.
    pub async fn create(
        &self,
        data: &NewRecord,
        created_by: Id,
    ) -> Result<MedicalRecord, ServiceError> {
        if data.patient_id <= 0 {
            return Err(ServiceError::Validation(
                "L'ID du patient est obligatoire".to_string(),
            ));
        }
        if data.category.trim().is_empty() {
            return Err(ServiceError::Validation("La catégorie est obligatoire".to_string()));
        }
        if data.date.is_none() {
            return Err(ServiceError::Validation("La date est obligatoire".to_string()));
        }
        self.ensure_patient_exists(data.patient_id).await?;

        let record = self.records.create(data, created_by).await?;
        info!(
            "Dossier {} créé pour le patient {} par l'utilisateur {}",
            record.id, record.patient_id, created_by
        );
        Ok(record)
    }

    pub async fn update(&self, id: Id, patch: &RecordUpdate) -> Result<MedicalRecord, ServiceError> {
        if let Some(category) = patch.category.as_deref() {
            if category.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "La catégorie est obligatoire".to_string(),
                ));
            }
        }
        self.get_by_id(id).await?;
        self.records.update(id, patch).await?.ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Id) -> Result<(), ServiceError> {
        if !self.records.delete(id).await? {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Purge tous les dossiers d'un patient. Également atteint par la
    /// cascade de suppression du patient, alors sous transaction.
    pub async fn delete_by_patient(&self, patient_id: Id) -> Result<u64, ServiceError> {
        Ok(self.records.delete_by_patient(patient_id).await?)
    }

    async fn ensure_patient_exists(&self, patient_id: Id) -> Result<(), ServiceError> {
        if self.patients.find_by_id(patient_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Patient avec l'ID {} non trouvé",
                patient_id
            )));
        }
        Ok(())
    }
}

fn not_found(id: Id) -> ServiceError {
    ServiceError::NotFound(format!("Enregistrement médical avec l'ID {} non trouvé", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Les contrôles de champs requis précèdent tout accès à la base, un
    // pool paresseux jamais connecté suffit donc ici.
    fn service() -> MedicalRecordService {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/dialyse_test").expect("lazy pool");
        MedicalRecordService::new(
            MedicalRecordRepository::new(pool.clone()),
            PatientRepository::new(pool),
        )
    }

    fn new_record() -> NewRecord {
        NewRecord {
            patient_id: 3,
            category: "Consultation".to_string(),
            sub_category: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 4),
            details: None,
        }
    }

    #[tokio::test]
    async fn create_requires_a_patient_reference() {
        let data = NewRecord {
            patient_id: 0,
            ..new_record()
        };
        let err = service().create(&data, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "L'ID du patient est obligatoire");
    }

    #[tokio::test]
    async fn create_requires_a_category() {
        let data = NewRecord {
            category: "   ".to_string(),
            ..new_record()
        };
        let err = service().create(&data, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "La catégorie est obligatoire");
    }

    #[tokio::test]
    async fn create_requires_a_date() {
        let data = NewRecord {
            date: None,
            ..new_record()
        };
        let err = service().create(&data, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "La date est obligatoire");
    }
}
