//! Règles métier des patients : validation à la création, unicité du CIN,
//! statistiques et cascade de suppression.

use std::str::FromStr;

use log::info;
use sqlx::PgPool;

use crate::models::{
    Id, NewPatient, Patient, PatientFilters, PatientUpdate, Statistics, TypePatient,
};
use crate::repositories::base::RepoError;
use crate::repositories::medical_record::MedicalRecordRepository;
use crate::repositories::patient::PatientRepository;
use crate::repositories::user::UserRepository;
use crate::services::ServiceError;
use crate::utils::validation::{validate_patient_data, Cin};

#[derive(Clone)]
pub struct PatientService {
    pool: PgPool,
    patients: PatientRepository,
    users: UserRepository,
    records: MedicalRecordRepository,
}

impl PatientService {
    pub fn new(
        pool: PgPool,
        patients: PatientRepository,
        users: UserRepository,
        records: MedicalRecordRepository,
    ) -> Self {
        Self {
            pool,
            patients,
            users,
            records,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Patient>, ServiceError> {
        Ok(self.patients.find_all().await?)
    }

    pub async fn get_by_id(&self, id: Id) -> Result<Patient, ServiceError> {
        self.patients
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn get_by_type(&self, type_patient: TypePatient) -> Result<Vec<Patient>, ServiceError> {
        Ok(self.patients.find_by_type(type_patient).await?)
    }

    pub async fn search(&self, filters: &PatientFilters) -> Result<Vec<Patient>, ServiceError> {
        Ok(self.patients.find_by_filters(filters).await?)
    }

    pub async fn get_by_ids(&self, ids: &[Id]) -> Result<Vec<Patient>, ServiceError> {
        Ok(self.patients.find_by_ids(ids).await?)
    }

    pub async fn create(&self, data: &NewPatient) -> Result<Patient, ServiceError> {
        let errors = validate_patient_data(data);
        if !errors.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Validation échouée: {}",
                errors.join(", ")
            )));
        }
        self.ensure_cin_free(data.cin, None).await?;

        let patient = self.patients.create(data).await?;
        info!("Patient {} créé (CIN {})", patient.id, patient.cin);
        Ok(patient)
    }

    pub async fn update(&self, id: Id, patch: &PatientUpdate) -> Result<Patient, ServiceError> {
        let existing = self.get_by_id(id).await?;

        // L'unicité du CIN n'est revérifiée que s'il change.
        if let Some(cin) = patch.cin {
            if cin != existing.cin {
                self.ensure_cin_free(cin, Some(id)).await?;
            }
        }

        self.patients
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Supprime un patient et tout ce qui s'y rattache, en une transaction :
    /// d'abord les références (listes d'assignation, dossiers médicaux),
    /// ensuite seulement la ligne elle-même.
    pub async fn delete(&self, id: Id) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let unassigned = self.users.remove_patient_from_all(&mut *tx, id).await?;
        let purged = self.records.delete_by_patient_with(&mut *tx, id).await?;
        let deleted = self.patients.delete_with(&mut *tx, id).await?;

        if !deleted {
            tx.rollback().await.map_err(RepoError::from)?;
            return Err(not_found(id));
        }

        tx.commit().await.map_err(RepoError::from)?;
        info!(
            "Patient {} supprimé ({} assignation(s) retirée(s), {} dossier(s) purgé(s))",
            id, unassigned, purged
        );
        Ok(())
    }

    pub async fn statistics(&self) -> Result<Statistics, ServiceError> {
        let rows = self.patients.count_by_type().await?;
        Ok(assemble_statistics(&rows))
    }

    async fn ensure_cin_free(&self, cin: Cin, exclude_id: Option<Id>) -> Result<(), ServiceError> {
        if self.patients.exists_by_cin(cin, exclude_id).await? {
            return Err(ServiceError::Conflict(format!(
                "Un patient avec le CIN {} existe déjà",
                cin
            )));
        }
        Ok(())
    }
}

fn not_found(id: Id) -> ServiceError {
    ServiceError::NotFound(format!("Patient avec l'ID {} non trouvé", id))
}

/// Assemble la répartition par type depuis les lignes du GROUP BY.
fn assemble_statistics(rows: &[(String, i64)]) -> Statistics {
    let mut stats = Statistics {
        total: 0,
        permanent: 0,
        vacancier: 0,
        fin_traitement: 0,
    };
    for (type_patient, count) in rows {
        stats.total += count;
        match TypePatient::from_str(type_patient) {
            Ok(TypePatient::Permanent) => stats.permanent += count,
            Ok(TypePatient::Vacancier) => stats.vacancier += count,
            Ok(TypePatient::FinTraitement) => stats.fin_traitement += count,
            Err(_) => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_sum_matches_the_breakdown() {
        let rows = vec![
            ("Permanent".to_string(), 12),
            ("Vacancier".to_string(), 3),
            ("Fin Traitement".to_string(), 5),
        ];
        let stats = assemble_statistics(&rows);
        assert_eq!(stats.total, 20);
        assert_eq!(stats.permanent, 12);
        assert_eq!(stats.vacancier, 3);
        assert_eq!(stats.fin_traitement, 5);
    }

    #[test]
    fn statistics_of_an_empty_fleet_are_zero() {
        let stats = assemble_statistics(&[]);
        assert_eq!(
            stats,
            Statistics {
                total: 0,
                permanent: 0,
                vacancier: 0,
                fin_traitement: 0,
            }
        );
    }

    mod db {
        use super::*;
        use crate::models::{GroupeSanguin, NewRecord, Role, Sexe};
        use crate::repositories::base::test_support::{test_pool, unique, unique_cin};
        use crate::utils::password;
        use chrono::NaiveDate;

        fn new_patient() -> NewPatient {
            NewPatient {
                nom_complet: "Leila Haddad".to_string(),
                cin: Cin::try_from(unique_cin()).unwrap(),
                ass_cnss: "CNSS-7710".to_string(),
                date_naissance: NaiveDate::from_ymd_opt(1950, 2, 14).unwrap(),
                sexe: Sexe::Femme,
                groupe_sanguin: GroupeSanguin::BPositif,
                profession: None,
                situation_familiale: None,
                telephone: None,
                telephone_urgence: None,
                adresse: None,
                date_debut: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
                type_patient: TypePatient::Permanent,
                date_fin: None,
                cause_fin: None,
            }
        }

        #[tokio::test]
        #[ignore]
        async fn deletion_cascade_cleans_assignments_and_records() {
            let pool = test_pool().await;
            let patients = PatientRepository::new(pool.clone());
            let users = UserRepository::new(pool.clone());
            let records = MedicalRecordRepository::new(pool.clone());
            let service = PatientService::new(
                pool.clone(),
                patients.clone(),
                users.clone(),
                records.clone(),
            );

            let patient = service.create(&new_patient()).await.unwrap();
            let other = service.create(&new_patient()).await.unwrap();

            let hash = password::hash("secret-solide");
            let user_a = users
                .create(&unique("test_a_"), &hash, Role::User, vec![patient.id])
                .await
                .unwrap();
            let user_b = users
                .create(&unique("test_b_"), &hash, Role::User, vec![patient.id, other.id])
                .await
                .unwrap();
            let record = records
                .create(
                    &NewRecord {
                        patient_id: patient.id,
                        category: "Consultation".to_string(),
                        sub_category: None,
                        date: NaiveDate::from_ymd_opt(2025, 3, 4),
                        details: None,
                    },
                    user_a.id,
                )
                .await
                .unwrap();

            service.delete(patient.id).await.unwrap();

            assert!(patients.find_by_id(patient.id).await.unwrap().is_none());
            assert!(records.find_by_id(record.id).await.unwrap().is_none());
            let user_a = users.find_by_id(user_a.id).await.unwrap().unwrap();
            assert!(user_a.assigned_patients.is_empty());
            let user_b = users.find_by_id(user_b.id).await.unwrap().unwrap();
            assert_eq!(
                user_b.assigned_patients,
                vec![other.id],
                "only the deleted patient leaves the list"
            );

            let err = service.delete(patient.id).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));

            users.delete(user_a.id).await.unwrap();
            users.delete(user_b.id).await.unwrap();
            service.delete(other.id).await.unwrap();
        }
    }
}
