//! Couche HTTP : routeur, extracteurs d'authentification, gabarits de
//! réponse et handlers par entité.

pub mod handlers_patients;
pub mod handlers_records;
pub mod handlers_unauth;
pub mod handlers_users;
pub mod middlewares;
pub mod models;
pub mod responses;
pub mod router;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repositories::medical_record::MedicalRecordRepository;
use crate::repositories::patient::PatientRepository;
use crate::repositories::user::UserRepository;
use crate::services::auth::AuthService;
use crate::services::medical_record::MedicalRecordService;
use crate::services::patient::PatientService;
use crate::services::user::UserService;

/// État partagé injecté dans chaque handler. Construit une fois au
/// démarrage ; tout est clonable à bas coût (le pool est compté par
/// références).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub patients: PatientService,
    pub users: UserService,
    pub records: MedicalRecordService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let patient_repo = PatientRepository::new(pool.clone());
        let user_repo = UserRepository::new(pool.clone());
        let record_repo = MedicalRecordRepository::new(pool.clone());

        let auth = AuthService::new(user_repo.clone(), &config.jwt_secret, config.jwt_expires_in);
        let patients = PatientService::new(
            pool,
            patient_repo.clone(),
            user_repo.clone(),
            record_repo.clone(),
        );
        let users = UserService::new(user_repo);
        let records = MedicalRecordService::new(record_repo, patient_repo);

        Self {
            config: Arc::new(config),
            auth,
            patients,
            users,
            records,
        }
    }
}
