//! Règles métier des comptes : politique de nom d'utilisateur et de mot de
//! passe, unicité, et opérations sur la liste de patients assignés.

use log::info;

use crate::models::{Id, NewUser, Role, User, UserUpdate};
use crate::repositories::user::UserRepository;
use crate::services::ServiceError;
use crate::utils::password;
use crate::utils::validation::{validate_password, validate_username};

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn get_all(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn get_by_id(&self, id: Id) -> Result<User, ServiceError> {
        self.users.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Utilisateur {} non trouvé", username))
            })
    }

    pub async fn get_by_role(&self, role: Role) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_by_role(role).await?)
    }

    pub async fn create(&self, data: &NewUser) -> Result<User, ServiceError> {
        validate_username(&data.username).map_err(ServiceError::Validation)?;
        validate_password(&data.password, &data.username).map_err(ServiceError::Validation)?;
        self.ensure_username_free(&data.username, None).await?;

        let hash = password::hash(&data.password);
        let user = self
            .users
            .create(
                &data.username,
                &hash,
                data.role,
                data.assigned_patients.clone().unwrap_or_default(),
            )
            .await?;
        info!("Compte {} créé (rôle {})", user.username, user.role);
        Ok(user)
    }

    pub async fn update(&self, id: Id, patch: &UserUpdate) -> Result<User, ServiceError> {
        let existing = self.get_by_id(id).await?;

        if let Some(username) = patch.username.as_deref() {
            validate_username(username).map_err(ServiceError::Validation)?;
            if username != existing.username {
                self.ensure_username_free(username, Some(id)).await?;
            }
        }

        // Un mot de passe dans le correctif passe par la politique complète
        // et révoque les jetons émis avant le changement.
        if let Some(new_password) = patch.password.as_deref() {
            let username = patch.username.as_deref().unwrap_or(&existing.username);
            validate_password(new_password, username).map_err(ServiceError::Validation)?;
            self.users
                .update_password(id, &password::hash(new_password))
                .await?
                .ok_or_else(|| not_found(id))?;
        }

        self.users.update(id, patch).await?.ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Id) -> Result<(), ServiceError> {
        if !self.users.delete(id).await? {
            return Err(not_found(id));
        }
        info!("Compte {} supprimé", id);
        Ok(())
    }

    /// Remplace la liste complète des patients assignés.
    pub async fn assign_patients(&self, id: Id, patient_ids: &[Id]) -> Result<User, ServiceError> {
        self.users
            .update_assigned_patients(id, patient_ids)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn add_assigned_patient(&self, id: Id, patient_id: Id) -> Result<User, ServiceError> {
        self.users
            .add_assigned_patient(id, patient_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn remove_assigned_patient(
        &self,
        id: Id,
        patient_id: Id,
    ) -> Result<User, ServiceError> {
        self.users
            .remove_assigned_patient(id, patient_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn ensure_username_free(
        &self,
        username: &str,
        exclude_id: Option<Id>,
    ) -> Result<(), ServiceError> {
        if self.users.exists_by_username(username, exclude_id).await? {
            return Err(ServiceError::Conflict(format!(
                "Le nom d'utilisateur {} existe déjà",
                username
            )));
        }
        Ok(())
    }
}

fn not_found(id: Id) -> ServiceError {
    ServiceError::NotFound(format!("Utilisateur avec l'ID {} non trouvé", id))
}
