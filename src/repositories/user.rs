//! Dépôt des comptes : CRUD générique, unicité du nom d'utilisateur et
//! mutations atomiques de la liste de patients assignés.
//!
//! Les opérations sur le tableau `assigned_patients` s'appuient sur
//! `array_append`/`array_remove` évaluées côté base, pour que deux requêtes
//! concurrentes ne puissent ni dupliquer ni perdre une assignation.

use sqlx::{Executor, PgPool, Postgres};

use crate::models::{Id, Role, User, UserUpdate};
use crate::repositories::base::{BaseRepository, Field, RepoError, SqlValue};
use crate::schema::{user_from_row, UserRow};

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository<UserRow, User>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseRepository::new(pool, "users", user_from_row),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        self.base.find_all().await
    }

    pub async fn find_by_id(&self, id: Id) -> Result<Option<User>, RepoError> {
        self.base.find_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.base
            .fetch_optional_with(
                "SELECT * FROM users WHERE username = $1",
                &[SqlValue::text(username)],
            )
            .await
    }

    pub async fn find_by_role(&self, role: Role) -> Result<Vec<User>, RepoError> {
        self.base
            .fetch_with(
                "SELECT * FROM users WHERE role = $1 ORDER BY username",
                &[SqlValue::text(role.to_string())],
            )
            .await
    }

    /// Insère un compte déjà validé, mot de passe haché en amont.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        assigned_patients: Vec<Id>,
    ) -> Result<User, RepoError> {
        self.base
            .insert(vec![
                ("username", Some(SqlValue::text(username))),
                ("password_hash", Some(SqlValue::text(password_hash))),
                ("role", Some(SqlValue::text(role.to_string()))),
                ("assigned_patients", Some(SqlValue::big_int_array(assigned_patients))),
            ])
            .await
    }

    /// Mise à jour partielle. Le mot de passe éventuel du correctif est
    /// traité à part par le service (hachage et révocation des jetons).
    pub async fn update(&self, id: Id, patch: &UserUpdate) -> Result<Option<User>, RepoError> {
        let fields: Vec<Field> = vec![
            ("username", patch.username.as_deref().map(SqlValue::text)),
            ("role", patch.role.map(|r| SqlValue::text(r.to_string()))),
            (
                "assigned_patients",
                patch.assigned_patients.clone().map(SqlValue::big_int_array),
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

    pub async fn exists_by_username(
        &self,
        username: &str,
        exclude_id: Option<Id>,
    ) -> Result<bool, RepoError> {
        let exists = match exclude_id {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
                )
                .bind(username)
                .bind(id)
                .fetch_one(self.base.pool())
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                    .bind(username)
                    .fetch_one(self.base.pool())
                    .await?
            }
        };
        Ok(exists)
    }

    /// Remplace intégralement la liste des patients assignés.
    pub async fn update_assigned_patients(
        &self,
        id: Id,
        patient_ids: &[Id],
    ) -> Result<Option<User>, RepoError> {
        self.base
            .update(
                vec![(
                    "assigned_patients",
                    Some(SqlValue::big_int_array(patient_ids.to_vec())),
                )],
                id,
            )
            .await
    }

    /// Ajoute un patient à la liste s'il n'y figure pas déjà. La garde est
    /// évaluée dans le WHERE, donc côté base : pas de doublon possible.
    pub async fn add_assigned_patient(
        &self,
        id: Id,
        patient_id: Id,
    ) -> Result<Option<User>, RepoError> {
        let updated = self
            .base
            .fetch_optional_with(
                "UPDATE users SET assigned_patients = array_append(assigned_patients, $1) \
                 WHERE id = $2 AND NOT ($1 = ANY(assigned_patients)) RETURNING *",
                &[SqlValue::big_int(patient_id), SqlValue::big_int(id)],
            )
            .await?;
        match updated {
            Some(user) => Ok(Some(user)),
            // Patient déjà présent ou compte inexistant : on relit la ligne.
            None => self.base.find_by_id(id).await,
        }
    }

    /// Retire un patient de la liste. Retirer un absent est un non-événement.
    pub async fn remove_assigned_patient(
        &self,
        id: Id,
        patient_id: Id,
    ) -> Result<Option<User>, RepoError> {
        self.base
            .fetch_optional_with(
                "UPDATE users SET assigned_patients = array_remove(assigned_patients, $1) \
                 WHERE id = $2 RETURNING *",
                &[SqlValue::big_int(patient_id), SqlValue::big_int(id)],
            )
            .await
    }

    /// Retire un patient de toutes les listes d'assignation en une seule
    /// requête. Invoqué dans la transaction de suppression d'un patient.
    pub async fn remove_patient_from_all<'e, X>(
        &self,
        executor: X,
        patient_id: Id,
    ) -> Result<u64, RepoError>
    where
        X: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE users SET assigned_patients = array_remove(assigned_patients, $1) \
             WHERE $1 = ANY(assigned_patients)",
        )
        .bind(patient_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Change le hachage du mot de passe et incrémente la version de jeton,
    /// ce qui révoque tous les jetons déjà émis pour ce compte.
    pub async fn update_password(
        &self,
        id: Id,
        password_hash: &str,
    ) -> Result<Option<User>, RepoError> {
        self.base
            .fetch_optional_with(
                "UPDATE users SET password_hash = $1, token_version = token_version + 1 \
                 WHERE id = $2 RETURNING *",
                &[SqlValue::text(password_hash), SqlValue::big_int(id)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::base::test_support::{test_pool, unique};
    use crate::utils::password;

    async fn create_user(repo: &UserRepository, role: Role) -> User {
        repo.create(&unique("test_user_"), &password::hash("motdepasse"), role, vec![])
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn assigned_patient_add_is_idempotent() {
        let repo = UserRepository::new(test_pool().await);
        let user = create_user(&repo, Role::User).await;

        let user = repo.add_assigned_patient(user.id, 41).await.unwrap().unwrap();
        assert_eq!(user.assigned_patients, vec![41]);

        let user = repo.add_assigned_patient(user.id, 41).await.unwrap().unwrap();
        assert_eq!(user.assigned_patients, vec![41], "double add must not duplicate");

        let user = repo.add_assigned_patient(user.id, 42).await.unwrap().unwrap();
        assert_eq!(user.assigned_patients, vec![41, 42]);

        repo.delete(user.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn removing_an_absent_patient_is_a_noop() {
        let repo = UserRepository::new(test_pool().await);
        let user = create_user(&repo, Role::User).await;

        let user = repo.remove_assigned_patient(user.id, 999).await.unwrap().unwrap();
        assert!(user.assigned_patients.is_empty());

        repo.delete(user.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn password_update_bumps_the_token_version() {
        let repo = UserRepository::new(test_pool().await);
        let user = create_user(&repo, Role::User).await;
        let before = user.token_version;

        let user = repo
            .update_password(user.id, &password::hash("nouveau-secret"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.token_version, before + 1);

        repo.delete(user.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn username_uniqueness_probe_can_exclude_self() {
        let repo = UserRepository::new(test_pool().await);
        let user = create_user(&repo, Role::User).await;

        assert!(repo.exists_by_username(&user.username, None).await.unwrap());
        assert!(!repo.exists_by_username(&user.username, Some(user.id)).await.unwrap());

        repo.delete(user.id).await.unwrap();
    }
}
