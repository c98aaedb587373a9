//! Authentification : vérification des identifiants, émission et contrôle
//! des jetons JWT, changement de mot de passe.
//!
//! Le chemin d'échec de connexion est uniforme : compte inconnu et mauvais
//! mot de passe produisent le même message et le même coût de vérification
//! Argon2, pour ne pas permettre l'énumération des comptes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::consts::{LOGIN_ATTEMPT_WINDOW, MAX_LOGIN_ATTEMPTS};
use crate::models::{Id, Role, User};
use crate::repositories::user::UserRepository;
use crate::services::throttle::LoginThrottle;
use crate::services::ServiceError;
use crate::utils::password;
use crate::utils::validation::validate_password;

/// Contenu signé d'un jeton. `token_version` lie le jeton à l'état du
/// compte au moment de l'émission : un changement de mot de passe
/// incrémente la version en base et invalide tous les jetons antérieurs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Id,
    pub username: String,
    pub role: Role,
    pub token_version: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: Duration,
    throttle: Arc<Mutex<LoginThrottle>>,
}

impl AuthService {
    pub fn new(users: UserRepository, secret: &str, expires_in: Duration) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            throttle: Arc::new(Mutex::new(LoginThrottle::new(
                MAX_LOGIN_ATTEMPTS,
                LOGIN_ATTEMPT_WINDOW,
            ))),
        }
    }

    /// Vérifie les identifiants et émet un jeton. Les échecs alimentent le
    /// compteur de limitation ; un succès l'efface.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), ServiceError> {
        let now = Instant::now();
        if self.throttle().is_locked(username, now) {
            warn!("Connexion verrouillée pour {}", username);
            return Err(ServiceError::TooManyAttempts);
        }

        let user = self.users.find_by_username(username).await?;
        // La vérification tourne aussi quand le compte n'existe pas, contre
        // un haché factice, pour garder un temps de réponse uniforme.
        let verified = password::verify(password, user.as_ref().map(|u| u.password_hash.as_str()));

        let Some(user) = user.filter(|_| verified) else {
            self.throttle().record_failure(username, now);
            return Err(ServiceError::InvalidCredentials);
        };

        self.throttle().clear(username);
        let token = self.generate_token(&user)?;
        info!("Connexion réussie pour {}", user.username);
        Ok((user, token))
    }

    /// Change le mot de passe après revérification de l'ancien. La version
    /// de jeton est incrémentée en base : les jetons déjà émis meurent.
    pub async fn change_password(
        &self,
        user_id: Id,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Utilisateur non trouvé".to_string()))?;

        if !password::verify(old_password, Some(&user.password_hash)) {
            return Err(ServiceError::Validation("Ancien mot de passe incorrect".to_string()));
        }
        validate_password(new_password, &user.username).map_err(ServiceError::Validation)?;

        self.users
            .update_password(user_id, &password::hash(new_password))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Utilisateur non trouvé".to_string()))?;
        info!("Mot de passe changé pour {}", user.username);
        Ok(())
    }

    pub fn generate_token(&self, user: &User) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            token_version: user.token_version,
            iat: now.timestamp(),
            exp: (now + self.expires_in).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| ServiceError::InvalidToken)
    }

    /// Contrôle signature et expiration. Toute anomalie se réduit au même
    /// message côté client.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServiceError::InvalidToken)
    }

    /// Le compte désigné par le jeton doit toujours exister et ne pas avoir
    /// changé de mot de passe depuis l'émission.
    pub async fn validate_user(&self, claims: &Claims) -> Result<User, ServiceError> {
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(ServiceError::InvalidToken)?;
        if user.token_version != claims.token_version {
            return Err(ServiceError::InvalidToken);
        }
        Ok(user)
    }

    fn throttle(&self) -> MutexGuard<'_, LoginThrottle> {
        self.throttle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    /// Pool paresseux : aucun test de jeton ne touche la base.
    fn auth(secret: &str, expires_in: Duration) -> AuthService {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/dialyse_test")
            .expect("lazy pool");
        AuthService::new(UserRepository::new(pool), secret, expires_in)
    }

    fn sample_user(token_version: i32) -> User {
        User {
            id: 7,
            username: "medecin1".to_string(),
            password_hash: password::hash("motdepasse"),
            role: Role::User,
            assigned_patients: vec![5, 6],
            token_version,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn token_roundtrips_its_claims() {
        let auth = auth("secret-de-test", Duration::hours(24));
        let user = sample_user(3);

        let token = auth.generate_token(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "medecin1");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.token_version, 3);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // Au-delà de la tolérance de 60 s du décodeur.
        let auth = auth("secret-de-test", Duration::seconds(-120));
        let token = auth.generate_token(&sample_user(0)).unwrap();
        assert!(matches!(auth.verify_token(&token), Err(ServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let auth = auth("secret-de-test", Duration::hours(1));
        let token = auth.generate_token(&sample_user(0)).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(auth.verify_token(&tampered).is_err());
    }

    #[tokio::test]
    async fn token_from_another_secret_is_rejected() {
        let issuer = auth("premier-secret", Duration::hours(1));
        let verifier = auth("autre-secret", Duration::hours(1));
        let token = issuer.generate_token(&sample_user(0)).unwrap();
        assert!(matches!(verifier.verify_token(&token), Err(ServiceError::InvalidToken)));
    }
}
