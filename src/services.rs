//! Couche métier : validation, règles d'unicité, références croisées et
//! orchestration des cascades. Chaque service traduit l'absence ou le
//! conflit en erreur porteuse du message destiné au client.

pub mod auth;
pub mod medical_record;
pub mod patient;
pub mod throttle;
pub mod user;

use thiserror::Error;

use crate::repositories::base::RepoError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Donnée d'entrée invalide (400).
    #[error("{0}")]
    Validation(String),

    /// Valeur unique déjà prise (400).
    #[error("{0}")]
    Conflict(String),

    /// Entité absente (404).
    #[error("{0}")]
    NotFound(String),

    /// Identifiants refusés, message identique pour compte inconnu et
    /// mauvais mot de passe (401).
    #[error("Nom d'utilisateur ou mot de passe incorrect")]
    InvalidCredentials,

    /// Jeton altéré, expiré ou révoqué (401).
    #[error("Token invalide ou expiré")]
    InvalidToken,

    /// Verrouillage temporaire après échecs de connexion répétés (429).
    #[error("Trop de tentatives de connexion, réessayez plus tard")]
    TooManyAttempts,

    /// Défaillance de la couche d'accès aux données (500).
    #[error(transparent)]
    Repo(#[from] RepoError),
}
