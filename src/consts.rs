//! Définition des constantes globales pour l'application.

use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 3000; // Port par défaut pour le serveur HTTP.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173"; // Origine du frontend en développement.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // Taille maximale d'une requête JSON (10 Mo).

pub const MIN_USERNAME_LENGTH: usize = 3; // Longueur minimale d'un nom d'utilisateur.
pub const MAX_USERNAME_LENGTH: usize = 50; // Longueur maximale d'un nom d'utilisateur.
pub const MIN_PASSWORD_LENGTH: usize = 8; // Longueur minimale d'un mot de passe.
pub const MAX_PASSWORD_LENGTH: usize = 64; // Longueur maximale d'un mot de passe.

pub const MAX_LOGIN_ATTEMPTS: u32 = 5; // Nombre d'échecs de connexion tolérés par fenêtre.
pub const LOGIN_ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60); // Fenêtre de comptage des échecs.

pub const DB_MAX_CONNECTIONS: u32 = 20; // Taille maximale du pool PostgreSQL.
pub const DB_IDLE_TIMEOUT: Duration = Duration::from_secs(30); // Fermeture des connexions inactives.
pub const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2); // Attente maximale d'une connexion.
pub const DB_STATEMENT_TIMEOUT: &str = "30s"; // Durée maximale d'une requête côté serveur.
