//! Chargement de la configuration depuis les variables d'environnement.
//! Les variables obligatoires font échouer le démarrage avec un message
//! explicite plutôt que de laisser le serveur tourner à moitié configuré.

use anyhow::{anyhow, bail, Result};
use chrono::Duration;

use crate::consts::{DEFAULT_CORS_ORIGIN, DEFAULT_HTTP_PORT};

#[derive(Debug, Clone)]
pub struct Config {
    pub env: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub cors_origin: String,
}

impl Config {
    /// Lit la configuration complète depuis l'environnement.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            env: optional("APP_ENV", "development"),
            port: optional("PORT", "")
                .parse()
                .unwrap_or(DEFAULT_HTTP_PORT),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expires_in: parse_duration(&optional("JWT_EXPIRES_IN", "24h"))?,
            cors_origin: optional("CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("Variable d'environnement {} non définie", name))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Interprète une durée du style `24h`, `7d`, `30m` ou un nombre de secondes.
fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, ""),
    };
    let amount: i64 = digits
        .parse()
        .map_err(|_| anyhow!("Durée invalide: {}", raw))?;
    match unit {
        "d" => Ok(Duration::days(amount)),
        "h" => Ok(Duration::hours(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "s" | "" => Ok(Duration::seconds(amount)),
        _ => bail!("Durée invalide: {}", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
    }

    #[test]
    fn parse_duration_defaults_to_seconds() {
        assert_eq!(parse_duration("3600").unwrap(), Duration::seconds(3600));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("bientôt").is_err(), "words are not durations");
        assert!(parse_duration("24x").is_err(), "unknown unit should fail");
        assert!(parse_duration("").is_err(), "empty string should fail");
    }
}
