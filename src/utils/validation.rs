//! Validation des entrées utilisateur : identifiants, mots de passe et
//! données patient. Les messages sont ceux affichés par le frontend.

use derive_more::derive::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};
use crate::models::NewPatient;

// Regex for username: starts with a letter, then letters/digits/._-
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]{2,49}$").expect("Failed to compile username regex")
});

/// Valeur maximale d'un CIN à huit chiffres.
pub const MAX_CIN: i64 = 99_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("CIN invalide: {0}")]
    Cin(i64),
}

/// Numéro de carte d'identité nationale.
///
/// Huit chiffres au plus ; les zéros de tête disparaissent dans la
/// représentation numérique, les valeurs plus courtes restent donc admises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
#[display("{_0}")]
pub struct Cin(i64);

impl Cin {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Cin {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value > 0 && value <= MAX_CIN {
            Ok(Self(value))
        } else {
            Err(ValidationError::Cin(value))
        }
    }
}

impl From<Cin> for i64 {
    fn from(cin: Cin) -> Self {
        cin.0
    }
}

/// Vérifie la forme d'un nom d'utilisateur. Retourne le message d'erreur
/// destiné au client en cas de rejet.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(format!(
            "Le nom d'utilisateur doit contenir au moins {} caractères",
            MIN_USERNAME_LENGTH
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Le nom d'utilisateur ne peut pas dépasser {} caractères",
            MAX_USERNAME_LENGTH
        ));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err("Le nom d'utilisateur contient des caractères invalides".to_string());
    }
    Ok(())
}

/// Vérifie la politique de mots de passe.
pub fn validate_password(password: &str, username: &str) -> Result<(), String> {
    // First check: password should not be the same as username
    if password.eq_ignore_ascii_case(username) {
        return Err("Le mot de passe ne peut pas être identique au nom d'utilisateur".to_string());
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Le mot de passe doit contenir au moins {} caractères",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Le mot de passe ne peut pas dépasser {} caractères",
            MAX_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Contrôles sémantiques à la création d'un patient. Les champs requis
/// portés par le typage (dates, énumérations, CIN) sont déjà garantis ;
/// restent les textes qui ne doivent pas être blancs.
pub fn validate_patient_data(patient: &NewPatient) -> Vec<String> {
    let mut errors = Vec::new();
    if patient.nom_complet.trim().is_empty() {
        errors.push("Le nom complet est obligatoire".to_string());
    }
    if patient.ass_cnss.trim().is_empty() {
        errors.push("Le numéro Ass-CNSS est obligatoire".to_string());
    }
    errors
}

/// Normalise un champ texte optionnel : chaîne vide ou blanche => `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
