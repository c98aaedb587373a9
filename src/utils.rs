//! Utilitaires partagés : hachage des mots de passe et validation d'entrées.

pub mod password;
pub mod validation;
