//! Accès aux données. Chaque dépôt concret compose le dépôt générique
//! (`base`) avec ses requêtes spécifiques.

pub mod base;
pub mod medical_record;
pub mod patient;
pub mod user;
