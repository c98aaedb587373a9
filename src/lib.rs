//! Backend REST de gestion des patients d'un centre de dialyse : comptes
//! soignants, patients et dossiers médicaux, derrière une authentification
//! par jeton et deux rôles (`admin`, `user`).

pub mod backend;
pub mod config;
pub mod consts;
pub mod db;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod utils;
