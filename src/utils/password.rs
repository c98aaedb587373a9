//! Hachage et vérification des mots de passe

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHashString, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use once_cell::sync::Lazy;
use std::str::FromStr;

static DEFAULT_HASHER: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

/// Le hash d'un mot de passe vide, à utiliser quand l'utilisateur n'existe pas
/// pour éviter une attaque par canal auxiliaire
static EMPTY_HASH: Lazy<PasswordHashString> = Lazy::new(|| hash_phc(""));

fn hash_phc(password: &str) -> PasswordHashString {
    // Generate a random salt
    let salt = SaltString::generate(&mut OsRng);

    // Hash the password with Argon2id with the generated salt
    DEFAULT_HASHER
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .serialize()
}

/// Calcule un haché à partir d'un mot de passe en clair, en choisissant un
/// sel au hasard. Le résultat est la chaîne PHC stockée en base.
pub fn hash(password: &str) -> String {
    hash_phc(password).as_str().to_owned()
}

/// Vérifie si le mot de passe correspond au hash stocké.
///
/// Si un hash n'est pas fourni, on doit quand même tester
/// le mot de passe avec un faux hash pour éviter une timing
/// attack.
pub fn verify(password: &str, maybe_hash: Option<&str>) -> bool {
    let stored = maybe_hash.and_then(|h| PasswordHashString::from_str(h).ok());
    let hash = stored.as_ref().unwrap_or(&EMPTY_HASH);

    // Verify the password using Argon2's constant-time comparison
    DEFAULT_HASHER
        .verify_password(password.as_bytes(), &hash.password_hash())
        .is_ok()
}
