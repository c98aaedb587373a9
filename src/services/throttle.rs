//! Limitation des tentatives de connexion par nom d'utilisateur.
//!
//! Fenêtre glissante en mémoire : au-delà d'un quota d'échecs dans la
//! fenêtre, le nom est verrouillé jusqu'à expiration des échecs les plus
//! anciens. Une connexion réussie efface le compteur. L'horloge est passée
//! en paramètre pour garder la logique testable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct LoginThrottle {
    max_failures: u32,
    window: Duration,
    failures: HashMap<String, Vec<Instant>>,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
            failures: HashMap::new(),
        }
    }

    /// Le nom est-il verrouillé à l'instant donné ? Purge au passage les
    /// échecs sortis de la fenêtre.
    pub fn is_locked(&mut self, username: &str, now: Instant) -> bool {
        let Some(attempts) = self.failures.get_mut(username) else {
            return false;
        };
        attempts.retain(|at| now.duration_since(*at) < self.window);
        if attempts.is_empty() {
            self.failures.remove(username);
            return false;
        }
        attempts.len() as u32 >= self.max_failures
    }

    pub fn record_failure(&mut self, username: &str, now: Instant) {
        self.failures.entry(username.to_string()).or_default().push(now);
    }

    pub fn clear(&mut self, username: &str) {
        self.failures.remove(username);
    }
}
