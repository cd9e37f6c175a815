//! Jetons de fraîcheur pour les chargements qui se succèdent
//!
//! Quand un filtre change alors qu'un chargement est en cours, la réponse
//! du chargement remplacé ne doit pas écraser celle du dernier. Chaque
//! chargement reçoit un jeton strictement croissant; seule la réponse
//! portant le dernier jeton émis est appliquée, les autres sont écartées.

use std::sync::atomic::{AtomicU64, Ordering};

/// Jeton d'un chargement en cours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken(u64);

/// Compteur monotone des chargements d'une vue
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

impl FetchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Émet le jeton du prochain chargement, invalidant tous les
    /// précédents
    pub fn issue(&self) -> FetchToken {
        FetchToken(self.latest.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Vrai si le jeton correspond toujours au dernier chargement émis
    pub fn is_current(&self, token: FetchToken) -> bool {
        self.latest.load(Ordering::Relaxed) == token.0
    }
}
