// ============================================================================
// Retry avec backoff
// ============================================================================
// Tente la requête ; sur une erreur transitoire, attend un délai croissant
// et recommence, jusqu'à max_attempts. À l'épuisement, la dernière erreur
// est renvoyée à l'appelant.
//
// CONCEPTS RUST :
// 1. Générique sur une closure qui produit une Future (FnMut() -> Fut)
// 2. tokio::time::sleep : attente non-bloquante
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::error::ApiError;

/// Croissance du délai entre deux tentatives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// base × n
    Linear,
    /// base × 2^(n-1)
    Exponential,
}

/// Politique de retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives (1 = pas de retry)
    pub max_attempts: u32,

    /// Délai de base
    pub base_delay: Duration,

    /// Plafond du délai (y compris Retry-After)
    pub max_delay: Duration,

    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Délai à attendre après le n-ième échec (n commence à 1)
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let n = failed_attempt.max(1);
        let delay = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(n),
            Backoff::Exponential => {
                let factor = 2u32.checked_pow(n - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    /// Délai effectif pour une erreur donnée
    ///
    /// Un Retry-After plus long que le backoff calculé est respecté
    /// (dans la limite de max_delay)
    fn delay_after(&self, failed_attempt: u32, error: &ApiError) -> Duration {
        let computed = self.delay_for(failed_attempt);
        match error.retry_after() {
            Some(server_delay) => computed.max(server_delay).min(self.max_delay),
            None => computed,
        }
    }
}

/// Exécute `operation` avec la politique de retry
///
/// `label` sert uniquement aux logs (ex: "coins/markets")
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(label, attempt, max_attempts, "Sending request");

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt, &e);
                warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(label, attempt, error = %e, "Request failed, giving up");
                return Err(e);
            }
        }
    }
}
