// ============================================================================
// Erreurs de l'API
// ============================================================================
// Erreurs typées du client CoinGecko
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] génère Display
// - Les variants permettent à la boucle de retry de décider quoi retenter
// ============================================================================

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Erreur réseau (DNS, connexion refusée, coupure...)
    #[error("erreur réseau : {0}")]
    Network(String),

    /// La requête a dépassé le timeout configuré
    #[error("délai dépassé : {0}")]
    Timeout(String),

    /// HTTP 429 : trop de requêtes
    #[error("limite de requêtes atteinte (HTTP 429)")]
    RateLimited {
        /// Valeur de l'en-tête Retry-After, si présent
        retry_after: Option<Duration>,
    },

    /// HTTP 5xx
    #[error("erreur serveur (HTTP {status}) : {body}")]
    Server { status: u16, body: String },

    /// HTTP 404 (coin inconnu)
    #[error("ressource introuvable : {0}")]
    NotFound(String),

    /// Autres statuts 4xx
    #[error("erreur HTTP {status} : {body}")]
    Http { status: u16, body: String },

    /// Le JSON ne correspond pas à la structure attendue
    #[error("réponse JSON invalide : {0}")]
    Decode(String),

    /// Paramètre invalide, détecté avant tout appel réseau
    #[error("paramètre invalide : {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Indique si la requête peut être retentée
    ///
    /// - réseau, timeout, 429 et 5xx : oui (erreurs transitoires)
    /// - autres 4xx, JSON invalide, paramètre invalide : non
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Timeout(_)
                | ApiError::RateLimited { .. }
                | ApiError::Server { .. }
        )
    }

    /// Délai imposé par le serveur (Retry-After), s'il y en a un
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Construit l'erreur correspondant à un statut HTTP non-2xx
    pub fn from_status(status: StatusCode, body: String, retry_after: Option<Duration>) -> Self {
        let code = status.as_u16();
        match code {
            429 => ApiError::RateLimited { retry_after },
            404 => ApiError::NotFound(body),
            500..=599 => ApiError::Server { status: code, body },
            _ => ApiError::Http { status: code, body },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        let e = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new(), None);
        assert!(matches!(e, ApiError::RateLimited { retry_after: None }));
        assert!(e.is_retryable());

        let e = ApiError::from_status(StatusCode::BAD_GATEWAY, "oops".to_string(), None);
        assert!(matches!(e, ApiError::Server { status: 502, .. }));
        assert!(e.is_retryable());

        let e = ApiError::from_status(StatusCode::NOT_FOUND, "coin not found".to_string(), None);
        assert!(matches!(e, ApiError::NotFound(_)));
        assert!(!e.is_retryable());

        let e = ApiError::from_status(StatusCode::UNAUTHORIZED, String::new(), None);
        assert!(matches!(e, ApiError::Http { status: 401, .. }));
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let e = ApiError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(e.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(ApiError::Timeout("t".to_string()).retry_after(), None);
    }
}
