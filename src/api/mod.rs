// ============================================================================
// Module : api
// ============================================================================
// Client de l'API CoinGecko : requêtes HTTP, retry avec backoff,
// cache court terme des réponses et erreurs typées
// ============================================================================

pub mod cache;      // Cache LRU + TTL en mémoire
pub mod coingecko;  // Client API CoinGecko
pub mod error;      // ApiError
pub mod retry;      // Politique de retry + boucle

// Re-export des types principaux
pub use coingecko::{ApiKeyKind, ClientSettings, CoinGeckoClient, DEFAULT_BASE_URL, PRO_BASE_URL};
pub use error::ApiError;
pub use retry::{Backoff, RetryPolicy};
