// ============================================================================
// CoinVista - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;    // Client CoinGecko (retry, cache, erreurs)
pub mod app;    // État de l'application
pub mod config; // Arguments CLI + variables d'environnement
pub mod models; // Structures de données
pub mod ui;     // Interface utilisateur
