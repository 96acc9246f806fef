// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : réponses CoinGecko (coins,
// fiche détaillée, recherche, statistiques globales, historique de prix)
// et état de présentation (tri, pagination)
// ============================================================================

pub mod coin;          // Ligne du tableau des marchés
pub mod coin_detail;   // Fiche détaillée d'un coin
pub mod global;        // Statistiques globales
pub mod market_chart;  // Historique de prix + période du graphique
pub mod pagination;    // Pages et ellipses du footer
pub mod search;        // Résultats de recherche
pub mod sort;          // Colonnes et sens de tri

// Re-export des structures principales
// Au lieu de : use coinvista::models::coin::Coin;
// On peut faire : use coinvista::models::Coin;
pub use coin::{Coin, SparklineData};
pub use coin_detail::{ChangePeriod, CoinDetails};
pub use global::GlobalData;
pub use market_chart::{MarketChart, PricePoint, Timespan};
pub use pagination::{PageItem, Pagination, DEFAULT_PER_PAGE, PER_PAGE_CHOICES};
pub use search::{SearchCoin, SearchResult, MAX_SUGGESTIONS};
pub use sort::{SortColumn, SortDirection, SortState};
