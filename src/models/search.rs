// ============================================================================
// Structure : SearchResult
// ============================================================================
// Réponse de l'endpoint /search (on ne garde que la liste "coins",
// CoinGecko renvoie aussi exchanges, categories, nfts... ignorés par serde)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Nombre maximum de suggestions affichées sous le champ de recherche
pub const MAX_SUGGESTIONS: usize = 8;

/// Un coin trouvé par la recherche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub coins: Vec<SearchCoin>,
}

impl SearchResult {
    /// Résultat vide (requête vide : pas d'appel réseau)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Les suggestions à afficher (8 au maximum)
    pub fn suggestions(&self) -> &[SearchCoin] {
        let n = self.coins.len().min(MAX_SUGGESTIONS);
        &self.coins[..n]
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_search_ignores_other_sections() {
        let json = r#"{
            "coins": [
                { "id": "bitcoin", "name": "Bitcoin", "api_symbol": "bitcoin",
                  "symbol": "BTC", "market_cap_rank": 1, "thumb": "https://x/thumb.png" },
                { "id": "wrapped-bitcoin", "name": "Wrapped Bitcoin",
                  "symbol": "WBTC", "market_cap_rank": null }
            ],
            "exchanges": [],
            "categories": [{ "id": 1, "name": "x" }]
        }"#;

        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.coins.len(), 2);
        assert_eq!(result.coins[0].market_cap_rank, Some(1));
        assert_eq!(result.coins[1].market_cap_rank, None);
    }

    #[test]
    fn test_suggestions_capped() {
        let coins = (0..12)
            .map(|i| SearchCoin {
                id: format!("coin-{}", i),
                name: format!("Coin {}", i),
                symbol: format!("C{}", i),
                market_cap_rank: Some(i + 1),
                thumb: None,
            })
            .collect();

        let result = SearchResult { coins };
        assert_eq!(result.suggestions().len(), MAX_SUGGESTIONS);
        assert_eq!(result.suggestions()[0].id, "coin-0");
        assert!(SearchResult::empty().suggestions().is_empty());
    }
}
