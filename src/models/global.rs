// ============================================================================
// Structure : GlobalData
// ============================================================================
// Statistiques globales du marché (endpoint /global)
// active_cryptocurrencies sert de total pour la pagination
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Enveloppe JSON : CoinGecko renvoie { "data": { ... } }
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalData {
    #[serde(default)]
    pub active_cryptocurrencies: u64,

    #[serde(default)]
    pub markets: Option<u64>,

    #[serde(default)]
    pub total_market_cap: HashMap<String, f64>,

    #[serde(default)]
    pub total_volume: HashMap<String, f64>,

    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: Option<f64>,
}

impl GlobalData {
    pub fn total_market_cap_in(&self, currency: &str) -> Option<f64> {
        self.total_market_cap.get(currency).copied()
    }

    pub fn total_volume_in(&self, currency: &str) -> Option<f64> {
        self.total_volume.get(currency).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_global() {
        let json = r#"{
            "data": {
                "active_cryptocurrencies": 14512,
                "upcoming_icos": 0,
                "markets": 1190,
                "total_market_cap": { "usd": 2450000000000.0, "eur": 2250000000000.0 },
                "total_volume": { "usd": 98000000000.0 },
                "market_cap_change_percentage_24h_usd": -0.85,
                "updated_at": 1729150000
            }
        }"#;

        let response: GlobalResponse = serde_json::from_str(json).unwrap();
        let global = response.data;
        assert_eq!(global.active_cryptocurrencies, 14512);
        assert_eq!(global.markets, Some(1190));
        assert_eq!(global.total_market_cap_in("usd"), Some(2450000000000.0));
        assert_eq!(global.total_volume_in("eur"), None);
    }
}
