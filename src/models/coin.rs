// ============================================================================
// Structure : Coin
// ============================================================================
// Une ligne du tableau des marchés (endpoint /coins/markets de CoinGecko)
//
// CONCEPTS RUST :
// 1. Option<T> : CoinGecko renvoie souvent null (rank, variations, volume)
// 2. #[serde(default)] : tolère les champs absents du JSON
// ============================================================================

use serde::{Deserialize, Serialize};

/// Historique de prix sur 7 jours (sparkline)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparklineData {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Un coin tel que renvoyé par /coins/markets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Identifiant CoinGecko (ex: "bitcoin"), utilisé pour la vue détail
    pub id: String,

    /// Symbole (ex: "btc")
    pub symbol: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// URL du logo
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub current_price: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub total_volume: Option<f64>,

    #[serde(default)]
    pub high_24h: Option<f64>,

    #[serde(default)]
    pub low_24h: Option<f64>,

    #[serde(default)]
    pub circulating_supply: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_30d_in_currency: Option<f64>,

    /// Prix sur 7 jours (présent car on demande sparkline=true)
    #[serde(default)]
    pub sparkline_in_7d: Option<SparklineData>,
}

impl Coin {
    /// Retourne la série de prix du sparkline (vide si absente)
    pub fn sparkline(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }

    /// true si la variation 7 jours est strictement positive
    ///
    /// Détermine la couleur du sparkline : vert si hausse, rouge sinon
    pub fn is_positive_7d(&self) -> bool {
        self.price_change_percentage_7d_in_currency
            .map(|c| c > 0.0)
            .unwrap_or(false)
    }

    /// Symbole en majuscules pour l'affichage
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Construit un coin minimal pour les tests (tri, rendu, pagination)
    pub(crate) fn sample_coin(id: &str, rank: u32, price: f64, market_cap: f64) -> Coin {
        Coin {
            id: id.to_string(),
            symbol: id.chars().take(3).collect(),
            name: id.to_string(),
            image: None,
            current_price: Some(price),
            market_cap: Some(market_cap),
            market_cap_rank: Some(rank),
            total_volume: Some(market_cap / 10.0),
            high_24h: None,
            low_24h: None,
            circulating_supply: None,
            price_change_percentage_1h_in_currency: Some(0.1),
            price_change_percentage_24h_in_currency: Some(-1.0),
            price_change_percentage_7d_in_currency: Some(2.5),
            price_change_percentage_30d_in_currency: None,
            sparkline_in_7d: Some(SparklineData {
                price: vec![price * 0.9, price, price * 1.1],
            }),
        }
    }

    #[test]
    fn test_deserialize_markets_row() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 67123.45,
            "market_cap": 1320000000000,
            "market_cap_rank": 1,
            "total_volume": 35000000000,
            "high_24h": 68000.0,
            "low_24h": 66000.0,
            "circulating_supply": 19700000.0,
            "price_change_percentage_1h_in_currency": 0.12,
            "price_change_percentage_24h_in_currency": -1.5,
            "price_change_percentage_7d_in_currency": 3.4,
            "sparkline_in_7d": { "price": [65000.0, 66000.5, 67123.45] }
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.sparkline().len(), 3);
        assert!(coin.is_positive_7d());
        assert_eq!(coin.display_symbol(), "BTC");
        assert!(coin.price_change_percentage_30d_in_currency.is_none());
    }

    #[test]
    fn test_deserialize_nulls() {
        // Les petits coins ont souvent rank/volume à null
        let json = r#"{
            "id": "tiny",
            "symbol": "tny",
            "name": "Tiny",
            "current_price": null,
            "market_cap_rank": null,
            "price_change_percentage_7d_in_currency": null
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert!(coin.current_price.is_none());
        assert!(coin.sparkline().is_empty());
        assert!(!coin.is_positive_7d());
    }
}
