// ============================================================================
// Structure : CoinDetails
// ============================================================================
// Fiche complète d'un coin (endpoint /coins/{id})
//
// Les montants de market_data sont indexés par devise ("usd", "eur", ...)
// d'où les HashMap<String, f64>
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::coin::SparklineData;

/// Nombre de phrases gardées pour le résumé de la description
const SUMMARY_SENTENCES: usize = 5;

/// Fiche détaillée d'un coin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinDetails {
    pub id: String,
    pub symbol: String,
    pub name: String,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub market_data: Option<MarketData>,

    #[serde(default)]
    pub links: Option<Links>,

    #[serde(default)]
    pub description: Option<Description>,
}

/// Données de marché de la fiche détaillée
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,

    #[serde(default)]
    pub market_cap: HashMap<String, f64>,

    #[serde(default)]
    pub total_volume: HashMap<String, f64>,

    #[serde(default)]
    pub circulating_supply: Option<f64>,

    #[serde(default)]
    pub total_supply: Option<f64>,

    #[serde(default)]
    pub max_supply: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_7d: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_30d: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_60d: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_1y: Option<f64>,

    #[serde(default)]
    pub price_change_percentage_1h_in_currency: HashMap<String, f64>,

    #[serde(default)]
    pub price_change_percentage_24h_in_currency: HashMap<String, f64>,

    #[serde(default)]
    pub sparkline_7d: Option<SparklineData>,
}

/// Liens externes (site, explorer, réseaux)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub homepage: Vec<String>,

    #[serde(default)]
    pub blockchain_site: Vec<String>,

    #[serde(default)]
    pub subreddit_url: Option<String>,

    #[serde(default)]
    pub twitter_screen_name: Option<String>,
}

/// Description localisée (on n'utilise que l'anglais)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: Option<String>,
}

/// Périodes de variation affichées dans la fiche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePeriod {
    H1,
    H24,
    D7,
    D30,
    D60,
    Y1,
}

impl ChangePeriod {
    pub const ALL: [ChangePeriod; 6] = [
        ChangePeriod::H1,
        ChangePeriod::H24,
        ChangePeriod::D7,
        ChangePeriod::D30,
        ChangePeriod::D60,
        ChangePeriod::Y1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChangePeriod::H1 => "1h",
            ChangePeriod::H24 => "24h",
            ChangePeriod::D7 => "7d",
            ChangePeriod::D30 => "30d",
            ChangePeriod::D60 => "60d",
            ChangePeriod::Y1 => "1y",
        }
    }
}

impl CoinDetails {
    /// Prix courant dans la devise demandée
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.market_data.as_ref()?.current_price.get(currency).copied()
    }

    pub fn market_cap_in(&self, currency: &str) -> Option<f64> {
        self.market_data.as_ref()?.market_cap.get(currency).copied()
    }

    pub fn volume_in(&self, currency: &str) -> Option<f64> {
        self.market_data.as_ref()?.total_volume.get(currency).copied()
    }

    /// Variation en pourcentage pour une période donnée
    ///
    /// 1h et 24h viennent des champs "_in_currency" (par devise),
    /// les autres périodes des champs globaux
    pub fn change(&self, period: ChangePeriod, currency: &str) -> Option<f64> {
        let md = self.market_data.as_ref()?;
        match period {
            ChangePeriod::H1 => md.price_change_percentage_1h_in_currency.get(currency).copied(),
            ChangePeriod::H24 => md
                .price_change_percentage_24h_in_currency
                .get(currency)
                .copied()
                .or(md.price_change_percentage_24h),
            ChangePeriod::D7 => md.price_change_percentage_7d,
            ChangePeriod::D30 => md.price_change_percentage_30d,
            ChangePeriod::D60 => md.price_change_percentage_60d,
            ChangePeriod::Y1 => md.price_change_percentage_1y,
        }
    }

    /// Résumé de la description : 5 premières phrases, HTML retiré
    ///
    /// Retourne None si la description anglaise est absente ou vide
    pub fn summary(&self) -> Option<String> {
        let raw = self.description.as_ref()?.en.as_deref()?;
        let text = strip_html(raw);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let sentences: Vec<&str> = text.split(". ").take(SUMMARY_SENTENCES).collect();
        Some(format!("{}...", sentences.join(". ")))
    }

    /// Liens non vides sous forme (label, url)
    pub fn link_list(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let Some(links) = self.links.as_ref() else {
            return out;
        };

        if let Some(home) = first_non_empty(&links.homepage) {
            out.push(("Website", home));
        }
        if let Some(explorer) = first_non_empty(&links.blockchain_site) {
            out.push(("Explorer", explorer));
        }
        if let Some(reddit) = links.subreddit_url.as_deref().filter(|s| !s.is_empty()) {
            out.push(("Reddit", reddit.to_string()));
        }
        if let Some(twitter) = links.twitter_screen_name.as_deref().filter(|s| !s.is_empty()) {
            out.push(("Twitter", format!("https://twitter.com/{}", twitter)));
        }
        out
    }

    /// Série de prix 7 jours incluse dans la fiche (fallback du graphique)
    pub fn sparkline(&self) -> &[f64] {
        self.market_data
            .as_ref()
            .and_then(|md| md.sparkline_7d.as_ref())
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }
}

/// CoinGecko renvoie parfois homepage = ["", ""], on prend le premier non vide
fn first_non_empty(values: &[String]) -> Option<String> {
    values.iter().find(|s| !s.trim().is_empty()).cloned()
}

/// Retire les balises HTML (<a href=...>, <br>, ...) d'une description
fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("\r\n", " ").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAILS_JSON: &str = r#"{
        "id": "ethereum",
        "symbol": "eth",
        "name": "Ethereum",
        "market_cap_rank": 2,
        "market_data": {
            "current_price": { "usd": 3500.12, "eur": 3200.0 },
            "market_cap": { "usd": 420000000000 },
            "total_volume": { "usd": 15000000000 },
            "circulating_supply": 120000000.0,
            "total_supply": 120000000.0,
            "max_supply": null,
            "price_change_percentage_24h": -2.1,
            "price_change_percentage_7d": 4.2,
            "price_change_percentage_30d": 10.0,
            "price_change_percentage_60d": -5.0,
            "price_change_percentage_1y": 80.5,
            "price_change_percentage_1h_in_currency": { "usd": 0.3 },
            "price_change_percentage_24h_in_currency": { "usd": -2.05 },
            "sparkline_7d": { "price": [3400.0, 3450.0, 3500.12] }
        },
        "links": {
            "homepage": ["https://www.ethereum.org/", "", ""],
            "blockchain_site": ["", "https://etherscan.io/"],
            "subreddit_url": "https://www.reddit.com/r/ethereum",
            "twitter_screen_name": "ethereum"
        },
        "description": {
            "en": "Ethereum is a <a href=\"x\">smart contract</a> platform. One. Two. Three. Four. Five. Six."
        }
    }"#;

    #[test]
    fn test_deserialize_details() {
        let details: CoinDetails = serde_json::from_str(DETAILS_JSON).unwrap();
        assert_eq!(details.market_cap_rank, Some(2));
        assert_eq!(details.price_in("usd"), Some(3500.12));
        assert_eq!(details.price_in("jpy"), None);
        assert_eq!(details.sparkline().len(), 3);
        assert_eq!(details.market_data.as_ref().unwrap().max_supply, None);
    }

    #[test]
    fn test_change_periods() {
        let details: CoinDetails = serde_json::from_str(DETAILS_JSON).unwrap();
        assert_eq!(details.change(ChangePeriod::H1, "usd"), Some(0.3));
        assert_eq!(details.change(ChangePeriod::H24, "usd"), Some(-2.05));
        // Devise inconnue : 24h retombe sur le champ global
        assert_eq!(details.change(ChangePeriod::H24, "jpy"), Some(-2.1));
        assert_eq!(details.change(ChangePeriod::Y1, "usd"), Some(80.5));
    }

    #[test]
    fn test_summary_keeps_five_sentences_without_html() {
        let details: CoinDetails = serde_json::from_str(DETAILS_JSON).unwrap();
        let summary = details.summary().unwrap();
        assert_eq!(
            summary,
            "Ethereum is a smart contract platform. One. Two. Three. Four..."
        );
    }

    #[test]
    fn test_summary_absent() {
        let details = CoinDetails::default();
        assert!(details.summary().is_none());
    }

    #[test]
    fn test_link_list_skips_empty_entries() {
        let details: CoinDetails = serde_json::from_str(DETAILS_JSON).unwrap();
        let links = details.link_list();
        assert_eq!(links.len(), 4);
        assert_eq!(links[0], ("Website", "https://www.ethereum.org/".to_string()));
        assert_eq!(links[1], ("Explorer", "https://etherscan.io/".to_string()));
        assert_eq!(links[3], ("Twitter", "https://twitter.com/ethereum".to_string()));
    }
}
