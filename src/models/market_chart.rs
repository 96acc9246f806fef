// ============================================================================
// Structure : MarketChart
// ============================================================================
// Historique de prix d'un coin (endpoint /coins/{id}/market_chart)
//
// CONCEPTS RUST :
// 1. Tuples et serde : [[timestamp_ms, prix], ...] -> Vec<(f64, f64)>
// 2. DateTime<Utc> : conversion des timestamps en millisecondes
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Période affichée par le graphique de la vue détail
///
/// CONCEPT : Cycle d'états
/// - 1d → 7d → 30d → 90d → 1y → 1d
/// - Changée avec les touches h / l
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timespan {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Timespan {
    /// Valeur du paramètre "days" de l'API
    pub fn to_days(&self) -> u32 {
        match self {
            Timespan::Day => 1,
            Timespan::Week => 7,
            Timespan::Month => 30,
            Timespan::Quarter => 90,
            Timespan::Year => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timespan::Day => "24h",
            Timespan::Week => "7d",
            Timespan::Month => "30d",
            Timespan::Quarter => "90d",
            Timespan::Year => "1y",
        }
    }

    /// Période suivante (cycle)
    pub fn next(&self) -> Timespan {
        match self {
            Timespan::Day => Timespan::Week,
            Timespan::Week => Timespan::Month,
            Timespan::Month => Timespan::Quarter,
            Timespan::Quarter => Timespan::Year,
            Timespan::Year => Timespan::Day, // Boucle
        }
    }

    /// Période précédente (cycle)
    pub fn previous(&self) -> Timespan {
        match self {
            Timespan::Day => Timespan::Year, // Boucle
            Timespan::Week => Timespan::Day,
            Timespan::Month => Timespan::Week,
            Timespan::Quarter => Timespan::Month,
            Timespan::Year => Timespan::Quarter,
        }
    }
}

impl Default for Timespan {
    /// 7 jours par défaut, comme le sparkline du tableau
    fn default() -> Self {
        Timespan::Week
    }
}

/// Réponse brute de l'API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}

/// Un point de l'historique
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Historique de prix d'un coin sur une période
#[derive(Debug, Clone, PartialEq)]
pub struct MarketChart {
    pub coin_id: String,
    pub timespan: Timespan,

    /// Points triés par date croissante
    pub points: Vec<PricePoint>,
}

impl MarketChart {
    /// Convertit la réponse brute, en ignorant les timestamps invalides
    pub(crate) fn from_response(
        coin_id: String,
        timespan: Timespan,
        response: MarketChartResponse,
    ) -> Self {
        let mut points: Vec<PricePoint> = response
            .prices
            .into_iter()
            .filter_map(|(ms, price)| {
                let time = DateTime::from_timestamp_millis(ms as i64)?;
                Some(PricePoint { time, price })
            })
            .collect();
        points.sort_by_key(|p| p.time);

        Self {
            coin_id,
            timespan,
            points,
        }
    }

    /// Construit un historique à partir d'un sparkline sans timestamps
    ///
    /// Les points sont répartis régulièrement sur la période, le dernier à `end`
    pub fn from_series(coin_id: String, timespan: Timespan, series: &[f64], end: DateTime<Utc>) -> Self {
        let span_ms = timespan.to_days() as i64 * 24 * 60 * 60 * 1000;
        let steps = series.len().saturating_sub(1).max(1) as i64;

        let points = series
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                let offset = span_ms - span_ms * i as i64 / steps;
                PricePoint {
                    time: end - chrono::Duration::milliseconds(offset),
                    price,
                }
            })
            .collect();

        Self {
            coin_id,
            timespan,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Variation sur la période : (dernier - premier) / premier * 100
    ///
    /// 0 si moins de deux points ou premier prix nul
    pub fn change_percent(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 && first.price != 0.0 => {
                (last.price - first.price) / first.price * 100.0
            }
            _ => 0.0,
        }
    }

    /// Prix minimum et maximum (None si vide)
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
            (min.min(p.price), max.max(p.price))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timespan_cycle() {
        let mut t = Timespan::default();
        assert_eq!(t, Timespan::Week);
        for _ in 0..5 {
            t = t.next();
        }
        assert_eq!(t, Timespan::Week);
        assert_eq!(Timespan::Day.previous(), Timespan::Year);
        assert_eq!(Timespan::Year.to_days(), 365);
    }

    #[test]
    fn test_from_response_sorts_and_converts() {
        let json = r#"{
            "prices": [[1729123200000, 101.0], [1729036800000, 100.0], [1729209600000, 110.0]],
            "market_caps": [],
            "total_volumes": []
        }"#;
        let response: MarketChartResponse = serde_json::from_str(json).unwrap();
        let chart = MarketChart::from_response("bitcoin".to_string(), Timespan::Week, response);

        assert_eq!(chart.len(), 3);
        assert_eq!(chart.points[0].price, 100.0);
        assert_eq!(chart.points[2].price, 110.0);
        assert!((chart.change_percent() - 10.0).abs() < 1e-9);
        assert_eq!(chart.bounds(), Some((100.0, 110.0)));
    }

    #[test]
    fn test_change_percent_degenerate() {
        let single = MarketChart::from_series("x".to_string(), Timespan::Week, &[5.0], Utc::now());
        assert_eq!(single.change_percent(), 0.0);

        let zero_start =
            MarketChart::from_series("x".to_string(), Timespan::Week, &[0.0, 5.0], Utc::now());
        assert_eq!(zero_start.change_percent(), 0.0);

        let empty = MarketChart::from_series("x".to_string(), Timespan::Week, &[], Utc::now());
        assert!(empty.bounds().is_none());
    }

    #[test]
    fn test_from_series_spreads_over_timespan() {
        let end = Utc::now();
        let chart =
            MarketChart::from_series("x".to_string(), Timespan::Week, &[1.0, 2.0, 3.0], end);
        assert_eq!(chart.points[2].time, end);
        assert_eq!(end - chart.points[0].time, chrono::Duration::days(7));
        assert_eq!(end - chart.points[1].time, chrono::Duration::hours(84));
    }
}
