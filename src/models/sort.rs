// ============================================================================
// Tri du tableau des marchés
// ============================================================================
// Tri côté client sur les lignes chargées, et paramètre "order" de l'API
// quand CoinGecko sait trier la colonne côté serveur
// ============================================================================

use std::cmp::Ordering;

use crate::models::Coin;

/// Colonnes triables du tableau
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Rank,
    Name,
    Price,
    Change1h,
    Change24h,
    Change7d,
    Volume,
    MarketCap,
}

/// Sens du tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(&self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Flèche affichée dans l'en-tête de la colonne active
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl SortColumn {
    /// Colonnes dans l'ordre des touches 1 à 8
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Rank,
        SortColumn::Name,
        SortColumn::Price,
        SortColumn::Change1h,
        SortColumn::Change24h,
        SortColumn::Change7d,
        SortColumn::Volume,
        SortColumn::MarketCap,
    ];

    /// Colonne associée à une touche numérique ('1' = Rank, ...)
    pub fn from_digit(digit: char) -> Option<SortColumn> {
        let index = digit.to_digit(10)? as usize;
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Rank => "#",
            SortColumn::Name => "Coin",
            SortColumn::Price => "Price",
            SortColumn::Change1h => "1h",
            SortColumn::Change24h => "24h",
            SortColumn::Change7d => "7d",
            SortColumn::Volume => "24h Volume",
            SortColumn::MarketCap => "Market Cap",
        }
    }

    /// Nom du tri côté serveur (None si CoinGecko ne le supporte pas)
    fn api_key(&self) -> Option<&'static str> {
        match self {
            SortColumn::MarketCap | SortColumn::Rank => Some("market_cap"),
            SortColumn::Volume => Some("volume"),
            SortColumn::Name => Some("id"),
            _ => None,
        }
    }

    /// Valeur numérique utilisée pour le tri (None = donnée manquante)
    fn numeric_value(&self, coin: &Coin) -> Option<f64> {
        match self {
            SortColumn::Rank => coin.market_cap_rank.map(f64::from),
            SortColumn::Price => coin.current_price,
            SortColumn::Change1h => coin.price_change_percentage_1h_in_currency,
            SortColumn::Change24h => coin.price_change_percentage_24h_in_currency,
            SortColumn::Change7d => coin.price_change_percentage_7d_in_currency,
            SortColumn::Volume => coin.total_volume,
            SortColumn::MarketCap => coin.market_cap,
            SortColumn::Name => None,
        }
    }
}

/// Critère de tri courant (colonne + sens)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    /// Par défaut : market cap décroissante (ordre natif de CoinGecko)
    fn default() -> Self {
        Self {
            column: SortColumn::MarketCap,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Applique un clic sur une colonne
    ///
    /// - même colonne : inverse le sens
    /// - nouvelle colonne : tri décroissant
    pub fn select(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.toggled();
        } else {
            self.column = column;
            self.direction = SortDirection::Desc;
        }
    }

    /// Paramètre "order" envoyé à /coins/markets
    ///
    /// Retombe sur "market_cap_desc" quand la colonne n'est pas triable
    /// côté serveur (le tri client s'applique ensuite)
    pub fn api_order(&self) -> String {
        match self.column.api_key() {
            Some(key) => {
                // Le rang croissant correspond à la market cap décroissante
                let direction = match (self.column, self.direction) {
                    (SortColumn::Rank, SortDirection::Asc) => SortDirection::Desc,
                    (SortColumn::Rank, SortDirection::Desc) => SortDirection::Asc,
                    (_, d) => d,
                };
                let suffix = match direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                format!("{}_{}", key, suffix)
            }
            None => "market_cap_desc".to_string(),
        }
    }

    /// true si changer pour ce critère nécessite de recharger depuis l'API
    pub fn is_server_side(&self) -> bool {
        self.column.api_key().is_some()
    }

    /// Trie les coins en place selon le critère
    ///
    /// Les valeurs manquantes sont toujours placées en fin de liste,
    /// quel que soit le sens. Le tri est stable.
    pub fn sort(&self, coins: &mut [Coin]) {
        let column = self.column;
        let direction = self.direction;

        coins.sort_by(|a, b| {
            if column == SortColumn::Name {
                let ordering = a.name.to_lowercase().cmp(&b.name.to_lowercase());
                return apply_direction(ordering, direction);
            }

            match (column.numeric_value(a), column.numeric_value(b)) {
                (Some(x), Some(y)) => {
                    apply_direction(x.partial_cmp(&y).unwrap_or(Ordering::Equal), direction)
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }
}

fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
