// ============================================================================
// Formatage des nombres pour l'affichage
// ============================================================================
// - montants compacts : $1.32T, $35.00B, $12.40M, $9.99K, $512.00
// - prix : $67,123.45 / $0.000123 (2 à 6 décimales)
// - pourcentages : +1.23% / -0.50%
// - quantités : 19,700,000 BTC
// ============================================================================

use ratatui::style::Color;

/// Texte affiché quand une valeur est absente
pub const NOT_AVAILABLE: &str = "N/A";

/// Symbole d'une devise de cotation ("usd" → "$")
///
/// Les devises sans symbole connu sont préfixées par leur code
pub fn currency_symbol(currency: &str) -> String {
    match currency.to_lowercase().as_str() {
        "usd" => "$".to_string(),
        "eur" => "€".to_string(),
        "gbp" => "£".to_string(),
        "jpy" | "cny" => "¥".to_string(),
        "btc" => "₿".to_string(),
        other => format!("{} ", other.to_uppercase()),
    }
}

/// Montant compact avec suffixe T / B / M / K et 2 décimales
pub fn format_compact(value: Option<f64>, symbol: &str) -> String {
    let Some(v) = value else {
        return NOT_AVAILABLE.to_string();
    };

    let (scaled, suffix) = if v >= 1e12 {
        (v / 1e12, "T")
    } else if v >= 1e9 {
        (v / 1e9, "B")
    } else if v >= 1e6 {
        (v / 1e6, "M")
    } else if v >= 1e3 {
        (v / 1e3, "K")
    } else {
        (v, "")
    };
    format!("{}{:.2}{}", symbol, scaled, suffix)
}

/// Prix avec séparateurs de milliers, entre 2 et 6 décimales
pub fn format_price(value: Option<f64>, symbol: &str) -> String {
    match value {
        Some(v) => format!("{}{}", symbol, format_grouped(v, 2, 6)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Pourcentage signé à 2 décimales
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("+{:.2}%", v),
        Some(v) => format!("{:.2}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Pourcentage sans signe forcé (colonnes du tableau)
pub fn format_percentage_plain(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "-".to_string(),
    }
}

/// Entier avec séparateurs de milliers (ex: 14,512)
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Quantité en circulation / max, "Unlimited" si absente ou nulle
pub fn format_supply(value: Option<f64>, symbol: &str) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{} {}", format_grouped(v, 0, 3), symbol.to_uppercase()),
        _ => "Unlimited".to_string(),
    }
}

/// Couleur d'une variation : vert si hausse, rouge si baisse, gris sinon
pub fn percentage_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v > 0.0 => Color::Green,
        Some(v) if v < 0.0 => Color::Red,
        _ => Color::Gray,
    }
}

/// Nombre décimal avec séparateurs de milliers
///
/// Arrondi à `max_frac` décimales, zéros finaux retirés jusqu'à `min_frac`
fn format_grouped(value: f64, min_frac: usize, max_frac: usize) -> String {
    let negative = value < 0.0;
    let raw = format!("{:.*}", max_frac, value.abs());

    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw.as_str(), ""),
    };

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_frac {
        frac.push('0');
    }

    let mut out = String::new();
    if negative && raw.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// Insère une virgule toutes les 3 positions depuis la droite
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(Some(1_320_000_000_000.0), "$"), "$1.32T");
        assert_eq!(format_compact(Some(35_000_000_000.0), "$"), "$35.00B");
        assert_eq!(format_compact(Some(12_400_000.0), "$"), "$12.40M");
        assert_eq!(format_compact(Some(9_990.0), "$"), "$9.99K");
        assert_eq!(format_compact(Some(512.0), "$"), "$512.00");
        assert_eq!(format_compact(None, "$"), "N/A");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(67123.45), "$"), "$67,123.45");
        assert_eq!(format_price(Some(1.0), "$"), "$1.00");
        assert_eq!(format_price(Some(0.000123), "$"), "$0.000123");
        assert_eq!(format_price(Some(0.12345678), "$"), "$0.123457");
        assert_eq!(format_price(Some(1234567.891), "€"), "€1,234,567.891");
        assert_eq!(format_price(None, "$"), "N/A");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(1.234)), "+1.23%");
        assert_eq!(format_percentage(Some(0.0)), "+0.00%");
        assert_eq!(format_percentage(Some(-0.5)), "-0.50%");
        assert_eq!(format_percentage(None), "N/A");
        assert_eq!(format_percentage_plain(Some(-2.0)), "-2.00%");
        assert_eq!(format_percentage_plain(None), "-");
    }

    #[test]
    fn test_format_count_and_supply() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(14512), "14,512");
        assert_eq!(format_count(1_000_000), "1,000,000");

        assert_eq!(format_supply(Some(19_700_000.0), "btc"), "19,700,000 BTC");
        assert_eq!(format_supply(Some(1234.5678), "eth"), "1,234.568 ETH");
        assert_eq!(format_supply(None, "btc"), "Unlimited");
        assert_eq!(format_supply(Some(0.0), "btc"), "Unlimited");
    }

    #[test]
    fn test_percentage_color() {
        assert_eq!(percentage_color(Some(3.0)), Color::Green);
        assert_eq!(percentage_color(Some(-3.0)), Color::Red);
        assert_eq!(percentage_color(Some(0.0)), Color::Gray);
        assert_eq!(percentage_color(None), Color::Gray);
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol("USD"), "$");
        assert_eq!(currency_symbol("eur"), "€");
        assert_eq!(currency_symbol("chf"), "CHF ");
    }
}
