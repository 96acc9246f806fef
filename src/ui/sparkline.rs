// ============================================================================
// Sparkline texte
// ============================================================================
// Mini-graphique sans axes de l'historique 7 jours, dessiné avec les
// caractères Unicode ▁▂▃▄▅▆▇█ pour tenir dans une cellule du tableau
//
// Mise à l'échelle : min → ▁, max → █. Une série plate reste en bas.
// ============================================================================

/// Niveaux du plus bas au plus haut
const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Dessine `series` sur `width` caractères
///
/// - série vide ou largeur nulle : chaîne vide
/// - plus de points que de colonnes : échantillonnage régulier
/// - moins de points que de colonnes : un caractère par point
pub fn render_sparkline(series: &[f64], width: usize) -> String {
    let points: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let sampled = resample(&points, width);

    let (min, max) = sampled
        .iter()
        .fold((f64::MAX, f64::MIN), |(min, max), &v| (min.min(v), max.max(v)));
    let range = max - min;
    let top = (BARS.len() - 1) as f64;

    sampled
        .iter()
        .map(|&v| {
            if range == 0.0 {
                BARS[0]
            } else {
                let level = ((v - min) / range * top).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            }
        })
        .collect()
}

/// Réduit la série à `width` points au plus (premier et dernier conservés)
fn resample(points: &[f64], width: usize) -> Vec<f64> {
    if points.len() <= width {
        return points.to_vec();
    }
    if width == 1 {
        return vec![points[points.len() - 1]];
    }

    let last = points.len() - 1;
    (0..width)
        .map(|i| points[i * last / (width - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_and_max_map_to_extremes() {
        let line = render_sparkline(&[1.0, 5.0, 9.0], 10);
        assert_eq!(line, "▁▅█");
    }

    #[test]
    fn test_flat_series_stays_low() {
        assert_eq!(render_sparkline(&[3.0, 3.0, 3.0], 3), "▁▁▁");
    }

    #[test]
    fn test_downsamples_to_width() {
        let series: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let line = render_sparkline(&series, 20);
        assert_eq!(line.chars().count(), 20);
        assert!(line.starts_with('▁'));
        assert!(line.ends_with('█'));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(render_sparkline(&[], 10), "");
        assert_eq!(render_sparkline(&[1.0, 2.0], 0), "");
        assert_eq!(render_sparkline(&[f64::NAN], 5), "");
    }
}
