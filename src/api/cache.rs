// ============================================================================
// Cache de réponses en mémoire
// ============================================================================
// Cache LRU borné en taille, avec une durée de fraîcheur (TTL) par entrée.
// Une entrée fraîche évite un appel réseau ; une entrée périmée est
// rechargée au prochain accès. Au-delà de la capacité, l'entrée la moins
// récemment utilisée est évincée.
//
// Durées de fraîcheur utilisées par le client :
// - marchés (/coins/markets)       : 60 s
// - fiche détaillée, historique    : 2 min
// - recherche, statistiques globales : 5 min
// ============================================================================

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

pub const MARKETS_TTL: Duration = Duration::from_secs(60);
pub const DETAILS_TTL: Duration = Duration::from_secs(2 * 60);
pub const CHART_TTL: Duration = Duration::from_secs(2 * 60);
pub const SEARCH_TTL: Duration = Duration::from_secs(5 * 60);
pub const GLOBAL_TTL: Duration = Duration::from_secs(5 * 60);

/// Nombre maximal d'entrées conservées par cache
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Cache clé → valeur avec une durée de fraîcheur commune
///
/// CONCEPT RUST : Composition
/// - LruCache gère la capacité et l'ordre d'éviction
/// - chaque valeur est stockée avec son instant d'insertion
pub struct TtlCache<K: Hash + Eq, V> {
    ttl: Duration,
    entries: LruCache<K, (Instant, V)>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: LruCache::new(capacity),
        }
    }

    /// Retourne la valeur si elle est encore fraîche
    pub fn get_fresh(&mut self, key: &K) -> Option<V> {
        self.get_fresh_at(key, Instant::now())
    }

    /// Stocke une valeur (remplace l'ancienne)
    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Supprime toutes les entrées
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_fresh_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let (stored_at, value) = self.entries.get(key)?;
        if now.saturating_duration_since(*stored_at) < self.ttl {
            return Some(value.clone());
        }
        // Périmée : inutile de la garder
        self.entries.pop(key);
        None
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.put(key, (now, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_then_stale() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("bitcoin", 1, t0);

        assert_eq!(cache.get_fresh_at(&"bitcoin", t0 + Duration::from_secs(59)), Some(1));
        assert_eq!(cache.get_fresh_at(&"bitcoin", t0 + Duration::from_secs(60)), None);
        assert_eq!(cache.get_fresh_at(&"ethereum", t0), None);
        // L'entrée périmée a été retirée
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_replaces() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", "old".to_string());
        cache.insert("k", "new".to_string());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh(&"k"), Some("new".to_string()));
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let capacity = NonZeroUsize::new(2).unwrap();
        let mut cache = TtlCache::with_capacity(Duration::from_secs(60), capacity);
        let t0 = Instant::now();
        cache.insert_at("bitcoin", 1, t0);
        cache.insert_at("ethereum", 2, t0);

        // bitcoin devient le plus récemment utilisé
        assert_eq!(cache.get_fresh_at(&"bitcoin", t0), Some(1));

        cache.insert_at("solana", 3, t0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_fresh_at(&"ethereum", t0), None);
        assert_eq!(cache.get_fresh_at(&"bitcoin", t0), Some(1));
        assert_eq!(cache.get_fresh_at(&"solana", t0), Some(3));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_default_capacity_is_bounded() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        for i in 0..DEFAULT_CAPACITY.get() + 10 {
            cache.insert(i, i);
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY.get());
    }
}
