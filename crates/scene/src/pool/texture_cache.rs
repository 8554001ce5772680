use std::collections::HashMap;

use tracing::debug;

use crate::config::TextureCacheConfig;

struct CacheEntry<T> {
    texture: T,
    last_accessed: u64,
    access_count: u64,
}

impl<T> CacheEntry<T> {
    /// Accesses per millisecond since the last access.
    fn score(&self, now: u64) -> f64 {
        let idle = now.saturating_sub(self.last_accessed).max(1);
        self.access_count as f64 / idle as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureCacheStats {
    pub size: usize,
    pub max_size: usize,
    pub total_accesses: u64,
    pub avg_access_count: f64,
}

/// Bounded texture cache ranked by access frequency over recency.
///
/// Inserting into a full cache evicts the lowest-scoring tenth (at least one
/// entry) first. Evicted textures are dropped.
pub struct TextureCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    max_entries: usize,
}

impl<T> TextureCache<T> {
    pub fn new(config: TextureCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: config.max_entries.max(1),
        }
    }

    /// Stores a texture and returns the keys evicted to make room.
    pub fn insert(&mut self, key: impl Into<String>, texture: T, now: u64) -> Vec<String> {
        let key = key.into();
        let evicted = if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries
        {
            self.evict_least_used(now)
        } else {
            Vec::new()
        };

        self.entries.insert(
            key,
            CacheEntry {
                texture,
                last_accessed: now,
                access_count: 0,
            },
        );
        evicted
    }

    /// Fetches a texture, counting the access.
    pub fn get(&mut self, key: &str, now: u64) -> Option<&T> {
        let entry = self.entries.get_mut(key)?;
        entry.last_accessed = now;
        entry.access_count += 1;
        Some(&entry.texture)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|entry| entry.texture)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes the limit. Takes effect on the next insert.
    pub fn configure(&mut self, config: TextureCacheConfig) {
        self.max_entries = config.max_entries.max(1);
    }

    pub fn stats(&self) -> TextureCacheStats {
        let total_accesses: u64 = self.entries.values().map(|entry| entry.access_count).sum();
        let avg_access_count = if self.entries.is_empty() {
            0.0
        } else {
            total_accesses as f64 / self.entries.len() as f64
        };
        TextureCacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
            total_accesses,
            avg_access_count,
        }
    }

    fn evict_least_used(&mut self, now: u64) -> Vec<String> {
        let mut ranked: Vec<(f64, &String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.score(now), key))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let count = (ranked.len() / 10).max(1);
        let victims: Vec<String> = ranked
            .into_iter()
            .take(count)
            .map(|(_, key)| key.clone())
            .collect();
        for key in &victims {
            self.entries.remove(key);
        }
        debug!(evicted = victims.len(), "texture cache evicted entries");
        victims
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new(TextureCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize) -> TextureCache<u32> {
        TextureCache::new(TextureCacheConfig { max_entries })
    }

    #[test]
    fn test_get_counts_accesses() {
        let mut cache = cache(4);
        cache.insert("grass", 1, 0);
        assert_eq!(cache.get("grass", 10), Some(&1));
        assert_eq!(cache.get("grass", 20), Some(&1));
        assert_eq!(cache.get("stone", 20), None);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.total_accesses, 2);
        assert_eq!(stats.avg_access_count, 2.0);
    }

    #[test]
    fn test_full_cache_evicts_least_valuable() {
        let mut cache = cache(3);
        cache.insert("hot", 1, 0);
        cache.insert("warm", 2, 0);
        cache.insert("cold", 3, 0);
        for now in 1..=5 {
            cache.get("hot", now);
        }
        cache.get("warm", 5);

        let evicted = cache.insert("new", 4, 10);
        assert_eq!(evicted, vec!["cold".to_owned()]);
        assert!(cache.contains("hot"));
        assert!(cache.contains("warm"));
        assert!(cache.contains("new"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_eviction_removes_a_tenth() {
        let mut cache = cache(20);
        for index in 0..20 {
            cache.insert(format!("t{index}"), index, 0);
        }
        for index in 2..20 {
            cache.get(&format!("t{index}"), 5);
        }
        let evicted = cache.insert("extra", 99, 10);
        assert_eq!(evicted.len(), 2);
        assert!(evicted.contains(&"t0".to_owned()));
        assert!(evicted.contains(&"t1".to_owned()));
        assert_eq!(cache.len(), 19);
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let mut cache = cache(1);
        cache.insert("only", 1, 0);
        assert!(cache.insert("only", 2, 5).is_empty());
        assert_eq!(cache.get("only", 6), Some(&2));
    }

    #[test]
    fn test_configure_and_clear() {
        let mut cache = cache(1);
        cache.configure(TextureCacheConfig { max_entries: 2 });
        cache.insert("a", 1, 0);
        assert!(cache.insert("b", 2, 0).is_empty());
        assert_eq!(cache.remove("a"), Some(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
