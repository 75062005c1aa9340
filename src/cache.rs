use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use md5::{Digest, Md5};

pub const KEY_PREFIX: &str = "andw_news_";

/// Rendered listing plus the template styles it queued, so a cache hit
/// can replay them into the page's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRender {
    pub html: String,
    pub styles: Vec<(String, String)>,
}

/// In-memory render cache keyed by a digest of the listing attributes.
/// Entries expire after the TTL handed to `get`; `put` prunes expired
/// entries so distinct listings cannot pile up.
pub struct RenderCache {
    entries: Mutex<HashMap<String, (Instant, CachedRender)>>,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderCache {
    pub fn new() -> Self {
        RenderCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `andw_news_` + hex md5 of the serialized attributes.
    pub fn key_for(serialized_atts: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(serialized_atts.as_bytes());
        format!("{}{}", KEY_PREFIX, hex::encode(hasher.finalize()))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Instant, CachedRender)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str, ttl: Duration) -> Option<CachedRender> {
        let mut map = self.lock();
        match map.get(key) {
            Some((stored, entry)) if stored.elapsed() < ttl => {
                log::debug!("News cache hit: {}", key);
                Some(entry.clone())
            }
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, entry: CachedRender, ttl: Duration) {
        let mut map = self.lock();
        prune(&mut map, ttl);
        map.insert(key.to_string(), (Instant::now(), entry));
    }

    /// Drop every cached listing (template or default changes).
    pub fn clear(&self) {
        let mut map = self.lock();
        if !map.is_empty() {
            log::debug!("Cleared {} cached news listings", map.len());
        }
        map.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn prune(map: &mut HashMap<String, (Instant, CachedRender)>, max_age: Duration) {
    let before = map.len();
    map.retain(|_, (stored, _)| stored.elapsed() < max_age);
    if map.len() < before {
        log::debug!("Pruned {} expired news listings", before - map.len());
    }
}
