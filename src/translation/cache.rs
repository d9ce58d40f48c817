/*!
 * Result caching for adaptive translations.
 *
 * Whole-document results are stored under a fingerprint of the source text,
 * the language pair and the model identity. Entries expire after a TTL that
 * grows with the quality of the cached translation.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::language_utils::canonical_code;
use crate::translation::pipeline::TranslationResult;
use crate::translation::quality::Grade;

/// Identity of a translation request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// SHA-256 over the text, the canonical language codes and the model identity.
    ///
    /// The text is hashed byte for byte: results are reassembled exactly, so
    /// two texts that differ only in whitespace have different translations.
    pub fn compute(text: &str, source_lang: &str, target_lang: &str, model_id: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            text,
            canonical_code(source_lang).as_str(),
            canonical_code(target_lang).as_str(),
            model_id,
        ] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }

        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the digest, for logs
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for finished translations
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a live entry
    async fn get(&self, fingerprint: &Fingerprint) -> Option<TranslationResult>;

    /// Store an entry for `ttl`
    async fn put(&self, fingerprint: Fingerprint, result: TranslationResult, ttl: Duration);
}

/// Time-to-live of cached results per grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    pub grade_a_secs: u64,
    pub grade_b_secs: u64,
    pub grade_c_secs: u64,
    pub grade_d_secs: u64,
    pub grade_f_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            grade_a_secs: 7 * 24 * 3600,
            grade_b_secs: 3 * 24 * 3600,
            grade_c_secs: 24 * 3600,
            grade_d_secs: 6 * 3600,
            grade_f_secs: 3600,
        }
    }
}

impl TtlPolicy {
    /// TTL for a result; degraded results keep half of their grade's TTL
    pub fn ttl_for(&self, grade: Grade, degraded: bool) -> Duration {
        let secs = match grade {
            Grade::A => self.grade_a_secs,
            Grade::B => self.grade_b_secs,
            Grade::C => self.grade_c_secs,
            Grade::D => self.grade_d_secs,
            Grade::F => self.grade_f_secs,
        };
        let secs = if degraded { secs / 2 } else { secs };
        Duration::from_secs(secs.max(1))
    }
}

/// Cache settings as they appear in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether results are cached at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of cached documents
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// TTL per grade
    #[serde(default)]
    pub ttl: TtlPolicy,
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    1_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: default_max_entries(),
            ttl: TtlPolicy::default(),
        }
    }
}

/// Hit/miss counters of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: TranslationResult,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry.
///
/// Uses the tokio clock, so expiry follows a paused test clock.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    stats: RwLock<CacheStats>,
    max_entries: usize,
}

impl InMemoryCache {
    /// Create a cache holding at most `max_entries` documents
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            ..*self.stats.read()
        }
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.stats.write() = CacheStats::default();
        debug!("Translation cache cleared");
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    fn evict_for_insert(&self, entries: &mut HashMap<Fingerprint, CacheEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);

        while entries.len() >= self.max_entries {
            let soonest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match soonest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(default_max_entries())
    }
}

/// Stand-in expiry for TTLs too long for the clock to represent
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn expiry_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<TranslationResult> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read();
            entries.get(fingerprint).map(|entry| (entry.expires_at > now, entry.result.clone()))
        };

        match found {
            Some((true, result)) => {
                self.stats.write().hits += 1;
                debug!("Cache hit for {}", fingerprint.short());
                Some(result)
            }
            Some((false, _)) => {
                self.entries.write().remove(fingerprint);
                self.stats.write().misses += 1;
                debug!("Cache entry {} expired", fingerprint.short());
                None
            }
            None => {
                self.stats.write().misses += 1;
                debug!("Cache miss for {}", fingerprint.short());
                None
            }
        }
    }

    async fn put(&self, fingerprint: Fingerprint, result: TranslationResult, ttl: Duration) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&fingerprint) {
            self.evict_for_insert(&mut entries);
        }

        debug!("Cached translation {} for {:?}", fingerprint.short(), ttl);
        entries.insert(
            fingerprint,
            CacheEntry {
                result,
                expires_at: expiry_after(ttl),
            },
        );
    }
}
