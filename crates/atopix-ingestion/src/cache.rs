//! In-memory store of preprocessed matrices.
//!
//! A client uploads a file once, receives an opaque key, and runs any number
//! of predictions against it. Entries expire after a fixed TTL; expired
//! entries are swept on every read and write rather than by a background
//! task. Entries are inserted and removed whole, never updated.

use atopix_common::{AtopixError, GeneMatrix, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct CacheEntry {
    matrix: Arc<GeneMatrix>,
    created_at: DateTime<Utc>,
}

pub struct PreprocessCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PreprocessCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Default for PreprocessCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

impl PreprocessCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_clock(ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        let ttl = TimeDelta::seconds(secs);
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    // Entries are only ever inserted or removed whole, so a map left behind
    // by a panicking holder is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep_locked(&self, entries: &mut HashMap<String, CacheEntry>) -> usize {
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at <= self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, remaining = entries.len(), "expired preprocess cache entries");
        }
        removed
    }

    /// Store a matrix under a fresh random key.
    pub fn put(&self, matrix: GeneMatrix) -> String {
        let mut entries = self.lock();
        self.sweep_locked(&mut entries);

        let key = Uuid::new_v4().to_string();
        debug!(
            cache_key = %key,
            patients = matrix.n_patients(),
            genes = matrix.n_genes(),
            "caching preprocessed matrix"
        );
        entries.insert(
            key.clone(),
            CacheEntry {
                matrix: Arc::new(matrix),
                created_at: self.clock.now(),
            },
        );
        key
    }

    /// Fetch a cached matrix, optionally restricted to the given patient ids.
    ///
    /// Filtered rows keep their original relative order regardless of the
    /// order of `patient_filter`.
    pub fn get(&self, key: &str, patient_filter: Option<&[String]>) -> Result<Arc<GeneMatrix>> {
        let matrix = {
            let mut entries = self.lock();
            self.sweep_locked(&mut entries);
            entries
                .get(key)
                .map(|entry| Arc::clone(&entry.matrix))
                .ok_or_else(|| {
                    AtopixError::CacheMiss(
                        "Cache key not found or expired. Please upload the file again.".to_string(),
                    )
                })?
        };

        let Some(wanted) = patient_filter else {
            return Ok(matrix);
        };

        let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let indices: Vec<usize> = matrix
            .patient_ids()
            .iter()
            .enumerate()
            .filter(|(_, id)| wanted.contains(id.as_str()))
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            return Err(AtopixError::validation(
                "None of the requested patient IDs were found in the cached data",
            ));
        }

        debug!(cache_key = %key, selected = indices.len(), "filtered cached matrix");
        Ok(Arc::new(matrix.select_rows(&indices)?))
    }

    /// Remove every entry older than the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        self.sweep_locked(&mut entries)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
