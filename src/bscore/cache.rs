use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::model::plate::PlateMatrix;

use super::{BScoreFit, bscore_matrix};

/// Full identity of one polish result.
///
/// Algorithm parameters are part of the key, so changing them is a
/// cache-invalidating event by construction: the old entry simply stops
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub metric: String,
    pub rows: usize,
    pub cols: usize,
    pub fingerprint: u64,
    pub max_iter: u32,
    pub tol_bits: u64,
}

impl CacheKey {
    pub fn new(metric: &str, matrix: &PlateMatrix, max_iter: u32, tol: f64) -> Self {
        Self {
            metric: metric.to_string(),
            rows: matrix.rows(),
            cols: matrix.cols(),
            fingerprint: fingerprint_matrix(matrix),
            max_iter,
            tol_bits: tol.to_bits(),
        }
    }
}

/// FNV-64 fingerprint over cell presence and exact value bits.
pub fn fingerprint_matrix(matrix: &PlateMatrix) -> u64 {
    let mut hasher = Fnv64::new();
    for cell in matrix.values() {
        match cell {
            Some(v) => {
                hasher.update(&[1]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            None => hasher.update(&[0]),
        }
    }
    hasher.finish()
}

/// Shared polish-result cache.
///
/// Safe for concurrent lookup; writes are idempotent upserts, so a
/// poisoned lock only ever hides work already redone identically and
/// the map stays usable.
#[derive(Debug, Default)]
pub struct BScoreCache {
    entries: RwLock<HashMap<CacheKey, Arc<BScoreFit>>>,
}

impl BScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<BScoreFit>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn get_or_compute(
        &self,
        metric: &str,
        matrix: &PlateMatrix,
        max_iter: u32,
        tol: f64,
    ) -> Arc<BScoreFit> {
        let key = CacheKey::new(metric, matrix, max_iter, tol);
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let fit = Arc::new(bscore_matrix(matrix, max_iter, tol));
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key).or_insert_with(|| fit.clone()).clone()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Fnv64 {
    hash: u64,
}

impl Fnv64 {
    fn new() -> Self {
        Self {
            hash: 0xcbf29ce484222325,
        }
    }

    fn update(&mut self, data: &[u8]) {
        let mut h = self.hash;
        for &b in data {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.hash = h;
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}
