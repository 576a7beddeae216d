//! In-memory cache of prediction reports
//!
//! Keyed by content digest and strategy, so re-uploading identical bytes
//! skips decoding and frame extraction. Oldest entries are evicted first
//! once capacity is reached.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::analysis::{Report, ScoringStrategy};

type CacheKey = (String, ScoringStrategy);

struct CacheInner {
    entries: HashMap<CacheKey, Report>,
    order: VecDeque<CacheKey>,
}

pub struct PredictionCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl PredictionCache {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, digest: &str, strategy: ScoringStrategy) -> Option<Report> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(&(digest.to_string(), strategy)).cloned()
    }

    pub fn insert(&self, digest: String, strategy: ScoringStrategy, report: Report) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let key = (digest, strategy);

        if inner.entries.insert(key.clone(), report).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureScores;

    fn report(score: f64) -> Report {
        Report::new(ScoringStrategy::Hybrid, score, FeatureScores::default())
    }

    #[test]
    fn keyed_by_digest_and_strategy() {
        let cache = PredictionCache::new(8);
        cache.insert("abc".into(), ScoringStrategy::Hybrid, report(40.0));

        assert_eq!(cache.get("abc", ScoringStrategy::Hybrid).map(|r| r.score), Some(40.0));
        assert!(cache.get("abc", ScoringStrategy::Simulated).is_none());
        assert!(cache.get("abd", ScoringStrategy::Hybrid).is_none());
    }

    #[test]
    fn evicts_oldest_first() {
        let cache = PredictionCache::new(2);
        cache.insert("a".into(), ScoringStrategy::Hybrid, report(1.0));
        cache.insert("b".into(), ScoringStrategy::Hybrid, report(2.0));
        cache.insert("c".into(), ScoringStrategy::Hybrid, report(3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a", ScoringStrategy::Hybrid).is_none());
        assert!(cache.get("b", ScoringStrategy::Hybrid).is_some());
        assert!(cache.get("c", ScoringStrategy::Hybrid).is_some());
    }

    #[test]
    fn reinserting_does_not_duplicate_order() {
        let cache = PredictionCache::new(2);
        cache.insert("a".into(), ScoringStrategy::Hybrid, report(1.0));
        cache.insert("a".into(), ScoringStrategy::Hybrid, report(5.0));
        cache.insert("b".into(), ScoringStrategy::Hybrid, report(2.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", ScoringStrategy::Hybrid).map(|r| r.score), Some(5.0));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = PredictionCache::new(0);
        cache.insert("a".into(), ScoringStrategy::Hybrid, report(1.0));
        assert!(cache.is_empty());
    }
}
