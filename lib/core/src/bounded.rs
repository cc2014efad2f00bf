//! Capacity-bounded pair counter.
//!
//! The counter never holds more than `capacity` distinct keys. When a new key
//! arrives at a full counter, the `ceil(capacity * eviction_fraction)`
//! lowest-count entries are evicted in one batch (ties: smallest packed key
//! first). Evicted keys go into a layered bit filter and any later increment
//! of a filtered key is rejected, so an evicted pair never comes back with a
//! partial count.
//!
//! The filter grows with the number of evicted keys. Each layer is sized for
//! a fixed number of keys and a full layer is frozen behind a new one twice
//! its size with two more bits per key. Layer `i` alone has a false-positive
//! rate near `0.6185^(14 + 2i)`, so the whole filter stays below roughly 0.2%
//! no matter how many rounds run. A false positive rejects a key that was
//! never evicted; like eviction itself it only lowers long-tail counts.
//!
//! Without a capacity the counter is an exact map.

use crate::pair::PairKey;
use crate::Warning;
use ahash::{AHashMap, RandomState};

const FILTER_MIN_SLOTS: usize = 512;
const FILTER_BASE_BITS_PER_SLOT: usize = 14;
const FILTER_BITS_STEP: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CounterStats {
    evicted_keys: usize,
    eviction_rounds: usize,
    rejected_increments: u64,
    /// Largest number of distinct keys held at once.
    peak_len: usize,
}

/// One fixed-size Bloom layer.
#[derive(Debug, Clone)]
struct FilterLayer {
    bits: Vec<u64>,
    probes: u64,
    slots: usize,
    len: usize,
}

impl FilterLayer {
    fn new(slots: usize, bits_per_slot: usize) -> Self {
        let bits = slots.saturating_mul(bits_per_slot);
        // Optimal probe count is bits_per_slot * ln 2.
        let probes = ((bits_per_slot as f64) * std::f64::consts::LN_2).round().max(1.0) as u64;
        Self {
            bits: vec![0; bits.div_ceil(64)],
            probes,
            slots,
            len: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.len >= self.slots
    }

    #[inline]
    fn positions(&self, hash: u64) -> impl Iterator<Item = usize> {
        let (h1, h2) = (hash & 0xffff_ffff, (hash >> 32) | 1);
        let len = (self.bits.len() * 64) as u64;
        (0..self.probes).map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % len) as usize)
    }

    fn insert(&mut self, hash: u64) {
        let positions: Vec<usize> = self.positions(hash).collect();
        for bit in positions {
            self.bits[bit / 64] |= 1 << (bit % 64);
        }
        self.len += 1;
    }

    fn contains(&self, hash: u64) -> bool {
        self.positions(hash).all(|bit| self.bits[bit / 64] & (1 << (bit % 64)) != 0)
    }
}

/// Deterministic, growing Bloom-style filter over evicted pair keys.
#[derive(Debug, Clone)]
struct EvictionFilter {
    layers: Vec<FilterLayer>,
    hasher: RandomState,
}

impl EvictionFilter {
    fn with_slots(slots: usize) -> Self {
        Self {
            layers: vec![FilterLayer::new(slots.max(FILTER_MIN_SLOTS), FILTER_BASE_BITS_PER_SLOT)],
            hasher: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
        }
    }

    fn insert(&mut self, key: PairKey) {
        let hash = self.hasher.hash_one(key.packed());
        let Some(last) = self.layers.last() else {
            return;
        };
        if last.is_full() {
            let slots = last.slots.saturating_mul(2);
            let bits_per_slot = FILTER_BASE_BITS_PER_SLOT + FILTER_BITS_STEP * self.layers.len();
            tracing::debug!(layer = self.layers.len(), slots, "eviction filter grown");
            self.layers.push(FilterLayer::new(slots, bits_per_slot));
        }
        if let Some(layer) = self.layers.last_mut() {
            layer.insert(hash);
        }
    }

    fn contains(&self, key: PairKey) -> bool {
        let hash = self.hasher.hash_one(key.packed());
        self.layers.iter().any(|layer| layer.contains(hash))
    }

    #[cfg(test)]
    fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// Pair counter shared by the exact and the bounded generation paths.
#[derive(Debug, Clone)]
pub(crate) struct PairCounter {
    counts: AHashMap<PairKey, u32>,
    capacity: Option<usize>,
    batch: usize,
    evicted: Option<EvictionFilter>,
    stats: CounterStats,
}

impl PairCounter {
    /// Exact counter without capacity.
    pub(crate) fn unbounded() -> Self {
        Self {
            counts: AHashMap::new(),
            capacity: None,
            batch: 0,
            evicted: None,
            stats: CounterStats::default(),
        }
    }

    /// Counter holding at most `capacity` keys; `eviction_fraction` in (0, 1].
    pub(crate) fn bounded(capacity: usize, eviction_fraction: f64) -> Self {
        let capacity = capacity.max(1);
        let batch = ((capacity as f64 * eviction_fraction).ceil() as usize).clamp(1, capacity);
        Self {
            counts: AHashMap::with_capacity(capacity.min(1 << 20)),
            capacity: Some(capacity),
            batch,
            evicted: None,
            stats: CounterStats::default(),
        }
    }

    pub(crate) fn is_bounded(&self) -> bool {
        self.capacity.is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: PairKey) -> Option<u32> {
        self.counts.get(&key).copied()
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> CounterStats {
        self.stats
    }

    /// Adds one observation of `key`. Returns `false` when the increment was
    /// rejected because the key was evicted earlier.
    pub(crate) fn increment(&mut self, key: PairKey) -> bool {
        if let Some(count) = self.counts.get_mut(&key) {
            *count = count.saturating_add(1);
            return true;
        }
        if let Some(filter) = &self.evicted {
            if filter.contains(key) {
                self.stats.rejected_increments += 1;
                return false;
            }
        }
        if let Some(capacity) = self.capacity {
            if self.counts.len() >= capacity {
                self.evict_batch(capacity);
            }
        }
        self.counts.insert(key, 1);
        self.stats.peak_len = self.stats.peak_len.max(self.counts.len());
        true
    }

    fn evict_batch(&mut self, capacity: usize) {
        let mut entries: Vec<(u32, u64)> = self
            .counts
            .iter()
            .map(|(key, &count)| (count, key.packed()))
            .collect();
        let batch = self.batch.min(entries.len());
        if batch == 0 {
            return;
        }
        if batch < entries.len() {
            entries.select_nth_unstable(batch - 1);
        }

        let filter = self
            .evicted
            .get_or_insert_with(|| EvictionFilter::with_slots(capacity));
        for &(_, packed) in &entries[..batch] {
            let key = PairKey::from_packed(packed);
            self.counts.remove(&key);
            filter.insert(key);
        }

        self.stats.evicted_keys += batch;
        self.stats.eviction_rounds += 1;
        tracing::debug!(
            round = self.stats.eviction_rounds,
            evicted = batch,
            held = self.counts.len(),
            "pair counter eviction"
        );
    }

    /// Warning describing eviction activity, if any happened.
    pub(crate) fn warning(&self) -> Option<Warning> {
        let capacity = self.capacity?;
        (self.stats.eviction_rounds > 0).then(|| Warning::CapacityExceeded {
            capacity,
            evicted_keys: self.stats.evicted_keys,
            eviction_rounds: self.stats.eviction_rounds,
            rejected_increments: self.stats.rejected_increments,
        })
    }

    /// Hands the surviving counts over to finalization.
    pub(crate) fn into_counts(self) -> AHashMap<PairKey, u32> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(a: u32, b: u32) -> PairKey {
        PairKey::new(a, b).unwrap()
    }

    #[test]
    fn test_unbounded_counts_exactly() {
        let mut counter = PairCounter::unbounded();
        for _ in 0..5 {
            counter.increment(key(0, 1));
        }
        counter.increment(key(2, 1));
        assert_eq!(counter.get(key(1, 0)), Some(5));
        assert_eq!(counter.get(key(1, 2)), Some(1));
        assert!(counter.warning().is_none());
        assert!(!counter.is_bounded());
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut counter = PairCounter::bounded(10, 0.3);
        for a in 0..50u32 {
            for b in (a + 1)..50 {
                counter.increment(key(a, b));
                assert!(counter.len() <= 10);
            }
        }
        assert!(counter.stats().peak_len <= 10);
        assert!(counter.stats().eviction_rounds > 0);
    }

    #[test]
    fn test_evicts_lowest_counts_first() {
        let mut counter = PairCounter::bounded(4, 0.5);
        for _ in 0..3 {
            counter.increment(key(0, 1));
        }
        counter.increment(key(0, 2));
        counter.increment(key(0, 3));
        counter.increment(key(0, 3));
        counter.increment(key(0, 4));

        counter.increment(key(0, 5));
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.get(key(0, 1)), Some(3));
        assert_eq!(counter.get(key(0, 3)), Some(2));
        assert_eq!(counter.get(key(0, 5)), Some(1));
        assert_eq!(counter.get(key(0, 2)), None);
        assert_eq!(counter.get(key(0, 4)), None);
    }

    #[test]
    fn test_evicted_keys_are_not_resurrected() {
        let mut counter = PairCounter::bounded(2, 0.5);
        counter.increment(key(0, 1));
        counter.increment(key(0, 1));
        counter.increment(key(0, 2));
        counter.increment(key(0, 3));

        assert_eq!(counter.get(key(0, 2)), None);
        assert!(!counter.increment(key(0, 2)));
        assert_eq!(counter.get(key(0, 2)), None);

        let Some(Warning::CapacityExceeded {
            capacity,
            evicted_keys,
            eviction_rounds,
            rejected_increments,
        }) = counter.warning()
        else {
            panic!("expected a capacity warning");
        };
        assert_eq!(capacity, 2);
        assert_eq!(evicted_keys, 1);
        assert_eq!(eviction_rounds, 1);
        assert_eq!(rejected_increments, 1);
    }

    #[test]
    fn test_long_streams_keep_accepting_new_keys() {
        let mut counter = PairCounter::bounded(100, 0.1);
        for i in 0..20_000u32 {
            counter.increment(key(i, i + 1_000_000));
        }
        let stream_rejected = counter.stats().rejected_increments;
        assert!(counter.stats().evicted_keys > 19_000);
        assert!(stream_rejected < 200, "rejected {} of 20000", stream_rejected);

        let fresh_rejected = (0..1_000u32)
            .filter(|&i| !counter.increment(key(i, i + 2_000_000)))
            .count();
        assert!(fresh_rejected < 20, "rejected {} of 1000", fresh_rejected);

        let late = key(5_000_000, 5_000_001);
        for _ in 0..50 {
            assert!(counter.increment(late));
        }
        assert_eq!(counter.get(late), Some(50));
        assert!(counter.len() <= 100);
        assert!(counter.evicted.as_ref().map_or(0, EvictionFilter::layer_count) > 1);
    }

    #[test]
    fn test_repeated_pair_outlives_singleton_churn() {
        let mut counter = PairCounter::bounded(50, 0.2);
        let hot = key(7, 8);
        for i in 0..5_000u32 {
            counter.increment(key(i + 100, i + 100_000));
            if i % 10 == 0 {
                counter.increment(hot);
            }
        }
        assert_eq!(counter.get(hot), Some(500));
    }

    #[test]
    fn test_eviction_is_deterministic() {
        let run = || {
            let mut counter = PairCounter::bounded(16, 0.25);
            for a in 0..30u32 {
                for b in (a + 1)..30 {
                    if (a + b) % 3 != 0 {
                        counter.increment(key(a, b));
                    }
                    counter.increment(key(a % 5, b % 7 + 5));
                }
            }
            let mut counts: Vec<(u64, u32)> = counter
                .into_counts()
                .into_iter()
                .map(|(k, c)| (k.packed(), c))
                .collect();
            counts.sort_unstable();
            counts
        };
        assert_eq!(run(), run());
    }
}
