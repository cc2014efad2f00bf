// Canonical unordered pair of dense ids
use std::fmt;

/// Unordered pair of dense integer ids, stored smaller id first.
///
/// Packs into a single `u64` whose natural order is the canonical pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PairKey(u64);

impl PairKey {
    /// Returns `None` for a self pair.
    #[inline]
    pub(crate) fn new(a: u32, b: u32) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self::pack(a, b)),
            std::cmp::Ordering::Greater => Some(Self::pack(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    fn pack(lo: u32, hi: u32) -> Self {
        PairKey(((lo as u64) << 32) | hi as u64)
    }

    #[inline]
    pub(crate) fn low(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub(crate) fn high(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub(crate) fn packed(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn from_packed(packed: u64) -> Self {
        PairKey(packed)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low(), self.high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let a = PairKey::new(7, 3).unwrap();
        let b = PairKey::new(3, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.low(), 3);
        assert_eq!(a.high(), 7);
        assert!(PairKey::new(4, 4).is_none());
    }

    #[test]
    fn test_packed_order_matches_pair_order() {
        let mut keys = vec![
            PairKey::new(2, 9).unwrap(),
            PairKey::new(1, u32::MAX).unwrap(),
            PairKey::new(2, 3).unwrap(),
        ];
        keys.sort();
        let pairs: Vec<_> = keys.iter().map(|k| (k.low(), k.high())).collect();
        assert_eq!(pairs, vec![(1, u32::MAX), (2, 3), (2, 9)]);
    }
}
