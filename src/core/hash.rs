//! State Hashing
//!
//! SHA-256 digest over the simulation state, used to compare two runs
//! driven by the same intents.
//!
//! Floats are fed as their IEEE-754 bit pattern with `-0.0` folded into
//! `0.0`. Integers are little-endian.

use sha2::{Digest, Sha256};

use super::vec2::Vec2;

/// 256-bit digest.
pub type StateHash = [u8; 32];

/// Domain prefix for match state digests.
const MATCH_DOMAIN: &[u8] = b"BRAWL_CORE_STATE_V1";

/// Value that can be fed to a [`StateHasher`].
pub trait Hashable {
    /// Append this value's canonical bytes.
    fn feed(&self, hasher: &mut StateHasher);
}

/// Incremental digest over simulation values. Feed order matters.
pub struct StateHasher {
    digest: Sha256,
}

impl StateHasher {
    /// Start a digest under `domain`.
    pub fn with_domain(domain: &[u8]) -> Self {
        let mut digest = Sha256::new();
        digest.update(domain);
        Self { digest }
    }

    /// Feed one value. Returns `self` so calls chain.
    #[inline]
    pub fn add<T: Hashable + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.feed(self);
        self
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Finish the digest.
    pub fn finalize(self) -> StateHash {
        self.digest.finalize().into()
    }
}

impl Hashable for u8 {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.write(&[*self]);
    }
}

impl Hashable for u32 {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.write(&self.to_le_bytes());
    }
}

impl Hashable for u64 {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.write(&self.to_le_bytes());
    }
}

impl Hashable for bool {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.write(&[*self as u8]);
    }
}

impl Hashable for f32 {
    fn feed(&self, hasher: &mut StateHasher) {
        let folded = if *self == 0.0 { 0.0f32 } else { *self };
        hasher.write(&folded.to_bits().to_le_bytes());
    }
}

impl Hashable for Vec2 {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.add(&self.x).add(&self.y);
    }
}

/// Slices are length-prefixed so `[a, b] + [c]` and `[a] + [b, c]` differ.
impl<T: Hashable> Hashable for [T] {
    fn feed(&self, hasher: &mut StateHasher) {
        hasher.add(&(self.len() as u32));
        for item in self {
            item.feed(hasher);
        }
    }
}

/// Digest of a match at `tick`.
///
/// The tick goes in first; `add_state` feeds everything else.
pub fn compute_state_hash<F>(tick: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::with_domain(MATCH_DOMAIN);
    hasher.add(&tick);
    add_state(&mut hasher);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_values_same_digest() {
        let digest = || compute_state_hash(3, |h| {
            h.add(&7u32).add(&2.5f32).add(&Vec2::new(1.0, -4.0)).add(&true);
        });
        assert_eq!(digest(), digest());
    }

    #[test]
    fn test_feed_order_matters() {
        let ab = compute_state_hash(0, |h| {
            h.add(&1u32).add(&2u32);
        });
        let ba = compute_state_hash(0, |h| {
            h.add(&2u32).add(&1u32);
        });
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_negative_zero_folds() {
        let a = compute_state_hash(7, |h| {
            h.add(&0.0f32);
        });
        let b = compute_state_hash(7, |h| {
            h.add(&-0.0f32);
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_tick_is_part_of_digest() {
        let a = compute_state_hash(100, |h| {
            h.add(&5.0f32);
        });
        let b = compute_state_hash(101, |h| {
            h.add(&5.0f32);
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_slices_are_length_prefixed() {
        let split_late = compute_state_hash(0, |h| {
            h.add(&[1u8, 2][..]).add(&[3u8][..]);
        });
        let split_early = compute_state_hash(0, |h| {
            h.add(&[1u8][..]).add(&[2u8, 3][..]);
        });
        assert_ne!(split_late, split_early);
    }

    #[test]
    fn test_domain_separates() {
        let mut a = StateHasher::with_domain(b"a");
        let mut b = StateHasher::with_domain(b"b");
        a.add(&1u8);
        b.add(&1u8);
        assert_ne!(a.finalize(), b.finalize());
    }
}
