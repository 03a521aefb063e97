use sha2::{Digest, Sha256};

/// Deterministic id source for interpreter output
///
/// Ids are `<prefix>_<seed>_<n>` where the seed is a SHA-256 digest of the
/// inputs the interpreter ran on. The same inputs always produce the same
/// ids, so interpretation stays pure and repeatable, while different diffs
/// produce ids that do not collide with each other.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    seed: String,
    next: usize,
}

impl IdAllocator {
    pub fn seeded(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hex::encode(hasher.finalize());
        Self {
            seed: digest[..12].to_string(),
            next: 0,
        }
    }

    /// Continue from a derived namespace (used for alternative suggestions)
    pub fn fork(&self, label: &str) -> Self {
        Self::seeded(&[&self.seed, label])
    }

    pub fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}_{}", prefix, self.seed, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_ids() {
        let mut a = IdAllocator::seeded(&["diff", "sample-0"]);
        let mut b = IdAllocator::seeded(&["diff", "sample-0"]);
        assert_eq!(a.next_id("shape"), b.next_id("shape"));
        assert_eq!(a.next_id("field"), b.next_id("field"));
    }

    #[test]
    fn test_part_boundaries_matter() {
        let mut a = IdAllocator::seeded(&["ab", "c"]);
        let mut b = IdAllocator::seeded(&["a", "bc"]);
        assert_ne!(a.next_id("s"), b.next_id("s"));
    }

    #[test]
    fn test_counter_increments() {
        let mut ids = IdAllocator::seeded(&["x"]);
        let first = ids.next_id("shape");
        let second = ids.next_id("shape");
        assert!(first.ends_with("_0"));
        assert!(second.ends_with("_1"));
        assert_ne!(ids.fork("alt").next_id("shape"), first);
    }
}
