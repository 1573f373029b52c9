// Seedable pseudo-random stream for lick generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64,
// plus the handful of sampling helpers the generator needs: unit floats,
// unbiased integer ranges, coin flips, uniform slice picks, and weighted
// index draws.
//
// Every random decision in the engine (target planning, scale selection,
// device selection, device internals, rest insertion) draws from a `LickRng`
// passed in explicitly by the caller. There is no ambient generator anywhere
// in the workspace, so two runs with the same seed and inputs produce the
// same lick, and tests can run in parallel without sharing state.
//
// **Critical constraint: determinism.** The core generator uses integer
// arithmetic only. Float helpers are derived from the integer stream with a
// fixed bit layout, so the same seed gives the same floats on every platform.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator: the only source of randomness in a generation call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LickRng {
    s: [u64; 4],
}

impl LickRng {
    /// Create a generator from a `u64` seed.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// still give unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent child stream. Consumes one draw from the parent.
    pub fn fork(&mut self) -> Self {
        LickRng::new(self.next_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)` by rejection sampling (no modulo bias).
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `usize` in `[low, high]`. Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// `true` with probability `p`. `p <= 0.0` never fires, `p >= 1.0` always does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    /// Uniform pick from a slice, `None` when it is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }

    /// Draw an index with probability proportional to `weights[i]`.
    ///
    /// Negative and NaN weights count as zero. If every weight is zero the
    /// draw is uniform. Returns `None` only for an empty slice.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().map(|&w| clean(w)).sum();
        if total <= 0.0 {
            return Some(self.range_usize(0, weights.len()));
        }
        let r = self.next_f64() * total;
        let mut cum = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cum += clean(w);
            if r < cum {
                return Some(i);
            }
        }
        // Rounding can leave r == total; land on the last positive weight.
        weights.iter().rposition(|&w| clean(w) > 0.0)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = LickRng::new(42);
        let mut b = LickRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = LickRng::new(42);
        let mut b = LickRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = LickRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn inclusive_range_reaches_both_ends() {
        let mut rng = LickRng::new(666);
        let mut seen = [false; 5];
        for _ in 0..10_000 {
            let v = rng.range_usize_inclusive(3, 7);
            assert!((3..=7).contains(&v));
            seen[v - 3] = true;
        }
        assert!(seen.iter().all(|&s| s), "every value 3..=7 should appear");
    }

    #[test]
    fn coin_is_roughly_fair() {
        let mut rng = LickRng::new(7);
        let heads = (0..10_000).filter(|_| rng.coin()).count();
        let pct = heads as f64 / 10_000.0;
        assert!((0.45..0.55).contains(&pct), "coin gave {:.1}% heads", pct * 100.0);
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = LickRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn pick_empty_is_none() {
        let mut rng = LickRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[9]), Some(&9));
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = LickRng::new(99);
        for _ in 0..2_000 {
            let i = rng.weighted_index(&[0.0, 1.0, 0.0, 3.0]).unwrap();
            assert!(i == 1 || i == 3, "zero-weight index {i} drawn");
        }
    }

    #[test]
    fn weighted_index_proportions() {
        let mut rng = LickRng::new(5);
        let n = 20_000;
        let mut counts = [0usize; 2];
        for _ in 0..n {
            counts[rng.weighted_index(&[1.0, 3.0]).unwrap()] += 1;
        }
        let pct = counts[1] as f64 / n as f64;
        assert!((0.70..0.80).contains(&pct), "expected ~75%, got {:.1}%", pct * 100.0);
    }

    #[test]
    fn weighted_index_all_zero_is_uniform_fallback() {
        let mut rng = LickRng::new(3);
        assert!(rng.weighted_index(&[]).is_none());
        for _ in 0..100 {
            assert!(rng.weighted_index(&[0.0, 0.0, 0.0]).unwrap() < 3);
        }
    }

    #[test]
    fn fork_is_deterministic() {
        let mut a = LickRng::new(11);
        let mut b = LickRng::new(11);
        let mut fa = a.fork();
        let mut fb = b.fork();
        assert_eq!(fa.next_u64(), fb.next_u64());
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn serialization_roundtrip_continues_stream() {
        let mut rng = LickRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: LickRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
