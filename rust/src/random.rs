//! Abstraction over the random source driving generation and assignment.
//!
//! Every draw in a run goes through [`Random`], so a seeded [`SmallRng`] makes a
//! run reproducible end to end and tests can substitute scripted draws.

use std::fmt::Debug;
use std::ops::Range;

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

/// Source of uniform draws for one simulation run.
pub trait Random: Debug {
    /// Returns true with probability `probability`, which must lie in `[0, 1]`.
    fn generate_bool(&mut self, probability: f64) -> bool;

    /// Uniform draw from `[range.start, range.end)`. The range must be non-empty.
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;

    /// Uniform draw from `[lb, ub]`.
    fn generate_u32_in_range(&mut self, lb: u32, ub: u32) -> u32;

    /// Uniform draw from `[lb, ub]`.
    fn generate_u64_in_range(&mut self, lb: u64, ub: u64) -> u64;

    /// Draw `k` distinct indices from `0..n` without replacement.
    ///
    /// Partial Fisher-Yates: the result order follows the draws.
    fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        debug_assert!(k <= n, "cannot sample {k} of {n} indices");
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = self.generate_usize_in_range(i..n);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}

impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_bool(&mut self, probability: f64) -> bool {
        debug_assert!(
            (0.0..=1.0).contains(&probability),
            "It should hold that 0.0 <= {probability} <= 1.0"
        );
        self.gen_bool(probability)
    }

    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }

    fn generate_u32_in_range(&mut self, lb: u32, ub: u32) -> u32 {
        self.gen_range(lb..=ub)
    }

    fn generate_u64_in_range(&mut self, lb: u64, ub: u64) -> u64 {
        self.gen_range(lb..=ub)
    }
}

/// Build the random source for a run: seeded when a seed is given, otherwise
/// seeded from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> Box<dyn Random> {
    match seed {
        Some(seed) => Box::new(SmallRng::seed_from_u64(seed)),
        None => Box::new(SmallRng::from_entropy()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Returns pre-scripted values in order; panics when a script runs dry or a
    /// value falls outside the requested range.
    #[derive(Debug, Default)]
    pub(crate) struct TestRandom {
        pub(crate) usizes: VecDeque<usize>,
        pub(crate) integers: VecDeque<u64>,
        pub(crate) bools: VecDeque<bool>,
    }

    impl Random for TestRandom {
        fn generate_bool(&mut self, _probability: f64) -> bool {
            self.bools.pop_front().expect("TestRandom ran out of bools")
        }

        fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
            let selected = self.usizes.pop_front().expect("TestRandom ran out of usizes");
            assert!(
                range.contains(&selected),
                "scripted value {selected} is outside {range:?}"
            );
            selected
        }

        fn generate_u32_in_range(&mut self, lb: u32, ub: u32) -> u32 {
            self.generate_u64_in_range(lb as u64, ub as u64) as u32
        }

        fn generate_u64_in_range(&mut self, lb: u64, ub: u64) -> u64 {
            let selected = self
                .integers
                .pop_front()
                .expect("TestRandom ran out of integers");
            assert!(
                (lb..=ub).contains(&selected),
                "scripted value {selected} is outside {lb}..={ub}"
            );
            selected
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = rng_from_seed(Some(42));
        let mut b = rng_from_seed(Some(42));
        let draws_a: Vec<u32> = (0..16).map(|_| a.generate_u32_in_range(1, 10)).collect();
        let draws_b: Vec<u32> = (0..16).map(|_| b.generate_u32_in_range(1, 10)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().all(|d| (1..=10).contains(d)));
    }

    #[test]
    fn test_sample_indices_distinct_and_in_range() {
        let mut rng = SmallRng::seed_from_u64(3);
        for n in 0..12 {
            for k in 0..=n {
                let mut sample = rng.sample_indices(n, k);
                assert_eq!(sample.len(), k);
                assert!(sample.iter().all(|&i| i < n));
                sample.sort_unstable();
                sample.dedup();
                assert_eq!(sample.len(), k);
            }
        }
    }

    #[test]
    fn test_sample_indices_follows_draws() {
        let mut rng = TestRandom {
            usizes: VecDeque::from(vec![2, 2]),
            ..Default::default()
        };
        // [0, 1, 2] -> swap(0, 2) -> [2, 1, 0] -> swap(1, 2) -> [2, 0, 1]
        assert_eq!(rng.sample_indices(3, 2), vec![2, 0]);
    }
}
