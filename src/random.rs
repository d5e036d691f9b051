use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform index choices for the simulators.
pub trait RandomSource: Send {
    /// Returns an index in `0..len`. `len` is always non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Reproducible choices from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed list of choices, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    choices: Vec<usize>,
    position: usize,
}

impl ScriptedRandom {
    pub fn new(choices: Vec<usize>) -> Self {
        Self {
            choices,
            position: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn pick(&mut self, len: usize) -> usize {
        if self.choices.is_empty() {
            return 0;
        }
        let choice = self.choices[self.position % self.choices.len()];
        self.position += 1;
        choice % len
    }
}

/// Picks a source from an optional seed: seeded when given, thread-local otherwise.
pub fn from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let xs: Vec<usize> = (0..20).map(|_| a.pick(6)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.pick(6)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&x| x < 6));
    }

    #[test]
    fn scripted_cycles_and_wraps_into_range() {
        let mut scripted = ScriptedRandom::new(vec![1, 5]);
        assert_eq!(scripted.pick(4), 1);
        assert_eq!(scripted.pick(4), 1);
        assert_eq!(scripted.pick(4), 1);
        assert_eq!(scripted.pick(10), 5);
    }

    #[test]
    fn thread_random_stays_in_range() {
        let mut rng = ThreadRandom;
        assert!((0..100).all(|_| rng.pick(4) < 4));
    }
}
