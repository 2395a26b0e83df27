//! Random display names for philosophers.
//!
//! Names are `adjective_surname`, docker style. A run needs N distinct
//! names, so collisions are rerolled with a numeric suffix.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

const ADJECTIVES: &[&str] = &[
    "admiring", "adoring", "affectionate", "agitated", "amazing", "angry", "awesome", "blissful",
    "bold", "boring", "brave", "charming", "clever", "compassionate", "competent", "confident",
    "cranky", "dazzling", "determined", "distracted", "dreamy", "eager", "ecstatic", "elastic",
    "elated", "elegant", "eloquent", "epic", "fervent", "festive", "focused", "friendly",
    "frosty", "gallant", "gifted", "goofy", "gracious", "happy", "hardcore", "hopeful",
    "hungry", "infallible", "inspiring", "jolly", "jovial", "keen", "kind", "laughing",
    "loving", "lucid", "magical", "modest", "musing", "mystifying", "naughty", "nervous",
    "nostalgic", "objective", "optimistic", "peaceful", "pedantic", "pensive", "practical",
    "priceless", "quirky", "quizzical", "relaxed", "reverent", "romantic", "serene", "sharp",
    "silly", "sleepy", "stoic", "suspicious", "tender", "thirsty", "trusting", "upbeat",
    "vibrant", "vigilant", "wizardly", "wonderful", "xenodochial", "youthful", "zealous", "zen",
];

const SURNAMES: &[&str] = &[
    "archimedes", "aristotle", "bacon", "beauvoir", "bentham", "berkeley", "boole", "camus",
    "confucius", "democritus", "descartes", "diogenes", "dijkstra", "epicurus", "euclid",
    "frege", "godel", "hegel", "heraclitus", "hobbes", "hopper", "hume", "hypatia", "kant",
    "kierkegaard", "lamport", "leibniz", "locke", "lovelace", "machiavelli", "marcus",
    "montaigne", "nietzsche", "noether", "parmenides", "pascal", "plato", "popper",
    "pythagoras", "rousseau", "russell", "sartre", "seneca", "socrates", "spinoza", "thales",
    "turing", "voltaire", "wittgenstein", "wozniak", "zeno",
];

/// Seeded generator of unique philosopher names.
pub struct NameGenerator {
    rng: ChaCha8Rng,
}

impl NameGenerator {
    /// Creates a generator; the same seed yields the same names.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws one name. A non-zero `retry` appends a random digit.
    pub fn next_name(&mut self, retry: u32) -> String {
        loop {
            let adjective = ADJECTIVES.choose(&mut self.rng).copied().unwrap_or("hungry");
            let surname = SURNAMES.choose(&mut self.rng).copied().unwrap_or("plato");
            let name = format!("{}_{}", adjective, surname);

            // Steve Wozniak is not boring
            if name == "boring_wozniak" {
                continue;
            }

            if retry > 0 {
                return format!("{}{}", name, self.rng.gen_range(0..10));
            }
            return name;
        }
    }

    /// Draws `count` distinct names.
    pub fn unique(&mut self, count: usize) -> Vec<String> {
        let mut seen = HashSet::with_capacity(count);
        let mut names = Vec::with_capacity(count);

        for seat in 0..count {
            let mut retry = 0;
            let name = loop {
                let candidate = if retry < 8 {
                    self.next_name(retry)
                } else {
                    // Drawn names never contain `_<digits>`, so the seat suffix cannot collide
                    format!("{}_{}", self.next_name(0), seat)
                };
                if seen.insert(candidate.clone()) {
                    break candidate;
                }
                retry += 1;
            };
            names.push(name);
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_shape() {
        let mut generator = NameGenerator::new(1);
        let name = generator.next_name(0);
        let (adjective, surname) = name.split_once('_').unwrap();
        assert!(ADJECTIVES.contains(&adjective));
        assert!(SURNAMES.contains(&surname));
    }

    #[test]
    fn test_retry_appends_digit() {
        let mut generator = NameGenerator::new(1);
        let name = generator.next_name(1);
        assert!(name.chars().last().unwrap().is_ascii_digit());
    }

    #[test]
    fn test_same_seed_same_names() {
        let a = NameGenerator::new(42).unique(20);
        let b = NameGenerator::new(42).unique(20);
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_names_are_unique(seed in any::<u64>(), count in 0usize..3000) {
            let names = NameGenerator::new(seed).unique(count);
            prop_assert_eq!(names.len(), count);

            let distinct: HashSet<&String> = names.iter().collect();
            prop_assert_eq!(distinct.len(), count);
            prop_assert!(names.iter().all(|n| !n.is_empty()));
        }
    }
}
