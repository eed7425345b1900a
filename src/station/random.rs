use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chance decisions are injected so scheduling stays reproducible: the same
/// seed gives the same run, and tests can turn chance off entirely.
pub trait RandomSource {
    /// Asked once per stopped train per tick: should it try to leave now?
    fn departure_ready(&mut self) -> bool;
}

/// Seeded departure gate for normal runs.
pub struct SeededDepartures {
    rng: StdRng,
    probability: f64,
}

impl SeededDepartures {
    pub fn new(seed: u64, probability: f64) -> SeededDepartures {
        SeededDepartures {
            rng: StdRng::seed_from_u64(seed),
            probability: probability,
        }
    }
}

impl RandomSource for SeededDepartures {
    fn departure_ready(&mut self) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Timetable-only runs: trains leave only on explicit depart actions.
pub struct NoDepartures;

impl RandomSource for NoDepartures {
    fn departure_ready(&mut self) -> bool {
        false
    }
}
