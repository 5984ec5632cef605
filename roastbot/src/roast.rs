//! Roast selection for overdue notifications.
//!
//! Each call draws a tier uniformly, then a message uniformly from that
//! tier's fixed set. No history is kept, so repeats are possible.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roastbot_proto::roast::RoastTier;

/// A selected roast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roast {
    /// Severity tier.
    pub tier: RoastTier,
    /// Message drawn from the tier's set.
    pub message: &'static str,
}

/// Stateless (history-free) random roast picker with an injectable seed.
pub struct RoastSelector {
    rng: Mutex<StdRng>,
}

impl RoastSelector {
    /// Selector seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic selector for tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick a tier and a message.
    pub fn select(&self) -> Roast {
        let mut rng = self.rng.lock();
        let tier = RoastTier::ALL[rng.random_range(0..RoastTier::ALL.len())];
        let messages = tier.messages();
        let message = messages[rng.random_range(0..messages.len())];
        Roast { tier, message }
    }
}

impl Default for RoastSelector {
    fn default() -> Self {
        Self::new()
    }
}
