//! Deterministic random streams for an exploration session.
//!
//! Each concern draws from its own stream so that, for example, a combat
//! resolution never shifts the sequence of generated log entries.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Draw calls made against each stream of an [`RngBundle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDraws {
    pub generator: u64,
    pub combat: u64,
    pub ids: u64,
}

/// Independent RNG streams derived from a single user-visible seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    generator: CountingRng<SmallRng>,
    combat: CountingRng<SmallRng>,
    ids: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            generator: CountingRng::new(derive_stream_seed(seed, b"generator")),
            combat: CountingRng::new(derive_stream_seed(seed, b"combat")),
            ids: CountingRng::new(derive_stream_seed(seed, b"ids")),
        }
    }

    /// Seed the bundle was derived from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn draw_counts(&self) -> StreamDraws {
        StreamDraws {
            generator: self.generator.draws(),
            combat: self.combat.draws(),
            ids: self.ids.draws(),
        }
    }

    /// Stream feeding entry kinds, templates, rewards and choice thresholds.
    pub const fn generator(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.generator
    }

    /// Stream feeding enemy spawns and damage rolls.
    pub const fn combat(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.combat
    }

    /// Stream feeding entry id suffixes.
    pub const fn ids(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.ids
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so the fallback is unreachable in practice.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
