//! Weighted random selection shared by the entry generator and enemy spawner.

use rand::Rng;

/// Pick one outcome from `(outcome, weight)` pairs.
///
/// Returns `None` when the table is empty or every weight is zero.
pub fn choose_weighted<T: Copy, R: Rng + ?Sized>(table: &[(T, u32)], rng: &mut R) -> Option<T> {
    let total_weight: u32 = table.iter().map(|(_, weight)| *weight).sum();
    if total_weight == 0 {
        return None;
    }

    let roll = rng.gen_range(0..total_weight);
    let mut current = 0;
    for (outcome, weight) in table {
        current += *weight;
        if roll < current {
            return Some(*outcome);
        }
    }

    table.first().map(|(outcome, _)| *outcome)
}

/// Percent roll: true with probability `pct / 100`.
pub fn roll_pct<R: Rng + ?Sized>(rng: &mut R, pct: u32) -> bool {
    rng.gen_range(0..100) < pct.min(100)
}
