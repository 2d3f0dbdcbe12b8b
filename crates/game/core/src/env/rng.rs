//! Seeded randomness for board generation, ore and respawns.
//!
//! The engine never keeps generator state. Each roll hashes the match seed,
//! the action nonce, the entity and a draw context with [`compute_seed`] and
//! feeds the result to an [`RngOracle`]. Replaying the same actions from the
//! same seed therefore reproduces the same board.

/// Stateless source of random numbers keyed by a seed.
///
/// `next_u32` must return the same value for the same seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// 1..=100.
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Uniform-ish value in `min..=max`. Returns `min` for an empty range.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }

    /// Pick an index below `len`, or `None` for an empty slice.
    fn pick(&self, seed: u64, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_u32(seed) as usize % len)
    }
}

/// PCG-XSH-RR: one LCG step on the seed, then the xorshift/rotate output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn advance(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn permute(state: u64) -> u32 {
        let mixed = (((state >> 18) ^ state) >> 27) as u32;
        mixed.rotate_right((state >> 59) as u32)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::permute(Self::advance(seed))
    }
}

/// Draw contexts, so two rolls inside one action never share a seed.
pub mod draw {
    pub const OBSTACLE: u32 = 1;
    pub const ORE_CELL: u32 = 2;
    pub const ORE_SIZE: u32 = 3;
    pub const RESPAWN_ADJACENT: u32 = 4;
    pub const RESPAWN_SLOT: u32 = 5;
}

/// Seed for one roll. `actor` is a stable number for the entity the roll is
/// about and `context` is one of the [`draw`] constants.
pub fn compute_seed(game_seed: u64, nonce: u64, actor: u32, context: u32) -> u64 {
    let mut hash = game_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}
