//! Seed hashing into a starting position and heading.
//!
//! The hash must be bit-identical across platforms so every viewer given the
//! same seed draws the same trajectory.

use super::{Arena, Direction, InitialState};

const MIX_OFFSET: u32 = 0x3243_f6a8;
const MIX_MULTIPLIERS: [u32; 2] = [0xd168_aaad, 0xaf72_3597];
const COORDINATE_MASK: u32 = 0x7FFF;

/// Hashes the textual form of a seed into 32 bits.
///
/// Characters are consumed as UTF-16 code units with a `31 * h + c`
/// accumulator, then finalised with three add/multiply-xorshift rounds.
/// All arithmetic wraps at 32 bits.
pub fn hash_seed(seed: &str) -> u32 {
    let mut h = seed
        .encode_utf16()
        .fold(0_u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));

    h = h.wrapping_add(MIX_OFFSET);
    h ^= h >> 15;
    for multiplier in MIX_MULTIPLIERS {
        h = h.wrapping_mul(multiplier);
        h ^= h >> 15;
    }
    h
}

/// Splits a seed hash into an [`InitialState`] that lies inside `arena`.
///
/// Bit 31 selects the x heading, bit 30 the y heading, bits 15..30 the x
/// coordinate and bits 0..15 the y coordinate, each reduced modulo the
/// arena extent.
pub fn derive_initial_state(seed: &str, arena: Arena) -> InitialState {
    initial_state_from_hash(hash_seed(seed), arena)
}

pub(crate) fn initial_state_from_hash(hash: u32, arena: Arena) -> InitialState {
    let x_reversed = hash >> 31 == 1;
    let y_reversed = (hash >> 30) & 1 == 1;

    let x = ((hash >> 15) & COORDINATE_MASK) % arena.width();
    let y = (hash & COORDINATE_MASK) % arena.height();

    InitialState {
        x,
        y,
        x_dir: if x_reversed {
            Direction::Backward
        } else {
            Direction::Forward
        },
        y_dir: if y_reversed {
            Direction::Backward
        } else {
            Direction::Forward
        },
    }
}
