//! Deterministic random number generation
//!
//! The generator is xoshiro128** seeded through splitmix32. Every function
//! in this module is a pure value transform: it takes a [`PrngState`] and
//! returns the generated value together with the next state, leaving the
//! input untouched. The same seed produces the same sequence on every
//! platform, so PRNG state can be stored in the game state and replayed.
//!
//! [`Rng`] wraps the pure functions for call sites that prefer to advance
//! a stream in place.

use crate::dice::{self, DiceNotation, DiceRoll};
use crate::{DiceError, RngError};
use serde::{Deserialize, Serialize};

/// Serializable generator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrngState {
    /// The 32-bit seed this stream started from
    pub seed: u32,
    pub s0: u32,
    pub s1: u32,
    pub s2: u32,
    pub s3: u32,
}

const GOLDEN_GAMMA: u32 = 0x9e37_79b9;

fn splitmix32(state: &mut u32) -> u32 {
    *state = state.wrapping_add(GOLDEN_GAMMA);
    let mut z = *state;
    z = (z ^ (z >> 16)).wrapping_mul(0x85eb_ca6b);
    z = (z ^ (z >> 13)).wrapping_mul(0xc2b2_ae35);
    z ^ (z >> 16)
}

/// Initialize a stream from a seed
///
/// The seed is truncated to its low 32 bits before mixing.
pub fn seed(n: i64) -> PrngState {
    let seed = n as u32;
    let mut sm = seed;
    let mut state = PrngState {
        seed,
        s0: splitmix32(&mut sm),
        s1: splitmix32(&mut sm),
        s2: splitmix32(&mut sm),
        s3: splitmix32(&mut sm),
    };
    // xoshiro is stuck at zero forever
    if (state.s0 | state.s1 | state.s2 | state.s3) == 0 {
        state.s0 = GOLDEN_GAMMA;
    }
    state
}

/// Next raw 32-bit output
pub fn next_u32(state: PrngState) -> (u32, PrngState) {
    let PrngState {
        seed,
        mut s0,
        mut s1,
        mut s2,
        mut s3,
    } = state;

    let result = s1.wrapping_mul(5).rotate_left(7).wrapping_mul(9);
    let t = s1 << 9;

    s2 ^= s0;
    s3 ^= s1;
    s1 ^= s2;
    s0 ^= s3;
    s2 ^= t;
    s3 = s3.rotate_left(11);

    (
        result,
        PrngState {
            seed,
            s0,
            s1,
            s2,
            s3,
        },
    )
}

/// Float in `[0, 1)`
pub fn random_float(state: PrngState) -> (f64, PrngState) {
    let (raw, next) = next_u32(state);
    (raw as f64 / 4_294_967_296.0, next)
}

/// Integer in `[min, max]`, inclusive on both ends
pub fn random_int(state: PrngState, min: i64, max: i64) -> Result<(i64, PrngState), RngError> {
    if max < min {
        return Err(RngError::InvalidRange { min, max });
    }
    let (f, next) = random_float(state);
    // Widened so the full i64 range does not overflow
    let span = (max as i128 - min as i128 + 1) as f64;
    let offset = (f * span).floor() as i128;
    Ok(((min as i128 + offset).min(max as i128) as i64, next))
}

/// Pick one element uniformly
pub fn random_pick<T>(state: PrngState, items: &[T]) -> Result<(&T, PrngState), RngError> {
    if items.is_empty() {
        return Err(RngError::EmptyCollection);
    }
    let (index, next) = random_int(state, 0, items.len() as i64 - 1)?;
    Ok((&items[index as usize], next))
}

/// Fisher-Yates shuffle into a new vector, one draw per swap
pub fn shuffle<T: Clone>(state: PrngState, items: &[T]) -> (Vec<T>, PrngState) {
    let mut out = items.to_vec();
    let mut state = state;
    for i in (1..out.len()).rev() {
        // Same draw as random_int(state, 0, i)
        let (raw, next) = random_float(state);
        state = next;
        let j = (raw * (i + 1) as f64).floor() as usize;
        out.swap(i, j);
    }
    (out, state)
}

/// True with the given probability
pub fn chance(state: PrngState, probability: f64) -> (bool, PrngState) {
    let (f, next) = random_float(state);
    (f < probability, next)
}

/// Pick an index proportionally to `weights`
pub fn weighted_index(state: PrngState, weights: &[f64]) -> Result<(usize, PrngState), RngError> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
        return Err(RngError::InvalidWeights);
    }

    let (f, next) = random_float(state);
    let mut threshold = f * total;
    for (i, &weight) in weights.iter().enumerate() {
        if threshold < weight {
            return Ok((i, next));
        }
        threshold -= weight;
    }

    // Float rounding can leave a sliver past the last bucket
    let last = weights.iter().rposition(|w| *w > 0.0).unwrap_or(weights.len() - 1);
    Ok((last, next))
}

/// A mutable stream over the pure generator
///
/// Each method advances the held state in place. `snapshot`/`restore` let a
/// caller persist the stream alongside a save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rng {
    state: PrngState,
}

impl Rng {
    /// Create a new stream with the given seed
    pub fn new(seed_value: i64) -> Self {
        Self {
            state: seed(seed_value),
        }
    }

    /// Resume a stream from a saved state
    pub fn from_state(state: PrngState) -> Self {
        Self { state }
    }

    /// Integer in `[min, max]`
    pub fn int(&mut self, min: i64, max: i64) -> Result<i64, RngError> {
        let (value, next) = random_int(self.state, min, max)?;
        self.state = next;
        Ok(value)
    }

    /// Float in `[0, 1)`
    pub fn float(&mut self) -> f64 {
        let (value, next) = random_float(self.state);
        self.state = next;
        value
    }

    /// True with the given probability
    pub fn chance(&mut self, probability: f64) -> bool {
        let (value, next) = chance(self.state, probability);
        self.state = next;
        value
    }

    /// Pick one element uniformly
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RngError> {
        let (item, next) = random_pick(self.state, items)?;
        self.state = next;
        Ok(item)
    }

    /// Shuffled copy of `items`
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let (out, next) = shuffle(self.state, items);
        self.state = next;
        out
    }

    /// Roll dice notation such as `2d6+3`
    pub fn roll(&mut self, notation: &str) -> Result<i64, DiceError> {
        let (total, next) = dice::roll_dice(self.state, notation)?;
        self.state = next;
        Ok(total)
    }

    /// Roll a parsed notation, keeping every die
    pub fn roll_detailed(&mut self, notation: &DiceNotation) -> DiceRoll {
        let (roll, next) = dice::roll_detailed(self.state, notation);
        self.state = next;
        roll
    }

    /// Current state, for saving
    pub fn snapshot(&self) -> PrngState {
        self.state
    }

    /// Rewind or jump to a saved state
    pub fn restore(&mut self, state: PrngState) {
        self.state = state;
    }

    /// Derive an independent child stream
    ///
    /// Consumes exactly one draw from this stream and uses it as the
    /// child's seed.
    pub fn fork(&mut self) -> Rng {
        let (raw, next) = next_u32(self.state);
        self.state = next;
        Rng::new(raw as i64)
    }
}
