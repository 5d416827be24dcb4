//! Turning raw model output into a valid 15-number prediction.
//!
//! Numbers are chosen in three passes, each skipping duplicates:
//!
//! 1. Model-derived: the first `budget` output slots, each decoded as
//!    `round(clamp(v, 0, 1) × 24) + 1`. NaN slots are skipped.
//! 2. Hot numbers, most frequent first.
//! 3. Uniform random numbers from `1..=25`, at most [`MAX_RANDOM_ATTEMPTS`]
//!    draws, then an ascending sweep of whatever is still missing.
//!
//! The result always holds exactly 15 distinct numbers in `1..=25`.

use lotofacil_model::{FeatureWindow, Model, ShapeMismatchError};
use rand::Rng;

use crate::draw::{MAX_NUMBER, MIN_NUMBER, NumberSet};

/// Upper bound on random fill draws before falling back to the sweep.
pub const MAX_RANDOM_ATTEMPTS: usize = 1000;

/// One agent's prediction and the model output it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub numbers: NumberSet,
    pub raw: Vec<f32>,
}

/// Maps one output slot to a number in `1..=25`, or `None` for NaN.
#[must_use]
pub fn decode_slot(value: f32) -> Option<u8> {
    if value.is_nan() {
        return None;
    }
    let span = f32::from(MAX_NUMBER - MIN_NUMBER);
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let offset = (value.clamp(0.0, 1.0) * span).round() as u8;
    Some(MIN_NUMBER + offset)
}

/// Builds a full prediction set from raw model output and hot numbers.
pub fn assemble<R>(raw: &[f32], budget: usize, hot_numbers: &[u8], rng: &mut R) -> NumberSet
where
    R: Rng + ?Sized,
{
    let mut numbers = NumberSet::new();

    for number in raw.iter().take(budget).filter_map(|&v| decode_slot(v)) {
        if numbers.is_full() {
            break;
        }
        numbers.insert(number);
    }

    for &number in hot_numbers {
        if numbers.is_full() {
            break;
        }
        numbers.insert(number);
    }

    let mut attempts = 0;
    while !numbers.is_full() && attempts < MAX_RANDOM_ATTEMPTS {
        numbers.insert(rng.random_range(MIN_NUMBER..=MAX_NUMBER));
        attempts += 1;
    }

    for number in MIN_NUMBER..=MAX_NUMBER {
        if numbers.is_full() {
            break;
        }
        numbers.insert(number);
    }

    numbers
}

/// Runs inference and assembles the prediction. Never mutates the model.
pub fn predict<R>(
    model: &dyn Model,
    window: &FeatureWindow,
    budget: usize,
    hot_numbers: &[u8],
    rng: &mut R,
) -> Result<Prediction, ShapeMismatchError>
where
    R: Rng + ?Sized,
{
    let raw = model.predict(window)?;
    let numbers = assemble(&raw, budget, hot_numbers, rng);
    Ok(Prediction { numbers, raw })
}
