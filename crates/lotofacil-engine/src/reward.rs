//! Reward policies mapping a prediction's match count to a score increment.
//!
//! | policy | 0 | 1..=10 | 11 | 12..=15 |
//! |---|---|---|---|---|
//! | [`Strict`] | 0 | 0 | 1 | `matches - 10` |
//! | [`Bonus`] | strict + `matches × hot_on_board × 0.1` | | | |
//! | [`Exponential`] | 0 | `2^matches` | 1000 | `2^(matches - 11) × 1000` |
//! | [`Penalized`] | -1.1 | `(matches - 11) × 0.1` | 1 | `matches - 10` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draw::NumberSet;

/// Lowest match count that earns the base reward.
pub const REWARD_BAND_START: usize = 11;

const HOT_BONUS_FACTOR: f64 = 0.1;
const PENALTY_FACTOR: f64 = 0.1;
const EXPONENTIAL_BASE_REWARD: f64 = 1000.0;

/// Pluggable scoring strategy.
pub trait RewardPolicy: fmt::Debug + Send + Sync {
    /// Returns the reward for a prediction that matched `matches` numbers of `board`.
    fn reward(&self, matches: usize, hot_numbers: &[u8], board: &NumberSet) -> f64;
}

pub type BoxedRewardPolicy = Box<dyn RewardPolicy>;

fn strict(matches: usize) -> f64 {
    if matches >= REWARD_BAND_START {
        band_offset(matches, 10)
    } else {
        0.0
    }
}

#[expect(clippy::cast_precision_loss)]
fn band_offset(matches: usize, base: usize) -> f64 {
    matches as f64 - base as f64
}

/// `matches - 10` inside `11..=15`, zero elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl RewardPolicy for Strict {
    fn reward(&self, matches: usize, _hot_numbers: &[u8], _board: &NumberSet) -> f64 {
        strict(matches)
    }
}

/// [`Strict`] plus a bonus for hot numbers that appear on the board.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bonus;

impl RewardPolicy for Bonus {
    fn reward(&self, matches: usize, hot_numbers: &[u8], board: &NumberSet) -> f64 {
        let hot_on_board = hot_numbers.iter().filter(|&&n| board.contains(n)).count();
        #[expect(clippy::cast_precision_loss)]
        let bonus = (matches * hot_on_board) as f64 * HOT_BONUS_FACTOR;
        strict(matches) + bonus
    }
}

/// Doubles per match, with a large jump at the start of the band.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exponential;

impl RewardPolicy for Exponential {
    fn reward(&self, matches: usize, _hot_numbers: &[u8], _board: &NumberSet) -> f64 {
        let doublings = |n: usize| i32::try_from(n).map_or(f64::INFINITY, |n| 2_f64.powi(n));
        match matches {
            0 => 0.0,
            m if m < REWARD_BAND_START => doublings(m),
            m => doublings(m - REWARD_BAND_START) * EXPONENTIAL_BASE_REWARD,
        }
    }
}

/// [`Strict`] inside the band, a small negative reward below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Penalized;

impl RewardPolicy for Penalized {
    fn reward(&self, matches: usize, _hot_numbers: &[u8], _board: &NumberSet) -> f64 {
        if matches >= REWARD_BAND_START {
            strict(matches)
        } else {
            band_offset(matches, REWARD_BAND_START) * PENALTY_FACTOR
        }
    }
}

/// Reward policy selector.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    #[default]
    #[display("strict")]
    Strict,
    #[display("bonus")]
    Bonus,
    #[display("exponential")]
    Exponential,
    #[display("penalized")]
    Penalized,
}

impl RewardKind {
    #[must_use]
    pub fn policy(self) -> BoxedRewardPolicy {
        match self {
            Self::Strict => Box::new(Strict),
            Self::Bonus => Box::new(Bonus),
            Self::Exponential => Box::new(Exponential),
            Self::Penalized => Box::new(Penalized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> NumberSet {
        NumberSet::from_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).unwrap()
    }

    fn reward(kind: RewardKind, matches: usize) -> f64 {
        kind.policy().reward(matches, &[1, 2, 20], &board())
    }

    #[test]
    fn test_strict_band() {
        assert!((reward(RewardKind::Strict, 11) - 1.0).abs() < f64::EPSILON);
        assert!((reward(RewardKind::Strict, 15) - 5.0).abs() < f64::EPSILON);
        assert!(reward(RewardKind::Strict, 10).abs() < f64::EPSILON);
        assert!(reward(RewardKind::Strict, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bonus_counts_hot_numbers_on_board() {
        // two of the three hot numbers are on the board
        assert!((reward(RewardKind::Bonus, 11) - (1.0 + 11.0 * 2.0 * 0.1)).abs() < 1e-9);
        assert!((reward(RewardKind::Bonus, 3) - 0.6).abs() < 1e-9);
        assert!(reward(RewardKind::Bonus, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exponential() {
        assert!(reward(RewardKind::Exponential, 0).abs() < f64::EPSILON);
        assert!((reward(RewardKind::Exponential, 3) - 8.0).abs() < f64::EPSILON);
        assert!((reward(RewardKind::Exponential, 11) - 1000.0).abs() < f64::EPSILON);
        assert!((reward(RewardKind::Exponential, 13) - 4000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_penalized_below_band() {
        assert!((reward(RewardKind::Penalized, 10) + 0.1).abs() < 1e-9);
        assert!((reward(RewardKind::Penalized, 0) + 1.1).abs() < 1e-9);
        assert!((reward(RewardKind::Penalized, 12) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("exponential".parse::<RewardKind>().unwrap(), RewardKind::Exponential);
        assert_eq!(RewardKind::Bonus.to_string(), "bonus");
        assert_eq!(
            serde_json::from_str::<RewardKind>("\"penalized\"").unwrap(),
            RewardKind::Penalized
        );
    }
}
