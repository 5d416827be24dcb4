use lotofacil_stats::{frequency::NumberFrequency, moving_average::per_position_moving_average};

use crate::draw::{Draw, MAX_NUMBER};

/// Statistics derived from the draws seen so far.
///
/// Always recomputed from the full history, never cached across ticks, so a
/// reset or a snapshot load cannot leave stale counts behind.
#[derive(Debug, Clone)]
pub struct Statistics {
    frequency: NumberFrequency,
    hot_numbers: Vec<u8>,
    moving_average: Vec<Vec<f32>>,
}

impl Statistics {
    /// Computes the frequency table, the top-`hot_count` numbers and the
    /// per-position moving average (window `ma_window`) over `draws`.
    #[must_use]
    pub fn update(draws: &[Draw], hot_count: usize, ma_window: usize) -> Self {
        let rows = || draws.iter().map(|draw| draw.numbers().as_slice());
        let frequency = NumberFrequency::from_rows(MAX_NUMBER, rows());
        let hot_numbers = frequency.hot_numbers(hot_count);
        let moving_average = per_position_moving_average(rows(), ma_window);
        Self {
            frequency,
            hot_numbers,
            moving_average,
        }
    }

    #[must_use]
    pub fn frequency(&self) -> &NumberFrequency {
        &self.frequency
    }

    /// Most frequent numbers, count descending, ties by ascending number.
    #[must_use]
    pub fn hot_numbers(&self) -> &[u8] {
        &self.hot_numbers
    }

    /// One row per input draw, aligned with the history.
    #[must_use]
    pub fn moving_average(&self) -> &[Vec<f32>] {
        &self.moving_average
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::tests::sample_feed;

    #[test]
    fn test_update_over_feed() {
        let feed = sample_feed(4);
        let stats = Statistics::update(feed.draws(), 5, 6);
        assert_eq!(stats.hot_numbers().len(), 5);
        assert_eq!(stats.moving_average().len(), 4);
        assert_eq!(stats.frequency().total(), 60);

        let counts = stats
            .hot_numbers()
            .iter()
            .map(|&n| stats.frequency().count(n))
            .collect::<Vec<_>>();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_empty_history() {
        let stats = Statistics::update(&[], 5, 6);
        assert!(stats.hot_numbers().is_empty());
        assert!(stats.moving_average().is_empty());
    }
}
