//! Model input construction.
//!
//! Each step of the input window describes one past draw:
//!
//! | features | value |
//! |---|---|
//! | 15 | ball values / 25, in draw order |
//! | 1 | `tick_index / feed_len` |
//! | 1 | wall-clock time, years since the Unix epoch / 100 |
//! | 15 (optional) | per-position moving average / 25 |
//!
//! The window holds the `window_len` draws that precede the one being
//! predicted, oldest first. When fewer are available the window is
//! left-padded with all-zero steps.

use std::fmt;

use chrono::{DateTime, Utc};
use lotofacil_model::FeatureWindow;

use crate::draw::{DRAW_SIZE, Draw, MAX_NUMBER};

const SECONDS_PER_CENTURY: f64 = 100.0 * 365.25 * 24.0 * 60.0 * 60.0;

/// Source of wall-clock time for the timestamp feature.
pub trait Clock: fmt::Debug + Send {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant. Used for reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shape of the model input window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub window_len: usize,
    pub moving_average: bool,
}

impl FeatureLayout {
    #[must_use]
    pub fn features_per_step(&self) -> usize {
        let base = DRAW_SIZE + 2;
        if self.moving_average { base + DRAW_SIZE } else { base }
    }

    /// Builds the input window for predicting the draw at `tick_index`.
    ///
    /// `preceding` are the draws seen before that one, oldest first.
    /// `moving_average` must hold at least one row per preceding draw, aligned
    /// by index; it is ignored when moving-average inputs are disabled.
    #[must_use]
    pub fn build_window(
        &self,
        preceding: &[Draw],
        moving_average: &[Vec<f32>],
        tick_index: usize,
        feed_len: usize,
        now: DateTime<Utc>,
    ) -> FeatureWindow {
        let width = self.features_per_step();
        let mut window = FeatureWindow::zeros(self.window_len, width);

        let taken = preceding.len().min(self.window_len);
        let first = preceding.len() - taken;
        let pad = self.window_len - taken;

        #[expect(clippy::cast_precision_loss)]
        let progress = tick_index as f32 / feed_len.max(1) as f32;
        let timestamp = normalized_timestamp(now);
        let max = f32::from(MAX_NUMBER);

        for (offset, draw) in preceding[first..].iter().enumerate() {
            let step = window.step_mut(pad + offset);
            for (slot, number) in step.iter_mut().zip(draw.numbers().iter()) {
                *slot = f32::from(number) / max;
            }
            step[DRAW_SIZE] = progress;
            step[DRAW_SIZE + 1] = timestamp;
            if self.moving_average
                && let Some(row) = moving_average.get(first + offset)
            {
                for (slot, value) in step[DRAW_SIZE + 2..].iter_mut().zip(row) {
                    *slot = value / max;
                }
            }
        }
        window
    }
}

/// Years since the Unix epoch divided by 100.
#[must_use]
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn normalized_timestamp(now: DateTime<Utc>) -> f32 {
    (now.timestamp() as f64 / SECONDS_PER_CENTURY) as f32
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::draw::tests::sample_feed;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_left_pads_short_history() {
        let feed = sample_feed(2);
        let layout = FeatureLayout {
            window_len: 4,
            moving_average: false,
        };
        let window = layout.build_window(feed.draws(), &[], 2, 10, now());
        assert_eq!(window.steps(), 4);
        assert_eq!(window.width(), 17);
        assert!(window.step(0).iter().all(|&v| v == 0.0));
        assert!(window.step(1).iter().all(|&v| v == 0.0));
        let first_ball = f32::from(feed.draws()[0].numbers().as_slice()[0]) / 25.0;
        assert!((window.step(2)[0] - first_ball).abs() < f32::EPSILON);
        assert!((window.step(3)[DRAW_SIZE] - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_keeps_most_recent_draws() {
        let feed = sample_feed(6);
        let layout = FeatureLayout {
            window_len: 2,
            moving_average: true,
        };
        let ma = vec![vec![25.0; DRAW_SIZE]; 6];
        let window = layout.build_window(feed.draws(), &ma, 0, 6, now());
        assert_eq!(window.width(), 32);
        let last = f32::from(feed.draws()[5].numbers().as_slice()[0]) / 25.0;
        assert!((window.step(1)[0] - last).abs() < f32::EPSILON);
        assert!((window.step(1)[DRAW_SIZE + 2] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_timestamp_scale() {
        // 50 years after the epoch
        let t = normalized_timestamp(now());
        assert!((t - 0.5).abs() < 0.01);
    }
}
