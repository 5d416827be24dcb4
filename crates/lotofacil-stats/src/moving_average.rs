//! Per-position moving averages.

use std::collections::VecDeque;

/// Computes, for every row, the mean of each position over the last `window` rows.
///
/// The window is clipped at the start of the sequence: the first row averages
/// over itself only, the second over two rows, and so on until `window` rows
/// are available. Rows shorter than the first row contribute zero for the
/// missing positions.
///
/// A `window` of 0 is treated as 1.
///
/// # Examples
///
/// ```
/// # use lotofacil_stats::moving_average::per_position_moving_average;
/// let rows: [&[u8]; 3] = [&[2], &[4], &[9]];
/// let ma = per_position_moving_average(rows, 2);
/// assert_eq!(ma, vec![vec![2.0], vec![3.0], vec![6.5]]);
/// ```
#[must_use]
pub fn per_position_moving_average<'a, I>(rows: I, window: usize) -> Vec<Vec<f32>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let window = window.max(1);
    let mut rows = rows.into_iter().peekable();
    let width = rows.peek().map_or(0, |r| r.len());

    let mut recent: VecDeque<&[u8]> = VecDeque::with_capacity(window);
    let mut sums = vec![0_u32; width];
    let mut averages = vec![];

    for row in rows {
        if recent.len() == window
            && let Some(oldest) = recent.pop_front()
        {
            for (sum, &v) in sums.iter_mut().zip(oldest) {
                *sum -= u32::from(v);
            }
        }
        for (sum, &v) in sums.iter_mut().zip(row) {
            *sum += u32::from(v);
        }
        recent.push_back(row);

        #[expect(clippy::cast_precision_loss)]
        let n = recent.len() as f32;
        #[expect(clippy::cast_precision_loss)]
        let row = sums.iter().map(|&s| s as f32 / n).collect();
        averages.push(row);
    }

    averages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clipped_at_start() {
        let rows: [&[u8]; 4] = [&[6, 1], &[0, 3], &[3, 5], &[3, 7]];
        let ma = per_position_moving_average(rows, 3);
        assert_eq!(ma[0], vec![6.0, 1.0]);
        assert_eq!(ma[1], vec![3.0, 2.0]);
        assert_eq!(ma[2], vec![3.0, 3.0]);
        // oldest row dropped once the window is full
        assert_eq!(ma[3], vec![2.0, 5.0]);
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let rows: [&[u8]; 2] = [&[4, 8], &[10, 12]];
        let ma = per_position_moving_average(rows, 1);
        assert_eq!(ma, vec![vec![4.0, 8.0], vec![10.0, 12.0]]);
    }

    #[test]
    fn test_zero_window_treated_as_one() {
        let rows: [&[u8]; 2] = [&[4], &[10]];
        assert_eq!(
            per_position_moving_average(rows, 0),
            per_position_moving_average(rows, 1)
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(per_position_moving_average(std::iter::empty(), 6).is_empty());
    }
}
