//! Frequency table over a bounded number domain.
//!
//! Numbers are counted over every row passed in. Nothing is cached between
//! calls: callers recompute the table from the full history whenever the
//! history changes, so a reset or rewound history never leaves stale counts
//! behind.
//!
//! # Hot numbers
//!
//! The "hot" numbers are the most frequent ones, ordered by count descending
//! with ties broken by ascending number. Numbers that never appeared are not
//! hot, so the ranking can be shorter than requested.

/// Occurrence count of each number in `1..=max_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFrequency {
    // index 0 is unused so that `counts[n]` is the count of `n`
    counts: Vec<u32>,
}

impl NumberFrequency {
    /// Counts every number of every row.
    ///
    /// Values outside `1..=max_number` are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lotofacil_stats::frequency::NumberFrequency;
    /// let rows: [&[u8]; 2] = [&[1, 2, 3], &[1, 2, 4]];
    /// let freq = NumberFrequency::from_rows(25, rows);
    /// assert_eq!(freq.count(1), 2);
    /// assert_eq!(freq.count(3), 1);
    /// assert_eq!(freq.count(25), 0);
    /// ```
    #[must_use]
    pub fn from_rows<'a, I>(max_number: u8, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut counts = vec![0; usize::from(max_number) + 1];
        for row in rows {
            for &n in row {
                if n != 0
                    && let Some(count) = counts.get_mut(usize::from(n))
                {
                    *count += 1;
                }
            }
        }
        Self { counts }
    }

    /// Returns the largest number of the domain.
    #[must_use]
    pub fn max_number(&self) -> u8 {
        u8::try_from(self.counts.len() - 1).unwrap_or(u8::MAX)
    }

    /// Returns how many times `number` appeared (0 outside the domain).
    #[must_use]
    pub fn count(&self, number: u8) -> u32 {
        if number == 0 {
            return 0;
        }
        self.counts.get(usize::from(number)).copied().unwrap_or(0)
    }

    /// Returns `(number, count)` pairs for the whole domain in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        (1..=self.max_number()).map(|n| (n, self.count(n)))
    }

    /// Returns the total number of counted values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Returns up to `k` numbers ranked by count descending, ties by ascending number.
    ///
    /// Only numbers seen at least once are ranked.
    #[must_use]
    pub fn hot_numbers(&self, k: usize) -> Vec<u8> {
        let mut ranked = self.iter().filter(|&(_, c)| c > 0).collect::<Vec<_>>();
        // stable sort keeps ascending number order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(k).map(|(n, _)| n).collect()
    }
}
