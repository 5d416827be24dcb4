//! Statistical utilities over lottery number sequences.
//!
//! This crate has no knowledge of draws, agents or models. It works on plain
//! number slices so the same code serves the full 25-number domain and small
//! hand-written fixtures.
//!
//! - **Frequency**: count how often each number appeared and rank the "hot" ones
//! - **Moving average**: windowed per-position means over a sequence of rows
//! - **Descriptive statistics**: summarize a population's scores
//!
//! # Modules
//!
//! - [`frequency`]: Frequency table and hot-number ranking
//! - [`moving_average`]: Per-position moving averages clipped at the sequence start
//! - [`descriptive`]: Min, max, mean, median and spread of a set of scores
//!
//! # Examples
//!
//! ## Ranking hot numbers
//!
//! ```
//! use lotofacil_stats::frequency::NumberFrequency;
//!
//! let rows: [&[u8]; 2] = [&[1, 2, 3], &[1, 2, 4]];
//! let freq = NumberFrequency::from_rows(25, rows);
//! assert_eq!(freq.count(1), 2);
//! assert_eq!(freq.hot_numbers(5), vec![1, 2, 3, 4]);
//! ```
//!
//! ## Moving averages
//!
//! ```
//! use lotofacil_stats::moving_average::per_position_moving_average;
//!
//! let rows: [&[u8]; 3] = [&[1, 10], &[3, 20], &[5, 30]];
//! let ma = per_position_moving_average(rows, 2);
//! assert_eq!(ma[0], vec![1.0, 10.0]);
//! assert_eq!(ma[2], vec![4.0, 25.0]);
//! ```
//!
//! ## Summarizing scores
//!
//! ```
//! use lotofacil_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod descriptive;
pub mod frequency;
pub mod moving_average;
