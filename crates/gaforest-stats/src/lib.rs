//! Statistics used to report training progress.
//!
//! - [`descriptive`]: min, max, mean, median and standard deviation of fitness scores
//! - [`class_accuracy`]: per-class and overall accuracy of a batch of predictions
//!
//! # Examples
//!
//! ```
//! use gaforest_stats::descriptive::DescriptiveStats;
//!
//! let fitness = [0.25, 0.5, 0.75];
//! let stats = DescriptiveStats::new(fitness).unwrap();
//! assert_eq!(stats.mean, 0.5);
//! ```

pub mod class_accuracy;
pub mod descriptive;
