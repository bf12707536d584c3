//! Core domain types and abstractions

pub mod config;
pub mod interval;
pub mod key;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use interval::Interval;
pub use key::{CurrencyPair, Key, KeyError, parse_keys};
pub use rate::{FetchError, RateFetcher, RateSample};
