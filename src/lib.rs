//! # CWL Analyzer
//!
//! Scores Clan War League performance for a set of tracked clans.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (tags, API payloads, wars, leagues, stats)
//! - **fetch**: Game API client and offline fixtures
//! - **calculate**: Per-attack scoring rules
//! - **analyzer**: Per-clan league analysis and player ranking
//! - **storage**: League cache and report files
//! - **config**: Configuration loading and validation

pub mod analyzer;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod storage;

pub use models::*;

use chrono::NaiveDate;

/// Period label for a league month, e.g. "OCT".
pub fn period_for(date: NaiveDate) -> String {
    date.format("%b").to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_for() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(period_for(date), "OCT");
    }

    #[test]
    fn test_period_for_start_of_year() {
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(period_for(date), "JAN");
    }
}
