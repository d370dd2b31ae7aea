//! Rentmatch - renter/listing compatibility matching service
//!
//! This library scores renters against rental listings with a deterministic
//! multi-factor scorer, optionally blends in behavioral, semantic and peer
//! signals, ranks a daily top-K per renter, and gates chat features on
//! mutual message engagement.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    compatibility_score, DailyMatchJob, EngagementTracker, MatchingConfig, SignalBlender,
};
pub use models::{
    DailyMatch, FeatureStatus, LandlordProfile, ListingProfile, RenterProfile, ScoringWeights,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let renter = RenterProfile::default();
        let listing = ListingProfile::default();
        let score = compatibility_score(&renter, None, &listing, &ScoringWeights::default());
        assert!((0.0..=1.0).contains(&score));
    }
}
