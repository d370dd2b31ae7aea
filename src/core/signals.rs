use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::location::{location_refinement, Gazetteer};
use crate::core::scoring::{calculate_compatibility, round3};
use crate::core::semantic::SemanticMatcher;
use crate::core::timing::timing_refinement;
use crate::models::{
    BehaviorSignal, EnsembleWeights, LandlordProfile, ListingId, ListingProfile, PeerSimilarity,
    RenterProfile, ScoringWeights,
};

/// Every sub-signal behind an enhanced score, rounded to three decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Explanation {
    pub base_score: f64,
    pub behavioral_boost: f64,
    pub semantic_score: f64,
    pub collaborative_signal: f64,
    pub location_boost: f64,
    pub timing_boost: f64,
    pub final_score: f64,
}

impl Explanation {
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("base_score", self.base_score),
            ("behavioral_boost", self.behavioral_boost),
            ("semantic_score", self.semantic_score),
            ("collaborative_signal", self.collaborative_signal),
            ("location_boost", self.location_boost),
            ("timing_boost", self.timing_boost),
            ("final_score", self.final_score),
        ]
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.entries().into_iter().collect()
    }
}

/// Blends the rule-based score with behavioral, semantic, collaborative,
/// location and timing signals
///
/// Stateless apart from configuration; safe to share across threads.
#[derive(Debug, Clone)]
pub struct SignalBlender {
    weights: ScoringWeights,
    ensemble: EnsembleWeights,
    semantic: SemanticMatcher,
    gazetteer: Arc<Gazetteer>,
    geo_radius_km: f64,
}

impl Default for SignalBlender {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), EnsembleWeights::default())
    }
}

impl SignalBlender {
    pub fn new(weights: ScoringWeights, ensemble: EnsembleWeights) -> Self {
        Self {
            weights,
            ensemble,
            semantic: SemanticMatcher::default(),
            gazetteer: Arc::new(Gazetteer::new()),
            geo_radius_km: 10.0,
        }
    }

    pub fn with_semantic(mut self, semantic: SemanticMatcher) -> Self {
        self.semantic = semantic;
        self
    }

    pub fn with_gazetteer(mut self, gazetteer: Arc<Gazetteer>, radius_km: f64) -> Self {
        self.gazetteer = gazetteer;
        self.geo_radius_km = radius_km;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rule-based score only
    pub fn base_score(
        &self,
        renter: &RenterProfile,
        landlord: Option<&LandlordProfile>,
        listing: &ListingProfile,
    ) -> f64 {
        calculate_compatibility(renter, landlord, listing, &self.weights).score
    }

    /// Enhanced score in [0, 1] and the explanation of how it was reached
    ///
    /// `reference_date` anchors the timing refinement (normally the run date).
    pub fn enhance(
        &self,
        renter: &RenterProfile,
        landlord: Option<&LandlordProfile>,
        listing: &ListingProfile,
        behavior: Option<&BehaviorSignal>,
        peers: Option<&[PeerSimilarity]>,
        reference_date: NaiveDate,
    ) -> (f64, Explanation) {
        let base = self.base_score(renter, landlord, listing);
        let behavioral = behavioral_signal(behavior);
        let semantic = self.semantic.score(renter, listing);
        let collaborative = collaborative_signal(listing.id, peers);
        let location = location_refinement(&self.gazetteer, renter, listing, self.geo_radius_km);
        let timing = timing_refinement(
            renter.move_in.as_deref(),
            listing.available_from.as_deref(),
            reference_date,
        );

        let blended = base * self.ensemble.base
            + behavioral * self.ensemble.behavioral
            + semantic * self.ensemble.semantic
            + collaborative * self.ensemble.collaborative
            + (location + timing) / 2.0 * self.ensemble.refinement;
        let final_score = blended.clamp(0.0, 1.0);

        let explanation = Explanation {
            base_score: round3(base),
            behavioral_boost: round3(behavioral),
            semantic_score: round3(semantic),
            collaborative_signal: round3(collaborative),
            location_boost: round3(location),
            timing_boost: round3(timing),
            final_score: round3(final_score),
        };

        (final_score, explanation)
    }
}

/// Behavioral adjustment around a neutral 0.5
pub fn behavioral_signal(behavior: Option<&BehaviorSignal>) -> f64 {
    let Some(behavior) = behavior else {
        return 0.5;
    };

    let mut score: f64 = 0.5;
    if behavior.saved_similarity > 0.7 {
        score += 0.2;
    } else if behavior.saved_similarity > 0.5 {
        score += 0.1;
    }
    if behavior.visit_similarity > 0.7 {
        score += 0.25;
    }
    if behavior.ignored_similarity > 0.7 {
        score -= 0.15;
    }
    score.clamp(0.0, 1.0)
}

/// Share of peers who saved this listing, saturating once 30% of peers agree
pub fn collaborative_signal(listing_id: ListingId, peers: Option<&[PeerSimilarity]>) -> f64 {
    let peers = match peers {
        Some(peers) if !peers.is_empty() => peers,
        _ => return 0.5,
    };

    let positive = peers
        .iter()
        .filter(|peer| peer.saved_listing_ids.contains(&listing_id))
        .count() as f64;
    let denominator = (peers.len() as f64 * 0.3).max(1.0);
    (positive / denominator).min(1.0)
}
