use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::core::behavior::{extract_behavior, InteractionHistory};
use crate::core::location::{Gazetteer, Place};
use crate::core::peers::find_similar_peers;
use crate::core::semantic::SemanticMatcher;
use crate::core::signals::SignalBlender;
use crate::models::{
    DailyMatch, EnsembleWeights, LandlordProfile, ListingProfile, RenterProfile, ScoringWeights,
    UserId,
};
use crate::services::store::{ProfileStore, StoreError};

/// Explicit configuration for a batch run
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub weights: ScoringWeights,
    pub ensemble: EnsembleWeights,
    /// Rows persisted per renter per run date
    pub top_k: usize,
    /// Score with the blender; when false the rule-based score is used alone
    pub enhancement_enabled: bool,
    pub peer_similarity_threshold: f64,
    pub peer_limit: usize,
    pub geo_radius_km: f64,
    pub neighborhoods: Vec<Place>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            ensemble: EnsembleWeights::default(),
            top_k: 3,
            enhancement_enabled: true,
            peer_similarity_threshold: 0.3,
            peer_limit: 10,
            geo_radius_km: 10.0,
            neighborhoods: Vec::new(),
        }
    }
}

/// Everything one run reads from the store, loaded once up front
#[derive(Debug, Clone, Default)]
pub struct MatchSnapshot {
    pub renters: Vec<RenterProfile>,
    pub listings: Vec<ListingProfile>,
    landlords: HashMap<UserId, LandlordProfile>,
    history: InteractionHistory,
}

impl MatchSnapshot {
    pub fn new(
        renters: Vec<RenterProfile>,
        landlords: Vec<LandlordProfile>,
        listings: Vec<ListingProfile>,
        history: InteractionHistory,
    ) -> Self {
        Self {
            renters,
            listings,
            landlords: landlords.into_iter().map(|l| (l.user_id, l)).collect(),
            history,
        }
    }

    pub async fn load<S: ProfileStore>(store: &S) -> Result<Self, StoreError> {
        let renters = store.renter_profiles().await?;
        let landlords = store.landlord_profiles().await?;
        let listings = store.listings().await?;
        let history = InteractionHistory::from_events(store.interactions().await?);
        Ok(Self::new(renters, landlords, listings, history))
    }

    /// Landlord profile of the listing's owner, if both exist
    pub fn landlord_for(&self, listing: &ListingProfile) -> Option<&LandlordProfile> {
        listing.landlord_id.and_then(|id| self.landlords.get(&id))
    }

    pub fn history(&self) -> &InteractionHistory {
        &self.history
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    pub renters: usize,
    pub matches_written: usize,
    /// Rows from an earlier run for the same date that were deleted
    pub superseded: u64,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to load profiles: {0}")]
    Load(#[source] StoreError),

    #[error("Store failure after {completed} renters: {source}")]
    Store {
        completed: usize,
        #[source]
        source: StoreError,
    },

    #[error("Scoring worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl BatchError {
    /// Renters whose matches were written before the failure
    pub fn renters_completed(&self) -> usize {
        match self {
            BatchError::Store { completed, .. } => *completed,
            _ => 0,
        }
    }
}

/// Daily match batch job
///
/// # Pipeline Stages
/// 1. Load renters, landlords, listings and interaction history
/// 2. Delete every match row for the run date
/// 3. Score every listing for every renter (blocking pool)
/// 4. Rank, keep the top K and persist renter by renter
///
/// Overlapping runs for the same date must be prevented by the caller.
#[derive(Debug, Clone)]
pub struct DailyMatchJob {
    config: Arc<MatchingConfig>,
    blender: Arc<SignalBlender>,
}

impl DailyMatchJob {
    pub fn new(config: MatchingConfig) -> Self {
        let gazetteer = Arc::new(Gazetteer::from_places(&config.neighborhoods));
        let blender = SignalBlender::new(config.weights, config.ensemble)
            .with_gazetteer(gazetteer, config.geo_radius_km);
        Self {
            config: Arc::new(config),
            blender: Arc::new(blender),
        }
    }

    pub fn with_semantic(mut self, semantic: SemanticMatcher) -> Self {
        let blender = (*self.blender).clone().with_semantic(semantic);
        self.blender = Arc::new(blender);
        self
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn blender(&self) -> &SignalBlender {
        &self.blender
    }

    /// Ranked top-K matches for one renter
    ///
    /// Sorted by score descending, ties broken by ascending listing id.
    pub fn rank_for_renter(
        &self,
        snapshot: &MatchSnapshot,
        renter: &RenterProfile,
        run_date: NaiveDate,
    ) -> Vec<DailyMatch> {
        let peers = self.config.enhancement_enabled.then(|| {
            find_similar_peers(
                renter,
                &snapshot.renters,
                snapshot.history(),
                self.config.peer_similarity_threshold,
                self.config.peer_limit,
            )
        });

        let mut matches: Vec<DailyMatch> = snapshot
            .listings
            .iter()
            .map(|listing| {
                let landlord = snapshot.landlord_for(listing);
                let score = if self.config.enhancement_enabled {
                    let behavior = extract_behavior(snapshot.history(), renter.user_id, listing.id);
                    let (score, _) = self.blender.enhance(
                        renter,
                        landlord,
                        listing,
                        Some(&behavior),
                        peers.as_deref(),
                        run_date,
                    );
                    score
                } else {
                    self.blender.base_score(renter, landlord, listing)
                };

                DailyMatch {
                    renter_id: renter.user_id,
                    listing_id: listing.id,
                    score,
                    run_date,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.listing_id.cmp(&b.listing_id))
        });
        matches.truncate(self.config.top_k);

        tracing::debug!(
            "Ranked {} listings for renter {}, kept {}",
            snapshot.listings.len(),
            renter.user_id,
            matches.len()
        );

        matches
    }

    /// Pure `(snapshot, run_date) -> match set`, grouped per renter in input order
    pub fn compute(&self, snapshot: &MatchSnapshot, run_date: NaiveDate) -> Vec<Vec<DailyMatch>> {
        snapshot
            .renters
            .iter()
            .map(|renter| self.rank_for_renter(snapshot, renter, run_date))
            .collect()
    }

    /// Recompute and persist the match set for `run_date`
    ///
    /// A failure part way through leaves the date incomplete; the next
    /// successful run for the date replaces it entirely.
    pub async fn run<S: ProfileStore>(
        &self,
        store: &S,
        run_date: NaiveDate,
    ) -> Result<RunSummary, BatchError> {
        async {
            let snapshot = Arc::new(MatchSnapshot::load(store).await.map_err(|e| {
                tracing::error!("Failed to load profiles: {}", e);
                BatchError::Load(e)
            })?);

            let superseded = store
                .delete_matches_for_date(run_date)
                .await
                .map_err(|source| {
                    tracing::error!("Failed to clear matches for {}: {}", run_date, source);
                    BatchError::Store {
                        completed: 0,
                        source,
                    }
                })?;

            let job = self.clone();
            let worker_snapshot = Arc::clone(&snapshot);
            let ranked = tokio::task::spawn_blocking(move || {
                job.compute(&worker_snapshot, run_date)
            })
            .await?;

            let mut matches_written = 0;
            for (completed, renter_matches) in ranked.iter().enumerate() {
                if renter_matches.is_empty() {
                    continue;
                }
                store
                    .insert_matches(renter_matches)
                    .await
                    .map_err(|source| {
                        tracing::error!(
                            "Failed to store matches for renter {}: {}",
                            renter_matches[0].renter_id,
                            source
                        );
                        BatchError::Store { completed, source }
                    })?;
                matches_written += renter_matches.len();
            }

            let summary = RunSummary {
                run_date,
                renters: snapshot.renters.len(),
                matches_written,
                superseded,
            };
            tracing::info!(
                "Daily matches for {}: {} renters, {} rows written, {} superseded",
                run_date,
                summary.renters,
                summary.matches_written,
                summary.superseded
            );
            Ok::<_, BatchError>(summary)
        }
        .instrument(tracing::info_span!("daily_matches", %run_date))
        .await
    }
}

impl Default for DailyMatchJob {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
