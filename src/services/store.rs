use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

use crate::models::{
    Conversation, ConversationId, DailyMatch, InteractionEvent, LandlordProfile, ListingProfile,
    MatchedListing, RenterProfile, UserId,
};

/// Errors that can occur when reading or writing the profile store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Renter, landlord and listing records plus the daily match table
///
/// Records are converted into concrete profile types at this boundary, so
/// the scoring core never probes record shapes.
pub trait ProfileStore: Send + Sync {
    fn renter_profiles(&self) -> impl Future<Output = Result<Vec<RenterProfile>, StoreError>> + Send;

    fn landlord_profiles(
        &self,
    ) -> impl Future<Output = Result<Vec<LandlordProfile>, StoreError>> + Send;

    fn listings(&self) -> impl Future<Output = Result<Vec<ListingProfile>, StoreError>> + Send;

    /// Historical saves and visit requests
    fn interactions(
        &self,
    ) -> impl Future<Output = Result<Vec<InteractionEvent>, StoreError>> + Send;

    /// Remove every match row for `date`, returning how many were removed
    fn delete_matches_for_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn insert_matches(
        &self,
        matches: &[DailyMatch],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Match rows for one renter and date, best first
    fn matches_for_renter(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<DailyMatch>, StoreError>> + Send;

    /// Match rows joined with listing details, best first
    fn matched_listings(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<MatchedListing>, StoreError>> + Send;

    fn upsert_renter_profile(
        &self,
        profile: &RenterProfile,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn upsert_landlord_profile(
        &self,
        profile: &LandlordProfile,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Whether the backing store answers queries
    fn health_check(&self) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async { Ok(true) }
    }
}

/// Conversations and per-participant engagement counters
pub trait EngagementStore: Send + Sync {
    fn conversation(
        &self,
        conversation_id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, StoreError>> + Send;

    /// Atomically add one to the participant's counter, returning the new value
    fn increment_engagement(
        &self,
        conversation_id: ConversationId,
        participant_id: UserId,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Counters for every participant that has one
    fn engagement_counts(
        &self,
        conversation_id: ConversationId,
    ) -> impl Future<Output = Result<BTreeMap<UserId, u32>, StoreError>> + Send;
}
