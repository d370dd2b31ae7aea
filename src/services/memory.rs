use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::models::{
    Conversation, ConversationId, DailyMatch, InteractionEvent, LandlordProfile, ListingProfile,
    MatchedListing, RenterProfile, UserId,
};
use crate::services::store::{EngagementStore, ProfileStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    renters: BTreeMap<UserId, RenterProfile>,
    landlords: BTreeMap<UserId, LandlordProfile>,
    listings: BTreeMap<i64, ListingProfile>,
    interactions: Vec<InteractionEvent>,
    matches: Vec<DailyMatch>,
    conversations: HashMap<ConversationId, Conversation>,
    engagement: HashMap<(ConversationId, UserId), u32>,
}

/// In-process store for tests, benchmarks and dry runs
///
/// Every operation takes the table lock once, so increments are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_listing(&self, listing: ListingProfile) {
        self.tables.write().await.listings.insert(listing.id, listing);
    }

    pub async fn remove_listing(&self, listing_id: i64) {
        let mut tables = self.tables.write().await;
        tables.listings.remove(&listing_id);
        tables.matches.retain(|m| m.listing_id != listing_id);
    }

    pub async fn record_interaction(&self, event: InteractionEvent) {
        self.tables.write().await.interactions.push(event);
    }

    pub async fn insert_conversation(&self, conversation: Conversation) {
        self.tables
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation);
    }

    /// Every stored match row, across all dates
    pub async fn all_matches(&self) -> Vec<DailyMatch> {
        self.tables.read().await.matches.clone()
    }
}

fn ranked(mut matches: Vec<DailyMatch>) -> Vec<DailyMatch> {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.listing_id.cmp(&b.listing_id))
    });
    matches
}

impl ProfileStore for InMemoryStore {
    async fn renter_profiles(&self) -> Result<Vec<RenterProfile>, StoreError> {
        Ok(self.tables.read().await.renters.values().cloned().collect())
    }

    async fn landlord_profiles(&self) -> Result<Vec<LandlordProfile>, StoreError> {
        Ok(self.tables.read().await.landlords.values().cloned().collect())
    }

    async fn listings(&self) -> Result<Vec<ListingProfile>, StoreError> {
        Ok(self.tables.read().await.listings.values().cloned().collect())
    }

    async fn interactions(&self) -> Result<Vec<InteractionEvent>, StoreError> {
        Ok(self.tables.read().await.interactions.clone())
    }

    async fn delete_matches_for_date(&self, date: NaiveDate) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.matches.len();
        tables.matches.retain(|m| m.run_date != date);
        Ok((before - tables.matches.len()) as u64)
    }

    async fn insert_matches(&self, matches: &[DailyMatch]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        for m in matches {
            tables.matches.retain(|existing| {
                !(existing.run_date == m.run_date
                    && existing.renter_id == m.renter_id
                    && existing.listing_id == m.listing_id)
            });
            tables.matches.push(m.clone());
        }
        Ok(())
    }

    async fn matches_for_renter(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<DailyMatch>, StoreError> {
        let tables = self.tables.read().await;
        Ok(ranked(
            tables
                .matches
                .iter()
                .filter(|m| m.renter_id == renter_id && m.run_date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn matched_listings(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<MatchedListing>, StoreError> {
        let tables = self.tables.read().await;
        let matches = ranked(
            tables
                .matches
                .iter()
                .filter(|m| m.renter_id == renter_id && m.run_date == date)
                .cloned()
                .collect(),
        );

        Ok(matches
            .into_iter()
            .filter_map(|m| {
                tables.listings.get(&m.listing_id).map(|listing| MatchedListing {
                    listing_id: listing.id,
                    title: listing.title.clone(),
                    location: listing.location.clone(),
                    rent_price: listing.rent_price,
                    compatibility_score: m.score,
                })
            })
            .collect())
    }

    async fn upsert_renter_profile(&self, profile: &RenterProfile) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .renters
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn upsert_landlord_profile(&self, profile: &LandlordProfile) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .landlords
            .insert(profile.user_id, profile.clone());
        Ok(())
    }
}

impl EngagementStore for InMemoryStore {
    async fn conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .conversations
            .get(&conversation_id)
            .copied())
    }

    async fn increment_engagement(
        &self,
        conversation_id: ConversationId,
        participant_id: UserId,
    ) -> Result<u32, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }
        let count = tables
            .engagement
            .entry((conversation_id, participant_id))
            .or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn engagement_counts(
        &self,
        conversation_id: ConversationId,
    ) -> Result<BTreeMap<UserId, u32>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .engagement
            .iter()
            .filter(|((conversation, _), _)| *conversation == conversation_id)
            .map(|((_, participant), count)| (*participant, *count))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn row(renter_id: i64, listing_id: i64, score: f64, run_date: NaiveDate) -> DailyMatch {
        DailyMatch {
            renter_id,
            listing_id,
            score,
            run_date,
        }
    }

    #[tokio::test]
    async fn test_delete_only_touches_one_date() {
        let store = InMemoryStore::new();
        store
            .insert_matches(&[row(1, 1, 0.5, day(1)), row(1, 2, 0.4, day(2))])
            .await
            .unwrap();

        assert_eq!(store.delete_matches_for_date(day(1)).await.unwrap(), 1);
        let remaining = store.all_matches().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].run_date, day(2));
    }

    #[tokio::test]
    async fn test_matched_listings_join_and_order() {
        let store = InMemoryStore::new();
        for id in 1..=3 {
            store
                .insert_listing(ListingProfile {
                    id,
                    title: format!("Listing {}", id),
                    rent_price: 1000 + id as u32,
                    ..Default::default()
                })
                .await;
        }
        store
            .insert_matches(&[
                row(9, 1, 0.4, day(1)),
                row(9, 3, 0.8, day(1)),
                row(9, 2, 0.8, day(1)),
            ])
            .await
            .unwrap();

        let listings = store.matched_listings(9, day(1)).await.unwrap();
        let ids: Vec<i64> = listings.iter().map(|l| l.listing_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(listings[0].title, "Listing 2");
        assert_eq!(listings[0].rent_price, 1002);
    }

    #[tokio::test]
    async fn test_increment_requires_conversation() {
        let store = InMemoryStore::new();
        assert!(store.increment_engagement(1, 1).await.is_err());

        store
            .insert_conversation(Conversation {
                id: 1,
                renter_id: 10,
                landlord_id: 20,
                listing_id: 5,
            })
            .await;
        assert_eq!(store.increment_engagement(1, 10).await.unwrap(), 1);
        assert_eq!(store.increment_engagement(1, 10).await.unwrap(), 2);
        assert_eq!(store.increment_engagement(1, 20).await.unwrap(), 1);

        let counts = store.engagement_counts(1).await.unwrap();
        assert_eq!(counts.get(&10), Some(&2));
        assert_eq!(counts.get(&20), Some(&1));
    }
}
