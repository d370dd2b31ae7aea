use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::{BehaviorSignal, InteractionEvent, InteractionKind, ListingId, UserId};

/// Indexed save/visit history loaded once per batch run
#[derive(Debug, Clone, Default)]
pub struct InteractionHistory {
    saved: HashSet<(UserId, ListingId)>,
    visits: HashSet<(UserId, ListingId)>,
    saved_by_user: BTreeMap<UserId, BTreeSet<ListingId>>,
}

impl InteractionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = InteractionEvent>) -> Self {
        let mut history = Self::new();
        for event in events {
            history.record(event);
        }
        history
    }

    pub fn record(&mut self, event: InteractionEvent) {
        let key = (event.user_id, event.listing_id);
        match event.kind {
            InteractionKind::Saved => {
                self.saved.insert(key);
                self.saved_by_user
                    .entry(event.user_id)
                    .or_default()
                    .insert(event.listing_id);
            }
            InteractionKind::Visit => {
                self.visits.insert(key);
            }
        }
    }

    pub fn has_saved(&self, user_id: UserId, listing_id: ListingId) -> bool {
        self.saved.contains(&(user_id, listing_id))
    }

    pub fn has_visit(&self, user_id: UserId, listing_id: ListingId) -> bool {
        self.visits.contains(&(user_id, listing_id))
    }

    /// Listing ids saved by `user_id`, ascending
    pub fn saved_listings(&self, user_id: UserId) -> Vec<ListingId> {
        self.saved_by_user
            .get(&user_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.visits.is_empty()
    }
}

/// Per (user, listing) interaction features
///
/// Saved and visit features are exact-pair presence flags. The ignored
/// feature is always 0.0 until ignore events are captured.
pub fn extract_behavior(
    history: &InteractionHistory,
    user_id: UserId,
    listing_id: ListingId,
) -> BehaviorSignal {
    BehaviorSignal {
        saved_similarity: if history.has_saved(user_id, listing_id) { 1.0 } else { 0.0 },
        visit_similarity: if history.has_visit(user_id, listing_id) { 1.0 } else { 0.0 },
        ignored_similarity: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(user_id: UserId, listing_id: ListingId, kind: InteractionKind) -> InteractionEvent {
        InteractionEvent {
            user_id,
            listing_id,
            kind,
        }
    }

    #[test]
    fn test_exact_pair_presence() {
        let history = InteractionHistory::from_events([
            event(1, 10, InteractionKind::Saved),
            event(1, 11, InteractionKind::Visit),
            event(2, 10, InteractionKind::Visit),
        ]);

        let saved = extract_behavior(&history, 1, 10);
        assert_eq!(saved.saved_similarity, 1.0);
        assert_eq!(saved.visit_similarity, 0.0);

        let visited = extract_behavior(&history, 1, 11);
        assert_eq!(visited.saved_similarity, 0.0);
        assert_eq!(visited.visit_similarity, 1.0);

        let other = extract_behavior(&history, 2, 11);
        assert_eq!(other, BehaviorSignal::default());
    }

    #[test]
    fn test_ignored_slot_is_never_populated() {
        let history = InteractionHistory::from_events([event(1, 10, InteractionKind::Saved)]);
        assert_eq!(extract_behavior(&history, 1, 10).ignored_similarity, 0.0);
    }

    #[test]
    fn test_saved_listings_sorted() {
        let history = InteractionHistory::from_events([
            event(3, 30, InteractionKind::Saved),
            event(3, 5, InteractionKind::Saved),
            event(3, 30, InteractionKind::Saved),
            event(3, 7, InteractionKind::Visit),
        ]);
        assert_eq!(history.saved_listings(3), vec![5, 30]);
        assert!(history.saved_listings(4).is_empty());
    }
}
