use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ConversationId, FeatureStatus, MessageEvent, UnlockableFeature, UserId};
use crate::services::store::{EngagementStore, StoreError};

/// Engagement rules: what counts as a message and what it unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngagementThresholds {
    pub min_meaningful_chars: usize,
    pub schedule_visit: u32,
    pub priority_match: u32,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        Self {
            min_meaningful_chars: 6,
            schedule_visit: 10,
            priority_match: 20,
        }
    }
}

/// Whether a message counts toward engagement (trimmed length, in characters)
#[inline]
pub fn is_meaningful(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// Derive the unlock state from both participants' counters
///
/// Monotonic in both counts: raising either never revokes a feature.
pub fn feature_status(
    self_count: u32,
    partner_count: u32,
    thresholds: &EngagementThresholds,
) -> FeatureStatus {
    let mutual = self_count.min(partner_count);
    let can_schedule_visit = mutual >= thresholds.schedule_visit;
    let can_priority_match = mutual >= thresholds.priority_match;

    let mut unlockable_features = Vec::new();
    if can_schedule_visit {
        unlockable_features.push(UnlockableFeature::ScheduleVisit);
    }
    if can_priority_match {
        unlockable_features.push(UnlockableFeature::PriorityMatch);
    }

    FeatureStatus {
        self_count,
        partner_count,
        can_schedule_visit,
        can_priority_match,
        unlockable_features,
    }
}

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error("User {user_id} is not a participant of conversation {conversation_id}")]
    NotParticipant {
        conversation_id: ConversationId,
        user_id: UserId,
    },
}

/// Result of processing one message-send event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementOutcome {
    /// Too short, or sender outside the conversation; delivered but not counted
    Ignored,
    /// Counted; carries the sender's new total
    Counted(u32),
    /// Should have counted but the increment failed (logged, not raised)
    Failed,
}

impl EngagementOutcome {
    pub fn is_counted(&self) -> bool {
        matches!(self, EngagementOutcome::Counted(_))
    }

    pub fn count(&self) -> Option<u32> {
        match self {
            EngagementOutcome::Counted(count) => Some(*count),
            _ => None,
        }
    }
}

/// Counts meaningful messages per conversation participant
pub struct EngagementTracker<S> {
    store: Arc<S>,
    thresholds: EngagementThresholds,
}

impl<S> Clone for EngagementTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            thresholds: self.thresholds,
        }
    }
}

impl<S: EngagementStore> EngagementTracker<S> {
    pub fn new(store: Arc<S>, thresholds: EngagementThresholds) -> Self {
        Self { store, thresholds }
    }

    pub fn thresholds(&self) -> &EngagementThresholds {
        &self.thresholds
    }

    /// Process a message-send event
    ///
    /// Never returns an error: a failed lookup or increment is logged and
    /// reported as `Failed` so message delivery is never blocked by counting.
    /// Senders outside the conversation are `Ignored` and get no counter.
    pub async fn record_message(&self, event: &MessageEvent) -> EngagementOutcome {
        if !is_meaningful(&event.text, self.thresholds.min_meaningful_chars) {
            tracing::debug!(
                "Message from {} in conversation {} too short to count",
                event.sender_id,
                event.conversation_id
            );
            return EngagementOutcome::Ignored;
        }

        match self.store.conversation(event.conversation_id).await {
            Ok(Some(conversation)) if conversation.partner_of(event.sender_id).is_some() => {}
            Ok(Some(_)) => {
                tracing::warn!(
                    "Sender {} is not a participant of conversation {}, not counting",
                    event.sender_id,
                    event.conversation_id
                );
                return EngagementOutcome::Ignored;
            }
            Ok(None) => {
                tracing::warn!(
                    "Message for unknown conversation {}, not counting",
                    event.conversation_id
                );
                return EngagementOutcome::Ignored;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load conversation {} for engagement: {}",
                    event.conversation_id,
                    e
                );
                return EngagementOutcome::Failed;
            }
        }

        match self
            .store
            .increment_engagement(event.conversation_id, event.sender_id)
            .await
        {
            Ok(count) => {
                tracing::debug!(
                    "Engagement for {} in conversation {} now {}",
                    event.sender_id,
                    event.conversation_id,
                    count
                );
                EngagementOutcome::Counted(count)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to count message from {} in conversation {}: {}",
                    event.sender_id,
                    event.conversation_id,
                    e
                );
                EngagementOutcome::Failed
            }
        }
    }

    /// Live unlock state as seen by `viewer_id`
    pub async fn feature_status(
        &self,
        conversation_id: ConversationId,
        viewer_id: UserId,
    ) -> Result<FeatureStatus, EngagementError> {
        let conversation = self
            .store
            .conversation(conversation_id)
            .await?
            .ok_or(EngagementError::ConversationNotFound(conversation_id))?;

        let partner_id = conversation
            .partner_of(viewer_id)
            .ok_or(EngagementError::NotParticipant {
                conversation_id,
                user_id: viewer_id,
            })?;

        let counts = self.store.engagement_counts(conversation_id).await?;
        let self_count = counts.get(&viewer_id).copied().unwrap_or(0);
        let partner_count = counts.get(&partner_id).copied().unwrap_or(0);

        Ok(feature_status(self_count, partner_count, &self.thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningfulness_predicate() {
        assert!(!is_meaningful("ok", 6));
        assert!(!is_meaningful("  hey  ", 6));
        assert!(is_meaningful("hello!", 6));
        assert!(is_meaningful("   hello!   ", 6));
        // Multi-byte characters count once each
        assert!(is_meaningful("héllo!", 6));
        assert!(!is_meaningful("héllo", 6));
    }

    #[test]
    fn test_feature_status_example() {
        let status = feature_status(10, 12, &EngagementThresholds::default());
        assert!(status.can_schedule_visit);
        assert!(!status.can_priority_match);
        assert_eq!(status.unlockable_features, vec![UnlockableFeature::ScheduleVisit]);
    }

    #[test]
    fn test_feature_status_requires_both() {
        let thresholds = EngagementThresholds::default();
        assert!(!feature_status(25, 9, &thresholds).can_schedule_visit);
        assert!(!feature_status(9, 25, &thresholds).can_schedule_visit);

        let both = feature_status(20, 21, &thresholds);
        assert!(both.can_schedule_visit && both.can_priority_match);
        assert_eq!(
            both.unlockable_features,
            vec![UnlockableFeature::ScheduleVisit, UnlockableFeature::PriorityMatch]
        );
    }

    #[test]
    fn test_feature_unlock_is_monotonic() {
        let thresholds = EngagementThresholds::default();
        for a in 0..30u32 {
            for b in 0..30u32 {
                let status = feature_status(a, b, &thresholds);
                if status.can_schedule_visit {
                    assert!(feature_status(a + 1, b, &thresholds).can_schedule_visit);
                    assert!(feature_status(a, b + 1, &thresholds).can_schedule_visit);
                }
                if status.can_priority_match {
                    assert!(feature_status(a + 1, b + 1, &thresholds).can_priority_match);
                }
            }
        }
    }

    #[test]
    fn test_feature_status_serializes_snake_case() {
        let status = feature_status(20, 20, &EngagementThresholds::default());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["unlockable_features"][0], "schedule_visit");
        assert_eq!(json["unlockable_features"][1], "priority_match");
        assert_eq!(json["self_count"], 20);
    }
}
