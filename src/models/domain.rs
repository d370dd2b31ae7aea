use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type UserId = i64;
pub type ListingId = i64;
pub type ConversationId = i64;

/// Renter housing preferences (one per renter, upserted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenterProfile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "budgetMin", default)]
    pub budget_min: u32,
    #[serde(rename = "budgetMax", default)]
    pub budget_max: u32,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(rename = "householdSize", default)]
    pub household_size: Option<u32>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(rename = "moveIn", default)]
    pub move_in: Option<String>,
    #[serde(rename = "leaseLengthMonths", default)]
    pub lease_length_months: Option<u32>,
    #[serde(rename = "unitAmenities", default)]
    pub unit_amenities: BTreeSet<String>,
    #[serde(rename = "buildingAmenities", default)]
    pub building_amenities: BTreeSet<String>,
    #[serde(rename = "petsRequired", default)]
    pub pets_required: bool,
    #[serde(rename = "smokingPreference", default)]
    pub smoking_preference: Option<String>,
    #[serde(rename = "noisePreference", default)]
    pub noise_preference: Option<String>,
    #[serde(rename = "visitorPreference", default)]
    pub visitor_preference: Option<String>,
    #[serde(rename = "customPreferences", default)]
    pub custom_preferences: BTreeSet<String>,
}

impl RenterProfile {
    /// Household size, treating a missing or zero value as a single occupant
    pub fn household(&self) -> u32 {
        self.household_size.filter(|size| *size > 0).unwrap_or(1)
    }

    /// Lower-cased smoking preference, empty when unset
    pub fn smoking(&self) -> String {
        self.smoking_preference
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default()
    }
}

/// Landlord tenant policies (one per landlord, upserted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandlordProfile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "tenantPolicies", default)]
    pub tenant_policies: BTreeSet<String>,
    #[serde(rename = "preferredLeaseLength", default)]
    pub preferred_lease_length: Option<u32>,
    #[serde(rename = "petsAllowed", default)]
    pub pets_allowed: Option<bool>,
    #[serde(rename = "customRequirements", default)]
    pub custom_requirements: BTreeSet<String>,
}

impl LandlordProfile {
    /// Case-insensitive policy tag lookup
    pub fn has_policy(&self, tag: &str) -> bool {
        self.tenant_policies
            .iter()
            .any(|policy| policy.trim().eq_ignore_ascii_case(tag))
    }
}

/// Rental listing as seen by the matcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingProfile {
    pub id: ListingId,
    #[serde(rename = "landlordId", default)]
    pub landlord_id: Option<UserId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "neighborhoodType", default)]
    pub neighborhood_type: Option<String>,
    #[serde(rename = "neighborhoodProfile", default)]
    pub neighborhood_profile: BTreeSet<String>,
    #[serde(rename = "neighborhoodDescription", default)]
    pub neighborhood_description: Option<String>,
    #[serde(rename = "rentPrice", default)]
    pub rent_price: u32,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(rename = "unitAmenities", default)]
    pub unit_amenities: BTreeSet<String>,
    #[serde(rename = "buildingAmenities", default)]
    pub building_amenities: BTreeSet<String>,
    #[serde(rename = "leaseLengthMonths", default)]
    pub lease_length_months: Option<u32>,
    #[serde(rename = "availableFrom", default)]
    pub available_from: Option<String>,
    #[serde(rename = "maxOccupants", default)]
    pub max_occupants: Option<u32>,
    #[serde(rename = "petsAllowed", default)]
    pub pets_allowed: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "customTags", default)]
    pub custom_tags: BTreeSet<String>,
}

impl ListingProfile {
    /// Listings allow pets unless they explicitly say otherwise
    pub fn allows_pets(&self) -> bool {
        self.pets_allowed.unwrap_or(true)
    }
}

/// Persisted ranked pairing for one run date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMatch {
    #[serde(rename = "renterId")]
    pub renter_id: UserId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    pub score: f64,
    #[serde(rename = "runDate")]
    pub run_date: NaiveDate,
}

/// A daily match joined with the listing fields shown to the renter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedListing {
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    pub title: String,
    pub location: String,
    #[serde(rename = "rentPrice")]
    pub rent_price: u32,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: f64,
}

/// Per (user, listing) interaction features, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSignal {
    pub saved_similarity: f64,
    pub visit_similarity: f64,
    pub ignored_similarity: f64,
}

/// A renter whose preferences overlap with the target renter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSimilarity {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub similarity: f64,
    #[serde(rename = "savedListingIds")]
    pub saved_listing_ids: Vec<ListingId>,
}

/// Historical interaction kinds the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Saved,
    Visit,
}

/// A single historical save or visit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub kind: InteractionKind,
}

/// Two-party chat thread about a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(rename = "renterId")]
    pub renter_id: UserId,
    #[serde(rename = "landlordId")]
    pub landlord_id: UserId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
}

impl Conversation {
    /// The other participant, or None if `user_id` is not part of the thread
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.renter_id {
            Some(self.landlord_id)
        } else if user_id == self.landlord_id {
            Some(self.renter_id)
        } else {
            None
        }
    }
}

/// Message-send event emitted by the messaging subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
}

/// Capabilities gated by mutual engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockableFeature {
    ScheduleVisit,
    PriorityMatch,
}

/// Live feature-unlock view for one participant of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub self_count: u32,
    pub partner_count: u32,
    pub can_schedule_visit: bool,
    pub can_priority_match: bool,
    pub unlockable_features: Vec<UnlockableFeature>,
}

/// Rule-based factor weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub budget: f64,
    pub location: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub unit_amenities: f64,
    pub building_amenities: f64,
    pub lease_length: f64,
    pub move_in: f64,
    pub pets: f64,
    pub tenant_policies: f64,
    pub occupants: f64,
    pub custom_tags: f64,
    pub landlord_requirements: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.budget
            + self.location
            + self.bedrooms
            + self.bathrooms
            + self.unit_amenities
            + self.building_amenities
            + self.lease_length
            + self.move_in
            + self.pets
            + self.tenant_policies
            + self.occupants
            + self.custom_tags
            + self.landlord_requirements
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            budget: 20.0,
            location: 15.0,
            bedrooms: 10.0,
            bathrooms: 8.0,
            unit_amenities: 10.0,
            building_amenities: 5.0,
            lease_length: 8.0,
            move_in: 7.0,
            pets: 7.0,
            tenant_policies: 5.0,
            occupants: 3.0,
            custom_tags: 4.0,
            landlord_requirements: 8.0,
        }
    }
}

/// Blend weights for the enhanced score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleWeights {
    pub base: f64,
    pub behavioral: f64,
    pub semantic: f64,
    pub collaborative: f64,
    pub refinement: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            base: 0.60,
            behavioral: 0.20,
            semantic: 0.10,
            collaborative: 0.05,
            refinement: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_total() {
        assert_eq!(ScoringWeights::default().total(), 110.0);
    }

    #[test]
    fn test_partner_lookup() {
        let convo = Conversation {
            id: 1,
            renter_id: 10,
            landlord_id: 20,
            listing_id: 5,
        };

        assert_eq!(convo.partner_of(10), Some(20));
        assert_eq!(convo.partner_of(20), Some(10));
        assert_eq!(convo.partner_of(30), None);
    }

    #[test]
    fn test_renter_profile_deserializes_sparse_json() {
        let renter: RenterProfile = serde_json::from_str(r#"{"userId": 7}"#).unwrap();
        assert_eq!(renter.user_id, 7);
        assert_eq!(renter.household(), 1);
        assert!(renter.locations.is_empty());
    }
}
