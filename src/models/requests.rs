use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::models::domain::{LandlordProfile, RenterProfile, UserId};

/// Scheduler trigger for the daily match batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMatchesRequest {
    /// Defaults to today (UTC) when omitted
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Query for the "today's matches" view
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TodayMatchesQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "renter_id", rename = "renterId")]
    pub renter_id: UserId,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Message-send event forwarded by the messaging subsystem
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessageSentRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "sender_id", rename = "senderId")]
    pub sender_id: UserId,
    #[validate(length(max = 10000))]
    pub text: String,
}

/// Query for the feature-unlock view
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeatureStatusQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
}

/// Renter preference update (full replacement)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenterPreferencesRequest {
    #[serde(rename = "budgetMin", default)]
    pub budget_min: u32,
    #[serde(rename = "budgetMax", default)]
    pub budget_max: u32,
    #[validate(range(max = 20))]
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[validate(range(max = 20))]
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[validate(range(min = 1, max = 50))]
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

impl RenterPreferencesRequest {
    pub fn into_profile(self, user_id: UserId) -> RenterProfile {
        RenterProfile {
            user_id,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            household_size: self.household_size,
            locations: self.locations,
            move_in: self.move_in,
            lease_length_months: self.lease_length_months,
            unit_amenities: self.unit_amenities,
            building_amenities: self.building_amenities,
            pets_required: self.pets_required,
            smoking_preference: self.smoking_preference,
            noise_preference: self.noise_preference,
            visitor_preference: self.visitor_preference,
            custom_preferences: self.custom_preferences,
        }
    }
}

/// Landlord preference update (full replacement)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LandlordPreferencesRequest {
    #[serde(rename = "tenantPolicies", default)]
    pub tenant_policies: BTreeSet<String>,
    #[validate(range(max = 120))]
    #[serde(rename = "preferredLeaseLength", default)]
    pub preferred_lease_length: Option<u32>,
    #[serde(rename = "petsAllowed", default)]
    pub pets_allowed: Option<bool>,
    #[serde(rename = "customRequirements", default)]
    pub custom_requirements: BTreeSet<String>,
}

impl LandlordPreferencesRequest {
    pub fn into_profile(self, user_id: UserId) -> LandlordProfile {
        LandlordProfile {
            user_id,
            tenant_policies: self.tenant_policies,
            preferred_lease_length: self.preferred_lease_length,
            pets_allowed: self.pets_allowed,
            custom_requirements: self.custom_requirements,
        }
    }
}
