use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{LandlordProfile, ListingProfile, RenterProfile, ScoringWeights};

/// Credit for a location that only matches the listing's neighborhood type
const NEIGHBORHOOD_TYPE_CREDIT: f64 = 0.6;

const NON_SMOKING: [&str; 3] = ["no smoking", "non smoking", "non-smoking"];
const SMOKER_FRIENDLY: [&str; 2] = ["smoker friendly", "smoking ok"];
const IMMEDIATE_MOVE_IN: [&str; 2] = ["asap", "immediately"];

/// Named factors of the rule-based score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Budget,
    Location,
    Bedrooms,
    Bathrooms,
    UnitAmenities,
    BuildingAmenities,
    LeaseLength,
    MoveIn,
    Pets,
    TenantPolicies,
    Occupants,
    CustomTags,
    LandlordRequirements,
}

impl Factor {
    pub const ALL: [Factor; 13] = [
        Factor::Budget,
        Factor::Location,
        Factor::Bedrooms,
        Factor::Bathrooms,
        Factor::UnitAmenities,
        Factor::BuildingAmenities,
        Factor::LeaseLength,
        Factor::MoveIn,
        Factor::Pets,
        Factor::TenantPolicies,
        Factor::Occupants,
        Factor::CustomTags,
        Factor::LandlordRequirements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Budget => "budget",
            Factor::Location => "location",
            Factor::Bedrooms => "bedrooms",
            Factor::Bathrooms => "bathrooms",
            Factor::UnitAmenities => "unit_amenities",
            Factor::BuildingAmenities => "building_amenities",
            Factor::LeaseLength => "lease_length",
            Factor::MoveIn => "move_in",
            Factor::Pets => "pets",
            Factor::TenantPolicies => "tenant_policies",
            Factor::Occupants => "occupants",
            Factor::CustomTags => "custom_tags",
            Factor::LandlordRequirements => "landlord_requirements",
        }
    }

    pub fn weight(&self, weights: &ScoringWeights) -> f64 {
        match self {
            Factor::Budget => weights.budget,
            Factor::Location => weights.location,
            Factor::Bedrooms => weights.bedrooms,
            Factor::Bathrooms => weights.bathrooms,
            Factor::UnitAmenities => weights.unit_amenities,
            Factor::BuildingAmenities => weights.building_amenities,
            Factor::LeaseLength => weights.lease_length,
            Factor::MoveIn => weights.move_in,
            Factor::Pets => weights.pets,
            Factor::TenantPolicies => weights.tenant_policies,
            Factor::Occupants => weights.occupants,
            Factor::CustomTags => weights.custom_tags,
            Factor::LandlordRequirements => weights.landlord_requirements,
        }
    }
}

/// One factor's contribution: `credit` in [0, 1], `points` = credit * weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub credit: f64,
    pub points: f64,
}

/// Rule-based compatibility in [0, 1] with its per-factor breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityScore {
    pub score: f64,
    pub breakdown: Vec<FactorScore>,
}

impl CompatibilityScore {
    pub fn factor(&self, factor: Factor) -> Option<&FactorScore> {
        self.breakdown.iter().find(|entry| entry.factor == factor)
    }

    pub fn credit(&self, factor: Factor) -> f64 {
        self.factor(factor).map(|entry| entry.credit).unwrap_or(0.0)
    }

    pub fn points(&self, factor: Factor) -> f64 {
        self.factor(factor).map(|entry| entry.points).unwrap_or(0.0)
    }
}

/// Score how well a listing fits a renter (and the listing's landlord, if known)
///
/// Every factor yields a credit in [0, 1]; sparse inputs fall back to fixed
/// default credits rather than failing. The weighted sum is normalized by the
/// total weight, clamped to [0, 1] and rounded to three decimals.
pub fn calculate_compatibility(
    renter: &RenterProfile,
    landlord: Option<&LandlordProfile>,
    listing: &ListingProfile,
    weights: &ScoringWeights,
) -> CompatibilityScore {
    let smoking = renter.smoking();

    let credits = [
        (
            Factor::Budget,
            budget_credit(renter.budget_min, renter.budget_max, listing.rent_price),
        ),
        (Factor::Location, location_credit(renter, listing)),
        (
            Factor::Bedrooms,
            shortfall_credit(renter.bedrooms, listing.bedrooms),
        ),
        (
            Factor::Bathrooms,
            shortfall_credit(renter.bathrooms, listing.bathrooms),
        ),
        (
            Factor::UnitAmenities,
            coverage_credit(&renter.unit_amenities, &listing.unit_amenities, 0.5),
        ),
        (
            Factor::BuildingAmenities,
            coverage_credit(&renter.building_amenities, &listing.building_amenities, 0.5),
        ),
        (
            Factor::LeaseLength,
            lease_credit(renter.lease_length_months, listing.lease_length_months),
        ),
        (
            Factor::MoveIn,
            move_in_credit(renter.move_in.as_deref(), listing.available_from.as_deref()),
        ),
        (
            Factor::Pets,
            pets_credit(renter.pets_required, listing.allows_pets()),
        ),
        (Factor::TenantPolicies, tenant_policy_credit(&smoking, landlord)),
        (
            Factor::Occupants,
            occupancy_credit(renter.household(), listing.max_occupants),
        ),
        (
            Factor::CustomTags,
            coverage_credit(&renter.custom_preferences, &listing.custom_tags, 0.4),
        ),
        (
            Factor::LandlordRequirements,
            landlord_requirements_credit(renter.pets_required, &smoking, landlord),
        ),
    ];

    let breakdown: Vec<FactorScore> = credits
        .into_iter()
        .map(|(factor, credit)| FactorScore {
            factor,
            credit,
            points: credit * factor.weight(weights),
        })
        .collect();

    let total = weights.total();
    let normalized = if total > 0.0 {
        breakdown.iter().map(|entry| entry.points).sum::<f64>() / total
    } else {
        0.0
    };

    CompatibilityScore {
        score: round3(normalized.clamp(0.0, 1.0)),
        breakdown,
    }
}

/// Convenience wrapper returning only the final score
pub fn compatibility_score(
    renter: &RenterProfile,
    landlord: Option<&LandlordProfile>,
    listing: &ListingProfile,
    weights: &ScoringWeights,
) -> f64 {
    calculate_compatibility(renter, landlord, listing, weights).score
}

#[inline]
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Full credit inside the range, linear decay by distance / span outside it
#[inline]
fn budget_credit(min: u32, max: u32, rent: u32) -> f64 {
    if max > 0 && min <= rent && rent <= max {
        return 1.0;
    }
    if min == 0 || max == 0 {
        return 0.5;
    }

    let span = max.saturating_sub(min).max(1) as f64;
    let delta = if rent > max { rent - max } else { min.saturating_sub(rent) };
    1.0 - (delta as f64 / span).min(1.0)
}

#[inline]
fn location_credit(renter: &RenterProfile, listing: &ListingProfile) -> f64 {
    let listing_location = listing.location.to_lowercase();
    let profile: BTreeSet<String> = listing
        .neighborhood_profile
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect();

    let direct_hit = renter.locations.iter().any(|loc| {
        let loc = loc.trim().to_lowercase();
        !loc.is_empty() && (listing_location.contains(&loc) || profile.contains(&loc))
    });
    if direct_hit {
        return 1.0;
    }

    let type_hit = listing
        .neighborhood_type
        .as_deref()
        .map(|kind| kind.trim())
        .filter(|kind| !kind.is_empty())
        .map(|kind| {
            renter
                .locations
                .iter()
                .any(|loc| loc.trim().eq_ignore_ascii_case(kind))
        })
        .unwrap_or(false);

    if type_hit {
        NEIGHBORHOOD_TYPE_CREDIT
    } else {
        0.2
    }
}

/// Bedrooms/bathrooms: meeting the desired count earns full credit
#[inline]
fn shortfall_credit(desired: Option<u32>, offered: u32) -> f64 {
    let desired = desired.unwrap_or(0);
    if offered >= desired {
        return 1.0;
    }
    let deficit = (desired - offered) as f64;
    1.0 - (deficit / desired.max(1) as f64).min(1.0)
}

/// Fraction of the wanted set present in the offered set
#[inline]
fn coverage_credit(wanted: &BTreeSet<String>, offered: &BTreeSet<String>, no_preference: f64) -> f64 {
    if wanted.is_empty() {
        return no_preference;
    }
    let hits = wanted.iter().filter(|item| offered.contains(*item)).count();
    hits as f64 / wanted.len() as f64
}

#[inline]
fn lease_credit(desired: Option<u32>, offered: Option<u32>) -> f64 {
    match (desired.filter(|m| *m > 0), offered.filter(|m| *m > 0)) {
        (Some(desired), Some(offered)) => {
            let diff = desired.abs_diff(offered) as f64;
            1.0 - (diff / desired as f64).min(1.0)
        }
        _ => 0.6,
    }
}

#[inline]
fn move_in_credit(preference: Option<&str>, available_from: Option<&str>) -> f64 {
    let preference = preference.map(|p| p.trim().to_lowercase()).unwrap_or_default();
    let available = available_from.map(|a| a.trim().to_lowercase()).unwrap_or_default();

    if preference.is_empty() || available.is_empty() {
        return 0.6;
    }
    if IMMEDIATE_MOVE_IN.contains(&preference.as_str()) || available.contains(&preference) {
        1.0
    } else {
        0.4
    }
}

#[inline]
fn pets_credit(pets_required: bool, listing_allows: bool) -> f64 {
    match (pets_required, listing_allows) {
        (true, true) => 1.0,
        (true, false) => 0.1,
        (false, _) => 0.8,
    }
}

#[inline]
fn tenant_policy_credit(smoking: &str, landlord: Option<&LandlordProfile>) -> f64 {
    if smoking.is_empty() {
        return 0.5;
    }
    if NON_SMOKING.contains(&smoking) {
        let aligned = landlord.map(|l| l.has_policy("No smoking")).unwrap_or(false);
        if aligned {
            1.0
        } else {
            0.4
        }
    } else if SMOKER_FRIENDLY.contains(&smoking) {
        0.8
    } else {
        0.6
    }
}

#[inline]
fn occupancy_credit(household: u32, max_occupants: Option<u32>) -> f64 {
    match max_occupants.filter(|max| *max > 0) {
        None => 0.5,
        Some(max) if household <= max => 1.0,
        Some(max) => {
            let overflow = (household - max) as f64;
            1.0 - (overflow / household as f64).min(1.0)
        }
    }
}

#[inline]
fn landlord_requirements_credit(
    pets_required: bool,
    smoking: &str,
    landlord: Option<&LandlordProfile>,
) -> f64 {
    let Some(landlord) = landlord else {
        return 0.5;
    };

    let mut penalty: f64 = 0.0;
    if pets_required && (landlord.has_policy("No pets") || landlord.pets_allowed == Some(false)) {
        penalty += 0.6;
    }
    if landlord.has_policy("No smoking") && SMOKER_FRIENDLY.contains(&smoking) {
        penalty += 0.4;
    }
    (1.0 - penalty).max(0.0)
}
