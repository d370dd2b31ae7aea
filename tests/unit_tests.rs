// Unit tests for Rentmatch scoring and signal blending

use chrono::NaiveDate;
use rentmatch::core::{
    calculate_compatibility, compatibility_score, Factor, Gazetteer, SignalBlender,
};
use rentmatch::models::{
    BehaviorSignal, LandlordProfile, ListingProfile, PeerSimilarity, RenterProfile,
    ScoringWeights,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn create_renter() -> RenterProfile {
    RenterProfile {
        user_id: 1,
        budget_min: 1000,
        budget_max: 1500,
        bedrooms: Some(2),
        bathrooms: Some(1),
        household_size: Some(2),
        locations: tags(&["Downtown"]),
        move_in: Some("asap".to_string()),
        lease_length_months: Some(12),
        unit_amenities: tags(&["dishwasher", "laundry"]),
        building_amenities: tags(&["gym"]),
        pets_required: false,
        smoking_preference: Some("non-smoking".to_string()),
        custom_preferences: tags(&["quiet"]),
        ..Default::default()
    }
}

fn create_listing(id: i64, rent: u32) -> ListingProfile {
    ListingProfile {
        id,
        landlord_id: Some(100),
        title: format!("Listing {}", id),
        location: "12 State St, Downtown".to_string(),
        rent_price: rent,
        bedrooms: 2,
        bathrooms: 1,
        unit_amenities: tags(&["dishwasher", "laundry"]),
        building_amenities: tags(&["gym"]),
        lease_length_months: Some(12),
        available_from: Some("2024-08-15".to_string()),
        max_occupants: Some(3),
        pets_allowed: Some(true),
        custom_tags: tags(&["quiet"]),
        ..Default::default()
    }
}

fn create_landlord() -> LandlordProfile {
    LandlordProfile {
        user_id: 100,
        tenant_policies: tags(&["No smoking"]),
        ..Default::default()
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
}

#[test]
fn test_budget_example_full_credit() {
    let renter = create_renter();
    let listing = create_listing(1, 1200);
    let weights = ScoringWeights::default();

    let result = calculate_compatibility(&renter, None, &listing, &weights);
    assert_eq!(result.credit(Factor::Budget), 1.0);
    assert_eq!(result.points(Factor::Budget), weights.budget);
}

#[test]
fn test_budget_credit_decays_outside_range() {
    let renter = create_renter();
    let weights = ScoringWeights::default();

    let near = calculate_compatibility(&renter, None, &create_listing(1, 1600), &weights);
    let far = calculate_compatibility(&renter, None, &create_listing(1, 2400), &weights);
    assert!(near.credit(Factor::Budget) < 1.0);
    assert!(far.credit(Factor::Budget) < near.credit(Factor::Budget));
    assert_eq!(far.credit(Factor::Budget), 0.0);
}

#[test]
fn test_pets_example_ten_percent() {
    let renter = RenterProfile {
        pets_required: true,
        ..create_renter()
    };
    let listing = ListingProfile {
        pets_allowed: Some(false),
        ..create_listing(1, 1200)
    };
    let weights = ScoringWeights::default();

    let result = calculate_compatibility(&renter, None, &listing, &weights);
    assert!((result.points(Factor::Pets) - 0.1 * weights.pets).abs() < 1e-9);
}

#[test]
fn test_occupancy_strictly_decreases_past_max() {
    let listing = create_listing(1, 1200);
    let weights = ScoringWeights::default();

    let mut previous = f64::INFINITY;
    for household in 4..12 {
        let renter = RenterProfile {
            household_size: Some(household),
            ..create_renter()
        };
        let credit = calculate_compatibility(&renter, None, &listing, &weights).credit(Factor::Occupants);
        assert!(credit < previous, "household {} did not decrease", household);
        previous = credit;
    }
}

#[test]
fn test_score_always_in_unit_range() {
    let weights = ScoringWeights::default();
    let landlord = create_landlord();

    for rent in [0, 500, 1000, 1200, 1500, 3000, 10_000] {
        for bedrooms in 0..4 {
            let listing = ListingProfile {
                bedrooms,
                ..create_listing(1, rent)
            };
            for pets in [false, true] {
                let renter = RenterProfile {
                    pets_required: pets,
                    ..create_renter()
                };
                for landlord in [None, Some(&landlord)] {
                    let score = compatibility_score(&renter, landlord, &listing, &weights);
                    assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
                }
            }
        }
    }

    let sparse = compatibility_score(
        &RenterProfile::default(),
        None,
        &ListingProfile::default(),
        &weights,
    );
    assert!((0.0..=1.0).contains(&sparse));
}

#[test]
fn test_scoring_is_deterministic() {
    let renter = create_renter();
    let listing = create_listing(1, 1200);
    let landlord = create_landlord();
    let weights = ScoringWeights::default();

    let first = calculate_compatibility(&renter, Some(&landlord), &listing, &weights);
    let second = calculate_compatibility(&renter, Some(&landlord), &listing, &weights);
    assert_eq!(first, second);
}

#[test]
fn test_landlord_conflicts_lower_score() {
    let renter = RenterProfile {
        pets_required: true,
        smoking_preference: Some("smoker".to_string()),
        ..create_renter()
    };
    let listing = create_listing(1, 1200);
    let weights = ScoringWeights::default();
    let strict = LandlordProfile {
        tenant_policies: tags(&["No pets", "No smoking"]),
        ..create_landlord()
    };

    let result = calculate_compatibility(&renter, Some(&strict), &listing, &weights);
    assert!(result.credit(Factor::LandlordRequirements) < 1e-9);

    let without = calculate_compatibility(&renter, None, &listing, &weights);
    assert_eq!(without.credit(Factor::LandlordRequirements), 0.5);
    assert!(result.score < without.score);
}

#[test]
fn test_blender_explanation_is_deterministic() {
    let gazetteer = Arc::new(Gazetteer::new().with_place("Downtown", 42.4430, -76.5019));
    let blender = SignalBlender::default().with_gazetteer(gazetteer, 10.0);
    let renter = create_renter();
    let listing = create_listing(7, 1200);
    let landlord = create_landlord();
    let behavior = BehaviorSignal {
        saved_similarity: 1.0,
        ..Default::default()
    };
    let peers = vec![PeerSimilarity {
        user_id: 2,
        similarity: 0.8,
        saved_listing_ids: vec![7],
    }];

    let first = blender.enhance(&renter, Some(&landlord), &listing, Some(&behavior), Some(peers.as_slice()), day());
    let second = blender.enhance(&renter, Some(&landlord), &listing, Some(&behavior), Some(peers.as_slice()), day());
    assert_eq!(first, second);

    let (score, explanation) = first;
    assert!((0.0..=1.0).contains(&score));
    assert_eq!(explanation.collaborative_signal, 1.0);
    assert_eq!(explanation.behavioral_boost, 0.7);
    assert_eq!(explanation.location_boost, 1.0);
    assert_eq!(explanation.timing_boost, 0.9);
}

#[test]
fn test_blender_degrades_to_neutral_signals() {
    let blender = SignalBlender::default();
    let renter = create_renter();
    let listing = create_listing(7, 1200);

    let (_, explanation) = blender.enhance(&renter, None, &listing, None, Some(&[][..]), day());
    assert_eq!(explanation.behavioral_boost, 0.5);
    assert_eq!(explanation.semantic_score, 0.5);
    assert_eq!(explanation.collaborative_signal, 0.5);
}

#[test]
fn test_blended_score_stays_in_unit_range() {
    let blender = SignalBlender::default();
    let renter = create_renter();
    let strong = BehaviorSignal {
        saved_similarity: 1.0,
        visit_similarity: 1.0,
        ignored_similarity: 0.0,
    };

    for rent in [0, 1200, 5000] {
        let listing = create_listing(3, rent);
        let (score, explanation) = blender.enhance(&renter, None, &listing, Some(&strong), None, day());
        assert!((0.0..=1.0).contains(&score));
        assert!((0.0..=1.0).contains(&explanation.final_score));
    }
}
