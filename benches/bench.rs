// Criterion benchmarks for Rentmatch

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rentmatch::core::{
    calculate_compatibility, find_similar_peers, DailyMatchJob, InteractionHistory, MatchSnapshot,
    MatchingConfig, Place, SignalBlender,
};
use rentmatch::models::{
    BehaviorSignal, InteractionEvent, InteractionKind, LandlordProfile, ListingProfile,
    RenterProfile, ScoringWeights,
};
use rentmatch::services::{InMemoryStore, ProfileStore};
use std::collections::BTreeSet;

const NEIGHBORHOODS: [&str; 4] = ["Downtown", "Midtown", "Uptown", "Suburbs"];

fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
}

fn neighborhoods() -> Vec<Place> {
    vec![
        Place { name: "Downtown".to_string(), latitude: 42.4430, longitude: -76.5019 },
        Place { name: "Midtown".to_string(), latitude: 42.4500, longitude: -76.4900 },
        Place { name: "Uptown".to_string(), latitude: 42.4600, longitude: -76.4800 },
        Place { name: "Suburbs".to_string(), latitude: 42.4700, longitude: -76.4700 },
    ]
}

fn create_renter(id: usize) -> RenterProfile {
    RenterProfile {
        user_id: id as i64,
        budget_min: 800 + (id % 5) as u32 * 100,
        budget_max: 1400 + (id % 7) as u32 * 100,
        bedrooms: Some(1 + (id % 3) as u32),
        bathrooms: Some(1),
        household_size: Some(1 + (id % 4) as u32),
        locations: tags(&[NEIGHBORHOODS[id % 4]]),
        move_in: Some(if id % 2 == 0 { "asap" } else { "2024-09-01" }.to_string()),
        lease_length_months: Some(12),
        unit_amenities: tags(&["dishwasher", "laundry"]),
        building_amenities: tags(&["gym"]),
        pets_required: id % 5 == 0,
        smoking_preference: Some("non-smoking".to_string()),
        custom_preferences: tags(&["quiet"]),
        ..Default::default()
    }
}

fn create_listing(id: usize) -> ListingProfile {
    ListingProfile {
        id: id as i64,
        landlord_id: Some((id % 10) as i64 + 10_000),
        title: format!("Listing {}", id),
        location: format!("{} State St, {}", id, NEIGHBORHOODS[id % 4]),
        rent_price: 900 + (id % 12) as u32 * 75,
        bedrooms: 1 + (id % 3) as u32,
        bathrooms: 1 + (id % 2) as u32,
        unit_amenities: tags(&["dishwasher"]),
        building_amenities: tags(&["gym", "parking"]),
        lease_length_months: Some(12),
        available_from: Some("2024-08-15".to_string()),
        max_occupants: Some(3),
        pets_allowed: Some(id % 3 != 0),
        custom_tags: tags(&["quiet"]),
        ..Default::default()
    }
}

fn create_landlords() -> Vec<LandlordProfile> {
    (0..10)
        .map(|i| LandlordProfile {
            user_id: 10_000 + i,
            tenant_policies: tags(&["No smoking"]),
            ..Default::default()
        })
        .collect()
}

fn create_history(renters: usize, listings: usize) -> InteractionHistory {
    InteractionHistory::from_events((0..renters).flat_map(|r| {
        (0..3).map(move |k| InteractionEvent {
            user_id: r as i64,
            listing_id: ((r * 7 + k) % listings) as i64,
            kind: if k == 0 { InteractionKind::Visit } else { InteractionKind::Saved },
        })
    }))
}

fn create_snapshot(renters: usize, listings: usize) -> MatchSnapshot {
    MatchSnapshot::new(
        (0..renters).map(create_renter).collect(),
        create_landlords(),
        (0..listings).map(create_listing).collect(),
        create_history(renters, listings),
    )
}

fn bench_compatibility(c: &mut Criterion) {
    let renter = create_renter(1);
    let listing = create_listing(2);
    let landlord = LandlordProfile {
        user_id: 10_002,
        tenant_policies: tags(&["No smoking", "No pets"]),
        ..Default::default()
    };
    let weights = ScoringWeights::default();

    c.bench_function("calculate_compatibility", |b| {
        b.iter(|| {
            calculate_compatibility(
                black_box(&renter),
                black_box(Some(&landlord)),
                black_box(&listing),
                black_box(&weights),
            )
        });
    });
}

fn bench_blender(c: &mut Criterion) {
    let job = DailyMatchJob::new(MatchingConfig {
        neighborhoods: neighborhoods(),
        ..Default::default()
    });
    let blender: &SignalBlender = job.blender();
    let snapshot = create_snapshot(50, 100);
    let renter = &snapshot.renters[3];
    let listing = &snapshot.listings[7];
    let behavior = BehaviorSignal {
        saved_similarity: 1.0,
        visit_similarity: 0.0,
        ignored_similarity: 0.0,
    };
    let peers = find_similar_peers(renter, &snapshot.renters, snapshot.history(), 0.3, 10);

    c.bench_function("signal_blend", |b| {
        b.iter(|| {
            blender.enhance(
                black_box(renter),
                black_box(snapshot.landlord_for(listing)),
                black_box(listing),
                black_box(Some(&behavior)),
                black_box(Some(peers.as_slice())),
                run_date(),
            )
        });
    });
}

fn bench_daily_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_compute");

    for renter_count in [10, 50, 100].iter() {
        let snapshot = create_snapshot(*renter_count, 200);

        for enhancement_enabled in [false, true] {
            let job = DailyMatchJob::new(MatchingConfig {
                enhancement_enabled,
                neighborhoods: neighborhoods(),
                ..Default::default()
            });
            let label = if enhancement_enabled { "enhanced" } else { "base" };

            group.bench_with_input(
                BenchmarkId::new(label, renter_count),
                renter_count,
                |b, _| {
                    b.iter(|| job.compute(black_box(&snapshot), run_date()));
                },
            );
        }
    }

    group.finish();
}

fn bench_daily_run(c: &mut Criterion) {
    let store = InMemoryStore::new();
    tokio_test::block_on(async {
        for renter in (0..50).map(create_renter) {
            store.upsert_renter_profile(&renter).await.unwrap();
        }
        for landlord in create_landlords() {
            store.upsert_landlord_profile(&landlord).await.unwrap();
        }
        for listing in (0..200).map(create_listing) {
            store.insert_listing(listing).await;
        }
    });
    let job = DailyMatchJob::default();

    c.bench_function("daily_run_in_memory_50x200", |b| {
        b.iter(|| tokio_test::block_on(job.run(black_box(&store), run_date())).unwrap());
    });
}

criterion_group!(
    benches,
    bench_compatibility,
    bench_blender,
    bench_daily_compute,
    bench_daily_run
);

criterion_main!(benches);
