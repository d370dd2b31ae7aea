use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::models::{
    Conversation, ConversationId, DailyMatch, InteractionEvent, InteractionKind, LandlordProfile,
    ListingProfile, MatchedListing, RenterProfile, UserId,
};
use crate::services::store::{EngagementStore, ProfileStore, StoreError};

/// PostgreSQL-backed profile and engagement store
///
/// Migrations in `./migrations` run on connect.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn opt_u32(value: Option<i32>) -> Option<u32> {
    value.map(to_u32)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn opt_i32(value: Option<u32>) -> Option<i32> {
    value.map(to_i32)
}

fn tag_set(row: &PgRow, column: &str) -> Result<BTreeSet<String>, sqlx::Error> {
    let tags: Vec<String> = row.try_get(column)?;
    Ok(tags.into_iter().collect())
}

fn tag_vec(tags: &BTreeSet<String>) -> Vec<String> {
    tags.iter().cloned().collect()
}

fn renter_from_row(row: &PgRow) -> Result<RenterProfile, sqlx::Error> {
    Ok(RenterProfile {
        user_id: row.try_get("user_id")?,
        budget_min: to_u32(row.try_get("budget_min")?),
        budget_max: to_u32(row.try_get("budget_max")?),
        bedrooms: opt_u32(row.try_get("bedrooms")?),
        bathrooms: opt_u32(row.try_get("bathrooms")?),
        household_size: opt_u32(row.try_get("household_size")?),
        locations: tag_set(row, "locations")?,
        move_in: row.try_get("move_in")?,
        lease_length_months: opt_u32(row.try_get("lease_length_months")?),
        unit_amenities: tag_set(row, "unit_amenities")?,
        building_amenities: tag_set(row, "building_amenities")?,
        pets_required: row.try_get("pets_required")?,
        smoking_preference: row.try_get("smoking_preference")?,
        noise_preference: row.try_get("noise_preference")?,
        visitor_preference: row.try_get("visitor_preference")?,
        custom_preferences: tag_set(row, "custom_preferences")?,
    })
}

fn landlord_from_row(row: &PgRow) -> Result<LandlordProfile, sqlx::Error> {
    Ok(LandlordProfile {
        user_id: row.try_get("user_id")?,
        tenant_policies: tag_set(row, "tenant_policies")?,
        preferred_lease_length: opt_u32(row.try_get("preferred_lease_length")?),
        pets_allowed: row.try_get("pets_allowed")?,
        custom_requirements: tag_set(row, "custom_requirements")?,
    })
}

fn listing_from_row(row: &PgRow) -> Result<ListingProfile, sqlx::Error> {
    Ok(ListingProfile {
        id: row.try_get("id")?,
        landlord_id: row.try_get("landlord_id")?,
        title: row.try_get("title")?,
        location: row.try_get("location")?,
        neighborhood_type: row.try_get("neighborhood_type")?,
        neighborhood_profile: tag_set(row, "neighborhood_profile")?,
        neighborhood_description: row.try_get("neighborhood_description")?,
        rent_price: to_u32(row.try_get("rent_price")?),
        bedrooms: to_u32(row.try_get("bedrooms")?),
        bathrooms: to_u32(row.try_get("bathrooms")?),
        unit_amenities: tag_set(row, "unit_amenities")?,
        building_amenities: tag_set(row, "building_amenities")?,
        lease_length_months: opt_u32(row.try_get("lease_length_months")?),
        available_from: row.try_get("available_from")?,
        max_occupants: opt_u32(row.try_get("max_occupants")?),
        pets_allowed: row.try_get("pets_allowed")?,
        description: row.try_get("description")?,
        custom_tags: tag_set(row, "custom_tags")?,
    })
}

impl ProfileStore for PostgresStore {
    async fn renter_profiles(&self) -> Result<Vec<RenterProfile>, StoreError> {
        let query = r#"
            SELECT user_id, budget_min, budget_max, bedrooms, bathrooms, household_size,
                   locations, move_in, lease_length_months, unit_amenities, building_amenities,
                   pets_required, smoking_preference, noise_preference, visitor_preference,
                   custom_preferences
            FROM renter_profiles
            ORDER BY user_id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let renters = rows
            .iter()
            .map(renter_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} renter profiles", renters.len());
        Ok(renters)
    }

    async fn landlord_profiles(&self) -> Result<Vec<LandlordProfile>, StoreError> {
        let query = r#"
            SELECT user_id, tenant_policies, preferred_lease_length, pets_allowed,
                   custom_requirements
            FROM landlord_profiles
            ORDER BY user_id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(landlord_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn listings(&self) -> Result<Vec<ListingProfile>, StoreError> {
        let query = r#"
            SELECT id, landlord_id, title, location, neighborhood_type, neighborhood_profile,
                   neighborhood_description, rent_price, bedrooms, bathrooms, unit_amenities,
                   building_amenities, lease_length_months, available_from, max_occupants,
                   pets_allowed, description, custom_tags
            FROM listings
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let listings = rows
            .iter()
            .map(listing_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} listings", listings.len());
        Ok(listings)
    }

    async fn interactions(&self) -> Result<Vec<InteractionEvent>, StoreError> {
        let query = r#"
            SELECT user_id, listing_id, 'saved' AS kind FROM saved_listings
            UNION ALL
            SELECT user_id, listing_id, 'visit' AS kind FROM visit_requests
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<InteractionEvent, StoreError> {
                let kind: String = row.try_get("kind")?;
                let kind = match kind.as_str() {
                    "saved" => InteractionKind::Saved,
                    "visit" => InteractionKind::Visit,
                    other => {
                        return Err(StoreError::InvalidData(format!(
                            "unknown interaction kind: {}",
                            other
                        )))
                    }
                };
                Ok(InteractionEvent {
                    user_id: row.try_get("user_id")?,
                    listing_id: row.try_get("listing_id")?,
                    kind,
                })
            })
            .collect()
    }

    async fn delete_matches_for_date(&self, date: NaiveDate) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM daily_matches WHERE run_date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted {} matches for {}", result.rows_affected(), date);
        Ok(result.rows_affected())
    }

    async fn insert_matches(&self, matches: &[DailyMatch]) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO daily_matches (renter_id, listing_id, score, run_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (run_date, renter_id, listing_id)
            DO UPDATE SET score = EXCLUDED.score
        "#;

        let mut tx = self.pool.begin().await?;
        for m in matches {
            sqlx::query(query)
                .bind(m.renter_id)
                .bind(m.listing_id)
                .bind(m.score)
                .bind(m.run_date)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn matches_for_renter(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<DailyMatch>, StoreError> {
        let query = r#"
            SELECT renter_id, listing_id, score, run_date
            FROM daily_matches
            WHERE renter_id = $1 AND run_date = $2
            ORDER BY score DESC, listing_id ASC
        "#;

        let rows = sqlx::query(query)
            .bind(renter_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<DailyMatch, StoreError> {
                Ok(DailyMatch {
                    renter_id: row.try_get("renter_id")?,
                    listing_id: row.try_get("listing_id")?,
                    score: row.try_get("score")?,
                    run_date: row.try_get("run_date")?,
                })
            })
            .collect()
    }

    async fn matched_listings(
        &self,
        renter_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<MatchedListing>, StoreError> {
        let query = r#"
            SELECT l.id, l.title, l.location, l.rent_price, dm.score
            FROM daily_matches dm
            JOIN listings l ON l.id = dm.listing_id
            WHERE dm.renter_id = $1 AND dm.run_date = $2
            ORDER BY dm.score DESC, dm.listing_id ASC
        "#;

        let rows = sqlx::query(query)
            .bind(renter_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<MatchedListing, StoreError> {
                Ok(MatchedListing {
                    listing_id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    location: row.try_get("location")?,
                    rent_price: to_u32(row.try_get("rent_price")?),
                    compatibility_score: row.try_get("score")?,
                })
            })
            .collect()
    }

    async fn upsert_renter_profile(&self, profile: &RenterProfile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO renter_profiles (
                user_id, budget_min, budget_max, bedrooms, bathrooms, household_size,
                locations, move_in, lease_length_months, unit_amenities, building_amenities,
                pets_required, smoking_preference, noise_preference, visitor_preference,
                custom_preferences, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                budget_min = EXCLUDED.budget_min,
                budget_max = EXCLUDED.budget_max,
                bedrooms = EXCLUDED.bedrooms,
                bathrooms = EXCLUDED.bathrooms,
                household_size = EXCLUDED.household_size,
                locations = EXCLUDED.locations,
                move_in = EXCLUDED.move_in,
                lease_length_months = EXCLUDED.lease_length_months,
                unit_amenities = EXCLUDED.unit_amenities,
                building_amenities = EXCLUDED.building_amenities,
                pets_required = EXCLUDED.pets_required,
                smoking_preference = EXCLUDED.smoking_preference,
                noise_preference = EXCLUDED.noise_preference,
                visitor_preference = EXCLUDED.visitor_preference,
                custom_preferences = EXCLUDED.custom_preferences,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(profile.user_id)
            .bind(to_i32(profile.budget_min))
            .bind(to_i32(profile.budget_max))
            .bind(opt_i32(profile.bedrooms))
            .bind(opt_i32(profile.bathrooms))
            .bind(opt_i32(profile.household_size))
            .bind(tag_vec(&profile.locations))
            .bind(&profile.move_in)
            .bind(opt_i32(profile.lease_length_months))
            .bind(tag_vec(&profile.unit_amenities))
            .bind(tag_vec(&profile.building_amenities))
            .bind(profile.pets_required)
            .bind(&profile.smoking_preference)
            .bind(&profile.noise_preference)
            .bind(&profile.visitor_preference)
            .bind(tag_vec(&profile.custom_preferences))
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted renter profile {}", profile.user_id);
        Ok(())
    }

    async fn upsert_landlord_profile(&self, profile: &LandlordProfile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO landlord_profiles (
                user_id, tenant_policies, preferred_lease_length, pets_allowed,
                custom_requirements, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                tenant_policies = EXCLUDED.tenant_policies,
                preferred_lease_length = EXCLUDED.preferred_lease_length,
                pets_allowed = EXCLUDED.pets_allowed,
                custom_requirements = EXCLUDED.custom_requirements,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(profile.user_id)
            .bind(tag_vec(&profile.tenant_policies))
            .bind(opt_i32(profile.preferred_lease_length))
            .bind(profile.pets_allowed)
            .bind(tag_vec(&profile.custom_requirements))
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted landlord profile {}", profile.user_id);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

impl EngagementStore for PostgresStore {
    async fn conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let query = r#"
            SELECT id, renter_id, landlord_id, listing_id
            FROM conversations
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<Conversation, StoreError> {
            Ok(Conversation {
                id: row.try_get("id")?,
                renter_id: row.try_get("renter_id")?,
                landlord_id: row.try_get("landlord_id")?,
                listing_id: row.try_get("listing_id")?,
            })
        })
        .transpose()
    }

    /// Single-statement upsert so concurrent sends never lose an update
    async fn increment_engagement(
        &self,
        conversation_id: ConversationId,
        participant_id: UserId,
    ) -> Result<u32, StoreError> {
        let query = r#"
            INSERT INTO conversation_engagement (conversation_id, participant_id, message_count, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (conversation_id, participant_id)
            DO UPDATE SET
                message_count = conversation_engagement.message_count + 1,
                updated_at = NOW()
            RETURNING message_count
        "#;

        let row = sqlx::query(query)
            .bind(conversation_id)
            .bind(participant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(to_u32(row.try_get("message_count")?))
    }

    async fn engagement_counts(
        &self,
        conversation_id: ConversationId,
    ) -> Result<BTreeMap<UserId, u32>, StoreError> {
        let query = r#"
            SELECT participant_id, message_count
            FROM conversation_engagement
            WHERE conversation_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<(UserId, u32), StoreError> {
                let participant: UserId = row.try_get("participant_id")?;
                let count: i32 = row.try_get("message_count")?;
                Ok((participant, to_u32(count)))
            })
            .collect()
    }
}
