use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    Coordinates, Donation, DonationMatch, DonationRequest, DonationStatus, DonorProfile,
    DonorVerification, HelpRequest, HelpSeeker, MatchStatus, MatchUpdate, NewDonation,
    NewDonationMatch, NewDonationRequest, NewDonorProfile, NewHelpRequest, NewHelpSeeker,
    NewNotification, NewVerificationRequest, Notification, ProfileCounts, ProfileKind,
    ProfileQuery, RequestStatus, SeekerFilter, SeekerType, SeekerVerification,
    VerificationRequest, VerificationStatus, VerificationUpdate, VerifierStamp,
};
use crate::services::store::{ProfileStore, StoreError};

const DONOR_COLUMNS: &str = "id, user_id, username, email, organization_name, donor_type, phone, \
     address, city, state, pincode, verification_status, verified_by, verified_at, created_at";

const SEEKER_COLUMNS: &str = "id, user_id, email, organization_name, seeker_type, description, \
     phone, address, city, state, pincode, latitude, longitude, capacity, is_urgent, urgent_needs, \
     verification_status, verified_by, verified_at, created_at, updated_at";

const DONATION_COLUMNS: &str = "id, donor_id, title, description, category, quantity, \
     pickup_address, pickup_city, pickup_state, latitude, longitude, pickup_deadline, status, \
     preferred_seeker_types, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, donation_id, requester_id, requester_name, requester_email, \
     message, requested_quantity, status, created_at";

const MATCH_COLUMNS: &str = "id, donation_id, help_seeker_id, status, distance_km, match_score, \
     donor_message, seeker_response, scheduled_pickup, actual_delivery, created_at";

const VERIFICATION_COLUMNS: &str =
    "id, user_id, kind, status, document, notes, submitted_at, reviewed_at, reviewed_by";

const NOTIFICATION_COLUMNS: &str = "id, user_id, message, link, is_read, created_at";

const HELP_REQUEST_COLUMNS: &str = "id, help_seeker_id, category, title, description, \
     quantity_needed, urgency, is_active, deadline, created_at, updated_at";

/// PostgreSQL-backed store for profiles, donations, matches and their workflows
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect, then run pending migrations
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

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

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

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map unique violations to `Conflict` and dangling references to `NotFound`
fn conflict_or(err: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(message());
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound(message());
        }
    }
    StoreError::SqlxError(err)
}

fn missing(what: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{} {}", what, id))
}

/// Case-insensitive substring pattern for ILIKE with wildcards escaped
fn contains_pattern(search: Option<&str>) -> Option<String> {
    search.map(|text| {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn location_from_row(row: &PgRow) -> Result<Option<Coordinates>, sqlx::Error> {
    Ok(Coordinates::from_parts(
        row.try_get("latitude")?,
        row.try_get("longitude")?,
    ))
}

fn donor_from_row(row: &PgRow) -> Result<DonorProfile, sqlx::Error> {
    Ok(DonorProfile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        organization_name: row.try_get("organization_name")?,
        donor_type: row.try_get("donor_type")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        pincode: row.try_get("pincode")?,
        verification_status: row.try_get("verification_status")?,
        verified_by: row.try_get("verified_by")?,
        verified_at: row.try_get("verified_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn seeker_from_row(row: &PgRow) -> Result<HelpSeeker, sqlx::Error> {
    Ok(HelpSeeker {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        organization_name: row.try_get("organization_name")?,
        seeker_type: row.try_get("seeker_type")?,
        description: row.try_get("description")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        pincode: row.try_get("pincode")?,
        location: location_from_row(row)?,
        capacity: row.try_get("capacity")?,
        is_urgent: row.try_get("is_urgent")?,
        urgent_needs: row.try_get("urgent_needs")?,
        verification_status: row.try_get("verification_status")?,
        verified_by: row.try_get("verified_by")?,
        verified_at: row.try_get("verified_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn donation_from_row(row: &PgRow) -> Result<Donation, sqlx::Error> {
    let preferred: Vec<String> = row.try_get("preferred_seeker_types")?;

    Ok(Donation {
        id: row.try_get("id")?,
        donor_id: row.try_get("donor_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        quantity: row.try_get("quantity")?,
        pickup_address: row.try_get("pickup_address")?,
        pickup_city: row.try_get("pickup_city")?,
        pickup_state: row.try_get("pickup_state")?,
        location: location_from_row(row)?,
        pickup_deadline: row.try_get("pickup_deadline")?,
        status: row.try_get("status")?,
        preferred_seeker_types: preferred.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<DonationRequest, sqlx::Error> {
    Ok(DonationRequest {
        id: row.try_get("id")?,
        donation_id: row.try_get("donation_id")?,
        requester_id: row.try_get("requester_id")?,
        requester_name: row.try_get("requester_name")?,
        requester_email: row.try_get("requester_email")?,
        message: row.try_get("message")?,
        requested_quantity: row.try_get("requested_quantity")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<DonationMatch, sqlx::Error> {
    Ok(DonationMatch {
        id: row.try_get("id")?,
        donation_id: row.try_get("donation_id")?,
        help_seeker_id: row.try_get("help_seeker_id")?,
        status: row.try_get("status")?,
        distance_km: row.try_get("distance_km")?,
        match_score: row.try_get("match_score")?,
        donor_message: row.try_get("donor_message")?,
        seeker_response: row.try_get("seeker_response")?,
        scheduled_pickup: row.try_get("scheduled_pickup")?,
        actual_delivery: row.try_get("actual_delivery")?,
        created_at: row.try_get("created_at")?,
    })
}

fn verification_from_row(row: &PgRow) -> Result<VerificationRequest, sqlx::Error> {
    Ok(VerificationRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: row.try_get("kind")?,
        status: row.try_get("status")?,
        document: row.try_get("document")?,
        notes: row.try_get("notes")?,
        submitted_at: row.try_get("submitted_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        reviewed_by: row.try_get("reviewed_by")?,
    })
}

/// Editable donation fields; status only moves through compare-and-set
fn update_donation_query() -> String {
    format!(
        r#"
        UPDATE donations SET
            title = $2,
            description = $3,
            category = $4,
            quantity = $5,
            pickup_address = $6,
            pickup_city = $7,
            pickup_state = $8,
            latitude = $9,
            longitude = $10,
            pickup_deadline = $11,
            preferred_seeker_types = $12,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        DONATION_COLUMNS
    )
}

fn help_request_from_row(row: &PgRow) -> Result<HelpRequest, sqlx::Error> {
    Ok(HelpRequest {
        id: row.try_get("id")?,
        help_seeker_id: row.try_get("help_seeker_id")?,
        category: row.try_get("category")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        quantity_needed: row.try_get("quantity_needed")?,
        urgency: row.try_get("urgency")?,
        is_active: row.try_get("is_active")?,
        deadline: row.try_get("deadline")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> Result<Notification, sqlx::Error> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        link: row.try_get("link")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn list_seeker_types(&self) -> Result<Vec<SeekerType>, StoreError> {
        let rows = sqlx::query("SELECT tag, name, description FROM seeker_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let types = rows
            .iter()
            .map(|row| {
                Ok(SeekerType {
                    tag: row.try_get("tag")?,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(types)
    }

    async fn seeker_type_exists(&self, tag: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM seeker_types WHERE tag = $1) AS found")
            .bind(tag)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("found")?)
    }

    async fn get_or_create_donor_profile(
        &self,
        defaults: NewDonorProfile,
    ) -> Result<(DonorProfile, bool), StoreError> {
        let query = format!(
            r#"
            INSERT INTO donor_profiles
                (user_id, username, email, organization_name, donor_type, phone, address, city, state, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {}
            "#,
            DONOR_COLUMNS
        );

        let inserted = sqlx::query(&query)
            .bind(defaults.user_id)
            .bind(&defaults.username)
            .bind(&defaults.email)
            .bind(&defaults.organization_name)
            .bind(defaults.donor_type)
            .bind(&defaults.phone)
            .bind(&defaults.address)
            .bind(&defaults.city)
            .bind(&defaults.state)
            .bind(&defaults.pincode)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            let profile = donor_from_row(&row)?;
            tracing::info!("Created donor profile {} for user {}", profile.id, profile.user_id);
            return Ok((profile, true));
        }

        let existing = self
            .find_donor_profile_by_user(defaults.user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("donor profile for user {}", defaults.user_id)))?;

        Ok((existing, false))
    }

    async fn upsert_donor_profile(&self, profile: NewDonorProfile) -> Result<DonorProfile, StoreError> {
        let query = format!(
            r#"
            INSERT INTO donor_profiles
                (user_id, username, email, organization_name, donor_type, phone, address, city, state, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                organization_name = EXCLUDED.organization_name,
                donor_type = EXCLUDED.donor_type,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                pincode = EXCLUDED.pincode
            RETURNING {}
            "#,
            DONOR_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(profile.user_id)
            .bind(&profile.username)
            .bind(&profile.email)
            .bind(&profile.organization_name)
            .bind(profile.donor_type)
            .bind(&profile.phone)
            .bind(&profile.address)
            .bind(&profile.city)
            .bind(&profile.state)
            .bind(&profile.pincode)
            .fetch_one(&self.pool)
            .await?;

        Ok(donor_from_row(&row)?)
    }

    async fn get_donor_profile(&self, id: i64) -> Result<DonorProfile, StoreError> {
        let query = format!("SELECT {} FROM donor_profiles WHERE id = $1", DONOR_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donor profile", id))?;

        Ok(donor_from_row(&row)?)
    }

    async fn find_donor_profile_by_user(&self, user_id: Uuid) -> Result<Option<DonorProfile>, StoreError> {
        let query = format!("SELECT {} FROM donor_profiles WHERE user_id = $1", DONOR_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(donor_from_row).transpose()?)
    }

    async fn set_donor_verification(
        &self,
        id: i64,
        status: DonorVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<DonorProfile, StoreError> {
        let query = format!(
            r#"
            UPDATE donor_profiles SET
                verification_status = $2,
                verified_by = COALESCE($3, verified_by),
                verified_at = COALESCE($4, verified_at)
            WHERE id = $1
            RETURNING {}
            "#,
            DONOR_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(status)
            .bind(stamp.map(|s| s.verified_by))
            .bind(stamp.map(|s| s.verified_at))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donor profile", id))?;

        Ok(donor_from_row(&row)?)
    }

    async fn delete_donor_profile(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM donor_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing("donor profile", id));
        }
        Ok(())
    }

    async fn search_donor_profiles(&self, query: &ProfileQuery) -> Result<Vec<DonorProfile>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM donor_profiles
            WHERE ($1::TEXT IS NULL OR verification_status::TEXT = $1)
              AND ($2::TEXT IS NULL
                   OR username ILIKE $2
                   OR COALESCE(email, '') ILIKE $2
                   OR COALESCE(organization_name, '') ILIKE $2
                   OR city ILIKE $2)
            ORDER BY id
            "#,
            DONOR_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(&query.status)
            .bind(contains_pattern(query.search.as_deref()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(donor_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn create_help_seeker(&self, seeker: NewHelpSeeker) -> Result<HelpSeeker, StoreError> {
        let query = format!(
            r#"
            INSERT INTO help_seekers
                (user_id, email, organization_name, seeker_type, description, phone, address,
                 city, state, pincode, latitude, longitude, capacity, is_urgent, urgent_needs)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            SEEKER_COLUMNS
        );

        let user_id = seeker.user_id;
        let row = sqlx::query(&query)
            .bind(seeker.user_id)
            .bind(&seeker.email)
            .bind(&seeker.organization_name)
            .bind(&seeker.seeker_type)
            .bind(&seeker.description)
            .bind(&seeker.phone)
            .bind(&seeker.address)
            .bind(&seeker.city)
            .bind(&seeker.state)
            .bind(&seeker.pincode)
            .bind(seeker.location.map(|c| c.latitude))
            .bind(seeker.location.map(|c| c.longitude))
            .bind(seeker.capacity)
            .bind(seeker.is_urgent)
            .bind(&seeker.urgent_needs)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_or(e, || format!("user {} is already registered as a help seeker", user_id))
            })?;

        Ok(seeker_from_row(&row)?)
    }

    async fn get_help_seeker(&self, id: i64) -> Result<HelpSeeker, StoreError> {
        let query = format!("SELECT {} FROM help_seekers WHERE id = $1", SEEKER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("help seeker", id))?;

        Ok(seeker_from_row(&row)?)
    }

    async fn find_help_seeker_by_user(&self, user_id: Uuid) -> Result<Option<HelpSeeker>, StoreError> {
        let query = format!("SELECT {} FROM help_seekers WHERE user_id = $1", SEEKER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(seeker_from_row).transpose()?)
    }

    async fn list_verified_seekers(&self, filter: &SeekerFilter) -> Result<Vec<HelpSeeker>, StoreError> {
        // Optional filters collapse to TRUE when their parameter is NULL
        let query = format!(
            r#"
            SELECT {}
            FROM help_seekers
            WHERE verification_status = 'verified'
              AND (NOT $1 OR (latitude IS NOT NULL AND longitude IS NOT NULL))
              AND ($2::TEXT IS NULL OR seeker_type = $2)
              AND ($3::TEXT IS NULL OR LOWER(city) = LOWER($3))
              AND ($4::FLOAT8 IS NULL OR latitude BETWEEN $4 AND $5)
              AND ($6::FLOAT8 IS NULL OR longitude BETWEEN $6 AND $7)
            ORDER BY id
            "#,
            SEEKER_COLUMNS
        );

        let bbox = filter.within;
        let rows = sqlx::query(&query)
            .bind(filter.require_location)
            .bind(&filter.seeker_type)
            .bind(&filter.city)
            .bind(bbox.map(|b| b.min_lat))
            .bind(bbox.map(|b| b.max_lat))
            .bind(bbox.map(|b| b.min_lon))
            .bind(bbox.map(|b| b.max_lon))
            .fetch_all(&self.pool)
            .await?;

        let seekers = rows
            .iter()
            .map(seeker_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} verified help seekers", seekers.len());

        Ok(seekers)
    }

    async fn set_seeker_verification(
        &self,
        id: i64,
        status: SeekerVerification,
        stamp: Option<VerifierStamp>,
    ) -> Result<HelpSeeker, StoreError> {
        let query = format!(
            r#"
            UPDATE help_seekers SET
                verification_status = $2,
                verified_by = COALESCE($3, verified_by),
                verified_at = COALESCE($4, verified_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SEEKER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(status)
            .bind(stamp.map(|s| s.verified_by))
            .bind(stamp.map(|s| s.verified_at))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("help seeker", id))?;

        Ok(seeker_from_row(&row)?)
    }

    async fn delete_help_seeker(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM help_seekers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing("help seeker", id));
        }
        Ok(())
    }

    async fn search_help_seekers(&self, query: &ProfileQuery) -> Result<Vec<HelpSeeker>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM help_seekers
            WHERE ($1::TEXT IS NULL OR verification_status::TEXT = $1)
              AND ($2::TEXT IS NULL
                   OR organization_name ILIKE $2
                   OR COALESCE(email, '') ILIKE $2
                   OR city ILIKE $2
                   OR description ILIKE $2)
            ORDER BY id
            "#,
            SEEKER_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(&query.status)
            .bind(contains_pattern(query.search.as_deref()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(seeker_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn profile_counts(&self) -> Result<ProfileCounts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM donor_profiles) AS total_donors,
                (SELECT COUNT(*) FROM donor_profiles WHERE verification_status = 'verified') AS verified_donors,
                (SELECT COUNT(*) FROM donor_profiles WHERE verification_status = 'pending') AS pending_donors,
                (SELECT COUNT(*) FROM help_seekers) AS total_seekers,
                (SELECT COUNT(*) FROM help_seekers WHERE verification_status = 'verified') AS verified_seekers,
                (SELECT COUNT(*) FROM help_seekers WHERE verification_status = 'pending') AS pending_seekers,
                (SELECT COUNT(*) FROM verification_requests WHERE status = 'pending') AS pending_requests
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProfileCounts {
            total_donors: row.try_get("total_donors")?,
            verified_donors: row.try_get("verified_donors")?,
            pending_donors: row.try_get("pending_donors")?,
            total_seekers: row.try_get("total_seekers")?,
            verified_seekers: row.try_get("verified_seekers")?,
            pending_seekers: row.try_get("pending_seekers")?,
            pending_requests: row.try_get("pending_requests")?,
        })
    }

    async fn insert_help_request(&self, request: NewHelpRequest) -> Result<HelpRequest, StoreError> {
        let query = format!(
            r#"
            INSERT INTO help_requests
                (help_seeker_id, category, title, description, quantity_needed, urgency, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            HELP_REQUEST_COLUMNS
        );

        let seeker_id = request.help_seeker_id;
        let row = sqlx::query(&query)
            .bind(request.help_seeker_id)
            .bind(&request.category)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.quantity_needed)
            .bind(request.urgency)
            .bind(request.deadline)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, || format!("help seeker {}", seeker_id)))?;

        Ok(help_request_from_row(&row)?)
    }

    async fn get_help_request(&self, id: i64) -> Result<HelpRequest, StoreError> {
        let query = format!("SELECT {} FROM help_requests WHERE id = $1", HELP_REQUEST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("help request", id))?;

        Ok(help_request_from_row(&row)?)
    }

    async fn list_help_requests_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<HelpRequest>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM help_requests
            WHERE help_seeker_id = $1
            ORDER BY urgency DESC, created_at DESC, id DESC
            "#,
            HELP_REQUEST_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(help_seeker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(help_request_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_open_help_requests(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<HelpRequest>, StoreError> {
        // help_urgency sorts in declaration order, so DESC puts critical first
        let query = format!(
            r#"
            SELECT {}
            FROM help_requests
            WHERE is_active
              AND (deadline IS NULL OR deadline > $1)
              AND ($2::TEXT IS NULL OR LOWER(category) = LOWER($2))
              AND help_seeker_id IN (SELECT id FROM help_seekers WHERE verification_status = 'verified')
            ORDER BY urgency DESC, created_at DESC, id DESC
            "#,
            HELP_REQUEST_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(now)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(help_request_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn close_help_request(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE help_requests SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        self.get_help_request(id).await?;
        Ok(false)
    }

    async fn insert_donation(&self, donation: NewDonation) -> Result<Donation, StoreError> {
        let query = format!(
            r#"
            INSERT INTO donations
                (donor_id, title, description, category, quantity, pickup_address, pickup_city,
                 pickup_state, latitude, longitude, pickup_deadline, status, preferred_seeker_types)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            DONATION_COLUMNS
        );

        let donor_id = donation.donor_id;
        let preferred: Vec<String> = donation.preferred_seeker_types.into_iter().collect();
        let row = sqlx::query(&query)
            .bind(donation.donor_id)
            .bind(&donation.title)
            .bind(&donation.description)
            .bind(&donation.category)
            .bind(donation.quantity)
            .bind(&donation.pickup_address)
            .bind(&donation.pickup_city)
            .bind(&donation.pickup_state)
            .bind(donation.location.map(|c| c.latitude))
            .bind(donation.location.map(|c| c.longitude))
            .bind(donation.pickup_deadline)
            .bind(donation.status)
            .bind(&preferred)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, || format!("donor profile {}", donor_id)))?;

        Ok(donation_from_row(&row)?)
    }

    async fn get_donation(&self, id: i64) -> Result<Donation, StoreError> {
        let query = format!("SELECT {} FROM donations WHERE id = $1", DONATION_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donation", id))?;

        Ok(donation_from_row(&row)?)
    }

    async fn update_donation(&self, donation: &Donation) -> Result<Donation, StoreError> {
        let query = update_donation_query();

        let preferred: Vec<String> = donation.preferred_seeker_types.iter().cloned().collect();
        let row = sqlx::query(&query)
            .bind(donation.id)
            .bind(&donation.title)
            .bind(&donation.description)
            .bind(&donation.category)
            .bind(donation.quantity)
            .bind(&donation.pickup_address)
            .bind(&donation.pickup_city)
            .bind(&donation.pickup_state)
            .bind(donation.location.map(|c| c.latitude))
            .bind(donation.location.map(|c| c.longitude))
            .bind(donation.pickup_deadline)
            .bind(&preferred)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donation", donation.id))?;

        Ok(donation_from_row(&row)?)
    }

    async fn set_donation_status(
        &self,
        id: i64,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE donations SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish a lost race from a missing row
        self.get_donation(id).await?;
        Ok(false)
    }

    async fn list_available_donations(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
    ) -> Result<Vec<Donation>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM donations
            WHERE status = 'available'
              AND pickup_deadline > $1
              AND ($2::TEXT IS NULL OR LOWER(category) = LOWER($2))
            ORDER BY created_at DESC, id DESC
            "#,
            DONATION_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(now)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(donation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>, StoreError> {
        let query = format!(
            "SELECT {} FROM donations WHERE donor_id = $1 ORDER BY created_at DESC, id DESC",
            DONATION_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(donor_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(donation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn insert_donation_request(&self, request: NewDonationRequest) -> Result<DonationRequest, StoreError> {
        let query = format!(
            r#"
            INSERT INTO donation_requests
                (donation_id, requester_id, requester_name, requester_email, message, requested_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );

        let donation_id = request.donation_id;
        let row = sqlx::query(&query)
            .bind(request.donation_id)
            .bind(request.requester_id)
            .bind(&request.requester_name)
            .bind(&request.requester_email)
            .bind(&request.message)
            .bind(request.requested_quantity)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_or(e, || format!("donation {} was already requested by this user", donation_id))
            })?;

        Ok(request_from_row(&row)?)
    }

    async fn get_donation_request(&self, id: i64) -> Result<DonationRequest, StoreError> {
        let query = format!("SELECT {} FROM donation_requests WHERE id = $1", REQUEST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donation request", id))?;

        Ok(request_from_row(&row)?)
    }

    async fn list_donation_requests(&self, donation_id: i64) -> Result<Vec<DonationRequest>, StoreError> {
        let query = format!(
            "SELECT {} FROM donation_requests WHERE donation_id = $1 ORDER BY created_at DESC, id DESC",
            REQUEST_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(donation_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(request_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn set_donation_request_status(
        &self,
        id: i64,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<Option<DonationRequest>, StoreError> {
        let query = format!(
            "UPDATE donation_requests SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            REQUEST_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(expected)
            .bind(next)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(request_from_row(&row)?)),
            None => {
                self.get_donation_request(id).await?;
                Ok(None)
            }
        }
    }

    async fn insert_match(&self, new_match: NewDonationMatch) -> Result<DonationMatch, StoreError> {
        let query = format!(
            r#"
            INSERT INTO donation_matches
                (donation_id, help_seeker_id, distance_km, match_score, donor_message, scheduled_pickup)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let (donation_id, seeker_id) = (new_match.donation_id, new_match.help_seeker_id);
        let row = sqlx::query(&query)
            .bind(new_match.donation_id)
            .bind(new_match.help_seeker_id)
            .bind(new_match.distance_km)
            .bind(new_match.match_score)
            .bind(&new_match.donor_message)
            .bind(new_match.scheduled_pickup)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_or(e, || {
                    format!(
                        "donation {} already has an active match with help seeker {}",
                        donation_id, seeker_id
                    )
                })
            })?;

        Ok(match_from_row(&row)?)
    }

    async fn get_match(&self, id: i64) -> Result<DonationMatch, StoreError> {
        let query = format!("SELECT {} FROM donation_matches WHERE id = $1", MATCH_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("donation match", id))?;

        Ok(match_from_row(&row)?)
    }

    async fn list_matches_by_seeker(&self, help_seeker_id: i64) -> Result<Vec<DonationMatch>, StoreError> {
        let query = format!(
            "SELECT {} FROM donation_matches WHERE help_seeker_id = $1 ORDER BY created_at DESC, id DESC",
            MATCH_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(help_seeker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn transition_match(
        &self,
        id: i64,
        expected: MatchStatus,
        update: MatchUpdate,
    ) -> Result<Option<DonationMatch>, StoreError> {
        let query = format!(
            r#"
            UPDATE donation_matches SET
                status = $3,
                seeker_response = COALESCE($4, seeker_response),
                actual_delivery = COALESCE($5, actual_delivery)
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(expected)
            .bind(update.status)
            .bind(&update.seeker_response)
            .bind(update.actual_delivery)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(match_from_row(&row)?)),
            None => {
                self.get_match(id).await?;
                Ok(None)
            }
        }
    }

    async fn insert_verification_request(
        &self,
        request: NewVerificationRequest,
    ) -> Result<VerificationRequest, StoreError> {
        let query = format!(
            "INSERT INTO verification_requests (user_id, kind, document) VALUES ($1, $2, $3) RETURNING {}",
            VERIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(request.user_id)
            .bind(request.kind)
            .bind(&request.document)
            .fetch_one(&self.pool)
            .await?;

        Ok(verification_from_row(&row)?)
    }

    async fn get_verification_request(&self, id: i64) -> Result<VerificationRequest, StoreError> {
        let query = format!(
            "SELECT {} FROM verification_requests WHERE id = $1",
            VERIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing("verification request", id))?;

        Ok(verification_from_row(&row)?)
    }

    async fn list_open_verification_requests(&self) -> Result<Vec<VerificationRequest>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM verification_requests
            WHERE status IN ('pending', 'under_review')
            ORDER BY submitted_at, id
            "#,
            VERIFICATION_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(verification_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn latest_verification_request(
        &self,
        user_id: Uuid,
        kind: ProfileKind,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        let query = format!(
            r#"
            SELECT {}
            FROM verification_requests
            WHERE user_id = $1 AND kind = $2
            ORDER BY submitted_at DESC, id DESC
            LIMIT 1
            "#,
            VERIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(verification_from_row).transpose()?)
    }

    async fn transition_verification_request(
        &self,
        id: i64,
        expected: VerificationStatus,
        update: VerificationUpdate,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        let query = format!(
            r#"
            UPDATE verification_requests SET
                status = $3,
                notes = COALESCE($4, notes),
                reviewed_by = COALESCE($5, reviewed_by),
                reviewed_at = COALESCE($6, reviewed_at)
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(expected)
            .bind(update.status)
            .bind(&update.notes)
            .bind(update.reviewed_by)
            .bind(update.reviewed_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(verification_from_row(&row)?)),
            None => {
                self.get_verification_request(id).await?;
                Ok(None)
            }
        }
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let query = format!(
            "INSERT INTO notifications (user_id, message, link) VALUES ($1, $2, $3) RETURNING {}",
            NOTIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(notification.user_id)
            .bind(&notification.message)
            .bind(&notification.link)
            .fetch_one(&self.pool)
            .await?;

        Ok(notification_from_row(&row)?)
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let query = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(notification_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn mark_notification_read(&self, id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
