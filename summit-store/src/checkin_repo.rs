use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use summit_booking::{CheckIn, CheckInFilter, CheckInListing, CheckInStatus};
use summit_core::repository::CheckInRepository;
use summit_core::{RepoError, RepoResult};

use crate::database::{contains_pattern, corrupt, repo_err};

pub struct StoreCheckInRepository {
    pool: PgPool,
}

impl StoreCheckInRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CheckInRow {
    id: Uuid,
    booking_id: Uuid,
    participant_id: Uuid,
    id_card_photo: String,
    selfie_photo: Option<String>,
    qr_code: Option<String>,
    qr_data: String,
    status: String,
    verified_by: Option<Uuid>,
    verified_at: Option<DateTime<Utc>>,
    rejection_reason: String,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CheckInRow {
    fn into_checkin(self) -> RepoResult<CheckIn> {
        Ok(CheckIn {
            id: self.id,
            booking_id: self.booking_id,
            participant_id: self.participant_id,
            id_card_photo: self.id_card_photo,
            selfie_photo: self.selfie_photo,
            qr_code: self.qr_code,
            qr_data: self.qr_data,
            status: self.status.parse::<CheckInStatus>().map_err(corrupt)?,
            verified_by: self.verified_by,
            verified_at: self.verified_at,
            rejection_reason: self.rejection_reason,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CheckInListingRow {
    #[sqlx(flatten)]
    checkin: CheckInRow,
    participant_name: String,
    participant_id_number: String,
    booking_code: String,
    booking_start_date: NaiveDate,
    mountain_name: String,
    customer_email: String,
}

impl CheckInListingRow {
    fn into_listing(self) -> RepoResult<CheckInListing> {
        Ok(CheckInListing {
            checkin: self.checkin.into_checkin()?,
            participant_name: self.participant_name,
            participant_id_number: self.participant_id_number,
            booking_code: self.booking_code,
            booking_start_date: self.booking_start_date,
            mountain_name: self.mountain_name,
            customer_email: self.customer_email,
        })
    }
}

const CHECKIN_COLUMNS: &str = "id, booking_id, participant_id, id_card_photo, selfie_photo, qr_code, \
    qr_data, status, verified_by, verified_at, rejection_reason, notes, created_at, updated_at";

const CHECKIN_LISTING_SELECT: &str = r#"
    SELECT c.id, c.booking_id, c.participant_id, c.id_card_photo, c.selfie_photo, c.qr_code,
           c.qr_data, c.status, c.verified_by, c.verified_at, c.rejection_reason, c.notes,
           c.created_at, c.updated_at,
           p.full_name AS participant_name, p.id_number AS participant_id_number,
           b.booking_code, b.start_date AS booking_start_date,
           m.name AS mountain_name, u.email AS customer_email
    FROM checkins c
    JOIN booking_participants p ON p.id = c.participant_id
    JOIN bookings b ON b.id = c.booking_id
    JOIN routes r ON r.id = b.route_id
    JOIN mountains m ON m.id = r.mountain_id
    JOIN users u ON u.id = b.user_id
"#;

impl StoreCheckInRepository {
    async fn fetch_one<T>(&self, column: &str, value: T) -> RepoResult<Option<CheckIn>>
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!("SELECT {} FROM checkins WHERE {} = $1", CHECKIN_COLUMNS, column);
        let row: Option<CheckInRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_err)?;
        row.map(CheckInRow::into_checkin).transpose()
    }
}

#[async_trait]
impl CheckInRepository for StoreCheckInRepository {
    async fn create_checkin(&self, checkin: &CheckIn) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO checkins ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            CHECKIN_COLUMNS
        ))
        .bind(checkin.id)
        .bind(checkin.booking_id)
        .bind(checkin.participant_id)
        .bind(&checkin.id_card_photo)
        .bind(&checkin.selfie_photo)
        .bind(&checkin.qr_code)
        .bind(&checkin.qr_data)
        .bind(checkin.status.as_str())
        .bind(checkin.verified_by)
        .bind(checkin.verified_at)
        .bind(&checkin.rejection_reason)
        .bind(&checkin.notes)
        .bind(checkin.created_at)
        .bind(checkin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_checkin(&self, id: Uuid) -> RepoResult<Option<CheckIn>> {
        self.fetch_one("id", id).await
    }

    async fn update_checkin(&self, checkin: &CheckIn) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE checkins
            SET qr_code = $2, status = $3, verified_by = $4, verified_at = $5,
                rejection_reason = $6, notes = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(checkin.id)
        .bind(&checkin.qr_code)
        .bind(checkin.status.as_str())
        .bind(checkin.verified_by)
        .bind(checkin.verified_at)
        .bind(&checkin.rejection_reason)
        .bind(&checkin.notes)
        .bind(checkin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_participant(&self, participant_id: Uuid) -> RepoResult<Option<CheckIn>> {
        self.fetch_one("participant_id", participant_id).await
    }

    async fn find_by_qr_data(&self, qr_data: &str) -> RepoResult<Option<CheckIn>> {
        self.fetch_one("qr_data", qr_data.to_string()).await
    }

    async fn get_checkin_listing(&self, id: Uuid) -> RepoResult<Option<CheckInListing>> {
        let row: Option<CheckInListingRow> =
            sqlx::query_as(&format!("{} WHERE c.id = $1", CHECKIN_LISTING_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(repo_err)?;
        row.map(CheckInListingRow::into_listing).transpose()
    }

    async fn list_checkins(&self, filter: &CheckInFilter) -> RepoResult<Vec<CheckInListing>> {
        let mut qb = QueryBuilder::<Postgres>::new(CHECKIN_LISTING_SELECT);
        qb.push(" WHERE TRUE");

        if let Some(status) = filter.status {
            qb.push(" AND c.status = ").push_bind(status.as_str());
        }
        if let Some(booking_id) = filter.booking_id {
            qb.push(" AND c.booking_id = ").push_bind(booking_id);
        }
        if let Some(term) = filter.search_term() {
            let pattern = contains_pattern(&term);
            qb.push(" AND (p.full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR p.id_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR b.booking_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR c.qr_data ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(" ORDER BY c.created_at DESC");

        let rows: Vec<CheckInListingRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(repo_err)?;
        rows.into_iter().map(CheckInListingRow::into_listing).collect()
    }
}
