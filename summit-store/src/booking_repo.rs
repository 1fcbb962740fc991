use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use summit_booking::{
    Booking, BookingFilter, BookingListing, BookingStatus, Participant, ParticipantProfile, PaymentMethod,
};
use summit_core::repository::BookingRepository;
use summit_core::{RepoError, RepoResult};
use summit_shared::models::{BloodType, Gender};
use summit_shared::Masked;

use crate::database::{contains_pattern, corrupt, repo_err};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_code: String,
    user_id: Uuid,
    route_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    num_participants: i32,
    price_per_person: i64,
    payment_method: Option<String>,
    payment_proof: Option<String>,
    status: String,
    notes: String,
    admin_notes: String,
    cancellation_reason: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    fn into_booking(self) -> RepoResult<Booking> {
        Ok(Booking {
            id: self.id,
            booking_code: self.booking_code,
            user_id: self.user_id,
            route_id: self.route_id,
            start_date: self.start_date,
            end_date: self.end_date,
            num_participants: self.num_participants,
            price_per_person: self.price_per_person,
            payment_method: self
                .payment_method
                .map(|m| m.parse::<PaymentMethod>())
                .transpose()
                .map_err(corrupt)?,
            payment_proof: self.payment_proof,
            status: self.status.parse::<BookingStatus>().map_err(corrupt)?,
            notes: self.notes,
            admin_notes: self.admin_notes,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
            confirmed_at: self.confirmed_at,
            cancelled_at: self.cancelled_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingListingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    route_name: String,
    route_slug: String,
    mountain_name: String,
    customer_email: String,
    customer_first_name: String,
    customer_last_name: String,
}

impl BookingListingRow {
    fn into_listing(self) -> RepoResult<BookingListing> {
        Ok(BookingListing::new(
            self.booking.into_booking()?,
            self.route_name,
            self.route_slug,
            self.mountain_name,
            self.customer_email,
            self.customer_first_name,
            self.customer_last_name,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    booking_id: Uuid,
    full_name: String,
    id_number: String,
    date_of_birth: NaiveDate,
    gender: String,
    blood_type: String,
    phone_number: String,
    email: String,
    address: String,
    city: String,
    province: String,
    postal_code: String,
    emergency_contact_name: String,
    emergency_contact_phone: String,
    emergency_contact_relation: String,
    health_notes: String,
    health_certificate: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParticipantRow {
    fn into_participant(self) -> RepoResult<Participant> {
        Ok(Participant {
            id: self.id,
            booking_id: self.booking_id,
            profile: ParticipantProfile {
                full_name: self.full_name,
                id_number: Masked(self.id_number),
                date_of_birth: self.date_of_birth,
                gender: self.gender.parse::<Gender>().map_err(corrupt)?,
                blood_type: self.blood_type.parse::<BloodType>().map_err(corrupt)?,
                phone_number: self.phone_number,
                email: self.email,
                address: self.address,
                city: self.city,
                province: self.province,
                postal_code: self.postal_code,
                emergency_contact_name: self.emergency_contact_name,
                emergency_contact_phone: self.emergency_contact_phone,
                emergency_contact_relation: self.emergency_contact_relation,
                health_notes: self.health_notes,
            },
            health_certificate: self.health_certificate,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, booking_code, user_id, route_id, start_date, end_date, \
    num_participants, price_per_person, payment_method, payment_proof, status, notes, admin_notes, \
    cancellation_reason, created_at, updated_at, paid_at, confirmed_at, cancelled_at, completed_at";

const BOOKING_LISTING_SELECT: &str = r#"
    SELECT b.id, b.booking_code, b.user_id, b.route_id, b.start_date, b.end_date,
           b.num_participants, b.price_per_person, b.payment_method, b.payment_proof, b.status,
           b.notes, b.admin_notes, b.cancellation_reason, b.created_at, b.updated_at,
           b.paid_at, b.confirmed_at, b.cancelled_at, b.completed_at,
           r.name AS route_name, r.slug AS route_slug, m.name AS mountain_name,
           u.email AS customer_email, u.first_name AS customer_first_name,
           u.last_name AS customer_last_name
    FROM bookings b
    JOIN routes r ON r.id = b.route_id
    JOIN mountains m ON m.id = r.mountain_id
    JOIN users u ON u.id = b.user_id
"#;

const PARTICIPANT_COLUMNS: &str = "id, booking_id, full_name, id_number, date_of_birth, gender, \
    blood_type, phone_number, email, address, city, province, postal_code, emergency_contact_name, \
    emergency_contact_phone, emergency_contact_relation, health_notes, health_certificate, \
    created_at, updated_at";

/// Writes every mutable booking column, including the derived total.
async fn save_booking<'e, E>(executor: E, booking: &Booking) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET num_participants = $2, total_price = $3, payment_method = $4, payment_proof = $5,
            status = $6, notes = $7, admin_notes = $8, cancellation_reason = $9, updated_at = $10,
            paid_at = $11, confirmed_at = $12, cancelled_at = $13, completed_at = $14
        WHERE id = $1
        "#,
    )
    .bind(booking.id)
    .bind(booking.num_participants)
    .bind(booking.total_price())
    .bind(booking.payment_method.map(|m| m.as_str()))
    .bind(&booking.payment_proof)
    .bind(booking.status.as_str())
    .bind(&booking.notes)
    .bind(&booking.admin_notes)
    .bind(&booking.cancellation_reason)
    .bind(booking.updated_at)
    .bind(booking.paid_at)
    .bind(booking.confirmed_at)
    .bind(booking.cancelled_at)
    .bind(booking.completed_at)
    .execute(executor)
    .await
    .map_err(repo_err)?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_code, user_id, route_id, start_date, end_date,
                num_participants, price_per_person, total_price, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_code)
        .bind(booking.user_id)
        .bind(booking.route_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.num_participants)
        .bind(booking.price_per_person)
        .bind(booking.total_price())
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(repo_err)?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn update_booking(&self, booking: &Booking) -> RepoResult<()> {
        save_booking(&self.pool, booking).await
    }

    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<BookingListing>> {
        let row: Option<BookingListingRow> =
            sqlx::query_as(&format!("{} WHERE b.id = $1", BOOKING_LISTING_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(repo_err)?;
        row.map(BookingListingRow::into_listing).transpose()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<BookingListing>> {
        let mut qb = QueryBuilder::<Postgres>::new(BOOKING_LISTING_SELECT);
        qb.push(" WHERE TRUE");

        if let Some(user_id) = filter.user_id {
            qb.push(" AND b.user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND b.status = ").push_bind(status.as_str());
        }
        if let Some(from) = filter.start_from {
            qb.push(" AND b.start_date >= ").push_bind(from);
        }
        if let Some(to) = filter.start_to {
            qb.push(" AND b.start_date <= ").push_bind(to);
        }
        if let Some(term) = filter.search_term() {
            let pattern = contains_pattern(&term);
            qb.push(" AND (b.booking_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR u.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR u.last_name ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(" ORDER BY b.created_at DESC");

        let rows: Vec<BookingListingRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(repo_err)?;
        rows.into_iter().map(BookingListingRow::into_listing).collect()
    }

    async fn list_participants(&self, booking_id: Uuid) -> RepoResult<Vec<Participant>> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM booking_participants WHERE booking_id = $1 ORDER BY created_at",
            PARTICIPANT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(repo_err)?;
        rows.into_iter().map(ParticipantRow::into_participant).collect()
    }

    async fn get_participant(&self, id: Uuid) -> RepoResult<Option<Participant>> {
        let row: Option<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM booking_participants WHERE id = $1",
            PARTICIPANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_err)?;
        row.map(ParticipantRow::into_participant).transpose()
    }

    async fn add_participant(&self, participant: &Participant) -> RepoResult<()> {
        let p = &participant.profile;
        sqlx::query(&format!(
            "INSERT INTO booking_participants ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
            PARTICIPANT_COLUMNS
        ))
        .bind(participant.id)
        .bind(participant.booking_id)
        .bind(&p.full_name)
        .bind(p.id_number.expose())
        .bind(p.date_of_birth)
        .bind(p.gender.as_str())
        .bind(p.blood_type.as_str())
        .bind(&p.phone_number)
        .bind(&p.email)
        .bind(&p.address)
        .bind(&p.city)
        .bind(&p.province)
        .bind(&p.postal_code)
        .bind(&p.emergency_contact_name)
        .bind(&p.emergency_contact_phone)
        .bind(&p.emergency_contact_relation)
        .bind(&p.health_notes)
        .bind(&participant.health_certificate)
        .bind(participant.created_at)
        .bind(participant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn update_participant(&self, participant: &Participant) -> RepoResult<()> {
        let p = &participant.profile;
        let result = sqlx::query(
            r#"
            UPDATE booking_participants
            SET full_name = $2, id_number = $3, date_of_birth = $4, gender = $5, blood_type = $6,
                phone_number = $7, email = $8, address = $9, city = $10, province = $11,
                postal_code = $12, emergency_contact_name = $13, emergency_contact_phone = $14,
                emergency_contact_relation = $15, health_notes = $16, health_certificate = $17,
                updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(participant.id)
        .bind(&p.full_name)
        .bind(p.id_number.expose())
        .bind(p.date_of_birth)
        .bind(p.gender.as_str())
        .bind(p.blood_type.as_str())
        .bind(&p.phone_number)
        .bind(&p.email)
        .bind(&p.address)
        .bind(&p.city)
        .bind(&p.province)
        .bind(&p.postal_code)
        .bind(&p.emergency_contact_name)
        .bind(&p.emergency_contact_phone)
        .bind(&p.emergency_contact_relation)
        .bind(&p.health_notes)
        .bind(&participant.health_certificate)
        .bind(participant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn remove_participant(&self, participant_id: Uuid, booking: &Booking) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(repo_err)?;

        let result = sqlx::query("DELETE FROM booking_participants WHERE id = $1 AND booking_id = $2")
            .bind(participant_id)
            .bind(booking.id)
            .execute(&mut *tx)
            .await
            .map_err(repo_err)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        save_booking(&mut *tx, booking).await?;
        tx.commit().await.map_err(repo_err)?;
        Ok(())
    }
}
