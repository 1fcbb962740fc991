use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use summit_core::repository::UserRepository;
use summit_core::{RepoResult, Role, User};
use summit_shared::models::BloodType;

use crate::database::{corrupt, repo_err};

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    phone_number: String,
    date_of_birth: Option<NaiveDate>,
    profile_picture: Option<String>,
    admin_code: Option<String>,
    position: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    blood_type: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = summit_core::RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse::<Role>().map_err(corrupt)?,
            phone_number: row.phone_number,
            date_of_birth: row.date_of_birth,
            profile_picture: row.profile_picture,
            admin_code: row.admin_code,
            position: row.position,
            emergency_contact_name: row.emergency_contact_name,
            emergency_contact_phone: row.emergency_contact_phone,
            blood_type: row.blood_type.map(|b| b.parse::<BloodType>()).transpose().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, role, \
    phone_number, date_of_birth, profile_picture, admin_code, position, \
    emergency_contact_name, emergency_contact_phone, blood_type, created_at, updated_at";

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, first_name, last_name, role,
                phone_number, date_of_birth, profile_picture, admin_code, position,
                emergency_contact_name, emergency_contact_phone, blood_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.phone_number)
        .bind(user.date_of_birth)
        .bind(&user.profile_picture)
        .bind(&user.admin_code)
        .bind(&user.position)
        .bind(&user.emergency_contact_name)
        .bind(&user.emergency_contact_phone)
        .bind(user.blood_type.map(|b| b.as_str()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_err)?;
        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, phone_number = $4, profile_picture = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.profile_picture)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;

        if result.rows_affected() == 0 {
            return Err(summit_core::RepoError::NotFound);
        }
        Ok(())
    }
}
