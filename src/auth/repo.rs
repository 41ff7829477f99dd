use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
    pub created_at: OffsetDateTime,
}

/// User persistence behind a seam so handlers can run against an in-memory
/// implementation in tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Create a credential user. The password hash is produced server-side.
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> anyhow::Result<User>;

    /// Create or link a user on first OAuth login. An existing row keeps its
    /// name and avatar; only the provider linkage is refreshed.
    async fn upsert_oauth(
        &self,
        name: &str,
        email: &str,
        image: Option<&str>,
        provider: &str,
        oauth_id: &str,
    ) -> anyhow::Result<User>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, image, oauth_provider, oauth_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, image, oauth_provider, oauth_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, image, oauth_provider, oauth_id, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn upsert_oauth(
        &self,
        name: &str,
        email: &str,
        image: Option<&str>,
        provider: &str,
        oauth_id: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, image, oauth_provider, oauth_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET image = COALESCE(users.image, EXCLUDED.image),
                oauth_provider = EXCLUDED.oauth_provider,
                oauth_id = EXCLUDED.oauth_id
            RETURNING id, name, email, password_hash, image, oauth_provider, oauth_id, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(image)
        .bind(provider)
        .bind(oauth_id)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}
