//! Profiles repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::profile::{Profile, Role},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>>;
    async fn list(&self) -> AppResult<Vec<Profile>>;
    /// Fetch the profile for `id`, creating a member-role row on first
    /// authentication. Never touches the role of an existing profile.
    async fn ensure(
        &self,
        id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
        avatar_url: Option<String>,
    ) -> AppResult<Profile>;
    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<Profile>;
}

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

impl PgProfileRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn list(&self) -> AppResult<Vec<Profile>> {
        let profiles =
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY full_name, email")
                .fetch_all(&self.pool)
                .await?;

        Ok(profiles)
    }

    async fn ensure(
        &self,
        id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
        avatar_url: Option<String>,
    ) -> AppResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, full_name, avatar_url, role)
            VALUES ($1, $2, $3, $4, 'member')
            ON CONFLICT (id) DO UPDATE
            SET email = COALESCE(EXCLUDED.email, profiles.email),
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                avatar_url = COALESCE(EXCLUDED.avatar_url, profiles.avatar_url),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", id)))
    }
}
