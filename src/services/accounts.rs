//! Account service: identity resolution and role administration

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::profile::{Identity, Profile, Role},
    repository::Repository,
};

/// Claims carried by the external authentication collaborator's token.
#[derive(Debug, Clone)]
pub struct PrincipalClaims {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    repository: Repository,
}

impl AccountService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Resolve a token's principal to an identity.
    ///
    /// The role comes from the profiles collection, not from the token, so
    /// role changes take effect on the next request. A principal seen for
    /// the first time gets a member-role profile (fail-closed default).
    pub async fn identify(&self, claims: &PrincipalClaims) -> AppResult<Identity> {
        let profile = self
            .repository
            .profiles
            .ensure(
                claims.id,
                claims.email.clone(),
                claims.full_name.clone(),
                claims.avatar_url.clone(),
            )
            .await?;

        Ok(Identity::from(profile))
    }

    /// Get the caller's own profile
    pub async fn me(&self, identity: &Identity) -> AppResult<Profile> {
        self.repository
            .profiles
            .get_by_id(identity.id)
            .await?
            .ok_or_else(|| {
                crate::error::AppError::NotFound(format!(
                    "Profile with id {} not found",
                    identity.id
                ))
            })
    }

    /// List all profiles (admin only)
    pub async fn list(&self, identity: &Identity) -> AppResult<Vec<Profile>> {
        identity.require_assign_roles()?;
        self.repository.profiles.list().await
    }

    /// Assign a role to a profile (admin only)
    pub async fn set_role(
        &self,
        identity: &Identity,
        target: Uuid,
        role: Role,
    ) -> AppResult<Profile> {
        identity.require_assign_roles()?;

        let profile = self.repository.profiles.set_role(target, role).await?;
        tracing::info!(user_id = %target, role = %role, changed_by = %identity.id, "role assigned");
        Ok(profile)
    }
}
