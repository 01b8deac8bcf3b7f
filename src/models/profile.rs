//! Profile model, roles and access policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Library role. The set is closed; anything else decodes to `Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Member => "member",
        }
    }

    /// Map the role to its catalog capabilities. Pure and total.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Role::Admin => Capabilities {
                can_mutate_catalog: true,
                can_assign_roles: true,
            },
            Role::Librarian => Capabilities {
                can_mutate_catalog: true,
                can_assign_roles: false,
            },
            Role::Member => Capabilities {
                can_mutate_catalog: false,
                can_assign_roles: false,
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "librarian" => Ok(Role::Librarian),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        // Least-privileged fallback for unknown role values
        s.parse().unwrap_or(Role::Member)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

// SQLx conversion for Role, stored as text
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        Ok(Role::from(s))
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Catalog-mutation capabilities granted by a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Capabilities {
    pub can_mutate_catalog: bool,
    pub can_assign_roles: bool,
}

/// Profile model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short profile representation joined into checkout history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Update role request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

/// The authenticated principal for the current operation.
///
/// Resolved from the bearer token and the profiles table before any gated
/// action runs; a principal without a profile row is given one with the
/// `Member` role at resolution time.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl Identity {
    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Reader")
    }

    pub fn require_mutate_catalog(&self) -> Result<(), AppError> {
        if self.capabilities().can_mutate_catalog {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to manage the catalog".to_string(),
            ))
        }
    }

    pub fn require_assign_roles(&self) -> Result<(), AppError> {
        if self.capabilities().can_assign_roles {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }
}

impl From<Profile> for Identity {
    fn from(profile: Profile) -> Self {
        Identity {
            id: profile.id,
            role: profile.role,
            email: profile.email,
            full_name: profile.full_name,
        }
    }
}
