use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Alumni,
    Admin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Self::Student),
            "Alumni" => Ok(Self::Alumni),
            "Admin" => Ok(Self::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stored member record. Only lives inside the store; use [`PublicUser`]
/// for anything that leaves it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    pub mobile: Option<String>,
    pub role: Role,
    pub status: Status,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: Option<String>,
    pub role: Role,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            mobile: u.mobile.clone(),
            role: u.role,
            status: u.status,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Fields for a new record; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: Option<String>,
    pub role: Role,
    pub status: Status,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<Role>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleCounts {
    pub student: usize,
    pub alumni: usize,
    pub admin: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub by_role: RoleCounts,
    pub by_status: StatusCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_carries_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: 7,
            username: "jdoe".into(),
            email: "j@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            first_name: "J".into(),
            last_name: "Doe".into(),
            mobile: None,
            role: Role::Alumni,
            status: Status::Inactive,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.to_lowercase().contains("password"));
        assert!(json.contains("\"firstName\":\"J\""));
        assert!(json.contains("\"role\":\"Alumni\""));
    }

    #[test]
    fn roles_parse_exactly() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!("Inactive".parse::<Status>().unwrap(), Status::Inactive);
        assert!("Banned".parse::<Status>().is_err());
    }

    #[test]
    fn stats_serialize_with_group_names() {
        let stats = Stats {
            total: 1,
            by_role: RoleCounts {
                admin: 1,
                ..Default::default()
            },
            by_status: StatusCounts {
                active: 1,
                inactive: 0,
            },
        };
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["byRole"]["Admin"], 1);
        assert_eq!(v["byStatus"]["Inactive"], 0);
    }
}
