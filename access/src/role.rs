//! Permission tiers.
//!
//! Every authenticated session carries exactly one role. The role decides
//! which protected path prefix the holder may enter; admins may enter all.

#[cfg(test)]
#[path = "role_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed permission tier, discriminated on the wire by `role_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// `role_id == 1`. Superuser: every protected prefix is allowed.
    #[serde(rename = "admin")]
    Admin,
    /// `role_id == 2`. Election observers.
    #[serde(rename = "observer")]
    Observer,
    /// `role_id == 3`. Census and polling field staff.
    #[serde(rename = "field_staff", alias = "field-staff", alias = "fieldStaff")]
    FieldStaff,
}

/// Returned when a role name or id does not map to a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Observer, Self::FieldStaff];

    /// Numeric `role_id` for this role.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Admin => 1,
            Self::Observer => 2,
            Self::FieldStaff => 3,
        }
    }

    /// Map a numeric `role_id` back to a role.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRole`] for any id outside `1..=3`.
    pub fn from_id(id: u8) -> Result<Self, UnknownRole> {
        match id {
            1 => Ok(Self::Admin),
            2 => Ok(Self::Observer),
            3 => Ok(Self::FieldStaff),
            other => Err(UnknownRole(other.to_string())),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Observer => "observer",
            Self::FieldStaff => "field_staff",
        }
    }

    /// Path prefix owned by this role's dashboard.
    #[must_use]
    pub fn home_prefix(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Observer => "/observer",
            Self::FieldStaff => "/field-staff",
        }
    }

    /// Whether this role bypasses per-prefix checks.
    #[must_use]
    pub fn is_superuser(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether a path's leading segment falls under this role's prefix.
    ///
    /// Superusers are allowed everywhere.
    #[must_use]
    pub fn may_enter(self, path: &str) -> bool {
        if self.is_superuser() {
            return true;
        }
        let prefix_segment = self.home_prefix().trim_start_matches('/');
        leading_segment(path) == prefix_segment
    }
}

/// First non-empty `/`-separated segment of a path, or `""` for the root.
pub(crate) fn leading_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or_default()
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "observer" => Ok(Self::Observer),
            "field_staff" | "field-staff" | "fieldstaff" => Ok(Self::FieldStaff),
            _ => Err(UnknownRole(raw.to_owned())),
        }
    }
}
