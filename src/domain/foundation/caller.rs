//! Caller identity as handed over by the authentication layer.
//!
//! Authentication happens upstream; these types only carry the result
//! (which tenant is asking, and in which role) into entitlement decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{TenantId, ValidationError};

/// Role of the authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// A school account; the only billable role.
    School,
    /// Owner of an organization of schools.
    GroupAdmin,
    /// Job seeker account.
    Candidate,
    /// Platform administrator.
    Admin,
    /// Administrator with full platform control.
    SuperAdmin,
}

impl Role {
    /// Only school accounts are bound by a plan. Every other role is
    /// treated as staff and bypasses plan limits entirely.
    pub fn is_billable(&self) -> bool {
        matches!(self, Role::School)
    }

    /// Canonical wire name, as used in headers and tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::School => "school",
            Role::GroupAdmin => "group-admin",
            Role::Candidate => "candidate",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "school" => Ok(Role::School),
            "group-admin" | "group_admin" => Ok(Role::GroupAdmin),
            "candidate" => Ok(Role::Candidate),
            "admin" => Ok(Role::Admin),
            "super-admin" | "super_admin" => Ok(Role::SuperAdmin),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// The principal an entitlement question is asked on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub tenant_id: TenantId,
    pub role: Role,
}

impl Caller {
    pub fn new(tenant_id: TenantId, role: Role) -> Self {
        Self { tenant_id, role }
    }

    /// Shorthand for a billable school caller.
    pub fn school(tenant_id: TenantId) -> Self {
        Self::new(tenant_id, Role::School)
    }
}
