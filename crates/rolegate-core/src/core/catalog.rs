// crates/rolegate-core/src/core/catalog.rs
// ============================================================================
// Module: Permission Catalog
// Description: Validated role-to-permission catalog and wildcard tokens.
// Purpose: Hold the static policy shape that compilation expands per tenant.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The catalog is the static side of the authorization model: a validated map
//! from role names to permission pairs. Each permission component is either a
//! literal token or the wildcard sentinel; the human-readable token `all` is
//! remapped to [`PermissionToken::Wildcard`] during normalization. The
//! catalog is immutable once constructed; policy changes require a full
//! reload through the compiler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::RoleName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Human-readable catalog token meaning "every value in this position".
pub const ALL_TOKEN: &str = "all";

/// Internal sentinel a wildcard token renders as in diagnostics.
const WILDCARD_LABEL: &str = "*";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog construction and normalization errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Catalog defines no roles at all.
    #[error("catalog defines no roles")]
    EmptyCatalog,
    /// A role carries no permissions.
    #[error("role '{role}' has no permissions defined")]
    EmptyRole {
        /// Offending role name.
        role: String,
    },
    /// A permission component is the empty string.
    #[error("role '{role}' has an empty {position} token")]
    EmptyToken {
        /// Offending role name.
        role: String,
        /// Position of the empty token (resource or action).
        position: &'static str,
    },
    /// A raw permission token is the empty string.
    #[error("permission token must not be empty")]
    EmptyLiteral,
    /// A literal token uses the reserved wildcard sentinel.
    #[error("token '{token}' is reserved; use '{ALL_TOKEN}' to grant every value")]
    ReservedToken {
        /// Offending raw token.
        token: String,
    },
}

// ============================================================================
// SECTION: Permission Tokens
// ============================================================================

/// One component of a permission: a literal value or the wildcard sentinel.
///
/// # Invariants
/// - A literal is never empty and never the reserved sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionToken {
    /// Matches every concrete value in this position.
    Wildcard,
    /// Matches exactly one concrete value.
    Literal(String),
}

impl PermissionToken {
    /// Normalizes a raw catalog token, remapping [`ALL_TOKEN`] to the
    /// wildcard sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyLiteral`] for the empty string and
    /// [`CatalogError::ReservedToken`] for the raw sentinel string.
    pub fn normalize(raw: &str) -> Result<Self, CatalogError> {
        if raw.is_empty() {
            return Err(CatalogError::EmptyLiteral);
        }
        if raw == ALL_TOKEN {
            return Ok(Self::Wildcard);
        }
        if raw == WILDCARD_LABEL {
            return Err(CatalogError::ReservedToken {
                token: raw.to_string(),
            });
        }
        Ok(Self::Literal(raw.to_string()))
    }

    /// Returns whether this token is the wildcard sentinel.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns a stable display label for diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Wildcard => WILDCARD_LABEL,
            Self::Literal(value) => value,
        }
    }
}

/// Pure wildcard matcher for one permission position.
///
/// Resource and action are matched independently with this function; tenant
/// comparison never goes through it because tenants are never wildcarded.
#[must_use]
pub fn matches(pattern: &PermissionToken, value: &str) -> bool {
    match pattern {
        PermissionToken::Wildcard => true,
        PermissionToken::Literal(literal) => literal == value,
    }
}

// ============================================================================
// SECTION: Permissions and Catalog
// ============================================================================

/// A (resource, action) permission pair.
///
/// # Invariants
/// - Resource and action wildcards are orthogonal; either side may be
///   wildcard independently of the other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Resource token.
    pub resource: PermissionToken,
    /// Action token.
    pub action: PermissionToken,
}

/// Validated map from role names to their permissions.
///
/// # Invariants
/// - At least one role; every role carries at least one permission.
/// - Defined only by the policy source; immutable except via a full reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Role name to permission list.
    roles: BTreeMap<RoleName, Vec<Permission>>,
}

impl Catalog {
    /// Builds a validated catalog from normalized role permissions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog has zero roles, a role has
    /// zero permissions, or a permission carries an empty literal token.
    pub fn new(roles: BTreeMap<RoleName, Vec<Permission>>) -> Result<Self, CatalogError> {
        if roles.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        for (role, permissions) in &roles {
            if permissions.is_empty() {
                return Err(CatalogError::EmptyRole {
                    role: role.as_str().to_string(),
                });
            }
            for permission in permissions {
                let tokens = [
                    (&permission.resource, "resource"),
                    (&permission.action, "action"),
                ];
                for (token, position) in tokens {
                    if let PermissionToken::Literal(value) = token
                        && value.is_empty()
                    {
                        return Err(CatalogError::EmptyToken {
                            role: role.as_str().to_string(),
                            position,
                        });
                    }
                }
            }
        }
        Ok(Self {
            roles,
        })
    }

    /// Returns the static role-name catalog in sorted order.
    #[must_use]
    pub fn role_names(&self) -> Vec<RoleName> {
        self.roles.keys().cloned().collect()
    }

    /// Returns whether the catalog defines the given role.
    #[must_use]
    pub fn contains_role(&self, role: &RoleName) -> bool {
        self.roles.contains_key(role)
    }

    /// Iterates roles and their permissions.
    pub fn iter(&self) -> impl Iterator<Item = (&RoleName, &[Permission])> {
        self.roles.iter().map(|(role, permissions)| (role, permissions.as_slice()))
    }

    /// Returns the number of defined roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
