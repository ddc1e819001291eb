// crates/rolegate-core/src/core/facts.rs
// ============================================================================
// Module: Policy Facts and Assignments
// Description: Compiled per-tenant policy facts and durable role assignments.
// Purpose: Define the two fact lifecycles and the catalog-to-fact compiler.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Two fact kinds flow through the engine:
//! - [`PolicyFact`]: compiled (role, resource, action, tenant) tuple. Exists
//!   only in memory and is regenerated wholesale on load/reload, never
//!   partially patched.
//! - [`Assignment`]: durable (user, role, tenant) binding, unique per triple.
//!   The only fact type ever written to the persistent store.
//!
//! [`compile_facts`] is the policy compiler: it expands the catalog for a
//! concrete tenant list, one fact per role x permission x tenant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::catalog::Catalog;
use crate::core::catalog::PermissionToken;
use crate::core::identifiers::RoleName;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy compilation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The tenant list supplied to compilation is empty.
    #[error("tenant list must not be empty for policy compilation")]
    EmptyTenantList,
    /// A tenant identifier in the list is the empty string.
    #[error("tenant identifier must not be empty")]
    EmptyTenantId,
}

// ============================================================================
// SECTION: Fact Types
// ============================================================================

/// Compiled permission fact scoped to a single tenant.
///
/// # Invariants
/// - In-memory only; no code path persists policy facts.
/// - `tenant` is a concrete identifier; the tenant position is never wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyFact {
    /// Role granted the permission.
    pub role: RoleName,
    /// Resource token (literal or wildcard).
    pub resource: PermissionToken,
    /// Action token (literal or wildcard).
    pub action: PermissionToken,
    /// Tenant the fact applies to.
    pub tenant: TenantId,
}

/// Durable binding of a user to a role within a tenant.
///
/// # Invariants
/// - Unique per (user, role, tenant) triple.
/// - The only record category the assignment store ever persists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Bound user.
    pub user: UserId,
    /// Assigned role.
    pub role: RoleName,
    /// Tenant scope of the binding.
    pub tenant: TenantId,
}

impl Assignment {
    /// Creates a new assignment triple.
    #[must_use]
    pub fn new(
        user: impl Into<UserId>,
        role: impl Into<RoleName>,
        tenant: impl Into<TenantId>,
    ) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            tenant: tenant.into(),
        }
    }
}

// ============================================================================
// SECTION: Compiler
// ============================================================================

/// Expands the catalog into concrete per-tenant policy facts.
///
/// Emits one fact for every role x permission x tenant combination. The
/// result replaces any previous fact set wholesale; callers must never merge
/// it into existing facts.
///
/// # Errors
///
/// Returns [`CompileError`] when the tenant list is empty or contains an
/// empty identifier.
pub fn compile_facts(
    catalog: &Catalog,
    tenants: &[TenantId],
) -> Result<BTreeSet<PolicyFact>, CompileError> {
    if tenants.is_empty() {
        return Err(CompileError::EmptyTenantList);
    }
    if tenants.iter().any(|tenant| tenant.as_str().is_empty()) {
        return Err(CompileError::EmptyTenantId);
    }
    let mut facts = BTreeSet::new();
    for (role, permissions) in catalog.iter() {
        for permission in permissions {
            for tenant in tenants {
                facts.insert(PolicyFact {
                    role: role.clone(),
                    resource: permission.resource.clone(),
                    action: permission.action.clone(),
                    tenant: tenant.clone(),
                });
            }
        }
    }
    Ok(facts)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
