// crates/rolegate-core/src/core/service.rs
// ============================================================================
// Module: Authorization Service
// Description: Facade composing catalog, enforcement tables, and store.
// Purpose: Answer enforcement queries and apply administrative mutations
//          under one locking discipline.
// Dependencies: crate::core, crate::interfaces, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`AuthorizationService`] is the single entry point callers hold: it owns
//! the lock-guarded [`EngineTables`] and a handle to the durable
//! [`AssignmentStore`], and it validates every argument before touching
//! either. Reads ([`AuthorizationService::can_do`] and the role queries) take
//! the read lock and run in parallel; mutations take the write lock and are
//! exclusive. Policy reloads swap the entire fact table inside one critical
//! section so no caller observes a half-rebuilt set.
//!
//! Failure discipline: a denial is `Ok(false)`; an inability to decide is an
//! error and therefore a denial at the caller. No failure path returns
//! `Ok(true)`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::catalog::Catalog;
use crate::core::engine::EnforcementQuery;
use crate::core::engine::EngineTables;
use crate::core::facts::Assignment;
use crate::core::facts::CompileError;
use crate::core::facts::compile_facts;
use crate::core::identifiers::RoleName;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::interfaces::AddOutcome;
use crate::interfaces::AssignmentStore;
use crate::interfaces::RemoveOutcome;
use crate::interfaces::StorageRecord;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authorization service errors.
///
/// # Invariants
/// - [`AuthzError::InvalidArgument`] is raised before any engine or store
///   access.
/// - [`AuthzError::Enforcement`] is always paired with a deny at the caller;
///   it never accompanies a granted decision.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Empty identifier, unknown role, or empty tenant list.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The assignment store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The engine could not produce a decision; treat as deny.
    #[error("enforcement failure: {0}")]
    Enforcement(String),
}

impl From<CompileError> for AuthzError {
    fn from(error: CompileError) -> Self {
        Self::InvalidArgument(error.to_string())
    }
}

/// Rejects empty identifier fields before engine or store access.
fn require_non_empty(field: &'static str, value: &str) -> Result<(), AuthzError> {
    if value.is_empty() {
        return Err(AuthzError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Facade over the compiled fact set, live assignments, and durable store.
///
/// # Invariants
/// - The catalog is immutable for the service lifetime; role definitions
///   change only by constructing a new service.
/// - Every mutation persists through the store before mutating the in-memory
///   mirror, so a store failure leaves the tables untouched.
/// - Store write and mirror update happen under one write-lock critical
///   section; concurrent mutations of the same triple serialize and the
///   mirror never diverges from the durable store.
pub struct AuthorizationService {
    /// Static permission catalog.
    catalog: Catalog,
    /// Lock-guarded fact and assignment tables.
    tables: RwLock<EngineTables>,
    /// Durable assignment store.
    store: Arc<dyn AssignmentStore>,
}

impl AuthorizationService {
    /// Builds a service: compiles facts for the initial tenant set and loads
    /// persisted assignments into the tables.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] for an empty tenant list and
    /// [`AuthzError::Store`] when loading assignments fails.
    pub fn new(
        catalog: Catalog,
        tenants: &[TenantId],
        store: Arc<dyn AssignmentStore>,
    ) -> Result<Self, AuthzError> {
        let facts = compile_facts(&catalog, tenants)?;
        let assignments = store.load()?;
        info!(
            roles = catalog.role_count(),
            tenants = tenants.len(),
            facts = facts.len(),
            assignments = assignments.len(),
            "authorization service initialized"
        );
        Ok(Self {
            catalog,
            tables: RwLock::new(EngineTables::new(facts, assignments)),
            store,
        })
    }

    /// Acquires the read lock, failing closed on poison.
    fn read_tables(&self) -> Result<RwLockReadGuard<'_, EngineTables>, AuthzError> {
        self.tables
            .read()
            .map_err(|_| AuthzError::Enforcement("authorization tables lock poisoned".to_string()))
    }

    /// Acquires the write lock, failing closed on poison.
    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, EngineTables>, AuthzError> {
        self.tables
            .write()
            .map_err(|_| AuthzError::Enforcement("authorization tables lock poisoned".to_string()))
    }

    /// Decides whether a user may perform an action on a resource within a
    /// tenant.
    ///
    /// A plain denial is `Ok(false)`; callers must branch on the error first
    /// and treat any error as a denial.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when any field is empty and
    /// [`AuthzError::Enforcement`] when the engine cannot produce a decision.
    pub fn can_do(
        &self,
        user: &UserId,
        resource: &str,
        action: &str,
        tenant: &TenantId,
    ) -> Result<bool, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("resource", resource)?;
        require_non_empty("action", action)?;
        require_non_empty("tenantID", tenant.as_str())?;
        let tables = self.read_tables()?;
        let allowed = tables.evaluate(&EnforcementQuery {
            user,
            resource,
            action,
            tenant,
        });
        if !allowed {
            debug!(
                user = user.as_str(),
                resource,
                action,
                tenant = tenant.as_str(),
                "access denied"
            );
        }
        Ok(allowed)
    }

    /// Idempotently assigns a role to a user within a tenant and persists
    /// the binding. Returns `true` when the assignment was newly added.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when a field is empty or the
    /// role is not defined by the catalog, and [`AuthzError::Store`] when
    /// persistence fails (the in-memory tables are left untouched).
    pub fn assign_role(
        &self,
        user: &UserId,
        role: &RoleName,
        tenant: &TenantId,
    ) -> Result<bool, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("role", role.as_str())?;
        require_non_empty("tenantID", tenant.as_str())?;
        if !self.catalog.contains_role(role) {
            return Err(AuthzError::InvalidArgument(format!(
                "role '{role}' is not defined in the policy catalog"
            )));
        }
        let assignment = Assignment {
            user: user.clone(),
            role: role.clone(),
            tenant: tenant.clone(),
        };
        // The store write must share the mirror's critical section: a remove
        // racing between the durable add and the mirror insert would leave a
        // grant in memory that no longer exists on disk.
        let mut tables = self.write_tables()?;
        let outcome = self.store.add(&StorageRecord::Assignment(assignment.clone()))?;
        match outcome {
            AddOutcome::Added => {
                tables.insert_assignment(assignment);
                drop(tables);
                info!(
                    user = user.as_str(),
                    role = role.as_str(),
                    tenant = tenant.as_str(),
                    "role assigned"
                );
                Ok(true)
            }
            AddOutcome::AlreadyExists => {
                // Keep the mirror converged even if it drifted from the store.
                tables.insert_assignment(assignment);
                drop(tables);
                info!(
                    user = user.as_str(),
                    role = role.as_str(),
                    tenant = tenant.as_str(),
                    "role assignment skipped (already exists)"
                );
                Ok(false)
            }
            AddOutcome::Ignored => Err(AuthzError::Enforcement(
                "store ignored an assignment record".to_string(),
            )),
        }
    }

    /// Idempotently removes a role binding. Returns `true` when an existing
    /// assignment was removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when a field is empty and
    /// [`AuthzError::Store`] when persistence fails.
    pub fn remove_role(
        &self,
        user: &UserId,
        role: &RoleName,
        tenant: &TenantId,
    ) -> Result<bool, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("role", role.as_str())?;
        require_non_empty("tenantID", tenant.as_str())?;
        let assignment = Assignment {
            user: user.clone(),
            role: role.clone(),
            tenant: tenant.clone(),
        };
        // Same critical-section discipline as assign_role: a revocation must
        // observe and prune exactly the state the durable delete acted on.
        let mut tables = self.write_tables()?;
        let outcome = self.store.remove(&StorageRecord::Assignment(assignment.clone()))?;
        match outcome {
            RemoveOutcome::Removed => {
                tables.remove_assignment(&assignment);
                drop(tables);
                info!(
                    user = user.as_str(),
                    role = role.as_str(),
                    tenant = tenant.as_str(),
                    "role removed"
                );
                Ok(true)
            }
            RemoveOutcome::NotFound => {
                tables.remove_assignment(&assignment);
                drop(tables);
                info!(
                    user = user.as_str(),
                    role = role.as_str(),
                    tenant = tenant.as_str(),
                    "role removal skipped (not found)"
                );
                Ok(false)
            }
            RemoveOutcome::Ignored => Err(AuthzError::Enforcement(
                "store ignored an assignment record".to_string(),
            )),
        }
    }

    /// Returns the roles a user holds within the given tenant only.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when a field is empty.
    pub fn get_user_roles(
        &self,
        user: &UserId,
        tenant: &TenantId,
    ) -> Result<BTreeSet<RoleName>, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("tenantID", tenant.as_str())?;
        Ok(self.read_tables()?.roles_for_user(user, tenant))
    }

    /// Returns every tenant where the user holds the given role.
    ///
    /// Deliberately not tenant-scoped: this is an administrative cross-tenant
    /// lookup, the one intentional asymmetry in an otherwise strictly
    /// tenant-isolated query surface. It must never back an enforcement
    /// decision.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when a field is empty.
    pub fn get_user_tenants_for_role(
        &self,
        user: &UserId,
        role: &RoleName,
    ) -> Result<BTreeSet<TenantId>, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("role", role.as_str())?;
        Ok(self.read_tables()?.tenants_for_role(user, role))
    }

    /// Returns whether the user holds the role within the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when a field is empty.
    pub fn has_role(
        &self,
        user: &UserId,
        role: &RoleName,
        tenant: &TenantId,
    ) -> Result<bool, AuthzError> {
        require_non_empty("userID", user.as_str())?;
        require_non_empty("role", role.as_str())?;
        require_non_empty("tenantID", tenant.as_str())?;
        let assignment = Assignment {
            user: user.clone(),
            role: role.clone(),
            tenant: tenant.clone(),
        };
        Ok(self.read_tables()?.has_assignment(&assignment))
    }

    /// Returns the static role catalog.
    #[must_use]
    pub fn available_roles(&self) -> Vec<RoleName> {
        self.catalog.role_names()
    }

    /// Recompiles policy facts for a (possibly new) tenant list and swaps
    /// the fact table atomically.
    ///
    /// Facts for tenants absent from the new list are purged by the
    /// wholesale regeneration. Assignments are never altered, and on any
    /// failure the previous fact set remains queryable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidArgument`] when the tenant list is empty
    /// and [`AuthzError::Enforcement`] when the table lock is poisoned.
    pub fn reload_policies(&self, tenants: &[TenantId]) -> Result<(), AuthzError> {
        if tenants.is_empty() {
            return Err(AuthzError::InvalidArgument(
                "tenant list must not be empty for policy reload".to_string(),
            ));
        }
        // Compile before taking the lock; a compile failure must leave the
        // previous facts untouched and queryable.
        let facts = compile_facts(&self.catalog, tenants)?;
        let fact_count = facts.len();
        let mut tables = self.write_tables()?;
        tables.replace_facts(facts);
        drop(tables);
        info!(tenants = tenants.len(), facts = fact_count, "policies reloaded");
        Ok(())
    }

    /// Reports readiness of the underlying store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Store`] when the store is unavailable.
    pub fn readiness(&self) -> Result<(), AuthzError> {
        self.store.readiness().map_err(|error| {
            warn!(error = %error, "assignment store readiness probe failed");
            AuthzError::Store(error)
        })
    }
}
