// crates/rolegate-core/src/core/engine.rs
// ============================================================================
// Module: Enforcement Engine
// Description: In-memory fact and assignment tables with pure evaluation.
// Purpose: Answer allow/deny queries against compiled facts and live
//          assignments without touching storage.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`EngineTables`] holds the two in-memory tables the evaluator reads: the
//! compiled policy facts and the current assignments. The tables carry no
//! locking of their own; the owning service wraps them in a reader-writer
//! lock so reads run in parallel and mutations are exclusive.
//!
//! Evaluation is pure: a query is allowed iff some assignment for the
//! (user, tenant) pair names a role holding a fact in the same tenant whose
//! resource and action tokens match literally or via wildcard. The tenant
//! component is compared exactly; there is no cross-tenant bypass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::catalog::matches;
use crate::core::facts::Assignment;
use crate::core::facts::PolicyFact;
use crate::core::identifiers::RoleName;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Query
// ============================================================================

/// Ephemeral enforcement query; never persisted.
///
/// # Invariants
/// - All four fields must be non-empty; the service validates before
///   constructing a query.
#[derive(Debug, Clone, Copy)]
pub struct EnforcementQuery<'a> {
    /// Querying user.
    pub user: &'a UserId,
    /// Concrete resource name.
    pub resource: &'a str,
    /// Concrete action name.
    pub action: &'a str,
    /// Tenant scope; matched exactly.
    pub tenant: &'a TenantId,
}

// ============================================================================
// SECTION: Tables
// ============================================================================

/// The shared in-memory table pair read by every enforcement query.
///
/// # Invariants
/// - Facts are replaced wholesale; no partial patching.
/// - Assignment mutations never touch the fact table and vice versa.
#[derive(Debug, Default)]
pub struct EngineTables {
    /// Compiled per-tenant policy facts.
    facts: BTreeSet<PolicyFact>,
    /// Live user-role-tenant assignments mirrored from the store.
    assignments: BTreeSet<Assignment>,
}

impl EngineTables {
    /// Creates tables from an initial fact set and stored assignments.
    #[must_use]
    pub const fn new(facts: BTreeSet<PolicyFact>, assignments: BTreeSet<Assignment>) -> Self {
        Self {
            facts,
            assignments,
        }
    }

    /// Evaluates an enforcement query against the current tables.
    #[must_use]
    pub fn evaluate(&self, query: &EnforcementQuery<'_>) -> bool {
        self.assignments
            .iter()
            .filter(|assignment| {
                assignment.user == *query.user && assignment.tenant == *query.tenant
            })
            .any(|assignment| self.role_grants(&assignment.role, query))
    }

    /// Returns whether a role holds a matching fact in the query tenant.
    fn role_grants(&self, role: &RoleName, query: &EnforcementQuery<'_>) -> bool {
        self.facts.iter().any(|fact| {
            fact.role == *role
                && fact.tenant == *query.tenant
                && matches(&fact.resource, query.resource)
                && matches(&fact.action, query.action)
        })
    }

    /// Replaces the entire fact table in one step.
    ///
    /// Assignments are deliberately untouched; the two lifecycles never mix.
    pub fn replace_facts(&mut self, facts: BTreeSet<PolicyFact>) {
        self.facts = facts;
    }

    /// Inserts an assignment; returns `false` when it was already present.
    pub fn insert_assignment(&mut self, assignment: Assignment) -> bool {
        self.assignments.insert(assignment)
    }

    /// Removes an assignment; returns `false` when it was absent.
    pub fn remove_assignment(&mut self, assignment: &Assignment) -> bool {
        self.assignments.remove(assignment)
    }

    /// Returns whether the exact assignment triple is present.
    #[must_use]
    pub fn has_assignment(&self, assignment: &Assignment) -> bool {
        self.assignments.contains(assignment)
    }

    /// Returns the roles a user holds within one tenant only.
    #[must_use]
    pub fn roles_for_user(&self, user: &UserId, tenant: &TenantId) -> BTreeSet<RoleName> {
        self.assignments
            .iter()
            .filter(|assignment| assignment.user == *user && assignment.tenant == *tenant)
            .map(|assignment| assignment.role.clone())
            .collect()
    }

    /// Returns every tenant where the user holds the given role.
    ///
    /// Cross-tenant by design; see the service-level documentation.
    #[must_use]
    pub fn tenants_for_role(&self, user: &UserId, role: &RoleName) -> BTreeSet<TenantId> {
        self.assignments
            .iter()
            .filter(|assignment| assignment.user == *user && assignment.role == *role)
            .map(|assignment| assignment.tenant.clone())
            .collect()
    }
}
