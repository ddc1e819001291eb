// system-tests/src/lib.rs
// ============================================================================
// Module: Rolegate System Test Helpers
// Description: Shared fixtures wiring policy, core, and store together.
// Purpose: Build fully assembled authorization services for system tests.
// Dependencies: rolegate-core, rolegate-policy, rolegate-store-sqlite
// ============================================================================

//! ## Overview
//! Helpers for system tests: a canonical policy fixture and a builder that
//! assembles the full stack (YAML source, compiled catalog, `SQLite` store,
//! authorization service) the way a hosting application would.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rolegate_core::AuthorizationService;
use rolegate_core::TenantId;
use rolegate_policy::PolicySource;
use rolegate_store_sqlite::SqliteAssignmentStore;
use rolegate_store_sqlite::SqliteStoreConfig;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Canonical policy document used across system tests.
pub const POLICY_FIXTURE: &str = r"
roles:
  instructor:
    permissions:
      assignment: [create, view, grade]
      course: [view]
  student:
    permissions:
      assignment: [view, submit]
      course: [view]
  superadmin:
    permissions:
      all: [all]
";

/// Assembles the full authorization stack over a `SQLite` store at `db_path`.
///
/// # Errors
///
/// Returns an error when policy parsing, store setup, or service
/// construction fails.
pub fn build_service(
    db_path: &Path,
    tenants: &[&str],
) -> Result<AuthorizationService, Box<dyn std::error::Error>> {
    let source = PolicySource::from_str(POLICY_FIXTURE)?;
    let catalog = source.catalog()?;
    let store = SqliteAssignmentStore::new(&SqliteStoreConfig::new(db_path))?;
    let tenant_ids: Vec<TenantId> = tenants.iter().map(|tenant| TenantId::new(*tenant)).collect();
    Ok(AuthorizationService::new(catalog, &tenant_ids, Arc::new(store))?)
}
