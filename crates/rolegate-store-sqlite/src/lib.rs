// crates/rolegate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Rolegate SQLite Store Library
// Description: Durable AssignmentStore backed by SQLite WAL.
// Purpose: Persist user-role-tenant assignments with selective persistence.
// Dependencies: rolegate-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate implements the core [`rolegate_core::AssignmentStore`] contract
//! on top of `SQLite`. The store honors selective persistence: assignment
//! rows only, with fact-tagged calls logged and skipped, and foreign rows
//! ignored on load. Database contents are treated as untrusted input and
//! loads fail closed on structurally invalid rows.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteAssignmentStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
