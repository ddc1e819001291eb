// crates/rolegate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Rolegate Interfaces
// Description: Backend-agnostic contracts for assignment storage and the
//              request boundary.
// Purpose: Define the contract surfaces used by the authorization service.
// Dependencies: crate::core, thiserror, tracing
// ============================================================================

//! ## Overview
//! Interfaces define how the authorization core integrates with storage and
//! transport collaborators without embedding backend-specific details.
//! Implementations must fail closed on missing or invalid data.
//!
//! The storage contract enforces selective persistence: records reach the
//! store through the [`StorageRecord`] tagged union, and adapters must treat
//! any non-assignment tag as a deliberate, logged no-op. This is how the
//! system guarantees permission policy never leaks into the durable store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod route;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use crate::core::facts::Assignment;
use crate::core::facts::PolicyFact;

// ============================================================================
// SECTION: Storage Records
// ============================================================================

/// Record category discriminant at the storage boundary.
///
/// # Invariants
/// - Labels are stable; the persisted schema stores them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Durable user-role-tenant binding.
    Assignment,
    /// Compiled policy fact; never persisted.
    Fact,
}

impl RecordKind {
    /// Returns the stable discriminant label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Fact => "fact",
        }
    }
}

/// Tagged record passed across the storage boundary.
///
/// # Invariants
/// - Adapters branch on the tag explicitly; only [`StorageRecord::Assignment`]
///   may ever reach durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRecord {
    /// Assignment record; persisted.
    Assignment(Assignment),
    /// Policy fact record; ignored by every adapter by contract.
    Fact(PolicyFact),
}

impl StorageRecord {
    /// Returns the record's category discriminant.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Assignment(_) => RecordKind::Assignment,
            Self::Fact(_) => RecordKind::Fact,
        }
    }
}

/// Outcome of an idempotent add.
///
/// # Invariants
/// - A duplicate insert reports [`AddOutcome::AlreadyExists`], never a
///   constraint error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new row was written.
    Added,
    /// The triple was already present; nothing changed.
    AlreadyExists,
    /// The record carried a non-assignment tag and was skipped by contract.
    Ignored,
}

/// Outcome of an idempotent remove.
///
/// # Invariants
/// - Removing an absent triple reports [`RemoveOutcome::NotFound`], never an
///   error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// An existing row was deleted.
    Removed,
    /// No such triple was stored; nothing changed.
    NotFound,
    /// The record carried a non-assignment tag and was skipped by contract.
    Ignored,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Assignment store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid echoing raw connection details across the transport
///   boundary; adapters log diagnostics before converting.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("assignment store io error: {0}")]
    Io(String),
    /// Database engine error.
    #[error("assignment store db error: {0}")]
    Db(String),
    /// Bounded timeout expired; the operation is retryable by the caller.
    #[error("assignment store timeout: {0}")]
    Timeout(String),
    /// Unexpected constraint violation.
    #[error("assignment store constraint violation: {0}")]
    Constraint(String),
    /// Stored rows fail structural checks.
    #[error("assignment store corruption: {0}")]
    Corrupt(String),
    /// Invalid store data or configuration.
    #[error("assignment store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Assignment Store
// ============================================================================

/// Durable store for assignment records.
///
/// Selective persistence contract: implementations persist assignment rows
/// only. Calls carrying a [`StorageRecord::Fact`] are silent no-ops returning
/// the `Ignored` outcome, and rows with foreign discriminants encountered on
/// load are skipped, not errors.
pub trait AssignmentStore: Send + Sync {
    /// Loads all stored assignments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unreachable or rows are
    /// structurally invalid.
    fn load(&self) -> Result<BTreeSet<Assignment>, StoreError>;

    /// Replaces the stored assignment set in one transaction.
    ///
    /// On failure the prior durable state is retained; no partial wipe is
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction cannot complete.
    fn save(&self, assignments: &BTreeSet<Assignment>) -> Result<(), StoreError>;

    /// Idempotently adds a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity loss or timeout; duplicates are
    /// reported through [`AddOutcome::AlreadyExists`], never as errors.
    fn add(&self, record: &StorageRecord) -> Result<AddOutcome, StoreError>;

    /// Idempotently removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity loss or timeout; absent triples
    /// are reported through [`RemoveOutcome::NotFound`], never as errors.
    fn remove(&self, record: &StorageRecord) -> Result<RemoveOutcome, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory assignment store honoring the full selective-persistence
/// contract; the reference implementation used by core tests and callers
/// that need no durability.
///
/// # Invariants
/// - The assignment set is guarded by a mutex; a poisoned lock surfaces as
///   [`StoreError::Io`], never as a default-allow.
#[derive(Debug, Default)]
pub struct MemoryAssignmentStore {
    /// Guarded assignment set.
    assignments: Mutex<BTreeSet<Assignment>>,
}

impl MemoryAssignmentStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the assignment set, mapping poison to a store error.
    fn guard(&self) -> Result<std::sync::MutexGuard<'_, BTreeSet<Assignment>>, StoreError> {
        self.assignments
            .lock()
            .map_err(|_| StoreError::Io("assignment set mutex poisoned".to_string()))
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    fn load(&self) -> Result<BTreeSet<Assignment>, StoreError> {
        Ok(self.guard()?.clone())
    }

    fn save(&self, assignments: &BTreeSet<Assignment>) -> Result<(), StoreError> {
        *self.guard()? = assignments.clone();
        Ok(())
    }

    fn add(&self, record: &StorageRecord) -> Result<AddOutcome, StoreError> {
        let StorageRecord::Assignment(assignment) = record else {
            debug!(kind = record.kind().as_str(), "ignoring non-assignment record on add");
            return Ok(AddOutcome::Ignored);
        };
        if self.guard()?.insert(assignment.clone()) {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyExists)
        }
    }

    fn remove(&self, record: &StorageRecord) -> Result<RemoveOutcome, StoreError> {
        let StorageRecord::Assignment(assignment) = record else {
            debug!(kind = record.kind().as_str(), "ignoring non-assignment record on remove");
            return Ok(RemoveOutcome::Ignored);
        };
        if self.guard()?.remove(assignment) {
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotFound)
        }
    }
}
