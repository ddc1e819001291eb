// crates/rolegate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Assignment Store
// Description: Durable AssignmentStore backed by SQLite WAL.
// Purpose: Persist assignment triples with selective persistence and
//          fail-closed loading.
// Dependencies: rolegate-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`AssignmentStore`] using `SQLite`. Rows
//! carry an explicit record-type discriminant so the selective-persistence
//! contract is visible in the schema itself: only `assignment` rows are ever
//! written, fact-tagged calls are logged no-ops, and rows with foreign
//! discriminants are skipped on load. Database contents are untrusted; rows
//! with empty required fields fail the load closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rolegate_core::AddOutcome;
use rolegate_core::Assignment;
use rolegate_core::AssignmentStore;
use rolegate_core::RecordKind;
use rolegate_core::RemoveOutcome;
use rolegate_core::StorageRecord;
use rolegate_core::StoreError;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` assignment store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration with defaults for the given database path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw row payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Busy timeout expired; retryable.
    #[error("sqlite store timeout: {0}")]
    Timeout(String),
    /// Unexpected constraint violation.
    #[error("sqlite store constraint violation: {0}")]
    Constraint(String),
    /// Structurally invalid stored rows.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Timeout(message) => Self::Timeout(message),
            SqliteStoreError::Constraint(message) => Self::Constraint(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) | SqliteStoreError::Invalid(message) => {
                Self::Invalid(message)
            }
        }
    }
}

/// Classifies a `rusqlite` error into a store error.
fn classify_db_error(error: &rusqlite::Error) -> SqliteStoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = error {
        match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                return SqliteStoreError::Timeout(error.to_string());
            }
            ErrorCode::ConstraintViolation => {
                return SqliteStoreError::Constraint(error.to_string());
            }
            _ => {}
        }
    }
    SqliteStoreError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed assignment store with WAL support.
///
/// # Invariants
/// - Only rows tagged `assignment` are ever written.
/// - Connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteAssignmentStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteAssignmentStore {
    /// Opens (or creates) the store at the configured path and initializes
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid, the database
    /// cannot be opened, or the stored schema version is unsupported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the connection, mapping poison to a store error.
    fn guard(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("store connection mutex poisoned".to_string()))
    }

    /// Loads all assignment rows, skipping foreign discriminants.
    fn load_inner(&self) -> Result<BTreeSet<Assignment>, SqliteStoreError> {
        let connection = self.guard()?;
        let mut statement = connection
            .prepare_cached("SELECT record_type, subject, role, tenant FROM authz_records")
            .map_err(|err| classify_db_error(&err))?;
        let rows = statement
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|err| classify_db_error(&err))?;
        let mut assignments = BTreeSet::new();
        for row in rows {
            let (record_type, subject, role, tenant) =
                row.map_err(|err| classify_db_error(&err))?;
            if record_type != RecordKind::Assignment.as_str() {
                warn!(record_type, "skipping row with foreign record type");
                continue;
            }
            if subject.is_empty() || role.is_empty() || tenant.is_empty() {
                return Err(SqliteStoreError::Corrupt(
                    "assignment row has an empty required field".to_string(),
                ));
            }
            assignments.insert(Assignment::new(subject, role, tenant));
        }
        Ok(assignments)
    }

    /// Replaces all assignment rows in one transaction.
    fn save_inner(&self, assignments: &BTreeSet<Assignment>) -> Result<(), SqliteStoreError> {
        let mut connection = self.guard()?;
        let tx = connection.transaction().map_err(|err| classify_db_error(&err))?;
        tx.execute(
            "DELETE FROM authz_records WHERE record_type = ?1",
            params![RecordKind::Assignment.as_str()],
        )
        .map_err(|err| classify_db_error(&err))?;
        {
            let mut statement = tx
                .prepare_cached(
                    "INSERT INTO authz_records (record_type, subject, role, tenant)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|err| classify_db_error(&err))?;
            for assignment in assignments {
                statement
                    .execute(params![
                        RecordKind::Assignment.as_str(),
                        assignment.user.as_str(),
                        assignment.role.as_str(),
                        assignment.tenant.as_str(),
                    ])
                    .map_err(|err| classify_db_error(&err))?;
            }
        }
        tx.commit().map_err(|err| classify_db_error(&err))
    }

    /// Inserts one assignment row idempotently.
    fn add_inner(&self, assignment: &Assignment) -> Result<AddOutcome, SqliteStoreError> {
        let connection = self.guard()?;
        let changed = connection
            .execute(
                "INSERT OR IGNORE INTO authz_records (record_type, subject, role, tenant)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    RecordKind::Assignment.as_str(),
                    assignment.user.as_str(),
                    assignment.role.as_str(),
                    assignment.tenant.as_str(),
                ],
            )
            .map_err(|err| classify_db_error(&err))?;
        if changed == 1 {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyExists)
        }
    }

    /// Deletes one assignment row idempotently.
    fn remove_inner(&self, assignment: &Assignment) -> Result<RemoveOutcome, SqliteStoreError> {
        let connection = self.guard()?;
        let changed = connection
            .execute(
                "DELETE FROM authz_records
                 WHERE record_type = ?1 AND subject = ?2 AND role = ?3 AND tenant = ?4",
                params![
                    RecordKind::Assignment.as_str(),
                    assignment.user.as_str(),
                    assignment.role.as_str(),
                    assignment.tenant.as_str(),
                ],
            )
            .map_err(|err| classify_db_error(&err))?;
        if changed == 1 {
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotFound)
        }
    }
}

impl AssignmentStore for SqliteAssignmentStore {
    fn load(&self) -> Result<BTreeSet<Assignment>, StoreError> {
        self.load_inner().map_err(Into::into)
    }

    fn save(&self, assignments: &BTreeSet<Assignment>) -> Result<(), StoreError> {
        self.save_inner(assignments).map_err(Into::into)
    }

    fn add(&self, record: &StorageRecord) -> Result<AddOutcome, StoreError> {
        let StorageRecord::Assignment(assignment) = record else {
            debug!(kind = record.kind().as_str(), "ignoring non-assignment record on add");
            return Ok(AddOutcome::Ignored);
        };
        self.add_inner(assignment).map_err(Into::into)
    }

    fn remove(&self, record: &StorageRecord) -> Result<RemoveOutcome, StoreError> {
        let StorageRecord::Assignment(assignment) = record else {
            debug!(kind = record.kind().as_str(), "ignoring non-assignment record on remove");
            return Ok(RemoveOutcome::Ignored);
        };
        self.remove_inner(assignment).map_err(Into::into)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let connection = self.guard().map_err(StoreError::from)?;
        connection
            .query_row("SELECT 1", params![], |_| Ok(()))
            .map_err(|err| StoreError::from(classify_db_error(&err)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| classify_db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| classify_db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| classify_db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| classify_db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| classify_db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| classify_db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| classify_db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| classify_db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| classify_db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS authz_records (
                    record_type TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    role TEXT NOT NULL,
                    tenant TEXT NOT NULL,
                    extra0 TEXT NOT NULL DEFAULT '',
                    extra1 TEXT NOT NULL DEFAULT '',
                    PRIMARY KEY (record_type, subject, role, tenant)
                );
                CREATE INDEX IF NOT EXISTS idx_authz_records_subject
                    ON authz_records (record_type, subject, tenant);",
            )
            .map_err(|err| classify_db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| classify_db_error(&err))
}
