// crates/rolegate-policy/src/source.rs
// ============================================================================
// Module: Policy Source
// Description: Strict loading, validation, and normalization of policy
//              documents.
// Purpose: Turn untrusted YAML into a validated core catalog, fail-closed.
// Dependencies: rolegate-core, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! [`PolicySource`] owns the full path from bytes on disk to a validated
//! [`Catalog`]. Policy files are untrusted input: loading enforces hard size
//! and path limits and UTF-8 before parsing, and structural validation runs
//! before any caller can reach the document. Normalization to catalog tokens
//! is a separate step so the raw document stays inspectable for diagnostics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rolegate_core::Catalog;
use rolegate_core::CatalogError;
use rolegate_core::Permission;
use rolegate_core::PermissionToken;
use rolegate_core::RoleName;
use thiserror::Error;

use crate::document::PolicyDocument;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum policy file size in bytes.
const MAX_POLICY_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// I/O failure while reading the policy file.
    #[error("policy io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("policy parse error: {0}")]
    Parse(String),
    /// Structurally invalid policy document.
    #[error("invalid policy: {0}")]
    Invalid(String),
    /// Token normalization or catalog construction failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// SECTION: Policy Source
// ============================================================================

/// Validated policy document and its normalization into a core catalog.
///
/// # Invariants
/// - A constructed source always holds a structurally valid document: at
///   least one role, every role has permissions, every resource has actions.
/// - The raw document is immutable; changed policy means a new source.
#[derive(Debug, Clone)]
pub struct PolicySource {
    /// Validated raw document.
    document: PolicyDocument,
}

impl PolicySource {
    /// Loads and validates a policy document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the path breaks length limits, the file
    /// is unreadable, oversized, or not UTF-8, or the document fails
    /// parsing or validation.
    pub fn from_path(path: &Path) -> Result<Self, PolicyError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| PolicyError::Io(err.to_string()))?;
        if bytes.len() > MAX_POLICY_FILE_SIZE {
            return Err(PolicyError::Invalid("policy file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| PolicyError::Invalid("policy file must be utf-8".to_string()))?;
        Self::from_str(content)
    }

    /// Returns the validated raw document.
    #[must_use]
    pub const fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Returns the defined role names in sorted order.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.document.roles.keys().cloned().collect()
    }

    /// Normalizes the document into a validated core catalog, remapping the
    /// `all` keyword to the wildcard sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Catalog`] when a token is empty or uses the
    /// reserved sentinel, or when catalog construction fails.
    pub fn catalog(&self) -> Result<Catalog, PolicyError> {
        let mut roles = BTreeMap::new();
        for (role_name, role) in &self.document.roles {
            let mut permissions = Vec::new();
            for (resource, actions) in &role.permissions {
                if resource.is_empty() {
                    return Err(PolicyError::Catalog(CatalogError::EmptyToken {
                        role: role_name.clone(),
                        position: "resource",
                    }));
                }
                let resource_token = PermissionToken::normalize(resource)?;
                for action in actions {
                    if action.is_empty() {
                        return Err(PolicyError::Catalog(CatalogError::EmptyToken {
                            role: role_name.clone(),
                            position: "action",
                        }));
                    }
                    permissions.push(Permission {
                        resource: resource_token.clone(),
                        action: PermissionToken::normalize(action)?,
                    });
                }
            }
            roles.insert(RoleName::new(role_name.as_str()), permissions);
        }
        Ok(Catalog::new(roles)?)
    }
}

impl FromStr for PolicySource {
    type Err = PolicyError;

    /// Parses and validates a policy document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when parsing or structural validation fails.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let document: PolicyDocument =
            serde_yaml::from_str(content).map_err(|err| PolicyError::Parse(err.to_string()))?;
        validate_document(&document)?;
        Ok(Self {
            document,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the policy path against length limits.
fn validate_path(path: &Path) -> Result<(), PolicyError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(PolicyError::Invalid("policy path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(PolicyError::Invalid("policy path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates document structure before normalization.
fn validate_document(document: &PolicyDocument) -> Result<(), PolicyError> {
    if document.roles.is_empty() {
        return Err(PolicyError::Invalid("no roles defined in policy document".to_string()));
    }
    for (role_name, role) in &document.roles {
        if role_name.is_empty() {
            return Err(PolicyError::Invalid("role name must not be empty".to_string()));
        }
        if role.permissions.is_empty() {
            return Err(PolicyError::Invalid(format!(
                "role '{role_name}' has no permissions defined"
            )));
        }
        for (resource, actions) in &role.permissions {
            if actions.is_empty() {
                return Err(PolicyError::Invalid(format!(
                    "role '{role_name}' resource '{resource}' has no actions defined"
                )));
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
