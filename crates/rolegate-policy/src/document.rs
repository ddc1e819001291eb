// crates/rolegate-policy/src/document.rs
// ============================================================================
// Module: Policy Document
// Description: Raw deserialized shape of the YAML policy catalog.
// Purpose: Mirror the on-disk document exactly; validation happens later.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The document types mirror the YAML file one-to-one and perform no
//! interpretation: `all` stays the literal string `all`, empty maps stay
//! empty. [`crate::PolicySource`] owns validation and normalization so every
//! structural error reports the document position that caused it.
//!
//! Expected document shape:
//!
//! ```yaml
//! roles:
//!   instructor:
//!     permissions:
//!       assignment: [create, view, grade]
//!   superadmin:
//!     permissions:
//!       all: [all]
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Document Types
// ============================================================================

/// Top-level policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Role name to role definition.
    #[serde(default)]
    pub roles: BTreeMap<String, RoleDocument>,
}

/// One role's raw permission map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDocument {
    /// Resource name to granted actions.
    #[serde(default)]
    pub permissions: BTreeMap<String, Vec<String>>,
}
