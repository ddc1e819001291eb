// crates/rolegate-policy/src/lib.rs
// ============================================================================
// Module: Rolegate Policy Library
// Description: YAML policy catalog loading and validation.
// Purpose: Provide strict, fail-closed policy document parsing with hard
//          limits and catalog normalization.
// Dependencies: rolegate-core, serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! The policy source is the single authority for role definitions: a YAML
//! document mapping role names to resource/action permissions. Loading is
//! strict and fail-closed: size and path limits, UTF-8 enforcement, and
//! structural validation all run before any token reaches the core catalog.
//!
//! The human-readable `all` keyword is preserved through parsing and remapped
//! to the wildcard sentinel only during catalog normalization, so documents
//! stay reviewable while the engine never string-compares against `all`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::PolicyDocument;
pub use document::RoleDocument;
pub use source::PolicyError;
pub use source::PolicySource;
