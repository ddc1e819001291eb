// crates/rolegate-core/src/core/mod.rs
// ============================================================================
// Module: Core Domain
// Description: Identifiers, catalog types, compiled facts, and enforcement.
// Purpose: Group the pure domain model behind one module path.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The core domain model: opaque identifiers, the validated permission
//! catalog, compiled policy facts, the in-memory enforcement tables, and the
//! authorization service facade that owns them.

pub mod catalog;
pub mod engine;
pub mod facts;
pub mod identifiers;
pub mod service;
