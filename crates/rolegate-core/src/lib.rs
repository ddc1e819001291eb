// crates/rolegate-core/src/lib.rs
// ============================================================================
// Module: Rolegate Core Library
// Description: Multi-tenant role-based authorization engine.
// Purpose: Compile policy catalogs into per-tenant facts and answer
//          allow/deny queries against durable role assignments.
// Dependencies: serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! Rolegate Core decides whether a user may perform an action on a resource
//! within a tenant. It combines two fact lifecycles:
//! - [`PolicyFact`]s compiled from a static catalog, held in memory only and
//!   regenerated wholesale on every (re)load.
//! - [`Assignment`]s binding users to roles per tenant, the only fact type
//!   ever written through an [`AssignmentStore`].
//!
//! Invariants:
//! - Tenant scope is matched exactly and is never wildcarded.
//! - Enforcement failures deny; no failure path can produce an allow.
//! - The persistent store contains assignment records only.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::catalog::Catalog;
pub use crate::core::catalog::CatalogError;
pub use crate::core::catalog::Permission;
pub use crate::core::catalog::PermissionToken;
pub use crate::core::catalog::matches;
pub use crate::core::engine::EnforcementQuery;
pub use crate::core::engine::EngineTables;
pub use crate::core::facts::Assignment;
pub use crate::core::facts::CompileError;
pub use crate::core::facts::PolicyFact;
pub use crate::core::facts::compile_facts;
pub use crate::core::identifiers::RoleName;
pub use crate::core::identifiers::TenantId;
pub use crate::core::identifiers::UserId;
pub use crate::core::service::AuthorizationService;
pub use crate::core::service::AuthzError;
pub use crate::interfaces::AddOutcome;
pub use crate::interfaces::AssignmentStore;
pub use crate::interfaces::MemoryAssignmentStore;
pub use crate::interfaces::RecordKind;
pub use crate::interfaces::RemoveOutcome;
pub use crate::interfaces::StorageRecord;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::route::DenialReason;
pub use crate::interfaces::route::InterceptDecision;
pub use crate::interfaces::route::RequestIdentity;
pub use crate::interfaces::route::RequestInterceptor;
pub use crate::interfaces::route::RouteAction;
pub use crate::interfaces::route::RouteDecision;
pub use crate::interfaces::route::RouteTable;
pub use crate::interfaces::route::ServiceInterceptor;
pub use crate::interfaces::route::enforce_request;
