// crates/rolegate-core/src/interfaces/route.rs
// ============================================================================
// Module: Request Boundary
// Description: Endpoint-to-permission mapping and the interception contract.
// Purpose: Decide at the transport edge whether a request proceeds, without
//          binding the core to any HTTP framework.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The request boundary is transport-neutral: a [`RouteTable`] maps opaque
//! endpoint keys to the (resource, action) pair enforcement needs, plus an
//! explicit public allow-list that bypasses authentication entirely. The
//! [`enforce_request`] entry point composes the table with the
//! [`AuthorizationService`] and yields an [`InterceptDecision`] the hosting
//! transport translates into its own response type.
//!
//! Fail-closed ordering: the public allow-list is consulted before identity,
//! identity before mapping, mapping before enforcement. An endpoint absent
//! from both the allow-list and the route table is denied, never passed
//! through.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::service::AuthorizationService;
use crate::core::service::AuthzError;

// ============================================================================
// SECTION: Route Table
// ============================================================================

/// The (resource, action) pair a protected endpoint enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAction {
    /// Resource name passed to enforcement.
    pub resource: String,
    /// Action name passed to enforcement.
    pub action: String,
}

impl RouteAction {
    /// Creates a route action pair.
    #[must_use]
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }
}

/// Resolution of an endpoint key against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// Endpoint is on the public allow-list; no identity required.
    Public,
    /// Endpoint maps to a permission pair that must be enforced.
    Protected(&'a RouteAction),
    /// Endpoint is unknown; the caller must deny.
    Unmapped,
}

/// Mapping from opaque endpoint keys to enforcement inputs.
///
/// Endpoint keys are whatever the hosting transport uses to identify an
/// operation (an RPC method name, a `"METHOD /path"` string); the table never
/// interprets them.
///
/// # Invariants
/// - The public allow-list takes precedence over any protected mapping for
///   the same key.
/// - Lookups are exact string matches; there is no pattern routing here.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    /// Protected endpoint keys and the permission each enforces.
    routes: BTreeMap<String, RouteAction>,
    /// Endpoint keys that bypass authentication entirely.
    public: BTreeSet<String>,
}

impl RouteTable {
    /// Creates an empty table; every lookup resolves to
    /// [`RouteDecision::Unmapped`] until mappings are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an endpoint key to the permission pair it enforces.
    pub fn map_endpoint(&mut self, endpoint: impl Into<String>, action: RouteAction) {
        self.routes.insert(endpoint.into(), action);
    }

    /// Adds an endpoint key to the public allow-list.
    pub fn add_public(&mut self, endpoint: impl Into<String>) {
        self.public.insert(endpoint.into());
    }

    /// Resolves an endpoint key, checking the public allow-list first.
    #[must_use]
    pub fn resolve(&self, endpoint: &str) -> RouteDecision<'_> {
        if self.public.contains(endpoint) {
            return RouteDecision::Public;
        }
        match self.routes.get(endpoint) {
            Some(action) => RouteDecision::Protected(action),
            None => RouteDecision::Unmapped,
        }
    }

}

// ============================================================================
// SECTION: Interception
// ============================================================================

/// Authenticated caller identity extracted by the hosting transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Authenticated user.
    pub user: UserId,
    /// Tenant the request executes under.
    pub tenant: TenantId,
}

/// Why a request was denied at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// No identity was presented for a non-public endpoint.
    Unauthenticated,
    /// The endpoint is mapped by neither the route table nor the allow-list.
    UnmappedEndpoint,
    /// Enforcement denied the mapped permission.
    InsufficientPermission {
        /// Resource that was checked.
        resource: String,
        /// Action that was checked.
        action: String,
    },
}

/// Boundary decision the hosting transport translates into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptDecision {
    /// The request proceeds to its handler.
    Allow,
    /// The request is rejected before reaching its handler.
    Deny(DenialReason),
}

/// Evaluates one request against the route table and the authorization
/// service.
///
/// The public allow-list is checked before anything else, so public endpoints
/// never require an identity. Everything else needs an identity, a mapping,
/// and a granted enforcement check, in that order.
///
/// # Errors
///
/// Returns [`AuthzError`] when enforcement itself fails; callers must treat
/// that as a denial.
pub fn enforce_request(
    service: &AuthorizationService,
    table: &RouteTable,
    endpoint: &str,
    identity: Option<&RequestIdentity>,
) -> Result<InterceptDecision, AuthzError> {
    let route = table.resolve(endpoint);
    if matches!(route, RouteDecision::Public) {
        return Ok(InterceptDecision::Allow);
    }
    let Some(identity) = identity else {
        return Ok(InterceptDecision::Deny(DenialReason::Unauthenticated));
    };
    match route {
        RouteDecision::Public => Ok(InterceptDecision::Allow),
        RouteDecision::Unmapped => Ok(InterceptDecision::Deny(DenialReason::UnmappedEndpoint)),
        RouteDecision::Protected(action) => {
            let allowed = service.can_do(
                &identity.user,
                &action.resource,
                &action.action,
                &identity.tenant,
            )?;
            if allowed {
                Ok(InterceptDecision::Allow)
            } else {
                Ok(InterceptDecision::Deny(DenialReason::InsufficientPermission {
                    resource: action.resource.clone(),
                    action: action.action.clone(),
                }))
            }
        }
    }
}

// ============================================================================
// SECTION: Interceptor Contract
// ============================================================================

/// Boundary seam a hosting transport calls once per inbound request.
///
/// Transports hold the interceptor behind this trait so tests and alternate
/// boundaries can substitute their own gate without touching handler code.
pub trait RequestInterceptor: Send + Sync {
    /// Decides whether the request identified by `endpoint` proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when the underlying enforcement check fails;
    /// callers must treat that as a denial.
    fn intercept(
        &self,
        endpoint: &str,
        identity: Option<&RequestIdentity>,
    ) -> Result<InterceptDecision, AuthzError>;
}

/// [`RequestInterceptor`] backed by a route table and the authorization
/// service, evaluating requests through [`enforce_request`].
pub struct ServiceInterceptor {
    /// Shared authorization service answering enforcement checks.
    service: Arc<AuthorizationService>,
    /// Endpoint-to-permission mapping for this transport.
    table: RouteTable,
}

impl ServiceInterceptor {
    /// Creates an interceptor over the given service and route table.
    #[must_use]
    pub fn new(service: Arc<AuthorizationService>, table: RouteTable) -> Self {
        Self {
            service,
            table,
        }
    }
}

impl RequestInterceptor for ServiceInterceptor {
    fn intercept(
        &self,
        endpoint: &str,
        identity: Option<&RequestIdentity>,
    ) -> Result<InterceptDecision, AuthzError> {
        enforce_request(&self.service, &self.table, endpoint, identity)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
