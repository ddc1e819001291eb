// system-tests/tests/end_to_end.rs
// ============================================================================
// Module: End-to-End Authorization Tests
// Description: Full-stack flows from YAML policy to enforced decisions.
// Purpose: Exercise policy loading, role lifecycle, enforcement, and the
//          request boundary together over a durable store.
// Dependencies: rolegate-core, rolegate-policy, rolegate-store-sqlite
// ============================================================================

//! End-to-end authorization flows over the assembled stack.

use rolegate_core::AuthzError;
use rolegate_core::DenialReason;
use rolegate_core::InterceptDecision;
use rolegate_core::RequestIdentity;
use rolegate_core::RoleName;
use rolegate_core::RouteAction;
use rolegate_core::RouteTable;
use rolegate_core::TenantId;
use rolegate_core::UserId;
use rolegate_core::enforce_request;
use system_tests::build_service;
use tempfile::TempDir;

#[test]
fn instructor_flow_grants_and_isolates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let service = build_service(&dir.path().join("authz.db"), &["acme", "globex"])?;
    let alice = UserId::new("alice");
    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");

    service.assign_role(&alice, &RoleName::new("instructor"), &acme)?;
    assert!(service.can_do(&alice, "assignment", "grade", &acme)?);
    assert!(service.can_do(&alice, "course", "view", &acme)?);
    assert!(!service.can_do(&alice, "course", "delete", &acme)?);
    assert!(!service.can_do(&alice, "assignment", "grade", &globex)?);
    Ok(())
}

#[test]
fn superadmin_wildcard_stays_tenant_bound() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let service = build_service(&dir.path().join("authz.db"), &["acme", "globex"])?;
    let root = UserId::new("root");
    let acme = TenantId::new("acme");

    service.assign_role(&root, &RoleName::new("superadmin"), &acme)?;
    assert!(service.can_do(&root, "billing", "export", &acme)?);
    assert!(!service.can_do(&root, "billing", "export", &TenantId::new("globex"))?);
    Ok(())
}

#[test]
fn ghost_role_is_rejected_by_the_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let service = build_service(&dir.path().join("authz.db"), &["acme"])?;
    let result =
        service.assign_role(&UserId::new("alice"), &RoleName::new("ghost"), &TenantId::new("acme"));
    assert!(matches!(result, Err(AuthzError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn tenant_onboarding_via_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let service = build_service(&dir.path().join("authz.db"), &["acme"])?;
    let bob = UserId::new("bob");
    let student = RoleName::new("student");
    let initech = TenantId::new("initech");

    service.assign_role(&bob, &student, &initech)?;
    // Assignment exists, but no facts were compiled for initech yet.
    assert!(!service.can_do(&bob, "assignment", "submit", &initech)?);

    service.reload_policies(&[TenantId::new("acme"), initech.clone()])?;
    assert!(service.can_do(&bob, "assignment", "submit", &initech)?);
    Ok(())
}

#[test]
fn request_boundary_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let service = build_service(&dir.path().join("authz.db"), &["acme"])?;
    let alice = UserId::new("alice");
    let acme = TenantId::new("acme");
    service.assign_role(&alice, &RoleName::new("student"), &acme)?;

    let mut table = RouteTable::new();
    table.add_public("GET /health");
    table.map_endpoint("POST /assignments/submit", RouteAction::new("assignment", "submit"));
    table.map_endpoint("POST /assignments/grade", RouteAction::new("assignment", "grade"));

    assert_eq!(enforce_request(&service, &table, "GET /health", None)?, InterceptDecision::Allow);

    let identity = RequestIdentity {
        user: alice,
        tenant: acme,
    };
    assert_eq!(
        enforce_request(&service, &table, "POST /assignments/submit", Some(&identity))?,
        InterceptDecision::Allow
    );
    assert!(matches!(
        enforce_request(&service, &table, "POST /assignments/grade", Some(&identity))?,
        InterceptDecision::Deny(DenialReason::InsufficientPermission { .. })
    ));
    assert_eq!(
        enforce_request(&service, &table, "DELETE /everything", Some(&identity))?,
        InterceptDecision::Deny(DenialReason::UnmappedEndpoint)
    );
    Ok(())
}
