// crates/rolegate-core/tests/enforcement.rs
// ============================================================================
// Module: Enforcement Tests
// Description: End-to-end authorization service behavior over the in-memory
//              store.
// Purpose: Validate grant/deny semantics, tenant isolation, persistence
//          ordering, and reload atomicity.
// Dependencies: rolegate-core
// ============================================================================

//! Authorization service behavior tests.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rolegate_core::AddOutcome;
use rolegate_core::Assignment;
use rolegate_core::AssignmentStore;
use rolegate_core::AuthorizationService;
use rolegate_core::AuthzError;
use rolegate_core::Catalog;
use rolegate_core::MemoryAssignmentStore;
use rolegate_core::Permission;
use rolegate_core::PermissionToken;
use rolegate_core::RemoveOutcome;
use rolegate_core::RoleName;
use rolegate_core::StorageRecord;
use rolegate_core::StoreError;
use rolegate_core::TenantId;
use rolegate_core::UserId;

/// Builds the shared three-role catalog used across these tests.
fn course_catalog() -> Result<Catalog, Box<dyn std::error::Error>> {
    let literal = |value: &str| PermissionToken::Literal(value.to_string());
    let mut roles = BTreeMap::new();
    roles.insert(
        RoleName::new("instructor"),
        vec![
            Permission {
                resource: literal("assignment"),
                action: literal("create"),
            },
            Permission {
                resource: literal("assignment"),
                action: literal("view"),
            },
        ],
    );
    roles.insert(
        RoleName::new("student"),
        vec![Permission {
            resource: literal("assignment"),
            action: literal("view"),
        }],
    );
    roles.insert(
        RoleName::new("superadmin"),
        vec![Permission {
            resource: PermissionToken::Wildcard,
            action: PermissionToken::Wildcard,
        }],
    );
    Ok(Catalog::new(roles)?)
}

/// Builds a service over a fresh in-memory store for the given tenants.
fn service_for(
    tenants: &[&str],
) -> Result<(AuthorizationService, Arc<MemoryAssignmentStore>), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryAssignmentStore::new());
    let tenant_ids: Vec<TenantId> = tenants.iter().map(|tenant| TenantId::new(*tenant)).collect();
    let service = AuthorizationService::new(course_catalog()?, &tenant_ids, store.clone())?;
    Ok((service, store))
}

#[test]
fn instructor_grants_are_scoped_to_assigned_tenant() -> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme", "globex"])?;
    let alice = UserId::new("alice");
    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");

    assert!(service.assign_role(&alice, &RoleName::new("instructor"), &acme)?);
    assert!(service.can_do(&alice, "assignment", "create", &acme)?);
    assert!(service.can_do(&alice, "assignment", "view", &acme)?);
    // Undefined action for the role.
    assert!(!service.can_do(&alice, "assignment", "delete", &acme)?);
    // Same user, other tenant: isolated.
    assert!(!service.can_do(&alice, "assignment", "create", &globex)?);
    Ok(())
}

#[test]
fn assigning_undefined_role_fails_and_persists_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let (service, store) = service_for(&["acme"])?;
    let alice = UserId::new("alice");
    let acme = TenantId::new("acme");

    let result = service.assign_role(&alice, &RoleName::new("ghost"), &acme);
    assert!(matches!(result, Err(AuthzError::InvalidArgument(_))));
    assert!(store.load()?.is_empty());
    assert!(service.get_user_roles(&alice, &acme)?.is_empty());
    Ok(())
}

#[test]
fn wildcard_role_grants_everything_in_assigned_tenant_only()
-> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme", "globex"])?;
    let root = UserId::new("root");
    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");

    assert!(service.assign_role(&root, &RoleName::new("superadmin"), &acme)?);
    assert!(service.can_do(&root, "assignment", "create", &acme)?);
    assert!(service.can_do(&root, "billing", "export", &acme)?);
    // Wildcard never crosses tenants.
    assert!(!service.can_do(&root, "assignment", "view", &globex)?);
    Ok(())
}

#[test]
fn concurrent_assigns_of_distinct_triples_lose_nothing()
-> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme"])?;
    let service = Arc::new(service);
    let acme = TenantId::new("acme");

    let handles: Vec<_> = (0 .. 8)
        .map(|index| {
            let service = service.clone();
            let tenant = acme.clone();
            thread::spawn(move || {
                let user = UserId::new(format!("user-{index}"));
                service.assign_role(&user, &RoleName::new("student"), &tenant)
            })
        })
        .collect();
    for handle in handles {
        let added = handle
            .join()
            .map_err(|_| std::io::Error::other("assign thread panicked"))??;
        assert!(added);
    }
    for index in 0 .. 8 {
        let user = UserId::new(format!("user-{index}"));
        assert!(service.can_do(&user, "assignment", "view", &acme)?);
    }
    Ok(())
}

/// Store wrapper that signals after the durable add and stalls before
/// returning, giving a racing revocation a window to interleave.
struct StallingStore {
    /// Backing store holding the durable state.
    inner: MemoryAssignmentStore,
    /// Signals that the durable add has landed.
    added: mpsc::Sender<()>,
}

impl AssignmentStore for StallingStore {
    fn load(&self) -> Result<BTreeSet<Assignment>, StoreError> {
        self.inner.load()
    }

    fn save(&self, assignments: &BTreeSet<Assignment>) -> Result<(), StoreError> {
        self.inner.save(assignments)
    }

    fn add(&self, record: &StorageRecord) -> Result<AddOutcome, StoreError> {
        let outcome = self.inner.add(record)?;
        let _ = self.added.send(());
        thread::sleep(Duration::from_millis(100));
        Ok(outcome)
    }

    fn remove(&self, record: &StorageRecord) -> Result<RemoveOutcome, StoreError> {
        self.inner.remove(record)
    }
}

#[test]
fn racing_removal_cannot_resurrect_an_in_flight_assign()
-> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = mpsc::channel();
    let store = Arc::new(StallingStore {
        inner: MemoryAssignmentStore::new(),
        added: sender,
    });
    let service = Arc::new(AuthorizationService::new(
        course_catalog()?,
        &[TenantId::new("acme")],
        store.clone(),
    )?);
    let alice = UserId::new("alice");
    let student = RoleName::new("student");
    let acme = TenantId::new("acme");

    let assign_service = service.clone();
    let assign = thread::spawn(move || {
        assign_service.assign_role(
            &UserId::new("alice"),
            &RoleName::new("student"),
            &TenantId::new("acme"),
        )
    });
    // The durable add has landed but the assign is still inside its
    // critical section; the removal must serialize behind it.
    receiver.recv()?;
    let removed = service.remove_role(&alice, &student, &acme)?;
    let added = assign
        .join()
        .map_err(|_| std::io::Error::other("assign thread panicked"))??;

    assert!(added);
    assert!(removed);
    // Store and mirror agree: the binding is gone everywhere.
    assert!(store.load()?.is_empty());
    assert!(!service.has_role(&alice, &student, &acme)?);
    assert!(!service.can_do(&alice, "assignment", "view", &acme)?);
    Ok(())
}

#[test]
fn assignment_lifecycle_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let (service, store) = service_for(&["acme"])?;
    let alice = UserId::new("alice");
    let student = RoleName::new("student");
    let acme = TenantId::new("acme");

    assert!(service.assign_role(&alice, &student, &acme)?);
    assert!(!service.assign_role(&alice, &student, &acme)?);
    assert_eq!(store.load()?.len(), 1);
    assert!(service.has_role(&alice, &student, &acme)?);

    assert!(service.remove_role(&alice, &student, &acme)?);
    assert!(!service.remove_role(&alice, &student, &acme)?);
    assert!(store.load()?.is_empty());
    assert!(!service.can_do(&alice, "assignment", "view", &acme)?);
    Ok(())
}

#[test]
fn role_queries_are_tenant_scoped_except_tenant_listing()
-> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme", "globex"])?;
    let alice = UserId::new("alice");
    let instructor = RoleName::new("instructor");
    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");

    service.assign_role(&alice, &instructor, &acme)?;
    service.assign_role(&alice, &instructor, &globex)?;
    service.assign_role(&alice, &RoleName::new("student"), &globex)?;

    let acme_roles = service.get_user_roles(&alice, &acme)?;
    assert_eq!(acme_roles.len(), 1);
    assert!(acme_roles.contains(&instructor));

    let tenants = service.get_user_tenants_for_role(&alice, &instructor)?;
    assert_eq!(tenants.len(), 2);
    assert!(tenants.contains(&acme));
    assert!(tenants.contains(&globex));
    Ok(())
}

#[test]
fn reload_adds_and_purges_tenant_facts_without_touching_assignments()
-> Result<(), Box<dyn std::error::Error>> {
    let (service, store) = service_for(&["acme"])?;
    let alice = UserId::new("alice");
    let student = RoleName::new("student");
    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");

    service.assign_role(&alice, &student, &acme)?;
    assert!(!service.can_do(&alice, "assignment", "view", &globex)?);

    // Onboard globex; acme facts regenerate alongside.
    service.reload_policies(&[acme.clone(), globex.clone()])?;
    service.assign_role(&alice, &student, &globex)?;
    assert!(service.can_do(&alice, "assignment", "view", &globex)?);
    assert!(service.can_do(&alice, "assignment", "view", &acme)?);

    // Retire acme: its facts are purged but its assignment rows survive.
    service.reload_policies(&[globex.clone()])?;
    assert!(!service.can_do(&alice, "assignment", "view", &acme)?);
    assert!(service.can_do(&alice, "assignment", "view", &globex)?);
    assert_eq!(store.load()?.len(), 2);

    let result = service.reload_policies(&[]);
    assert!(matches!(result, Err(AuthzError::InvalidArgument(_))));
    // The failed reload left the previous fact set queryable.
    assert!(service.can_do(&alice, "assignment", "view", &globex)?);
    Ok(())
}

#[test]
fn empty_arguments_are_rejected_before_evaluation() -> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme"])?;
    let alice = UserId::new("alice");
    let acme = TenantId::new("acme");

    let empty_user = service.can_do(&UserId::new(""), "assignment", "view", &acme);
    assert!(matches!(empty_user, Err(AuthzError::InvalidArgument(_))));
    let empty_resource = service.can_do(&alice, "", "view", &acme);
    assert!(matches!(empty_resource, Err(AuthzError::InvalidArgument(_))));
    let empty_action = service.can_do(&alice, "assignment", "", &acme);
    assert!(matches!(empty_action, Err(AuthzError::InvalidArgument(_))));
    let empty_tenant = service.can_do(&alice, "assignment", "view", &TenantId::new(""));
    assert!(matches!(empty_tenant, Err(AuthzError::InvalidArgument(_))));

    let empty_role = service.assign_role(&alice, &RoleName::new(""), &acme);
    assert!(matches!(empty_role, Err(AuthzError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn available_roles_lists_static_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let (service, _store) = service_for(&["acme"])?;
    let roles = service.available_roles();
    assert_eq!(
        roles,
        vec![
            RoleName::new("instructor"),
            RoleName::new("student"),
            RoleName::new("superadmin"),
        ]
    );
    Ok(())
}

#[test]
fn persisted_assignments_survive_service_rebuild() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryAssignmentStore::new());
    let acme = TenantId::new("acme");
    let alice = UserId::new("alice");
    let student = RoleName::new("student");
    {
        let service =
            AuthorizationService::new(course_catalog()?, std::slice::from_ref(&acme), store.clone())?;
        service.assign_role(&alice, &student, &acme)?;
    }
    let rebuilt =
        AuthorizationService::new(course_catalog()?, std::slice::from_ref(&acme), store)?;
    assert!(rebuilt.can_do(&alice, "assignment", "view", &acme)?);
    Ok(())
}
