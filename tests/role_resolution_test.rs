//! Integration tests for role resolution.
//!
//! These cover the full precedence chain: allowlists first, then the
//! directory lookup splitting managers from individual contributors.

use meterview::alert::TracingAlerts;
use meterview::directory::RelayDirectory;
use meterview::roles::{Role, RolePolicy};
use meterview::testing::{CapturingAlerts, FailingDirectory, ScriptedRelay, StaticDirectory};
use meterview::{MeterviewError, RoleResolver};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn policy() -> RolePolicy {
    RolePolicy::new()
        .with_global_admin("Global Admin X")
        .with_global_admin("Global Admin Y")
        .with_regional_admin_east("East Admin")
        .with_regional_admin_west("West Admin")
}

#[tokio::test]
async fn allowlisted_names_resolve_without_a_directory_call() {
    let directory = Arc::new(StaticDirectory::new());
    let resolver = RoleResolver::new(policy(), directory.clone(), Arc::new(TracingAlerts));

    for (name, expected) in [
        ("Global Admin X", Role::GlobalAdmin),
        ("Global Admin Y", Role::GlobalAdmin),
        ("East Admin", Role::RegionalAdminEast),
        ("West Admin", Role::RegionalAdminWest),
    ] {
        let resolution = resolver.resolve(name).await.unwrap();
        assert_eq!(resolution.role, expected);
        assert!(resolution.managed.is_empty());
    }

    assert_eq!(directory.lookup_count(), 0);
}

#[tokio::test]
async fn no_subordinates_means_individual_contributor() {
    let directory = Arc::new(StaticDirectory::new());
    let resolver = RoleResolver::new(policy(), directory.clone(), Arc::new(TracingAlerts));

    let resolution = resolver.resolve("Jane Doe").await.unwrap();
    assert_eq!(resolution.role, Role::IndividualContributor);
    assert_eq!(resolution.managed.names(), ["Jane Doe"]);
    assert_eq!(directory.lookup_count(), 1);
}

#[tokio::test]
async fn subordinates_mean_manager_with_own_name_appended() {
    let directory =
        Arc::new(StaticDirectory::new().with_reports("Jane Doe", ["Bob", "Sue"]));
    let resolver = RoleResolver::new(policy(), directory, Arc::new(TracingAlerts));

    let resolution = resolver.resolve("Jane Doe").await.unwrap();
    assert_eq!(resolution.role, Role::Manager);
    assert_eq!(resolution.managed.len(), 3);
    assert!(resolution.managed.contains("Bob"));
    assert!(resolution.managed.contains("Sue"));
    assert!(resolution.managed.contains("Jane Doe"));
}

#[tokio::test]
async fn lookup_failure_leaves_no_role_assigned() {
    let resolver = RoleResolver::new(
        policy(),
        Arc::new(FailingDirectory),
        Arc::new(TracingAlerts),
    );

    let err = resolver.resolve("Jane Doe").await.unwrap_err();
    assert!(matches!(err, MeterviewError::Directory(_)));
}

#[tokio::test]
async fn watchdog_alerts_once_and_still_honors_the_result() {
    let directory = Arc::new(
        StaticDirectory::new()
            .with_reports("Jane Doe", ["Bob"])
            .with_delay(Duration::from_millis(200)),
    );
    let alerts = Arc::new(CapturingAlerts::new());
    let resolver = RoleResolver::new(policy(), directory, alerts.clone())
        .with_watchdog(Duration::from_millis(50));

    let resolution = resolver.resolve("Jane Doe").await.unwrap();

    // The slow lookup still resolved the role after the warning.
    assert_eq!(resolution.role, Role::Manager);
    let messages = alerts.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("not responding"));
}

#[tokio::test]
async fn fast_lookup_never_triggers_the_watchdog() {
    let alerts = Arc::new(CapturingAlerts::new());
    let resolver = RoleResolver::new(policy(), Arc::new(StaticDirectory::new()), alerts.clone())
        .with_watchdog(Duration::from_secs(15));

    resolver.resolve("Jane Doe").await.unwrap();
    assert!(alerts.messages().is_empty());
}

#[tokio::test]
async fn relay_backed_directory_decodes_wire_records() {
    let relay = Arc::new(ScriptedRelay::new().respond(
        "/get-users-by-manager/Jane Doe/",
        json!([{ "displayName": "Bob" }, { "displayName": "Sue" }]),
    ));
    let resolver = RoleResolver::new(
        policy(),
        Arc::new(RelayDirectory::new(relay)),
        Arc::new(TracingAlerts),
    );

    let resolution = resolver.resolve("Jane Doe").await.unwrap();
    assert_eq!(resolution.role, Role::Manager);
    assert_eq!(resolution.managed.names(), ["Bob", "Sue", "Jane Doe"]);
}
