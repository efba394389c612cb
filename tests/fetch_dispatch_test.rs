//! Integration tests for the role-parameterized consumption fetch.

use meterview::roles::{ManagedNameSet, Role};
use meterview::testing::ScriptedRelay;
use meterview::{ConsumptionFetcher, ConsumptionState, Stream};
use serde_json::json;
use std::sync::Arc;

fn rows_body(customer: &str, april: f64) -> serde_json::Value {
    json!([{
        "customer_name": customer,
        "region": "North",
        "account_manager": "Jane Doe",
        "enrollment_number": 1,
        "april": april,
        "total": april
    }])
}

fn fetcher(relay: Arc<ScriptedRelay>) -> ConsumptionFetcher {
    ConsumptionFetcher::new(relay, Arc::new(ConsumptionState::new()))
}

#[tokio::test]
async fn global_admin_fetches_everything_on_both_streams() {
    let relay = Arc::new(
        ScriptedRelay::new()
            .respond("/get-all-subscription", rows_body("Acme", 10.0))
            .respond("/get-all-marketplace", rows_body("Zenith", 20.0)),
    );
    let fetcher = fetcher(relay.clone());

    fetcher
        .fetch_for_role(Role::GlobalAdmin, "Global Admin X", &ManagedNameSet::new())
        .await;

    assert_eq!(relay.calls_to("/get-all-subscription"), 1);
    assert_eq!(relay.calls_to("/get-all-marketplace"), 1);

    let subscription = fetcher.state().rows(Stream::Subscription).await;
    let marketplace = fetcher.state().rows(Stream::Marketplace).await;
    assert_eq!(subscription[0].customer_name, "Acme");
    assert_eq!(marketplace[0].customer_name, "Zenith");
}

#[tokio::test]
async fn manager_sends_the_name_set_to_both_streams() {
    let relay = Arc::new(
        ScriptedRelay::new()
            .respond("/get-subscription-by-manager", rows_body("Acme", 1.0))
            .respond("/get-marketplace-by-manager", rows_body("Acme", 2.0)),
    );
    let fetcher = fetcher(relay.clone());

    let managed: ManagedNameSet = ["Bob", "Sue", "Jane Doe"].into_iter().collect();
    fetcher
        .fetch_for_role(Role::Manager, "Jane Doe", &managed)
        .await;

    let calls = relay.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        let names = call.data.expect("manager query carries names");
        assert_eq!(names["names"], json!(["Bob", "Sue", "Jane Doe"]));
    }
}

#[tokio::test]
async fn individual_contributor_queries_their_own_name() {
    let relay = Arc::new(
        ScriptedRelay::new()
            .respond(
                "/get-subscription-by-account-manager/Jane Doe",
                rows_body("Acme", 1.0),
            )
            .respond(
                "/get-marketplace-by-account-manager/Jane Doe",
                rows_body("Acme", 2.0),
            ),
    );
    let fetcher = fetcher(relay.clone());

    let managed: ManagedNameSet = ["Jane Doe"].into_iter().collect();
    fetcher
        .fetch_for_role(Role::IndividualContributor, "Jane Doe", &managed)
        .await;

    assert_eq!(
        relay.calls_to("/get-subscription-by-account-manager/Jane Doe"),
        1
    );
    assert_eq!(fetcher.state().rows(Stream::Subscription).await.len(), 1);
}

#[tokio::test]
async fn regional_admins_hit_their_regional_scope() {
    let relay = Arc::new(
        ScriptedRelay::new()
            .respond("/get-subscription-east-region", rows_body("Acme", 1.0))
            .respond("/get-marketplace-east-region", rows_body("Acme", 2.0))
            .respond("/get-subscription-west-region", rows_body("Acme", 3.0))
            .respond("/get-marketplace-west-region", rows_body("Acme", 4.0)),
    );
    let fetcher = fetcher(relay.clone());

    fetcher
        .fetch_for_role(Role::RegionalAdminEast, "East Admin", &ManagedNameSet::new())
        .await;
    fetcher
        .fetch_for_role(Role::RegionalAdminWest, "West Admin", &ManagedNameSet::new())
        .await;

    assert_eq!(relay.calls_to("/get-subscription-east-region"), 1);
    assert_eq!(relay.calls_to("/get-marketplace-west-region"), 1);
}

#[tokio::test]
async fn one_failing_stream_does_not_block_the_other() {
    // Only the subscription path is scripted; marketplace 404s.
    let relay = Arc::new(
        ScriptedRelay::new().respond("/get-all-subscription", rows_body("Acme", 10.0)),
    );
    let fetcher = fetcher(relay);

    fetcher
        .fetch_for_role(Role::GlobalAdmin, "Global Admin X", &ManagedNameSet::new())
        .await;

    assert_eq!(fetcher.state().rows(Stream::Subscription).await.len(), 1);
    assert!(fetcher.state().rows(Stream::Marketplace).await.is_empty());
}

#[tokio::test]
async fn failed_fetch_keeps_the_previous_rows() {
    let relay = Arc::new(
        ScriptedRelay::new()
            .respond("/get-all-subscription", rows_body("Acme", 10.0))
            .respond("/get-all-marketplace", rows_body("Zenith", 20.0)),
    );
    let fetcher = fetcher(relay);

    fetcher
        .fetch_for_role(Role::GlobalAdmin, "Global Admin X", &ManagedNameSet::new())
        .await;
    // Role change: the individual paths are unscripted, so both requests
    // fail and neither collection is touched.
    fetcher
        .fetch_for_role(
            Role::IndividualContributor,
            "Global Admin X",
            &ManagedNameSet::new(),
        )
        .await;

    let subscription = fetcher.state().rows(Stream::Subscription).await;
    assert_eq!(subscription[0].customer_name, "Acme");
}
