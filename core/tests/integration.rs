//! Full user/key/plan lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every facade
//! operation over real HTTP through `UreqTransport`. Validates that request
//! building and response parsing agree with the server's schema end-to-end.

use serde_json::json;
use tyr_core::{
    BillingPlanClient, ClientConfig, Decoded, InstanceClient, KeyClient, Params, TyrClient, UserClient,
};

/// Start the mock server on a random port and return its `/v0` base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/v0/")
}

fn client(base_url: &str) -> TyrClient {
    TyrClient::new(ClientConfig::new(base_url).unwrap().with_end_point_id(1))
}

fn status(client: &TyrClient) -> u16 {
    client.last_response().unwrap().status
}

#[test]
fn user_lifecycle() {
    let mut client = client(&start_server());
    let email = "lifecycle@example.org";

    // Step 1: unknown user.
    assert!(client.get_user_by_email(email).unwrap().is_none());
    assert!(!client.has_user_by_email(email).unwrap());
    assert!(!client.delete_user(email).unwrap());

    // Step 2: create.
    let created = client
        .create_user(email, "lifecycle", &Params::new())
        .unwrap()
        .found()
        .expect("created user");
    assert_eq!(status(&client), 200);
    assert_eq!(created.email, email);
    let plan = created.billing_plan.clone().unwrap();
    assert!(plan.default, "new users get the end point's default plan");

    // Step 3: lookups.
    let by_email = client.get_user_by_email(email).unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
    assert_eq!(by_email.login, "lifecycle");
    assert!(client.has_user_by_email(email).unwrap());
    let by_id = client.get_user_by_id(created.id).unwrap().found().unwrap();
    assert_eq!(by_id.email, email);
    assert_eq!(client.get_users().unwrap().len(), 1);
    assert!(client.get_users_by_end_point_id(2).unwrap().is_empty());

    // Step 4: move the user to a new plan.
    let new_plan = client
        .create_billing_plan("lifecycle_plan", Some(3000), Some(6000), false)
        .unwrap()
        .found()
        .unwrap();
    let mut params = Params::new();
    params.insert("billing_plan_id".to_string(), json!(new_plan.id));
    assert!(client.update_user(created.id, &params).unwrap());
    let updated = client.get_user_by_id(created.id).unwrap().found().unwrap();
    assert_eq!(updated.billing_plan.unwrap().id, new_plan.id);

    // Step 5: an update naming an unknown plan reports failure.
    params.insert("billing_plan_id".to_string(), json!(99_999));
    assert!(!client.update_user(created.id, &params).unwrap());
    assert_eq!(status(&client), 400);

    // Step 6: authorize on an instance.
    let instances = client.get_instances().unwrap();
    assert_eq!(instances.len(), 2);
    assert!(client.add_user_instance(Some(created.id), 1, instances[0].id).unwrap());
    assert!(!client.add_user_instance(Some(created.id), 1, 99_999).unwrap());
    assert!(!client.add_user_instance(None, 1, instances[0].id).unwrap());

    // Step 7: delete.
    assert!(client.delete_user(email).unwrap());
    assert_eq!(status(&client), 204);
    assert!(client.get_user_by_email(email).unwrap().is_none());
    assert!(matches!(client.get_user_by_id(created.id).unwrap(), Decoded::Ambiguous(_)));
    assert_eq!(status(&client), 404);
    assert!(client.delete_billing_plan(new_plan.id).unwrap());
}

#[test]
fn create_user_with_named_default_plan() {
    let mut client = client(&start_server());

    let mut extra = Params::new();
    extra.insert("billing_plan_default".to_string(), json!("nav_ent"));
    let user = client
        .create_user("planned@example.org", "planned", &extra)
        .unwrap()
        .found()
        .unwrap();

    assert_eq!(user.billing_plan.unwrap().name, "nav_ent");
}

#[test]
fn key_lifecycle() {
    let mut client = client(&start_server());
    let user = client
        .create_user("keys@example.org", "keys", &Params::new())
        .unwrap()
        .found()
        .unwrap();

    assert_eq!(client.get_user_keys(user.id).unwrap(), Decoded::Found(Vec::new()));

    let mut tokens = Vec::new();
    for _ in 0..3 {
        let token = client.create_user_key(user.id, Some("portal")).unwrap().unwrap();
        assert_eq!(status(&client), 200);
        assert_eq!(token.len(), 36, "uuid-shaped token: {token}");
        tokens.push(token);
    }

    let keys = client.get_user_keys(user.id).unwrap().found().unwrap();
    assert_eq!(keys.len(), 3);
    let listed: Vec<&str> = keys.iter().map(|k| k.token.as_str()).collect();
    assert_eq!(listed, tokens.iter().map(String::as_str).collect::<Vec<_>>());

    let removed = keys[0].id;
    assert!(client.delete_user_key(user.id, removed).unwrap().is_some());
    let keys = client.get_user_keys(user.id).unwrap().found().unwrap();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.id != removed));

    assert!(matches!(client.get_user_keys(99_999).unwrap(), Decoded::Ambiguous(_)));
    assert_eq!(status(&client), 404);
}

#[test]
fn billing_plan_lifecycle() {
    let mut client = client(&start_server());

    let all = client.get_billing_plans().unwrap().found().unwrap();
    assert!(!all.is_empty());
    assert!(all.iter().all(|p| p.end_point.as_ref().unwrap().id == 1));
    assert!(client.find_billing_plan_by_name("partner_default").unwrap().is_none());

    let created = client
        .create_billing_plan("bronze", Some(3000), Some(6000), false)
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(status(&client), 200);
    assert_eq!(created.name, "bronze");
    assert_eq!(created.max_request_count, Some(3000));
    assert!(!created.default);

    let fetched = client.get_billing_plan(created.id).unwrap().found().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(
        client.find_billing_plan_by_name("bronze").unwrap().map(|p| p.id),
        Some(created.id)
    );

    let updated = client
        .update_billing_plan(created.id, "updated", Some(20), Some(30), false)
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(updated.name, "updated");
    assert_eq!(updated.max_request_count, Some(20));
    assert_eq!(updated.max_object_count, Some(30));
    assert!(!updated.default);

    assert!(client.delete_billing_plan(created.id).unwrap());
    assert_eq!(status(&client), 204);
    assert!(!client.delete_billing_plan(created.id).unwrap());
    assert_eq!(status(&client), 404);
}
