//! Organization and join-request steps

use cucumber::{then, when};
use serde_json::{json, Value};

use crate::features::support::TestWorld;

#[when(expr = "{word} creates the organization {string}")]
async fn create_organization(world: &mut TestWorld, owner: String, name: String) {
    let account = world.account(&owner);
    let id = world.app().create_organization(&account, &name).await;
    world.organizations.insert(name, (id, owner));
}

#[when(expr = "{word} requests to join {string}")]
async fn request_to_join(world: &mut TestWorld, requester: String, organization: String) {
    let account = world.account(&requester);
    let (organization_id, _) = world.organization(&organization);

    let response = world
        .app()
        .json_as(
            &account.token,
            "POST",
            "/api/MakeRequestToOrganization",
            json!({ "organization_id": organization_id }),
        )
        .await;

    if response.status.is_success() {
        let id = response.json::<Value>()["data"]["id"].as_i64().unwrap();
        world.join_requests.insert((requester, organization), id);
    }
    world.last_response = Some(response);
}

#[when(expr = "{word} accepts the request of {word} to {string}")]
async fn accept_request(
    world: &mut TestWorld,
    actor: String,
    requester: String,
    organization: String,
) {
    let account = world.account(&actor);
    let request_id = world.join_requests[&(requester, organization)];

    let response = world
        .app()
        .json_as(
            &account.token,
            "PUT",
            &format!("/api/acceptRequest/{}", request_id),
            json!({}),
        )
        .await;
    world.last_response = Some(response);
}

#[then(expr = "the request of {word} to {string} is {string}")]
async fn request_status(
    world: &mut TestWorld,
    requester: String,
    organization: String,
    status: String,
) {
    let account = world.account(&requester);
    let body: Value = world
        .app()
        .get_as(&account.token, "/api/ShowAllMyRequests")
        .await
        .json();
    let (organization_id, _) = world.organization(&organization);

    let request = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["organization_id"] == organization_id)
        .expect("no request for organization");
    assert_eq!(request["status"], status);
}

#[then(expr = "{word} belongs to no department")]
async fn no_department(world: &mut TestWorld, name: String) {
    let account = world.account(&name);
    let memberships: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM department_user WHERE user_id = ?")
            .bind(account.id)
            .fetch_one(&world.app().state.db)
            .await
            .unwrap();
    assert_eq!(memberships, 0);
}
