//! Team, membership, and invitation workflow tests
//!
//! Require `TEST_DATABASE_URL`; each test self-skips without it.

#[macro_use]
mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_team_includes_owner_membership() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, api_key) = app.create_team("Acme", owner).await;
    assert!(api_key.starts_with("sk_live_"));

    // The owner membership must exist the moment the team is observable
    let (status, body) = app
        .get_as(&format!("/v1/teams/{}/api-key", team_id), owner)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_key"].as_str().unwrap(), api_key);
}

#[tokio::test]
async fn test_create_team_rejects_bad_name() {
    let app = require_test_db!();

    let (status, _) = app
        .post(
            "/v1/teams",
            json!({ "name": "", "owner_user_id": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_key_requires_membership() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let (team_id, _) = app.create_team("Keyguard", owner).await;

    let (status, body) = app
        .get_as(&format!("/v1/teams/{}/api-key", team_id), stranger)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"].as_str().unwrap(), "FORBIDDEN");

    // Unknown team reports NotFound before the membership check
    let (status, _) = app
        .get_as(&format!("/v1/teams/{}/api-key", Uuid::new_v4()), owner)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invitation_accept_grants_membership() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();
    let invitee = Uuid::new_v4();

    let (team_id, _) = app.create_team("Inviters", owner).await;
    let token = app.invite(team_id, "new@example.com", "admin", owner).await;

    let (status, body) = app.accept(&token, invitee).await;
    assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
    assert_eq!(body["team_id"].as_str().unwrap(), team_id.to_string());
    assert_eq!(body["user_id"].as_str().unwrap(), invitee.to_string());
    assert_eq!(body["role"].as_str().unwrap(), "admin");

    // New member can now read the API key
    let (status, _) = app
        .get_as(&format!("/v1/teams/{}/api-key", team_id), invitee)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Member listing shows owner and invitee, oldest first
    let (status, members) = app
        .get_as(&format!("/v1/teams/{}/members", team_id), invitee)
        .await;
    assert_eq!(status, StatusCode::OK);
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["user_id"].as_str().unwrap(), owner.to_string());
    assert_eq!(members[0]["role"].as_str().unwrap(), "owner");

    // Invitation listing shows the consumed invitation but never the token
    let (status, invitations) = app
        .get_as(&format!("/v1/teams/{}/invitations", team_id), owner)
        .await;
    assert_eq!(status, StatusCode::OK);
    let invitations = invitations.as_array().unwrap();
    assert_eq!(invitations.len(), 1);
    assert!(invitations[0]["accepted"].as_bool().unwrap());
    assert!(invitations[0].get("token").is_none());
}

#[tokio::test]
async fn test_invitation_token_is_single_use() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Single Use", owner).await;
    let token = app.invite(team_id, "one@example.com", "member", owner).await;

    let (status, _) = app.accept(&token, Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.accept(&token, Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"].as_str().unwrap(), "CONFLICT");
}

#[tokio::test]
async fn test_concurrent_accepts_one_winner() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Race", owner).await;
    let token = app.invite(team_id, "race@example.com", "member", owner).await;

    let router_a = app.router.clone();
    let router_b = app.router.clone();
    let token_a = token.clone();
    let token_b = token.clone();

    let accept = |router: axum::Router, token: String| async move {
        use axum::body::Body;
        use axum::http::{header, Method, Request};
        use tower::ServiceExt;

        let body = json!({ "token": token, "user_id": Uuid::new_v4() });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/invitations/accept")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    };

    let (status_a, status_b) = tokio::join!(
        tokio::spawn(accept(router_a, token_a)),
        tokio::spawn(accept(router_b, token_b)),
    );
    let statuses = [status_a.unwrap(), status_b.unwrap()];

    // Exactly one acceptance wins; the loser observes Conflict
    assert!(statuses.contains(&StatusCode::OK), "statuses: {:?}", statuses);
    assert!(
        statuses.contains(&StatusCode::CONFLICT),
        "statuses: {:?}",
        statuses
    );
}

#[tokio::test]
async fn test_invite_requires_owner_or_admin() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();
    let plain_member = Uuid::new_v4();

    let (team_id, _) = app.create_team("Gated", owner).await;
    let token = app
        .invite(team_id, "member@example.com", "member", owner)
        .await;
    let (status, _) = app.accept(&token, plain_member).await;
    assert_eq!(status, StatusCode::OK);

    // A plain member cannot invite
    let (status, body) = app
        .post(
            &format!("/v1/teams/{}/invitations", team_id),
            json!({
                "email": "other@example.com",
                "role": "member",
                "inviter_id": plain_member,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "body: {}", body);

    // Neither can a non-member
    let (status, _) = app
        .post(
            &format!("/v1/teams/{}/invitations", team_id),
            json!({
                "email": "other@example.com",
                "role": "member",
                "inviter_id": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Listing invitations is gated the same way as issuing them
    let (status, _) = app
        .get_as(&format!("/v1/teams/{}/invitations", team_id), plain_member)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invite_unknown_team_not_found() {
    let app = require_test_db!();

    let (status, _) = app
        .post(
            &format!("/v1/teams/{}/invitations", Uuid::new_v4()),
            json!({
                "email": "nobody@example.com",
                "role": "member",
                "inviter_id": Uuid::new_v4(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accept_unknown_token_not_found() {
    let app = require_test_db!();

    let (status, body) = app.accept("no-such-token", Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"].as_str().unwrap(), "NOT_FOUND");
}
