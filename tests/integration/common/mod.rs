//! Common test utilities for integration tests
//!
//! Tests here require a real Postgres database. They self-skip when
//! `TEST_DATABASE_URL` is not set, so `cargo test` stays green on machines
//! without one. Requests are driven straight through the router with
//! `tower::ServiceExt::oneshot`; no listener is needed.

use std::env;
use std::sync::Once;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tallybook_common::Config;
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Base URL configured for the app under test; PDF locators build on it
#[allow(dead_code)]
pub const TEST_APP_BASE_URL: &str = "https://tallybook.test";

/// Test application wrapping the composed router and its database pool
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
}

#[allow(dead_code)]
impl TestApp {
    /// Build the app against `TEST_DATABASE_URL`, or `None` to skip the test
    pub async fn try_new() -> Option<Self> {
        INIT.call_once(|| {
            dotenvy::from_filename(".env.test").ok();
            dotenvy::dotenv().ok();
        });

        let database_url = env::var("TEST_DATABASE_URL").ok()?;
        match Self::build(database_url).await {
            Ok(app) => Some(app),
            Err(e) => panic!("TEST_DATABASE_URL is set but setup failed: {}", e),
        }
    }

    async fn build(database_url: String) -> Result<Self> {
        let pool = PgPool::connect(&database_url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;

        let config = Config {
            database_url: database_url.clone(),
            app_base_url: TEST_APP_BASE_URL.to_string(),
            rust_log: "tallybook=debug".to_string(),
            port: 0,
        };

        let router = tallybook_app::create_app(config, pool.clone()).await?;
        Ok(TestApp { router, pool })
    }

    /// Send a request through the router and decode the JSON body.
    /// Non-JSON bodies come back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request build failed"),
            None => builder.body(Body::empty()).expect("request build failed"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read failed");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn get_as(&self, path: &str, user_id: Uuid) -> (StatusCode, Value) {
        self.request(
            Method::GET,
            path,
            None,
            &[("x-user-id", &user_id.to_string())],
        )
        .await
    }

    /// Create a team and return `(team_id, api_key)`
    pub async fn create_team(&self, name: &str, owner_id: Uuid) -> (Uuid, String) {
        let (status, body) = self
            .post(
                "/v1/teams",
                serde_json::json!({ "name": name, "owner_user_id": owner_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create_team failed: {}", body);

        let team_id = body["team_id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("team_id missing");
        let api_key = body["api_key"].as_str().expect("api_key missing").to_string();
        (team_id, api_key)
    }

    /// Invite a user and return the invitation token
    pub async fn invite(
        &self,
        team_id: Uuid,
        email: &str,
        role: &str,
        inviter_id: Uuid,
    ) -> String {
        let (status, body) = self
            .post(
                &format!("/v1/teams/{}/invitations", team_id),
                serde_json::json!({ "email": email, "role": role, "inviter_id": inviter_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite failed: {}", body);
        body["invitation_token"]
            .as_str()
            .expect("invitation_token missing")
            .to_string()
    }

    /// Accept an invitation as `user_id`
    pub async fn accept(&self, token: &str, user_id: Uuid) -> (StatusCode, Value) {
        self.post(
            "/v1/invitations/accept",
            serde_json::json!({ "token": token, "user_id": user_id }),
        )
        .await
    }
}

/// Skip the test when no test database is configured
macro_rules! require_test_db {
    () => {
        match crate::common::TestApp::try_new().await {
            Some(app) => app,
            None => {
                eprintln!("skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}
