//! Shared helpers for the integration tests
//!
//! Every test runs against a local `wiremock` server standing in for the API,
//! mounted under `/api/1/` like the real base URL.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use avatar_fetcher::app::{ApiClient, ClientConfig};

/// `Basic base64("user:pass")`
pub const BASIC_USER_PASS: &str = "Basic dXNlcjpwYXNz";

pub const API_PREFIX: &str = "/api/1";

/// Client config pointed at the mock server with pacing effectively off
pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: format!("{}{}/", server.uri(), API_PREFIX),
        rate_limit_rps: 1000,
        ..Default::default()
    }
}

pub fn api_client(server: &MockServer) -> ApiClient {
    ApiClient::new(&client_config(server)).unwrap()
}

pub fn api_path(endpoint: &str) -> String {
    format!("{}/{}", API_PREFIX, endpoint)
}

pub fn user_json(display_name: &str) -> Value {
    json!({
        "id": "usr_test",
        "displayName": display_name,
        "username": "user",
        "currentAvatarAssetUrl": null,
        "bio": "kept as extra"
    })
}

/// `count` listing records numbered from `start`
pub fn avatar_page(start: usize, count: usize) -> Value {
    Value::Array(
        (start..start + count)
            .map(|i| {
                json!({
                    "id": format!("avtr_{}", i),
                    "name": format!("Avatar {}", i),
                    "authorName": "Tester",
                    "description": null,
                    "releaseStatus": "private",
                    "unityPackages": []
                })
            })
            .collect(),
    )
}

/// Mounts an identity endpoint that accepts `user`/`pass` without a second factor
pub async fn mount_plain_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .and(header("authorization", BASIC_USER_PASS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "auth=authcookie_1; Path=/")
                .set_body_json(user_json("Tester")),
        )
        .mount(server)
        .await;
}
