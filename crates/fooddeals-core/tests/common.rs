//! Shared helpers for request-layer integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::config::Config;
use fooddeals_core::http::ApiClient;
use fooddeals_core::session::{CookieVault, TokenStore};
use wiremock::MockServer;

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Façade against `base_url`, signed in with `token` when given.
pub fn api_for(base_url: &str, token: Option<&str>) -> FoodDealsApi {
    let tokens = Arc::new(TokenStore::in_memory());
    tokens.set(token.map(str::to_string));
    let client = ApiClient::new(
        base_url,
        Some(Duration::from_secs(5)),
        tokens,
        Arc::new(CookieVault::in_memory()),
    )
    .expect("build client");
    FoodDealsApi::new(client, Config::default())
}

pub fn api_for_server(server: &MockServer, token: Option<&str>) -> FoodDealsApi {
    api_for(&server.uri(), token)
}
