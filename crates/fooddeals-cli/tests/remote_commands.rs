//! End-to-end command tests against a mock FoodDeals server.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temp FOODDEALS_HOME directory for test isolation.
fn temp_home() -> TempDir {
    TempDir::new().expect("create temp fooddeals home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn write_session(home: &TempDir, token: &str) {
    fs::write(
        home.path().join("session.json"),
        json!({ "access_token": token }).to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_login_persists_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; HttpOnly; Path=/auth/refresh")
                .set_body_json(json!({ "status": "logged in", "access token": "fresh" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .env("FOODDEALS_API_BASE_URL", server.uri())
        .args(["login", "--email", "chef@example.com", "--password", "pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as chef@example.com"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("fresh"), "session file: {session}");
    let cookies = fs::read_to_string(home.path().join("cookies.json")).unwrap();
    assert!(cookies.contains("r1"), "cookie jar: {cookies}");
}

#[tokio::test]
async fn test_posts_list_filters_by_search() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("sorting", "likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "user_id": 1, "body": "Taco Tuesday", "likes": 4 },
            { "id": 2, "user_id": 1, "body": "Sushi deal", "likes": 2 }
        ])))
        .mount(&server)
        .await;

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .env("FOODDEALS_API_BASE_URL", server.uri())
        .args(["posts", "list", "--sort", "likes", "--search", "taco"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Taco Tuesday"))
        .stdout(predicate::str::contains("Sushi deal").not());
}

#[tokio::test]
async fn test_whoami_refreshes_expired_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    write_session(&home, "stale");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/myemail"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access token": "renewed" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/myemail"))
        .and(header("authorization", "Bearer renewed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 3, "email": "chef@example.com" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .env("FOODDEALS_API_BASE_URL", server.uri())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("chef@example.com (id 3)"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("renewed"), "session file: {session}");
}

#[tokio::test]
async fn test_server_error_detail_is_printed() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    write_session(&home, "token");
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/post/9"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "detail": "you can only delete your own posts" })),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .env("FOODDEALS_API_BASE_URL", server.uri())
        .args(["posts", "delete", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("delete post 9"))
        .stderr(predicate::str::contains("you can only delete your own posts"));
}

#[test]
fn test_logout_removes_session_file() {
    let home = temp_home();
    write_session(&home, "token");

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    assert!(!home.path().join("session.json").exists());
}

#[test]
fn test_logout_recovers_from_corrupt_session_file() {
    let home = temp_home();
    let session_path = home.path().join("session.json");
    fs::write(&session_path, r#"{"access_tok"#).unwrap();

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));

    assert!(!session_path.exists());
}

#[tokio::test]
async fn test_login_overwrites_corrupt_session_file() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    fs::write(home.path().join("session.json"), r#"{"access_tok"#).unwrap();
    fs::write(home.path().join("cookies.json"), "[broken").unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access token": "repaired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("fooddeals")
        .env("FOODDEALS_HOME", home.path())
        .env("FOODDEALS_API_BASE_URL", server.uri())
        .args(["login", "--email", "chef@example.com", "--password", "pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as chef@example.com"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("repaired"), "session file: {session}");
}
