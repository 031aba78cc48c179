//! Process-level tests: start the `reelsync` binary with a config file.

use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config with the scheduler off and an unreachable provider.
fn minimal_config(port: u16, db_dir: &Path, auth: &str) -> String {
    format!(
        r#"
{auth}

[server]
host = "127.0.0.1"
port = {port}

[database]
path = "{db}"

[provider.tmdb]
api_key = "tmdb-test-key"
base_url = "http://127.0.0.1:9/3"

[scheduler]
enabled = false
"#,
        auth = auth,
        port = port,
        db = db_dir.join("catalog.db").display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_reelsync"))
        .env("REELSYNC_CONFIG", config_path)
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_and_config_endpoints() {
    let port = get_available_port();
    let db_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, db_dir.path(), "[auth]\nmethod = \"none\""));

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 60).await, "Server did not start in time");

    let client = Client::new();
    let health: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(!body.contains("tmdb-test-key"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["provider"]["tmdb"]["api_key_configured"], true);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_admin_routes_require_key() {
    let port = get_available_port();
    let db_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(
        port,
        db_dir.path(),
        "[auth]\nmethod = \"api_key\"\napi_key = \"admin-key\"",
    ));

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 60).await, "Server did not start in time");

    let client = Client::new();
    let url = format!("http://127.0.0.1:{}/api/v1/catalog/stats", port);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(&url)
        .header("X-API-Key", "admin-key")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_reelsync"))
            .env("REELSYNC_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    // api_key auth without a key fails validation
    let config = write_config(
        r#"
[auth]
method = "api_key"

[provider.tmdb]
api_key = "tmdb-test-key"
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_reelsync"))
            .env("REELSYNC_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
