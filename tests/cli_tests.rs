use assert_cmd::Command;
use gql_harness::test_utils::fixtures::FakeBackend;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn gqlh() -> Command {
    let mut cmd = Command::cargo_bin("gqlh").unwrap();
    cmd.env("NO_COLOR", "1");
    for var in [
        "GQLH_ENDPOINT",
        "GQLH_TENANT_ID",
        "GQLH_TENANT_SECRET",
        "GQLH_PRODUCT_ID",
        "GQLH_BEARER_TOKEN",
        "GQLH_EXPECT_HTTP_200",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(dir: &TempDir, endpoint: &str) -> std::path::PathBuf {
    let path = dir.path().join("harness.json");
    let config = json!({
        "endpoint": endpoint,
        "tenant_id": "tenant-1",
        "tenant_secret": "super-secret",
        "product_id": "product-1",
        "timeout_secs": 5
    });
    fs::write(&path, config.to_string()).unwrap();
    path
}

#[test]
fn test_help() {
    gqlh()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("End-to-end test suites for a GraphQL API"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_list_shows_builtin_suites() {
    gqlh()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("company"))
        .stdout(predicate::str::contains("payout-settings"))
        .stdout(predicate::str::contains("payment-method"))
        .stdout(predicate::str::contains("deletePaymentMethod rejects an unknown id"));
}

#[test]
fn test_config_show_masks_secrets() {
    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, "http://localhost:4000/graphql");
    gqlh()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("tenant-1"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("super-secret").not());
}

#[test]
fn test_config_path_honors_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("elsewhere.json");
    gqlh()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.json"));
}

#[test]
fn test_run_unknown_suite_fails() {
    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, "http://localhost:4000/graphql");
    gqlh()
        .args(["run", "refund", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown suite 'refund'"));
}

#[test]
fn test_run_against_unreachable_endpoint_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, &format!("http://{addr}/graphql"));
    gqlh()
        .args(["run", "payment-method", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Transport failure"))
        .stderr(predicate::str::contains("test(s) failed"));
}

#[test]
fn test_run_json_against_fake_backend() {
    let server = FakeBackend::new().serve();
    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, server.url());

    let output = gqlh()
        .args(["run", "payout-settings", "payment-method", "--json", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    let suites = summary["suites"].as_array().unwrap();
    assert_eq!(suites.len(), 2);
    assert_eq!(suites[0]["suite"], "payout-settings");
    assert_eq!(suites[1]["suite"], "payment-method");
    assert!(server
        .requests()
        .iter()
        .all(|r| r.header("x-tenant-secret") == Some("super-secret")));
}

#[test]
fn test_doctor_reports_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("harness.json");
    fs::write(&path, json!({"endpoint": "ftp://example.com"}).to_string()).unwrap();
    gqlh()
        .args(["doctor", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration"))
        .stdout(predicate::str::contains("Probe skipped"));
}
