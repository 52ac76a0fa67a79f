//! CLI integration tests for the hookwise binary
//!
//! These tests verify that the CLI commands work correctly by running
//! the actual compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a Command instance for the hookwise binary
#[allow(deprecated)]
fn hookwise_cmd() -> Command {
    Command::cargo_bin("hookwise").expect("Failed to find hookwise binary")
}

fn classify_json(integration: &str, raw: &str) -> serde_json::Value {
    let output = hookwise_cmd()
        .args(["classify", "--integration", integration, raw])
        .output()
        .expect("Failed to run hookwise");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("classify prints JSON")
}

#[test]
fn test_version_flag() {
    hookwise_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    hookwise_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("sign"));
}

#[test]
fn test_classify_table_hit() {
    let json = classify_json(
        "stripe",
        r#"{"code":"card_declined","message":"Your card was declined.","statusCode":402}"#,
    );

    assert_eq!(json["kind"], "Validation");
    assert_eq!(json["retryable"], false);
    assert_eq!(json["code"], "card_declined");
    assert_eq!(json["statusCode"], 402);
    assert_eq!(json["message"], "Your card was declined.");
    assert!(json.get("cause").is_none());
}

#[test]
fn test_classify_status_fallback() {
    let json = classify_json("slack", r#"{"status":503}"#);

    assert_eq!(json["kind"], "Server");
    assert_eq!(json["retryable"], true);
    assert_eq!(json["code"], "unknown");
}

#[test]
fn test_classify_reads_stdin() {
    hookwise_cmd()
        .args(["classify", "-i", "github"])
        .write_stdin(r#"{"code":"ECONNRESET"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"Network\""));
}

#[test]
fn test_classify_unknown_integration() {
    hookwise_cmd()
        .args(["classify", "--integration", "acme", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown integration: acme"));
}

#[test]
fn test_classify_invalid_json() {
    hookwise_cmd()
        .args(["classify", "--integration", "stripe", "not json"])
        .assert()
        .failure();
}

#[test]
fn test_classify_uses_config_overrides() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        r#"
[[integrations.acme.codes]]
code = "quota_exceeded"
kind = "RateLimit"
"#
    )
    .unwrap();

    hookwise_cmd()
        .args(["--config"])
        .arg(file.path())
        .args(["classify", "--integration", "acme", r#"{"code":"quota_exceeded"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"RateLimit\""))
        .stdout(predicate::str::contains("\"retryable\": true"));
}

#[test]
fn test_sign_hmac() {
    // HMAC-SHA256("It's a Secret to Everybody", "Hello, World!") as documented by GitHub
    hookwise_cmd()
        .args([
            "sign",
            "--integration",
            "github",
            "--secret",
            "It's a Secret to Everybody",
        ])
        .write_stdin("Hello, World!")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "X-Hub-Signature-256: sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17",
        ));
}

#[test]
fn test_sign_shared_secret() {
    hookwise_cmd()
        .args(["sign", "--integration", "stripe", "--secret", "whsec_abc"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::diff("Stripe-Webhook-Secret: whsec_abc\n"));
}

#[test]
fn test_sign_without_secret() {
    hookwise_cmd()
        .env_remove("LINEAR_WEBHOOK_SECRET")
        .args(["sign", "--integration", "linear"])
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No webhook secret configured"));
}

#[test]
fn test_missing_config_file() {
    hookwise_cmd()
        .args(["--config", "does/not/exist.toml", "classify", "-i", "stripe", "{}"])
        .assert()
        .failure();
}
