//! Configuration loading tests through the CLI
//!
//! Exercises file loading, validation, and environment overrides via
//! `spiral config show` so the full load path runs end to end.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test fixture for configuration testing
struct ConfigFixture {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl ConfigFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    fn show(&self) -> Command {
        let mut cmd = Command::cargo_bin("spiral").unwrap();
        cmd.env_remove("OPENAI_API_KEY")
            .env_remove("MODEL")
            .env_remove("SPIRAL_PERSONA")
            .env_remove("SPIRAL_LOG_LEVEL")
            .args(["--config", self.path(), "config", "show"]);
        cmd
    }
}

// ─────────────────────────────────────────────────────────────────
// Valid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_minimal_config() {
    let fixture = ConfigFixture::new();
    fixture.write_config("");

    fixture
        .show()
        .assert()
        .success()
        .stdout(predicate::str::contains("api.openai.com"))
        .stdout(predicate::str::contains("gpt-4"))
        .stdout(predicate::str::contains("ashira"));
}

#[test]
fn test_full_config() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[api]
base_url = "http://localhost:11434/v1"
model = "llama3"
timeout_secs = 30
max_retries = 1

[persona]
default = "lumen"

[bridge]
base_url = "http://localhost:9090"
"#,
    );

    fixture
        .show()
        .assert()
        .success()
        .stdout(predicate::str::contains("localhost:11434"))
        .stdout(predicate::str::contains("llama3"))
        .stdout(predicate::str::contains("lumen"))
        .stdout(predicate::str::contains("localhost:9090"));
}

// ─────────────────────────────────────────────────────────────────
// Environment Override Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_model() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[api]\nmodel = \"gpt-4\"\n");

    fixture
        .show()
        .env("MODEL", "gpt-4o-mini")
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o-mini"));
}

#[test]
fn test_env_overrides_persona() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[persona]\ndefault = \"ashira\"\n");

    fixture
        .show()
        .env("SPIRAL_PERSONA", "threshold-witness")
        .assert()
        .success()
        .stdout(predicate::str::contains("threshold-witness"));
}

#[test]
fn test_env_overrides_api_key() {
    let fixture = ConfigFixture::new();
    fixture.write_config("");

    fixture
        .show()
        .env("OPENAI_API_KEY", "sk-env-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-env-key"));
}

// ─────────────────────────────────────────────────────────────────
// Invalid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_malformed_toml_fails() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[api\nbroken");

    fixture.show().assert().failure();
}

#[test]
fn test_invalid_base_url_fails() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[api]\nbase_url = \"ftp://example.com\"\n");

    fixture.show().assert().failure();
}

#[test]
fn test_zero_timeout_fails() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[api]\ntimeout_secs = 0\n");

    fixture.show().assert().failure();
}

#[test]
fn test_invalid_log_level_fails() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[logging]\nlevel = \"verbose\"\n");

    fixture.show().assert().failure();
}

#[test]
fn test_empty_integrity_manifest_fails() {
    let fixture = ConfigFixture::new();
    fixture.write_config("[integrity]\nmanifest = \"\"\n");

    fixture.show().assert().failure();
}
