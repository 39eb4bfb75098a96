//! End-to-end tests of the dv2anchor binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../dv2anchor/tests/fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dv2anchor"))
        .args(args)
        .env("DV2ANCHOR_LOG_LEVEL", "off")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run dv2anchor")
}

/// Copy a fixture into a fresh temp dir and return (dir, path)
fn staged(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::copy(fixture(name), &path).unwrap();
    (dir, path)
}

#[test]
fn test_converts_next_to_input() {
    let (dir, input) = staged("customer_order.drawio");
    let output = run(&[input.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let written = dir.path().join("customer_order_anchor.xml");
    let xml = fs::read_to_string(&written).unwrap();
    assert!(xml.starts_with("<mxfile"));
    assert!(xml.contains("id=\"a_customer\""));
    assert!(xml.contains("id=\"t_customer_order\""));
    assert!(xml.contains("id=\"r_customer_details_email\""));
}

#[test]
fn test_explicit_output_path() {
    let (dir, input) = staged("customer_order.drawio");
    let target = dir.path().join("anchor.drawio");
    let output = run(&[input.to_str().unwrap(), "-o", target.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(target.exists());
    assert!(!dir.path().join("customer_order_anchor.xml").exists());
}

#[test]
fn test_output_to_stdout() {
    let (_dir, input) = staged("customer_order.drawio");
    let output = run(&[input.to_str().unwrap(), "-o", "-"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("a_order"));
}

#[test]
fn test_rejection_writes_nothing() {
    let (dir, input) = staged("customer_order_transactional.drawio");
    let output = run(&[input.to_str().unwrap(), "--color", "never"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("l_customer_order"));
    assert!(stderr.contains("order_date"));
    assert!(!dir
        .path()
        .join("customer_order_transactional_anchor.xml")
        .exists());
}

#[test]
fn test_every_violation_on_its_own_line() {
    let (_dir, input) = staged("violations.drawio");
    let output = run(&[input.to_str().unwrap(), "--check", "--color", "never"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let violation_lines = stderr.lines().filter(|l| l.trim_start().starts_with('✗')).count();
    assert_eq!(violation_lines, 6, "stderr: {}", stderr);
}

#[test]
fn test_check_mode() {
    let (dir, input) = staged("customer_order.drawio");
    let output = run(&[input.to_str().unwrap(), "--check"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 hub(s), 1 link(s), 1 satellite(s)"));
    assert!(!dir.path().join("customer_order_anchor.xml").exists());
}

#[test]
fn test_page_selection() {
    let (dir, input) = staged("referral_roles.drawio");
    let output = run(&[input.to_str().unwrap(), "--page", "1"]);
    assert!(output.status.success());

    let xml = fs::read_to_string(dir.path().join("referral_roles_anchor.xml")).unwrap();
    assert!(xml.contains("value=\"referrer\""));
    assert!(xml.contains("value=\"referee\""));

    let output = run(&[input.to_str().unwrap(), "--page", "7", "--color", "never"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Page 7 not found"));
}

#[test]
fn test_config_file() {
    let (dir, input) = staged("referral_roles.drawio");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "page": 1, "styles": { "tie": "shape=table;fillColor=#123456;" } }"#).unwrap();

    let output = run(&[input.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert!(output.status.success());
    let xml = fs::read_to_string(dir.path().join("referral_roles_anchor.xml")).unwrap();
    assert!(xml.contains("fillColor=#123456"));
}

#[test]
fn test_print_config() {
    let output = run(&["--print-config", "--page", "3"]);
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["page"], 3);
    assert_eq!(config["layout"]["row_height"], 30.0);
}

#[test]
fn test_missing_input_file() {
    let output = run(&["/nonexistent/model.drawio", "--color", "never"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read input file"));
}
