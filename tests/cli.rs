//! End-to-end tests for the `ledger` binary against a temporary SQLite ledger.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::*;

fn ledger_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("ledger");
    path
}

fn setup_env(keying: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::create_dir_all(root.join("files")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/ledger.sqlite"

[server]
bind = "127.0.0.1:3001"

[intake]
extract_timeout_secs = 20
store_timeout_secs = 10

[tokens]
dir = "{root}/data/tokens"
keying = "{keying}"
"#,
        root = root.display(),
        keying = keying,
    );
    fs::write(root.join("config").join("ledger.toml"), config_content).unwrap();

    (tmp, root.join("config").join("ledger.toml"))
}

fn run_ledger(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(ledger_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ledger: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn field<'a>(stdout: &'a str, name: &str) -> Option<&'a str> {
    stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix(name)?.strip_prefix(": "))
}

#[test]
fn init_is_idempotent() {
    let (_tmp, config) = setup_env("per_submission");
    let (stdout, stderr, ok) = run_ledger(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Ledger initialized successfully."));

    let (_, stderr, ok) = run_ledger(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);

    let (stdout, _, ok) = run_ledger(&config, &["list"]);
    assert!(ok);
    assert!(stdout.contains("ledger is empty"), "got: {}", stdout);
}

#[test]
fn submit_list_and_verify_docx() {
    let (tmp, config) = setup_env("per_submission");
    let resume = tmp.path().join("files").join("cv.docx");
    fs::write(&resume, docx_with_text("Senior Rust Engineer")).unwrap();
    let resume = resume.to_str().unwrap().to_string();

    run_ledger(&config, &["init"]);
    let (stdout, stderr, ok) = run_ledger(
        &config,
        &["submit", &resume, "--name", "Ada Lovelace", "--email", "ada@example.com"],
    );
    assert!(ok, "submit failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.trim_end().ends_with("ok"), "got: {}", stdout);

    let id = field(&stdout, "application_id").unwrap().to_string();
    let hash = field(&stdout, "resume_hash").unwrap().to_string();
    assert!(is_lower_hex_64(&hash));
    assert_eq!(field(&stdout, "sequence"), Some("1"));
    assert_eq!(field(&stdout, "ledger size"), Some("1"));

    let tokens_file = tmp.path().join("data/tokens").join(format!("{}.json", id));
    let tokens: serde_json::Value =
        serde_json::from_slice(&fs::read(tokens_file).unwrap()).unwrap();
    assert_eq!(
        tokens,
        serde_json::json!({ "engineer": true, "rust": true, "senior": true })
    );

    let (stdout, _, ok) = run_ledger(&config, &["list", "--json"]);
    assert!(ok);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["application_id"], id.as_str());
    assert_eq!(entries[0]["resume_hash"], hash.as_str());
    assert_eq!(entries[0]["name"], "Ada Lovelace");

    let (stdout, stderr, ok) = run_ledger(&config, &["verify", &resume]);
    assert!(ok, "verify failed: {}", stderr);
    assert_eq!(field(&stdout, "resume_hash"), Some(hash.as_str()));
    assert_eq!(field(&stdout, "matches"), Some("1"));
    assert!(stdout.contains(&id));
}

#[test]
fn resubmitting_same_file_records_two_entries() {
    let (tmp, config) = setup_env("latest");
    let resume = tmp.path().join("files").join("cv.docx");
    fs::write(&resume, docx_with_text("Product designer")).unwrap();
    let resume = resume.to_str().unwrap().to_string();

    run_ledger(&config, &["init"]);
    let (first, _, ok1) = run_ledger(&config, &["submit", &resume]);
    let (second, _, ok2) = run_ledger(&config, &["submit", &resume]);
    assert!(ok1 && ok2);
    assert_eq!(field(&first, "resume_hash"), field(&second, "resume_hash"));
    assert_ne!(field(&first, "application_id"), field(&second, "application_id"));
    assert_eq!(field(&second, "sequence"), Some("2"));

    assert!(tmp.path().join("data/tokens/token.json").exists());

    let (stdout, _, _) = run_ledger(&config, &["verify", &resume]);
    assert_eq!(field(&stdout, "matches"), Some("2"));
}

#[test]
fn unsupported_file_is_rejected() {
    let (tmp, config) = setup_env("per_submission");
    let notes = tmp.path().join("files").join("cv.txt");
    fs::write(&notes, "plain text resume").unwrap();

    run_ledger(&config, &["init"]);
    let (_, stderr, ok) = run_ledger(
        &config,
        &["submit", notes.to_str().unwrap(), "--media-type", "text/plain"],
    );
    assert!(!ok, "text/plain must be rejected");
    assert!(stderr.contains("unsupported"), "got: {}", stderr);

    let (stdout, _, _) = run_ledger(&config, &["list"]);
    assert!(stdout.contains("ledger is empty"));
}

#[test]
fn corrupt_pdf_leaves_ledger_untouched() {
    let (tmp, config) = setup_env("per_submission");
    let bad = tmp.path().join("files").join("bad.pdf");
    fs::write(&bad, b"not a valid pdf").unwrap();

    run_ledger(&config, &["init"]);
    let (_, _, ok) = run_ledger(&config, &["submit", bad.to_str().unwrap()]);
    assert!(!ok);

    let (stdout, _, _) = run_ledger(&config, &["list"]);
    assert!(stdout.contains("ledger is empty"));
}

#[test]
fn verify_unknown_document_fails() {
    let (tmp, config) = setup_env("per_submission");
    let other = tmp.path().join("files").join("other.docx");
    fs::write(&other, docx_with_text("Never submitted")).unwrap();

    run_ledger(&config, &["init"]);
    let (stdout, stderr, ok) = run_ledger(&config, &["verify", other.to_str().unwrap()]);
    assert!(!ok);
    assert!(field(&stdout, "resume_hash").is_some());
    assert!(stderr.contains("no ledger entry matches"), "got: {}", stderr);
}

#[test]
fn pdf_submission_is_fingerprinted() {
    let (tmp, config) = setup_env("per_submission");
    let resume = tmp.path().join("files").join("cv.pdf");
    let bytes = pdf_with_text("Experienced Engineer");
    fs::write(&resume, &bytes).unwrap();

    run_ledger(&config, &["init"]);
    let (stdout, stderr, ok) = run_ledger(&config, &["submit", resume.to_str().unwrap()]);
    assert!(ok, "submit failed: {}", stderr);
    assert!(is_lower_hex_64(field(&stdout, "resume_hash").unwrap()));
}
