use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn versync_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_versync"))
}

fn run_cli(manifest: &Path, args: &[&str]) -> Output {
    Command::new(versync_bin())
        .arg("--manifest")
        .arg(manifest)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("VERSYNC_NAMESPACE")
        .output()
        .expect("failed to execute versync CLI")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[derive(Debug, Deserialize)]
struct Violation {
    path: String,
    expected: String,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    path: String,
    kind: String,
    exists: bool,
}

fn manifest_with(contents: serde_json::Value) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create project dir");
    let manifest = dir.path().join("package.json");
    fs::write(&manifest, serde_json::to_string_pretty(&contents).unwrap()).unwrap();
    (dir, manifest)
}

#[test]
fn test_check_reports_every_violation() {
    let (_dir, manifest) = manifest_with(serde_json::json!({
        "version": "1.0.0",
        "versync": {
            "versioning": {
                "stores": [
                    {"path": "ok.json"},
                    {"path": "../outside.txt"},
                    {"kind": "module", "path": "version.ts", "exportName": "not-valid"},
                    {"path": "README.md", "replacement": "no token"}
                ]
            }
        }
    }));

    let output = run_cli(&manifest, &["check", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let value = stdout_json(&output);
    assert_eq!(value["valid"], false);

    let violations: Vec<Violation> = serde_json::from_value(value["violations"].clone()).unwrap();
    let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/versync/versioning/stores/1/path",
            "/versync/versioning/stores/2/exportName",
            "/versync/versioning/stores/3/replacement",
        ]
    );
    assert!(violations[2].expected.contains("{{version}}"));
}

#[test]
fn test_check_valid_configuration() {
    let (_dir, manifest) = manifest_with(serde_json::json!({
        "version": "3.1.4",
        "versync": {"versioning": {"stores": {"path": "VERSION"}}}
    }));

    let output = run_cli(&manifest, &["check", "--json"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["valid"], true);
    assert_eq!(value["stores"], 1);
    assert_eq!(value["version"], "3.1.4");
}

#[test]
fn test_custom_namespace_flag() {
    let (_dir, manifest) = manifest_with(serde_json::json!({
        "version": "1.0.0",
        "bscotch": {"versioning": {"stores": [{"path": "a.json"}, {"path": "b.cjs"}]}}
    }));

    let output = run_cli(&manifest, &["list", "--namespace", "bscotch", "--json"]);
    assert!(output.status.success());
    let items: Vec<ListItem> = serde_json::from_value(stdout_json(&output)["stores"].clone()).unwrap();
    let kinds: Vec<&str> = items.iter().map(|i| i.kind.as_str()).collect();
    assert_eq!(kinds, vec!["structured", "module"]);
    assert_eq!(items[1].path, "b.cjs");
    assert!(!items[0].exists);
}

#[test]
fn test_missing_manifest_is_a_helpful_error() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&dir.path().join("nope.json"), &["list", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let value = stdout_json(&output);
    assert!(value["error"]["message"].as_str().unwrap().contains("Cannot read manifest"));
    assert!(!value["error"]["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn test_schema_is_valid_json() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&dir.path().join("unused.json"), &["schema"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert!(value["definitions"]["versionStore"].is_object());
}

#[test]
fn test_config_schema_uses_namespace() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(
        &dir.path().join("unused.json"),
        &["--namespace", "bscotch", "schema", "--config"],
    );
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(
        value["properties"]["bscotch"]["properties"]["versioning"]["$ref"],
        "#/definitions/versioning"
    );
    assert_eq!(value["definitions"]["versioning"]["additionalProperties"], false);
}
