use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reader_build(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reader-build").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("NODE_ENV")
        .env_remove("DOCKER")
        .env_remove("ANALYZE")
        .env_remove("RUST_LOG");
    cmd
}

const MANIFEST: &str = r#"{
  "entries": {
    "index": "src/pages/index.tsx",
    "book": "src/pages/book.tsx"
  },
  "modules": [
    { "id": "src/pages/index.tsx", "size": 30000, "imports": [
        { "id": "node_modules/react/index.js" },
        { "id": "src/utils/theme.ts" },
        { "id": "node_modules/left-pad/index.js", "dynamic": true }
    ] },
    { "id": "src/pages/book.tsx", "size": 30000, "imports": [
        { "id": "node_modules/react/index.js" },
        { "id": "src/utils/theme.ts" }
    ] },
    { "id": "node_modules/react/index.js", "size": 8000 },
    { "id": "node_modules/left-pad/index.js", "size": 12000 },
    { "id": "src/utils/theme.ts", "size": 24000 }
  ]
}"#;

#[test]
fn config_defaults_to_production() {
    let dir = TempDir::new().unwrap();

    let output = reader_build(&dir).args(["config", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["target"], "production");
    assert_eq!(value["config"]["applied_stages"][3], "monitoring");
    assert_eq!(value["config"]["monitoring"]["silent"], true);
    assert_eq!(value["config"]["i18n"]["default_locale"], "en-US");
    assert!(value["config"].get("output").is_none());
}

#[test]
fn development_beats_docker() {
    let dir = TempDir::new().unwrap();

    reader_build(&dir)
        .env("NODE_ENV", "development")
        .env("DOCKER", "1")
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""target": "development""#))
        .stdout(predicate::str::contains("monitoring").not());
}

#[test]
fn docker_selects_standalone_output() {
    let dir = TempDir::new().unwrap();

    reader_build(&dir)
        .env("DOCKER", "true")
        .env("ANALYZE", "true")
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""output": "standalone""#))
        .stdout(predicate::str::contains("output_file_tracing_root"));
}

#[test]
fn project_file_is_applied() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("reader.toml"), "[plugins]\npwa_dest = \"static\"\n").unwrap();

    reader_build(&dir)
        .args(["config", "--target", "development", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""dest": "static""#));
}

#[test]
fn invalid_project_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("reader.toml"),
        "[i18n]\nlocales = [\"en-US\"]\ndefault_locale = \"ja-JP\"\n",
    )
    .unwrap();

    reader_build(&dir)
        .args(["config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ja-JP"));
}

#[test]
fn split_assigns_chunks() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("graph.json"), MANIFEST).unwrap();

    let output = reader_build(&dir)
        .args(["split", "graph.json", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let assignments = &value["plan"]["assignments"];
    assert_eq!(assignments["node_modules/react/index.js"], "framework");
    assert_eq!(assignments["node_modules/left-pad/index.js"], "lib-index");
    assert_eq!(assignments["src/utils/theme.ts"], "commons");
    assert_eq!(assignments["src/pages/index.tsx"], "index");
    assert_eq!(assignments["src/pages/book.tsx"], "book");

    let chunks = value["plan"]["chunks"].as_array().unwrap();
    assert_eq!(chunks.last().unwrap()["name"], "runtime");
    assert_eq!(value["report"]["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn split_human_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("graph.json"), MANIFEST).unwrap();

    reader_build(&dir)
        .args(["split", "graph.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lib-index"))
        .stdout(predicate::str::contains("framework"));
}

#[test]
fn split_missing_manifest_fails() {
    let dir = TempDir::new().unwrap();

    reader_build(&dir)
        .args(["split", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}
