//! Binary-level tests for the formstate CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const POSTS: &str = r#"
slug: posts
label: Posts
fields:
  - name: title
    type: text
    validate: required
  - name: layout
    type: blocks
    blocks:
      - slug: hero
        fields:
          - name: heading
            type: text
"#;

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let collections = tmp.path().join("fields").join("collections");
    std::fs::create_dir_all(&collections).unwrap();
    std::fs::write(collections.join("posts.yaml"), POSTS).unwrap();
    tmp
}

fn formstate(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("formstate").unwrap();
    cmd.current_dir(tmp.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_materialize_outputs_json_state() {
    let tmp = workspace();
    std::fs::write(
        tmp.path().join("post.json"),
        r#"{"layout": [{"blockType": "hero", "heading": "Hi"}, {"blockType": "removedBlock"}]}"#,
    )
    .unwrap();

    let output = formstate(&tmp)
        .args([
            "materialize",
            "--fields",
            "fields",
            "--collection",
            "posts",
            "--document",
            "post.json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["title"]["errorMessage"], "This field is required.");
    assert_eq!(state["layout"]["value"], 1);
    assert_eq!(state["layout.0.heading"]["value"], "Hi");
}

#[test]
fn test_collections_lists_slugs() {
    let tmp = workspace();
    formstate(&tmp)
        .args(["collections", "--fields", "fields"])
        .assert()
        .success()
        .stdout(predicate::str::contains("posts\tPosts"));
}

#[test]
fn test_unknown_collection_exits_with_error() {
    let tmp = workspace();
    std::fs::write(tmp.path().join("doc.json"), "{}").unwrap();
    formstate(&tmp)
        .args([
            "materialize",
            "--fields",
            "fields",
            "--collection",
            "pages",
            "--document",
            "doc.json",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pages"));
}
