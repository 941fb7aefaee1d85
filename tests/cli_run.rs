//! End-to-end runs of the `tmig` binary against a scratch store.

mod common;

use common::{stderr, stdout, Workspace};

const REORG: &str = r#"{
  "name": "local news reorg",
  "steps": [
    { "type": "create", "create": { "taxonomy": "category", "name": "Local News" } },
    { "id": "austin", "type": "create", "taxonomy": "category", "name": "Austin News", "parent": "local-news" },
    { "type": "update", "slug": "missing", "taxonomy": "category", "name": "Nope" },
    { "type": "update", "slug": "austin-news", "taxonomy": "category", "description": "ATX" }
  ]
}"#;

#[test]
fn run_prints_one_line_per_step_and_continues_after_failures() {
    let ws = Workspace::new();
    ws.write("reorg.json", REORG);
    let store = ws.store_path();

    let output = ws.tmig(&["run", "reorg.json", "--store", store.to_str().expect("utf8")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[000000-step] create: ok (term 1)",
            "[austin] create: ok (term 2)",
            "[000002-step] update: failed invalid-slug: Term missing does not exist in category",
            "[000003-step] update: ok (term 2)",
            "4 steps: 3 succeeded, 1 failed, 0 skipped",
        ]
    );

    let snapshot = ws.read_json(&store);
    assert_eq!(snapshot["terms"]["2"]["parent"], 1);
    assert_eq!(snapshot["terms"]["2"]["description"], "ATX");
}

#[test]
fn dry_run_reports_plan_and_writes_nothing() {
    let ws = Workspace::new();
    ws.write("reorg.json", REORG);
    let store = ws.store_path();

    let output = ws.tmig(&[
        "run",
        "reorg.json",
        "--dry-run",
        "--store",
        store.to_str().expect("utf8"),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("dry run: 4 steps planned, nothing applied"));
    assert!(text.contains("[austin] create category term \"Austin News\" under local-news"));
    assert!(!store.exists());
}

#[test]
fn out_writes_annotated_document() {
    let ws = Workspace::new();
    ws.write("reorg.json", REORG);
    let store = ws.store_path();
    let report = ws.path("reports/reorg.out.json");

    let output = ws.tmig(&[
        "run",
        "reorg.json",
        "--store",
        store.to_str().expect("utf8"),
        "--out",
        report.to_str().expect("utf8"),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let annotated = ws.read_json(&report);
    assert_eq!(annotated["name"], "local news reorg");
    assert_eq!(annotated["steps"][0]["id"], "000000-step");
    assert_eq!(annotated["steps"][0]["result"]["success"], true);
    assert_eq!(annotated["steps"][0]["result"]["entity_id"], 1);
    assert_eq!(annotated["steps"][2]["result"]["error_code"], "invalid-slug");
    assert!(annotated["steps"][2]["result"].get("entity_id").is_none());
}

#[test]
fn parse_errors_halt_with_failure_status() {
    let ws = Workspace::new();
    ws.write("empty.json", "");
    ws.write("broken.json", "{\"steps\": [");
    let store = ws.store_path();
    let store = store.to_str().expect("utf8");

    for (file, code) in [
        ("missing.json", "file-not-found"),
        ("empty.json", "file-empty"),
        ("broken.json", "malformed-json"),
    ] {
        let output = ws.tmig(&["run", file, "--store", store]);
        assert!(!output.status.success(), "{file} should fail");
        assert!(
            stderr(&output).contains(code),
            "{file}: expected {code} in {}",
            stderr(&output)
        );
        assert!(stdout(&output).is_empty());
    }
    assert!(!ws.store_path().exists());
}

#[test]
fn config_file_and_flags_control_parent_policy() {
    let ws = Workspace::new();
    ws.write(
        "term-migration.json",
        r#"{"schema_version": 1, "store_path": "from-config.json"}"#,
    );
    ws.write(
        "orphan.json",
        r#"[{"type": "create", "taxonomy": "category", "name": "Orphan", "parent": "ghost"}]"#,
    );

    let output = ws.tmig(&["run", "orphan.json", "--strict-parents"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("failed invalid-parent"));

    let output = ws.tmig(&["run", "orphan.json"]);
    assert!(stdout(&output).contains("[000000-step] create: ok (term 1)"));
    let snapshot = ws.read_json(&ws.path("from-config.json"));
    assert_eq!(snapshot["terms"]["1"]["parent"], 0);
}

#[test]
fn fixtures_then_reassign_then_cleanup() {
    let ws = Workspace::new();
    let store = ws.store_path();
    let store = store.to_str().expect("utf8");

    let output = ws.tmig(&["fixtures", "create", "--count", "2", "--store", store]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "created 3 fixture terms and 2 fixture posts"
    );

    ws.write(
        "merge.json",
        r#"{"steps": [{"type": "reassign", "taxonomy": "category", "content_type": "post",
            "from_slug": "fixture-term-1", "to_slug": "fixture-term-2"}]}"#,
    );
    let output = ws.tmig(&["run", "merge.json", "--store", store, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let annotated: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json");
    let affected = &annotated["steps"][0]["result"]["affected_ids"];
    assert_eq!(affected.as_object().map(|map| map.len()), Some(1));
    assert_eq!(affected["1"], true);

    let output = ws.tmig(&["fixtures", "create", "--cleanup", "--store", store]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let snapshot = ws.read_json(&ws.store_path());
    assert_eq!(snapshot["terms"].as_object().map(|map| map.len()), Some(0));
    assert_eq!(snapshot["content"].as_object().map(|map| map.len()), Some(0));
}

#[test]
fn init_writes_default_config() {
    let ws = Workspace::new();
    let output = ws.tmig(&["init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let config = ws.read_json(&ws.path("term-migration.json"));
    assert_eq!(config["schema_version"], 1);
    assert_eq!(config["parent_policy"], "drop");
    assert_eq!(config["invalidate_cache"], true);

    let output = ws.tmig(&["init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("use --force to overwrite"));
}
