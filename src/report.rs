//! Human and JSON rendering of executed batches and dry-run plans.
use crate::migration::{MigrationDocument, PlannedAction, Step};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Step counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub fn summarize(document: &MigrationDocument) -> BatchSummary {
    let mut summary = BatchSummary {
        total: document.steps.len(),
        ..BatchSummary::default()
    };
    for step in &document.steps {
        match &step.result {
            Some(result) if result.success => summary.succeeded += 1,
            Some(result) if result.error_code.is_some() => summary.failed += 1,
            _ => summary.skipped += 1,
        }
    }
    summary
}

/// One line per executed step.
pub fn step_line(step: &Step) -> String {
    let kind = step.kind.as_deref().unwrap_or("<none>");
    let outcome = match &step.result {
        None => "not run".to_string(),
        Some(result) if result.success => match (&result.affected_ids, result.entity_id) {
            (Some(affected), _) => {
                let failed = affected.values().filter(|moved| !**moved).count();
                if failed == 0 {
                    format!("ok ({} items)", affected.len())
                } else {
                    format!("ok ({} items, {failed} failed)", affected.len())
                }
            }
            (None, Some(id)) => format!("ok (term {id})"),
            (None, None) => "ok".to_string(),
        },
        Some(result) => match result.error_code.as_deref() {
            Some(code) => format!(
                "failed {code}: {}",
                result.error_message.as_deref().unwrap_or_default()
            ),
            None => "skipped".to_string(),
        },
    };
    format!("[{}] {kind}: {outcome}", step.id)
}

pub fn plan_line(action: &PlannedAction) -> String {
    match (&action.kind, &action.description) {
        (_, Some(description)) => format!("[{}] {description}", action.id),
        (Some(kind), None) => format!("[{}] {kind}: no operation registered", action.id),
        (None, None) => format!("[{}] <none>: step has no type", action.id),
    }
}

pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{} steps: {} succeeded, {} failed, {} skipped",
        summary.total, summary.succeeded, summary.failed, summary.skipped
    )
}

pub fn render_run(document: &MigrationDocument) -> String {
    let mut out = String::new();
    for step in &document.steps {
        out.push_str(&step_line(step));
        out.push('\n');
    }
    out.push_str(&summary_line(&summarize(document)));
    out.push('\n');
    out
}

pub fn render_plan(plan: &[PlannedAction]) -> String {
    let mut out = String::new();
    out.push_str(&format!("dry run: {} steps planned, nothing applied\n", plan.len()));
    for action in plan {
        out.push_str(&plan_line(action));
        out.push('\n');
    }
    out
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize report JSON")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{parse_content, StepResult};
    use std::collections::BTreeMap;

    fn executed() -> MigrationDocument {
        let mut document = parse_content(
            br#"[
                {"type": "create"},
                {"type": "update"},
                {"type": "reassign"},
                {"type": "archive"}
            ]"#,
        )
        .expect("parse");
        document.steps[0].result = Some(StepResult::succeeded(Some(4)));
        document.steps[1].result = Some(StepResult::failed("invalid-slug", "Term x does not exist"));
        document.steps[2].result = Some(StepResult {
            affected_ids: Some(BTreeMap::from([(1, true), (2, false)])),
            ..StepResult::succeeded(None)
        });
        document.steps[3].result = Some(StepResult::default());
        document
    }

    #[test]
    fn step_lines_cover_each_outcome() {
        let document = executed();
        let lines: Vec<String> = document.steps.iter().map(step_line).collect();
        assert_eq!(
            lines,
            vec![
                "[000000-step] create: ok (term 4)",
                "[000001-step] update: failed invalid-slug: Term x does not exist",
                "[000002-step] reassign: ok (2 items, 1 failed)",
                "[000003-step] archive: skipped",
            ]
        );
    }

    #[test]
    fn summary_counts_skips_separately() {
        let summary = summarize(&executed());
        assert_eq!(
            summary,
            BatchSummary {
                total: 4,
                succeeded: 2,
                failed: 1,
                skipped: 1,
            }
        );
        assert!(render_run(&executed()).ends_with("4 steps: 2 succeeded, 1 failed, 1 skipped\n"));
    }

    #[test]
    fn plan_lines_flag_unregistered_types() {
        let action = PlannedAction {
            id: "x".to_string(),
            kind: Some("archive".to_string()),
            description: None,
        };
        assert_eq!(plan_line(&action), "[x] archive: no operation registered");
    }
}
