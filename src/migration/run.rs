//! Batch execution and dry-run planning.
//!
//! Steps run strictly in order because later steps may depend on terms
//! created or renamed by earlier ones. A failed step never stops the batch.
use super::ops::{OperationContext, OperationRegistry};
use super::{MigrationDocument, MigrationOptions, Step, StepResult};
use crate::store::TermStore;
use serde::Serialize;

pub type DocumentHook = Box<dyn Fn(MigrationDocument) -> MigrationDocument>;
/// Receives the step's result, the step, and the steps already executed.
pub type StepHook = Box<dyn Fn(StepResult, &Step, &[Step]) -> StepResult>;
pub type BatchHook = Box<dyn Fn(Vec<Step>) -> Vec<Step>>;

/// Post-processing callbacks. Each hook gets the value produced so far and
/// returns the value to keep; hooks run in registration order.
#[derive(Default)]
pub struct Hooks {
    after_parse: Vec<DocumentHook>,
    after_step: Vec<StepHook>,
    after_batch: Vec<BatchHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after_parse(
        mut self,
        hook: impl Fn(MigrationDocument) -> MigrationDocument + 'static,
    ) -> Self {
        self.after_parse.push(Box::new(hook));
        self
    }

    pub fn after_step(
        mut self,
        hook: impl Fn(StepResult, &Step, &[Step]) -> StepResult + 'static,
    ) -> Self {
        self.after_step.push(Box::new(hook));
        self
    }

    pub fn after_batch(mut self, hook: impl Fn(Vec<Step>) -> Vec<Step> + 'static) -> Self {
        self.after_batch.push(Box::new(hook));
        self
    }

    pub fn apply_parse(&self, document: MigrationDocument) -> MigrationDocument {
        self.after_parse
            .iter()
            .fold(document, |document, hook| hook(document))
    }

    pub fn apply_step(&self, result: StepResult, step: &Step, executed: &[Step]) -> StepResult {
        self.after_step
            .iter()
            .fold(result, |result, hook| hook(result, step, executed))
    }

    pub fn apply_batch(&self, steps: Vec<Step>) -> Vec<Step> {
        self.after_batch.iter().fold(steps, |steps, hook| hook(steps))
    }
}

/// What a dry run reports for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `None` when no operation is registered for the step's type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Runs every step of a document against a store.
pub struct BatchRunner<'a> {
    registry: &'a OperationRegistry,
    hooks: &'a Hooks,
    options: MigrationOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(registry: &'a OperationRegistry, hooks: &'a Hooks, options: MigrationOptions) -> Self {
        Self {
            registry,
            hooks,
            options,
        }
    }

    /// Execute the steps in order and attach each result to its step.
    pub fn run(&self, document: MigrationDocument, store: &mut dyn TermStore) -> MigrationDocument {
        let MigrationDocument { steps, extra } = document;
        let total = steps.len();
        let mut executed = Vec::with_capacity(total);

        for (index, mut step) in steps.into_iter().enumerate() {
            let mut ctx = OperationContext {
                store: &mut *store,
                options: &self.options,
            };
            let result = self.registry.execute(&step, &mut ctx);
            let result = self.hooks.apply_step(result, &step, &executed);
            log_outcome(index, total, &step, &result);
            step.result = Some(result);
            executed.push(step);
        }

        MigrationDocument {
            steps: self.hooks.apply_batch(executed),
            extra,
        }
    }

    /// Describe each step without touching any store.
    pub fn plan(&self, document: &MigrationDocument) -> Vec<PlannedAction> {
        document
            .steps
            .iter()
            .map(|step| PlannedAction {
                id: step.id.clone(),
                kind: step.kind.clone(),
                description: self.registry.describe(step),
            })
            .collect()
    }
}

fn log_outcome(index: usize, total: usize, step: &Step, result: &StepResult) {
    let position = index + 1;
    let kind = step.kind.as_deref().unwrap_or("<none>");
    if result.success {
        tracing::info!(step = %step.id, kind, position, total, "step succeeded");
    } else if let Some(code) = result.error_code.as_deref() {
        tracing::info!(
            step = %step.id,
            kind,
            position,
            total,
            code,
            message = result.error_message.as_deref().unwrap_or_default(),
            "step failed"
        );
    } else {
        tracing::info!(step = %step.id, kind, position, total, "step skipped");
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
