//! Ordered execution of maintenance steps.
//!
//! Steps run strictly in declaration order, one at a time. A failing
//! [`Severity::Fatal`] step aborts the run and marks everything after it
//! [`StepState::Aborted`]; a failing [`Severity::Warn`] step is recorded and
//! the run continues.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

use crate::accounting::ByteAccounting;
use crate::common::errors::MaintenanceError;
use crate::gate::RebootStatus;

/// Failure policy of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure aborts the whole run
    Fatal,
    /// Failure is reported and the run continues
    Warn,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Warn => write!(f, "warn"),
        }
    }
}

/// What a step does, which decides the exit code when it aborts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    Query,
    Upgrade,
    Install,
    Cleanup,
}

impl StepCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            StepCategory::Query => 2,
            StepCategory::Upgrade => 3,
            StepCategory::Install => 4,
            StepCategory::Cleanup => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    WarnFailed,
    FatalFailed,
    Aborted,
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Running => write!(f, "running"),
            StepState::Succeeded => write!(f, "succeeded"),
            StepState::WarnFailed => write!(f, "warn_failed"),
            StepState::FatalFailed => write!(f, "fatal_failed"),
            StepState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Body of a step: mutates external state, optionally returns a freed-bytes delta
pub type StepAction<'a, C> = Box<dyn FnMut(&mut C) -> anyhow::Result<Option<i64>> + 'a>;

/// One unit of a maintenance plan
pub struct Step<'a, C> {
    pub name: String,
    pub severity: Severity,
    pub category: StepCategory,
    action: StepAction<'a, C>,
}

impl<C> std::fmt::Debug for Step<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl<'a, C> Step<'a, C> {
    pub fn new<F>(name: impl Into<String>, severity: Severity, category: StepCategory, action: F) -> Self
    where
        F: FnMut(&mut C) -> anyhow::Result<Option<i64>> + 'a,
    {
        Self {
            name: name.into(),
            severity,
            category,
            action: Box::new(action),
        }
    }

    pub fn fatal<F>(name: impl Into<String>, category: StepCategory, action: F) -> Self
    where
        F: FnMut(&mut C) -> anyhow::Result<Option<i64>> + 'a,
    {
        Self::new(name, Severity::Fatal, category, action)
    }

    pub fn warn<F>(name: impl Into<String>, category: StepCategory, action: F) -> Self
    where
        F: FnMut(&mut C) -> anyhow::Result<Option<i64>> + 'a,
    {
        Self::new(name, Severity::Warn, category, action)
    }
}

/// Result of executing (or not executing) one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub state: StepState,
    pub severity: Severity,
    /// Bytes counted towards the run total, when the step measures any
    pub freed_bytes: Option<u64>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == StepState::Succeeded
    }

    fn aborted(severity: Severity) -> Self {
        Self {
            state: StepState::Aborted,
            severity,
            freed_bytes: None,
            error: None,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
}

/// Everything observed during one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total_freed_bytes: u64,
    pub steps: Vec<StepRecord>,
    pub reboot_required: bool,
    pub reboot: RebootStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            total_freed_bytes: 0,
            steps: Vec::new(),
            reboot_required: false,
            reboot: RebootStatus::NotRequired,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Steps that failed without aborting the run
    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| s.outcome.state == StepState::WarnFailed)
    }

    pub fn count(&self, state: StepState) -> usize {
        self.steps.iter().filter(|s| s.outcome.state == state).count()
    }

    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.outcome)
    }
}

/// A fatal step failure, carrying the partial report for diagnostics
#[derive(Debug, Error)]
#[error("Run aborted: {source}")]
pub struct RunAborted {
    pub step: String,
    pub category: StepCategory,
    pub message: String,
    /// Always [`MaintenanceError::StepExecution`]
    pub source: MaintenanceError,
    pub report: Box<RunReport>,
}

impl RunAborted {
    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }
}

/// Receives step progress as it happens
pub trait RunObserver {
    fn on_step_started(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn on_step_finished(&mut self, _name: &str, _outcome: &StepOutcome) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Executes steps in order and accumulates freed space
pub struct StepRunner<'o> {
    observer: &'o mut dyn RunObserver,
}

impl std::fmt::Debug for StepRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner").finish_non_exhaustive()
    }
}

impl<'o> StepRunner<'o> {
    pub fn new(observer: &'o mut dyn RunObserver) -> Self {
        Self { observer }
    }

    /// Run every step against `ctx`.
    ///
    /// Returns the completed report, or [`RunAborted`] with the partial
    /// report when a fatal step fails.
    pub fn run<C>(&mut self, steps: Vec<Step<'_, C>>, ctx: &mut C) -> Result<RunReport, RunAborted> {
        let mut report = RunReport::new();
        let mut bytes = ByteAccounting::new();
        let total = steps.len();
        let mut steps = steps.into_iter().enumerate();

        while let Some((index, mut step)) = steps.next() {
            self.observer.on_step_started(index, total, &step.name);
            tracing::info!(step = %step.name, "running step {}/{}", index + 1, total);

            let started = Instant::now();
            let result = (step.action)(ctx);
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(delta) => {
                    let freed_bytes = delta.map(|d| bytes.add(d));
                    tracing::info!(step = %step.name, freed = ?freed_bytes, "step succeeded");
                    StepOutcome {
                        state: StepState::Succeeded,
                        severity: step.severity,
                        freed_bytes,
                        error: None,
                        duration_ms,
                    }
                }
                Err(err) => {
                    let message = format!("{:#}", err);
                    let fatal = step.severity == Severity::Fatal || always_fatal(&err);
                    if fatal {
                        tracing::error!(step = %step.name, error = %message, "fatal step failed");
                    } else {
                        tracing::warn!(step = %step.name, error = %message, "step failed, continuing");
                    }
                    StepOutcome {
                        state: if fatal {
                            StepState::FatalFailed
                        } else {
                            StepState::WarnFailed
                        },
                        severity: step.severity,
                        freed_bytes: None,
                        error: Some(message),
                        duration_ms,
                    }
                }
            };

            self.observer.on_step_finished(&step.name, &outcome);
            let fatal = outcome.state == StepState::FatalFailed;
            let message = outcome.error.clone().unwrap_or_default();
            report.steps.push(StepRecord {
                name: step.name.clone(),
                outcome,
            });

            if fatal {
                for (_, rest) in steps.by_ref() {
                    let outcome = StepOutcome::aborted(rest.severity);
                    self.observer.on_step_finished(&rest.name, &outcome);
                    report.steps.push(StepRecord {
                        name: rest.name,
                        outcome,
                    });
                }
                report.total_freed_bytes = bytes.total();
                report.finished_at = Some(Utc::now());
                let source = MaintenanceError::StepExecution {
                    step: step.name.clone(),
                    severity: step.severity,
                    message: message.clone(),
                };
                return Err(RunAborted {
                    step: step.name,
                    category: step.category,
                    message,
                    source,
                    report: Box::new(report),
                });
            }
        }

        report.total_freed_bytes = bytes.total();
        report.finished_at = Some(Utc::now());
        Ok(report)
    }
}

fn always_fatal(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<MaintenanceError>())
        .any(MaintenanceError::is_always_fatal)
}
