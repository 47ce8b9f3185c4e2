//! Executor is the per-`RemedyType` capability set (§4.9), and [`Registry`] is the process-local
//! table C9 dispatches a Finding through.
//!
//! The registry is global mutable state, read-write-locked and initialized once at program
//! start, left immutable afterwards in production code paths — the shape §9 "Design notes"
//! calls for ("Remedy registry"). Tests build their own, injected [`Registry`] rather than
//! mutating a shared global.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use kubescout_core::ccve::{Finding, RemedyType};

use crate::options::{ExecuteOptions, RemedyResult};
use crate::plan::Plan;
use crate::{Error, Result};

/// BoxFuture is the boxed-future shape used throughout this trait, mirroring the teacher's own
/// `ControllerFuture` typedef for trait objects that need to return `async fn` results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Executor is the capability set §4.9 assigns to each `RemedyType`: `Type`, `CanExecute`,
/// `DryRun`, `Execute`.
pub trait Executor: Send + Sync {
    /// Type is the `RemedyType` this executor handles.
    fn remedy_type(&self) -> RemedyType;

    /// Can_execute reports whether this executor is able to act on `finding` at all (e.g. it
    /// declines findings with no commands, or a resource kind it doesn't know how to touch).
    fn can_execute(&self, finding: &Finding) -> bool;

    /// Dry_run produces a [`Plan`] without mutating the cluster (Testable Property 10).
    fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan>;

    /// Execute runs (or, if `options.dry_run`, harmlessly simulates) the remedy.
    fn execute<'a>(&'a self, finding: &'a Finding, options: &'a ExecuteOptions) -> BoxFuture<'a, RemedyResult>;
}

/// Registry is the process-local `RemedyType -> Executor` table (§5 "Shared-resource policy").
#[derive(Default)]
pub struct Registry {
    executors: HashMap<RemedyType, Box<dyn Executor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register installs `executor`, keyed by its own [`Executor::remedy_type`]. Registering a
    /// second executor for the same type replaces the first — callers own startup ordering.
    pub fn register(&mut self, executor: Box<dyn Executor>) {
        self.executors.insert(executor.remedy_type(), executor);
    }

    /// Executor_for returns the executor for `finding.remedy_type`, provided one is registered
    /// AND its `CanExecute` accepts the finding (§4.9 "Registry"). Otherwise a typed error
    /// (`executor_missing`/`executor_refused`, §7).
    pub fn executor_for(&self, finding: &Finding) -> Result<&dyn Executor> {
        let executor = self
            .executors
            .get(&finding.remedy_type)
            .ok_or(Error::ExecutorMissing(finding.remedy_type))?;
        if !executor.can_execute(finding) {
            return Err(Error::ExecutorRefused(finding.remedy_type));
        }
        Ok(executor.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::finding;
    use kubescout_core::ccve::RemedyType;

    struct Noop(RemedyType, bool);
    impl Executor for Noop {
        fn remedy_type(&self) -> RemedyType {
            self.0
        }
        fn can_execute(&self, _finding: &Finding) -> bool {
            self.1
        }
        fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan> {
            let finding = finding.clone();
            Box::pin(async move {
                Ok(Plan {
                    finding,
                    actions: Vec::new(),
                    reversible: true,
                    risk: crate::plan::RiskLevel::Low,
                })
            })
        }
        fn execute<'a>(&'a self, _finding: &'a Finding, _options: &'a ExecuteOptions) -> BoxFuture<'a, RemedyResult> {
            Box::pin(async move {
                Ok(RemedyResult { success: true, actions: Vec::new(), message: String::new(), rollback_cmd: None })
            })
        }
    }

    #[test]
    fn missing_executor_is_a_typed_error() {
        let registry = Registry::new();
        let f = finding(RemedyType::ConfigFix);
        assert!(matches!(registry.executor_for(&f), Err(Error::ExecutorMissing(_))));
    }

    #[test]
    fn refusing_executor_is_a_typed_error() {
        let mut registry = Registry::new();
        registry.register(Box::new(Noop(RemedyType::ConfigFix, false)));
        let f = finding(RemedyType::ConfigFix);
        assert!(matches!(registry.executor_for(&f), Err(Error::ExecutorRefused(_))));
    }

    #[test]
    fn accepting_executor_is_returned() {
        let mut registry = Registry::new();
        registry.register(Box::new(Noop(RemedyType::ConfigFix, true)));
        let f = finding(RemedyType::ConfigFix);
        assert!(registry.executor_for(&f).is_ok());
    }
}
