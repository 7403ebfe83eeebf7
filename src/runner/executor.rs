use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::models::{Operation, OperationStateEnum};

/// Single-operation execution contract. Implementations must be synchronous
/// from the runner's point of view and must never raise for ordinary
/// operation failure — failures are reported through the return value.
pub trait Executor {
    fn execute(
        &self,
        operation: &Operation,
        host: Option<&str>,
        extra_vars: Option<&Value>,
    ) -> (OperationStateEnum, Vec<u8>);
}

/// Runs the executor behind `catch_unwind`, converting a panic into a
/// FAILURE with the panic payload captured as logs. Noop operations never
/// reach this path; the runner synthesizes SUCCESS for those directly.
pub fn run_guarded(
    executor: &dyn Executor,
    operation: &Operation,
    host: Option<&str>,
    extra_vars: Option<&Value>,
) -> (OperationStateEnum, Vec<u8>) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(operation, host, extra_vars)));
    match result {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "executor panicked".to_string());
            (OperationStateEnum::Failure, message.into_bytes())
        }
    }
}

/// Test double: every operation succeeds.
pub struct AlwaysSucceedExecutor;

impl Executor for AlwaysSucceedExecutor {
    fn execute(&self, _operation: &Operation, _host: Option<&str>, _extra_vars: Option<&Value>) -> (OperationStateEnum, Vec<u8>) {
        (OperationStateEnum::Success, Vec::new())
    }
}

/// Test double: succeeds once, fails every call after that.
pub struct FailAfterFirstExecutor {
    called: std::sync::atomic::AtomicBool,
}

impl FailAfterFirstExecutor {
    pub fn new() -> Self {
        Self {
            called: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

impl Default for FailAfterFirstExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for FailAfterFirstExecutor {
    fn execute(&self, _operation: &Operation, _host: Option<&str>, _extra_vars: Option<&Value>) -> (OperationStateEnum, Vec<u8>) {
        let already_called = self.called.swap(true, std::sync::atomic::Ordering::SeqCst);
        if already_called {
            (OperationStateEnum::Failure, b"mock failure".to_vec())
        } else {
            (OperationStateEnum::Success, Vec::new())
        }
    }
}
