use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sidepipe::errors::{InvocationError, PartialOutput};
use sidepipe::invoke::backend::{InvokeFuture, Invoker};
use sidepipe::invoke::{InvocationRequest, InvocationResult};

/// Canned outcome for one call of [`FakeInvoker`].
///
/// `InvocationError` is not `Clone`, so errors are described here and built
/// fresh on each call.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Success { text: String, binary: Vec<u8> },
    ToolFailure { exit_code: i32, text: String },
    Timeout { text: String },
}

impl FakeOutcome {
    fn into_result(self) -> Result<InvocationResult, InvocationError> {
        match self {
            FakeOutcome::Success { text, binary } => Ok(InvocationResult {
                text,
                binary,
                exit_code: 0,
            }),
            FakeOutcome::ToolFailure { exit_code, text } => Err(InvocationError::ToolFailure {
                exit_code,
                partial: PartialOutput {
                    text,
                    binary: Vec::new(),
                },
            }),
            FakeOutcome::Timeout { text } => Err(InvocationError::TimeoutExceeded {
                elapsed: Duration::from_millis(1),
                stalls: 1,
                pid: None,
                partial: PartialOutput {
                    text,
                    binary: Vec::new(),
                },
            }),
        }
    }
}

/// A fake invoker that:
/// - records every request it was given
/// - replays queued outcomes in order (an empty success once exhausted).
#[derive(Clone, Default)]
pub struct FakeInvoker {
    outcomes: Arc<Mutex<VecDeque<FakeOutcome>>>,
    requests: Arc<Mutex<Vec<InvocationRequest>>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: FakeOutcome) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Invoker for FakeInvoker {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a> {
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FakeOutcome::Success {
                text: String::new(),
                binary: Vec::new(),
            });
        Box::pin(async move { outcome.into_result() })
    }
}
