// src/invoke/backend.rs

//! Pluggable invocation backend.
//!
//! The CLI runner talks to an [`Invoker`] instead of calling
//! [`invoke_with`](super::invoke_with) directly, so tests can substitute a
//! fake that returns canned results without spawning anything.

use std::future::Future;
use std::pin::Pin;

use crate::errors::InvocationError;
use crate::invoke::request::{EngineOptions, InvocationRequest, InvocationResult};

/// Boxed future returned by [`Invoker::invoke`].
pub type InvokeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<InvocationResult, InvocationError>> + Send + 'a>>;

/// Trait abstracting how a request is executed.
pub trait Invoker: Send + Sync {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a>;
}

/// Production backend: spawns a real child process per request.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    options: EngineOptions,
}

impl ProcessInvoker {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

impl Invoker for ProcessInvoker {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a> {
        Box::pin(super::invoke_with(request, &self.options))
    }
}
