// src/invoke/mod.rs

//! Single-shot tool invocation engine.
//!
//! One call spawns one child, feeds it `input` on stdin and collects two
//! independent output streams: the text channel (stdout) and a binary side
//! channel the child reaches through a `/dev/fd/<n>` path substituted into
//! its argv.
//!
//! - [`launcher`] creates the pipes and spawns the child.
//! - [`process`] owns the child and the parent's pipe ends.
//! - [`multiplex`] runs the readiness loop.
//! - [`watchdog`] decides when a child is hung or over its runtime.
//! - [`classify`] and [`assemble`] turn the end state into a result.
//! - [`backend`] provides the `Invoker` seam used by the CLI and by tests.

pub mod assemble;
pub mod backend;
pub mod channel;
pub mod classify;
pub mod launcher;
pub mod multiplex;
pub mod process;
pub mod request;
pub mod watchdog;

use tracing::{error, info, warn};

use crate::errors::InvocationError;
use crate::invoke::classify::Classification;
use crate::invoke::multiplex::{LoopExit, MultiplexState};
use crate::invoke::watchdog::Watchdog;

pub use backend::{Invoker, ProcessInvoker};
pub use channel::ChannelBuffer;
pub use request::{EngineOptions, InvocationRequest, InvocationResult};

/// Run `request` with default [`EngineOptions`].
pub async fn invoke(request: &InvocationRequest) -> Result<InvocationResult, InvocationError> {
    invoke_with(request, &EngineOptions::default()).await
}

/// Run `request` to completion.
///
/// Whatever happens inside the readiness loop, the child is reaped (or
/// terminated and reaped) and every descriptor is closed before this
/// returns.
pub async fn invoke_with(
    request: &InvocationRequest,
    options: &EngineOptions,
) -> Result<InvocationResult, InvocationError> {
    let mut handle = launcher::launch(request)?;
    let pid = handle.pid();
    let mut watchdog = Watchdog::new(request.timeout(), request.max_runtime());
    let mut state = MultiplexState::new(request.input(), options.read_chunk);

    let looped = multiplex::run(&mut handle, &mut state, &mut watchdog, options).await;

    let reaped = match &looped {
        Ok(LoopExit::Drained) => handle.reap(options.reap_limit).await,
        Ok(LoopExit::TimedOut) => handle.terminate(options.kill_grace, options.reap_limit).await,
        Err(e) => {
            warn!(pid, error = %e, "transfer failed; terminating tool process");
            handle.terminate(options.kill_grace, options.reap_limit).await
        }
    };
    handle.close_all();
    drop(handle);

    let unsent = state.remaining_input();
    let iterations = state.iterations();
    let (text, binary) = state.into_buffers();

    let status = match reaped {
        Ok(status) => status,
        Err(source) => {
            error!(pid, error = %source, "failed to clean up tool process");
            return Err(InvocationError::CleanupFailure {
                pid,
                source,
                partial: assemble::partial(text.as_bytes(), binary.into_bytes()),
            });
        }
    };

    if let Err(source) = looped {
        return Err(InvocationError::Io {
            source,
            partial: assemble::partial(text.as_bytes(), binary.into_bytes()),
        });
    }

    let exit_code = classify::exit_code(&status);
    info!(
        program = %request.program(),
        pid,
        exit_code,
        text_bytes = text.len(),
        binary_bytes = binary.len(),
        unsent,
        iterations,
        elapsed = ?watchdog.elapsed(),
        "tool invocation finished"
    );

    match classify::classify(Some(exit_code), watchdog.fired().is_some()) {
        Classification::Success => Ok(assemble::assemble(
            text.as_bytes(),
            binary.into_bytes(),
            exit_code,
        )),
        Classification::ToolFailure { exit_code } => Err(InvocationError::ToolFailure {
            exit_code,
            partial: assemble::partial(text.as_bytes(), binary.into_bytes()),
        }),
        Classification::TimeoutExceeded => Err(InvocationError::TimeoutExceeded {
            elapsed: watchdog.elapsed(),
            stalls: watchdog.stalls(),
            pid,
            partial: assemble::partial(text.as_bytes(), binary.into_bytes()),
        }),
        // Spawn failures return from `launch` above, before any exit code exists.
        Classification::SpawnError => unreachable!("classified a reaped child as never started"),
    }
}
