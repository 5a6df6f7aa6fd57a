// src/invoke/multiplex.rs

//! Readiness loop feeding the child's stdin while draining its stdout and
//! side channel.
//!
//! Each iteration waits for the first of: stdin writable, stdout readable,
//! side channel readable, child exit, or the watchdog's wait budget. Then it
//! runs one non-blocking service pass over *all* descriptors, writing before
//! reading, regardless of which one woke the loop. Writing everything first
//! and reading afterwards would deadlock as soon as both pipe buffers fill.

use std::future::pending;
use std::io;
use std::process::ExitStatus;

use tokio::net::unix::pipe;
use tokio::process::Child;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

use crate::invoke::channel::ChannelBuffer;
use crate::invoke::process::ProcessHandle;
use crate::invoke::request::EngineOptions;
use crate::invoke::watchdog::Watchdog;

/// Reads per channel per service pass, so a chatty channel cannot starve
/// the writer or the other channel.
const MAX_READS_PER_PASS: usize = 16;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// All data transferred and the child reaped.
    Drained,
    /// The watchdog fired; the child still needs terminating.
    TimedOut,
}

/// Working state of the loop: unsent input and both output buffers.
#[derive(Debug)]
pub struct MultiplexState<'a> {
    remaining: &'a [u8],
    pub(crate) text: ChannelBuffer,
    pub(crate) binary: ChannelBuffer,
    scratch: Vec<u8>,
    progress: bool,
    iterations: u64,
}

impl<'a> MultiplexState<'a> {
    pub fn new(input: &'a [u8], read_chunk: usize) -> Self {
        Self {
            remaining: input,
            text: ChannelBuffer::new("text"),
            binary: ChannelBuffer::new("binary"),
            scratch: vec![0; read_chunk.max(1)],
            progress: false,
            iterations: 0,
        }
    }

    pub fn remaining_input(&self) -> usize {
        self.remaining.len()
    }

    pub fn text(&self) -> &ChannelBuffer {
        &self.text
    }

    pub fn binary(&self) -> &ChannelBuffer {
        &self.binary
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Hand both buffers over to the assembler.
    pub fn into_buffers(self) -> (ChannelBuffer, ChannelBuffer) {
        (self.text, self.binary)
    }
}

enum Wake {
    Ready,
    Exited(ExitStatus),
    Tick,
}

/// Drive the transfer until it drains or the watchdog fires.
///
/// On `Ok(LoopExit::Drained)` the child has been reaped. On any other
/// outcome the caller still owns terminating and reaping it.
pub async fn run(
    handle: &mut ProcessHandle,
    state: &mut MultiplexState<'_>,
    watchdog: &mut Watchdog,
    options: &EngineOptions,
) -> io::Result<LoopExit> {
    if state.remaining.is_empty() {
        handle.close_stdin();
    }

    loop {
        state.iterations += 1;
        state.progress = false;

        if let Some(expiry) = watchdog.check() {
            warn!(
                pid = handle.pid,
                ?expiry,
                stalls = watchdog.stalls(),
                unsent = state.remaining.len(),
                text_bytes = state.text.len(),
                binary_bytes = state.binary.len(),
                "watchdog fired"
            );
            return Ok(LoopExit::TimedOut);
        }

        let wait = watchdog.next_wait(options.poll_interval);
        let want_write = handle.stdin.is_some() && !state.remaining.is_empty();

        let wake = tokio::select! {
            res = writable(handle.stdin.as_ref()), if want_write => res.map(|()| Wake::Ready),
            res = readable(handle.stdout.as_ref()), if state.text.is_open() => res.map(|()| Wake::Ready),
            res = readable(handle.side.as_ref()), if state.binary.is_open() => res.map(|()| Wake::Ready),
            res = child_exit(&mut handle.child), if handle.exit_status.is_none() => res.map(Wake::Exited),
            _ = sleep(wait) => Ok(Wake::Tick),
        };

        match wake? {
            Wake::Exited(status) => handle.record_exit(status),
            Wake::Ready => trace!(iteration = state.iterations, "descriptor ready"),
            Wake::Tick => {}
        }

        feed_input(handle, state)?;
        drain_channel(&mut handle.stdout, state, Channel::Text, MAX_READS_PER_PASS)?;
        drain_channel(&mut handle.side, state, Channel::Binary, MAX_READS_PER_PASS)?;

        if state.progress {
            watchdog.record_progress();
        }

        if is_drained(handle, state) {
            debug!(
                pid = handle.pid,
                iterations = state.iterations,
                "all channels drained"
            );
            return Ok(LoopExit::Drained);
        }

        if !state.progress {
            if handle.poll_exit()?.is_some() {
                // Exit does not guarantee EOF has reached us on every
                // platform; take whatever is still buffered.
                final_drain(handle, state)?;
                return Ok(LoopExit::Drained);
            }
            watchdog.record_stall();
        }
    }
}

fn is_drained(handle: &ProcessHandle, state: &MultiplexState<'_>) -> bool {
    handle.stdin.is_none()
        && state.remaining.is_empty()
        && !state.text.is_open()
        && !state.binary.is_open()
        && handle.exit_status.is_some()
}

async fn writable(tx: Option<&pipe::Sender>) -> io::Result<()> {
    match tx {
        Some(tx) => tx.writable().await,
        None => pending().await,
    }
}

async fn readable(rx: Option<&pipe::Receiver>) -> io::Result<()> {
    match rx {
        Some(rx) => rx.readable().await,
        None => pending().await,
    }
}

async fn child_exit(child: &mut Child) -> io::Result<ExitStatus> {
    child.wait().await
}

/// One non-blocking write of everything still unsent.
fn feed_input(handle: &mut ProcessHandle, state: &mut MultiplexState<'_>) -> io::Result<()> {
    let Some(stdin) = handle.stdin.as_ref() else {
        return Ok(());
    };
    if state.remaining.is_empty() {
        handle.close_stdin();
        return Ok(());
    }

    match stdin.try_write(state.remaining) {
        Ok(n) => {
            // The OS may take fewer bytes than offered.
            let rest = state.remaining;
            state.remaining = &rest[n..];
            if n > 0 {
                state.progress = true;
                trace!(bytes = n, unsent = state.remaining.len(), "wrote to tool stdin");
            }
            if state.remaining.is_empty() {
                handle.close_stdin();
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            warn!(
                pid = handle.pid,
                unsent = state.remaining.len(),
                "tool closed its stdin early; discarding unsent input"
            );
            state.remaining = &[];
            handle.close_stdin();
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Text,
    Binary,
}

/// Read bounded chunks from one channel until it would block, reports end
/// of stream, or `max_reads` chunks were taken.
fn drain_channel(
    slot: &mut Option<pipe::Receiver>,
    state: &mut MultiplexState<'_>,
    channel: Channel,
    max_reads: usize,
) -> io::Result<()> {
    let MultiplexState {
        text,
        binary,
        scratch,
        progress,
        ..
    } = state;
    let buffer = match channel {
        Channel::Text => text,
        Channel::Binary => binary,
    };

    for _ in 0..max_reads {
        let Some(rx) = slot.as_ref() else {
            break;
        };
        match rx.try_read(&mut scratch[..]) {
            Ok(0) => {
                buffer.close();
                *slot = None;
                debug!(channel = buffer.name(), total = buffer.len(), "end of stream");
                break;
            }
            Ok(n) => {
                buffer.append(&scratch[..n]);
                *progress = true;
                trace!(channel = buffer.name(), bytes = n, "read from tool");
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Zero-timeout drain of every channel still open, run once after the child
/// has exited.
fn final_drain(handle: &mut ProcessHandle, state: &mut MultiplexState<'_>) -> io::Result<()> {
    drain_channel(&mut handle.stdout, state, Channel::Text, usize::MAX)?;
    drain_channel(&mut handle.side, state, Channel::Binary, usize::MAX)?;
    debug!(
        pid = handle.pid,
        text_open = state.text.is_open(),
        binary_open = state.binary.is_open(),
        unsent = state.remaining.len(),
        "tool exited; final drain done"
    );
    Ok(())
}
