//! Declarative per-call schema.
//!
//! The transport mode and error-deferral behavior of each remoted call are
//! data, not code: the single generic submit path in [`crate::client`] reads
//! them from here. Adding an entry point means adding a `Command` variant and
//! one schema line, not another hand-copied validate/cache/forward block.

use glink_protocol::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncMode {
    /// Enqueue and return immediately.
    Async,
    /// Enqueue, then block until the consumer has executed the record.
    Sync,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSpec {
    pub sync: SyncMode,
    /// The mirror cannot judge this call's success (it may fail on a driver
    /// object it knows nothing about); the next error query must go to the
    /// real driver.
    pub defer_error: bool,
}

const ASYNC: CallSpec = CallSpec {
    sync: SyncMode::Async,
    defer_error: false,
};

const ASYNC_DEFERRED: CallSpec = CallSpec {
    sync: SyncMode::Async,
    defer_error: true,
};

const SYNC: CallSpec = CallSpec {
    sync: SyncMode::Sync,
    defer_error: false,
};

pub(crate) fn call_spec(cmd: &Command) -> CallSpec {
    match cmd {
        // Binds and program/shader operations can fail on names the mirror
        // does not track.
        Command::BindBuffer { .. }
        | Command::BindTexture { .. }
        | Command::UseProgram { .. }
        | Command::ShaderSource { .. }
        | Command::CompileShader { .. }
        | Command::AttachShader { .. }
        | Command::LinkProgram { .. }
        | Command::DeleteShader { .. }
        | Command::DeleteProgram { .. }
        | Command::BufferData { .. }
        | Command::BufferSubData { .. }
        | Command::TexImage2d { .. }
        | Command::TexSubImage2d { .. }
        | Command::DrawArrays { .. }
        | Command::DrawElements { .. } => ASYNC_DEFERRED,

        // Finish is a pure ordering barrier: it carries no result but must
        // not return before everything ahead of it has executed.
        Command::Finish => SYNC,

        _ => ASYNC,
    }
}
