//! Executing-side dispatcher of the GL remoting core.
//!
//! The dispatcher drains one transport ring: decode a record, translate any
//! virtual object names to real driver names, invoke the real driver through
//! the [`GlDriver`] dispatch table, store a reply for synchronous opcodes,
//! and advance the completion token unconditionally, so one synchronous
//! wait on the issuing side covers every record before it.

mod dispatch;
mod driver;

pub use dispatch::{Control, DispatchError, Dispatcher};
pub use driver::GlDriver;
