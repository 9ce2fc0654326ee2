//! Issuing-side API of the GL remoting core.
//!
//! Every remoted entry point runs the same algorithm: check for an active
//! context, validate parameters against a fixed allow-list, elide the call if
//! the state mirror already holds the requested values, update the mirror
//! optimistically, then encode and enqueue a record (synchronously only when
//! the caller needs a result before returning). The per-call differences are
//! captured declaratively in [`schema`]; the entry points themselves are
//! one-liners that build a [`glink_protocol::Command`].
//!
//! [`schema`]: crate::schema

mod client;
mod egl;
mod schema;

pub use client::GlesClient;
