//! Wire format for the GL command transport.
//!
//! This is a deliberately small, stable format:
//! - endian-stable (little-endian everywhere)
//! - flat scalar payloads with length-prefixed variable parts
//! - framed by the ring buffer's record header; this crate defines the
//!   payload of each opcode plus the synchronous reply encoding.
//!
//! The command set is the curated subset of GL ES 2.0 / EGL entry points the
//! remoting core forwards; each remaining entry point of the full API follows
//! one of the payload shapes here (fixed scalars, scalars + one
//! variable-length buffer, or scalars + a synchronous reply).

mod command;
mod pixel;
mod reply;
mod wire;

pub mod glenum;

pub use command::{opcode, Command, ContextId, DisplayId, Namespace, SurfaceId};
pub use pixel::{image_data_size, ImageSize, SizeError};
pub use reply::Reply;
pub use wire::DecodeError;
