//! Shared state machinery for the GL remoting core:
//!
//! - [`GlMirror`]: the issuing side's cached subset of GPU context state,
//!   used to validate calls, elide redundant records and answer queries
//!   without a round-trip.
//! - [`ContextRegistry`]: the context/display/surface lifecycle state
//!   machine, arena-backed, with explicit deferred-destroy sweeping. Both the
//!   issuing and executing side own one (with different per-context
//!   payloads).
//! - [`NamePools`] / [`NameTable`]: virtual object-name allocation on the
//!   issuing side and virtual-to-real translation on the executing side.

mod attrib;
mod mirror;
mod names;
mod registry;

pub use attrib::{AttribTable, VertexAttrib, ATTRIB_LIMIT, INLINE_ATTRIBS};
pub use mirror::{CapFlags, GlMirror};
pub use names::{NameAllocator, NamePools, NameTable, SharedNamePools};
pub use registry::{ContextRecord, ContextRegistry, DestroyFlags, SlotId};
