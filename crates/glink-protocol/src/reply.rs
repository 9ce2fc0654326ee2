//! Synchronous reply payloads.
//!
//! A reply travels through the transport's reply cell, not the ring, but uses
//! the same encoding discipline so a shared-memory transport could inline it.

use crate::wire::{push_bool, push_i32, push_u16, push_u32, DecodeError, Reader};

const TAG_UNIT: u16 = 0x1000;
const TAG_BOOL: u16 = 0x1001;
const TAG_UINT: u16 = 0x1002;
const TAG_INTS: u16 = 0x1003;

/// One decoded synchronous reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement with no value (Gen*, Finish).
    Unit,
    /// EGL-style boolean result.
    Bool(bool),
    /// A single unsigned value (error codes, driver-assigned object ids).
    Uint(u32),
    /// Integer state values (GetIntegerv-style queries).
    Ints(Vec<i32>),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Reply::Unit => push_u16(&mut out, TAG_UNIT),
            Reply::Bool(v) => {
                push_u16(&mut out, TAG_BOOL);
                push_bool(&mut out, *v);
            }
            Reply::Uint(v) => {
                push_u16(&mut out, TAG_UINT);
                push_u32(&mut out, *v);
            }
            Reply::Ints(values) => {
                push_u16(&mut out, TAG_INTS);
                push_u32(&mut out, values.len() as u32);
                for v in values {
                    push_i32(&mut out, *v);
                }
            }
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Reply, DecodeError> {
        let mut r = Reader::new(bytes);
        let reply = match r.read_u16()? {
            TAG_UNIT => Reply::Unit,
            TAG_BOOL => Reply::Bool(r.read_bool()?),
            TAG_UINT => Reply::Uint(r.read_u32()?),
            TAG_INTS => {
                let count = r.read_u32()? as usize;
                let mut values = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    values.push(r.read_i32()?);
                }
                Reply::Ints(values)
            }
            other => return Err(DecodeError::UnknownReplyTag(other)),
        };
        if r.remaining() != 0 {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(reply)
    }
}
