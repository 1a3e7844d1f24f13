//! Binary stream codec
//!
//! Positional binary encoding used for node-to-node transport of requests and
//! documents. Nothing is self-describing: readers must consume fields in
//! exactly the order writers produced them.
//!
//! Encoding rules:
//! - vint: LEB128 unsigned, at most 5 bytes (u32 range)
//! - string: vint byte length followed by UTF-8 bytes
//! - string list: vint count followed by strings
//! - enum: vint ordinal
//! - optional value: one-byte presence flag, value follows when set
//! - instant: i64 epoch seconds followed by i32 nanoseconds, big-endian

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};

/// Errors raised while decoding a binary stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("vint exceeds 32 bits")]
    VarintOverflow,

    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),

    #[error("unknown {kind} ordinal {ordinal}")]
    UnknownOrdinal { kind: &'static str, ordinal: u32 },

    #[error("type ordinals disagree: {first} then {second}")]
    TypeMismatch { first: u32, second: u32 },

    #[error("object data absent from stream")]
    MissingPayload,

    #[error("instant out of range: {secs}s {nanos}ns")]
    InvalidInstant { secs: i64, nanos: i32 },
}

pub type StreamResult<T> = Result<T, StreamError>;

/// Types that can write themselves to a [`StreamOutput`]
pub trait Writeable {
    fn write_to(&self, out: &mut StreamOutput);
}

/// Append-only binary writer
#[derive(Debug, Default)]
pub struct StreamOutput {
    buf: BytesMut,
}

impl StreamOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_vint(&mut self, mut value: u32) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.put_u8(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_vint(value.len() as u32);
        self.buf.put_slice(value.as_bytes());
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.write_bool(true);
                self.write_string(s);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_string_list(&mut self, values: &[String]) {
        self.write_vint(values.len() as u32);
        for value in values {
            self.write_string(value);
        }
    }

    pub fn write_enum(&mut self, ordinal: u32) {
        self.write_vint(ordinal);
    }

    pub fn write_instant(&mut self, instant: &DateTime<Utc>) {
        self.write_i64(instant.timestamp());
        self.write_i32(instant.timestamp_subsec_nanos() as i32);
    }

    pub fn write_optional_writeable<W: Writeable>(&mut self, value: Option<&W>) {
        match value {
            Some(w) => {
                self.write_bool(true);
                w.write_to(self);
            }
            None => self.write_bool(false),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Sequential binary reader over an immutable buffer
#[derive(Debug, Clone)]
pub struct StreamInput {
    buf: Bytes,
}

impl StreamInput {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, n: usize) -> StreamResult<()> {
        if self.buf.remaining() < n {
            Err(StreamError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    pub fn read_vint(&mut self) -> StreamResult<u32> {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        loop {
            self.ensure(1)?;
            let byte = self.buf.get_u8();
            let payload = (byte & 0x7F) as u32;
            // fifth byte may only carry the top four bits
            if shift == 28 && payload > 0x0F {
                return Err(StreamError::VarintOverflow);
            }
            result |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 28 {
                return Err(StreamError::VarintOverflow);
            }
        }
    }

    pub fn read_bool(&mut self) -> StreamResult<bool> {
        self.ensure(1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::InvalidBool(other)),
        }
    }

    pub fn read_i32(&mut self) -> StreamResult<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> StreamResult<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_string(&mut self) -> StreamResult<String> {
        let len = self.read_vint()? as usize;
        self.ensure(len)?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| StreamError::InvalidUtf8)
    }

    pub fn read_optional_string(&mut self) -> StreamResult<Option<String>> {
        if self.read_bool()? {
            self.read_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_string_list(&mut self) -> StreamResult<Vec<String>> {
        let count = self.read_vint()? as usize;
        // cap the preallocation; a corrupt count must not allocate gigabytes
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }

    pub fn read_enum(&mut self) -> StreamResult<u32> {
        self.read_vint()
    }

    pub fn read_instant(&mut self) -> StreamResult<DateTime<Utc>> {
        let secs = self.read_i64()?;
        let nanos = self.read_i32()?;
        u32::try_from(nanos)
            .ok()
            .and_then(|n| DateTime::from_timestamp(secs, n))
            .ok_or(StreamError::InvalidInstant { secs, nanos })
    }
}
