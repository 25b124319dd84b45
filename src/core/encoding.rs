//! Canonical byte encoding for hashed and signed data
//!
//! Every hash input in the ledger goes through this encoder so that two
//! implementations produce the same bytes for the same block:
//! - integers are fixed-width big-endian (`u64`, or `u32` for output
//!   indexes and lengths)
//! - strings are a `u32` byte length followed by their UTF-8 bytes, kept
//!   exactly as stored (hex is not decoded)
//! - sequences are a `u32` element count followed by the elements
//! - an optional value is a `0` byte, or a `1` byte followed by the value

use bytes::{BufMut, BytesMut};

/// Whether a string or sequence of `len` items has a length prefix.
///
/// Structural checks reject anything longer before it is hashed, so the
/// encoder never has to truncate a length.
pub fn fits_length(len: usize) -> bool {
    u32::try_from(len).is_ok()
}

/// Types with a canonical byte encoding
pub trait Canonical {
    /// Append the canonical encoding of `self` to `out`
    fn encode(&self, out: &mut Encoder);

    /// Canonical encoding as an owned byte vector
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.encode(&mut encoder);
        encoder.finish()
    }
}

/// Append-only writer for canonical encodings
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32(value);
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64(value);
        self
    }

    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_len(value.len());
        self.buf.put_slice(value.as_bytes());
        self
    }

    pub fn put_option_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                self.buf.put_u8(1);
                self.put_str(value)
            }
            None => {
                self.buf.put_u8(0);
                self
            }
        }
    }

    pub fn put_seq<T: Canonical>(&mut self, items: &[T]) -> &mut Self {
        self.put_len(items.len());
        for item in items {
            item.encode(self);
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    // Callers hash only data that passed `fits_length`.
    fn put_len(&mut self, len: usize) {
        self.buf.put_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }
}
