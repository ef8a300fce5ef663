//! # Packet Buffer
//!
//! Growable byte storage with independent read and write cursors plus
//! sub-byte bit cursors.
//!
//! ## Cursor Model
//! ```text
//! 0 <= rpos <= wpos <= size
//! [ consumed | readable            | reserved for backpatch ]
//!            ^rpos                 ^wpos                    ^size
//! ```
//!
//! Bit-packed writes accumulate in a pending byte that is appended once
//! eight bits are collected, or when `flush_bits` runs. Every byte-aligned
//! append flushes first, so a bit run never straddles an intervening byte
//! field. On the read side the mirror rule applies: a byte-aligned read
//! discards whatever is left of a partially consumed bit byte.
//!
//! ## Failure Model
//! Reads are fail-closed. A failing read leaves the read cursor and bit
//! state exactly where they were. Writes that would push the buffer past
//! its ceiling are rejected before anything is modified.
//!
//! ## Growth
//! Capacity follows a staged table keyed by the target size, so the many
//! tiny packets a world server emits cost one allocation each while rare
//! large ones do not over-commit memory. Capacity never shrinks.

use crate::config::MAX_PAYLOAD_SIZE;
use crate::core::scalar::{Scalar, MAX_SCALAR_SIZE};
use crate::error::{ProtocolError, Result};
use crate::utils::logging::DiagnosticSink;
use bytes::Bytes;
use std::fmt;

/// (exclusive upper size bound, capacity reserved) per growth tier
const GROWTH_TIERS: [(usize, usize); 3] = [(100, 300), (750, 2500), (6000, 10_000)];

/// Capacity reserved once a buffer outgrows every entry of `GROWTH_TIERS`
const LARGE_RESERVATION: usize = 400_000;

/// Bit position meaning "no partial byte"
const NO_PENDING_BITS: u8 = 8;

fn growth_tier(size: usize) -> usize {
    GROWTH_TIERS
        .iter()
        .position(|&(bound, _)| size < bound)
        .unwrap_or(GROWTH_TIERS.len())
}

fn tier_reservation(tier: usize) -> usize {
    GROWTH_TIERS
        .get(tier)
        .map(|&(_, reserve)| reserve)
        .unwrap_or(LARGE_RESERVATION)
}

/// Byte buffer backing a single packet.
///
/// Owned by exactly one packet for its whole lifetime. It deliberately does
/// not implement `Clone`; hand it off by value.
#[derive(Debug)]
pub struct PacketBuffer {
    storage: Vec<u8>,
    rpos: usize,
    wpos: usize,
    write_bit_pos: u8,
    write_bit_val: u8,
    read_bit_pos: u8,
    read_bit_val: u8,
    limit: usize,
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketBuffer {
    /// Empty buffer with no reserved capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty buffer with `reserve` bytes of initial capacity.
    ///
    /// The hint is clamped to [`MAX_PAYLOAD_SIZE`].
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            storage: Vec::with_capacity(reserve.min(MAX_PAYLOAD_SIZE)),
            rpos: 0,
            wpos: 0,
            write_bit_pos: NO_PENDING_BITS,
            write_bit_val: 0,
            read_bit_pos: NO_PENDING_BITS,
            read_bit_val: 0,
            limit: MAX_PAYLOAD_SIZE,
        }
    }

    /// Empty buffer with a custom payload ceiling.
    pub fn with_limit(reserve: usize, limit: usize) -> Self {
        let mut buf = Self::with_capacity(reserve.min(limit));
        buf.limit = limit;
        buf
    }

    /// Wrap already-received bytes for reading. Takes ownership, no copy.
    pub fn from_vec(storage: Vec<u8>) -> Result<Self> {
        Self::from_vec_with_limit(storage, MAX_PAYLOAD_SIZE)
    }

    /// Like [`from_vec`](Self::from_vec) with a custom ceiling.
    pub fn from_vec_with_limit(storage: Vec<u8>, limit: usize) -> Result<Self> {
        if storage.len() > limit {
            return Err(ProtocolError::CapacityExceeded {
                size: storage.len(),
                limit,
            });
        }

        let wpos = storage.len();
        Ok(Self {
            storage,
            rpos: 0,
            wpos,
            write_bit_pos: NO_PENDING_BITS,
            write_bit_val: 0,
            read_bit_pos: NO_PENDING_BITS,
            read_bit_val: 0,
            limit,
        })
    }

    // ------------------------------------------------------------------
    // Cursors and storage
    // ------------------------------------------------------------------

    #[inline]
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Payload ceiling for this buffer
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn rpos(&self) -> usize {
        self.rpos
    }

    #[inline]
    pub fn wpos(&self) -> usize {
        self.wpos
    }

    /// Bytes left between the read and write cursors
    #[inline]
    pub fn remaining(&self) -> usize {
        self.wpos - self.rpos
    }

    /// Move the read cursor. Discards any partially consumed bit byte.
    pub fn set_rpos(&mut self, pos: usize) -> Result<()> {
        if pos > self.wpos {
            return Err(ProtocolError::Position {
                pos,
                size: self.wpos,
                value_size: 0,
            });
        }

        self.reset_bit_pos();
        self.rpos = pos;
        Ok(())
    }

    /// Move the write cursor, e.g. to rewrite a reserved region.
    ///
    /// Pending bits are flushed at the old position first, and only once
    /// `pos` is known to be valid.
    pub fn set_wpos(&mut self, pos: usize) -> Result<()> {
        let size_after_flush = self.size() + usize::from(self.has_unfinished_bit_pack());
        if pos < self.rpos || pos > size_after_flush {
            return Err(ProtocolError::Position {
                pos,
                size: size_after_flush,
                value_size: 0,
            });
        }

        self.flush_bits()?;
        self.wpos = pos;
        Ok(())
    }

    /// The full stored byte run.
    #[inline]
    pub fn contents(&self) -> &[u8] {
        &self.storage
    }

    /// Drop all bytes and cursors. Capacity is kept.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.rpos = 0;
        self.wpos = 0;
        self.write_bit_pos = NO_PENDING_BITS;
        self.write_bit_val = 0;
        self.read_bit_pos = NO_PENDING_BITS;
        self.read_bit_val = 0;
    }

    /// Ensure capacity for at least `total` bytes.
    pub fn reserve(&mut self, total: usize) {
        if total > self.storage.capacity() {
            self.storage.reserve_exact(total - self.storage.len());
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.storage
    }

    /// Freeze the stored bytes for hand-off. Moves the allocation.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.storage)
    }

    // ------------------------------------------------------------------
    // Byte-aligned writes
    // ------------------------------------------------------------------

    fn check_limit(&self, additional: usize) -> Result<usize> {
        let new_size = self
            .wpos
            .checked_add(additional)
            .filter(|&size| size <= self.limit)
            .ok_or(ProtocolError::CapacityExceeded {
                size: self.wpos.saturating_add(additional),
                limit: self.limit,
            })?;
        Ok(new_size)
    }

    fn grow_for(&mut self, new_size: usize) {
        let old_tier = growth_tier(self.storage.len());
        let new_tier = growth_tier(new_size);
        if self.storage.capacity() < new_size || new_tier > old_tier {
            let target = tier_reservation(new_tier).max(new_size);
            if target > self.storage.capacity() {
                self.storage.reserve_exact(target - self.storage.len());
            }
        }
    }

    /// Append without flushing bits. Callers have already checked the ceiling.
    fn append_raw(&mut self, src: &[u8]) {
        let new_size = self.wpos + src.len();
        self.grow_for(new_size);
        if self.storage.len() < new_size {
            self.storage.resize(new_size, 0);
        }
        self.storage[self.wpos..new_size].copy_from_slice(src);
        self.wpos = new_size;
    }

    /// Append raw bytes at the write cursor.
    ///
    /// Rejects empty input and anything that would cross the ceiling.
    pub fn append(&mut self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Err(ProtocolError::ZeroSizedWrite {
                pos: self.wpos,
                size: self.size(),
            });
        }

        let pending = usize::from(self.has_unfinished_bit_pack());
        self.check_limit(pending + src.len())?;

        self.flush_bits()?;
        self.append_raw(src);
        Ok(())
    }

    /// Append the readable region of another buffer.
    pub fn append_buffer(&mut self, other: &PacketBuffer) -> Result<()> {
        if other.wpos == 0 {
            return Ok(());
        }
        self.append(&other.storage[..other.wpos])
    }

    /// Append the little-endian encoding of `value`.
    pub fn write<T: Scalar>(&mut self, value: T) -> Result<()> {
        let mut raw = [0u8; MAX_SCALAR_SIZE];
        value.encode(&mut raw[..T::SIZE]);
        self.append(&raw[..T::SIZE])
    }

    /// Append string bytes without a terminator. Empty strings write nothing.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.append(value.as_bytes())
    }

    /// Append string bytes followed by a zero terminator.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        self.check_limit(usize::from(self.has_unfinished_bit_pack()) + value.len() + 1)?;
        self.write_string(value)?;
        self.write::<u8>(0)
    }

    /// Overwrite `src.len()` bytes starting at `pos`.
    ///
    /// The region must already exist; this never grows the buffer.
    pub fn write_at(&mut self, pos: usize, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Err(ProtocolError::ZeroSizedWrite {
                pos,
                size: self.size(),
            });
        }

        let end = pos
            .checked_add(src.len())
            .filter(|&end| end <= self.size())
            .ok_or(ProtocolError::Position {
                pos,
                size: self.size(),
                value_size: src.len(),
            })?;

        self.storage[pos..end].copy_from_slice(src);
        Ok(())
    }

    /// Typed backpatch at `pos`.
    pub fn put<T: Scalar>(&mut self, pos: usize, value: T) -> Result<()> {
        let mut raw = [0u8; MAX_SCALAR_SIZE];
        value.encode(&mut raw[..T::SIZE]);
        self.write_at(pos, &raw[..T::SIZE])
    }

    // ------------------------------------------------------------------
    // Bit-level writes
    // ------------------------------------------------------------------

    /// True when written bits are waiting for a flush.
    #[inline]
    pub fn has_unfinished_bit_pack(&self) -> bool {
        self.write_bit_pos != NO_PENDING_BITS
    }

    /// Absolute bit offset of the write cursor, pending bits included.
    pub fn bit_write_pos(&self) -> usize {
        self.wpos * 8 + usize::from(NO_PENDING_BITS - self.write_bit_pos)
    }

    /// Push one bit, most significant position first.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.write_bit_pos == 1 {
            self.check_limit(1)?;
        }

        self.write_bit_pos -= 1;
        if bit {
            self.write_bit_val |= 1 << self.write_bit_pos;
        }

        if self.write_bit_pos == 0 {
            let byte = self.write_bit_val;
            self.write_bit_pos = NO_PENDING_BITS;
            self.write_bit_val = 0;
            self.append_raw(&[byte]);
        }
        Ok(())
    }

    /// Push the low `bit_count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, bit_count: u32) -> Result<()> {
        if bit_count == 0 || bit_count > 64 {
            return Err(ProtocolError::BitCount(bit_count));
        }

        let pending = u32::from(NO_PENDING_BITS - self.write_bit_pos);
        let completed = ((pending + bit_count) / 8) as usize;
        self.check_limit(completed)?;

        for i in (0..bit_count).rev() {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Pad the pending bit byte with zeros and append it.
    pub fn flush_bits(&mut self) -> Result<()> {
        if !self.has_unfinished_bit_pack() {
            return Ok(());
        }

        self.check_limit(1)?;
        let byte = self.write_bit_val;
        self.write_bit_pos = NO_PENDING_BITS;
        self.write_bit_val = 0;
        self.append_raw(&[byte]);
        Ok(())
    }

    /// Write `bit_count` bits of `value` at absolute bit offset `bit_pos`.
    ///
    /// Most significant bit first within each byte. Bits outside the target
    /// range are left untouched. The region must already exist.
    pub fn put_bits(&mut self, bit_pos: usize, value: u64, bit_count: u32) -> Result<()> {
        if bit_count == 0 || bit_count > 64 {
            return Err(ProtocolError::BitCount(bit_count));
        }

        let size_bits = self.size() * 8;
        if bit_pos
            .checked_add(bit_count as usize)
            .map_or(true, |end| end > size_bits)
        {
            return Err(ProtocolError::Position {
                pos: bit_pos,
                size: size_bits,
                value_size: bit_count as usize,
            });
        }

        for i in 0..bit_count as usize {
            let byte = (bit_pos + i) / 8;
            let mask = 1u8 << (7 - (bit_pos + i) % 8);
            if (value >> (bit_count as usize - i - 1)) & 1 != 0 {
                self.storage[byte] |= mask;
            } else {
                self.storage[byte] &= !mask;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Byte-aligned reads
    // ------------------------------------------------------------------

    fn ensure_readable(&self, len: usize) -> Result<usize> {
        self.rpos
            .checked_add(len)
            .filter(|&end| end <= self.wpos)
            .ok_or(ProtocolError::Position {
                pos: self.rpos,
                size: self.wpos,
                value_size: len,
            })
    }

    /// Discard the remainder of a partially consumed bit byte.
    pub fn reset_bit_pos(&mut self) {
        if self.read_bit_pos >= NO_PENDING_BITS {
            return;
        }
        self.read_bit_pos = NO_PENDING_BITS;
        self.read_bit_val = 0;
    }

    /// Consume one scalar.
    ///
    /// Floating values must be finite.
    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        let end = self.ensure_readable(T::SIZE)?;
        let value = T::decode(&self.storage[self.rpos..end]);
        if !value.is_valid() {
            return Err(ProtocolError::InvalidValue {
                kind: T::TYPE_NAME.to_string(),
                value: value.to_string(),
            });
        }

        self.reset_bit_pos();
        self.rpos = end;
        Ok(value)
    }

    /// Consume `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let end = self.ensure_readable(len)?;
        let start = self.rpos;
        self.reset_bit_pos();
        self.rpos = end;
        Ok(&self.storage[start..end])
    }

    /// Fill `dst` from the read cursor.
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let src = self.read_bytes(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Skip `len` bytes.
    pub fn read_skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Skip one scalar's worth of bytes without decoding it.
    pub fn read_skip_scalar<T: Scalar>(&mut self) -> Result<()> {
        self.read_skip(T::SIZE)
    }

    /// Consume `len` bytes that must be well-formed UTF-8.
    pub fn read_string(&mut self, len: usize) -> Result<&str> {
        let end = self.ensure_readable(len)?;
        let start = self.rpos;
        self.take_utf8(start, end, end)
    }

    /// Consume `len` bytes without UTF-8 validation.
    pub fn read_raw_string(&mut self, len: usize) -> Result<&[u8]> {
        self.read_bytes(len)
    }

    fn find_terminator(&self) -> Result<usize> {
        if self.rpos >= self.wpos {
            return Err(ProtocolError::Position {
                pos: self.rpos,
                size: self.wpos,
                value_size: 1,
            });
        }

        self.storage[self.rpos..self.wpos]
            .iter()
            .position(|&b| b == 0)
            .map(|offset| self.rpos + offset)
            .ok_or(ProtocolError::Position {
                pos: self.wpos,
                size: self.wpos,
                value_size: 1,
            })
    }

    /// Consume a zero-terminated string that must be well-formed UTF-8.
    ///
    /// The terminator is consumed but not returned.
    pub fn read_cstring(&mut self) -> Result<&str> {
        let terminator = self.find_terminator()?;
        let start = self.rpos;
        self.take_utf8(start, terminator, terminator + 1)
    }

    /// Consume a zero-terminated string without UTF-8 validation.
    pub fn read_raw_cstring(&mut self) -> Result<&[u8]> {
        let terminator = self.find_terminator()?;
        let start = self.rpos;
        self.reset_bit_pos();
        self.rpos = terminator + 1;
        Ok(&self.storage[start..terminator])
    }

    /// Validate `start..end`, then advance the read cursor to `consumed_to`.
    fn take_utf8(&mut self, start: usize, end: usize, consumed_to: usize) -> Result<&str> {
        let raw = &self.storage[start..end];
        let text = std::str::from_utf8(raw).map_err(|_| ProtocolError::invalid_string(raw))?;

        // field-level writes only; `text` still borrows `storage`
        self.read_bit_pos = NO_PENDING_BITS;
        self.read_bit_val = 0;
        self.rpos = consumed_to;
        Ok(text)
    }

    // ------------------------------------------------------------------
    // Bit-level reads
    // ------------------------------------------------------------------

    fn available_bits(&self) -> usize {
        let pending = if self.read_bit_pos < NO_PENDING_BITS {
            usize::from(NO_PENDING_BITS - self.read_bit_pos)
        } else {
            0
        };
        pending + self.remaining() * 8
    }

    /// Consume one bit, most significant position first.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.read_bit_pos >= NO_PENDING_BITS {
            let end = self.ensure_readable(1)?;
            self.read_bit_val = self.storage[self.rpos];
            self.rpos = end;
            self.read_bit_pos = 0;
        }

        self.read_bit_pos += 1;
        Ok((self.read_bit_val >> (NO_PENDING_BITS - self.read_bit_pos)) & 1 != 0)
    }

    /// Consume `bit_count` bits, most significant first.
    pub fn read_bits(&mut self, bit_count: u32) -> Result<u64> {
        if bit_count == 0 || bit_count > 64 {
            return Err(ProtocolError::BitCount(bit_count));
        }

        let available = self.available_bits();
        if (bit_count as usize) > available {
            let missing = bit_count as usize - available;
            return Err(ProtocolError::Position {
                pos: self.rpos,
                size: self.wpos,
                value_size: self.remaining() + missing.div_ceil(8),
            });
        }

        let mut value = 0u64;
        for i in (0..bit_count).rev() {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Dump the storage as decimal byte values.
    pub fn print_storage(&self, sink: &dyn DiagnosticSink) {
        if !sink.enabled() {
            return;
        }
        sink.emit(format_args!(
            "STORAGE_SIZE: {} {}",
            self.size(),
            DecimalDump(&self.storage)
        ));
    }

    /// Dump the storage as characters, non-printable bytes shown as `.`.
    pub fn textlike(&self, sink: &dyn DiagnosticSink) {
        if !sink.enabled() {
            return;
        }
        sink.emit(format_args!(
            "STORAGE_SIZE: {} {}",
            self.size(),
            TextDump(&self.storage)
        ));
    }

    /// Dump the storage as hex, sixteen bytes per row split into two groups.
    pub fn hexlike(&self, sink: &dyn DiagnosticSink) {
        if !sink.enabled() {
            return;
        }
        sink.emit(format_args!(
            "STORAGE_SIZE: {} {}",
            self.size(),
            HexDump(&self.storage)
        ));
    }
}

struct DecimalDump<'a>(&'a [u8]);

impl fmt::Display for DecimalDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte} - ")?;
        }
        Ok(())
    }
}

struct TextDump<'a>(&'a [u8]);

impl fmt::Display for TextDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            let shown = if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                '.'
            };
            write!(f, "{shown}")?;
        }
        Ok(())
    }
}

struct HexDump<'a>(&'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.0.chunks(16) {
            let (left, right) = row.split_at(row.len().min(8));
            for byte in left {
                write!(f, "{byte:02x} ")?;
            }
            if !right.is_empty() {
                f.write_str("| ")?;
                for byte in right {
                    write!(f, "{byte:02x} ")?;
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
