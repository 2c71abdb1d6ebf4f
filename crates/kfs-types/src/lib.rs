#![forbid(unsafe_code)]
//! Shared types for the KISS filesystem driver.
//!
//! Id newtypes, on-disk layout constants, the fixed-capacity [`FileName`]
//! key, the parse-layer error type, and the little-endian read helpers the
//! parsing crates are built on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed block size of a KISS image, in bytes.
pub const BLOCK_SIZE: usize = 4096;
/// `BLOCK_SIZE` in the width used for image byte arithmetic.
pub const BLOCK_SIZE_U64: u64 = 4096;
/// `BLOCK_SIZE` in the width of on-disk size fields.
pub const BLOCK_SIZE_U32: u32 = 4096;

/// Capacity of the on-disk name field.
pub const MAX_NAME_LEN: usize = 32;

/// Capacity clamp for both the dentry table and the inode table.
///
/// Block 0 holds the 64-byte superblock header followed by 64-byte dentry
/// records, so at most (4096 - 64) / 64 = 63 dentries exist on disk.
pub const MAX_ENTRIES: usize = 63;

/// Capacity of a single inode's data-block list: (4096 - 4) / 4 entries.
pub const MAX_BLOCKS_PER_INODE: usize = 1023;

/// Byte length of the superblock header (three counts + reserved padding).
pub const SUPERBLOCK_HEADER_LEN: usize = 64;
/// Reserved padding after the superblock counts, skipped on decode.
pub const SUPERBLOCK_RESERVED_LEN: usize = 52;

/// Byte length of one packed dentry record.
pub const DENTRY_RECORD_LEN: usize = 64;
/// Reserved trailer after each dentry's inode number, skipped on decode.
pub const DENTRY_RESERVED_LEN: usize = 24;

/// Granularity of the boot-module mapping bridge (4 MiB large pages).
pub const LARGE_PAGE_SIZE: u64 = 4 * 1024 * 1024;

/// Raw block index, counted from the start of the image (block 0 is the
/// superblock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(pub u64);

/// Logical data-block index as stored in an inode's block list.
///
/// Translated to a [`BlockNumber`] by offsetting past the superblock and
/// the inode-table blocks; only the block accessor performs that step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DataBlockNumber(pub u32);

/// Index into the inode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InodeNumber(pub u32);

/// Index into the dentry table. Index 0 is conventionally the root
/// directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DentryIndex(pub u32);

/// Byte offset within the mapped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteOffset(pub u64);

impl ByteOffset {
    pub const ZERO: Self = Self(0);

    /// Add a byte count, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Self)
    }

    /// Multiply by a scalar, returning `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }
}

impl BlockNumber {
    /// Byte offset of this block's first byte, `None` on overflow.
    #[must_use]
    pub fn to_byte_offset(self) -> Option<ByteOffset> {
        self.0.checked_mul(BLOCK_SIZE_U64).map(ByteOffset)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DataBlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DentryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ByteOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Fixed-capacity filename key ─────────────────────────────────────────────

/// A filename in its canonical fixed-capacity form.
///
/// The on-disk name field is 32 bytes wide and not necessarily
/// NUL-terminated when exactly full. The canonical form truncates the input
/// at the first NUL and at capacity, then zero-pads; equality and hashing
/// are over the canonical array. The same rule is applied when decoding
/// dentries and when looking names up, so index keys and probe keys can
/// never disagree about trailing padding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileName {
    bytes: [u8; MAX_NAME_LEN],
}

impl FileName {
    /// Canonicalize an arbitrary byte string into a filename key.
    ///
    /// Input past the first NUL or past `MAX_NAME_LEN` bytes is ignored.
    #[must_use]
    pub fn new(raw: &[u8]) -> Self {
        let capped = raw.len().min(MAX_NAME_LEN);
        let end = raw[..capped]
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(capped);
        let mut bytes = [0_u8; MAX_NAME_LEN];
        bytes[..end].copy_from_slice(&raw[..end]);
        Self { bytes }
    }

    /// Canonicalize a raw on-disk name field (drops garbage after the
    /// first NUL).
    #[must_use]
    pub fn from_field(field: [u8; MAX_NAME_LEN]) -> Self {
        Self::new(&field)
    }

    /// Length of the name in bytes (up to the first NUL, at most capacity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(MAX_NAME_LEN)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The significant bytes of the name, without padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// The full canonical 32-byte field, including zero padding.
    #[must_use]
    pub fn as_field(&self) -> &[u8; MAX_NAME_LEN] {
        &self.bytes
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileName({self})")
    }
}

// ── Parse-layer error ───────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("insufficient data: need {needed} bytes at offset {offset}, got {actual}")]
    InsufficientData {
        needed: usize,
        offset: usize,
        actual: usize,
    },
    #[error("invalid field: {field} ({reason})")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("integer conversion failed: {field}")]
    IntegerConversion { field: &'static str },
}

// ── Byte-slice read helpers ─────────────────────────────────────────────────

#[inline]
pub fn ensure_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    let Some(end) = offset.checked_add(len) else {
        return Err(ParseError::InvalidField {
            field: "offset",
            reason: "overflow",
        });
    };

    if end > data.len() {
        return Err(ParseError::InsufficientData {
            needed: len,
            offset,
            actual: data.len().saturating_sub(offset),
        });
    }

    Ok(&data[offset..end])
}

#[inline]
pub fn read_le_u32(data: &[u8], offset: usize) -> Result<u32, ParseError> {
    let bytes = ensure_slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
pub fn read_fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], ParseError> {
    let bytes = ensure_slice(data, offset, N)?;
    let mut out = [0_u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

// ── Alignment and narrowing helpers ─────────────────────────────────────────

/// Round `value` down to the nearest multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two; returns `None` otherwise.
#[must_use]
pub fn align_down(value: u64, alignment: u64) -> Option<u64> {
    if alignment == 0 || !alignment.is_power_of_two() {
        return None;
    }
    Some(value & !(alignment - 1))
}

/// Round `value` up to the nearest multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two; returns `None` on overflow
/// or if `alignment` is invalid.
#[must_use]
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    if alignment == 0 || !alignment.is_power_of_two() {
        return None;
    }
    let mask = alignment - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

/// Narrow a `u64` to `usize` with an explicit error path.
pub fn u64_to_usize(value: u64, field: &'static str) -> Result<usize, ParseError> {
    usize::try_from(value).map_err(|_| ParseError::IntegerConversion { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_helpers() {
        let bytes = [0x34_u8, 0x12, 0x00, 0x00, 0xEF, 0xCD, 0xAB, 0x90];
        assert_eq!(read_le_u32(&bytes, 0).expect("u32"), 0x1234);
        assert_eq!(read_le_u32(&bytes, 4).expect("u32"), 0x90AB_CDEF);
        assert_eq!(read_fixed::<4>(&bytes, 4).expect("fixed"), [0xEF, 0xCD, 0xAB, 0x90]);
    }

    #[test]
    fn ensure_slice_rejects_out_of_range() {
        let bytes = [0_u8; 8];
        assert!(ensure_slice(&bytes, 0, 8).is_ok());
        assert_eq!(
            ensure_slice(&bytes, 4, 8).unwrap_err(),
            ParseError::InsufficientData {
                needed: 8,
                offset: 4,
                actual: 4,
            }
        );
        assert!(ensure_slice(&bytes, usize::MAX, 2).is_err());
    }

    #[test]
    fn filename_truncates_at_first_nul() {
        let name = FileName::new(b"frame0.txt\0garbage");
        assert_eq!(name.as_bytes(), b"frame0.txt");
        assert_eq!(name.len(), 10);
    }

    #[test]
    fn filename_padding_is_insignificant() {
        let mut field = [0_u8; MAX_NAME_LEN];
        field[..3].copy_from_slice(b"cat");
        field[10] = 0xFF; // garbage after the terminator
        assert_eq!(FileName::from_field(field), FileName::new(b"cat"));
    }

    #[test]
    fn filename_full_width_name_keeps_every_byte() {
        let raw = b"verylargetextwithverylongname.tx";
        assert_eq!(raw.len(), MAX_NAME_LEN);
        let name = FileName::new(raw);
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert_eq!(name.as_bytes(), raw);
        // A 33rd byte cannot be significant.
        assert_eq!(name, FileName::new(b"verylargetextwithverylongname.txt"));
    }

    #[test]
    fn filename_display_is_lossy_utf8() {
        assert_eq!(FileName::new(b"hello").to_string(), "hello");
        assert_eq!(format!("{:?}", FileName::new(b"hello")), "FileName(hello)");
    }

    #[test]
    fn alignment_boundaries() {
        assert_eq!(align_down(LARGE_PAGE_SIZE + 1, LARGE_PAGE_SIZE), Some(LARGE_PAGE_SIZE));
        assert_eq!(align_down(LARGE_PAGE_SIZE, LARGE_PAGE_SIZE), Some(LARGE_PAGE_SIZE));
        assert_eq!(align_up(1, LARGE_PAGE_SIZE), Some(LARGE_PAGE_SIZE));
        assert_eq!(align_up(0, LARGE_PAGE_SIZE), Some(0));
        assert_eq!(align_up(u64::MAX, LARGE_PAGE_SIZE), None);
        assert_eq!(align_down(100, 0), None);
        assert_eq!(align_down(100, 3), None);
    }

    #[test]
    fn block_number_byte_offset() {
        assert_eq!(BlockNumber(2).to_byte_offset(), Some(ByteOffset(8192)));
        assert_eq!(BlockNumber(u64::MAX).to_byte_offset(), None);
    }

    #[test]
    fn layout_constants_are_consistent() {
        // Block 0 is exactly the superblock header plus MAX_ENTRIES dentries.
        assert_eq!(
            SUPERBLOCK_HEADER_LEN + MAX_ENTRIES * DENTRY_RECORD_LEN,
            BLOCK_SIZE
        );
        // An inode block is exactly the size field plus the block list.
        assert_eq!(4 + MAX_BLOCKS_PER_INODE * 4, BLOCK_SIZE);
    }
}
