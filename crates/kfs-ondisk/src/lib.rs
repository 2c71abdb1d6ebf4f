#![forbid(unsafe_code)]
//! On-disk format parsing for KISS images.
//!
//! Pure parsing crate with no I/O and no side effects. Parses byte slices into
//! typed structures for the superblock, the packed dentry table, and the
//! per-block inode records. The format carries no magic, version, or
//! checksum; beyond truncation checks, tolerance is deliberate and bounds
//! enforcement belongs to the read path.

use kfs_types::{
    BLOCK_SIZE_U32, DENTRY_RECORD_LEN, DataBlockNumber, FileName, InodeNumber,
    MAX_BLOCKS_PER_INODE, MAX_ENTRIES, MAX_NAME_LEN, ParseError, SUPERBLOCK_HEADER_LEN,
    ensure_slice, read_fixed, read_le_u32,
};
use serde::{Deserialize, Serialize};

/// Entry type tag of a dentry.
///
/// On disk: 0 = special device, 1 = directory, 2 = regular file. The format
/// has no way to reject other tags, so they decode as regular files and the
/// read path's inode/block bounds checks take it from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    SpecialDevice,
    Directory,
    RegularFile,
}

impl EntryType {
    pub const SPECIAL_DEVICE_TAG: u32 = 0;
    pub const DIRECTORY_TAG: u32 = 1;
    pub const REGULAR_FILE_TAG: u32 = 2;

    #[must_use]
    pub fn from_raw(tag: u32) -> Self {
        match tag {
            Self::SPECIAL_DEVICE_TAG => Self::SpecialDevice,
            Self::DIRECTORY_TAG => Self::Directory,
            _ => Self::RegularFile,
        }
    }

    #[must_use]
    pub fn to_raw(self) -> u32 {
        match self {
            Self::SpecialDevice => Self::SPECIAL_DEVICE_TAG,
            Self::Directory => Self::DIRECTORY_TAG,
            Self::RegularFile => Self::REGULAR_FILE_TAG,
        }
    }
}

/// Decoded superblock counts (block 0, first 64 bytes).
///
/// The counts are stored as claimed by the image; callers clamp through
/// [`Superblock::clamped_dentry_count`] / [`Superblock::clamped_inode_count`]
/// before sizing any table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub dentry_count: u32,
    pub inode_count: u32,
    pub total_data_block_count: u32,
}

impl Superblock {
    /// Decode the superblock header from the start of the image.
    ///
    /// Three little-endian counts followed by 52 reserved bytes, which are
    /// required to be present but never interpreted.
    pub fn parse(image: &[u8]) -> Result<Self, ParseError> {
        let header = ensure_slice(image, 0, SUPERBLOCK_HEADER_LEN)?;
        Ok(Self {
            dentry_count: read_le_u32(header, 0)?,
            inode_count: read_le_u32(header, 4)?,
            total_data_block_count: read_le_u32(header, 8)?,
        })
    }

    /// Dentry count clamped to table capacity; excess entries in the image
    /// are ignored rather than overflowing the fixed-capacity table.
    #[must_use]
    pub fn clamped_dentry_count(&self) -> usize {
        usize::try_from(self.dentry_count)
            .unwrap_or(usize::MAX)
            .min(MAX_ENTRIES)
    }

    /// Inode count clamped to table capacity.
    #[must_use]
    pub fn clamped_inode_count(&self) -> usize {
        usize::try_from(self.inode_count)
            .unwrap_or(usize::MAX)
            .min(MAX_ENTRIES)
    }

    /// Whether either declared count exceeds table capacity.
    #[must_use]
    pub fn overclaims_capacity(&self) -> bool {
        usize::try_from(self.dentry_count).unwrap_or(usize::MAX) > MAX_ENTRIES
            || usize::try_from(self.inode_count).unwrap_or(usize::MAX) > MAX_ENTRIES
    }
}

/// One decoded 64-byte dentry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DentryRecord {
    pub name: FileName,
    pub entry_type: EntryType,
    /// Meaningful only when `entry_type` is [`EntryType::RegularFile`].
    pub inode: InodeNumber,
}

impl DentryRecord {
    /// Decode dentry slot `index` from block 0.
    ///
    /// Layout per slot: `name[32]`, `entry_type: u32`, `inode: u32`, then a
    /// 24-byte reserved trailer that is skipped.
    pub fn parse_at(block0: &[u8], index: usize) -> Result<Self, ParseError> {
        let offset = index
            .checked_mul(DENTRY_RECORD_LEN)
            .and_then(|o| o.checked_add(SUPERBLOCK_HEADER_LEN))
            .ok_or(ParseError::InvalidField {
                field: "dentry_index",
                reason: "offset overflow",
            })?;
        let record = ensure_slice(block0, offset, DENTRY_RECORD_LEN)?;

        let name = FileName::from_field(read_fixed::<MAX_NAME_LEN>(record, 0)?);
        let entry_type = EntryType::from_raw(read_le_u32(record, MAX_NAME_LEN)?);
        let inode = InodeNumber(read_le_u32(record, MAX_NAME_LEN + 4)?);
        Ok(Self {
            name,
            entry_type,
            inode,
        })
    }
}

/// One decoded inode record (inode `i` occupies raw block `i + 1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InodeRecord {
    pub size: u32,
    /// Logical data-block list, in file order. Length is the block count
    /// derived from `size`, clamped to [`MAX_BLOCKS_PER_INODE`].
    pub blocks: Vec<DataBlockNumber>,
}

impl InodeRecord {
    /// Decode an inode record from its block.
    ///
    /// Reads the 32-bit size, derives the data-block count, then reads
    /// exactly that many 32-bit logical block indices. A size implying more
    /// indices than fit in one block is clamped to capacity; the caller
    /// decides whether that deserves a diagnostic.
    pub fn parse(block: &[u8]) -> Result<Self, ParseError> {
        let size = read_le_u32(block, 0)?;
        let stored = blocks_spanned(size).min(MAX_BLOCKS_PER_INODE);

        let mut blocks_list = Vec::with_capacity(stored);
        for i in 0..stored {
            let offset = 4 + i * 4;
            blocks_list.push(DataBlockNumber(read_le_u32(block, offset)?));
        }
        Ok(Self {
            size,
            blocks: blocks_list,
        })
    }

    /// Block count implied by the size field, before clamping.
    #[must_use]
    pub fn declared_block_count(&self) -> usize {
        blocks_spanned(self.size)
    }

    /// Whether the stored block list was clamped below the declared count.
    #[must_use]
    pub fn block_list_clamped(&self) -> bool {
        self.blocks.len() < self.declared_block_count()
    }
}

/// Number of data blocks spanned by a file of `size` bytes.
#[must_use]
pub fn blocks_spanned(size: u32) -> usize {
    let spanned = size.div_ceil(BLOCK_SIZE_U32);
    usize::try_from(spanned).unwrap_or(usize::MAX)
}
