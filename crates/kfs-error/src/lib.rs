#![forbid(unsafe_code)]
//! Error types for the KISS filesystem driver.
//!
//! Two-layer error model: `kfs_types::ParseError` covers on-disk format
//! violations detected while decoding bytes; [`KfsError`] (this crate) is the
//! user-facing error returned by the descriptor call surface. This crate is
//! intentionally independent of `kfs-types` so the dependency graph stays
//! acyclic; parse failures are converted at the `kfs-core` boundary, where
//! load-time context is known.
//!
//! Every variant maps to exactly one POSIX errno via [`KfsError::to_errno`].
//! The mapping is exhaustive (no wildcard arms) so adding a variant is a
//! compile error until its errno is assigned.

use thiserror::Error;

/// Unified error type for all descriptor-surface operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KfsError {
    /// No dentry with the requested name exists in the image.
    #[error("not found: {0}")]
    NotFound(String),

    /// The image is read-only by construction; every write is rejected.
    #[error("read-only filesystem")]
    ReadOnly,

    /// An inode number at or past the decoded inode count.
    #[error("invalid inode {inode} (inode count {inode_count})")]
    InvalidInode { inode: u32, inode_count: u32 },

    /// A data-block reference resolved to a raw block at or past the
    /// image's actual block count. The read is aborted, never partially
    /// reported.
    #[error("block {raw_block} out of range (image holds {block_count} blocks)")]
    BlockOutOfRange { raw_block: u64, block_count: u64 },

    /// A byte access outside the mapped image window.
    #[error("image access out of bounds: offset={offset} len={len} image_len={image_len}")]
    ImageBounds {
        offset: u64,
        len: usize,
        image_len: u64,
    },

    /// Parse-layer failure surfaced to the caller, as a string so this
    /// crate stays independent of the parsing types.
    #[error("parse error: {0}")]
    Parse(String),

    /// The boot-module mapping bridge failed. Load-time only; the boot
    /// sequence treats this as unrecoverable.
    #[error("mapping failed: {0}")]
    Mapping(String),
}

impl KfsError {
    /// Convert this error into a POSIX errno.
    ///
    /// Policy notes:
    /// - `BlockOutOfRange` / `ImageBounds` → `EIO`: the image itself is
    ///   inconsistent, retrying cannot succeed against immutable bytes.
    /// - `InvalidInode` / `Parse` → `EINVAL`: structurally invalid input.
    /// - `Mapping` → `EFAULT`: the backing memory never became addressable.
    #[must_use]
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            Self::NotFound(_) => libc::ENOENT,
            Self::ReadOnly => libc::EROFS,
            Self::InvalidInode { .. } | Self::Parse(_) => libc::EINVAL,
            Self::BlockOutOfRange { .. } | Self::ImageBounds { .. } => libc::EIO,
            Self::Mapping(_) => libc::EFAULT,
        }
    }
}

/// Result alias using `KfsError`.
pub type Result<T> = std::result::Result<T, KfsError>;
