#![forbid(unsafe_code)]
//! Image access layer.
//!
//! Provides the [`ImageSource`] byte-access trait, the boot-module mapping
//! bridge that turns a physical module range into a readable [`MappedImage`]
//! through a [`LargePageMapper`] collaborator, and the [`BlockAccessor`],
//! the single choke point through which data blocks are read.

use kfs_error::{KfsError, Result};
use kfs_types::{BLOCK_SIZE_U64, BlockNumber, DataBlockNumber, LARGE_PAGE_SIZE, align_up};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Read-only byte access to a loaded image.
///
/// The image never changes after load, so there is no write or sync
/// counterpart. Implementations must bounds-check every access.
pub trait ImageSource: Send + Sync {
    /// Total length in bytes.
    fn len_bytes(&self) -> u64;

    /// Read exactly `buf.len()` bytes from `offset` into `buf`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

/// Owned in-memory image bytes.
///
/// Used by tests and hosted embeddings; the kernel path reaches the same
/// trait through the mapping bridge below.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    bytes: Arc<[u8]>,
}

impl MemoryImage {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ImageSource for MemoryImage {
    fn len_bytes(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let image_len = self.len_bytes();
        let start = usize::try_from(offset).map_err(|_| KfsError::ImageBounds {
            offset,
            len: buf.len(),
            image_len,
        })?;
        let end = start.checked_add(buf.len()).ok_or(KfsError::ImageBounds {
            offset,
            len: buf.len(),
            image_len,
        })?;
        if end > self.bytes.len() {
            return Err(KfsError::ImageBounds {
                offset,
                len: buf.len(),
                image_len,
            });
        }
        buf.copy_from_slice(&self.bytes[start..end]);
        Ok(())
    }
}

// ── Boot-module mapping bridge ──────────────────────────────────────────────

/// The boot module's raw physical extent, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysRange {
    pub start: u64,
    pub end: u64,
}

impl PhysRange {
    #[must_use]
    pub fn len_bytes(self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Base of a reserved window of large pages, as handed out by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBase(pub u64);

/// Physical address of a large-page frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysFrame(pub u64);

/// The virtual-memory collaborator the loader drives during boot.
///
/// Pages are [`LARGE_PAGE_SIZE`] wide. The driver reserves one contiguous
/// window, maps every page of the module's aligned span into it, then reads
/// the window through [`ImageSource`].
pub trait LargePageMapper {
    /// Reserve `pages` contiguous large pages in the reserved high region.
    /// `None` means no such window is available.
    fn reserve(&mut self, pages: usize) -> Option<WindowBase>;

    /// Map window page `index` to the physical frame at `frame` with the
    /// given protection. Returns `false` if the mapping cannot be
    /// established.
    fn map_page(&mut self, base: WindowBase, index: usize, frame: PhysFrame, writable: bool)
    -> bool;

    /// Expose `len` bytes of the window for reading. Called once, after
    /// every page mapping has succeeded.
    fn window(&self, base: WindowBase, len: u64) -> Box<dyn ImageSource>;
}

/// Why the boot module could not be mapped.
///
/// Every variant is fatal to the boot sequence: the filesystem cannot exist
/// without its backing image, so the caller halts instead of continuing
/// with a partially initialized driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("boot module range is empty: start={start:#x} end={end:#x}")]
    EmptyModule { start: u64, end: u64 },

    #[error("module range overflows the address space: end={end:#x}")]
    RangeOverflow { end: u64 },

    #[error("no window of {pages} large pages available")]
    WindowExhausted { pages: usize },

    #[error("large page {index} could not be mapped to frame {frame:#x}")]
    PageMapFailed { index: usize, frame: u64 },

    #[error("mapper window shorter than the module span")]
    WindowTooSmall,
}

impl From<MapError> for KfsError {
    fn from(err: MapError) -> Self {
        Self::Mapping(err.to_string())
    }
}

/// Map the boot-supplied module range and return the effective image view.
///
/// The window covers the large-page-aligned span around the module; the
/// returned [`MappedImage`] is offset by the module's sub-page displacement
/// within its first page, so byte 0 of the image is byte `start` of the
/// module regardless of alignment.
pub fn map_boot_module(
    mapper: &mut dyn LargePageMapper,
    range: PhysRange,
) -> std::result::Result<MappedImage, MapError> {
    if range.end <= range.start {
        return Err(MapError::EmptyModule {
            start: range.start,
            end: range.end,
        });
    }

    let aligned_start = range.start & !(LARGE_PAGE_SIZE - 1);
    let aligned_end =
        align_up(range.end, LARGE_PAGE_SIZE).ok_or(MapError::RangeOverflow { end: range.end })?;
    let span = aligned_end - aligned_start;
    let pages = usize::try_from(span / LARGE_PAGE_SIZE)
        .map_err(|_| MapError::RangeOverflow { end: range.end })?;

    let base = mapper
        .reserve(pages)
        .ok_or(MapError::WindowExhausted { pages })?;

    let mut frame = aligned_start;
    for index in 0..pages {
        // The window is mapped read/write; the driver itself never writes
        // through it.
        if !mapper.map_page(base, index, PhysFrame(frame), true) {
            return Err(MapError::PageMapFailed { index, frame });
        }
        frame += LARGE_PAGE_SIZE;
    }

    debug!(
        start = range.start,
        end = range.end,
        pages,
        sub_page_offset = range.start - aligned_start,
        "boot module mapped"
    );

    let window = mapper.window(base, span);
    MappedImage::new(window, range.start - aligned_start, range.len_bytes())
        .map_err(|_| MapError::WindowTooSmall)
}

/// The mapped image: a bounded, offset view of a mapper window.
///
/// All image reads funnel through this view; nothing can read before the
/// module's first byte or past its last.
pub struct MappedImage {
    window: Box<dyn ImageSource>,
    base_offset: u64,
    len: u64,
}

impl MappedImage {
    /// Wrap `window`, exposing `len` bytes starting at `base_offset`.
    pub fn new(window: Box<dyn ImageSource>, base_offset: u64, len: u64) -> Result<Self> {
        let end = base_offset
            .checked_add(len)
            .ok_or_else(|| KfsError::Mapping("image extent overflows u64".to_owned()))?;
        if end > window.len_bytes() {
            return Err(KfsError::Mapping(format!(
                "window of {} bytes cannot hold image: base_offset={base_offset} len={len}",
                window.len_bytes()
            )));
        }
        Ok(Self {
            window,
            base_offset,
            len,
        })
    }

    /// View owned bytes as a whole image (offset 0). Hosted/test path.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let image = MemoryImage::new(bytes);
        let len = image.len_bytes();
        Self {
            window: Box::new(image),
            base_offset: 0,
            len,
        }
    }
}

impl std::fmt::Debug for MappedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedImage")
            .field("base_offset", &self.base_offset)
            .field("len", &self.len)
            .finish()
    }
}

impl ImageSource for MappedImage {
    fn len_bytes(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let oob = || KfsError::ImageBounds {
            offset,
            len: buf.len(),
            image_len: self.len,
        };
        let len_u64 = u64::try_from(buf.len()).map_err(|_| oob())?;
        let end = offset.checked_add(len_u64).ok_or_else(oob)?;
        if end > self.len {
            return Err(oob());
        }
        let physical = self.base_offset.checked_add(offset).ok_or_else(oob)?;
        self.window.read_exact_at(physical, buf)
    }
}

// ── Block accessor ──────────────────────────────────────────────────────────

/// Bounds-checked data-block reads against the mapped image.
///
/// This is the single choke point that touches data blocks: it translates a
/// logical data-block number to a raw block number by offsetting past the
/// superblock and the inode table, and rejects any raw block at or past the
/// image's actual block count, which is derived from the raw module extent
/// rather than from anything the superblock claims.
#[derive(Debug)]
pub struct BlockAccessor {
    image: MappedImage,
    inode_count: u32,
    block_count: u64,
}

impl BlockAccessor {
    #[must_use]
    pub fn new(image: MappedImage, inode_count: u32) -> Self {
        let block_count = image.len_bytes() / BLOCK_SIZE_U64;
        Self {
            image,
            inode_count,
            block_count,
        }
    }

    /// Number of whole blocks the image actually holds.
    #[must_use]
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Copy `buf.len()` bytes out of a data block, starting `in_block_offset`
    /// bytes into it.
    ///
    /// The caller bounds `buf` to the remainder of the block; this layer
    /// enforces the image boundary.
    pub fn read_chunk(
        &self,
        block: DataBlockNumber,
        in_block_offset: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        let raw = u64::from(block.0) + u64::from(self.inode_count) + 1;
        if raw >= self.block_count {
            return Err(KfsError::BlockOutOfRange {
                raw_block: raw,
                block_count: self.block_count,
            });
        }

        let Some(offset) = BlockNumber(raw)
            .to_byte_offset()
            .and_then(|o| o.checked_add(u64::from(in_block_offset)))
        else {
            return Err(KfsError::BlockOutOfRange {
                raw_block: raw,
                block_count: self.block_count,
            });
        };
        self.image.read_exact_at(offset.0, buf)
    }
}
