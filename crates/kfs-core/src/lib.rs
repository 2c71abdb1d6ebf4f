#![forbid(unsafe_code)]
//! KISS filesystem core.
//!
//! One-shot image loader, the decoded dentry/inode tables and name index,
//! and the descriptor call surface (`open`/`read`/`write`/`close`/`fstat`/
//! `can_seek`/`file_size`) consumed by the kernel's file-descriptor layer.
//!
//! Everything is immutable after [`KissFs::load`] returns: the tables and
//! index may be read concurrently without synchronization, and each
//! [`Descriptor`] is exclusively owned by the caller that opened it.

use kfs_block::BlockAccessor;
use kfs_types::{BLOCK_SIZE, BLOCK_SIZE_U64, MAX_ENTRIES, u64_to_usize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub use kfs_block::{
    ImageSource, LargePageMapper, MapError, MappedImage, MemoryImage, PhysFrame, PhysRange,
    WindowBase, map_boot_module,
};
pub use kfs_error::{KfsError, Result};
pub use kfs_ondisk::{DentryRecord, EntryType, InodeRecord, Superblock};
pub use kfs_types::{DataBlockNumber, DentryIndex, FileName, InodeNumber, ParseError};

/// Options controlling how an image is loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Reject superblock counts that exceed table capacity instead of
    /// clamping them. The default preserves the format's tolerant
    /// behavior: counts are clamped and excess entries ignored.
    pub strict_geometry: bool,
}

/// Why an image failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The boot module could not be mapped into the address space.
    ///
    /// Unrecoverable: the filesystem is foundational, so the boot sequence
    /// halts on this instead of continuing with a partially initialized
    /// driver. There is no retry and no degraded mode.
    #[error("boot module mapping failed: {0}")]
    MappingFailed(#[from] MapError),

    /// The image ended inside a structure the superblock said exists.
    #[error("image decode failed: {0}")]
    Parse(#[from] ParseError),

    /// A superblock count exceeds table capacity (strict mode only).
    #[error("image geometry rejected: {field} = {value} exceeds {max}")]
    Geometry {
        field: &'static str,
        value: u32,
        max: usize,
    },
}

impl From<LoadError> for KfsError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MappingFailed(map) => Self::from(map),
            LoadError::Parse(parse) => Self::Parse(parse.to_string()),
            LoadError::Geometry { .. } => Self::Parse(err.to_string()),
        }
    }
}

/// Enumeration cursor over the shared dentry table.
///
/// Holds an index range only; the table itself stays owned by [`KissFs`]
/// and is borrowed at each `read` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirCursor {
    next: u32,
    end: u32,
}

/// Per-open handle, created by [`KissFs::open`] and consumed by
/// [`KissFs::close`].
///
/// Directory descriptors carry mutable cursor state and must not be shared
/// across concurrent callers; file descriptors are stateless (the offset is
/// caller-supplied on every read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// An open directory, enumerated one entry per `read`.
    Directory(DirCursor),
    /// An open regular file.
    File { inode: InodeNumber },
    /// A special device; no data blocks back it, reads yield zero bytes.
    Device,
}

/// File metadata as reported by [`KissFs::fstat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub mode: EntryType,
    /// Byte size; present for regular files only.
    pub size: Option<u32>,
}

/// The loaded filesystem: decoded tables, name index, and block accessor.
#[derive(Debug)]
pub struct KissFs {
    superblock: Superblock,
    dentries: Vec<DentryRecord>,
    inodes: Vec<InodeRecord>,
    name_index: HashMap<FileName, DentryIndex>,
    accessor: BlockAccessor,
}

impl KissFs {
    /// Map the boot-supplied module range and load the image from it.
    ///
    /// A [`LoadError::MappingFailed`] from this path is fatal to boot.
    pub fn from_boot_range(
        mapper: &mut dyn LargePageMapper,
        range: PhysRange,
    ) -> std::result::Result<Self, LoadError> {
        Self::from_boot_range_with_options(mapper, range, &LoadOptions::default())
    }

    pub fn from_boot_range_with_options(
        mapper: &mut dyn LargePageMapper,
        range: PhysRange,
        options: &LoadOptions,
    ) -> std::result::Result<Self, LoadError> {
        let image = map_boot_module(mapper, range)?;
        Self::load_with_options(image, options)
    }

    /// Decode an already-mapped image with default options.
    pub fn load(image: MappedImage) -> std::result::Result<Self, LoadError> {
        Self::load_with_options(image, &LoadOptions::default())
    }

    /// Decode an already-mapped image: superblock, dentry table, inode
    /// table, name index.
    ///
    /// Counts beyond table capacity are clamped (or rejected under
    /// `strict_geometry`); a truncated image is a parse error. Nothing else
    /// is validated: the format has no versioning or checksum, and the
    /// read path's bounds checks are authoritative.
    pub fn load_with_options(
        image: MappedImage,
        options: &LoadOptions,
    ) -> std::result::Result<Self, LoadError> {
        let block0 = fetch_block(&image, 0)?;
        let superblock = Superblock::parse(&block0)?;

        if options.strict_geometry {
            if superblock.clamped_dentry_count() < count_as_usize(superblock.dentry_count) {
                return Err(LoadError::Geometry {
                    field: "dentry_count",
                    value: superblock.dentry_count,
                    max: MAX_ENTRIES,
                });
            }
            if superblock.clamped_inode_count() < count_as_usize(superblock.inode_count) {
                return Err(LoadError::Geometry {
                    field: "inode_count",
                    value: superblock.inode_count,
                    max: MAX_ENTRIES,
                });
            }
        } else if superblock.overclaims_capacity() {
            warn!(
                dentry_count = superblock.dentry_count,
                inode_count = superblock.inode_count,
                max = MAX_ENTRIES,
                "superblock counts exceed table capacity, clamping"
            );
        }

        let dentry_count = superblock.clamped_dentry_count();
        let mut dentries = Vec::with_capacity(dentry_count);
        for index in 0..dentry_count {
            dentries.push(DentryRecord::parse_at(&block0, index)?);
        }

        let inode_count = superblock.clamped_inode_count();
        let mut inodes = Vec::with_capacity(inode_count);
        for index in 0..inode_count {
            let block_no = u64::try_from(index + 1).map_err(|_| ParseError::IntegerConversion {
                field: "inode_block",
            })?;
            let block = fetch_block(&image, block_no)?;
            let record = InodeRecord::parse(&block)?;
            if record.block_list_clamped() {
                warn!(
                    inode = index,
                    size = record.size,
                    stored = record.blocks.len(),
                    "inode block list clamped to capacity"
                );
            }
            inodes.push(record);
        }

        let mut name_index = HashMap::with_capacity(dentries.len());
        for (index, dentry) in dentries.iter().enumerate() {
            let index = u32::try_from(index).map_err(|_| ParseError::IntegerConversion {
                field: "dentry_index",
            })?;
            // First occurrence wins: a duplicate name must not remap
            // lookups to a later entry.
            name_index.entry(dentry.name).or_insert(DentryIndex(index));
        }

        let inode_count = u32::try_from(inodes.len()).map_err(|_| {
            ParseError::IntegerConversion {
                field: "inode_count",
            }
        })?;
        let accessor = BlockAccessor::new(image, inode_count);
        debug!(
            dentry_count = dentries.len(),
            inode_count,
            total_blocks = accessor.block_count(),
            "kiss image loaded"
        );

        Ok(Self {
            superblock,
            dentries,
            inodes,
            name_index,
            accessor,
        })
    }

    // ── Descriptor surface ──────────────────────────────────────────────

    /// Open a name, producing a descriptor owned by the caller.
    ///
    /// The lookup key is the canonical form of `name` (same rule the index
    /// was built with). No state outside the returned descriptor changes.
    pub fn open(&self, name: &[u8]) -> Result<Descriptor> {
        let key = FileName::new(name);
        let Some(dentry) = self
            .name_index
            .get(&key)
            .and_then(|index| self.dentry_at(*index))
        else {
            return Err(KfsError::NotFound(key.to_string()));
        };

        Ok(match dentry.entry_type {
            EntryType::Directory => Descriptor::Directory(DirCursor {
                next: 0,
                end: self.dentry_count_u32(),
            }),
            EntryType::SpecialDevice => Descriptor::Device,
            EntryType::RegularFile => Descriptor::File {
                inode: dentry.inode,
            },
        })
    }

    /// Read through a descriptor.
    ///
    /// Directories are cursor-driven and ignore `offset`: each call yields
    /// the next entry's name (bounded by the buffer), and end-of-directory
    /// is a zero-byte read, not an error. Files are positional. Devices
    /// yield zero bytes; their handlers live elsewhere.
    pub fn read(&self, descriptor: &mut Descriptor, offset: u32, buf: &mut [u8]) -> Result<usize> {
        match descriptor {
            Descriptor::Directory(cursor) => Ok(self.read_dir(cursor, buf)),
            Descriptor::File { inode } => self.read_data(*inode, offset, buf),
            Descriptor::Device => Ok(0),
        }
    }

    /// Writes are rejected unconditionally; the image is immutable.
    pub fn write(&self, _descriptor: &mut Descriptor, _offset: u32, _buf: &[u8]) -> Result<usize> {
        Err(KfsError::ReadOnly)
    }

    /// Release a descriptor. Nothing else was allocated per open.
    pub fn close(&self, descriptor: Descriptor) {
        drop(descriptor);
    }

    pub fn fstat(&self, descriptor: &Descriptor) -> Stat {
        match descriptor {
            Descriptor::Directory(_) => Stat {
                mode: EntryType::Directory,
                size: None,
            },
            Descriptor::Device => Stat {
                mode: EntryType::SpecialDevice,
                size: None,
            },
            Descriptor::File { inode } => Stat {
                mode: EntryType::RegularFile,
                size: self.inode_size(*inode),
            },
        }
    }

    /// Only regular files are seekable.
    #[must_use]
    pub fn can_seek(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::File { .. })
    }

    /// Byte size of the opened file; `None` for anything but a regular
    /// file.
    #[must_use]
    pub fn file_size(&self, descriptor: &Descriptor) -> Option<u32> {
        match descriptor {
            Descriptor::File { inode } => self.inode_size(*inode),
            Descriptor::Directory(_) | Descriptor::Device => None,
        }
    }

    // ── Dentry-level lookups ────────────────────────────────────────────

    /// Look a dentry up by name without opening it.
    #[must_use]
    pub fn dentry_by_name(&self, name: &[u8]) -> Option<&DentryRecord> {
        self.name_index
            .get(&FileName::new(name))
            .and_then(|index| self.dentry_at(*index))
    }

    /// Dentry at `index`; the valid range is `0..dentry_count`, exclusive
    /// at the top.
    #[must_use]
    pub fn dentry_at(&self, index: DentryIndex) -> Option<&DentryRecord> {
        usize::try_from(index.0)
            .ok()
            .and_then(|index| self.dentries.get(index))
    }

    #[must_use]
    pub fn dentry_count(&self) -> usize {
        self.dentries.len()
    }

    #[must_use]
    pub fn inode_count(&self) -> usize {
        self.inodes.len()
    }

    /// Number of whole blocks in the raw module extent, the authoritative
    /// bound for block access. Independent of the superblock's claim.
    #[must_use]
    pub fn block_count(&self) -> u64 {
        self.accessor.block_count()
    }

    /// The decoded superblock, as claimed by the image.
    #[must_use]
    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    // ── Read path ───────────────────────────────────────────────────────

    /// Positioned read of a regular file's data.
    ///
    /// Walks the inode's block list from the block containing `offset`,
    /// copying per-block chunks until the request, the file, or the block
    /// list is exhausted. A bounds failure aborts the whole read; it is
    /// never surfaced as a short success.
    pub fn read_data(&self, inode: InodeNumber, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let Some(record) = usize::try_from(inode.0)
            .ok()
            .and_then(|index| self.inodes.get(index))
        else {
            return Err(KfsError::InvalidInode {
                inode: inode.0,
                inode_count: self.inode_count_u32(),
            });
        };

        if offset >= record.size {
            return Ok(0);
        }

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let size = usize::try_from(record.size).unwrap_or(usize::MAX);
        let mut remaining_file = size - offset;
        let mut remaining_request = buf.len();
        let mut in_block = offset % BLOCK_SIZE;
        let mut copied = 0_usize;

        for block in record.blocks.iter().skip(offset / BLOCK_SIZE) {
            if remaining_request == 0 || remaining_file == 0 {
                break;
            }
            let chunk = remaining_request
                .min(remaining_file)
                .min(BLOCK_SIZE - in_block);
            let in_block_offset = u32::try_from(in_block).unwrap_or(u32::MAX);
            self.accessor
                .read_chunk(*block, in_block_offset, &mut buf[copied..copied + chunk])?;
            copied += chunk;
            remaining_request -= chunk;
            remaining_file -= chunk;
            in_block = 0;
        }

        Ok(copied)
    }

    fn read_dir(&self, cursor: &mut DirCursor, buf: &mut [u8]) -> usize {
        if cursor.next >= cursor.end {
            return 0;
        }
        let Some(dentry) = usize::try_from(cursor.next)
            .ok()
            .and_then(|index| self.dentries.get(index))
        else {
            return 0;
        };

        let copied = dentry.name.len().min(buf.len());
        buf[..copied].copy_from_slice(&dentry.name.as_bytes()[..copied]);
        cursor.next += 1;
        copied
    }

    fn inode_size(&self, inode: InodeNumber) -> Option<u32> {
        usize::try_from(inode.0)
            .ok()
            .and_then(|index| self.inodes.get(index))
            .map(|record| record.size)
    }

    fn dentry_count_u32(&self) -> u32 {
        u32::try_from(self.dentries.len()).unwrap_or(u32::MAX)
    }

    fn inode_count_u32(&self) -> u32 {
        u32::try_from(self.inodes.len()).unwrap_or(u32::MAX)
    }
}

/// Fetch one block's bytes during load, shortened at the image end.
///
/// The parse layer turns a short block into the right `InsufficientData`
/// error, so truncation is reported against the structure being decoded.
fn fetch_block(image: &MappedImage, block: u64) -> std::result::Result<Vec<u8>, LoadError> {
    let start = block
        .checked_mul(BLOCK_SIZE_U64)
        .ok_or(ParseError::IntegerConversion {
            field: "block_offset",
        })?;
    let avail = image.len_bytes().saturating_sub(start).min(BLOCK_SIZE_U64);
    let avail = u64_to_usize(avail, "block_len")?;

    let mut buf = vec![0_u8; avail];
    if avail > 0 {
        image
            .read_exact_at(start, &mut buf)
            .map_err(|_| ParseError::InsufficientData {
                needed: avail,
                offset: u64_to_usize(start, "block_offset").unwrap_or(usize::MAX),
                actual: 0,
            })?;
    }
    Ok(buf)
}

fn count_as_usize(count: u32) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfs_types::{DENTRY_RECORD_LEN, MAX_NAME_LEN, SUPERBLOCK_HEADER_LEN};

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Lay out a minimal image: dentries in block 0, one inode block per
    /// file, data blocks appended in file order.
    fn build_image(entries: &[(&[u8], u32, u32)], files: &[&[u8]]) -> MappedImage {
        let mut data_blocks: Vec<&[u8]> = Vec::new();
        let mut inode_blocks = Vec::new();
        for content in files {
            let mut block = Vec::with_capacity(BLOCK_SIZE);
            push_u32(&mut block, u32::try_from(content.len()).expect("size"));
            for chunk in content.chunks(BLOCK_SIZE) {
                push_u32(&mut block, u32::try_from(data_blocks.len()).expect("index"));
                data_blocks.push(chunk);
            }
            block.resize(BLOCK_SIZE, 0);
            inode_blocks.push(block);
        }

        let mut image = Vec::new();
        push_u32(&mut image, u32::try_from(entries.len()).expect("dentries"));
        push_u32(&mut image, u32::try_from(files.len()).expect("inodes"));
        push_u32(&mut image, u32::try_from(data_blocks.len()).expect("blocks"));
        image.resize(SUPERBLOCK_HEADER_LEN, 0);
        for (name, entry_type, inode) in entries {
            let mut field = [0_u8; MAX_NAME_LEN];
            field[..name.len()].copy_from_slice(name);
            image.extend_from_slice(&field);
            push_u32(&mut image, *entry_type);
            push_u32(&mut image, *inode);
            image.resize(image.len() + DENTRY_RECORD_LEN - MAX_NAME_LEN - 8, 0);
        }
        image.resize(BLOCK_SIZE, 0);
        for block in inode_blocks {
            image.extend_from_slice(&block);
        }
        for chunk in data_blocks {
            let start = image.len();
            image.extend_from_slice(chunk);
            image.resize(start + BLOCK_SIZE, 0);
        }
        MappedImage::from_bytes(image)
    }

    fn sample_fs() -> KissFs {
        KissFs::load(build_image(
            &[(b".", 1, 0), (b"frame0.txt", 2, 0), (b"rtc", 0, 0)],
            &[b"hello world!"],
        ))
        .expect("load")
    }

    #[test]
    fn open_unknown_name_is_not_found() {
        let fs = sample_fs();
        assert_eq!(
            fs.open(b"does_not_exist"),
            Err(KfsError::NotFound("does_not_exist".into()))
        );
    }

    #[test]
    fn directory_enumerates_each_entry_once_in_order() {
        let fs = sample_fs();
        let mut descriptor = fs.open(b".").expect("open root");
        let mut buf = [0_u8; 64];

        let mut names = Vec::new();
        loop {
            let n = fs.read(&mut descriptor, 0, &mut buf).expect("read");
            if n == 0 {
                break;
            }
            names.push(buf[..n].to_vec());
        }
        assert_eq!(names, vec![b".".to_vec(), b"frame0.txt".to_vec(), b"rtc".to_vec()]);

        // Exhausted cursors stay exhausted.
        assert_eq!(fs.read(&mut descriptor, 0, &mut buf).expect("read"), 0);
        assert_eq!(fs.read(&mut descriptor, 0, &mut buf).expect("read"), 0);
        fs.close(descriptor);
    }

    #[test]
    fn directory_read_is_bounded_by_buffer() {
        let fs = sample_fs();
        let mut descriptor = fs.open(b".").expect("open root");
        let mut tiny = [0_u8; 4];
        // Skip "." first.
        assert_eq!(fs.read(&mut descriptor, 0, &mut tiny).expect("read"), 1);
        let n = fs.read(&mut descriptor, 0, &mut tiny).expect("read");
        assert_eq!(&tiny[..n], b"fram");
    }

    #[test]
    fn file_reads_serve_requested_ranges() {
        let fs = sample_fs();
        let mut descriptor = fs.open(b"frame0.txt").expect("open");
        let mut buf = [0_u8; 20];

        let n = fs.read(&mut descriptor, 0, &mut buf).expect("read");
        assert_eq!(&buf[..n], b"hello world!");

        let n = fs.read(&mut descriptor, 6, &mut buf).expect("read");
        assert_eq!(&buf[..n], b"world!");

        let mut small = [0_u8; 5];
        assert_eq!(fs.read(&mut descriptor, 12, &mut small).expect("read"), 0);
        assert_eq!(fs.read(&mut descriptor, 200, &mut small).expect("read"), 0);
    }

    #[test]
    fn write_always_fails_and_changes_nothing() {
        let fs = sample_fs();
        let mut descriptor = fs.open(b"frame0.txt").expect("open");
        assert_eq!(
            fs.write(&mut descriptor, 0, b"overwrite"),
            Err(KfsError::ReadOnly)
        );

        let mut buf = [0_u8; 20];
        let n = fs.read(&mut descriptor, 0, &mut buf).expect("read");
        assert_eq!(&buf[..n], b"hello world!");
    }

    #[test]
    fn fstat_reports_mode_and_size() {
        let fs = sample_fs();

        let file = fs.open(b"frame0.txt").expect("open file");
        assert_eq!(
            fs.fstat(&file),
            Stat {
                mode: EntryType::RegularFile,
                size: Some(12),
            }
        );
        assert!(fs.can_seek(&file));
        assert_eq!(fs.file_size(&file), Some(12));

        let dir = fs.open(b".").expect("open dir");
        assert_eq!(fs.fstat(&dir).mode, EntryType::Directory);
        assert_eq!(fs.fstat(&dir).size, None);
        assert!(!fs.can_seek(&dir));
        assert_eq!(fs.file_size(&dir), None);

        let dev = fs.open(b"rtc").expect("open device");
        assert_eq!(fs.fstat(&dev).mode, EntryType::SpecialDevice);
        assert!(!fs.can_seek(&dev));
        assert_eq!(fs.file_size(&dev), None);
    }

    #[test]
    fn device_reads_yield_zero_bytes() {
        let fs = sample_fs();
        let mut descriptor = fs.open(b"rtc").expect("open device");
        let mut buf = [0_u8; 8];
        assert_eq!(fs.read(&mut descriptor, 0, &mut buf).expect("read"), 0);
    }

    #[test]
    fn invalid_inode_is_an_error_not_a_read() {
        // Dentry claims inode 9 but only one inode exists.
        let fs = KissFs::load(build_image(
            &[(b"ghost", 2, 9)],
            &[b"payload"],
        ))
        .expect("load");
        let mut descriptor = fs.open(b"ghost").expect("open");
        let mut buf = [0_u8; 8];
        assert_eq!(
            fs.read(&mut descriptor, 0, &mut buf),
            Err(KfsError::InvalidInode {
                inode: 9,
                inode_count: 1,
            })
        );
    }

    #[test]
    fn duplicate_names_resolve_to_first_dentry() {
        let fs = KissFs::load(build_image(
            &[(b"twin", 2, 0), (b"twin", 2, 1)],
            &[b"first", b"second"],
        ))
        .expect("load");
        let mut descriptor = fs.open(b"twin").expect("open");
        let mut buf = [0_u8; 8];
        let n = fs.read(&mut descriptor, 0, &mut buf).expect("read");
        assert_eq!(&buf[..n], b"first");
    }

    #[test]
    fn dentry_at_upper_bound_is_exclusive() {
        let fs = sample_fs();
        let count = u32::try_from(fs.dentry_count()).expect("count");
        assert!(fs.dentry_at(DentryIndex(count - 1)).is_some());
        assert!(fs.dentry_at(DentryIndex(count)).is_none());
    }

    #[test]
    fn dentry_by_name_uses_canonical_lookup() {
        let fs = sample_fs();
        let dentry = fs.dentry_by_name(b"frame0.txt\0trailing").expect("dentry");
        assert_eq!(dentry.name.as_bytes(), b"frame0.txt");
        assert_eq!(dentry.entry_type, EntryType::RegularFile);
    }

    #[test]
    fn strict_geometry_rejects_overclaimed_counts() {
        let mut bytes = Vec::new();
        push_u32(&mut bytes, 1000); // dentry_count
        push_u32(&mut bytes, 0);
        push_u32(&mut bytes, 0);
        bytes.resize(BLOCK_SIZE, 0);

        let err = KissFs::load_with_options(
            MappedImage::from_bytes(bytes.clone()),
            &LoadOptions {
                strict_geometry: true,
            },
        )
        .expect_err("strict load must fail");
        assert!(matches!(
            err,
            LoadError::Geometry {
                field: "dentry_count",
                value: 1000,
                ..
            }
        ));

        // The default mode clamps the same image instead.
        let fs = KissFs::load(MappedImage::from_bytes(bytes)).expect("tolerant load");
        assert_eq!(fs.dentry_count(), MAX_ENTRIES);
    }

    #[test]
    fn truncated_image_is_a_parse_error() {
        let err = KissFs::load(MappedImage::from_bytes(vec![0_u8; 10])).expect_err("load");
        assert!(matches!(err, LoadError::Parse(_)));
        // The boundary conversion surfaces it as a parse failure too.
        assert!(matches!(KfsError::from(err), KfsError::Parse(_)));
    }
}
