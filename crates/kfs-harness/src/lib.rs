#![forbid(unsafe_code)]
//! Test harness for the KISS filesystem driver.
//!
//! [`ImageBuilder`] synthesizes images byte-for-byte in the on-disk layout,
//! including deliberately hostile ones (over-claimed counts, dangling inode
//! numbers, out-of-range block indices). [`ArenaMapper`] is a
//! [`LargePageMapper`] over a simulated physical arena, so the boot path can
//! be exercised end to end without a kernel underneath.

use anyhow::{Result, bail, ensure};
use kfs::{ImageSource, LargePageMapper, MappedImage, PhysFrame, PhysRange, WindowBase};
use kfs_error::KfsError;
use kfs_types::{
    BLOCK_SIZE, DENTRY_RECORD_LEN, LARGE_PAGE_SIZE, MAX_ENTRIES, MAX_NAME_LEN,
    SUPERBLOCK_HEADER_LEN, align_up,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RawDentry {
    name: Vec<u8>,
    entry_type: u32,
    inode: u32,
}

#[derive(Debug, Clone)]
enum RawInode {
    /// Content laid out into sequentially allocated data blocks.
    Content(Vec<u8>),
    /// Explicit size and block list, exactly as given.
    Explicit { size: u32, blocks: Vec<u32> },
}

/// Builds KISS images in memory.
///
/// The honest path (`directory`/`device`/`file`) lays structures out
/// consistently; the raw knobs (`dentry_raw`, `file_with_blocks`,
/// `declare_*`, `pad_to_blocks`) exist to synthesize malformed images for
/// adversarial tests.
#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
    dentries: Vec<RawDentry>,
    inodes: Vec<RawInode>,
    declared_dentry_count: Option<u32>,
    declared_inode_count: Option<u32>,
    declared_data_block_count: Option<u32>,
    pad_to_blocks: Option<u64>,
}

impl ImageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory dentry (conventionally "." first, as slot 0).
    pub fn directory(&mut self, name: &[u8]) -> &mut Self {
        self.dentries.push(RawDentry {
            name: name.to_vec(),
            entry_type: 1,
            inode: 0,
        });
        self
    }

    /// Add a special-device dentry.
    pub fn device(&mut self, name: &[u8]) -> &mut Self {
        self.dentries.push(RawDentry {
            name: name.to_vec(),
            entry_type: 0,
            inode: 0,
        });
        self
    }

    /// Add a regular file: a dentry, an inode, and its data blocks.
    pub fn file(&mut self, name: &[u8], content: &[u8]) -> &mut Self {
        let inode = u32::try_from(self.inodes.len()).unwrap_or(u32::MAX);
        self.dentries.push(RawDentry {
            name: name.to_vec(),
            entry_type: 2,
            inode,
        });
        self.inodes.push(RawInode::Content(content.to_vec()));
        self
    }

    /// Add a regular-file dentry whose inode record carries an explicit
    /// size and block list; nothing is allocated for it.
    pub fn file_with_blocks(&mut self, name: &[u8], size: u32, blocks: &[u32]) -> &mut Self {
        let inode = u32::try_from(self.inodes.len()).unwrap_or(u32::MAX);
        self.dentries.push(RawDentry {
            name: name.to_vec(),
            entry_type: 2,
            inode,
        });
        self.inodes.push(RawInode::Explicit {
            size,
            blocks: blocks.to_vec(),
        });
        self
    }

    /// Add a dentry with an arbitrary type tag and inode number.
    pub fn dentry_raw(&mut self, name: &[u8], entry_type: u32, inode: u32) -> &mut Self {
        self.dentries.push(RawDentry {
            name: name.to_vec(),
            entry_type,
            inode,
        });
        self
    }

    /// Override the superblock's dentry count.
    pub fn declare_dentry_count(&mut self, count: u32) -> &mut Self {
        self.declared_dentry_count = Some(count);
        self
    }

    /// Override the superblock's inode count.
    pub fn declare_inode_count(&mut self, count: u32) -> &mut Self {
        self.declared_inode_count = Some(count);
        self
    }

    /// Override the superblock's data-block count.
    pub fn declare_data_block_count(&mut self, count: u32) -> &mut Self {
        self.declared_data_block_count = Some(count);
        self
    }

    /// Grow the image to at least this many raw blocks with zero fill.
    pub fn pad_to_blocks(&mut self, blocks: u64) -> &mut Self {
        self.pad_to_blocks = Some(blocks);
        self
    }

    /// Serialize the image.
    pub fn build(&self) -> Result<Vec<u8>> {
        ensure!(
            self.dentries.len() <= MAX_ENTRIES,
            "block 0 holds at most {MAX_ENTRIES} dentries, got {}",
            self.dentries.len()
        );
        ensure!(
            self.inodes.len() <= MAX_ENTRIES,
            "at most {MAX_ENTRIES} inodes supported, got {}",
            self.inodes.len()
        );
        for dentry in &self.dentries {
            ensure!(
                dentry.name.len() <= MAX_NAME_LEN,
                "name longer than {MAX_NAME_LEN} bytes: {:?}",
                dentry.name
            );
        }

        // Resolve the data-block layout first: logical block j lands at raw
        // block 1 + inode_count + j.
        let mut data_blocks: Vec<Vec<u8>> = Vec::new();
        let mut inode_blocks: Vec<Vec<u8>> = Vec::new();
        for inode in &self.inodes {
            let mut block = Vec::with_capacity(BLOCK_SIZE);
            match inode {
                RawInode::Content(content) => {
                    push_u32(&mut block, u32::try_from(content.len())?);
                    for chunk in content.chunks(BLOCK_SIZE) {
                        push_u32(&mut block, u32::try_from(data_blocks.len())?);
                        let mut data = chunk.to_vec();
                        data.resize(BLOCK_SIZE, 0);
                        data_blocks.push(data);
                    }
                }
                RawInode::Explicit { size, blocks } => {
                    push_u32(&mut block, *size);
                    for index in blocks {
                        push_u32(&mut block, *index);
                    }
                }
            }
            if block.len() > BLOCK_SIZE {
                bail!("inode record overflows its block: {} bytes", block.len());
            }
            block.resize(BLOCK_SIZE, 0);
            inode_blocks.push(block);
        }

        let mut image = Vec::new();
        push_u32(
            &mut image,
            self.declared_dentry_count
                .unwrap_or(u32::try_from(self.dentries.len())?),
        );
        push_u32(
            &mut image,
            self.declared_inode_count
                .unwrap_or(u32::try_from(self.inodes.len())?),
        );
        push_u32(
            &mut image,
            self.declared_data_block_count
                .unwrap_or(u32::try_from(data_blocks.len())?),
        );
        image.resize(SUPERBLOCK_HEADER_LEN, 0);

        for dentry in &self.dentries {
            let mut field = [0_u8; MAX_NAME_LEN];
            field[..dentry.name.len()].copy_from_slice(&dentry.name);
            image.extend_from_slice(&field);
            push_u32(&mut image, dentry.entry_type);
            push_u32(&mut image, dentry.inode);
            image.resize(image.len() + DENTRY_RECORD_LEN - MAX_NAME_LEN - 8, 0);
        }
        image.resize(BLOCK_SIZE, 0);

        for block in &inode_blocks {
            image.extend_from_slice(block);
        }
        for block in &data_blocks {
            image.extend_from_slice(block);
        }

        if let Some(blocks) = self.pad_to_blocks {
            let target = usize::try_from(blocks)?
                .checked_mul(BLOCK_SIZE)
                .ok_or_else(|| anyhow::anyhow!("pad_to_blocks overflows"))?;
            if target > image.len() {
                image.resize(target, 0);
            }
        }
        Ok(image)
    }

    /// Serialize and wrap as a [`MappedImage`] (hosted path, offset 0).
    pub fn build_image(&self) -> Result<MappedImage> {
        Ok(MappedImage::from_bytes(self.build()?))
    }
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

// ── Simulated boot environment ──────────────────────────────────────────────

/// A [`LargePageMapper`] over a simulated physical arena.
///
/// `fail_reserve` / `fail_page` inject the two mapping failure modes the
/// loader must treat as fatal.
pub struct ArenaMapper {
    arena: Arc<[u8]>,
    windows: Vec<Vec<Option<u64>>>,
    pub fail_reserve: bool,
    pub fail_page: Option<usize>,
}

impl ArenaMapper {
    /// Place `module` into a fresh arena at byte `offset`, returning the
    /// mapper and the module's physical range.
    pub fn with_module(module: &[u8], offset: u64) -> Result<(Self, PhysRange)> {
        let len = u64::try_from(module.len())?;
        let end = offset
            .checked_add(len)
            .ok_or_else(|| anyhow::anyhow!("module range overflows"))?;
        let arena_len = align_up(end, LARGE_PAGE_SIZE)
            .ok_or_else(|| anyhow::anyhow!("arena size overflows"))?;
        let mut arena = vec![0_u8; usize::try_from(arena_len)?];
        let at = usize::try_from(offset)?;
        arena[at..at + module.len()].copy_from_slice(module);

        Ok((
            Self {
                arena: arena.into(),
                windows: Vec::new(),
                fail_reserve: false,
                fail_page: None,
            },
            PhysRange { start: offset, end },
        ))
    }
}

impl LargePageMapper for ArenaMapper {
    fn reserve(&mut self, pages: usize) -> Option<WindowBase> {
        if self.fail_reserve {
            return None;
        }
        self.windows.push(vec![None; pages]);
        u64::try_from(self.windows.len() - 1).ok().map(WindowBase)
    }

    fn map_page(
        &mut self,
        base: WindowBase,
        index: usize,
        frame: PhysFrame,
        _writable: bool,
    ) -> bool {
        if self.fail_page == Some(index) {
            return false;
        }
        let Some(window) = usize::try_from(base.0)
            .ok()
            .and_then(|id| self.windows.get_mut(id))
        else {
            return false;
        };
        let Some(slot) = window.get_mut(index) else {
            return false;
        };
        *slot = Some(frame.0);
        true
    }

    fn window(&self, base: WindowBase, _len: u64) -> Box<dyn ImageSource> {
        let frames = usize::try_from(base.0)
            .ok()
            .and_then(|id| self.windows.get(id))
            .map(|pages| pages.iter().map(|f| f.unwrap_or(u64::MAX)).collect())
            .unwrap_or_default();
        Box::new(ArenaWindow {
            arena: Arc::clone(&self.arena),
            frames,
        })
    }
}

/// Page-walking view of the arena, as the established window would read.
struct ArenaWindow {
    arena: Arc<[u8]>,
    frames: Vec<u64>,
}

impl ImageSource for ArenaWindow {
    fn len_bytes(&self) -> u64 {
        u64::try_from(self.frames.len()).unwrap_or(u64::MAX) * LARGE_PAGE_SIZE
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> kfs_error::Result<()> {
        let buf_len = buf.len();
        let oob = || KfsError::ImageBounds {
            offset,
            len: buf_len,
            image_len: self.len_bytes(),
        };

        let mut offset = offset;
        let mut copied = 0_usize;
        while copied < buf.len() {
            let page = usize::try_from(offset / LARGE_PAGE_SIZE).map_err(|_| oob())?;
            let in_page = offset % LARGE_PAGE_SIZE;
            let frame = self.frames.get(page).copied().ok_or_else(oob)?;
            let start = usize::try_from(frame + in_page).map_err(|_| oob())?;
            let chunk = usize::try_from(LARGE_PAGE_SIZE - in_page)
                .map_err(|_| oob())?
                .min(buf.len() - copied);
            let end = start.checked_add(chunk).ok_or_else(oob)?;
            if end > self.arena.len() {
                return Err(oob());
            }
            buf[copied..copied + chunk].copy_from_slice(&self.arena[start..end]);
            copied += chunk;
            offset += u64::try_from(chunk).map_err(|_| oob())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfs_ondisk::Superblock;

    #[test]
    fn builder_lays_out_superblock_and_dentries() {
        let image = ImageBuilder::new()
            .directory(b".")
            .file(b"frame0.txt", b"hello world!")
            .build()
            .expect("build");

        // superblock, one inode block, one data block
        assert_eq!(image.len(), BLOCK_SIZE * 3);
        let sb = Superblock::parse(&image).expect("superblock");
        assert_eq!(sb.dentry_count, 2);
        assert_eq!(sb.inode_count, 1);
        assert_eq!(sb.total_data_block_count, 1);

        // Data lives past the superblock and inode table.
        assert_eq!(&image[BLOCK_SIZE * 2..BLOCK_SIZE * 2 + 12], b"hello world!");
    }

    #[test]
    fn builder_rejects_oversized_names_and_tables() {
        assert!(ImageBuilder::new().file(&[b'x'; 33], b"").build().is_err());

        let mut builder = ImageBuilder::new();
        for i in 0..=MAX_ENTRIES {
            builder.device(format!("dev{i}").as_bytes());
        }
        assert!(builder.build().is_err());
    }

    #[test]
    fn builder_padding_grows_image() {
        let image = ImageBuilder::new()
            .pad_to_blocks(64)
            .build()
            .expect("build");
        assert_eq!(image.len(), BLOCK_SIZE * 64);
    }

    #[test]
    fn arena_mapper_round_trips_module_bytes() {
        let module = b"kiss image bytes".to_vec();
        let offset = LARGE_PAGE_SIZE + 12 * 1024;
        let (mut mapper, range) = ArenaMapper::with_module(&module, offset).expect("arena");

        let image = kfs::map_boot_module(&mut mapper, range).expect("map");
        let mut buf = vec![0_u8; module.len()];
        image.read_exact_at(0, &mut buf).expect("read");
        assert_eq!(buf, module);
    }
}
