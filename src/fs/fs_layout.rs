//! what does our filesystem look like on disk, and in memory
//!
//! it has the following layout:
//! - block 0: superblock
//! - blocks 1..=13: inode table, 16 inodes per block
//! - blocks 14..=17: directory, 200 name slots of 16 bytes
//! - blocks 18..=1022: data
//! - block 1023: free block bitmap
use std::path::Path;

use log::{info, warn};

use crate::{
    disk::{BlockDevice, ImageDisk},
    utils::traits::OnDiskRecord,
};

use super::{
    allocator::persist_fbm, write_inode, DescriptorTable, Directory, FreeBlockMap, FsError, Inode,
    Result, SuperBlock, BLOCK_COUNT, BLOCK_SIZE, DEFAULT_MAX_OPEN_FILES, DIRECTORY_BLOCKS,
    DIRECTORY_SLOTS, DIRECTORY_START, FBM_BLOCK, INODE_TABLE_BLOCKS, INODE_TABLE_START,
    MAX_NAME_LEN, ROOT_INODE, SUPERBLOCK_BLOCK,
};

/// what to do when a loaded superblock doesn't describe our filesystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MagicPolicy {
    /// refuse to mount with [FsError::CorruptImage]
    #[default]
    Strict,
    /// log a warning and mount anyway
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    /// size of the descriptor table
    pub max_open_files: usize,
    pub magic_policy: MagicPolicy,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            magic_policy: MagicPolicy::Strict,
        }
    }
}

/// a mounted filesystem: the device plus write-through caches of
/// the superblock, the free block bitmap and the directory
#[derive(Debug)]
pub struct SimpleFs<D: BlockDevice> {
    pub(crate) disk: D,
    pub(crate) superblock: SuperBlock,
    pub(crate) fbm: FreeBlockMap,
    pub(crate) directory: Directory,
    pub(crate) descriptors: DescriptorTable,
    pub(crate) options: MountOptions,
}

impl<D: BlockDevice> SimpleFs<D> {
    /// mount the filesystem on `disk`, formatting it first when `fresh`
    pub fn mount(disk: D, fresh: bool, options: MountOptions) -> Result<Self> {
        if disk.block_size() != BLOCK_SIZE || disk.block_count() != BLOCK_COUNT {
            return Err(FsError::InvalidArgument(format!(
                "device has {} blocks of {} bytes, need {BLOCK_COUNT} blocks of {BLOCK_SIZE} bytes",
                disk.block_count(),
                disk.block_size()
            )));
        }
        let mut fs = SimpleFs {
            disk,
            superblock: SuperBlock::default(),
            fbm: FreeBlockMap::new(),
            directory: Directory::new(),
            descriptors: DescriptorTable::new(options.max_open_files),
            options,
        };
        fs.descriptors.reset();
        if fresh {
            fs.format()?;
        } else {
            fs.load()?;
        }
        Ok(fs)
    }

    /// write an empty filesystem over the whole device
    pub fn format(&mut self) -> Result<()> {
        let zeros = vec![0u8; BLOCK_SIZE * INODE_TABLE_BLOCKS];
        self.disk
            .write_blocks(INODE_TABLE_START, INODE_TABLE_BLOCKS, &zeros)?;

        let superblock = SuperBlock::new();
        let mut buf = vec![0u8; BLOCK_SIZE];
        superblock.encode_into(&mut buf)?;
        self.disk.write_blocks(SUPERBLOCK_BLOCK, 1, &buf)?;

        // the directory's bookkeeping inode owns the 4 directory blocks
        let mut root = Inode {
            size: (DIRECTORY_SLOTS * MAX_NAME_LEN) as u32,
            ..Inode::default()
        };
        for (slot, block) in root
            .direct
            .iter_mut()
            .zip(DIRECTORY_START..DIRECTORY_START + DIRECTORY_BLOCKS)
        {
            *slot = block as u32;
        }
        write_inode(&mut self.disk, ROOT_INODE, &root)?;

        let directory = Directory::new();
        directory.persist(&mut self.disk)?;
        let fbm = FreeBlockMap::new();
        persist_fbm(&mut self.disk, &fbm)?;

        self.superblock = superblock;
        self.directory = directory;
        self.fbm = fbm;
        info!(
            "formatted filesystem, {} data blocks free",
            self.fbm.free_data_blocks()
        );
        Ok(())
    }

    /// read superblock, free block bitmap and directory into memory
    pub fn load(&mut self) -> Result<()> {
        let mut buf = vec![0u8; BLOCK_SIZE];
        self.disk.read_blocks(SUPERBLOCK_BLOCK, 1, &mut buf)?;
        let superblock = SuperBlock::decode_from(&buf)?;
        if let Some(mismatch) = superblock.mismatch() {
            match self.options.magic_policy {
                MagicPolicy::Strict => return Err(FsError::CorruptImage(mismatch)),
                MagicPolicy::Permissive => warn!("{mismatch}, mounting anyway"),
            }
        }

        self.disk.read_blocks(FBM_BLOCK, 1, &mut buf)?;
        self.fbm = FreeBlockMap::from_bytes(&buf);
        self.directory = Directory::load(&self.disk)?;
        self.superblock = superblock;
        info!(
            "loaded filesystem, {} files, {} data blocks free",
            self.directory.files().count(),
            self.fbm.free_data_blocks()
        );
        Ok(())
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn free_block_map(&self) -> &FreeBlockMap {
        &self.fbm
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    /// unmount, handing the device back
    pub fn into_disk(self) -> D {
        self.disk
    }
}

impl SimpleFs<ImageDisk> {
    /// mount an existing image file
    pub fn open_image<P>(image_path: P, options: MountOptions) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let disk = ImageDisk::init_disk(image_path, BLOCK_SIZE, BLOCK_COUNT)?;
        Self::mount(disk, false, options)
    }
}
