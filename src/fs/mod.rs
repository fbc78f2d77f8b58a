//! our simple flat filesystem
pub mod allocator;
pub mod chain;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod free_block_map;
pub mod fs_layout;
pub mod inode;
pub mod superblock;
mod fs_api_impl;
pub use allocator::*;
pub use chain::*;
pub use descriptor::*;
pub use directory::*;
pub use error::{FsError, Result};
pub use free_block_map::*;
pub use fs_api_impl::FsStats;
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

pub const FS_MAGIC: u32 = 0xACBD0005;
pub const BLOCK_SIZE: usize = 1024;
pub const BLOCK_COUNT: usize = 1024;

pub const SUPERBLOCK_BLOCK: usize = 0;
/// inode table spans blocks 1..=13
pub const INODE_TABLE_START: usize = 1;
pub const INODE_TABLE_BLOCKS: usize = 13;
pub const INODE_SIZE: usize = 64;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
pub const DIRECT_POINTERS: usize = 14;
/// bytes one inode covers before handing over to its continuation
pub const HOP_BYTES: usize = DIRECT_POINTERS * BLOCK_SIZE;

/// directory spans blocks 14..=17
pub const DIRECTORY_START: usize = 14;
pub const DIRECTORY_BLOCKS: usize = 4;
pub const DIRECTORY_SLOTS: usize = 200;
pub const MAX_NAME_LEN: usize = 16;

/// first and last block handed out by the allocator
pub const DATA_START: usize = DIRECTORY_START + DIRECTORY_BLOCKS;
pub const DATA_END: usize = FBM_BLOCK - 1;
pub const FBM_BLOCK: usize = BLOCK_COUNT - 1;

/// the directory's own bookkeeping inode
pub const ROOT_INODE: usize = 0;
pub const ROOT_NAME: &str = "root";
/// directory name marking a slot owned by a continuation inode
pub const CHAIN_NAME: &str = "(chain)";

pub const DEFAULT_MAX_OPEN_FILES: usize = 32;
