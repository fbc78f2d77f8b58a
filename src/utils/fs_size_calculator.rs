//! This module contains functions to calculate block and hop counts of files

use crate::fs::{BLOCK_SIZE, DIRECT_POINTERS, INODES_PER_BLOCK, INODE_TABLE_START};

/// calculate how many data blocks a file of `size` bytes occupies
/// # Example
/// ```
/// use sfs::utils::fs_size_calculator::blocks_for_size;
/// assert_eq!(blocks_for_size(0), 0);
/// assert_eq!(blocks_for_size(1), 1);
/// assert_eq!(blocks_for_size(1024), 1);
/// assert_eq!(blocks_for_size(20000), 20);
/// ```
pub const fn blocks_for_size(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}

/// calculate how many inodes a chain needs to hold `blocks` data blocks.
/// every file keeps its head inode, even when empty
/// # Example
/// ```
/// use sfs::utils::fs_size_calculator::hops_for_blocks;
/// assert_eq!(hops_for_blocks(0), 1);
/// assert_eq!(hops_for_blocks(14), 1);
/// assert_eq!(hops_for_blocks(15), 2);
/// assert_eq!(hops_for_blocks(29), 3);
/// ```
pub const fn hops_for_blocks(blocks: usize) -> usize {
    if blocks == 0 {
        1
    } else {
        blocks.div_ceil(DIRECT_POINTERS)
    }
}

/// calculate the inode table block and the byte offset inside it for an inode index
/// # Example
/// ```
/// use sfs::utils::fs_size_calculator::inode_position;
/// assert_eq!(inode_position(0), (1, 0));
/// assert_eq!(inode_position(17), (2, 64));
/// assert_eq!(inode_position(199), (13, 7 * 64));
/// ```
pub const fn inode_position(index: usize) -> (usize, usize) {
    (
        index / INODES_PER_BLOCK + INODE_TABLE_START,
        (index % INODES_PER_BLOCK) * crate::fs::INODE_SIZE,
    )
}
