use serde::{Deserialize, Serialize};

use crate::utils::traits::OnDiskRecord;

use super::{
    Inode, BLOCK_COUNT, BLOCK_SIZE, DIRECTORY_SLOTS, FS_MAGIC, INODE_SIZE, INODE_TABLE_BLOCKS,
    INODE_TABLE_START,
};

/// The superblock of this filesystem, stored in block 0
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperBlock {
    /// magic number
    pub magic: u32,
    /// data block size
    pub block_size: u32,
    pub block_count: u32,
    /// kept for layout compatibility, no operation reads it
    pub reserved_inode: Inode,
}

impl OnDiskRecord for SuperBlock {
    const SIZE: usize = 12 + INODE_SIZE;
}

impl SuperBlock {
    pub fn new() -> Self {
        // describes the inode table, historically meant as a privileged inode
        let mut reserved_inode = Inode {
            size: (DIRECTORY_SLOTS * INODE_SIZE) as u32,
            ..Inode::default()
        };
        for (slot, block) in reserved_inode
            .direct
            .iter_mut()
            .zip(INODE_TABLE_START..INODE_TABLE_START + INODE_TABLE_BLOCKS)
        {
            *slot = block as u32;
        }

        Self {
            magic: FS_MAGIC,
            block_size: BLOCK_SIZE as u32,
            block_count: BLOCK_COUNT as u32,
            reserved_inode,
        }
    }

    /// describe what is wrong with this superblock, `None` if it matches our geometry
    pub fn mismatch(&self) -> Option<String> {
        if self.magic != FS_MAGIC {
            return Some(format!(
                "magic number is {:#010x}, expected {:#010x}",
                self.magic, FS_MAGIC
            ));
        }
        if self.block_size as usize != BLOCK_SIZE || self.block_count as usize != BLOCK_COUNT {
            return Some(format!(
                "geometry is {} blocks of {} bytes, expected {} blocks of {} bytes",
                self.block_count, self.block_size, BLOCK_COUNT, BLOCK_SIZE
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superblock_layout() {
        let superblock = SuperBlock::new();
        let mut buf = vec![0u8; BLOCK_SIZE];
        assert_eq!(superblock.encode_into(&mut buf).unwrap(), 76);
        assert_eq!(&buf[0..4], &FS_MAGIC.to_le_bytes());
        assert_eq!(&buf[4..8], &1024u32.to_le_bytes());
        assert_eq!(&buf[8..12], &1024u32.to_le_bytes());
        assert!(buf[76..].iter().all(|b| *b == 0));
        assert_eq!(SuperBlock::decode_from(&buf).unwrap(), superblock);
    }

    #[test]
    fn test_mismatch() {
        assert_eq!(SuperBlock::new().mismatch(), None);

        let garbage = SuperBlock::default();
        assert!(garbage.mismatch().unwrap().contains("magic"));

        let wrong_size = SuperBlock {
            block_size: 512,
            ..SuperBlock::new()
        };
        assert!(wrong_size.mismatch().unwrap().contains("geometry"));
    }
}
