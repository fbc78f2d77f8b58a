use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    utils::{fs_size_calculator::inode_position, traits::OnDiskRecord},
};

use super::{Result, BLOCK_SIZE, DIRECT_POINTERS, INODE_SIZE};

/// 64 bytes on disk: size, 14 direct block pointers and a continuation
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inode {
    /// bytes written to the file, the same in every hop of a chain
    pub size: u32,
    /// physical block indices, 0 means unused
    pub direct: [u32; DIRECT_POINTERS],
    /// index of the inode holding the next 14 blocks, 0 ends the chain
    pub continuation: u32,
}

impl OnDiskRecord for Inode {
    const SIZE: usize = INODE_SIZE;
}

impl Inode {
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// direct blocks in use, in slot order
    pub fn direct_blocks(&self) -> Vec<usize> {
        self.direct
            .iter()
            .filter_map(|x| if *x != 0 { Some(*x as usize) } else { None })
            .collect()
    }

    /// block stored in `slot`, `None` if unused
    pub fn find_direct_block(&self, slot: usize) -> Option<usize> {
        match self.direct.get(slot) {
            Some(0) | None => None,
            Some(block) => Some(*block as usize),
        }
    }

    pub fn next_hop(&self) -> Option<usize> {
        match self.continuation {
            0 => None,
            index => Some(index as usize),
        }
    }
}

/// read inode `index` from the inode table
pub fn read_inode<D>(disk: &D, index: usize) -> Result<Inode>
where
    D: BlockDevice + ?Sized,
{
    let (block, offset) = inode_position(index);
    let mut buf = vec![0u8; BLOCK_SIZE];
    disk.read_blocks(block, 1, &mut buf)?;
    Inode::decode_from(&buf[offset..])
}

/// write inode `index` back, leaving its 15 neighbours in the block untouched
pub fn write_inode<D>(disk: &mut D, index: usize, inode: &Inode) -> Result<()>
where
    D: BlockDevice + ?Sized,
{
    let (block, offset) = inode_position(index);
    let mut buf = vec![0u8; BLOCK_SIZE];
    disk.read_blocks(block, 1, &mut buf)?;
    inode.encode_into(&mut buf[offset..])?;
    disk.write_blocks(block, 1, &buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disk::RamDisk, fs::BLOCK_COUNT};

    #[test]
    fn test_inode_encodes_packed() {
        let mut inode = Inode {
            size: 0x0102_0304,
            continuation: 7,
            ..Default::default()
        };
        inode.direct[0] = 18;
        inode.direct[13] = 0xaabb;
        let mut buf = [0u8; INODE_SIZE];
        assert_eq!(inode.encode_into(&mut buf).unwrap(), INODE_SIZE);

        assert_eq!(&buf[0..4], &[4, 3, 2, 1]);
        assert_eq!(&buf[4..8], &18u32.to_le_bytes());
        assert_eq!(&buf[56..60], &0xaabbu32.to_le_bytes());
        assert_eq!(&buf[60..64], &7u32.to_le_bytes());
        assert_eq!(Inode::decode_from(&buf).unwrap(), inode);
    }

    #[test]
    fn test_write_inode_keeps_neighbours() {
        let mut disk = RamDisk::new(BLOCK_SIZE, BLOCK_COUNT);
        let a = Inode {
            size: 10,
            ..Default::default()
        };
        let b = Inode {
            size: 20,
            continuation: 3,
            ..Default::default()
        };
        write_inode(&mut disk, 16, &a).unwrap();
        write_inode(&mut disk, 17, &b).unwrap();

        assert_eq!(read_inode(&disk, 16).unwrap(), a);
        assert_eq!(read_inode(&disk, 17).unwrap(), b);
        // inode 16 is the first one of block 2
        assert_eq!(&disk.as_bytes()[2048..2052], &10u32.to_le_bytes());
    }

    #[test]
    fn test_direct_blocks() {
        let mut inode = Inode::default();
        inode.direct[0] = 20;
        inode.direct[1] = 21;
        assert_eq!(inode.direct_blocks(), vec![20, 21]);
        assert_eq!(inode.find_direct_block(1), Some(21));
        assert_eq!(inode.find_direct_block(2), None);
        assert_eq!(inode.find_direct_block(14), None);
        assert_eq!(inode.next_hop(), None);
    }
}
