//! a file is a linked list of inodes, each contributing its 14 direct blocks.
//!
//! byte `p` of a file lives in hop `p / 14336`, direct slot `(p % 14336) / 1024`
//! at offset `p % 1024` inside that block. an offset exactly on a hop boundary
//! belongs to the next hop. all walks below are plain loops over hops.
use log::debug;

use crate::disk::BlockDevice;

use super::{
    read_inode, write_inode, Allocator, Directory, FreeBlockMap, FsError, Inode, Result,
    BLOCK_SIZE, CHAIN_NAME, DIRECTORY_SLOTS, DIRECT_POINTERS, HOP_BYTES, ROOT_INODE,
};

/// where a byte offset of a file lands inside its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    /// number of continuations to follow from the head
    pub hop: usize,
    /// direct slot inside that hop
    pub slot: usize,
    pub offset_in_block: usize,
}

impl ChainPosition {
    pub const fn of(offset: usize) -> Self {
        let in_hop = offset % HOP_BYTES;
        Self {
            hop: offset / HOP_BYTES,
            slot: in_hop / BLOCK_SIZE,
            offset_in_block: in_hop % BLOCK_SIZE,
        }
    }
}

/// a contiguous piece of a block touched by one read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    block: usize,
    offset_in_block: usize,
    len: usize,
}

/// follow `hops` continuations from `head`.
/// `None` when the chain ends first
fn walk<D>(disk: &D, head: usize, hops: usize) -> Result<Option<Inode>>
where
    D: BlockDevice + ?Sized,
{
    let mut inode = read_inode(disk, head)?;
    for _ in 0..hops {
        match inode.next_hop() {
            Some(next) => inode = read_inode(disk, next)?,
            None => return Ok(None),
        }
    }
    Ok(Some(inode))
}

/// translate `len` bytes at `offset` into block extents.
/// stops early where the chain runs out of blocks
fn map_extents<D>(disk: &D, head: usize, offset: usize, len: usize) -> Result<Vec<Extent>>
where
    D: BlockDevice + ?Sized,
{
    let mut extents = Vec::new();
    if len == 0 {
        return Ok(extents);
    }
    let position = ChainPosition::of(offset);
    if position.hop >= DIRECTORY_SLOTS {
        return Ok(extents);
    }
    let Some(mut inode) = walk(disk, head, position.hop)? else {
        return Ok(extents);
    };

    let mut slot = position.slot;
    let mut offset_in_block = position.offset_in_block;
    let mut mapped = 0;
    let mut hops = position.hop;
    while mapped < len {
        if slot == DIRECT_POINTERS {
            let Some(next) = inode.next_hop() else {
                break;
            };
            hops += 1;
            if hops >= DIRECTORY_SLOTS {
                return Err(FsError::CorruptImage(format!(
                    "chain of inode {head} is longer than the inode table"
                )));
            }
            inode = read_inode(disk, next)?;
            slot = 0;
            continue;
        }
        let Some(block) = inode.find_direct_block(slot) else {
            break;
        };
        let n = (len - mapped).min(BLOCK_SIZE - offset_in_block);
        extents.push(Extent {
            block,
            offset_in_block,
            len: n,
        });
        mapped += n;
        offset_in_block = 0;
        slot += 1;
    }
    Ok(extents)
}

/// read up to `len` bytes at `offset` of the file headed by `head`.
/// returns fewer bytes only when the chain ends, clamping to the file size is up to the caller
pub fn read_chain<D>(disk: &D, head: usize, offset: usize, len: usize) -> Result<Vec<u8>>
where
    D: BlockDevice + ?Sized,
{
    let mut data = Vec::with_capacity(len);
    let mut buf = vec![0u8; BLOCK_SIZE];
    for extent in map_extents(disk, head, offset, len)? {
        disk.read_blocks(extent.block, 1, &mut buf)?;
        data.extend_from_slice(&buf[extent.offset_in_block..extent.offset_in_block + extent.len]);
    }
    Ok(data)
}

/// write `data` at `offset` into blocks the chain already owns.
/// never allocates, run [grow_chain] first
pub fn write_chain<D>(disk: &mut D, head: usize, offset: usize, data: &[u8]) -> Result<usize>
where
    D: BlockDevice + ?Sized,
{
    let extents = map_extents(disk, head, offset, data.len())?;
    let mapped: usize = extents.iter().map(|extent| extent.len).sum();
    if mapped < data.len() {
        return Err(FsError::CorruptImage(format!(
            "inode {head} has blocks for {mapped} of {} bytes at offset {offset}",
            data.len()
        )));
    }

    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut written = 0;
    for extent in extents {
        if extent.len < BLOCK_SIZE {
            // partial block, keep the bytes around it
            disk.read_blocks(extent.block, 1, &mut buf)?;
        }
        buf[extent.offset_in_block..extent.offset_in_block + extent.len]
            .copy_from_slice(&data[written..written + extent.len]);
        disk.write_blocks(extent.block, 1, &buf)?;
        written += extent.len;
    }
    Ok(written)
}

/// hang `new_blocks` onto the chain after its `present` blocks and set every hop's size to `new_size`.
/// when the tail hop is full a free directory slot becomes the next continuation inode.
/// callers make sure enough slots are free beforehand
pub fn grow_chain<D>(
    disk: &mut D,
    directory: &mut Directory,
    head: usize,
    new_blocks: &[usize],
    present: usize,
    new_size: usize,
) -> Result<()>
where
    D: BlockDevice + ?Sized,
{
    let mut pending = new_blocks.iter().copied().peekable();
    let mut index = head;
    let mut skip = present;
    loop {
        let mut inode = read_inode(disk, index)?;
        inode.size = new_size as u32;

        if skip >= DIRECT_POINTERS {
            if let Some(next) = inode.next_hop() {
                write_inode(disk, index, &inode)?;
                skip -= DIRECT_POINTERS;
                index = next;
                continue;
            }
            if skip > DIRECT_POINTERS {
                return Err(FsError::CorruptImage(format!(
                    "inode {index} ends the chain of {head} with {skip} blocks left to skip"
                )));
            }
        }

        for slot in skip..DIRECT_POINTERS {
            match pending.next() {
                Some(block) => inode.direct[slot] = block as u32,
                None => break,
            }
        }
        skip = 0;

        if pending.peek().is_none() {
            write_inode(disk, index, &inode)?;
            return Ok(());
        }

        let next = directory.claim_free_slot()?;
        directory.bind(disk, next, CHAIN_NAME)?;
        write_inode(
            disk,
            next,
            &Inode {
                size: new_size as u32,
                ..Inode::default()
            },
        )?;
        inode.continuation = next as u32;
        write_inode(disk, index, &inode)?;
        debug!("linked continuation inode {next} after {index}");
        index = next;
    }
}

/// inode indices of the chain headed by `head`, head first
pub fn chain_inodes<D>(disk: &D, head: usize) -> Result<Vec<usize>>
where
    D: BlockDevice + ?Sized,
{
    let mut indices = vec![head];
    let mut inode = read_inode(disk, head)?;
    while let Some(next) = inode.next_hop() {
        if indices.len() >= DIRECTORY_SLOTS || indices.contains(&next) {
            return Err(FsError::CorruptImage(format!(
                "chain of inode {head} loops back to inode {next}"
            )));
        }
        indices.push(next);
        inode = read_inode(disk, next)?;
    }
    Ok(indices)
}

/// release every block and inode of the chain headed by `head`.
/// each hop is zeroed and its directory slot freed
pub fn free_chain<D>(
    disk: &mut D,
    directory: &mut Directory,
    fbm: &mut FreeBlockMap,
    head: usize,
) -> Result<()>
where
    D: BlockDevice + ?Sized,
{
    if head == ROOT_INODE {
        return Err(FsError::InvalidArgument(
            "the directory inode can't be freed".to_string(),
        ));
    }
    let hops = chain_inodes(disk, head)?;
    let mut blocks = Vec::new();
    for index in &hops {
        blocks.extend(read_inode(disk, *index)?.direct_blocks());
        write_inode(disk, *index, &Inode::default())?;
        directory.unbind(disk, *index)?;
    }
    Allocator::new(disk, fbm).free_blocks(&blocks)?;
    debug!(
        "freed chain of inode {head}: {} inodes, {} blocks",
        hops.len(),
        blocks.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::RamDisk,
        fs::{BLOCK_COUNT, DATA_START},
    };

    fn setup() -> (RamDisk, Directory, FreeBlockMap) {
        let mut disk = RamDisk::new(BLOCK_SIZE, BLOCK_COUNT);
        let mut directory = Directory::new();
        directory.bind(&mut disk, 1, "file").unwrap();
        write_inode(&mut disk, 1, &Inode::default()).unwrap();
        (disk, directory, FreeBlockMap::new())
    }

    /// grow the chain of inode 1 from `present` blocks to hold `new_size` bytes
    fn grow(
        disk: &mut RamDisk,
        directory: &mut Directory,
        fbm: &mut FreeBlockMap,
        present: usize,
        new_size: usize,
    ) -> Vec<usize> {
        let needed = new_size.div_ceil(BLOCK_SIZE) - present;
        let blocks = Allocator::new(disk, fbm).allocate_n(needed).unwrap();
        grow_chain(disk, directory, 1, &blocks, present, new_size).unwrap();
        blocks
    }

    #[test]
    fn test_chain_position() {
        assert_eq!(
            ChainPosition::of(0),
            ChainPosition {
                hop: 0,
                slot: 0,
                offset_in_block: 0
            }
        );
        assert_eq!(
            ChainPosition::of(HOP_BYTES - 1),
            ChainPosition {
                hop: 0,
                slot: 13,
                offset_in_block: 1023
            }
        );
        // a boundary belongs to the next hop
        assert_eq!(
            ChainPosition::of(HOP_BYTES),
            ChainPosition {
                hop: 1,
                slot: 0,
                offset_in_block: 0
            }
        );
        assert_eq!(
            ChainPosition::of(20000),
            ChainPosition {
                hop: 1,
                slot: 5,
                offset_in_block: 544
            }
        );
    }

    #[test]
    fn test_grow_links_continuation() {
        let (mut disk, mut directory, mut fbm) = setup();
        let blocks = grow(&mut disk, &mut directory, &mut fbm, 0, 20000);
        assert_eq!(blocks.len(), 20);

        let head = read_inode(&disk, 1).unwrap();
        assert_eq!(head.size, 20000);
        assert_eq!(head.direct_blocks(), blocks[..14].to_vec());
        let next = head.next_hop().unwrap();
        assert_eq!(next, 2);
        assert_eq!(directory.name(next), Some(CHAIN_NAME));

        let tail = read_inode(&disk, next).unwrap();
        assert_eq!(tail.size, 20000);
        assert_eq!(tail.direct_blocks(), blocks[14..].to_vec());
        assert_eq!(tail.next_hop(), None);
        assert_eq!(chain_inodes(&disk, 1).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_grow_after_full_hop() {
        let (mut disk, mut directory, mut fbm) = setup();
        grow(&mut disk, &mut directory, &mut fbm, 0, HOP_BYTES);
        assert_eq!(chain_inodes(&disk, 1).unwrap(), vec![1]);

        let more = grow(&mut disk, &mut directory, &mut fbm, 14, HOP_BYTES + 1);
        assert_eq!(more.len(), 1);
        let hops = chain_inodes(&disk, 1).unwrap();
        assert_eq!(hops.len(), 2);
        assert_eq!(read_inode(&disk, hops[1]).unwrap().direct_blocks(), more);

        // growing inside the second hop only touches existing inodes
        grow(&mut disk, &mut directory, &mut fbm, 15, 3 * BLOCK_SIZE + HOP_BYTES);
        assert_eq!(chain_inodes(&disk, 1).unwrap(), hops);
        for index in hops {
            assert_eq!(read_inode(&disk, index).unwrap().size(), 3 * BLOCK_SIZE + HOP_BYTES);
        }
    }

    #[test]
    fn test_write_then_read_across_hops() {
        let (mut disk, mut directory, mut fbm) = setup();
        grow(&mut disk, &mut directory, &mut fbm, 0, 3 * HOP_BYTES);

        let data: Vec<u8> = (0..3 * HOP_BYTES).map(|i| (i % 253) as u8).collect();
        assert_eq!(write_chain(&mut disk, 1, 0, &data).unwrap(), data.len());
        assert_eq!(read_chain(&disk, 1, 0, data.len()).unwrap(), data);

        // a piece straddling the first hop boundary
        let piece = read_chain(&disk, 1, HOP_BYTES - 10, 20).unwrap();
        assert_eq!(piece, data[HOP_BYTES - 10..HOP_BYTES + 10].to_vec());

        // overwrite in the middle of a block keeps its neighbours
        write_chain(&mut disk, 1, HOP_BYTES + 5, b"xyz").unwrap();
        let piece = read_chain(&disk, 1, HOP_BYTES + 4, 5).unwrap();
        assert_eq!(
            piece,
            vec![data[HOP_BYTES + 4], b'x', b'y', b'z', data[HOP_BYTES + 8]]
        );
    }

    #[test]
    fn test_read_stops_at_chain_end() {
        let (mut disk, mut directory, mut fbm) = setup();
        grow(&mut disk, &mut directory, &mut fbm, 0, 2 * BLOCK_SIZE);
        assert_eq!(read_chain(&disk, 1, 0, 5000).unwrap().len(), 2 * BLOCK_SIZE);
        assert!(read_chain(&disk, 1, 5 * HOP_BYTES, 10).unwrap().is_empty());
    }

    #[test]
    fn test_write_without_blocks_fails() {
        let (mut disk, _, _) = setup();
        assert!(matches!(
            write_chain(&mut disk, 1, 0, b"hello"),
            Err(FsError::CorruptImage(_))
        ));
    }

    #[test]
    fn test_free_chain_releases_everything() {
        let (mut disk, mut directory, mut fbm) = setup();
        let free_before = fbm.free_data_blocks();
        grow(&mut disk, &mut directory, &mut fbm, 0, 2 * HOP_BYTES + 1);
        assert_eq!(fbm.free_data_blocks(), free_before - 29);
        assert_eq!(directory.free_slots(), DIRECTORY_SLOTS - 4);

        free_chain(&mut disk, &mut directory, &mut fbm, 1).unwrap();
        assert_eq!(fbm.free_data_blocks(), free_before);
        assert!(fbm.is_free(DATA_START));
        assert_eq!(directory.free_slots(), DIRECTORY_SLOTS - 1);
        for index in 1..=3 {
            assert_eq!(read_inode(&disk, index).unwrap(), Inode::default());
        }
    }

    #[test]
    fn test_free_chain_refuses_directory_inode() {
        let (mut disk, mut directory, mut fbm) = setup();
        assert!(matches!(
            free_chain(&mut disk, &mut directory, &mut fbm, ROOT_INODE),
            Err(FsError::InvalidArgument(_))
        ));
    }
}
