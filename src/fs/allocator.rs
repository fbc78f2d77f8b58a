//! data block allocation over the cached FBM.
//! every change to the map is written to the FBM block before returning
use log::{debug, warn};

use crate::disk::BlockDevice;

use super::{FreeBlockMap, FsError, Result, BLOCK_SIZE, FBM_BLOCK};

pub struct Allocator<'a, D: BlockDevice + ?Sized> {
    disk: &'a mut D,
    fbm: &'a mut FreeBlockMap,
}

impl<'a, D> Allocator<'a, D>
where
    D: BlockDevice + ?Sized,
{
    pub fn new(disk: &'a mut D, fbm: &'a mut FreeBlockMap) -> Self {
        Self { disk, fbm }
    }

    /// number of data blocks still free
    pub fn free_count(&self) -> usize {
        self.fbm.free_data_blocks()
    }

    /// first-fit a data block, mark it used and hand it out zero-filled
    pub fn allocate_block(&mut self) -> Result<usize> {
        let block = self.fbm.first_free().ok_or(FsError::OutOfSpace {
            requested: 1,
            available: 0,
        })?;
        self.fbm.occupy(block);
        persist_fbm(self.disk, self.fbm)?;
        self.disk.write_blocks(block, 1, &[0u8; BLOCK_SIZE])?;
        debug!("allocated block {block}");
        Ok(block)
    }

    /// allocate `n` blocks, or none at all
    pub fn allocate_n(&mut self, n: usize) -> Result<Vec<usize>> {
        let available = self.free_count();
        let mut blocks = Vec::with_capacity(n);
        for _ in 0..n {
            match self.allocate_block() {
                Ok(block) => blocks.push(block),
                Err(FsError::OutOfSpace { .. }) => {
                    warn!(
                        "only {} of {n} blocks available, rolling back",
                        blocks.len()
                    );
                    self.free_blocks(&blocks)?;
                    return Err(FsError::OutOfSpace {
                        requested: n,
                        available,
                    });
                }
                Err(e) => {
                    self.free_blocks(&blocks)?;
                    return Err(e);
                }
            }
        }
        Ok(blocks)
    }

    /// give blocks back, writing the FBM once for the whole batch.
    /// unused pointers (0) and reserved blocks are skipped
    pub fn free_blocks(&mut self, blocks: &[usize]) -> Result<()> {
        let released = blocks
            .iter()
            .filter(|block| self.fbm.release(**block))
            .count();
        debug!("released {released} blocks");
        persist_fbm(self.disk, self.fbm)
    }
}

/// write the cached FBM to its block
pub fn persist_fbm<D>(disk: &mut D, fbm: &FreeBlockMap) -> Result<()>
where
    D: BlockDevice + ?Sized,
{
    let mut buf = fbm.to_bytes();
    buf.resize(BLOCK_SIZE, 0);
    disk.write_blocks(FBM_BLOCK, 1, &buf)?;
    Ok(())
}
