//! in-memory copy of the free block bitmap (FBM)
//!
//! on disk the FBM spends one byte per block, 1 for free and 0 for used.
//! in memory a set bit means free.
use bitvec::prelude::*;

use super::{BLOCK_COUNT, DATA_END, DATA_START};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBlockMap {
    free: BitVec<u8, Lsb0>,
}

/// for serialize and deserialize
impl FreeBlockMap {
    /// FBM of a freshly formatted image: only the data region is free
    pub fn new() -> Self {
        let mut free = bitvec![u8, Lsb0; 0; BLOCK_COUNT];
        free[DATA_START..=DATA_END].fill(true);
        Self { free }
    }

    /// rebuild from the on-disk byte-per-block representation
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut free = bitvec![u8, Lsb0; 0; BLOCK_COUNT];
        for (block, byte) in bytes.iter().take(BLOCK_COUNT).enumerate() {
            free.set(block, *byte != 0);
        }
        Self { free }
    }

    /// one byte per block, 1 for free
    pub fn to_bytes(&self) -> Vec<u8> {
        self.free.iter().map(|bit| u8::from(*bit)).collect()
    }
}

impl Default for FreeBlockMap {
    fn default() -> Self {
        Self::new()
    }
}

/// for data block allocation
impl FreeBlockMap {
    /// check if a block is free
    pub fn is_free(&self, block: usize) -> bool {
        self.free.get(block).map_or(false, |bit| *bit)
    }

    /// calculate the number of free data blocks
    pub fn free_data_blocks(&self) -> usize {
        self.free[DATA_START..=DATA_END].count_ones()
    }

    /// first free data block, scanning the data region in order
    pub fn first_free(&self) -> Option<usize> {
        self.free[DATA_START..=DATA_END]
            .first_one()
            .map(|p| p + DATA_START)
    }

    /// mark a block as used
    pub fn occupy(&mut self, block: usize) {
        self.free.set(block, false);
    }

    /// mark a data block as free again.
    /// blocks outside the data region stay reserved
    /// # Returns
    /// whether the block was released
    pub fn release(&mut self, block: usize) -> bool {
        if !(DATA_START..=DATA_END).contains(&block) {
            return false;
        }
        self.free.set(block, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FBM_BLOCK;

    #[test]
    fn test_fresh_map_reserves_metadata() {
        let map = FreeBlockMap::new();
        for block in 0..DATA_START {
            assert!(!map.is_free(block));
        }
        assert!(!map.is_free(FBM_BLOCK));
        assert!(map.is_free(DATA_START));
        assert!(map.is_free(DATA_END));
        assert!(!map.is_free(BLOCK_COUNT));
        assert_eq!(map.free_data_blocks(), 1005);
    }

    #[test]
    fn test_first_free() {
        // test if free space is at the beginning
        let mut map = FreeBlockMap::new();
        assert_eq!(map.first_free(), Some(DATA_START));

        // test if free space is in the middle
        for block in DATA_START..=DATA_END {
            map.occupy(block);
        }
        assert_eq!(map.first_free(), None);
        map.release(500);
        assert_eq!(map.first_free(), Some(500));

        // test if free space is at the end
        map.occupy(500);
        map.release(DATA_END);
        assert_eq!(map.first_free(), Some(DATA_END));
    }

    #[test]
    fn test_release_ignores_reserved() {
        let mut map = FreeBlockMap::new();
        assert!(!map.release(0));
        assert!(!map.release(DATA_START - 1));
        assert!(!map.release(FBM_BLOCK));
        assert!(!map.is_free(0));

        map.occupy(DATA_START);
        assert!(map.release(DATA_START));
        assert!(map.is_free(DATA_START));
    }

    #[test]
    fn test_byte_representation() {
        let mut map = FreeBlockMap::new();
        map.occupy(DATA_START + 1);
        let bytes = map.to_bytes();
        assert_eq!(bytes.len(), BLOCK_COUNT);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[DATA_START], 1);
        assert_eq!(bytes[DATA_START + 1], 0);
        assert_eq!(bytes[FBM_BLOCK], 0);
        assert_eq!(FreeBlockMap::from_bytes(&bytes), map);
    }
}
