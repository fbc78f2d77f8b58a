//! block device emulation the filesystem sits on
//!
//! a device is a flat array of fixed-size blocks,
//! and every transfer moves whole blocks.
mod image_disk;
mod ram_disk;

pub use image_disk::ImageDisk;
pub use ram_disk::RamDisk;

use thiserror::Error;

/// errors reported by a [BlockDevice]
#[derive(Error, Debug)]
pub enum DiskError {
    #[error("blocks {start}..{end} are out of range, the device has {block_count} blocks")]
    OutOfRange {
        start: usize,
        end: usize,
        block_count: usize,
    },
    #[error("buffer of {actual} bytes can't hold {count} blocks of {block_size} bytes")]
    BufferSize {
        count: usize,
        block_size: usize,
        actual: usize,
    },
    #[error("image is {actual} bytes, expected {expected} bytes")]
    Geometry { expected: u64, actual: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// block-addressed storage
pub trait BlockDevice {
    /// size of one block in bytes
    fn block_size(&self) -> usize;

    /// number of blocks on the device
    fn block_count(&self) -> usize;

    /// read `count` blocks starting at `start` into `buf`.
    /// `buf.len()` must be equal to `count * block_size()`.
    fn read_blocks(&self, start: usize, count: usize, buf: &mut [u8]) -> Result<(), DiskError>;

    /// write `count` blocks starting at `start` from `buf`.
    /// `buf.len()` must be equal to `count * block_size()`.
    fn write_blocks(&mut self, start: usize, count: usize, buf: &[u8]) -> Result<(), DiskError>;
}

/// validate a transfer and return its byte range on the device
pub(crate) fn transfer_range<D>(
    device: &D,
    start: usize,
    count: usize,
    buf_len: usize,
) -> Result<std::ops::Range<usize>, DiskError>
where
    D: BlockDevice + ?Sized,
{
    let block_size = device.block_size();
    let block_count = device.block_count();
    let end = start + count;
    if end > block_count {
        return Err(DiskError::OutOfRange {
            start,
            end,
            block_count,
        });
    }
    if buf_len != count * block_size {
        return Err(DiskError::BufferSize {
            count,
            block_size,
            actual: buf_len,
        });
    }
    Ok(start * block_size..end * block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_range() {
        let disk = RamDisk::new(1024, 8);
        assert_eq!(transfer_range(&disk, 2, 3, 3072).unwrap(), 2048..5120);
        assert!(matches!(
            transfer_range(&disk, 6, 3, 3072),
            Err(DiskError::OutOfRange { end: 9, .. })
        ));
        assert!(matches!(
            transfer_range(&disk, 0, 1, 512),
            Err(DiskError::BufferSize { actual: 512, .. })
        ));
    }
}
