use super::{transfer_range, BlockDevice, DiskError};

/// a device kept entirely in memory, lost on drop
#[derive(Debug, Clone)]
pub struct RamDisk {
    blocks: Vec<u8>,
    block_size: usize,
    block_count: usize,
}

impl RamDisk {
    /// create a zero-filled device with `block_count` blocks of `block_size` bytes
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            blocks: vec![0u8; block_size * block_count],
            block_size,
            block_count,
        }
    }

    /// the raw bytes of the whole device
    pub fn as_bytes(&self) -> &[u8] {
        &self.blocks
    }

    /// mutable access to the raw bytes, bypassing the block interface
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.blocks
    }
}

impl BlockDevice for RamDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        self.block_count
    }

    fn read_blocks(&self, start: usize, count: usize, buf: &mut [u8]) -> Result<(), DiskError> {
        let range = transfer_range(self, start, count, buf.len())?;
        buf.copy_from_slice(&self.blocks[range]);
        Ok(())
    }

    fn write_blocks(&mut self, start: usize, count: usize, buf: &[u8]) -> Result<(), DiskError> {
        let range = transfer_range(self, start, count, buf.len())?;
        self.blocks[range].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back_written_blocks() {
        let mut disk = RamDisk::new(512, 4);
        let data: Vec<u8> = (0..1024).map(|i| (i % 251) as u8).collect();
        disk.write_blocks(1, 2, &data).unwrap();

        let mut buf = vec![0u8; 1024];
        disk.read_blocks(1, 2, &mut buf).unwrap();
        assert_eq!(buf, data);

        // untouched blocks stay zeroed
        let mut first = vec![0xffu8; 512];
        disk.read_blocks(0, 1, &mut first).unwrap();
        assert!(first.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut disk = RamDisk::new(512, 4);
        assert!(disk.write_blocks(4, 1, &[0u8; 512]).is_err());
        let mut buf = [0u8; 1024];
        assert!(disk.read_blocks(3, 2, &mut buf).is_err());
    }
}
