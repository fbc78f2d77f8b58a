//! a device backed by an image file on the host
use std::{fs::OpenOptions, path::Path};

use log::info;
use memmap2::MmapMut;

use super::{transfer_range, BlockDevice, DiskError};

/// image file mapped into memory.
/// every write flushes the touched range back to the file.
#[derive(Debug)]
pub struct ImageDisk {
    image_file_mmap: MmapMut,
    block_size: usize,
    block_count: usize,
}

impl ImageDisk {
    /// create a new image at `image_path`, zero-filled,
    /// replacing whatever was there before
    pub fn init_fresh_disk<P>(
        image_path: P,
        block_size: usize,
        block_count: usize,
    ) -> Result<Self, DiskError>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(image_path.as_ref())?;
        // all bytes of the extended file read back as zero
        file.set_len((block_size * block_count) as u64)?;

        // Safety
        // the file is opened read/write and sized above; nothing else in this
        // process maps it, other processes touching the image are unsupported.
        let image_file_mmap = unsafe { MmapMut::map_mut(&file)? };
        info!(
            "created image {:?} with {block_count} blocks of {block_size} bytes",
            image_path.as_ref()
        );
        Ok(Self {
            image_file_mmap,
            block_size,
            block_count,
        })
    }

    /// open an existing image at `image_path`.
    /// the file length must match the requested geometry
    pub fn init_disk<P>(
        image_path: P,
        block_size: usize,
        block_count: usize,
    ) -> Result<Self, DiskError>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;
        let expected = (block_size * block_count) as u64;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(DiskError::Geometry { expected, actual });
        }

        // Safety: see `init_fresh_disk`
        let image_file_mmap = unsafe { MmapMut::map_mut(&file)? };
        info!("opened image {:?}", image_path.as_ref());
        Ok(Self {
            image_file_mmap,
            block_size,
            block_count,
        })
    }
}

impl BlockDevice for ImageDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        self.block_count
    }

    fn read_blocks(&self, start: usize, count: usize, buf: &mut [u8]) -> Result<(), DiskError> {
        let range = transfer_range(self, start, count, buf.len())?;
        buf.copy_from_slice(&self.image_file_mmap[range]);
        Ok(())
    }

    fn write_blocks(&mut self, start: usize, count: usize, buf: &[u8]) -> Result<(), DiskError> {
        let range = transfer_range(self, start, count, buf.len())?;
        let (offset, len) = (range.start, range.len());
        self.image_file_mmap[range].copy_from_slice(buf);
        self.image_file_mmap.flush_range(offset, len)?;
        Ok(())
    }
}
