//! file operations of a mounted [SimpleFs]
use log::{debug, info};

use crate::{
    disk::BlockDevice,
    utils::fs_size_calculator::{blocks_for_size, hops_for_blocks},
};

use super::{
    chain_inodes, free_chain, grow_chain, read_chain, read_inode, validate_name, write_chain,
    write_inode, Allocator, FileDescriptor, FsError, Inode, Result, SimpleFs, BLOCK_COUNT,
    BLOCK_SIZE,
};

/// summary of a mounted filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: usize,
    pub block_count: usize,
    pub free_blocks: usize,
    pub files: usize,
    pub free_inodes: usize,
}

impl<D: BlockDevice> SimpleFs<D> {
    /// open `name`, creating an empty file when it doesn't exist.
    /// an existing file is opened for appending: reads start at 0, writes at the end
    pub fn open(&mut self, name: &str) -> Result<usize> {
        info!("open() called with name: {name:?}");
        validate_name(name)?;
        // fail before touching the directory when no descriptor is left
        self.descriptors.free_slot()?;

        let descriptor = match self.directory.lookup(name) {
            Ok(index) => FileDescriptor::new(index, read_inode(&self.disk, index)?),
            Err(FsError::NotFound(_)) => {
                let index = self.directory.claim_free_slot()?;
                let inode = Inode::default();
                write_inode(&mut self.disk, index, &inode)?;
                self.directory.bind(&mut self.disk, index, name)?;
                debug!("created {name:?} at inode {index}");
                FileDescriptor::new(index, inode)
            }
            Err(e) => return Err(e),
        };
        self.descriptors.insert(descriptor)
    }

    /// close exactly this descriptor
    pub fn close(&mut self, fd: usize) -> Result<()> {
        info!("close() called with fd: {fd}");
        self.descriptors.close(fd).map(|_| ())
    }

    /// close `fd` and every other descriptor open on the same file
    pub fn close_all_aliases(&mut self, fd: usize) -> Result<usize> {
        info!("close_all_aliases() called with fd: {fd}");
        self.descriptors.close_all_aliases(fd)
    }

    /// move the read cursor, clamped to the file size
    pub fn seek_read(&mut self, fd: usize, pos: i64) -> Result<()> {
        let size = self.checked_seek(fd, pos)?;
        let descriptor = self.descriptors.get_mut(fd)?;
        descriptor.read_ptr = (pos as usize).min(size);
        Ok(())
    }

    /// move the write cursor, clamped to the file size
    pub fn seek_write(&mut self, fd: usize, pos: i64) -> Result<()> {
        let size = self.checked_seek(fd, pos)?;
        let descriptor = self.descriptors.get_mut(fd)?;
        descriptor.write_ptr = (pos as usize).min(size);
        Ok(())
    }

    /// refresh `fd` and validate a seek target, returning the current file size
    fn checked_seek(&mut self, fd: usize, pos: i64) -> Result<usize> {
        let invalid = FsError::InvalidSeek { fd, pos };
        if pos < 0 {
            return Err(invalid);
        }
        match self.refresh(fd) {
            Ok(descriptor) => Ok(descriptor.inode.size()),
            Err(FsError::BadDescriptor(_)) => Err(invalid),
            Err(e) => Err(e),
        }
    }

    /// reload the cached head inode of `fd` from disk
    fn refresh(&mut self, fd: usize) -> Result<&mut FileDescriptor> {
        let index = self.descriptors.get(fd)?.inode_index;
        let inode = read_inode(&self.disk, index)?;
        let descriptor = self.descriptors.get_mut(fd)?;
        descriptor.inode = inode;
        Ok(descriptor)
    }

    /// read up to `len` bytes at the read cursor.
    /// reads past the end of the file come back short
    pub fn read(&mut self, fd: usize, len: usize) -> Result<Vec<u8>> {
        let descriptor = self.refresh(fd)?;
        let (index, read_ptr) = (descriptor.inode_index, descriptor.read_ptr);
        let len = len.min(descriptor.inode.size().saturating_sub(read_ptr));

        let data = read_chain(&self.disk, index, read_ptr, len)?;
        self.descriptors.get_mut(fd)?.read_ptr += data.len();
        debug!("read {} bytes from fd {fd} at {read_ptr}", data.len());
        Ok(data)
    }

    /// write `data` at the write cursor, growing the file as needed.
    /// on failure neither the file nor the cursor change
    pub fn write(&mut self, fd: usize, data: &[u8]) -> Result<usize> {
        let descriptor = self.refresh(fd)?;
        let (index, write_ptr) = (descriptor.inode_index, descriptor.write_ptr);
        let size = descriptor.inode.size();
        if data.is_empty() {
            return Ok(0);
        }
        // writes never shrink a file
        let new_size = size.max(write_ptr + data.len());
        let present = blocks_for_size(size);
        let needed = blocks_for_size(new_size);

        if new_size != size {
            let extra_hops = hops_for_blocks(needed) - hops_for_blocks(present);
            if extra_hops > self.directory.free_slots() {
                return Err(FsError::NoInodes);
            }
            let new_blocks =
                Allocator::new(&mut self.disk, &mut self.fbm).allocate_n(needed - present)?;
            grow_chain(
                &mut self.disk,
                &mut self.directory,
                index,
                &new_blocks,
                present,
                new_size,
            )?;
        }

        let written = write_chain(&mut self.disk, index, write_ptr, data)?;
        let inode = read_inode(&self.disk, index)?;
        let descriptor = self.descriptors.get_mut(fd)?;
        descriptor.inode = inode;
        descriptor.write_ptr += written;
        debug!("wrote {written} bytes to fd {fd} at {write_ptr}");
        Ok(written)
    }

    /// current `(read_ptr, write_ptr)` of `fd`
    pub fn tell(&self, fd: usize) -> Result<(usize, usize)> {
        let descriptor = self.descriptors.get(fd)?;
        Ok((descriptor.read_ptr, descriptor.write_ptr))
    }

    /// delete `name`, closing every descriptor still open on it
    pub fn remove(&mut self, name: &str) -> Result<()> {
        info!("remove() called with name: {name:?}");
        validate_name(name)?;
        let index = self.directory.lookup(name)?;
        let closed = self.descriptors.close_inode(index);
        if closed > 0 {
            debug!("closed {closed} descriptors of {name:?}");
        }
        free_chain(&mut self.disk, &mut self.directory, &mut self.fbm, index)
    }

    /// size in bytes of `name`
    pub fn file_size(&self, name: &str) -> Result<usize> {
        let index = self.directory.lookup(name)?;
        Ok(read_inode(&self.disk, index)?.size())
    }

    /// inodes making up the chain of `name`, head first
    pub fn file_inodes(&self, name: &str) -> Result<Vec<usize>> {
        let index = self.directory.lookup(name)?;
        chain_inodes(&self.disk, index)
    }

    /// every file as `(name, size)`, in directory order
    pub fn list(&self) -> Result<Vec<(String, usize)>> {
        self.directory
            .files()
            .map(|(index, name)| Ok((name.to_string(), read_inode(&self.disk, index)?.size())))
            .collect()
    }

    /// data blocks still free
    pub fn free_count(&self) -> usize {
        self.fbm.free_data_blocks()
    }

    pub fn statfs(&self) -> FsStats {
        FsStats {
            block_size: BLOCK_SIZE,
            block_count: BLOCK_COUNT,
            free_blocks: self.free_count(),
            files: self.directory.files().count(),
            free_inodes: self.directory.free_slots(),
        }
    }
}
