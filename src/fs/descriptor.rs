//! open file handles, each with its own read and write cursor
use super::{FsError, Inode, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// head inode of the open file
    pub inode_index: usize,
    /// copy of the head inode, refreshed before every seek, read and write
    pub inode: Inode,
    pub read_ptr: usize,
    pub write_ptr: usize,
}

impl FileDescriptor {
    /// a freshly opened file: reads start at 0, writes append
    pub fn new(inode_index: usize, inode: Inode) -> Self {
        Self {
            inode_index,
            write_ptr: inode.size(),
            inode,
            read_ptr: 0,
        }
    }
}

/// bounded table of descriptors, a descriptor is its slot index
#[derive(Debug, Clone)]
pub struct DescriptorTable {
    slots: Vec<Option<FileDescriptor>>,
}

impl DescriptorTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// close everything
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// first free slot, without taking it
    pub fn free_slot(&self) -> Result<usize> {
        self.slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::NoDescriptors)
    }

    /// store `descriptor` in the first free slot
    pub fn insert(&mut self, descriptor: FileDescriptor) -> Result<usize> {
        let fd = self.free_slot()?;
        self.slots[fd] = Some(descriptor);
        Ok(fd)
    }

    pub fn get(&self, fd: usize) -> Result<&FileDescriptor> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(FsError::BadDescriptor(fd))
    }

    pub fn get_mut(&mut self, fd: usize) -> Result<&mut FileDescriptor> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(FsError::BadDescriptor(fd))
    }

    /// invalidate exactly `fd`
    pub fn close(&mut self, fd: usize) -> Result<FileDescriptor> {
        self.slots
            .get_mut(fd)
            .and_then(Option::take)
            .ok_or(FsError::BadDescriptor(fd))
    }

    /// invalidate every descriptor open on `inode_index`
    /// # Returns
    /// how many descriptors were closed
    pub fn close_inode(&mut self, inode_index: usize) -> usize {
        let mut closed = 0;
        for slot in self.slots.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|descriptor| descriptor.inode_index == inode_index)
            {
                *slot = None;
                closed += 1;
            }
        }
        closed
    }

    /// invalidate `fd` and every other descriptor sharing its head inode
    pub fn close_all_aliases(&mut self, fd: usize) -> Result<usize> {
        let inode_index = self.get(fd)?.inode_index;
        Ok(self.close_inode(inode_index))
    }

    /// descriptors currently open
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(inode_index: usize, size: u32) -> FileDescriptor {
        FileDescriptor::new(
            inode_index,
            Inode {
                size,
                ..Inode::default()
            },
        )
    }

    #[test]
    fn test_new_descriptor_appends() {
        let fd = descriptor(3, 1500);
        assert_eq!(fd.read_ptr, 0);
        assert_eq!(fd.write_ptr, 1500);
    }

    #[test]
    fn test_table_exhaustion_and_reuse() {
        let mut table = DescriptorTable::new(2);
        assert_eq!(table.insert(descriptor(1, 0)).unwrap(), 0);
        assert_eq!(table.insert(descriptor(2, 0)).unwrap(), 1);
        assert!(matches!(
            table.insert(descriptor(3, 0)),
            Err(FsError::NoDescriptors)
        ));

        table.close(0).unwrap();
        assert!(matches!(table.get(0), Err(FsError::BadDescriptor(0))));
        assert!(matches!(table.close(0), Err(FsError::BadDescriptor(0))));
        assert_eq!(table.insert(descriptor(3, 0)).unwrap(), 0);
        assert!(matches!(table.get(7), Err(FsError::BadDescriptor(7))));
    }

    #[test]
    fn test_close_all_aliases() {
        let mut table = DescriptorTable::new(4);
        let a = table.insert(descriptor(5, 0)).unwrap();
        let b = table.insert(descriptor(6, 0)).unwrap();
        let c = table.insert(descriptor(5, 0)).unwrap();

        assert_eq!(table.close_all_aliases(c).unwrap(), 2);
        assert!(table.get(a).is_err());
        assert!(table.get(c).is_err());
        assert!(table.get(b).is_ok());
        assert_eq!(table.open_count(), 1);

        table.reset();
        assert_eq!(table.open_count(), 0);
        assert_eq!(table.capacity(), 4);
    }
}
