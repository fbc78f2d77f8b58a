//! flat root directory: 200 fixed 16-byte name slots, slot index == inode index
use log::debug;

use crate::disk::BlockDevice;

use super::{
    FsError, Result, BLOCK_SIZE, CHAIN_NAME, DIRECTORY_BLOCKS, DIRECTORY_SLOTS, DIRECTORY_START,
    MAX_NAME_LEN, ROOT_INODE, ROOT_NAME,
};

/// a raw on-disk slot, the name ends at the first NUL or after 16 bytes
type Slot = [u8; MAX_NAME_LEN];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// kept byte for byte, a slot starting with NUL is free
    slots: Vec<Slot>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_name(slot: &Slot) -> &[u8] {
    let len = slot.iter().position(|b| *b == 0).unwrap_or(slot.len());
    &slot[..len]
}

fn encode_slot(name: &str) -> Slot {
    let mut slot = [0u8; MAX_NAME_LEN];
    let raw = &name.as_bytes()[..name.len().min(MAX_NAME_LEN)];
    slot[..raw.len()].copy_from_slice(raw);
    slot
}

/// for serialize and deserialize
impl Directory {
    /// an empty directory, only slot 0 is taken by the directory itself
    pub fn new() -> Self {
        let mut slots = vec![[0u8; MAX_NAME_LEN]; DIRECTORY_SLOTS];
        slots[ROOT_INODE] = encode_slot(ROOT_NAME);
        Self { slots }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut slots = bytes
            .chunks(MAX_NAME_LEN)
            .take(DIRECTORY_SLOTS)
            .map(|chunk| {
                let mut slot = [0u8; MAX_NAME_LEN];
                slot[..chunk.len()].copy_from_slice(chunk);
                slot
            })
            .collect::<Vec<_>>();
        slots.resize(DIRECTORY_SLOTS, [0u8; MAX_NAME_LEN]);
        Self { slots }
    }

    /// the 4 directory blocks, zero padded past the last slot
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.slots.concat();
        bytes.resize(DIRECTORY_BLOCKS * BLOCK_SIZE, 0);
        bytes
    }

    pub fn load<D>(disk: &D) -> Result<Self>
    where
        D: BlockDevice + ?Sized,
    {
        let mut buf = vec![0u8; DIRECTORY_BLOCKS * BLOCK_SIZE];
        disk.read_blocks(DIRECTORY_START, DIRECTORY_BLOCKS, &mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn persist<D>(&self, disk: &mut D) -> Result<()>
    where
        D: BlockDevice + ?Sized,
    {
        disk.write_blocks(DIRECTORY_START, DIRECTORY_BLOCKS, &self.to_bytes())?;
        Ok(())
    }
}

/// check that `name` fits a slot and isn't one of the names we reserve
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(FsError::InvalidArgument(format!(
            "file name must be 1 to {MAX_NAME_LEN} bytes, got {:?}",
            name
        )));
    }
    if name.contains('\0') {
        return Err(FsError::InvalidArgument(format!(
            "file name {name:?} contains NUL"
        )));
    }
    if name == ROOT_NAME || name == CHAIN_NAME {
        return Err(FsError::InvalidArgument(format!(
            "file name {name:?} is reserved"
        )));
    }
    Ok(())
}

impl Directory {
    /// name bound to slot `index`.
    /// `None` for free or out of range slots, and for names that aren't UTF-8
    pub fn name(&self, index: usize) -> Option<&str> {
        self.slots
            .get(index)
            .map(slot_name)
            .filter(|name| !name.is_empty())
            .and_then(|name| std::str::from_utf8(name).ok())
    }

    /// inode index of the file called `name`
    pub fn lookup(&self, name: &str) -> Result<usize> {
        self.files()
            .find(|(_, entry)| *entry == name)
            .map(|(index, _)| index)
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    /// first free slot, never slot 0
    pub fn claim_free_slot(&self) -> Result<usize> {
        self.slots
            .iter()
            .enumerate()
            .skip(ROOT_INODE + 1)
            .find(|(_, slot)| slot[0] == 0)
            .map(|(index, _)| index)
            .ok_or(FsError::NoInodes)
    }

    /// number of slots still free
    pub fn free_slots(&self) -> usize {
        self.slots
            .iter()
            .skip(ROOT_INODE + 1)
            .filter(|slot| slot[0] == 0)
            .count()
    }

    /// user files as `(inode index, name)`, in slot order
    pub fn files(&self) -> impl Iterator<Item = (usize, &str)> {
        (ROOT_INODE + 1..self.slots.len())
            .filter_map(move |index| self.name(index).map(|name| (index, name)))
            .filter(|(_, name)| *name != CHAIN_NAME)
    }

    /// bind `name` to slot `index` and write the directory out
    pub fn bind<D>(&mut self, disk: &mut D, index: usize, name: &str) -> Result<()>
    where
        D: BlockDevice + ?Sized,
    {
        self.check_slot(index)?;
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::InvalidArgument(format!(
                "can't bind {name:?} to slot {index}"
            )));
        }
        debug!("bind slot {index} to {name:?}");
        self.slots[index] = encode_slot(name);
        self.persist(disk)
    }

    /// free slot `index` and write the directory out
    pub fn unbind<D>(&mut self, disk: &mut D, index: usize) -> Result<()>
    where
        D: BlockDevice + ?Sized,
    {
        self.check_slot(index)?;
        debug!("unbind slot {index}");
        self.slots[index] = [0u8; MAX_NAME_LEN];
        self.persist(disk)
    }

    fn check_slot(&self, index: usize) -> Result<()> {
        if index == ROOT_INODE || index >= self.slots.len() {
            return Err(FsError::InvalidArgument(format!(
                "directory slot {index} can't be changed"
            )));
        }
        Ok(())
    }
}
