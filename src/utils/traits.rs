use serde::{de::DeserializeOwned, Serialize};

use crate::fs::{FsError, Result};

/// Trait for fixed-width records stored packed inside a block
/// # Note
/// records are encoded with bincode's legacy config,
/// i.e. fixed-width little endian integers and no length prefix on arrays,
/// so the encoded length is exactly [OnDiskRecord::SIZE]
pub trait OnDiskRecord: Serialize + DeserializeOwned {
    /// bytes a record occupies on disk
    const SIZE: usize;

    /// encode into the first [OnDiskRecord::SIZE] bytes of `buf`
    /// # Returns
    /// The number of bytes written if successful
    fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let slot = buf.get_mut(..Self::SIZE).ok_or_else(|| {
            FsError::InvalidArgument(format!("record needs {} bytes", Self::SIZE))
        })?;
        let config = bincode::config::legacy();
        Ok(bincode::serde::encode_into_slice(self, slot, config)?)
    }

    /// decode from the first [OnDiskRecord::SIZE] bytes of `buf`
    fn decode_from(buf: &[u8]) -> Result<Self> {
        let slot = buf.get(..Self::SIZE).ok_or_else(|| {
            FsError::InvalidArgument(format!("record needs {} bytes", Self::SIZE))
        })?;
        let config = bincode::config::legacy();
        let (object, _bytes_read): (Self, usize) =
            bincode::serde::decode_from_slice(slot, config)?;
        Ok(object)
    }
}
