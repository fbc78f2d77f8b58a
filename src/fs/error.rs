use thiserror::Error;

use crate::disk::DiskError;

/// everything a filesystem call can fail with
#[derive(Error, Debug)]
pub enum FsError {
    /// no file with this name
    #[error("no such file: {0:?}")]
    NotFound(String),
    /// descriptor table is full
    #[error("no free file descriptors")]
    NoDescriptors,
    /// directory has no free slot left
    #[error("no free inodes")]
    NoInodes,
    /// allocator can't satisfy a growth request, nothing was kept
    #[error("out of space: {requested} blocks requested, {available} free")]
    OutOfSpace { requested: usize, available: usize },
    #[error("invalid seek to {pos} on descriptor {fd}")]
    InvalidSeek { fd: usize, pos: i64 },
    /// descriptor is out of range or not open
    #[error("bad file descriptor {0}")]
    BadDescriptor(usize),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("corrupt image: {0}")]
    CorruptImage(String),
    #[error(transparent)]
    Disk(#[from] DiskError),
    #[error("encode on-disk record failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("decode on-disk record failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type Result<T> = std::result::Result<T, FsError>;
