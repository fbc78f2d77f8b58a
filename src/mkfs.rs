//! create our filesystem
use std::path::Path;

use anyhow::Context;
use byte_unit::Byte;
use log::info;

use crate::{
    disk::ImageDisk,
    fs::{MountOptions, SimpleFs, BLOCK_COUNT, BLOCK_SIZE},
};

/// create a new filesystem image at `image_file_path`,
/// replacing any file already there.
/// # Params
/// - `image_file_path`: the path of the image file
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(image_file_path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = image_file_path.as_ref();
    let disk = ImageDisk::init_fresh_disk(path, BLOCK_SIZE, BLOCK_COUNT)
        .with_context(|| format!("failed to create image file {path:?}"))?;
    let fs = SimpleFs::mount(disk, true, MountOptions::default())
        .with_context(|| format!("failed to format {path:?}"))?;

    let free = fs.statfs().free_blocks;
    info!(
        "made a filesystem of {} in {path:?}, {} free",
        Byte::from_bytes((BLOCK_SIZE * BLOCK_COUNT) as _).get_appropriate_unit(true),
        Byte::from_bytes((free * BLOCK_SIZE) as _).get_appropriate_unit(true),
    );
    Ok(())
}
