use std::io::Write;

use anyhow::Context;
use byte_unit::Byte;
use clap::Parser;
use log::info;
use sfs::{
    cli_interface::{ImageArgs, SfsCli},
    disk::ImageDisk,
    MagicPolicy, MountOptions, SimpleFs,
};

fn open_image(args: &ImageArgs) -> anyhow::Result<SimpleFs<ImageDisk>> {
    let magic_policy = if args.permissive {
        MagicPolicy::Permissive
    } else {
        MagicPolicy::Strict
    };
    let options = MountOptions {
        magic_policy,
        ..MountOptions::default()
    };
    SimpleFs::open_image(&args.image_file_path, options)
        .with_context(|| format!("failed to mount {}", args.image_file_path))
}

fn human(bytes: usize) -> String {
    Byte::from_bytes(bytes as _)
        .get_appropriate_unit(true)
        .to_string()
}

/// a CLI interface to users to create our filesystem in an image file,
/// and to copy files in and out of it
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = SfsCli::parse();
    match args {
        SfsCli::Mkfs(args) => {
            sfs::mkfs::mkfs(args.image_file_path)?;
        }
        SfsCli::Put(args) => {
            let data = std::fs::read(&args.file)
                .with_context(|| format!("failed to read host file {}", args.file))?;
            let mut fs = open_image(&args.image)?;
            let fd = fs.open(&args.name)?;
            let written = fs.write(fd, &data)?;
            fs.close(fd)?;
            info!("appended {written} bytes to {}", args.name);
        }
        SfsCli::Cat(args) => {
            let mut fs = open_image(&args.image)?;
            // don't let `open` create the file
            let size = fs.file_size(&args.name)?;
            let fd = fs.open(&args.name)?;
            let data = fs.read(fd, size)?;
            fs.close(fd)?;
            std::io::stdout().write_all(&data)?;
        }
        SfsCli::Rm(args) => {
            let mut fs = open_image(&args.image)?;
            fs.remove(&args.name)?;
        }
        SfsCli::Ls(args) => {
            let fs = open_image(&args)?;
            for (name, size) in fs.list()? {
                println!("{name:<16} {}", human(size));
            }
        }
        SfsCli::Info(args) => {
            let stats = open_image(&args)?.statfs();
            println!("block size:  {}", human(stats.block_size));
            println!("blocks:      {}", stats.block_count);
            println!(
                "free blocks: {} ({})",
                stats.free_blocks,
                human(stats.free_blocks * stats.block_size)
            );
            println!("files:       {}", stats.files);
            println!("free inodes: {}", stats.free_inodes);
        }
    }
    Ok(())
}
