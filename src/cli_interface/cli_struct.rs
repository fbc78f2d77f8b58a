use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum SfsCli {
    /// create a new file system
    Mkfs(MkfsArgs),
    /// copy a host file into the file system, appending if it exists
    Put(PutArgs),
    /// print a file to stdout
    Cat(FileArgs),
    /// remove a file
    Rm(FileArgs),
    /// list files and their sizes
    Ls(ImageArgs),
    /// print a summary of the file system
    Info(ImageArgs),
}

///make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

/// arguments shared by every subcommand working on an existing image
#[derive(clap::Args, Debug, PartialEq)]
pub struct ImageArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// mount even if the superblock doesn't look like ours
    #[clap(long)]
    pub permissive: bool,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct FileArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    /// name of the file inside the file system
    #[clap(short, long)]
    pub name: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct PutArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    /// name of the file inside the file system
    #[clap(short, long)]
    pub name: String,
    /// the host file to copy from
    #[clap(short, long)]
    pub file: String,
}
