pub mod cli_interface;
pub mod disk;
mod fs;
pub mod mkfs;
pub mod utils;
pub use fs::*;
