//! command line arguments of the `sfs` binary
mod cli_struct;
pub use cli_struct::*;
