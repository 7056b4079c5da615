pub mod ops;

pub use ops::{clear_readonly, clear_readonly_recursive, DirectoryOps, LocalDirectories};
