pub mod process;

pub use process::{HostApplication, HOST_PROCESS_NAME};
