pub mod client;
pub mod extract;

pub use client::Downloader;
pub use extract::extract_archive;
