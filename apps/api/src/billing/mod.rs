pub mod downloads;
pub mod handlers;
pub mod payments;

pub use downloads::{check_download, DownloadDenied, DownloadGate};
