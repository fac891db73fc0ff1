//! Constants for the download module.

/// Size of each slice written to disk between cancellation checks.
pub const CHUNK_SIZE: usize = 8192;

/// Maximum number of media files transferred at once.
pub const DOWNLOAD_CONCURRENCY: usize = 5;
