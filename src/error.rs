use thiserror::Error;

pub type Result<T> = core::result::Result<T, MinxError>;

#[derive(Debug, Error)]
pub enum MinxError {
    #[error("BIOS image is empty")]
    EmptyBios,
    #[error("cartridge image of {len} bytes exceeds the 2 MiB window")]
    CartridgeTooLarge { len: usize },
    #[error("snapshot error: {0}")]
    Snapshot(postcard::Error),
    #[error("cycle table line {line}: {reason}")]
    CycleTable { line: usize, reason: String },
    #[error("stack overflow, SP=0x{sp:04x} at timestamp {timestamp}")]
    StackOverflow { sp: u16, timestamp: u64 },
}

// Not a `#[from]` source: postcard::Error is only std::error::Error with
// postcard's std feature.
impl From<postcard::Error> for MinxError {
    fn from(e: postcard::Error) -> Self {
        MinxError::Snapshot(e)
    }
}
