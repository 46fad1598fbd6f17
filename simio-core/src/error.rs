use crate::flags::Capability;
use crate::Fd;

/// Failures of descriptor-table and file operations.
///
/// The `Display` text of each variant is what the guest reads back through
/// the last-error accessor.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("File name {name} is already open.")]
    AlreadyOpen { name: String },

    #[error("File name {name} has unknown requested opening flag")]
    UnsupportedMode { name: String, flags: i32 },

    #[error("File name {name} exceeds maximum open file limit of {limit}")]
    TableFull { name: String, limit: usize },

    #[error("File descriptor {fd} is not open for {capability}")]
    NotOpen { fd: Fd, capability: Capability },

    #[error("File {name} not found, open for {direction}.")]
    NotFound {
        name: String,
        direction: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("IO Exception on {op} of file with fd {fd}")]
    Io {
        op: &'static str,
        fd: Fd,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seek target {target} for fd {fd}")]
    InvalidSeekTarget { fd: Fd, target: i64 },

    #[error("Invalid seek base {whence} for fd {fd}")]
    InvalidWhence { fd: Fd, whence: i32 },

    #[error("File descriptor {fd} is not seekable")]
    NotSeekable { fd: Fd },
}

pub type Result<T> = core::result::Result<T, IoError>;

/// The user abandoned an interactive prompt.
///
/// Kept apart from [`IoError`]: a cancelled read has no value to hand to a
/// numeric parser, and callers must be able to tell that from a bad value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("input request was cancelled")]
pub struct Cancelled;

/// Outcome of the numeric read helpers.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ReadValueError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("cannot parse {input:?}: {msg}")]
    Parse { input: String, msg: String },
}
