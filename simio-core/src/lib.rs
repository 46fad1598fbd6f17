//! simio-core
//!
//! File and console I/O services for a guest program running inside an
//! instruction-set simulator. The guest only sees syscall-shaped entry points
//! (`open`, `read`, `write`, `seek`, `close`, plus console read/print helpers);
//! everything behind them lives here:
//!
//! - [`table::DescriptorTable`]: the fixed 32-slot descriptor table.
//! - [`resolver`]: maps a descriptor to the live stream, and guest paths to host paths.
//! - [`bridge`]: console vs. interactive front-end redirection of the standard streams.
//! - [`coalesce::OutputCoalescer`]: rate-limited delivery of output to a front end.
//! - [`state::IoState`]: the swappable unit of I/O state used for save points.
//! - [`system::SystemIo`]: the syscall entry points tying it all together.

pub mod bridge;
pub mod channels;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod flags;
pub mod frontend;
pub mod resolver;
pub mod state;
pub mod system;
pub mod table;
pub mod trace;

/// Shared helpers for driving the subsystem without a real front end.
pub mod test;

pub use channels::SharedBuffer;
pub use config::{IoConfig, IoConfigBuilder, LoggerConfig};
pub use error::{Cancelled, IoError, ReadValueError};
pub use flags::{Capability, OpenFlags, OpenMode, Whence};
pub use frontend::{FrontEnd, Settings};
pub use state::IoState;
pub use system::SystemIo;
pub use table::{DescriptorTable, StdChannel};

/// Buffer size used by the simulator for file I/O syscalls.
pub const SYSCALL_BUFSIZE: usize = 128;
/// Maximum number of simultaneously open descriptors, standard streams included.
pub const SYSCALL_MAXFILES: usize = 32;

/// `read_char` result: end of input.
pub const EOF: i32 = -1;
/// `read_char` result: the byte read is not printable ASCII.
pub const NOT_ASCII: i32 = -2;

/// Guest descriptor. Negative values never name a slot.
pub type Fd = i32;

pub const STDIN: Fd = 0;
pub const STDOUT: Fd = 1;
pub const STDERR: Fd = 2;
