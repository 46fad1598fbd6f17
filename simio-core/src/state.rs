use crate::channels::{SharedBuffer, StdChannels};
use crate::table::DescriptorTable;

/// Everything a save point has to carry: the descriptor table and the
/// standard-stream reader/writers.
///
/// Exactly one `IoState` is active inside a [`crate::SystemIo`]; exchanging it
/// with [`crate::SystemIo::swap_state`] is a full substitution, never a merge.
#[derive(Debug)]
pub struct IoState {
    pub(crate) table: DescriptorTable,
    pub(crate) channels: StdChannels,
}

impl Default for IoState {
    fn default() -> Self {
        Self::new()
    }
}

impl IoState {
    /// Fresh table whose standard slots lead to the process streams.
    pub fn new() -> Self {
        IoState {
            table: DescriptorTable::new(),
            channels: StdChannels::process(),
        }
    }

    /// Fresh table whose standard slots lead to in-memory buffers.
    pub fn with_memory_streams(input: impl Into<Vec<u8>>, output: SharedBuffer, error: SharedBuffer) -> Self {
        IoState {
            table: DescriptorTable::new(),
            channels: StdChannels::memory(input, output, error),
        }
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    pub(crate) fn reset(&mut self) {
        self.table.reset();
        self.channels.reset();
    }
}
