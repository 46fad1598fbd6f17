use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::table::StdChannel;

type InputReader = BufReader<Box<dyn Read + Send>>;
type OutputWriter = BufWriter<Box<dyn Write + Send>>;

/// A clonable in-memory byte sink.
///
/// Every clone appends to the same buffer, so a test (or an embedding host)
/// can keep one clone and inspect what the guest wrote through another.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer").field("len", &self.0.lock().len()).finish()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read up to and including the next `\n`, then drop the `\n` or `\r\n`.
///
/// Invalid UTF-8 (e.g. the tail of a character split by a byte read) is
/// replaced rather than rejected, so the line is never lost.
pub(crate) fn read_line_lossy(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    if reader.read_until(b'\n', &mut bytes)? == 0 {
        return Ok(None);
    }
    if bytes.ends_with(b"\n") {
        bytes.pop();
        if bytes.ends_with(b"\r") {
            bytes.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Where the standard channels really lead.
enum ChannelSource {
    Process,
    Memory {
        /// Taken when the input reader is first created.
        input: Option<Vec<u8>>,
        output: SharedBuffer,
        error: SharedBuffer,
    },
}

impl ChannelSource {
    fn open_input(&mut self) -> Box<dyn Read + Send> {
        match self {
            ChannelSource::Process => Box::new(io::stdin()),
            ChannelSource::Memory { input, .. } => Box::new(Cursor::new(input.take().unwrap_or_default())),
        }
    }

    fn open_output(&self, channel: StdChannel) -> Box<dyn Write + Send> {
        match (self, channel) {
            (ChannelSource::Process, StdChannel::Error) => Box::new(io::stderr()),
            (ChannelSource::Process, _) => Box::new(io::stdout()),
            (ChannelSource::Memory { error, .. }, StdChannel::Error) => Box::new(error.clone()),
            (ChannelSource::Memory { output, .. }, _) => Box::new(output.clone()),
        }
    }
}

/// Byte-level access to the standard streams.
///
/// The reader and writers are created on first use and kept until reset, so
/// buffered console input is never dropped between two syscalls.
pub struct StdChannels {
    source: ChannelSource,
    input_reader: Option<InputReader>,
    output_writer: Option<OutputWriter>,
    error_writer: Option<OutputWriter>,
}

impl StdChannels {
    /// Channels bound to the process's own stdin/stdout/stderr.
    pub fn process() -> Self {
        Self::with_source(ChannelSource::Process)
    }

    /// Channels bound to in-memory buffers.
    pub fn memory(input: impl Into<Vec<u8>>, output: SharedBuffer, error: SharedBuffer) -> Self {
        Self::with_source(ChannelSource::Memory {
            input: Some(input.into()),
            output,
            error,
        })
    }

    fn with_source(source: ChannelSource) -> Self {
        StdChannels {
            source,
            input_reader: None,
            output_writer: None,
            error_writer: None,
        }
    }

    pub fn input_reader(&mut self) -> &mut InputReader {
        let source = &mut self.source;
        self.input_reader.get_or_insert_with(|| BufReader::new(source.open_input()))
    }

    /// Writer for `Output` or `Error`; `None` for `Input`.
    pub fn writer(&mut self, channel: StdChannel) -> Option<&mut OutputWriter> {
        let source = &self.source;
        let slot = match channel {
            StdChannel::Input => return None,
            StdChannel::Output => &mut self.output_writer,
            StdChannel::Error => &mut self.error_writer,
        };
        Some(slot.get_or_insert_with(|| BufWriter::new(source.open_output(channel))))
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input_reader().read(buf)
    }

    /// One line without its terminator, or `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        read_line_lossy(self.input_reader())
    }

    /// Write all of `bytes` and flush. Any failure fails the whole call.
    pub fn write_bytes(&mut self, channel: StdChannel, bytes: &[u8]) -> io::Result<()> {
        let writer = self
            .writer(channel)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "standard input is not writable"))?;
        writer.write_all(bytes)?;
        writer.flush()
    }

    /// Flush and drop the output/error writers; they are recreated on next use.
    pub fn reset(&mut self) {
        for (channel, writer) in [
            (StdChannel::Output, self.output_writer.take()),
            (StdChannel::Error, self.error_writer.take()),
        ] {
            if let Some(mut writer) = writer {
                if let Err(e) = writer.flush() {
                    log::warn!("ignoring flush failure on {:?}: {}", channel, e);
                }
            }
        }
    }
}

impl fmt::Debug for StdChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ChannelSource::Process => "process",
            ChannelSource::Memory { .. } => "memory",
        };
        f.debug_struct("StdChannels")
            .field("source", &source)
            .field("input_reader", &self.input_reader.is_some())
            .field("output_writer", &self.output_writer.is_some())
            .field("error_writer", &self.error_writer.is_some())
            .finish()
    }
}
