//! Console vs. interactive front-end redirection of the standard streams.
//!
//! [`crate::SystemIo`] picks one adapter per request from the attachment and
//! policy flags, then talks to it through [`ChannelBridge`] only.

use std::io::{self, Cursor, Read};

use parking_lot::Mutex;

use crate::channels::{read_line_lossy, StdChannels};
use crate::coalesce::{self, OutputCoalescer};
use crate::error::Cancelled;
use crate::frontend::FrontEnd;
use crate::table::StdChannel;

pub(crate) trait ChannelBridge {
    /// One line of input for a value request. `default` stands in when the
    /// underlying reader fails.
    fn read_line(&mut self, default: &str, prompt: &str, max_len: i32) -> Result<String, Cancelled>;

    /// Bytes for `read(STDIN, ..)`. `Ok(0)` at end of input.
    fn read_stdin(&mut self, buf: &mut [u8]) -> Result<io::Result<usize>, Cancelled>;

    /// A single input byte for `read_char`; `None` at end of input.
    fn read_byte(&mut self, prompt: &str) -> Result<Option<u8>, Cancelled>;

    /// Bytes for `write(STDOUT | STDERR, ..)`; reports the byte count written.
    fn write_std(&mut self, channel: StdChannel, bytes: &[u8]) -> io::Result<usize>;

    fn print(&mut self, text: &str);
}

/// Direct use of the (lazily wrapped) standard streams.
pub(crate) struct ConsoleBridge<'a> {
    pub(crate) channels: &'a mut StdChannels,
}

impl ChannelBridge for ConsoleBridge<'_> {
    fn read_line(&mut self, default: &str, _prompt: &str, _max_len: i32) -> Result<String, Cancelled> {
        match self.channels.read_line() {
            Ok(line) => Ok(line.unwrap_or_default()),
            Err(e) => {
                log::warn!("console read failed, using {:?}: {}", default, e);
                Ok(default.to_string())
            }
        }
    }

    fn read_stdin(&mut self, buf: &mut [u8]) -> Result<io::Result<usize>, Cancelled> {
        Ok(self.channels.read_bytes(buf))
    }

    fn read_byte(&mut self, _prompt: &str) -> Result<Option<u8>, Cancelled> {
        let mut byte = [0u8; 1];
        match self.channels.read_bytes(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) => {
                log::warn!("console read failed, treating as end of input: {}", e);
                Ok(None)
            }
        }
    }

    fn write_std(&mut self, channel: StdChannel, bytes: &[u8]) -> io::Result<usize> {
        self.channels.write_bytes(channel, bytes)?;
        Ok(bytes.len())
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = self.channels.write_bytes(StdChannel::Output, text.as_bytes()) {
            log::warn!("console print failed: {}", e);
        }
    }
}

/// Input and output through an attached front end.
pub(crate) struct InteractiveBridge<'a> {
    pub(crate) front_end: &'a dyn FrontEnd,
    pub(crate) popup: bool,
    /// Reader over the static input field, created once per session.
    pub(crate) static_input: &'a mut Option<Cursor<Vec<u8>>>,
    pub(crate) coalescer: &'a Mutex<OutputCoalescer>,
}

impl InteractiveBridge<'_> {
    fn static_reader(&mut self) -> &mut Cursor<Vec<u8>> {
        let front_end = self.front_end;
        self.static_input
            .get_or_insert_with(|| Cursor::new(front_end.static_input_contents().into_bytes()))
    }

    /// Pending output must be visible before the user is asked for input.
    fn flush_before_prompt(&self) {
        coalesce::deliver(self.coalescer, self.front_end, |c| c.flush(true));
    }

    fn prompt_bounded(&self, max_len: i32) -> Result<String, Cancelled> {
        self.flush_before_prompt();
        crate::trace::channel(format_args!("run pane prompt (max_len={})", max_len));
        self.front_end.prompt_for_bounded(max_len).ok_or(Cancelled)
    }
}

/// Copy `input` into `buf`, zero the rest, and report how much was copied.
fn fill_buffer(input: &[u8], buf: &mut [u8]) -> usize {
    let n = input.len().min(buf.len());
    buf[..n].copy_from_slice(&input[..n]);
    buf[n..].fill(0);
    n
}

impl ChannelBridge for InteractiveBridge<'_> {
    fn read_line(&mut self, default: &str, prompt: &str, max_len: i32) -> Result<String, Cancelled> {
        if self.popup {
            self.flush_before_prompt();
            crate::trace::channel(format_args!("popup prompt {:?}", prompt));
            return self.front_end.prompt_for_line(prompt).ok_or(Cancelled);
        }

        if !self.front_end.is_interactive_mode() {
            return match read_line_lossy(self.static_reader()) {
                Ok(line) => Ok(line.unwrap_or_default()),
                Err(e) => {
                    log::warn!("static input read failed, using {:?}: {}", default, e);
                    Ok(default.to_string())
                }
            };
        }

        self.prompt_bounded(max_len)
    }

    fn read_stdin(&mut self, buf: &mut [u8]) -> Result<io::Result<usize>, Cancelled> {
        if self.front_end.is_interactive_mode() {
            let max_len = i32::try_from(buf.len()).unwrap_or(i32::MAX);
            let input = self.prompt_bounded(max_len)?;
            return Ok(Ok(fill_buffer(input.as_bytes(), buf)));
        }

        Ok(self.static_reader().read(buf))
    }

    fn read_byte(&mut self, prompt: &str) -> Result<Option<u8>, Cancelled> {
        if self.popup {
            let input = self.read_line("0", prompt, 1)?;
            return Ok(input.as_bytes().first().copied());
        }

        let mut byte = [0u8; 1];
        match self.read_stdin(&mut byte)? {
            Ok(n) if n > 0 => Ok(Some(byte[0])),
            _ => Ok(None),
        }
    }

    fn write_std(&mut self, _channel: StdChannel, bytes: &[u8]) -> io::Result<usize> {
        // The caller is told the byte count, not the decoded character count.
        self.print(&String::from_utf8_lossy(bytes));
        Ok(bytes.len())
    }

    fn print(&mut self, text: &str) {
        coalesce::deliver(self.coalescer, self.front_end, |c| c.push(text));
    }
}
