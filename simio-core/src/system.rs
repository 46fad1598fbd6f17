use std::fmt;
use std::io::{Cursor, Seek, SeekFrom};
use std::mem;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::{ChannelBridge, ConsoleBridge, InteractiveBridge};
use crate::coalesce::{self, CoalescerHandle, OutputCoalescer};
use crate::config::IoConfig;
use crate::error::{Cancelled, IoError, ReadValueError, Result};
use crate::flags::{Capability, OpenFlags, Whence};
use crate::frontend::{FrontEnd, Settings};
use crate::resolver::{self, Target};
use crate::state::IoState;
use crate::table::{DescriptorTable, SlotStream, StdChannel};
use crate::{Fd, EOF, NOT_ASCII, STDERR, STDIN, STDOUT};

/// Last-error text while nothing has failed.
pub const FILE_OPERATION_OK: &str = "File operation OK";

/// Syscall entry points for one simulated machine.
///
/// Failures follow the guest ABI: `-1` plus a message readable through
/// [`SystemIo::last_error`]. Only an abandoned interactive prompt surfaces as
/// an `Err` ([`Cancelled`]), since there is no value behind it at all.
pub struct SystemIo {
    state: IoState,
    settings: Arc<dyn Settings>,
    front_end: Option<Arc<dyn FrontEnd>>,
    /// Reader over the front end's static input field; one per session.
    static_input: Option<Cursor<Vec<u8>>>,
    coalescer: Arc<Mutex<OutputCoalescer>>,
    last_error: String,
}

impl Default for SystemIo {
    fn default() -> Self {
        Self::from_config(IoConfig::default())
    }
}

impl SystemIo {
    pub fn new(settings: Arc<dyn Settings>) -> Self {
        let coalescer = OutputCoalescer::new(settings.flush_interval());
        SystemIo {
            state: IoState::new(),
            settings,
            front_end: None,
            static_input: None,
            coalescer: Arc::new(Mutex::new(coalescer)),
            last_error: FILE_OPERATION_OK.to_string(),
        }
    }

    pub fn from_config(config: IoConfig) -> Self {
        Self::new(Arc::new(config))
    }

    pub fn with_state(mut self, state: IoState) -> Self {
        self.state = state;
        self
    }

    pub fn with_front_end(mut self, front_end: Arc<dyn FrontEnd>) -> Self {
        self.attach_front_end(Some(front_end));
        self
    }

    /// Attach, replace or detach the front end. Output still held for the
    /// previous one is delivered to it first.
    pub fn attach_front_end(&mut self, front_end: Option<Arc<dyn FrontEnd>>) {
        self.flush(true);
        self.coalescer.lock().clear();
        self.static_input = None;
        self.front_end = front_end;
    }

    pub fn state(&self) -> &IoState {
        &self.state
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.state.table
    }

    /// Message of the last failed file operation.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    fn attached(&self) -> Option<&Arc<dyn FrontEnd>> {
        self.front_end.as_ref().filter(|front_end| front_end.is_attached())
    }

    fn bridge(&mut self) -> Box<dyn ChannelBridge + '_> {
        match self.front_end.as_deref().filter(|front_end| front_end.is_attached()) {
            Some(front_end) => Box::new(InteractiveBridge {
                front_end,
                popup: self.settings.use_popup_for_input(),
                static_input: &mut self.static_input,
                coalescer: &*self.coalescer,
            }),
            None => Box::new(ConsoleBridge { channels: &mut self.state.channels }),
        }
    }

    fn fail(&mut self, e: IoError) -> i32 {
        log::debug!("syscall failed: {}", e);
        self.last_error = e.to_string();
        -1
    }

    /// Open `filename`; returns the new descriptor or `-1`.
    ///
    /// `flags` must be exactly `O_RDONLY`, `O_WRONLY` or `O_WRONLY | O_APPEND`.
    pub fn open_file(&mut self, filename: &str, flags: i32) -> i32 {
        let ret = match self.try_open(filename, OpenFlags::from_guest(flags)) {
            Ok(fd) => {
                self.last_error = FILE_OPERATION_OK.to_string();
                fd
            }
            Err(e) => self.fail(e),
        };
        crate::trace::syscall(format_args!("open({:?}, {:#x}) = {}", filename, flags, ret));
        ret
    }

    fn try_open(&mut self, filename: &str, flags: OpenFlags) -> Result<Fd> {
        let fd = self.state.table.open(filename, flags)?;

        let path = resolver::resolve_path(filename, self.settings.as_ref());
        match resolver::open_host_file(&path, flags) {
            Ok(file) => {
                self.state.table.bind(fd, SlotStream::File(file));
                Ok(fd)
            }
            Err(source) => {
                // the reserved slot must not outlive the failed open
                self.state.table.close(fd);
                let direction = if flags.contains(OpenFlags::O_WRONLY) { "output" } else { "input" };
                Err(IoError::NotFound {
                    name: filename.to_string(),
                    direction,
                    source,
                })
            }
        }
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` at end of input, `Ok(-1)` on error.
    pub fn read_from_file(&mut self, fd: Fd, buf: &mut [u8]) -> std::result::Result<i32, Cancelled> {
        if let Err(e) = self.state.table.require(fd, Capability::Read) {
            return Ok(self.fail(e));
        }

        let result = if fd == STDIN {
            self.bridge().read_stdin(buf)?
        } else {
            match resolver::resolve(&mut self.state, fd) {
                Some(mut target) => target.read(buf),
                None => return Ok(self.fail(IoError::NotOpen { fd, capability: Capability::Read })),
            }
        };

        let ret = match result {
            Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Err(source) => self.fail(IoError::Io { op: "read", fd, source }),
        };
        crate::trace::syscall(format_args!("read({}, {}) = {}", fd, buf.len(), ret));
        Ok(ret)
    }

    /// Write all of `buf`; returns `buf.len()` or `-1`.
    ///
    /// A failure part way through reports `-1` even though some bytes may
    /// already have reached the host file.
    pub fn write_to_file(&mut self, fd: Fd, buf: &[u8]) -> i32 {
        if let Err(e) = self.state.table.require(fd, Capability::Write) {
            return self.fail(e);
        }

        let result = match fd {
            STDOUT => self.bridge().write_std(StdChannel::Output, buf),
            STDERR => self.bridge().write_std(StdChannel::Error, buf),
            _ => match resolver::resolve(&mut self.state, fd) {
                Some(mut target) => target.write_all(buf).map(|()| buf.len()),
                None => return self.fail(IoError::NotOpen { fd, capability: Capability::Write }),
            },
        };

        let ret = match result {
            Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Err(source) => self.fail(IoError::Io { op: "write", fd, source }),
        };
        crate::trace::syscall(format_args!("write({}, {}) = {}", fd, buf.len(), ret));
        ret
    }

    /// Reposition a file descriptor; returns the new absolute offset or `-1`.
    pub fn seek(&mut self, fd: Fd, offset: i32, whence: i32) -> i32 {
        let ret = match self.try_seek(fd, offset, whence) {
            Ok(pos) => pos,
            Err(e) => self.fail(e),
        };
        crate::trace::syscall(format_args!("seek({}, {}, {}) = {}", fd, offset, whence, ret));
        ret
    }

    fn try_seek(&mut self, fd: Fd, offset: i32, whence: i32) -> Result<i32> {
        self.state.table.require(fd, Capability::Read)?;
        let whence = Whence::try_from(whence).map_err(|whence| IoError::InvalidWhence { fd, whence })?;

        let mut target: Target<'_> = resolver::resolve(&mut self.state, fd)
            .ok_or(IoError::NotOpen { fd, capability: Capability::Read })?;
        let file = target.seekable().ok_or(IoError::NotSeekable { fd })?;
        let io = |source| IoError::Io { op: "seek", fd, source };

        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => file.stream_position().map_err(io)? as i64,
            Whence::End => file.metadata().map_err(io)?.len() as i64,
        };
        let pos = base + i64::from(offset);
        let ret = i32::try_from(pos).map_err(|_| IoError::InvalidSeekTarget { fd, target: pos })?;
        if pos < 0 {
            return Err(IoError::InvalidSeekTarget { fd, target: pos });
        }

        file.seek(SeekFrom::Start(pos as u64)).map_err(io)?;
        Ok(ret)
    }

    /// Close `fd`. Never fails from the guest's point of view.
    pub fn close_file(&mut self, fd: Fd) {
        crate::trace::syscall(format_args!("close({})", fd));
        self.state.table.close(fd);
    }

    pub fn print_string(&mut self, s: &str) {
        self.bridge().print(s);
    }

    /// One character of input: the byte value for tab, newline and 32..=126,
    /// [`NOT_ASCII`] for any other byte, [`EOF`] at end of input.
    pub fn read_char(&mut self, service: u32) -> std::result::Result<i32, Cancelled> {
        let prompt = format!("Enter a character value (syscall {})", service);
        let ret = match self.bridge().read_byte(&prompt)? {
            None => EOF,
            Some(b @ (b'\t' | b'\n' | 32..=126)) => i32::from(b),
            Some(_) => NOT_ASCII,
        };
        Ok(ret)
    }

    /// One line of input, without its newline, cut to `max_len` characters.
    pub fn read_string(&mut self, service: u32, max_len: i32) -> std::result::Result<String, Cancelled> {
        let prompt = format!("Enter a string of maximum length {} (syscall {})", max_len, service);
        let mut input = self.bridge().read_line("", &prompt, max_len)?;
        if input.ends_with('\n') {
            input.pop();
        }

        let Ok(max_len) = usize::try_from(max_len) else {
            return Ok(String::new());
        };
        if let Some((cut, _)) = input.char_indices().nth(max_len) {
            input.truncate(cut);
        }
        Ok(input)
    }

    fn read_value<T>(&mut self, what: &str, service: u32) -> std::result::Result<T, ReadValueError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let prompt = format!("Enter {} (syscall {})", what, service);
        let input = self.bridge().read_line("0", &prompt, -1)?;
        let input = input.trim();
        input.parse::<T>().map_err(|e| ReadValueError::Parse {
            input: input.to_string(),
            msg: e.to_string(),
        })
    }

    pub fn read_integer(&mut self, service: u32) -> std::result::Result<i32, ReadValueError> {
        self.read_value("an integer value", service)
    }

    pub fn read_long(&mut self, service: u32) -> std::result::Result<i64, ReadValueError> {
        self.read_value("an integer value", service)
    }

    pub fn read_float(&mut self, service: u32) -> std::result::Result<f32, ReadValueError> {
        self.read_value("a float value", service)
    }

    pub fn read_double(&mut self, service: u32) -> std::result::Result<f64, ReadValueError> {
        self.read_value("a Double value", service)
    }

    /// Deliver held front-end output: always when `force`, otherwise only
    /// once the coalescing window has passed.
    pub fn flush(&mut self, force: bool) {
        if let Some(front_end) = self.attached() {
            coalesce::deliver(&self.coalescer, front_end.as_ref(), |c| c.flush(force));
        }
    }

    /// Flush access for another host thread; `None` without a front end.
    pub fn coalescer_handle(&self) -> Option<CoalescerHandle> {
        self.attached().map(|front_end| CoalescerHandle {
            coalescer: self.coalescer.clone(),
            sink: front_end.clone(),
        })
    }

    /// Close every user descriptor, rebind the standard streams and drop
    /// per-session input and output buffering.
    pub fn reset_files(&mut self) {
        self.state.reset();
        self.static_input = None;
        self.flush(true);
        self.coalescer.lock().clear();
    }

    /// Make `state` the active I/O state and hand back the previous one.
    pub fn swap_state(&mut self, state: IoState) -> IoState {
        log::debug!("swapping I/O state ({} descriptors open)", state.table.open_count());
        mem::replace(&mut self.state, state)
    }
}
