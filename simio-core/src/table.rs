use std::fs::File;
use std::io::Write;

use crate::error::{IoError, Result};
use crate::flags::{Capability, OpenFlags, OpenMode};
use crate::{Fd, STDERR, STDIN, STDOUT, SYSCALL_MAXFILES};

/// First descriptor `open` may hand out; 0..=2 are the standard streams.
const FIRST_USER_FD: usize = 3;

/// One of the three standard streams a reserved slot stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdChannel {
    Input,
    Output,
    Error,
}

impl StdChannel {
    pub fn fd(self) -> Fd {
        match self {
            StdChannel::Input => STDIN,
            StdChannel::Output => STDOUT,
            StdChannel::Error => STDERR,
        }
    }

    fn slot_name(self) -> &'static str {
        match self {
            StdChannel::Input => "STDIN",
            StdChannel::Output => "STDOUT",
            StdChannel::Error => "STDERR",
        }
    }

    fn mode(self) -> OpenMode {
        match self {
            StdChannel::Input => OpenMode::Read,
            StdChannel::Output | StdChannel::Error => OpenMode::Write,
        }
    }
}

/// The stream bound to a slot.
///
/// Standard slots only carry a marker: the live reader/writers belong to
/// [`crate::channels::StdChannels`] so that a state swap moves them together.
#[derive(Debug)]
pub enum SlotStream {
    Standard(StdChannel),
    File(File),
}

#[derive(Debug)]
struct Slot {
    name: String,
    mode: OpenMode,
    /// `None` only between `open` and `bind`.
    stream: Option<SlotStream>,
}

impl Slot {
    fn standard(channel: StdChannel) -> Self {
        Slot {
            name: channel.slot_name().to_string(),
            mode: channel.mode(),
            stream: Some(SlotStream::Standard(channel)),
        }
    }
}

/// Fixed-capacity descriptor table.
///
/// Slot index == guest descriptor. A free slot is `None`.
#[derive(Debug)]
pub struct DescriptorTable {
    slots: Vec<Option<Slot>>,
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorTable {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(SYSCALL_MAXFILES);
        slots.resize_with(SYSCALL_MAXFILES, || None);

        let mut table = DescriptorTable { slots };
        table.setup_stdio();
        table
    }

    fn setup_stdio(&mut self) {
        for channel in [StdChannel::Input, StdChannel::Output, StdChannel::Error] {
            self.slots[channel.fd() as usize] = Some(Slot::standard(channel));
        }
    }

    fn index(fd: Fd) -> Option<usize> {
        usize::try_from(fd).ok().filter(|&i| i < SYSCALL_MAXFILES)
    }

    fn slot(&self, fd: Fd) -> Option<&Slot> {
        self.slots.get(Self::index(fd)?)?.as_ref()
    }

    fn slot_mut(&mut self, fd: Fd) -> Option<&mut Slot> {
        self.slots.get_mut(Self::index(fd)?)?.as_mut()
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.slots.iter().flatten().any(|slot| slot.name == name)
    }

    /// Reserve the lowest free descriptor for `name`.
    ///
    /// Nothing is consumed when this fails. The caller binds the real stream
    /// afterwards with [`DescriptorTable::bind`].
    pub fn open(&mut self, name: &str, flags: OpenFlags) -> Result<Fd> {
        if self.name_in_use(name) {
            return Err(IoError::AlreadyOpen { name: name.to_string() });
        }

        let mode = OpenMode::try_from(flags).map_err(|flags| IoError::UnsupportedMode {
            name: name.to_string(),
            flags: flags.bits() as i32,
        })?;

        let Some(index) = (FIRST_USER_FD..SYSCALL_MAXFILES).find(|&i| self.slots[i].is_none()) else {
            return Err(IoError::TableFull {
                name: name.to_string(),
                limit: SYSCALL_MAXFILES,
            });
        };

        self.slots[index] = Some(Slot {
            name: name.to_string(),
            mode,
            stream: None,
        });
        log::debug!("fd {} allocated for {:?} ({:?})", index, name, mode);

        Ok(index as Fd)
    }

    /// Attach the opened stream to a slot reserved by `open`.
    ///
    /// Returns `false` (and drops `stream`) if `fd` is not allocated.
    pub fn bind(&mut self, fd: Fd, stream: SlotStream) -> bool {
        match self.slot_mut(fd) {
            Some(slot) => {
                slot.stream = Some(stream);
                true
            }
            None => {
                log::warn!("bind on unallocated fd {}", fd);
                false
            }
        }
    }

    pub fn is_open_for(&self, fd: Fd, capability: Capability) -> bool {
        self.slot(fd).is_some_and(|slot| slot.mode.allows(capability))
    }

    /// Check `capability` and report the guest-facing error when it is missing.
    pub fn require(&self, fd: Fd, capability: Capability) -> Result<()> {
        if self.is_open_for(fd, capability) {
            Ok(())
        } else {
            Err(IoError::NotOpen { fd, capability })
        }
    }

    pub fn resolve(&mut self, fd: Fd) -> Option<&mut SlotStream> {
        self.slot_mut(fd)?.stream.as_mut()
    }

    pub fn name(&self, fd: Fd) -> Option<&str> {
        self.slot(fd).map(|slot| slot.name.as_str())
    }

    pub fn mode(&self, fd: Fd) -> Option<OpenMode> {
        self.slot(fd).map(|slot| slot.mode)
    }

    /// Number of allocated slots, standard streams included.
    pub fn open_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Release a slot. Reserved and out-of-range descriptors are ignored, and
    /// a failure to close the underlying stream never reaches the guest.
    pub fn close(&mut self, fd: Fd) {
        let Some(index) = Self::index(fd).filter(|&i| i >= FIRST_USER_FD) else {
            return;
        };
        let Some(slot) = self.slots[index].take() else {
            return;
        };

        log::debug!("fd {} released ({:?})", fd, slot.name);
        if let Some(SlotStream::File(mut file)) = slot.stream {
            if slot.mode != OpenMode::Read {
                if let Err(e) = file.flush() {
                    log::warn!("ignoring close failure on fd {}: {}", fd, e);
                }
            }
        }
    }

    /// Close every user slot and rebind the standard ones.
    pub fn reset(&mut self) {
        for fd in FIRST_USER_FD..SYSCALL_MAXFILES {
            self.close(fd as Fd);
        }
        self.setup_stdio();
    }
}
