//! Locating the real stream behind a descriptor or a guest path.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::channels::StdChannels;
use crate::flags::OpenFlags;
use crate::frontend::Settings;
use crate::state::IoState;
use crate::table::{SlotStream, StdChannel};
use crate::Fd;

/// Host path for a guest filename.
///
/// Relative names follow the loaded program's directory when the host asks
/// for it; otherwise they stay relative to the process working directory.
pub fn resolve_path(filename: &str, settings: &dyn Settings) -> PathBuf {
    let path = Path::new(filename);
    if path.is_relative() && settings.derive_working_directory_from_program() {
        if let Some(program) = settings.loaded_program() {
            let parent = program.parent().unwrap_or_else(|| Path::new(""));
            return parent.join(path);
        }
    }
    path.to_path_buf()
}

/// Open the host file backing a new descriptor.
///
/// Write-only creates or truncates, write-append creates or appends.
/// Directories are never opened.
pub fn open_host_file(path: &Path, flags: OpenFlags) -> io::Result<File> {
    if !flags.contains(OpenFlags::O_WRONLY) {
        let file = File::open(path)?;
        if file.metadata()?.is_dir() {
            return Err(io::Error::other(format!("{} is a directory", path.display())));
        }
        Ok(file)
    } else if flags.contains(OpenFlags::O_APPEND) {
        OpenOptions::new().append(true).create(true).open(path)
    } else {
        OpenOptions::new().write(true).create(true).truncate(true).open(path)
    }
}

/// The live stream a descriptor leads to.
pub enum Target<'a> {
    File(&'a mut File),
    Standard(StdChannel, &'a mut StdChannels),
}

/// Look up `fd` in the active state. `None` when the slot is free or unbound.
pub fn resolve(state: &mut IoState, fd: Fd) -> Option<Target<'_>> {
    let IoState { table, channels } = state;
    match table.resolve(fd)? {
        SlotStream::File(file) => Some(Target::File(file)),
        SlotStream::Standard(channel) => Some(Target::Standard(*channel, channels)),
    }
}

impl Target<'_> {
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Target::File(file) => file.read(buf),
            Target::Standard(StdChannel::Input, channels) => channels.read_bytes(buf),
            Target::Standard(..) => Err(io::Error::new(io::ErrorKind::Unsupported, "output channel is not readable")),
        }
    }

    /// Write every byte and flush; a failure anywhere fails the whole write.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Target::File(file) => {
                file.write_all(bytes)?;
                file.flush()
            }
            Target::Standard(channel, channels) => channels.write_bytes(*channel, bytes),
        }
    }

    /// The file when the target supports repositioning.
    pub fn seekable(&mut self) -> Option<&mut File> {
        match self {
            Target::File(file) => Some(&mut **file),
            Target::Standard(..) => None,
        }
    }
}
