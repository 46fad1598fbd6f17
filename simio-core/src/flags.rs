use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Guest `open` flag bits. `O_RDONLY` is the empty set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const O_WRONLY = 0x0000_0001;
        const O_RDWR = 0x0000_0002;
        const O_APPEND = 0x0000_0008;
        const O_CREAT = 0x0000_0200;
        const O_TRUNC = 0x0000_0400;
        const O_EXCL = 0x0000_0800;
    }
}

impl OpenFlags {
    pub const O_RDONLY: OpenFlags = OpenFlags::empty();

    /// Reinterpret a guest register value, keeping unknown bits so they can be rejected.
    pub fn from_guest(flags: i32) -> Self {
        OpenFlags::from_bits_retain(flags as u32)
    }
}

/// The only three access modes a descriptor can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    WriteAppend,
}

impl OpenMode {
    pub fn allows(self, capability: Capability) -> bool {
        match (self, capability) {
            (OpenMode::Read, Capability::Read) => true,
            (OpenMode::Write | OpenMode::WriteAppend, Capability::Write) => true,
            _ => false,
        }
    }

    pub fn flags(self) -> OpenFlags {
        match self {
            OpenMode::Read => OpenFlags::O_RDONLY,
            OpenMode::Write => OpenFlags::O_WRONLY,
            OpenMode::WriteAppend => OpenFlags::O_WRONLY | OpenFlags::O_APPEND,
        }
    }
}

impl TryFrom<OpenFlags> for OpenMode {
    type Error = OpenFlags;

    fn try_from(flags: OpenFlags) -> Result<Self, Self::Error> {
        if flags == OpenFlags::O_RDONLY {
            Ok(OpenMode::Read)
        } else if flags == OpenFlags::O_WRONLY {
            Ok(OpenMode::Write)
        } else if flags == OpenFlags::O_WRONLY | OpenFlags::O_APPEND {
            Ok(OpenMode::WriteAppend)
        } else {
            Err(flags)
        }
    }
}

/// What a caller wants to do with a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Read => write!(f, "reading"),
            Capability::Write => write!(f, "writing"),
        }
    }
}

/// Reference point of a `seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set = 0,
    Cur = 1,
    End = 2,
}

impl TryFrom<i32> for Whence {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Whence::Set),
            1 => Ok(Whence::Cur),
            2 => Ok(Whence::End),
            _ => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_flag_combinations_map_to_a_mode() {
        assert_eq!(OpenMode::try_from(OpenFlags::from_guest(0)), Ok(OpenMode::Read));
        assert_eq!(OpenMode::try_from(OpenFlags::from_guest(1)), Ok(OpenMode::Write));
        assert_eq!(OpenMode::try_from(OpenFlags::from_guest(9)), Ok(OpenMode::WriteAppend));

        for bad in [2, 8, 3, 0x201, 0x401, -1] {
            assert!(OpenMode::try_from(OpenFlags::from_guest(bad)).is_err(), "flags {bad:#x}");
        }
    }

    #[test]
    fn append_counts_as_write() {
        assert!(OpenMode::WriteAppend.allows(Capability::Write));
        assert!(!OpenMode::WriteAppend.allows(Capability::Read));
        assert!(!OpenMode::Read.allows(Capability::Write));
    }

    #[test]
    fn whence_from_guest() {
        assert_eq!(Whence::try_from(2), Ok(Whence::End));
        assert_eq!(Whence::try_from(3), Err(3));
    }
}
