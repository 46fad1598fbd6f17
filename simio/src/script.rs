use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use simio_core::{Fd, SystemIo, SYSCALL_BUFSIZE};

/// Largest buffer a scripted `read` may ask for.
pub const MAX_READ_LEN: usize = SYSCALL_BUFSIZE * 1024;

/// One guest syscall to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Open { path: String, flags: i32 },
    Write { fd: Fd, text: String },
    Read { fd: Fd, len: usize },
    Seek { fd: Fd, offset: i32, whence: i32 },
    Close { fd: Fd },
    Print { text: String },
    ReadChar,
    ReadString { max_len: i32 },
    ReadInt,
    Reset,
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Op>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing script {}", path.display()))
}

pub fn parse(text: &str) -> Result<Vec<Op>> {
    Ok(serde_yaml::from_str(text)?)
}

/// What a replayed syscall returned.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Code(i32),
    Bytes(i32, Vec<u8>),
    Text(String),
    Done,
    Cancelled,
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Code(n) => write!(f, "{}", n),
            Outcome::Bytes(n, bytes) => write!(f, "{} {:?}", n, String::from_utf8_lossy(bytes)),
            Outcome::Text(s) => write!(f, "{:?}", s),
            Outcome::Done => write!(f, "ok"),
            Outcome::Cancelled => write!(f, "cancelled"),
            Outcome::Failed(msg) => write!(f, "error: {}", msg),
        }
    }
}

pub fn execute(io: &mut SystemIo, op: &Op) -> Outcome {
    match op {
        Op::Open { path, flags } => Outcome::Code(io.open_file(path, *flags)),
        Op::Write { fd, text } => Outcome::Code(io.write_to_file(*fd, text.as_bytes())),
        Op::Read { len, .. } if *len > MAX_READ_LEN => {
            Outcome::Failed(format!("read length {} exceeds {}", len, MAX_READ_LEN))
        }
        Op::Read { fd, len } => {
            let mut buf = vec![0u8; *len];
            match io.read_from_file(*fd, &mut buf) {
                Ok(n) => {
                    buf.truncate(usize::try_from(n).unwrap_or(0));
                    Outcome::Bytes(n, buf)
                }
                Err(_) => Outcome::Cancelled,
            }
        }
        Op::Seek { fd, offset, whence } => Outcome::Code(io.seek(*fd, *offset, *whence)),
        Op::Close { fd } => {
            io.close_file(*fd);
            Outcome::Done
        }
        Op::Print { text } => {
            io.print_string(text);
            Outcome::Done
        }
        Op::ReadChar => io.read_char(12).map_or(Outcome::Cancelled, Outcome::Code),
        Op::ReadString { max_len } => io.read_string(8, *max_len).map_or(Outcome::Cancelled, Outcome::Text),
        Op::ReadInt => match io.read_integer(5) {
            Ok(n) => Outcome::Code(n),
            Err(e) => Outcome::Failed(e.to_string()),
        },
        Op::Reset => {
            io.reset_files();
            Outcome::Done
        }
    }
}
