use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - SIMIO_TRACE="syscall,channel,coalesce" (comma/space separated; "all" enables all)
/// - SIMIO_TRACE_SYSCALL=1, SIMIO_TRACE_CHANNEL=1, SIMIO_TRACE_COALESCE=1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Syscall,
    Channel,
    Coalesce,
}

const M_SYSCALL: u32 = 1 << 0;
const M_CHANNEL: u32 = 1 << 1;
const M_COALESCE: u32 = 1 << 2;

impl TraceKind {
    fn mask(self) -> u32 {
        match self {
            TraceKind::Syscall => M_SYSCALL,
            TraceKind::Channel => M_CHANNEL,
            TraceKind::Coalesce => M_COALESCE,
        }
    }
}

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let s = v.trim().to_ascii_lowercase();
            !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
        }
        Err(_) => false,
    }
}

fn parse_mask_from_trace_list(s: &str) -> u32 {
    let mut mask = 0u32;
    for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => mask |= M_SYSCALL | M_CHANNEL | M_COALESCE,
            "syscall" | "sc" => mask |= M_SYSCALL,
            "channel" | "io" => mask |= M_CHANNEL,
            "coalesce" | "flush" => mask |= M_COALESCE,
            _ => {}
        }
    }
    mask
}

fn build_mask() -> u32 {
    let mut mask = env::var("SIMIO_TRACE")
        .map(|list| parse_mask_from_trace_list(&list))
        .unwrap_or(0);

    if parse_bool_env("SIMIO_TRACE_SYSCALL") {
        mask |= M_SYSCALL;
    }
    if parse_bool_env("SIMIO_TRACE_CHANNEL") {
        mask |= M_CHANNEL;
    }
    if parse_bool_env("SIMIO_TRACE_COALESCE") {
        mask |= M_COALESCE;
    }
    mask
}

fn mask() -> u32 {
    static MASK: OnceLock<u32> = OnceLock::new();
    *MASK.get_or_init(build_mask)
}

pub fn enabled(k: TraceKind) -> bool {
    mask() & k.mask() != 0
}

fn emit(k: TraceKind, args: fmt::Arguments) {
    if !enabled(k) {
        return;
    }
    log::info!("[{:?}] {}", k, args);
}

pub fn syscall(args: fmt::Arguments) {
    emit(TraceKind::Syscall, args);
}

pub fn channel(args: fmt::Arguments) {
    emit(TraceKind::Channel, args);
}

pub fn coalesce(args: fmt::Arguments) {
    emit(TraceKind::Coalesce, args);
}
