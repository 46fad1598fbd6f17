use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use simio_core::{IoConfigBuilder, IoState, SharedBuffer, SystemIo, SYSCALL_MAXFILES};

const O_RDONLY: i32 = 0;
const O_WRONLY: i32 = 1;
const O_APPEND: i32 = 8;

const SEEK_SET: i32 = 0;
const SEEK_CUR: i32 = 1;
const SEEK_END: i32 = 2;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("file_syscalls").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn path_str(dir: &PathBuf, file: &str) -> String {
    dir.join(file).to_string_lossy().into_owned()
}

fn console_io() -> SystemIo {
    SystemIo::default().with_state(IoState::with_memory_streams("", SharedBuffer::new(), SharedBuffer::new()))
}

#[test]
fn write_close_reopen_read() {
    let dir = scratch_dir("write_close_reopen_read");
    let a = path_str(&dir, "a.txt");
    let mut io = console_io();

    let fd = io.open_file(&a, O_WRONLY);
    assert_eq!(fd, 3);
    assert_eq!(io.write_to_file(fd, b"hello"), 5);
    io.close_file(fd);

    let fd = io.open_file(&a, O_RDONLY);
    assert_eq!(fd, 3);
    let mut buf = [0u8; 10];
    assert_eq!(io.read_from_file(fd, &mut buf), Ok(5));
    assert_eq!(&buf, b"hello\0\0\0\0\0");
    assert_eq!(io.read_from_file(fd, &mut buf), Ok(0));
    assert_eq!(io.read_from_file(fd, &mut buf), Ok(0));
}

#[test]
fn write_keeps_zero_bytes() {
    let dir = scratch_dir("write_keeps_zero_bytes");
    let f = path_str(&dir, "zeros.bin");
    let mut io = console_io();

    let fd = io.open_file(&f, O_WRONLY);
    let words: Vec<u8> = [1u32, 0, 0x0100, 0].iter().flat_map(|w| w.to_le_bytes()).collect();
    assert_eq!(io.write_to_file(fd, &words), 16);
    io.close_file(fd);

    assert_eq!(fs::read(&f).unwrap(), words);
}

#[test]
fn same_name_twice_is_rejected() {
    let dir = scratch_dir("same_name_twice_is_rejected");
    let a = path_str(&dir, "a.txt");
    let mut io = console_io();

    let first = io.open_file(&a, O_WRONLY);
    assert_eq!(io.open_file(&a, O_WRONLY), -1);
    assert_eq!(io.last_error(), format!("File name {a} is already open."));

    io.close_file(first);
    assert_eq!(io.open_file(&a, O_RDONLY), first);
    assert_eq!(io.last_error(), "File operation OK");
}

#[test]
fn unsupported_flags_do_not_leak_slots() {
    let dir = scratch_dir("unsupported_flags_do_not_leak_slots");
    let mut io = console_io();

    for flags in [2, O_APPEND, 0x201, 0x601, 3] {
        assert_eq!(io.open_file(&path_str(&dir, "x"), flags), -1, "flags {flags:#x}");
        assert!(io.last_error().contains("unknown requested opening flag"));
    }

    let user_slots = SYSCALL_MAXFILES - 3;
    for i in 0..user_slots {
        let fd = io.open_file(&path_str(&dir, &format!("f{i}")), O_WRONLY);
        assert_eq!(fd, 3 + i as i32);
    }
    assert_eq!(io.open_file(&path_str(&dir, "overflow"), O_WRONLY), -1);
    assert!(io.last_error().contains("exceeds maximum open file limit of 32"));
    assert_eq!(io.table().open_count(), SYSCALL_MAXFILES);
}

#[test]
fn failed_open_releases_the_slot() {
    let dir = scratch_dir("failed_open_releases_the_slot");
    let missing = path_str(&dir, "missing.txt");
    let mut io = console_io();

    for _ in 0..(SYSCALL_MAXFILES * 2) {
        assert_eq!(io.open_file(&missing, O_RDONLY), -1);
    }
    assert_eq!(io.last_error(), format!("File {missing} not found, open for input."));
    assert_eq!(io.table().open_count(), 3);

    let fd = io.open_file(&path_str(&dir, "present.txt"), O_WRONLY);
    assert_eq!(fd, 3);
}

#[test]
fn directory_cannot_be_opened() {
    let dir = scratch_dir("directory_cannot_be_opened");
    fs::create_dir(dir.join("sub")).unwrap();
    let sub = path_str(&dir, "sub");
    let mut io = console_io();

    assert_eq!(io.open_file(&sub, O_RDONLY), -1);
    assert_eq!(io.last_error(), format!("File {sub} not found, open for input."));
    assert_eq!(io.open_file(&sub, O_WRONLY), -1);
    assert_eq!(io.last_error(), format!("File {sub} not found, open for output."));
    assert_eq!(io.table().open_count(), 3);

    assert_eq!(io.open_file(&path_str(&dir, "next.txt"), O_WRONLY), 3);
}

#[test]
fn wrong_direction_is_rejected() {
    let dir = scratch_dir("wrong_direction_is_rejected");
    let f = path_str(&dir, "f.txt");
    fs::write(&f, b"data").unwrap();
    let mut io = console_io();

    let r = io.open_file(&f, O_RDONLY);
    assert_eq!(io.write_to_file(r, b"x"), -1);
    assert_eq!(io.last_error(), format!("File descriptor {r} is not open for writing"));
    assert_eq!(fs::read(&f).unwrap(), b"data");

    io.close_file(r);
    let w = io.open_file(&f, O_WRONLY);
    let mut buf = [0u8; 4];
    assert_eq!(io.read_from_file(w, &mut buf), Ok(-1));
    assert_eq!(io.last_error(), format!("File descriptor {w} is not open for reading"));
}

#[test]
fn closed_descriptor_is_unusable() {
    let dir = scratch_dir("closed_descriptor_is_unusable");
    let mut io = console_io();
    let fd = io.open_file(&path_str(&dir, "f"), O_WRONLY);
    io.close_file(fd);
    io.close_file(fd);

    assert_eq!(io.write_to_file(fd, b"x"), -1);
    assert_eq!(io.seek(fd, 0, SEEK_SET), -1);
}

#[test]
fn write_truncates_and_append_appends() {
    let dir = scratch_dir("write_truncates_and_append_appends");
    let f = path_str(&dir, "log.txt");
    fs::write(&f, b"old contents").unwrap();
    let mut io = console_io();

    let fd = io.open_file(&f, O_WRONLY);
    io.write_to_file(fd, b"one");
    io.close_file(fd);
    assert_eq!(fs::read_to_string(&f).unwrap(), "one");

    let fd = io.open_file(&f, O_WRONLY | O_APPEND);
    io.write_to_file(fd, b"two");
    io.close_file(fd);
    assert_eq!(fs::read_to_string(&f).unwrap(), "onetwo");
}

#[test]
fn seek_end_matches_seek_cur() {
    let dir = scratch_dir("seek_end_matches_seek_cur");
    let f = path_str(&dir, "digits.txt");
    fs::write(&f, b"0123456789").unwrap();
    let mut io = console_io();
    let fd = io.open_file(&f, O_RDONLY);

    let end = io.seek(fd, 0, SEEK_END);
    assert_eq!(end, 10);
    assert_eq!(io.seek(fd, 0, SEEK_CUR), end);

    assert_eq!(io.seek(fd, 4, SEEK_SET), 4);
    assert_eq!(io.seek(fd, -2, SEEK_CUR), 2);
    assert_eq!(io.seek(fd, -3, SEEK_END), 7);

    let mut buf = [0u8; 3];
    assert_eq!(io.read_from_file(fd, &mut buf), Ok(3));
    assert_eq!(&buf, b"789");
}

#[test]
fn negative_seek_fails_without_moving() {
    let dir = scratch_dir("negative_seek_fails_without_moving");
    let f = path_str(&dir, "digits.txt");
    fs::write(&f, b"0123456789").unwrap();
    let mut io = console_io();
    let fd = io.open_file(&f, O_RDONLY);

    assert_eq!(io.seek(fd, 5, SEEK_SET), 5);
    assert_eq!(io.seek(fd, -6, SEEK_CUR), -1);
    assert_eq!(io.seek(fd, -11, SEEK_END), -1);
    assert_eq!(io.seek(fd, -1, SEEK_SET), -1);
    assert_eq!(io.seek(fd, 0, 7), -1);
    assert_eq!(io.seek(fd, 0, SEEK_CUR), 5);
}

#[test]
fn seek_needs_a_read_descriptor() {
    let dir = scratch_dir("seek_needs_a_read_descriptor");
    let mut io = console_io();

    let w = io.open_file(&path_str(&dir, "w.txt"), O_WRONLY);
    assert_eq!(io.write_to_file(w, b"abcde"), 5);
    assert_eq!(io.seek(w, 0, SEEK_END), -1);
    assert_eq!(io.last_error(), format!("File descriptor {w} is not open for reading"));

    let a = io.open_file(&path_str(&dir, "a.txt"), O_WRONLY | O_APPEND);
    assert_eq!(io.seek(a, 0, SEEK_SET), -1);
    assert_eq!(io.last_error(), format!("File descriptor {a} is not open for reading"));

    // the failed seek left the write position alone
    assert_eq!(io.write_to_file(w, b"f"), 1);
    io.close_file(w);
    assert_eq!(fs::read_to_string(dir.join("w.txt")).unwrap(), "abcdef");
}

#[test]
fn relative_name_follows_program_directory() {
    let dir = scratch_dir("relative_name_follows_program_directory");
    fs::write(dir.join("input.txt"), b"beside the program").unwrap();
    let config = IoConfigBuilder::new().with_program(dir.join("main.s")).get();
    let mut io = SystemIo::from_config(config)
        .with_state(IoState::with_memory_streams("", SharedBuffer::new(), SharedBuffer::new()));

    let fd = io.open_file("input.txt", O_RDONLY);
    assert_eq!(fd, 3);
    let mut buf = [0u8; 64];
    assert_eq!(io.read_from_file(fd, &mut buf), Ok(18));
}

#[test]
fn reset_closes_user_descriptors() {
    let dir = scratch_dir("reset_closes_user_descriptors");
    let mut io = console_io();
    let fd = io.open_file(&path_str(&dir, "a"), O_WRONLY);
    io.open_file(&path_str(&dir, "b"), O_WRONLY);

    io.reset_files();
    assert_eq!(io.table().open_count(), 3);
    assert_eq!(io.write_to_file(fd, b"x"), -1);
    assert_eq!(io.open_file(&path_str(&dir, "b"), O_WRONLY), 3);
}

#[cfg(target_os = "linux")]
#[test]
fn failed_write_reports_total_failure() {
    if !std::path::Path::new("/dev/full").exists() {
        return;
    }
    let mut io = console_io();
    let fd = io.open_file("/dev/full", O_WRONLY);
    if fd < 0 {
        // not writable in this sandbox
        return;
    }

    assert_eq!(io.write_to_file(fd, b"does not fit"), -1);
    assert_eq!(io.last_error(), format!("IO Exception on write of file with fd {fd}"));
}
