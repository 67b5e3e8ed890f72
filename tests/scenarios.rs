//! Scenario tests against real files, covering the numbered behaviors the format's invariants
//! are built around: basic round-tripping, fragmented writes, eviction under pressure, an
//! entry larger than the whole log, and that the log keeps working afterward.

use ring_log::{LogManager, RingLogConfig};
use tempfile::tempdir;

fn open_single(logs_partition_size: u32, name: &str, path: &std::path::Path) -> LogManager {
    let config = RingLogConfig::builder(logs_partition_size).with_log(name, path).build().unwrap();
    LogManager::open(&config).unwrap()
}

#[test]
fn empty_log_has_nothing_to_read() {
    let dir = tempdir().unwrap();
    let mgr = open_single(200, "a", &dir.path().join("a"));
    assert!(!mgr.has_unread("a"));
}

#[test]
fn single_write_then_read() {
    let dir = tempdir().unwrap();
    let mgr = open_single(200, "a", &dir.path().join("a"));

    mgr.write_tail("a", b"hello");
    assert!(!mgr.has_unread("a"), "not visible until write_tail_complete");
    mgr.write_tail_complete("a");
    assert!(mgr.has_unread("a"));

    let mut cursor = 0;
    let mut buf = [0u8; 16];
    let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"hello");
    assert_eq!(mgr.read_head("a", &mut buf, &mut cursor).unwrap(), 0, "nothing left to read");

    mgr.read_head_success("a");
    assert!(!mgr.has_unread("a"));
}

#[test]
fn fragmented_write_tail_joins_into_one_entry() {
    let dir = tempdir().unwrap();
    let mgr = open_single(200, "a", &dir.path().join("a"));

    mgr.write_tail("a", b"one-");
    mgr.write_tail("a", b"two-");
    mgr.write_tail("a", b"three");
    mgr.write_tail_complete("a");

    let mut cursor = 0;
    let mut buf = [0u8; 64];
    let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"one-two-three");
    mgr.read_head_success("a");
}

#[test]
fn read_head_can_be_chunked_across_calls() {
    let dir = tempdir().unwrap();
    let mgr = open_single(200, "a", &dir.path().join("a"));

    mgr.write_tail("a", b"abcdefghij");
    mgr.write_tail_complete("a");

    let mut cursor = 0;
    let mut collected = Vec::new();
    loop {
        let mut buf = [0u8; 3];
        let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected, b"abcdefghij");
    mgr.read_head_success("a");
}

#[test]
fn write_tail_complete_without_write_tail_is_a_no_op() {
    let dir = tempdir().unwrap();
    let mgr = open_single(200, "a", &dir.path().join("a"));
    mgr.write_tail_complete("a");
    assert!(!mgr.has_unread("a"));
}

#[test]
fn oldest_entries_are_evicted_to_make_room() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a");
    let mgr = open_single(200, "a", &path);

    for i in 0u8..30 {
        mgr.write_tail("a", &[i; 4]);
        mgr.write_tail_complete("a");
    }

    let mut seen = Vec::new();
    while mgr.has_unread("a") {
        let mut cursor = 0;
        let mut buf = [0u8; 4];
        let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
        assert_eq!(n, 4);
        seen.push(buf[0]);
        mgr.read_head_success("a");
    }

    assert!(seen.len() < 30, "the ring is too small to hold all 30 entries");
    assert_eq!(*seen.last().unwrap(), 29, "the most recent entry always survives");
    // Whatever survived is a contiguous run ending at 29.
    let first = seen[0];
    let expected: Vec<u8> = (first..=29).collect();
    assert_eq!(seen, expected);
}

#[test]
fn entry_larger_than_the_log_evicts_everything_and_is_still_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a");
    let config = RingLogConfig::builder(200).with_log("a", &path).build().unwrap();
    let capacity = u32::from(config.log_capacity());
    let mgr = LogManager::open(&config).unwrap();

    mgr.write_tail("a", b"hello");
    mgr.write_tail_complete("a");
    assert!(mgr.has_unread("a"));

    let garbage = b"Garbage";
    let mut written = 0u32;
    while written < capacity {
        mgr.write_tail("a", garbage);
        written += u32::try_from(garbage.len()).unwrap();
    }
    mgr.write_tail_complete("a");

    assert!(mgr.has_unread("a"), "the huge entry is still there to be read");
    let mut cursor = 0;
    let mut total = 0usize;
    loop {
        let mut buf = [0u8; 8];
        let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
        if n == 0 {
            break;
        }
        total += n;
    }
    mgr.read_head_success("a");
    assert!(total > 0);
    assert!(!mgr.has_unread("a"), "the whole huge entry, and nothing else, was consumed");

    // The log is still usable afterward.
    mgr.write_tail("a", b"still alive");
    mgr.write_tail_complete("a");
    let mut cursor = 0;
    let mut buf = [0u8; 32];
    let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"still alive");
    mgr.read_head_success("a");
}

#[test]
fn reopening_an_existing_file_preserves_unread_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a");

    {
        let mgr = open_single(200, "a", &path);
        mgr.write_tail("a", b"persisted");
        mgr.write_tail_complete("a");
    }

    let mgr = open_single(200, "a", &path);
    assert!(mgr.has_unread("a"));
    let mut cursor = 0;
    let mut buf = [0u8; 32];
    let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"persisted");
    mgr.read_head_success("a");
}

#[test]
fn multiple_logs_share_a_partition_independently() {
    let dir = tempdir().unwrap();
    let config = RingLogConfig::builder(400)
        .with_log("a", dir.path().join("a"))
        .with_log("b", dir.path().join("b"))
        .build()
        .unwrap();
    let mgr = LogManager::open(&config).unwrap();

    mgr.write_tail("a", b"from a");
    mgr.write_tail_complete("a");
    assert!(mgr.has_unread("a"));
    assert!(!mgr.has_unread("b"));

    mgr.write_tail("b", b"from b");
    mgr.write_tail_complete("b");

    let mut cursor = 0;
    let mut buf = [0u8; 32];
    let n = mgr.read_head("a", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"from a");
    mgr.read_head_success("a");

    let mut cursor = 0;
    let n = mgr.read_head("b", &mut buf, &mut cursor).unwrap();
    assert_eq!(&buf[..n], b"from b");
    mgr.read_head_success("b");
}
