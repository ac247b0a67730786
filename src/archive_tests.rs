//! Unit tests for the deterministic archive writer.

use super::*;
use rstest::{fixture, rstest};
use std::io::{Cursor, Read};
use tempfile::TempDir;
use zip::ZipArchive;

/// Offset of the modification time field in a local file header.
const LOCAL_HEADER_TIME_OFFSET: usize = 10;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

#[fixture]
fn sample_entries() -> Vec<FileEntry> {
    vec![
        FileEntry::executable("tool/tool", b"\x7fELF fake binary".to_vec()),
        FileEntry::new("tool/README.txt", "read me"),
        FileEntry::new("tool-1.0.dist-info/METADATA", "Name: tool\n"),
    ]
}

fn write_to_memory(entries: &[FileEntry]) -> Vec<u8> {
    write_archive_to(Cursor::new(Vec::new()), entries)
        .expect("archive writes")
        .into_inner()
}

fn open(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(bytes)).expect("valid zip")
}

#[rstest]
fn identical_inputs_produce_identical_bytes(sample_entries: Vec<FileEntry>) {
    assert_eq!(
        write_to_memory(&sample_entries),
        write_to_memory(&sample_entries)
    );
}

#[rstest]
fn files_on_disk_are_byte_identical(temp_dir: TempDir, sample_entries: Vec<FileEntry>) {
    let first = temp_dir.path().join("a").join("tool.whl");
    let second = temp_dir.path().join("b").join("tool.whl");
    write_archive(&first, &sample_entries).expect("first archive");
    write_archive(&second, &sample_entries).expect("second archive");

    assert_eq!(
        fs::read(&first).expect("read first"),
        fs::read(&second).expect("read second")
    );
}

#[rstest]
fn members_keep_supplied_order(sample_entries: Vec<FileEntry>) {
    let mut archive = open(write_to_memory(&sample_entries));
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("member").name().to_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "tool/tool",
            "tool/README.txt",
            "tool-1.0.dist-info/METADATA"
        ]
    );
}

#[rstest]
fn members_record_regular_file_permissions(sample_entries: Vec<FileEntry>) {
    let mut archive = open(write_to_memory(&sample_entries));

    let binary = archive.by_name("tool/tool").expect("binary member");
    assert_eq!(binary.unix_mode(), Some(0o100_755));
    drop(binary);

    let readme = archive.by_name("tool/README.txt").expect("readme member");
    assert_eq!(readme.unix_mode(), Some(0o100_644));
}

#[rstest]
fn members_are_deflated(sample_entries: Vec<FileEntry>) {
    let mut archive = open(write_to_memory(&sample_entries));
    for i in 0..archive.len() {
        let member = archive.by_index(i).expect("member");
        assert_eq!(member.compression(), CompressionMethod::Deflated);
    }
}

#[rstest]
fn first_member_uses_zip_epoch_timestamp(sample_entries: Vec<FileEntry>) {
    let bytes = write_to_memory(&sample_entries);
    // DOS time 00:00:00 and date 1980-01-01, little endian.
    assert_eq!(
        bytes.get(LOCAL_HEADER_TIME_OFFSET..LOCAL_HEADER_TIME_OFFSET + 4),
        Some([0x00, 0x00, 0x21, 0x00].as_slice())
    );
}

#[rstest]
fn content_round_trips(sample_entries: Vec<FileEntry>) {
    let mut archive = open(write_to_memory(&sample_entries));
    let mut content = Vec::new();
    archive
        .by_name("tool/tool")
        .expect("binary member")
        .read_to_end(&mut content)
        .expect("read member");
    assert_eq!(content, b"\x7fELF fake binary");
}

#[rstest]
fn duplicate_paths_are_rejected_without_output(temp_dir: TempDir) {
    let path = temp_dir.path().join("dup.whl");
    let entries = [
        FileEntry::new("tool/tool", "one"),
        FileEntry::new("tool/tool", "two"),
    ];

    let err = write_archive(&path, &entries).expect_err("duplicate path");
    assert!(
        matches!(err, ArchiveError::DuplicatePath { ref path } if path == "tool/tool"),
        "unexpected error: {err:?}"
    );
    assert!(!path.exists(), "no archive may be left behind");
    assert_eq!(
        fs::read_dir(temp_dir.path()).expect("list dir").count(),
        0,
        "no temporary file may be left behind"
    );
}

#[rstest]
#[case::absolute("/etc/tool", "absolute path")]
#[case::parent_segment("../tool", "parent directory segment")]
#[case::nested_parent("tool/../../tool", "parent directory segment")]
#[case::backslash("tool\\tool.exe", "backslash separator")]
#[case::empty_segment("tool//tool", "empty segment")]
#[case::trailing_slash("tool/", "empty segment")]
#[case::empty("", "empty segment")]
fn malformed_paths_are_rejected(#[case] bad_path: &str, #[case] expected: &str) {
    let entries = [
        FileEntry::new("tool/ok.txt", "fine"),
        FileEntry::new(bad_path, "payload"),
    ];

    let err = write_archive_to(Cursor::new(Vec::new()), &entries).expect_err("invalid path");
    let ArchiveError::InvalidPath { path, reason } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(path, bad_path);
    assert_eq!(*reason, expected);
}

#[rstest]
fn malformed_path_leaves_no_file(temp_dir: TempDir) {
    let path = temp_dir.path().join("bad.whl");
    let entries = [FileEntry::new("/etc/evil", "x")];

    let err = write_archive(&path, &entries).expect_err("absolute path");
    assert!(matches!(err, ArchiveError::InvalidPath { .. }));
    assert_eq!(fs::read_dir(temp_dir.path()).expect("list dir").count(), 0);
}

#[rstest]
fn dotted_names_are_not_parent_segments() {
    let entries = [
        FileEntry::new("tool/.hidden", "x"),
        FileEntry::new("tool/..data", "y"),
        FileEntry::new("tool-1.0.dist-info/RECORD", "z"),
    ];
    write_archive_to(Cursor::new(Vec::new()), &entries).expect("valid paths");
}

#[rstest]
fn creates_missing_parent_directories(temp_dir: TempDir, sample_entries: Vec<FileEntry>) {
    let path = temp_dir.path().join("nested").join("dist").join("tool.whl");
    write_archive(&path, &sample_entries).expect("archive writes");
    assert!(path.is_file());
}

#[rstest]
fn unwritable_parent_is_an_io_error(temp_dir: TempDir, sample_entries: Vec<FileEntry>) {
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").expect("write blocker");

    let err = write_archive(&blocker.join("tool.whl"), &sample_entries)
        .expect_err("parent is a file");
    assert!(matches!(err, ArchiveError::Io(_)), "unexpected error: {err:?}");
}

#[rstest]
fn overwrites_existing_archive(temp_dir: TempDir, sample_entries: Vec<FileEntry>) {
    let path = temp_dir.path().join("tool.whl");
    fs::write(&path, b"stale").expect("write stale file");

    write_archive(&path, &sample_entries).expect("archive writes");
    assert_eq!(
        fs::read(&path).expect("read archive"),
        write_to_memory(&sample_entries)
    );
}

#[cfg(unix)]
#[rstest]
fn published_archive_is_world_readable(temp_dir: TempDir, sample_entries: Vec<FileEntry>) {
    use std::os::unix::fs::PermissionsExt;

    let path = temp_dir.path().join("tool.whl");
    write_archive(&path, &sample_entries).expect("archive writes");
    let mode = fs::metadata(&path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn empty_entry_list_is_a_valid_archive() {
    let archive = open(write_to_memory(&[]));
    assert_eq!(archive.len(), 0);
}
