//! End-to-end reads of archives written by the `zip` crate.

mod common;

use std::fs;
use std::io::Cursor;

use common::{corrupt_body, mark_encrypted, noise, truncate_in_body, zip_archive};
use ziprecords::{ArchiveError, ArchiveInputFormat, ArchiveRecordReader, ReaderConfig, ReaderState, WorkUnit};

fn reader(bytes: Vec<u8>, lenient: bool) -> ArchiveRecordReader {
    let mut reader = ArchiveRecordReader::new(ReaderConfig::default().with_lenient(lenient));
    reader.initialize(Box::new(Cursor::new(bytes))).unwrap();
    reader
}

fn names(bytes: Vec<u8>, lenient: bool) -> Result<Vec<String>, ArchiveError> {
    reader(bytes, lenient)
        .into_iter()
        .map(|r| r.map(|record| record.name().to_string()))
        .collect()
}

fn archive_a(stored: bool) -> Vec<u8> {
    zip_archive(
        &[("x.txt", &b"hello world"[..]), ("y.bin", &[0x00u8, 0xff, 0x7f][..])],
        stored,
    )
}

fn archive_b() -> Vec<u8> {
    let second = "lorem ipsum dolor sit amet ".repeat(64);
    let bytes = zip_archive(
        &[("first.txt", &b"intact"[..]), ("second.txt", second.as_bytes())],
        false,
    );
    truncate_in_body(bytes, 1)
}

#[test]
fn archive_a_yields_both_entries() {
    for stored in [true, false] {
        for lenient in [true, false] {
            let mut reader = reader(archive_a(stored), lenient);

            assert!(reader.advance().unwrap());
            let record = reader.current_record().unwrap();
            assert_eq!(record.name(), "x.txt");
            assert_eq!(record.payload(), b"hello world");

            assert!(reader.advance().unwrap());
            let record = reader.current_record().unwrap();
            assert_eq!(record.name(), "y.bin");
            assert_eq!(record.payload(), &[0x00, 0xff, 0x7f]);

            assert!(!reader.advance().unwrap());
            assert_eq!(reader.state(), ReaderState::Exhausted);
            assert_eq!(reader.progress(), 1.0);
        }
    }
}

#[test]
fn archive_b_truncated_strict() {
    let mut reader = reader(archive_b(), false);

    assert!(reader.advance().unwrap());
    assert_eq!(reader.current_record().unwrap().payload(), b"intact");

    let err = reader.advance().unwrap_err();
    assert!(matches!(err, ArchiveError::TruncatedStream { .. }), "{err:?}");
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(!reader.advance().unwrap());
}

#[test]
fn archive_b_truncated_lenient() {
    let mut reader = reader(archive_b(), true);

    assert!(reader.advance().unwrap());
    assert_eq!(reader.current_record().unwrap().name(), "first.txt");
    assert!(!reader.advance().unwrap());
    assert!(!reader.advance().unwrap());
    assert!(matches!(
        reader.current_record(),
        Err(ArchiveError::NoCurrentRecord)
    ));
}

#[test]
fn corruption_after_clean_prefix() {
    let entries: Vec<(String, Vec<u8>)> = (0..5)
        .map(|i| (format!("part-{i}.txt"), format!("payload number {i}").into_bytes()))
        .collect();
    let refs: Vec<(&str, &[u8])> = entries.iter().map(|(n, d)| (n.as_str(), d.as_slice())).collect();

    let mut bytes = zip_archive(&refs, true);
    corrupt_body(&mut bytes, 3);

    let err = names(bytes.clone(), false).unwrap_err();
    assert!(
        matches!(err, ArchiveError::ChecksumMismatch { ref entry, .. } if entry == "part-3.txt"),
        "{err:?}"
    );

    assert_eq!(
        names(bytes, true).unwrap(),
        ["part-0.txt", "part-1.txt", "part-2.txt"]
    );
}

#[test]
fn encrypted_entry_policy() {
    let mut bytes = archive_a(false);
    mark_encrypted(&mut bytes, 1);

    let err = names(bytes.clone(), false).unwrap_err();
    assert!(matches!(err, ArchiveError::MalformedEntry { .. }), "{err:?}");

    assert_eq!(names(bytes, true).unwrap(), ["x.txt"]);
}

#[test]
fn non_archive_input_is_empty_in_both_modes() {
    for lenient in [true, false] {
        assert!(names(noise(4096), lenient).unwrap().is_empty());
        assert!(names(Vec::new(), lenient).unwrap().is_empty());
    }
}

#[test]
fn reads_local_files_through_the_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zip-01.zip");
    fs::write(&path, archive_a(false)).unwrap();

    let format = ArchiveInputFormat::default();
    let unit = WorkUnit::from_path(&path);
    assert!(!format.is_splittable(&unit));

    let mut reader = format.create_reader(&unit).unwrap();
    let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name(), "x.txt");
    assert_eq!(reader.records_read(), 2);

    reader.close();
    reader.close();
    assert_eq!(reader.state(), ReaderState::Closed);
    assert!(!reader.advance().unwrap());
}

#[test]
fn missing_archive_is_source_unavailable() {
    let format = ArchiveInputFormat::default();
    let err = format
        .create_reader(&WorkUnit::new("/nonexistent/zip-99.zip"))
        .err()
        .unwrap();
    assert!(matches!(err, ArchiveError::SourceUnavailable { .. }), "{err:?}");
}
