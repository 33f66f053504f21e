//! Loading sample files from disk.

use std::io::Write;

use aiq::{load_samples, SampleFileError};

fn write_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_records_in_order() {
    let file = write_file("1 0110\n0 passive\n\n2 0#1\n1 11\n");
    let set = load_samples(file.path()).unwrap();

    assert_eq!(set.len(), 4);
    assert_eq!(set.num_strata(), 3);
    assert_eq!(set.counts(), &[1, 2, 1]);
    let programs: Vec<&str> = set.iter().map(|s| s.program.as_str()).collect();
    assert_eq!(programs, ["0110", "passive", "0#1", "11"]);
    let ordinals: Vec<usize> = set.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, [0, 1, 2, 3]);

    let p = set.probabilities();
    assert_eq!(p[0], 0.0);
    assert!((p[1] - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn malformed_line_is_reported_with_its_number() {
    let file = write_file("1 ok\n2\n");
    match load_samples(file.path()) {
        Err(SampleFileError::Malformed { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected Malformed, got {other:?}"),
    }

    let file = write_file("one two\n");
    assert!(matches!(
        load_samples(file.path()),
        Err(SampleFileError::InvalidStratum { line: 1, .. })
    ));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.samples");
    let err = load_samples(&path).unwrap_err();
    assert!(matches!(err, SampleFileError::Io { .. }));
    assert!(err.to_string().contains("absent.samples"));
}

#[test]
fn empty_file_is_rejected() {
    let file = write_file("\n\n");
    assert!(matches!(load_samples(file.path()), Err(SampleFileError::Empty)));
}
