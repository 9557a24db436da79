use edseq::errors::{Error, ErrorKind};
use edseq::{Eds, SourceSet};

fn paths(ids: &[u32]) -> SourceSet {
    SourceSet::from_ids(ids.iter().copied())
}

#[test]
fn simple_sources() {
    let eds =
        Eds::from_bytes_with_sources("{ACGT}{A,ACA}{CGT}{T,TG}", "{0}{1,3}{2}{0}{1}{2,3}").unwrap();

    assert!(eds.has_sources());
    assert_eq!(eds.cardinality(), 6);

    let sources = eds.sources().unwrap();
    assert_eq!(sources.len(), 6);
    assert_eq!(sources[0], SourceSet::Universal);
    assert_eq!(sources[1], paths(&[1, 3]));
    assert_eq!(sources[2], paths(&[2]));
    assert_eq!(sources[3], SourceSet::Universal);
    assert_eq!(sources[4], paths(&[1]));
    assert_eq!(sources[5], paths(&[2, 3]));
}

#[test]
fn load_sources_separately() {
    let mut eds = Eds::from_bytes("{AC}{,A,T}{GT}").unwrap();
    assert!(!eds.has_sources());
    assert_eq!(eds.cardinality(), 5);

    eds.load_sources_bytes("{0}{1}{2}{3}{0}").unwrap();
    assert!(eds.has_sources());
    let sources = eds.sources().unwrap();
    assert_eq!(sources[1], paths(&[1])); // the empty alternative has sources too
    assert_eq!(sources[4], SourceSet::Universal);
}

#[test]
fn save_sources_round_trip() {
    let eds = Eds::from_bytes_with_sources("{A}{B,C}", "{1}{2}{1,2}").unwrap();
    let mut out = Vec::new();
    eds.save_sources(&mut out).unwrap();
    assert_eq!(out, b"{1}{2}{1,2}\n".to_vec());
}

#[test]
fn sources_with_whitespace() {
    let eds = Eds::from_bytes_with_sources("{A}{B}", "{ 1 } { 2 , 3 }").unwrap();
    let sources = eds.sources().unwrap();
    assert_eq!(sources[0], paths(&[1]));
    assert_eq!(sources[1], paths(&[2, 3]));
}

#[test]
fn cardinality_mismatch_is_fatal() {
    match Eds::from_bytes_with_sources("{A}{B,C}", "{1}{2}") {
        Err(Error::SourceCardinality { found, expected }) => {
            assert_eq!(found, 2);
            assert_eq!(expected, 3);
        }
        other => panic!("expected cardinality error, got {other:?}"),
    }
    let too_many = Eds::from_bytes_with_sources("{A}", "{1}{2}");
    assert_eq!(
        too_many.unwrap_err().kind(),
        ErrorKind::InvalidInputFormat
    );
}

#[test]
fn malformed_sources_rejected() {
    assert!(Eds::from_bytes_with_sources("{A}", "{}").is_err());
    assert!(Eds::from_bytes_with_sources("{A}", "{x}").is_err());
    assert!(Eds::from_bytes_with_sources("{A}", "1").is_err());
    // the mixed universal form is rejected rather than guessed at
    assert!(Eds::from_bytes_with_sources("{A}", "{0,2}").is_err());
}

#[test]
fn save_sources_without_sources_fails() {
    let eds = Eds::from_bytes("{A}").unwrap();
    let mut out = Vec::new();
    assert!(eds.save_sources(&mut out).is_err());
}

#[test]
fn source_aware_position_checks() {
    // intersection {1,3} ∩ {1} = {1} accepts, {2} ∩ {1} rejects
    let eds =
        Eds::from_bytes_with_sources("{ACGT}{A,ACA}{CGT}{T,TG}", "{0}{1,3}{2}{0}{1}{2,3}").unwrap();
    assert!(eds.check_position(4, &[0, 2], b"ACGTT").unwrap());
    assert!(!eds.check_position(4, &[1, 2], b"ACACGTT").unwrap());
    // without the source constraint the same reading matches
    let unsourced = Eds::from_bytes("{ACGT}{A,ACA}{CGT}{T,TG}").unwrap();
    assert!(unsourced.check_position(4, &[1, 2], b"ACACGTT").unwrap());
}
