use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;

use edseq::errors::{Error, ErrorKind};
use edseq::{Eds, OutputFormat, StorageMode};

const SAMPLE: &str = "{ACGT}{A,ACA}{CGT}{T,TG}";

fn sample() -> Eds {
    Eds::from_bytes(SAMPLE).unwrap()
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn parse_and_count() {
    let eds = sample();
    assert_eq!(eds.len(), 4);
    assert_eq!(eds.cardinality(), 6);
    assert_eq!(eds.char_count(), 14);
    assert!(!eds.is_empty());
    assert!(!eds.has_sources());

    let meta = eds.metadata();
    assert_eq!(meta.is_degenerate, vec![false, true, false, true]);
    assert_eq!(meta.symbol_sizes, vec![1, 2, 1, 2]);
    assert_eq!(meta.string_lengths, vec![4, 1, 3, 3, 1, 2]);
    assert_eq!(meta.cum_set_sizes, vec![0, 1, 3, 4]);
    assert_eq!(meta.cum_common_positions, vec![0, 4, 4, 7, 7]);
    assert_eq!(meta.cum_degenerate_strings, vec![0, 0, 2, 2, 4]);
}

#[test]
fn parse_compact_form() {
    let compact = Eds::from_bytes("ACGT{A,ACA}CGT{T,TG}").unwrap();
    let full = sample();
    assert_eq!(compact.metadata(), full.metadata());
    for i in 0..full.len() {
        assert_eq!(compact.read_symbol(i).unwrap(), full.read_symbol(i).unwrap());
    }
}

#[test]
fn parse_whitespace_and_empty() {
    let eds = Eds::from_bytes("{AC GT}\n{A,\tACA}").unwrap();
    assert_eq!(eds.read_symbol(0).unwrap(), vec![b"ACGT".to_vec()]);
    assert_eq!(eds.cardinality(), 3);

    let empty = Eds::from_bytes("").unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.char_count(), 0);
}

#[test]
fn parse_errors_carry_positions() {
    match Eds::from_bytes("{ACGT") {
        Err(Error::Parse { pos, .. }) => assert_eq!(pos, 5),
        other => panic!("expected parse error, got {other:?}"),
    }
    match Eds::from_bytes("{A}x}") {
        Err(Error::Parse { pos, .. }) => assert_eq!(pos, 4),
        other => panic!("expected parse error, got {other:?}"),
    }
    let err = Eds::from_bytes("{}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInputFormat);
}

#[test]
fn save_full_and_compact_round_trip() {
    let eds = sample();

    let mut full = Vec::new();
    eds.save(&mut full, OutputFormat::Full).unwrap();
    assert_eq!(full, format!("{SAMPLE}\n").into_bytes());

    let mut compact = Vec::new();
    eds.save(&mut compact, OutputFormat::Compact).unwrap();
    assert_eq!(compact, b"ACGT{A,ACA}CGT{T,TG}\n".to_vec());

    let reparsed = Eds::from_bytes(&compact).unwrap();
    assert_eq!(reparsed.metadata().symbol_sizes, eds.metadata().symbol_sizes);
    let mut full_again = Vec::new();
    reparsed.save(&mut full_again, OutputFormat::Full).unwrap();
    assert_eq!(full_again, full);
}

#[test]
fn metadata_only_mode_reads_symbols() {
    let file = write_temp(SAMPLE);
    let eds = Eds::from_file(file.path(), StorageMode::MetadataOnly).unwrap();
    assert_eq!(eds.storage_mode(), StorageMode::MetadataOnly);
    assert_eq!(eds.len(), 4);
    assert_eq!(eds.cardinality(), 6);

    assert_eq!(eds.read_symbol(0).unwrap(), vec![b"ACGT".to_vec()]);
    assert_eq!(
        eds.read_symbol(1).unwrap(),
        vec![b"A".to_vec(), b"ACA".to_vec()]
    );
    assert_eq!(
        eds.read_symbol(3).unwrap(),
        vec![b"T".to_vec(), b"TG".to_vec()]
    );
    assert!(eds.read_symbol(4).is_err());
}

#[test]
fn metadata_only_mode_with_whitespace_input() {
    let file = write_temp("{ACGT}\n{A,ACA}\n{C GT}\n{T,TG}\n");
    let eds = Eds::from_file(file.path(), StorageMode::MetadataOnly).unwrap();
    assert_eq!(eds.read_symbol(2).unwrap(), vec![b"CGT".to_vec()]);
    assert_eq!(
        eds.read_symbol(1).unwrap(),
        vec![b"A".to_vec(), b"ACA".to_vec()]
    );
}

#[test]
fn metadata_only_mode_forbids_materializing_operations() {
    let file = write_temp(SAMPLE);
    let eds = Eds::from_file(file.path(), StorageMode::MetadataOnly).unwrap();

    let mut sink = Vec::new();
    match eds.save(&mut sink, OutputFormat::Full) {
        Err(Error::ModeForbidden { .. }) => {}
        other => panic!("expected mode-forbidden, got {other:?}"),
    }
    assert!(eds.print(&mut sink).is_err());
    assert!(eds.sets().is_err());
    assert_eq!(
        eds.extract(0, 1, &[0]).unwrap_err().kind(),
        ErrorKind::ModeForbidden
    );
}

#[test]
fn storage_modes_agree_on_shared_operations() {
    let file = write_temp(SAMPLE);
    let full = Eds::from_file(file.path(), StorageMode::Full).unwrap();
    let meta_only = Eds::from_file(file.path(), StorageMode::MetadataOnly).unwrap();

    assert_eq!(full.metadata(), meta_only.metadata());
    for i in 0..full.len() {
        assert_eq!(full.read_symbol(i).unwrap(), meta_only.read_symbol(i).unwrap());
    }

    for (pos, d, pattern) in [
        (0usize, vec![], b"ACG".to_vec()),
        (4, vec![0], b"ACG".to_vec()),
        (5, vec![2], b"GTT".to_vec()),
        (0, vec![], b"XYZ".to_vec()),
    ] {
        assert_eq!(
            full.check_position(pos, &d, &pattern).unwrap(),
            meta_only.check_position(pos, &d, &pattern).unwrap(),
            "divergence at ({pos}, {d:?})"
        );
    }
}

#[test]
fn extract_selects_alternatives() {
    let eds = sample();
    assert_eq!(eds.extract(0, 1, &[0]).unwrap(), b"ACGT".to_vec());
    assert_eq!(eds.extract(0, 2, &[0, 1]).unwrap(), b"ACGTACA".to_vec());
    assert_eq!(eds.extract(1, 3, &[0, 0, 1]).unwrap(), b"ACGTTG".to_vec());
    assert_eq!(eds.extract(0, 0, &[]).unwrap(), Vec::<u8>::new());

    // range truncated at the end: choices must match the truncated length
    assert_eq!(eds.extract(3, 5, &[1]).unwrap(), b"TG".to_vec());
}

#[test]
fn extract_errors() {
    let eds = sample();
    assert_eq!(
        eds.extract(9, 1, &[0]).unwrap_err().kind(),
        ErrorKind::OutOfRange
    );
    assert_eq!(
        eds.extract(0, 2, &[0]).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert_eq!(
        eds.extract(0, 1, &[5]).unwrap_err().kind(),
        ErrorKind::OutOfRange
    );
}

#[test]
fn check_position_basic() {
    let eds = sample();
    assert!(eds.check_position(0, &[], b"ACG").unwrap());
    assert!(eds.check_position(0, &[], b"ACGT").unwrap());
    assert!(eds.check_position(4, &[0], b"ACG").unwrap());
    assert!(eds.check_position(6, &[1], b"ACG").unwrap());
    assert!(eds.check_position(5, &[2], b"GTT").unwrap());
    assert!(eds.check_position(5, &[3], b"GTT").unwrap());
    assert!(eds.check_position(4, &[0, 2], b"ACGTT").unwrap());
    assert!(eds.check_position(4, &[0, 3], b"ACGTT").unwrap());
}

#[test]
fn check_position_negative() {
    let eds = sample();
    assert!(!eds.check_position(0, &[], b"XYZ").unwrap());
    assert!(!eds.check_position(0, &[], b"ACGTX").unwrap());
    assert!(!eds.check_position(100, &[], b"ACG").unwrap());
    // wrong alternative for the position: mismatch, not an error
    assert!(!eds.check_position(4, &[1], b"ACG").unwrap());
}

#[test]
fn check_position_empty_cases() {
    let eds = sample();
    assert!(eds.check_position(0, &[], b"").unwrap());
    assert!(eds.check_position(100, &[], b"").unwrap());
    let empty = Eds::from_bytes("").unwrap();
    assert!(!empty.check_position(0, &[], b"").unwrap());
    assert!(!empty.check_position(0, &[], b"A").unwrap());
}

#[test]
fn check_position_errors() {
    let eds = sample();

    // invalid degenerate string number
    assert_eq!(
        eds.check_position(4, &[999], b"ACG").unwrap_err().kind(),
        ErrorKind::OutOfRange
    );
    // not enough degenerate strings for the walk
    assert_eq!(
        eds.check_position(4, &[], b"ACGTT").unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    // string 2 belongs to symbol 3, not the boundary symbol 1
    assert_eq!(
        eds.check_position(4, &[2], b"ACG").unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
}

#[test]
fn check_position_extra_choices_are_ignored() {
    let eds = sample();
    assert!(eds.check_position(0, &[0], b"ACG").unwrap());
    assert!(!eds.check_position(0, &[0], b"CCC").unwrap());
}

#[test]
fn generated_patterns_have_requested_shape() {
    let eds = sample();
    let mut rng = StdRng::seed_from_u64(42);
    let patterns = eds.generate_patterns(5, 8, &mut rng).unwrap();
    assert_eq!(patterns.len(), 5);
    assert!(patterns.iter().all(|p| p.len() == 8));
}

#[test]
fn generated_patterns_read_along_the_eds() {
    // single-symbol instance: every sample, wrapped or not, reads along
    // the cycle of that symbol
    let eds = Eds::from_bytes("{ACGT}").unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let cycle = b"ACGTACGTACGTACGT";
    for pattern in eds.generate_patterns(20, 6, &mut rng).unwrap() {
        assert!(
            cycle.windows(6).any(|w| w == &pattern[..]),
            "pattern {:?} does not follow the symbol cycle",
            String::from_utf8_lossy(&pattern)
        );
    }
}

#[test]
fn generated_patterns_use_known_alternatives() {
    // every character of a sample comes from some alternative; with a
    // single-letter alphabet per symbol the exact composition is fixed
    let eds = Eds::from_bytes("{AAAA}{C,CC}{GGGG}").unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for pattern in eds.generate_patterns(20, 5, &mut rng).unwrap() {
        assert_eq!(pattern.len(), 5);
        assert!(pattern.iter().all(|b| matches!(b, b'A' | b'C' | b'G')));
    }
}

#[test]
fn generate_patterns_in_metadata_only_mode() {
    let file = write_temp(SAMPLE);
    let eds = Eds::from_file(file.path(), StorageMode::MetadataOnly).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let patterns = eds.generate_patterns(5, 8, &mut rng).unwrap();
    assert!(patterns.iter().all(|p| p.len() == 8));
}

#[test]
fn generate_patterns_rejects_bad_parameters() {
    let eds = sample();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(eds.generate_patterns(1, 0, &mut rng).is_err());
    let empty = Eds::from_bytes("").unwrap();
    assert!(empty.generate_patterns(1, 5, &mut rng).is_err());
    let all_empty = Eds::from_bytes("{,}").unwrap();
    assert!(all_empty.generate_patterns(1, 5, &mut rng).is_err());
}

#[test]
fn from_symbols_matches_parsed_equivalent() {
    let built = Eds::from_symbols(vec![
        vec![b"ACGT".to_vec()],
        vec![b"A".to_vec(), b"ACA".to_vec()],
        vec![b"CGT".to_vec()],
        vec![b"T".to_vec(), b"TG".to_vec()],
    ]);
    let parsed = sample();
    assert_eq!(built.metadata(), parsed.metadata());
    assert_eq!(built.sets().unwrap(), parsed.sets().unwrap());
}
