use edseq::Eds;

#[test]
fn basic_statistics() {
    let eds = Eds::from_bytes("{ACGT}{A,ACA}{CGT}{T,TG}").unwrap();
    let stats = eds.statistics();

    assert_eq!(stats.min_context_length, 3);
    assert_eq!(stats.max_context_length, 4);
    assert!((stats.avg_context_length - 3.5).abs() < 0.01);
    assert_eq!(stats.num_degenerate_symbols, 2);
    assert_eq!(stats.num_common_chars, 7); // ACGT + CGT
    assert_eq!(stats.num_degenerate_chars, 7); // A + ACA + T + TG
    assert_eq!(stats.num_empty_strings, 0);
}

#[test]
fn empty_string_statistics() {
    let eds = Eds::from_bytes("{AC}{,T}{GT}").unwrap();
    let stats = eds.statistics();
    assert_eq!(stats.num_empty_strings, 1);
    assert_eq!(stats.min_context_length, 2);
    assert_eq!(stats.max_context_length, 2);
    assert_eq!(stats.num_degenerate_symbols, 1);
}

#[test]
fn all_degenerate_statistics() {
    let eds = Eds::from_bytes("{A,C}{G,T}{A,G}").unwrap();
    let stats = eds.statistics();
    assert_eq!(stats.min_context_length, 0);
    assert_eq!(stats.max_context_length, 0);
    assert_eq!(stats.avg_context_length, 0.0);
    assert_eq!(stats.num_degenerate_symbols, 3);
    assert_eq!(stats.num_common_chars, 0);
}

#[test]
fn empty_eds_statistics() {
    let eds = Eds::from_bytes("").unwrap();
    let stats = eds.statistics();
    assert_eq!(stats.min_context_length, 0);
    assert_eq!(stats.num_degenerate_symbols, 0);
    assert_eq!(stats.num_common_chars, 0);
}

#[test]
fn source_statistics_basic() {
    let eds = Eds::from_bytes_with_sources(
        "{ACGT}{A,ACA}{CGT}{T,TG}",
        "{0}{1,3}{2}{4,5}{6}{7}",
    )
    .unwrap();
    let stats = eds.source_statistics().unwrap();

    // 0, 1, 2, 3, 4, 5, 6, 7
    assert_eq!(stats.num_paths, 8);
    assert_eq!(stats.max_paths_per_string, 2);
    assert!((stats.avg_paths_per_string - 8.0 / 6.0).abs() < 0.01);
}

#[test]
fn source_statistics_all_universal() {
    let eds = Eds::from_bytes_with_sources("{AC}{GT}", "{0}{0}").unwrap();
    let stats = eds.source_statistics().unwrap();
    assert_eq!(stats.num_paths, 1);
    assert_eq!(stats.max_paths_per_string, 1);
    assert!((stats.avg_paths_per_string - 1.0).abs() < 0.01);
}

#[test]
fn source_statistics_single_string_many_paths() {
    let eds = Eds::from_bytes_with_sources("{ACGT}", "{1,2,3,4,5}").unwrap();
    let stats = eds.source_statistics().unwrap();
    assert_eq!(stats.num_paths, 5);
    assert_eq!(stats.max_paths_per_string, 5);
    assert!((stats.avg_paths_per_string - 5.0).abs() < 0.01);
}

#[test]
fn statistics_without_sources() {
    let eds = Eds::from_bytes("{ACGT}").unwrap();
    assert!(eds.source_statistics().is_none());
}
