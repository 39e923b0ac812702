use cornzip_core::{
    ArchiveFormat, CompressionLevel, CompressionMethod, InputFileRef, classify, estimate,
    is_archive, partition_archives,
};

#[test]
fn test_classify_is_case_insensitive_for_every_format() {
    for format in ArchiveFormat::all() {
        let lower = format!("file{}", format.extension());
        let upper = lower.to_ascii_uppercase();
        let mixed: String = lower
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
            .collect();

        assert_eq!(classify(&lower), Some(format), "{lower}");
        assert_eq!(classify(&upper), Some(format), "{upper}");
        assert_eq!(classify(&mixed), Some(format), "{mixed}");
    }
}

#[test]
fn test_classify_prefers_compound_extension() {
    assert_eq!(classify("archive.tar.gz"), Some(ArchiveFormat::TarGz));
    assert_eq!(classify("archive.tar.bz2"), Some(ArchiveFormat::TarBz2));
    assert_ne!(classify("archive.tar.gz"), Some(ArchiveFormat::Gz));
}

#[test]
fn test_classify_non_archive() {
    assert_eq!(classify("notes.txt"), None);
    assert_eq!(classify("photo.jpeg"), None);
    assert!(!is_archive("notes.txt"));
    assert!(!is_archive("zip"));
    assert!(is_archive("Backup.7Z"));
}

#[test]
fn test_catalog_order_and_size() {
    let catalog: Vec<_> = ArchiveFormat::all().map(|f| f.value()).collect();
    assert_eq!(&catalog[..4], &["zip", "7z", "rar", "tar"]);
    assert_eq!(catalog.len(), 23);
}

#[test]
fn test_format_value_round_trips_through_parse() {
    for format in ArchiveFormat::all() {
        assert_eq!(format.value().parse::<ArchiveFormat>().unwrap(), format);
        assert_eq!(format.label().parse::<ArchiveFormat>().unwrap(), format);
    }
}

#[test]
fn test_estimate_non_increasing_in_level() {
    let methods = [
        CompressionMethod::Fast,
        CompressionMethod::Standard,
        CompressionMethod::Maximum,
        CompressionMethod::Ultra,
    ];

    for method in methods {
        for bytes in [0u64, 1, 999, 10_000_000, 7_340_033] {
            let sizes: Vec<u64> = CompressionLevel::all()
                .map(|level| estimate(bytes, level, method).estimated_bytes)
                .collect();
            assert!(
                sizes.windows(2).all(|w| w[0] >= w[1]),
                "{method} {bytes}: {sizes:?}"
            );
        }
    }
}

#[test]
fn test_estimate_scenario() {
    let level = CompressionLevel::new(5).unwrap();
    let est = estimate(10_000_000, level, CompressionMethod::Standard);
    assert_eq!(est.estimated_bytes, 4_500_000);
    assert_eq!(est.saved_percent, 55);
    assert_eq!(est.saved_bytes(10_000_000), 5_500_000);
}

#[test]
fn test_partition_archives_keeps_order() {
    let inputs = vec![
        InputFileRef::new("a.zip", 10),
        InputFileRef::new("b.txt", 20),
        InputFileRef::new("c.tar.gz", 30),
    ];

    let partition = partition_archives(inputs);

    let accepted: Vec<_> = partition
        .accepted
        .iter()
        .map(|(input, format)| (input.name.as_str(), *format))
        .collect();
    assert_eq!(
        accepted,
        vec![("a.zip", ArchiveFormat::Zip), ("c.tar.gz", ArchiveFormat::TarGz)]
    );
    assert_eq!(partition.excluded, vec!["b.txt".to_string()]);
}
