//! End-to-end tests for the combining pipeline
//!
//! Sources are either local files in a temporary directory (read through
//! the real fetcher) or in-memory payloads.

use sensor_combiner::parser::parse_payload;
use sensor_combiner::serializer::read_back;
use sensor_combiner::{CombinePipeline, CombinerConfig, DatasetKind, MemoryFetcher, RawPayload};
use std::path::Path;
use tempfile::TempDir;

const BANCROFT_BODY: &str = "\
TIMESTAMP,STARTING_DATETIME,MIDPOINT_DATETIME,ENDING_DATETIME,AirT_C,RH_pct
TS,,,,Deg C,%
2024-01-01 00:30,2024-01-01 00:15,2024-01-01 00:22,2024-01-01 00:30,1.0,80
2024-01-01 00:45,2024-01-01 00:30,2024-01-01 00:37,2024-01-01 00:45,3.0,82
2024-01-01 01:15,2024-01-01 01:00,2024-01-01 01:07,2024-01-01 01:15,5.0,bad
";

const SOLAR: &str = "\
Unnamed: 0,date,time,W/m2
0,2024-01-01,00:17,100
1,2024-01-01,00:42,300
";

const PRECIP: &str = "\
date,time,mm
2024-01-01,03:05,0.2
2024-01-01,03:35,0.4
";

const TREATMENT: &str = "\
date,time,treatment,zone,temp,WC
2024-01-01,00:00,A,1,10,0.1
2024-01-01,00:00,A,2,11,0.2
2024-01-01,00:00,B,1,12,0.3
2024-01-01,00:00,B,2,13,0.4
2024-01-01,02:00,A,1,14,0.5
";

/// Bancroft export with the 25-line logger preamble ahead of the header:
/// a quoted TOA5 record, blank lines and a note with an unbalanced quote
fn bancroft_with_preamble() -> String {
    let mut text = String::from(
        "\"TOA5\",\"Bancroft_mown\",\"CR1000\",\"12345\",\"CR1000.Std.32\"\n\
         \n\
         Site description: \"mown plot, north field\n\
         \n",
    );
    for i in 4..25 {
        text.push_str(&format!("logger preamble line {i}\n"));
    }
    text.push_str(BANCROFT_BODY);
    text
}

fn write_sources(dir: &Path) -> CombinerConfig {
    let files = [
        (DatasetKind::BancroftMown, "bancroft.csv", bancroft_with_preamble()),
        (DatasetKind::SolarRadiation, "m_srad.csv", SOLAR.to_string()),
        (DatasetKind::Precipitation, "precip.csv", PRECIP.to_string()),
        (DatasetKind::Treatment, "treatment.csv", TREATMENT.to_string()),
    ];

    let mut config = CombinerConfig::default();
    for (kind, name, text) in files {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        config = config.with_source_location(kind, path.to_string_lossy());
    }
    config
}

fn csv_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_local_sources_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pipeline = CombinePipeline::from_config(write_sources(dir.path())).unwrap();

    let (bytes, stats) = pipeline.run().await.unwrap();
    let lines = csv_lines(&bytes);

    assert_eq!(
        lines[0],
        "Date,Time,AirT_C,RH_pct,Irrad_W/m2,Precip_mm,\
         temp_A_1,temp_A_2,temp_B_1,temp_B_2,WC_A_1,WC_A_2,WC_B_1,WC_B_2"
    );

    // Hours 00, 01, 02 and 03 each come from a different subset of sources
    let times: Vec<&str> = lines[1..]
        .iter()
        .map(|line| line.split(',').nth(1).unwrap())
        .collect();
    assert_eq!(times, vec!["00:00:00", "01:00:00", "02:00:00", "03:00:00"]);
    assert!(lines[1..].iter().all(|line| line.starts_with("2024-01-01,")));

    assert_eq!(stats.combined_rows, 4);
    assert_eq!(stats.combined_columns, 14);
    assert_eq!(stats.total_dropped_rows(), 0);
}

#[tokio::test]
async fn test_hourly_means_and_missing_cells() {
    let dir = TempDir::new().unwrap();
    let pipeline = CombinePipeline::from_config(write_sources(dir.path())).unwrap();

    let (combined, _) = pipeline.produce_combined_table().await.unwrap();
    let hour = |h: u32| {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    };

    // 00:17 and 00:42 collapse into one 00:00 row holding their mean
    assert_eq!(combined.value(&hour(0), "Irrad_W/m2"), Some(200.0));
    assert_eq!(combined.value(&hour(0), "AirT_C"), Some(2.0));
    assert_eq!(combined.value(&hour(0), "RH_pct"), Some(81.0));

    // Non-numeric cells become missing, never zero
    assert_eq!(combined.value(&hour(1), "AirT_C"), Some(5.0));
    assert_eq!(combined.value(&hour(1), "RH_pct"), None);

    assert_eq!(combined.value(&hour(2), "temp_A_1"), Some(14.0));
    assert_eq!(combined.value(&hour(2), "temp_B_2"), None);
    let precip = combined.value(&hour(3), "Precip_mm").unwrap();
    assert!((precip - 0.3).abs() < 1e-9);
    assert_eq!(combined.value(&hour(3), "Irrad_W/m2"), None);
}

#[tokio::test]
async fn test_bancroft_metadata_and_duplicate_timestamps_removed() {
    let dir = TempDir::new().unwrap();
    let pipeline = CombinePipeline::from_config(write_sources(dir.path())).unwrap();

    let (combined, _) = pipeline.produce_combined_table().await.unwrap();
    let names = combined.column_names();

    for dropped in [
        "TIMESTAMP",
        "STARTING_DATETIME",
        "MIDPOINT_DATETIME",
        "ENDING_DATETIME",
        "Unnamed: 0",
        "Irrad_Unnamed: 0",
    ] {
        assert!(!names.iter().any(|name| name == dropped), "{dropped} kept");
    }
    // The units row would otherwise surface as a row with missing values
    assert!(combined.rows().iter().all(|row| row.len() == 12));
}

#[test]
fn test_logger_preamble_leaves_timestamp_header() {
    let payload = RawPayload::new(DatasetKind::BancroftMown, bancroft_with_preamble());
    let table = parse_payload(&payload, &DatasetKind::BancroftMown.parse_hints()).unwrap();

    assert_eq!(table.columns()[0], "TIMESTAMP");
    assert_eq!(table.columns().last().map(String::as_str), Some("RH_pct"));
    // units row is still present before normalization
    assert_eq!(table.cell(0, "TIMESTAMP"), Some("TS"));
    assert_eq!(table.num_rows(), 4);
}

#[tokio::test]
async fn test_serialized_output_reads_back() {
    let dir = TempDir::new().unwrap();
    let pipeline = CombinePipeline::from_config(write_sources(dir.path())).unwrap();

    let (combined, _) = pipeline.produce_combined_table().await.unwrap();
    let bytes = sensor_combiner::serializer::serialize(&combined).unwrap();
    let parsed = read_back(&bytes).unwrap();

    assert_eq!(parsed.num_rows(), combined.num_rows());
    assert_eq!(parsed.columns(), combined.column_names().as_slice());
}

#[tokio::test]
async fn test_missing_local_source_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = write_sources(dir.path()).with_source_location(
        DatasetKind::Treatment,
        dir.path().join("absent.csv").to_string_lossy(),
    );
    let pipeline = CombinePipeline::from_config(config).unwrap();

    let err = pipeline.produce_combined_csv().await.unwrap_err();
    assert!(err.is_fetch());
    assert!(err.to_string().contains("treatment"));
}

#[tokio::test]
async fn test_any_single_fetch_failure_yields_no_output() {
    let payloads = [
        (DatasetKind::BancroftMown, BANCROFT_BODY),
        (DatasetKind::SolarRadiation, SOLAR),
        (DatasetKind::Precipitation, PRECIP),
        (DatasetKind::Treatment, TREATMENT),
    ];
    let config = CombinerConfig::default().with_bancroft_skip_rows(0);

    for missing in DatasetKind::ALL {
        let fetcher = payloads
            .iter()
            .filter(|(kind, _)| *kind != missing)
            .fold(MemoryFetcher::new(), |fetcher, (kind, text)| {
                fetcher.with_payload(*kind, *text)
            });
        let pipeline = CombinePipeline::new(config.clone(), fetcher);

        let result = pipeline.run().await;
        assert!(
            matches!(&result, Err(err) if err.is_fetch()),
            "missing {missing} should abort the run"
        );
    }
}

#[tokio::test]
async fn test_gap_filling_emits_empty_hours() {
    let fetcher = MemoryFetcher::new()
        .with_payload(DatasetKind::BancroftMown, BANCROFT_BODY)
        .with_payload(DatasetKind::SolarRadiation, SOLAR)
        .with_payload(DatasetKind::Precipitation, PRECIP)
        .with_payload(DatasetKind::Treatment, TREATMENT);
    let config = CombinerConfig::default()
        .with_bancroft_skip_rows(0)
        .with_gap_filling();
    let pipeline = CombinePipeline::new(config, fetcher);

    let (_, stats) = pipeline.run().await.unwrap();
    // Treatment covers 00:00 to 02:00, so hour 01 is filled in
    let treatment = stats
        .datasets
        .iter()
        .find(|d| d.dataset == DatasetKind::Treatment)
        .unwrap();
    assert_eq!(treatment.hourly_rows, 3);
    assert_eq!(stats.combined_rows, 4);
}

#[tokio::test]
async fn test_strict_timestamps_reject_bad_rows() {
    let solar = format!("{SOLAR}2,2024-01-01,not-a-time,5\n");
    let fetcher = MemoryFetcher::new()
        .with_payload(DatasetKind::BancroftMown, BANCROFT_BODY)
        .with_payload(DatasetKind::SolarRadiation, solar.as_str())
        .with_payload(DatasetKind::Precipitation, PRECIP)
        .with_payload(DatasetKind::Treatment, TREATMENT);
    let base = CombinerConfig::default().with_bancroft_skip_rows(0);

    let lenient = CombinePipeline::new(base.clone(), fetcher.clone());
    let (_, stats) = lenient.run().await.unwrap();
    assert_eq!(stats.total_dropped_rows(), 1);

    let strict = CombinePipeline::new(base.with_strict_timestamps(), fetcher);
    let err = strict.run().await.unwrap_err();
    assert!(err.is_normalize());
}
