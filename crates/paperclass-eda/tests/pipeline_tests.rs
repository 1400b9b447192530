//! Dataset file through to summary statistics

use paperclass_eda::{describe, load_records, value_counts, DatasetSource, Features};
use std::io::Write;
use tempfile::TempDir;

fn write_jsonl(dir: &TempDir, rows: &[(&str, i64)]) -> std::path::PathBuf {
    let path = dir.path().join("abstracts.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for (text, label) in rows {
        let line = serde_json::json!({ "text": text, "label": label, "id": "ignored" });
        writeln!(file, "{}", line).unwrap();
    }
    path
}

#[test]
fn test_jsonl_to_statistics() {
    let tmp = TempDir::new().unwrap();
    let path = write_jsonl(
        &tmp,
        &[
            ("we prove a theorem", 0),
            ("a convolutional network for images", 1),
            ("another theorem about rings", 0),
            ("planning agents", 2),
        ],
    );

    let records = load_records(&DatasetSource::File(path), 20_000).unwrap();
    let features = Features::from_records(&records);
    assert_eq!(features.len(), 4);

    let words = describe(&features.word_count).unwrap();
    assert_eq!(words.count, 4);
    assert_eq!(words.min, 2.0);
    assert_eq!(words.max, 5.0);
    assert_eq!(words.q50, 4.0);

    let chars = describe(&features.text_length).unwrap();
    assert_eq!(chars.max, "a convolutional network for images".len() as f64);

    assert_eq!(value_counts(&features.labels), vec![(0, 2), (1, 1), (2, 1)]);

    let matrix = features.correlation_matrix();
    assert!(matrix[0][1] > 0.5);
}

#[test]
fn test_row_limit_takes_leading_rows() {
    let tmp = TempDir::new().unwrap();
    let rows: Vec<(String, i64)> = (0..50).map(|i| (format!("abstract {}", i), i % 11)).collect();
    let borrowed: Vec<(&str, i64)> = rows.iter().map(|(t, l)| (t.as_str(), *l)).collect();
    let path = write_jsonl(&tmp, &borrowed);

    let records = load_records(&DatasetSource::File(path), 20).unwrap();
    assert_eq!(records.len(), 20);
    assert_eq!(records[0].text, "abstract 0");
    assert_eq!(records[19].text, "abstract 19");
}
