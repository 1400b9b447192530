//! Dataset loading from the Hub parquet export or local files

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use paperclass_core::{Error, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Git revision holding the Hub's automatic parquet conversion
pub const PARQUET_REVISION: &str = "refs/convert/parquet";

/// One labeled abstract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub label: i64,
}

/// Where records are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Parquet shards of a Hub dataset
    Hub {
        repo: String,
        subset: String,
        split: String,
    },

    /// A local `.jsonl` or `.parquet` file
    File(PathBuf),
}

impl DatasetSource {
    pub fn hub(repo: impl Into<String>, subset: impl Into<String>, split: impl Into<String>) -> Self {
        Self::Hub {
            repo: repo.into(),
            subset: subset.into(),
            split: split.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Hub { repo, subset, split } => format!("{} ({}/{})", repo, subset, split),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Load at most `limit` records, in dataset order
pub fn load_records(source: &DatasetSource, limit: usize) -> Result<Vec<Record>> {
    let records = match source {
        DatasetSource::Hub {
            repo,
            subset,
            split,
        } => load_from_hub(repo, subset, split, limit)?,
        DatasetSource::File(path) => load_from_file(path, limit)?,
    };
    tracing::debug!("Loaded {} records from {}", records.len(), source.describe());
    Ok(records)
}

/// Relative path of a parquet shard inside the conversion branch
pub fn shard_path(subset: &str, split: &str, shard: usize) -> String {
    format!("{}/{}/{:04}.parquet", subset, split, shard)
}

fn load_from_hub(repo_id: &str, subset: &str, split: &str, limit: usize) -> Result<Vec<Record>> {
    let api = Api::new().map_err(|e| Error::dataset(format!("Hub client: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Dataset,
        PARQUET_REVISION.to_string(),
    ));

    let mut records = Vec::new();
    for shard in 0usize.. {
        if records.len() >= limit {
            break;
        }
        let name = shard_path(subset, split, shard);
        let path = match repo.get(&name) {
            Ok(path) => path,
            Err(e) if shard == 0 => {
                return Err(Error::dataset(format!(
                    "cannot fetch {} from {}: {}",
                    name, repo_id, e
                )))
            }
            Err(_) => break,
        };
        tracing::debug!("Reading shard {}", path.display());
        read_parquet(&path, limit - records.len(), &mut records)?;
    }
    Ok(records)
}

fn load_from_file(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jsonl") | Some("json") => read_jsonl(path, limit),
        Some("parquet") => {
            let mut records = Vec::new();
            read_parquet(path, limit, &mut records)?;
            Ok(records)
        }
        _ => Err(Error::dataset(format!(
            "unsupported dataset file {}; expected .jsonl or .parquet",
            path.display()
        ))),
    }
}

/// Read JSON lines of `{"text": ..., "label": ...}`, skipping blank lines
pub fn read_jsonl(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        if records.len() >= limit {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line).map_err(|e| {
            Error::dataset(format!("{} line {}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Append up to `limit` records from a parquet file to `out`
pub fn read_parquet(path: &Path, limit: usize, out: &mut Vec<Record>) -> Result<()> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?
        .build()
        .map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;

    let target = out.len() + limit;
    for batch in reader {
        if out.len() >= target {
            break;
        }
        let batch = batch.map_err(|e| Error::dataset(format!("{}: {}", path.display(), e)))?;
        let skipped = records_from_batch(&batch, target - out.len(), out)?;
        if skipped > 0 {
            tracing::warn!("Skipped {} rows with null text or label", skipped);
        }
    }
    Ok(())
}

/// Convert one batch, returning how many rows were skipped for nulls
fn records_from_batch(batch: &RecordBatch, limit: usize, out: &mut Vec<Record>) -> Result<usize> {
    let text = column_as(batch, "text", &DataType::Utf8)?;
    let label = column_as(batch, "label", &DataType::Int64)?;

    let text = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::dataset("text column is not a string array"))?;
    let label = label
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::dataset("label column is not an integer array"))?;

    let mut taken = 0;
    let mut skipped = 0;
    for row in 0..batch.num_rows() {
        if taken >= limit {
            break;
        }
        if text.is_null(row) || label.is_null(row) {
            skipped += 1;
            continue;
        }
        out.push(Record {
            text: text.value(row).to_string(),
            label: label.value(row),
        });
        taken += 1;
    }
    Ok(skipped)
}

fn column_as(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::dataset(format!("missing column '{}'", name)))?;
    cast(column, data_type)
        .map_err(|e| Error::dataset(format!("column '{}' as {}: {}", name, data_type, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_parquet(path: &Path, texts: Vec<Option<&str>>, labels: Vec<i32>) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("text", DataType::Utf8, true),
            Field::new("label", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(texts)),
                Arc::new(Int32Array::from(labels)),
            ],
        )
        .unwrap();

        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_shard_path() {
        assert_eq!(shard_path("default", "train", 0), "default/train/0000.parquet");
        assert_eq!(shard_path("no_ref", "test", 12), "no_ref/test/0012.parquet");
    }

    #[test]
    fn test_jsonl_respects_limit_and_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.jsonl");
        std::fs::write(
            &path,
            "{\"text\": \"first abstract\", \"label\": 2}\n\n{\"text\": \"second\", \"label\": 7}\n{\"text\": \"third\", \"label\": 0}\n",
        )
        .unwrap();

        let records = load_records(&DatasetSource::File(path.clone()), 2).unwrap();
        assert_eq!(
            records,
            vec![
                Record { text: "first abstract".into(), label: 2 },
                Record { text: "second".into(), label: 7 },
            ]
        );

        assert_eq!(load_records(&DatasetSource::File(path), 100).unwrap().len(), 3);
    }

    #[test]
    fn test_jsonl_reports_bad_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.jsonl");
        std::fs::write(&path, "{\"text\": \"ok\", \"label\": 1}\n{\"text\": 5}\n").unwrap();

        let err = load_records(&DatasetSource::File(path), 10).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parquet_casts_labels_and_skips_nulls() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.parquet");
        write_parquet(
            &path,
            vec![Some("alpha beta"), None, Some("gamma"), Some("delta")],
            vec![3, 4, 5, 6],
        );

        let records = load_records(&DatasetSource::File(path.clone()), 10).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record { text: "alpha beta".into(), label: 3 });
        assert_eq!(records[1].label, 5);

        let limited = load_records(&DatasetSource::File(path), 2).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].text, "gamma");
    }

    #[test]
    fn test_parquet_missing_column() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nolabel.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new("text", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["only text"]))],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_records(&DatasetSource::File(path), 10).unwrap_err();
        assert!(err.to_string().contains("missing column 'label'"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_records(&DatasetSource::File(PathBuf::from("data.csv")), 10).unwrap_err();
        assert!(err.to_string().contains("unsupported dataset file"));
    }
}
