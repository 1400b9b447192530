//! Derived features and descriptive statistics

use crate::dataset::Record;
use std::collections::BTreeMap;
use std::fmt;

/// Per-record features, column oriented
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    /// Characters (Unicode scalar values) per text
    pub text_length: Vec<f64>,
    /// Whitespace-separated tokens per text
    pub word_count: Vec<f64>,
    pub labels: Vec<i64>,
}

impl Features {
    pub fn from_records(records: &[Record]) -> Self {
        let mut features = Self {
            text_length: Vec::with_capacity(records.len()),
            word_count: Vec::with_capacity(records.len()),
            labels: Vec::with_capacity(records.len()),
        };
        for record in records {
            features.text_length.push(record.text.chars().count() as f64);
            features.word_count.push(record.text.split_whitespace().count() as f64);
            features.labels.push(record.label);
        }
        features
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Named feature columns in display order
    pub fn columns(&self) -> [(&'static str, &[f64]); 2] {
        [
            ("text_length", self.text_length.as_slice()),
            ("word_count", self.word_count.as_slice()),
        ]
    }

    /// Distinct labels in ascending order
    pub fn distinct_labels(&self) -> Vec<i64> {
        let mut labels = self.labels.clone();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Values of `column` grouped by label, labels ascending
    pub fn grouped(&self, column: &[f64]) -> BTreeMap<i64, Vec<f64>> {
        let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for (label, value) in self.labels.iter().zip(column) {
            groups.entry(*label).or_default().push(*value);
        }
        groups
    }

    /// 2×2 Pearson correlation of `text_length` and `word_count`
    pub fn correlation_matrix(&self) -> [[f64; 2]; 2] {
        let r = pearson(&self.text_length, &self.word_count).unwrap_or(f64::NAN);
        [[1.0, r], [r, 1.0]]
    }
}

/// Summary of one numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single value
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.q50),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// Describe a column; `None` when it is empty
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    Some(Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        q50: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Linear-interpolated quantile of sorted, non-empty data
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Pearson correlation; `None` for mismatched lengths, fewer than two
/// points or a constant column
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Occurrences per label, most frequent first (ties by label)
pub fn value_counts(labels: &[i64]) -> Vec<(i64, usize)> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}

/// Side-by-side describe table for named columns
pub struct DescribeTable<'a> {
    columns: Vec<(&'a str, Describe)>,
}

impl<'a> DescribeTable<'a> {
    pub fn new(columns: Vec<(&'a str, Describe)>) -> Self {
        Self { columns }
    }
}

impl fmt::Display for DescribeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6}", "")?;
        for (name, _) in &self.columns {
            write!(f, "  {:>12}", name)?;
        }
        writeln!(f)?;

        for row in 0..8 {
            let label = self.columns.first().map(|(_, d)| d.rows()[row].0).unwrap_or("");
            write!(f, "{:<6}", label)?;
            for (_, describe) in &self.columns {
                write!(f, "  {:>12.6}", describe.rows()[row].1)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_features_count_chars_and_words() {
        let records = vec![
            Record { text: "naïve  bayes\tworks".into(), label: 1 },
            Record { text: "".into(), label: 0 },
        ];
        let features = Features::from_records(&records);
        assert_eq!(features.text_length, vec![18.0, 0.0]);
        assert_eq!(features.word_count, vec![3.0, 0.0]);
        assert_eq!(features.labels, vec![1, 0]);
    }

    #[test]
    fn test_describe_matches_linear_quantiles() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.count, 4);
        assert!(close(d.mean, 2.5));
        assert!(close(d.std, (5.0f64 / 3.0).sqrt()));
        assert!(close(d.min, 1.0));
        assert!(close(d.q25, 1.75));
        assert!(close(d.q50, 2.5));
        assert!(close(d.q75, 3.25));
        assert!(close(d.max, 4.0));
    }

    #[test]
    fn test_describe_single_and_empty() {
        assert!(describe(&[]).is_none());
        let d = describe(&[7.0]).unwrap();
        assert!(d.std.is_nan());
        assert!(close(d.q25, 7.0));
        assert!(close(d.q75, 7.0));
    }

    #[test]
    fn test_pearson() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&a, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(close(pearson(&a, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0]).unwrap(), 0.5));
        assert!(pearson(&a, &[1.0, 1.0, 1.0, 1.0]).is_none());
        assert!(pearson(&a, &[1.0]).is_none());
    }

    #[test]
    fn test_value_counts_descending() {
        let counts = value_counts(&[3, 1, 3, 2, 1, 3, 0]);
        assert_eq!(counts, vec![(3, 3), (1, 2), (0, 1), (2, 1)]);
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let records: Vec<Record> = ["a", "a bb", "a bb ccc"]
            .iter()
            .map(|t| Record { text: t.to_string(), label: 0 })
            .collect();
        let m = Features::from_records(&records).correlation_matrix();
        assert!(close(m[0][0], 1.0));
        assert!(close(m[1][1], 1.0));
        assert!(close(m[0][1], m[1][0]));
        assert!(m[0][1] > 0.9);
    }

    #[test]
    fn test_grouped_by_label() {
        let features = Features {
            text_length: vec![10.0, 20.0, 30.0],
            word_count: vec![1.0, 2.0, 3.0],
            labels: vec![2, 0, 2],
        };
        let groups = features.grouped(&features.text_length);
        assert_eq!(groups[&0], vec![20.0]);
        assert_eq!(groups[&2], vec![10.0, 30.0]);
        assert_eq!(features.distinct_labels(), vec![0, 2]);
    }

    #[test]
    fn test_describe_table_layout() {
        let table = DescribeTable::new(vec![
            ("text_length", describe(&[1.0, 2.0]).unwrap()),
            ("word_count", describe(&[3.0, 5.0]).unwrap()),
        ])
        .to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains("text_length") && lines[0].contains("word_count"));
        assert!(lines[1].starts_with("count"));
        assert!(lines[8].starts_with("max"));
        assert!(lines[8].contains("5.000000"));
    }
}
