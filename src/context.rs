//! Dataset context summarizer.
//!
//! Renders the loaded dataset into the bounded text block embedded in the
//! system message: file name, shape, column types, a small row sample,
//! numeric statistics and the full column list. This is context for the
//! model, not a computed result consumed programmatically.

use crate::dataset::Dataset;

/// Knobs for how much of the dataset goes into the context block.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Number of sample rows rendered into the context.
    pub sample_rows: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self { sample_rows: 5 }
    }
}

/// Render a dataset into the textual context block sent to the model.
///
/// Pure read of the dataset; recomputed on demand, never cached. The column
/// list is always complete, whatever the dataset width.
pub fn summarize(dataset: &Dataset, options: &SummaryOptions) -> String {
    let frame = &dataset.frame;
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("File: {}", dataset.name));
    parts.push(format!(
        "Rows: {}, Columns: {}",
        frame.height(),
        frame.width()
    ));

    parts.push("\nColumn types:".to_string());
    for (name, dtype) in frame.get_column_names().iter().zip(frame.dtypes().iter()) {
        parts.push(format!("  {}: {}", name, dtype));
    }

    let sample = options.sample_rows.min(frame.height());
    parts.push(format!(
        "\nFirst {} rows:\n{}",
        sample,
        frame.head(Some(options.sample_rows))
    ));

    let stats = numeric_statistics(dataset);
    if !stats.is_empty() {
        parts.push("\nNumeric statistics:".to_string());
        parts.extend(stats);
    }

    parts.push(format!(
        "\nColumns: {}",
        frame.get_column_names().join(", ")
    ));

    parts.join("\n")
}

fn numeric_statistics(dataset: &Dataset) -> Vec<String> {
    let frame = &dataset.frame;
    let mut lines = Vec::new();

    for name in frame.get_column_names() {
        let Ok(series) = frame.column(name) else {
            continue;
        };
        if !series.dtype().is_numeric() {
            continue;
        }

        let nulls = series.null_count();
        let count = series.len() - nulls;
        let mean = series
            .mean()
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "null".to_string());
        let min = match series.min::<f64>() {
            Ok(Some(v)) => v.to_string(),
            _ => "null".to_string(),
        };
        let max = match series.max::<f64>() {
            Ok(Some(v)) => v.to_string(),
            _ => "null".to_string(),
        };

        lines.push(format!(
            "  {}: count={} nulls={} mean={} min={} max={}",
            name, count, nulls, mean, min, max
        ));
    }

    lines
}
