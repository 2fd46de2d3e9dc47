//! Load a delimited source into typed rows.
//!
//! Polars reads the file with every column as a string so that coercion follows the
//! row rules in [`crate::schema::Row`] instead of failing the whole read on one bad
//! cell. Extra trailing fields are dropped and invalid UTF-8 is replaced.

use std::sync::Arc;

use polars::prelude::*;

use crate::error::LoadError;
use crate::schema::{Row, SourceSchema};
use crate::source::{fetch, SourceLocator};

/// Options applied while reading one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
    /// Keep only rows whose `METRIC` equals this value. Rows without a metric are kept.
    pub metric: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            metric: None,
        }
    }
}

impl LoadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }
}

/// Rows of one source, immutable after load.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    locator: String,
    header: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from rows that are already typed (tests, in-memory sources).
    pub fn from_rows(locator: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            locator: locator.into(),
            header: Vec::new(),
            rows,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Smallest and largest year present, if any row has a year.
    pub fn year_extent(&self) -> Option<(i32, i32)> {
        self.rows
            .iter()
            .filter_map(|r| r.year)
            .fold(None, |acc, y| match acc {
                None => Some((y, y)),
                Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            })
    }
}

/// Load `locator` and bind its columns according to `schema`.
pub fn load(
    locator: &SourceLocator,
    schema: &SourceSchema,
    options: &LoadOptions,
) -> Result<Dataset, LoadError> {
    let name = locator.to_string();
    let local = fetch(locator)?;

    let pl_path = PlPath::Local(Arc::from(local.path()));
    let df = LazyCsvReader::new(pl_path)
        .with_has_header(true)
        .with_separator(options.delimiter)
        .with_infer_schema_length(Some(0))
        .with_truncate_ragged_lines(true)
        .with_encoding(CsvEncoding::LossyUtf8)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| LoadError::from_polars(&name, &e))?;

    let raw_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let header: Vec<String> = raw_names.iter().map(|n| n.trim().to_string()).collect();

    let missing = schema.missing_required(&header);
    if !missing.is_empty() {
        return Err(LoadError::MissingColumn {
            locator: name,
            columns: missing.into_iter().map(String::from).collect(),
        });
    }

    let mut rows = vec![Row::default(); df.height()];
    for spec in schema.columns() {
        let Some(idx) = header.iter().position(|h| h == &spec.column) else {
            continue;
        };
        let column = df
            .column(raw_names[idx].as_str())
            .map_err(|e| LoadError::from_polars(&name, &e))?;
        let values = column.str().map_err(|e| LoadError::from_polars(&name, &e))?;
        for (row, value) in rows.iter_mut().zip(values.into_iter()) {
            row.set(spec.field, value);
        }
    }

    let total = rows.len();
    if let Some(metric) = options.metric.as_deref() {
        rows.retain(|r| r.metric.as_deref().map_or(true, |m| m == metric));
    }
    let without_year = rows.iter().filter(|r| r.year.is_none()).count();
    tracing::debug!(
        source = %name,
        rows = rows.len(),
        filtered = total - rows.len(),
        without_year,
        "loaded source"
    );

    Ok(Dataset {
        locator: name,
        header,
        rows,
    })
}
