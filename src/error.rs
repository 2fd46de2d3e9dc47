//! Load errors and user-facing error message formatting.
//!
//! Uses typed error matching (PolarsError variants, io::ErrorKind) rather than
//! string parsing to produce actionable messages.

use polars::prelude::PolarsError;
use std::io;

/// Failure to turn a source into rows. Terminal for the chart that requested it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("source {locator} is unreachable: {message}")]
    Unreachable { locator: String, message: String },
    #[error("source {locator} could not be parsed: {message}")]
    Parse { locator: String, message: String },
    #[error("source {locator} is missing required column(s): {}", columns.join(", "))]
    MissingColumn {
        locator: String,
        columns: Vec<String>,
    },
    #[error("boundary file {locator} is invalid: {message}")]
    Geometry { locator: String, message: String },
}

impl LoadError {
    pub fn locator(&self) -> &str {
        match self {
            Self::Unreachable { locator, .. }
            | Self::Parse { locator, .. }
            | Self::MissingColumn { locator, .. }
            | Self::Geometry { locator, .. } => locator,
        }
    }

    pub(crate) fn from_io(locator: &str, err: &io::Error) -> Self {
        Self::Unreachable {
            locator: locator.to_string(),
            message: user_message_from_io(err, None),
        }
    }

    /// Polars reports unreadable files as IO errors; everything else is a parse failure.
    pub(crate) fn from_polars(locator: &str, err: &PolarsError) -> Self {
        match err {
            PolarsError::IO { .. } => Self::Unreachable {
                locator: locator.to_string(),
                message: user_message_from_polars(err),
            },
            _ => Self::Parse {
                locator: locator.to_string(),
                message: user_message_from_polars(err),
            },
        }
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}.", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::ComputeError(msg) => simplify_compute_message(msg),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::ConnectionRefused => "Connection refused.".to_string(),
        ErrorKind::ConnectionReset => "Connection reset.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Polars compute errors carry long hints; keep the first line only.
fn simplify_compute_message(msg: &str) -> String {
    let first = msg.lines().next().unwrap_or(msg).trim();
    if first.is_empty() {
        "Could not read the data.".to_string()
    } else {
        first.to_string()
    }
}
