//! CSV ingestion of traded-amount samples.
//!
//! Read side only: converts CSV text into [`RawSample`] values. Grouping,
//! alignment and unit conversion happen in `ivp-engine`.
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column       | Type / example        | Notes                                  |
//! |--------------|-----------------------|----------------------------------------|
//! | `instrument` | `000001.SH`           |                                        |
//! | `timestamp`  | `20250108093500`      | Bar end, exchange-local; see below     |
//! | `amount`     | `123456789.0`         | Raw currency units                     |
//!
//! Accepted timestamp shapes: `YYYYMMDDHHMMSS`, `YYYYMMDDHHMM`,
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use ivp_engine::RawSample;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by CSV parsing in this module.
#[derive(Debug)]
pub enum CsvIngestError {
    /// An I/O failure reading the source.
    Io(String),
    /// The header row is missing a required column.
    MissingHeader(String),
}

impl fmt::Display for CsvIngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvIngestError::Io(msg) => write!(f, "csv io error: {msg}"),
            CsvIngestError::MissingHeader(col) => {
                write!(f, "csv missing required header column: '{col}'")
            }
        }
    }
}

impl std::error::Error for CsvIngestError {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

const REQUIRED: [&str; 3] = ["instrument", "timestamp", "amount"];

/// Parse a CSV file at `path`.
///
/// Rows with an unparseable timestamp or amount are skipped. Only
/// structural / header errors are returned as `Err`.
pub fn parse_samples_csv_file(path: &Path) -> Result<Vec<RawSample>, CsvIngestError> {
    let buf = std::fs::read_to_string(path)
        .map_err(|e| CsvIngestError::Io(format!("read '{}': {e}", path.display())))?;
    parse_samples_csv_str(&buf)
}

/// Parse CSV from a string slice. See [`parse_samples_csv_file`].
pub fn parse_samples_csv_str(src: &str) -> Result<Vec<RawSample>, CsvIngestError> {
    let mut lines = src.lines();

    let header_line = match lines.next() {
        Some(l) => l,
        None => return Ok(Vec::new()),
    };
    let col_idx = build_col_index(header_line)?;
    let (i_inst, i_ts, i_amt) = (
        col_idx["instrument"],
        col_idx["timestamp"],
        col_idx["amount"],
    );

    let mut out = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Comma-separated, no quoting.
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(inst), Some(ts), Some(amt)) =
            (fields.get(i_inst), fields.get(i_ts), fields.get(i_amt))
        else {
            skipped += 1;
            continue;
        };

        let Some(timestamp) = parse_timestamp(ts) else {
            skipped += 1;
            continue;
        };
        let Ok(amount) = amt.parse::<f64>() else {
            skipped += 1;
            continue;
        };
        if inst.is_empty() || !amount.is_finite() {
            skipped += 1;
            continue;
        }

        out.push(RawSample::new(*inst, timestamp, amount));
    }

    if skipped > 0 {
        debug!(skipped, kept = out.len(), "csv rows skipped");
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a bar timestamp in one of the accepted shapes.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    const FORMATS: [&str; 4] = [
        "%Y%m%d%H%M%S",
        "%Y%m%d%H%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Case-insensitive column-name → index map from a CSV header line.
fn build_col_index(header_line: &str) -> Result<HashMap<String, usize>, CsvIngestError> {
    let mut idx: HashMap<String, usize> = HashMap::new();
    for (i, col) in header_line.split(',').enumerate() {
        idx.insert(col.trim().to_ascii_lowercase(), i);
    }

    for req in REQUIRED {
        if !idx.contains_key(req) {
            return Err(CsvIngestError::MissingHeader(req.to_string()));
        }
    }

    Ok(idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
