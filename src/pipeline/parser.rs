//! Frame parser for the telemetry wire format.
//!
//! One telemetry line looks like:
//!
//! ```text
//! $:g1,g2,g3,a1,a2,a3,m1,m2,m3
//! ```
//!
//! The parser is a pure function of its input line: no I/O, no logging.
//! Classifying and reporting failures is the driver's job.

use crate::types::{Sample, Timestamp};
use chrono::Local;
use thiserror::Error;

/// Marker every telemetry line starts with.
pub const TELEMETRY_PREFIX: &str = "$:";

/// Number of numeric fields in a telemetry line (3 sensors x 3 axes).
pub const FIELD_COUNT: usize = 9;

/// Why a line did not decode into a [`Sample`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line does not carry the telemetry marker. Not an error for the user.
    #[error("line is not telemetry")]
    NotTelemetry,

    /// Fewer than [`FIELD_COUNT`] comma-separated fields.
    #[error("expected 9 fields, found {found}")]
    TooFewFields { found: usize },

    /// The field at this 0-based index is not a finite number.
    #[error("field {0} is not a finite number")]
    InvalidNumber(usize),
}

impl ParseError {
    /// Whether this failure should be reported as a malformed telemetry line.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ParseError::NotTelemetry)
    }
}

/// Parse one raw line, stamping the sample with the current wall-clock time.
pub fn parse(line: &str) -> Result<Sample, ParseError> {
    parse_at(line, Local::now())
}

/// Parse one raw line with an explicit capture timestamp.
pub fn parse_at(line: &str, captured_at: Timestamp) -> Result<Sample, ParseError> {
    let values = parse_fields(line)?;
    Ok(Sample::from_parts(
        (values[0], values[1], values[2]),
        (values[3], values[4], values[5]),
        (values[6], values[7], values[8]),
        captured_at,
    ))
}

/// Decode the nine scalars of a telemetry line in wire order.
///
/// Fields after the ninth are ignored.
pub fn parse_fields(line: &str) -> Result<[f64; FIELD_COUNT], ParseError> {
    let body = line
        .trim()
        .strip_prefix(TELEMETRY_PREFIX)
        .ok_or(ParseError::NotTelemetry)?;

    // Anything after a further ':' is not part of the field list.
    let field_list = body.split(':').next().unwrap_or_default();

    let fields: Vec<&str> = field_list.split(',').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ParseError::TooFewFields {
            found: count_fields(field_list),
        });
    }

    let mut values = [0.0; FIELD_COUNT];
    for (index, (slot, field)) in values.iter_mut().zip(&fields).enumerate() {
        *slot = parse_number(field).ok_or(ParseError::InvalidNumber(index))?;
    }
    Ok(values)
}

fn parse_number(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

// `"".split(',')` yields one empty field; report that as zero fields.
fn count_fields(field_list: &str) -> usize {
    if field_list.trim().is_empty() {
        0
    } else {
        field_list.split(',').count()
    }
}
