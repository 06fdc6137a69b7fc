//! Core data types for gyro-telemetry
//!
//! # Main Types
//!
//! - [`Sample`] - One decoded IMU reading (gyro, accel, mag triples + timestamp)
//! - [`SensorKind`] - Selects which triple of a sample is windowed and plotted
//! - [`PipelineStats`] - Counters maintained by the pipeline driver
//!
//! A [`Sample`] can only be produced by the frame parser
//! ([`crate::pipeline::parser::parse`]), which guarantees that all nine
//! scalar fields are present and finite.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One scalar per axis: `(x, y, z)`.
pub type Triple = (f64, f64, f64);

/// Wall-clock time at which a sample was accepted.
pub type Timestamp = DateTime<Local>;

/// The three sensors carried by every telemetry line, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    #[default]
    Gyro,
    Accel,
    Mag,
}

impl SensorKind {
    /// All sensors in wire order
    pub const ALL: [SensorKind; 3] = [SensorKind::Gyro, SensorKind::Accel, SensorKind::Mag];

    /// Human-readable label used for plot titles and legends
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Gyro => "Gyro",
            SensorKind::Accel => "Accel",
            SensorKind::Mag => "Mag",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gyro" => Ok(SensorKind::Gyro),
            "accel" => Ok(SensorKind::Accel),
            "mag" => Ok(SensorKind::Mag),
            other => Err(format!(
                "unknown sensor '{}', expected gyro, accel or mag",
                other
            )),
        }
    }
}

/// One decoded telemetry reading.
///
/// Immutable after construction; consumers receive their own copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    gyro: Triple,
    accel: Triple,
    mag: Triple,
    captured_at: Timestamp,
}

impl Sample {
    /// Build a sample from already-validated parts. Only the parser calls this.
    pub(crate) fn from_parts(
        gyro: Triple,
        accel: Triple,
        mag: Triple,
        captured_at: Timestamp,
    ) -> Self {
        Self {
            gyro,
            accel,
            mag,
            captured_at,
        }
    }

    /// Gyroscope reading `(x, y, z)`
    #[inline]
    pub fn gyro(&self) -> Triple {
        self.gyro
    }

    /// Accelerometer reading `(x, y, z)`
    #[inline]
    pub fn accel(&self) -> Triple {
        self.accel
    }

    /// Magnetometer reading `(x, y, z)`
    #[inline]
    pub fn mag(&self) -> Triple {
        self.mag
    }

    /// When the line carrying this sample was parsed
    #[inline]
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Project the triple of one sensor
    #[inline]
    pub fn triple(&self, kind: SensorKind) -> Triple {
        match kind {
            SensorKind::Gyro => self.gyro,
            SensorKind::Accel => self.accel,
            SensorKind::Mag => self.mag,
        }
    }

    /// The nine scalars in wire order: gyro, accel, mag.
    pub fn values(&self) -> [f64; 9] {
        let (g1, g2, g3) = self.gyro;
        let (a1, a2, a3) = self.accel;
        let (m1, m2, m3) = self.mag;
        [g1, g2, g3, a1, a2, a3, m1, m2, m3]
    }

    /// Format the sample back into a telemetry line (without newline).
    pub fn to_wire(&self) -> String {
        let fields: Vec<String> = self.values().iter().map(|v| v.to_string()).collect();
        format!(
            "{}{}",
            crate::pipeline::parser::TELEMETRY_PREFIX,
            fields.join(",")
        )
    }
}

/// Counters maintained by the pipeline driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Lines pulled from the line source
    pub lines_read: u64,
    /// Lines decoded into samples
    pub samples: u64,
    /// Lines without the telemetry marker
    pub not_telemetry: u64,
    /// Telemetry lines that failed to decode
    pub malformed: u64,
    /// Persistence appends that failed
    pub sink_failures: u64,
    /// Samples dropped on the way to the UI due to backpressure
    pub dropped_for_display: u64,
}

impl PipelineStats {
    /// Share of telemetry-marked lines that decoded successfully, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.samples + self.malformed;
        if total == 0 {
            100.0
        } else {
            (self.samples as f64 / total as f64) * 100.0
        }
    }
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lines, {} samples, {} non-telemetry, {} malformed, {} sink failures",
            self.lines_read, self.samples, self.not_telemetry, self.malformed, self.sink_failures
        )
    }
}
