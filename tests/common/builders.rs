//! Test data builders for telemetry lines

use gyro_telemetry::pipeline::TELEMETRY_PREFIX;

/// Builder for raw telemetry lines
pub struct TelemetryLineBuilder {
    values: Vec<String>,
    prefix: String,
}

impl TelemetryLineBuilder {
    /// All nine fields zero, with the telemetry marker.
    pub fn new() -> Self {
        Self {
            values: vec!["0".to_string(); 9],
            prefix: TELEMETRY_PREFIX.to_string(),
        }
    }

    pub fn gyro(self, x: f64, y: f64, z: f64) -> Self {
        self.set(0, [x, y, z])
    }

    pub fn accel(self, x: f64, y: f64, z: f64) -> Self {
        self.set(3, [x, y, z])
    }

    pub fn mag(self, x: f64, y: f64, z: f64) -> Self {
        self.set(6, [x, y, z])
    }

    /// Replace one raw field verbatim (e.g. with a non-number).
    pub fn raw_field(mut self, index: usize, raw: &str) -> Self {
        self.values[index] = raw.to_string();
        self
    }

    /// Keep only the first `count` fields.
    pub fn truncate(mut self, count: usize) -> Self {
        self.values.truncate(count);
        self
    }

    pub fn without_prefix(mut self) -> Self {
        self.prefix.clear();
        self
    }

    pub fn build(self) -> String {
        format!("{}{}", self.prefix, self.values.join(","))
    }

    fn set(mut self, start: usize, triple: [f64; 3]) -> Self {
        for (i, v) in triple.iter().enumerate() {
            self.values[start + i] = v.to_string();
        }
        self
    }
}

impl Default for TelemetryLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_builder() {
        let line = TelemetryLineBuilder::new()
            .gyro(1.0, 2.0, 3.0)
            .mag(10.0, 20.0, 30.0)
            .build();
        assert_eq!(line, "$:1,2,3,0,0,0,10,20,30");

        let short = TelemetryLineBuilder::new().truncate(2).build();
        assert_eq!(short, "$:0,0");
    }
}
