//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// `count` valid telemetry lines whose gyro X values are `1..=count`.
pub fn numbered_lines(count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| builders::TelemetryLineBuilder::new().gyro(i as f64, 0.0, 0.0).build())
        .collect()
}
